//! End-to-end alignment pipeline: seed, cluster, extend, emit.

use std::collections::BTreeMap;
use std::io::Write;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::algorithms::{IndexKind, MatchType, SuffixIndex, run_match_finder};
use crate::cluster::{ClusterParams, cluster_matches};
use crate::delta;
use crate::error::Result;
use crate::postnuc::{
    Alignment, Cluster, FORWARD_CHAR, Match as AnchorMatch, MergeConfig, REVERSE_CHAR,
    Synteny, SyntenyMerger, rev_coord,
};
use crate::scores::MatrixType;
use crate::sequence::{Sequence, concat_records, locate_record, mask_non_nucleotides};
use crate::sw_align::Aligner;

/// Mask bytes for the two sides when matching is restricted to
/// nucleotides; distinct bytes so masked runs can never seed.
const REF_MASK: u8 = b'#';
const QRY_MASK: u8 = b'%';

#[derive(Debug, Clone)]
pub struct NucmerOptions {
    pub match_kind: MatchType,
    pub min_len: usize,
    pub forward_only: bool,
    pub reverse_only: bool,
    // alignment pipeline parameters
    pub break_len: i64,
    pub min_cluster: i64,
    pub diag_diff: i64,
    pub diag_factor: f64,
    pub max_gap: i64,
    pub extend: bool,
    pub optimize: bool,
    pub simplify: bool,
    pub banding: bool,
    pub use_extent: bool,
    pub to_seqend: bool,
    pub do_delta: bool,
    pub do_shadows: bool,
    pub nucleotides_only: bool,
    pub matrix_type: i32,
    pub index_kind: IndexKind,
}

impl Default for NucmerOptions {
    fn default() -> Self {
        Self {
            match_kind: MatchType::MAM, // unique in reference only
            min_len: 20,
            forward_only: false,
            reverse_only: false,
            break_len: 200,
            min_cluster: 65,
            diag_diff: 5,
            diag_factor: 0.12,
            max_gap: 90,
            extend: true,
            optimize: true,
            simplify: true,
            banding: false,
            use_extent: false,
            to_seqend: false,
            do_delta: true,
            do_shadows: false,
            nucleotides_only: false,
            matrix_type: 0,
            index_kind: IndexKind::SuffixArray,
        }
    }
}

impl NucmerOptions {
    fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            fixed_diag_diff: self.diag_diff,
            max_separation: self.max_gap,
            min_output_score: self.min_cluster,
            separation_factor: self.diag_factor,
            use_extents: self.use_extent,
            check_labels: false,
        }
    }

    fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            do_delta: self.do_delta,
            do_extend: self.extend,
            to_seqend: self.to_seqend || !self.optimize,
            do_shadows: self.do_shadows || !self.simplify,
        }
    }

    fn aligner(&self) -> Result<Aligner> {
        let banding = if self.banding { self.diag_diff } else { 0 };
        Aligner::new(self.break_len, banding, self.matrix_type)
    }
}

/// Everything produced for one query: its syntenic regions (the
/// clusters against each reference record, for the cluster file) and
/// its extended alignments, grouped per reference record in
/// reference order.
pub struct QueryAlignments {
    pub query_id: String,
    pub query_len: usize,
    pub syntenys: Vec<Synteny>,
    pub alignments: Vec<(usize, Vec<Alignment>)>,
}

/// The aligner: one suffix index over the concatenated reference
/// records, shared read-only by every query worker.
pub struct NucmerAligner {
    references: Vec<Sequence>,
    ref_starts: Vec<usize>,
    index: SuffixIndex,
    options: NucmerOptions,
}

impl NucmerAligner {
    pub fn new(references: Vec<Sequence>, options: NucmerOptions) -> Result<Self> {
        let seed_refs: Vec<Sequence> = if options.nucleotides_only {
            references
                .iter()
                .map(|r| {
                    let mut seq = r.seq.clone();
                    mask_non_nucleotides(&mut seq, REF_MASK);
                    Sequence::new(r.id.clone(), seq)
                })
                .collect()
        } else {
            references.clone()
        };
        let (joined, ref_starts) = concat_records(&seed_refs);
        let index = SuffixIndex::build(options.index_kind, &joined, 1)?;
        Ok(NucmerAligner { references, ref_starts, index, options })
    }

    pub fn options(&self) -> &NucmerOptions {
        &self.options
    }

    pub fn references(&self) -> &[Sequence] {
        &self.references
    }

    pub fn matrix_type(&self) -> MatrixType {
        MatrixType::from_index(self.options.matrix_type).unwrap_or(MatrixType::Nucleotide)
    }

    /// Run the full pipeline for one query sequence.
    pub fn align(&self, query: &Sequence) -> Result<QueryAlignments> {
        let opts = &self.options;
        let merger = SyntenyMerger::new(opts.merge_config(), opts.aligner()?);
        let params = opts.cluster_params();

        let qry_fwd = &query.seq;
        let qry_rev = query.reverse_complement().seq;

        let seed_query = |seq: &[u8]| -> Vec<u8> {
            let mut s = seq.to_vec();
            if opts.nucleotides_only {
                mask_non_nucleotides(&mut s, QRY_MASK);
            }
            s
        };

        // one seed run per strand, split per reference record
        let mut runs: BTreeMap<(usize, i8), Vec<(i64, i64, i64)>> = BTreeMap::new();
        if !opts.reverse_only {
            for m in run_match_finder(&self.index, &seed_query(qry_fwd), opts.match_kind, opts.min_len) {
                let (rec, off) = locate_record(&self.ref_starts, m.ref_pos as usize);
                runs.entry((rec, FORWARD_CHAR)).or_default().push((
                    off as i64 + 1,
                    m.query_pos + 1,
                    m.len,
                ));
            }
        }
        if !opts.forward_only {
            for m in run_match_finder(&self.index, &seed_query(&qry_rev), opts.match_kind, opts.min_len) {
                let (rec, off) = locate_record(&self.ref_starts, m.ref_pos as usize);
                runs.entry((rec, REVERSE_CHAR)).or_default().push((
                    off as i64 + 1,
                    m.query_pos + 1,
                    m.len,
                ));
            }
        }

        // cluster each run, then gather the clusters per record
        let mut per_record: BTreeMap<usize, Vec<Cluster>> = BTreeMap::new();
        for ((rec, dir), triples) in runs {
            for chain in cluster_matches(&triples, &params) {
                let mut cluster = Cluster::new(dir);
                cluster.matches = chain
                    .iter()
                    .map(|e| AnchorMatch { s_a: e.start1, s_b: e.start2, len: e.len })
                    .collect();
                per_record.entry(rec).or_default().push(cluster);
            }
        }

        // extend the clusters of each syntenic region
        let mut syntenys = Vec::new();
        let mut alignments_out = Vec::new();
        for (rec, clusters) in per_record {
            let mut synteny = Synteny { ref_idx: rec, clusters };
            let alignments = merger.extend_clusters(
                &mut synteny.clusters,
                &self.references[rec].seq,
                qry_fwd,
                &qry_rev,
            );
            syntenys.push(synteny);
            alignments_out.push((rec, alignments));
        }

        Ok(QueryAlignments {
            query_id: query.id.clone(),
            query_len: query.len(),
            syntenys,
            alignments: alignments_out,
        })
    }

    /// Align every query, in parallel, with a progress bar. Results
    /// come back in input order.
    pub fn align_parallel(
        &self,
        queries: &[Sequence],
        num_threads: Option<usize>,
    ) -> Result<Vec<QueryAlignments>> {
        if let Some(threads) = num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .ok(); // ignore errors if the global pool already exists
        }

        let pb = ProgressBar::new(queries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let results: Result<Vec<QueryAlignments>> = queries
            .par_iter()
            .map(|query| {
                let result = self.align(query);
                pb.inc(1);
                result
            })
            .collect();

        pb.finish_and_clear();
        results
    }

    /// Write the delta records of a batch of query results.
    pub fn write_delta(
        &self,
        out: &mut dyn Write,
        ref_path: &str,
        qry_path: &str,
        results: &[QueryAlignments],
    ) -> Result<()> {
        let tag = if self.matrix_type().is_protein() { delta::PROMER_TAG } else { delta::NUCMER_TAG };
        delta::write_header(out, ref_path, qry_path, tag)?;
        for q in results {
            for (rec, alignments) in &q.alignments {
                delta::write_record(
                    out,
                    &self.references[*rec].id,
                    self.references[*rec].len() as i64,
                    &q.query_id,
                    q.query_len as i64,
                    alignments,
                    0,
                )?;
            }
        }
        Ok(())
    }

    /// Write the cluster records of a batch of query results, in the
    /// cluster-file text format.
    pub fn write_clusters(&self, out: &mut dyn Write, results: &[QueryAlignments]) -> Result<()> {
        for q in results {
            for syn in &q.syntenys {
                write_cluster_record(
                    out,
                    &self.references[syn.ref_idx].id,
                    self.references[syn.ref_idx].len() as i64,
                    &q.query_id,
                    q.query_len as i64,
                    &syn.clusters,
                )?;
            }
        }
        Ok(())
    }
}

/// Cluster-file record: the pair header, then per cluster a
/// direction line and its matches with gap columns, reverse matches
/// reported in forward query coordinates.
fn write_cluster_record(
    out: &mut dyn Write,
    ref_id: &str,
    ref_len: i64,
    qry_id: &str,
    qry_len: i64,
    clusters: &[Cluster],
) -> Result<()> {
    if clusters.is_empty() {
        return Ok(());
    }
    writeln!(out, ">{ref_id} {qry_id} {ref_len} {qry_len}")?;
    for c in clusters {
        writeln!(out, "{:>2} {:>2}", FORWARD_CHAR, c.dir_b)?;
        for (i, m) in c.matches.iter().enumerate() {
            let s_b = if c.dir_b == FORWARD_CHAR { m.s_b } else { rev_coord(m.s_b, qry_len) };
            write!(out, "{:>8} {:>8} {:>6}", m.s_a, s_b, m.len)?;
            if i == 0 {
                writeln!(out, "{:>6} {:>6}", "-", "-")?;
            } else {
                let p = &c.matches[i - 1];
                writeln!(
                    out,
                    "{:>6} {:>6}",
                    m.s_a - p.s_a - p.len,
                    m.s_b - p.s_b - p.len
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::parse_fasta_str;

    fn reference() -> Vec<Sequence> {
        parse_fasta_str(
            ">ref\nACGTACGTTTGGCCATATAGGCTTACGTACGAACCTTGGAACACACGTGTGTGAGAGA\n",
            "mem",
        )
        .unwrap()
    }

    #[test]
    fn test_identity_query_produces_full_alignment() {
        let refs = reference();
        let query = refs[0].clone();
        let aligner = NucmerAligner::new(refs.clone(), NucmerOptions {
            min_cluster: 20,
            ..Default::default()
        })
        .unwrap();
        let res = aligner.align(&query).unwrap();
        assert_eq!(res.alignments.len(), 1);
        let (rec, als) = &res.alignments[0];
        assert_eq!(*rec, 0);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!((al.s_a, al.e_a), (1, refs[0].len() as i64));
        assert_eq!(al.errors, 0);
        assert_eq!(al.dir_b, FORWARD_CHAR);
    }

    #[test]
    fn test_reverse_complement_query_aligns_on_reverse_strand() {
        let refs = reference();
        let query = Sequence::new("q_rc", refs[0].reverse_complement().seq);
        let aligner = NucmerAligner::new(refs.clone(), NucmerOptions {
            min_cluster: 20,
            ..Default::default()
        })
        .unwrap();
        let res = aligner.align(&query).unwrap();
        assert_eq!(res.alignments.len(), 1);
        let al = &res.alignments[0].1[0];
        assert_eq!(al.dir_b, REVERSE_CHAR);
        assert_eq!((al.s_a, al.e_a), (1, refs[0].len() as i64));
        assert_eq!(al.errors, 0);
    }

    #[test]
    fn test_snp_query_aligns_with_one_error() {
        let refs = reference();
        let mut qseq = refs[0].seq.clone();
        let mid = qseq.len() / 2;
        qseq[mid] = if qseq[mid] == b'A' { b'C' } else { b'A' };
        let query = Sequence::new("q_snp", qseq);
        let aligner = NucmerAligner::new(refs.clone(), NucmerOptions {
            min_cluster: 20,
            min_len: 10,
            ..Default::default()
        })
        .unwrap();
        let res = aligner.align(&query).unwrap();
        let al = &res.alignments[0].1[0];
        assert_eq!((al.s_a, al.e_a), (1, refs[0].len() as i64));
        assert_eq!(al.errors, 1);
        assert!(al.delta.is_empty());
    }

    #[test]
    fn test_delta_output_roundtrips() {
        let refs = reference();
        let query = refs[0].clone();
        let aligner = NucmerAligner::new(refs, NucmerOptions {
            min_cluster: 20,
            ..Default::default()
        })
        .unwrap();
        let results = vec![aligner.align(&query).unwrap()];
        let mut buf = Vec::new();
        aligner.write_delta(&mut buf, "ref.fa", "qry.fa", &results).unwrap();

        let parsed = delta::read_delta(&mut buf.as_slice()).unwrap();
        assert_eq!(parsed.program, delta::NUCMER_TAG);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].alignments, results[0].alignments[0].1);
    }

    #[test]
    fn test_parallel_results_match_serial_and_keep_order() {
        let refs = reference();
        let q1 = refs[0].clone();
        let mut q2seq = refs[0].seq.clone();
        q2seq[4] = b'T';
        let q2 = Sequence::new("q2", q2seq);
        let aligner = NucmerAligner::new(refs, NucmerOptions {
            min_cluster: 20,
            ..Default::default()
        })
        .unwrap();

        let serial: Vec<_> = [&q1, &q2].iter().map(|q| aligner.align(q).unwrap()).collect();
        let parallel = aligner.align_parallel(&[q1.clone(), q2.clone()], None).unwrap();
        assert_eq!(parallel.len(), 2);
        assert_eq!(parallel[0].query_id, q1.id);
        assert_eq!(parallel[1].query_id, "q2");
        for (s, p) in serial.iter().zip(&parallel) {
            assert_eq!(s.alignments.len(), p.alignments.len());
            for ((ri, sa), (pi, pa)) in s.alignments.iter().zip(&p.alignments) {
                assert_eq!(ri, pi);
                assert_eq!(sa, pa);
            }
        }
    }
}

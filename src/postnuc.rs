//! Cluster extension: from chained exact matches to gapped
//! alignments.
//!
//! Each cluster is anchored on its first match, extended backward
//! toward the nearest prior alignment (fusing the two when the gap
//! between them aligns), extended forward through the remaining
//! matches, and finally extended off the last match toward the next
//! cluster or the sequence ends. Alignments carry a delta edit script
//! whose bookkeeping value `delta_apos` (sum of absolute deltas minus
//! the count of negative ones) gives the reference distance consumed
//! through the last indel, which is what makes script concatenation
//! possible.

use crate::scores;
use crate::sequence::padded;
use crate::sw_align::{
    Aligner, FORCED_FORWARD_ALIGN, FORCED_FORWARD_SEARCH, FORWARD_ALIGN, MAX_ALIGNMENT_LENGTH,
    MAX_SEARCH_LENGTH, OPTIMAL_BACKWARD_SEARCH, OPTIMAL_FORWARD_SEARCH,
};

pub const FORWARD_CHAR: i8 = 1;
pub const REVERSE_CHAR: i8 = -1;

/// An exact match between sequences A and B, 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub s_a: i64,
    pub s_b: i64,
    pub len: i64,
}

/// An ordered chain of matches between two sequences. `dir_b` is the
/// strand of B the coordinates refer to.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub was_fused: bool,
    pub dir_b: i8,
    pub matches: Vec<Match>,
}

impl Cluster {
    pub fn new(dir_b: i8) -> Self {
        Cluster { was_fused: false, dir_b, matches: Vec::new() }
    }
}

/// All clusters between one reference sequence and one query.
#[derive(Debug, Clone)]
pub struct Synteny {
    pub ref_idx: usize,
    pub clusters: Vec<Cluster>,
}

/// A gapped alignment between A and B. Coordinates are 1-based
/// inclusive; `s_b`/`e_b` are in the frame of `dir_b` (the delta
/// writer converts reverse alignments to forward coordinates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub dir_b: i8,
    pub s_a: i64,
    pub s_b: i64,
    pub e_a: i64,
    pub e_b: i64,
    /// Delta values, with no zero terminator. Positive: insertion in
    /// A (gap in B); negative: deletion from A (gap in A).
    pub delta: Vec<i64>,
    pub delta_apos: i64,
    pub errors: i64,
    pub sim_errors: i64,
    pub non_alphas: i64,
}

impl Alignment {
    pub fn from_anchor(m: &Match, dir: i8) -> Self {
        Alignment {
            dir_b: dir,
            s_a: m.s_a,
            s_b: m.s_b,
            e_a: m.s_a + m.len - 1,
            e_b: m.s_b + m.len - 1,
            delta: Vec::new(),
            delta_apos: 0,
            errors: 0,
            sim_errors: 0,
            non_alphas: 0,
        }
    }

    /// Number of positions in the alignment in reference terms,
    /// counting deletions.
    pub fn total(&self) -> i64 {
        (self.e_a - self.s_a).abs() + 1 + self.delta.iter().filter(|&&d| d < 0).count() as i64
    }

    pub fn identity(&self) -> f64 {
        let t = self.total();
        (t - self.errors) as f64 / t as f64
    }

    pub fn similarity(&self) -> f64 {
        let t = self.total();
        (t - self.sim_errors) as f64 / t as f64
    }

    pub fn stopity(&self) -> f64 {
        self.non_alphas as f64 / (2 * self.total()) as f64
    }

    /// Append a freshly produced edit script (no terminator). The
    /// first value is re-based so distances keep counting from this
    /// alignment's previous indel.
    fn append_delta(&mut self, piece: &[i64]) {
        if piece.is_empty() {
            return;
        }
        let trailing = (self.e_a - self.s_a + 1) - self.delta_apos;
        let mut first = true;
        for &d in piece {
            let adjusted = if first {
                first = false;
                if d > 0 { d + trailing } else { d - trailing }
            } else {
                d
            };
            self.delta.push(adjusted);
            self.delta_apos += adjusted.abs() - i64::from(adjusted < 0);
        }
    }
}

/// Reverse-complement a coordinate for a sequence of the given
/// length.
pub fn rev_coord(coord: i64, len: i64) -> i64 {
    len - coord + 1
}

/// Extension switches, mirroring the pipeline's alignment options.
#[derive(Debug, Clone, Copy)]
pub struct MergeConfig {
    /// Produce delta information
    pub do_delta: bool,
    /// Extend alignments beyond their clusters
    pub do_extend: bool,
    /// Force extension to the sequence ends
    pub to_seqend: bool,
    /// Keep clusters shadowed by an existing alignment
    pub do_shadows: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig { do_delta: true, do_extend: true, to_seqend: false, do_shadows: false }
    }
}

/// Extends the clusters of syntenic regions into alignments.
pub struct SyntenyMerger {
    pub config: MergeConfig,
    aligner: Aligner,
}

impl SyntenyMerger {
    pub fn new(config: MergeConfig, aligner: Aligner) -> Self {
        SyntenyMerger { config, aligner }
    }

    pub fn aligner(&self) -> &Aligner {
        &self.aligner
    }

    /// Turn the clusters between reference `aseq` and query `bseq`
    /// into gapped alignments, ordered by ascending reference start.
    /// `bseq_rev` is the precomputed reverse complement of the query.
    pub fn extend_clusters(
        &self,
        clusters: &mut [Cluster],
        aseq: &[u8],
        bseq: &[u8],
        bseq_rev: &[u8],
    ) -> Vec<Alignment> {
        let apad = padded(aseq);
        let bpad_fwd = padded(bseq);
        let bpad_rev = padded(bseq_rev);
        let alen = aseq.len() as i64;
        let blen = bseq.len() as i64;

        clusters.sort_by_key(|c| c.matches.first().map_or(i64::MAX, |m| m.s_a));

        let mut alignments: Vec<Alignment> = Vec::new();

        for ci in 0..clusters.len() {
            if clusters[ci].matches.is_empty() {
                continue;
            }
            if !self.config.do_shadows && is_shadowed_cluster(&clusters[ci], &alignments) {
                clusters[ci].was_fused = true;
                continue;
            }
            let dir = clusters[ci].dir_b;
            let bpad = if dir == FORWARD_CHAR { &bpad_fwd } else { &bpad_rev };

            let (target_a, target_b) = forward_target(clusters, ci, alen, blen);

            let matches = clusters[ci].matches.clone();
            let mut curr = usize::MAX;
            for (mi, m) in matches.iter().enumerate() {
                if mi == 0 {
                    alignments.push(Alignment::from_anchor(m, dir));
                    curr = alignments.len() - 1;
                    match self.reverse_target_alignment(&alignments, curr) {
                        Some(t) => {
                            curr = self.extend_backward(&mut alignments, curr, t, &apad, bpad);
                        }
                        None => {
                            if self.config.do_extend {
                                self.extend_backward_open(&mut alignments[curr], &apad, bpad);
                            }
                        }
                    }
                } else {
                    curr = self.extend_through_match(&mut alignments, curr, m, dir, &apad, bpad);
                }
            }

            if self.config.to_seqend || self.config.do_extend {
                self.extend_forward_tail(
                    &mut alignments[curr],
                    &apad,
                    bpad,
                    target_a,
                    target_b,
                    alen,
                    blen,
                );
            }
        }

        alignments.sort_by_key(|al| (al.s_a, al.s_b));
        for al in alignments.iter_mut() {
            self.validate_alignment(al, &apad, if al.dir_b == FORWARD_CHAR { &bpad_fwd } else { &bpad_rev });
        }
        alignments
    }

    /// Nearest prior alignment on the same strand that ends strictly
    /// before the given alignment starts in both sequences, close
    /// enough for the engine to attempt the bridge.
    fn reverse_target_alignment(&self, alignments: &[Alignment], curr: usize) -> Option<usize> {
        let c = &alignments[curr];
        let mut best: Option<usize> = None;
        for (i, al) in alignments.iter().enumerate() {
            if i == curr || al.dir_b != c.dir_b {
                continue;
            }
            if al.e_a < c.s_a && al.e_b < c.s_b {
                let gap_a = c.s_a - al.e_a - 1;
                let gap_b = c.s_b - al.e_b - 1;
                if gap_a <= MAX_SEARCH_LENGTH && gap_b <= MAX_SEARCH_LENGTH {
                    match best {
                        Some(b) if alignments[b].e_a >= al.e_a => {}
                        _ => best = Some(i),
                    }
                }
            }
        }
        best
    }

    /// Try to bridge backward from the current anchor to the target
    /// alignment. On success the two alignments fuse into one;
    /// otherwise, with extension enabled, the anchor is extended
    /// backward as far as the score allows. Returns the index of the
    /// alignment that now carries the cluster's growing end.
    fn extend_backward(
        &self,
        alignments: &mut Vec<Alignment>,
        curr: usize,
        target: usize,
        apad: &[u8],
        bpad: &[u8],
    ) -> usize {
        let (t_ea, t_eb) = (alignments[target].e_a, alignments[target].e_b);
        let (c_sa, c_sb) = (alignments[curr].s_a, alignments[curr].s_b);

        let fused = if c_sa == t_ea + 1 && c_sb == t_eb + 1 {
            // adjacent: nothing to align between them
            Some(Vec::new())
        } else if c_sa > t_ea + 1 && c_sb > t_eb + 1 {
            let mut aend = t_ea + 1;
            let mut bend = t_eb + 1;
            let reached = self.aligner.align_search(
                bpad,
                c_sb - 1,
                &mut bend,
                apad,
                c_sa - 1,
                &mut aend,
                OPTIMAL_BACKWARD_SEARCH,
            );
            if reached {
                // the gap aligns; produce its script forward
                let mut gap_delta = Vec::new();
                let mut aend = c_sa - 1;
                let mut bend = c_sb - 1;
                let ok = self.aligner.align_target(
                    bpad,
                    t_eb + 1,
                    &mut bend,
                    apad,
                    t_ea + 1,
                    &mut aend,
                    &mut gap_delta,
                    FORCED_FORWARD_ALIGN,
                );
                debug_assert!(ok);
                gap_delta.pop(); // terminator
                Some(gap_delta)
            } else {
                None
            }
        } else {
            None
        };

        match fused {
            Some(gap_delta) => {
                let curr_al = alignments.remove(curr);
                let target_al = &mut alignments[target];
                target_al.append_delta(&gap_delta);
                // the anchor region itself is all matches
                target_al.e_a = curr_al.e_a;
                target_al.e_b = curr_al.e_b;
                target
            }
            None => {
                if self.config.do_extend {
                    self.extend_backward_open(&mut alignments[curr], apad, bpad);
                }
                curr
            }
        }
    }

    /// Extend an alignment backward into open sequence until the
    /// score falls off, then rebuild its leading edit script.
    fn extend_backward_open(&self, al: &mut Alignment, apad: &[u8], bpad: &[u8]) {
        loop {
            if al.s_a <= 1 || al.s_b <= 1 {
                return;
            }
            let lo_a = (al.s_a - MAX_SEARCH_LENGTH).max(1);
            let lo_b = (al.s_b - MAX_SEARCH_LENGTH).max(1);
            let mut aend = lo_a;
            let mut bend = lo_b;
            let reached = self.aligner.align_search(
                bpad,
                al.s_b - 1,
                &mut bend,
                apad,
                al.s_a - 1,
                &mut aend,
                OPTIMAL_BACKWARD_SEARCH,
            );
            if aend >= al.s_a || bend >= al.s_b {
                return; // no progress
            }
            let mut piece = Vec::new();
            let mut ta = al.s_a - 1;
            let mut tb = al.s_b - 1;
            let ok = self.aligner.align_target(
                bpad,
                bend,
                &mut tb,
                apad,
                aend,
                &mut ta,
                &mut piece,
                FORCED_FORWARD_ALIGN,
            );
            debug_assert!(ok);
            piece.pop();

            // prepend: the new piece leads, the existing script keeps
            // its distances relative to the new start
            let mut merged = Alignment {
                dir_b: al.dir_b,
                s_a: aend,
                s_b: bend,
                e_a: aend - 1,
                e_b: bend - 1,
                delta: Vec::new(),
                delta_apos: 0,
                errors: 0,
                sim_errors: 0,
                non_alphas: 0,
            };
            merged.append_delta(&piece);
            merged.e_a = al.s_a - 1;
            merged.e_b = al.s_b - 1;
            let old_delta = std::mem::take(&mut al.delta);
            merged.append_delta(&old_delta);

            al.s_a = merged.s_a;
            al.s_b = merged.s_b;
            al.delta = merged.delta;
            al.delta_apos = merged.delta_apos;

            if reached {
                // hit the window edge with a good score, keep going
                if al.s_a > 1 && al.s_b > 1 {
                    continue;
                }
            }
            return;
        }
    }

    /// Aim the current alignment forward at the end of the next
    /// cluster match. If the gap aligns, the alignment absorbs the
    /// match; otherwise a new alignment is opened at the match.
    fn extend_through_match(
        &self,
        alignments: &mut Vec<Alignment>,
        curr: usize,
        m: &Match,
        dir: i8,
        apad: &[u8],
        bpad: &[u8],
    ) -> usize {
        let m_ea = m.s_a + m.len - 1;
        let m_eb = m.s_b + m.len - 1;
        {
            let al = &mut alignments[curr];
            if m_ea <= al.e_a || m_eb <= al.e_b {
                return curr; // match adds nothing beyond the current end
            }
            let span_a = m_ea - al.e_a;
            let span_b = m_eb - al.e_b;
            if span_a <= MAX_ALIGNMENT_LENGTH && span_b <= MAX_ALIGNMENT_LENGTH {
                let mut aend = m_ea;
                let mut bend = m_eb;
                let mut piece = Vec::new();
                let reached = self.aligner.align_target(
                    bpad,
                    al.e_b + 1,
                    &mut bend,
                    apad,
                    al.e_a + 1,
                    &mut aend,
                    &mut piece,
                    FORWARD_ALIGN,
                );
                if reached {
                    piece.pop();
                    al.append_delta(&piece);
                    al.e_a = m_ea;
                    al.e_b = m_eb;
                    return curr;
                }
            }
        }
        // falloff: open a new alignment seeded at this match
        alignments.push(Alignment::from_anchor(m, dir));
        alignments.len() - 1
    }

    /// Extend the last alignment of a cluster forward, in bounded
    /// windows, toward the next cluster's anchor or the sequence
    /// ends.
    fn extend_forward_tail(
        &self,
        al: &mut Alignment,
        apad: &[u8],
        bpad: &[u8],
        target_a: i64,
        target_b: i64,
        alen: i64,
        blen: i64,
    ) {
        let (goal_a, goal_b) = if self.config.to_seqend { (alen, blen) } else { (target_a, target_b) };
        let m_o = if self.config.to_seqend { FORCED_FORWARD_SEARCH } else { OPTIMAL_FORWARD_SEARCH };

        loop {
            if al.e_a >= goal_a || al.e_b >= goal_b {
                return;
            }
            let win_a = goal_a.min(al.e_a + MAX_SEARCH_LENGTH);
            let win_b = goal_b.min(al.e_b + MAX_SEARCH_LENGTH);
            let mut aend = win_a;
            let mut bend = win_b;
            let reached = self.aligner.align_search(
                bpad,
                al.e_b + 1,
                &mut bend,
                apad,
                al.e_a + 1,
                &mut aend,
                m_o,
            );
            if aend <= al.e_a || bend <= al.e_b {
                return; // no progress
            }
            let mut piece = Vec::new();
            let (fa, fb) = (aend, bend);
            let mut ta = fa;
            let mut tb = fb;
            let ok = self.aligner.align_target(
                bpad,
                al.e_b + 1,
                &mut tb,
                apad,
                al.e_a + 1,
                &mut ta,
                &mut piece,
                FORCED_FORWARD_ALIGN,
            );
            debug_assert!(ok);
            piece.pop();
            al.append_delta(&piece);
            al.e_a = fa;
            al.e_b = fb;

            if !(reached && fa == win_a && fb == win_b && (fa < goal_a || fb < goal_b)) {
                return;
            }
        }
    }

    /// Recount the error totals of an alignment by replaying its edit
    /// script against the sequences.
    fn validate_alignment(&self, al: &mut Alignment, apad: &[u8], bpad: &[u8]) {
        let matrix = self.aligner.matrix_type();
        let mut rp = al.s_a;
        let mut qp = al.s_b;
        let mut errors = 0i64;
        let mut sim_errors = 0i64;
        let mut non_alphas = 0i64;

        let mut column = |a: Option<u8>, b: Option<u8>| {
            match (a, b) {
                (Some(x), Some(y)) => {
                    if scores::is_non_alpha(matrix, x) {
                        non_alphas += 1;
                    }
                    if scores::is_non_alpha(matrix, y) {
                        non_alphas += 1;
                    }
                    if !x.eq_ignore_ascii_case(&y) {
                        errors += 1;
                        if scores::match_score(matrix, x, y) < 0 {
                            sim_errors += 1;
                        }
                    }
                }
                _ => {
                    errors += 1;
                    sim_errors += 1;
                }
            }
        };

        for &d in &al.delta {
            for _ in 0..d.abs() - 1 {
                column(Some(apad[rp as usize]), Some(bpad[qp as usize]));
                rp += 1;
                qp += 1;
            }
            if d > 0 {
                // insertion in A: B is gapped
                column(Some(apad[rp as usize]), None);
                rp += 1;
            } else {
                // deletion from A: A is gapped
                column(None, Some(bpad[qp as usize]));
                qp += 1;
            }
        }
        while rp <= al.e_a && qp <= al.e_b {
            column(Some(apad[rp as usize]), Some(bpad[qp as usize]));
            rp += 1;
            qp += 1;
        }
        debug_assert_eq!(rp, al.e_a + 1);
        debug_assert_eq!(qp, al.e_b + 1);

        al.errors = errors;
        al.sim_errors = sim_errors;
        al.non_alphas = non_alphas;
    }
}

/// Where the forward tail extends to: just short of the first match
/// of the nearest following cluster on the same strand, so a
/// successful extension meets it and the next cluster's backward pass
/// can fuse the two; the sequence ends otherwise.
fn forward_target(clusters: &[Cluster], ci: usize, alen: i64, blen: i64) -> (i64, i64) {
    let cur = &clusters[ci];
    let last = cur.matches.last().expect("non-empty cluster");
    let end_a = last.s_a + last.len - 1;
    let end_b = last.s_b + last.len - 1;

    let mut target = (alen, blen);
    for c in &clusters[ci + 1..] {
        if c.dir_b != cur.dir_b {
            continue;
        }
        if let Some(first) = c.matches.first() {
            if first.s_a > end_a && first.s_b > end_b {
                target = ((first.s_a - 1).min(alen), (first.s_b - 1).min(blen));
                break;
            }
        }
    }
    target
}

/// A cluster is shadowed when some existing alignment on the same
/// strand spans it entirely in both sequences.
pub fn is_shadowed_cluster(cluster: &Cluster, alignments: &[Alignment]) -> bool {
    let first = match cluster.matches.first() {
        Some(m) => m,
        None => return false,
    };
    let last = cluster.matches.last().expect("non-empty cluster");
    let (lo_a, hi_a) = (first.s_a, last.s_a + last.len - 1);
    let lo_b = cluster.matches.iter().map(|m| m.s_b).min().expect("non-empty cluster");
    let hi_b = cluster.matches.iter().map(|m| m.s_b + m.len - 1).max().expect("non-empty cluster");

    alignments.iter().any(|al| {
        al.dir_b == cluster.dir_b
            && al.s_a <= lo_a
            && al.e_a >= hi_a
            && al.s_b <= lo_b
            && al.e_b >= hi_b
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    fn merger() -> SyntenyMerger {
        SyntenyMerger::new(MergeConfig::default(), Aligner::default())
    }

    fn single_cluster(matches: Vec<Match>) -> Vec<Cluster> {
        vec![Cluster { was_fused: false, dir_b: FORWARD_CHAR, matches }]
    }

    #[test]
    fn test_identical_sequences_single_alignment() {
        let seq = b"ACGTACGTTTGGCCATATAGGCTT".to_vec();
        let rc = Sequence::new("q", seq.clone()).reverse_complement().seq;
        let mut clusters = single_cluster(vec![Match { s_a: 1, s_b: 1, len: 24 }]);
        let als = merger().extend_clusters(&mut clusters, &seq, &seq, &rc);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!((al.s_a, al.e_a, al.s_b, al.e_b), (1, 24, 1, 24));
        assert!(al.delta.is_empty());
        assert_eq!(al.errors, 0);
        assert_eq!(al.delta_apos, 0);
    }

    #[test]
    fn test_two_matches_fuse_across_small_gap() {
        // reference and query identical except one substitution
        // between the two exact matches
        let a = b"ACGTACGTTTGGCCATATAGGCTTACGT".to_vec();
        let mut b = a.clone();
        b[13] = b'G'; // breaks the exact match in the middle
        let rc = Sequence::new("q", b.clone()).reverse_complement().seq;

        let mut clusters = single_cluster(vec![
            Match { s_a: 1, s_b: 1, len: 13 },
            Match { s_a: 15, s_b: 15, len: 14 },
        ]);
        let als = merger().extend_clusters(&mut clusters, &a, &b, &rc);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!((al.s_a, al.e_a), (1, 28));
        assert_eq!((al.s_b, al.e_b), (1, 28));
        // one substitution, no indels
        assert!(al.delta.is_empty());
        assert_eq!(al.errors, 1);
        assert_eq!(al.sim_errors, 1);
    }

    #[test]
    fn test_indel_between_matches_yields_delta() {
        // query lacks one reference base between the matches
        let a = b"ACGTACGTTTGGCCAGATATAGGCTTACGTAA".to_vec(); // 32
        let mut b = a.clone();
        b.remove(15); // drop the 'G' at reference position 16
        let rc = Sequence::new("q", b.clone()).reverse_complement().seq;

        let mut clusters = single_cluster(vec![
            Match { s_a: 1, s_b: 1, len: 15 },
            Match { s_a: 17, s_b: 16, len: 16 },
        ]);
        let als = merger().extend_clusters(&mut clusters, &a, &b, &rc);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!((al.s_a, al.e_a), (1, 32));
        assert_eq!((al.s_b, al.e_b), (1, 31));
        // one insertion in the reference
        assert_eq!(al.delta, vec![16]);
        assert_eq!(al.errors, 1);
        assert_eq!(al.delta_apos, 16);
        // the running invariant
        let apos: i64 = al.delta.iter().map(|d| d.abs()).sum::<i64>()
            - al.delta.iter().filter(|&&d| d < 0).count() as i64;
        assert_eq!(al.delta_apos, apos);
        assert_eq!(al.total(), 32);
    }

    #[test]
    fn test_deletion_from_reference_counts_in_total() {
        // query has one extra base between the matches
        let a = b"ACGTACGTTTGGCCAATATAGGCTTACGTAA".to_vec(); // 31
        let mut b = a.clone();
        b.insert(15, b'G');
        let rc = Sequence::new("q", b.clone()).reverse_complement().seq;

        let mut clusters = single_cluster(vec![
            Match { s_a: 1, s_b: 1, len: 15 },
            Match { s_a: 16, s_b: 17, len: 16 },
        ]);
        let als = merger().extend_clusters(&mut clusters, &a, &b, &rc);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!(al.delta, vec![-16]);
        assert_eq!(al.total(), 32);
        assert_eq!(al.delta_apos, 15);
        assert!(al.errors >= 1 && al.errors <= al.total());
    }

    #[test]
    fn test_shadowed_cluster_is_dropped() {
        let seq = b"ACGTACGTTTGGCCATATAGGCTTACGTACGT".to_vec();
        let rc = Sequence::new("q", seq.clone()).reverse_complement().seq;
        let mut clusters = vec![
            Cluster {
                was_fused: false,
                dir_b: FORWARD_CHAR,
                matches: vec![Match { s_a: 1, s_b: 1, len: 32 }],
            },
            Cluster {
                was_fused: false,
                dir_b: FORWARD_CHAR,
                matches: vec![Match { s_a: 5, s_b: 5, len: 10 }],
            },
        ];
        let als = merger().extend_clusters(&mut clusters, &seq, &seq, &rc);
        assert_eq!(als.len(), 1);
        assert!(clusters.iter().any(|c| c.was_fused));
    }

    #[test]
    fn test_alignments_ordered_by_reference_start() {
        let seq = b"ACGTACGTTTGGCCATATAGGCTTACGTACGTTTTTGGGGCCCCAAAA".to_vec();
        let rc = Sequence::new("q", seq.clone()).reverse_complement().seq;
        let mut clusters = vec![
            Cluster {
                was_fused: false,
                dir_b: FORWARD_CHAR,
                matches: vec![Match { s_a: 30, s_b: 30, len: 12 }],
            },
            Cluster {
                was_fused: false,
                dir_b: FORWARD_CHAR,
                matches: vec![Match { s_a: 1, s_b: 1, len: 12 }],
            },
        ];
        let cfg = MergeConfig { do_extend: false, ..Default::default() };
        let merger = SyntenyMerger::new(cfg, Aligner::default());
        let als = merger.extend_clusters(&mut clusters, &seq, &seq, &rc);
        for w in als.windows(2) {
            assert!(w[0].s_a <= w[1].s_a);
        }
    }

    #[test]
    fn test_extension_reaches_sequence_ends() {
        // a single seed in the middle of identical sequences must
        // grow to cover them entirely when extension is on
        let seq = b"ACGTACGTTTGGCCATATAGGCTTACGTACGT".to_vec();
        let rc = Sequence::new("q", seq.clone()).reverse_complement().seq;
        let mut clusters = single_cluster(vec![Match { s_a: 10, s_b: 10, len: 8 }]);
        let als = merger().extend_clusters(&mut clusters, &seq, &seq, &rc);
        assert_eq!(als.len(), 1);
        let al = &als[0];
        assert_eq!((al.s_a, al.e_a), (1, 32));
        assert_eq!((al.s_b, al.e_b), (1, 32));
        assert_eq!(al.errors, 0);
    }

    #[test]
    fn test_rev_coord() {
        assert_eq!(rev_coord(1, 10), 10);
        assert_eq!(rev_coord(10, 10), 1);
        assert_eq!(rev_coord(4, 10), 7);
    }
}

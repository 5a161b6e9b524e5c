//! Seed match clustering.
//!
//! Reads runs of seed matches (one run per reference/query pair and
//! strand) and groups them into clusters that may represent longer,
//! inexact matches: a containment filter removes matches internal to
//! repeats, union-find joins matches on nearby diagonals, and a small
//! chain DP extracts the best colinear chains from each connected
//! component.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};

pub const DEFAULT_FIXED_DIAG_DIFF: i64 = 5;
pub const DEFAULT_MAX_SEPARATION: i64 = 1000;
pub const DEFAULT_MIN_OUTPUT_SCORE: i64 = 200;
pub const DEFAULT_SEPARATION_FACTOR: f64 = 0.05;

/// Clustering knobs, defaulting to the values the command line
/// exposes.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Fixed diagonal difference to join matches
    pub fixed_diag_diff: i64,
    /// Maximum separation between matches in a cluster
    pub max_separation: i64,
    /// Minimum score for a cluster to be reported
    pub min_output_score: i64,
    /// Fraction of the separation allowed as diagonal difference
    pub separation_factor: f64,
    /// Score clusters by extent (end minus start) instead of summed
    /// piece lengths
    pub use_extents: bool,
    /// Require every second header to be a Reverse header
    pub check_labels: bool,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            fixed_diag_diff: DEFAULT_FIXED_DIAG_DIFF,
            max_separation: DEFAULT_MAX_SEPARATION,
            min_output_score: DEFAULT_MIN_OUTPUT_SCORE,
            separation_factor: DEFAULT_SEPARATION_FACTOR,
            use_extents: false,
            check_labels: false,
        }
    }
}

/// One seed match inside the clusterer, with its chain-DP workspace.
#[derive(Debug, Clone, Copy)]
struct SeedMatch {
    start1: i64,
    start2: i64,
    len: i64,
    score: i64,
    from: isize,
    adj: i64,
    good: bool,
    tentative: bool,
}

impl SeedMatch {
    fn new(start1: i64, start2: i64, len: i64) -> Self {
        SeedMatch {
            start1,
            start2,
            len,
            score: 0,
            from: -1,
            adj: 0,
            good: false,
            tentative: false,
        }
    }
}

/// One reported row of a chain. `adj` is how many leading bases were
/// trimmed to remove overlap with the previous row; the gaps are the
/// distances to the previous row's end in each sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub start1: i64,
    pub start2: i64,
    pub len: i64,
    pub adj: i64,
    pub gap1: i64,
    pub gap2: i64,
    pub first: bool,
}

/// A cluster: one best chain of colinear matches.
pub type Chain = Vec<ChainEntry>;

/// Union-find over match indices with explicit parent and size
/// tables.
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<u32>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        DisjointSet { parent: (0..n).collect(), size: vec![1; n] }
    }

    pub fn find(&mut self, a: usize) -> usize {
        let mut root = a;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = a;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return;
        }
        if self.size[a] >= self.size[b] {
            self.size[a] += self.size[b];
            self.parent[b] = a;
        } else {
            self.size[b] += self.size[a];
            self.parent[a] = b;
        }
    }
}

/// Remove matches internal to a repeat: a later match that starts
/// before an earlier one ends and shares a start coordinate is
/// suppressed when the overlap covers at least half of either piece.
/// Matches on the same diagonal are combined. Input must be sorted by
/// `start2`.
fn filter_matches(matches: &mut Vec<SeedMatch>) {
    let n = matches.len();
    for m in matches.iter_mut() {
        m.good = true;
    }

    for i in 0..n.saturating_sub(1) {
        if !matches[i].good {
            continue;
        }
        let i_diag = matches[i].start2 - matches[i].start1;
        let mut i_end = matches[i].start2 + matches[i].len;

        let mut j = i + 1;
        while j < n && matches[j].start2 <= i_end {
            if !matches[j].good {
                j += 1;
                continue;
            }
            let j_diag = matches[j].start2 - matches[j].start1;
            if i_diag == j_diag {
                let j_extent = matches[j].len + matches[j].start2 - matches[i].start2;
                if j_extent > matches[i].len {
                    matches[i].len = j_extent;
                    i_end = matches[i].start2 + j_extent;
                }
                matches[j].good = false;
            } else if matches[i].start1 == matches[j].start1 {
                let olap = matches[i].start2 + matches[i].len - matches[j].start2;
                if matches[i].len < matches[j].len {
                    if olap >= matches[i].len / 2 {
                        matches[i].good = false;
                        break;
                    }
                } else if matches[j].len < matches[i].len {
                    if olap >= matches[j].len / 2 {
                        matches[j].good = false;
                    }
                } else if olap >= matches[i].len / 2 {
                    matches[j].tentative = true;
                    if matches[i].tentative {
                        matches[i].good = false;
                        break;
                    }
                }
            } else if matches[i].start2 == matches[j].start2 {
                let olap = matches[i].start1 + matches[i].len - matches[j].start1;
                if matches[i].len < matches[j].len {
                    if olap >= matches[i].len / 2 {
                        matches[i].good = false;
                        break;
                    }
                } else if matches[j].len < matches[i].len {
                    if olap >= matches[j].len / 2 {
                        matches[j].good = false;
                    }
                } else if olap >= matches[i].len / 2 {
                    matches[j].tentative = true;
                    if matches[i].tentative {
                        matches[i].good = false;
                        break;
                    }
                }
            }
            j += 1;
        }
    }

    matches.retain(|m| m.good);
    for m in matches.iter_mut() {
        m.good = false;
    }
}

/// Extract the best chains from one connected component, repeating
/// until every match has been assigned to a chain. Chains scoring
/// below the output threshold are dropped.
fn process_cluster(mut matches: Vec<SeedMatch>, params: &ClusterParams) -> Vec<Chain> {
    let mut chains = Vec::new();

    while !matches.is_empty() {
        let n = matches.len();
        for i in 0..n {
            matches[i].score = matches[i].len;
            matches[i].adj = 0;
            matches[i].from = -1;
            for j in 0..i {
                let olap1 = matches[j].start1 + matches[j].len - matches[i].start1;
                let mut olap = olap1.max(0);
                let olap2 = matches[j].start2 + matches[j].len - matches[i].start2;
                olap = olap.max(olap2);

                // penalize off-diagonal matches
                let pen = olap
                    + ((matches[i].start2 - matches[i].start1)
                        - (matches[j].start2 - matches[j].start1))
                        .abs();

                if matches[j].score + matches[i].len - pen > matches[i].score {
                    matches[i].from = j as isize;
                    matches[i].score = matches[j].score + matches[i].len - pen;
                    matches[i].adj = olap;
                }
            }
        }

        let mut best = 0;
        for i in 1..n {
            if matches[i].score > matches[best].score {
                best = i;
            }
        }

        let mut total = 0;
        let mut hi = i64::MIN;
        let mut lo = i64::MAX;
        let mut i = best as isize;
        while i >= 0 {
            let m = &mut matches[i as usize];
            m.good = true;
            total += m.len;
            hi = hi.max(m.start1 + m.len);
            lo = lo.min(m.start1);
            i = m.from;
        }
        let extent = hi - lo;

        let score = if params.use_extents { extent } else { total };
        if score >= params.min_output_score {
            let mut chain = Vec::new();
            let mut prev: isize = -1;
            for i in 0..n {
                if !matches[i].good {
                    continue;
                }
                let m = matches[i];
                if prev < 0 {
                    chain.push(ChainEntry {
                        start1: m.start1,
                        start2: m.start2,
                        len: m.len,
                        adj: 0,
                        gap1: 0,
                        gap2: 0,
                        first: true,
                    });
                } else {
                    let p = matches[prev as usize];
                    let adj = m.adj;
                    chain.push(ChainEntry {
                        start1: m.start1 + adj,
                        start2: m.start2 + adj,
                        len: m.len - adj,
                        adj,
                        gap1: m.start1 + adj - p.start1 - p.len,
                        gap2: m.start2 + adj - p.start2 - p.len,
                        first: false,
                    });
                }
                prev = i as isize;
            }
            chains.push(chain);
        }

        matches.retain(|m| !m.good);
    }

    chains
}

/// Cluster the matches of one run. Input triples are
/// (reference start, query start, length).
pub fn cluster_matches(input: &[(i64, i64, i64)], params: &ClusterParams) -> Vec<Chain> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<SeedMatch> =
        input.iter().map(|&(s1, s2, len)| SeedMatch::new(s1, s2, len)).collect();
    matches.sort_by_key(|m| (m.start2, m.start1));
    filter_matches(&mut matches);

    let n = matches.len();
    let mut uf = DisjointSet::new(n);
    for i in 0..n.saturating_sub(1) {
        let i_end = matches[i].start2 + matches[i].len;
        let i_diag = matches[i].start2 - matches[i].start1;
        for j in (i + 1)..n {
            let sep = matches[j].start2 - i_end;
            if sep > params.max_separation {
                break;
            }
            let diag_diff = ((matches[j].start2 - matches[j].start1) - i_diag).abs();
            let limit = params
                .fixed_diag_diff
                .max((params.separation_factor * sep as f64).ceil() as i64);
            if diag_diff <= limit {
                uf.union(i, j);
            }
        }
    }

    // group the matches of each connected component together
    let mut keyed: Vec<(usize, SeedMatch)> =
        (0..n).map(|i| (uf.find(i), matches[i])).collect();
    keyed.sort_by_key(|&(id, m)| (id, m.start2, m.start1));

    let mut chains = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && keyed[end].0 == keyed[start].0 {
            end += 1;
        }
        let component: Vec<SeedMatch> = keyed[start..end].iter().map(|&(_, m)| m).collect();
        chains.extend(process_cluster(component, params));
        start = end;
    }

    chains
}

/// Write one run's header and chains: eight whitespace-separated
/// columns per row, first row showing `none - -`, each chain
/// terminated by a `#` line.
pub fn write_clusters(out: &mut dyn Write, header: &str, chains: &[Chain]) -> Result<()> {
    writeln!(out, "{header}")?;
    for chain in chains {
        for e in chain {
            if e.first {
                writeln!(
                    out,
                    "{:>8} {:>8} {:>6} {:>7} {:>6} {:>6}",
                    e.start1, e.start2, e.len, "none", "-", "-"
                )?;
            } else if e.adj == 0 {
                writeln!(
                    out,
                    "{:>8} {:>8} {:>6} {:>7} {:>6} {:>6}",
                    e.start1, e.start2, e.len, "none", e.gap1, e.gap2
                )?;
            } else {
                writeln!(
                    out,
                    "{:>8} {:>8} {:>6} {:>7} {:>6} {:>6}",
                    e.start1, e.start2, e.len, -e.adj, e.gap1, e.gap2
                )?;
            }
        }
        writeln!(out, "#")?;
    }
    Ok(())
}

/// Stream the text protocol: `>` header lines delimit runs and pass
/// through unchanged; body lines are `refStart qryStart length`
/// triples. Unparsable lines are discarded with a diagnostic.
pub fn cluster_stream(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    params: &ClusterParams,
) -> Result<()> {
    let mut header: Option<String> = None;
    let mut run: Vec<(i64, i64, i64)> = Vec::new();
    let mut header_count = 0usize;

    let mut flush = |header: &Option<String>,
                     run: &mut Vec<(i64, i64, i64)>,
                     output: &mut dyn Write|
     -> Result<()> {
        if let Some(h) = header {
            let chains = cluster_matches(run, params);
            write_clusters(output, h, &chains)?;
        }
        run.clear();
        Ok(())
    };

    for line in input.lines() {
        let line = line?;
        if line.starts_with('>') {
            flush(&header, &mut run, output)?;
            header_count += 1;
            if params.check_labels && header_count % 2 == 0 && !line.contains("Reverse") {
                return Err(Error::malformed(format!(
                    "expected a Reverse header, got '{line}'"
                )));
            }
            header = Some(line);
        } else if !line.trim().is_empty() {
            let mut it = line.split_whitespace();
            let triple = (|| {
                let a = it.next()?.parse::<i64>().ok()?;
                let b = it.next()?.parse::<i64>().ok()?;
                let c = it.next()?.parse::<i64>().ok()?;
                Some((a, b, c))
            })();
            match triple {
                Some(t) if header.is_some() => run.push(t),
                _ => eprintln!("mgaps: discarding unparsable line: {line}"),
            }
        }
    }
    flush(&header, &mut run, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_threshold_suppresses_small_cluster() {
        // the first three matches chain on one diagonal band, the
        // fourth drifts too far; total score 23 is far below the
        // default threshold of 200, so nothing is reported
        let matches = [(1, 1, 10), (12, 11, 5), (25, 25, 8), (200, 210, 6)];
        let chains = cluster_matches(&matches, &ClusterParams::default());
        assert!(chains.is_empty());
    }

    #[test]
    fn test_cluster_emitted_above_threshold() {
        let matches = [(1, 1, 150), (160, 161, 120)];
        let chains = cluster_matches(&matches, &ClusterParams::default());
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        assert_eq!(chain.len(), 2);
        assert!(chain[0].first);
        assert_eq!((chain[0].start1, chain[0].start2, chain[0].len), (1, 1, 150));
        assert!(!chain[1].first);
        assert_eq!(chain[1].gap1, 160 - 1 - 150);
        assert_eq!(chain[1].gap2, 161 - 1 - 150);
    }

    #[test]
    fn test_diagonal_drift_bound_holds() {
        let params = ClusterParams { min_output_score: 10, ..Default::default() };
        let matches = [
            (1, 1, 30),
            (40, 42, 30),
            (80, 83, 30),
            (5000, 9000, 30), // far off every diagonal
        ];
        let chains = cluster_matches(&matches, &params);
        for chain in &chains {
            for w in chain.windows(2) {
                let sep = w[1].start2 - (w[0].start2 + w[0].len);
                assert!(sep <= params.max_separation);
                let d0 = w[0].start2 - w[0].start1;
                let d1 = w[1].start2 - w[1].start1;
                let limit = params
                    .fixed_diag_diff
                    .max((params.separation_factor * sep as f64).ceil() as i64);
                assert!((d1 - d0).abs() <= limit);
            }
        }
        // the outlier must not share a chain with the colinear run
        assert!(chains.iter().all(|c| {
            let has_outlier = c.iter().any(|e| e.start1 >= 5000);
            let has_run = c.iter().any(|e| e.start1 < 5000);
            !(has_outlier && has_run)
        }));
    }

    #[test]
    fn test_overlap_adjustment_trims_rows() {
        let params = ClusterParams { min_output_score: 10, ..Default::default() };
        // second match overlaps the first by 5 in the query and sits
        // two diagonals off
        let matches = [(1, 1, 50), (48, 46, 50)];
        let chains = cluster_matches(&matches, &params);
        assert_eq!(chains.len(), 1);
        let row = chains[0][1];
        assert_eq!(row.adj, 5);
        assert_eq!(row.start1, 53);
        assert_eq!(row.start2, 51);
        assert_eq!(row.len, 45);
        assert_eq!(row.gap1, 2);
        assert_eq!(row.gap2, 0);
    }

    #[test]
    fn test_same_diagonal_matches_are_combined() {
        let params = ClusterParams { min_output_score: 10, ..Default::default() };
        // overlapping matches on one diagonal merge into one piece
        let matches = [(1, 1, 50), (46, 46, 50)];
        let chains = cluster_matches(&matches, &params);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 1);
        assert_eq!((chains[0][0].start1, chains[0][0].len), (1, 95));
    }

    #[test]
    fn test_repeat_filter_drops_contained_match() {
        let params = ClusterParams { min_output_score: 10, ..Default::default() };
        // two matches share a query start; the shorter is mostly
        // covered by the longer and must be filtered out
        let matches = [(1, 1, 100), (20, 1, 40)];
        let chains = cluster_matches(&matches, &params);
        let reported: Vec<i64> = chains.iter().flatten().map(|e| e.start1).collect();
        assert_eq!(reported, vec![1]);
    }

    #[test]
    fn test_stream_roundtrip_and_header_passthrough() {
        let input = "> seq1 vs seq2\n\
                     1 1 150\n\
                     160 161 120\n\
                     garbage line\n\
                     > seq1 vs seq2 Reverse\n";
        let mut out = Vec::new();
        cluster_stream(&mut input.as_bytes(), &mut out, &ClusterParams::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("> seq1 vs seq2"));
        let row1 = lines.next().unwrap();
        assert_eq!(
            row1.split_whitespace().collect::<Vec<_>>(),
            vec!["1", "1", "150", "none", "-", "-"]
        );
        let row2 = lines.next().unwrap();
        assert_eq!(
            row2.split_whitespace().collect::<Vec<_>>(),
            vec!["160", "161", "120", "none", "9", "10"]
        );
        assert_eq!(lines.next(), Some("#"));
        assert_eq!(lines.next(), Some("> seq1 vs seq2 Reverse"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_check_labels() {
        let params = ClusterParams { check_labels: true, ..Default::default() };
        let good = "> a\n> a Reverse\n";
        let mut out = Vec::new();
        cluster_stream(&mut good.as_bytes(), &mut out, &params).unwrap();

        let bad = "> a\n> a forward again\n";
        let mut out = Vec::new();
        assert!(cluster_stream(&mut bad.as_bytes(), &mut out, &params).is_err());
    }
}

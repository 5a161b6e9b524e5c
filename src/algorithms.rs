//! Core match-finding algorithms: MUM, MAM, MEM
//! Maximal Unique Match (MUM), Maximal Almost-Unique Match (MAM), Maximal Exact Match (MEM)

use crate::error::Result;
use crate::suffix_array::{Match, SparseSuffixArray};
use crate::suffix_tree::SuffixTree;

/// Match types for the different seed-finding algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Maximal Unique Match: unique in both sequences
    MUM,
    /// Maximal Almost-Unique Match: unique in the reference only
    MAM,
    /// Maximal Exact Match: no uniqueness constraint
    MEM,
}

/// Which suffix index implementation backs the seed search. Both
/// expose the same query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    SuffixArray,
    SuffixTree,
}

/// A text index over the reference, with interchangeable back-ends.
pub enum SuffixIndex {
    Array(SparseSuffixArray),
    Tree(SuffixTree),
}

impl SuffixIndex {
    /// Build the chosen back-end over `text`, sampling every `k`-th
    /// suffix.
    pub fn build(kind: IndexKind, text: &[u8], k: usize) -> Result<Self> {
        Ok(match kind {
            IndexKind::SuffixArray => SuffixIndex::Array(SparseSuffixArray::new(text, k)?),
            IndexKind::SuffixTree => SuffixIndex::Tree(SuffixTree::new(text, k)?),
        })
    }

    pub fn sample(&self) -> usize {
        match self {
            SuffixIndex::Array(sa) => sa.sample(),
            SuffixIndex::Tree(t) => t.sample(),
        }
    }

    pub fn text_len(&self) -> usize {
        match self {
            SuffixIndex::Array(sa) => sa.text_len(),
            SuffixIndex::Tree(t) => t.text_len(),
        }
    }

    /// Stream seed matches of the requested flavor for one query.
    pub fn find(&self, kind: MatchType, query: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        match (self, kind) {
            (SuffixIndex::Array(sa), MatchType::MUM) => sa.find_mum(query, min_len, out),
            (SuffixIndex::Array(sa), MatchType::MAM) => sa.find_mam(query, min_len, out),
            (SuffixIndex::Array(sa), MatchType::MEM) => sa.find_mem(query, min_len, out),
            (SuffixIndex::Tree(t), MatchType::MUM) => t.find_mum(query, min_len, out),
            (SuffixIndex::Tree(t), MatchType::MAM) => t.find_mam(query, min_len, out),
            (SuffixIndex::Tree(t), MatchType::MEM) => t.find_mem(query, min_len, out),
        }
    }
}

/// Run one seed-finding pass and collect the matches, ordered by
/// query position then reference position.
pub fn run_match_finder(
    index: &SuffixIndex,
    query: &[u8],
    kind: MatchType,
    min_len: usize,
) -> Vec<Match> {
    let mut matches = Vec::new();
    index.find(kind, query, min_len, &mut |m| matches.push(m));
    matches.sort_by_key(|m| (m.query_pos, m.ref_pos));
    matches
}

/// Map a match found against the reverse complement back to forward
/// query coordinates.
pub fn to_forward_coords(m: Match, query_len: usize) -> Match {
    Match::new(m.ref_pos, query_len as i64 - m.query_pos - m.len, m.len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    #[test]
    fn test_mum_detection_both_backends() {
        // one MUM "ACGTTT" at (ref 4, qry 4)
        for kind in [IndexKind::SuffixArray, IndexKind::SuffixTree] {
            let index = SuffixIndex::build(kind, b"ACGTACGTTT", 1).unwrap();
            let mums = run_match_finder(&index, b"GGGTACGTTT", MatchType::MUM, 5);
            assert_eq!(mums, vec![Match::new(4, 4, 6)], "{kind:?}");
        }
    }

    #[test]
    fn test_mem_includes_repeats() {
        let index = SuffixIndex::build(IndexKind::SuffixArray, b"ACGTACGTTT", 1).unwrap();
        let mems = run_match_finder(&index, b"ACGT", MatchType::MEM, 4);
        let at_zero: Vec<i64> = mems
            .iter()
            .filter(|m| m.query_pos == 0 && m.len == 4)
            .map(|m| m.ref_pos)
            .collect();
        assert_eq!(at_zero, vec![0, 4]);
    }

    #[test]
    fn test_reverse_strand_agrees_with_explicit_reverse_complement() {
        let reference = b"TTACGTACGTGGATCGATTT";
        let query = Sequence::new("q", b"AAATCGATCCACGTACGTAA".to_vec());
        let rc = query.reverse_complement();

        let index = SuffixIndex::build(IndexKind::SuffixArray, reference, 1).unwrap();
        let direct = run_match_finder(&index, &rc.seq, MatchType::MEM, 5);

        // searching the reverse complement must agree bit for bit with
        // an explicit reverse-complemented query
        let index2 = SuffixIndex::build(IndexKind::SuffixTree, reference, 1).unwrap();
        let mut via_tree = run_match_finder(&index2, &rc.seq, MatchType::MEM, 5);
        via_tree.sort_by_key(|m| (m.query_pos, m.ref_pos));
        assert_eq!(direct, via_tree);
        assert!(!direct.is_empty());
    }

    #[test]
    fn test_forward_coordinate_mapping() {
        let m = Match::new(10, 3, 5);
        let mapped = to_forward_coords(m, 20);
        assert_eq!(mapped, Match::new(10, 12, 5));
        // mapping twice restores the original
        assert_eq!(to_forward_coords(mapped, 20), m);
    }
}

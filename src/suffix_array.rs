//! Sparse suffix array back-end for maximal match finding.
//!
//! Indexes every K-th suffix of the reference. Queries stream a
//! pattern through the index: interval descent by binary search,
//! suffix links simulated through the inverse array and LCP interval
//! expansion, and left-maximality checks against the text. Exposes
//! the three match flavors (MEM, MAM, MUM) through one callback
//! surface.

use crate::error::{Error, Result};
use crate::sequence::SENTINEL;
use crate::sufsort;

/// A match found between reference and query sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub ref_pos: i64,   // position in reference sequence
    pub query_pos: i64, // position in query
    pub len: i64,       // length of match
}

impl Match {
    pub fn new(ref_pos: i64, query_pos: i64, len: i64) -> Self {
        Self { ref_pos, query_pos, len }
    }
}

/// LCP storage: one byte per entry, values >= 255 spill into a sorted
/// escape list keyed by index.
#[derive(Debug, Default)]
struct LcpVec {
    vec: Vec<u8>,
    escapes: Vec<(u32, i64)>,
}

impl LcpVec {
    fn with_len(n: usize) -> Self {
        LcpVec { vec: vec![0; n], escapes: Vec::new() }
    }

    fn set(&mut self, idx: usize, v: i64) {
        if v >= u8::MAX as i64 {
            self.vec[idx] = u8::MAX;
            self.escapes.push((idx as u32, v));
        } else {
            self.vec[idx] = v as u8;
        }
    }

    /// Sort the escape list; required before lookups.
    fn init(&mut self) {
        self.escapes.sort_unstable();
    }

    fn get(&self, idx: usize) -> i64 {
        let b = self.vec[idx];
        if b == u8::MAX {
            let p = self
                .escapes
                .binary_search_by_key(&(idx as u32), |&(i, _)| i)
                .expect("escaped lcp value present");
            self.escapes[p].1
        } else {
            b as i64
        }
    }
}

/// An interval of the suffix array sharing a prefix of `depth`
/// characters: ranks `start..=end`.
#[derive(Debug, Clone, Copy)]
struct Interval {
    depth: i64,
    start: i64,
    end: i64,
}

impl Interval {
    fn new(start: i64, end: i64, depth: i64) -> Self {
        Interval { depth, start, end }
    }

    fn reset(&mut self, end: i64) {
        self.start = 0;
        self.end = end;
        self.depth = 0;
    }

    fn size(&self) -> i64 {
        self.end - self.start + 1
    }
}

/// A sparse suffix array over one reference text
pub struct SparseSuffixArray {
    seq: Vec<u8>, // reference padded with sentinels to a K boundary plus one extra block
    orig_len: usize,
    k: i64,          // suffix sampling: 1 = every suffix, 2 = every other, ...
    n: i64,          // padded text length
    logn: i64,       // ceil(log2(n))
    nkm1: i64,       // number of sampled suffixes minus one
    sa: Vec<u32>,    // sampled suffix positions, lexicographic order
    isa: Vec<i32>,   // rank of the suffix at position i*K
    lcp: LcpVec,
    sparse_mult: i64,
}

impl SparseSuffixArray {
    /// Build the index over `text` sampling every `k`-th suffix.
    pub fn new(text: &[u8], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::bad_args("suffix sampling rate must be greater than 0"));
        }
        let k64 = k as i64;
        let orig_len = text.len();

        // Pad to a K boundary plus one extra sentinel block so every
        // in-text comparison terminates before the end of the array.
        let pad = if orig_len % k != 0 { k - orig_len % k } else { 0 };
        let padded_len = orig_len + k + pad;
        let mut seq = Vec::with_capacity(padded_len);
        seq.extend_from_slice(text);
        seq.resize(padded_len, SENTINEL);

        let full = sufsort::build(&seq)?;
        let sa: Vec<u32> = full
            .into_iter()
            .filter(|&p| p as usize % k == 0)
            .map(|p| p as u32)
            .collect();

        let nk = sa.len();
        let mut isa = vec![0i32; nk];
        for (rank, &pos) in sa.iter().enumerate() {
            isa[pos as usize / k] = rank as i32;
        }

        let n = padded_len as i64;
        let mut index = SparseSuffixArray {
            seq,
            orig_len,
            k: k64,
            n,
            logn: (64 - (n as u64).leading_zeros() as i64),
            nkm1: nk as i64 - 1,
            sa,
            isa,
            lcp: LcpVec::with_len(nk),
            sparse_mult: 1,
        };
        index.compute_lcp();
        Ok(index)
    }

    /// Kasai's algorithm adapted to the sampled array: the carried
    /// overlap drops by K instead of 1 per step.
    fn compute_lcp(&mut self) {
        let k = self.k as usize;
        let n = self.n as usize;
        let mut h = 0usize;
        for i in 0..self.sa.len() {
            let r = self.isa[i] as usize;
            if r > 0 {
                let j = self.sa[r - 1] as usize;
                let p = i * k;
                while p + h < n && j + h < n && self.seq[p + h] == self.seq[j + h] {
                    h += 1;
                }
                self.lcp.set(r, h as i64);
            } else {
                self.lcp.set(0, 0);
            }
            h = h.saturating_sub(k);
        }
        self.lcp.init();
    }

    pub fn sample(&self) -> usize {
        self.k as usize
    }

    pub fn text_len(&self) -> usize {
        self.orig_len
    }

    pub fn suffix_array(&self) -> &[u32] {
        &self.sa
    }

    #[inline]
    fn s(&self, i: i64) -> u8 {
        self.seq[i as usize]
    }

    /// Binary search for the left boundary of the `c` interval at
    /// character depth `i` within ranks `[s, e]`.
    fn bsearch_left(&self, c: u8, i: i64, s: i64, e: i64) -> i64 {
        let mut lo = s;
        let mut hi = e + 1;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.s(self.sa[mid as usize] as i64 + i) < c {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Binary search for one past the right boundary.
    fn bsearch_right(&self, c: u8, i: i64, s: i64, e: i64) -> i64 {
        let mut lo = s;
        let mut hi = e + 1;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.s(self.sa[mid as usize] as i64 + i) <= c {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Narrow `[start, end]` to the suffixes whose character at depth
    /// `depth` equals `c`. Returns false on an empty result.
    fn top_down(&self, c: u8, depth: i64, start: &mut i64, end: &mut i64) -> bool {
        let l = self.bsearch_left(c, depth, *start, *end);
        let r = self.bsearch_right(c, depth, *start, *end) - 1;
        if l > r {
            return false;
        }
        *start = l;
        *end = r;
        true
    }

    /// Walk the interval down one character at a time until mismatch,
    /// pattern end, or `min_len` matched characters.
    fn traverse(&self, p: &[u8], prefix: i64, cur: &mut Interval, min_len: i64) {
        if prefix + cur.depth >= p.len() as i64 {
            return;
        }
        while prefix + cur.depth < p.len() as i64 {
            let mut start = cur.start;
            let mut end = cur.end;
            if !self.top_down(p[(prefix + cur.depth) as usize], cur.depth, &mut start, &mut end) {
                return;
            }
            cur.depth += 1;
            cur.start = start;
            cur.end = end;
            if cur.depth == min_len {
                return;
            }
        }
    }

    /// Expand an ISA-derived interval to the full interval of its
    /// depth using LCP values. Gives up once the expansion work
    /// exceeds `2 * depth * log n`, in which case the caller rescans
    /// from the root.
    fn expand_link(&self, link: &mut Interval) -> bool {
        let thresh = 2 * link.depth * self.logn;
        let mut exp = 0i64;
        let mut start = link.start;
        let mut end = link.end;
        while start > 0 && self.lcp.get(start as usize) >= link.depth {
            exp += 1;
            if exp >= thresh {
                return false;
            }
            start -= 1;
        }
        while end < self.nkm1 && self.lcp.get(end as usize + 1) >= link.depth {
            exp += 1;
            if exp >= thresh {
                return false;
            }
            end += 1;
        }
        link.start = start;
        link.end = end;
        true
    }

    /// Simulate a suffix link: drop the first K characters.
    fn suffixlink(&self, m: &mut Interval) -> bool {
        m.depth -= self.k;
        if m.depth <= 0 {
            return false;
        }
        m.start = self.isa[(self.sa[m.start as usize] as i64 / self.k + 1) as usize] as i64;
        m.end = self.isa[(self.sa[m.end as usize] as i64 / self.k + 1) as usize] as i64;
        self.expand_link(m)
    }

    /// True if the match of `p` at query offset `p1` / text position
    /// `p2` cannot be extended to the left.
    #[inline]
    fn is_leftmaximal(&self, p: &[u8], p1: i64, p2: i64) -> bool {
        p1 == 0 || p2 == 0 || p[(p1 - 1) as usize] != self.s(p2 - 1)
    }

    /// Advance a right-maximal match to the left up to K steps,
    /// emitting it once left-maximal and long enough.
    fn find_lmaximal(
        &self,
        p: &[u8],
        mut prefix: i64,
        mut i: i64,
        mut len: i64,
        min_len: i64,
        out: &mut dyn FnMut(Match),
    ) {
        for _ in 0..self.sparse_mult * self.k {
            if self.is_leftmaximal(p, prefix, i) {
                if len >= min_len {
                    out(Match::new(i, prefix, len));
                }
                return;
            }
            prefix -= 1;
            i -= 1;
            len += 1;
        }
    }

    /// Collect all MEMs for one query offset given the min-length
    /// interval `mli` and the maximally matched interval `xmi`, using
    /// LCP values to peel back the match depth.
    fn collect_mems(
        &self,
        p: &[u8],
        prefix: i64,
        mli: Interval,
        mut xmi: Interval,
        min_len: i64,
        out: &mut dyn FnMut(Match),
    ) {
        for i in xmi.start..=xmi.end {
            self.find_lmaximal(p, prefix, self.sa[i as usize] as i64, xmi.depth, min_len, out);
        }
        if mli.start == xmi.start && mli.end == xmi.end {
            return;
        }

        while xmi.depth >= mli.depth {
            // unmatch the interval by one LCP step
            xmi.depth = if xmi.end + 1 < self.nkm1 + 1 {
                self.lcp.get(xmi.start as usize).max(self.lcp.get(xmi.end as usize + 1))
            } else {
                self.lcp.get(xmi.start as usize)
            };

            if xmi.depth >= mli.depth {
                while xmi.start > 0 && self.lcp.get(xmi.start as usize) >= xmi.depth {
                    xmi.start -= 1;
                    self.find_lmaximal(
                        p,
                        prefix,
                        self.sa[xmi.start as usize] as i64,
                        xmi.depth,
                        min_len,
                        out,
                    );
                }
                while xmi.end + 1 <= self.nkm1 && self.lcp.get(xmi.end as usize + 1) >= xmi.depth {
                    xmi.end += 1;
                    self.find_lmaximal(
                        p,
                        prefix,
                        self.sa[xmi.end as usize] as i64,
                        xmi.depth,
                        min_len,
                        out,
                    );
                }
            }
            if xmi.depth == 0 {
                break;
            }
        }
    }

    /// Find all maximal exact matches for one sampled query offset.
    fn find_mem_k(&self, p: &[u8], k0: i64, min_len: i64, out: &mut dyn FnMut(Match)) {
        let plen = p.len() as i64;
        let mut prefix = k0;
        let mut mli = Interval::new(0, self.nkm1, 0); // min length interval
        let mut xmi = Interval::new(0, self.nkm1, 0); // max match interval

        let min_len_k = min_len - (self.sparse_mult * self.k - 1);
        let step = self.sparse_mult * self.k;

        while prefix <= plen - min_len_k {
            self.traverse(p, prefix, &mut mli, min_len_k);
            if mli.depth > xmi.depth {
                xmi = mli;
            }
            if mli.depth <= 1 {
                mli.reset(self.nkm1);
                xmi.reset(self.nkm1);
                prefix += step;
                continue;
            }

            if mli.depth >= min_len_k {
                self.traverse(p, prefix, &mut xmi, plen); // traverse until mismatch
                self.collect_mems(p, prefix, mli, xmi, min_len, out);
                prefix += step;
                let mut ok = true;
                for _ in 0..self.sparse_mult {
                    ok = self.suffixlink(&mut mli);
                    if !ok {
                        break;
                    }
                    self.suffixlink(&mut xmi);
                }
                if !ok {
                    mli.reset(self.nkm1);
                    xmi.reset(self.nkm1);
                }
            } else {
                prefix += step;
                let mut ok = true;
                for _ in 0..self.sparse_mult {
                    ok = self.suffixlink(&mut mli);
                    if !ok {
                        break;
                    }
                }
                if ok {
                    xmi = mli;
                } else {
                    mli.reset(self.nkm1);
                    xmi.reset(self.nkm1);
                }
            }
        }
    }

    /// Maximal Exact Matches: maximal both sides, no uniqueness
    /// constraint.
    pub fn find_mem(&self, p: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        if p.is_empty() || min_len == 0 {
            return;
        }
        for k0 in 0..self.k {
            self.find_mem_k(p, k0, min_len as i64, out);
        }
    }

    /// Maximal Almost-unique Matches: unique in the reference, may
    /// repeat in the query, maximal both sides. Streams the query
    /// through the index, so it needs the full (K = 1) array.
    pub fn find_mam(&self, p: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        if self.k != 1 || p.is_empty() || min_len == 0 {
            return;
        }
        let plen = p.len() as i64;
        let min_len = min_len as i64;
        let mut cur = Interval::new(0, self.n - 1, 0);
        let mut prefix = 0i64;

        while prefix < plen {
            self.traverse(p, prefix, &mut cur, plen);
            if cur.depth <= 1 {
                cur.depth = 0;
                cur.start = 0;
                cur.end = self.n - 1;
                prefix += 1;
                continue;
            }
            if cur.size() == 1 && cur.depth >= min_len {
                let r = self.sa[cur.start as usize] as i64;
                if self.is_leftmaximal(p, prefix, r) {
                    out(Match::new(r, prefix, cur.depth));
                }
            }
            loop {
                cur.depth -= 1;
                cur.start = self.isa[(self.sa[cur.start as usize] + 1) as usize] as i64;
                cur.end = self.isa[(self.sa[cur.end as usize] + 1) as usize] as i64;
                prefix += 1;
                if cur.depth == 0 || !self.expand_link(&mut cur) {
                    cur.depth = 0;
                    cur.start = 0;
                    cur.end = self.n - 1;
                    break;
                }
                if !(cur.depth > 0 && cur.size() == 1) {
                    break;
                }
            }
        }
    }

    /// Maximal Unique Matches: MAM candidates filtered down to the
    /// matches unique in both sequences.
    pub fn find_mum(&self, p: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        let mut candidates = Vec::new();
        self.find_mam(p, min_len, &mut |m| candidates.push(m));
        for m in mum_filter(candidates) {
            out(m);
        }
    }

    /// Simple suffix array search for a pattern: the rank interval of
    /// suffixes starting with `pattern`, if any.
    pub fn search(&self, pattern: &[u8]) -> Option<(usize, usize)> {
        if pattern.is_empty() || self.sa.is_empty() {
            return None;
        }
        let mut cur = Interval::new(0, self.nkm1, 0);
        self.traverse(pattern, 0, &mut cur, pattern.len() as i64);
        if cur.depth < pattern.len() as i64 {
            return None;
        }
        Some((cur.start as usize, cur.end as usize))
    }

    /// All occurrences of a pattern in the reference.
    pub fn find_matches(&self, pattern: &[u8]) -> Vec<Match> {
        match self.search(pattern) {
            Some((start, end)) => (start..=end)
                .map(|i| Match::new(self.sa[i] as i64, 0, pattern.len() as i64))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Keep only the match candidates unique in both sequences.
///
/// Adapted from Stephan Kurtz's MUM-candidate cleanup: sort by
/// reference start (longest first on ties), then drop any candidate
/// dominated on the right by its predecessor, and any pair sharing a
/// right endpoint.
pub(crate) fn mum_filter(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by(|a, b| {
        a.ref_pos
            .cmp(&b.ref_pos)
            .then_with(|| b.len.cmp(&a.len))
    });

    let mut out = Vec::with_capacity(matches.len());
    let mut dbright: i64 = 0;
    let mut ignore_previous = false;
    for i in 0..matches.len() {
        let mut ignore_current = false;
        let current_right = matches[i].ref_pos + matches[i].len - 1;
        if dbright > current_right {
            ignore_current = true;
        } else if dbright == current_right {
            ignore_current = true;
            if !ignore_previous && i > 0 && matches[i - 1].ref_pos == matches[i].ref_pos {
                ignore_previous = true;
            }
        } else {
            dbright = current_right;
        }
        if i > 0 && !ignore_previous {
            out.push(matches[i - 1]);
        }
        ignore_previous = ignore_current;
    }
    if !ignore_previous {
        if let Some(&last) = matches.last() {
            out.push(last);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_mems(sa: &SparseSuffixArray, q: &[u8], min_len: usize) -> Vec<Match> {
        let mut v = Vec::new();
        sa.find_mem(q, min_len, &mut |m| v.push(m));
        v.sort_by_key(|m| (m.query_pos, m.ref_pos));
        v
    }

    fn collect_mums(sa: &SparseSuffixArray, q: &[u8], min_len: usize) -> Vec<Match> {
        let mut v = Vec::new();
        sa.find_mum(q, min_len, &mut |m| v.push(m));
        v.sort_by_key(|m| (m.query_pos, m.ref_pos));
        v
    }

    #[test]
    fn test_search_interval() {
        let sa = SparseSuffixArray::new(b"banana", 1).unwrap();
        let (start, end) = sa.search(b"ana").unwrap();
        assert!(start <= end);
        let mut hits: Vec<i64> = sa.find_matches(b"ana").iter().map(|m| m.ref_pos).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 3]);
        assert!(sa.search(b"nab").is_none());
        assert!(sa.search(b"bananana").is_none());
    }

    #[test]
    fn test_mum_detection() {
        // single MUM "ACGTTT" at (ref 4, qry 4)
        let sa = SparseSuffixArray::new(b"ACGTACGTTT", 1).unwrap();
        let mums = collect_mums(&sa, b"GGGTACGTTT", 5);
        assert_eq!(mums, vec![Match::new(4, 4, 6)]);
    }

    #[test]
    fn test_mam_unique_in_reference() {
        let sa = SparseSuffixArray::new(b"ACGTACGTTT", 1).unwrap();
        let mut mams = Vec::new();
        sa.find_mam(b"GGGTACGTTT", 5, &mut |m| mams.push(m));
        assert_eq!(mams, vec![Match::new(4, 4, 6)]);

        // identity query: the full sequence is unique in itself
        let mut mams = Vec::new();
        sa.find_mam(b"ACGTACGTTT", 10, &mut |m| mams.push(m));
        assert_eq!(mams, vec![Match::new(0, 0, 10)]);
    }

    #[test]
    fn test_mem_finds_repeats() {
        let sa = SparseSuffixArray::new(b"ACGTACGTTT", 1).unwrap();
        let mems = collect_mems(&sa, b"ACGT", 4);
        // ACGT occurs at reference 0 and 4
        let mut refs: Vec<i64> = mems
            .iter()
            .filter(|m| m.query_pos == 0 && m.len == 4)
            .map(|m| m.ref_pos)
            .collect();
        refs.sort_unstable();
        assert_eq!(refs, vec![0, 4]);
    }

    #[test]
    fn test_mems_are_maximal_and_correct() {
        let reference = b"TTACGTACGTGGATCGATTT";
        let query = b"CCACGTACGTGGTTCGATCC";
        let sa = SparseSuffixArray::new(reference, 1).unwrap();
        for m in collect_mems(&sa, query, 3) {
            let (r, q, l) = (m.ref_pos as usize, m.query_pos as usize, m.len as usize);
            assert_eq!(&reference[r..r + l], &query[q..q + l]);
            // right-maximal
            if r + l < reference.len() && q + l < query.len() {
                assert_ne!(reference[r + l], query[q + l]);
            }
            // left-maximal
            if r > 0 && q > 0 {
                assert_ne!(reference[r - 1], query[q - 1]);
            }
        }
    }

    #[test]
    fn test_sparse_sampling_agrees_on_long_mems() {
        let reference = b"TTACGTACGTGGATCGATTTACACACGTGTGTGAACCTTGG";
        let query = b"GGACGTACGTGGATCGATCCACACACGTGTGTGA";
        let full = SparseSuffixArray::new(reference, 1).unwrap();
        let sparse = SparseSuffixArray::new(reference, 2).unwrap();
        assert_eq!(sparse.sample(), 2);

        let long_full: Vec<Match> = collect_mems(&full, query, 10);
        let long_sparse: Vec<Match> = collect_mems(&sparse, query, 10);
        // every long match the sparse index reports is a real one the
        // full index also knows
        for m in &long_sparse {
            assert!(long_full.contains(m), "sparse reported {m:?}");
        }
        assert!(!long_sparse.is_empty());
    }

    #[test]
    fn test_mum_uniqueness_property() {
        let reference = b"ACGTACGTTTGGCCATATA";
        let query = b"TTTGGCCATGCACGTT";
        let sa = SparseSuffixArray::new(reference, 1).unwrap();
        for m in collect_mums(&sa, query, 4) {
            let (r, q, l) = (m.ref_pos as usize, m.query_pos as usize, m.len as usize);
            let pat = &reference[r..r + l];
            assert_eq!(pat, &query[q..q + l]);
            let ref_occurrences = reference.windows(l).filter(|w| *w == pat).count();
            assert_eq!(ref_occurrences, 1, "{:?} repeats in reference", std::str::from_utf8(pat));
            let qry_occurrences = query.windows(l).filter(|w| *w == pat).count();
            assert_eq!(qry_occurrences, 1, "{:?} repeats in query", std::str::from_utf8(pat));
        }
    }

    #[test]
    fn test_bad_args_yield_empty_streams() {
        let sa = SparseSuffixArray::new(b"ACGTACGT", 1).unwrap();
        let mut v = Vec::new();
        sa.find_mem(b"", 3, &mut |m| v.push(m));
        sa.find_mam(b"", 3, &mut |m| v.push(m));
        sa.find_mum(b"", 3, &mut |m| v.push(m));
        sa.find_mem(b"ACGT", 0, &mut |m| v.push(m));
        assert!(v.is_empty());
        assert!(SparseSuffixArray::new(b"ACGT", 0).is_err());

        // MAM requires the full array
        let sparse = SparseSuffixArray::new(b"ACGTACGT", 2).unwrap();
        sparse.find_mam(b"ACGT", 2, &mut |m| v.push(m));
        assert!(v.is_empty());
    }
}

//! Banded Smith-Waterman alignment engine.
//!
//! Extends alignments off of clusters of exact matches. The dynamic
//! programming matrix is stored sparsely by antidiagonal: each
//! diagonal holds the scoring nodes between its current lower and
//! upper bounds, widened as the frontier advances and trimmed where
//! the score falls too far below the running best. Search modes free
//! the matrix behind the frontier and report only fall-off
//! positions; target modes keep it for the traceback and emit a
//! delta-encoded edit script.

use std::cell::RefCell;

use crate::error::{Error, Result};
use crate::scores::{self, MatrixType};

//-- Modus operandi bit masks 00001, 00010, 00100, 01000, 10000

pub const DIRECTION_BIT: u32 = 0x1;
pub const SEARCH_BIT: u32 = 0x2;
pub const FORCED_BIT: u32 = 0x4;
pub const OPTIMAL_BIT: u32 = 0x8;
pub const SEQEND_BIT: u32 = 0x10;

//-- Modus operandi of the primary alignment functions

pub const FORWARD_ALIGN: u32 = 0x1;
pub const OPTIMAL_FORWARD_ALIGN: u32 = 0x9;
pub const FORCED_FORWARD_ALIGN: u32 = 0x5;
//-- Align forward until the target is reached or the score decays.
//   Keeps the matrix and produces delta information. OPTIMAL shrinks
//   coverage back to the best score; FORCED marches to the target
//   regardless of score.

pub const FORWARD_SEARCH: u32 = 0x3;
pub const OPTIMAL_FORWARD_SEARCH: u32 = 0xB;
pub const FORCED_FORWARD_SEARCH: u32 = 0x7;

pub const BACKWARD_SEARCH: u32 = 0x2;
pub const OPTIMAL_BACKWARD_SEARCH: u32 = 0xA;
pub const FORCED_BACKWARD_SEARCH: u32 = 0x6;

/// Maximum extent in either sequence for a search.
pub const MAX_SEARCH_LENGTH: i64 = 10000;

/// Maximum extent in either sequence for a targeted alignment.
pub const MAX_ALIGNMENT_LENGTH: i64 = 10000;

const NEG_INF: i64 = i64::MIN / 4;

/// Score slots of a node: the edit choice on the traceback.
const EDIT_MATCH: usize = 0;
/// Gap in A: B advances alone. Emitted as a positive delta.
const EDIT_INSERT: usize = 1;
/// Gap in B: A advances alone. Emitted as a negative delta.
const EDIT_DELETE: usize = 2;

/// One scoring cell: the three running scores, which of them is the
/// current maximum, and whether each was consumed on the traceback.
#[derive(Clone, Copy)]
struct Node {
    values: [i64; 3],
    used: [bool; 3],
    max_idx: u8,
}

impl Node {
    fn new() -> Self {
        Node { values: [NEG_INF; 3], used: [false; 3], max_idx: 0 }
    }

    fn set_max(&mut self) {
        let mut best = 0;
        for i in 1..3 {
            if self.values[i] > self.values[best] {
                best = i;
            }
        }
        self.max_idx = best as u8;
    }

    #[inline]
    fn max(&self) -> i64 {
        self.values[self.max_idx as usize]
    }

    #[inline]
    fn edit(&self) -> usize {
        self.max_idx as usize
    }
}

/// One antidiagonal of the sparse matrix. `base` is the first j the
/// node vector was filled from; `lbound`/`rbound` are the live bounds
/// after trimming.
#[derive(Default)]
struct Diagonal {
    base: i64,
    lbound: i64,
    rbound: i64,
    nodes: Vec<Node>,
}

/// Auto-expanding diagonal store which reuses allocations across
/// invocations.
#[derive(Default)]
pub struct DiagonalMatrix {
    diags: Vec<Diagonal>,
    size: usize,
}

impl DiagonalMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, d: usize) -> &mut Diagonal {
        if d >= self.diags.len() {
            self.diags.resize_with(d + 1, Diagonal::default);
        }
        if d >= self.size {
            self.size = d + 1;
        }
        &mut self.diags[d]
    }

    fn get(&self, d: i64, j: i64) -> Option<&Node> {
        if d < 0 || d as usize >= self.size {
            return None;
        }
        let dg = &self.diags[d as usize];
        if j < dg.lbound || j > dg.rbound || dg.nodes.is_empty() {
            return None;
        }
        dg.nodes.get((j - dg.base) as usize)
    }

    fn mark_used(&mut self, d: i64, j: i64, slot: usize) {
        if let Some(dg) = self.diags.get_mut(d as usize) {
            let idx = (j - dg.base) as usize;
            if let Some(node) = dg.nodes.get_mut(idx) {
                node.used[slot] = true;
            }
        }
    }

    pub fn clear(&mut self) {
        for dg in self.diags.iter_mut().take(self.size) {
            dg.nodes.clear();
            dg.base = 0;
            dg.lbound = 1;
            dg.rbound = 0;
        }
        self.size = 0;
    }
}

/// The alignment engine. Holds only configuration, allocates scratch
/// per call, and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct Aligner {
    break_len: i64,
    banding: i64,
    matrix_type: MatrixType,
}

impl Default for Aligner {
    fn default() -> Self {
        Aligner {
            break_len: 200, // bases to extend past the high score before giving up
            banding: 0,     // no fixed band by default
            matrix_type: MatrixType::Nucleotide,
        }
    }
}

impl Aligner {
    pub fn new(break_len: i64, banding: i64, matrix_type: i32) -> Result<Self> {
        if break_len < 1 || break_len > MAX_ALIGNMENT_LENGTH {
            return Err(Error::bad_args(format!(
                "break length {break_len} must be between 1 and {MAX_ALIGNMENT_LENGTH}"
            )));
        }
        if banding < 0 {
            return Err(Error::bad_args(format!("banding {banding} must be >= 0")));
        }
        let matrix_type = MatrixType::from_index(matrix_type)
            .ok_or_else(|| Error::bad_args(format!("matrix type {matrix_type} must be between 0 and 3")))?;
        Ok(Aligner { break_len, banding, matrix_type })
    }

    pub fn break_len(&self) -> i64 {
        self.break_len
    }

    pub fn banding(&self) -> i64 {
        self.banding
    }

    pub fn matrix_type(&self) -> MatrixType {
        self.matrix_type
    }

    /// Align as far as possible from the start positions toward the
    /// end positions, recording only where the score fell off.
    ///
    /// Sequences are 1-indexed with a sentinel at index 0 (and one
    /// after the last residue). Returns true when the targets were
    /// reached, in which case the end positions are untouched;
    /// otherwise they are updated to the fall-off coordinates.
    pub fn align_search(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        m_o: u32,
    ) -> bool {
        let mut diag = DiagonalMatrix::new();
        self.align_search_with(a, astart, aend, b, bstart, bend, m_o, &mut diag)
    }

    pub(crate) fn align_search_with(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        m_o: u32,
        diag: &mut DiagonalMatrix,
    ) -> bool {
        assert!(m_o & SEARCH_BIT != 0, "sw_align: search called without the search bit");
        self.align_engine(a, astart, aend, b, bstart, bend, None, m_o, diag)
    }

    /// Align from the start positions toward the end positions,
    /// keeping the matrix and appending the delta-encoded edit script
    /// to `delta`. On success the script is terminated with a zero.
    pub fn align_target(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        delta: &mut Vec<i64>,
        m_o: u32,
    ) -> bool {
        let mut diag = DiagonalMatrix::new();
        self.align_target_with(a, astart, aend, b, bstart, bend, delta, m_o, &mut diag)
    }

    pub(crate) fn align_target_with(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        delta: &mut Vec<i64>,
        m_o: u32,
        diag: &mut DiagonalMatrix,
    ) -> bool {
        assert!(
            m_o & DIRECTION_BIT != 0 && m_o & SEARCH_BIT == 0,
            "sw_align: targeted alignment must be a forward non-search mode"
        );
        self.align_engine(a, astart, aend, b, bstart, bend, Some(delta), m_o, diag)
    }

    /// The shared engine behind search and target modes.
    fn align_engine(
        &self,
        a0: &[u8],
        astart: i64,
        aend: &mut i64,
        b0: &[u8],
        bstart: i64,
        bend: &mut i64,
        delta: Option<&mut Vec<i64>>,
        m_o: u32,
        diag: &mut DiagonalMatrix,
    ) -> bool {
        let forward = m_o & DIRECTION_BIT != 0;
        let search = m_o & SEARCH_BIT != 0;
        let forced = m_o & FORCED_BIT != 0;
        let optimal = m_o & OPTIMAL_BIT != 0;

        let alen = a0.len() as i64 - 2;
        let blen = b0.len() as i64 - 2;

        //-- function pre-conditions (fatal to violate)
        assert!(
            astart > 0 && *aend > 0 && astart <= alen && *aend <= alen,
            "sw_align: A positions out of range"
        );
        assert!(
            bstart > 0 && *bend > 0 && bstart <= blen && *bend <= blen,
            "sw_align: B positions out of range"
        );
        if forward {
            assert!(astart <= *aend && bstart <= *bend, "sw_align: inverted forward range");
        } else {
            assert!(astart >= *aend && bstart >= *bend, "sw_align: inverted backward range");
        }
        let n = (*aend - astart).abs() + 1;
        let m = (*bend - bstart).abs() + 1;
        let cap = if search { MAX_SEARCH_LENGTH } else { MAX_ALIGNMENT_LENGTH };
        assert!(n <= cap && m <= cap, "sw_align: extent exceeds maximum length");

        let at = |i: i64| -> u8 {
            if forward { a0[(astart + i - 1) as usize] } else { a0[(astart - i + 1) as usize] }
        };
        let bt = |j: i64| -> u8 {
            if forward { b0[(bstart + j - 1) as usize] } else { b0[(bstart - j + 1) as usize] }
        };

        let open = scores::open_score(self.matrix_type);
        let cont = scores::cont_score(self.matrix_type);
        let trim_margin = self.break_len * scores::good_score(self.matrix_type);

        // fixed-band limits on the drift j - i, when banding is on
        let drift_lo = (m - n).min(0) - self.banding;
        let drift_hi = (m - n).max(0) + self.banding;

        diag.clear();
        {
            let d0 = diag.ensure(0);
            d0.base = 0;
            d0.lbound = 0;
            d0.rbound = 0;
            d0.nodes.push(Node { values: [0, NEG_INF, NEG_INF], used: [false; 3], max_idx: 0 });
        }

        let total = n + m;
        let mut high_score = 0i64;
        let mut high_d = 0i64;
        let mut high_j = 0i64;
        let mut computed_target = false;
        let mut target_score = NEG_INF;

        for d in 1..=total {
            let (plb, prb) = {
                let prev = &diag.diags[(d - 1) as usize];
                (prev.lbound, prev.rbound)
            };
            let mut lb = plb.max(d - n).max(0);
            let mut rb = (prb + 1).min(d).min(m);
            if self.banding > 0 {
                // clamp 2j - d to the drift window
                lb = lb.max((d + drift_lo).div_euclid(2) + (d + drift_lo).rem_euclid(2));
                rb = rb.min((d + drift_hi).div_euclid(2));
            }
            // keep a corridor to the target alive wherever reaching it
            // is the contract
            let corridor = if !search || forced { Some((d * m) / total) } else { None };
            if lb > rb {
                break;
            }

            let mut nodes: Vec<Node> = Vec::with_capacity((rb - lb + 1) as usize);
            for j in lb..=rb {
                let i = d - j;
                let mut node = Node::new();

                if i > 0 && j > 0 {
                    if let Some(p) = diag.get(d - 2, j - 1) {
                        if p.max() > NEG_INF {
                            node.values[EDIT_MATCH] =
                                p.max() + scores::match_score(self.matrix_type, at(i), bt(j));
                        }
                    }
                }
                if let Some(p) = diag.get(d - 1, j - 1) {
                    // B advances alone: gap opens or continues in A
                    let v = (p.values[EDIT_MATCH] + open)
                        .max(p.values[EDIT_INSERT] + cont)
                        .max(p.values[EDIT_DELETE] + open);
                    if v > NEG_INF {
                        node.values[EDIT_INSERT] = v;
                    }
                }
                if let Some(p) = diag.get(d - 1, j) {
                    // A advances alone: gap opens or continues in B
                    let v = (p.values[EDIT_MATCH] + open)
                        .max(p.values[EDIT_INSERT] + open)
                        .max(p.values[EDIT_DELETE] + cont);
                    if v > NEG_INF {
                        node.values[EDIT_DELETE] = v;
                    }
                }
                node.set_max();
                nodes.push(node);
            }

            for (off, node) in nodes.iter().enumerate() {
                if node.max() > high_score {
                    high_score = node.max();
                    high_d = d;
                    high_j = lb + off as i64;
                }
            }

            if d == total && rb >= m && lb <= m {
                let node = &nodes[(m - lb) as usize];
                if node.max() > NEG_INF {
                    computed_target = true;
                    target_score = node.max();
                }
            }

            // trim the band edges that fell too far behind
            let mut tlb = lb;
            let mut trb = rb;
            let keep = |j: i64| corridor == Some(j);
            while tlb < trb
                && nodes[(tlb - lb) as usize].max() < high_score - trim_margin
                && !keep(tlb)
            {
                tlb += 1;
            }
            while tlb < trb
                && nodes[(trb - lb) as usize].max() < high_score - trim_margin
                && !keep(trb)
            {
                trb -= 1;
            }

            let dg = diag.ensure(d as usize);
            dg.base = lb;
            dg.lbound = tlb;
            dg.rbound = trb;
            dg.nodes = nodes;

            // search modes destroy the matrix as the frontier advances
            if search && d >= 2 {
                diag.diags[(d - 2) as usize].nodes.clear();
                diag.diags[(d - 2) as usize].nodes.shrink_to_fit();
            }

            // break-length early exit
            if !forced && d - high_d > self.break_len {
                break;
            }
        }

        let reached = if forced {
            computed_target
        } else if optimal {
            computed_target && target_score >= high_score
        } else {
            computed_target
        };

        let (end_d, end_j) = if reached { (total, m) } else { (high_d, high_j) };

        if let Some(delta) = delta {
            self.traceback(diag, end_d, end_j, open, cont, delta, reached);
        }

        if !reached {
            let fi = end_d - end_j;
            let fj = end_j;
            if forward {
                *aend = astart + fi - 1;
                *bend = bstart + fj - 1;
            } else {
                *aend = astart - fi + 1;
                *bend = bstart - fj + 1;
            }
        }

        reached
    }

    /// Walk the kept matrix back from the end cell, marking consumed
    /// scores, and append the delta encoding of the path. The script
    /// is zero-terminated only when the target was reached.
    fn traceback(
        &self,
        diag: &mut DiagonalMatrix,
        end_d: i64,
        end_j: i64,
        open: i64,
        cont: i64,
        delta: &mut Vec<i64>,
        reached: bool,
    ) {
        let mut moves: Vec<usize> = Vec::new();
        let mut d = end_d;
        let mut j = end_j;

        if d > 0 {
            let mut state = diag.get(d, j).expect("end cell computed").edit();
            while d > 0 {
                diag.mark_used(d, j, state);
                moves.push(state);
                match state {
                    EDIT_MATCH => {
                        let p = *diag.get(d - 2, j - 1).expect("match predecessor");
                        state = p.edit();
                        d -= 2;
                        j -= 1;
                    }
                    EDIT_INSERT => {
                        let p = *diag.get(d - 1, j - 1).expect("insert predecessor");
                        let cands = [
                            p.values[EDIT_MATCH] + open,
                            p.values[EDIT_INSERT] + cont,
                            p.values[EDIT_DELETE] + open,
                        ];
                        state = argmax3(&cands);
                        d -= 1;
                        j -= 1;
                    }
                    _ => {
                        let p = *diag.get(d - 1, j).expect("delete predecessor");
                        let cands = [
                            p.values[EDIT_MATCH] + open,
                            p.values[EDIT_INSERT] + open,
                            p.values[EDIT_DELETE] + cont,
                        ];
                        state = argmax3(&cands);
                        d -= 1;
                    }
                }
            }
        }

        let mut count = 0i64;
        for &mv in moves.iter().rev() {
            count += 1;
            match mv {
                EDIT_INSERT => {
                    delta.push(count);
                    count = 0;
                }
                EDIT_DELETE => {
                    delta.push(-count);
                    count = 0;
                }
                _ => {}
            }
        }
        if reached {
            delta.push(0);
        }
    }
}

fn argmax3(v: &[i64; 3]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if v[i] > v[best] {
            best = i;
        }
    }
    best
}

/// Identical to `Aligner`, but keeps its diagonal matrix between
/// invocations to avoid repeated allocation. Not thread safe.
pub struct BufferedAligner {
    aligner: Aligner,
    diag: RefCell<DiagonalMatrix>,
}

impl BufferedAligner {
    pub fn new(break_len: i64, banding: i64, matrix_type: i32) -> Result<Self> {
        Ok(BufferedAligner {
            aligner: Aligner::new(break_len, banding, matrix_type)?,
            diag: RefCell::new(DiagonalMatrix::new()),
        })
    }

    pub fn from_aligner(aligner: Aligner) -> Self {
        BufferedAligner { aligner, diag: RefCell::new(DiagonalMatrix::new()) }
    }

    pub fn inner(&self) -> &Aligner {
        &self.aligner
    }

    pub fn align_search(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        m_o: u32,
    ) -> bool {
        let mut diag = self.diag.borrow_mut();
        self.aligner.align_search_with(a, astart, aend, b, bstart, bend, m_o, &mut diag)
    }

    pub fn align_target(
        &self,
        a: &[u8],
        astart: i64,
        aend: &mut i64,
        b: &[u8],
        bstart: i64,
        bend: &mut i64,
        delta: &mut Vec<i64>,
        m_o: u32,
    ) -> bool {
        let mut diag = self.diag.borrow_mut();
        self.aligner
            .align_target_with(a, astart, aend, b, bstart, bend, delta, m_o, &mut diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::padded;

    #[test]
    fn test_identical_sequences_have_empty_delta() {
        let a = padded(b"ACGTACGT");
        let b = padded(b"ACGTACGT");
        let aligner = Aligner::new(10, 0, 0).unwrap();
        let (mut aend, mut bend) = (8, 8);
        let mut delta = Vec::new();
        let reached = aligner.align_target(&a, 1, &mut aend, &b, 1, &mut bend, &mut delta, FORWARD_ALIGN);
        assert!(reached);
        assert_eq!((aend, bend), (8, 8));
        assert_eq!(delta, vec![0]);
    }

    #[test]
    fn test_single_deletion_delta() {
        // B lacks the base at position 5 of A
        let a = padded(b"ACGTACGT");
        let b = padded(b"ACGTCGT");
        let aligner = Aligner::default();
        let (mut aend, mut bend) = (8, 7);
        let mut delta = Vec::new();
        let reached = aligner.align_target(&a, 1, &mut aend, &b, 1, &mut bend, &mut delta, FORWARD_ALIGN);
        assert!(reached);
        assert_eq!(delta, vec![-5, 0]);
    }

    #[test]
    fn test_single_insertion_delta() {
        // A lacks the base at position 5 of B: the mirror case
        let a = padded(b"ACGTCGT");
        let b = padded(b"ACGTACGT");
        let aligner = Aligner::default();
        let (mut aend, mut bend) = (7, 8);
        let mut delta = Vec::new();
        let reached = aligner.align_target(&a, 1, &mut aend, &b, 1, &mut bend, &mut delta, FORWARD_ALIGN);
        assert!(reached);
        assert_eq!(delta, vec![5, 0]);
    }

    #[test]
    fn test_substitution_only_delta() {
        let a = padded(b"ACGTACGT");
        let b = padded(b"ACGTCCGT");
        let aligner = Aligner::default();
        let (mut aend, mut bend) = (8, 8);
        let mut delta = Vec::new();
        let reached =
            aligner.align_target(&a, 1, &mut aend, &b, 1, &mut bend, &mut delta, FORCED_FORWARD_ALIGN);
        assert!(reached);
        // a mismatch is not an edit event in the delta encoding
        assert_eq!(delta, vec![0]);
    }

    #[test]
    fn test_search_falls_off_at_divergence() {
        let mut a_seq = b"ACGTACGTACGTACGTACGT".to_vec(); // 20 matching bases
        a_seq.extend(std::iter::repeat_n(b'A', 100));
        let mut b_seq = b"ACGTACGTACGTACGTACGT".to_vec();
        b_seq.extend(std::iter::repeat_n(b'C', 100));
        let a = padded(&a_seq);
        let b = padded(&b_seq);

        let aligner = Aligner::new(10, 0, 0).unwrap();
        let (mut aend, mut bend) = (120, 120);
        let reached =
            aligner.align_search(&a, 1, &mut aend, &b, 1, &mut bend, OPTIMAL_FORWARD_SEARCH);
        assert!(!reached);
        assert_eq!((aend, bend), (20, 20));
    }

    #[test]
    fn test_backward_search_mirrors_forward() {
        let a = padded(b"GCGTAC");
        let b = padded(b"TTGTAC");
        let aligner = Aligner::new(2, 0, 0).unwrap();
        let (mut aend, mut bend) = (1, 1);
        let reached =
            aligner.align_search(&a, 6, &mut aend, &b, 6, &mut bend, OPTIMAL_BACKWARD_SEARCH);
        assert!(!reached);
        // four bases match walking backward: positions 6 down to 3
        assert_eq!((aend, bend), (3, 3));
    }

    #[test]
    fn test_forced_alignment_reaches_through_noise() {
        let a = padded(b"ACGTACGTAAAAAAAACGTACGT");
        let b = padded(b"ACGTACGTCCCCCCCACGTACGT");
        let aligner = Aligner::new(5, 0, 0).unwrap();
        let (mut aend, mut bend) = (23, 23);
        let mut delta = Vec::new();
        let reached =
            aligner.align_target(&a, 1, &mut aend, &b, 1, &mut bend, &mut delta, FORCED_FORWARD_ALIGN);
        assert!(reached);
        assert_eq!((aend, bend), (23, 23));
        assert_eq!(*delta.last().unwrap(), 0);
        // equal lengths and a reached target: insertions balance deletions
        let pos = delta.iter().filter(|&&d| d > 0).count();
        let neg = delta.iter().filter(|&&d| d < 0).count();
        assert_eq!(pos, neg);
    }

    #[test]
    fn test_buffered_aligner_agrees_with_stateless() {
        let a = padded(b"ACGTACGTTTGGCCATAT");
        let b = padded(b"ACGTACGTTAGGCCATAT");
        let stateless = Aligner::default();
        let buffered = BufferedAligner::from_aligner(stateless.clone());

        for _ in 0..2 {
            let (mut ae1, mut be1) = (18, 18);
            let mut d1 = Vec::new();
            let r1 = stateless.align_target(&a, 1, &mut ae1, &b, 1, &mut be1, &mut d1, FORWARD_ALIGN);
            let (mut ae2, mut be2) = (18, 18);
            let mut d2 = Vec::new();
            let r2 = buffered.align_target(&a, 1, &mut ae2, &b, 1, &mut be2, &mut d2, FORWARD_ALIGN);
            assert_eq!(r1, r2);
            assert_eq!((ae1, be1), (ae2, be2));
            assert_eq!(d1, d2);
        }
    }

    #[test]
    fn test_constructor_validation() {
        assert!(Aligner::new(0, 0, 0).is_err());
        assert!(Aligner::new(MAX_ALIGNMENT_LENGTH + 1, 0, 0).is_err());
        assert!(Aligner::new(200, -1, 0).is_err());
        assert!(Aligner::new(200, 0, 4).is_err());
        assert!(Aligner::new(200, 10, 3).is_ok());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_zero_position_is_fatal() {
        let a = padded(b"ACGT");
        let b = padded(b"ACGT");
        let (mut aend, mut bend) = (4, 4);
        Aligner::default().align_search(&a, 0, &mut aend, &b, 1, &mut bend, FORWARD_SEARCH);
    }

    #[test]
    #[should_panic(expected = "exceeds maximum length")]
    fn test_overlong_extent_is_fatal() {
        let seq = vec![b'A'; (MAX_SEARCH_LENGTH + 10) as usize];
        let a = padded(&seq);
        let b = padded(&seq);
        let (mut aend, mut bend) = (MAX_SEARCH_LENGTH + 1, 1);
        Aligner::default().align_search(&a, 1, &mut aend, &b, 1, &mut bend, FORWARD_SEARCH);
    }
}

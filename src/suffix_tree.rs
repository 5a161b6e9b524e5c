//! Sparse McCreight suffix tree back-end.
//!
//! On-line construction over one reference text: suffixes at
//! positions that are multiples of the sampling step K are inserted
//! in order, each located from the previous head through a suffix
//! link, a rescan of the known part and a scan of the new tail. Edges
//! are labeled in whole K-grams, so every node depth is a multiple of
//! K and sibling lists stay ordered by their first sampled gram.
//!
//! Nodes live in an arena and are addressed by tagged references,
//! leaves and branches separately; leaves are identified by their
//! sampled ordinal. The query surface matches the suffix array
//! back-end: MEM, MAM and MUM streams through a callback.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::sequence::SENTINEL;
use crate::suffix_array::{Match, mum_filter};

const NIL: u32 = u32::MAX;

/// Reference to a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRef {
    /// Sampled suffix by ordinal; suffix text position is ordinal * K.
    Leaf(u32),
    /// Index into the branch table.
    Branch(u32),
}

/// An internal node. The root is branch 0 with itself as suffix link.
#[derive(Debug)]
struct Branch {
    /// Text position of one occurrence of this node's string.
    head: u32,
    /// String depth in grams.
    depth: u32,
    /// Node for this string minus its first gram.
    slink: u32,
    parent: u32,
    first_child: Option<NodeRef>,
}

/// A location reached while matching a pattern: the last branch
/// passed, the child edge being traversed (None while sitting exactly
/// on the branch) and the number of whole grams matched from the
/// root.
#[derive(Debug, Clone, Copy)]
struct Loc {
    parent: u32,
    edge: Option<NodeRef>,
    grams: usize,
}

pub struct SuffixTree {
    seq: Vec<u8>, // reference padded with sentinels to a K boundary plus one extra block
    orig_len: usize,
    k: usize,
    total_grams: usize,
    branches: Vec<Branch>,
    leaf_sib: Vec<Option<NodeRef>>,
    branch_sib: Vec<Option<NodeRef>>,
}

impl SuffixTree {
    /// Build the tree over `text`, inserting every `k`-th suffix.
    pub fn new(text: &[u8], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::bad_args("suffix sampling rate must be greater than 0"));
        }
        let orig_len = text.len();
        let pad = if orig_len % k != 0 { k - orig_len % k } else { 0 };
        let padded_len = orig_len + k + pad;
        let mut seq = Vec::with_capacity(padded_len);
        seq.extend_from_slice(text);
        seq.resize(padded_len, SENTINEL);

        let total_grams = padded_len / k;
        let mut tree = SuffixTree {
            seq,
            orig_len,
            k,
            total_grams,
            branches: vec![Branch {
                head: 0,
                depth: 0,
                slink: 0,
                parent: 0,
                first_child: None,
            }],
            leaf_sib: vec![None; total_grams],
            branch_sib: Vec::new(),
        };
        tree.build();
        Ok(tree)
    }

    pub fn sample(&self) -> usize {
        self.k
    }

    pub fn text_len(&self) -> usize {
        self.orig_len
    }

    /// Text position where the string of `r` begins.
    #[inline]
    fn base(&self, r: NodeRef) -> usize {
        match r {
            NodeRef::Leaf(l) => l as usize * self.k,
            NodeRef::Branch(b) => self.branches[b as usize].head as usize,
        }
    }

    /// String depth of `r` in grams; for a leaf, the full remaining
    /// length of its suffix.
    #[inline]
    fn gram_depth(&self, r: NodeRef) -> usize {
        match r {
            NodeRef::Leaf(l) => self.total_grams - l as usize,
            NodeRef::Branch(b) => self.branches[b as usize].depth as usize,
        }
    }

    #[inline]
    fn sibling(&self, r: NodeRef) -> Option<NodeRef> {
        match r {
            NodeRef::Leaf(l) => self.leaf_sib[l as usize],
            NodeRef::Branch(b) => self.branch_sib[b as usize],
        }
    }

    fn set_sibling(&mut self, r: NodeRef, sib: Option<NodeRef>) {
        match r {
            NodeRef::Leaf(l) => self.leaf_sib[l as usize] = sib,
            NodeRef::Branch(b) => self.branch_sib[b as usize] = sib,
        }
    }

    /// The K-gram that begins the edge from a node of depth
    /// `parent_grams` down to `r`.
    #[inline]
    fn edge_gram(&self, r: NodeRef, parent_grams: usize) -> &[u8] {
        let start = self.base(r) + parent_grams * self.k;
        &self.seq[start..start + self.k]
    }

    /// Find the child of `p` whose edge begins with `gram`.
    fn find_child(&self, p: u32, gram: &[u8]) -> Option<NodeRef> {
        let pd = self.branches[p as usize].depth as usize;
        let mut cur = self.branches[p as usize].first_child;
        while let Some(r) = cur {
            let g = self.edge_gram(r, pd);
            if g == gram {
                return Some(r);
            }
            if g > gram {
                return None;
            }
            cur = self.sibling(r);
        }
        None
    }

    /// Insert `r` into `p`'s sibling list, keeping the list ordered by
    /// first gram.
    fn insert_child(&mut self, p: u32, r: NodeRef) {
        let pd = self.branches[p as usize].depth as usize;
        let gram: Vec<u8> = self.edge_gram(r, pd).to_vec();
        let mut prev: Option<NodeRef> = None;
        let mut cur = self.branches[p as usize].first_child;
        while let Some(c) = cur {
            if self.edge_gram(c, pd) > gram.as_slice() {
                break;
            }
            prev = cur;
            cur = self.sibling(c);
        }
        self.set_sibling(r, cur);
        match prev {
            None => self.branches[p as usize].first_child = Some(r),
            Some(pr) => self.set_sibling(pr, Some(r)),
        }
    }

    fn replace_child(&mut self, p: u32, old: NodeRef, new: NodeRef) {
        let sib = self.sibling(old);
        self.set_sibling(new, sib);
        let mut cur = self.branches[p as usize].first_child;
        if cur == Some(old) {
            self.branches[p as usize].first_child = Some(new);
            return;
        }
        while let Some(c) = cur {
            if self.sibling(c) == Some(old) {
                self.set_sibling(c, Some(new));
                return;
            }
            cur = self.sibling(c);
        }
        unreachable!("child to replace not found");
    }

    /// Split the edge `p -> child` at `at_grams`, returning the new
    /// intermediate branch.
    fn split_edge(&mut self, p: u32, child: NodeRef, at_grams: usize) -> u32 {
        let nb = self.branches.len() as u32;
        self.branches.push(Branch {
            head: self.base(child) as u32,
            depth: at_grams as u32,
            slink: NIL,
            parent: p,
            first_child: Some(child),
        });
        self.branch_sib.push(None);
        self.replace_child(p, child, NodeRef::Branch(nb));
        self.set_sibling(child, None);
        if let NodeRef::Branch(b) = child {
            self.branches[b as usize].parent = nb;
        }
        nb
    }

    /// Rescan: walk down from `v` along text known to be present, to
    /// an absolute depth of `target` grams, splitting if the walk
    /// ends inside an edge. Returns the landed branch and whether a
    /// split happened.
    fn rescan(&mut self, mut v: u32, occ: usize, target: usize) -> (u32, bool) {
        loop {
            let d = self.branches[v as usize].depth as usize;
            if d == target {
                return (v, false);
            }
            let gram_start = occ + d * self.k;
            let gram: Vec<u8> = self.seq[gram_start..gram_start + self.k].to_vec();
            let r = self
                .find_child(v, &gram)
                .expect("rescanned string must be present");
            let rd = self.gram_depth(r);
            if rd < target {
                match r {
                    NodeRef::Branch(b) => v = b,
                    NodeRef::Leaf(_) => unreachable!("leaf shorter than rescan target"),
                }
            } else if rd == target {
                match r {
                    NodeRef::Branch(b) => return (b, false),
                    NodeRef::Leaf(_) => unreachable!("rescan landed on a leaf end"),
                }
            } else {
                return (self.split_edge(v, r, target), true);
            }
        }
    }

    /// Scan: compare the suffix of leaf `ord` gram by gram below `w`,
    /// insert the leaf where it diverges and return its new parent.
    fn scan_insert(&mut self, mut w: u32, ord: usize) -> u32 {
        let suf = ord * self.k;
        loop {
            let d = self.branches[w as usize].depth as usize;
            let gram_start = suf + d * self.k;
            let gram: Vec<u8> = self.seq[gram_start..gram_start + self.k].to_vec();
            match self.find_child(w, &gram) {
                None => {
                    self.insert_child(w, NodeRef::Leaf(ord as u32));
                    return w;
                }
                Some(r) => {
                    let rd = self.gram_depth(r);
                    let base = self.base(r);
                    let mut q = d + 1;
                    while q < rd {
                        let a = suf + q * self.k;
                        let b = base + q * self.k;
                        if self.seq[a..a + self.k] != self.seq[b..b + self.k] {
                            break;
                        }
                        q += 1;
                    }
                    if q == rd {
                        match r {
                            NodeRef::Branch(b) => {
                                w = b;
                                continue;
                            }
                            NodeRef::Leaf(_) => unreachable!("suffix is prefix of another suffix"),
                        }
                    }
                    let nb = self.split_edge(w, r, q);
                    self.insert_child(nb, NodeRef::Leaf(ord as u32));
                    return nb;
                }
            }
        }
    }

    /// McCreight construction: head of the previous insertion, suffix
    /// link of its parent, rescan, scan.
    fn build(&mut self) {
        let nk = self.total_grams;
        if nk == 0 {
            return;
        }
        self.insert_child(0, NodeRef::Leaf(0));
        let mut head: u32 = 0; // branch holding head(i-1)

        for ord in 1..nk {
            if head == 0 {
                head = self.scan_insert(0, ord);
                continue;
            }
            let p = self.branches[head as usize].parent;
            let head_pos = self.branches[head as usize].head as usize;
            let head_depth = self.branches[head as usize].depth as usize;

            let (w, was_split) = if p == 0 {
                // drop the first gram of the head string
                if head_depth == 1 {
                    (0, false)
                } else {
                    self.rescan(0, head_pos + self.k, head_depth - 1)
                }
            } else {
                let v = self.branches[p as usize].slink;
                debug_assert_ne!(v, NIL);
                self.rescan(v, head_pos + self.k, head_depth - 1)
            };
            self.branches[head as usize].slink = w;

            head = if was_split {
                // the rescan ended inside an edge, so the new node is
                // exactly head(i); hang the leaf directly off it
                self.insert_child(w, NodeRef::Leaf(ord as u32));
                w
            } else {
                self.scan_insert(w, ord)
            };
        }

        self.resolve_links();
    }

    /// Fill in the suffix links construction never needed, shallowest
    /// first so every rescan source is already linked. A rescan can
    /// itself split an edge and mint a new unlinked branch, so the
    /// pass repeats until none remain.
    fn resolve_links(&mut self) {
        loop {
            let mut pending: Vec<u32> = (1..self.branches.len() as u32)
                .filter(|&b| self.branches[b as usize].slink == NIL)
                .collect();
            if pending.is_empty() {
                return;
            }
            pending.sort_by_key(|&b| self.branches[b as usize].depth);
            for b in pending {
                if self.branches[b as usize].slink != NIL {
                    continue;
                }
                let depth = self.branches[b as usize].depth as usize;
                let headp = self.branches[b as usize].head as usize;
                if depth == 1 {
                    self.branches[b as usize].slink = 0;
                    continue;
                }
                let p = self.branches[b as usize].parent;
                let v = if p == 0 { 0 } else { self.branches[p as usize].slink };
                if v == NIL {
                    continue; // parent resolves on a later pass
                }
                let (w, _) = self.rescan(v, headp + self.k, depth - 1);
                self.branches[b as usize].slink = w;
            }
        }
    }

    // ---------------------------------------------------------- queries

    fn root_loc(&self) -> Loc {
        Loc { parent: 0, edge: None, grams: 0 }
    }

    /// Extend `loc` by matching whole pattern grams starting at
    /// `p[from + grams*K..]` until a mismatch or the pattern runs
    /// short of a gram.
    fn extend_loc(&self, p: &[u8], from: usize, loc: &mut Loc) {
        let k = self.k;
        loop {
            let pos = from + loc.grams * k;
            if pos + k > p.len() {
                return;
            }
            match loc.edge {
                None => match self.find_child(loc.parent, &p[pos..pos + k]) {
                    None => return,
                    Some(r) => {
                        loc.edge = Some(r);
                        loc.grams += 1;
                    }
                },
                Some(r) => {
                    let rd = self.gram_depth(r);
                    if loc.grams == rd {
                        match r {
                            NodeRef::Branch(b) => {
                                loc.parent = b;
                                loc.edge = None;
                                continue;
                            }
                            NodeRef::Leaf(_) => return,
                        }
                    }
                    let base = self.base(r);
                    let at = base + loc.grams * k;
                    if p[pos..pos + k] == self.seq[at..at + k] {
                        loc.grams += 1;
                    } else {
                        return;
                    }
                }
            }
        }
    }

    /// Follow a suffix link from `loc`: the matched string minus its
    /// first gram. Returns None when nothing remains.
    fn link_loc(&self, loc: &Loc) -> Option<Loc> {
        if loc.grams <= 1 {
            return None;
        }
        let occ = match loc.edge {
            Some(r) => self.base(r),
            None => self.branches[loc.parent as usize].head as usize,
        } + self.k;
        let p = loc.parent;
        let v = if p == 0 { 0 } else { self.branches[p as usize].slink };
        Some(self.rescan_loc(v, occ, loc.grams - 1))
    }

    /// Walk down from `v` along known text to an absolute depth of
    /// `target` grams, without mutating the tree.
    fn rescan_loc(&self, mut v: u32, occ: usize, target: usize) -> Loc {
        loop {
            let d = self.branches[v as usize].depth as usize;
            if d == target {
                return Loc { parent: v, edge: None, grams: target };
            }
            let gram_start = occ + d * self.k;
            let gram = &self.seq[gram_start..gram_start + self.k];
            let r = self
                .find_child(v, gram)
                .expect("linked string must be present");
            let rd = self.gram_depth(r);
            if rd < target {
                match r {
                    NodeRef::Branch(b) => v = b,
                    NodeRef::Leaf(_) => unreachable!("leaf shorter than link target"),
                }
            } else if rd == target {
                match r {
                    NodeRef::Branch(b) => return Loc { parent: b, edge: None, grams: target },
                    NodeRef::Leaf(_) => return Loc { parent: v, edge: Some(r), grams: target },
                }
            } else {
                return Loc { parent: v, edge: Some(r), grams: target };
            }
        }
    }

    /// Collect every leaf ordinal in the subtree below `r`.
    fn leaves_below(&self, r: NodeRef, out: &mut Vec<u32>) {
        let mut stack = vec![r];
        while let Some(r) = stack.pop() {
            match r {
                NodeRef::Leaf(l) => out.push(l),
                NodeRef::Branch(b) => {
                    let mut c = self.branches[b as usize].first_child;
                    while let Some(r) = c {
                        stack.push(r);
                        c = self.sibling(r);
                    }
                }
            }
        }
    }

    /// True if exactly one reference suffix lies below the location.
    fn loc_is_unique(&self, loc: &Loc) -> bool {
        matches!(loc.edge, Some(NodeRef::Leaf(_)))
    }

    #[inline]
    fn is_leftmaximal(&self, p: &[u8], p1: usize, p2: usize) -> bool {
        p1 == 0 || p2 == 0 || p[p1 - 1] != self.seq[p2 - 1]
    }

    /// Maximal Almost-unique Matches: unique in the reference, maximal
    /// both sides. Streams the query along suffix links; needs the
    /// full (K = 1) tree.
    pub fn find_mam(&self, p: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        if self.k != 1 || p.is_empty() || min_len == 0 {
            return;
        }
        let plen = p.len();
        let mut loc = self.root_loc();
        let mut prefix = 0usize;

        while prefix < plen {
            self.extend_loc(p, prefix, &mut loc);
            let depth = loc.grams;
            if depth <= 1 {
                loc = self.root_loc();
                prefix += 1;
                continue;
            }
            if depth >= min_len {
                if let Some(NodeRef::Leaf(l)) = loc.edge {
                    let r = l as usize * self.k;
                    if self.is_leftmaximal(p, prefix, r) {
                        out(Match::new(r as i64, prefix as i64, depth as i64));
                    }
                }
            }
            // step suffix links while the location stays unique
            loop {
                match self.link_loc(&loc) {
                    None => {
                        loc = self.root_loc();
                        prefix += 1;
                        break;
                    }
                    Some(l2) => {
                        loc = l2;
                        prefix += 1;
                        if !(loc.grams > 0 && self.loc_is_unique(&loc)) {
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Maximal Exact Matches at one sampled query offset.
    fn find_mem_k(
        &self,
        p: &[u8],
        k0: usize,
        min_len: usize,
        seen: &mut HashSet<(i64, i64)>,
        out: &mut dyn FnMut(Match),
    ) {
        let plen = p.len() as i64;
        let kk = self.k as i64;
        let min_len_k = min_len as i64 - (kk - 1);
        let mut loc = self.root_loc();
        let mut prefix = k0 as i64;

        while prefix <= plen - min_len_k {
            self.extend_loc(p, prefix as usize, &mut loc);
            if loc.grams as i64 * kk <= 1 {
                loc = self.root_loc();
                prefix += kk;
                continue;
            }
            if loc.grams as i64 * kk >= min_len_k.max(1) {
                self.collect_mems_at(p, prefix as usize, &loc, min_len, seen, out);
            }
            match self.link_loc(&loc) {
                None => loc = self.root_loc(),
                Some(l2) => loc = l2,
            }
            prefix += kk;
        }
    }

    /// Enumerate right-maximal matches at a mismatch location: the
    /// leaves below the current edge at full depth, then the leaves
    /// under each ancestor's other children at the ancestor's depth.
    /// Every candidate is re-anchored by `emit_maximal`, which also
    /// screens out anything short of `min_len`.
    fn collect_mems_at(
        &self,
        p: &[u8],
        prefix: usize,
        loc: &Loc,
        min_len: usize,
        seen: &mut HashSet<(i64, i64)>,
        out: &mut dyn FnMut(Match),
    ) {
        let k = self.k;
        let floor = (min_len as i64 - (k as i64 - 1)).max(1);
        let mut leaves = Vec::new();

        let (mut node, mut skip) = match loc.edge {
            Some(r) => {
                self.leaves_below(r, &mut leaves);
                (loc.parent, Some(r))
            }
            None => {
                if loc.parent == 0 {
                    return;
                }
                self.leaves_below(NodeRef::Branch(loc.parent), &mut leaves);
                let up = self.branches[loc.parent as usize].parent;
                (up, Some(NodeRef::Branch(loc.parent)))
            }
        };
        for &l in &leaves {
            self.emit_maximal(p, prefix, l as usize * k, min_len, seen, out);
        }

        // climb: matches that diverge at shallower branches
        loop {
            let d = self.branches[node as usize].depth as i64 * k as i64;
            if d < floor {
                break;
            }
            let mut c = self.branches[node as usize].first_child;
            while let Some(r) = c {
                if Some(r) != skip {
                    let mut sub = Vec::new();
                    self.leaves_below(r, &mut sub);
                    for &l in &sub {
                        self.emit_maximal(p, prefix, l as usize * k, min_len, seen, out);
                    }
                }
                c = self.sibling(r);
            }
            if node == 0 {
                break;
            }
            skip = Some(NodeRef::Branch(node));
            node = self.branches[node as usize].parent;
        }
    }

    /// Re-anchor a right-maximal candidate to its true maximal extent
    /// in both directions, then emit it once.
    fn emit_maximal(
        &self,
        p: &[u8],
        prefix: usize,
        rpos: usize,
        min_len: usize,
        seen: &mut HashSet<(i64, i64)>,
        out: &mut dyn FnMut(Match),
    ) {
        let plen = p.len();
        let n = self.orig_len;
        let (mut q, mut r, mut len) = (prefix, rpos, 0usize);
        while q + len < plen && r + len < n && p[q + len] == self.seq[r + len] {
            len += 1;
        }
        while q > 0 && r > 0 && p[q - 1] == self.seq[r - 1] {
            q -= 1;
            r -= 1;
            len += 1;
        }
        if len >= min_len && seen.insert((r as i64, q as i64)) {
            out(Match::new(r as i64, q as i64, len as i64));
        }
    }

    /// Maximal Exact Matches: maximal both sides, no uniqueness
    /// constraint.
    pub fn find_mem(&self, p: &[u8], min_len: usize, out: &mut dyn FnMut(Match)) {
        if p.is_empty() || min_len == 0 {
            return;
        }
        let mut seen = HashSet::new();
        for k0 in 0..self.k {
            self.find_mem_k(p, k0, min_len, &mut seen, out);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suffix_array::SparseSuffixArray;

    fn tree_mems(t: &SuffixTree, q: &[u8], min_len: usize) -> Vec<Match> {
        let mut v = Vec::new();
        t.find_mem(q, min_len, &mut |m| v.push(m));
        v.sort_by_key(|m| (m.query_pos, m.ref_pos));
        v
    }

    fn sa_mems(reference: &[u8], q: &[u8], min_len: usize) -> Vec<Match> {
        let sa = SparseSuffixArray::new(reference, 1).unwrap();
        let mut v = Vec::new();
        sa.find_mem(q, min_len, &mut |m| v.push(m));
        v.sort_by_key(|m| (m.query_pos, m.ref_pos));
        v.dedup();
        v
    }

    #[test]
    fn test_mum_detection() {
        let tree = SuffixTree::new(b"ACGTACGTTT", 1).unwrap();
        let mut mums = Vec::new();
        tree.find_mum(b"GGGTACGTTT", 5, &mut |m| mums.push(m));
        assert_eq!(mums, vec![Match::new(4, 4, 6)]);
    }

    #[test]
    fn test_mam_matches_suffix_array_backend() {
        let reference = b"TTACGTACGTGGATCGATTT";
        let query = b"CCACGTACGTGGTTCGATCC";
        let tree = SuffixTree::new(reference, 1).unwrap();
        let sa = SparseSuffixArray::new(reference, 1).unwrap();

        let mut from_tree = Vec::new();
        tree.find_mam(query, 4, &mut |m| from_tree.push(m));
        from_tree.sort_by_key(|m| (m.query_pos, m.ref_pos));

        let mut from_sa = Vec::new();
        sa.find_mam(query, 4, &mut |m| from_sa.push(m));
        from_sa.sort_by_key(|m| (m.query_pos, m.ref_pos));

        assert_eq!(from_tree, from_sa);
        assert!(!from_tree.is_empty());
    }

    #[test]
    fn test_mem_matches_suffix_array_backend() {
        let reference = b"TTACGTACGTGGATCGATTTACACAC";
        let query = b"GGACGTACGTGGATCGATCCACAC";
        let tree = SuffixTree::new(reference, 1).unwrap();
        assert_eq!(tree_mems(&tree, query, 4), sa_mems(reference, query, 4));
    }

    #[test]
    fn test_mem_properties_hold() {
        let reference = b"ACGTACGTTTGGCCATATAGGCTTAGC";
        let query = b"TTGGCCATATTAGCACGTTT";
        let tree = SuffixTree::new(reference, 1).unwrap();
        let mems = tree_mems(&tree, query, 3);
        assert!(!mems.is_empty());
        for m in mems {
            let (r, q, l) = (m.ref_pos as usize, m.query_pos as usize, m.len as usize);
            assert_eq!(&reference[r..r + l], &query[q..q + l]);
            if r > 0 && q > 0 {
                assert_ne!(reference[r - 1], query[q - 1]);
            }
            if r + l < reference.len() && q + l < query.len() {
                assert_ne!(reference[r + l], query[q + l]);
            }
        }
    }

    #[test]
    fn test_sparse_tree_finds_long_matches() {
        let reference = b"TTACGTACGTGGATCGATTTACACACGTGTGTGAACCTTGG";
        let query = b"GGACGTACGTGGATCGATCCACACACGTGTGTGA";
        let tree = SuffixTree::new(reference, 2).unwrap();
        assert_eq!(tree.sample(), 2);
        let mems = tree_mems(&tree, query, 10);
        assert!(!mems.is_empty());
        for m in &mems {
            let (r, q, l) = (m.ref_pos as usize, m.query_pos as usize, m.len as usize);
            assert_eq!(&reference[r..r + l], &query[q..q + l]);
        }
    }

    #[test]
    fn test_empty_inputs_yield_empty_streams() {
        let tree = SuffixTree::new(b"ACGTACGT", 1).unwrap();
        let mut v = Vec::new();
        tree.find_mem(b"", 3, &mut |m| v.push(m));
        tree.find_mam(b"", 3, &mut |m| v.push(m));
        tree.find_mem(b"ACGT", 0, &mut |m| v.push(m));
        assert!(v.is_empty());
        assert!(SuffixTree::new(b"ACGT", 0).is_err());

        // MAM requires the full tree
        let sparse = SuffixTree::new(b"ACGTACGT", 2).unwrap();
        sparse.find_mam(b"ACGT", 2, &mut |m| v.push(m));
        assert!(v.is_empty());
    }
}

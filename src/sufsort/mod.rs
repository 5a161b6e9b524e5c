//! Compact suffix array construction and queries.
//!
//! Two-phase induced-sorting construction: suffixes are classified
//! right-to-left as type A (descending) or B (non-descending), the
//! B* subset (a B immediately preceded by an A) is bucketed by its
//! first two characters and sorted by substring (`sssort`), ranks are
//! refined to a total order by the tandem-repeat sort (`trsort`), and
//! the full array is induced from the sorted B* suffixes in two
//! scans. Pattern search runs two lcp-memoized binary searches; the
//! self-check verifies range, first-character order and the inverse
//! permutation in O(n).

mod sssort;
mod trsort;

use crate::error::{Error, IndexCheckError, Result};

/// Index type of the suffix array. Texts are limited to `i32::MAX`
/// bytes, the compact profile of the construction.
pub type SaIdx = i32;

const ALPHABET_SIZE: usize = 256;

/// Floor of log2, used as the introsort depth budget.
#[inline]
pub(crate) fn ilg(n: SaIdx) -> SaIdx {
    31 - (n as u32).leading_zeros() as SaIdx
}

#[inline]
fn bucket_b_idx(c0: usize, c1: usize) -> usize {
    c1 * ALPHABET_SIZE + c0
}

#[inline]
fn bucket_star_idx(c0: usize, c1: usize) -> usize {
    c0 * ALPHABET_SIZE + c1
}

/// Sort the type B* suffixes; returns how many there are.
fn sort_type_bstar(t: &[u8], sa: &mut [SaIdx], bucket_a: &mut [SaIdx], bucket_b: &mut [SaIdx]) -> SaIdx {
    let n = t.len() as isize;

    // Count the first one or two characters of each type A, B and B*
    // suffix, and stash every B* start position at the tail of SA.
    let mut m = n;
    let mut i = n - 1;
    let mut c0 = t[(n - 1) as usize] as usize;
    while 0 <= i {
        // type A suffixes
        let mut c1;
        loop {
            c1 = c0;
            bucket_a[c1] += 1;
            i -= 1;
            if 0 <= i {
                c0 = t[i as usize] as usize;
                if c0 >= c1 {
                    continue;
                }
            }
            break;
        }
        if 0 <= i {
            // type B* suffix
            bucket_b[bucket_star_idx(c0, c1)] += 1;
            m -= 1;
            sa[m as usize] = i as SaIdx;
            // type B suffixes
            i -= 1;
            c1 = c0;
            while 0 <= i {
                c0 = t[i as usize] as usize;
                if c0 > c1 {
                    break;
                }
                bucket_b[bucket_b_idx(c0, c1)] += 1;
                i -= 1;
                c1 = c0;
            }
        }
    }
    let m = (n - m) as SaIdx;
    // A type B* suffix is lexicographically smaller than a type B
    // suffix beginning with the same two characters.

    // Calculate start/end points of each bucket.
    let mut i: SaIdx = 0;
    let mut j: SaIdx = 0;
    for c0 in 0..ALPHABET_SIZE {
        let tmp = i + bucket_a[c0];
        bucket_a[c0] = i + j; // start point
        i = tmp + bucket_b[bucket_b_idx(c0, c0)];
        for c1 in (c0 + 1)..ALPHABET_SIZE {
            j += bucket_b[bucket_star_idx(c0, c1)];
            bucket_b[bucket_star_idx(c0, c1)] = j; // end point
            i += bucket_b[bucket_b_idx(c0, c1)];
        }
    }

    if 0 < m {
        // Sort the B* suffixes by their first two characters.
        let pa = (n - m as isize) as usize;
        let isab = m as usize;
        for i in (0..(m - 1) as usize).rev() {
            let tpos = sa[pa + i] as usize;
            let (c0, c1) = (t[tpos] as usize, t[tpos + 1] as usize);
            let slot = bucket_star_idx(c0, c1);
            bucket_b[slot] -= 1;
            sa[bucket_b[slot] as usize] = i as SaIdx;
        }
        let tpos = sa[pa + (m - 1) as usize] as usize;
        let (c0, c1) = (t[tpos] as usize, t[tpos + 1] as usize);
        let slot = bucket_star_idx(c0, c1);
        bucket_b[slot] -= 1;
        sa[bucket_b[slot] as usize] = m - 1;

        // Sort the B* substrings, bucket by bucket.
        let mut j = m;
        let mut c0 = ALPHABET_SIZE - 2;
        while 0 < j {
            let mut c1 = ALPHABET_SIZE - 1;
            while c0 < c1 {
                let i = bucket_b[bucket_star_idx(c0, c1)];
                if 1 < j - i {
                    sssort::sort(
                        t,
                        sa,
                        pa,
                        i as usize,
                        j as usize,
                        2,
                        n as SaIdx,
                        sa[i as usize] == m - 1,
                    );
                }
                j = i;
                c1 -= 1;
            }
            c0 = c0.wrapping_sub(1);
            if c0 == usize::MAX {
                break;
            }
        }

        // Compute ranks of the B* substrings.
        let mut i = (m - 1) as isize;
        while 0 <= i {
            if 0 <= sa[i as usize] {
                let j = i;
                loop {
                    sa[isab + sa[i as usize] as usize] = i as SaIdx;
                    i -= 1;
                    if !(0 <= i && 0 <= sa[i as usize]) {
                        break;
                    }
                }
                sa[(i + 1) as usize] = (i - j) as SaIdx;
                if i <= 0 {
                    break;
                }
            }
            let j = i;
            loop {
                sa[i as usize] = !sa[i as usize];
                sa[isab + sa[i as usize] as usize] = j as SaIdx;
                i -= 1;
                if !(sa[i as usize] < 0) {
                    break;
                }
            }
            sa[isab + sa[i as usize] as usize] = j as SaIdx;
            i -= 1;
        }

        // Refine to a total order with the tandem repeat sort.
        trsort::sort(sa, isab, m, 1);

        // Recover the sorted order of the B* suffixes.
        let mut i = n - 1;
        let mut j = m as isize;
        let mut c0 = t[(n - 1) as usize] as usize;
        while 0 <= i {
            let mut c1;
            i -= 1;
            c1 = c0;
            while 0 <= i {
                c0 = t[i as usize] as usize;
                if c0 < c1 {
                    break;
                }
                i -= 1;
                c1 = c0;
            }
            if 0 <= i {
                let tpos = i;
                i -= 1;
                c1 = c0;
                while 0 <= i {
                    c0 = t[i as usize] as usize;
                    if c0 > c1 {
                        break;
                    }
                    i -= 1;
                    c1 = c0;
                }
                j -= 1;
                let rank = sa[isab + j as usize] as usize;
                sa[rank] = if tpos == 0 || 1 < tpos - i {
                    tpos as SaIdx
                } else {
                    !(tpos as SaIdx)
                };
            }
        }

        // Calculate the start/end points of each bucket again and
        // spread the sorted B* suffixes to their final slots.
        bucket_b[bucket_b_idx(ALPHABET_SIZE - 1, ALPHABET_SIZE - 1)] = n as SaIdx; // end point
        let mut k = (m - 1) as isize;
        let mut c0 = ALPHABET_SIZE as isize - 2;
        while 0 <= c0 {
            let mut i = bucket_a[(c0 + 1) as usize] as isize - 1;
            let mut c1 = ALPHABET_SIZE as isize - 1;
            while c0 < c1 {
                let tmp = i - bucket_b[bucket_b_idx(c0 as usize, c1 as usize)] as isize;
                bucket_b[bucket_b_idx(c0 as usize, c1 as usize)] = i as SaIdx; // end point

                // move the B* suffixes into place
                i = tmp;
                let mut j = bucket_b[bucket_star_idx(c0 as usize, c1 as usize)] as isize;
                while j <= k {
                    sa[i as usize] = sa[k as usize];
                    i -= 1;
                    k -= 1;
                }
                c1 -= 1;
            }
            bucket_b[bucket_star_idx(c0 as usize, (c0 + 1) as usize)] =
                (i - bucket_b[bucket_b_idx(c0 as usize, c0 as usize)] as isize + 1) as SaIdx; // start point
            bucket_b[bucket_b_idx(c0 as usize, c0 as usize)] = i as SaIdx; // end point
            c0 -= 1;
        }
    }

    m
}

/// Induce the full array from the sorted order of the B* suffixes:
/// one right-to-left scan places the type B suffixes, one
/// left-to-right scan the type A suffixes.
fn construct_sa(t: &[u8], sa: &mut [SaIdx], bucket_a: &mut [SaIdx], bucket_b: &mut [SaIdx], m: SaIdx) {
    let n = t.len() as isize;

    if 0 < m {
        // Induce type B suffixes from the B* order.
        let mut c1 = ALPHABET_SIZE as isize - 2;
        while 0 <= c1 {
            let mut i = bucket_b[bucket_star_idx(c1 as usize, (c1 + 1) as usize)] as isize;
            let mut j = bucket_a[(c1 + 1) as usize] as isize - 1;
            let mut k: isize = -1;
            let mut c2: isize = -1;
            while i <= j {
                let s = sa[j as usize];
                if 0 < s {
                    sa[j as usize] = !s;
                    let mut s = s - 1;
                    let c0 = t[s as usize] as isize;
                    if 0 < s && (t[(s - 1) as usize] as isize) > c0 {
                        s = !s;
                    }
                    if c0 != c2 {
                        if 0 <= c2 {
                            bucket_b[bucket_b_idx(c2 as usize, c1 as usize)] = k as SaIdx;
                        }
                        c2 = c0;
                        k = bucket_b[bucket_b_idx(c2 as usize, c1 as usize)] as isize;
                    }
                    sa[k as usize] = s;
                    k -= 1;
                } else {
                    sa[j as usize] = !s;
                }
                j -= 1;
            }
            c1 -= 1;
        }
    }

    // Induce type A suffixes left to right.
    let mut c2 = t[(n - 1) as usize] as isize;
    let mut k = bucket_a[c2 as usize] as isize;
    sa[k as usize] = if (t[(n - 2) as usize] as isize) < c2 {
        !((n - 1) as SaIdx)
    } else {
        (n - 1) as SaIdx
    };
    k += 1;
    for i in 0..n as usize {
        let s = sa[i];
        if 0 < s {
            let mut s = s - 1;
            let c0 = t[s as usize] as isize;
            if s == 0 || (t[(s - 1) as usize] as isize) < c0 {
                s = !s;
            }
            if c0 != c2 {
                bucket_a[c2 as usize] = k as SaIdx;
                c2 = c0;
                k = bucket_a[c2 as usize] as isize;
            }
            sa[k as usize] = s;
            k += 1;
        } else {
            sa[i] = !s;
        }
    }
}

/// Construct the suffix array of `t` into `sa`.
pub fn create(t: &[u8], sa: &mut [SaIdx]) -> Result<()> {
    let n = t.len();
    if sa.len() != n {
        return Err(Error::bad_args(format!(
            "suffix array length {} does not match text length {n}",
            sa.len()
        )));
    }
    if n > SaIdx::MAX as usize {
        return Err(Error::bad_args(format!("text length {n} exceeds index capacity")));
    }

    match n {
        0 => return Ok(()),
        1 => {
            sa[0] = 0;
            return Ok(());
        }
        2 => {
            let m = (t[0] < t[1]) as usize;
            sa[m ^ 1] = 0;
            sa[m] = 1;
            return Ok(());
        }
        _ => {}
    }

    let mut bucket_a = alloc_zeroed(ALPHABET_SIZE)?;
    let mut bucket_b = alloc_zeroed(ALPHABET_SIZE * ALPHABET_SIZE)?;

    let m = sort_type_bstar(t, sa, &mut bucket_a, &mut bucket_b);
    construct_sa(t, sa, &mut bucket_a, &mut bucket_b, m);
    Ok(())
}

/// Build and return the suffix array of `t`.
pub fn build(t: &[u8]) -> Result<Vec<SaIdx>> {
    let mut sa = alloc_zeroed(t.len())?;
    create(t, &mut sa)?;
    Ok(sa)
}

fn alloc_zeroed(n: usize) -> Result<Vec<SaIdx>> {
    let mut v: Vec<SaIdx> = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| Error::AllocFailed(format!("{n} suffix array entries")))?;
    v.resize(n, 0);
    Ok(v)
}

/// Resume a suffix/pattern comparison from `matched` characters.
fn compare_from(t: &[u8], p: &[u8], suf: usize, matched: &mut usize) -> i32 {
    let mut i = suf + *matched;
    let mut j = *matched;
    let mut r = 0;
    while i < t.len() && j < p.len() {
        r = t[i] as i32 - p[j] as i32;
        if r != 0 {
            break;
        }
        i += 1;
        j += 1;
    }
    *matched = j;
    if r == 0 {
        -((j != p.len()) as i32)
    } else {
        r
    }
}

/// Search for pattern `p` in `t`; returns `(count, first SA index)`.
///
/// Two binary searches share the lcp of the pattern with the interval
/// boundaries (`lmatch`/`rmatch`) so every comparison resumes from
/// `min(lmatch, rmatch)`, giving O(|p| + log n) overall. The empty
/// pattern matches everywhere at index 0.
pub fn search(t: &[u8], sa: &[SaIdx], p: &[u8]) -> (SaIdx, SaIdx) {
    if t.is_empty() {
        return (0, -1);
    }
    if p.is_empty() {
        return (t.len() as SaIdx, 0);
    }

    let mut i: isize = 0;
    let mut j: isize = 0;
    let mut k: isize = 0;
    let mut lmatch = 0usize;
    let mut rmatch = 0usize;
    let mut size = sa.len() as isize;
    let mut half = size >> 1;

    while 0 < size {
        let mut matched = lmatch.min(rmatch);
        let r = compare_from(t, p, sa[(i + half) as usize] as usize, &mut matched);
        if r < 0 {
            i += half + 1;
            half -= (size & 1) ^ 1;
            lmatch = matched;
        } else if r > 0 {
            rmatch = matched;
        } else {
            let mut lsize = half;
            j = i;
            let mut rsize = size - half - 1;
            k = i + half + 1;

            // left boundary
            let mut llmatch = lmatch;
            let mut lrmatch = matched;
            let mut lhalf = lsize >> 1;
            while 0 < lsize {
                let mut lm = llmatch.min(lrmatch);
                let r = compare_from(t, p, sa[(j + lhalf) as usize] as usize, &mut lm);
                if r < 0 {
                    j += lhalf + 1;
                    lhalf -= (lsize & 1) ^ 1;
                    llmatch = lm;
                } else {
                    lrmatch = lm;
                }
                lsize = lhalf;
                lhalf >>= 1;
            }

            // right boundary
            let mut rlmatch = matched;
            let mut rrmatch = rmatch;
            let mut rhalf = rsize >> 1;
            while 0 < rsize {
                let mut rm = rlmatch.min(rrmatch);
                let r = compare_from(t, p, sa[(k + rhalf) as usize] as usize, &mut rm);
                if r <= 0 {
                    k += rhalf + 1;
                    rhalf -= (rsize & 1) ^ 1;
                    rlmatch = rm;
                } else {
                    rrmatch = rm;
                }
                rsize = rhalf;
                rhalf >>= 1;
            }

            break;
        }
        size = half;
        half >>= 1;
    }

    let count = (k - j) as SaIdx;
    (count, if 0 < count { j as SaIdx } else { i as SaIdx })
}

/// Count the suffixes starting with character `c`; the same split
/// binary search specialized to depth 1.
pub fn search_char(t: &[u8], sa: &[SaIdx], c: u8) -> SaIdx {
    if t.is_empty() {
        return 0;
    }

    let mut i: isize = 0;
    let mut j: isize = 0;
    let mut k: isize = 0;
    let mut size = sa.len() as isize;
    let mut half = size >> 1;
    let cmp = |p: SaIdx| -> i32 {
        let p = p as usize;
        if p < t.len() { t[p] as i32 - c as i32 } else { -1 }
    };

    while 0 < size {
        let r = cmp(sa[(i + half) as usize]);
        if r < 0 {
            i += half + 1;
            half -= (size & 1) ^ 1;
        } else if r == 0 {
            let mut lsize = half;
            j = i;
            let mut rsize = size - half - 1;
            k = i + half + 1;

            let mut lhalf = lsize >> 1;
            while 0 < lsize {
                if cmp(sa[(j + lhalf) as usize]) < 0 {
                    j += lhalf + 1;
                    lhalf -= (lsize & 1) ^ 1;
                }
                lsize = lhalf;
                lhalf >>= 1;
            }

            let mut rhalf = rsize >> 1;
            while 0 < rsize {
                if cmp(sa[(k + rhalf) as usize]) <= 0 {
                    k += rhalf + 1;
                    rhalf -= (rsize & 1) ^ 1;
                }
                rsize = rhalf;
                rhalf >>= 1;
            }

            break;
        }
        size = half;
        half >>= 1;
    }

    (k - j) as SaIdx
}

/// Verify a suffix array against its text in O(n): entry range,
/// first-character monotonicity, and the inverse-permutation walk
/// (for every suffix, its one-shorter predecessor must occupy the
/// next slot of its character bucket).
pub fn check(t: &[u8], sa: &[SaIdx], verbose: bool) -> Result<()> {
    let n = t.len();
    if sa.len() != n {
        return Err(Error::bad_args(format!(
            "suffix array length {} does not match text length {n}",
            sa.len()
        )));
    }
    if n == 0 {
        if verbose {
            eprintln!("sufcheck: Done.");
        }
        return Ok(());
    }

    // range: [0..n-1]
    for (i, &v) in sa.iter().enumerate() {
        if v < 0 || n as SaIdx <= v {
            if verbose {
                eprintln!("sufcheck: Out of the range [0,{}].\n  SA[{i}]={v}", n - 1);
            }
            return Err(IndexCheckError::OutOfRange { index: i, value: v as i64, n }.into());
        }
    }

    // first characters
    for i in 1..n {
        if t[sa[i - 1] as usize] > t[sa[i] as usize] {
            if verbose {
                eprintln!(
                    "sufcheck: Suffixes in wrong order.\n  T[SA[{}]={}]={} > T[SA[{i}]={}]={}",
                    i - 1,
                    sa[i - 1],
                    t[sa[i - 1] as usize],
                    sa[i],
                    t[sa[i] as usize],
                );
            }
            return Err(IndexCheckError::WrongOrder { index: i }.into());
        }
    }

    // inverse permutation consistency
    let mut c = [0 as SaIdx; ALPHABET_SIZE];
    for &b in t {
        c[b as usize] += 1;
    }
    let mut p = 0;
    for slot in c.iter_mut() {
        let tmp = *slot;
        *slot = p;
        p += tmp;
    }

    let q = c[t[n - 1] as usize];
    c[t[n - 1] as usize] += 1;
    for i in 0..n {
        let v = sa[i];
        // predecessor suffix (one character longer to the left)
        let (ch, ppos, slot) = if 0 < v {
            let ppos = (v - 1) as usize;
            let ch = t[ppos] as usize;
            (ch, ppos, c[ch])
        } else {
            let ppos = n - 1;
            (t[ppos] as usize, ppos, q)
        };
        if slot < 0 || ppos as SaIdx != sa[slot as usize] {
            if verbose {
                eprintln!(
                    "sufcheck: Suffix in wrong position.\n  SA[{slot}]={} or\n  SA[{i}]={}",
                    if 0 <= slot { sa[slot as usize] } else { -1 },
                    sa[i],
                );
            }
            return Err(IndexCheckError::WrongPosition { index: i }.into());
        }
        if slot != q {
            c[ch] += 1;
            if n as SaIdx <= c[ch] || t[sa[c[ch] as usize] as usize] as usize != ch {
                c[ch] = -1;
            }
        }
    }

    if verbose {
        eprintln!("sufcheck: Done.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_sa(t: &[u8]) -> Vec<SaIdx> {
        let mut sa: Vec<SaIdx> = (0..t.len() as SaIdx).collect();
        sa.sort_by(|&a, &b| t[a as usize..].cmp(&t[b as usize..]));
        sa
    }

    fn naive_count(t: &[u8], p: &[u8]) -> SaIdx {
        if p.is_empty() || p.len() > t.len() {
            return if p.is_empty() { t.len() as SaIdx } else { 0 };
        }
        t.windows(p.len()).filter(|w| *w == p).count() as SaIdx
    }

    #[test]
    fn test_banana() {
        let t = b"banana";
        let sa = build(t).unwrap();
        assert_eq!(sa, vec![5, 3, 1, 0, 4, 2]);
        check(t, &sa, false).unwrap();
    }

    #[test]
    fn test_banana_search() {
        let t = b"banana";
        let sa = build(t).unwrap();
        let (count, first) = search(t, &sa, b"ana");
        assert_eq!(count, 2);
        assert_eq!(first, 1);
        let mut hits: Vec<SaIdx> = (first..first + count).map(|i| sa[i as usize]).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn test_mississippi_search() {
        let t = b"mississippi";
        let sa = build(t).unwrap();
        assert_eq!(sa, naive_sa(t));
        let (count, first) = search(t, &sa, b"issi");
        assert_eq!(count, 2);
        let mut hits: Vec<SaIdx> = (first..first + count).map(|i| sa[i as usize]).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 4]);
    }

    #[test]
    fn test_boundaries() {
        // n == 0
        let sa = build(b"").unwrap();
        assert!(sa.is_empty());
        check(b"", &sa, false).unwrap();
        // n == 1
        assert_eq!(build(b"a").unwrap(), vec![0]);
        // n == 2, both orders
        assert_eq!(build(b"ab").unwrap(), vec![0, 1]);
        assert_eq!(build(b"ba").unwrap(), vec![1, 0]);
        // pattern longer than text
        let t = b"acgt";
        let sa = build(t).unwrap();
        assert_eq!(search(t, &sa, b"acgtacgt").0, 0);
    }

    #[test]
    fn test_matches_naive_on_assorted_texts() {
        let texts: [&[u8]; 8] = [
            b"aaaaaaaaaa",
            b"abababababab",
            b"ACGTACGTTTACGT",
            b"GGGGCCCCGGGGCCCC",
            b"the quick brown fox jumps over the lazy dog",
            b"mississippi$",
            b"ACACACACACACACACACACACAC",
            b"TTAGGGTTAGGGTTAGGGTTAGGG",
        ];
        for t in texts {
            let sa = build(t).unwrap();
            assert_eq!(sa, naive_sa(t), "text {:?}", std::str::from_utf8(t));
            check(t, &sa, false).unwrap();
        }
    }

    #[test]
    fn test_search_counts_match_naive() {
        let t = b"ACGTACGTTTACGTACACGT";
        let sa = build(t).unwrap();
        for p in [&b"A"[..], b"AC", b"ACG", b"ACGT", b"T", b"TT", b"GTA", b"CAT", b"ACGTACGT"] {
            assert_eq!(
                search(t, &sa, p).0,
                naive_count(t, p),
                "pattern {:?}",
                std::str::from_utf8(p)
            );
        }
        for c in [b'A', b'C', b'G', b'T', b'N'] {
            assert_eq!(search_char(t, &sa, c), naive_count(t, &[c]), "char {}", c as char);
        }
    }

    #[test]
    fn test_check_detects_corruption() {
        let t = b"ACGTACGTTT";
        let mut sa = build(t).unwrap();
        check(t, &sa, false).unwrap();

        let good = sa[3];
        sa[3] = 99;
        assert!(matches!(
            check(t, &sa, false),
            Err(Error::IndexCheckFailed(IndexCheckError::OutOfRange { .. }))
        ));
        sa[3] = good;

        let last = sa.len() - 1;
        sa.swap(0, last);
        assert!(check(t, &sa, false).is_err());
    }

    #[test]
    fn test_longer_tandem_repeat_text() {
        // long repeat structure exercises the tandem repeat sort
        let mut t = Vec::new();
        for _ in 0..50 {
            t.extend_from_slice(b"ACGTACGA");
        }
        t.extend_from_slice(b"TTTT");
        let sa = build(&t).unwrap();
        assert_eq!(sa, naive_sa(&t));
        check(&t, &sa, false).unwrap();
    }
}

//! Substring sort for type B* suffixes.
//!
//! Multikey introsort over the two-character-bucketed B* substrings:
//! descends one character of depth at a time, switches to insertion
//! sort below a small threshold and to heapsort once the recursion
//! depth budget is spent. Lexicographically equal substrings are
//! marked by complementing their entries so the rank-assignment pass
//! can recognize groups.

use super::{SaIdx, ilg};

const INSERTIONSORT_THRESHOLD: SaIdx = 8;

/// Work item of the explicit introsort recursion.
struct SsFrame {
    first: usize,
    last: usize,
    depth: SaIdx,
    limit: SaIdx,
}

/// Compare two B* substrings at `depth`. `v1`/`v2` index the PA table
/// at `pa`; a substring runs from its own start to one past its
/// successor's start.
#[inline]
fn compare(t: &[u8], sa: &[SaIdx], pa: usize, v1: SaIdx, v2: SaIdx, depth: SaIdx) -> i32 {
    let mut u1 = (depth + sa[pa + v1 as usize]) as usize;
    let mut u2 = (depth + sa[pa + v2 as usize]) as usize;
    let u1n = (sa[pa + v1 as usize + 1] + 2) as usize;
    let u2n = (sa[pa + v2 as usize + 1] + 2) as usize;

    while u1 < u1n && u2 < u2n && t[u1] == t[u2] {
        u1 += 1;
        u2 += 1;
    }
    if u1 < u1n {
        if u2 < u2n { t[u1] as i32 - t[u2] as i32 } else { 1 }
    } else if u2 < u2n {
        -1
    } else {
        0
    }
}

/// Compare against a synthetic PA pair, used when re-inserting the
/// final B* suffix after the bucket sort.
#[inline]
fn compare_last(
    t: &[u8],
    pai: [SaIdx; 2],
    sa: &[SaIdx],
    pa: usize,
    v2: SaIdx,
    depth: SaIdx,
) -> i32 {
    let mut u1 = (depth + pai[0]) as usize;
    let mut u2 = (depth + sa[pa + v2 as usize]) as usize;
    let u1n = (pai[1] + 2) as usize;
    let u2n = (sa[pa + v2 as usize + 1] + 2) as usize;

    while u1 < u1n && u2 < u2n && t[u1] == t[u2] {
        u1 += 1;
        u2 += 1;
    }
    if u1 < u1n {
        if u2 < u2n { t[u1] as i32 - t[u2] as i32 } else { 1 }
    } else if u2 < u2n {
        -1
    } else {
        0
    }
}

/// Insertion sort for small groups.
fn insertionsort(t: &[u8], sa: &mut [SaIdx], pa: usize, first: usize, last: usize, depth: SaIdx) {
    let mut i = last as isize - 2;
    while first as isize <= i {
        let tv = sa[i as usize];
        let mut j = i as usize + 1;
        let mut r = compare(t, sa, pa, tv, sa[j], depth);
        while 0 < r {
            loop {
                sa[j - 1] = sa[j];
                j += 1;
                if !(j < last && sa[j] < 0) {
                    break;
                }
            }
            if last <= j {
                break;
            }
            r = compare(t, sa, pa, tv, sa[j], depth);
        }
        if r == 0 {
            sa[j] = !sa[j];
        }
        sa[j - 1] = tv;
        i -= 1;
    }
}

#[inline]
fn chr(t: &[u8], sa: &[SaIdx], pa: usize, depth: SaIdx, v: SaIdx) -> i32 {
    t[(depth + sa[pa + v as usize]) as usize] as i32
}

fn fixdown(
    t: &[u8],
    sa: &mut [SaIdx],
    pa: usize,
    depth: SaIdx,
    root: usize,
    i: usize,
    size: usize,
) {
    let v = sa[root + i];
    let c = chr(t, sa, pa, depth, v);
    let mut i = i;
    loop {
        let mut j = 2 * i + 1;
        if j >= size {
            break;
        }
        let mut k = j;
        j += 1;
        let mut d = chr(t, sa, pa, depth, sa[root + k]);
        if j < size {
            let e = chr(t, sa, pa, depth, sa[root + j]);
            if d < e {
                k = j;
                d = e;
            }
        }
        if d <= c {
            break;
        }
        sa[root + i] = sa[root + k];
        i = k;
    }
    sa[root + i] = v;
}

/// Heapsort escape for partitions that exhausted the introsort depth
/// budget.
fn heapsort(t: &[u8], sa: &mut [SaIdx], pa: usize, depth: SaIdx, first: usize, size: usize) {
    let mut m = size;
    if size % 2 == 0 {
        m -= 1;
        if chr(t, sa, pa, depth, sa[first + m / 2]) < chr(t, sa, pa, depth, sa[first + m]) {
            sa.swap(first + m, first + m / 2);
        }
    }
    let mut i = m as isize / 2 - 1;
    while 0 <= i {
        fixdown(t, sa, pa, depth, first, i as usize, m);
        i -= 1;
    }
    if size % 2 == 0 {
        sa.swap(first, first + m);
        fixdown(t, sa, pa, depth, first, 0, m);
    }
    let mut i = m as isize - 1;
    while 0 < i {
        let tv = sa[first];
        sa[first] = sa[first + i as usize];
        fixdown(t, sa, pa, depth, first, 0, i as usize);
        sa[first + i as usize] = tv;
        i -= 1;
    }
}

fn median3(t: &[u8], sa: &[SaIdx], pa: usize, depth: SaIdx, v1: usize, v2: usize, v3: usize) -> usize {
    let x1 = chr(t, sa, pa, depth, sa[v1]);
    let x2 = chr(t, sa, pa, depth, sa[v2]);
    let x3 = chr(t, sa, pa, depth, sa[v3]);
    if x1 < x2 {
        if x2 < x3 { v2 } else { v3 }
    } else if x1 < x3 {
        v1
    } else {
        v3
    }
}

fn median5(
    t: &[u8],
    sa: &[SaIdx],
    pa: usize,
    depth: SaIdx,
    v1: usize,
    v2: usize,
    v3: usize,
    v4: usize,
    v5: usize,
) -> usize {
    let (mut v1, mut v2, mut v3, mut v4, mut v5) = (v1, v2, v3, v4, v5);
    let key = |v: usize, sa: &[SaIdx]| chr(t, sa, pa, depth, sa[v]);
    if key(v2, sa) > key(v3, sa) {
        std::mem::swap(&mut v2, &mut v3);
    }
    if key(v4, sa) > key(v5, sa) {
        std::mem::swap(&mut v4, &mut v5);
    }
    if key(v2, sa) > key(v4, sa) {
        std::mem::swap(&mut v2, &mut v4);
        std::mem::swap(&mut v3, &mut v5);
    }
    if key(v1, sa) > key(v3, sa) {
        std::mem::swap(&mut v1, &mut v3);
    }
    if key(v1, sa) > key(v4, sa) {
        std::mem::swap(&mut v1, &mut v4);
        std::mem::swap(&mut v3, &mut v5);
    }
    if key(v3, sa) > key(v4, sa) { v4 } else { v3 }
}

/// Pivot selection: median of three for small ranges, of five for
/// medium, pseudo-median of nine for large.
fn pivot(t: &[u8], sa: &[SaIdx], pa: usize, depth: SaIdx, first: usize, last: usize) -> usize {
    let mut t_len = last - first;
    let mut middle = first + t_len / 2;

    if t_len <= 512 {
        if t_len <= 32 {
            return median3(t, sa, pa, depth, first, middle, last - 1);
        }
        t_len >>= 2;
        return median5(
            t,
            sa,
            pa,
            depth,
            first,
            first + t_len,
            middle,
            last - 1 - t_len,
            last - 1,
        );
    }
    t_len >>= 3;
    let first = median3(t, sa, pa, depth, first, first + t_len, first + (t_len << 1));
    middle = median3(t, sa, pa, depth, middle - t_len, middle, middle + t_len);
    let last = median3(
        t,
        sa,
        pa,
        depth,
        last - 1 - (t_len << 1),
        last - 1 - t_len,
        last - 1,
    );
    median3(t, sa, pa, depth, first, middle, last)
}

/// Binary partition by substring-exhaustion at `depth`; exhausted
/// entries move left and are complement-marked as a sorted group.
fn partition(sa: &mut [SaIdx], pa: usize, first: usize, last: usize, depth: SaIdx) -> usize {
    let mut a = first as isize - 1;
    let mut b = last as isize;
    loop {
        loop {
            a += 1;
            if !(a < b) {
                break;
            }
            let v = sa[a as usize];
            if sa[pa + v as usize] + depth >= sa[pa + v as usize + 1] + 1 {
                sa[a as usize] = !v;
            } else {
                break;
            }
        }
        loop {
            b -= 1;
            if !(a < b) {
                break;
            }
            let v = sa[b as usize];
            if sa[pa + v as usize] + depth < sa[pa + v as usize + 1] + 1 {
                break;
            }
        }
        if b <= a {
            break;
        }
        let tv = !sa[b as usize];
        sa[b as usize] = sa[a as usize];
        sa[a as usize] = tv;
    }
    let a = a as usize;
    if first < a {
        sa[first] = !sa[first];
    }
    a
}

/// Multikey introsort for medium size groups.
fn mintrosort(t: &[u8], sa: &mut [SaIdx], pa: usize, first: usize, last: usize, depth: SaIdx) {
    let mut stack: Vec<SsFrame> = Vec::with_capacity(16);
    let mut first = first;
    let mut last = last;
    let mut depth = depth;
    let mut limit = ilg((last - first) as SaIdx);

    loop {
        if (last - first) as SaIdx <= INSERTIONSORT_THRESHOLD {
            if 1 < last - first {
                insertionsort(t, sa, pa, first, last, depth);
            }
            match stack.pop() {
                Some(f) => {
                    first = f.first;
                    last = f.last;
                    depth = f.depth;
                    limit = f.limit;
                    continue;
                }
                None => return,
            }
        }

        if limit == 0 {
            heapsort(t, sa, pa, depth, first, last - first);
        }
        limit -= 1;
        if limit < 0 {
            // scan for the first key change inside an all-equal prefix
            let mut a = first + 1;
            let mut v = chr(t, sa, pa, depth, sa[first]);
            while a < last {
                let x = chr(t, sa, pa, depth, sa[a]);
                if x != v {
                    if 1 < a - first {
                        break;
                    }
                    v = x;
                    first = a;
                }
                a += 1;
            }
            if (t[(sa[pa + sa[first] as usize] + depth - 1) as usize] as i32) < v {
                first = partition(sa, pa, first, a, depth);
            }
            let (df, dl) = (a - first, last - a);
            if df <= dl {
                if 1 < df {
                    stack.push(SsFrame { first: a, last, depth, limit: -1 });
                    last = a;
                    depth += 1;
                    limit = ilg((a - first) as SaIdx);
                } else {
                    first = a;
                    limit = -1;
                }
            } else if 1 < dl {
                stack.push(SsFrame {
                    first,
                    last: a,
                    depth: depth + 1,
                    limit: ilg((a - first) as SaIdx),
                });
                first = a;
                limit = -1;
            } else {
                last = a;
                depth += 1;
                limit = ilg((a - first) as SaIdx);
            }
            continue;
        }

        // choose pivot
        let piv = pivot(t, sa, pa, depth, first, last);
        let v = chr(t, sa, pa, depth, sa[piv]);
        sa.swap(first, piv);

        // three-way partition on the pivot character
        let mut b = first;
        let mut x = 0;
        loop {
            b += 1;
            if !(b < last) {
                break;
            }
            x = chr(t, sa, pa, depth, sa[b]);
            if x != v {
                break;
            }
        }
        let mut a = b;
        if a < last && x < v {
            loop {
                b += 1;
                if !(b < last) {
                    break;
                }
                x = chr(t, sa, pa, depth, sa[b]);
                if x > v {
                    break;
                }
                if x == v {
                    sa.swap(b, a);
                    a += 1;
                }
            }
        }
        let mut c = last;
        loop {
            c -= 1;
            if !(b < c) {
                break;
            }
            x = chr(t, sa, pa, depth, sa[c]);
            if x != v {
                break;
            }
        }
        let mut d = c;
        if b < d && x > v {
            loop {
                c -= 1;
                if !(b < c) {
                    break;
                }
                x = chr(t, sa, pa, depth, sa[c]);
                if x < v {
                    break;
                }
                if x == v {
                    sa.swap(c, d);
                    d -= 1;
                }
            }
        }
        while b < c {
            sa.swap(b, c);
            loop {
                b += 1;
                if !(b < c) {
                    break;
                }
                x = chr(t, sa, pa, depth, sa[b]);
                if x > v {
                    break;
                }
                if x == v {
                    sa.swap(b, a);
                    a += 1;
                }
            }
            loop {
                c -= 1;
                if !(b < c) {
                    break;
                }
                x = chr(t, sa, pa, depth, sa[c]);
                if x < v {
                    break;
                }
                if x == v {
                    sa.swap(c, d);
                    d -= 1;
                }
            }
        }

        if a <= d {
            let c = b - 1;

            let mut s = a - first;
            let tt = b - a;
            if s > tt {
                s = tt;
            }
            let (mut e, mut f) = (first, b - s);
            while 0 < s {
                sa.swap(e, f);
                s -= 1;
                e += 1;
                f += 1;
            }
            let mut s = d - c;
            let tt = last - d - 1;
            if s > tt {
                s = tt;
            }
            let (mut e, mut f) = (b, last - s);
            while 0 < s {
                sa.swap(e, f);
                s -= 1;
                e += 1;
                f += 1;
            }

            let a2 = first + (b - a);
            let c2 = last - (d - c);
            let b2 = if v <= t[(sa[pa + sa[a2] as usize] + depth - 1) as usize] as i32 {
                a2
            } else {
                partition(sa, pa, a2, c2, depth)
            };

            if a2 - first <= last - c2 {
                if last - c2 <= c2 - b2 {
                    stack.push(SsFrame { first: b2, last: c2, depth: depth + 1, limit: ilg((c2 - b2) as SaIdx) });
                    stack.push(SsFrame { first: c2, last, depth, limit });
                    last = a2;
                } else if a2 - first <= c2 - b2 {
                    stack.push(SsFrame { first: c2, last, depth, limit });
                    stack.push(SsFrame { first: b2, last: c2, depth: depth + 1, limit: ilg((c2 - b2) as SaIdx) });
                    last = a2;
                } else {
                    stack.push(SsFrame { first: c2, last, depth, limit });
                    stack.push(SsFrame { first, last: a2, depth, limit });
                    first = b2;
                    last = c2;
                    depth += 1;
                    limit = ilg((c2 - b2) as SaIdx);
                }
            } else if a2 - first <= c2 - b2 {
                stack.push(SsFrame { first: b2, last: c2, depth: depth + 1, limit: ilg((c2 - b2) as SaIdx) });
                stack.push(SsFrame { first, last: a2, depth, limit });
                first = c2;
            } else if last - c2 <= c2 - b2 {
                stack.push(SsFrame { first, last: a2, depth, limit });
                stack.push(SsFrame { first: b2, last: c2, depth: depth + 1, limit: ilg((c2 - b2) as SaIdx) });
                first = c2;
            } else {
                stack.push(SsFrame { first, last: a2, depth, limit });
                stack.push(SsFrame { first: c2, last, depth, limit });
                first = b2;
                last = c2;
                depth += 1;
                limit = ilg((c2 - b2) as SaIdx);
            }
        } else {
            limit += 1;
            if (t[(sa[pa + sa[first] as usize] + depth - 1) as usize] as i32) < v {
                first = partition(sa, pa, first, last, depth);
                limit = ilg((last - first) as SaIdx);
            }
            depth += 1;
        }
    }
}

/// Sort one two-character bucket of B* substrings.
///
/// When `lastsuffix` is set, the bucket's first entry is the final B*
/// suffix of the text; it is excluded from the main sort and inserted
/// afterwards by a linear scan, since its substring has no successor
/// entry in PA.
pub(super) fn sort(
    t: &[u8],
    sa: &mut [SaIdx],
    pa: usize,
    mut first: usize,
    last: usize,
    depth: SaIdx,
    n: SaIdx,
    lastsuffix: bool,
) {
    if lastsuffix {
        first += 1;
    }

    if 1 < last.saturating_sub(first) {
        mintrosort(t, sa, pa, first, last, depth);
    }

    if lastsuffix {
        // insert the last type B* suffix
        let pai = [sa[pa + sa[first - 1] as usize], n - 2];
        let i = sa[first - 1];
        let mut a = first;
        while a < last {
            let v = sa[a];
            if !(v < 0 || 0 < compare_last(t, pai, sa, pa, v, depth)) {
                break;
            }
            sa[a - 1] = sa[a];
            a += 1;
        }
        sa[a - 1] = i;
    }
}

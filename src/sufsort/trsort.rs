//! Tandem repeat sort.
//!
//! Larsson-Sadakane style refinement of the B* rank array: each pass
//! doubles the probing depth and re-sorts the groups that are still
//! unresolved. A work budget (`TrBudget`) bounds how much sorting a
//! single partition may consume before the pass gives up on it and
//! defers the remainder to the next doubling.

use super::{SaIdx, ilg};

const INSERTIONSORT_THRESHOLD: isize = 8;

/// Limit markers threaded through the work queue.
const LIMIT_TANDEM: SaIdx = -1;
const LIMIT_COPY: SaIdx = -2;
const LIMIT_SORTED: SaIdx = -3;

/// Work item of the explicit introsort recursion. `isad == usize::MAX`
/// marks a deferred-copy record rather than a sort range.
struct TrFrame {
    isad: usize,
    first: usize,
    last: usize,
    limit: SaIdx,
    trlink: isize,
}

/// Work budget limiting how much a single partition may consume.
pub(super) struct TrBudget {
    chance: SaIdx,
    remain: SaIdx,
    incval: SaIdx,
    count: SaIdx,
}

impl TrBudget {
    fn new(chance: SaIdx, incval: SaIdx) -> Self {
        TrBudget { chance, remain: incval, incval, count: 0 }
    }

    fn check(&mut self, size: SaIdx) -> bool {
        if size <= self.remain {
            self.remain -= size;
            return true;
        }
        if self.chance == 0 {
            self.count += size;
            return false;
        }
        self.remain += self.incval - size;
        self.chance -= 1;
        true
    }
}

#[inline]
fn key(sa: &[SaIdx], isad: usize, v: SaIdx) -> SaIdx {
    sa[isad + v as usize]
}

/// Simple insertion sort for small size groups.
fn insertionsort(sa: &mut [SaIdx], isad: usize, first: usize, last: usize) {
    let mut a = first as isize + 1;
    while (a as usize) < last {
        let t = sa[a as usize];
        let mut b = a - 1;
        let mut r = key(sa, isad, t) - key(sa, isad, sa[b as usize]);
        while 0 > r {
            loop {
                sa[(b + 1) as usize] = sa[b as usize];
                b -= 1;
                if !(first as isize <= b && sa[b as usize] < 0) {
                    break;
                }
            }
            if b < first as isize {
                break;
            }
            r = key(sa, isad, t) - key(sa, isad, sa[b as usize]);
        }
        if r == 0 {
            sa[b as usize] = !sa[b as usize];
        }
        sa[(b + 1) as usize] = t;
        a += 1;
    }
}

fn fixdown(sa: &mut [SaIdx], isad: usize, root: usize, i: usize, size: usize) {
    let v = sa[root + i];
    let c = key(sa, isad, v);
    let mut i = i;
    loop {
        let mut j = 2 * i + 1;
        if j >= size {
            break;
        }
        let mut k = j;
        j += 1;
        let mut d = key(sa, isad, sa[root + k]);
        if j < size {
            let e = key(sa, isad, sa[root + j]);
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

fn heapsort(sa: &mut [SaIdx], isad: usize, first: usize, size: usize) {
    let mut m = size;
    if size % 2 == 0 {
        m -= 1;
        if key(sa, isad, sa[first + m / 2]) < key(sa, isad, sa[first + m]) {
            sa.swap(first + m, first + m / 2);
        }
    }
    let mut i = m as isize / 2 - 1;
    while 0 <= i {
        fixdown(sa, isad, first, i as usize, m);
        i -= 1;
    }
    if size % 2 == 0 {
        sa.swap(first, first + m);
        fixdown(sa, isad, first, 0, m);
    }
    let mut i = m as isize - 1;
    while 0 < i {
        let t = sa[first];
        sa[first] = sa[first + i as usize];
        fixdown(sa, isad, first, 0, i as usize);
        sa[first + i as usize] = t;
        i -= 1;
    }
}

fn median3(sa: &[SaIdx], isad: usize, v1: usize, v2: usize, v3: usize) -> usize {
    let (mut v1, mut v2) = (v1, v2);
    if key(sa, isad, sa[v1]) > key(sa, isad, sa[v2]) {
        std::mem::swap(&mut v1, &mut v2);
    }
    if key(sa, isad, sa[v2]) > key(sa, isad, sa[v3]) {
        if key(sa, isad, sa[v1]) > key(sa, isad, sa[v3]) {
            return v1;
        }
        return v3;
    }
    v2
}

fn median5(sa: &[SaIdx], isad: usize, v1: usize, v2: usize, v3: usize, v4: usize, v5: usize) -> usize {
    let (mut v1, mut v2, mut v3, mut v4, mut v5) = (v1, v2, v3, v4, v5);
    if key(sa, isad, sa[v2]) > key(sa, isad, sa[v3]) {
        std::mem::swap(&mut v2, &mut v3);
    }
    if key(sa, isad, sa[v4]) > key(sa, isad, sa[v5]) {
        std::mem::swap(&mut v4, &mut v5);
    }
    if key(sa, isad, sa[v2]) > key(sa, isad, sa[v4]) {
        std::mem::swap(&mut v2, &mut v4);
        std::mem::swap(&mut v3, &mut v5);
    }
    if key(sa, isad, sa[v1]) > key(sa, isad, sa[v3]) {
        std::mem::swap(&mut v1, &mut v3);
    }
    if key(sa, isad, sa[v1]) > key(sa, isad, sa[v4]) {
        std::mem::swap(&mut v1, &mut v4);
        std::mem::swap(&mut v3, &mut v5);
    }
    if key(sa, isad, sa[v3]) > key(sa, isad, sa[v4]) { v4 } else { v3 }
}

fn pivot(sa: &[SaIdx], isad: usize, first: usize, last: usize) -> usize {
    let mut t = last - first;
    let mut middle = first + t / 2;

    if t <= 512 {
        if t <= 32 {
            return median3(sa, isad, first, middle, last - 1);
        }
        t >>= 2;
        return median5(sa, isad, first, first + t, middle, last - 1 - t, last - 1);
    }
    t >>= 3;
    let first = median3(sa, isad, first, first + t, first + (t << 1));
    middle = median3(sa, isad, middle - t, middle, middle + t);
    let last = median3(sa, isad, last - 1 - (t << 1), last - 1 - t, last - 1);
    median3(sa, isad, first, middle, last)
}

/// Ternary partition around rank `v`; returns the equal range.
fn partition(
    sa: &mut [SaIdx],
    isad: usize,
    first: usize,
    middle: usize,
    last: usize,
    v: SaIdx,
) -> (usize, usize) {
    let mut b = middle as isize - 1;
    let mut x = 0;
    loop {
        b += 1;
        if !((b as usize) < last) {
            break;
        }
        x = key(sa, isad, sa[b as usize]);
        if x != v {
            break;
        }
    }
    let mut a = b;
    if (a as usize) < last && x < v {
        loop {
            b += 1;
            if !((b as usize) < last) {
                break;
            }
            x = key(sa, isad, sa[b as usize]);
            if x > v {
                break;
            }
            if x == v {
                sa.swap(b as usize, a as usize);
                a += 1;
            }
        }
    }
    let mut c = last as isize;
    loop {
        c -= 1;
        if !(b < c) {
            break;
        }
        x = key(sa, isad, sa[c as usize]);
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
            x = key(sa, isad, sa[c as usize]);
            if x < v {
                break;
            }
            if x == v {
                sa.swap(c as usize, d as usize);
                d -= 1;
            }
        }
    }
    while b < c {
        sa.swap(b as usize, c as usize);
        loop {
            b += 1;
            if !(b < c) {
                break;
            }
            x = key(sa, isad, sa[b as usize]);
            if x > v {
                break;
            }
            if x == v {
                sa.swap(b as usize, a as usize);
                a += 1;
            }
        }
        loop {
            c -= 1;
            if !(b < c) {
                break;
            }
            x = key(sa, isad, sa[c as usize]);
            if x < v {
                break;
            }
            if x == v {
                sa.swap(c as usize, d as usize);
                d -= 1;
            }
        }
    }

    let mut first = first as isize;
    let mut last = last as isize;
    if a <= d {
        let c = b - 1;
        let mut s = a - first;
        let t = b - a;
        if s > t {
            s = t;
        }
        let (mut e, mut f) = (first, b - s);
        while 0 < s {
            sa.swap(e as usize, f as usize);
            s -= 1;
            e += 1;
            f += 1;
        }
        let mut s = d - c;
        let t = last - d - 1;
        if s > t {
            s = t;
        }
        let (mut e, mut f) = (b, last - s);
        while 0 < s {
            sa.swap(e as usize, f as usize);
            s -= 1;
            e += 1;
            f += 1;
        }
        first += b - a;
        last -= d - c;
    }
    (first as usize, last as usize)
}

/// Sort the middle partition using the already-sorted order of the
/// left and right partitions.
fn copy(sa: &mut [SaIdx], isa: usize, first: usize, a: usize, b: usize, last: usize, depth: SaIdx) {
    let v = (b - 1) as SaIdx;
    let mut d = a as isize - 1;
    let mut c = first as isize;
    while c <= d {
        let s = sa[c as usize] - depth;
        if 0 <= s && sa[isa + s as usize] == v {
            d += 1;
            sa[d as usize] = s;
            sa[isa + s as usize] = d as SaIdx;
        }
        c += 1;
    }
    let e = d + 1;
    let mut d = b as isize;
    let mut c = last as isize - 1;
    while e < d {
        let s = sa[c as usize] - depth;
        if 0 <= s && sa[isa + s as usize] == v {
            d -= 1;
            sa[d as usize] = s;
            sa[isa + s as usize] = d as SaIdx;
        }
        c -= 1;
    }
}

/// Like `copy`, but assigns fresh ranks as it goes; used once a
/// sibling partition has already run out of budget.
fn partialcopy(sa: &mut [SaIdx], isa: usize, first: usize, a: usize, b: usize, last: usize, depth: SaIdx) {
    let v = (b - 1) as SaIdx;
    let mut lastrank: SaIdx = -1;
    let mut newrank: SaIdx = -1;
    let mut d = a as isize - 1;
    let mut c = first as isize;
    while c <= d {
        let s = sa[c as usize] - depth;
        if 0 <= s && sa[isa + s as usize] == v {
            d += 1;
            sa[d as usize] = s;
            let rank = sa[isa + (s + depth) as usize];
            if lastrank != rank {
                lastrank = rank;
                newrank = d as SaIdx;
            }
            sa[isa + s as usize] = newrank;
        }
        c += 1;
    }

    lastrank = -1;
    let mut e = d;
    while first as isize <= e {
        let rank = sa[isa + sa[e as usize] as usize];
        if lastrank != rank {
            lastrank = rank;
            newrank = e as SaIdx;
        }
        if newrank != rank {
            sa[isa + sa[e as usize] as usize] = newrank;
        }
        e -= 1;
    }

    lastrank = -1;
    let e = d + 1;
    let mut d = b as isize;
    let mut c = last as isize - 1;
    while e < d {
        let s = sa[c as usize] - depth;
        if 0 <= s && sa[isa + s as usize] == v {
            d -= 1;
            sa[d as usize] = s;
            let rank = sa[isa + (s + depth) as usize];
            if lastrank != rank {
                lastrank = rank;
                newrank = d as SaIdx;
            }
            sa[isa + s as usize] = newrank;
        }
        c -= 1;
    }
}

/// Introsort over rank keys with the tandem-repeat special cases.
fn introsort(
    sa: &mut [SaIdx],
    isa: usize,
    mut isad: usize,
    mut first: usize,
    mut last: usize,
    budget: &mut TrBudget,
) {
    let mut stack: Vec<TrFrame> = Vec::with_capacity(32);
    let incr = isad - isa;
    let mut limit = ilg((last - first) as SaIdx);
    let mut trlink: isize = -1;

    macro_rules! pop_or_return {
        () => {
            match stack.pop() {
                Some(f) => {
                    isad = f.isad;
                    first = f.first;
                    last = f.last;
                    limit = f.limit;
                    trlink = f.trlink;
                    continue;
                }
                None => return,
            }
        };
    }

    loop {
        if limit < 0 {
            if limit == LIMIT_TANDEM {
                // tandem repeat partition
                let (a, b) = partition(sa, isad - incr, first, first, last, (last - 1) as SaIdx);

                // update ranks
                if a < last {
                    let v = (a - 1) as SaIdx;
                    for c in first..a {
                        sa[isa + sa[c] as usize] = v;
                    }
                }
                if b < last {
                    let v = (b - 1) as SaIdx;
                    for c in a..b {
                        sa[isa + sa[c] as usize] = v;
                    }
                }

                // push
                if 1 < b - a {
                    stack.push(TrFrame { isad: usize::MAX, first: a, last: b, limit: 0, trlink: 0 });
                    stack.push(TrFrame { isad: isad - incr, first, last, limit: LIMIT_COPY, trlink });
                    trlink = stack.len() as isize - 2;
                }
                if a - first <= last - b {
                    if 1 < a - first {
                        stack.push(TrFrame { isad, first: b, last, limit: ilg((last - b) as SaIdx), trlink });
                        last = a;
                        limit = ilg((a - first) as SaIdx);
                    } else if 1 < last - b {
                        first = b;
                        limit = ilg((last - b) as SaIdx);
                    } else {
                        pop_or_return!();
                    }
                } else if 1 < last - b {
                    stack.push(TrFrame { isad, first, last: a, limit: ilg((a - first) as SaIdx), trlink });
                    first = b;
                    limit = ilg((last - b) as SaIdx);
                } else if 1 < a - first {
                    last = a;
                    limit = ilg((a - first) as SaIdx);
                } else {
                    pop_or_return!();
                }
            } else if limit == LIMIT_COPY {
                // tandem repeat copy
                let f = stack.pop().expect("copy record");
                if f.limit == 0 {
                    copy(sa, isa, first, f.first, f.last, last, (isad - isa) as SaIdx);
                } else {
                    if 0 <= trlink {
                        stack[trlink as usize].limit = -1;
                    }
                    partialcopy(sa, isa, first, f.first, f.last, last, (isad - isa) as SaIdx);
                }
                pop_or_return!();
            } else {
                // sorted partition
                if 0 <= sa[first] {
                    let mut a = first;
                    loop {
                        sa[isa + sa[a] as usize] = a as SaIdx;
                        a += 1;
                        if !(a < last && 0 <= sa[a]) {
                            break;
                        }
                    }
                    first = a;
                }
                if first < last {
                    let mut a = first;
                    loop {
                        sa[a] = !sa[a];
                        a += 1;
                        if !(sa[a] < 0) {
                            break;
                        }
                    }
                    let next = if sa[isa + sa[a] as usize] != key(sa, isad, sa[a]) {
                        ilg((a - first + 1) as SaIdx)
                    } else {
                        -1
                    };
                    a += 1;
                    if a < last {
                        let v = (a - 1) as SaIdx;
                        for b in first..a {
                            sa[isa + sa[b] as usize] = v;
                        }
                    }

                    // push
                    if budget.check((a - first) as SaIdx) {
                        if a - first <= last - a {
                            stack.push(TrFrame { isad, first: a, last, limit: LIMIT_SORTED, trlink });
                            isad += incr;
                            last = a;
                            limit = next;
                        } else if 1 < last - a {
                            stack.push(TrFrame { isad: isad + incr, first, last: a, limit: next, trlink });
                            first = a;
                            limit = LIMIT_SORTED;
                        } else {
                            isad += incr;
                            last = a;
                            limit = next;
                        }
                    } else {
                        if 0 <= trlink {
                            stack[trlink as usize].limit = -1;
                        }
                        if 1 < last - a {
                            first = a;
                            limit = LIMIT_SORTED;
                        } else {
                            pop_or_return!();
                        }
                    }
                } else {
                    pop_or_return!();
                }
            }
            continue;
        }

        if (last - first) as isize <= INSERTIONSORT_THRESHOLD {
            insertionsort(sa, isad, first, last);
            limit = LIMIT_SORTED;
            continue;
        }

        if limit == 0 {
            heapsort(sa, isad, first, last - first);
            let mut a = last as isize - 1;
            while (first as isize) < a {
                let x = key(sa, isad, sa[a as usize]);
                a -= 1;
                while first as isize <= a && key(sa, isad, sa[a as usize]) == x {
                    sa[a as usize] = !sa[a as usize];
                    a -= 1;
                }
            }
            limit = LIMIT_SORTED;
            continue;
        }
        limit -= 1;

        // choose pivot and partition
        let p = pivot(sa, isad, first, last);
        sa.swap(first, p);
        let v = key(sa, isad, sa[first]);

        let (a, b) = partition(sa, isad, first, first + 1, last, v);
        if last - first != b - a {
            let next = if sa[isa + sa[a] as usize] != v { ilg((b - a) as SaIdx) } else { -1 };

            // update ranks
            let rv = (a - 1) as SaIdx;
            for c in first..a {
                sa[isa + sa[c] as usize] = rv;
            }
            if b < last {
                let rv = (b - 1) as SaIdx;
                for c in a..b {
                    sa[isa + sa[c] as usize] = rv;
                }
            }

            // push
            if 1 < b - a && budget.check((b - a) as SaIdx) {
                if a - first <= last - b {
                    if last - b <= b - a {
                        if 1 < a - first {
                            stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                            stack.push(TrFrame { isad, first: b, last, limit, trlink });
                            last = a;
                        } else if 1 < last - b {
                            stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                            first = b;
                        } else {
                            isad += incr;
                            first = a;
                            last = b;
                            limit = next;
                        }
                    } else if a - first <= b - a {
                        if 1 < a - first {
                            stack.push(TrFrame { isad, first: b, last, limit, trlink });
                            stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                            last = a;
                        } else {
                            stack.push(TrFrame { isad, first: b, last, limit, trlink });
                            isad += incr;
                            first = a;
                            last = b;
                            limit = next;
                        }
                    } else {
                        stack.push(TrFrame { isad, first: b, last, limit, trlink });
                        stack.push(TrFrame { isad, first, last: a, limit, trlink });
                        isad += incr;
                        first = a;
                        last = b;
                        limit = next;
                    }
                } else if a - first <= b - a {
                    if 1 < last - b {
                        stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                        stack.push(TrFrame { isad, first, last: a, limit, trlink });
                        first = b;
                    } else if 1 < a - first {
                        stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                        last = a;
                    } else {
                        isad += incr;
                        first = a;
                        last = b;
                        limit = next;
                    }
                } else if last - b <= b - a {
                    if 1 < last - b {
                        stack.push(TrFrame { isad, first, last: a, limit, trlink });
                        stack.push(TrFrame { isad: isad + incr, first: a, last: b, limit: next, trlink });
                        first = b;
                    } else {
                        stack.push(TrFrame { isad, first, last: a, limit, trlink });
                        isad += incr;
                        first = a;
                        last = b;
                        limit = next;
                    }
                } else {
                    stack.push(TrFrame { isad, first, last: a, limit, trlink });
                    stack.push(TrFrame { isad, first: b, last, limit, trlink });
                    isad += incr;
                    first = a;
                    last = b;
                    limit = next;
                }
            } else {
                if 1 < b - a && 0 <= trlink {
                    stack[trlink as usize].limit = -1;
                }
                if a - first <= last - b {
                    if 1 < a - first {
                        stack.push(TrFrame { isad, first: b, last, limit, trlink });
                        last = a;
                    } else if 1 < last - b {
                        first = b;
                    } else {
                        pop_or_return!();
                    }
                } else if 1 < last - b {
                    stack.push(TrFrame { isad, first, last: a, limit, trlink });
                    first = b;
                } else if 1 < a - first {
                    last = a;
                } else {
                    pop_or_return!();
                }
            }
        } else if budget.check((last - first) as SaIdx) {
            limit = ilg((last - first) as SaIdx);
            isad += incr;
        } else {
            if 0 <= trlink {
                stack[trlink as usize].limit = -1;
            }
            pop_or_return!();
        }
    }
}

/// Tandem repeat sort of the B* rank array.
///
/// `isa` is the offset of the rank table inside `sa`; ranks for the
/// `n` B* suffixes live at `sa[isa..isa + n]` and the suffix order
/// under refinement at `sa[..n]`. Skip runs between resolved groups
/// are encoded as negative lengths in the order array.
pub(super) fn sort(sa: &mut [SaIdx], isa: usize, n: SaIdx, depth: SaIdx) {
    let mut budget = TrBudget::new(ilg(n) * 2 / 3, n);
    let mut isad = isa + depth as usize;

    while -n < sa[0] {
        let mut first = 0usize;
        let mut skip: isize = 0;
        let mut unsorted: SaIdx = 0;
        loop {
            let t = sa[first];
            if t < 0 {
                first = (first as isize - t as isize) as usize;
                skip += t as isize;
            } else {
                if skip != 0 {
                    sa[(first as isize + skip) as usize] = skip as SaIdx;
                    skip = 0;
                }
                let last = sa[isa + t as usize] as usize + 1;
                if 1 < last - first {
                    budget.count = 0;
                    introsort(sa, isa, isad, first, last, &mut budget);
                    if budget.count != 0 {
                        unsorted += budget.count;
                    } else {
                        skip = first as isize - last as isize;
                    }
                } else if last - first == 1 {
                    skip = -1;
                }
                first = last;
            }
            if first >= n as usize {
                break;
            }
        }
        if skip != 0 {
            sa[(first as isize + skip) as usize] = skip as SaIdx;
        }
        if unsorted == 0 {
            break;
        }
        isad += isad - isa;
    }
}

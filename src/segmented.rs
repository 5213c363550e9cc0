//! Segmented iterators.
//!
//! A segmented position is a pair (segment, local offset). Algorithms written against
//! [`Cursor`] see a segmented range as a sequence of contiguous runs, one per segment,
//! and delegate each run to the flat code path. The idea follows Austern's
//! "Segmented Iterators and Hierarchical Algorithms".
//!
//! Positions are kept in canonical form: the local offset is always below the segment
//! length, a position at the end of a segment is composed to the start of the next one.
//! Two positions denoting the same element therefore always compare equal.

use crate::uninit::Cursor;
use std::{cmp::Ordering, fmt, marker::PhantomData};

/// Access to the segment structure of a position.
///
/// # Safety
///
/// `data(segment(it))` must point to at least `end(segment(it))` slots for every position
/// the algorithms are given, and `next_segment` / `prev_segment` must walk the segments
/// in storage order.
pub unsafe trait SegmentedIterator: Copy {
    /// Element type.
    type Item;
    /// Segment locator.
    type Segment: Copy + PartialEq;

    /// Segment holding the position.
    fn segment(self) -> Self::Segment;

    /// Offset of the position within its segment.
    fn local(self) -> usize;

    /// First local offset of a segment.
    #[inline]
    fn begin(_seg: Self::Segment) -> usize {
        0
    }

    /// One-past-last local offset of a segment.
    fn end(seg: Self::Segment) -> usize;

    /// Base pointer of a segment.
    /// # Safety
    ///
    /// The segment must be allocated.
    unsafe fn data(seg: Self::Segment) -> *mut Self::Item;

    /// The following segment.
    fn next_segment(seg: Self::Segment) -> Self::Segment;

    /// The preceding segment.
    fn prev_segment(seg: Self::Segment) -> Self::Segment;

    /// Build a position, normalising `local == end(seg)` to the start of the next segment.
    fn compose(seg: Self::Segment, local: usize) -> Self;
}

/// Visit the runs covering `n` slots from `first`, in order, returning the position after them.
pub(crate) fn segmented_runs<I, F>(first: I, n: usize, mut f: F) -> I
where
    I: SegmentedIterator,
    F: FnMut(*mut I::Item, usize),
{
    let mut seg = first.segment();
    let mut local = first.local();
    let mut left = n;
    while left > 0 {
        let take = left.min(I::end(seg) - local);
        unsafe {
            f(I::data(seg).add(local), take);
        }
        left -= take;
        local += take;
        if local == I::end(seg) {
            seg = I::next_segment(seg);
            local = I::begin(seg);
        }
    }
    I::compose(seg, local)
}

/// Visit the runs covering the `n` slots before `last`, last run first, returning the
/// position of the first visited slot.
pub(crate) fn segmented_runs_back<I, F>(last: I, n: usize, mut f: F) -> I
where
    I: SegmentedIterator,
    F: FnMut(*mut I::Item, usize),
{
    let mut seg = last.segment();
    let mut local = last.local();
    let mut left = n;
    while left > 0 {
        if local == I::begin(seg) {
            seg = I::prev_segment(seg);
            local = I::end(seg);
        }
        let take = left.min(local - I::begin(seg));
        local -= take;
        unsafe {
            f(I::data(seg).add(local), take);
        }
        left -= take;
    }
    I::compose(seg, local)
}

/// Position in storage made of `S`-element segments reached through a directory of
/// segment pointers.
pub struct SegPos<T, const S: usize> {
    seg: *mut *mut T,
    local: usize,
    marker: PhantomData<*const T>,
}

impl<T, const S: usize> Clone for SegPos<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T, const S: usize> Copy for SegPos<T, S> {}

impl<T, const S: usize> SegPos<T, S> {
    /// This should produce a compile-time error if S is zero.
    const CHECK_S: usize = {
        assert!(S > 0);
        S
    };

    pub(crate) fn new(seg: *mut *mut T, local: usize) -> Self {
        let _ = Self::CHECK_S;
        debug_assert!(local < S);
        Self {
            seg,
            local,
            marker: PhantomData,
        }
    }

    /// Offset within the segment.
    pub fn local_offset(self) -> usize {
        self.local
    }

    /// Pointer to the slot at this position.
    /// # Safety
    ///
    /// The segment must be allocated.
    pub unsafe fn ptr(self) -> *mut T {
        unsafe { (*self.seg).add(self.local) }
    }

    /// Move by `n` slots, forward or backward. Segment distance uses floor division so
    /// crossing backward over a boundary lands on the right segment.
    #[must_use]
    pub fn offset(self, n: isize) -> Self {
        let s = S as isize;
        let off = self.local as isize + n;
        if (0..s).contains(&off) {
            return Self::new(self.seg, off as usize);
        }
        let seg_delta = off.div_euclid(s);
        let local = off.rem_euclid(s) as usize;
        Self::new(self.seg.wrapping_offset(seg_delta), local)
    }

    /// Move forward by `n` slots.
    #[must_use]
    pub fn add(self, n: usize) -> Self {
        self.offset(n as isize)
    }

    /// Move backward by `n` slots.
    #[must_use]
    pub fn sub(self, n: usize) -> Self {
        self.offset(-(n as isize))
    }

    /// Signed number of slots from `origin` to `self`.
    pub fn distance_from(self, origin: Self) -> isize {
        let segs = (self.seg as isize - origin.seg as isize) / std::mem::size_of::<*mut T>() as isize;
        segs * S as isize + self.local as isize - origin.local as isize
    }
}

unsafe impl<T, const S: usize> SegmentedIterator for SegPos<T, S> {
    type Item = T;
    type Segment = *mut *mut T;

    #[inline]
    fn segment(self) -> *mut *mut T {
        self.seg
    }

    #[inline]
    fn local(self) -> usize {
        self.local
    }

    #[inline]
    fn end(_seg: *mut *mut T) -> usize {
        S
    }

    #[inline]
    unsafe fn data(seg: *mut *mut T) -> *mut T {
        unsafe { *seg }
    }

    #[inline]
    fn next_segment(seg: *mut *mut T) -> *mut *mut T {
        seg.wrapping_add(1)
    }

    #[inline]
    fn prev_segment(seg: *mut *mut T) -> *mut *mut T {
        seg.wrapping_sub(1)
    }

    #[inline]
    fn compose(seg: *mut *mut T, local: usize) -> Self {
        if local == S {
            Self::new(seg.wrapping_add(1), 0)
        } else {
            Self::new(seg, local)
        }
    }
}

impl<T, const S: usize> Cursor<T> for SegPos<T, S> {
    #[inline]
    fn runs<F: FnMut(*mut T, usize)>(self, n: usize, f: F) -> Self {
        segmented_runs(self, n, f)
    }

    #[inline]
    fn runs_back<F: FnMut(*mut T, usize)>(self, n: usize, f: F) -> Self {
        segmented_runs_back(self, n, f)
    }
}

impl<T, const S: usize> PartialEq for SegPos<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.seg == other.seg && self.local == other.local
    }
}
impl<T, const S: usize> Eq for SegPos<T, S> {}

impl<T, const S: usize> PartialOrd for SegPos<T, S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T, const S: usize> Ord for SegPos<T, S> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.seg as usize, self.local).cmp(&(other.seg as usize, other.local))
    }
}

impl<T, const S: usize> fmt::Debug for SegPos<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegPos")
            .field("seg", &self.seg)
            .field("local", &self.local)
            .finish()
    }
}

//! Double-ended queue stored in fixed-size segments.
//!
//! Elements live in segments of `S` slots. A directory of segment pointers, with free
//! entries on both sides, orders the segments. Pushing at either end allocates at most
//! one segment and never moves existing elements, so references to elements stay valid
//! across pushes and pops at the other end.
//!
//! Positions are absolute slot numbers measured from the start of the directory:
//! slot `a` is at offset `a % S` of the segment at directory entry `a / S`.

use crate::alloc::{self, Global, RawAlloc};
use crate::error::{fail, Error, InsertError, Result};
use crate::segmented::SegPos;
use crate::uninit;
use crate::vecs::slice_range;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut, RangeBounds},
    ptr::{self, NonNull},
};

/// Segmented double-ended queue with segment size `S`.
pub struct SegmentedDeque<T, const S: usize, A: RawAlloc = Global> {
    dir: *mut *mut T,
    cap: usize,
    // Directory entries alo..ahi hold allocated segments, all others are null.
    alo: usize,
    ahi: usize,
    head: usize,
    len: usize,
    alloc: A,
    marker: PhantomData<T>,
}

unsafe impl<T: Send, const S: usize, A: RawAlloc + Send> Send for SegmentedDeque<T, S, A> {}
unsafe impl<T: Sync, const S: usize, A: RawAlloc + Sync> Sync for SegmentedDeque<T, S, A> {}

impl<T, const S: usize> SegmentedDeque<T, S> {
    /// Construct an empty deque. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, const S: usize, A: RawAlloc + Default> Default for SegmentedDeque<T, S, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, const S: usize, A: RawAlloc> Drop for SegmentedDeque<T, S, A> {
    fn drop(&mut self) {
        let len = self.len;
        self.len = 0;
        unsafe {
            uninit::destroy_n(self.pos(0), len);
        }
        self.release_all();
    }
}

impl<T, const S: usize, A: RawAlloc> SegmentedDeque<T, S, A> {
    /// Construct an empty deque that allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            dir: ptr::null_mut(),
            cap: 0,
            alo: 0,
            ahi: 0,
            head: 0,
            len: 0,
            alloc,
            marker: PhantomData,
        }
    }

    /// Construct a deque holding `n` clones of `value`.
    pub fn from_elem_in(n: usize, value: &T, alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        let mut d = Self::new_in(alloc);
        d.resize(n, value)?;
        Ok(d)
    }

    /// Construct from an iterator, failing if an allocation fails.
    pub fn try_from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Result<Self> {
        let mut d = Self::new_in(alloc);
        for x in iter {
            d.try_push_back(x)?;
        }
        Ok(d)
    }

    /// The allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the deque empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in allocated segments.
    pub fn capacity(&self) -> usize {
        (self.ahi - self.alo) * S
    }

    /// Largest number of elements the deque could hold.
    pub fn max_size(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            n => isize::MAX as usize / n,
        }
    }

    /// Number of free slots after the last element in allocated segments.
    pub(crate) fn spare_back(&self) -> usize {
        self.ahi * S - self.head - self.len
    }

    /// Number of allocated segments.
    pub fn segment_count(&self) -> usize {
        self.ahi - self.alo
    }

    /// Position of element `i` (`i == len` gives the end position).
    #[inline]
    fn pos(&self, i: usize) -> SegPos<T, S> {
        let a = self.head + i;
        SegPos::new(self.dir.wrapping_add(a / S), a % S)
    }

    /// Pointer to the slot of element `i`.
    /// # Safety
    ///
    /// The slot's segment must be allocated.
    #[inline]
    unsafe fn slot(&self, i: usize) -> *mut T {
        let a = self.head + i;
        unsafe { (*self.dir.add(a / S)).add(a % S) }
    }

    /// Segmented position of element `index`; `index == len` gives the end.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn position(&self, index: usize) -> SegPos<T, S> {
        assert!(index <= self.len, "position {index} out of range for length {}", self.len);
        self.pos(index)
    }

    /// Position of the first element.
    pub fn begin_pos(&self) -> SegPos<T, S> {
        self.pos(0)
    }

    /// Position one past the last element.
    pub fn end_pos(&self) -> SegPos<T, S> {
        self.pos(self.len)
    }

    fn new_segment(&self) -> Result<*mut T> {
        let p = alloc::allocate_array::<T, A>(&self.alloc, S)?;
        log::trace!("allocated segment of {S} slots at {p:?}");
        Ok(p.as_ptr())
    }

    /// Release the segment at directory entry `i`.
    unsafe fn free_segment(&mut self, i: usize) {
        unsafe {
            let e = self.dir.add(i);
            log::trace!("releasing segment at {:?}", *e);
            alloc::deallocate_array(&self.alloc, NonNull::new_unchecked(*e), S);
            *e = ptr::null_mut();
        }
    }

    fn release_all(&mut self) {
        while self.ahi > self.alo {
            self.ahi -= 1;
            unsafe { self.free_segment(self.ahi) }
        }
        if !self.dir.is_null() {
            unsafe {
                alloc::deallocate_array(&self.alloc, NonNull::new_unchecked(self.dir), self.cap);
            }
            self.dir = ptr::null_mut();
        }
        self.cap = 0;
        self.alo = 0;
        self.ahi = 0;
        self.head = 0;
    }

    /// Move the segment window so it starts at directory entry `new_alo`.
    fn rebase(&mut self, new_alo: usize) {
        let used = self.ahi - self.alo;
        self.head = self.head - self.alo * S + new_alo * S;
        self.alo = new_alo;
        self.ahi = new_alo + used;
    }

    /// Make room for `front` more directory entries before the window and `back` after it.
    /// Re-centres in place while the window fills at most half the directory, otherwise
    /// doubles it. Segments are not moved, only their pointers.
    fn reserve_dir(&mut self, front: usize, back: usize) -> Result<()> {
        if !self.dir.is_null() && self.alo >= front && self.ahi + back <= self.cap {
            return Ok(());
        }
        let used = self.ahi - self.alo;
        let needed = used + front + back;
        if !self.dir.is_null() && needed * 2 <= self.cap {
            let new_alo = front + (self.cap - needed) / 2;
            unsafe {
                ptr::copy(self.dir.add(self.alo), self.dir.add(new_alo), used);
                for i in (0..new_alo).chain(new_alo + used..self.cap) {
                    *self.dir.add(i) = ptr::null_mut();
                }
            }
            log::trace!("recentred segment directory of {} entries", self.cap);
            self.rebase(new_alo);
        } else {
            let mut cap = self.cap.max(4) * 2;
            while cap < needed * 2 {
                cap *= 2;
            }
            let nd = alloc::allocate_array::<*mut T, A>(&self.alloc, cap)?.as_ptr();
            let new_alo = front + (cap - needed) / 2;
            unsafe {
                for i in 0..cap {
                    nd.add(i).write(ptr::null_mut());
                }
                if !self.dir.is_null() {
                    ptr::copy_nonoverlapping(self.dir.add(self.alo), nd.add(new_alo), used);
                    alloc::deallocate_array(&self.alloc, NonNull::new_unchecked(self.dir), self.cap);
                }
            }
            log::trace!("segment directory grown from {} to {cap} entries", self.cap);
            self.dir = nd;
            self.cap = cap;
            self.rebase(new_alo);
        }
        Ok(())
    }

    /// Ensure `n` free slots after the last element.
    #[inline]
    pub(crate) fn reserve_back(&mut self, n: usize) -> Result<()> {
        if self.head + self.len + n <= self.ahi * S {
            return Ok(());
        }
        self.grow_back(n)
    }

    fn grow_back(&mut self, n: usize) -> Result<()> {
        let need = (self.head + self.len + n + S - 1) / S - self.ahi;
        self.reserve_dir(0, need)?;
        let target = self.ahi + need;
        while self.ahi < target {
            match self.new_segment() {
                Ok(p) => unsafe {
                    *self.dir.add(self.ahi) = p;
                    self.ahi += 1;
                },
                Err(e) => {
                    self.trim();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Ensure `n` free slots before the first element.
    #[inline]
    fn reserve_front(&mut self, n: usize) -> Result<()> {
        if self.head >= self.alo * S + n {
            return Ok(());
        }
        self.grow_front(n)
    }

    fn grow_front(&mut self, n: usize) -> Result<()> {
        let need = (self.alo * S + n - self.head + S - 1) / S;
        self.reserve_dir(need, 0)?;
        let target = self.alo - need;
        while self.alo > target {
            match self.new_segment() {
                Ok(p) => unsafe {
                    self.alo -= 1;
                    *self.dir.add(self.alo) = p;
                },
                Err(e) => {
                    self.trim();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Release empty segments, keeping at most one spare beyond each end of the live
    /// range. An empty deque keeps a single segment.
    fn trim(&mut self) {
        if self.alo == self.ahi {
            return;
        }
        let (lo, hi) = if self.len == 0 {
            let s = (self.head / S).clamp(self.alo, self.ahi - 1);
            self.head = s * S;
            (s, s + 1)
        } else {
            let first = self.head / S;
            let end = (self.head + self.len + S - 1) / S;
            (first.saturating_sub(1).max(self.alo), (end + 1).min(self.ahi))
        };
        while self.alo < lo {
            unsafe { self.free_segment(self.alo) }
            self.alo += 1;
        }
        while self.ahi > hi {
            self.ahi -= 1;
            unsafe { self.free_segment(self.ahi) }
        }
    }

    /// Release all spare segments. An empty deque releases everything.
    pub fn shrink_to_fit(&mut self) {
        if self.len == 0 {
            self.release_all();
            return;
        }
        let lo = self.head / S;
        let hi = (self.head + self.len + S - 1) / S;
        while self.alo < lo {
            unsafe { self.free_segment(self.alo) }
            self.alo += 1;
        }
        while self.ahi > hi {
            self.ahi -= 1;
            unsafe { self.free_segment(self.ahi) }
        }
    }

    /// Append `value`, returning a reference to it, or hand it back if allocation fails.
    pub fn try_push_back(&mut self, value: T) -> Result<&mut T, InsertError<T>> {
        if let Err(e) = self.reserve_back(1) {
            return Err(InsertError::new(e, value));
        }
        unsafe {
            let p = self.slot(self.len);
            ptr::write(p, value);
            self.len += 1;
            Ok(&mut *p)
        }
    }

    /// Prepend `value`, returning a reference to it, or hand it back if allocation fails.
    pub fn try_push_front(&mut self, value: T) -> Result<&mut T, InsertError<T>> {
        if let Err(e) = self.reserve_front(1) {
            return Err(InsertError::new(e, value));
        }
        unsafe {
            self.head -= 1;
            let p = self.slot(0);
            ptr::write(p, value);
            self.len += 1;
            Ok(&mut *p)
        }
    }

    /// Append `value`.
    /// # Panics
    ///
    /// Panics if allocation fails.
    pub fn push_back(&mut self, value: T) -> &mut T {
        match self.try_push_back(value) {
            Ok(r) => r,
            Err(e) => panic!("SegmentedDeque::push_back: {}", e.error()),
        }
    }

    /// Prepend `value`.
    /// # Panics
    ///
    /// Panics if allocation fails.
    pub fn push_front(&mut self, value: T) -> &mut T {
        match self.try_push_front(value) {
            Ok(r) => r,
            Err(e) => panic!("SegmentedDeque::push_front: {}", e.error()),
        }
    }

    /// Append the value built by `f`. Storage is reserved before `f` runs.
    pub fn emplace_back_with<F: FnOnce() -> T>(&mut self, f: F) -> Result<&mut T> {
        self.reserve_back(1)?;
        unsafe {
            let p = self.slot(self.len);
            ptr::write(p, f());
            self.len += 1;
            Ok(&mut *p)
        }
    }

    /// Prepend the value built by `f`. Storage is reserved before `f` runs.
    pub fn emplace_front_with<F: FnOnce() -> T>(&mut self, f: F) -> Result<&mut T> {
        self.reserve_front(1)?;
        unsafe {
            let a = self.head - 1;
            let p = slot_at::<T, S>(self.dir, a);
            ptr::write(p, f());
            self.head = a;
            self.len += 1;
            Ok(&mut *p)
        }
    }

    /// Remove the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let x = unsafe { ptr::read(self.slot(self.len)) };
        self.trim();
        Some(x)
    }

    /// Remove the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let x = unsafe { ptr::read(self.slot(0)) };
        self.head += 1;
        self.len -= 1;
        self.trim();
        Some(x)
    }

    /// Reference to element `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            unsafe { Some(&*self.slot(index)) }
        } else {
            None
        }
    }

    /// Mutable reference to element `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            unsafe { Some(&mut *self.slot(index)) }
        } else {
            None
        }
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        match self.get(index) {
            Some(x) => Ok(x),
            None => fail(Error::OutOfRange { index, len }),
        }
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        match self.get_mut(index) {
            Some(x) => Ok(x),
            None => fail(Error::OutOfRange { index, len }),
        }
    }

    /// First element.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Last element.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Mutable first element.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Mutable last element.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        match self.len.checked_sub(1) {
            Some(i) => self.get_mut(i),
            None => None,
        }
    }

    /// Index of an element given a reference into this deque.
    pub fn index_of(&self, elem: &T) -> Option<usize> {
        if mem::size_of::<T>() == 0 {
            return if self.len > 0 { Some(0) } else { None };
        }
        let p = elem as *const T as usize;
        for s in self.alo..self.ahi {
            let base = unsafe { *self.dir.add(s) } as usize;
            if p >= base && p < base + S * mem::size_of::<T>() {
                let a = s * S + (p - base) / mem::size_of::<T>();
                return if a >= self.head && a < self.head + self.len {
                    Some(a - self.head)
                } else {
                    None
                };
            }
        }
        None
    }

    /// Iterator over references.
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter {
            dir: self.dir,
            front: self.head,
            back: self.head + self.len,
            marker: PhantomData,
        }
    }

    /// Iterator over mutable references.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, S> {
        IterMut {
            dir: self.dir,
            front: self.head,
            back: self.head + self.len,
            marker: PhantomData,
        }
    }

    /// Open a gap of `n` dead slots at `index`, shifting the front part toward the front
    /// or the back part toward the back. Space must already be reserved on that side.
    /// The gap counts toward `len`.
    unsafe fn open_gap(&mut self, index: usize, n: usize, front: bool) {
        unsafe {
            if front {
                self.head -= n;
                uninit::move_n(self.pos(n), index, self.pos(0));
            } else {
                uninit::move_backward_n(self.pos(self.len), self.len - index, self.pos(self.len + n));
            }
        }
        self.len += n;
    }

    /// Close a gap of `n` dead slots at `index` by shifting the front part toward the
    /// back or the back part toward the front.
    unsafe fn close_gap(&mut self, index: usize, n: usize, front: bool) {
        unsafe {
            if front {
                uninit::move_backward_n(self.pos(index), index, self.pos(index + n));
                self.head += n;
            } else {
                uninit::move_n(self.pos(index + n), self.len - index - n, self.pos(index));
            }
        }
        self.len -= n;
        self.trim();
    }

    /// Insert `value` at `index`, shifting whichever side is shorter.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, InsertError<T>> {
        let front = index < self.len.saturating_sub(index);
        self.try_insert_toward(index, value, front)
    }

    /// Insert `value` at `index`, shifting the front part if `front`, else the back part.
    pub(crate) fn try_insert_toward(&mut self, index: usize, value: T, front: bool) -> Result<&mut T, InsertError<T>> {
        let len = self.len;
        assert!(index <= len, "insertion index {index} out of range for length {len}");
        let r = if front {
            self.reserve_front(1)
        } else {
            self.reserve_back(1)
        };
        if let Err(e) = r {
            return Err(InsertError::new(e, value));
        }
        unsafe {
            self.open_gap(index, 1, front);
            let p = self.slot(index);
            ptr::write(p, value);
            Ok(&mut *p)
        }
    }

    /// Insert `value` at `index`.
    /// # Panics
    ///
    /// Panics if `index > len` or allocation fails.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        match self.try_insert(index, value) {
            Ok(r) => r,
            Err(e) => panic!("SegmentedDeque::insert: {}", e.error()),
        }
    }

    /// Insert `n` values built by `f` at `index`. If `f` panics, the values built so far
    /// are dropped and the deque is restored.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_with_n<F: FnMut() -> T>(&mut self, index: usize, n: usize, f: F) -> Result<()> {
        let front = index < self.len.saturating_sub(index);
        self.insert_with_n_toward(index, n, f, front)
    }

    pub(crate) fn insert_with_n_toward<F: FnMut() -> T>(&mut self, index: usize, n: usize, f: F, front: bool) -> Result<()> {
        let len = self.len;
        assert!(index <= len, "insertion index {index} out of range for length {len}");
        if n == 0 {
            return Ok(());
        }
        if front {
            self.reserve_front(n)?;
        } else {
            self.reserve_back(n)?;
        }
        unsafe {
            self.open_gap(index, n, front);
            let guard = GapGuard {
                d: self,
                index,
                n,
                front,
            };
            uninit::uninitialized_with_n(guard.d.pos(index), n, f);
            mem::forget(guard);
        }
        Ok(())
    }

    /// Insert `n` clones of `value` at `index`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.insert_with_n(index, n, || value.clone())
    }

    /// Insert the items of `iter` at `index`, returning how many were inserted.
    /// # Panics
    ///
    /// Panics if `index > len` or the iterator yields fewer items than it reports.
    pub fn insert_iter<I>(&mut self, index: usize, iter: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut it = iter.into_iter();
        let n = it.len();
        self.insert_with_n(index, n, || match it.next() {
            Some(x) => x,
            None => panic!("iterator yielded fewer items than its reported length"),
        })?;
        Ok(n)
    }

    /// Remove and return element `index`, shifting whichever side is shorter.
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let front = index < self.len.saturating_sub(index + 1);
        self.remove_toward(index, front)
    }

    pub(crate) fn remove_toward(&mut self, index: usize, front: bool) -> T {
        let len = self.len;
        assert!(index < len, "removal index {index} out of range for length {len}");
        unsafe {
            let x = ptr::read(self.slot(index));
            self.close_gap(index, 1, front);
            x
        }
    }

    /// Drop the elements in `range`, shifting whichever side is shorter.
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = slice_range(&range, self.len);
        self.erase_toward(start, end, start < self.len - end);
    }

    pub(crate) fn erase_toward(&mut self, start: usize, end: usize, front: bool) {
        let n = end - start;
        if n == 0 {
            return;
        }
        // If a destructor panics the rest of the range leaks and the gap is still closed.
        let guard = GapGuard {
            d: self,
            index: start,
            n,
            front,
        };
        unsafe {
            uninit::destroy_n(guard.d.pos(start), n);
        }
        drop(guard);
    }

    /// Shorten the deque to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            let old = self.len;
            self.len = len;
            unsafe {
                uninit::destroy_n(self.pos(len), old - len);
            }
            self.trim();
        }
    }

    /// Remove all elements, keeping one segment.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resize to `n` elements, filling new slots with values from `f`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, n: usize, f: F) -> Result<()> {
        if n <= self.len {
            self.truncate(n);
        } else {
            let extra = n - self.len;
            self.reserve_back(extra)?;
            let guard = TrimGuard { d: self };
            unsafe {
                uninit::uninitialized_with_n(guard.d.pos(guard.d.len), extra, f);
            }
            mem::forget(guard);
            self.len = n;
        }
        Ok(())
    }

    /// Resize to `n` elements, cloning `value` into new slots.
    pub fn resize(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.resize_with(n, || value.clone())
    }

    /// Replace the contents with `n` clones of `value`.
    pub fn assign(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        let common = n.min(self.len);
        unsafe {
            uninit::fill_n(self.pos(0), common, value);
        }
        self.resize(n, value)
    }

    /// Replace the contents with the items of `iter`.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<()> {
        let mut iter = iter.into_iter();
        let mut i = 0;
        while i < self.len {
            match iter.next() {
                Some(x) => unsafe { *self.slot(i) = x },
                None => break,
            }
            i += 1;
        }
        self.truncate(i);
        for x in iter {
            self.try_push_back(x)?;
        }
        Ok(())
    }

    /// Keep only the elements for which `f` returns true, preserving order.
    pub fn retain<F: FnMut(&mut T) -> bool>(&mut self, mut f: F) {
        let old_len = self.len;
        let mut g = Compact {
            d: self,
            read: 0,
            write: 0,
            old_len,
        };
        while g.read < g.old_len {
            unsafe {
                let p = g.d.slot(g.read);
                let keep = f(&mut *p);
                g.read += 1;
                if keep {
                    if g.read - 1 != g.write {
                        ptr::copy_nonoverlapping(p, g.d.slot(g.write), 1);
                    }
                    g.write += 1;
                } else {
                    ptr::drop_in_place(p);
                }
            }
        }
    }
}

/// Closes a gap on drop. Used to undo an insert whose element construction panicked
/// and to finish an erase.
struct GapGuard<'a, T, const S: usize, A: RawAlloc> {
    d: &'a mut SegmentedDeque<T, S, A>,
    index: usize,
    n: usize,
    front: bool,
}

impl<T, const S: usize, A: RawAlloc> Drop for GapGuard<'_, T, S, A> {
    fn drop(&mut self) {
        unsafe { self.d.close_gap(self.index, self.n, self.front) }
    }
}

/// Releases the segments reserved for a fill whose element construction panicked.
struct TrimGuard<'a, T, const S: usize, A: RawAlloc> {
    d: &'a mut SegmentedDeque<T, S, A>,
}

impl<T, const S: usize, A: RawAlloc> Drop for TrimGuard<'_, T, S, A> {
    fn drop(&mut self) {
        self.d.trim();
    }
}

/// In-progress `retain`; on drop the unvisited tail is shifted down.
struct Compact<'a, T, const S: usize, A: RawAlloc> {
    d: &'a mut SegmentedDeque<T, S, A>,
    read: usize,
    write: usize,
    old_len: usize,
}

impl<T, const S: usize, A: RawAlloc> Drop for Compact<'_, T, S, A> {
    fn drop(&mut self) {
        let tail = self.old_len - self.read;
        unsafe {
            if self.read != self.write {
                uninit::move_n(self.d.pos(self.read), tail, self.d.pos(self.write));
            }
        }
        self.d.len = self.write + tail;
        self.d.trim();
    }
}

/// Remove every element equal to `value`, returning how many were removed.
pub fn erase<T: PartialEq, const S: usize, A: RawAlloc>(d: &mut SegmentedDeque<T, S, A>, value: &T) -> usize {
    erase_if(d, |x| x == value)
}

/// Remove every element for which `pred` returns true, returning how many were removed.
pub fn erase_if<T, F, const S: usize, A: RawAlloc>(d: &mut SegmentedDeque<T, S, A>, mut pred: F) -> usize
where
    F: FnMut(&T) -> bool,
{
    let old = d.len();
    d.retain(|x| !pred(x));
    old - d.len()
}

impl<T, const S: usize, A: RawAlloc> Index<usize> for SegmentedDeque<T, S, A> {
    type Output = T;
    #[inline]
    fn index(&self, index: usize) -> &T {
        safe_assert!(index < self.len);
        unsafe { &*self.slot(index) }
    }
}

impl<T, const S: usize, A: RawAlloc> IndexMut<usize> for SegmentedDeque<T, S, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        safe_assert!(index < self.len);
        unsafe { &mut *self.slot(index) }
    }
}

impl<T: Clone, const S: usize, A: RawAlloc + Clone> Clone for SegmentedDeque<T, S, A> {
    /// # Panics
    ///
    /// Panics if allocation fails.
    fn clone(&self) -> Self {
        let mut d = Self::new_in(self.alloc.clone());
        if let Err(e) = d.reserve_back(self.len) {
            panic!("SegmentedDeque::clone: {e}");
        }
        unsafe {
            uninit::uninitialized_copy_n(self.pos(0), self.len, d.pos(0));
        }
        d.len = self.len;
        d
    }
}

impl<T: fmt::Debug, const S: usize, A: RawAlloc> fmt::Debug for SegmentedDeque<T, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const S: usize, A: RawAlloc> PartialEq for SegmentedDeque<T, S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}
impl<T: Eq, const S: usize, A: RawAlloc> Eq for SegmentedDeque<T, S, A> {}

impl<T: PartialOrd, const S: usize, A: RawAlloc> PartialOrd for SegmentedDeque<T, S, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}
impl<T: Ord, const S: usize, A: RawAlloc> Ord for SegmentedDeque<T, S, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, const S: usize, A: RawAlloc> Hash for SegmentedDeque<T, S, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for x in self {
            x.hash(state);
        }
    }
}

impl<T, const S: usize, A: RawAlloc + Default> FromIterator<T> for SegmentedDeque<T, S, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut d = Self::default();
        d.extend(iter);
        d
    }
}

impl<T, const S: usize, A: RawAlloc> Extend<T> for SegmentedDeque<T, S, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push_back(x);
        }
    }
}

impl<'a, T: Copy + 'a, const S: usize, A: RawAlloc> Extend<&'a T> for SegmentedDeque<T, S, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &x in iter {
            self.push_back(x);
        }
    }
}

impl<T, const S: usize, const M: usize> From<[T; M]> for SegmentedDeque<T, S> {
    fn from(arr: [T; M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, T, const S: usize, A: RawAlloc> IntoIterator for &'a SegmentedDeque<T, S, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, S>;
    fn into_iter(self) -> Iter<'a, T, S> {
        self.iter()
    }
}

impl<'a, T, const S: usize, A: RawAlloc> IntoIterator for &'a mut SegmentedDeque<T, S, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, S>;
    fn into_iter(self) -> IterMut<'a, T, S> {
        self.iter_mut()
    }
}

impl<T, const S: usize, A: RawAlloc> IntoIterator for SegmentedDeque<T, S, A> {
    type Item = T;
    type IntoIter = IntoIter<T, S, A>;
    fn into_iter(self) -> IntoIter<T, S, A> {
        IntoIter(self)
    }
}

/// Locate absolute slot `a` through directory `dir`.
#[inline]
unsafe fn slot_at<T, const S: usize>(dir: *const *mut T, a: usize) -> *mut T {
    unsafe { (*dir.add(a / S)).add(a % S) }
}

/// Iterator returned by [`SegmentedDeque::iter`]. `nth` is O(1).
pub struct Iter<'a, T, const S: usize> {
    dir: *const *mut T,
    front: usize,
    back: usize,
    marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync, const S: usize> Send for Iter<'_, T, S> {}
unsafe impl<T: Sync, const S: usize> Sync for Iter<'_, T, S> {}

impl<T, const S: usize> Clone for Iter<'_, T, S> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir,
            front: self.front,
            back: self.back,
            marker: PhantomData,
        }
    }
}

impl<'a, T, const S: usize> Iterator for Iter<'a, T, S> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let p = unsafe { slot_at::<T, S>(self.dir, self.front) };
        self.front += 1;
        Some(unsafe { &*p })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<'a, T, const S: usize> DoubleEndedIterator for Iter<'a, T, S> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { &*slot_at::<T, S>(self.dir, self.back) })
    }

    fn nth_back(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.back - self.front {
            self.back = self.front;
            return None;
        }
        self.back -= n;
        self.next_back()
    }
}

impl<T, const S: usize> ExactSizeIterator for Iter<'_, T, S> {}
impl<T, const S: usize> FusedIterator for Iter<'_, T, S> {}

impl<T: fmt::Debug, const S: usize> fmt::Debug for Iter<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Iterator returned by [`SegmentedDeque::iter_mut`].
pub struct IterMut<'a, T, const S: usize> {
    dir: *const *mut T,
    front: usize,
    back: usize,
    marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send, const S: usize> Send for IterMut<'_, T, S> {}
unsafe impl<T: Sync, const S: usize> Sync for IterMut<'_, T, S> {}

impl<'a, T, const S: usize> Iterator for IterMut<'a, T, S> {
    type Item = &'a mut T;
    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let p = unsafe { slot_at::<T, S>(self.dir, self.front) };
        self.front += 1;
        Some(unsafe { &mut *p })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<'a, T, const S: usize> DoubleEndedIterator for IterMut<'a, T, S> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { &mut *slot_at::<T, S>(self.dir, self.back) })
    }
}

impl<T, const S: usize> ExactSizeIterator for IterMut<'_, T, S> {}
impl<T, const S: usize> FusedIterator for IterMut<'_, T, S> {}

/// Consuming iterator for [`SegmentedDeque`].
pub struct IntoIter<T, const S: usize, A: RawAlloc = Global>(SegmentedDeque<T, S, A>);

impl<T, const S: usize, A: RawAlloc> Iterator for IntoIter<T, S, A> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<T, const S: usize, A: RawAlloc> DoubleEndedIterator for IntoIter<T, S, A> {
    fn next_back(&mut self) -> Option<T> {
        self.0.pop_back()
    }
}

impl<T, const S: usize, A: RawAlloc> ExactSizeIterator for IntoIter<T, S, A> {}
impl<T, const S: usize, A: RawAlloc> FusedIterator for IntoIter<T, S, A> {}

impl<T: fmt::Debug, const S: usize, A: RawAlloc> fmt::Debug for IntoIter<T, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.0).finish()
    }
}

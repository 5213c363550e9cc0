//! Fixed-capacity vector stored inline.

use crate::error::{fail, Error, InsertError, Result};
use crate::uninit;
use std::{
    borrow::{Borrow, BorrowMut},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem::{self, MaybeUninit},
    ops::{Bound, Deref, DerefMut, Index, IndexMut, RangeBounds},
    ptr, slice,
};

/// Vec with fixed capacity `N`, stored in place. Never allocates.
///
/// Only `0..len` of the inline buffer holds live values, the rest is raw storage.
/// Operations that would exceed `N` fail with [`Error::CapacityExceeded`] and leave the
/// vector unchanged.
pub struct FixedVec<T, const N: usize> {
    len: usize,
    buf: [MaybeUninit<T>; N],
}

impl<T, const N: usize> Default for FixedVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for FixedVec<T, N> {
    fn drop(&mut self) {
        let len = self.len;
        self.len = 0;
        unsafe {
            uninit::destroy_n(self.mut_ptr(), len);
        }
    }
}

impl<T, const N: usize> FixedVec<T, N> {
    /// Capacity, the same for every instance.
    pub const CAPACITY: usize = N;

    /// Construct an empty vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            len: 0,
            // An array of MaybeUninit needs no initialisation.
            buf: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
        }
    }

    /// Construct a vector holding `n` clones of `value`.
    pub fn from_elem(n: usize, value: &T) -> Result<Self>
    where
        T: Clone,
    {
        let mut v = Self::new();
        v.resize(n, value)?;
        Ok(v)
    }

    /// Construct from an iterator, failing if it yields more than `N` items.
    pub fn try_from_iter<I: IntoIterator<Item = T>>(iter: I) -> Result<Self> {
        let mut v = Self::new();
        for x in iter {
            v.try_push(x)?;
        }
        Ok(v)
    }

    #[inline]
    fn ptr(&self) -> *const T {
        self.buf.as_ptr().cast()
    }

    #[inline]
    fn mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr().cast()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the vector empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Is the vector at capacity?
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Fixed capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Same as capacity.
    #[inline]
    pub const fn max_size(&self) -> usize {
        N
    }

    /// Number of elements that can still be added.
    #[inline]
    pub fn available(&self) -> usize {
        N - self.len
    }

    /// Live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr(), self.len) }
    }

    /// Live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        unsafe { slice::from_raw_parts_mut(self.mut_ptr(), len) }
    }

    /// Raw pointer to the buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr()
    }

    /// Mutable raw pointer to the buffer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.mut_ptr()
    }

    /// Set the length.
    /// # Safety
    ///
    /// `new_len <= N` and `0..new_len` must be initialised.
    pub unsafe fn set_len(&mut self, new_len: usize) {
        safe_assert!(new_len <= N);
        self.len = new_len;
    }

    fn overflow(&self) -> Error {
        log::debug!("fixed vec of capacity {N} is full");
        Error::CapacityExceeded { capacity: N }
    }

    /// Append `value`, returning a reference to it, or hand it back if the vector is full.
    pub fn try_push(&mut self, value: T) -> Result<&mut T, InsertError<T>> {
        if self.is_full() {
            return Err(InsertError::new(self.overflow(), value));
        }
        Ok(unsafe { self.push_unchecked(value) })
    }

    /// Append `value`.
    /// # Panics
    ///
    /// Panics if the vector is full.
    pub fn push(&mut self, value: T) -> &mut T {
        match self.try_push(value) {
            Ok(r) => r,
            Err(e) => panic!("FixedVec::push: {}", e.error()),
        }
    }

    /// Append without checking capacity.
    /// # Safety
    ///
    /// The vector must not be full.
    pub unsafe fn push_unchecked(&mut self, value: T) -> &mut T {
        safe_assert!(self.len < N);
        let len = self.len;
        unsafe {
            let p = self.mut_ptr().add(len);
            ptr::write(p, value);
            self.len += 1;
            &mut *p
        }
    }

    /// Append the value built by `f`. Capacity is checked before `f` runs.
    pub fn emplace_with<F: FnOnce() -> T>(&mut self, f: F) -> Result<&mut T> {
        if self.is_full() {
            return fail(self.overflow());
        }
        Ok(unsafe { self.push_unchecked(f()) })
    }

    /// Remove the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            let len = self.len;
            unsafe { Some(ptr::read(self.mut_ptr().add(len))) }
        }
    }

    /// Insert `value` at `index`, shifting later elements up, or hand it back if full.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, InsertError<T>> {
        let len = self.len;
        assert!(index <= len, "insertion index {index} out of range for length {len}");
        if self.is_full() {
            return Err(InsertError::new(self.overflow(), value));
        }
        unsafe {
            let p = self.mut_ptr().add(index);
            ptr::copy(p, p.add(1), len - index);
            ptr::write(p, value);
            self.len += 1;
            Ok(&mut *p)
        }
    }

    /// Insert `value` at `index`.
    /// # Panics
    ///
    /// Panics if `index > len` or the vector is full.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        match self.try_insert(index, value) {
            Ok(r) => r,
            Err(e) => panic!("FixedVec::insert: {}", e.error()),
        }
    }

    /// Insert `n` clones of `value` at `index`. Either all are inserted or the vector is unchanged.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        let len = self.len;
        assert!(index <= len, "insertion index {index} out of range for length {len}");
        if n > self.available() {
            return fail(self.overflow());
        }
        unsafe {
            uninit::uninitialized_fill_n(self.mut_ptr().add(len), n, value);
        }
        self.len += n;
        self.as_mut_slice()[index..].rotate_right(n);
        Ok(())
    }

    /// Insert the items of `iter` at `index`, returning how many were inserted. If they do
    /// not all fit, nothing is inserted.
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) -> Result<usize> {
        let old_len = self.len;
        assert!(index <= old_len, "insertion index {index} out of range for length {old_len}");
        let mut guard = Truncate {
            keep: old_len,
            v: self,
        };
        for x in iter {
            if guard.v.try_push(x).is_err() {
                let err = guard.v.overflow();
                drop(guard);
                return fail(err);
            }
        }
        guard.keep = guard.v.len;
        let added = guard.keep - old_len;
        guard.v.as_mut_slice()[index..].rotate_right(added);
        Ok(added)
    }

    /// Remove and return the element at `index`, shifting later elements down.
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "removal index {index} out of range for length {len}");
        unsafe {
            let p = self.mut_ptr().add(index);
            let result = ptr::read(p);
            ptr::copy(p.add(1), p, len - index - 1);
            self.len -= 1;
            result
        }
    }

    /// Drop the elements in `range`, shifting later elements down.
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = slice_range(&range, self.len);
        let tail = self.len - end;
        // If a destructor panics the tail leaks rather than being dropped twice.
        self.len = start;
        unsafe {
            let base = self.mut_ptr();
            uninit::destroy_n(base.add(start), end - start);
            uninit::move_n(base.add(end), tail, base.add(start));
        }
        self.len = start + tail;
    }

    /// Shorten the vector to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            let old = self.len;
            self.len = len;
            unsafe {
                uninit::destroy_n(self.mut_ptr().add(len), old - len);
            }
        }
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resize to `n` elements, cloning `value` into new slots.
    pub fn resize(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.resize_with(n, || value.clone())
    }

    /// Resize to `n` elements, filling new slots with values from `f`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, n: usize, f: F) -> Result<()> {
        if n > N {
            return fail(self.overflow());
        }
        if n <= self.len {
            self.truncate(n);
        } else {
            let len = self.len;
            unsafe {
                uninit::uninitialized_with_n(self.mut_ptr().add(len), n - len, f);
            }
            self.len = n;
        }
        Ok(())
    }

    /// Replace the contents with `n` clones of `value`.
    pub fn assign(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        if n > N {
            return fail(self.overflow());
        }
        let len = self.len;
        let common = n.min(len);
        unsafe {
            let base = self.mut_ptr();
            uninit::fill_n(base, common, value);
            if n <= len {
                self.truncate(n);
            } else {
                uninit::uninitialized_fill_n(base.add(len), n - len, value);
                self.len = n;
            }
        }
        Ok(())
    }

    /// Replace the contents with the items of `iter`.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<()> {
        let mut iter = iter.into_iter();
        let mut i = 0;
        while i < self.len {
            match iter.next() {
                Some(x) => self.as_mut_slice()[i] = x,
                None => break,
            }
            i += 1;
        }
        self.truncate(i);
        for x in iter {
            self.try_push(x)?;
        }
        Ok(())
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        match self.as_slice().get(index) {
            Some(x) => Ok(x),
            None => fail(Error::OutOfRange {
                index,
                len: self.len,
            }),
        }
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        match self.as_mut_slice().get_mut(index) {
            Some(x) => Ok(x),
            None => fail(Error::OutOfRange { index, len }),
        }
    }

    /// Index of an element given a reference into this vector.
    pub fn index_of(&self, elem: &T) -> Option<usize> {
        let size = mem::size_of::<T>();
        if size == 0 {
            return if self.len > 0 { Some(0) } else { None };
        }
        let offset = (elem as *const T as usize).wrapping_sub(self.ptr() as usize);
        let index = offset / size;
        if offset % size == 0 && index < self.len {
            Some(index)
        } else {
            None
        }
    }

    /// Keep only the elements for which `f` returns true, preserving order.
    pub fn retain<F: FnMut(&mut T) -> bool>(&mut self, mut f: F) {
        let old_len = self.len;
        self.len = 0;
        let mut g = Compact {
            v: self,
            read: 0,
            write: 0,
            old_len,
        };
        while g.read < g.old_len {
            unsafe {
                let base = g.v.mut_ptr();
                let p = base.add(g.read);
                // A panicking predicate leaves `p` in the unvisited tail.
                let keep = f(&mut *p);
                g.read += 1;
                if keep {
                    if g.read - 1 != g.write {
                        ptr::copy_nonoverlapping(p, base.add(g.write), 1);
                    }
                    g.write += 1;
                } else {
                    ptr::drop_in_place(p);
                }
            }
        }
    }
}

/// Truncates back to `keep` on drop.
struct Truncate<'a, T, const N: usize> {
    keep: usize,
    v: &'a mut FixedVec<T, N>,
}

impl<T, const N: usize> Drop for Truncate<'_, T, N> {
    fn drop(&mut self) {
        self.v.truncate(self.keep);
    }
}

/// State of an in-progress `retain`; on drop (including unwinding out of the predicate)
/// the unvisited tail is shifted down and the length restored.
struct Compact<'a, T, const N: usize> {
    v: &'a mut FixedVec<T, N>,
    read: usize,
    write: usize,
    old_len: usize,
}

impl<T, const N: usize> Drop for Compact<'_, T, N> {
    fn drop(&mut self) {
        let tail = self.old_len - self.read;
        unsafe {
            let base = self.v.mut_ptr();
            if self.read != self.write {
                ptr::copy(base.add(self.read), base.add(self.write), tail);
            }
            self.v.len = self.write + tail;
        }
    }
}

/// Resolve a range against a length.
/// # Panics
///
/// Panics if the range is decreasing or out of bounds.
pub(crate) fn slice_range<R: RangeBounds<usize>>(range: &R, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e + 1,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    assert!(start <= end, "range start {start} is greater than range end {end}");
    assert!(end <= len, "range end {end} out of range for length {len}");
    (start, end)
}

/// Remove every element equal to `value`, returning how many were removed.
pub fn erase<T: PartialEq, const N: usize>(v: &mut FixedVec<T, N>, value: &T) -> usize {
    erase_if(v, |x| x == value)
}

/// Remove every element for which `pred` returns true, returning how many were removed.
pub fn erase_if<T, F, const N: usize>(v: &mut FixedVec<T, N>, mut pred: F) -> usize
where
    F: FnMut(&T) -> bool,
{
    let old = v.len();
    v.retain(|x| !pred(x));
    old - v.len()
}

impl<T, const N: usize> Deref for FixedVec<T, N> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for FixedVec<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for FixedVec<T, N> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> Borrow<[T]> for FixedVec<T, N> {
    fn borrow(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> BorrowMut<[T]> for FixedVec<T, N> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, const N: usize> Index<usize> for FixedVec<T, N> {
    type Output = T;

    /// Unchecked in release builds with `unsafe-optim`.
    #[inline]
    fn index(&self, index: usize) -> &T {
        safe_assert!(index < self.len);
        unsafe { &*self.ptr().add(index) }
    }
}

impl<T, const N: usize> IndexMut<usize> for FixedVec<T, N> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        safe_assert!(index < self.len);
        unsafe { &mut *self.mut_ptr().add(index) }
    }
}

impl<T: Clone, const N: usize> Clone for FixedVec<T, N> {
    fn clone(&self) -> Self {
        let mut v = Self::new();
        unsafe {
            uninit::uninitialized_copy_n(self.ptr() as *mut T, self.len, v.mut_ptr());
        }
        v.len = self.len;
        v
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for FixedVec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: PartialEq, const N: usize> PartialEq for FixedVec<T, N> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}
impl<T: Eq, const N: usize> Eq for FixedVec<T, N> {}

impl<T: PartialEq, const N: usize> PartialEq<[T]> for FixedVec<T, N> {
    fn eq(&self, other: &[T]) -> bool {
        **self == *other
    }
}

impl<T: PartialOrd, const N: usize> PartialOrd for FixedVec<T, N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (**self).partial_cmp(&**other)
    }
}
impl<T: Ord, const N: usize> Ord for FixedVec<T, N> {
    fn cmp(&self, other: &Self) -> Ordering {
        (**self).cmp(&**other)
    }
}

impl<T: Hash, const N: usize> Hash for FixedVec<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<T, const N: usize> FromIterator<T> for FixedVec<T, N> {
    /// # Panics
    ///
    /// Panics if the iterator yields more than `N` items.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        match Self::try_from_iter(iter) {
            Ok(v) => v,
            Err(e) => panic!("FixedVec::from_iter: {e}"),
        }
    }
}

impl<T, const N: usize> Extend<T> for FixedVec<T, N> {
    /// # Panics
    ///
    /// Panics if the vector overflows.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl<'a, T: Copy + 'a, const N: usize> Extend<&'a T> for FixedVec<T, N> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &x in iter {
            self.push(x);
        }
    }
}

impl<T, const N: usize, const M: usize> From<[T; M]> for FixedVec<T, N> {
    /// # Panics
    ///
    /// Panics if `M > N`.
    fn from(arr: [T; M]) -> Self {
        assert!(M <= N, "array of length {M} does not fit in FixedVec of capacity {N}");
        arr.into_iter().collect()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a FixedVec<T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut FixedVec<T, N> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;
    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, const N: usize> IntoIterator for FixedVec<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;
    fn into_iter(self) -> IntoIter<T, N> {
        IntoIter { start: 0, v: self }
    }
}

/// Consuming iterator for [`FixedVec`].
pub struct IntoIter<T, const N: usize> {
    start: usize,
    v: FixedVec<T, N>,
}

impl<T, const N: usize> IntoIter<T, N> {
    /// Remaining elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.v.as_slice()[self.start..]
    }
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        if self.start == self.v.len {
            None
        } else {
            let ix = self.start;
            self.start += 1;
            Some(unsafe { ptr::read(self.v.ptr().add(ix)) })
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.v.len - self.start;
        (n, Some(n))
    }
}

impl<T, const N: usize> DoubleEndedIterator for IntoIter<T, N> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.v.len {
            None
        } else {
            self.v.len -= 1;
            Some(unsafe { ptr::read(self.v.ptr().add(self.v.len)) })
        }
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T, const N: usize> Drop for IntoIter<T, N> {
    fn drop(&mut self) {
        let (start, len) = (self.start, self.v.len);
        self.v.len = 0;
        unsafe {
            uninit::destroy_n(self.v.mut_ptr().add(start), len - start);
        }
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for IntoIter<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

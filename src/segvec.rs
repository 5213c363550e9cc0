//! Growable vector stored in fixed-size segments.
//!
//! Grows at the back only. Growth allocates one segment at a time, so existing elements
//! are never relocated. Insertion and removal in the middle shift the elements after
//! the position.

use crate::alloc::{Global, RawAlloc};
use crate::deque::{self, SegmentedDeque};
use crate::error::{InsertError, Result};
use crate::segmented::SegPos;
use crate::vecs::slice_range;
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::{Index, IndexMut, RangeBounds},
};

/// Segmented vector with segment size `S`.
pub struct SegmentedVec<T, const S: usize, A: RawAlloc = Global> {
    d: SegmentedDeque<T, S, A>,
}

impl<T, const S: usize> SegmentedVec<T, S> {
    /// Construct an empty vector. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            d: SegmentedDeque::new(),
        }
    }
}

impl<T, const S: usize, A: RawAlloc + Default> Default for SegmentedVec<T, S, A> {
    fn default() -> Self {
        Self {
            d: SegmentedDeque::default(),
        }
    }
}

impl<T, const S: usize, A: RawAlloc> SegmentedVec<T, S, A> {
    /// Construct an empty vector that allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            d: SegmentedDeque::new_in(alloc),
        }
    }

    /// Construct a vector holding `n` clones of `value`.
    pub fn from_elem_in(n: usize, value: &T, alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        Ok(Self {
            d: SegmentedDeque::from_elem_in(n, value, alloc)?,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.d.len()
    }

    /// Is the vector empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    /// Number of elements that fit without allocating another segment.
    pub fn capacity(&self) -> usize {
        self.d.len() + self.d.spare_back()
    }

    /// Largest number of elements the vector could hold.
    pub fn max_size(&self) -> usize {
        self.d.max_size()
    }

    /// Number of allocated segments.
    pub fn segment_count(&self) -> usize {
        self.d.segment_count()
    }

    /// Allocate segments so that `n` more elements fit.
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        self.d.reserve_back(n)
    }

    /// Release spare segments.
    pub fn shrink_to_fit(&mut self) {
        self.d.shrink_to_fit();
    }

    /// Segmented position of element `index`; `index == len` gives the end.
    pub fn position(&self, index: usize) -> SegPos<T, S> {
        self.d.position(index)
    }

    /// Append `value`, or hand it back if allocation fails.
    pub fn try_push(&mut self, value: T) -> Result<&mut T, InsertError<T>> {
        self.d.try_push_back(value)
    }

    /// Append `value`.
    /// # Panics
    ///
    /// Panics if allocation fails.
    pub fn push(&mut self, value: T) -> &mut T {
        self.d.push_back(value)
    }

    /// Append the value built by `f`.
    pub fn emplace_with<F: FnOnce() -> T>(&mut self, f: F) -> Result<&mut T> {
        self.d.emplace_back_with(f)
    }

    /// Remove the last element.
    pub fn pop(&mut self) -> Option<T> {
        self.d.pop_back()
    }

    /// Insert `value` at `index`, shifting later elements up.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, InsertError<T>> {
        self.d.try_insert_toward(index, value, false)
    }

    /// Insert `value` at `index`.
    /// # Panics
    ///
    /// Panics if `index > len` or allocation fails.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        match self.try_insert(index, value) {
            Ok(r) => r,
            Err(e) => panic!("SegmentedVec::insert: {}", e.error()),
        }
    }

    /// Insert `n` clones of `value` at `index`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.d.insert_with_n_toward(index, n, || value.clone(), false)
    }

    /// Insert `n` values built by `f` at `index`.
    pub fn insert_with_n<F: FnMut() -> T>(&mut self, index: usize, n: usize, f: F) -> Result<()> {
        self.d.insert_with_n_toward(index, n, f, false)
    }

    /// Remove and return element `index`, shifting later elements down.
    pub fn remove(&mut self, index: usize) -> T {
        self.d.remove_toward(index, false)
    }

    /// Drop the elements in `range`, shifting later elements down.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = slice_range(&range, self.d.len());
        self.d.erase_toward(start, end, false);
    }

    /// Shorten to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.d.truncate(len);
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.d.clear();
    }

    /// Resize to `n` elements, cloning `value` into new slots.
    pub fn resize(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.d.resize(n, value)
    }

    /// Resize to `n` elements, filling new slots with values from `f`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, n: usize, f: F) -> Result<()> {
        self.d.resize_with(n, f)
    }

    /// Replace the contents with `n` clones of `value`.
    pub fn assign(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.d.assign(n, value)
    }

    /// Keep only the elements for which `f` returns true.
    pub fn retain<F: FnMut(&mut T) -> bool>(&mut self, f: F) {
        self.d.retain(f);
    }

    /// Reference to element `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.d.get(index)
    }

    /// Mutable reference to element `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.d.get_mut(index)
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        self.d.at(index)
    }

    /// First element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.d.front()
    }

    /// Last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.d.back()
    }

    /// Index of an element given a reference into this vector.
    pub fn index_of(&self, elem: &T) -> Option<usize> {
        self.d.index_of(elem)
    }

    /// Iterator over references.
    pub fn iter(&self) -> deque::Iter<'_, T, S> {
        self.d.iter()
    }

    /// Iterator over mutable references.
    pub fn iter_mut(&mut self) -> deque::IterMut<'_, T, S> {
        self.d.iter_mut()
    }
}

/// Remove every element for which `pred` returns true, returning how many were removed.
pub fn erase_if<T, F, const S: usize, A: RawAlloc>(v: &mut SegmentedVec<T, S, A>, pred: F) -> usize
where
    F: FnMut(&T) -> bool,
{
    deque::erase_if(&mut v.d, pred)
}

/// Remove every element equal to `value`, returning how many were removed.
pub fn erase<T: PartialEq, const S: usize, A: RawAlloc>(v: &mut SegmentedVec<T, S, A>, value: &T) -> usize {
    deque::erase(&mut v.d, value)
}

impl<T, const S: usize, A: RawAlloc> Index<usize> for SegmentedVec<T, S, A> {
    type Output = T;
    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.d[index]
    }
}

impl<T, const S: usize, A: RawAlloc> IndexMut<usize> for SegmentedVec<T, S, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.d[index]
    }
}

impl<T: Clone, const S: usize, A: RawAlloc + Clone> Clone for SegmentedVec<T, S, A> {
    fn clone(&self) -> Self {
        Self { d: self.d.clone() }
    }
}

impl<T: fmt::Debug, const S: usize, A: RawAlloc> fmt::Debug for SegmentedVec<T, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.d, f)
    }
}

impl<T: PartialEq, const S: usize, A: RawAlloc> PartialEq for SegmentedVec<T, S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.d == other.d
    }
}
impl<T: Eq, const S: usize, A: RawAlloc> Eq for SegmentedVec<T, S, A> {}

impl<T: PartialOrd, const S: usize, A: RawAlloc> PartialOrd for SegmentedVec<T, S, A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.d.partial_cmp(&other.d)
    }
}
impl<T: Ord, const S: usize, A: RawAlloc> Ord for SegmentedVec<T, S, A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.d.cmp(&other.d)
    }
}

impl<T: Hash, const S: usize, A: RawAlloc> Hash for SegmentedVec<T, S, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.d.hash(state);
    }
}

impl<T, const S: usize, A: RawAlloc + Default> FromIterator<T> for SegmentedVec<T, S, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            d: iter.into_iter().collect(),
        }
    }
}

impl<T, const S: usize, const M: usize> From<[T; M]> for SegmentedVec<T, S> {
    fn from(arr: [T; M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<T, const S: usize, A: RawAlloc> Extend<T> for SegmentedVec<T, S, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.d.extend(iter);
    }
}

impl<'a, T, const S: usize, A: RawAlloc> IntoIterator for &'a SegmentedVec<T, S, A> {
    type Item = &'a T;
    type IntoIter = deque::Iter<'a, T, S>;
    fn into_iter(self) -> deque::Iter<'a, T, S> {
        self.d.iter()
    }
}

impl<T, const S: usize, A: RawAlloc> IntoIterator for SegmentedVec<T, S, A> {
    type Item = T;
    type IntoIter = deque::IntoIter<T, S, A>;
    fn into_iter(self) -> deque::IntoIter<T, S, A> {
        self.d.into_iter()
    }
}

//! Unordered set of unique keys in a fixed inline buffer.

use crate::compare::{EqualTo, KeyEq};
use crate::error::{fail, Error, InsertError, Result};
use crate::uninit;
use crate::vecs::{slice_range, FixedVec};
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::RangeBounds,
    slice,
};

/// Set of at most `N` unique keys, unsorted, stored in a [`FixedVec`]. Lookup is a linear
/// scan with `E`. Removal fills the hole from the end, so order is not preserved.
pub struct StaticUnorderedFlatSet<K, const N: usize, E = EqualTo> {
    data: FixedVec<K, N>,
    eq: E,
}

impl<K, const N: usize, E: Default> Default for StaticUnorderedFlatSet<K, N, E> {
    fn default() -> Self {
        Self::with_key_eq(E::default())
    }
}

impl<K, const N: usize, E: Default> StaticUnorderedFlatSet<K, N, E> {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, const N: usize, E> StaticUnorderedFlatSet<K, N, E> {
    /// This should produce a compile-time error if N is zero.
    const CHECK_N: usize = {
        assert!(N > 0);
        N
    };

    /// Empty set using `eq` to compare keys.
    pub fn with_key_eq(eq: E) -> Self {
        let _ = Self::CHECK_N;
        Self {
            data: FixedVec::new(),
            eq,
        }
    }

    /// The key equivalence.
    pub fn key_eq(&self) -> &E {
        &self.eq
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Is the set empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Is the set at capacity?
    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.is_full()
    }

    /// Fixed capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Same as capacity.
    pub const fn max_size(&self) -> usize {
        N
    }

    /// Number of keys that can still be added.
    pub fn available(&self) -> usize {
        self.data.available()
    }

    /// Keys in storage order.
    pub fn as_slice(&self) -> &[K] {
        &self.data
    }

    /// Key at position `i`.
    #[must_use]
    pub fn nth(&self, i: usize) -> Option<&K> {
        self.data.get(i)
    }

    /// Position of a key given a reference into this set.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.data.index_of(key)
    }

    /// Iterator over keys in storage order.
    pub fn iter(&self) -> slice::Iter<'_, K> {
        self.data.iter()
    }

    /// Remove all keys.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Remove and return the key at position `i`; the last key moves into its place.
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn erase_at(&mut self, i: usize) -> K {
        let len = self.data.len();
        assert!(i < len, "removal index {i} out of range for length {len}");
        self.data.swap(i, len - 1);
        match self.data.pop() {
            Some(k) => k,
            None => unreachable!(),
        }
    }

    /// Remove the keys at positions in `range`. The hole is filled either by shifting
    /// the tail down or, when the tail is longer than the range, by the last keys.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let len = self.data.len();
        let (start, end) = slice_range(&range, len);
        let count1 = end - start;
        let count2 = len - end;
        if count1 == 0 {
            return;
        }
        if count1 >= count2 {
            self.data.erase(start..end);
        } else {
            // Swap the last count1 keys into the hole, then drop them from the end.
            let base = self.data.as_mut_ptr();
            unsafe {
                self.data.set_len(start);
                uninit::destroy_n(base.add(start), count1);
                uninit::move_n(base.add(len - count1), count1, base.add(start));
                self.data.set_len(len - count1);
            }
        }
    }

    /// Keep only the keys for which `f` returns true.
    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut f: F) {
        let mut i = 0;
        while i < self.data.len() {
            if f(&self.data[i]) {
                i += 1;
            } else {
                drop(self.erase_at(i));
            }
        }
    }
}

impl<K, const N: usize, E: KeyEq<K>> StaticUnorderedFlatSet<K, N, E> {
    /// Construct from an iterator, skipping duplicates and failing if more than `N` distinct
    /// keys are given.
    pub fn try_from_iter<I: IntoIterator<Item = K>>(iter: I) -> Result<Self>
    where
        E: Default,
    {
        let mut s = Self::new();
        for k in iter {
            s.insert(k)?;
        }
        Ok(s)
    }

    /// Position of key `q`.
    pub fn find<Q: ?Sized>(&self, q: &Q) -> Option<usize>
    where
        E: KeyEq<K, Q>,
    {
        self.data.iter().position(|k| self.eq.equal(k, q))
    }

    /// Is `q` present?
    pub fn contains<Q: ?Sized>(&self, q: &Q) -> bool
    where
        E: KeyEq<K, Q>,
    {
        self.find(q).is_some()
    }

    /// Number of keys equal to `q` (0 or 1).
    pub fn count<Q: ?Sized>(&self, q: &Q) -> usize
    where
        E: KeyEq<K, Q>,
    {
        usize::from(self.contains(q))
    }

    /// Insert `key` at the end unless present. Returns its position and whether it was inserted.
    pub fn insert(&mut self, key: K) -> Result<(usize, bool), InsertError<K>> {
        if let Some(i) = self.find(&key) {
            return Ok((i, false));
        }
        self.data.try_push(key)?;
        Ok((self.data.len() - 1, true))
    }

    /// Insert the key equivalent to `q` unless present. `f` builds the stored key and runs
    /// only on a miss with room to store it.
    pub fn insert_with<Q: ?Sized, F: FnOnce() -> K>(&mut self, q: &Q, f: F) -> Result<(usize, bool)>
    where
        E: KeyEq<K, Q>,
    {
        if let Some(i) = self.find(q) {
            return Ok((i, false));
        }
        if self.is_full() {
            return fail(Error::CapacityExceeded { capacity: N });
        }
        self.data.push(f());
        Ok((self.data.len() - 1, true))
    }

    /// Build a key with `f` and insert it. Capacity is checked before `f` runs. A duplicate
    /// is built, found present, and dropped.
    pub fn emplace_with<F: FnOnce() -> K>(&mut self, f: F) -> Result<(usize, bool)> {
        if self.is_full() {
            return fail(Error::CapacityExceeded { capacity: N });
        }
        self.data.push(f());
        let last = self.data.len() - 1;
        match self.find(&self.data[last]) {
            Some(i) if i != last => {
                self.data.pop();
                Ok((i, false))
            }
            _ => Ok((last, true)),
        }
    }

    /// Remove key `q`, returning how many were removed (0 or 1).
    pub fn erase_key<Q: ?Sized>(&mut self, q: &Q) -> usize
    where
        E: KeyEq<K, Q>,
    {
        match self.find(q) {
            Some(i) => {
                drop(self.erase_at(i));
                1
            }
            None => 0,
        }
    }
}

/// Remove the key equal to `value`, returning how many were removed.
pub fn erase<K: PartialEq, const N: usize, E>(s: &mut StaticUnorderedFlatSet<K, N, E>, value: &K) -> usize {
    erase_if(s, |k| k == value)
}

/// Remove every key for which `pred` returns true, returning how many were removed.
pub fn erase_if<K, F, const N: usize, E>(s: &mut StaticUnorderedFlatSet<K, N, E>, mut pred: F) -> usize
where
    F: FnMut(&K) -> bool,
{
    let old = s.len();
    s.retain(|k| !pred(k));
    old - s.len()
}

impl<K: Clone, const N: usize, E: Clone> Clone for StaticUnorderedFlatSet<K, N, E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            eq: self.eq.clone(),
        }
    }
}

impl<K: fmt::Debug, const N: usize, E> fmt::Debug for StaticUnorderedFlatSet<K, N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Same keys in any order.
impl<K, const N: usize, E: KeyEq<K>> PartialEq for StaticUnorderedFlatSet<K, N, E> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|k| other.contains(k))
    }
}
impl<K, const N: usize, E: KeyEq<K>> Eq for StaticUnorderedFlatSet<K, N, E> {}

/// Only for [`EqualTo`], where equal keys hash equally. A custom `KeyEq` may treat keys
/// with different hashes as the same.
impl<K: Hash + Eq, const N: usize> Hash for StaticUnorderedFlatSet<K, N, EqualTo> {
    /// Order-independent: combines per-key hashes with a commutative sum.
    fn hash<H: Hasher>(&self, state: &mut H) {
        use std::collections::hash_map::DefaultHasher;
        let mut sum: u64 = 0;
        for k in self.iter() {
            let mut h = DefaultHasher::new();
            k.hash(&mut h);
            sum = sum.wrapping_add(h.finish());
        }
        state.write_usize(self.len());
        state.write_u64(sum);
    }
}

impl<K, const N: usize, E: KeyEq<K> + Default> FromIterator<K> for StaticUnorderedFlatSet<K, N, E> {
    /// # Panics
    ///
    /// Panics if more than `N` distinct keys are given.
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        match Self::try_from_iter(iter) {
            Ok(s) => s,
            Err(e) => panic!("StaticUnorderedFlatSet::from_iter: {e}"),
        }
    }
}

impl<K, const N: usize, E: KeyEq<K> + Default, const M: usize> From<[K; M]> for StaticUnorderedFlatSet<K, N, E> {
    fn from(arr: [K; M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<K, const N: usize, E: KeyEq<K>> Extend<K> for StaticUnorderedFlatSet<K, N, E> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            if let Err(e) = self.insert(k) {
                panic!("StaticUnorderedFlatSet::extend: {}", e.error());
            }
        }
    }
}

impl<'a, K, const N: usize, E> IntoIterator for &'a StaticUnorderedFlatSet<K, N, E> {
    type Item = &'a K;
    type IntoIter = slice::Iter<'a, K>;
    fn into_iter(self) -> slice::Iter<'a, K> {
        self.iter()
    }
}

impl<K, const N: usize, E> IntoIterator for StaticUnorderedFlatSet<K, N, E> {
    type Item = K;
    type IntoIter = crate::vecs::IntoIter<K, N>;
    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

//! Sorted multimap in a fixed inline buffer.

use crate::compare::{Compare, Less};
use crate::error::{fail, Error, InsertError, Result};
use crate::vecs::FixedVec;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::{Range, RangeBounds},
    slice,
};

/// Multimap of at most `N` entries kept sorted by key in a [`FixedVec`]. Entries with
/// equal keys keep insertion order. Lookup is binary search, insertion and removal shift.
pub struct StaticFlatMultimap<K, V, const N: usize, C = Less> {
    data: FixedVec<(K, V), N>,
    comp: C,
}

impl<K, V, const N: usize, C: Default> Default for StaticFlatMultimap<K, V, N, C> {
    fn default() -> Self {
        Self::with_compare(C::default())
    }
}

impl<K, V, const N: usize, C: Default> StaticFlatMultimap<K, V, N, C> {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, const N: usize, C> StaticFlatMultimap<K, V, N, C> {
    /// This should produce a compile-time error if N is zero.
    const CHECK_N: usize = {
        assert!(N > 0);
        N
    };

    /// Empty map ordered by `comp`.
    pub fn with_compare(comp: C) -> Self {
        let _ = Self::CHECK_N;
        Self {
            data: FixedVec::new(),
            comp,
        }
    }

    /// The comparator.
    pub fn comparator(&self) -> &C {
        &self.comp
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Is the map empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Is the map at capacity?
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

    /// Number of entries that can still be added.
    pub fn available(&self) -> usize {
        self.data.available()
    }

    /// Entries in key order.
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.data
    }

    /// Entry at position `i`.
    #[must_use]
    pub fn nth(&self, i: usize) -> Option<(&K, &V)> {
        self.data.get(i).map(|(k, v)| (k, v))
    }

    /// Position of an entry given a reference into this map.
    pub fn index_of(&self, entry: &(K, V)) -> Option<usize> {
        self.data.index_of(entry)
    }

    /// Mutable value at position `i`.
    pub fn value_at_mut(&mut self, i: usize) -> Option<&mut V> {
        self.data.get_mut(i).map(|(_, v)| v)
    }

    /// Iterator over entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter(self.data.iter())
    }

    /// Iterator over entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut(self.data.iter_mut())
    }

    /// Iterator over keys.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.data.iter().map(|(k, _)| k)
    }

    /// Iterator over values.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.data.iter().map(|(_, v)| v)
    }

    /// Remove and return the entry at position `i`.
    /// # Panics
    ///
    /// Panics if `i >= len`.
    pub fn erase_at(&mut self, i: usize) -> (K, V) {
        self.data.remove(i)
    }

    /// Remove the entries at positions in `range`.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        self.data.erase(range);
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Keep only the entries for which `f` returns true.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut f: F) {
        self.data.retain(|(k, v)| f(k, v));
    }

    /// Insert at exactly position `pos`. The caller keeps the order.
    fn insert_exactly_at(&mut self, pos: usize, value: (K, V)) -> Result<usize, InsertError<(K, V)>> {
        self.data.try_insert(pos, value)?;
        Ok(pos)
    }
}

impl<K, V, const N: usize, C: Compare<K>> StaticFlatMultimap<K, V, N, C> {
    /// Construct from an iterator, failing if it yields more than `N` entries.
    pub fn try_from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Result<Self>
    where
        C: Default,
    {
        let mut m = Self::new();
        for (k, v) in iter {
            m.insert(k, v)?;
        }
        Ok(m)
    }

    /// Position of the first entry whose key is not less than `q`.
    pub fn lower_bound<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.data.partition_point(|(k, _)| self.comp.less(k, q))
    }

    /// Position of the first entry whose key is greater than `q`.
    pub fn upper_bound<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.data
            .partition_point(|(k, _)| self.comp.compare(k, q) != Ordering::Greater)
    }

    /// Positions of the entries with key equal to `q`.
    pub fn equal_range<Q: ?Sized>(&self, q: &Q) -> Range<usize>
    where
        C: Compare<K, Q>,
    {
        self.lower_bound(q)..self.upper_bound(q)
    }

    /// Position of the first entry with key `q`.
    pub fn find<Q: ?Sized>(&self, q: &Q) -> Option<usize>
    where
        C: Compare<K, Q>,
    {
        let i = self.lower_bound(q);
        match self.data.get(i) {
            Some((k, _)) if self.comp.compare(k, q) == Ordering::Equal => Some(i),
            _ => None,
        }
    }

    /// Number of entries with key `q`.
    pub fn count<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.equal_range(q).len()
    }

    /// Is key `q` present?
    pub fn contains<Q: ?Sized>(&self, q: &Q) -> bool
    where
        C: Compare<K, Q>,
    {
        self.find(q).is_some()
    }

    /// Value of the first entry with key `q`.
    pub fn get<Q: ?Sized>(&self, q: &Q) -> Option<&V>
    where
        C: Compare<K, Q>,
    {
        self.find(q).map(|i| &self.data[i].1)
    }

    /// Mutable value of the first entry with key `q`.
    pub fn get_mut<Q: ?Sized>(&mut self, q: &Q) -> Option<&mut V>
    where
        C: Compare<K, Q>,
    {
        let i = self.find(q)?;
        Some(&mut self.data[i].1)
    }

    /// Insert after the entries with an equal key, returning the position.
    pub fn insert(&mut self, key: K, value: V) -> Result<usize, InsertError<(K, V)>> {
        if self.is_full() {
            return Err(InsertError::new(Error::CapacityExceeded { capacity: N }, (key, value)));
        }
        let pos = self.upper_bound(&key);
        self.insert_exactly_at(pos, (key, value))
    }

    /// Insert at `hint` if that keeps the order, otherwise after the entries with an
    /// equal key. Returns the position.
    pub fn insert_hint(&mut self, hint: usize, key: K, value: V) -> Result<usize, InsertError<(K, V)>> {
        assert!(hint <= self.len(), "hint {hint} out of range for length {}", self.len());
        if self.is_full() {
            return Err(InsertError::new(Error::CapacityExceeded { capacity: N }, (key, value)));
        }
        let pos = if self.is_insert_hint_good(hint, &key) {
            hint
        } else {
            self.upper_bound(&key)
        };
        self.insert_exactly_at(pos, (key, value))
    }

    /// Build the entry with `f` and insert it. Capacity is checked before `f` runs.
    pub fn emplace_with<F: FnOnce() -> (K, V)>(&mut self, f: F) -> Result<usize> {
        if self.is_full() {
            return fail(Error::CapacityExceeded { capacity: N });
        }
        let (k, v) = f();
        Ok(self.insert(k, v)?)
    }

    fn equivalent(&self, a: &K, b: &K) -> bool {
        !self.comp.less(a, b) && !self.comp.less(b, a)
    }

    /// True if `hint` equals `key`, or `hint - 1` equals `key`, or
    /// `hint - 1 < key < hint` (missing neighbours count as satisfied).
    fn is_insert_hint_good(&self, hint: usize, key: &K) -> bool {
        let len = self.data.len();
        let at = |i: usize| &self.data[i].0;
        (hint != len && self.equivalent(at(hint), key))
            || (hint != 0 && self.equivalent(at(hint - 1), key))
            || ((hint == 0 || self.comp.less(at(hint - 1), key)) && (hint == len || self.comp.less(key, at(hint))))
    }

    /// Remove every entry with key `q`, returning how many were removed.
    pub fn erase_key<Q: ?Sized>(&mut self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        let r = self.equal_range(q);
        let n = r.len();
        self.data.erase(r);
        n
    }
}

/// Remove every entry for which `pred` returns true, returning how many were removed.
pub fn erase_if<K, V, F, const N: usize, C>(m: &mut StaticFlatMultimap<K, V, N, C>, mut pred: F) -> usize
where
    F: FnMut(&K, &V) -> bool,
{
    let old = m.len();
    m.retain(|k, v| !pred(k, v));
    old - m.len()
}

/// Remove the entries equal to `entry`, returning how many were removed.
pub fn erase<K: PartialEq, V: PartialEq, const N: usize, C>(m: &mut StaticFlatMultimap<K, V, N, C>, entry: &(K, V)) -> usize {
    erase_if(m, |k, v| *k == entry.0 && *v == entry.1)
}

impl<K: Clone, V: Clone, const N: usize, C: Clone> Clone for StaticFlatMultimap<K, V, N, C> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            comp: self.comp.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, C> fmt::Debug for StaticFlatMultimap<K, V, N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, const N: usize, C> PartialEq for StaticFlatMultimap<K, V, N, C> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
impl<K: Eq, V: Eq, const N: usize, C> Eq for StaticFlatMultimap<K, V, N, C> {}

impl<K: PartialOrd, V: PartialOrd, const N: usize, C> PartialOrd for StaticFlatMultimap<K, V, N, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.data.partial_cmp(&other.data)
    }
}
impl<K: Ord, V: Ord, const N: usize, C> Ord for StaticFlatMultimap<K, V, N, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.cmp(&other.data)
    }
}

impl<K: Hash, V: Hash, const N: usize, C> Hash for StaticFlatMultimap<K, V, N, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl<K, V, const N: usize, C: Compare<K> + Default> FromIterator<(K, V)> for StaticFlatMultimap<K, V, N, C> {
    /// # Panics
    ///
    /// Panics if the iterator yields more than `N` entries.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        match Self::try_from_iter(iter) {
            Ok(m) => m,
            Err(e) => panic!("StaticFlatMultimap::from_iter: {e}"),
        }
    }
}

impl<K, V, const N: usize, C: Compare<K> + Default, const M: usize> From<[(K, V); M]> for StaticFlatMultimap<K, V, N, C> {
    /// # Panics
    ///
    /// Panics if `M > N`.
    fn from(arr: [(K, V); M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<K, V, const N: usize, C: Compare<K>> Extend<(K, V)> for StaticFlatMultimap<K, V, N, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(e) = self.insert(k, v) {
                panic!("StaticFlatMultimap::extend: {}", e.error());
            }
        }
    }
}

impl<'a, K, V, const N: usize, C> IntoIterator for &'a StaticFlatMultimap<K, V, N, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V, const N: usize, C> IntoIterator for StaticFlatMultimap<K, V, N, C> {
    type Item = (K, V);
    type IntoIter = crate::vecs::IntoIter<(K, V), N>;
    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Iterator over flat map entries.
#[derive(Clone, Debug)]
pub struct Iter<'a, K, V>(slice::Iter<'a, (K, V)>);

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next().map(|(k, v)| (k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
    fn nth(&mut self, n: usize) -> Option<(&'a K, &'a V)> {
        self.0.nth(n).map(|(k, v)| (k, v))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over flat map entries with mutable values.
#[derive(Debug)]
pub struct IterMut<'a, K, V>(slice::IterMut<'a, (K, V)>);

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.0.next().map(|(k, v)| (&*k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.0.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

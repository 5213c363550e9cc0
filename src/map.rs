//! Ordered maps and sets on the red-black tree.
//!
//! `MULTI` selects duplicate handling: `false` keeps keys unique (an insert of a present key
//! is refused), `true` allows duplicates, a new element going after those with an equal key.
//! The node store `A` selects the memory: [`HeapNodes`] grows on the heap, [`PoolNodes`] is a
//! fixed inline pool.
//!
//! # Example
//!
//! ```
//!     use segmented_collections::{MultiMap, StaticSet};
//!     let mut m = MultiMap::new();
//!     for (i, k) in [5, 3, 5, 1, 5].into_iter().enumerate() {
//!         m.insert(k, i).unwrap();
//!     }
//!     let keys: Vec<_> = m.keys().copied().collect();
//!     assert_eq!(keys, [1, 3, 5, 5, 5]);
//!
//!     let mut s: StaticSet<u32, 2> = StaticSet::new();
//!     s.insert(1).unwrap();
//!     s.insert(2).unwrap();
//!     assert!(s.insert(3).is_err());
//! ```

use crate::compare::{Compare, First, Identity, Less};
use crate::error::{fail, Error, InsertError, Result};
use crate::nodes::{Handle, HeapNodes, NodeAlloc, PoolNodes};
use crate::tree::{self, RbTree};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    ops::Index,
};

/// Ordered map. See the module docs for `MULTI` and `A`.
pub struct TreeMap<K, V, const MULTI: bool, C = Less, A: NodeAlloc<(K, V)> = HeapNodes<(K, V)>> {
    tree: RbTree<(K, V), First, C, A>,
}

/// Map with unique keys, nodes on the heap.
pub type Map<K, V> = TreeMap<K, V, false>;
/// Map allowing equal keys, nodes on the heap.
pub type MultiMap<K, V> = TreeMap<K, V, true>;
/// Map with unique keys and room for `N` entries in place.
pub type StaticMap<K, V, const N: usize> = TreeMap<K, V, false, Less, PoolNodes<(K, V), N>>;
/// Map allowing equal keys with room for `N` entries in place.
pub type StaticMultimap<K, V, const N: usize> = TreeMap<K, V, true, Less, PoolNodes<(K, V), N>>;

impl<K, V, const MULTI: bool, C, A> TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<(K, V)> + Default,
{
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(C::default(), A::default())
    }
}

impl<K, V, const MULTI: bool, C, A> Default for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<(K, V)> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const MULTI: bool, C, A> TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    /// Empty map with comparator `comp` and node store `nodes`.
    pub fn new_in(comp: C, nodes: A) -> Self {
        Self {
            tree: RbTree::new_in(comp, nodes),
        }
    }

    /// Empty map ordered by `comp`.
    pub fn with_compare(comp: C) -> Self
    where
        A: Default,
    {
        Self::new_in(comp, A::default())
    }

    /// Construct from an iterator, failing if the node store runs out.
    pub fn try_from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Result<Self, InsertError<(K, V)>>
    where
        C: Default,
        A: Default,
    {
        let mut m = Self::new();
        for (k, v) in iter {
            m.insert(k, v)?;
        }
        Ok(m)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Is the map empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Largest number of entries the node store can hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// The comparator.
    pub fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Insert `(key, value)`, returning its handle and whether it was inserted. A unique map
    /// that already holds `key` keeps the existing entry and drops the arguments.
    pub fn insert(&mut self, key: K, value: V) -> Result<(Handle, bool), InsertError<(K, V)>> {
        if MULTI {
            Ok((self.tree.insert_equal((key, value))?, true))
        } else {
            let (h, rejected) = self.tree.insert_unique((key, value))?;
            Ok((h, rejected.is_none()))
        }
    }

    /// Insert `(key, value)` as close as possible before `hint` (`None` = end).
    pub fn insert_hint(
        &mut self,
        hint: Option<Handle>,
        key: K,
        value: V,
    ) -> Result<(Handle, bool), InsertError<(K, V)>> {
        if MULTI {
            Ok((self.tree.insert_hint_equal(hint, (key, value))?, true))
        } else {
            let (h, rejected) = self.tree.insert_hint_unique(hint, (key, value))?;
            Ok((h, rejected.is_none()))
        }
    }

    /// Insert the entry built by `f`. Room in the node store is checked before `f` runs.
    pub fn emplace_with<F: FnOnce() -> (K, V)>(&mut self, f: F) -> Result<(Handle, bool)> {
        if self.len() >= self.max_size() {
            return fail(Error::CapacityExceeded {
                capacity: self.max_size(),
            });
        }
        let (key, value) = f();
        Ok(self.insert(key, value)?)
    }

    /// Insert, or overwrite the value if `key` is present (in a multimap, always inserts).
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Result<Handle, InsertError<(K, V)>> {
        if MULTI {
            return self.tree.insert_equal((key, value));
        }
        let (h, rejected) = self.tree.insert_unique((key, value))?;
        if let Some((_, v)) = rejected {
            self.tree.get_mut(h).1 = v;
        }
        Ok(h)
    }

    /// Value for `key`, inserting the one built by `f` if absent (in a multimap, the first
    /// equal entry is used).
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> Result<&mut V, InsertError<(K, V)>> {
        let h = match self.tree.find(&key) {
            Some(h) => h,
            None => self.tree.insert_equal((key, f()))?,
        };
        Ok(&mut self.tree.get_mut(h).1)
    }

    /// Handle of an entry with key `q` (the first such).
    pub fn find<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.find(q)
    }

    /// Value for key `q`.
    pub fn get<Q: ?Sized>(&self, q: &Q) -> Option<&V>
    where
        C: Compare<K, Q>,
    {
        self.tree.find(q).map(|h| &self.tree.get(h).1)
    }

    /// Mutable value for key `q`.
    pub fn get_mut<Q: ?Sized>(&mut self, q: &Q) -> Option<&mut V>
    where
        C: Compare<K, Q>,
    {
        let h = self.tree.find(q)?;
        Some(&mut self.tree.get_mut(h).1)
    }

    /// Is key `q` present?
    pub fn contains_key<Q: ?Sized>(&self, q: &Q) -> bool
    where
        C: Compare<K, Q>,
    {
        self.tree.find(q).is_some()
    }

    /// First entry whose key is not less than `q`.
    pub fn lower_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.lower_bound(q)
    }

    /// First entry whose key is greater than `q`.
    pub fn upper_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.upper_bound(q)
    }

    /// Entries with key equal to `q`.
    pub fn equal_range<Q: ?Sized>(&self, q: &Q) -> Iter<'_, K, V, A>
    where
        C: Compare<K, Q>,
    {
        Iter(self.tree.equal_range(q))
    }

    /// Number of entries with key equal to `q`.
    pub fn count<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.tree.count(q)
    }

    /// Entries from `from` up to but excluding `to` (`None` = end).
    pub fn range(&self, from: Option<Handle>, to: Option<Handle>) -> Iter<'_, K, V, A> {
        Iter(self.tree.range(from, to))
    }

    /// Key and value at `h`.
    pub fn entry_at(&self, h: Handle) -> (&K, &V) {
        let (k, v) = self.tree.get(h);
        (k, v)
    }

    /// Mutable value at `h`.
    pub fn value_at_mut(&mut self, h: Handle) -> &mut V {
        &mut self.tree.get_mut(h).1
    }

    /// Handle of the first entry.
    pub fn first(&self) -> Option<Handle> {
        self.tree.first()
    }

    /// Handle of the last entry.
    pub fn last(&self) -> Option<Handle> {
        self.tree.last()
    }

    /// Handle of the entry after `h`.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.tree.next(h)
    }

    /// Handle of the entry before `h`.
    pub fn prev(&self, h: Handle) -> Option<Handle> {
        self.tree.prev(h)
    }

    /// Position of `h` in iteration order.
    pub fn index_of(&self, h: Handle) -> usize {
        self.tree.index_of(h)
    }

    /// Handle of the `i`th entry.
    pub fn nth(&self, i: usize) -> Option<Handle> {
        self.tree.nth(i)
    }

    /// Remove the entry at `h`.
    pub fn erase(&mut self, h: Handle) -> (K, V) {
        self.tree.erase(h)
    }

    /// Remove the entries from `from` up to but excluding `to`, returning `to`.
    pub fn erase_range(&mut self, from: Option<Handle>, to: Option<Handle>) -> Option<Handle> {
        self.tree.erase_range(from, to)
    }

    /// Remove every entry with key `q`, returning how many were removed.
    pub fn erase_key<Q: ?Sized>(&mut self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.tree.erase_key(q)
    }

    /// Remove the (first) entry with key `q` and return its value.
    pub fn remove<Q: ?Sized>(&mut self, q: &Q) -> Option<V>
    where
        C: Compare<K, Q>,
    {
        let h = self.tree.find(q)?;
        Some(self.tree.erase(h).1)
    }

    /// Remove and return the first entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    /// Remove and return the last entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Keep only the entries for which `f` returns true.
    pub fn retain<F: FnMut(&K, &V) -> bool>(&mut self, mut f: F) {
        self.tree.retain(|(k, v)| f(k, v));
    }

    /// Iterator over entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter(self.tree.iter())
    }

    /// Iterator over entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V, A> {
        IterMut(self.tree.iter_mut())
    }

    /// Iterator over keys.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterator over values.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Iterator over mutable values.
    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    #[cfg(test)]
    pub(crate) fn check(&self) {
        self.tree.check();
    }
}

/// Remove every entry for which `pred` returns true, returning how many were removed.
pub fn erase_if<K, V, F, const MULTI: bool, C, A>(m: &mut TreeMap<K, V, MULTI, C, A>, mut pred: F) -> usize
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
    F: FnMut(&K, &V) -> bool,
{
    m.tree.retain(|(k, v)| !pred(k, v))
}

impl<K, V, Q: ?Sized, const MULTI: bool, C, A> Index<&Q> for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Compare<K, Q>,
    A: NodeAlloc<(K, V)>,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, q: &Q) -> &V {
        match self.get(q) {
            Some(v) => v,
            None => panic!("key not found"),
        }
    }
}

impl<K: Clone, V: Clone, const MULTI: bool, C, A> Clone for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Clone,
    A: NodeAlloc<(K, V)> + Default,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const MULTI: bool, C, A> fmt::Debug for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, const MULTI: bool, C, A> PartialEq for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
impl<K: Eq, V: Eq, const MULTI: bool, C, A> Eq for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
}

impl<K: PartialOrd, V: PartialOrd, const MULTI: bool, C, A> PartialOrd for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}
impl<K: Ord, V: Ord, const MULTI: bool, C, A> Ord for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: Hash, V: Hash, const MULTI: bool, C, A> Hash for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for kv in self.iter() {
            kv.hash(state);
        }
    }
}

impl<K, V, const MULTI: bool, C, A> FromIterator<(K, V)> for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<(K, V)> + Default,
{
    /// # Panics
    ///
    /// Panics if the node store runs out.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}

impl<K, V, const MULTI: bool, C, A> Extend<(K, V)> for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(e) = self.insert(k, v) {
                panic!("TreeMap::extend: {}", e.error());
            }
        }
    }
}

impl<K, V, const MULTI: bool, C, A, const M: usize> From<[(K, V); M]> for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<(K, V)> + Default,
{
    fn from(arr: [(K, V); M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V, const MULTI: bool, C, A> IntoIterator for &'a TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;
    fn into_iter(self) -> Iter<'a, K, V, A> {
        self.iter()
    }
}

impl<'a, K, V, const MULTI: bool, C, A> IntoIterator for &'a mut TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V, A>;
    fn into_iter(self) -> IterMut<'a, K, V, A> {
        self.iter_mut()
    }
}

impl<K, V, const MULTI: bool, C, A> IntoIterator for TreeMap<K, V, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<(K, V)>,
{
    type Item = (K, V);
    type IntoIter = tree::IntoIter<(K, V), First, C, A>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

/// Iterator over map entries.
pub struct Iter<'a, K, V, A: NodeAlloc<(K, V)>>(tree::Iter<'a, (K, V), A>);

impl<K, V, A: NodeAlloc<(K, V)>> Clone for Iter<'_, K, V, A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'a, K, V, A: NodeAlloc<(K, V)>> Iterator for Iter<'a, K, V, A> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next().map(|(k, v)| (k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, A: NodeAlloc<(K, V)>> DoubleEndedIterator for Iter<'a, K, V, A> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.0.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V, A: NodeAlloc<(K, V)>> ExactSizeIterator for Iter<'_, K, V, A> {}
impl<K, V, A: NodeAlloc<(K, V)>> FusedIterator for Iter<'_, K, V, A> {}

/// Iterator over map entries with mutable values.
pub struct IterMut<'a, K, V, A: NodeAlloc<(K, V)>>(tree::IterMut<'a, (K, V), A>);

impl<'a, K, V, A: NodeAlloc<(K, V)>> Iterator for IterMut<'a, K, V, A> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.0.next().map(|(k, v)| (&*k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, K, V, A: NodeAlloc<(K, V)>> DoubleEndedIterator for IterMut<'a, K, V, A> {
    fn next_back(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.0.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V, A: NodeAlloc<(K, V)>> ExactSizeIterator for IterMut<'_, K, V, A> {}

/// Ordered set. See the module docs for `MULTI` and `A`.
pub struct TreeSet<K, const MULTI: bool, C = Less, A: NodeAlloc<K> = HeapNodes<K>> {
    tree: RbTree<K, Identity, C, A>,
}

/// Set with unique keys, nodes on the heap.
pub type Set<K> = TreeSet<K, false>;
/// Set allowing equal keys, nodes on the heap.
pub type MultiSet<K> = TreeSet<K, true>;
/// Set with unique keys and room for `N` keys in place.
pub type StaticSet<K, const N: usize> = TreeSet<K, false, Less, PoolNodes<K, N>>;
/// Set allowing equal keys with room for `N` keys in place.
pub type StaticMultiset<K, const N: usize> = TreeSet<K, true, Less, PoolNodes<K, N>>;

impl<K, const MULTI: bool, C, A> TreeSet<K, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<K> + Default,
{
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(C::default(), A::default())
    }
}

impl<K, const MULTI: bool, C, A> Default for TreeSet<K, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<K> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, const MULTI: bool, C, A> TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    /// Empty set with comparator `comp` and node store `nodes`.
    pub fn new_in(comp: C, nodes: A) -> Self {
        Self {
            tree: RbTree::new_in(comp, nodes),
        }
    }

    /// Empty set ordered by `comp`.
    pub fn with_compare(comp: C) -> Self
    where
        A: Default,
    {
        Self::new_in(comp, A::default())
    }

    /// Construct from an iterator, failing if the node store runs out.
    pub fn try_from_iter<I: IntoIterator<Item = K>>(iter: I) -> Result<Self, InsertError<K>>
    where
        C: Default,
        A: Default,
    {
        let mut s = Self::new();
        for k in iter {
            s.insert(k)?;
        }
        Ok(s)
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Is the set empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Largest number of keys the node store can hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Remove all keys.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Insert `key`, returning its handle and whether it was inserted.
    pub fn insert(&mut self, key: K) -> Result<(Handle, bool), InsertError<K>> {
        if MULTI {
            Ok((self.tree.insert_equal(key)?, true))
        } else {
            let (h, rejected) = self.tree.insert_unique(key)?;
            Ok((h, rejected.is_none()))
        }
    }

    /// Insert the key built by `f`. Room in the node store is checked before `f` runs.
    pub fn emplace_with<F: FnOnce() -> K>(&mut self, f: F) -> Result<(Handle, bool)> {
        if self.len() >= self.max_size() {
            return fail(Error::CapacityExceeded {
                capacity: self.max_size(),
            });
        }
        Ok(self.insert(f())?)
    }

    /// Insert `key` as close as possible before `hint` (`None` = end).
    pub fn insert_hint(&mut self, hint: Option<Handle>, key: K) -> Result<(Handle, bool), InsertError<K>> {
        if MULTI {
            Ok((self.tree.insert_hint_equal(hint, key)?, true))
        } else {
            let (h, rejected) = self.tree.insert_hint_unique(hint, key)?;
            Ok((h, rejected.is_none()))
        }
    }

    /// Handle of key `q` (the first such).
    pub fn find<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.find(q)
    }

    /// Is `q` present?
    pub fn contains<Q: ?Sized>(&self, q: &Q) -> bool
    where
        C: Compare<K, Q>,
    {
        self.tree.find(q).is_some()
    }

    /// First key not less than `q`.
    pub fn lower_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.lower_bound(q)
    }

    /// First key greater than `q`.
    pub fn upper_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<K, Q>,
    {
        self.tree.upper_bound(q)
    }

    /// Keys equal to `q`.
    pub fn equal_range<Q: ?Sized>(&self, q: &Q) -> tree::Iter<'_, K, A>
    where
        C: Compare<K, Q>,
    {
        self.tree.equal_range(q)
    }

    /// Number of keys equal to `q`.
    pub fn count<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.tree.count(q)
    }

    /// Keys from `from` up to but excluding `to` (`None` = end).
    pub fn range(&self, from: Option<Handle>, to: Option<Handle>) -> tree::Iter<'_, K, A> {
        self.tree.range(from, to)
    }

    /// Key at `h`.
    pub fn get(&self, h: Handle) -> &K {
        self.tree.get(h)
    }

    /// Handle of the first key.
    pub fn first(&self) -> Option<Handle> {
        self.tree.first()
    }

    /// Handle of the last key.
    pub fn last(&self) -> Option<Handle> {
        self.tree.last()
    }

    /// Handle of the key after `h`.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.tree.next(h)
    }

    /// Handle of the key before `h`.
    pub fn prev(&self, h: Handle) -> Option<Handle> {
        self.tree.prev(h)
    }

    /// Position of `h` in iteration order.
    pub fn index_of(&self, h: Handle) -> usize {
        self.tree.index_of(h)
    }

    /// Handle of the `i`th key.
    pub fn nth(&self, i: usize) -> Option<Handle> {
        self.tree.nth(i)
    }

    /// Remove the key at `h`.
    pub fn erase(&mut self, h: Handle) -> K {
        self.tree.erase(h)
    }

    /// Remove the keys from `from` up to but excluding `to`, returning `to`.
    pub fn erase_range(&mut self, from: Option<Handle>, to: Option<Handle>) -> Option<Handle> {
        self.tree.erase_range(from, to)
    }

    /// Remove every key equal to `q`, returning how many were removed.
    pub fn erase_key<Q: ?Sized>(&mut self, q: &Q) -> usize
    where
        C: Compare<K, Q>,
    {
        self.tree.erase_key(q)
    }

    /// Remove one key equal to `q`, returning whether one was present.
    pub fn remove<Q: ?Sized>(&mut self, q: &Q) -> bool
    where
        C: Compare<K, Q>,
    {
        match self.tree.find(q) {
            Some(h) => {
                self.tree.erase(h);
                true
            }
            None => false,
        }
    }

    /// Remove and return the first key.
    pub fn pop_first(&mut self) -> Option<K> {
        self.tree.pop_first()
    }

    /// Remove and return the last key.
    pub fn pop_last(&mut self) -> Option<K> {
        self.tree.pop_last()
    }

    /// Keep only the keys for which `f` returns true.
    pub fn retain<F: FnMut(&K) -> bool>(&mut self, f: F) {
        self.tree.retain(f);
    }

    /// Iterator over keys in order.
    pub fn iter(&self) -> tree::Iter<'_, K, A> {
        self.tree.iter()
    }

    #[cfg(test)]
    pub(crate) fn check(&self) {
        self.tree.check();
    }
}

/// Remove every key for which `pred` returns true, returning how many were removed.
pub fn erase_set_if<K, F, const MULTI: bool, C, A>(s: &mut TreeSet<K, MULTI, C, A>, mut pred: F) -> usize
where
    C: Compare<K>,
    A: NodeAlloc<K>,
    F: FnMut(&K) -> bool,
{
    s.tree.retain(|k| !pred(k))
}

impl<K: Clone, const MULTI: bool, C, A> Clone for TreeSet<K, MULTI, C, A>
where
    C: Compare<K> + Clone,
    A: NodeAlloc<K> + Default,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, const MULTI: bool, C, A> fmt::Debug for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, const MULTI: bool, C, A> PartialEq for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}
impl<K: Eq, const MULTI: bool, C, A> Eq for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
}

impl<K: PartialOrd, const MULTI: bool, C, A> PartialOrd for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}
impl<K: Ord, const MULTI: bool, C, A> Ord for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: Hash, const MULTI: bool, C, A> Hash for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for k in self.iter() {
            k.hash(state);
        }
    }
}

impl<K, const MULTI: bool, C, A> FromIterator<K> for TreeSet<K, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<K> + Default,
{
    /// # Panics
    ///
    /// Panics if the node store runs out.
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

impl<K, const MULTI: bool, C, A> Extend<K> for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            if let Err(e) = self.insert(k) {
                panic!("TreeSet::extend: {}", e.error());
            }
        }
    }
}

impl<K, const MULTI: bool, C, A, const M: usize> From<[K; M]> for TreeSet<K, MULTI, C, A>
where
    C: Compare<K> + Default,
    A: NodeAlloc<K> + Default,
{
    fn from(arr: [K; M]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, const MULTI: bool, C, A> IntoIterator for &'a TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    type Item = &'a K;
    type IntoIter = tree::Iter<'a, K, A>;
    fn into_iter(self) -> tree::Iter<'a, K, A> {
        self.iter()
    }
}

impl<K, const MULTI: bool, C, A> IntoIterator for TreeSet<K, MULTI, C, A>
where
    C: Compare<K>,
    A: NodeAlloc<K>,
{
    type Item = K;
    type IntoIter = tree::IntoIter<K, Identity, C, A>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

//! Comparator objects.
//!
//! A comparator is stored by value inside the container. The ones provided here are
//! zero-sized. Lookup functions are generic over any `Q` the comparator can order
//! against the stored key, which is how heterogeneous lookup works (for example
//! looking up a `String` key with a `&str`).

use std::{borrow::Borrow, cmp::Ordering};

/// Orders `L` against `R`.
pub trait Compare<L: ?Sized, R: ?Sized = L> {
    /// Three-way comparison of `l` against `r`.
    fn compare(&self, l: &L, r: &R) -> Ordering;

    /// Is `l` strictly before `r`?
    #[inline]
    fn less(&self, l: &L, r: &R) -> bool {
        self.compare(l, r) == Ordering::Less
    }
}

/// Ascending natural order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Less;

impl<K, Q> Compare<K, Q> for Less
where
    K: Borrow<Q> + ?Sized,
    Q: Ord + ?Sized,
{
    #[inline]
    fn compare(&self, l: &K, r: &Q) -> Ordering {
        l.borrow().cmp(r)
    }
}

/// Descending natural order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Greater;

impl<K, Q> Compare<K, Q> for Greater
where
    K: Borrow<Q> + ?Sized,
    Q: Ord + ?Sized,
{
    #[inline]
    fn compare(&self, l: &K, r: &Q) -> Ordering {
        r.cmp(l.borrow())
    }
}

/// Equivalence test used by unordered containers.
pub trait KeyEq<L: ?Sized, R: ?Sized = L> {
    /// Are `l` and `r` the same key?
    fn equal(&self, l: &L, r: &R) -> bool;
}

/// Equivalence by `Eq`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EqualTo;

impl<K, Q> KeyEq<K, Q> for EqualTo
where
    K: Borrow<Q> + ?Sized,
    Q: Eq + ?Sized,
{
    #[inline]
    fn equal(&self, l: &K, r: &Q) -> bool {
        l.borrow() == r
    }
}

/// Extracts the ordering key from a stored value.
pub trait KeyOf<T> {
    /// The key type.
    type Key;
    /// Borrow the key of `value`.
    fn key(value: &T) -> &Self::Key;
}

/// The key is the first element of a pair (maps).
#[derive(Debug)]
pub struct First;

impl<K, V> KeyOf<(K, V)> for First {
    type Key = K;
    #[inline]
    fn key(value: &(K, V)) -> &K {
        &value.0
    }
}

/// The value is its own key (sets).
#[derive(Debug)]
pub struct Identity;

impl<T> KeyOf<T> for Identity {
    type Key = T;
    #[inline]
    fn key(value: &T) -> &T {
        value
    }
}

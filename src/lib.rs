#![deny(missing_docs)]

//! This crate implements fixed-capacity, segmented and tree-based containers on a shared
//! core of raw-memory algorithms.
//!
//! * [FixedVec], [StaticFlatMultimap] and [StaticUnorderedFlatSet] store elements inline
//!   with a capacity fixed at compile time, and never allocate.
//! * [SegmentedDeque] and [SegmentedVec] store elements in fixed-size segments reached
//!   through a directory. Elements never move when the container grows, so a pointer to
//!   an element stays valid until that element is erased or shifted by a middle insert.
//! * [TreeMap] and [TreeSet] are red-black trees whose nodes come from a pluggable store,
//!   either the heap ([HeapNodes]) or an inline pool ([PoolNodes]). Elements are addressed
//!   by stable [Handle]s.
//!
//! The algorithms in [uninit] are written once against [Cursor] and run over both flat
//! storage and segmented storage, one contiguous run per segment.
//!
//! # Example
//!
//! ```
//!     use segmented_collections::{Deque, FixedVec};
//!     let mut d = Deque::new();
//!     for i in 0..100 {
//!         d.push_back(i);
//!     }
//!     d.push_front(-1);
//!     assert_eq!(d[1], 0);
//!
//!     let mut v: FixedVec<u8, 2> = FixedVec::new();
//!     v.push(1);
//!     v.push(2);
//!     let e = v.try_push(3).unwrap_err();
//!     assert_eq!(e.into_element(), 3);
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `unsafe-optim` : unchecked indexing skips its bounds assertion in release builds.
//! - `abort-on-error` : every reported error aborts the process instead of returning `Err`.

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(any(debug_assertions, not(feature = "unsafe-optim")))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        assert!($cond)
    };
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(all(not(debug_assertions), feature = "unsafe-optim"))]
macro_rules! safe_assert {
    ( $cond: expr ) => {};
}

pub mod alloc;
pub mod compare;
pub mod deque;
pub mod error;
pub mod flat;
pub mod map;
pub mod nodes;
pub mod segmented;
pub mod segvec;
pub mod tree;
pub mod uninit;
pub mod unordered;
pub mod vecs;

pub use alloc::{Global, RawAlloc};
pub use compare::{Compare, EqualTo, Greater, KeyEq, Less};
pub use deque::SegmentedDeque;
pub use error::{Error, InsertError, Result};
pub use flat::StaticFlatMultimap;
pub use map::{Map, MultiMap, MultiSet, Set, StaticMap, StaticMultimap, StaticMultiset, StaticSet, TreeMap, TreeSet};
pub use nodes::{Handle, HeapNodes, NodeAlloc, PoolNodes};
pub use segmented::{SegPos, SegmentedIterator};
pub use segvec::SegmentedVec;
pub use uninit::Cursor;
pub use unordered::StaticUnorderedFlatSet;
pub use vecs::FixedVec;

/// Default number of elements per segment.
pub const DEFAULT_SEGMENT: usize = 64;

/// [SegmentedDeque] with the default segment size [DEFAULT_SEGMENT].
pub type Deque<T> = SegmentedDeque<T, DEFAULT_SEGMENT>;

/// [SegmentedVec] with the default segment size [DEFAULT_SEGMENT].
pub type SegVec<T> = SegmentedVec<T, DEFAULT_SEGMENT>;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(test)]
mod mytests;

#[cfg(test)]
mod stdtests;

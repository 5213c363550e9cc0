//! Node storage for the red-black tree.
//!
//! Nodes are addressed by a 32-bit slot index rather than a pointer, so the storage
//! may be an inline array that moves with its owner. A node's links are slot indices,
//! with [`NIL`] for no node. A node keeps its index until it is released, after
//! which the index may be handed out again.

use crate::error::{Error, InsertError};
use crate::vecs::FixedVec;
use arrayvec::ArrayVec;
use std::{fmt, mem::MaybeUninit};

/// No node.
pub(crate) const NIL: u32 = u32::MAX;

/// Marks a released slot (stored in `parent`).
pub(crate) const FREE: u32 = u32::MAX - 1;

/// Stable reference to an element of a tree container. Valid until that element is
/// erased; a handle to an erased element may later refer to a different element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Handle(pub(crate) u32);

impl Handle {
    /// Slot number of the node.
    #[must_use]
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Tree node. The value is owned by the tree, the storage only holds the memory.
pub struct Node<T> {
    pub(crate) value: MaybeUninit<T>,
    pub(crate) left: u32,
    pub(crate) right: u32,
    pub(crate) parent: u32,
    pub(crate) red: bool,
}

impl<T> Node<T> {
    pub(crate) fn new(value: T, parent: u32) -> Self {
        Self {
            value: MaybeUninit::new(value),
            left: NIL,
            right: NIL,
            parent,
            red: true,
        }
    }

    /// Take the value out of a node that was never linked.
    pub(crate) fn into_value(self) -> T {
        unsafe { self.value.assume_init() }
    }
}

/// Node allocation policy.
///
/// # Safety
///
/// `base()` / `base_mut()` must point to at least `slot_count()` nodes, every index returned
/// by `allocate` must be below `slot_count()`, and a slot must keep its contents until it is
/// released or storage is reset.
pub unsafe trait NodeAlloc<T> {
    /// Maximum number of live nodes.
    fn capacity(&self) -> usize;

    /// Number of slots handed out so far, live or released.
    fn slot_count(&self) -> usize;

    /// Store `node`, returning its slot, or hand it back if there is no room.
    fn allocate(&mut self, node: Node<T>) -> Result<u32, InsertError<Node<T>>>;

    /// Put slot `h` on the free list.
    /// # Safety
    ///
    /// `h` must be live and its value already moved out or dropped.
    unsafe fn release(&mut self, h: u32);

    /// Forget every slot. Values must already be dropped.
    fn reset(&mut self);

    /// Pointer to slot 0.
    fn base(&self) -> *const Node<T>;

    /// Mutable pointer to slot 0.
    fn base_mut(&mut self) -> *mut Node<T>;
}

/// Nodes on the heap, in a slab that grows as needed.
pub struct HeapNodes<T> {
    slots: Vec<Node<T>>,
    free: Vec<u32>,
}

impl<T> Default for HeapNodes<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HeapNodes<T> {
    /// Empty slab.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

unsafe impl<T> NodeAlloc<T> for HeapNodes<T> {
    fn capacity(&self) -> usize {
        FREE as usize
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn allocate(&mut self, node: Node<T>) -> Result<u32, InsertError<Node<T>>> {
        if let Some(h) = self.free.pop() {
            self.slots[h as usize] = node;
            return Ok(h);
        }
        let h = self.slots.len();
        if h >= FREE as usize {
            return Err(InsertError::new(Error::CapacityExceeded { capacity: h }, node));
        }
        if self.slots.try_reserve(1).is_err() || self.free.try_reserve(h + 1).is_err() {
            let size = (h + 1) * std::mem::size_of::<Node<T>>();
            return Err(InsertError::new(Error::AllocFailed { size }, node));
        }
        self.slots.push(node);
        Ok(h as u32)
    }

    unsafe fn release(&mut self, h: u32) {
        self.slots[h as usize].parent = FREE;
        self.free.push(h);
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    fn base(&self) -> *const Node<T> {
        self.slots.as_ptr()
    }

    fn base_mut(&mut self) -> *mut Node<T> {
        self.slots.as_mut_ptr()
    }
}

impl<T> fmt::Debug for HeapNodes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapNodes")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .finish()
    }
}

/// Fixed pool of `N` nodes stored in place.
pub struct PoolNodes<T, const N: usize> {
    slots: FixedVec<Node<T>, N>,
    free: ArrayVec<u32, N>,
}

impl<T, const N: usize> Default for PoolNodes<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> PoolNodes<T, N> {
    /// This should produce a compile-time error if N does not fit a slot index.
    const CHECK_N: usize = {
        assert!(N < FREE as usize);
        N
    };

    /// Empty pool.
    #[must_use]
    pub fn new() -> Self {
        let _ = Self::CHECK_N;
        Self {
            slots: FixedVec::new(),
            free: ArrayVec::new(),
        }
    }
}

unsafe impl<T, const N: usize> NodeAlloc<T> for PoolNodes<T, N> {
    fn capacity(&self) -> usize {
        N
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn allocate(&mut self, node: Node<T>) -> Result<u32, InsertError<Node<T>>> {
        if let Some(h) = self.free.pop() {
            self.slots[h as usize] = node;
            return Ok(h);
        }
        match self.slots.try_push(node) {
            Ok(_) => Ok(self.slots.len() as u32 - 1),
            Err(e) => {
                log::debug!("node pool of {N} slots is full");
                Err(e)
            }
        }
    }

    unsafe fn release(&mut self, h: u32) {
        self.slots[h as usize].parent = FREE;
        self.free.push(h);
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    fn base(&self) -> *const Node<T> {
        self.slots.as_ptr()
    }

    fn base_mut(&mut self) -> *mut Node<T> {
        self.slots.as_mut_ptr()
    }
}

impl<T, const N: usize> fmt::Debug for PoolNodes<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolNodes")
            .field("capacity", &N)
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .finish()
    }
}

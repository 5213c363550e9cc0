//! Allocator capability consumed by the heap-backed containers.
//!
//! The containers never talk to `std::alloc` directly; they go through [`RawAlloc`],
//! so a caller can supply an arena, a counting allocator, or one that fails on purpose.

use crate::error::{fail, Error, Result};
use std::{alloc, alloc::Layout, mem, ptr::NonNull};

/// Source of raw memory blocks.
///
/// # Safety
///
/// A block returned by `allocate` must be valid for reads and writes of `layout.size()` bytes,
/// aligned to `layout.align()`, and stay valid until it is passed to `deallocate` with the same layout.
pub unsafe trait RawAlloc {
    /// Allocate a block. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Release a block.
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator with the same `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The global heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAlloc for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        debug_assert!(layout.size() != 0);
        let p = unsafe { alloc::alloc(layout) };
        match NonNull::new(p) {
            Some(p) => Ok(p),
            None => fail(Error::AllocFailed {
                size: layout.size(),
            }),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

unsafe impl<A: RawAlloc + ?Sized> RawAlloc for &A {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// Allocate room for `n` values of `T`. Zero-sized requests get a dangling pointer.
pub(crate) fn allocate_array<T, A: RawAlloc + ?Sized>(a: &A, n: usize) -> Result<NonNull<T>> {
    let layout = match Layout::array::<T>(n) {
        Ok(layout) => layout,
        Err(_) => {
            return fail(Error::AllocFailed {
                size: n.saturating_mul(mem::size_of::<T>()),
            })
        }
    };
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    a.allocate(layout).map(NonNull::cast)
}

/// Release memory from [`allocate_array`].
/// # Safety
///
/// `p` and `n` must match an earlier call to `allocate_array` on the same allocator.
pub(crate) unsafe fn deallocate_array<T, A: RawAlloc + ?Sized>(a: &A, p: NonNull<T>, n: usize) {
    if let Ok(layout) = Layout::array::<T>(n) {
        if layout.size() != 0 {
            unsafe { a.deallocate(p.cast(), layout) }
        }
    }
}

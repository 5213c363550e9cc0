//! Algorithms over raw, possibly uninitialised storage.
//!
//! Three families:
//!
//! * construct into raw slots (`uninitialized_*`): on failure of element k the k-1
//!   elements already built are dropped, in construction order, before the failure
//!   propagates. Failure is a panic (rollback runs during unwinding) or an `Err` from a
//!   fallible generator.
//! * destroy live slots (`destroy_n`).
//! * rearrange live slots (`copy_n`, `copy_backward_n`, `fill_n` clone-assign;
//!   `move_n`, `move_backward_n` relocate bits and may overlap).
//!
//! Every algorithm is written once against [`Cursor`]. A flat pointer is one contiguous
//! run, a [`SegPos`](crate::segmented::SegPos) yields one run per segment. Which one is
//! used is decided by the cursor type, so segment walking costs nothing on flat storage.

use std::{marker::PhantomData, mem, ptr};

/// A position in raw element storage that can describe a range as contiguous runs.
pub trait Cursor<T>: Copy {
    /// Call `f(ptr, len)` for each contiguous run covering the `n` slots starting here,
    /// in storage order. Returns the position after the last slot.
    fn runs<F: FnMut(*mut T, usize)>(self, n: usize, f: F) -> Self;

    /// Call `f(ptr, len)` for each contiguous run covering the `n` slots ending just
    /// before this position, last run first. Returns the position of the first slot.
    fn runs_back<F: FnMut(*mut T, usize)>(self, n: usize, f: F) -> Self;
}

impl<T> Cursor<T> for *mut T {
    #[inline]
    fn runs<F: FnMut(*mut T, usize)>(self, n: usize, mut f: F) -> Self {
        if n > 0 {
            f(self, n);
        }
        self.wrapping_add(n)
    }

    #[inline]
    fn runs_back<F: FnMut(*mut T, usize)>(self, n: usize, mut f: F) -> Self {
        let first = self.wrapping_sub(n);
        if n > 0 {
            f(first, n);
        }
        first
    }
}

/// Walk `n` slots of two ranges in step, splitting at the run boundaries of both.
fn zip_runs<T, S, D, F>(src: S, n: usize, dst: D, mut f: F) -> (S, D)
where
    S: Cursor<T>,
    D: Cursor<T>,
    F: FnMut(*mut T, *mut T, usize),
{
    let mut d = dst;
    let s = src.runs(n, |sp, len| {
        let mut off = 0;
        d = d.runs(len, |dp, dl| {
            f(sp.wrapping_add(off), dp, dl);
            off += dl;
        });
    });
    (s, d)
}

/// As [`zip_runs`] but walking backward from the ends of both ranges.
fn zip_runs_back<T, S, D, F>(src_last: S, n: usize, dst_last: D, mut f: F) -> (S, D)
where
    S: Cursor<T>,
    D: Cursor<T>,
    F: FnMut(*mut T, *mut T, usize),
{
    let mut d = dst_last;
    let s = src_last.runs_back(n, |sp, len| {
        let mut rem = len;
        d = d.runs_back(len, |dp, dl| {
            rem -= dl;
            f(sp.wrapping_add(rem), dp, dl);
        });
    });
    (s, d)
}

/// Drops the first `done` slots from `first` unless disarmed.
struct Rollback<T, C: Cursor<T>> {
    first: C,
    done: usize,
    marker: PhantomData<T>,
}

impl<T, C: Cursor<T>> Rollback<T, C> {
    fn new(first: C) -> Self {
        Self {
            first,
            done: 0,
            marker: PhantomData,
        }
    }

    fn disarm(self) {
        mem::forget(self);
    }
}

impl<T, C: Cursor<T>> Drop for Rollback<T, C> {
    fn drop(&mut self) {
        unsafe {
            destroy_n(self.first, self.done);
        }
    }
}

/// Drop `n` live slots starting at `first`.
/// # Safety
///
/// The slots must be live; afterwards they are uninitialised.
pub unsafe fn destroy_n<T, C: Cursor<T>>(first: C, n: usize) -> C {
    if !mem::needs_drop::<T>() {
        return first.runs(n, |_, _| {});
    }
    first.runs(n, |p, len| unsafe {
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p, len));
    })
}

/// Build `n` values from `f` into raw slots.
/// # Safety
///
/// The `n` slots from `first` must be uninitialised and writable.
pub unsafe fn uninitialized_with_n<T, C, F>(first: C, n: usize, mut f: F) -> C
where
    C: Cursor<T>,
    F: FnMut() -> T,
{
    let mut guard = Rollback::new(first);
    let last = first.runs(n, |p, len| {
        for i in 0..len {
            unsafe {
                ptr::write(p.add(i), f());
            }
            guard.done += 1;
        }
    });
    guard.disarm();
    last
}

/// Build up to `n` values from a fallible `f`. On `Err` the values built so far are dropped
/// and the error is returned.
/// # Safety
///
/// The `n` slots from `first` must be uninitialised and writable.
pub unsafe fn try_uninitialized_with_n<T, E, C, F>(first: C, n: usize, mut f: F) -> Result<C, E>
where
    C: Cursor<T>,
    F: FnMut() -> Result<T, E>,
{
    let mut guard = Rollback::new(first);
    let mut failed = None;
    let last = first.runs(n, |p, len| {
        for i in 0..len {
            if failed.is_some() {
                return;
            }
            match f() {
                Ok(value) => {
                    unsafe {
                        ptr::write(p.add(i), value);
                    }
                    guard.done += 1;
                }
                Err(e) => failed = Some(e),
            }
        }
    });
    if let Some(e) = failed {
        drop(guard);
        return Err(e);
    }
    guard.disarm();
    Ok(last)
}

/// Default-construct `n` values into raw slots.
/// # Safety
///
/// As [`uninitialized_with_n`].
pub unsafe fn uninitialized_default_n<T: Default, C: Cursor<T>>(first: C, n: usize) -> C {
    unsafe { uninitialized_with_n(first, n, T::default) }
}

/// Clone `value` into `n` raw slots.
/// # Safety
///
/// As [`uninitialized_with_n`].
pub unsafe fn uninitialized_fill_n<T: Clone, C: Cursor<T>>(first: C, n: usize, value: &T) -> C {
    unsafe { uninitialized_with_n(first, n, || value.clone()) }
}

/// Clone `n` live values from `src` into raw slots at `dst`.
/// # Safety
///
/// Source slots must be live, destination slots uninitialised, and the ranges disjoint.
pub unsafe fn uninitialized_copy_n<T, S, D>(src: S, n: usize, dst: D) -> D
where
    T: Clone,
    S: Cursor<T>,
    D: Cursor<T>,
{
    let mut guard = Rollback::new(dst);
    let (_, last) = zip_runs(src, n, dst, |sp, dp, len| {
        for i in 0..len {
            unsafe {
                ptr::write(dp.add(i), (*sp.add(i)).clone());
            }
            guard.done += 1;
        }
    });
    guard.disarm();
    last
}

/// Relocate `n` live values from `src` into raw slots at `dst`. The source slots become
/// uninitialised. Cannot fail.
/// # Safety
///
/// Source slots must be live, destination slots uninitialised, and the ranges disjoint.
pub unsafe fn uninitialized_move_n<T, S, D>(src: S, n: usize, dst: D) -> D
where
    S: Cursor<T>,
    D: Cursor<T>,
{
    zip_runs(src, n, dst, |sp, dp, len| unsafe {
        ptr::copy_nonoverlapping(sp, dp, len);
    })
    .1
}

/// Clone-assign `n` values from `src` over live values at `dst`, front to back.
/// # Safety
///
/// Both ranges must be live. They may overlap only if `dst` is before `src`.
pub unsafe fn copy_n<T, S, D>(src: S, n: usize, dst: D) -> D
where
    T: Clone,
    S: Cursor<T>,
    D: Cursor<T>,
{
    zip_runs(src, n, dst, |sp, dp, len| {
        for i in 0..len {
            if sp != dp {
                unsafe {
                    (*dp.add(i)).clone_from(&*sp.add(i));
                }
            }
        }
    })
    .1
}

/// Clone-assign the `n` values ending at `src_last` over the live values ending at
/// `dst_last`, back to front. Returns the start of the destination range.
/// # Safety
///
/// Both ranges must be live. They may overlap only if `dst_last` is after `src_last`.
pub unsafe fn copy_backward_n<T, S, D>(src_last: S, n: usize, dst_last: D) -> D
where
    T: Clone,
    S: Cursor<T>,
    D: Cursor<T>,
{
    zip_runs_back(src_last, n, dst_last, |sp, dp, len| {
        for i in (0..len).rev() {
            if sp != dp {
                unsafe {
                    (*dp.add(i)).clone_from(&*sp.add(i));
                }
            }
        }
    })
    .1
}

/// Clone-assign `value` over `n` live values.
/// # Safety
///
/// The slots must be live.
pub unsafe fn fill_n<T: Clone, C: Cursor<T>>(first: C, n: usize, value: &T) -> C {
    first.runs(n, |p, len| {
        for i in 0..len {
            unsafe {
                (*p.add(i)).clone_from(value);
            }
        }
    })
}

/// Relocate the bits of `n` slots from `src` to `dst`, front to back. Ranges may overlap
/// when shifting toward the front. Liveness bookkeeping is up to the caller: afterwards
/// the destination holds the values and source slots not overwritten are stale.
/// # Safety
///
/// All slots must be within allocated storage.
pub unsafe fn move_n<T, S, D>(src: S, n: usize, dst: D) -> D
where
    S: Cursor<T>,
    D: Cursor<T>,
{
    zip_runs(src, n, dst, |sp, dp, len| unsafe {
        ptr::copy(sp, dp, len);
    })
    .1
}

/// Relocate the bits of the `n` slots ending at `src_last` so they end at `dst_last`,
/// back to front. Ranges may overlap when shifting toward the back. Returns the start of
/// the destination range.
/// # Safety
///
/// All slots must be within allocated storage.
pub unsafe fn move_backward_n<T, S, D>(src_last: S, n: usize, dst_last: D) -> D
where
    S: Cursor<T>,
    D: Cursor<T>,
{
    zip_runs_back(src_last, n, dst_last, |sp, dp, len| unsafe {
        ptr::copy(sp, dp, len);
    })
    .1
}

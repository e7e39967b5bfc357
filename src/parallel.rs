//! Chunked parallel iteration over curve ranges.
//!
//! Buffer fills are embarrassingly parallel across curves: no curve reads
//! or writes another curve's output. [`parallel_for`] splits a curve range
//! into chunks and processes them on scoped threads, falling back to
//! sequential iteration for small workloads or on WASM where threads are
//! unavailable.

use std::ops::Range;

/// Curve count below which parallel iteration is not worth the overhead.
const PARALLEL_THRESHOLD: usize = 256;

/// Run `f` over sub-ranges of `0..total`, potentially on multiple threads.
///
/// `grain` is the minimum number of items per chunk; it should be large
/// enough to amortize thread dispatch (the fill loops use 1024 curves).
/// Chunks are disjoint and cover the whole range exactly once. Iteration
/// order across chunks is unspecified.
#[cfg(not(target_arch = "wasm32"))]
pub fn parallel_for<F>(total: usize, grain: usize, f: F)
where
    F: Fn(Range<usize>) + Sync,
{
    if total == 0 {
        return;
    }
    if total < PARALLEL_THRESHOLD || total <= grain {
        f(0..total);
        return;
    }

    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let chunk = (total / (num_threads * 4)).max(grain).max(1);

    std::thread::scope(|scope| {
        let mut start = 0;
        while start < total {
            let end = (start + chunk).min(total);
            let f = &f;
            scope.spawn(move || f(start..end));
            start = end;
        }
    });
}

/// WASM fallback: sequential iteration (no threads available).
#[cfg(target_arch = "wasm32")]
pub fn parallel_for<F>(total: usize, _grain: usize, f: F)
where
    F: Fn(Range<usize>) + Sync,
{
    if total > 0 {
        f(0..total);
    }
}

/// A raw view of a mutable slice that can be shared across the scoped
/// threads spawned by [`parallel_for`].
///
/// # Safety contract (upheld by callers)
///
/// - Regions written through [`slice_mut`](Self::slice_mut) /
///   [`get_mut`](Self::get_mut) from different chunks must be disjoint
///   (guaranteed by the per-curve output layout: every curve owns a
///   distinct output range).
/// - The view must not outlive the borrow it was created from; the
///   lifetime parameter enforces this.
pub(crate) struct SharedSliceMut<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: std::marker::PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for SharedSliceMut<'_, T> {}
unsafe impl<T: Send> Sync for SharedSliceMut<'_, T> {}

impl<'a, T> SharedSliceMut<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Mutable sub-slice for one curve's output region.
    ///
    /// # Safety
    ///
    /// `range` must be in bounds and disjoint from every other region
    /// accessed concurrently.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [T] {
        debug_assert!(range.end <= self.len);
        std::slice::from_raw_parts_mut(self.ptr.add(range.start), range.len())
    }

    /// Mutable reference to a single element.
    ///
    /// # Safety
    ///
    /// `index` must be in bounds and not accessed concurrently elsewhere.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        &mut *self.ptr.add(index)
    }
}

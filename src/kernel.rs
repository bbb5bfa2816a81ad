//! Odometer traversal over strided views.
//!
//! Every kernel in the crate walks its operands with the same mechanism:
//! per-axis counters incremented from the last axis toward the first, with a
//! running linear index per stride set that advances by the axis stride and
//! rolls back by `dim * stride` when the counter wraps. The walk emits
//! `product(dims)` linear indices in row-major logical order regardless of
//! the strides (zero strides from broadcasting included).

/// Walk one stride set, calling `f` with the linear index of each element in
/// row-major logical order. `dims` and `strides` must have equal length;
/// `start` is the view's offset. An empty `dims` emits `start` once.
pub(crate) fn traverse<F: FnMut(usize)>(dims: &[usize], strides: &[usize], start: usize, mut f: F) {
    debug_assert_eq!(dims.len(), strides.len());
    let total: usize = dims.iter().product();
    let rank = dims.len();
    let mut counters = vec![0usize; rank];
    let mut idx = start;
    for _ in 0..total {
        f(idx);
        for dim in (0..rank).rev() {
            counters[dim] += 1;
            idx += strides[dim];
            if counters[dim] < dims[dim] {
                break;
            }
            counters[dim] = 0;
            idx -= dims[dim] * strides[dim];
        }
    }
}

/// Walk two stride sets of the same shape in lockstep, calling `f` with both
/// linear indices at each step.
pub(crate) fn traverse2<F: FnMut(usize, usize)>(
    dims: &[usize],
    a_strides: &[usize],
    a_start: usize,
    b_strides: &[usize],
    b_start: usize,
    mut f: F,
) {
    debug_assert_eq!(dims.len(), a_strides.len());
    debug_assert_eq!(dims.len(), b_strides.len());
    let total: usize = dims.iter().product();
    let rank = dims.len();
    let mut counters = vec![0usize; rank];
    let mut a_idx = a_start;
    let mut b_idx = b_start;
    for _ in 0..total {
        f(a_idx, b_idx);
        for dim in (0..rank).rev() {
            counters[dim] += 1;
            a_idx += a_strides[dim];
            b_idx += b_strides[dim];
            if counters[dim] < dims[dim] {
                break;
            }
            counters[dim] = 0;
            a_idx -= dims[dim] * a_strides[dim];
            b_idx -= dims[dim] * b_strides[dim];
        }
    }
}

//! Axis reductions over strided views.
//!
//! A reduction walks the source once with the odometer while a second stride
//! set maps each source position onto the output: reduced axes carry stride
//! 0 so the output index stands still along them, kept axes carry the
//! output's compact stride.

use crate::kernel::traverse2;
use crate::view::NdView;
use crate::{Element, NdError, Result};

/// Combine elements along `axes` with `op`, starting from `init`.
///
/// Negative axes count from the end. Duplicate axes collapse into one
/// through the boolean mask. When every axis is reduced and `keepdims` is
/// false the result has shape `[1]`.
fn reduce_kernel<T: Element>(
    src: &NdView<T>,
    axes: &[isize],
    op: impl Fn(T, T) -> T,
    init: T,
    keepdims: bool,
) -> Result<NdView<T>> {
    let rank = src.rank();
    if axes.len() > rank {
        return Err(NdError::AxisCount {
            count: axes.len(),
            rank,
        });
    }

    let mut reduced = vec![false; rank];
    for &axis in axes {
        let normalized = if axis < 0 { axis + rank as isize } else { axis };
        if normalized < 0 || normalized as usize >= rank {
            return Err(NdError::InvalidAxis { axis, rank });
        }
        reduced[normalized as usize] = true;
    }

    let mut out_shape = Vec::with_capacity(rank);
    for (d, &dim) in src.shape().iter().enumerate() {
        if reduced[d] {
            if keepdims {
                out_shape.push(1);
            }
        } else {
            out_shape.push(dim);
        }
    }
    if out_shape.is_empty() {
        out_shape.push(1);
    }

    let out = NdView::full(&out_shape, init);
    let out_strides = out.strides();

    // Map each source axis onto the output's compact strides: reduced axes
    // stand still; with keepdims the output has a size-1 axis to skip over.
    let mut mapped = vec![0usize; rank];
    let mut out_axis = 0usize;
    for (d, entry) in mapped.iter_mut().enumerate() {
        if reduced[d] {
            if keepdims {
                out_axis += 1;
            }
        } else {
            *entry = out_strides[out_axis];
            out_axis += 1;
        }
    }

    let src_buf = src.buffer();
    let out_buf = out.buffer();
    traverse2(
        src.shape(),
        src.strides(),
        src.offset(),
        &mapped,
        0,
        |src_idx, out_idx| out_buf.set(out_idx, op(out_buf.get(out_idx), src_buf.get(src_idx))),
    );
    Ok(out)
}

impl<T: Element> NdView<T> {
    /// Sum over the given axes.
    pub fn sum(&self, axes: &[isize], keepdims: bool) -> Result<NdView<T>> {
        reduce_kernel(self, axes, |a, b| a + b, T::zero(), keepdims)
    }

    /// Maximum over the given axes.
    pub fn max(&self, axes: &[isize], keepdims: bool) -> Result<NdView<T>> {
        reduce_kernel(self, axes, |a, b| a.max(b), T::min_value(), keepdims)
    }

    /// Minimum over the given axes.
    pub fn min(&self, axes: &[isize], keepdims: bool) -> Result<NdView<T>> {
        reduce_kernel(self, axes, |a, b| a.min(b), T::max_value(), keepdims)
    }
}

//! Dynamic-rank strided views over a shared buffer.
//!
//! [`NdView`] is the crate's central type: a `(buffer, shape, strides,
//! offset)` descriptor. The view algebra (`reshape`, `slice`, `transpose`,
//! `broadcast`) produces new descriptors over the same buffer without
//! touching the data; only [`NdView::make_compact`] allocates.

use std::rc::Rc;

use crate::buffer::Buffer;
use crate::kernel::traverse;
use crate::{Element, NdError, Result};

// ============================================================================
// Stride and shape helpers
// ============================================================================

/// Compute row-major strides: the last axis has stride 1, each earlier axis
/// steps over the product of all later axes.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1usize; rank];
    for d in (0..rank - 1).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Compute the common broadcast shape of two shapes.
///
/// Axes are right-aligned; each aligned pair must be equal or contain a 1,
/// and the result axis is the larger of the two. Missing leading axes count
/// as 1.
pub fn broadcast_shape(s1: &[usize], s2: &[usize]) -> Result<Vec<usize>> {
    let rank = s1.len().max(s2.len());
    let mut out = vec![1usize; rank];
    for k in 0..rank {
        let d1 = if k < s1.len() { s1[s1.len() - 1 - k] } else { 1 };
        let d2 = if k < s2.len() { s2[s2.len() - 1 - k] } else { 1 };
        if d1 == d2 || d1 == 1 || d2 == 1 {
            out[rank - 1 - k] = d1.max(d2);
        } else {
            return Err(NdError::ShapeMismatch(s1.to_vec(), s2.to_vec()));
        }
    }
    Ok(out)
}

// ============================================================================
// Slice specifiers
// ============================================================================

/// Per-axis slice specifier.
///
/// An `Index` collapses its axis (rank drops by one); a `Range` keeps the
/// axis with `ceil((stop - start) / step)` elements. Steps are positive by
/// construction; reversed slices are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSlice {
    /// Select a single position along the axis, removing the axis.
    Index(usize),
    /// Select `start..stop` by `step` along the axis, keeping the axis.
    Range {
        start: usize,
        stop: usize,
        step: usize,
    },
}

impl AxisSlice {
    /// `start..stop` with step 1.
    pub fn to(start: usize, stop: usize) -> Self {
        AxisSlice::Range {
            start,
            stop,
            step: 1,
        }
    }

    /// `start..stop` with an explicit step.
    pub fn step_by(start: usize, stop: usize, step: usize) -> Self {
        AxisSlice::Range { start, stop, step }
    }
}

// ============================================================================
// NdView
// ============================================================================

/// Dynamic-rank strided view over a shared [`Buffer`].
///
/// A view never owns its storage exclusively: cloning a view, or deriving
/// one through the view algebra, yields another handle on the same buffer.
/// Writes through one view ([`fill`](NdView::fill), [`assign`](NdView::assign))
/// are immediately visible to every aliasing view. The buffer is freed when
/// the last view referencing it drops.
///
/// Strides are measured in elements, not bytes.
pub struct NdView<T> {
    buf: Rc<Buffer<T>>,
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

impl<T> Clone for NdView<T> {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            offset: self.offset,
        }
    }
}

impl<T> std::fmt::Debug for NdView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdView")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<T: Element> NdView<T> {
    /// Fresh zero-filled view of the given shape (row-major, offset 0).
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    /// Fresh view of the given shape with every element set to `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        let total: usize = shape.iter().product();
        let buf = Rc::new(Buffer::from_vec(vec![value; total]));
        Self::from_parts(buf, shape.to_vec(), None, 0)
    }

    /// Adopt flat data with an explicit shape.
    ///
    /// Fails when `data.len()` differs from the product of `shape`.
    pub fn from_data(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NdError::LengthMismatch {
                len: data.len(),
                shape: shape.to_vec(),
            });
        }
        let buf = Rc::new(Buffer::from_vec(data));
        Ok(Self::from_parts(buf, shape.to_vec(), None, 0))
    }

    /// Adopt flat data as a rank-1 view.
    pub fn from_flat(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        let buf = Rc::new(Buffer::from_vec(data));
        Self::from_parts(buf, shape, None, 0)
    }

    /// Fresh view with values produced by an index function, filled in
    /// row-major order.
    pub fn from_fn(shape: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let total: usize = shape.iter().product();
        let rank = shape.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        let buf = Rc::new(Buffer::from_vec(data));
        Self::from_parts(buf, shape.to_vec(), None, 0)
    }

    /// Trusted descriptor constructor used by the view algebra and kernels.
    ///
    /// Computes row-major strides when `strides` is `None`. Performs no
    /// bounds validation beyond rank agreement.
    pub(crate) fn from_parts(
        buf: Rc<Buffer<T>>,
        shape: Vec<usize>,
        strides: Option<Vec<usize>>,
        offset: usize,
    ) -> Self {
        let strides = strides.unwrap_or_else(|| row_major_strides(&shape));
        debug_assert_eq!(strides.len(), shape.len());
        Self {
            buf,
            shape,
            strides,
            offset,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of logical elements.
    #[inline]
    pub fn nelems(&self) -> usize {
        self.shape.iter().product()
    }

    /// Handle on the underlying shared buffer.
    #[inline]
    pub fn buffer(&self) -> &Rc<Buffer<T>> {
        &self.buf
    }

    /// Read the element at a multi-dimensional index.
    ///
    /// # Panics
    /// Panics when the index arity or any component is out of range.
    pub fn get(&self, indices: &[usize]) -> T {
        assert_eq!(indices.len(), self.rank(), "wrong number of indices");
        let mut idx = self.offset;
        for (d, &i) in indices.iter().enumerate() {
            assert!(
                i < self.shape[d],
                "index {i} out of bounds for axis of size {}",
                self.shape[d]
            );
            idx += i * self.strides[d];
        }
        self.buf.get(idx)
    }

    /// Whether the strides are row-major for the shape, ignoring axes of
    /// size <= 1 (their stride is never used to advance).
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1usize;
        for d in (0..self.rank()).rev() {
            if self.shape[d] > 1 {
                if self.strides[d] != expected {
                    return false;
                }
                expected *= self.shape[d];
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // View algebra
    // ------------------------------------------------------------------

    /// The logical contents flattened in row-major order.
    pub fn to_flat(&self) -> Vec<T> {
        let total = self.nelems();
        let mut out = Vec::with_capacity(total);
        if self.is_contiguous() {
            for i in 0..total {
                out.push(self.buf.get(self.offset + i));
            }
        } else {
            traverse(&self.shape, &self.strides, self.offset, |idx| {
                out.push(self.buf.get(idx))
            });
        }
        out
    }

    /// Materialize the logical contents into a fresh buffer, producing a
    /// view with offset 0 and row-major strides.
    pub fn make_compact(&self) -> Self {
        let buf = Rc::new(Buffer::from_vec(self.to_flat()));
        Self::from_parts(buf, self.shape.clone(), None, 0)
    }

    /// Reinterpret the elements under a new shape of equal element count.
    ///
    /// A contiguous source is re-strided in place (same buffer, source
    /// offset kept); a non-contiguous source is compacted first.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self> {
        let new_total: usize = new_shape.iter().product();
        if new_total != self.nelems() {
            return Err(NdError::ShapeMismatch(
                self.shape.clone(),
                new_shape.to_vec(),
            ));
        }
        let source = if self.is_contiguous() {
            self.clone()
        } else {
            self.make_compact()
        };
        Ok(Self::from_parts(
            source.buf,
            new_shape.to_vec(),
            None,
            source.offset,
        ))
    }

    /// Derive a sub-view from per-axis specifiers.
    ///
    /// Specifiers apply to the leading axes in order; axes beyond the
    /// specifier list pass through unchanged. The caller is trusted to
    /// supply at most `rank` specifiers with `start <= stop <= axis size`
    /// and a positive step; no validation happens here. If every axis is
    /// collapsed the result is a one-element view of shape `[1]`.
    pub fn slice(&self, specs: &[AxisSlice]) -> Self {
        let mut offset = self.offset;
        let mut shape = Vec::with_capacity(self.rank());
        let mut strides = Vec::with_capacity(self.rank());
        for (axis, spec) in specs.iter().enumerate() {
            match *spec {
                AxisSlice::Index(i) => {
                    offset += i * self.strides[axis];
                }
                AxisSlice::Range { start, stop, step } => {
                    offset += start * self.strides[axis];
                    shape.push(stop.saturating_sub(start).div_ceil(step));
                    strides.push(self.strides[axis] * step);
                }
            }
        }
        for axis in specs.len()..self.rank() {
            shape.push(self.shape[axis]);
            strides.push(self.strides[axis]);
        }
        if shape.is_empty() {
            shape.push(1);
            strides.push(1);
        }
        Self::from_parts(self.buf.clone(), shape, Some(strides), offset)
    }

    /// Permute the axes. `axes` must be a permutation of `0..rank`.
    pub fn transpose(&self, axes: &[usize]) -> Result<Self> {
        let rank = self.rank();
        if axes.len() != rank {
            return Err(NdError::RankMismatch(axes.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &ax in axes {
            if ax >= rank || seen[ax] {
                return Err(NdError::InvalidAxis {
                    axis: ax as isize,
                    rank,
                });
            }
            seen[ax] = true;
        }
        let shape: Vec<usize> = axes.iter().map(|&ax| self.shape[ax]).collect();
        let strides: Vec<usize> = axes.iter().map(|&ax| self.strides[ax]).collect();
        Ok(Self::from_parts(
            self.buf.clone(),
            shape,
            Some(strides),
            self.offset,
        ))
    }

    /// Expand to a larger shape without copying.
    ///
    /// Axes are right-aligned against `new_shape`. A matching axis keeps its
    /// stride; a size-1 axis repeats with stride 0; extra leading axes get
    /// stride 0. Fails when `new_shape` has fewer axes than the source or an
    /// aligned pair is incompatible.
    pub fn broadcast(&self, new_shape: &[usize]) -> Result<Self> {
        let rank = self.rank();
        if new_shape.len() < rank {
            return Err(NdError::RankMismatch(new_shape.len(), rank));
        }
        let mut strides = vec![0usize; new_shape.len()];
        let pad = new_shape.len() - rank;
        for d in 0..rank {
            if self.shape[d] == new_shape[pad + d] {
                strides[pad + d] = self.strides[d];
            } else if self.shape[d] == 1 {
                strides[pad + d] = 0;
            } else {
                return Err(NdError::ShapeMismatch(
                    self.shape.clone(),
                    new_shape.to_vec(),
                ));
            }
        }
        Ok(Self::from_parts(
            self.buf.clone(),
            new_shape.to_vec(),
            Some(strides),
            self.offset,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

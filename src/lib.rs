//! Strided n-dimensional array views over shared contiguous buffers.
//!
//! The crate is built around a single descriptor type, [`NdView`]: a shape,
//! a stride per axis, and an offset into a reference-counted [`Buffer`].
//! Many views may alias one buffer; transforms never copy data unless they
//! say so.
//!
//! # Core Types
//!
//! - [`Buffer`]: fixed-length contiguous storage, shared between views
//! - [`NdView`]: dynamic-rank strided view (the central type)
//! - [`AxisSlice`]: per-axis slice specifier (single index or strided range)
//!
//! # View algebra
//!
//! Zero-copy transforms producing a new view over the same buffer:
//! - [`NdView::reshape`] (copies only when the source is not contiguous)
//! - [`NdView::slice`]: per-axis index/range selection
//! - [`NdView::transpose`]: axis permutation
//! - [`NdView::broadcast`]: right-aligned expansion via zero strides
//!
//! [`NdView::make_compact`] is the one transform that always allocates: it
//! materializes the logical contents into a fresh row-major buffer.
//!
//! # Kernels
//!
//! All kernels read through arbitrary strides and write compact outputs:
//! - element-wise binary with broadcasting: [`ewise_add`], [`ewise_sub`],
//!   [`ewise_mul`], [`ewise_div`], [`ewise_pow`]
//! - scalar binary: [`scalar_add`], [`scalar_sub`], [`scalar_rsub`],
//!   [`scalar_mul`], [`scalar_div`], [`scalar_rdiv`], [`scalar_pow`]
//! - unary methods: [`NdView::neg`], [`NdView::exp`], [`NdView::ln`],
//!   [`NdView::sqrt`], [`NdView::sin`], [`NdView::cos`], [`NdView::tanh`]
//! - axis reductions with `keepdims`: [`NdView::sum`], [`NdView::max`],
//!   [`NdView::min`]
//! - batched matrix multiplication: [`matmul`]
//!
//! # Example
//!
//! ```
//! use ndview::{ewise_add, NdView};
//!
//! let a = NdView::<f32>::from_data(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! let t = a.transpose(&[1, 0]).unwrap(); // shape [3, 2], no copy
//! assert!(!t.is_contiguous());
//! assert_eq!(t.make_compact().to_flat(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
//!
//! let row = NdView::<f32>::from_flat(vec![10.0, 20.0, 30.0]);
//! let sum = ewise_add(&a, &row).unwrap(); // row broadcasts to [2, 3]
//! assert_eq!(sum.to_flat(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
//! ```

mod buffer;
mod interop;
mod kernel;
mod matmul;
mod ops;
mod reduce;
mod view;

pub use buffer::Buffer;
pub use interop::BufferDescriptor;
pub use matmul::matmul;
pub use ops::{
    ewise_add, ewise_div, ewise_mul, ewise_pow, ewise_sub, scalar_add, scalar_div, scalar_mul,
    scalar_pow, scalar_rdiv, scalar_rsub, scalar_sub,
};
pub use view::{broadcast_shape, row_major_strides, AxisSlice, NdView};

/// Trait alias for element types the kernels operate on.
///
/// One concrete floating-point instantiation is all the crate needs;
/// `f32` is the nominal one.
pub trait Element: num_traits::Float {}

impl<T> Element for T where T: num_traits::Float {}

/// Errors that can occur during view construction or kernel dispatch.
#[derive(Debug, thiserror::Error)]
pub enum NdError {
    /// Data length does not match the product of the requested shape.
    #[error("data length {len} does not match shape {shape:?}")]
    LengthMismatch { len: usize, shape: Vec<usize> },

    /// Two shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Array ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: isize, rank: usize },

    /// More reduction axes than the source has.
    #[error("{count} reduction axes exceed rank {rank}")]
    AxisCount { count: usize, rank: usize },

    /// A slice specifier lies outside the source axis.
    #[error("slice bound {index} out of range for axis of size {len}")]
    OutOfBounds { index: usize, len: usize },

    /// A slice step of zero.
    #[error("slice step must be positive")]
    ZeroStep,
}

/// Result type for view and kernel operations.
pub type Result<T> = std::result::Result<T, NdError>;

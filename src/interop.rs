//! Zero-copy buffer description for external array consumers.

use crate::view::NdView;
use crate::Element;

/// Description of a view's memory layout for zero-copy interop.
///
/// Gives a consumer everything needed to read the view's elements at their
/// logical positions without copying: a pointer to the logical `(0, ..., 0)`
/// element, the element size, the shape, and the strides in **bytes**.
///
/// The pointer borrows the view's buffer; the descriptor must not outlive
/// the views holding that buffer alive.
#[derive(Debug)]
pub struct BufferDescriptor<T> {
    /// Pointer to the element at the view's offset.
    pub ptr: *const T,
    /// Size in bytes of one element.
    pub item_size: usize,
    /// Axis sizes.
    pub shape: Vec<usize>,
    /// Byte stride per axis (element stride times element size).
    pub strides: Vec<usize>,
    /// Number of axes.
    pub rank: usize,
}

impl<T: Element> NdView<T> {
    /// Describe this view's layout for an external consumer.
    pub fn descriptor(&self) -> BufferDescriptor<T> {
        let item_size = std::mem::size_of::<T>();
        BufferDescriptor {
            ptr: unsafe { self.buffer().as_ptr().add(self.offset()) },
            item_size,
            shape: self.shape().to_vec(),
            strides: self.strides().iter().map(|&s| s * item_size).collect(),
            rank: self.rank(),
        }
    }
}

//! Shared contiguous element storage.

use std::cell::UnsafeCell;

use num_traits::Zero;

/// Fixed-length contiguous storage for a single element type.
///
/// A `Buffer` is created once (zeroed or by adopting a `Vec`) and its length
/// never changes. Views hold `Rc<Buffer<T>>` handles; the buffer is freed
/// when the last view drops its handle.
///
/// Element access goes through [`get`](Buffer::get) / [`set`](Buffer::set),
/// which take `&self`: peer views aliasing the same buffer may interleave
/// reads and writes, and for `Copy` elements every such access is a single
/// well-defined load or store. The `UnsafeCell` interior makes the type
/// `!Sync`, so this aliasing stays confined to one thread.
pub struct Buffer<T> {
    data: UnsafeCell<Box<[T]>>,
    len: usize,
}

impl<T: Copy> Buffer<T> {
    /// Allocate `len` zero-initialized elements.
    pub fn zeroed(len: usize) -> Self
    where
        T: Zero,
    {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Adopt an externally provided flat vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        let len = data.len();
        Self {
            data: UnsafeCell::new(data.into_boxed_slice()),
            len,
        }
    }

    /// Element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the element at linear index `index`.
    ///
    /// # Panics
    /// Panics in debug builds if `index` is out of bounds; callers (the view
    /// algebra and kernels) only produce in-bounds indices.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        debug_assert!(index < self.len, "buffer read at {index} of {}", self.len);
        unsafe { *(*self.data.get()).as_ptr().add(index) }
    }

    /// Write `value` at linear index `index`.
    #[inline]
    pub fn set(&self, index: usize, value: T) {
        debug_assert!(index < self.len, "buffer write at {index} of {}", self.len);
        unsafe { *(*self.data.get()).as_mut_ptr().add(index) = value }
    }

    /// Raw const pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        unsafe { (*self.data.get()).as_ptr() }
    }
}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let buf = Buffer::<f32>::zeroed(5);
        assert_eq!(buf.len(), 5);
        for i in 0..5 {
            assert_eq!(buf.get(i), 0.0);
        }
    }

    #[test]
    fn test_from_vec_round_trip() {
        let buf = Buffer::from_vec(vec![1.0f32, 2.0, 3.0]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(0), 1.0);
        assert_eq!(buf.get(2), 3.0);
    }

    #[test]
    fn test_set_then_get() {
        let buf = Buffer::<f32>::zeroed(4);
        buf.set(1, 7.5);
        buf.set(3, -2.0);
        assert_eq!(buf.get(0), 0.0);
        assert_eq!(buf.get(1), 7.5);
        assert_eq!(buf.get(3), -2.0);
    }
}

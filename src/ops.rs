//! Element-wise, scalar, and unary kernels, plus slice assignment.
//!
//! Every kernel allocates a compact output and fills it linearly while the
//! inputs are walked with the shared odometer; inputs may be any view.
//! Binary kernels broadcast their operands to a common shape first.

use crate::kernel::{traverse, traverse2};
use crate::view::{broadcast_shape, AxisSlice, NdView};
use crate::{Element, NdError, Result};

// ============================================================================
// Kernel cores
// ============================================================================

/// Map one strided input into a fresh compact output.
fn map_kernel<T: Element>(a: &NdView<T>, op: impl Fn(T) -> T) -> NdView<T> {
    let out = NdView::zeros(a.shape());
    let out_buf = out.buffer();
    let a_buf = a.buffer();
    if a.is_contiguous() {
        let base = a.offset();
        for i in 0..a.nelems() {
            out_buf.set(i, op(a_buf.get(base + i)));
        }
    } else {
        let mut i = 0usize;
        traverse(a.shape(), a.strides(), a.offset(), |a_idx| {
            out_buf.set(i, op(a_buf.get(a_idx)));
            i += 1;
        });
    }
    out
}

/// Broadcast two inputs to their common shape and combine element-wise into
/// a fresh compact output.
fn zip_kernel<T: Element>(
    a: &NdView<T>,
    b: &NdView<T>,
    op: impl Fn(T, T) -> T,
) -> Result<NdView<T>> {
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let a_bc = if a.shape() == shape.as_slice() {
        a.clone()
    } else {
        a.broadcast(&shape)?
    };
    let b_bc = if b.shape() == shape.as_slice() {
        b.clone()
    } else {
        b.broadcast(&shape)?
    };
    let out = NdView::zeros(&shape);
    let out_buf = out.buffer();
    let a_buf = a_bc.buffer();
    let b_buf = b_bc.buffer();
    let mut i = 0usize;
    traverse2(
        &shape,
        a_bc.strides(),
        a_bc.offset(),
        b_bc.strides(),
        b_bc.offset(),
        |a_idx, b_idx| {
            out_buf.set(i, op(a_buf.get(a_idx), b_buf.get(b_idx)));
            i += 1;
        },
    );
    Ok(out)
}

// ============================================================================
// Element-wise binary kernels
// ============================================================================

/// Element-wise `a + b` with broadcasting.
pub fn ewise_add<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    zip_kernel(a, b, |x, y| x + y)
}

/// Element-wise `a - b` with broadcasting.
pub fn ewise_sub<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    zip_kernel(a, b, |x, y| x - y)
}

/// Element-wise `a * b` with broadcasting.
pub fn ewise_mul<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    zip_kernel(a, b, |x, y| x * y)
}

/// Element-wise `a / b` with broadcasting.
pub fn ewise_div<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    zip_kernel(a, b, |x, y| x / y)
}

/// Element-wise `a ^ b` with broadcasting.
pub fn ewise_pow<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    zip_kernel(a, b, |x, y| x.powf(y))
}

// ============================================================================
// Scalar binary kernels
// ============================================================================

/// `a + s` element-wise.
pub fn scalar_add<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| x + s)
}

/// `a - s` element-wise.
pub fn scalar_sub<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| x - s)
}

/// `s - a` element-wise (reversed operands).
pub fn scalar_rsub<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| s - x)
}

/// `a * s` element-wise.
pub fn scalar_mul<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| x * s)
}

/// `a / s` element-wise.
pub fn scalar_div<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| x / s)
}

/// `s / a` element-wise (reversed operands).
pub fn scalar_rdiv<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| s / x)
}

/// `a ^ s` element-wise.
pub fn scalar_pow<T: Element>(a: &NdView<T>, s: T) -> NdView<T> {
    map_kernel(a, |x| x.powf(s))
}

// ============================================================================
// Unary kernels and slice assignment
// ============================================================================

impl<T: Element> NdView<T> {
    /// Element-wise negation.
    pub fn neg(&self) -> NdView<T> {
        map_kernel(self, |x| -x)
    }

    /// Element-wise exponential.
    pub fn exp(&self) -> NdView<T> {
        map_kernel(self, |x| x.exp())
    }

    /// Element-wise natural logarithm.
    pub fn ln(&self) -> NdView<T> {
        map_kernel(self, |x| x.ln())
    }

    /// Element-wise square root.
    pub fn sqrt(&self) -> NdView<T> {
        map_kernel(self, |x| x.sqrt())
    }

    /// Element-wise sine.
    pub fn sin(&self) -> NdView<T> {
        map_kernel(self, |x| x.sin())
    }

    /// Element-wise cosine.
    pub fn cos(&self) -> NdView<T> {
        map_kernel(self, |x| x.cos())
    }

    /// Element-wise hyperbolic tangent.
    pub fn tanh(&self) -> NdView<T> {
        map_kernel(self, |x| x.tanh())
    }

    /// Check slice specifiers against this view's shape.
    ///
    /// The mutating operations call this before touching any element, so a
    /// failed call leaves the buffer untouched.
    fn validate_specs(&self, specs: &[AxisSlice]) -> Result<()> {
        if specs.len() > self.rank() {
            return Err(NdError::RankMismatch(specs.len(), self.rank()));
        }
        for (axis, spec) in specs.iter().enumerate() {
            let dim = self.shape()[axis];
            match *spec {
                AxisSlice::Index(i) => {
                    if i >= dim {
                        return Err(NdError::OutOfBounds { index: i, len: dim });
                    }
                }
                AxisSlice::Range { start, stop, step } => {
                    if step == 0 {
                        return Err(NdError::ZeroStep);
                    }
                    if start > stop || stop > dim {
                        return Err(NdError::OutOfBounds {
                            index: start.max(stop),
                            len: dim,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Write `value` into the region selected by `specs`.
    ///
    /// This mutates the shared buffer in place; every aliasing view observes
    /// the write.
    pub fn fill(&self, specs: &[AxisSlice], value: T) -> Result<()> {
        self.validate_specs(specs)?;
        let target = self.slice(specs);
        let buf = target.buffer();
        traverse(target.shape(), target.strides(), target.offset(), |idx| {
            buf.set(idx, value)
        });
        Ok(())
    }

    /// Copy `source` into the region selected by `specs`, broadcasting it to
    /// the region's shape when needed.
    ///
    /// The copy is element-by-element through both views' strides; when
    /// `source` aliases this view's buffer the caller must ensure the regions
    /// do not overlap destructively (or compact the source first).
    pub fn assign(&self, specs: &[AxisSlice], source: &NdView<T>) -> Result<()> {
        self.validate_specs(specs)?;
        let target = self.slice(specs);
        let src = if source.shape() == target.shape() {
            source.clone()
        } else {
            source.broadcast(target.shape())?
        };
        let dst_buf = target.buffer();
        let src_buf = src.buffer();
        traverse2(
            target.shape(),
            target.strides(),
            target.offset(),
            src.strides(),
            src.offset(),
            |dst_idx, src_idx| dst_buf.set(dst_idx, src_buf.get(src_idx)),
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn iota(shape: &[usize]) -> NdView<f32> {
        let mut n = 0.0f32;
        NdView::from_fn(shape, |_| {
            n += 1.0;
            n
        })
    }

    #[test]
    fn test_ewise_add_same_shape() {
        let a = iota(&[2, 3]);
        let b = scalar_mul(&a, 10.0);
        let c = ewise_add(&a, &b).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.to_flat(), vec![11.0, 22.0, 33.0, 44.0, 55.0, 66.0]);
    }

    #[test]
    fn test_ewise_add_broadcasts_row() {
        let a = NdView::<f32>::from_flat(vec![1.0, 2.0, 3.0]);
        let b =
            NdView::<f32>::from_data(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0], &[2, 3]).unwrap();
        let c = ewise_add(&a, &b).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.to_flat(), vec![11.0, 22.0, 33.0, 41.0, 52.0, 63.0]);
    }

    #[test]
    fn test_ewise_incompatible_shapes() {
        let a = NdView::<f32>::zeros(&[2, 3]);
        let b = NdView::<f32>::zeros(&[4]);
        assert!(matches!(
            ewise_add(&a, &b).unwrap_err(),
            NdError::ShapeMismatch(..)
        ));
    }

    #[test]
    fn test_ewise_sub_mul_div_pow() {
        let a = NdView::<f32>::from_flat(vec![2.0, 4.0, 8.0]);
        let b = NdView::<f32>::from_flat(vec![1.0, 2.0, 2.0]);
        assert_eq!(ewise_sub(&a, &b).unwrap().to_flat(), vec![1.0, 2.0, 6.0]);
        assert_eq!(ewise_mul(&a, &b).unwrap().to_flat(), vec![2.0, 8.0, 16.0]);
        assert_eq!(ewise_div(&a, &b).unwrap().to_flat(), vec![2.0, 2.0, 4.0]);
        assert_eq!(ewise_pow(&a, &b).unwrap().to_flat(), vec![2.0, 16.0, 64.0]);
    }

    #[test]
    fn test_ewise_output_is_compact() {
        let a = iota(&[2, 3]);
        let t = a.transpose(&[1, 0]).unwrap();
        let c = ewise_mul(&t, &t).unwrap();
        assert_eq!(c.offset(), 0);
        assert_eq!(c.strides(), &[2, 1]);
    }

    #[test]
    fn test_scalar_ops() {
        let a = NdView::<f32>::from_flat(vec![1.0, 2.0, 4.0]);
        assert_eq!(scalar_add(&a, 1.0).to_flat(), vec![2.0, 3.0, 5.0]);
        assert_eq!(scalar_sub(&a, 1.0).to_flat(), vec![0.0, 1.0, 3.0]);
        assert_eq!(scalar_rsub(&a, 10.0).to_flat(), vec![9.0, 8.0, 6.0]);
        assert_eq!(scalar_mul(&a, 3.0).to_flat(), vec![3.0, 6.0, 12.0]);
        assert_eq!(scalar_div(&a, 2.0).to_flat(), vec![0.5, 1.0, 2.0]);
        assert_eq!(scalar_rdiv(&a, 8.0).to_flat(), vec![8.0, 4.0, 2.0]);
        assert_eq!(scalar_pow(&a, 2.0).to_flat(), vec![1.0, 4.0, 16.0]);
    }

    #[test]
    fn test_scalar_op_on_strided_input() {
        let a = iota(&[2, 3]);
        let t = a.transpose(&[1, 0]).unwrap();
        // Kernel on the view equals kernel on its compacted copy.
        let direct = scalar_mul(&t, 2.0);
        let compacted = scalar_mul(&t.make_compact(), 2.0);
        assert_eq!(direct.to_flat(), compacted.to_flat());
        assert_eq!(direct.to_flat(), vec![2.0, 8.0, 4.0, 10.0, 6.0, 12.0]);
    }

    #[test]
    fn test_unary_ops() {
        let a = NdView::<f32>::from_flat(vec![0.0, 1.0, 4.0]);
        assert_eq!(a.neg().to_flat(), vec![0.0, -1.0, -4.0]);
        assert_eq!(a.sqrt().to_flat(), vec![0.0, 1.0, 2.0]);
        let e = a.exp().to_flat();
        assert_relative_eq!(e[1], std::f32::consts::E, epsilon = 1e-5);
        let l = a.exp().ln().to_flat();
        for (got, want) in l.iter().zip([0.0f32, 1.0, 4.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-5);
        }
        assert_relative_eq!(a.sin().to_flat()[0], 0.0);
        assert_relative_eq!(a.cos().to_flat()[0], 1.0);
        assert_relative_eq!(a.tanh().to_flat()[0], 0.0);
    }

    #[test]
    fn test_unary_commutes_with_compaction() {
        let a = iota(&[3, 4]);
        let s = a.slice(&[AxisSlice::step_by(0, 3, 2), AxisSlice::to(1, 4)]);
        assert_eq!(s.neg().to_flat(), s.make_compact().neg().to_flat());
    }

    #[test]
    fn test_fill_region() {
        let v = NdView::<f32>::zeros(&[2, 3]);
        v.fill(&[AxisSlice::to(0, 2), AxisSlice::to(1, 3)], 7.0).unwrap();
        assert_eq!(v.to_flat(), vec![0.0, 7.0, 7.0, 0.0, 7.0, 7.0]);
    }

    #[test]
    fn test_fill_visible_through_aliases() {
        let v = iota(&[2, 3]);
        let t = v.transpose(&[1, 0]).unwrap();
        v.fill(&[AxisSlice::Index(0)], 0.0).unwrap();
        // First row of v is column 0 of t.
        assert_eq!(t.to_flat(), vec![0.0, 4.0, 0.0, 5.0, 0.0, 6.0]);
    }

    #[test]
    fn test_fill_validation_failures() {
        let v = NdView::<f32>::zeros(&[2, 3]);
        assert!(matches!(
            v.fill(&[AxisSlice::Index(2)], 1.0).unwrap_err(),
            NdError::OutOfBounds { index: 2, len: 2 }
        ));
        assert!(matches!(
            v.fill(&[AxisSlice::to(0, 4)], 1.0).unwrap_err(),
            NdError::OutOfBounds { index: 4, len: 2 }
        ));
        assert!(matches!(
            v.fill(&[AxisSlice::step_by(0, 2, 0)], 1.0).unwrap_err(),
            NdError::ZeroStep
        ));
        assert!(matches!(
            v.fill(&[AxisSlice::Index(0); 3], 1.0).unwrap_err(),
            NdError::RankMismatch(3, 2)
        ));
        // Nothing was written by any failed call.
        assert_eq!(v.to_flat(), vec![0.0; 6]);
    }

    #[test]
    fn test_assign_same_shape() {
        let v = NdView::<f32>::zeros(&[3, 3]);
        let src = NdView::<f32>::from_data(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        v.assign(&[AxisSlice::to(1, 3), AxisSlice::to(0, 2)], &src)
            .unwrap();
        assert_eq!(
            v.to_flat(),
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0]
        );
    }

    #[test]
    fn test_assign_broadcasts_source() {
        let v = NdView::<f32>::zeros(&[2, 3]);
        let row = NdView::<f32>::from_flat(vec![1.0, 2.0, 3.0]);
        v.assign(&[AxisSlice::to(0, 2)], &row).unwrap();
        assert_eq!(v.to_flat(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_assign_incompatible_source() {
        let v = NdView::<f32>::zeros(&[2, 3]);
        let bad = NdView::<f32>::from_flat(vec![1.0, 2.0]);
        assert!(ewise_add(&v, &bad).is_err());
        assert!(v.assign(&[AxisSlice::to(0, 2)], &bad).is_err());
        assert_eq!(v.to_flat(), vec![0.0; 6]);
    }

    #[test]
    fn test_assign_strided_target() {
        let v = NdView::<f32>::zeros(&[2, 4]);
        let src = NdView::<f32>::from_data(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        // Every other column.
        v.assign(
            &[AxisSlice::to(0, 2), AxisSlice::step_by(0, 4, 2)],
            &src,
        )
        .unwrap();
        assert_eq!(v.to_flat(), vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0, 4.0, 0.0]);
    }
}

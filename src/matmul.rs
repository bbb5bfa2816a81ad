//! Batched matrix multiplication on strided views.
//!
//! Batch axes broadcast against each other like any element-wise operand
//! pair. Each batch coordinate selects an `M x K` slab of A and a `K x P`
//! slab of B; slabs must be row-major in their last two axes, so operands
//! whose trailing axes are strided get compacted first. The output's slabs
//! are laid out back to back, so its slab offset is just the batch counter
//! times `M * P`.

use crate::buffer::Buffer;
use crate::kernel::traverse2;
use crate::view::{broadcast_shape, NdView};
use crate::{Element, NdError, Result};

/// Whether the last two axes form a row-major slab (inner stride 1, outer
/// stride equal to the inner axis length).
fn slab_is_row_major<T: Element>(v: &NdView<T>) -> bool {
    let rank = v.rank();
    let strides = v.strides();
    strides[rank - 1] == 1 && strides[rank - 2] == v.shape()[rank - 1]
}

/// One `C[i, j] += A[i, k] * B[k, j]` slab product over row-major slabs.
///
/// The i-k-j loop order loads each `A[i, k]` once and streams the matching
/// B row into the C row sequentially.
fn gemm_slab<T: Element>(
    a_buf: &Buffer<T>,
    a_base: usize,
    b_buf: &Buffer<T>,
    b_base: usize,
    c_buf: &Buffer<T>,
    c_base: usize,
    m: usize,
    k: usize,
    p: usize,
) {
    for i in 0..m {
        let c_row = c_base + i * p;
        for kk in 0..k {
            let a_val = a_buf.get(a_base + i * k + kk);
            let b_row = b_base + kk * p;
            for j in 0..p {
                let c_idx = c_row + j;
                c_buf.set(c_idx, c_buf.get(c_idx) + a_val * b_buf.get(b_row + j));
            }
        }
    }
}

/// Batched matrix product of `A: [..., M, K]` and `B: [..., K, P]`.
///
/// The leading batch axes broadcast against each other; the result has shape
/// `batch + [M, P]`. Fails when either operand has rank < 2, the inner axes
/// disagree, or the batch axes cannot broadcast.
pub fn matmul<T: Element>(a: &NdView<T>, b: &NdView<T>) -> Result<NdView<T>> {
    if a.rank() < 2 {
        return Err(NdError::RankMismatch(a.rank(), 2));
    }
    if b.rank() < 2 {
        return Err(NdError::RankMismatch(b.rank(), 2));
    }
    let (m, k) = (a.shape()[a.rank() - 2], a.shape()[a.rank() - 1]);
    let (k2, p) = (b.shape()[b.rank() - 2], b.shape()[b.rank() - 1]);
    if k != k2 {
        return Err(NdError::ShapeMismatch(
            a.shape().to_vec(),
            b.shape().to_vec(),
        ));
    }

    let batch = broadcast_shape(
        &a.shape()[..a.rank() - 2],
        &b.shape()[..b.rank() - 2],
    )?;

    let mut a_target = batch.clone();
    a_target.extend([m, k]);
    let mut b_target = batch.clone();
    b_target.extend([k, p]);
    let a_bc = a.broadcast(&a_target)?;
    let b_bc = b.broadcast(&b_target)?;

    // The slab kernel assumes row-major trailing axes; batch strides may be
    // anything (zero included).
    let a_bc = if slab_is_row_major(&a_bc) {
        a_bc
    } else {
        a_bc.make_compact()
    };
    let b_bc = if slab_is_row_major(&b_bc) {
        b_bc
    } else {
        b_bc.make_compact()
    };

    let mut out_shape = batch.clone();
    out_shape.extend([m, p]);
    let out = NdView::zeros(&out_shape);

    let a_batch_strides = &a_bc.strides()[..batch.len()];
    let b_batch_strides = &b_bc.strides()[..batch.len()];
    let a_buf = a_bc.buffer();
    let b_buf = b_bc.buffer();
    let out_buf = out.buffer();

    let mut slab = 0usize;
    traverse2(
        &batch,
        a_batch_strides,
        a_bc.offset(),
        b_batch_strides,
        b_bc.offset(),
        |a_base, b_base| {
            gemm_slab(a_buf, a_base, b_buf, b_base, out_buf, slab * m * p, m, k, p);
            slab += 1;
        },
    );
    Ok(out)
}

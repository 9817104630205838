//! Large-integer multiplication: [`mpn_mul`].
//!
//! Operands and the result are little-endian arrays of 32-bit digits (this
//! crate's stand-in for GMP's native 64-bit limbs — see `DESIGN.md`).
//! Multiplication runs one independent NTT pipeline per prime lane, fanned
//! out over [`crate::threadpool`], then recombines per-coefficient residues
//! with [`CrtData::reconstruct`] and folds the result into the final
//! limb array with carry propagation.

use crate::engine::{buffer::AlignedF64, vec as fvec, Engine};
use crate::mpn_ctx::MpnCtx;
use crate::nmod;
use crate::profile;

/// Computes the exact product of two little-endian, base-`2^32` digit
/// arrays.
///
/// `ctx` must have enough primes for the operand sizes (see
/// [`profile::choose_np`]); if it doesn't, the result is still computed
/// but is only correct when the true product's per-coefficient convolution
/// sums fit under the product of `ctx`'s primes — callers that don't know
/// their sizes in advance should build `ctx` with
/// `MpnCtx::new(profile::choose_np(32, a.len() + b.len() - 1))` primes.
pub fn mpn_mul<E: Engine + Sync>(ctx: &MpnCtx<E>, a: &[u32], b: &[u32]) -> Vec<u32> {
    if a.is_empty() || b.is_empty() {
        return vec![0];
    }

    let conv_len = a.len() + b.len() - 1;
    let n = conv_len.next_power_of_two().max(1);
    let l = n.trailing_zeros();
    ctx.fit_depth(l);

    let np = ctx.primes.len();
    debug_assert!(
        np >= profile::choose_np(32, conv_len),
        "ctx does not carry enough primes for a convolution of this length"
    );

    let per_prime: Vec<AlignedF64> = crate::threadpool::map_each(np, |i| {
        let p = &ctx.ctxs[i];
        let mut abuf = AlignedF64::zeroed(n);
        let mut bbuf = AlignedF64::zeroed(n);
        for (dst, &src) in abuf.as_slice_mut().iter_mut().zip(a.iter()) {
            *dst = src as f64;
        }
        for (dst, &src) in bbuf.as_slice_mut().iter_mut().zip(b.iter()) {
            *dst = src as f64;
        }

        let n_inv = crate::engine::tables::mulmod_pow((n as u64) % p.prime(), p.prime() - 2, p.prime());
        let scaling = n_inv as f64;

        ctx.engine.mul_trunc(p, abuf.as_slice_mut(), bbuf.as_slice_mut(), l, n, n, scaling);
        abuf
    });

    let mut result: Vec<u32> = vec![0u32];
    for k in 0..conv_len {
        let residues: Vec<u64> = (0..np)
            .map(|i| fvec::reduce_to_0n(per_prime[i][k], ctx.ctxs[i].p(), ctx.ctxs[i].pinv()) as u64)
            .collect();
        let digit_limbs = ctx.crt.reconstruct(&residues);
        add_limbs_at_offset(&mut result, &digit_limbs, k);
    }
    nmod::normalize(&mut result);
    result
}

/// `result += limbs << (32 * offset)`, growing `result` as needed.
fn add_limbs_at_offset(result: &mut Vec<u32>, limbs: &[u32], offset: usize) {
    let needed = offset + limbs.len();
    if result.len() < needed {
        result.resize(needed, 0);
    }
    let mut carry = 0u64;
    for (i, &limb) in limbs.iter().enumerate() {
        let s = result[offset + i] as u64 + limb as u64 + carry;
        result[offset + i] = s as u32;
        carry = s >> 32;
    }
    let mut i = offset + limbs.len();
    while carry != 0 {
        if i == result.len() {
            result.push(0);
        }
        let s = result[i] as u64 + carry;
        result[i] = s as u32;
        carry = s >> 32;
        i += 1;
    }
}

// ======================================================================
// TESTS

//! Portable truncated NTT tier: the recursive Cooley-Tukey split in
//! [`super::transform`], with no explicit SIMD. This is
//! [`super::DefaultEngine`]'s fallback tier and the one every other tier is
//! checked against.

use super::fft_ctx::FftCtx;
use super::transform::transform_trunc;
use super::vec;
use super::Engine;

#[derive(Clone, Copy, Default)]
pub struct NoSimd;

impl Engine for NoSimd {
    fn fft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, i_trunc: usize, o_trunc: usize) {
        let n = 1usize << l;
        debug_assert!(i_trunc <= n && o_trunc <= n);
        let y = transform_trunc(ctx, &data[..i_trunc], n, l, i_trunc, o_trunc, false);
        data[..o_trunc].copy_from_slice(&y);
    }

    fn ifft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, trunc: usize) {
        let n = 1usize << l;
        assert_eq!(trunc, n, "this engine requires the inverse truncation to equal the full transform size");
        let y = transform_trunc(ctx, &data[..n], n, l, n, n, true);
        data[..n].copy_from_slice(&y);
    }

    fn point_mul(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64) {
        debug_assert_eq!(a.len(), b.len());
        let p = ctx.p();
        let pinv = ctx.pinv();
        for i in 0..a.len() {
            let t = vec::mulmod(a[i], b[i], p, pinv);
            a[i] = vec::mulmod(t, scaling, p, pinv);
        }
    }

    fn point_sqr(&self, ctx: &FftCtx, a: &mut [f64], scaling: f64) {
        let p = ctx.p();
        let pinv = ctx.pinv();
        for x in a.iter_mut() {
            let t = vec::mulmod(*x, *x, p, pinv);
            *x = vec::mulmod(t, scaling, p, pinv);
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine_naive::Naive;
    use crate::engine::tables::next_fft_number;

    #[test]
    fn nosimd_matches_naive_forward_and_inverse() {
        let p = next_fft_number(1 << 14);
        let ctx = FftCtx::init_prime(p).unwrap();
        let l = 6u32;
        let n = 1usize << l;
        let data: Vec<f64> = (0..n).map(|i| (i * 5 + 2) as f64).collect();

        let mut a = data.clone();
        let mut b = data.clone();
        NoSimd.fft_trunc(&ctx, &mut a, l, n, n);
        Naive.fft_trunc(&ctx, &mut b, l, n, n);
        for i in 0..n {
            assert_eq!(
                vec::reduce_to_0n(a[i], ctx.p(), ctx.pinv()),
                vec::reduce_to_0n(b[i], ctx.p(), ctx.pinv()),
                "i={i}"
            );
        }

        NoSimd.ifft_trunc(&ctx, &mut a, l, n);
        Naive.ifft_trunc(&ctx, &mut b, l, n);
        for i in 0..n {
            assert_eq!(
                vec::reduce_to_0n(a[i], ctx.p(), ctx.pinv()),
                vec::reduce_to_0n(b[i], ctx.p(), ctx.pinv()),
                "i={i}"
            );
        }
    }

    #[test]
    fn point_mul_scaling_divides_out_transform_length() {
        let p = next_fft_number(1 << 14);
        let ctx = FftCtx::init_prime(p).unwrap();
        let l = 5u32;
        let n = 1usize << l;

        let a_coeffs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b_coeffs = vec![1.0f64; n]; // multiplicative identity poly under wrap-conv, scaled test

        let mut a = a_coeffs.clone();
        let mut b = b_coeffs.clone();
        NoSimd.fft_trunc(&ctx, &mut a, l, n, n);
        NoSimd.fft_trunc(&ctx, &mut b, l, n, n);

        // scaling = n^{-1} mod p undoes the ifft's 2^l = n scale-up, leaving
        // the exact cyclic convolution.
        let n_u64 = n as u64;
        let n_inv = super::super::tables::mulmod_pow(n_u64 % p, p - 2, p);
        let scaling = n_inv as f64;

        NoSimd.point_mul(&ctx, &mut a, &b, scaling);
        NoSimd.ifft_trunc(&ctx, &mut a, l, n);

        // a[i] should now equal schoolbook-convolution-like result scaled
        // consistently; spot check index 0 against direct computation.
        let expect0 = a_coeffs.iter().sum::<f64>();
        let expect0 = vec::reduce_to_0n(expect0, ctx.p(), ctx.pinv());
        let got0 = vec::reduce_to_0n(a[0], ctx.p(), ctx.pinv());
        assert_eq!(got0, expect0);
    }
}

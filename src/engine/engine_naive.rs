//! Scalar reference tier: direct Horner evaluation, `O(i_trunc * o_trunc)`.
//!
//! Deliberately a *different* algorithm from [`super::engine_nosimd`]'s
//! recursive Cooley-Tukey split, so the two can cross-check each other in
//! tests without sharing a bug. Never the tier [`super::DefaultEngine`]
//! picks; kept around purely as ground truth.

use super::fft_ctx::FftCtx;
use super::transform::principal_root;
use super::vec;
use super::Engine;

#[derive(Clone, Copy, Default)]
pub struct Naive;

impl Naive {
    fn root_pow(ctx: &FftCtx, l: u32, k: usize) -> f64 {
        let w = principal_root(ctx, l);
        let p = ctx.p();
        let pinv = ctx.pinv();
        let mut acc = 1.0;
        for _ in 0..k {
            acc = vec::mulmod_pmhn(acc, w, p, pinv);
        }
        acc
    }

    fn inverse_root_pow(ctx: &FftCtx, l: u32, k: usize) -> f64 {
        let p = ctx.prime();
        let w = Self::root_pow(ctx, l, 1);
        let w_int = if w < 0.0 { (w as i64 + p as i64) as u64 } else { w as u64 };
        let winv = super::tables::mulmod_pow(w_int, p - 2, p);
        let winv_f = if winv > p / 2 { (winv as i64 - p as i64) as f64 } else { winv as f64 };
        let pinv = ctx.pinv();
        let mut acc = 1.0;
        for _ in 0..k {
            acc = vec::mulmod_pmhn(acc, winv_f, ctx.p(), pinv);
        }
        acc
    }
}

impl Engine for Naive {
    fn fft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, i_trunc: usize, o_trunc: usize) {
        let p = ctx.p();
        let pinv = ctx.pinv();
        let mut out = vec![0.0f64; o_trunc];
        for k in 0..o_trunc {
            let wk = Self::root_pow(ctx, l, k);
            let mut acc = 0.0;
            let mut wi = 1.0;
            for j in 0..i_trunc {
                acc = vec::reduce_to_pm1n(acc + vec::mulmod(data[j], wi, p, pinv), p, pinv);
                wi = vec::mulmod_pmhn(wi, wk, p, pinv);
            }
            out[k] = acc;
        }
        data[..o_trunc].copy_from_slice(&out);
    }

    fn ifft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, trunc: usize) {
        debug_assert_eq!(trunc, 1usize << l, "Naive only supports the full inverse");
        let n = trunc;
        let p = ctx.p();
        let pinv = ctx.pinv();
        let mut out = vec![0.0f64; n];
        for i in 0..n {
            let wk = Self::inverse_root_pow(ctx, l, i);
            let mut acc = 0.0;
            let mut wi = 1.0;
            for j in 0..n {
                acc = vec::reduce_to_pm1n(acc + vec::mulmod(data[j], wi, p, pinv), p, pinv);
                wi = vec::mulmod_pmhn(wi, wk, p, pinv);
            }
            out[i] = acc;
        }
        data[..n].copy_from_slice(&out);
    }

    fn point_mul(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64) {
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

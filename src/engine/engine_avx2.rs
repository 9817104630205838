//! AVX2+FMA-accelerated [`Engine`] tier.
//!
//! A thin wrapper that reuses the portable tier for the recursive butterfly
//! structure and only hand-vectorizes the embarrassingly-parallel, stride-1
//! loops: this crate's butterflies recurse over varying strides and regroup
//! in a different order at every level, so only [`Engine::point_mul`] and
//! [`Engine::point_sqr`] are accelerated here — `fft_trunc`/`ifft_trunc`
//! fall through to [`super::engine_nosimd::NoSimd`]. See `DESIGN.md` for why
//! this narrower scope was chosen over vectorizing the recursion itself.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::engine_nosimd::NoSimd;
use super::fft_ctx::FftCtx;
use super::vec;
use super::Engine;

// ======================================================================
// Avx2 - PUBLIC

/// [`Engine`] tier that accelerates pointwise multiplication with AVX2+FMA
/// intrinsics; everything else delegates to [`NoSimd`].
#[derive(Clone, Copy, Debug)]
pub struct Avx2 {
    _private: (),
}

impl Avx2 {
    /// Detects AVX2+FMA at runtime, returning `None` if either is absent.
    pub fn detect() -> Option<Self> {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

impl Engine for Avx2 {
    fn fft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, i_trunc: usize, o_trunc: usize) {
        NoSimd.fft_trunc(ctx, data, l, i_trunc, o_trunc);
    }

    fn ifft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, trunc: usize) {
        NoSimd.ifft_trunc(ctx, data, l, trunc);
    }

    fn point_mul(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64) {
        debug_assert_eq!(a.len(), b.len());
        unsafe {
            self.point_mul_avx2(ctx, a, b, scaling);
        }
    }

    fn point_sqr(&self, ctx: &FftCtx, a: &mut [f64], scaling: f64) {
        unsafe {
            self.point_sqr_avx2(ctx, a, scaling);
        }
    }
}

// ======================================================================
// Avx2 - PRIVATE

impl Avx2 {
    #[target_feature(enable = "avx2,fma")]
    unsafe fn point_mul_avx2(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64) {
        let p = ctx.p();
        let pinv = ctx.pinv();
        let chunks = a.len() / 4;

        let vp = _mm256_set1_pd(p);
        let vpinv = _mm256_set1_pd(pinv);
        let vscaling = _mm256_set1_pd(scaling);

        for i in 0..chunks {
            let off = i * 4;
            let va = _mm256_loadu_pd(a.as_ptr().add(off));
            let vb = _mm256_loadu_pd(b.as_ptr().add(off));
            let t = mulmod_x4(va, vb, vp, vpinv);
            let r = mulmod_x4(t, vscaling, vp, vpinv);
            _mm256_storeu_pd(a.as_mut_ptr().add(off), r);
        }

        for i in (chunks * 4)..a.len() {
            let t = vec::mulmod(a[i], b[i], p, pinv);
            a[i] = vec::mulmod(t, scaling, p, pinv);
        }
    }

    #[target_feature(enable = "avx2,fma")]
    unsafe fn point_sqr_avx2(&self, ctx: &FftCtx, a: &mut [f64], scaling: f64) {
        let p = ctx.p();
        let pinv = ctx.pinv();
        let chunks = a.len() / 4;

        let vp = _mm256_set1_pd(p);
        let vpinv = _mm256_set1_pd(pinv);
        let vscaling = _mm256_set1_pd(scaling);

        for i in 0..chunks {
            let off = i * 4;
            let va = _mm256_loadu_pd(a.as_ptr().add(off));
            let t = mulmod_x4(va, va, vp, vpinv);
            let r = mulmod_x4(t, vscaling, vp, vpinv);
            _mm256_storeu_pd(a.as_mut_ptr().add(off), r);
        }

        for i in (chunks * 4)..a.len() {
            let t = vec::mulmod(a[i], a[i], p, pinv);
            a[i] = vec::mulmod(t, scaling, p, pinv);
        }
    }
}

/// Four-lane `a*b mod n`, the vectorized form of [`vec::mulmod`]: the same
/// "round the quotient, then one fma computes the exact remainder" trick,
/// one lane per `f64` in the vector.
#[target_feature(enable = "avx2,fma")]
unsafe fn mulmod_x4(a: __m256d, b: __m256d, n: __m256d, ninv: __m256d) -> __m256d {
    let prod_approx = _mm256_mul_pd(a, b);
    let q = _mm256_round_pd(
        _mm256_mul_pd(prod_approx, ninv),
        _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC,
    );
    // a*b - q*n, computed as one correctly-rounded fma (q*n subtracted via
    // its negation) so the result matches the scalar `a.mul_add(b, -(q*n))`.
    let neg_qn = _mm256_sub_pd(_mm256_setzero_pd(), _mm256_mul_pd(q, n));
    _mm256_fmadd_pd(a, b, neg_qn)
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tables::next_fft_number;

    #[test]
    fn avx2_point_mul_matches_nosimd_when_available() {
        let Some(avx2) = Avx2::detect() else { return };
        let p = next_fft_number(1 << 20);
        let ctx = FftCtx::init_prime(p).unwrap();

        let a_coeffs: Vec<f64> = (0..37).map(|i| (i * 31 + 5) as f64).collect();
        let b_coeffs: Vec<f64> = (0..37).map(|i| (i * 17 + 2) as f64).collect();
        let scaling = 12345.0f64;

        let mut a1 = a_coeffs.clone();
        let mut a2 = a_coeffs.clone();
        NoSimd.point_mul(&ctx, &mut a1, &b_coeffs, scaling);
        avx2.point_mul(&ctx, &mut a2, &b_coeffs, scaling);

        for i in 0..a1.len() {
            assert_eq!(
                vec::reduce_to_0n(a1[i], ctx.p(), ctx.pinv()),
                vec::reduce_to_0n(a2[i], ctx.p(), ctx.pinv()),
                "i={i}"
            );
        }
    }

    #[test]
    fn avx2_point_sqr_matches_nosimd_when_available() {
        let Some(avx2) = Avx2::detect() else { return };
        let p = next_fft_number(1 << 20);
        let ctx = FftCtx::init_prime(p).unwrap();

        let a_coeffs: Vec<f64> = (0..21).map(|i| (i * 13 + 1) as f64).collect();
        let scaling = 777.0f64;

        let mut a1 = a_coeffs.clone();
        let mut a2 = a_coeffs.clone();
        NoSimd.point_sqr(&ctx, &mut a1, scaling);
        avx2.point_sqr(&ctx, &mut a2, scaling);

        for i in 0..a1.len() {
            assert_eq!(
                vec::reduce_to_0n(a1[i], ctx.p(), ctx.pinv()),
                vec::reduce_to_0n(a2[i], ctx.p(), ctx.pinv()),
                "i={i}"
            );
        }
    }
}

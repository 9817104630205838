//! The low-level transform: [`Engine`] plus the tiers that implement it.
//!
//! A handful of required methods an ISA-specific tier must provide, plus
//! default-provided convenience methods built from them, so that
//! [`crate::mpn_mul`] and [`crate::polymul`] can be written once against the
//! trait and pick whichever concrete tier [`crate::DefaultEngine`] resolves
//! to.

pub mod buffer;
pub mod engine_naive;
pub mod engine_nosimd;
pub mod fft_ctx;
pub mod tables;
pub mod transform;
pub mod vec;

#[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
pub mod engine_avx2;

use fft_ctx::FftCtx;

// ======================================================================
// Engine - PUBLIC

/// One truncated-NTT implementation tier.
///
/// Every method operates on a single prime's lane, addressed by the
/// [`FftCtx`] passed in; `data` always has length `2^l` and is already
/// aligned (see [`buffer::AlignedF64`]) when it backs a real transform
/// buffer, though plain `&mut [f64]` slices are accepted for testing.
pub trait Engine: Clone {
    /// Evaluates the length-`i_trunc` polynomial in `data[..i_trunc]`
    /// (trailing entries up to `2^l` are treated as zero) at the first
    /// `o_trunc` of the `2^l`-th roots of unity, writing the results back
    /// into `data[..o_trunc]`.
    fn fft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, i_trunc: usize, o_trunc: usize);

    /// The unnormalized inverse: requires `trunc == 2^l` (see
    /// `engine::transform` for why this crate does not implement the fully
    /// general truncated inverse). On return, `data[i]` holds
    /// `2^l * X[i] mod p`.
    fn ifft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, trunc: usize);

    /// `a[i] *= b[i] * scaling` for every lane, mod `ctx.prime()`.
    fn point_mul(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64);

    /// `a[i] *= a[i] * scaling` for every lane, mod `ctx.prime()`.
    fn point_sqr(&self, ctx: &FftCtx, a: &mut [f64], scaling: f64);

    /// Transforms `a` and `b` in place (overwriting both with their forward
    /// transforms), pointwise-multiplies them with the given `scaling`, and
    /// inverse-transforms the product back into `a`. `a` and `b` must both
    /// have length `2^l`.
    ///
    /// This is the convenience entry point [`crate::mpn_mul`] and
    /// [`crate::polymul`] actually call per prime lane.
    fn mul_trunc(
        &self,
        ctx: &FftCtx,
        a: &mut [f64],
        b: &mut [f64],
        l: u32,
        i_trunc: usize,
        z_trunc: usize,
        scaling: f64,
    ) {
        self.fft_trunc(ctx, a, l, i_trunc, z_trunc);
        self.fft_trunc(ctx, b, l, i_trunc, z_trunc);
        self.point_mul(ctx, &mut a[..z_trunc], &b[..z_trunc], scaling);
        a[z_trunc..].fill(0.0);
        self.ifft_trunc(ctx, a, l, 1usize << l);
    }

    /// Same as [`Self::mul_trunc`] but squares `a` against itself, used by
    /// [`crate::polymul::poly_mul_mod_xpnm1`]'s self-convolution fast path.
    fn sqr_trunc(&self, ctx: &FftCtx, a: &mut [f64], l: u32, i_trunc: usize, z_trunc: usize, scaling: f64) {
        self.fft_trunc(ctx, a, l, i_trunc, z_trunc);
        self.point_sqr(ctx, &mut a[..z_trunc], scaling);
        a[z_trunc..].fill(0.0);
        self.ifft_trunc(ctx, a, l, 1usize << l);
    }
}

/// The engine tier used when no caller-specified tier is requested: AVX2 on
/// `x86_64` when the `avx2` feature is enabled and the CPU supports it at
/// runtime, the portable [`engine_nosimd::NoSimd`] tier otherwise.
#[derive(Clone, Debug, Default)]
pub struct DefaultEngine {
    #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
    avx2: Option<engine_avx2::Avx2>,
}

impl DefaultEngine {
    pub fn new() -> Self {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        {
            Self { avx2: engine_avx2::Avx2::detect() }
        }
        #[cfg(not(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64"))))]
        {
            Self {}
        }
    }
}

impl Engine for DefaultEngine {
    fn fft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, i_trunc: usize, o_trunc: usize) {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        if let Some(avx2) = &self.avx2 {
            return avx2.fft_trunc(ctx, data, l, i_trunc, o_trunc);
        }
        engine_nosimd::NoSimd.fft_trunc(ctx, data, l, i_trunc, o_trunc)
    }

    fn ifft_trunc(&self, ctx: &FftCtx, data: &mut [f64], l: u32, trunc: usize) {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        if let Some(avx2) = &self.avx2 {
            return avx2.ifft_trunc(ctx, data, l, trunc);
        }
        engine_nosimd::NoSimd.ifft_trunc(ctx, data, l, trunc)
    }

    fn point_mul(&self, ctx: &FftCtx, a: &mut [f64], b: &[f64], scaling: f64) {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        if let Some(avx2) = &self.avx2 {
            return avx2.point_mul(ctx, a, b, scaling);
        }
        engine_nosimd::NoSimd.point_mul(ctx, a, b, scaling)
    }

    fn point_sqr(&self, ctx: &FftCtx, a: &mut [f64], scaling: f64) {
        #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
        if let Some(avx2) = &self.avx2 {
            return avx2.point_sqr(ctx, a, scaling);
        }
        engine_nosimd::NoSimd.point_sqr(ctx, a, scaling)
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FftCtx {
        let p = tables::next_fft_number(1 << 16);
        FftCtx::init_prime(p).unwrap()
    }

    #[test]
    fn default_engine_mul_trunc_matches_schoolbook() {
        let ctx = ctx();
        let engine = DefaultEngine::new();
        let l = 5u32;
        let n = 1usize << l;
        let deg = 6usize;

        let a_coeffs: Vec<f64> = (0..deg).map(|i| (i + 1) as f64).collect();
        let b_coeffs: Vec<f64> = (0..deg).map(|i| (2 * i + 1) as f64).collect();

        let mut a = vec![0.0f64; n];
        let mut b = vec![0.0f64; n];
        a[..deg].copy_from_slice(&a_coeffs);
        b[..deg].copy_from_slice(&b_coeffs);

        let z_trunc = n;
        engine.mul_trunc(&ctx, &mut a, &mut b, l, deg, z_trunc, 1.0);

        // schoolbook reference, then scale by n (unnormalized inverse).
        let mut want = vec![0.0f64; n];
        for i in 0..deg {
            for j in 0..deg {
                let idx = i + j;
                if idx < n {
                    want[idx] += a_coeffs[i] * b_coeffs[j];
                }
            }
        }

        for i in 0..n {
            let got = vec::reduce_to_0n(a[i], ctx.p(), ctx.pinv());
            let expect = vec::reduce_to_0n(want[i] * n as f64, ctx.p(), ctx.pinv());
            assert_eq!(got, expect, "i={i}");
        }
    }
}

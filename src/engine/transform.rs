//! The actual forward/inverse truncated NTT recursion, shared by every
//! [`super::Engine`] tier so `NoSimd` and `Avx2` only need to differ in how
//! they accelerate the pointwise step.
//!
//! # Truncation contract
//!
//! Forward transforms genuinely support asymmetric truncation: `i_trunc`
//! input coefficients (rest treated as zero) and `o_trunc` requested
//! outputs, either of which may be smaller than the transform size `2^m`,
//! computed in `O(2^m)` work via the textbook even/odd Cooley-Tukey split
//! restricted to the needed sub-ranges.
//!
//! Inverse transforms require `trunc == 2^m` (the caller always rounds its
//! working length up to a power of two — see `DESIGN.md` for why this
//! crate does not implement the fully general truncated inverse, which
//! would need a sizable family of hand-coded forward and inverse boundary
//! cases). Given `trunc == 2^m`, `ifft_trunc` is the exact unnormalized
//! inverse: for `Y = fft(X)`, `ifft(Y)[i] = 2^m * X[i]`, by discrete-Fourier
//! orthogonality over the full root-of-unity group of order `2^m`.

use crate::engine::fft_ctx::FftCtx;
use crate::engine::vec;

// ======================================================================
// FUNCTIONS - CRATE

/// Principal `2^m`-th root of unity for `ctx`'s prime, in `pmhn` form.
pub(crate) fn principal_root(ctx: &FftCtx, m: u32) -> f64 {
    ctx.fit_depth(m);
    ctx.w2(m, 1)
}

/// `[w^0, w^1, ..., w^{count-1}]` in `pmhn` form, `w` the principal
/// `2^m`-th root (or its inverse, if `invert`), read straight out of
/// `ctx`'s twiddle table rather than recomputed by modular exponentiation.
///
/// The inverse sequence reuses the same forward row: for a principal
/// `2^m`-th root `w`, `w^{-j} == w^{2^m - j}` for `j >= 1` (and `w^{-0} ==
/// 1`), so `row(m)` read backwards from its end serves both directions.
fn powers(ctx: &FftCtx, m: u32, count: usize, invert: bool) -> Vec<f64> {
    ctx.fit_depth(m);
    let row = ctx.row(m);
    let order = row.len();
    (0..count)
        .map(|j| if !invert || j == 0 { row[j] } else { row[order - j] })
        .collect()
}

/// Recursive truncated Cooley-Tukey evaluation/interpolation, shared core.
///
/// `invert` selects the inverse root at every recursion level; see module
/// docs for the resulting contract on `trunc` when `invert` is set.
pub(crate) fn transform_trunc(
    ctx: &FftCtx,
    x: &[f64],
    n: usize,
    m: u32,
    i_trunc: usize,
    o_trunc: usize,
    invert: bool,
) -> Vec<f64> {
    debug_assert!(i_trunc <= n && o_trunc <= n);

    if n == 1 {
        let v = if i_trunc >= 1 { x[0] } else { 0.0 };
        return if o_trunc >= 1 { vec![v] } else { Vec::new() };
    }

    let half = n / 2;
    let ie = i_trunc.div_ceil(2);
    let io = i_trunc / 2;
    let sub_o = o_trunc.min(half);

    let mut xe = vec![0.0f64; ie];
    for j in 0..ie {
        xe[j] = x[2 * j];
    }
    let mut xo = vec![0.0f64; io];
    for j in 0..io {
        xo[j] = x[2 * j + 1];
    }

    let e = transform_trunc(ctx, &xe, half, m - 1, ie, sub_o, invert);
    let o = transform_trunc(ctx, &xo, half, m - 1, io, sub_o, invert);

    let w_pows = powers(ctx, m, sub_o, invert);
    let p = ctx.p();
    let pinv = ctx.pinv();

    let mut y = vec![0.0f64; o_trunc];
    for k in 0..o_trunc {
        if k < half {
            let t = vec::mulmod(w_pows[k], o[k], p, pinv);
            y[k] = vec::reduce_to_pm1n(e[k] + t, p, pinv);
        } else {
            let kk = k - half;
            let t = vec::mulmod(w_pows[kk], o[kk], p, pinv);
            y[k] = vec::reduce_to_pm1n(e[kk] - t, p, pinv);
        }
    }
    y
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FftCtx {
        let p = crate::engine::tables::next_fft_number(1 << 16);
        FftCtx::init_prime(p).unwrap()
    }

    fn dft_reference(ctx: &FftCtx, x: &[f64], n: usize) -> Vec<f64> {
        let w = principal_root(ctx, n.trailing_zeros());
        let p = ctx.p();
        let pinv = ctx.pinv();
        let mut wk = 1.0;
        let mut out = Vec::with_capacity(n);
        for _k in 0..n {
            let mut acc = 0.0;
            let mut wi = 1.0;
            for j in 0..x.len() {
                acc = vec::reduce_to_pm1n(acc + vec::mulmod(x[j], wi, p, pinv), p, pinv);
                wi = vec::mulmod_pmhn(wi, wk, p, pinv);
            }
            out.push(acc);
            wk = vec::mulmod_pmhn(wk, w, p, pinv);
        }
        out
    }

    fn to_0n(ctx: &FftCtx, v: f64) -> f64 {
        vec::reduce_to_0n(v, ctx.p(), ctx.pinv())
    }

    #[test]
    fn forward_matches_direct_dft_full() {
        let ctx = ctx();
        let n = 16usize;
        let x: Vec<f64> = (0..n).map(|i| (i + 1) as f64).collect();
        let got = transform_trunc(&ctx, &x, n, n.trailing_zeros(), n, n, false);
        let want = dft_reference(&ctx, &x, n);
        for i in 0..n {
            assert_eq!(to_0n(&ctx, got[i]), to_0n(&ctx, want[i]), "i={i}");
        }
    }

    #[test]
    fn forward_supports_asymmetric_truncation() {
        let ctx = ctx();
        let n = 16usize;
        let i_trunc = 5;
        let o_trunc = 7;
        let x: Vec<f64> = (0..i_trunc).map(|i| (i + 1) as f64).collect();
        let mut x_full = vec![0.0; n];
        x_full[..i_trunc].copy_from_slice(&x);

        let got = transform_trunc(&ctx, &x, n, n.trailing_zeros(), i_trunc, o_trunc, false);
        let want = dft_reference(&ctx, &x_full, n);

        assert_eq!(got.len(), o_trunc);
        for i in 0..o_trunc {
            assert_eq!(to_0n(&ctx, got[i]), to_0n(&ctx, want[i]), "i={i}");
        }
    }

    #[test]
    fn round_trip_recovers_scaled_input() {
        let ctx = ctx();
        let n = 32usize;
        let x: Vec<f64> = (0..n).map(|i| (i * 7 + 3) as f64).collect();

        let y = transform_trunc(&ctx, &x, n, n.trailing_zeros(), n, n, false);
        let z = transform_trunc(&ctx, &y, n, n.trailing_zeros(), n, n, true);

        for i in 0..n {
            let want = to_0n(&ctx, x[i] * (n as f64));
            assert_eq!(to_0n(&ctx, z[i]), want, "i={i}");
        }
    }
}

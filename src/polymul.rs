//! Truncated modular polynomial multiplication: [`poly_mul_mid`],
//! [`poly_mul_mod_xpnm1`], [`MulPrecomp`].
//!
//! Every coefficient returned here has already been reduced into the
//! caller-supplied modulus `p'` via [`Nmod::red_signed`]. Internally the
//! exact (unreduced) convolution integer is reconstructed first, through
//! [`crate::crt::CrtData::reconstruct_signed`] rather than
//! [`crate::crt::CrtData::reconstruct`] (polynomial coefficients are signed,
//! unlike [`crate::mpn_mul`]'s non-negative digit convolution) — see
//! `DESIGN.md` for the `u128` product-of-primes limit that implies — and
//! only then reduced mod `p'`.

use crate::engine::buffer::AlignedF64;
use crate::engine::tables::{BLK_SZ, LG_BLK_SZ};
use crate::engine::{vec as fvec, Engine};
use crate::mpn_ctx::MpnCtx;
use crate::nmod::Nmod;
use crate::profile;
use crate::threadpool;

/// Picks a transform size for a convolution whose true length is at most
/// `target_len`: rounds up to the nearest multiple of [`BLK_SZ`] (this
/// crate's minimum truncation granularity) and reports the transform depth
/// `2^depth` needed to hold that many coefficients, floored at
/// [`LG_BLK_SZ`].
///
/// This always computes the full, untruncated transform size rather than
/// the narrower size the wrap-around truncation sometimes allows when the
/// caller's output window `[zl, zh)` is much smaller than the full
/// convolution — see `DESIGN.md` for why that optimization is left out.
fn choose_depth(target_len: usize) -> (usize, u32) {
    let target_len = target_len.max(1);
    let ztrunc = target_len.div_ceil(BLK_SZ) * BLK_SZ;
    let depth = ztrunc.next_power_of_two().trailing_zeros().max(LG_BLK_SZ);
    (ztrunc, depth)
}

/// Panics in debug builds if `ctx` doesn't carry enough primes to exactly
/// reconstruct a convolution of coefficients this large.
///
/// Unlike [`crate::mpn_mul`], which assumes a fixed digit width, polynomial
/// coefficients carry no such convention, so the required prime count is
/// computed from the actual magnitudes present in the data (plus one bit of
/// headroom for the sign) rather than from a caller-declared bound.
fn debug_assert_enough_primes<E: Engine>(ctx: &MpnCtx<E>, a: &[i64], b_max_abs: u64) {
    let a_max_abs = a.iter().map(|&x| x.unsigned_abs()).max().unwrap_or(0);
    let max_abs = a_max_abs.max(b_max_abs).max(1);
    let bits = 64 - max_abs.leading_zeros();
    let conv_len = a.len().max(1);
    debug_assert!(
        ctx.num_primes() >= profile::choose_np(bits + 1, conv_len),
        "ctx does not carry enough primes for a convolution of coefficients this large"
    );
}

/// Forward-transforms `b` once so it can be multiplied against many `a`s
/// without re-transforming it each time. The fixed operand stays fixed
/// across calls; only `a` (and the output window) varies.
pub struct MulPrecomp<'a, E: Engine> {
    ctx: &'a MpnCtx<E>,
    n: usize,
    l: u32,
    b_len: usize,
    b_max_abs: u64,
    modulus: Nmod,
    b_transformed: Vec<AlignedF64>,
}

impl<'a, E: Engine + Sync> MulPrecomp<'a, E> {
    /// Precomputes `b`'s forward transform at a size large enough for any
    /// linear convolution up to `max_conv_len` coefficients, for later
    /// reduction mod `modulus`.
    pub fn new(ctx: &'a MpnCtx<E>, b: &[i64], modulus: &Nmod, max_conv_len: usize) -> Self {
        let b_max_abs = b.iter().map(|&x| x.unsigned_abs()).max().unwrap_or(0);
        let (_, l) = choose_depth(max_conv_len);
        let n = 1usize << l;
        ctx.fit_depth(l);

        let b_transformed = (0..ctx.ctxs.len())
            .map(|i| {
                let p = &ctx.ctxs[i];
                let mut buf = AlignedF64::zeroed(n);
                for (dst, &src) in buf.as_slice_mut().iter_mut().zip(b.iter()) {
                    *dst = fvec::reduce_to_pm1n(src as f64, p.p(), p.pinv());
                }
                ctx.engine.fft_trunc(p, buf.as_slice_mut(), l, n, n);
                buf
            })
            .collect();

        Self { ctx, n, l, b_len: b.len(), b_max_abs, modulus: *modulus, b_transformed }
    }

    /// Computes `z[i - zl] = sum_j a[j]*b[i-j] mod modulus` for `zl <= i <
    /// zh`, where the sum ranges over the exact linear convolution of `a`
    /// and the precomputed `b`.
    ///
    /// Trims trivially: `zl >= zh` yields an empty result, and `zh` beyond
    /// the convolution's true length `a.len() + b.len() - 1` is zero-padded
    /// rather than computed. Returns `None` — "not applicable" — if this
    /// precompute's cached depth (set by `max_conv_len` at [`Self::new`])
    /// is too small for `a.len() + b.len() - 1`, rather than panicking.
    pub fn mul_mid(&self, a: &[i64], zl: usize, zh: usize) -> Option<Vec<i64>> {
        if zl >= zh {
            return Some(Vec::new());
        }
        let zn = a.len() + self.b_len - 1;
        if zn > self.n {
            return None;
        }
        debug_assert_enough_primes(self.ctx, a, self.b_max_abs);

        let np = self.ctx.primes().len();
        let per_prime: Vec<AlignedF64> = threadpool::map_each(np, |i| {
            let p = &self.ctx.ctxs[i];
            let mut abuf = AlignedF64::zeroed(self.n);
            for (dst, &src) in abuf.as_slice_mut().iter_mut().zip(a.iter()) {
                *dst = fvec::reduce_to_pm1n(src as f64, p.p(), p.pinv());
            }
            self.ctx.engine.fft_trunc(p, abuf.as_slice_mut(), self.l, self.n, self.n);

            let n_inv = crate::engine::tables::mulmod_pow(self.n as u64 % p.prime(), p.prime() - 2, p.prime());
            self.ctx.engine.point_mul(p, abuf.as_slice_mut(), self.b_transformed[i].as_slice(), n_inv as f64);
            self.ctx.engine.ifft_trunc(p, abuf.as_slice_mut(), self.l, self.n);
            abuf
        });

        let zh_have = zh.min(zn);
        let mut out = vec![0i64; zh - zl];
        for i in zl..zh_have {
            out[i - zl] = reconstruct_reduced(self.ctx, &per_prime, i, &self.modulus);
        }
        Some(out)
    }
}

/// One-shot truncated multiplication: `z[i - zl] mod modulus` for `zl <= i
/// < zh`, without precomputing `b`'s transform for reuse.
///
/// Equivalent to `MulPrecomp::new(ctx, b, modulus, a.len() + b.len() -
/// 1).mul_mid(a, zl, zh)`; use [`MulPrecomp`] directly when multiplying
/// several `a`s against a fixed `b`.
pub fn poly_mul_mid<E: Engine + Sync>(
    ctx: &MpnCtx<E>,
    a: &[i64],
    b: &[i64],
    zl: usize,
    zh: usize,
    modulus: &Nmod,
) -> Vec<i64> {
    let conv_len = a.len() + b.len().max(1) - 1;
    MulPrecomp::new(ctx, b, modulus, conv_len)
        .mul_mid(a, zl, zh)
        .expect("a precompute freshly sized from this exact call's convolution length always applies")
}

/// Computes `a*b mod (x^n - 1) mod modulus`: the cyclic (wrap) convolution
/// of `a` and `b`, reduced to `n` coefficients and then into `modulus`.
///
/// Obtained by computing the full linear convolution's exact coefficients
/// and folding each index `k >= n` back onto `k % n` before reduction —
/// reduction mod `modulus` is linear, so folding the exact integers first
/// and reducing last gives the same answer as reducing every term before
/// folding, with fewer reduction steps.
pub fn poly_mul_mod_xpnm1<E: Engine + Sync>(
    ctx: &MpnCtx<E>,
    a: &[i64],
    b: &[i64],
    n: usize,
    modulus: &Nmod,
) -> Vec<i64> {
    assert!(n > 0);
    let b_max_abs = b.iter().map(|&x| x.unsigned_abs()).max().unwrap_or(0);
    debug_assert_enough_primes(ctx, a, b_max_abs);

    let conv_len = a.len() + b.len() - 1;
    let (_, l) = choose_depth(conv_len);
    let t = 1usize << l;
    ctx.fit_depth(l);

    let np = ctx.primes().len();
    let per_prime: Vec<AlignedF64> = threadpool::map_each(np, |i| {
        let p = &ctx.ctxs[i];
        let mut abuf = AlignedF64::zeroed(t);
        let mut bbuf = AlignedF64::zeroed(t);
        for (dst, &src) in abuf.as_slice_mut().iter_mut().zip(a.iter()) {
            *dst = fvec::reduce_to_pm1n(src as f64, p.p(), p.pinv());
        }
        for (dst, &src) in bbuf.as_slice_mut().iter_mut().zip(b.iter()) {
            *dst = fvec::reduce_to_pm1n(src as f64, p.p(), p.pinv());
        }
        let n_inv = crate::engine::tables::mulmod_pow(t as u64 % p.prime(), p.prime() - 2, p.prime());
        ctx.engine.mul_trunc(p, abuf.as_slice_mut(), bbuf.as_slice_mut(), l, t, t, n_inv as f64);
        abuf
    });

    let mut wrapped = vec![0i128; n];
    for k in 0..conv_len {
        wrapped[k % n] += reconstruct_exact(ctx, &per_prime, k);
    }
    wrapped.into_iter().map(|v| modulus.red_signed(v) as i64).collect()
}

fn reconstruct_exact<E: Engine>(ctx: &MpnCtx<E>, per_prime: &[AlignedF64], k: usize) -> i128 {
    let residues: Vec<u64> = (0..per_prime.len())
        .map(|i| fvec::reduce_to_0n(per_prime[i][k], ctx.ctxs[i].p(), ctx.ctxs[i].pinv()) as u64)
        .collect();
    ctx.crt.reconstruct_signed(&residues)
}

fn reconstruct_reduced<E: Engine>(ctx: &MpnCtx<E>, per_prime: &[AlignedF64], k: usize, modulus: &Nmod) -> i64 {
    modulus.red_signed(reconstruct_exact(ctx, per_prime, k)) as i64
}

/// Packs two coefficients, each known to lie in `[0, modulus)`, into a
/// single transform slot as `lo + hi*modulus` — the "tiny modulus" path
/// that roughly doubles throughput when `modulus` is small enough that
/// `(modulus-1) + (modulus-1)*modulus` stays well under the fast-modular
/// bound. Pairs with [`unpack_pair`]. Left as a standalone primitive rather
/// than wired into [`poly_mul_mod_xpnm1`]'s dispatch — see `DESIGN.md`.
pub fn pack_pair(lo: i64, hi: i64, modulus: i64) -> f64 {
    (lo + hi * modulus) as f64
}

/// Inverse of [`pack_pair`]: recovers `(lo, hi)` from a packed slot value
/// and the modulus it was packed with.
pub fn unpack_pair(packed: i64, modulus: i64) -> (i64, i64) {
    (packed.rem_euclid(modulus), packed.div_euclid(modulus))
}

// ======================================================================
// TESTS

//! Per-prime transform context: [`FftCtx`].
//!
//! Owns `p`, `1/p`, a primitive root, and a lazily-grown twiddle table:
//! `row(m)` holds the `2^m` consecutive powers `[w^0, w^1, ..., w^{2^m-1}]`
//! of the principal `2^m`-th root of unity, read directly by
//! [`super::transform::powers`] instead of recomputing them by repeated
//! modular exponentiation on every transform call. Growth is monotone and
//! safe to call from any number of readers concurrently: a thread whose
//! required depth is already published never touches the growth lock.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Mutex,
};

use crate::engine::tables::{self, mulmod_pow, mulmod_u64, D_INIT, L_MAX};
use crate::Error;

// ======================================================================
// FftCtx - PUBLIC

/// A single prime lane's transform context.
///
/// Cloning is cheap: [`FftCtx`] is reference-counted internally via `Arc`
/// rows, so each worker thread in [`crate::mpn_mul`]/[`crate::polymul`] can
/// hold a private clone while sharing the underlying twiddle table.
#[derive(Debug)]
pub struct FftCtx {
    p: u64,
    pf: f64,
    pinv: f64,
    root: u64,
    /// `rows[k]` is `None` until depth `k` has been published.
    rows: Mutex<Vec<Option<std::sync::Arc<[f64]>>>>,
    depth: AtomicU32,
}

impl FftCtx {
    /// Creates a context for prime `p`, eagerly filling rows `0..D_INIT`.
    ///
    /// Fails with [`Error::BadPrime`] if `p` is outside the fast-modular
    /// bound, not prime, or lacks a principal `2^{L_MAX+1}`-th root.
    pub fn init_prime(p: u64) -> Result<Self, Error> {
        if !tables::usable(p) {
            return Err(Error::BadPrime { p });
        }

        let root = tables::primitive_root(p);
        let mut rows: Vec<Option<std::sync::Arc<[f64]>>> = vec![None; L_MAX as usize + 1];
        rows[0] = Some(vec![1.0].into());

        let ctx = Self {
            p,
            pf: p as f64,
            pinv: 1.0 / (p as f64),
            root,
            rows: Mutex::new(rows),
            depth: AtomicU32::new(0),
        };

        for k in 1..=D_INIT {
            ctx.fill_row(k);
        }
        ctx.depth.store(D_INIT, Ordering::Release);

        Ok(ctx)
    }

    /// The prime modulus.
    #[inline(always)]
    pub fn prime(&self) -> u64 {
        self.p
    }

    /// `p` as an `f64`.
    #[inline(always)]
    pub fn p(&self) -> f64 {
        self.pf
    }

    /// `1/p` as an `f64`.
    #[inline(always)]
    pub fn pinv(&self) -> f64 {
        self.pinv
    }

    /// The primitive root chosen for `p`.
    #[inline(always)]
    pub fn root(&self) -> u64 {
        self.root
    }

    /// Ensures `w2tab` rows `0..=L` are available, growing under lock only
    /// if necessary.
    pub fn fit_depth(&self, l: u32) {
        if self.depth.load(Ordering::Acquire) >= l {
            return;
        }

        let _guard_rows = self.rows.lock().unwrap();
        // Double-check idiom: depth may have grown while we waited on the lock.
        let current = self.depth.load(Ordering::Acquire);
        if current >= l {
            return;
        }
        drop(_guard_rows);

        for k in (current + 1)..=l {
            self.fill_row(k);
            self.depth.store(k, Ordering::Release);
        }
    }

    /// Returns the `i`-th consecutive power of the principal `2^k`-th root
    /// at row `k`, in `pmhn` form: `row(k)[i] == w^i` for `w` that root.
    ///
    /// Requires `fit_depth(k)` to have been called by some thread before
    /// this (or during, via the same lock), i.e. `k <= current depth`.
    #[inline(always)]
    pub fn w2(&self, k: u32, i: usize) -> f64 {
        let rows = self.rows.lock().unwrap();
        rows[k as usize]
            .as_ref()
            .expect("fit_depth must be called before reading a row")[i]
    }

    /// Copies row `k` out as an owned vector (used by engines that want to
    /// avoid repeated locking inside a hot loop).
    pub fn row(&self, k: u32) -> std::sync::Arc<[f64]> {
        let rows = self.rows.lock().unwrap();
        rows[k as usize]
            .clone()
            .expect("fit_depth must be called before reading a row")
    }

    /// Fills row `k` with `[w^0, w^1, ..., w^{2^k - 1}]` for `w` the
    /// principal `2^k`-th root of unity.
    fn fill_row(&self, k: u32) {
        if k == 0 {
            return;
        }
        let order = 1u64 << k;
        let exponent = (self.p - 1) / order;
        let w = mulmod_pow(self.root, exponent, self.p);

        let mut row = vec![0.0f64; order as usize];
        let mut cur = 1u64;
        for slot in row.iter_mut() {
            *slot = to_pmhn(cur, self.p);
            cur = mulmod_u64(cur, w, self.p);
        }

        let mut rows = self.rows.lock().unwrap();
        rows[k as usize] = Some(row.into());
    }
}

impl Clone for FftCtx {
    fn clone(&self) -> Self {
        let rows = self.rows.lock().unwrap().clone();
        Self {
            p: self.p,
            pf: self.pf,
            pinv: self.pinv,
            root: self.root,
            rows: Mutex::new(rows),
            depth: AtomicU32::new(self.depth.load(Ordering::Acquire)),
        }
    }
}

#[inline]
fn to_pmhn(value: u64, p: u64) -> f64 {
    if value > p / 2 {
        (value as i64 - p as i64) as f64
    } else {
        value as f64
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    fn small_prime() -> u64 {
        // Smallest usable prime above 2^16 for fast tests.
        tables::next_fft_number(1 << 16)
    }

    #[test]
    fn init_prime_rejects_unusable() {
        assert!(matches!(FftCtx::init_prime(4).unwrap_err(), Error::BadPrime { p: 4 }));
    }

    #[test]
    fn w2_row_zero_is_one() {
        let p = small_prime();
        let ctx = FftCtx::init_prime(p).unwrap();
        assert_eq!(ctx.w2(0, 0), 1.0);
    }

    #[test]
    fn twiddle_values_are_roots_of_unity() {
        let p = small_prime();
        let ctx = FftCtx::init_prime(p).unwrap();
        ctx.fit_depth(6);

        for k in 1..=6u32 {
            let len = 1usize << k;
            let to_u64 = |w: f64| if w < 0.0 { w as i64 + p as i64 } else { w as i64 } as u64;
            // row(k)[i] must be the i-th consecutive power of a 2^k-th root.
            let w1 = to_u64(ctx.w2(k, 1));
            assert_eq!(mulmod_pow(w1, 1u64 << k, p), 1, "k={k}");
            let mut expect = 1u64;
            for i in 0..len {
                assert_eq!(to_u64(ctx.w2(k, i)), expect, "k={k} i={i}");
                expect = crate::engine::tables::mulmod_u64(expect, w1, p);
            }
        }
    }

    #[test]
    fn fit_depth_is_idempotent_and_monotone() {
        let p = small_prime();
        let ctx = FftCtx::init_prime(p).unwrap();
        ctx.fit_depth(3);
        let before = ctx.row(3);
        ctx.fit_depth(3);
        ctx.fit_depth(8);
        let after = ctx.row(3);
        assert_eq!(&*before, &*after);
    }
}

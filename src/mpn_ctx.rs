//! Multi-prime context: [`MpnCtx`].
//!
//! Owns one [`FftCtx`] per prime lane, the [`CrtData`] needed to combine
//! their residues, and the [`Engine`] tier used for every transform. This
//! is the long-lived object an application constructs once and reuses
//! across many [`crate::mpn_mul`]/[`crate::polymul`] calls.

use crate::crt::CrtData;
use crate::engine::fft_ctx::FftCtx;
use crate::engine::tables::find_primes;
use crate::engine::{DefaultEngine, Engine};
use crate::Error;

// ======================================================================
// MpnCtx - PUBLIC

/// A multi-prime transform context, generic over the [`Engine`] tier.
#[derive(Debug)]
pub struct MpnCtx<E: Engine = DefaultEngine> {
    pub(crate) primes: Vec<u64>,
    pub(crate) ctxs: Vec<FftCtx>,
    pub(crate) crt: CrtData,
    pub(crate) engine: E,
}

impl MpnCtx<DefaultEngine> {
    /// Builds a context with `np` distinct primes, searching upward from a
    /// fixed seed, using [`DefaultEngine`].
    ///
    /// # Examples
    /// ```
    /// use sd_fft::MpnCtx;
    /// let ctx = MpnCtx::new(2).unwrap();
    /// assert_eq!(ctx.num_primes(), 2);
    /// ```
    pub fn new(np: usize) -> Result<Self, Error> {
        Self::with_engine(np, DefaultEngine::new())
    }
}

impl<E: Engine> MpnCtx<E> {
    /// Builds a context with `np` distinct primes and a caller-supplied
    /// engine tier (used by tests to force [`crate::engine::engine_naive::Naive`]).
    pub fn with_engine(np: usize, engine: E) -> Result<Self, Error> {
        if np == 0 {
            return Err(Error::UnsupportedModulus { np });
        }
        let primes = find_primes(1u64 << 32, np);
        let ctxs = primes
            .iter()
            .map(|&p| FftCtx::init_prime(p))
            .collect::<Result<Vec<_>, _>>()?;
        let crt = CrtData::new(&primes);
        Ok(Self { primes, ctxs, crt, engine })
    }

    pub fn num_primes(&self) -> usize {
        self.primes.len()
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub(crate) fn fit_depth(&self, l: u32) {
        for ctx in &self.ctxs {
            ctx.fit_depth(l);
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_primes() {
        assert!(matches!(
            MpnCtx::new(0).unwrap_err(),
            Error::UnsupportedModulus { np: 0 }
        ));
    }

    #[test]
    fn new_builds_distinct_primes() {
        let ctx = MpnCtx::new(3).unwrap();
        assert_eq!(ctx.num_primes(), 3);
        let primes = ctx.primes();
        assert_ne!(primes[0], primes[1]);
        assert_ne!(primes[1], primes[2]);
    }
}

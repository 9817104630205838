//! `sd_fft`: a small-prime number-theoretic transform engine, a CRT-based
//! multi-prime layer for exact large-integer arithmetic, and truncated
//! modular polynomial multiplication built on top of it.
//!
//! The transform itself ([`engine`]) evaluates polynomials over `Z/pZ` for
//! primes `p` small enough that every modular multiply stays exact in `f64`
//! arithmetic (see [`engine::tables::FAST_BOUND_BITS`]). [`MpnCtx`] combines
//! several such primes via CRT reconstruction so that products which would
//! overflow any single prime's range come out exact; [`mpn_mul`] and
//! [`polymul`] are the two operations built on that combination.
//!
//! # Example
//! ```
//! use sd_fft::{mpn_mul, profile, MpnCtx};
//!
//! let ctx = MpnCtx::new(profile::choose_np(32, 1)).unwrap();
//! let a = [123_456_789u32];
//! let b = [987_654_321u32];
//! let product = mpn_mul(&ctx, &a, &b);
//! assert_eq!(product[0] as u64 | ((product[1] as u64) << 32), 123_456_789u64 * 987_654_321);
//! ```

pub mod crt;
pub mod engine;
pub mod mpn_ctx;
pub mod mpn_mul;
pub mod nmod;
pub mod polymul;
pub mod profile;
pub mod threadpool;

pub use engine::{DefaultEngine, Engine};
pub use mpn_ctx::MpnCtx;
pub use mpn_mul::mpn_mul;
pub use polymul::{poly_mul_mid, poly_mul_mod_xpnm1, MulPrecomp};

// ======================================================================
// Error - PUBLIC

/// Errors from building or configuring a transform context.
///
/// Every variant here is raised at setup time
/// ([`engine::fft_ctx::FftCtx::init_prime`] / [`MpnCtx::with_engine`]),
/// never mid-computation — once a context is built, every further
/// operation on it is infallible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// `p` cannot back an [`engine::fft_ctx::FftCtx`]: it isn't prime, is at
    /// or above [`engine::tables::FAST_BOUND_BITS`], or doesn't admit a
    /// principal `2^(L_MAX+1)`-th root of unity.
    BadPrime { p: u64 },
    /// An [`MpnCtx`] was asked for an unsupported number of primes (zero).
    UnsupportedModulus { np: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BadPrime { p } => write!(f, "{p} is not usable as an sd-FFT prime"),
            Error::UnsupportedModulus { np } => write!(f, "unsupported prime count: {np}"),
        }
    }
}

impl std::error::Error for Error {}

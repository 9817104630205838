//! Lane-wise modular arithmetic over `f64` residues.
//!
//! Every prime used by this crate is small enough (`< 2^50`, see
//! [`crate::engine::tables::FAST_BOUND_BITS`]) that a residue mod `p` can be
//! carried as an `f64` and multiplied with a single `fma` while staying
//! exactly representable: the true value of `a*b - q*n` is bounded by
//! roughly `n`, which fits the `f64` mantissa even though the intermediate
//! product `a*b` itself does not round exactly.
//!
//! Three canonical forms are used throughout the transform, matching the
//! contract every routine in this module is annotated with:
//! - `pm1n`: `x` in `[-n, n]`
//! - `pmhn`: `x` in `[-n/2, n/2]`
//! - `0n`:   `x` in `[0, n)`

// ======================================================================
// FUNCTIONS - PUBLIC - scalar lane

/// Rounds `a` to the nearest integer, ties to even, as a mathematical value
/// (not a bit-pattern operation).
#[inline(always)]
pub fn round(a: f64) -> f64 {
    a.round_ties_even()
}

/// Reduces `a` to `pm1n` form: `a - round(a*ninv)*n`.
///
/// Requires `|a| < 2^52` so that `a*ninv` rounds to the correct nearby
/// integer quotient.
#[inline(always)]
pub fn reduce_to_pm1n(a: f64, n: f64, ninv: f64) -> f64 {
    let q = round(a * ninv);
    a.mul_add(1.0, -(q * n))
}

/// Reduces a `pm1n` value further into `pmhn` form by folding `|a| > n/2`.
#[inline(always)]
pub fn reduce_pm1n_to_pmhn(a: f64, n: f64) -> f64 {
    let half = 0.5 * n;
    if a > half {
        a - n
    } else if a < -half {
        a + n
    } else {
        a
    }
}

/// Reduces `a` (any of the three canonical forms) to `pmhn` form directly.
#[inline(always)]
pub fn reduce_to_pmhn(a: f64, n: f64, ninv: f64) -> f64 {
    reduce_pm1n_to_pmhn(reduce_to_pm1n(a, n, ninv), n)
}

/// Reduces `a` to the unique `0n` representative `[0, n)`.
#[inline(always)]
pub fn reduce_to_0n(a: f64, n: f64, ninv: f64) -> f64 {
    let r = reduce_to_pm1n(a, n, ninv);
    if r < 0.0 {
        r + n
    } else {
        r
    }
}

/// `a*b mod n`, result in `pm1n` form.
///
/// Correct provided `|a|, |b| <= n` and `n` satisfies the fast-modular
/// bound (`FAST_BOUND_BITS`): the quotient `round(a*b*ninv)` then agrees
/// with the true integer quotient of `a*b` by `n`, and `fma` computes
/// `a*b - q*n` to full precision in one correctly-rounded step even though
/// `a*b` itself is not exactly representable.
#[inline(always)]
pub fn mulmod(a: f64, b: f64, n: f64, ninv: f64) -> f64 {
    let q = round(a * b * ninv);
    a.mul_add(b, -(q * n))
}

/// `a*b mod n`, folded into `pmhn` form.
#[inline(always)]
pub fn mulmod_pmhn(a: f64, b: f64, n: f64, ninv: f64) -> f64 {
    reduce_pm1n_to_pmhn(mulmod(a, b, n, ninv), n)
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    const P: f64 = 4503599627370449.0; // a 52-bit-ish prime, plenty for round-trip checks
    const PINV: f64 = 1.0 / P;

    #[test]
    fn reduce_to_pm1n_is_bounded() {
        let mut x: f64 = 1.0;
        for _ in 0..64 {
            let r = reduce_to_pm1n(x, P, PINV);
            assert!(r.abs() <= P);
            x = x * 3.0 + 1.0;
        }
    }

    #[test]
    fn reduce_to_0n_is_canonical() {
        for a in [-2.0 * P, -P, -1.0, 0.0, 1.0, P - 1.0, P, 2.0 * P] {
            let r = reduce_to_0n(a, P, PINV);
            assert!(r >= 0.0 && r < P, "a={a} r={r}");
        }
    }

    #[test]
    fn mulmod_matches_u128_reference() {
        let p = 1_000_003u128;
        let pf = p as f64;
        let pinv = 1.0 / pf;
        for (a, b) in [(123u128, 456u128), (999_999, 999_999), (0, 5), (500_000, 500_001)] {
            let expect = ((a * b) % p) as i128;
            let got = mulmod(a as f64, b as f64, pf, pinv);
            // mulmod returns a pm1n representative; fold to canonical form.
            let got_0n = if got < 0.0 { got + pf } else { got };
            assert!((got_0n - expect as f64).abs() < 1.0, "a={a} b={b} got={got_0n} expect={expect}");
        }
    }
}

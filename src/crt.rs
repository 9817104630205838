//! Multi-prime CRT reconstruction: [`CrtData`].
//!
//! Each transform coefficient comes back as `np` separate residues, one per
//! prime lane. [`CrtData::reconstruct`] combines them into the single exact
//! non-negative integer they represent, via Garner's mixed-radix algorithm
//! rather than computing the full product-of-primes modulus up front — this
//! keeps every intermediate value a plain `u64` instead of a full bignum
//! multiply per coefficient.

use crate::nmod::{self, Nmod};

// ======================================================================
// CrtData - PUBLIC

/// Precomputed per-prime Garner coefficients for a fixed prime list.
#[derive(Debug)]
pub struct CrtData {
    primes: Vec<u64>,
    /// `garner_inv[i]` (for `i >= 1`) is `(p_0*p_1*...*p_{i-1})^{-1} mod p_i`.
    garner_inv: Vec<u64>,
}

impl CrtData {
    /// Builds the Garner coefficients for `primes`. `primes` must be
    /// pairwise coprime (guaranteed when every prime is distinct, which
    /// [`crate::engine::tables::find_primes`] already ensures).
    pub fn new(primes: &[u64]) -> Self {
        let np = primes.len();
        let mut garner_inv = vec![0u64; np];
        for i in 1..np {
            let m = Nmod::init(primes[i]);
            let mut prod_mod = 1u64 % primes[i];
            for &p in &primes[..i] {
                prod_mod = m.red(prod_mod as u128 * (p % primes[i]) as u128);
            }
            garner_inv[i] = m.inv(prod_mod);
        }
        Self { primes: primes.to_vec(), garner_inv }
    }

    pub fn num_primes(&self) -> usize {
        self.primes.len()
    }

    /// The product of every prime, if it fits in a `u128`.
    pub fn product_u128(&self) -> Option<u128> {
        let mut acc = 1u128;
        for &p in &self.primes {
            acc = acc.checked_mul(p as u128)?;
        }
        Some(acc)
    }

    /// Reconstructs a *signed* coefficient: the unique integer congruent to
    /// `residues[i]` mod `primes[i]` for every `i`, centered into
    /// `(-product/2, product/2]` rather than `[0, product)`.
    ///
    /// Used by [`crate::polymul`], whose polynomial coefficients may be
    /// negative, unlike [`crate::mpn_mul`]'s non-negative digit convolution.
    /// Requires the prime product to fit in a `u128` — in practice this
    /// limits this path to a small number of primes; see `DESIGN.md`.
    pub fn reconstruct_signed(&self, residues: &[u64]) -> i128 {
        let limbs = self.reconstruct(residues);
        let mut val: u128 = 0;
        for (i, &l) in limbs.iter().enumerate() {
            assert!(i < 4, "reconstruct_signed requires the product of primes to fit in a u128");
            val |= (l as u128) << (32 * i);
        }
        let prod = self
            .product_u128()
            .expect("reconstruct_signed requires the product of primes to fit in a u128");
        if val > prod / 2 {
            val as i128 - prod as i128
        } else {
            val as i128
        }
    }

    /// Reconstructs the unique non-negative integer `< product(primes)`
    /// congruent to `residues[i]` mod `primes[i]` for every `i`, as a
    /// little-endian `u32`-limb bignum.
    ///
    /// `residues[i]` must already be in canonical `[0, primes[i])` form.
    pub fn reconstruct(&self, residues: &[u64]) -> Vec<u32> {
        debug_assert_eq!(residues.len(), self.primes.len());
        let np = self.primes.len();

        // Garner digits x_0..x_{np-1}: X = x_0 + x_1*p_0 + x_2*p_0*p_1 + ...
        let mut digits = vec![0u64; np];
        digits[0] = residues[0];
        for i in 1..np {
            let m = Nmod::init(self.primes[i]);
            // t = (residues[i] - (x_0 + x_1*p_0 + ... + x_{i-1}*p_0*...*p_{i-2})) mod p_i
            let mut acc = digits[0] % self.primes[i];
            let mut prod_mod = 1u64 % self.primes[i];
            for j in 1..i {
                prod_mod = m.red(prod_mod as u128 * (self.primes[j - 1] % self.primes[i]) as u128);
                acc = m.add(acc, m.red(digits[j] as u128 * prod_mod as u128));
            }
            let t = m.sub(residues[i], acc);
            digits[i] = m.red(t as u128 * self.garner_inv[i] as u128);
        }

        // Horner-evaluate X = (...((x_{np-1})*p_{np-2} + x_{np-2})*p_{np-3} + ...)*p_0 + x_0
        let mut limbs: Vec<u32> = vec![digits[np - 1] as u32, (digits[np - 1] >> 32) as u32];
        nmod::normalize(&mut limbs);
        for i in (0..np - 1).rev() {
            nmod::mul_u64(&mut limbs, self.primes[i]);
            add_u64(&mut limbs, digits[i]);
        }
        nmod::normalize(&mut limbs);
        limbs
    }
}

fn split_u64(x: u64) -> (u32, u32) {
    (x as u32, (x >> 32) as u32)
}

/// Adds a full `u64` (not just a `u32` scalar) into a limb bignum.
fn add_u64(limbs: &mut Vec<u32>, value: u64) {
    let (lo, hi) = split_u64(value);
    nmod::add_1(limbs, lo);
    if hi != 0 {
        if limbs.len() < 2 {
            limbs.push(0);
        }
        let mut carry = hi as u64;
        for limb in limbs.iter_mut().skip(1) {
            if carry == 0 {
                break;
            }
            let s = *limb as u64 + carry;
            *limb = s as u32;
            carry = s >> 32;
        }
        if carry != 0 {
            limbs.push(carry as u32);
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    fn limbs_to_u128(limbs: &[u32]) -> u128 {
        let mut acc = 0u128;
        for (i, &l) in limbs.iter().enumerate() {
            acc |= (l as u128) << (32 * i);
        }
        acc
    }

    #[test]
    fn reconstructs_known_value_two_primes() {
        let primes = [1_000_003u64, 1_000_033u64];
        let crt = CrtData::new(&primes);
        let x: u128 = 123_456_789_012_345;
        let residues = [
            (x % primes[0] as u128) as u64,
            (x % primes[1] as u128) as u64,
        ];
        let got = crt.reconstruct(&residues);
        assert_eq!(limbs_to_u128(&got), x);
    }

    #[test]
    fn reconstructs_known_value_four_primes() {
        let primes = [1_000_003u64, 1_000_033u64, 1_000_037u64, 1_000_039u64];
        let crt = CrtData::new(&primes);
        let x: u128 = 999_999_999_999_999_999_999_999;
        let residues: Vec<u64> = primes.iter().map(|&p| (x % p as u128) as u64).collect();
        let got = crt.reconstruct(&residues);
        assert_eq!(limbs_to_u128(&got), x);
    }

    #[test]
    fn reconstructs_zero() {
        let primes = [1_000_003u64, 1_000_033u64];
        let crt = CrtData::new(&primes);
        let got = crt.reconstruct(&[0, 0]);
        assert_eq!(got, vec![0]);
    }
}

//! Parameters derived once per modulus and shared by both field variants.

use num_bigint::BigUint;
use num_traits::One;

use crate::error::{EncodingError, FieldError, ModulusError, Result};
use crate::traits::FieldElement;

/// Largest candidate tried when searching for a quadratic non-residue.
const NONRESIDUE_SEARCH_LIMIT: u32 = 10_000;

/// Fixed Miller–Rabin witnesses. Deterministic below `3.3 * 10^24`, and a
/// composite passes all of them with probability below `4^-20` above that.
const PRIMALITY_WITNESSES: [u32; 20] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
];

/// Number of coefficients of an Fq element (degree-one extension).
pub const COEFFICIENTS: usize = 1;

/// How square roots are extracted for a given modulus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqrtStrategy {
    /// `q ≡ 3 (mod 4)`: `sqrt(a) = a^((q+1)/4)`.
    ThreeModFour { exponent: BigUint },
    /// Tonelli–Shanks with `q - 1 = 2^two_adicity * odd_part`.
    TonelliShanks {
        two_adicity: u32,
        odd_part: BigUint,
        /// `(odd_part + 1) / 2`
        half_odd_part_plus_one: BigUint,
        nonresidue: BigUint,
    },
    /// No non-residue was found below the search limit.
    Unavailable,
}

/// Modulus plus the exponents used by inversion and square roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldParams {
    modulus: BigUint,
    bits: u64,
    q_minus_two: BigUint,
    euler_exponent: BigUint,
    sqrt: SqrtStrategy,
}

impl FieldParams {
    /// Validate `modulus` and precompute its exponents.
    ///
    /// The modulus must be an odd prime. Primality is checked with
    /// Miller–Rabin over fixed witnesses.
    pub fn new(modulus: &BigUint) -> Result<Self> {
        if *modulus <= BigUint::from(2u32) {
            return Err(ModulusError::TooSmall.into());
        }
        if !modulus.bit(0) {
            return Err(ModulusError::Even.into());
        }
        if !is_probable_prime(modulus) {
            return Err(ModulusError::NotPrime.into());
        }

        let q_minus_one = modulus - BigUint::one();
        let euler_exponent = &q_minus_one >> 1usize;
        let sqrt = if modulus.bit(1) {
            SqrtStrategy::ThreeModFour {
                exponent: (modulus + BigUint::one()) >> 2usize,
            }
        } else {
            tonelli_shanks_parameters(modulus, &q_minus_one, &euler_exponent)
        };

        Ok(Self {
            bits: modulus.bits(),
            q_minus_two: modulus - BigUint::from(2u32),
            modulus: modulus.clone(),
            euler_exponent,
            sqrt,
        })
    }

    #[inline]
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Bit length of the modulus.
    #[inline]
    pub fn bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub fn q_minus_two(&self) -> &BigUint {
        &self.q_minus_two
    }

    /// `(q - 1) / 2`
    #[inline]
    pub fn euler_exponent(&self) -> &BigUint {
        &self.euler_exponent
    }

    #[inline]
    pub fn sqrt_strategy(&self) -> &SqrtStrategy {
        &self.sqrt
    }

    /// Reject component lists that are not exactly one element long.
    pub fn check_arity(found: usize) -> Result<()> {
        if found == COEFFICIENTS {
            Ok(())
        } else {
            Err(FieldError::InvalidArity {
                expected: COEFFICIENTS,
                found,
            })
        }
    }

    /// Accept `value` iff it is a canonical residue (`< q`).
    pub fn canonical(&self, value: BigUint) -> Result<BigUint> {
        if value < self.modulus {
            Ok(value)
        } else {
            Err(EncodingError::NotCanonical {
                bits: value.bits(),
                modulus_bits: self.bits,
            }
            .into())
        }
    }

    /// Decode big-endian unsigned bytes.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<BigUint> {
        self.canonical(BigUint::from_bytes_be(data))
    }

    /// Parse `input` in `radix`, requiring a canonical result.
    pub fn parse(&self, radix: u32, input: &str) -> Result<BigUint> {
        if !(2..=36).contains(&radix) {
            return Err(FieldError::InvalidRadix(radix));
        }
        let unparsable = || EncodingError::Unparsable {
            input: input.to_owned(),
            radix,
        };
        // `parse_bytes` tolerates `_` separators
        if input.contains('_') {
            return Err(unparsable().into());
        }
        let value = BigUint::parse_bytes(input.as_bytes(), radix).ok_or_else(unparsable)?;
        self.canonical(value)
    }

    /// The residue class of a signed machine integer.
    pub fn residue_i64(&self, value: i64) -> BigUint {
        let magnitude = BigUint::from(value.unsigned_abs()) % &self.modulus;
        if value < 0 && magnitude != BigUint::ZERO {
            &self.modulus - magnitude
        } else {
            magnitude
        }
    }

    /// Reduce an arbitrary integer into `[0, q)`.
    pub fn reduce(&self, value: &BigUint) -> BigUint {
        value % &self.modulus
    }
}

/// Miller–Rabin for an odd `n > 2`.
fn is_probable_prime(n: &BigUint) -> bool {
    for p in PRIMALITY_WITNESSES {
        if *n == BigUint::from(p) {
            return true;
        }
        if (n % p) == BigUint::ZERO {
            return false;
        }
    }

    let n_minus_one = n - BigUint::one();
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;
    let two = BigUint::from(2u32);

    'witness: for a in PRIMALITY_WITNESSES {
        let mut x = BigUint::from(a).modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn tonelli_shanks_parameters(
    modulus: &BigUint,
    q_minus_one: &BigUint,
    euler_exponent: &BigUint,
) -> SqrtStrategy {
    let two_adicity = q_minus_one.trailing_zeros().unwrap_or(0);
    let odd_part = q_minus_one >> two_adicity;
    let half_odd_part_plus_one = (&odd_part + BigUint::one()) >> 1usize;

    let search_limit = BigUint::from(NONRESIDUE_SEARCH_LIMIT).min(modulus.clone());
    let mut candidate = BigUint::from(2u32);
    while candidate < search_limit {
        if candidate.modpow(euler_exponent, modulus) == *q_minus_one {
            return SqrtStrategy::TonelliShanks {
                two_adicity: two_adicity as u32,
                odd_part,
                half_odd_part_plus_one,
                nonresidue: candidate,
            };
        }
        candidate += 1u32;
    }
    SqrtStrategy::Unavailable
}

/// `x = x^(q-2)`, failing on zero.
pub(crate) fn invert_assign<E: FieldElement>(x: &mut E, params: &FieldParams) -> Result<()> {
    if x.is_zero() {
        return Err(FieldError::NonInvertible);
    }
    x.pow_mut(params.q_minus_two());
    Ok(())
}

/// Replace `x` by a square root of itself.
///
/// Residuosity is decided first with Euler's criterion. `root_of_unity` is
/// the non-residue raised to the odd part of `q - 1`, in `x`'s field; it is
/// only consumed by the Tonelli–Shanks branch.
pub(crate) fn sqrt_assign<E: FieldElement>(
    x: &mut E,
    params: &FieldParams,
    root_of_unity: Option<E>,
) -> Result<()> {
    if x.is_zero() {
        x.reduce_mut();
        if let Some(c) = root_of_unity {
            c.recycle();
        }
        return Ok(());
    }

    let legendre = x.pow(params.euler_exponent());
    let residue = legendre.is_one();
    legendre.recycle();
    if !residue {
        if let Some(c) = root_of_unity {
            c.recycle();
        }
        return Err(FieldError::NonResidue);
    }

    match (params.sqrt_strategy(), root_of_unity) {
        (SqrtStrategy::ThreeModFour { exponent }, _) => {
            x.pow_mut(exponent);
            Ok(())
        }
        (
            SqrtStrategy::TonelliShanks {
                two_adicity,
                odd_part,
                half_odd_part_plus_one,
                ..
            },
            Some(c),
        ) => tonelli_shanks(x, *two_adicity, odd_part, half_odd_part_plus_one, c),
        _ => Err(FieldError::NonResidue),
    }
}

fn tonelli_shanks<E: FieldElement>(
    x: &mut E,
    two_adicity: u32,
    odd_part: &BigUint,
    half_odd_part_plus_one: &BigUint,
    mut c: E,
) -> Result<()> {
    let mut b = x.pow(odd_part);
    x.pow_mut(half_odd_part_plus_one);
    let mut m = two_adicity;

    while !b.is_one() {
        // least i with b^(2^i) == 1
        let mut probe = b.square();
        let mut i = 1;
        while !probe.is_one() && i < m {
            probe.square_mut();
            i += 1;
        }
        let found = probe.is_one();
        probe.recycle();
        if !found || i >= m {
            b.recycle();
            c.recycle();
            return Err(FieldError::NonResidue);
        }

        let mut g = c;
        for _ in 0..(m - i - 1) {
            g.square_mut();
        }
        x.mul_mut(&g);
        g.square_mut();
        b.mul_mut(&g);
        c = g;
        m = i;
    }

    b.recycle();
    c.recycle();
    Ok(())
}

//! Fixed-width Montgomery-domain prime field.
//!
//! Values are stored as `x * R mod q` in `L` little-endian 32-bit limbs with
//! `R = 2^(32 * L)`. The field context owns the modulus constants and three
//! buffer pools (single-width elements, double-width elements, internal
//! scratch). Contexts are single-threaded: they are built on `Rc` and
//! `RefCell` and are therefore neither `Send` nor `Sync`.

mod double;
mod element;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigUint;
use num_traits::One;
use tracing::debug;

pub use self::double::FqDoubleElement;
pub use self::element::FqElement;
use crate::canonical::{CanonicalElement, FqCanonical};
use crate::config::{limb_count, PoolConfig};
use crate::error::{FieldError, Result};
use crate::limbs;
use crate::params::{FieldParams, SqrtStrategy};
use crate::recycler::{LimbCreator, PoolStats, RecycleBin};
use crate::traits::{FieldElement, PrimeField};
use crate::SharedRng;

type Limbs = Box<[u32]>;
type LimbBin = RecycleBin<Limbs, LimbCreator>;

struct Pools {
    single: LimbBin,
    double: LimbBin,
    scratch: LimbBin,
}

/// Snapshot of the counters of a field's pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldPoolStats {
    pub single: PoolStats,
    pub double: PoolStats,
    pub scratch: PoolStats,
}

impl FieldPoolStats {
    pub fn total(&self) -> PoolStats {
        self.single.merge(self.double).merge(self.scratch)
    }
}

struct MontgomeryContext {
    params: Rc<FieldParams>,
    len: usize,
    q: Limbs,
    /// `q * R`, `2L` limbs.
    q_shifted: Limbs,
    n0: u32,
    /// `R mod q`, the Montgomery form of one.
    one: Limbs,
    /// `R^2 mod q`
    r2: Limbs,
    /// Plain integer 1; multiplying by it leaves the Montgomery domain.
    unit: Limbs,
    zeros: Limbs,
    zeros_double: Limbs,
    /// Montgomery form of `nonresidue^odd_part`, for Tonelli–Shanks.
    root_of_unity: Option<Limbs>,
    pools: RefCell<Pools>,
    rng: SharedRng,
    config: PoolConfig,
    canonical: FqCanonical,
}

/// Prime field whose elements live in the Montgomery domain.
#[derive(Clone)]
pub struct FqMontgomery(Rc<MontgomeryContext>);

fn limbs_of(value: &BigUint, len: usize) -> Limbs {
    let mut out = vec![0u32; len].into_boxed_slice();
    let fits = limbs::copy_from_biguint(&mut out, value);
    debug_assert!(fits, "constant wider than {len} limbs");
    out
}

impl FqMontgomery {
    /// Field for `order` with the default pool capacities.
    pub fn new(rng: SharedRng, order: &BigUint) -> Result<Self> {
        Self::with_config(rng, order, PoolConfig::default())
    }

    pub fn with_config(rng: SharedRng, order: &BigUint, config: PoolConfig) -> Result<Self> {
        let params = Rc::new(FieldParams::new(order)?);
        let len = limb_count(params.bits());
        let modulus = params.modulus();

        let r = BigUint::one() << (32 * len);
        let q = limbs_of(modulus, len);
        let n0 = limbs::neg_inverse(q[0]);
        let one = limbs_of(&(&r % modulus), len);
        let r2 = limbs_of(&(&r * &r % modulus), len);
        let q_shifted = limbs_of(&(modulus * &r), 2 * len);
        let mut unit = vec![0u32; len].into_boxed_slice();
        unit[0] = 1;

        let root_of_unity = match params.sqrt_strategy() {
            SqrtStrategy::TonelliShanks {
                odd_part,
                nonresidue,
                ..
            } => {
                let c = nonresidue.modpow(odd_part, modulus);
                Some(limbs_of(&(c * &r % modulus), len))
            }
            _ => None,
        };

        let pools = Pools {
            single: RecycleBin::new("single", config.single_buffers, LimbCreator::new(len)),
            double: RecycleBin::new("double", config.double_buffers, LimbCreator::new(2 * len)),
            scratch: RecycleBin::new("scratch", config.scratch_buffers, LimbCreator::new(len)),
        };

        debug!(
            bits = params.bits(),
            limbs = len,
            single_pool = config.single_buffers,
            double_pool = config.double_buffers,
            scratch_pool = config.scratch_buffers,
            "montgomery field ready"
        );

        let canonical = FqCanonical::from_params(params.clone(), rng.clone());
        Ok(Self(Rc::new(MontgomeryContext {
            params,
            len,
            q,
            q_shifted,
            n0,
            one,
            r2,
            unit,
            zeros: vec![0u32; len].into_boxed_slice(),
            zeros_double: vec![0u32; 2 * len].into_boxed_slice(),
            root_of_unity,
            pools: RefCell::new(pools),
            rng,
            config,
            canonical,
        })))
    }

    /// Limbs per single-width value (`L`).
    #[inline]
    pub fn limb_count(&self) -> usize {
        self.0.len
    }

    #[inline]
    pub fn config(&self) -> PoolConfig {
        self.0.config
    }

    pub fn pool_stats(&self) -> FieldPoolStats {
        let pools = self.0.pools.borrow();
        FieldPoolStats {
            single: pools.single.stats(),
            double: pools.double.stats(),
            scratch: pools.scratch.stats(),
        }
    }

    /// Leave the Montgomery domain.
    pub fn to_canonical(&self, element: &FqElement) -> CanonicalElement {
        self.0.canonical.element(element.to_biguint())
    }

    /// Enter the Montgomery domain from a canonical element of the same
    /// modulus.
    pub fn from_canonical(&self, element: &CanonicalElement) -> Result<FqElement> {
        if element.field().modulus() != self.modulus() {
            return Err(FieldError::FieldMismatch);
        }
        Ok(self.from_value(&element.to_biguint()))
    }

    #[inline]
    pub(crate) fn params(&self) -> &FieldParams {
        &self.0.params
    }

    pub(crate) fn same_modulus(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0.q == other.0.q
    }

    #[inline]
    pub(crate) fn q(&self) -> &[u32] {
        &self.0.q
    }

    #[inline]
    pub(crate) fn q_shifted(&self) -> &[u32] {
        &self.0.q_shifted
    }

    #[inline]
    pub(crate) fn n0(&self) -> u32 {
        self.0.n0
    }

    #[inline]
    pub(crate) fn one_limbs(&self) -> &[u32] {
        &self.0.one
    }

    pub(crate) fn take_single(&self, source: &[u32]) -> Limbs {
        self.0.pools.borrow_mut().single.get(source)
    }

    pub(crate) fn put_single(&self, buffer: Limbs) {
        self.0.pools.borrow_mut().single.put(buffer);
    }

    pub(crate) fn take_double(&self, source: &[u32]) -> Limbs {
        self.0.pools.borrow_mut().double.get(source)
    }

    pub(crate) fn put_double(&self, buffer: Limbs) {
        self.0.pools.borrow_mut().double.put(buffer);
    }

    pub(crate) fn zeroed_double(&self) -> Limbs {
        self.take_double(&self.0.zeros_double)
    }

    fn take_scratch(&self) -> Limbs {
        self.0.pools.borrow_mut().scratch.get(&*self.0.zeros)
    }

    fn put_scratch(&self, buffer: Limbs) {
        self.0.pools.borrow_mut().scratch.put(buffer);
    }

    pub(crate) fn element(&self, value: Limbs) -> FqElement {
        FqElement::from_parts(self.clone(), value)
    }

    /// `value = value * rhs * R^-1 mod q`
    pub(crate) fn mul_assign_limbs(&self, value: &mut Limbs, rhs: &[u32]) {
        let mut acc = self.take_scratch();
        limbs::mont_mul(&mut acc, value, rhs, &self.0.q, self.0.n0);
        std::mem::swap(value, &mut acc);
        self.put_scratch(acc);
    }

    pub(crate) fn square_assign_limbs(&self, value: &mut Limbs) {
        let mut acc = self.take_scratch();
        let v: &[u32] = value;
        limbs::mont_mul(&mut acc, v, v, &self.0.q, self.0.n0);
        std::mem::swap(value, &mut acc);
        self.put_scratch(acc);
    }

    /// Left-to-right square-and-multiply on raw limbs.
    pub(crate) fn pow_assign_limbs(&self, value: &mut Limbs, exp: &BigUint) {
        let mut acc = self.take_scratch();
        acc.copy_from_slice(&self.0.one);
        for i in (0..exp.bits()).rev() {
            self.square_assign_limbs(&mut acc);
            if exp.bit(i) {
                self.mul_assign_limbs(&mut acc, &value[..]);
            }
        }
        std::mem::swap(value, &mut acc);
        self.put_scratch(acc);
    }

    /// Bring a value below `2^32 * q` into `[0, q)`.
    pub(crate) fn normalize(&self, value: &mut [u32]) {
        let q = &self.0.q;
        if limbs::compare(value, q) == std::cmp::Ordering::Less {
            return;
        }
        limbs::reduce_once(value, q);
        if limbs::compare(value, q) != std::cmp::Ordering::Less {
            let mut acc = self.take_scratch();
            limbs::mont_mul(&mut acc, value, &self.0.one, q, self.0.n0);
            value.copy_from_slice(&acc);
            self.put_scratch(acc);
        }
    }

    /// Run `f` on the reduced form of `value` without touching `value`.
    pub(crate) fn with_reduced<R>(&self, value: &[u32], f: impl FnOnce(&[u32]) -> R) -> R {
        if limbs::compare(value, &self.0.q) == std::cmp::Ordering::Less {
            return f(value);
        }
        let mut reduced = self.take_scratch();
        reduced.copy_from_slice(value);
        self.normalize(&mut reduced);
        let out = f(&reduced);
        self.put_scratch(reduced);
        out
    }

    /// Canonical integer of a Montgomery value.
    pub(crate) fn canonical_value(&self, value: &[u32]) -> BigUint {
        let mut acc = self.take_scratch();
        limbs::mont_mul(&mut acc, value, &self.0.unit, &self.0.q, self.0.n0);
        let out = limbs::to_biguint(&acc);
        self.put_scratch(acc);
        out
    }

    /// Montgomery limbs of a canonical value `< q`.
    fn from_value(&self, value: &BigUint) -> FqElement {
        let mut plain = self.take_scratch();
        let fits = limbs::copy_from_biguint(&mut plain, value);
        debug_assert!(fits);
        let mut out = self.take_single(&plain);
        self.mul_assign_limbs(&mut out, &self.0.r2);
        self.put_scratch(plain);
        self.element(out)
    }

    pub(crate) fn root_of_unity(&self) -> Option<FqElement> {
        self.0
            .root_of_unity
            .as_ref()
            .map(|c| self.element(self.take_single(c)))
    }
}

impl fmt::Debug for FqMontgomery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FqMontgomery")
            .field("modulus", self.modulus())
            .field("limbs", &self.0.len)
            .field("config", &self.0.config)
            .finish_non_exhaustive()
    }
}

impl PrimeField for FqMontgomery {
    type Element = FqElement;

    fn modulus(&self) -> &BigUint {
        self.0.params.modulus()
    }

    fn is_montgomery(&self) -> bool {
        true
    }

    fn element_from_bytes(&self, data: &[u8]) -> Result<FqElement> {
        let value = self.0.params.decode_bytes(data)?;
        Ok(self.from_value(&value))
    }

    fn element_from_biguints(&self, components: &[BigUint]) -> Result<FqElement> {
        FieldParams::check_arity(components.len())?;
        let value = self.0.params.canonical(components[0].clone())?;
        Ok(self.from_value(&value))
    }

    fn element_from_i64(&self, value: i64) -> FqElement {
        self.from_value(&self.0.params.residue_i64(value))
    }

    fn element_from_str_radix(&self, radix: u32, components: &[&str]) -> Result<FqElement> {
        FieldParams::check_arity(components.len())?;
        let value = self.0.params.parse(radix, components[0])?;
        Ok(self.from_value(&value))
    }

    fn element_from_elements(&self, elements: &[FqElement]) -> Result<FqElement> {
        FieldParams::check_arity(elements.len())?;
        let source = &elements[0];
        if !self.same_modulus(&source.field) {
            return Err(FieldError::FieldMismatch);
        }
        Ok(self.element(self.take_single(&source.value)))
    }

    fn random_element(&self) -> FqElement {
        let mut value = self.take_single(&self.0.zeros);
        {
            let mut rng = self.0.rng.borrow_mut();
            limbs::sample_below(&mut value, &self.0.q, self.0.params.bits(), &mut *rng);
        }
        // x -> x * R permutes [0, q), so the uniform sample is used as the
        // Montgomery value directly.
        self.element(value)
    }

    fn zero(&self) -> FqElement {
        self.element(self.take_single(&self.0.zeros))
    }

    fn one(&self) -> FqElement {
        self.element(self.take_single(&self.0.one))
    }

    fn two(&self) -> FqElement {
        let mut two = self.one();
        two.twice_mut();
        two
    }

    fn non_montgomery(&self) -> FqCanonical {
        self.0.canonical.clone()
    }

    fn non_montgomery_for(&self, modulus: &BigUint) -> Result<FqCanonical> {
        FqCanonical::new(self.0.rng.clone(), modulus)
    }

    fn new_for_modulus(&self, modulus: &BigUint) -> Result<Self> {
        Self::with_config(self.0.rng.clone(), modulus, self.0.config)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::error::{EncodingError, ModulusError};
    use crate::shared_rng;

    fn field(q: u64) -> FqMontgomery {
        FqMontgomery::new(shared_rng(ChaCha20Rng::seed_from_u64(1)), &BigUint::from(q)).unwrap()
    }

    #[test]
    fn constants_follow_the_limb_layout() {
        let f = field(1_000_003);
        assert_eq!(f.limb_count(), 3);
        assert_eq!(f.q_shifted().len(), 6);
        assert_eq!(&f.q_shifted()[..3], &[0, 0, 0]);
        assert_eq!(&f.q_shifted()[3..], f.q());
        assert_eq!(f.q()[0].wrapping_mul(f.n0()), u32::MAX);

        let r = BigUint::one() << 96usize;
        assert_eq!(limbs::to_biguint(f.one_limbs()), r % 1_000_003u32);
    }

    #[test]
    fn rejects_bad_moduli() {
        let rng = shared_rng(ChaCha20Rng::seed_from_u64(1));
        assert_eq!(
            FqMontgomery::new(rng.clone(), &BigUint::from(2u32)).unwrap_err(),
            FieldError::InvalidModulus(ModulusError::TooSmall)
        );
        assert_eq!(
            FqMontgomery::new(rng.clone(), &BigUint::from(1u32 << 20)).unwrap_err(),
            FieldError::InvalidModulus(ModulusError::Even)
        );
        // 3 * 5 * 17 * 257 * 65537
        let composite = BigUint::from(u32::MAX);
        assert_eq!(
            FqMontgomery::new(rng.clone(), &composite).unwrap_err(),
            FieldError::InvalidModulus(ModulusError::NotPrime)
        );
        let f = FqMontgomery::new(rng, &BigUint::from(97u32)).unwrap();
        assert!(f.new_for_modulus(&composite).is_err());
        assert!(f.non_montgomery_for(&composite).is_err());
    }

    #[test]
    fn factories_enforce_arity_and_canonical_input() {
        let f = field(97);
        assert_eq!(
            f.element_from_biguints(&[]).unwrap_err(),
            FieldError::InvalidArity { expected: 1, found: 0 }
        );
        assert_eq!(
            f.element_from_i64s(&[1, 2]).unwrap_err(),
            FieldError::InvalidArity { expected: 1, found: 2 }
        );
        assert!(matches!(
            f.element_from_bytes(&[97]),
            Err(FieldError::InvalidEncoding(EncodingError::NotCanonical { .. }))
        ));
        assert_eq!(f.element_from_bytes(&[0, 0, 96]).unwrap().to_biguint(), BigUint::from(96u32));
        assert_eq!(f.element_from_strs(&["42"]).unwrap().to_biguint(), BigUint::from(42u32));
        assert!(matches!(
            f.element_from_strs(&["1_0"]),
            Err(FieldError::InvalidEncoding(_))
        ));
        assert_eq!(
            f.element_from_str_radix(16, &["2a"]).unwrap(),
            f.element_from_i64(42)
        );
        assert_eq!(f.element_from_i64s(&[-1]).unwrap().to_biguint(), BigUint::from(96u32));
    }

    #[test]
    fn elements_of_other_moduli_are_rejected() {
        let f = field(97);
        let g = field(101);
        let foreign = g.element_from_i64(5);
        assert_eq!(
            f.element_from_elements(&[foreign]).unwrap_err(),
            FieldError::FieldMismatch
        );

        let sibling = f.new_for_modulus(&BigUint::from(97u32)).unwrap();
        let e = sibling.element_from_i64(5);
        assert_eq!(f.element_from_elements(&[e]).unwrap(), f.element_from_i64(5));
    }

    #[test]
    fn small_constants() {
        let f = field(97);
        assert!(f.zero().is_zero());
        assert!(f.one().is_one());
        assert_eq!(f.two().to_biguint(), BigUint::from(2u32));
        assert!(f.is_montgomery());
        assert!(!f.non_montgomery().is_montgomery());
        assert_eq!(f.number_of_coefficients(), 1);
    }

    #[test]
    fn canonical_round_trip() {
        let f = field(1_000_003);
        let canonical = f.non_montgomery();
        for v in [0i64, 1, 2, 999_999, -5] {
            let x = f.element_from_i64(v);
            let c = f.to_canonical(&x);
            assert_eq!(c, canonical.element_from_i64(v));
            assert_eq!(f.from_canonical(&c).unwrap(), x);
        }

        let other = f.non_montgomery_for(&BigUint::from(97u32)).unwrap();
        assert_eq!(
            f.from_canonical(&other.one()).unwrap_err(),
            FieldError::FieldMismatch
        );
    }

    #[test]
    fn pool_stats_track_reuse() {
        let f = field(97);
        let a = f.element_from_i64(3);
        let before = f.pool_stats();
        f.recycle(a);
        let b = f.one();
        let after = f.pool_stats();
        assert_eq!(after.single.returned, before.single.returned + 1);
        assert_eq!(after.single.hits, before.single.hits + 1);
        assert!(b.is_one());
        assert!(after.total().misses >= after.single.misses);
    }

    #[test]
    fn disabled_pools_never_retain() {
        let rng = shared_rng(ChaCha20Rng::seed_from_u64(1));
        let f = FqMontgomery::with_config(rng, &BigUint::from(97u32), PoolConfig::disabled())
            .unwrap();
        let x = f.element_from_i64(9);
        let y = x.mul(&x);
        f.recycle(x);
        f.recycle(y);
        let stats = f.pool_stats().total();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.returned, 0);
        assert!(stats.discarded >= 2);
    }
}

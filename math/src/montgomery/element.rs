use std::fmt;

use num_bigint::BigUint;

use super::{FqDoubleElement, FqMontgomery, Limbs};
use crate::error::Result;
use crate::limbs;
use crate::params;
use crate::traits::FieldElement;

/// Single-width element of an [`FqMontgomery`] field.
///
/// The buffer is checked out of the field's single-width pool; hand it back
/// with [`FieldElement::recycle`]. Dropping an element just frees the buffer.
pub struct FqElement {
    pub(crate) field: FqMontgomery,
    pub(crate) value: Limbs,
}

impl FqElement {
    pub(crate) fn from_parts(field: FqMontgomery, value: Limbs) -> Self {
        debug_assert_eq!(value.len(), field.limb_count());
        Self { field, value }
    }

    /// Raw Montgomery limbs, least significant first.
    #[inline]
    pub fn limbs(&self) -> &[u32] {
        &self.value
    }

    #[inline]
    fn check_field(&self, rhs: &Self) {
        debug_assert!(
            self.field.same_modulus(&rhs.field),
            "operands belong to different fields"
        );
    }
}

impl Clone for FqElement {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            value: self.field.take_single(&self.value),
        }
    }
}

impl PartialEq for FqElement {
    fn eq(&self, other: &Self) -> bool {
        self.field.same_modulus(&other.field)
            && self.field.with_reduced(&self.value, |a| {
                self.field.with_reduced(&other.value, |b| a == b)
            })
    }
}

impl Eq for FqElement {}

impl fmt::Display for FqElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FqElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fq({} [mont])", self.to_biguint())
    }
}

crate::macros::impl_field_ops!(FqElement);

impl FieldElement for FqElement {
    type Field = FqMontgomery;
    type Double = FqDoubleElement;

    fn field(&self) -> FqMontgomery {
        self.field.clone()
    }

    fn add_mut(&mut self, rhs: &Self) -> &mut Self {
        self.check_field(rhs);
        limbs::add_assign(&mut self.value, &rhs.value);
        self.field.normalize(&mut self.value);
        self
    }

    fn sub_mut(&mut self, rhs: &Self) -> &mut Self {
        self.check_field(rhs);
        let field = &self.field;
        field.normalize(&mut self.value);
        let value = &mut self.value;
        field.with_reduced(&rhs.value, |b| {
            if limbs::sub_assign(value, b) != 0 {
                limbs::add_assign(value, field.q());
            }
        });
        self
    }

    fn mul_mut(&mut self, rhs: &Self) -> &mut Self {
        self.check_field(rhs);
        self.field.mul_assign_limbs(&mut self.value, &rhs.value);
        self
    }

    fn square_mut(&mut self) -> &mut Self {
        self.field.square_assign_limbs(&mut self.value);
        self
    }

    fn negate_mut(&mut self) -> &mut Self {
        self.field.normalize(&mut self.value);
        limbs::neg_mod(&mut self.value, self.field.q());
        self
    }

    fn twice_mut(&mut self) -> &mut Self {
        let carry = limbs::shl1(&mut self.value);
        debug_assert_eq!(carry, 0);
        self.field.normalize(&mut self.value);
        self
    }

    fn div_by_two_mut(&mut self) -> &mut Self {
        self.field.normalize(&mut self.value);
        if limbs::is_odd(&self.value) {
            let carry = limbs::add_assign(&mut self.value, self.field.q());
            limbs::shr1(&mut self.value, carry);
        } else {
            limbs::shr1(&mut self.value, 0);
        }
        self
    }

    fn div_by_four_mut(&mut self) -> &mut Self {
        self.div_by_two_mut().div_by_two_mut()
    }

    fn add_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self {
        self.check_field(rhs);
        let carry = limbs::add_assign(&mut self.value, &rhs.value);
        debug_assert_eq!(carry, 0, "unreduced chain overflowed the guard limbs");
        self
    }

    fn sub_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self {
        self.sub_mut(rhs)
    }

    fn twice_no_reduction_mut(&mut self) -> &mut Self {
        let carry = limbs::shl1(&mut self.value);
        debug_assert_eq!(carry, 0, "unreduced chain overflowed the guard limbs");
        self
    }

    fn reduce_mut(&mut self) -> &mut Self {
        self.field.normalize(&mut self.value);
        self
    }

    fn invert_mut(&mut self) -> Result<&mut Self> {
        let field = self.field.clone();
        params::invert_assign(self, field.params())?;
        Ok(self)
    }

    fn sqrt_mut(&mut self) -> Result<&mut Self> {
        let field = self.field.clone();
        params::sqrt_assign(self, field.params(), field.root_of_unity())?;
        Ok(self)
    }

    fn mul_integer_mut(&mut self, k: &BigUint) -> &mut Self {
        let scalar = self.field.from_value(&self.field.params().reduce(k));
        self.mul_mut(&scalar);
        scalar.recycle();
        self
    }

    fn pow_mut(&mut self, exp: &BigUint) -> &mut Self {
        self.field.pow_assign_limbs(&mut self.value, exp);
        self
    }

    fn mul_double(&self, rhs: &Self) -> FqDoubleElement {
        self.check_field(rhs);
        let mut out = self.field.zeroed_double();
        limbs::mul_wide(&mut out, &self.value, &rhs.value);
        FqDoubleElement::from_parts(self.field.clone(), out)
    }

    fn to_biguint(&self) -> BigUint {
        self.field.canonical_value(&self.value)
    }

    fn is_zero(&self) -> bool {
        self.field.with_reduced(&self.value, limbs::is_zero)
    }

    fn is_one(&self) -> bool {
        self.field
            .with_reduced(&self.value, |v| v == self.field.one_limbs())
    }

    fn recycle(self) {
        self.field.put_single(self.value);
    }
}

#[cfg(test)]
mod tests {
    use num_traits::One;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use test_strategy::proptest;

    use super::*;
    use crate::config::MAX_UNREDUCED_SUMMANDS;
    use crate::error::FieldError;
    use crate::shared_rng;
    use crate::traits::PrimeField;

    fn curve25519_q() -> BigUint {
        (BigUint::one() << 255usize) - 19u32
    }

    fn field() -> FqMontgomery {
        FqMontgomery::new(shared_rng(ChaCha20Rng::seed_from_u64(11)), &curve25519_q()).unwrap()
    }

    fn element(f: &FqMontgomery, raw: [u32; 8]) -> FqElement {
        let value = BigUint::from_slice(&raw) % f.modulus();
        f.element_from_biguints(&[value]).unwrap()
    }

    #[test]
    fn small_products_inverse_and_root() {
        let f = field();
        let q = curve25519_q();
        let two = f.element_from_i64(2);
        let three = f.element_from_i64(3);
        assert_eq!(two.mul(&three).to_biguint(), BigUint::from(6u32));
        assert_eq!(
            two.invert().unwrap().to_biguint(),
            (&q + 1u32) >> 1usize
        );

        let root = f.element_from_i64(4).sqrt().unwrap().to_biguint();
        assert!(root == BigUint::from(2u32) || root == &q - 2u32, "root = {root}");
    }

    #[test]
    fn formatting_and_bytes() {
        let f = field();
        let x = f.element_from_i64(258);
        assert_eq!(x.to_string(), "258");
        assert_eq!(format!("{x:?}"), "Fq(258 [mont])");
        assert_eq!(x.to_bytes_be(), vec![1, 2]);
        assert_eq!(x.to_str_radix(16), "102");
        assert_eq!(f.zero().to_bytes_be(), vec![0]);
        assert_eq!(f.element_from_bytes(&x.to_bytes_be()).unwrap(), x);
    }

    #[test]
    fn zero_has_no_inverse() {
        let f = field();
        assert_eq!(f.zero().invert(), Err(FieldError::NonInvertible));
        let mut zero = f.zero();
        assert_eq!(zero.invert_mut().map(|z| z.is_zero()), Err(FieldError::NonInvertible));
    }

    #[test]
    fn non_residues_have_no_root() {
        let f = field();
        // 2 is a non-residue modulo p when p = 5 (mod 8).
        assert_eq!(f.two().sqrt(), Err(FieldError::NonResidue));
        assert!(f.zero().sqrt().unwrap().is_zero());
    }

    #[test]
    fn three_mod_four_roots() {
        let rng = shared_rng(ChaCha20Rng::seed_from_u64(2));
        // secp256k1 base field
        let q = BigUint::parse_bytes(
            b"fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
            16,
        )
        .unwrap();
        let f = FqMontgomery::new(rng, &q).unwrap();
        for _ in 0..16 {
            let x = f.random_element();
            let square = x.square();
            let root = square.sqrt().unwrap();
            assert!(root == x || root == x.negate());
        }
    }

    #[proptest(cases = 64)]
    fn addition_is_commutative_and_associative(a: [u32; 8], b: [u32; 8], c: [u32; 8]) {
        let f = field();
        let (a, b, c) = (element(&f, a), element(&f, b), element(&f, c));
        prop_assert_eq!(&a + &b, &b + &a);
        prop_assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    #[proptest(cases = 64)]
    fn multiplication_distributes_over_addition(a: [u32; 8], b: [u32; 8], c: [u32; 8]) {
        let f = field();
        let (a, b, c) = (element(&f, a), element(&f, b), element(&f, c));
        prop_assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
    }

    #[proptest(cases = 64)]
    fn negation_and_inversion_give_identities(a: [u32; 8]) {
        let f = field();
        let a = element(&f, a);
        prop_assert!((&a + &(-&a)).is_zero());
        prop_assert!(a.sub(&a).is_zero());
        if !a.is_zero() {
            prop_assert!(a.invert().unwrap().mul(&a).is_one());
        }
    }

    #[proptest(cases = 64)]
    fn mul_matches_the_canonical_field(a: [u32; 8], b: [u32; 8]) {
        let f = field();
        let canonical = f.non_montgomery();
        let (a, b) = (element(&f, a), element(&f, b));
        let expected = f.to_canonical(&a).mul(&f.to_canonical(&b));
        prop_assert_eq!(f.to_canonical(&a.mul(&b)), expected.clone());
        prop_assert_eq!(
            a.mul(&b).to_biguint(),
            a.to_biguint() * b.to_biguint() % canonical.modulus()
        );
        prop_assert_eq!(f.from_canonical(&expected).unwrap(), a.mul(&b));
        prop_assert_eq!(a.square(), a.mul(&a));
    }

    #[proptest(cases = 64)]
    fn montgomery_round_trip(a: [u32; 8]) {
        let f = field();
        let x = element(&f, a);
        let back = f.from_canonical(&f.to_canonical(&x)).unwrap();
        prop_assert_eq!(back.limbs(), x.limbs());
    }

    #[proptest(cases = 64)]
    fn halving_undoes_doubling(a: [u32; 8]) {
        let f = field();
        let a = element(&f, a);
        prop_assert_eq!(a.twice().div_by_two(), a.clone());
        let four_a = a.twice().twice();
        prop_assert_eq!(four_a.div_by_four(), a.clone());
        prop_assert_eq!(a.div_by_four(), a.div_by_two().div_by_two());
    }

    #[proptest(cases = 32)]
    fn unreduced_chains_match_reduced_ones(
        a: [u32; 8],
        b: [u32; 8],
        #[strategy(1usize..64)] k: usize,
    ) {
        let f = field();
        let (a, b) = (element(&f, a), element(&f, b));
        prop_assert!((k as u64) < MAX_UNREDUCED_SUMMANDS);

        let mut lazy = a.clone();
        let mut eager = a.clone();
        for _ in 0..k {
            lazy.add_no_reduction_mut(&b);
            eager.add_mut(&b);
        }
        lazy.twice_no_reduction_mut();
        eager.twice_mut();

        prop_assert_eq!(&lazy, &eager);
        prop_assert_eq!(lazy.to_biguint(), eager.to_biguint());
        prop_assert_eq!(lazy.mul(&b), eager.mul(&b));
        prop_assert_eq!(lazy.sub_no_reduction(&b), eager.sub(&b));
        let reduced = lazy.reduce();
        prop_assert_eq!(reduced.limbs(), eager.limbs());
    }

    #[proptest(cases = 32)]
    fn pow_and_integer_multiples(a: [u32; 8], #[strategy(0u64..1_000)] k: u64) {
        let f = field();
        let a = element(&f, a);
        let k = BigUint::from(k);
        let expected = a.to_biguint() * &k % f.modulus();
        prop_assert_eq!(a.mul_integer(&k).to_biguint(), expected);
        prop_assert_eq!(
            a.pow(&k).to_biguint(),
            a.to_biguint().modpow(&k, f.modulus())
        );
    }

    #[test]
    fn recycled_buffers_never_alias_live_elements() {
        let f = field();
        let live = f.element_from_i64(12345);
        let dead = f.element_from_i64(999);
        let live_ptr = live.limbs().as_ptr();
        dead.recycle();

        let hits = f.pool_stats().single.hits;
        let mut reused = f.element_from_i64(7);
        assert_eq!(f.pool_stats().single.hits, hits + 1);
        assert_ne!(reused.limbs().as_ptr(), live_ptr);
        reused.add_mut(&live);
        assert_eq!(live.to_biguint(), BigUint::from(12345u32));
        assert_eq!(reused.to_biguint(), BigUint::from(12352u32));

        let copy = live.clone();
        assert_ne!(copy.limbs().as_ptr(), live_ptr);
        assert_eq!(copy, live);
    }

    #[test]
    fn in_place_operations_chain() {
        let f = field();
        let mut x = f.element_from_i64(5);
        let three = f.element_from_i64(3);
        x.add_mut(&three).mul_mut(&three).square_mut().negate_mut();
        assert_eq!(x, f.element_from_i64(-576));

        x += &three;
        x -= &three;
        x *= &three;
        assert_eq!(x, f.element_from_i64(-1728));
    }
}

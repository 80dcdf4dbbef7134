//! Arbitrary-precision prime field on canonical representatives.
//!
//! Slower than the Montgomery engine but free of any limb layout; used for
//! interoperability and as a reference for testing.

use std::fmt;
use std::rc::Rc;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use tracing::debug;

use crate::error::{FieldError, Result};
use crate::limbs;
use crate::params::{self, FieldParams, SqrtStrategy};
use crate::traits::{DoubleElement, FieldElement, PrimeField};
use crate::SharedRng;

struct CanonicalContext {
    params: Rc<FieldParams>,
    root_of_unity: Option<BigUint>,
    rng: SharedRng,
}

/// Prime field whose elements are plain residues in `[0, q)`.
#[derive(Clone)]
pub struct FqCanonical(Rc<CanonicalContext>);

impl FqCanonical {
    pub fn new(rng: SharedRng, order: &BigUint) -> Result<Self> {
        let params = Rc::new(FieldParams::new(order)?);
        debug!(bits = params.bits(), "canonical field ready");
        Ok(Self::from_params(params, rng))
    }

    pub(crate) fn from_params(params: Rc<FieldParams>, rng: SharedRng) -> Self {
        let root_of_unity = match params.sqrt_strategy() {
            SqrtStrategy::TonelliShanks {
                odd_part,
                nonresidue,
                ..
            } => Some(nonresidue.modpow(odd_part, params.modulus())),
            _ => None,
        };
        Self(Rc::new(CanonicalContext {
            params,
            root_of_unity,
            rng,
        }))
    }

    /// Wrap a residue that is already below `q`.
    pub(crate) fn element(&self, value: BigUint) -> CanonicalElement {
        debug_assert!(value < *self.modulus());
        CanonicalElement {
            field: self.clone(),
            value,
        }
    }

    fn q(&self) -> &BigUint {
        self.0.params.modulus()
    }
}

impl fmt::Debug for FqCanonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FqCanonical")
            .field("modulus", self.modulus())
            .finish_non_exhaustive()
    }
}

impl PrimeField for FqCanonical {
    type Element = CanonicalElement;

    fn modulus(&self) -> &BigUint {
        self.0.params.modulus()
    }

    fn is_montgomery(&self) -> bool {
        false
    }

    fn element_from_bytes(&self, data: &[u8]) -> Result<CanonicalElement> {
        Ok(self.element(self.0.params.decode_bytes(data)?))
    }

    fn element_from_biguints(&self, components: &[BigUint]) -> Result<CanonicalElement> {
        FieldParams::check_arity(components.len())?;
        Ok(self.element(self.0.params.canonical(components[0].clone())?))
    }

    fn element_from_i64(&self, value: i64) -> CanonicalElement {
        self.element(self.0.params.residue_i64(value))
    }

    fn element_from_str_radix(&self, radix: u32, components: &[&str]) -> Result<CanonicalElement> {
        FieldParams::check_arity(components.len())?;
        Ok(self.element(self.0.params.parse(radix, components[0])?))
    }

    fn element_from_elements(&self, elements: &[CanonicalElement]) -> Result<CanonicalElement> {
        FieldParams::check_arity(elements.len())?;
        let source = &elements[0];
        if source.field.modulus() != self.modulus() {
            return Err(FieldError::FieldMismatch);
        }
        Ok(self.element(source.value.clone()))
    }

    fn random_element(&self) -> CanonicalElement {
        let q = self.q().to_u32_digits();
        let mut sample = vec![0u32; q.len()];
        {
            let mut rng = self.0.rng.borrow_mut();
            limbs::sample_below(&mut sample, &q, self.0.params.bits(), &mut *rng);
        }
        self.element(limbs::to_biguint(&sample))
    }

    fn zero(&self) -> CanonicalElement {
        self.element(BigUint::zero())
    }

    fn one(&self) -> CanonicalElement {
        self.element(BigUint::one())
    }

    fn two(&self) -> CanonicalElement {
        self.element_from_i64(2)
    }

    fn non_montgomery(&self) -> FqCanonical {
        self.clone()
    }

    fn non_montgomery_for(&self, modulus: &BigUint) -> Result<FqCanonical> {
        FqCanonical::new(self.0.rng.clone(), modulus)
    }

    fn new_for_modulus(&self, modulus: &BigUint) -> Result<Self> {
        FqCanonical::new(self.0.rng.clone(), modulus)
    }
}

/// Element of an [`FqCanonical`] field, always reduced.
#[derive(Clone)]
pub struct CanonicalElement {
    field: FqCanonical,
    value: BigUint,
}

impl PartialEq for CanonicalElement {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.field.modulus() == other.field.modulus()
    }
}

impl Eq for CanonicalElement {}

impl fmt::Display for CanonicalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Debug for CanonicalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fq({})", self.value)
    }
}

impl CanonicalElement {
    fn set(&mut self, value: BigUint) -> &mut Self {
        self.value = value;
        self
    }
}

crate::macros::impl_field_ops!(CanonicalElement);

impl FieldElement for CanonicalElement {
    type Field = FqCanonical;
    type Double = CanonicalDoubleElement;

    fn field(&self) -> FqCanonical {
        self.field.clone()
    }

    fn add_mut(&mut self, rhs: &Self) -> &mut Self {
        let sum = (&self.value + &rhs.value) % self.field.q();
        self.set(sum)
    }

    fn sub_mut(&mut self, rhs: &Self) -> &mut Self {
        let difference = if self.value >= rhs.value {
            &self.value - &rhs.value
        } else {
            &self.value + self.field.q() - &rhs.value
        };
        self.set(difference)
    }

    fn mul_mut(&mut self, rhs: &Self) -> &mut Self {
        let product = (&self.value * &rhs.value) % self.field.q();
        self.set(product)
    }

    fn square_mut(&mut self) -> &mut Self {
        let square = (&self.value * &self.value) % self.field.q();
        self.set(square)
    }

    fn negate_mut(&mut self) -> &mut Self {
        if !self.value.is_zero() {
            let negated = self.field.q() - &self.value;
            self.set(negated);
        }
        self
    }

    fn twice_mut(&mut self) -> &mut Self {
        let doubled = (&self.value << 1usize) % self.field.q();
        self.set(doubled)
    }

    fn div_by_two_mut(&mut self) -> &mut Self {
        let halved = if self.value.bit(0) {
            (&self.value + self.field.q()) >> 1usize
        } else {
            &self.value >> 1usize
        };
        self.set(halved)
    }

    fn div_by_four_mut(&mut self) -> &mut Self {
        self.div_by_two_mut().div_by_two_mut()
    }

    // Residues are kept reduced; the unreduced variants only exist for the
    // Montgomery engine.
    fn add_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self {
        self.add_mut(rhs)
    }

    fn sub_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self {
        self.sub_mut(rhs)
    }

    fn twice_no_reduction_mut(&mut self) -> &mut Self {
        self.twice_mut()
    }

    fn reduce_mut(&mut self) -> &mut Self {
        self
    }

    fn invert_mut(&mut self) -> Result<&mut Self> {
        let field = self.field.clone();
        params::invert_assign(self, &field.0.params)?;
        Ok(self)
    }

    fn sqrt_mut(&mut self) -> Result<&mut Self> {
        let field = self.field.clone();
        let root_of_unity = field.0.root_of_unity.clone().map(|c| field.element(c));
        params::sqrt_assign(self, &field.0.params, root_of_unity)?;
        Ok(self)
    }

    fn mul_integer_mut(&mut self, k: &BigUint) -> &mut Self {
        let product = (&self.value * k) % self.field.q();
        self.set(product)
    }

    fn pow_mut(&mut self, exp: &BigUint) -> &mut Self {
        let power = self.value.modpow(exp, self.field.q());
        self.set(power)
    }

    fn mul_double(&self, rhs: &Self) -> CanonicalDoubleElement {
        CanonicalDoubleElement {
            field: self.field.clone(),
            value: BigInt::from(&self.value * &rhs.value),
        }
    }

    fn to_biguint(&self) -> BigUint {
        self.value.clone()
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    fn is_one(&self) -> bool {
        self.value.is_one()
    }

    fn recycle(self) {}
}

/// Unreduced product in an [`FqCanonical`] field. May go negative under
/// subtraction; [`DoubleElement::reduce`] maps it back into `[0, q)`.
#[derive(Clone)]
pub struct CanonicalDoubleElement {
    field: FqCanonical,
    value: BigInt,
}

impl PartialEq for CanonicalDoubleElement {
    fn eq(&self, other: &Self) -> bool {
        self.reduce() == other.reduce()
    }
}

impl fmt::Debug for CanonicalDoubleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FqDouble({})", self.value)
    }
}

impl DoubleElement for CanonicalDoubleElement {
    type Single = CanonicalElement;

    fn add_mut(&mut self, rhs: &Self) -> &mut Self {
        self.value += &rhs.value;
        self
    }

    fn sub_mut(&mut self, rhs: &Self) -> &mut Self {
        self.value -= &rhs.value;
        self
    }

    fn twice_mut(&mut self) -> &mut Self {
        self.value <<= 1usize;
        self
    }

    fn sub_opt1_mut(&mut self, rhs: &Self) -> &mut Self {
        self.value += BigInt::from(self.field.q().clone());
        self.sub_mut(rhs)
    }

    fn reduce(&self) -> CanonicalElement {
        let q = self.field.q();
        let (sign, magnitude) = self.value.clone().into_parts();
        let residue = magnitude % q;
        let value = if sign == Sign::Minus && !residue.is_zero() {
            q - residue
        } else {
            residue
        };
        self.field.element(value)
    }

    fn recycle(self) {}
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::shared_rng;

    fn field(q: u64) -> FqCanonical {
        FqCanonical::new(shared_rng(ChaCha20Rng::seed_from_u64(5)), &BigUint::from(q)).unwrap()
    }

    #[test]
    fn arithmetic_stays_reduced() {
        let f = field(97);
        let a = f.element_from_i64(90);
        let b = f.element_from_i64(10);
        assert_eq!(a.add(&b).to_biguint(), BigUint::from(3u32));
        assert_eq!(b.sub(&a).to_biguint(), BigUint::from(17u32));
        assert_eq!(a.mul(&b).to_biguint(), BigUint::from(900u32 % 97));
        assert_eq!(a.negate().to_biguint(), BigUint::from(7u32));
        assert_eq!(f.zero().negate(), f.zero());
        assert_eq!(b.div_by_two().to_biguint(), BigUint::from(5u32));
        assert_eq!(f.one().div_by_two().to_biguint(), BigUint::from(49u32));
        assert_eq!(a.add_no_reduction(&b), a.add(&b));
    }

    #[test]
    fn inversion_and_square_roots() {
        let f = field(65_537);
        let three = f.element_from_i64(3);
        assert!(three.invert().unwrap().mul(&three).is_one());
        assert_eq!(f.zero().invert(), Err(FieldError::NonInvertible));
        // 3 generates the multiplicative group of this Fermat prime.
        assert_eq!(three.sqrt(), Err(FieldError::NonResidue));

        let nine = f.element_from_i64(9);
        let root = nine.sqrt().unwrap();
        assert_eq!(root.square(), nine);
        assert_eq!(f.zero().sqrt().unwrap(), f.zero());
    }

    #[test]
    fn negative_doubles_reduce_to_their_residue() {
        let f = field(97);
        let two = f.two().square_double();
        let three = f.element_from_i64(3).square_double();
        assert_eq!(two.sub(&three).reduce().to_biguint(), BigUint::from(92u32));
        assert_eq!(two.sub_opt1(&three), two.sub(&three));
        assert_eq!(f.from_double(&three).to_biguint(), BigUint::from(9u32));
    }

    #[test]
    fn random_elements_are_below_the_modulus() {
        let f = field(65_537);
        let q = BigUint::from(65_537u32);
        for _ in 0..500 {
            assert!(f.random_element().to_biguint() < q);
        }
    }
}

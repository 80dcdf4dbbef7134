//! Capability traits shared by the Montgomery and canonical field variants.
//!
//! Tower-extension fields and curve arithmetic are written generically over
//! [`PrimeField`]; [`PrimeField::is_montgomery`] lets them pick conversion
//! paths at run time.

use std::fmt::Debug;
use std::fmt::Display;

use num_bigint::BigUint;

use crate::canonical::FqCanonical;
use crate::error::Result;

/// Factory and domain surface of a prime field.
pub trait PrimeField: Clone + Debug {
    type Element: FieldElement<Field = Self>;

    fn modulus(&self) -> &BigUint;

    /// Whether elements are stored as `x * R mod q`.
    fn is_montgomery(&self) -> bool;

    /// Coefficients per element; always one for Fq.
    fn number_of_coefficients(&self) -> usize {
        crate::params::COEFFICIENTS
    }

    /// Decode big-endian canonical bytes.
    fn element_from_bytes(&self, data: &[u8]) -> Result<Self::Element>;

    fn element_from_biguints(&self, components: &[BigUint]) -> Result<Self::Element>;

    /// The residue of `value`; never fails.
    fn element_from_i64(&self, value: i64) -> Self::Element;

    fn element_from_i64s(&self, components: &[i64]) -> Result<Self::Element> {
        crate::params::FieldParams::check_arity(components.len())?;
        Ok(self.element_from_i64(components[0]))
    }

    fn element_from_str_radix(&self, radix: u32, components: &[&str]) -> Result<Self::Element>;

    fn element_from_strs(&self, components: &[&str]) -> Result<Self::Element> {
        self.element_from_str_radix(10, components)
    }

    fn element_from_elements(&self, elements: &[Self::Element]) -> Result<Self::Element>;

    /// Reduce a double-width value into this field.
    fn from_double(&self, double: &<Self::Element as FieldElement>::Double) -> Self::Element {
        double.reduce()
    }

    /// Uniformly distributed element in `[0, q)`.
    fn random_element(&self) -> Self::Element;

    fn zero(&self) -> Self::Element;

    fn one(&self) -> Self::Element;

    fn two(&self) -> Self::Element;

    /// Field of the same modulus working on canonical representations.
    fn non_montgomery(&self) -> FqCanonical;

    /// Canonical field for another modulus, sharing the random source.
    fn non_montgomery_for(&self, modulus: &BigUint) -> Result<FqCanonical>;

    /// Sibling field of the same variant for another modulus.
    fn new_for_modulus(&self, modulus: &BigUint) -> Result<Self>;

    /// Hand an element's storage back to the field.
    fn recycle(&self, element: Self::Element) {
        element.recycle();
    }
}

/// Element surface. Every operation comes as a copy-returning method and a
/// `_mut` method that mutates the receiver and returns it for chaining.
pub trait FieldElement: Clone + PartialEq + Debug + Display + Sized {
    type Field: PrimeField<Element = Self>;
    type Double: DoubleElement<Single = Self>;

    fn field(&self) -> Self::Field;

    fn add_mut(&mut self, rhs: &Self) -> &mut Self;
    fn sub_mut(&mut self, rhs: &Self) -> &mut Self;
    fn mul_mut(&mut self, rhs: &Self) -> &mut Self;
    fn square_mut(&mut self) -> &mut Self;
    fn negate_mut(&mut self) -> &mut Self;
    fn twice_mut(&mut self) -> &mut Self;
    fn div_by_two_mut(&mut self) -> &mut Self;
    fn div_by_four_mut(&mut self) -> &mut Self;

    /// `self += rhs` without bringing the sum back below `q`.
    fn add_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self;
    fn sub_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self;
    fn twice_no_reduction_mut(&mut self) -> &mut Self;

    /// Bring an unreduced value back into `[0, q)`.
    fn reduce_mut(&mut self) -> &mut Self;

    fn invert_mut(&mut self) -> Result<&mut Self>;
    fn sqrt_mut(&mut self) -> Result<&mut Self>;

    /// `self * k` for an integer scalar `k`.
    fn mul_integer_mut(&mut self, k: &BigUint) -> &mut Self;

    /// Square-and-multiply, most significant bit first.
    fn pow_mut(&mut self, exp: &BigUint) -> &mut Self {
        let base = self.clone();
        let mut acc = self.field().one();
        for i in (0..exp.bits()).rev() {
            acc.square_mut();
            if exp.bit(i) {
                acc.mul_mut(&base);
            }
        }
        std::mem::swap(self, &mut acc);
        acc.recycle();
        base.recycle();
        self
    }

    /// Full product, reduction deferred.
    #[must_use]
    fn mul_double(&self, rhs: &Self) -> Self::Double;

    #[must_use]
    fn square_double(&self) -> Self::Double {
        self.mul_double(self)
    }

    /// Canonical integer value in `[0, q)`.
    fn to_biguint(&self) -> BigUint;

    /// Big-endian bytes of the canonical value, without sign padding.
    fn to_bytes_be(&self) -> Vec<u8> {
        self.to_biguint().to_bytes_be()
    }

    fn to_str_radix(&self, radix: u32) -> String {
        self.to_biguint().to_str_radix(radix)
    }

    fn is_zero(&self) -> bool;
    fn is_one(&self) -> bool;

    /// Release storage for reuse by later operations of the same field.
    fn recycle(self);

    #[must_use]
    fn add(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.add_mut(rhs);
        out
    }

    #[must_use]
    fn sub(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.sub_mut(rhs);
        out
    }

    #[must_use]
    fn mul(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.mul_mut(rhs);
        out
    }

    #[must_use]
    fn square(&self) -> Self {
        let mut out = self.clone();
        out.square_mut();
        out
    }

    #[must_use]
    fn negate(&self) -> Self {
        let mut out = self.clone();
        out.negate_mut();
        out
    }

    #[must_use]
    fn twice(&self) -> Self {
        let mut out = self.clone();
        out.twice_mut();
        out
    }

    #[must_use]
    fn div_by_two(&self) -> Self {
        let mut out = self.clone();
        out.div_by_two_mut();
        out
    }

    #[must_use]
    fn div_by_four(&self) -> Self {
        let mut out = self.clone();
        out.div_by_four_mut();
        out
    }

    #[must_use]
    fn add_no_reduction(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.add_no_reduction_mut(rhs);
        out
    }

    #[must_use]
    fn sub_no_reduction(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.sub_no_reduction_mut(rhs);
        out
    }

    #[must_use]
    fn twice_no_reduction(&self) -> Self {
        let mut out = self.clone();
        out.twice_no_reduction_mut();
        out
    }

    #[must_use]
    fn reduce(&self) -> Self {
        let mut out = self.clone();
        out.reduce_mut();
        out
    }

    #[must_use]
    fn pow(&self, exp: &BigUint) -> Self {
        let mut out = self.clone();
        out.pow_mut(exp);
        out
    }

    #[must_use]
    fn mul_integer(&self, k: &BigUint) -> Self {
        let mut out = self.clone();
        out.mul_integer_mut(k);
        out
    }

    fn invert(&self) -> Result<Self> {
        let mut out = self.clone();
        let outcome = out.invert_mut().map(|_| ());
        match outcome {
            Ok(()) => Ok(out),
            Err(err) => {
                out.recycle();
                Err(err)
            }
        }
    }

    fn sqrt(&self) -> Result<Self> {
        let mut out = self.clone();
        let outcome = out.sqrt_mut().map(|_| ());
        match outcome {
            Ok(()) => Ok(out),
            Err(err) => {
                out.recycle();
                Err(err)
            }
        }
    }
}

/// Unreduced double-width intermediate, collapsed by [`DoubleElement::reduce`].
pub trait DoubleElement: Clone + PartialEq + Debug + Sized {
    type Single: FieldElement<Double = Self>;

    fn add_mut(&mut self, rhs: &Self) -> &mut Self;

    /// Subtraction; a negative difference is lifted by multiples of `q * R`.
    fn sub_mut(&mut self, rhs: &Self) -> &mut Self;

    fn twice_mut(&mut self) -> &mut Self;

    /// Add the field's `q * R` constant, then subtract `rhs`.
    fn sub_opt1_mut(&mut self, rhs: &Self) -> &mut Self;

    fn sub_no_reduction_mut(&mut self, rhs: &Self) -> &mut Self {
        self.sub_mut(rhs)
    }

    /// Montgomery reduction into a single-width element.
    #[must_use]
    fn reduce(&self) -> Self::Single;

    fn recycle(self);

    #[must_use]
    fn add(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.add_mut(rhs);
        out
    }

    #[must_use]
    fn sub(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.sub_mut(rhs);
        out
    }

    #[must_use]
    fn twice(&self) -> Self {
        let mut out = self.clone();
        out.twice_mut();
        out
    }

    #[must_use]
    fn sub_opt1(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.sub_opt1_mut(rhs);
        out
    }

    #[must_use]
    fn sub_no_reduction(&self, rhs: &Self) -> Self {
        let mut out = self.clone();
        out.sub_no_reduction_mut(rhs);
        out
    }

    /// Canonical value of the field element this double represents.
    fn to_biguint(&self) -> BigUint {
        let single = self.reduce();
        let value = single.to_biguint();
        single.recycle();
        value
    }

    fn to_bytes_be(&self) -> Vec<u8> {
        self.to_biguint().to_bytes_be()
    }

    fn is_zero(&self) -> bool {
        let single = self.reduce();
        let zero = single.is_zero();
        single.recycle();
        zero
    }

    fn is_one(&self) -> bool {
        let single = self.reduce();
        let one = single.is_one();
        single.recycle();
        one
    }
}

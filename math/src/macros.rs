//! Shared macros for constructing field elements and wiring operators.

/// Simplifies constructing field elements from machine integers.
///
/// Negative values map to their residue, so `fq!(field, -1)` is `q - 1`.
///
/// ```
/// use fq_math::prelude::*;
/// use rand::SeedableRng;
///
/// let rng = shared_rng(rand_chacha::ChaCha20Rng::seed_from_u64(0));
/// let field = FqMontgomery::new(rng, &BigUint::from(97u32)).unwrap();
/// let a = fq!(field, 42);
/// let b = fq!(field, -55);
/// assert_eq!(&a + &b, fq!(field, 42 - 55));
/// assert_eq!(b.to_biguint(), BigUint::from(42u32));
/// ```
#[macro_export]
macro_rules! fq {
    ($field:expr, $value:expr) => {
        $crate::traits::PrimeField::element_from_i64(&$field, $value)
    };
}

/// Operator sugar on references, delegating to [`FieldElement`].
///
/// [`FieldElement`]: crate::traits::FieldElement
macro_rules! impl_field_ops {
    ($element:ty) => {
        impl ::std::ops::Add<&$element> for &$element {
            type Output = $element;

            fn add(self, rhs: &$element) -> $element {
                $crate::traits::FieldElement::add(self, rhs)
            }
        }

        impl ::std::ops::Sub<&$element> for &$element {
            type Output = $element;

            fn sub(self, rhs: &$element) -> $element {
                $crate::traits::FieldElement::sub(self, rhs)
            }
        }

        impl ::std::ops::Mul<&$element> for &$element {
            type Output = $element;

            fn mul(self, rhs: &$element) -> $element {
                $crate::traits::FieldElement::mul(self, rhs)
            }
        }

        impl ::std::ops::Neg for &$element {
            type Output = $element;

            fn neg(self) -> $element {
                $crate::traits::FieldElement::negate(self)
            }
        }

        impl ::std::ops::AddAssign<&$element> for $element {
            fn add_assign(&mut self, rhs: &$element) {
                $crate::traits::FieldElement::add_mut(self, rhs);
            }
        }

        impl ::std::ops::SubAssign<&$element> for $element {
            fn sub_assign(&mut self, rhs: &$element) {
                $crate::traits::FieldElement::sub_mut(self, rhs);
            }
        }

        impl ::std::ops::MulAssign<&$element> for $element {
            fn mul_assign(&mut self, rhs: &$element) {
                $crate::traits::FieldElement::mul_mut(self, rhs);
            }
        }
    };
}

pub(crate) use impl_field_ops;

use std::fmt;

use super::{FqElement, FqMontgomery, Limbs};
use crate::limbs;
use crate::traits::{DoubleElement, FieldElement, PrimeField};

/// Unreduced `2L`-limb product of two [`FqElement`]s.
///
/// Sums and differences of products accumulate here and pay for a single
/// Montgomery reduction in [`DoubleElement::reduce`].
pub struct FqDoubleElement {
    field: FqMontgomery,
    value: Limbs,
}

impl FqDoubleElement {
    pub(crate) fn from_parts(field: FqMontgomery, value: Limbs) -> Self {
        debug_assert_eq!(value.len(), 2 * field.limb_count());
        Self { field, value }
    }

    /// Raw limbs, least significant first.
    #[inline]
    pub fn limbs(&self) -> &[u32] {
        &self.value
    }

    /// Add `q * R` until a borrow out of the top limb is cancelled.
    fn lift(&mut self) {
        while limbs::add_assign(&mut self.value, self.field.q_shifted()) == 0 {}
    }
}

impl Clone for FqDoubleElement {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            value: self.field.take_double(&self.value),
        }
    }
}

impl PartialEq for FqDoubleElement {
    fn eq(&self, other: &Self) -> bool {
        if !self.field.same_modulus(&other.field) {
            return false;
        }
        let (a, b) = (self.reduce(), other.reduce());
        let equal = a == b;
        a.recycle();
        b.recycle();
        equal
    }
}

impl fmt::Display for FqDoubleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for FqDoubleElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FqDouble({} [mont])", self.to_biguint())
    }
}

impl DoubleElement for FqDoubleElement {
    type Single = FqElement;

    fn add_mut(&mut self, rhs: &Self) -> &mut Self {
        let carry = limbs::add_assign(&mut self.value, &rhs.value);
        debug_assert_eq!(carry, 0, "double-width sum overflowed");
        self
    }

    fn sub_mut(&mut self, rhs: &Self) -> &mut Self {
        if limbs::sub_assign(&mut self.value, &rhs.value) != 0 {
            self.lift();
        }
        self
    }

    fn twice_mut(&mut self) -> &mut Self {
        let carry = limbs::shl1(&mut self.value);
        debug_assert_eq!(carry, 0, "double-width sum overflowed");
        self
    }

    fn sub_opt1_mut(&mut self, rhs: &Self) -> &mut Self {
        let carry = limbs::add_assign(&mut self.value, self.field.q_shifted());
        debug_assert_eq!(carry, 0, "double-width sum overflowed");
        self.sub_mut(rhs)
    }

    fn reduce(&self) -> FqElement {
        let mut wide = self.field.take_double(&self.value);
        let mut out = self.field.zero();
        limbs::mont_reduce(&mut out.value, &mut wide, self.field.q(), self.field.n0());
        self.field.put_double(wide);
        out
    }

    fn recycle(self) {
        self.field.put_double(self.value);
    }
}

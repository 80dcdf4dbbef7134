//! Prime-field arithmetic in the Montgomery domain on fixed-width 32-bit
//! limbs, with pooled buffers so hot arithmetic paths do not allocate.
//!
//! [`FqMontgomery`] is the engine; [`FqCanonical`] is an arbitrary-precision
//! field with the same [`PrimeField`] surface, used for interoperability.

pub mod canonical;
pub mod config;
pub mod error;
mod limbs;
pub mod macros;
pub mod montgomery;
pub mod params;
pub mod prelude;
pub mod recycler;
pub mod traits;

use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;

pub use crate::canonical::FqCanonical;
pub use crate::error::{FieldError, Result};
pub use crate::montgomery::{FqDoubleElement, FqElement, FqMontgomery};
pub use crate::traits::{DoubleElement, FieldElement, PrimeField};

/// Random source shared by every field derived from one context.
pub type SharedRng = Rc<RefCell<dyn RngCore>>;

/// Wrap an owned generator for use by field contexts.
pub fn shared_rng<R: RngCore + 'static>(rng: R) -> SharedRng {
    Rc::new(RefCell::new(rng))
}

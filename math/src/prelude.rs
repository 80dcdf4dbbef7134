pub use num_bigint::BigUint;

pub use crate::fq;
pub use crate::{
    canonical::{CanonicalDoubleElement, CanonicalElement, FqCanonical},
    config::PoolConfig,
    error::FieldError,
    montgomery::{FqDoubleElement, FqElement, FqMontgomery},
    shared_rng,
    traits::{DoubleElement, FieldElement, PrimeField},
    SharedRng,
};

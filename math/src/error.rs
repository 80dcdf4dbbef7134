use thiserror::Error;

/// Common result type used across this crate.
pub type Result<T, E = FieldError> = core::result::Result<T, E>;

/// Top-level error type for field construction, element factories and
/// partial arithmetic operations.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum FieldError {
    #[error("Fq elements have exactly {expected} component(s), got {found}")]
    InvalidArity { expected: usize, found: usize },
    #[error(transparent)]
    InvalidEncoding(#[from] EncodingError),
    #[error("radix must be within 2..=36, got {0}")]
    InvalidRadix(u32),
    #[error("zero has no multiplicative inverse")]
    NonInvertible,
    #[error("element is a quadratic non-residue")]
    NonResidue,
    #[error(transparent)]
    InvalidModulus(#[from] ModulusError),
    #[error("element belongs to a field with a different modulus")]
    FieldMismatch,
}

/// Reasons an external representation does not denote a field element.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum EncodingError {
    #[error("non-canonical value with {bits} bits is >= the {modulus_bits}-bit modulus")]
    NotCanonical { bits: u64, modulus_bits: u64 },
    #[error("cannot parse {input:?} in radix {radix}")]
    Unparsable { input: String, radix: u32 },
}

/// Moduli rejected at field construction.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum ModulusError {
    #[error("modulus must be greater than two")]
    TooSmall,
    #[error("Montgomery arithmetic requires an odd modulus")]
    Even,
    #[error("modulus is not prime")]
    NotPrime,
}

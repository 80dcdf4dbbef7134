//! Layout constants and pool sizing for the Montgomery field context.

/// Width of a single limb in bits.
pub const LIMB_BITS: u64 = 32;

/// Limbs kept above the tight bit length of the modulus.
pub const GUARD_LIMBS: usize = 2;

/// Number of reduced summands an unreduced single-width chain may absorb.
///
/// Unreduced values must stay below `2^32 * q` for Montgomery
/// multiplication to return a reduced result; this leaves a factor of two
/// of slack on top of that.
pub const MAX_UNREDUCED_SUMMANDS: u64 = 1 << 31;

/// Default capacity of the single-width element buffer pool.
pub const DEFAULT_SINGLE_CAPACITY: usize = 50;

/// Default capacity of the double-width element buffer pool.
pub const DEFAULT_DOUBLE_CAPACITY: usize = 20;

/// Default capacity of the internal scratch buffer pool.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 8;

/// Number of limbs used for a modulus of `bits` significant bits.
#[inline]
pub const fn limb_count(bits: u64) -> usize {
    (bits.div_ceil(LIMB_BITS)) as usize + GUARD_LIMBS
}

/// Capacities of the recyclers owned by a field context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    pub single_buffers: usize,
    pub double_buffers: usize,
    pub scratch_buffers: usize,
}

impl PoolConfig {
    /// Create a pool configuration from literal capacities (const-friendly).
    pub const fn from_values(
        single_buffers: usize,
        double_buffers: usize,
        scratch_buffers: usize,
    ) -> Self {
        Self {
            single_buffers,
            double_buffers,
            scratch_buffers,
        }
    }

    /// A configuration that never retains buffers; every `get` allocates.
    pub const fn disabled() -> Self {
        Self::from_values(0, 0, 0)
    }

    #[inline]
    pub const fn is_disabled(&self) -> bool {
        self.single_buffers == 0
            && self.double_buffers == 0
            && self.scratch_buffers == 0
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        DEFAULT_POOL_CONFIG
    }
}

/// Capacities tuned for pairing-heavy workloads on small devices.
pub const DEFAULT_POOL_CONFIG: PoolConfig = PoolConfig::from_values(
    DEFAULT_SINGLE_CAPACITY,
    DEFAULT_DOUBLE_CAPACITY,
    DEFAULT_SCRATCH_CAPACITY,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limb_count_adds_guard_limbs() {
        assert_eq!(limb_count(1), 3);
        assert_eq!(limb_count(32), 3);
        assert_eq!(limb_count(33), 4);
        assert_eq!(limb_count(255), 10);
        assert_eq!(limb_count(256), 10);
    }

    #[test]
    fn default_config_matches_constants() {
        let config = PoolConfig::default();
        assert_eq!(config, DEFAULT_POOL_CONFIG);
        assert_eq!(config.single_buffers, 50);
        assert_eq!(config.double_buffers, 20);
        assert!(!config.is_disabled());
        assert!(PoolConfig::disabled().is_disabled());
    }
}

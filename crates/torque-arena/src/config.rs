//! Scratch arena configuration parameters.

use crate::error::ScratchError;

const MIB: usize = 1024 * 1024;

/// Sizing for the scratch arena and the per-step block drawn from it.
///
/// Validated by the world at construction; all values are immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScratchConfig {
    /// Commit granularity in bytes. Pages are committed in chunks of at
    /// least this size, rounded up to whole pages.
    ///
    /// Default: 256 MiB.
    pub minimum_block_size: usize,

    /// Address space reserved up front, in bytes. Allocations never grow
    /// past this.
    ///
    /// Default: 8 GiB on 64-bit targets, 1 GiB elsewhere.
    pub reserve_size: usize,

    /// Size of the block handed to the backend every step.
    ///
    /// Default: 32 MiB.
    pub step_block_size: usize,

    /// Alignment of the per-step block.
    ///
    /// Default: 16.
    pub step_block_alignment: usize,
}

impl ScratchConfig {
    /// Default commit granularity.
    pub const DEFAULT_MINIMUM_BLOCK_SIZE: usize = 256 * MIB;

    /// Default address-space reservation.
    #[cfg(target_pointer_width = "64")]
    pub const DEFAULT_RESERVE_SIZE: usize = 8 * 1024 * MIB;

    /// Default address-space reservation.
    #[cfg(not(target_pointer_width = "64"))]
    pub const DEFAULT_RESERVE_SIZE: usize = 1024 * MIB;

    /// Default per-step block size.
    pub const DEFAULT_STEP_BLOCK_SIZE: usize = 32 * MIB;

    /// Default per-step block alignment.
    pub const DEFAULT_STEP_BLOCK_ALIGNMENT: usize = 16;

    /// A config with explicit arena sizes and the default step block.
    pub fn new(minimum_block_size: usize, reserve_size: usize) -> Self {
        Self {
            minimum_block_size,
            reserve_size,
            ..Self::default()
        }
    }

    /// Check that the step block fits the arena and is sensibly aligned.
    pub fn validate(&self) -> Result<(), ScratchError> {
        if self.reserve_size == 0 {
            return Err(ScratchError::InvalidReserveSize);
        }
        let a = self.step_block_alignment;
        if a == 0 || !a.is_power_of_two() {
            return Err(ScratchError::InvalidAlignment { alignment: a });
        }
        if self.step_block_size > self.reserve_size {
            return Err(ScratchError::CapacityExceeded {
                requested: self.step_block_size,
                available: self.reserve_size,
            });
        }
        Ok(())
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            minimum_block_size: Self::DEFAULT_MINIMUM_BLOCK_SIZE,
            reserve_size: Self::DEFAULT_RESERVE_SIZE,
            step_block_size: Self::DEFAULT_STEP_BLOCK_SIZE,
            step_block_alignment: Self::DEFAULT_STEP_BLOCK_ALIGNMENT,
        }
    }
}

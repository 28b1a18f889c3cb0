use crate::error::StateError;
use crate::state::Field;
use alloy_primitives::U256;

type BlockNumber = Field<224, 32>;
type QLower = Field<160, 64>;
type QUpper = Field<96, 64>;
type ActiveEvanescentPointsPerShare = Field<0, 96>;

/// Per-pool accrual state, packed into one word as
/// `[blockNumber:32][qLower:64][qUpper:64][activeEvanescentPointsPerShare:96]`.
///
/// `[q_lower, q_upper)` is the interval the pool price currently sits in and
/// `active_evanescent_points_per_share` is the growth that interval has
/// collected over its whole history.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolData {
    pub block_number: u32,
    pub q_lower: u64,
    pub q_upper: u64,
    pub active_evanescent_points_per_share: U256,
}

impl PoolData {
    pub fn decode(word: U256) -> Self {
        Self {
            block_number: BlockNumber::read(word).to::<u32>(),
            q_lower: QLower::read(word).to::<u64>(),
            q_upper: QUpper::read(word).to::<u64>(),
            active_evanescent_points_per_share: ActiveEvanescentPointsPerShare::read(word),
        }
    }

    /// Packs the record, failing if the active accumulator exceeds 96 bits.
    pub fn encode(&self) -> Result<U256, StateError> {
        let word = BlockNumber::write(U256::ZERO, U256::from(self.block_number))?;
        let word = QLower::write(word, U256::from(self.q_lower))?;
        let word = QUpper::write(word, U256::from(self.q_upper))?;
        ActiveEvanescentPointsPerShare::write(word, self.active_evanescent_points_per_share)
    }

    /// A pool whose bounds coincide has no decided corners to accumulate
    /// between.
    #[inline]
    pub fn has_range(&self) -> bool {
        self.q_lower != self.q_upper
    }

    /// Width of the tracked interval.
    #[inline]
    pub fn spacing(&self) -> u64 {
        self.q_upper.saturating_sub(self.q_lower)
    }

    pub fn ensure_ordered(&self) -> Result<(), StateError> {
        if self.q_lower > self.q_upper {
            return Err(StateError::InvalidPoolRange {
                q_lower: self.q_lower,
                q_upper: self.q_upper,
            });
        }
        Ok(())
    }

    /// Largest value the active accumulator can hold.
    pub fn max_active() -> U256 {
        ActiveEvanescentPointsPerShare::max()
    }
}

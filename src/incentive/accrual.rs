use crate::error::{Error, MathError, StateError};
use crate::math::full_math::mul_div;
use crate::math::geometric_mean::geometric_mean;
use crate::state::PoolData;
use crate::storage::{IncentiveStorage, Storage};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Pool parameters read from the AMM at the time of an accrual.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicParams {
    /// Growth multiplier of the pool (X111 in the AMM's storage).
    pub growth: U256,
    /// Kernel integrals of the current interval (X216).
    pub integral0: U256,
    pub integral1: U256,
    /// Normalizer of the integrals.
    pub outgoing_max: U256,
    pub shares_total: U256,
    pub log_price_current: u64,
}

/// Inclusive block interval during which points accrue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualWindow {
    pub start_block: u32,
    pub end_block: u32,
}

impl AccrualWindow {
    pub fn new(start_block: u32, end_block: u32) -> Self {
        Self {
            start_block,
            end_block,
        }
    }

    #[inline]
    pub fn clamp(&self, block: u32) -> u32 {
        block.clamp(self.start_block, self.end_block)
    }

    /// Blocks inside the window between the last update and `now`.
    #[inline]
    pub fn elapsed(&self, last: u32, now: u32) -> u32 {
        self.clamp(now).saturating_sub(self.clamp(last))
    }
}

/// Result of one accrual.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Accrual {
    pub blocks: u32,
    /// Added to the active interval's points per share.
    pub increment: U256,
    /// Added to `totalEvanescentPointsOwed`.
    pub owed_increment: U256,
}

/// `floor(blocks * growth * geometricMean(integral0, integral1) / outgoingMax)`
///
/// The geometric mean is truncated to an integer before it is multiplied.
/// A pool with nothing outstanding (`outgoing_max == 0`) accrues nothing.
pub fn points_per_share_increment(blocks: u32, params: &DynamicParams) -> Result<U256, MathError> {
    if blocks == 0 || params.outgoing_max.is_zero() {
        return Ok(U256::ZERO);
    }

    let weighted = U256::from(blocks)
        .checked_mul(params.growth)
        .ok_or(MathError::Overflow)?;
    let mean = geometric_mean(params.integral0, params.integral1);

    mul_div(weighted, mean, params.outgoing_max)
}

/// Brings the pool's active accumulator up to block `now`.
///
/// Also grows `totalEvanescentPointsOwed` by the points every outstanding
/// share has earned and stamps the pool with `now`. A pool with no range
/// has no interval to credit, so it is only stamped.
pub fn accrue<S: Storage>(
    store: &mut IncentiveStorage<S>,
    pool_id: U256,
    window: &AccrualWindow,
    params: &DynamicParams,
    now: u32,
) -> Result<Accrual, Error> {
    let mut pool = read_initialized_pool(store, pool_id)?;

    let blocks = window.elapsed(pool.block_number, now);
    let increment = if pool.has_range() {
        points_per_share_increment(blocks, params)?
    } else {
        U256::ZERO
    };
    let owed_increment = increment
        .checked_mul(params.shares_total)
        .ok_or(MathError::Overflow)?;

    pool.active_evanescent_points_per_share = pool
        .active_evanescent_points_per_share
        .checked_add(increment)
        .ok_or(MathError::Overflow)?;
    pool.block_number = now;

    store.write_pool_data(pool_id, &pool)?;
    if !owed_increment.is_zero() {
        store.update_total_evanescent_points_owed(owed_increment)?;
    }

    tracing::debug!(
        %pool_id,
        blocks,
        %increment,
        %owed_increment,
        active = %pool.active_evanescent_points_per_share,
        "accrued evanescent points"
    );

    Ok(Accrual {
        blocks,
        increment,
        owed_increment,
    })
}

/// Moves the pool's tracked interval until it contains `log_price`.
///
/// Every crossed boundary has its tick points flipped from one side's
/// meaning to the other's, and the active accumulator is replaced with the
/// history of the interval being entered.
pub fn cross<S: Storage>(
    store: &mut IncentiveStorage<S>,
    pool_id: U256,
    log_price: u64,
) -> Result<PoolData, Error> {
    let mut pool = read_initialized_pool(store, pool_id)?;
    if !pool.has_range() {
        return Ok(pool);
    }
    let spacing = pool.spacing();
    let mut crossings = 0u64;

    while log_price >= pool.q_upper {
        let next_upper = pool
            .q_upper
            .checked_add(spacing)
            .ok_or(StateError::GridExhausted {
                q_lower: pool.q_lower,
                q_upper: pool.q_upper,
            })?;

        let below_upper = store
            .read_tick_points(pool_id, pool.q_lower)
            .checked_add(pool.active_evanescent_points_per_share)
            .ok_or(MathError::Overflow)?;
        let entered = store
            .read_tick_points(pool_id, pool.q_upper)
            .checked_sub(store.read_tick_points(pool_id, next_upper))
            .ok_or(MathError::Underflow)?;

        store.write_tick_points(pool_id, pool.q_upper, below_upper);
        pool.q_lower = pool.q_upper;
        pool.q_upper = next_upper;
        pool.active_evanescent_points_per_share = entered;
        crossings += 1;
    }

    while log_price < pool.q_lower {
        let next_lower = pool
            .q_lower
            .checked_sub(spacing)
            .ok_or(StateError::GridExhausted {
                q_lower: pool.q_lower,
                q_upper: pool.q_upper,
            })?;

        let above_lower = store
            .read_tick_points(pool_id, pool.q_upper)
            .checked_add(pool.active_evanescent_points_per_share)
            .ok_or(MathError::Overflow)?;
        let entered = store
            .read_tick_points(pool_id, pool.q_lower)
            .checked_sub(store.read_tick_points(pool_id, next_lower))
            .ok_or(MathError::Underflow)?;

        store.write_tick_points(pool_id, pool.q_lower, above_lower);
        pool.q_upper = pool.q_lower;
        pool.q_lower = next_lower;
        pool.active_evanescent_points_per_share = entered;
        crossings += 1;
    }

    if crossings > 0 {
        store.write_pool_data(pool_id, &pool)?;
        tracing::debug!(
            %pool_id,
            crossings,
            q_lower = pool.q_lower,
            q_upper = pool.q_upper,
            "moved active interval"
        );
    }

    Ok(pool)
}

pub(crate) fn read_initialized_pool<S: Storage>(
    store: &IncentiveStorage<S>,
    pool_id: U256,
) -> Result<PoolData, StateError> {
    let word = store.read_pool_word(pool_id);
    if word.is_zero() {
        return Err(StateError::PoolNotInitialized(pool_id));
    }
    Ok(PoolData::decode(word))
}

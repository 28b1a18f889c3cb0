use crate::error::{Error, MathError, StateError};
use crate::incentive::accrual::read_initialized_pool;
use crate::incentive::accumulator::{Corners, calculate_evanescent_points_per_share};
use crate::state::{IncentiveData, IncentiveWords, PoolData};
use crate::storage::{IncentiveStorage, Storage};
use alloy_primitives::U256;

/// Outcome of settling a position against its pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Collected {
    /// Points owed to the position, including anything pending from
    /// earlier settlements.
    pub owed: U256,
    /// The position's words after collection: subtrahend advanced,
    /// `content1` untouched and `content2` cleared.
    pub words: IncentiveWords,
}

/// Current points per share inside the position's range. A pool with no
/// range has accrued nothing new, so the position's own subtrahend stands.
pub fn evanescent_points_per_share(
    words: &IncentiveWords,
    pool: &PoolData,
    corners: &Corners,
) -> Result<U256, MathError> {
    if !pool.has_range() {
        return Ok(words.subtrahend());
    }
    calculate_evanescent_points_per_share(pool, words.q_min(), words.q_max(), corners)
}

/// Settles a position given its words, its pool and the four tick points.
///
/// `owed = content2 + shares * (perShare - subtrahend)`; the returned words
/// carry `perShare` as the new subtrahend and no pending points. A per-share
/// value wider than the 96-bit subtrahend field is rejected.
pub fn collect_evanescent_points(
    words: &IncentiveWords,
    pool: &PoolData,
    corners: &Corners,
) -> Result<Collected, Error> {
    let per_share = evanescent_points_per_share(words, pool, corners)?;
    let delta = per_share
        .checked_sub(words.subtrahend())
        .ok_or(MathError::Underflow)?;
    let owed = U256::from(words.shares())
        .checked_mul(delta)
        .and_then(|earned| earned.checked_add(words.evanescent_points_owed()))
        .ok_or(MathError::Overflow)?;

    let mut words = words.with_subtrahend(per_share)?;
    words.content2 = U256::ZERO;

    Ok(Collected { owed, words })
}

/// Reads a position's words, failing if the token id was never minted.
pub fn read_position<S: Storage>(
    store: &IncentiveStorage<S>,
    token_id: U256,
) -> Result<IncentiveWords, StateError> {
    let words = store.read_incentive_words(token_id);
    if words.content0.is_zero() && words.content1.is_zero() && words.content2.is_zero() {
        return Err(StateError::PositionNotFound(token_id));
    }
    Ok(words)
}

/// Loads the pool and corners a position needs and settles it, without
/// writing anything.
pub fn collect_position<S: Storage>(
    store: &IncentiveStorage<S>,
    token_id: U256,
) -> Result<Collected, Error> {
    let words = read_position(store, token_id)?;
    let pool_id = words.pool_id(store.owner);
    let pool = read_initialized_pool(store, pool_id)?;
    let corners = if pool.has_range() {
        Corners::read(store, pool_id, &pool, words.q_min(), words.q_max())
    } else {
        Corners::default()
    };
    collect_evanescent_points(&words, &pool, &corners)
}

/// Settles a position and keeps the points in its `content2` for a later
/// collect. Used before its share count changes.
pub fn settle_position<S: Storage>(
    store: &mut IncentiveStorage<S>,
    token_id: U256,
) -> Result<IncentiveData, Error> {
    let Collected { owed, mut words } = collect_position(store, token_id)?;
    words.content2 = owed;
    store.write_incentive_words(token_id, &words);

    tracing::debug!(%token_id, %owed, "settled position");
    Ok(IncentiveData::decode(&words, store.owner))
}

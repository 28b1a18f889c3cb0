use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - value {value} does not fit the {width}-bit field at offset {offset}")]
    FieldOverflow {
        offset: usize,
        width: usize,
        value: U256,
    },

    #[error("State error - tags out of order: {tag0}, {tag1}")]
    TagsOutOfOrder { tag0: U256, tag1: U256 },
    #[error("State error - invalid start block: {start_block}, {current_block}")]
    InvalidStartBlock { start_block: u32, current_block: u32 },
    #[error("State error - invalid end block: {start_block}, {end_block}")]
    InvalidEndBlock { start_block: u32, end_block: u32 },
    #[error("State error - invalid tag0: {0}")]
    InvalidTag0(U256),
    #[error("State error - invalid tag1: {0}")]
    InvalidTag1(U256),

    #[error("State error - pool {0} is not initialized")]
    PoolNotInitialized(U256),
    #[error("State error - pool {0} is already initialized")]
    PoolAlreadyInitialized(U256),
    #[error("State error - pool range is inverted: {q_lower}, {q_upper}")]
    InvalidPoolRange { q_lower: u64, q_upper: u64 },
    #[error("State error - position range is empty or inverted: {q_min}, {q_max}")]
    InvalidPositionRange { q_min: u64, q_max: u64 },
    #[error("State error - log price {q} is not on the grid of {q_lower} with spacing {spacing}")]
    MisalignedLogPrice { q: u64, q_lower: u64, spacing: u64 },
    #[error("State error - log price grid exhausted while crossing from {q_lower}, {q_upper}")]
    GridExhausted { q_lower: u64, q_upper: u64 },

    #[error("State error - position {0} does not exist")]
    PositionNotFound(U256),
    #[error("State error - invalid pool id: {expected}, {given}")]
    InvalidPoolId { expected: U256, given: U256 },
    #[error("State error - invalid log price min: {expected}, {given}")]
    InvalidLogPriceMin { expected: u64, given: u64 },
    #[error("State error - invalid log price max: {expected}, {given}")]
    InvalidLogPriceMax { expected: u64, given: u64 },
    #[error("State error - insufficient shares: {shares}, {requested}")]
    InsufficientShares { shares: u128, requested: u128 },

    #[error("State error - unequal lengths: {0}, {1}")]
    UnequalLengths(usize, usize),
    #[error("State error - invalid growth portion: {0}")]
    InvalidGrowthPortion(u64),
    #[error("State error - invalid conversion pool: {0}")]
    InvalidConversionPool(U256),
    #[error("State error - no conversion pool for tag {0}")]
    MissingConversionPool(U256),
    #[error("State error - insufficient reward budget: {available}, {requested}")]
    InsufficientRewardBudget { available: U256, requested: U256 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Access error - only callable by the AMM: {0}")]
    OnlyByAmm(Address),
    #[error("Access error - invalid factory: {0}")]
    InvalidFactory(Address),
    #[error("Access error - only callable by admin: {caller}, {admin}")]
    OnlyByAdmin { caller: Address, admin: Address },
    #[error("Access error - insufficient approval: {caller}, {token_id}")]
    InsufficientApproval { caller: Address, token_id: U256 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error("Timing error - too early to disburse: {earliest}, {current}")]
    TooEarlyToDisburse { earliest: u64, current: u64 },
    #[error("Timing error - pool {pool_id} is closed for this direction: {reopens_at}, {current}")]
    PoolIsClosedForThisDirection {
        pool_id: U256,
        reopens_at: u64,
        current: u64,
    },
}

#[cfg(feature = "onchain")]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OnchainError {
    #[error("Onchain error - failed to read storage slot {slot}: {reason}")]
    FailedToReadStorage { slot: U256, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    AccessError(#[from] crate::error::AccessError),

    #[error(transparent)]
    TimingError(#[from] crate::error::TimingError),

    #[cfg(feature = "onchain")]
    #[error(transparent)]
    OnchainError(#[from] crate::error::OnchainError),
}

//! Packed-storage incentive accounting for concentrated-liquidity pools.
//!
//! This crate exposes:
//! - The storage codec (`state::*`): typed records packed into 256-bit words.
//! - Slot derivation and a word-addressed store with all-or-nothing batches
//!   (`storage::*`).
//! - The evanescent points engine (`incentive::*`): the four-corner range
//!   accumulator, pool accrual and interval crossing, the position ledger
//!   and the hook that drives them.
//! - The factory-level disbursement layer (`factory`).
//! - Optional `onchain` helpers that read the same records from a deployed
//!   contract.
//!
//! # Examples
//!
//! ## Decoding a pool word
//! ```no_run
//! use clmm_incentive_accounting::{state::PoolData, U256};
//!
//! let pool = PoolData {
//!     block_number: 10,
//!     q_lower: 100,
//!     q_upper: 120,
//!     active_evanescent_points_per_share: U256::from(7u8),
//! };
//! let word = pool.encode().unwrap();
//! assert_eq!(PoolData::decode(word), pool);
//! ```
//!
//! ## Accruing and collecting points
//! ```no_run
//! use clmm_incentive_accounting::{
//!     incentive::{
//!         accrual::{AccrualWindow, DynamicParams},
//!         pay_master::MemoryPayMaster,
//!         HookData, Incentive, IncentiveConfig, PositionChange,
//!     },
//!     storage::MemoryStorage,
//!     Address, U256,
//! };
//!
//! # let (amm, factory, owner) = (Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3));
//! let config = IncentiveConfig {
//!     address: Address::repeat_byte(9),
//!     amm,
//!     factory,
//!     pay_master: factory,
//!     reward_token: Address::repeat_byte(4),
//!     tag0: U256::from(1u8),
//!     tag1: U256::from(2u8),
//!     window: AccrualWindow::new(100, 300),
//! };
//! let mut incentive = Incentive::new(config.clone(), MemoryStorage::new(), 50).unwrap();
//!
//! let pool_id = (U256::from(1u8) << 160) | U256::from_be_slice(config.address.as_slice());
//! incentive
//!     .initialize_pool(amm, factory, pool_id, config.tag0, config.tag1, 0, 10, 51)
//!     .unwrap();
//!
//! let params = DynamicParams {
//!     growth: U256::ONE,
//!     integral0: U256::ONE << 104,
//!     integral1: U256::ONE << 104,
//!     outgoing_max: U256::ONE,
//!     shares_total: U256::from(1_000u64),
//!     log_price_current: 5,
//! };
//! let change = PositionChange { pool_id, q_min: 0, q_max: 10, shares: 1_000 };
//! let token_id = incentive
//!     .mid_mint(amm, &change, HookData { token_id: U256::ZERO, owner }, 52, &params)
//!     .unwrap();
//!
//! incentive.mid_donate(amm, pool_id, 110, &params).unwrap();
//!
//! let mut treasury = MemoryPayMaster::new(U256::from(1_000_000u64));
//! let reward = incentive.collect(owner, token_id, &mut treasury).unwrap();
//! println!("reward: {reward}");
//! ```

pub use alloy_primitives::{Address, U256};

pub mod error;
mod hash;
pub mod math;

pub use hash::FastMap;

pub mod factory;
pub mod incentive;
#[cfg(feature = "onchain")]
pub mod onchain;
pub mod state;
pub mod storage;

pub use factory::IncentivePoolFactory;
pub use incentive::Incentive;
pub use state::{IncentiveData, IncentiveWords, PoolData};
pub use storage::{IncentiveStorage, MemoryStorage};

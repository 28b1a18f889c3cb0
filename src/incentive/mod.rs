//! The incentive hook.
//!
//! [`Incentive`] is driven by the AMM through narrow hook calls: pool
//! initialization, the middle of every mint, burn, swap and donate, plus
//! `collect` called by position holders. Each call runs inside a storage
//! [`Transaction`](crate::storage::Transaction) and leaves no trace unless
//! every check passed.

pub mod accrual;
pub mod accumulator;
pub mod ledger;
pub mod pay_master;

use crate::FastMap;
use crate::error::{AccessError, Error, MathError, StateError};
use crate::math::full_math::mul_div;
use crate::state::incentive_data::pool_id_from_tag;
use crate::state::{IncentiveData, PoolData};
use crate::storage::{IncentiveStorage, Storage, atomic};
use accrual::{Accrual, AccrualWindow, DynamicParams, accrue, cross, read_initialized_pool};
use accumulator::Corners;
use alloy_primitives::{Address, U256};
use ledger::{Collected, collect_position, evanescent_points_per_share, read_position, settle_position};
use pay_master::PayMaster;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveConfig {
    /// Address of the incentive itself; the low 160 bits of every pool id
    /// it serves.
    pub address: Address,
    pub amm: Address,
    /// Only pools created by this account may attach the incentive.
    pub factory: Address,
    pub pay_master: Address,
    pub reward_token: Address,
    pub tag0: U256,
    pub tag1: U256,
    #[serde(flatten)]
    pub window: AccrualWindow,
}

impl IncentiveConfig {
    pub fn validate(&self, current_block: u32) -> Result<(), StateError> {
        if self.tag0 >= self.tag1 {
            return Err(StateError::TagsOutOfOrder {
                tag0: self.tag0,
                tag1: self.tag1,
            });
        }
        if self.window.start_block < current_block {
            return Err(StateError::InvalidStartBlock {
                start_block: self.window.start_block,
                current_block,
            });
        }
        if self.window.end_block <= self.window.start_block {
            return Err(StateError::InvalidEndBlock {
                start_block: self.window.start_block,
                end_block: self.window.end_block,
            });
        }
        Ok(())
    }
}

/// Data the AMM forwards from the liquidity provider on mint and burn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HookData {
    /// Zero opens a new position.
    pub token_id: U256,
    pub owner: Address,
}

/// A share change on one range of one pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PositionChange {
    pub pool_id: U256,
    pub q_min: u64,
    pub q_max: u64,
    pub shares: u128,
}

#[derive(Clone, Debug)]
pub struct Incentive<S> {
    config: IncentiveConfig,
    store: IncentiveStorage<S>,
    owners: FastMap<U256, Address>,
    token_approvals: FastMap<U256, Address>,
    operators: FastMap<(Address, Address), bool>,
}

impl<S: Storage> Incentive<S> {
    /// Deploys the incentive on top of `storage` at `current_block`.
    pub fn new(config: IncentiveConfig, storage: S, current_block: u32) -> Result<Self, Error> {
        config.validate(current_block)?;

        let mut store = IncentiveStorage::new(storage, config.address);
        if store.token_id().is_zero() {
            store.set_token_id(U256::ONE);
        }

        tracing::info!(
            address = %config.address,
            tag0 = %config.tag0,
            tag1 = %config.tag1,
            start_block = config.window.start_block,
            end_block = config.window.end_block,
            "deployed incentive"
        );

        Ok(Self {
            config,
            store,
            owners: FastMap::default(),
            token_approvals: FastMap::default(),
            operators: FastMap::default(),
        })
    }

    pub fn config(&self) -> &IncentiveConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.store.storage
    }

    pub fn pool_data(&self, pool_id: U256) -> PoolData {
        self.store.read_pool_data(pool_id)
    }

    pub fn incentive_data(&self, token_id: U256) -> Result<IncentiveData, StateError> {
        let words = read_position(&self.store, token_id)?;
        Ok(IncentiveData::decode(&words, self.config.address))
    }

    /// Next token id to be minted.
    pub fn token_id(&self) -> U256 {
        self.store.token_id()
    }

    pub fn total_evanescent_points_owed(&self) -> U256 {
        self.store.total_evanescent_points_owed()
    }

    /// Points the position would collect right now.
    pub fn pending_evanescent_points(&self, token_id: U256) -> Result<U256, Error> {
        Ok(collect_position(&self.store, token_id)?.owed)
    }

    fn ensure_amm(&self, caller: Address) -> Result<(), AccessError> {
        if caller != self.config.amm {
            return Err(AccessError::OnlyByAmm(caller));
        }
        Ok(())
    }

    // ------------------------- hooks -------------------------

    /// Attaches the incentive to a freshly created pool whose curve spans
    /// `q_a` and `q_b`.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_pool(
        &mut self,
        caller: Address,
        creator: Address,
        pool_id: U256,
        tag0: U256,
        tag1: U256,
        q_a: u64,
        q_b: u64,
        block: u32,
    ) -> Result<PoolData, Error> {
        self.ensure_amm(caller)?;
        if tag0 != self.config.tag0 {
            return Err(StateError::InvalidTag0(tag0).into());
        }
        if tag1 != self.config.tag1 {
            return Err(StateError::InvalidTag1(tag1).into());
        }
        if creator != self.config.factory {
            return Err(AccessError::InvalidFactory(creator).into());
        }
        let expected = pool_id_from_tag(pool_id, self.config.address);
        if expected != pool_id {
            return Err(StateError::InvalidPoolId {
                expected,
                given: pool_id,
            }
            .into());
        }
        if !self.store.read_pool_word(pool_id).is_zero() {
            return Err(StateError::PoolAlreadyInitialized(pool_id).into());
        }

        let pool = PoolData {
            block_number: block,
            q_lower: q_a.min(q_b),
            q_upper: q_a.max(q_b),
            active_evanescent_points_per_share: U256::ZERO,
        };
        self.store.write_pool_data(pool_id, &pool)?;

        tracing::debug!(%pool_id, q_lower = pool.q_lower, q_upper = pool.q_upper, "initialized pool");
        Ok(pool)
    }

    /// Accrues the pool, then opens a position (`hook.token_id == 0`) or
    /// adds shares to an existing one. Returns the position's token id.
    ///
    /// `params` describe the pool before the shares are added.
    pub fn mid_mint(
        &mut self,
        caller: Address,
        change: &PositionChange,
        hook: HookData,
        block: u32,
        params: &DynamicParams,
    ) -> Result<U256, Error> {
        self.ensure_amm(caller)?;
        let window = self.config.window;
        let address = self.config.address;

        let token_id = atomic(&mut self.store.storage, |tx| -> Result<U256, Error> {
            let mut store = IncentiveStorage::new(tx, address);
            accrue(&mut store, change.pool_id, &window, params, block)?;

            if hook.token_id.is_zero() {
                open_position(&mut store, change)
            } else {
                let data = settle_matching(&mut store, hook.token_id, change)?;
                let shares = data
                    .shares
                    .checked_add(change.shares)
                    .ok_or(MathError::Overflow)?;
                let words = store.read_incentive_words(hook.token_id).with_shares(shares)?;
                store.write_incentive_words(hook.token_id, &words);
                Ok(hook.token_id)
            }
        })?;

        if hook.token_id.is_zero() {
            self.owners.insert(token_id, hook.owner);
        }
        tracing::debug!(%token_id, shares = change.shares, "minted incentive shares");
        Ok(token_id)
    }

    /// Accrues the pool, settles the position and removes `change.shares`.
    /// `sender` must own or be approved for the position.
    pub fn mid_burn(
        &mut self,
        caller: Address,
        sender: Address,
        change: &PositionChange,
        token_id: U256,
        block: u32,
        params: &DynamicParams,
    ) -> Result<IncentiveData, Error> {
        self.ensure_amm(caller)?;
        self.ensure_authorized(sender, token_id)?;
        let window = self.config.window;
        let address = self.config.address;

        let data = atomic(&mut self.store.storage, |tx| -> Result<IncentiveData, Error> {
            let mut store = IncentiveStorage::new(tx, address);
            accrue(&mut store, change.pool_id, &window, params, block)?;

            let mut data = settle_matching(&mut store, token_id, change)?;
            data.shares = data
                .shares
                .checked_sub(change.shares)
                .ok_or(StateError::InsufficientShares {
                    shares: data.shares,
                    requested: change.shares,
                })?;
            let words = store.read_incentive_words(token_id).with_shares(data.shares)?;
            store.write_incentive_words(token_id, &words);
            Ok(data)
        })?;

        tracing::debug!(%token_id, shares = change.shares, remaining = data.shares, "burned incentive shares");
        Ok(data)
    }

    /// Accrues the pool at its pre-swap interval, then follows the price to
    /// `log_price_after`.
    pub fn mid_swap(
        &mut self,
        caller: Address,
        pool_id: U256,
        block: u32,
        params: &DynamicParams,
        log_price_after: u64,
    ) -> Result<PoolData, Error> {
        self.ensure_amm(caller)?;
        let window = self.config.window;
        let address = self.config.address;

        atomic(&mut self.store.storage, |tx| -> Result<PoolData, Error> {
            let mut store = IncentiveStorage::new(tx, address);
            accrue(&mut store, pool_id, &window, params, block)?;
            cross(&mut store, pool_id, log_price_after)
        })
    }

    pub fn mid_donate(
        &mut self,
        caller: Address,
        pool_id: U256,
        block: u32,
        params: &DynamicParams,
    ) -> Result<Accrual, Error> {
        self.ensure_amm(caller)?;
        let window = self.config.window;
        let address = self.config.address;

        atomic(&mut self.store.storage, |tx| {
            let mut store = IncentiveStorage::new(tx, address);
            accrue(&mut store, pool_id, &window, params, block)
        })
    }

    // ------------------------- collect -------------------------

    /// Converts the position's owed points into reward tokens and pays them
    /// to the position's owner.
    ///
    /// `reward = owed * payMaster.budget() / totalEvanescentPointsOwed`
    pub fn collect<P: PayMaster>(
        &mut self,
        caller: Address,
        token_id: U256,
        pay_master: &mut P,
    ) -> Result<U256, Error> {
        let owner = self.ensure_authorized(caller, token_id)?;
        let address = self.config.address;

        let (owed, reward) = atomic(&mut self.store.storage, |tx| -> Result<(U256, U256), Error> {
            let mut store = IncentiveStorage::new(tx, address);
            let Collected { owed, words } = collect_position(&store, token_id)?;
            if owed.is_zero() {
                return Ok((owed, U256::ZERO));
            }

            let total = store.total_evanescent_points_owed();
            let reward = mul_div(owed, pay_master.budget(), total)?;

            store.write_incentive_words(token_id, &words);
            store.decrease_total_evanescent_points_owed(owed)?;
            if !reward.is_zero() {
                pay_master.pay(owner, reward)?;
            }
            Ok((owed, reward))
        })?;

        tracing::debug!(%token_id, %owed, %reward, "collected evanescent points");
        Ok(reward)
    }

    // ------------------------- ownership -------------------------

    pub fn owner_of(&self, token_id: U256) -> Result<Address, StateError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(StateError::PositionNotFound(token_id))
    }

    pub fn get_approved(&self, token_id: U256) -> Option<Address> {
        self.token_approvals.get(&token_id).copied()
    }

    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators
            .get(&(owner, operator))
            .copied()
            .unwrap_or(false)
    }

    fn is_authorized(&self, owner: Address, spender: Address, token_id: U256) -> bool {
        spender == owner
            || self.is_approved_for_all(owner, spender)
            || self.get_approved(token_id) == Some(spender)
    }

    /// Returns the position's owner if `caller` may act on it.
    fn ensure_authorized(&self, caller: Address, token_id: U256) -> Result<Address, Error> {
        let owner = self.owner_of(token_id)?;
        if !self.is_authorized(owner, caller, token_id) {
            return Err(AccessError::InsufficientApproval { caller, token_id }.into());
        }
        Ok(owner)
    }

    pub fn approve(&mut self, caller: Address, to: Address, token_id: U256) -> Result<(), Error> {
        let owner = self.owner_of(token_id)?;
        if caller != owner && !self.is_approved_for_all(owner, caller) {
            return Err(AccessError::InsufficientApproval { caller, token_id }.into());
        }
        self.token_approvals.insert(token_id, to);
        Ok(())
    }

    pub fn set_approval_for_all(&mut self, caller: Address, operator: Address, approved: bool) {
        self.operators.insert((caller, operator), approved);
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Error> {
        let owner = self.ensure_authorized(caller, token_id)?;
        if owner != from {
            return Err(AccessError::InsufficientApproval {
                caller: from,
                token_id,
            }
            .into());
        }
        self.token_approvals.remove(&token_id);
        self.owners.insert(token_id, to);
        tracing::debug!(%token_id, %from, %to, "transferred position");
        Ok(())
    }
}

fn open_position<S: Storage>(
    store: &mut IncentiveStorage<S>,
    change: &PositionChange,
) -> Result<U256, Error> {
    if change.q_min >= change.q_max {
        return Err(StateError::InvalidPositionRange {
            q_min: change.q_min,
            q_max: change.q_max,
        }
        .into());
    }
    let pool = read_initialized_pool(store, change.pool_id)?;
    ensure_on_grid(&pool, change.q_min)?;
    ensure_on_grid(&pool, change.q_max)?;

    let data = IncentiveData {
        pool_id: change.pool_id,
        q_min: change.q_min,
        q_max: change.q_max,
        shares: change.shares,
        evanescent_points_per_share_subtrahend: U256::ZERO,
        evanescent_points_owed: U256::ZERO,
    };
    let mut words = data.encode()?;
    if pool.has_range() {
        let corners = Corners::read(store, change.pool_id, &pool, change.q_min, change.q_max);
        let per_share = evanescent_points_per_share(&words, &pool, &corners)?;
        words = words.with_subtrahend(per_share)?;
    }

    let (token_id, _) = store.increment_token_id()?;
    store.write_incentive_words(token_id, &words);
    Ok(token_id)
}

/// Position bounds must sit on the grid spanned by the pool's interval.
fn ensure_on_grid(pool: &PoolData, q: u64) -> Result<(), StateError> {
    if !pool.has_range() {
        return Ok(());
    }
    let offset = (i128::from(q) - i128::from(pool.q_lower)).rem_euclid(i128::from(pool.spacing()));
    if offset != 0 {
        return Err(StateError::MisalignedLogPrice {
            q,
            q_lower: pool.q_lower,
            spacing: pool.spacing(),
        });
    }
    Ok(())
}

/// Settles an existing position after checking it is the one `change`
/// refers to.
fn settle_matching<S: Storage>(
    store: &mut IncentiveStorage<S>,
    token_id: U256,
    change: &PositionChange,
) -> Result<IncentiveData, Error> {
    let words = read_position(store, token_id)?;
    let data = IncentiveData::decode(&words, store.owner);
    if data.pool_id != change.pool_id {
        return Err(StateError::InvalidPoolId {
            expected: data.pool_id,
            given: change.pool_id,
        }
        .into());
    }
    if data.q_min != change.q_min {
        return Err(StateError::InvalidLogPriceMin {
            expected: data.q_min,
            given: change.q_min,
        }
        .into());
    }
    if data.q_max != change.q_max {
        return Err(StateError::InvalidLogPriceMax {
            expected: data.q_max,
            given: change.q_max,
        }
        .into());
    }
    settle_position(store, token_id)
}

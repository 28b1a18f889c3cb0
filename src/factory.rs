//! Factory-level disbursement.
//!
//! The factory owns the protocol's share of pool growth. It decides which
//! portion of each pool's growth the protocol takes, and periodically sells
//! what it collected in a given tag for the reward token through that tag's
//! conversion pool, forwarding the proceeds to the reward recipient.

use crate::FastMap;
use crate::error::{AccessError, Error, StateError, TimingError};
use crate::state::address_to_word;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Largest pool growth portion, i.e. 100% in X47.
pub const MAX_POOL_GROWTH_PORTION: u64 = 1 << 47;

/// The AMM as seen by the factory.
///
/// [`IncentivePoolFactory::disburse`] calls `collect_protocol`, `convert` and
/// `transfer` in that order as one unit. An implementation must undo the
/// collection when a later call of the same disbursement fails, as an AMM
/// reverting the whole transaction does. The factory itself records nothing
/// for a failed disbursement.
pub trait Amm {
    /// `(tag0, tag1)` of an existing pool.
    fn pool_tags(&self, pool_id: U256) -> Result<(U256, U256), Error>;

    fn set_pool_growth_portion(&mut self, pool_id: U256, portion: u64) -> Result<(), Error>;

    /// Withdraws the protocol's accumulated growth in `tag`.
    fn collect_protocol(&mut self, tag: U256) -> Result<U256, Error>;

    /// Sells `amount_in` of `tag_in` through `pool_id`, returning the amount
    /// of the other tag received.
    fn convert(&mut self, pool_id: U256, tag_in: U256, amount_in: U256) -> Result<U256, Error>;

    fn transfer(&mut self, tag: U256, to: Address, amount: U256) -> Result<(), Error>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryConfig {
    pub reward_token: Address,
    /// Receives every disbursement.
    pub reward_recipient: Address,
    pub admin: Address,
    /// Minimum number of blocks between two disbursements of one tag.
    pub disburse_gap: u64,
    /// Number of blocks a conversion pool stays closed in the reverse
    /// direction after a disbursement.
    pub delay: u64,
}

/// Direction of a swap through a conversion pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversionDirection {
    TagToReward,
    RewardToTag,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactoryEvent {
    NewAdmin {
        old_admin: Address,
        new_admin: Address,
    },
    NewDisburseGap {
        old_disburse_gap: u64,
        new_disburse_gap: u64,
    },
    NewDelay {
        old_delay: u64,
        new_delay: u64,
    },
    NewPoolGrowthPortions {
        tag0: U256,
        tag1: U256,
        new_pool_growth_portion: u64,
    },
    NewConversionPool {
        tag: U256,
        pool_id: U256,
    },
    Disbursed {
        tag: U256,
        amount: U256,
        reward_amount: U256,
    },
}

#[derive(Debug)]
pub struct IncentivePoolFactory<A> {
    amm: A,
    reward_token: Address,
    reward_recipient: Address,
    admin: Address,
    disburse_gap: u64,
    delay: u64,
    pool_growth_portions: FastMap<(U256, U256), u64>,
    conversion_pools: FastMap<U256, U256>,
    last_disbursement: FastMap<U256, u64>,
    closed_until: FastMap<U256, u64>,
    events: Vec<FactoryEvent>,
}

impl<A: Amm> IncentivePoolFactory<A> {
    pub fn new(amm: A, config: FactoryConfig) -> Self {
        tracing::info!(
            reward_token = %config.reward_token,
            admin = %config.admin,
            disburse_gap = config.disburse_gap,
            delay = config.delay,
            "deployed incentive pool factory"
        );
        Self {
            amm,
            reward_token: config.reward_token,
            reward_recipient: config.reward_recipient,
            admin: config.admin,
            disburse_gap: config.disburse_gap,
            delay: config.delay,
            pool_growth_portions: FastMap::default(),
            conversion_pools: FastMap::default(),
            last_disbursement: FastMap::default(),
            closed_until: FastMap::default(),
            events: Vec::new(),
        }
    }

    pub fn amm(&self) -> &A {
        &self.amm
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn disburse_gap(&self) -> u64 {
        self.disburse_gap
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn reward_tag(&self) -> U256 {
        address_to_word(self.reward_token)
    }

    pub fn pool_growth_portion(&self, tag0: U256, tag1: U256) -> u64 {
        self.pool_growth_portions
            .get(&(tag0, tag1))
            .copied()
            .unwrap_or(0)
    }

    pub fn conversion_pool(&self, tag: U256) -> Option<U256> {
        self.conversion_pools.get(&tag).copied()
    }

    /// Drains the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<FactoryEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_admin(&self, caller: Address) -> Result<(), AccessError> {
        if caller != self.admin {
            return Err(AccessError::OnlyByAdmin {
                caller,
                admin: self.admin,
            });
        }
        Ok(())
    }

    // ------------------------- admin -------------------------

    pub fn set_admin(&mut self, caller: Address, admin: Address) -> Result<(), Error> {
        self.ensure_admin(caller)?;
        let old_admin = std::mem::replace(&mut self.admin, admin);
        tracing::info!(%old_admin, new_admin = %admin, "admin changed");
        self.events.push(FactoryEvent::NewAdmin {
            old_admin,
            new_admin: admin,
        });
        Ok(())
    }

    pub fn set_disburse_gap(&mut self, caller: Address, disburse_gap: u64) -> Result<(), Error> {
        self.ensure_admin(caller)?;
        let old_disburse_gap = std::mem::replace(&mut self.disburse_gap, disburse_gap);
        tracing::info!(old_disburse_gap, new_disburse_gap = disburse_gap, "disburse gap changed");
        self.events.push(FactoryEvent::NewDisburseGap {
            old_disburse_gap,
            new_disburse_gap: disburse_gap,
        });
        Ok(())
    }

    pub fn set_delay(&mut self, caller: Address, delay: u64) -> Result<(), Error> {
        self.ensure_admin(caller)?;
        let old_delay = std::mem::replace(&mut self.delay, delay);
        tracing::info!(old_delay, new_delay = delay, "delay changed");
        self.events.push(FactoryEvent::NewDelay {
            old_delay,
            new_delay: delay,
        });
        Ok(())
    }

    /// Sets the protocol's growth portion for each `(tags0[i], tags1[i])`
    /// pair. Takes effect on a pool once [`Self::update_pool_growth_portion`]
    /// pushes it.
    pub fn modify_pool_growth_portion(
        &mut self,
        caller: Address,
        tags0: &[U256],
        tags1: &[U256],
        portions: &[u64],
    ) -> Result<(), Error> {
        self.ensure_admin(caller)?;
        if tags0.len() != tags1.len() {
            return Err(StateError::UnequalLengths(tags0.len(), tags1.len()).into());
        }
        if tags0.len() != portions.len() {
            return Err(StateError::UnequalLengths(tags0.len(), portions.len()).into());
        }
        for ((&tag0, &tag1), &portion) in tags0.iter().zip(tags1).zip(portions) {
            if tag0 >= tag1 {
                return Err(StateError::TagsOutOfOrder { tag0, tag1 }.into());
            }
            if portion > MAX_POOL_GROWTH_PORTION {
                return Err(StateError::InvalidGrowthPortion(portion).into());
            }
        }

        for ((&tag0, &tag1), &portion) in tags0.iter().zip(tags1).zip(portions) {
            self.pool_growth_portions.insert((tag0, tag1), portion);
            tracing::info!(%tag0, %tag1, portion, "pool growth portion changed");
            self.events.push(FactoryEvent::NewPoolGrowthPortions {
                tag0,
                tag1,
                new_pool_growth_portion: portion,
            });
        }
        Ok(())
    }

    /// Pushes the configured portion of each pool's tag pair to the AMM.
    /// Callable by anyone.
    pub fn update_pool_growth_portion(&mut self, pool_ids: &[U256]) -> Result<(), Error> {
        for &pool_id in pool_ids {
            let (tag0, tag1) = self.amm.pool_tags(pool_id)?;
            let portion = self.pool_growth_portion(tag0, tag1);
            self.amm.set_pool_growth_portion(pool_id, portion)?;
            tracing::debug!(%pool_id, portion, "pushed pool growth portion");
        }
        Ok(())
    }

    /// Registers each pool as the conversion route of the tag it pairs with
    /// the reward token.
    pub fn modify_conversion_pools(&mut self, caller: Address, pool_ids: &[U256]) -> Result<(), Error> {
        self.ensure_admin(caller)?;
        let reward_tag = self.reward_tag();

        let mut routes = Vec::with_capacity(pool_ids.len());
        for &pool_id in pool_ids {
            if pool_id.is_zero() {
                return Err(StateError::InvalidConversionPool(pool_id).into());
            }
            let tag = match self.amm.pool_tags(pool_id)? {
                (tag0, tag1) if tag1 == reward_tag => tag0,
                (tag0, tag1) if tag0 == reward_tag => tag1,
                _ => return Err(StateError::InvalidConversionPool(pool_id).into()),
            };
            routes.push((tag, pool_id));
        }

        for (tag, pool_id) in routes {
            self.conversion_pools.insert(tag, pool_id);
            tracing::info!(%tag, %pool_id, "conversion pool changed");
            self.events.push(FactoryEvent::NewConversionPool { tag, pool_id });
        }
        Ok(())
    }

    // ------------------------- disbursement -------------------------

    /// Earliest block at which `tag` may be disbursed again.
    pub fn earliest_disbursement(&self, tag: U256) -> u64 {
        self.last_disbursement
            .get(&tag)
            .copied()
            .unwrap_or(0)
            .saturating_add(self.disburse_gap)
    }

    /// Collects the protocol's growth in `tag`, sells it for the reward
    /// token and forwards the proceeds. Returns `(amount, reward_amount)`.
    ///
    /// The conversion pool then stays closed for swaps buying `tag` back
    /// until `block + delay`.
    pub fn disburse(&mut self, tag: U256, block: u64) -> Result<(U256, U256), Error> {
        let earliest = self.earliest_disbursement(tag);
        if block < earliest {
            return Err(TimingError::TooEarlyToDisburse {
                earliest,
                current: block,
            }
            .into());
        }
        let pool_id = self
            .conversion_pool(tag)
            .ok_or(StateError::MissingConversionPool(tag))?;

        let amount = self.amm.collect_protocol(tag)?;
        let reward_amount = if amount.is_zero() {
            U256::ZERO
        } else {
            self.amm.convert(pool_id, tag, amount)?
        };
        if !reward_amount.is_zero() {
            self.amm
                .transfer(self.reward_tag(), self.reward_recipient, reward_amount)?;
        }

        self.last_disbursement.insert(tag, block);
        self.closed_until
            .insert(pool_id, block.saturating_add(self.delay));

        tracing::info!(%tag, %pool_id, %amount, %reward_amount, block, "disbursed");
        self.events.push(FactoryEvent::Disbursed {
            tag,
            amount,
            reward_amount,
        });
        Ok((amount, reward_amount))
    }

    /// Guard run by a conversion pool before every swap.
    pub fn check_conversion_swap(
        &self,
        pool_id: U256,
        direction: ConversionDirection,
        block: u64,
    ) -> Result<(), TimingError> {
        if direction == ConversionDirection::TagToReward {
            return Ok(());
        }
        match self.closed_until.get(&pool_id) {
            Some(&reopens_at) if block < reopens_at => Err(TimingError::PoolIsClosedForThisDirection {
                pool_id,
                reopens_at,
                current: block,
            }),
            _ => Ok(()),
        }
    }
}

use crate::FastMap;
use crate::error::{Error, StateError};
use alloy_primitives::{Address, U256};

/// Treasury the reward token is paid out of.
pub trait PayMaster {
    /// Reward tokens currently available to the incentive.
    fn budget(&self) -> U256;

    fn pay(&mut self, to: Address, amount: U256) -> Result<(), Error>;
}

/// In-memory treasury holding a single reward balance.
#[derive(Clone, Debug, Default)]
pub struct MemoryPayMaster {
    balance: U256,
    paid: FastMap<Address, U256>,
}

impl MemoryPayMaster {
    pub fn new(balance: U256) -> Self {
        Self {
            balance,
            paid: FastMap::default(),
        }
    }

    /// Total paid to `account` so far.
    pub fn paid_to(&self, account: &Address) -> U256 {
        self.paid.get(account).copied().unwrap_or_default()
    }

    pub fn fund(&mut self, amount: U256) {
        self.balance = self.balance.saturating_add(amount);
    }
}

impl PayMaster for MemoryPayMaster {
    fn budget(&self) -> U256 {
        self.balance
    }

    fn pay(&mut self, to: Address, amount: U256) -> Result<(), Error> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(StateError::InsufficientRewardBudget {
                available: self.balance,
                requested: amount,
            })?;
        let paid = self.paid.entry(to).or_default();
        *paid = paid.saturating_add(amount);
        Ok(())
    }
}

use crate::error::{MathError, StateError};
use crate::state::{IncentiveWords, PoolData};
use crate::storage::Storage;
use crate::storage::slots::{
    get_evanescent_points_per_share_mapping_slot, get_incentive_data_slot, get_pool_data_slot,
    token_id_slot, total_evanescent_points_owed_slot,
};
use alloy_primitives::{Address, U256};

/// Typed view over the incentive contract's storage.
///
/// `owner` is the address of the contract that owns the pool ids; it fills
/// the low 160 bits of every pool id rebuilt from a position record.
#[derive(Clone, Debug)]
pub struct IncentiveStorage<S> {
    pub storage: S,
    pub owner: Address,
}

impl<S: Storage> IncentiveStorage<S> {
    pub fn new(storage: S, owner: Address) -> Self {
        Self { storage, owner }
    }

    // ------------------------- pool data -------------------------

    pub fn read_pool_data(&self, pool_id: U256) -> PoolData {
        PoolData::decode(self.storage.sload(get_pool_data_slot(pool_id)))
    }

    pub fn read_pool_word(&self, pool_id: U256) -> U256 {
        self.storage.sload(get_pool_data_slot(pool_id))
    }

    pub fn write_pool_data(&mut self, pool_id: U256, pool: &PoolData) -> Result<(), StateError> {
        pool.ensure_ordered()?;
        let word = pool.encode()?;
        self.storage.sstore(get_pool_data_slot(pool_id), word);
        Ok(())
    }

    // ------------------------- incentive data -------------------------

    pub fn read_incentive_words(&self, token_id: U256) -> IncentiveWords {
        let slot = get_incentive_data_slot(token_id);
        IncentiveWords {
            content0: self.storage.sload(slot),
            content1: self.storage.sload(slot.wrapping_add(U256::ONE)),
            content2: self.storage.sload(slot.wrapping_add(U256::from(2u8))),
        }
    }

    pub fn write_incentive_words(&mut self, token_id: U256, words: &IncentiveWords) {
        let slot = get_incentive_data_slot(token_id);
        self.storage.sstore(slot, words.content0);
        self.storage.sstore(slot.wrapping_add(U256::ONE), words.content1);
        self.storage
            .sstore(slot.wrapping_add(U256::from(2u8)), words.content2);
    }

    // ------------------------- tick corners -------------------------

    pub fn read_tick_points(&self, pool_id: U256, q: u64) -> U256 {
        self.storage
            .sload(get_evanescent_points_per_share_mapping_slot(pool_id, q))
    }

    pub fn write_tick_points(&mut self, pool_id: U256, q: u64, points: U256) {
        self.storage
            .sstore(get_evanescent_points_per_share_mapping_slot(pool_id, q), points);
    }

    // ------------------------- counters -------------------------

    /// Next token id to be handed out.
    pub fn token_id(&self) -> U256 {
        self.storage.sload(token_id_slot())
    }

    pub fn set_token_id(&mut self, token_id: U256) {
        self.storage.sstore(token_id_slot(), token_id);
    }

    /// Hands out the current token id and advances the counter, returning
    /// `(old, new)`.
    pub fn increment_token_id(&mut self) -> Result<(U256, U256), MathError> {
        let old = self.token_id();
        let new = old.checked_add(U256::ONE).ok_or(MathError::Overflow)?;
        self.set_token_id(new);
        Ok((old, new))
    }

    pub fn total_evanescent_points_owed(&self) -> U256 {
        self.storage.sload(total_evanescent_points_owed_slot())
    }

    pub fn update_total_evanescent_points_owed(
        &mut self,
        increment: U256,
    ) -> Result<U256, MathError> {
        let total = self
            .total_evanescent_points_owed()
            .checked_add(increment)
            .ok_or(MathError::Overflow)?;
        self.storage
            .sstore(total_evanescent_points_owed_slot(), total);
        Ok(total)
    }

    pub fn decrease_total_evanescent_points_owed(
        &mut self,
        decrement: U256,
    ) -> Result<U256, MathError> {
        let total = self
            .total_evanescent_points_owed()
            .checked_sub(decrement)
            .ok_or(MathError::Underflow)?;
        self.storage
            .sstore(total_evanescent_points_owed_slot(), total);
        Ok(total)
    }
}

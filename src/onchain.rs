//! Reads incentive state straight from a deployed contract's storage.

use crate::error::OnchainError;
use crate::state::{IncentiveData, IncentiveWords, PoolData};
use crate::storage::slots::{
    get_evanescent_points_per_share_mapping_slot, get_incentive_data_slot, get_pool_data_slot,
    token_id_slot, total_evanescent_points_owed_slot,
};
use alloy_primitives::{Address, BlockNumber, U256};
use alloy_provider::Provider;
use std::sync::Arc;

pub type OnchainProvider<P> = Arc<P>;

#[derive(Clone, Debug)]
pub struct StorageReader<P> {
    /// The incentive contract whose storage is read.
    pub address: Address,
    provider: OnchainProvider<P>,
}

impl<P> StorageReader<P>
where
    P: Provider + Send + Sync + 'static,
{
    pub fn new(address: Address, provider: OnchainProvider<P>) -> Self {
        Self { address, provider }
    }

    /// Reads one storage word, at `block_number` if given and at the
    /// latest block otherwise.
    pub async fn fetch_word(
        &self,
        slot: U256,
        block_number: Option<BlockNumber>,
    ) -> Result<U256, OnchainError> {
        let mut call = self.provider.get_storage_at(self.address, slot);

        if let Some(bn) = block_number {
            call = call.number(bn);
        }

        call.await.map_err(|e| OnchainError::FailedToReadStorage {
            slot,
            reason: e.to_string(),
        })
    }

    pub async fn fetch_pool_data(
        &self,
        pool_id: U256,
        block_number: Option<BlockNumber>,
    ) -> Result<PoolData, OnchainError> {
        let word = self
            .fetch_word(get_pool_data_slot(pool_id), block_number)
            .await?;
        Ok(PoolData::decode(word))
    }

    /// Fetches the three words of a position concurrently.
    pub async fn fetch_incentive_words(
        &self,
        token_id: U256,
        block_number: Option<BlockNumber>,
    ) -> Result<IncentiveWords, OnchainError> {
        let slot = get_incentive_data_slot(token_id);
        let (content0, content1, content2) = futures::try_join!(
            self.fetch_word(slot, block_number),
            self.fetch_word(slot.wrapping_add(U256::ONE), block_number),
            self.fetch_word(slot.wrapping_add(U256::from(2u8)), block_number),
        )?;
        Ok(IncentiveWords {
            content0,
            content1,
            content2,
        })
    }

    pub async fn fetch_incentive_data(
        &self,
        token_id: U256,
        block_number: Option<BlockNumber>,
    ) -> Result<IncentiveData, OnchainError> {
        let words = self.fetch_incentive_words(token_id, block_number).await?;
        Ok(IncentiveData::decode(&words, self.address))
    }

    pub async fn fetch_tick_points(
        &self,
        pool_id: U256,
        q: u64,
        block_number: Option<BlockNumber>,
    ) -> Result<U256, OnchainError> {
        self.fetch_word(
            get_evanescent_points_per_share_mapping_slot(pool_id, q),
            block_number,
        )
        .await
    }

    pub async fn fetch_token_id(
        &self,
        block_number: Option<BlockNumber>,
    ) -> Result<U256, OnchainError> {
        self.fetch_word(token_id_slot(), block_number).await
    }

    pub async fn fetch_total_evanescent_points_owed(
        &self,
        block_number: Option<BlockNumber>,
    ) -> Result<U256, OnchainError> {
        self.fetch_word(total_evanescent_points_owed_slot(), block_number)
            .await
    }

    pub async fn fetch_pool_data_latest(&self, pool_id: U256) -> Result<PoolData, OnchainError> {
        self.fetch_pool_data(pool_id, None).await
    }

    pub async fn fetch_incentive_data_latest(
        &self,
        token_id: U256,
    ) -> Result<IncentiveData, OnchainError> {
        self.fetch_incentive_data(token_id, None).await
    }
}

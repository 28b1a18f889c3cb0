use crate::error::StateError;
use crate::state::{Field, address_to_word};
use alloy_primitives::{Address, U256};

// content0: [poolTagHigh:96][reserved:64][evanescentPointsPerShareSubtrahend:96]
type PoolTagHigh = Field<160, 96>;
type Subtrahend = Field<0, 96>;
// content1: [qMin:64][qMax:64][shares:128]
type QMin = Field<192, 64>;
type QMax = Field<128, 64>;
type Shares = Field<0, 128>;

/// The three raw storage words of one incentive position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IncentiveWords {
    pub content0: U256,
    pub content1: U256,
    pub content2: U256,
}

impl IncentiveWords {
    pub fn new(content0: U256, content1: U256, content2: U256) -> Self {
        Self {
            content0,
            content1,
            content2,
        }
    }

    /// Full pool id: the high 96 bits of `content0` over the owning
    /// contract's address.
    #[inline]
    pub fn pool_id(&self, owner: Address) -> U256 {
        pool_id_from_tag(self.content0, owner)
    }

    #[inline]
    pub fn subtrahend(&self) -> U256 {
        Subtrahend::read(self.content0)
    }

    #[inline]
    pub fn q_min(&self) -> u64 {
        QMin::read(self.content1).to::<u64>()
    }

    #[inline]
    pub fn q_max(&self) -> u64 {
        QMax::read(self.content1).to::<u64>()
    }

    #[inline]
    pub fn shares(&self) -> u128 {
        Shares::read(self.content1).to::<u128>()
    }

    #[inline]
    pub fn evanescent_points_owed(&self) -> U256 {
        self.content2
    }

    /// Rewrites the subtrahend in `content0`, keeping the pool tag and the
    /// reserved bits as they are.
    pub fn with_subtrahend(mut self, subtrahend: U256) -> Result<Self, StateError> {
        self.content0 = Subtrahend::write(self.content0, subtrahend)?;
        Ok(self)
    }

    /// Rewrites the share count in `content1`.
    pub fn with_shares(mut self, shares: u128) -> Result<Self, StateError> {
        self.content1 = Shares::write(self.content1, U256::from(shares))?;
        Ok(self)
    }
}

/// Rebuilds a pool id from a word carrying the pool tag in its top 96 bits.
#[inline]
pub fn pool_id_from_tag(word: U256, owner: Address) -> U256 {
    ((word >> 160) << 160) | address_to_word(owner)
}

/// Decoded incentive position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IncentiveData {
    pub pool_id: U256,
    pub q_min: u64,
    pub q_max: u64,
    pub shares: u128,
    pub evanescent_points_per_share_subtrahend: U256,
    pub evanescent_points_owed: U256,
}

impl IncentiveData {
    pub fn decode(words: &IncentiveWords, owner: Address) -> Self {
        Self {
            pool_id: words.pool_id(owner),
            q_min: words.q_min(),
            q_max: words.q_max(),
            shares: words.shares(),
            evanescent_points_per_share_subtrahend: words.subtrahend(),
            evanescent_points_owed: words.evanescent_points_owed(),
        }
    }

    /// Packs the position into three fresh words. Only the top 96 bits of the
    /// pool id are stored; the reserved bits of `content0` come out zero.
    pub fn encode(&self) -> Result<IncentiveWords, StateError> {
        let content0 = PoolTagHigh::write(U256::ZERO, self.pool_id >> 160)?;
        let content0 = Subtrahend::write(content0, self.evanescent_points_per_share_subtrahend)?;

        let content1 = QMin::write(U256::ZERO, U256::from(self.q_min))?;
        let content1 = QMax::write(content1, U256::from(self.q_max))?;
        let content1 = Shares::write(content1, U256::from(self.shares))?;

        Ok(IncentiveWords {
            content0,
            content1,
            content2: self.evanescent_points_owed,
        })
    }

    pub fn ensure_ordered(&self) -> Result<(), StateError> {
        if self.q_min > self.q_max {
            return Err(StateError::InvalidPositionRange {
                q_min: self.q_min,
                q_max: self.q_max,
            });
        }
        Ok(())
    }

    /// Largest subtrahend that fits its field.
    pub fn max_subtrahend() -> U256 {
        Subtrahend::max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex};
    use proptest::prelude::*;

    const OWNER: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");

    fn values() -> [U256; 3] {
        [
            U256::ZERO,
            U256::from_be_bytes(hex!(
                "F00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00F"
            )),
            U256::MAX,
        ]
    }

    fn reserved_mask() -> U256 {
        U256::from_be_bytes(hex!(
            "FFFFFFFFFFFFFFFFFFFFFFFF0000000000000000FFFFFFFFFFFFFFFFFFFFFFFF"
        ))
    }

    // ------------------------- read tests -------------------------

    #[test]
    fn decode_reads_every_field() {
        let mod_64 = U256::from(u64::MAX);
        let mod_96 = IncentiveData::max_subtrahend();
        let mod_128 = U256::from(u128::MAX);
        for content0 in values() {
            for content1 in values() {
                for content2 in values() {
                    let words = IncentiveWords::new(content0, content1, content2);
                    let data = IncentiveData::decode(&words, OWNER);

                    assert_eq!(
                        data.pool_id,
                        ((content0 >> 160) << 160) + address_to_word(OWNER)
                    );
                    assert_eq!(data.evanescent_points_per_share_subtrahend, content0 & mod_96);
                    assert_eq!(U256::from(data.q_min), content1 >> 192);
                    assert_eq!(U256::from(data.q_max), (content1 >> 128) & mod_64);
                    assert_eq!(U256::from(data.shares), content1 & mod_128);
                    assert_eq!(data.evanescent_points_owed, content2);
                }
            }
        }
    }

    // ------------------------- write tests -------------------------

    #[test]
    fn encode_clears_reserved_bits_and_keeps_the_rest() {
        for content0 in values() {
            for content1 in values() {
                for content2 in values() {
                    let words = IncentiveWords::new(content0, content1, content2);
                    let encoded = IncentiveData::decode(&words, OWNER).encode().unwrap();

                    assert_eq!(encoded.content0, content0 & reserved_mask());
                    assert_eq!(encoded.content1, content1);
                    assert_eq!(encoded.content2, content2);
                }
            }
        }
    }

    #[test]
    fn with_subtrahend_preserves_tag_and_reserved_bits() {
        let words = IncentiveWords::new(U256::MAX, U256::ONE, U256::from(7u8));
        let updated = words.with_subtrahend(U256::from(5u8)).unwrap();

        assert_eq!(
            updated.content0,
            ((U256::MAX >> 96) << 96) + U256::from(5u8)
        );
        assert_eq!(updated.content1, U256::ONE);
        assert_eq!(updated.content2, U256::from(7u8));
    }

    #[test]
    fn with_shares_keeps_the_range() {
        let words = IncentiveWords::new(U256::ZERO, U256::MAX, U256::ZERO);
        let updated = words.with_shares(9).unwrap();
        assert_eq!(updated.q_min(), u64::MAX);
        assert_eq!(updated.q_max(), u64::MAX);
        assert_eq!(updated.shares(), 9);
    }

    #[test]
    fn with_subtrahend_rejects_wide_values() {
        let words = IncentiveWords::default();
        assert!(matches!(
            words.with_subtrahend(U256::ONE << 96),
            Err(StateError::FieldOverflow { offset: 0, width: 96, .. })
        ));
    }

    #[test]
    fn ensure_ordered_rejects_inverted_range() {
        let data = IncentiveData {
            q_min: 2,
            q_max: 1,
            ..IncentiveData::default()
        };
        assert!(matches!(
            data.ensure_ordered(),
            Err(StateError::InvalidPositionRange { q_min: 2, q_max: 1 })
        ));
    }

    proptest! {
        #[test]
        fn encode_then_decode_is_identity(
            tag in any::<[u8; 12]>(),
            q_min in any::<u64>(),
            q_max in any::<u64>(),
            shares in any::<u128>(),
            subtrahend in any::<u128>(),
            owed in any::<[u8; 32]>(),
        ) {
            let data = IncentiveData {
                pool_id: (U256::from_be_slice(&tag) << 160) | address_to_word(OWNER),
                q_min,
                q_max,
                shares,
                evanescent_points_per_share_subtrahend: U256::from(subtrahend) & IncentiveData::max_subtrahend(),
                evanescent_points_owed: U256::from_be_bytes(owed),
            };
            let words = data.encode().unwrap();
            prop_assert_eq!(IncentiveData::decode(&words, OWNER), data);
        }
    }
}

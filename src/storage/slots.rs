//! Storage slot derivation.
//!
//! Each namespace owns a base slot `keccak256(name) - 1`. Keyed maps reduce
//! the base to 128 bits (pool and token maps) or 64 bits (the per-tick map)
//! and hash it together with the key, packed big-endian without padding.

use alloy_primitives::{U256, keccak256};

pub const TOKEN_ID: &str = "tokenId";
pub const TOTAL_EVANESCENT_POINTS_OWED: &str = "totalEvanescentPointsOwed";
pub const POOL_DATA: &str = "poolData";
pub const INCENTIVE_DATA: &str = "incentiveData";
pub const EVANESCENT_POINTS_PER_SHARE_MAPPING: &str = "evanescentPointsPerShareMapping";

/// Returns `keccak256(name) - 1`, wrapping at zero.
pub fn namespace_slot(name: &str) -> U256 {
    U256::from_be_bytes(keccak256(name.as_bytes()).0).wrapping_sub(U256::ONE)
}

#[inline]
fn low_u128(x: U256) -> u128 {
    let l = x.as_limbs();
    ((l[1] as u128) << 64) | l[0] as u128
}

#[inline]
fn low_u64(x: U256) -> u64 {
    x.as_limbs()[0]
}

pub fn token_id_slot() -> U256 {
    namespace_slot(TOKEN_ID)
}

pub fn total_evanescent_points_owed_slot() -> U256 {
    namespace_slot(TOTAL_EVANESCENT_POINTS_OWED)
}

pub fn pool_data_slot() -> u128 {
    low_u128(namespace_slot(POOL_DATA))
}

pub fn incentive_data_slot() -> u128 {
    low_u128(namespace_slot(INCENTIVE_DATA))
}

pub fn evanescent_points_per_share_mapping_slot() -> u64 {
    low_u64(namespace_slot(EVANESCENT_POINTS_PER_SHARE_MAPPING))
}

fn hash_key_u128(key: U256, base: u128) -> U256 {
    let mut packed = [0u8; 48];
    packed[..32].copy_from_slice(&key.to_be_bytes::<32>());
    packed[32..].copy_from_slice(&base.to_be_bytes());
    U256::from_be_bytes(keccak256(packed).0)
}

/// `keccak256(abi.encodePacked(uint256 poolId, uint128 poolDataSlot))`
pub fn get_pool_data_slot(pool_id: U256) -> U256 {
    hash_key_u128(pool_id, pool_data_slot())
}

/// `keccak256(abi.encodePacked(uint256 tokenId, uint128 incentiveDataSlot))`
///
/// The three content words live at this slot and the two that follow it.
pub fn get_incentive_data_slot(token_id: U256) -> U256 {
    hash_key_u128(token_id, incentive_data_slot())
}

/// `keccak256(abi.encodePacked(uint256 poolId, uint64 q, uint64 mappingSlot))`
pub fn get_evanescent_points_per_share_mapping_slot(pool_id: U256, q: u64) -> U256 {
    let mut packed = [0u8; 48];
    packed[..32].copy_from_slice(&pool_id.to_be_bytes::<32>());
    packed[32..40].copy_from_slice(&q.to_be_bytes());
    packed[40..].copy_from_slice(&evanescent_points_per_share_mapping_slot().to_be_bytes());
    let slot = U256::from_be_bytes(keccak256(packed).0);
    tracing::trace!(%pool_id, q, %slot, "derived tick points slot");
    slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    fn keccak_word(bytes: &[u8]) -> U256 {
        U256::from_be_bytes(keccak256(bytes).0)
    }

    fn values() -> [U256; 5] {
        [
            U256::ZERO,
            U256::ONE,
            U256::from_be_bytes(hex!(
                "F00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00FF00F"
            )),
            U256::from_be_bytes(hex!(
                "8FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"
            )),
            U256::MAX,
        ]
    }

    const LOG_PRICES: [u64; 5] = [0, 1, 0xF00FF00FF00FF00F, 0x8FFFFFFFFFFFFFFF, u64::MAX];

    // ------------------------- hashing sanity -------------------------

    #[test]
    fn keccak_of_empty_input_matches_known_digest() {
        assert_eq!(
            keccak256(b"").0,
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    // ------------------------- namespace slots -------------------------

    #[test]
    fn scalar_slots_are_hash_minus_one() {
        assert_eq!(token_id_slot(), keccak_word(b"tokenId") - U256::ONE);
        assert_eq!(
            total_evanescent_points_owed_slot(),
            keccak_word(b"totalEvanescentPointsOwed") - U256::ONE
        );
    }

    #[test]
    fn map_slots_are_reduced_hash_minus_one() {
        let mod_128 = (U256::ONE << 128) - U256::ONE;
        let mod_64 = (U256::ONE << 64) - U256::ONE;

        let pool = (keccak_word(b"poolData") - U256::ONE) & mod_128;
        assert_eq!(U256::from(pool_data_slot()), pool);

        let incentive = (keccak_word(b"incentiveData") - U256::ONE) & mod_128;
        assert_eq!(U256::from(incentive_data_slot()), incentive);

        let mapping = (keccak_word(b"evanescentPointsPerShareMapping") - U256::ONE) & mod_64;
        assert_eq!(U256::from(evanescent_points_per_share_mapping_slot()), mapping);
    }

    #[test]
    fn namespace_slots_are_distinct() {
        let slots = [
            namespace_slot(TOKEN_ID),
            namespace_slot(TOTAL_EVANESCENT_POINTS_OWED),
            namespace_slot(POOL_DATA),
            namespace_slot(INCENTIVE_DATA),
            namespace_slot(EVANESCENT_POINTS_PER_SHARE_MAPPING),
        ];
        for i in 0..slots.len() {
            for j in i + 1..slots.len() {
                assert_ne!(slots[i], slots[j]);
            }
        }
    }

    // ------------------------- keyed slots -------------------------

    #[test]
    fn pool_data_slot_matches_packed_encoding() {
        for pool_id in values() {
            let mut packed = pool_id.to_be_bytes::<32>().to_vec();
            packed.extend_from_slice(&pool_data_slot().to_be_bytes());
            assert_eq!(get_pool_data_slot(pool_id), keccak_word(&packed));
        }
    }

    #[test]
    fn incentive_data_slot_matches_packed_encoding() {
        for token_id in values() {
            let mut packed = token_id.to_be_bytes::<32>().to_vec();
            packed.extend_from_slice(&incentive_data_slot().to_be_bytes());
            assert_eq!(get_incentive_data_slot(token_id), keccak_word(&packed));
        }
    }

    #[test]
    fn tick_points_slot_matches_packed_encoding() {
        for pool_id in values() {
            for q in LOG_PRICES {
                let mut packed = pool_id.to_be_bytes::<32>().to_vec();
                packed.extend_from_slice(&q.to_be_bytes());
                packed.extend_from_slice(&evanescent_points_per_share_mapping_slot().to_be_bytes());
                assert_eq!(
                    get_evanescent_points_per_share_mapping_slot(pool_id, q),
                    keccak_word(&packed)
                );
            }
        }
    }

    #[test]
    fn keyed_slots_are_deterministic_and_separate_keys() {
        let a = get_evanescent_points_per_share_mapping_slot(U256::ONE, 10);
        assert_eq!(a, get_evanescent_points_per_share_mapping_slot(U256::ONE, 10));
        assert_ne!(a, get_evanescent_points_per_share_mapping_slot(U256::ONE, 11));
        assert_ne!(a, get_evanescent_points_per_share_mapping_slot(U256::from(2u8), 10));

        // same key, different namespace
        assert_ne!(get_pool_data_slot(U256::ONE), get_incentive_data_slot(U256::ONE));
    }
}

//! Packed storage words.
//!
//! Each record is a tuple of fixed-width fields inside one or more 256-bit
//! words. Field placement is described by [`Field`], whose offset and width
//! are checked at compile time; raw words never leave this module's types.

pub mod incentive_data;
pub mod pool_data;

use crate::error::StateError;
use alloy_primitives::{Address, U256};

pub use incentive_data::{IncentiveData, IncentiveWords};
pub use pool_data::PoolData;

/// A `WIDTH`-bit field starting at bit `OFFSET` of a word.
pub struct Field<const OFFSET: usize, const WIDTH: usize>;

impl<const OFFSET: usize, const WIDTH: usize> Field<OFFSET, WIDTH> {
    const IN_BOUNDS: () = assert!(WIDTH > 0 && OFFSET + WIDTH <= 256);

    /// All-ones value of the field's width, unshifted.
    #[inline(always)]
    pub fn max() -> U256 {
        let () = Self::IN_BOUNDS;
        U256::MAX >> (256 - WIDTH)
    }

    #[inline(always)]
    pub fn read(word: U256) -> U256 {
        (word >> OFFSET) & Self::max()
    }

    /// Replaces the field inside `word`, leaving every other bit untouched.
    #[inline]
    pub fn write(word: U256, value: U256) -> Result<U256, StateError> {
        if value > Self::max() {
            return Err(StateError::FieldOverflow {
                offset: OFFSET,
                width: WIDTH,
                value,
            });
        }
        Ok((word & !(Self::max() << OFFSET)) | (value << OFFSET))
    }
}

/// Converts an address into the low 160 bits of a word.
#[inline(always)]
pub fn address_to_word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

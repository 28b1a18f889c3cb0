//! Word-addressed storage and all-or-nothing write batches.
//!
//! Every piece of incentive state lives in 256-bit words keyed by a
//! 256-bit slot, exactly like contract storage. [`Storage`] is the narrow
//! interface the ledger reads and writes through; [`MemoryStorage`] backs it
//! with a [`FastMap`], and [`Transaction`] stages writes so that an operation
//! either commits every word it touched or none of them.

pub mod incentive_storage;
pub mod slots;

use crate::FastMap;
use alloy_primitives::U256;

pub use incentive_storage::IncentiveStorage;

pub trait Storage {
    /// Reads the word at `slot`; unwritten slots read as zero.
    fn sload(&self, slot: U256) -> U256;

    fn sstore(&mut self, slot: U256, value: U256);
}

impl<S: Storage + ?Sized> Storage for &mut S {
    #[inline]
    fn sload(&self, slot: U256) -> U256 {
        (**self).sload(slot)
    }

    #[inline]
    fn sstore(&mut self, slot: U256, value: U256) {
        (**self).sstore(slot, value)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    words: FastMap<U256, U256>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-zero words held.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Storage for MemoryStorage {
    #[inline]
    fn sload(&self, slot: U256) -> U256 {
        *self.words.get(&slot).unwrap_or(&U256::ZERO)
    }

    fn sstore(&mut self, slot: U256, value: U256) {
        // zero words are indistinguishable from absent ones
        if value.is_zero() {
            self.words.remove(&slot);
        } else {
            self.words.insert(slot, value);
        }
    }
}

/// A write batch over another store.
///
/// Reads see staged writes first. Nothing reaches the underlying store until
/// [`Transaction::commit`]; dropping the transaction discards the batch.
pub struct Transaction<'a, S: Storage> {
    inner: &'a mut S,
    staged: FastMap<U256, U256>,
}

impl<'a, S: Storage> Transaction<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            staged: FastMap::default(),
        }
    }

    /// Number of distinct slots written so far.
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    pub fn commit(self) {
        let Self { inner, staged } = self;
        tracing::trace!(words = staged.len(), "committing storage batch");
        for (slot, value) in staged {
            inner.sstore(slot, value);
        }
    }
}

impl<S: Storage> Storage for Transaction<'_, S> {
    #[inline]
    fn sload(&self, slot: U256) -> U256 {
        match self.staged.get(&slot) {
            Some(value) => *value,
            None => self.inner.sload(slot),
        }
    }

    #[inline]
    fn sstore(&mut self, slot: U256, value: U256) {
        self.staged.insert(slot, value);
    }
}

/// Runs `f` against a fresh [`Transaction`] over `storage` and commits only
/// if it returns `Ok`.
pub fn atomic<S, T, E, F>(storage: &mut S, f: F) -> Result<T, E>
where
    S: Storage,
    F: FnOnce(&mut Transaction<'_, S>) -> Result<T, E>,
{
    let mut tx = Transaction::new(storage);
    let out = f(&mut tx)?;
    tx.commit();
    Ok(out)
}

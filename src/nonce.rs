//! Per-signer nonce tracking
//!
//! Rows that share a signing key may run in the same batch. Each signer gets
//! its own async lock, held from nonce selection until the broadcast has
//! resolved, so two rows never sign with the same nonce. The network's
//! pending count is fetched once per signer and then advanced locally.

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process nonce cache with one lock per signer address
#[derive(Debug, Default)]
pub struct NonceTracker {
    slots: DashMap<Address, Arc<Mutex<Option<u64>>>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the signer's slot; other rows of the same signer wait here
    pub async fn acquire(&self, address: Address) -> NonceSlot {
        // clone the Arc so the map shard is released before awaiting the lock
        let slot = self.slots.entry(address).or_default().value().clone();
        NonceSlot {
            address,
            next: slot.lock_owned().await,
        }
    }

    /// Cached next nonce for a signer, if one is known
    pub fn peek(&self, address: Address) -> Option<u64> {
        let slot = self.slots.get(&address)?.value().clone();
        let next = slot.try_lock().ok()?;
        *next
    }
}

/// Exclusive access to one signer's next nonce
#[derive(Debug)]
pub struct NonceSlot {
    address: Address,
    next: OwnedMutexGuard<Option<u64>>,
}

impl NonceSlot {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Next nonce known locally; `None` means it must be fetched from the network
    pub fn cached(&self) -> Option<u64> {
        *self.next
    }

    /// Record a successful broadcast with `nonce`
    pub fn commit(&mut self, nonce: u64) {
        *self.next = Some(nonce + 1);
    }

    /// Forget the cached value after a failed broadcast
    pub fn invalidate(&mut self) {
        *self.next = None;
    }
}

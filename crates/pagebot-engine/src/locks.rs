// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation serialization.
//!
//! Each (page, user) pair gets an async mutex that is held from the
//! conversation read through the state write. Waiters are served in FIFO
//! order, so messages from one user are handled in arrival order. Entries
//! are dropped from the map once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockKey = (String, String);

/// Keyed async mutexes, one per (page, user).
#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    inner: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one user's conversation on a page.
    pub async fn acquire(&self, page_id: &str, user_id: &str) -> ConversationGuard {
        let key = (page_id.to_string(), user_id.to_string());
        let mutex = self.inner.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        ConversationGuard {
            guard: Some(guard),
            key,
            map: Arc::clone(&self.inner),
        }
    }

    /// Number of conversations currently locked or awaited.
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

/// Held while a conversation is being processed.
#[derive(Debug)]
pub struct ConversationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: LockKey,
    map: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        // Release first so the map holds the only reference when idle.
        self.guard.take();
        self.map
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

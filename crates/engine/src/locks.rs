//! Per-user serialization of balance and stats mutations

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle locks are pruned once the registry grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of one async mutex per user id
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while a user's rows are being mutated
pub struct UserGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Serialize against every other mutation of this user
    pub async fn lock(&self, user_id: &str) -> UserGuard {
        let guard = self.handle(user_id).lock_owned().await;
        UserGuard {
            _guards: vec![guard],
        }
    }

    /// Lock two users in a global order so opposing transfers cannot deadlock
    pub async fn lock_pair(&self, a: &str, b: &str) -> UserGuard {
        if a == b {
            return self.lock(a).await;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.handle(first).lock_owned().await;
        let second_guard = self.handle(second).lock_owned().await;
        UserGuard {
            _guards: vec![first_guard, second_guard],
        }
    }

    /// Number of tracked users
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

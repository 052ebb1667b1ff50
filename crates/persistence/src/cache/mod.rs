//! Short-lived snapshots of ranked leaderboards
//!
//! Rankings are rebuilt from the database at most once per TTL for each
//! (category, period, limit) view. A snapshot may therefore lag balance
//! changes by up to the TTL unless the cache is cleared.

use carepoints_core::{LeaderboardCategory, LeaderboardEntry, LeaderboardPeriod};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Identifies one leaderboard view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaderboardKey {
    pub category: LeaderboardCategory,
    pub period: LeaderboardPeriod,
    pub limit: u32,
}

struct Snapshot {
    board: Vec<LeaderboardEntry>,
    taken_at: Instant,
}

pub struct LeaderboardCache {
    snapshots: RwLock<HashMap<LeaderboardKey, Snapshot>>,
    ttl: Duration,
    max_views: usize,
}

impl LeaderboardCache {
    pub fn with_capacity(ttl: Duration, max_views: usize) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            ttl,
            max_views,
        }
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        snapshot.taken_at.elapsed() <= self.ttl
    }

    /// The ranked board for a view, if a fresh snapshot exists
    pub fn get(&self, key: &LeaderboardKey) -> Option<Vec<LeaderboardEntry>> {
        let snapshots = self.snapshots.read().ok()?;
        snapshots
            .get(key)
            .filter(|s| self.is_fresh(s))
            .map(|s| s.board.clone())
    }

    /// Store a freshly ranked board. When every slot is taken, stale
    /// snapshots go first, then the oldest one.
    pub fn insert(&self, key: LeaderboardKey, board: Vec<LeaderboardEntry>) {
        let Ok(mut snapshots) = self.snapshots.write() else {
            return;
        };

        if !snapshots.contains_key(&key) && snapshots.len() >= self.max_views {
            snapshots.retain(|_, s| self.is_fresh(s));
            if snapshots.len() >= self.max_views {
                let oldest = snapshots
                    .iter()
                    .min_by_key(|(_, s)| s.taken_at)
                    .map(|(k, _)| *k);
                if let Some(oldest) = oldest {
                    snapshots.remove(&oldest);
                }
            }
        }

        snapshots.insert(
            key,
            Snapshot {
                board,
                taken_at: Instant::now(),
            },
        );
    }

    /// Forget every snapshot so the next read re-ranks
    pub fn clear(&self) {
        if let Ok(mut snapshots) = self.snapshots.write() {
            snapshots.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LeaderboardCache {
    fn default() -> Self {
        // 30 seconds, 64 views
        Self::with_capacity(Duration::from_secs(30), 64)
    }
}

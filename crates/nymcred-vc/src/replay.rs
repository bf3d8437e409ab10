//! # Replay Cache
//!
//! Remembers `(nonce, A')` for every accepted presentation. `A'` is fresh
//! per proof, so the pair identifies one presentation; a second submission
//! of the same bytes under the same nonce is a replay.
//!
//! Entries expire after the retention window and only then leave the
//! cache. A live entry is never evicted: when the cache is full of
//! unexpired entries, new presentations are refused with
//! [`ReplayCheck::Full`] until the oldest one expires. Check-and-insert is
//! a single critical section under a `parking_lot::Mutex`, so of two
//! concurrent submissions of one proof exactly one is accepted.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use nymcred_core::Nonce;
use nymcred_crypto::{G1Affine, G1_COMPRESSED_SIZE};
use parking_lot::Mutex;

type ReplayKey = (Nonce, [u8; G1_COMPRESSED_SIZE]);

#[derive(Debug, Default)]
struct ReplayState {
    seen: HashMap<ReplayKey, Instant>,
    /// Insertion order, oldest first.
    order: VecDeque<(Instant, ReplayKey)>,
}

impl ReplayState {
    fn expire(&mut self, now: Instant, window: Duration) -> usize {
        let mut evicted = 0;
        while let Some((inserted, _)) = self.order.front() {
            if now.saturating_duration_since(*inserted) < window {
                break;
            }
            if let Some((_, key)) = self.order.pop_front() {
                self.seen.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }

}

/// Outcome of [`ReplayCache::check_and_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayCheck {
    /// First sighting; now recorded.
    Fresh,
    /// Already recorded within the window.
    Replayed,
    /// Every slot holds a live entry; nothing was recorded.
    Full,
}

impl ReplayCheck {
    pub fn is_fresh(self) -> bool {
        self == Self::Fresh
    }
}

#[derive(Debug)]
pub struct ReplayCache {
    window: Duration,
    capacity: usize,
    state: Mutex<ReplayState>,
}

impl ReplayCache {
    /// `capacity` is clamped to at least one entry.
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            state: Mutex::new(ReplayState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a presentation unless it was already recorded within the
    /// window or the cache is full of live entries.
    pub fn check_and_insert(&self, nonce: &Nonce, a_prime: &G1Affine) -> ReplayCheck {
        self.check_and_insert_at(nonce, a_prime, Instant::now())
    }

    /// [`Self::check_and_insert`] at an explicit instant. Instants passed
    /// to one cache must not go backwards.
    pub fn check_and_insert_at(
        &self,
        nonce: &Nonce,
        a_prime: &G1Affine,
        now: Instant,
    ) -> ReplayCheck {
        let key = (nonce.clone(), a_prime.to_compressed());
        let mut state = self.state.lock();
        let expired = state.expire(now, self.window);
        if expired > 0 {
            tracing::debug!(expired, "replay cache entries expired");
        }
        if state.seen.contains_key(&key) {
            return ReplayCheck::Replayed;
        }
        if state.seen.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "replay cache full of live entries");
            return ReplayCheck::Full;
        }
        state.seen.insert(key.clone(), now);
        state.order.push_back((now, key));
        ReplayCheck::Fresh
    }

    pub fn len(&self) -> usize {
        self.state.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

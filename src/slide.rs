//! Slide speed boosts.
//!
//! Each slide press grants bonus speed immediately and schedules the same
//! amount to be taken back after a fixed delay. Decays are never cancelled or
//! merged: two quick presses leave two pending decays.

use std::collections::VecDeque;
use std::time::Duration;

use bevy::prelude::*;

/// One scheduled bonus-speed decay.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct PendingDecay {
    /// Physics time at which the decay fires.
    pub expires_at: Duration,
    /// Bonus speed removed when it fires.
    pub amount: f32,
}

/// Deferred decays keyed by physics-time expiry.
///
/// The clock counts whole nanoseconds, so small steps keep advancing it no
/// matter how long the session runs.
#[derive(Reflect, Debug, Clone, Default)]
pub struct SlideBoosts {
    clock: Duration,
    pending: VecDeque<PendingDecay>,
}

impl SlideBoosts {
    /// Physics time seen so far.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Number of decays still waiting to fire.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Bonus speed that will be removed once every pending decay fires.
    pub fn outstanding(&self) -> f32 {
        self.pending.iter().map(|decay| decay.amount).sum()
    }

    /// Schedule `amount` to decay `delay` seconds of physics time from now.
    pub fn schedule(&mut self, amount: f32, delay: f32) {
        let decay = PendingDecay {
            expires_at: self.clock + seconds(delay),
            amount,
        };
        // Delays can change between presses, so keep the queue sorted.
        let index = self
            .pending
            .partition_point(|queued| queued.expires_at <= decay.expires_at);
        self.pending.insert(index, decay);
    }

    /// Advance physics time and return the total amount that decayed.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.clock += seconds(dt);

        let mut decayed = 0.0;
        while let Some(next) = self.pending.front() {
            if next.expires_at > self.clock {
                break;
            }
            decayed += next.amount;
            self.pending.pop_front();
        }
        decayed
    }
}

/// Negative or non-finite seconds count as zero.
fn seconds(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or_default()
}

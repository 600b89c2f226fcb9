// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Congestion Decay Schedule

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ticks a congestion unit stays on an antenna before it decays.
pub const CONGESTION_WINDOW: u64 = 3;

const SLOTS: usize = CONGESTION_WINDOW as usize + 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    due: u64,
    count: u32,
}

/// Pending congestion decrements, bucketed by `due_tick mod (window + 1)`.
///
/// Each slot remembers the tick it is due at, so a slot is only drained on
/// that exact tick and a stale slot is never drained twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CongestionSchedule {
    slots: [Slot; SLOTS],
}

impl CongestionSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule one decrement at `tick + CONGESTION_WINDOW`. Returns the due tick.
    pub fn schedule(&mut self, tick: u64) -> u64 {
        let due = tick + CONGESTION_WINDOW;
        let slot = &mut self.slots[(due % SLOTS as u64) as usize];
        if slot.due != due {
            if slot.count > 0 {
                debug!(stale_due = slot.due, dropped = slot.count, "overwriting undrained congestion slot");
            }
            *slot = Slot { due, count: 0 };
        }
        slot.count += 1;
        due
    }

    /// Remove and return the decrements due exactly at `tick`.
    pub fn take_due(&mut self, tick: u64) -> u32 {
        let slot = &mut self.slots[(tick % SLOTS as u64) as usize];
        if slot.due != tick || slot.count == 0 {
            return 0;
        }
        let count = slot.count;
        slot.count = 0;
        count
    }

    /// Decrements due exactly at `tick`, without draining them.
    pub fn pending_at(&self, tick: u64) -> u32 {
        let slot = &self.slots[(tick % SLOTS as u64) as usize];
        if slot.due == tick { slot.count } else { 0 }
    }

    pub fn total_pending(&self) -> u32 {
        self.slots.iter().map(|s| s.count).sum()
    }
}

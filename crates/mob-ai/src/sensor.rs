//! Periodic producers that refresh brain memory from world state.

use std::fmt;

use crate::memory::{GameTime, MemoryKey, MemoryStore};

/// Scan interval used when a sensor does not pick its own.
pub const DEFAULT_SCAN_INTERVAL: u64 = 20;

pub trait Sensor<C>: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str {
        crate::short_type_name::<Self>()
    }

    /// Ticks between two scans. Must be non-zero.
    fn interval(&self) -> u64 {
        DEFAULT_SCAN_INTERVAL
    }

    /// Memory slots written by this sensor; registered when the brain is
    /// built. Sensors are expected to be the only writers of these slots.
    fn produces(&self) -> Vec<MemoryKey>;

    fn sense(&mut self, ctx: &C, memory: &mut MemoryStore);
}

/// Whether a sensor with `interval` scans at `now`. The salt (usually the
/// actor id) spreads different actors' scans over different ticks.
pub(crate) fn is_due(salt: u64, now: GameTime, interval: u64) -> bool {
    now.wrapping_add(salt) % interval == 0
}

//! Time utilities for the peer simulation

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 simulation ticks per second
pub const REPLICATION_TPS: u32 = 10; // 10 move broadcasts per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Calculate delta time for simulation (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Delta time for one simulation tick in milliseconds
pub fn tick_delta_ms() -> f32 {
    1000.0 / SIMULATION_TPS as f32
}

//! State replication: broadcast cadence and the smoothed remote copy
//!
//! Each peer broadcasts only its own state and consumes the opponent's
//! broadcasts into a local copy. Position updates set a target that the
//! rendered position eases toward, which absorbs delivery jitter without
//! visible snapping; velocity and facing apply immediately because they
//! drive animation, not position.

use crate::net::protocol::Facing;
use crate::util::time::{REPLICATION_TPS, SIMULATION_TPS};

/// Fraction of the remaining distance covered per simulation tick
pub const REMOTE_SMOOTHING: f32 = 0.2;

/// Decides which simulation ticks emit a `move` broadcast (10/s at 30 TPS)
pub struct ReplicationCadence {
    ticks_since_send: u32,
    send_interval: u32,
}

impl ReplicationCadence {
    pub fn new() -> Self {
        Self {
            ticks_since_send: 0,
            send_interval: SIMULATION_TPS / REPLICATION_TPS,
        }
    }

    /// Advance one tick; true when a broadcast is due
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_send += 1;
        if self.ticks_since_send >= self.send_interval {
            self.ticks_since_send = 0;
            true
        } else {
            false
        }
    }
}

impl Default for ReplicationCadence {
    fn default() -> Self {
        Self::new()
    }
}

/// The local, smoothed copy of the opponent's replicated state. Written
/// only by incoming `move` messages (or the scripted opponent in
/// single-peer mode), read every tick for rendering and overlap tests.
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    /// Rendered position, eased toward the target
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
}

impl RemotePlayer {
    pub fn spawn(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            target_x: x,
            target_y: y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Idle,
        }
    }

    /// Ingest a `move` message. Idempotent: replaying the same payload
    /// leaves the same target state.
    pub fn apply_move(&mut self, x: f32, y: f32, vx: f32, vy: f32, facing: Facing) {
        self.target_x = x;
        self.target_y = y;
        self.vx = vx;
        self.vy = vy;
        self.facing = facing;
    }

    /// Per-tick exponential easing toward the latest target
    pub fn interpolate(&mut self) {
        self.x += (self.target_x - self.x) * REMOTE_SMOOTHING;
        self.y += (self.target_y - self.y) * REMOTE_SMOOTHING;
    }

    /// Direct control for the scripted opponent: no smoothing, the
    /// controller is the authority
    pub fn drive(&mut self, x: f32, y: f32, vx: f32, vy: f32, facing: Facing) {
        self.x = x;
        self.y = y;
        self.target_x = x;
        self.target_y = y;
        self.vx = vx;
        self.vy = vy;
        self.facing = facing;
    }

    pub fn respawn(&mut self, x: f32, y: f32) {
        *self = Self::spawn(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_is_every_third_tick() {
        let mut cadence = ReplicationCadence::new();
        let pattern: Vec<bool> = (0..9).map(|_| cadence.should_send()).collect();
        assert_eq!(
            pattern,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn apply_move_is_idempotent() {
        let mut a = RemotePlayer::spawn(100.0, 100.0);
        let mut b = RemotePlayer::spawn(100.0, 100.0);

        a.apply_move(200.0, 150.0, 1.0, 0.0, Facing::Right);
        b.apply_move(200.0, 150.0, 1.0, 0.0, Facing::Right);
        b.apply_move(200.0, 150.0, 1.0, 0.0, Facing::Right);

        assert_eq!(a.target_x, b.target_x);
        assert_eq!(a.target_y, b.target_y);
        assert_eq!(a.vx, b.vx);
        assert_eq!(a.facing, b.facing);
    }

    #[test]
    fn interpolation_eases_toward_target() {
        let mut remote = RemotePlayer::spawn(0.0, 0.0);
        remote.apply_move(100.0, 0.0, 0.0, 0.0, Facing::Idle);

        remote.interpolate();
        assert!((remote.x - 20.0).abs() < 1e-4);
        remote.interpolate();
        assert!((remote.x - 36.0).abs() < 1e-4);

        // Converges without overshoot
        for _ in 0..100 {
            remote.interpolate();
        }
        assert!((remote.x - 100.0).abs() < 0.1);
        assert!(remote.x <= 100.0);
    }

    #[test]
    fn velocity_and_facing_apply_immediately() {
        let mut remote = RemotePlayer::spawn(0.0, 0.0);
        remote.apply_move(50.0, 0.0, -200.0, 0.0, Facing::Left);
        assert_eq!(remote.vx, -200.0);
        assert_eq!(remote.facing, Facing::Left);
        // Position did not snap
        assert_eq!(remote.x, 0.0);
    }
}

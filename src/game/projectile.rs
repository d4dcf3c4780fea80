//! Projectile records and throw physics
//!
//! Locally thrown projectiles fly with real collision against the local
//! world; remote-announced ones replay the reported velocity so both
//! screens show matching trajectories. Only a remote-owned projectile can
//! damage the local player.

use uuid::Uuid;

use crate::game::arena::Arena;
use crate::session::PeerRole;
use crate::util::time::tick_delta;

/// Visual/hitbox radius of an uncharged snowball
pub const BASE_RADIUS: f32 = 16.0;
/// Charge-derived size factor range
pub const MIN_SIZE_MULTIPLIER: f32 = 1.0;
pub const MAX_SIZE_MULTIPLIER: f32 = 5.0;

/// Throw parameters derived from the charge meter and gesture power:
/// a bigger snowball flies slower. Returns (size_multiplier, launch_speed).
pub fn throw_parameters(charge: f32, power: f32) -> (f32, f32) {
    let multiplier = 1.0 + charge.clamp(0.0, 1.0) * 4.0;
    let velocity = (200.0 + power.max(0.0) * 5.0) / multiplier;
    (multiplier, velocity)
}

/// One in-flight snowball
#[derive(Debug, Clone)]
pub struct ProjectileRecord {
    pub id: Uuid,
    pub owner: PeerRole,
    pub x: f32,
    pub y: f32,
    pub size_multiplier: f32,
    /// Signed vertical velocity; projectiles fly straight up or down
    pub vel_y: f32,
}

impl ProjectileRecord {
    /// Launch a projectile. `direction` is -1.0 (up) or 1.0 (down),
    /// decided by the owning role's side of the arena.
    pub fn launch(
        owner: PeerRole,
        x: f32,
        y: f32,
        size_multiplier: f32,
        launch_velocity: f32,
        direction: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            x,
            y,
            size_multiplier: size_multiplier.clamp(MIN_SIZE_MULTIPLIER, MAX_SIZE_MULTIPLIER),
            vel_y: launch_velocity.abs() * direction.signum(),
        }
    }

    /// Advance one tick; returns false once the projectile has left the
    /// play area and should be destroyed.
    pub fn update(&mut self, arena: &Arena) -> bool {
        self.y += self.vel_y * tick_delta();
        arena.contains(self.x, self.y)
    }

    pub fn radius(&self) -> f32 {
        BASE_RADIUS * self.size_multiplier
    }

    /// Damage scales with the snowball's size
    pub fn damage(&self) -> f32 {
        self.radius() / 200.0
    }

    /// Circle overlap against a player body
    pub fn hits(&self, target_x: f32, target_y: f32, target_radius: f32) -> bool {
        let dx = self.x - target_x;
        let dy = self.y - target_y;
        let dist_sq = dx * dx + dy * dy;
        let combined = self.radius() + target_radius;
        dist_sq <= combined * combined
    }
}

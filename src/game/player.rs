//! Locally simulated player state
//!
//! Each peer is the single writer of its own PlayerState; the opponent only
//! ever learns about it through replication messages.

use crate::game::arena::Bounds;
use crate::net::protocol::Facing;
use crate::util::time::tick_delta;

/// Movement speed in pixels per second
pub const MOVE_SPEED: f32 = 200.0;
/// Body hitbox radius (the sprite body is 50x50)
pub const PLAYER_RADIUS: f32 = 25.0;
/// Slow health regeneration while below full
pub const HEALTH_REGEN_PER_SEC: f32 = 0.006;
/// Charge bleeds off when not thrown
pub const CHARGE_DECAY_PER_SEC: f32 = 0.06;
/// Minimum time between throws (seconds)
pub const THROW_COOLDOWN_SECS: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    /// Always within [0, 1]
    pub health: f32,
    /// Always within [0, 1]
    pub charge: f32,
    pub throw_cooldown: f32,
}

impl PlayerState {
    pub fn spawn(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Idle,
            health: 1.0,
            charge: 0.0,
            throw_cooldown: 0.0,
        }
    }

    /// Apply one tick of movement input. Axis values are -1, 0 or 1; the
    /// resulting position is clamped to the player's half of the arena.
    pub fn apply_move(&mut self, dir_x: f32, dir_y: f32, bounds: &Bounds) {
        let dt = tick_delta();
        self.vx = dir_x.clamp(-1.0, 1.0) * MOVE_SPEED;
        self.vy = dir_y.clamp(-1.0, 1.0) * MOVE_SPEED;

        let (x, y) = bounds.clamp(self.x + self.vx * dt, self.y + self.vy * dt);
        self.x = x;
        self.y = y;
        self.facing = facing_from_velocity(self.vx, self.vy);
    }

    /// Apply damage from a projectile overlap. Health stays inside [0, 1]
    /// no matter what the damage value is. Returns true if this reduced
    /// health to zero.
    pub fn apply_damage(&mut self, damage: f32) -> bool {
        self.health = (self.health - damage).clamp(0.0, 1.0);
        self.health <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Per-tick upkeep: regeneration, charge decay, cooldown
    pub fn upkeep(&mut self) {
        let dt = tick_delta();
        if self.health < 1.0 && !self.is_dead() {
            self.health = (self.health + HEALTH_REGEN_PER_SEC * dt).min(1.0);
        }
        self.charge = (self.charge - CHARGE_DECAY_PER_SEC * dt).max(0.0);
        self.throw_cooldown = (self.throw_cooldown - dt).max(0.0);
    }

    /// Bank throw power into the charge meter
    pub fn add_charge(&mut self, power: f32) {
        self.charge = (self.charge + 0.1 * power.max(0.0) / 20.0).min(1.0);
    }

    pub fn can_throw(&self) -> bool {
        self.throw_cooldown <= 0.0
    }

    /// Consume the charge meter for a throw and start the cooldown
    pub fn consume_charge(&mut self) -> f32 {
        let charge = self.charge;
        self.charge = 0.0;
        self.throw_cooldown = THROW_COOLDOWN_SECS;
        charge
    }

    /// Reset for a new round at the given spawn point
    pub fn respawn(&mut self, x: f32, y: f32) {
        *self = Self::spawn(x, y);
    }
}

/// Facing mirrors the walk animation selection: horizontal movement wins
/// over vertical, standing still is idle.
pub fn facing_from_velocity(vx: f32, vy: f32) -> Facing {
    if vx < 0.0 {
        Facing::Left
    } else if vx > 0.0 {
        Facing::Right
    } else if vy < 0.0 {
        Facing::Up
    } else if vy > 0.0 {
        Facing::Down
    } else {
        Facing::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_is_clamped_to_unit_interval() {
        let mut player = PlayerState::spawn(0.0, 0.0);

        assert!(!player.apply_damage(0.3));
        assert!((player.health - 0.7).abs() < f32::EPSILON);

        // Overshoot cannot push health below zero
        assert!(player.apply_damage(10.0));
        assert_eq!(player.health, 0.0);

        // Negative damage cannot push health above one
        let mut player = PlayerState::spawn(0.0, 0.0);
        assert!(!player.apply_damage(-5.0));
        assert_eq!(player.health, 1.0);
    }

    #[test]
    fn facing_prefers_horizontal() {
        assert_eq!(facing_from_velocity(-1.0, 1.0), Facing::Left);
        assert_eq!(facing_from_velocity(1.0, -1.0), Facing::Right);
        assert_eq!(facing_from_velocity(0.0, -1.0), Facing::Up);
        assert_eq!(facing_from_velocity(0.0, 1.0), Facing::Down);
        assert_eq!(facing_from_velocity(0.0, 0.0), Facing::Idle);
    }

    #[test]
    fn movement_respects_bounds() {
        let bounds = Bounds {
            min_x: 0.0,
            max_x: 100.0,
            min_y: 0.0,
            max_y: 100.0,
        };
        let mut player = PlayerState::spawn(99.0, 50.0);
        for _ in 0..60 {
            player.apply_move(1.0, 0.0, &bounds);
        }
        assert_eq!(player.x, 100.0);
    }

    #[test]
    fn charge_caps_at_one_and_decays() {
        let mut player = PlayerState::spawn(0.0, 0.0);
        for _ in 0..100 {
            player.add_charge(50.0);
        }
        assert_eq!(player.charge, 1.0);

        player.upkeep();
        assert!(player.charge < 1.0);
    }
}

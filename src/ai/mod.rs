//! Scripted opponent for single-peer play
//!
//! Drives the remote player when no channel exists: dodge incoming
//! snowballs, track the opponent's column, charge and release throws on a
//! difficulty-dependent rhythm. The same controller doubles as the bot
//! driver behind the headless binary. Randomness comes from a seeded RNG
//! so runs are reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::game::projectile::ProjectileRecord;
use crate::game::{InputAction, InputFrame};
use crate::session::{PeerSession, RoundPhase};
use crate::util::time::tick_delta_ms;

/// Gesture power of a scripted throw (matches the default human throw)
pub const THROW_POWER: f32 = 20.0;
/// Incoming snowballs within this horizontal lane count as threats
const THREAT_LANE_HALF_WIDTH: f32 = 80.0;

/// Behavior constants per difficulty level
#[derive(Debug, Clone, Copy)]
pub struct AiProfile {
    /// Time between decisions (ms)
    pub reaction_ms: f32,
    /// Movement speed (px/s)
    pub move_speed: f32,
    /// Horizontal tolerance/noise when lining up a throw (px)
    pub aim_error: f32,
    /// Pause between throws, sampled from this range (ms)
    pub throw_cooldown_ms: (f32, f32),
    /// Incoming snowballs inside this radius trigger a dodge (px)
    pub dodge_distance: f32,
    /// Charge duration, sampled from this range (ms)
    pub charge_ms: (f32, f32),
}

impl AiProfile {
    pub fn for_level(level: u8) -> Self {
        match level {
            // Barely moves, terrible aim, forgets to shoot
            1 => Self {
                reaction_ms: 2000.0,
                move_speed: 50.0,
                aim_error: 300.0,
                throw_cooldown_ms: (4000.0, 6000.0),
                dodge_distance: 40.0,
                charge_ms: (1200.0, 1800.0),
            },
            2 => Self {
                reaction_ms: 1500.0,
                move_speed: 80.0,
                aim_error: 200.0,
                throw_cooldown_ms: (3000.0, 5000.0),
                dodge_distance: 80.0,
                charge_ms: (1000.0, 1600.0),
            },
            3 => Self {
                reaction_ms: 1000.0,
                move_speed: 100.0,
                aim_error: 150.0,
                throw_cooldown_ms: (2000.0, 3500.0),
                dodge_distance: 100.0,
                charge_ms: (900.0, 1400.0),
            },
            4 => Self {
                reaction_ms: 800.0,
                move_speed: 140.0,
                aim_error: 100.0,
                throw_cooldown_ms: (1500.0, 3000.0),
                dodge_distance: 180.0,
                charge_ms: (700.0, 1100.0),
            },
            // The standard opponent
            5 => Self {
                reaction_ms: 500.0,
                move_speed: 180.0,
                aim_error: 60.0,
                throw_cooldown_ms: (1000.0, 2000.0),
                dodge_distance: 250.0,
                charge_ms: (600.0, 1000.0),
            },
            6 => Self {
                reaction_ms: 400.0,
                move_speed: 220.0,
                aim_error: 40.0,
                throw_cooldown_ms: (800.0, 1800.0),
                dodge_distance: 300.0,
                charge_ms: (500.0, 900.0),
            },
            7 => Self {
                reaction_ms: 300.0,
                move_speed: 260.0,
                aim_error: 25.0,
                throw_cooldown_ms: (600.0, 1400.0),
                dodge_distance: 350.0,
                charge_ms: (400.0, 800.0),
            },
            8 => Self {
                reaction_ms: 200.0,
                move_speed: 300.0,
                aim_error: 15.0,
                throw_cooldown_ms: (500.0, 1000.0),
                dodge_distance: 450.0,
                charge_ms: (300.0, 700.0),
            },
            9 => Self {
                reaction_ms: 100.0,
                move_speed: 350.0,
                aim_error: 5.0,
                throw_cooldown_ms: (300.0, 700.0),
                dodge_distance: 600.0,
                charge_ms: (200.0, 500.0),
            },
            // Machine-like perfection
            10 => Self {
                reaction_ms: 50.0,
                move_speed: 450.0,
                aim_error: 0.0,
                throw_cooldown_ms: (100.0, 400.0),
                dodge_distance: 1000.0,
                charge_ms: (80.0, 250.0),
            },
            other => {
                warn!(level = other, "Unknown difficulty level, using 5");
                Self::for_level(5)
            }
        }
    }
}

/// A released throw: charge in [0, 1] and gesture power
#[derive(Debug, Clone, Copy)]
pub struct AiThrow {
    pub charge: f32,
    pub power: f32,
}

/// One tick's decision
#[derive(Debug, Clone, Copy)]
pub struct AiDecision {
    pub vx: f32,
    pub vy: f32,
    /// A charge is being held this tick
    pub charging: bool,
    pub throw: Option<AiThrow>,
}

#[derive(Debug, Clone, Copy)]
struct ChargePlan {
    started_ms: f32,
    duration_ms: f32,
}

/// The scripted opponent controller
pub struct AiController {
    profile: AiProfile,
    rng: ChaCha8Rng,
    clock_ms: f32,
    next_think_ms: f32,
    next_throw_ms: f32,
    move_dir: (f32, f32),
    aim_offset: f32,
    charge: Option<ChargePlan>,
}

impl AiController {
    pub fn new(level: u8, seed: u64) -> Self {
        let profile = AiProfile::for_level(level);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let first_throw = rng.gen_range(profile.throw_cooldown_ms.0..=profile.throw_cooldown_ms.1);
        Self {
            profile,
            rng,
            clock_ms: 0.0,
            next_think_ms: 0.0,
            next_throw_ms: first_throw,
            move_dir: (0.0, 0.0),
            aim_offset: 0.0,
            charge: None,
        }
    }

    /// One decision tick. `me` and `target` are positions; `incoming` is
    /// the set of projectiles that can hit this controller's player;
    /// `home_y` is the vertical center of the controller's half.
    pub fn update(
        &mut self,
        me: (f32, f32),
        target: (f32, f32),
        incoming: &[&ProjectileRecord],
        home_y: f32,
    ) -> AiDecision {
        self.clock_ms += tick_delta_ms();

        // A held charge releases once its planned duration elapses;
        // movement continues underneath it.
        if let Some(plan) = self.charge {
            if self.clock_ms - plan.started_ms >= plan.duration_ms {
                self.charge = None;
                self.next_throw_ms = self.clock_ms
                    + self
                        .rng
                        .gen_range(self.profile.throw_cooldown_ms.0..=self.profile.throw_cooldown_ms.1);
                let charge = (plan.duration_ms / 1000.0).min(1.0);
                return self.decision(Some(AiThrow {
                    charge,
                    power: THROW_POWER,
                }));
            }
            return self.decision(None);
        }

        if self.clock_ms >= self.next_think_ms {
            self.next_think_ms = self.clock_ms + self.profile.reaction_ms;
            self.think(me, target, incoming, home_y);
        }

        if self.clock_ms >= self.next_throw_ms {
            let duration = self
                .rng
                .gen_range(self.profile.charge_ms.0..=self.profile.charge_ms.1);
            self.charge = Some(ChargePlan {
                started_ms: self.clock_ms,
                duration_ms: duration,
            });
        }

        self.decision(None)
    }

    /// Pick a movement direction: dodge the nearest threat, otherwise
    /// shadow the opponent's column with some human-looking drift.
    fn think(
        &mut self,
        me: (f32, f32),
        target: (f32, f32),
        incoming: &[&ProjectileRecord],
        home_y: f32,
    ) {
        if let Some((tx, ty)) = self.nearest_threat(me, incoming) {
            self.move_dir.0 = if tx < me.0 { 1.0 } else { -1.0 };
            self.move_dir.1 = if (ty - me.1).abs() < 100.0 {
                if ty < me.1 {
                    1.0
                } else {
                    -1.0
                }
            } else {
                0.0
            };
            return;
        }

        if self.profile.aim_error > 0.0 {
            self.aim_offset = self
                .rng
                .gen_range(-self.profile.aim_error..=self.profile.aim_error);
        } else {
            self.aim_offset = 0.0;
        }
        let ideal_x = target.0 + self.aim_offset;

        self.move_dir.0 = if me.0 < ideal_x - 30.0 {
            1.0
        } else if me.0 > ideal_x + 30.0 {
            -1.0
        } else {
            0.0
        };

        // Hold near the middle of the home half, with occasional drift
        self.move_dir.1 = if me.1 < home_y - 20.0 {
            if self.rng.gen_bool(0.3) {
                1.0
            } else {
                0.0
            }
        } else if me.1 > home_y + 20.0 {
            if self.rng.gen_bool(0.3) {
                -1.0
            } else {
                0.0
            }
        } else if self.rng.gen_bool(0.15) {
            if self.rng.gen_bool(0.5) {
                1.0
            } else {
                -1.0
            }
        } else {
            0.0
        };

        // Random strafe when otherwise idle
        if self.move_dir.0 == 0.0 && self.rng.gen_bool(0.2) {
            self.move_dir.0 = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        }
    }

    /// The closest incoming snowball that is heading at us, inside the
    /// dodge radius and our horizontal lane
    fn nearest_threat(
        &self,
        me: (f32, f32),
        incoming: &[&ProjectileRecord],
    ) -> Option<(f32, f32)> {
        let mut closest: Option<(f32, f32)> = None;
        let mut closest_dist = f32::INFINITY;

        for ball in incoming {
            let approaching = (me.1 - ball.y).signum() == ball.vel_y.signum();
            let dx = (ball.x - me.0).abs();
            let dy = ball.y - me.1;
            let dist = (dx * dx + dy * dy).sqrt();
            if approaching && dist < self.profile.dodge_distance && dx < THREAT_LANE_HALF_WIDTH {
                if dist < closest_dist {
                    closest_dist = dist;
                    closest = Some((ball.x, ball.y));
                }
            }
        }

        closest
    }

    fn decision(&self, throw: Option<AiThrow>) -> AiDecision {
        AiDecision {
            vx: self.move_dir.0 * self.profile.move_speed,
            vy: self.move_dir.1 * self.profile.move_speed,
            charging: self.charge.is_some(),
            throw,
        }
    }
}

/// Headless driver for the binary: the same controller logic, mapped onto
/// the input-frame interface the gesture pipeline normally fills. Plays up
/// to `max_rounds` rounds, requesting rematches in between, then leaves to
/// the menu.
pub struct BotDriver {
    controller: AiController,
    max_rounds: u32,
    rounds_seen: u32,
    in_round_end: bool,
}

impl BotDriver {
    pub fn new(level: u8, seed: u64, max_rounds: u32) -> Self {
        Self {
            controller: AiController::new(level, seed),
            max_rounds: max_rounds.max(1),
            rounds_seen: 0,
            in_round_end: false,
        }
    }

    /// Produce this tick's input from the session's observable state
    pub fn frame(&mut self, session: &PeerSession) -> InputFrame {
        match session.phase() {
            RoundPhase::Lobby | RoundPhase::ReadyNegotiation | RoundPhase::Countdown => {
                self.in_round_end = false;
                InputFrame {
                    is_ready: true,
                    ..Default::default()
                }
            }
            RoundPhase::Active => {
                self.in_round_end = false;
                let local = session.local_player();
                let remote = session.remote_player();
                let incoming: Vec<&ProjectileRecord> = session
                    .projectiles()
                    .iter()
                    .filter(|ball| ball.owner != session.role())
                    .collect();
                let bounds = session.arena().bounds_for(session.role());
                let home_y = (bounds.min_y + bounds.max_y) / 2.0;

                let decision = self.controller.update(
                    (local.x, local.y),
                    (remote.x, remote.y),
                    &incoming,
                    home_y,
                );

                let action = if let Some(throw) = decision.throw {
                    Some(InputAction::Throw { power: throw.power })
                } else if decision.charging {
                    Some(InputAction::Charge { power: THROW_POWER })
                } else {
                    None
                };

                InputFrame {
                    move_x: axis(decision.vx),
                    move_y: axis(decision.vy),
                    is_ready: true,
                    action,
                }
            }
            RoundPhase::RoundEnd | RoundPhase::RematchNegotiation => {
                if !self.in_round_end {
                    self.in_round_end = true;
                    self.rounds_seen += 1;
                }
                let action = if self.rounds_seen < self.max_rounds {
                    InputAction::RequestRematch
                } else {
                    InputAction::ReturnToMenu
                };
                InputFrame {
                    action: Some(action),
                    ..Default::default()
                }
            }
        }
    }
}

/// Collapse a velocity into a -1/0/1 input axis
fn axis(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_standard() {
        let fallback = AiProfile::for_level(42);
        let standard = AiProfile::for_level(5);
        assert_eq!(fallback.reaction_ms, standard.reaction_ms);
        assert_eq!(fallback.move_speed, standard.move_speed);
    }

    #[test]
    fn controller_is_deterministic_for_a_seed() {
        let mut a = AiController::new(7, 99);
        let mut b = AiController::new(7, 99);
        for _ in 0..300 {
            let da = a.update((400.0, 120.0), (400.0, 480.0), &[], 120.0);
            let db = b.update((400.0, 120.0), (400.0, 480.0), &[], 120.0);
            assert_eq!(da.vx, db.vx);
            assert_eq!(da.vy, db.vy);
            assert_eq!(da.throw.is_some(), db.throw.is_some());
        }
    }

    #[test]
    fn controller_eventually_throws() {
        let mut ai = AiController::new(10, 1);
        let mut threw = false;
        for _ in 0..600 {
            let decision = ai.update((400.0, 120.0), (400.0, 480.0), &[], 120.0);
            if decision.throw.is_some() {
                threw = true;
                break;
            }
        }
        assert!(threw, "level 10 should throw within 20 seconds");
    }
}

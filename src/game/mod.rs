//! Local game simulation shared by both peers

pub mod arena;
pub mod player;
pub mod projectile;

pub use player::PlayerState;
pub use projectile::ProjectileRecord;

/// One tick of local input, produced by the input pipeline collaborator
/// (gesture tracker, keyboard, or the scripted bot driver)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// Horizontal movement axis, -1..=1
    pub move_x: f32,
    /// Vertical movement axis, -1..=1
    pub move_y: f32,
    /// Readiness signal, consulted during ready negotiation
    pub is_ready: bool,
    pub action: Option<InputAction>,
}

/// Discrete player actions beyond movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Bank gesture power into the charge meter
    Charge { power: f32 },
    /// Release a snowball with the given gesture power
    Throw { power: f32 },
    /// Ask the opponent for another round (round end only)
    RequestRematch,
    /// Leave to the menu
    ReturnToMenu,
}

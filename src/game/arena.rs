//! Play area layout and per-role movement bounds
//!
//! Both peers share one orientation: the Primary half is the bottom of the
//! arena, the Secondary half the top, split by the center wall.

use crate::session::PeerRole;

/// Movement bounds for one player
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.clamp(self.min_x, self.max_x),
            y.clamp(self.min_y, self.max_y),
        )
    }
}

/// The play area: outer walls plus a center wall dividing the halves
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub wall: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            wall: 16.0,
        }
    }
}

impl Arena {
    /// Movement bounds for a role: each peer is confined to its own half
    pub fn bounds_for(&self, role: PeerRole) -> Bounds {
        let pad = self.wall + 20.0;
        let mid = self.height / 2.0;
        match role {
            PeerRole::Primary => Bounds {
                min_x: pad,
                max_x: self.width - pad,
                min_y: mid + pad,
                max_y: self.height - pad,
            },
            PeerRole::Secondary => Bounds {
                min_x: pad,
                max_x: self.width - pad,
                min_y: pad,
                max_y: mid - pad,
            },
        }
    }

    /// Spawn point for a role
    pub fn spawn_point(&self, role: PeerRole) -> (f32, f32) {
        match role {
            PeerRole::Primary => (self.width / 2.0, self.height * 0.8),
            PeerRole::Secondary => (self.width / 2.0, self.height * 0.2),
        }
    }

    /// Whether a point is still inside the outer walls. Projectiles are
    /// destroyed the moment this turns false.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x <= self.width && y >= 0.0 && y <= self.height
    }
}

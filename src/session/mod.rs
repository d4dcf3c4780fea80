//! Match session lifecycle and peer synchronization

pub mod peer;
pub mod ready;
pub mod replication;
pub mod round;

pub use peer::PeerSession;
pub use round::{EndReason, RoundOutcome, RoundPhase};

/// Fixed role of a peer for the lifetime of one session. The hosting side
/// is Primary and plays the bottom half; the joining side is Secondary and
/// plays the top half. Both peers render the same orientation, so the
/// mapping is never renegotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Primary,
    Secondary,
}

impl PeerRole {
    pub fn other(self) -> PeerRole {
        match self {
            PeerRole::Primary => PeerRole::Secondary,
            PeerRole::Secondary => PeerRole::Primary,
        }
    }

    /// Vertical direction of this role's own throws: the bottom player
    /// throws up the screen, the top player down.
    pub fn throw_direction(self) -> f32 {
        match self {
            PeerRole::Primary => -1.0,
            PeerRole::Secondary => 1.0,
        }
    }
}

//! Peer protocol message definitions
//! These are the wire types exchanged between the two peers

use serde::{Deserialize, Serialize};

/// Facing direction of a player, driven by its current velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
    /// Standing still
    Idle,
}

impl Default for Facing {
    fn default() -> Self {
        Self::Idle
    }
}

/// Messages exchanged between peers. Both directions use the same set;
/// a message the current phase cannot interpret is dropped, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMsg {
    /// Local readiness signal, sent on value change only
    ReadyStatus {
        is_ready: bool,
    },

    /// Periodic replication of the sender's own player state (10/s while
    /// the round is active)
    Move {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        facing_direction: Facing,
    },

    /// A projectile left the sender; the receiver replays it with the
    /// vertical direction inverted into its own half
    Throw {
        x: f32,
        y: f32,
        /// Charge-derived size factor, 1.0..=5.0
        size_multiplier: f32,
        /// Reported launch speed, always positive
        launch_velocity: f32,
    },

    /// The sender's own health reached zero. Authoritative: round loss for
    /// the sender, win for the receiver
    Dead,

    /// Sender wants to play another round
    RematchRequest,

    /// Both sides agreed; restart into countdown
    RematchAccept,

    /// Sender left for the menu; the receiver's round is over
    ReturnToMenu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_wire_format() {
        let json = serde_json::to_string(&PeerMsg::ReadyStatus { is_ready: true }).unwrap();
        assert_eq!(json, r#"{"type":"ready_status","is_ready":true}"#);

        let json = serde_json::to_string(&PeerMsg::Dead).unwrap();
        assert_eq!(json, r#"{"type":"dead"}"#);
    }

    #[test]
    fn move_round_trips_facing() {
        let msg = PeerMsg::Move {
            x: 400.0,
            y: 480.0,
            vx: -200.0,
            vy: 0.0,
            facing_direction: Facing::Left,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"move""#));
        assert!(json.contains(r#""facing_direction":"left""#));
        assert_eq!(serde_json::from_str::<PeerMsg>(&json).unwrap(), msg);
    }

    #[test]
    fn unknown_tag_is_a_parse_error() {
        // The transport drops unparseable frames instead of guessing.
        let result = serde_json::from_str::<PeerMsg>(r#"{"type":"teleport","x":1}"#);
        assert!(result.is_err());
    }
}

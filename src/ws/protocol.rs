//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::fighter::Slot;
use crate::game::input::InputSnapshot;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Current button state. The client's `timestamp` field is advisory
    /// and dropped along with any other unknown field.
    Input(InputSnapshot),

    /// Any other `type`; ignored
    #[serde(other)]
    Unknown,
}

impl ClientMsg {
    /// Parse a text frame. `None` means the frame is not a JSON object
    /// with a string `type` and should be dropped.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Slot assignment, sent once right after the connection is accepted
    Init {
        #[serde(rename = "playerId")]
        player_id: Slot,
    },

    /// Connected player count, broadcast on every connect/disconnect
    Status {
        #[serde(rename = "playerCount")]
        player_count: usize,
    },

    /// Per-tick simulation snapshot
    State { state: StateSnapshot },

    /// Both slots are taken; the connection is closed right after
    Full,
}

/// All occupied slots in slot order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub boxes: Vec<ActorSnapshot>,
}

/// Fighter state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub is_jumping: bool,
    pub is_jumping_diagonal: bool,
    pub is_punching: bool,
    pub is_kicking: bool,
    pub is_backflipping: bool,
    /// Crouch held
    pub down: bool,
    pub facing_right: bool,
}

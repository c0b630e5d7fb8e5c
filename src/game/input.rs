//! Input normalization - turns untrusted client input into a fixed-shape snapshot

use serde::{Deserialize, Deserializer, Serialize};

use super::fighter::ActorState;
use super::gesture::{self, Gesture};

/// How long a punch or kick animation stays active (ms)
pub const ATTACK_DURATION_MS: f32 = 250.0;

/// The six recognized buttons. Anything else a client sends is dropped.
///
/// Deserialization never fails on field shape: a missing field or a value
/// that is not a JSON boolean reads as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub left: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub right: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub up: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub down: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub punch: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub kick: bool,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

/// Apply a freshly received snapshot to an actor.
///
/// Runs at message-arrival time: attack press edges arm the one-shot
/// markers the resolver consumes on the next tick, crouch cancels an
/// active punch, facing follows a lone left/right, then the gesture
/// detector sees the new edges.
pub fn apply_input(actor: &mut ActorState, input: InputSnapshot, now_ms: u64) -> Option<Gesture> {
    let previous = actor.input;

    if input.punch && !previous.punch {
        actor.just_punched = true;
        actor.punching = true;
        actor.punch_timer = ATTACK_DURATION_MS;
    }
    if input.kick && !previous.kick {
        actor.just_kicked = true;
        actor.kicking = true;
        actor.kick_timer = ATTACK_DURATION_MS;
    }

    // Crouch interrupts attacks, attacks never interrupt crouch
    if input.down && actor.punching {
        actor.punching = false;
        actor.punch_timer = 0.0;
    }

    if input.left && !input.right {
        actor.facing_right = false;
    } else if input.right && !input.left {
        actor.facing_right = true;
    }

    actor.input = input;
    gesture::detect(actor, now_ms)
}

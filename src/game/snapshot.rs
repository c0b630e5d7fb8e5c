//! Snapshot building for network transmission

use crate::ws::protocol::{ActorSnapshot, ServerMsg, StateSnapshot};

use super::fighter::ActorState;

/// Builds per-tick state messages
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn actor(actor: &ActorState) -> ActorSnapshot {
        ActorSnapshot {
            x: actor.x,
            y: actor.y,
            health: actor.health,
            is_jumping: actor.airborne,
            is_jumping_diagonal: actor.jump_diagonal,
            is_punching: actor.punching,
            is_kicking: actor.kicking,
            is_backflipping: actor.backflipping,
            down: actor.input.down,
            facing_right: actor.facing_right,
        }
    }

    /// Snapshot of every occupied slot, in slot order
    pub fn build<'a>(actors: impl IntoIterator<Item = &'a ActorState>) -> ServerMsg {
        let boxes = actors.into_iter().map(Self::actor).collect();
        ServerMsg::State {
            state: StateSnapshot { boxes },
        }
    }
}

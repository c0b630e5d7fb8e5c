//! Per-player authoritative state

use serde::{Deserialize, Serialize};

use super::gesture::GestureBuffer;
use super::input::InputSnapshot;
use super::physics::FLOOR_Y;

/// Maximum (and starting) health
pub const MAX_HEALTH: f32 = 500.0;

/// Spawn x for stage-left (slot 0) and stage-right (slot 1)
pub const SPAWN_X: [f32; 2] = [100.0, 500.0];

/// One of the two player positions in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Slot {
    Zero,
    One,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Zero, Slot::One];

    pub fn index(self) -> usize {
        match self {
            Slot::Zero => 0,
            Slot::One => 1,
        }
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> u8 {
        slot.index() as u8
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Slot::Zero),
            1 => Ok(Slot::One),
            other => Err(format!("invalid slot {other}")),
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Previous held state of the four directions, used to derive press edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeMemory {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Actor state in a session (authoritative)
#[derive(Debug, Clone)]
pub struct ActorState {
    pub slot: Slot,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub dash_velocity: f32,
    pub facing_right: bool,

    // Grounded flags
    pub airborne: bool,
    pub jump_diagonal: bool,
    pub just_landed: bool,

    // Action flags; each is true iff its timer (ms) is positive
    pub punching: bool,
    pub punch_timer: f32,
    pub kicking: bool,
    pub kick_timer: f32,
    pub backflipping: bool,
    pub backflip_timer: f32,

    pub health: f32,

    // Input tracking
    pub input: InputSnapshot,
    pub just_punched: bool,
    pub just_kicked: bool,
    pub edges: EdgeMemory,
    pub lateral: GestureBuffer,
    pub vertical: GestureBuffer,
    pub last_gesture_ms: Option<u64>,
}

impl ActorState {
    /// Fresh actor at the slot's starting mark, facing center
    pub fn spawn(slot: Slot) -> Self {
        Self {
            slot,
            x: SPAWN_X[slot.index()],
            y: FLOOR_Y,
            vx: 0.0,
            vy: 0.0,
            dash_velocity: 0.0,
            facing_right: slot == Slot::Zero,
            airborne: false,
            jump_diagonal: false,
            just_landed: false,
            punching: false,
            punch_timer: 0.0,
            kicking: false,
            kick_timer: 0.0,
            backflipping: false,
            backflip_timer: 0.0,
            health: MAX_HEALTH,
            input: InputSnapshot::default(),
            just_punched: false,
            just_kicked: false,
            edges: EdgeMemory::default(),
            lateral: GestureBuffer::default(),
            vertical: GestureBuffer::default(),
            last_gesture_ms: None,
        }
    }

    /// Holding down
    pub fn crouching(&self) -> bool {
        self.input.down
    }

    /// Whether the shared special-move cooldown has elapsed at `now_ms`
    pub fn gesture_ready(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_gesture_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= cooldown_ms)
    }
}

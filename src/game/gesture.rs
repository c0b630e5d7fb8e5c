//! Gesture detection - double-tap dashes and the down-up backflip
//!
//! Runs once per received input update. Only press edges feed the
//! buffers, so a held key never re-fires a combo. Dash and backflip share
//! one cooldown so neither can be chained straight into the other.

use std::collections::VecDeque;

use super::fighter::ActorState;
use super::physics::GRAVITY;
use crate::util::time::FRAME_MS;

/// Max span between the two taps of a dash, also the lateral staleness window (ms)
pub const LATERAL_WINDOW_MS: u64 = 500;
/// Vertical buffer is dropped once its first entry is this old (ms)
pub const VERTICAL_STALE_MS: u64 = 400;
/// Max span between down and up for a backflip (ms)
pub const BACKFLIP_WINDOW_MS: u64 = 300;
/// Shared cooldown across every special move (ms)
pub const GESTURE_COOLDOWN_MS: u64 = 1000;

/// Initial dash impulse, units per frame
pub const DASH_SPEED: f32 = 25.0;

/// Upward launch velocity of a backflip, units per frame
pub const BACKFLIP_LAUNCH_VY: f32 = -28.0;
/// Horizontal distance a backflip covers before touching down
pub const BACKFLIP_DISTANCE: f32 = 100.0;
/// Backflip animation never runs shorter than this (ms)
pub const BACKFLIP_MIN_MS: f32 = 550.0;

const BUFFER_CAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKey {
    /// Lateral press matching current facing
    Toward,
    /// Lateral press against current facing
    Away,
    Down,
    Up,
}

/// Timestamped queue of recent edge presses, holding at most two entries
#[derive(Debug, Clone, Default)]
pub struct GestureBuffer {
    entries: VecDeque<(GestureKey, u64)>,
}

impl GestureBuffer {
    pub fn push(&mut self, key: GestureKey, at_ms: u64) {
        self.entries.push_back((key, at_ms));
        if self.entries.len() > BUFFER_CAP {
            self.entries.pop_front();
        }
    }

    /// Push, discarding the buffer first if it holds a different key
    pub fn push_run(&mut self, key: GestureKey, at_ms: u64) {
        if self.entries.back().is_some_and(|(last, _)| *last != key) {
            self.clear();
        }
        self.push(key, at_ms);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_exactly(&self, keys: &[GestureKey]) -> bool {
        self.entries.len() == keys.len()
            && self.entries.iter().zip(keys).all(|((k, _), want)| k == want)
    }

    /// Milliseconds between first and last entry
    pub fn span_ms(&self) -> Option<u64> {
        let (_, first) = self.entries.front()?;
        let (_, last) = self.entries.back()?;
        Some(last.saturating_sub(*first))
    }

    /// Clear if the first entry is older than `window_ms` at `now_ms`
    pub fn purge_stale(&mut self, now_ms: u64, window_ms: u64) {
        let stale = self
            .entries
            .front()
            .is_some_and(|(_, first)| now_ms.saturating_sub(*first) > window_ms);
        if stale {
            self.clear();
        }
    }
}

/// A special move that fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Dash { forward: bool },
    Backflip,
}

#[derive(Debug, Clone, Copy, Default)]
struct Presses {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

fn take_presses(actor: &mut ActorState) -> Presses {
    let held = actor.input;
    let prev = actor.edges;
    let presses = Presses {
        left: held.left && !prev.left,
        right: held.right && !prev.right,
        up: held.up && !prev.up,
        down: held.down && !prev.down,
    };
    actor.edges.left = held.left;
    actor.edges.right = held.right;
    actor.edges.up = held.up;
    actor.edges.down = held.down;
    presses
}

/// Feed the actor's current input through both gesture buffers.
pub fn detect(actor: &mut ActorState, now_ms: u64) -> Option<Gesture> {
    actor.lateral.purge_stale(now_ms, LATERAL_WINDOW_MS);
    actor.vertical.purge_stale(now_ms, VERTICAL_STALE_MS);

    let presses = take_presses(actor);

    let backflip = detect_vertical(actor, presses, now_ms);
    let dash = detect_lateral(actor, presses, now_ms);
    backflip.or(dash)
}

fn detect_vertical(actor: &mut ActorState, presses: Presses, now_ms: u64) -> Option<Gesture> {
    use GestureKey::{Down, Up};

    if presses.down {
        actor.vertical.push(Down, now_ms);
    } else if presses.up && actor.vertical.is_exactly(&[Down]) {
        // A bare up-press is an ordinary jump and never enters the buffer
        actor.vertical.push(Up, now_ms);
    }

    if !actor.vertical.is_exactly(&[Down, Up]) {
        return None;
    }
    let in_window = actor
        .vertical
        .span_ms()
        .is_some_and(|span| span < BACKFLIP_WINDOW_MS);
    actor.vertical.clear();

    if in_window && !actor.airborne && actor.gesture_ready(now_ms, GESTURE_COOLDOWN_MS) {
        launch_backflip(actor);
        actor.last_gesture_ms = Some(now_ms);
        return Some(Gesture::Backflip);
    }
    None
}

fn detect_lateral(actor: &mut ActorState, presses: Presses, now_ms: u64) -> Option<Gesture> {
    use GestureKey::{Away, Toward};

    let (toward, away) = if actor.facing_right {
        (presses.right, presses.left)
    } else {
        (presses.left, presses.right)
    };

    if toward {
        actor.lateral.push_run(Toward, now_ms);
    } else if away {
        actor.lateral.push_run(Away, now_ms);
    }

    let forward = if actor.lateral.is_exactly(&[Toward, Toward]) {
        true
    } else if actor.lateral.is_exactly(&[Away, Away]) {
        false
    } else {
        return None;
    };
    let in_window = actor
        .lateral
        .span_ms()
        .is_some_and(|span| span < LATERAL_WINDOW_MS);
    actor.lateral.clear();

    if in_window && actor.gesture_ready(now_ms, GESTURE_COOLDOWN_MS) {
        let facing = if actor.facing_right { 1.0 } else { -1.0 };
        let direction = if forward { facing } else { -facing };
        actor.dash_velocity = DASH_SPEED * direction;
        actor.last_gesture_ms = Some(now_ms);
        return Some(Gesture::Dash { forward });
    }
    None
}

/// Launch an arc that lands `BACKFLIP_DISTANCE` behind the actor exactly
/// when the vertical motion returns to the floor.
fn launch_backflip(actor: &mut ActorState) {
    // y(t) = vy*t + g*t^2/2 returns to zero at t = -2*vy/g frames
    let flight_frames = -2.0 * BACKFLIP_LAUNCH_VY / GRAVITY;
    let behind = if actor.facing_right {
        -BACKFLIP_DISTANCE
    } else {
        BACKFLIP_DISTANCE
    };

    actor.airborne = true;
    actor.jump_diagonal = false;
    actor.backflipping = true;
    actor.vy = BACKFLIP_LAUNCH_VY;
    actor.vx = behind / flight_frames;
    actor.backflip_timer = (flight_frames * FRAME_MS).max(BACKFLIP_MIN_MS);
    // Landing must not come down into a crouch; up stays so a jump can register
    actor.input.down = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fighter::Slot;
    use crate::game::input::{apply_input, InputSnapshot};

    const IDLE: InputSnapshot = InputSnapshot {
        left: false,
        right: false,
        up: false,
        down: false,
        punch: false,
        kick: false,
    };
    const RIGHT: InputSnapshot = InputSnapshot { right: true, ..IDLE };
    const LEFT_RIGHT: InputSnapshot = InputSnapshot {
        left: true,
        right: true,
        ..IDLE
    };
    const DOWN: InputSnapshot = InputSnapshot { down: true, ..IDLE };
    const UP: InputSnapshot = InputSnapshot { up: true, ..IDLE };

    fn fighter() -> ActorState {
        ActorState::spawn(Slot::Zero)
    }

    fn tap_right(actor: &mut ActorState, at: u64) {
        apply_input(actor, RIGHT, at);
        apply_input(actor, IDLE, at + 30);
    }

    #[test]
    fn double_tap_toward_dashes_forward() {
        let mut a = fighter();
        tap_right(&mut a, 0);
        apply_input(&mut a, RIGHT, 200);
        assert_eq!(a.dash_velocity, DASH_SPEED);
        assert_eq!(a.last_gesture_ms, Some(200));
        assert!(a.lateral.is_empty());
    }

    #[test]
    fn dash_follows_facing_left() {
        let mut a = ActorState::spawn(Slot::One);
        let left = InputSnapshot { left: true, ..IDLE };
        apply_input(&mut a, left, 0);
        apply_input(&mut a, IDLE, 40);
        apply_input(&mut a, left, 80);
        assert_eq!(a.dash_velocity, -DASH_SPEED);
    }

    #[test]
    fn slow_double_tap_does_nothing() {
        let mut a = fighter();
        tap_right(&mut a, 0);
        apply_input(&mut a, RIGHT, 600);
        assert_eq!(a.dash_velocity, 0.0);
        assert_eq!(a.lateral.len(), 1, "stale tap purged, fresh tap kept");
    }

    #[test]
    fn held_direction_never_refires() {
        let mut a = fighter();
        for t in (0..400).step_by(16) {
            apply_input(&mut a, RIGHT, t);
        }
        assert_eq!(a.dash_velocity, 0.0);
        assert_eq!(a.lateral.len(), 1);
    }

    #[test]
    fn away_press_cancels_toward_sequence() {
        let mut a = fighter();
        apply_input(&mut a, RIGHT, 0);
        // left while right stays held: facing unchanged, left is "away"
        apply_input(&mut a, LEFT_RIGHT, 50);
        apply_input(&mut a, RIGHT, 100);
        apply_input(&mut a, IDLE, 150);
        apply_input(&mut a, RIGHT, 200);
        assert_eq!(a.dash_velocity, 0.0);
        assert!(a.lateral.is_exactly(&[GestureKey::Toward]));
    }

    #[test]
    fn double_tap_away_dashes_backward() {
        let mut a = fighter();
        apply_input(&mut a, RIGHT, 0);
        apply_input(&mut a, LEFT_RIGHT, 50);
        apply_input(&mut a, RIGHT, 100);
        apply_input(&mut a, LEFT_RIGHT, 150);
        assert!(a.facing_right);
        assert_eq!(a.dash_velocity, -DASH_SPEED);
    }

    #[test]
    fn cooldown_blocks_second_dash() {
        let mut a = fighter();
        tap_right(&mut a, 0);
        apply_input(&mut a, RIGHT, 100);
        assert_eq!(a.dash_velocity, DASH_SPEED);
        a.dash_velocity = 0.0;

        apply_input(&mut a, IDLE, 150);
        tap_right(&mut a, 300);
        apply_input(&mut a, RIGHT, 400);
        assert_eq!(a.dash_velocity, 0.0, "within 1000ms of the first dash");

        apply_input(&mut a, IDLE, 450);
        tap_right(&mut a, 1100);
        apply_input(&mut a, RIGHT, 1200);
        assert_eq!(a.dash_velocity, DASH_SPEED);
    }

    #[test]
    fn down_then_up_backflips() {
        let mut a = fighter();
        apply_input(&mut a, DOWN, 0);
        apply_input(&mut a, IDLE, 50);
        apply_input(&mut a, UP, 120);

        assert!(a.backflipping);
        assert!(a.airborne);
        assert_eq!(a.vy, BACKFLIP_LAUNCH_VY);
        assert!(a.vx < 0.0, "facing right flips backwards to the left");
        assert_eq!(a.backflip_timer, BACKFLIP_MIN_MS);
        assert!(a.input.up, "up is left intact");
        assert!(!a.input.down);
        assert_eq!(a.last_gesture_ms, Some(120));
    }

    #[test]
    fn backflip_arc_lands_the_fixed_distance_behind() {
        let mut a = ActorState::spawn(Slot::One);
        apply_input(&mut a, DOWN, 0);
        apply_input(&mut a, UP, 100);
        let flight_frames = -2.0 * BACKFLIP_LAUNCH_VY / GRAVITY;
        assert!((a.vx * flight_frames - BACKFLIP_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn down_up_too_slow_is_not_a_backflip() {
        let mut a = fighter();
        apply_input(&mut a, DOWN, 0);
        apply_input(&mut a, IDLE, 100);
        apply_input(&mut a, UP, 350);
        assert!(!a.backflipping);
        assert!(a.vertical.is_empty());
    }

    #[test]
    fn bare_up_is_a_normal_jump_press() {
        let mut a = fighter();
        apply_input(&mut a, UP, 0);
        assert!(a.vertical.is_empty());
        assert!(!a.backflipping);
    }

    #[test]
    fn up_after_two_downs_is_ignored() {
        let mut a = fighter();
        apply_input(&mut a, DOWN, 0);
        apply_input(&mut a, IDLE, 20);
        apply_input(&mut a, DOWN, 40);
        apply_input(&mut a, IDLE, 60);
        apply_input(&mut a, UP, 80);
        assert!(!a.backflipping);
        assert!(a.vertical.is_exactly(&[GestureKey::Down, GestureKey::Down]));
    }

    #[test]
    fn no_backflip_while_airborne() {
        let mut a = fighter();
        a.airborne = true;
        apply_input(&mut a, DOWN, 0);
        apply_input(&mut a, UP, 100);
        assert!(!a.backflipping);
        assert_eq!(a.last_gesture_ms, None);
    }

    #[test]
    fn dash_then_backflip_shares_cooldown() {
        let mut a = fighter();
        tap_right(&mut a, 0);
        apply_input(&mut a, RIGHT, 100);
        assert!(a.dash_velocity > 0.0);

        apply_input(&mut a, DOWN, 300);
        apply_input(&mut a, UP, 400);
        assert!(!a.backflipping);
    }

    #[test]
    fn stale_vertical_buffer_is_purged() {
        let mut buffer = GestureBuffer::default();
        buffer.push(GestureKey::Down, 100);
        buffer.purge_stale(500, VERTICAL_STALE_MS);
        assert_eq!(buffer.len(), 1);
        buffer.purge_stale(501, VERTICAL_STALE_MS);
        assert!(buffer.is_empty());
    }

    #[test]
    fn buffer_evicts_oldest() {
        let mut buffer = GestureBuffer::default();
        buffer.push(GestureKey::Down, 1);
        buffer.push(GestureKey::Down, 2);
        buffer.push(GestureKey::Up, 3);
        assert!(buffer.is_exactly(&[GestureKey::Down, GestureKey::Up]));
        assert_eq!(buffer.span_ms(), Some(1));
    }
}

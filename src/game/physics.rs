//! Fighter physics - timers, dash, walking, jumps and world bounds

use crate::util::time::FRAME_MS;

use super::fighter::ActorState;

/// Resting y of a grounded fighter (screen space, larger is lower)
pub const FLOOR_Y: f32 = 355.0;
/// Stage bounds on x
pub const WORLD_MIN_X: f32 = 0.0;
pub const WORLD_MAX_X: f32 = 750.0;

/// Walk speed, units per frame
pub const MOVE_SPEED: f32 = 5.0;
/// Jump launch speed, units per frame
pub const JUMP_SPEED: f32 = 20.0;
/// Downward acceleration, units per frame per frame
pub const GRAVITY: f32 = 2.4;

/// Closest two grounded fighters may walk into each other
pub const MIN_SEPARATION: f32 = 30.0;
/// A dash stops dead once within this distance of the opponent
pub const DASH_STOP_DISTANCE: f32 = 40.0;
/// Per-tick multiplicative dash decay
pub const DASH_DECAY: f32 = 0.85;
/// Dash speed below this snaps to zero
pub const DASH_MIN_SPEED: f32 = 0.5;

/// What one fighter needs to know about the other, captured at the start
/// of the tick so both integrate against the same picture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpponentView {
    pub x: f32,
    pub airborne: bool,
}

impl OpponentView {
    pub fn of(actor: &ActorState) -> Self {
        Self {
            x: actor.x,
            airborne: actor.airborne,
        }
    }
}

/// Physics system for advancing a fighter by one tick
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance `actor` by `dt_ms` of simulated time
    pub fn integrate(actor: &mut ActorState, opponent: Option<OpponentView>, dt_ms: f32) {
        let dt_ms = dt_ms.max(0.0);
        let scale = dt_ms / FRAME_MS;

        Self::tick_timers(actor, dt_ms);
        Self::apply_dash(actor, opponent, scale);
        Self::walk(actor, opponent, scale);
        Self::try_jump(actor);
        Self::apply_vertical(actor, scale);

        actor.x = actor.x.clamp(WORLD_MIN_X, WORLD_MAX_X);
    }

    fn tick_timers(actor: &mut ActorState, dt_ms: f32) {
        if actor.punch_timer > 0.0 {
            actor.punch_timer -= dt_ms;
            if actor.punch_timer <= 0.0 {
                actor.punching = false;
                actor.punch_timer = 0.0;
            }
        }
        if actor.kick_timer > 0.0 {
            actor.kick_timer -= dt_ms;
            if actor.kick_timer <= 0.0 {
                actor.kicking = false;
                actor.kick_timer = 0.0;
            }
        }
        if actor.backflip_timer > 0.0 {
            actor.backflip_timer -= dt_ms;
            if actor.backflip_timer <= 0.0 {
                actor.backflipping = false;
                actor.backflip_timer = 0.0;
                actor.airborne = false;
            }
        }
    }

    fn apply_dash(actor: &mut ActorState, opponent: Option<OpponentView>, scale: f32) {
        if actor.dash_velocity == 0.0 {
            return;
        }

        actor.x += actor.dash_velocity * scale;
        actor.dash_velocity *= DASH_DECAY;
        if actor.dash_velocity.abs() < DASH_MIN_SPEED {
            actor.dash_velocity = 0.0;
        }

        if let Some(other) = opponent {
            if (actor.x - other.x).abs() < DASH_STOP_DISTANCE {
                actor.dash_velocity = 0.0;
            }
        }
    }

    fn walk(actor: &mut ActorState, opponent: Option<OpponentView>, scale: f32) {
        let mut next_x = actor.x;
        if actor.input.left {
            next_x -= MOVE_SPEED * scale;
        }
        if actor.input.right {
            next_x += MOVE_SPEED * scale;
        }

        // Only grounded fighters block each other; jumping over is allowed.
        // The tick right after landing is exempt so nobody gets shoved.
        if let Some(other) = opponent {
            if !actor.airborne && !other.airborne && !actor.just_landed {
                next_x = Self::separate(actor.x, next_x, other.x);
            }
        }

        actor.x = next_x;
        actor.just_landed = false;
    }

    /// Clamp a tentative x so it stays `MIN_SEPARATION` from the opponent's
    /// current x on whichever side the fighter stands.
    pub fn separate(current_x: f32, next_x: f32, other_x: f32) -> f32 {
        if other_x > current_x && next_x + MIN_SEPARATION > other_x {
            other_x - MIN_SEPARATION
        } else if other_x < current_x && next_x - MIN_SEPARATION < other_x {
            other_x + MIN_SEPARATION
        } else {
            next_x
        }
    }

    fn try_jump(actor: &mut ActorState) {
        let input = actor.input;
        let on_floor = actor.y >= FLOOR_Y - 1.0;
        if !input.up || actor.airborne || !on_floor || input.down {
            return;
        }

        actor.airborne = true;
        actor.vy = -JUMP_SPEED;
        if input.left {
            actor.vx = -MOVE_SPEED;
            actor.jump_diagonal = true;
        } else if input.right {
            actor.vx = MOVE_SPEED;
            actor.jump_diagonal = true;
        } else {
            actor.vx = 0.0;
            actor.jump_diagonal = false;
        }
        actor.just_landed = false;
    }

    fn apply_vertical(actor: &mut ActorState, scale: f32) {
        if !actor.airborne {
            actor.y = FLOOR_Y;
            return;
        }

        actor.y += actor.vy * scale;
        actor.x += actor.vx * scale;
        actor.vy += GRAVITY * scale;

        if actor.backflipping && actor.y > FLOOR_Y {
            actor.y = FLOOR_Y;
        }

        if actor.y >= FLOOR_Y {
            actor.y = FLOOR_Y;
            actor.vy = 0.0;
            actor.vx = 0.0;
            actor.airborne = false;
            actor.jump_diagonal = false;
            actor.just_landed = true;
        }
    }
}

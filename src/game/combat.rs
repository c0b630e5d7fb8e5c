//! Combat system - melee reach, blocking and damage

use super::fighter::{ActorState, Slot};

/// Horizontal reach of punches and kicks
pub const MELEE_RANGE: f32 = 70.0;
/// Fighters must be roughly level for a hit to connect
pub const VERTICAL_TOLERANCE: f32 = 40.0;

pub const PUNCH_DAMAGE: f32 = 10.0;
pub const KICK_DAMAGE: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    Punch,
    Kick,
}

impl Strike {
    pub fn damage(self) -> f32 {
        match self {
            Strike::Punch => PUNCH_DAMAGE,
            Strike::Kick => KICK_DAMAGE,
        }
    }
}

/// A strike that connected this tick
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub attacker: Slot,
    pub target: Slot,
    pub strike: Strike,
    pub damage: f32,
    pub target_health: f32,
}

/// Combat system for resolving strikes between the two fighters
pub struct CombatSystem;

impl CombatSystem {
    /// Whether the two fighters are close enough and level enough to trade blows
    pub fn in_reach(a: &ActorState, b: &ActorState) -> bool {
        (a.x - b.x).abs() < MELEE_RANGE && (a.y - b.y).abs() < VERTICAL_TOLERANCE
    }

    /// Apply damage to health, clamped at zero
    pub fn apply_damage(current_health: f32, damage: f32) -> f32 {
        (current_health - damage).max(0.0)
    }

    /// Resolve both fighters' one-shot strikes against each other.
    ///
    /// Both sides are judged against the same crouch snapshot, so neither
    /// deduction affects the other's eligibility. A crouch on either side
    /// blocks everything. The one-shot markers are consumed whether or not
    /// anything landed.
    pub fn resolve(a: &mut ActorState, b: &mut ActorState) -> Vec<HitResult> {
        let mut hits = Vec::new();

        let blocked = a.crouching() || b.crouching();
        if Self::in_reach(a, b) && !blocked {
            let from_a = Self::strikes(a);
            let from_b = Self::strikes(b);

            for strike in from_a {
                b.health = Self::apply_damage(b.health, strike.damage());
                hits.push(HitResult {
                    attacker: a.slot,
                    target: b.slot,
                    strike,
                    damage: strike.damage(),
                    target_health: b.health,
                });
            }
            for strike in from_b {
                a.health = Self::apply_damage(a.health, strike.damage());
                hits.push(HitResult {
                    attacker: b.slot,
                    target: a.slot,
                    strike,
                    damage: strike.damage(),
                    target_health: a.health,
                });
            }
        }

        for actor in [a, b] {
            actor.just_punched = false;
            actor.just_kicked = false;
        }

        hits
    }

    fn strikes(actor: &ActorState) -> Vec<Strike> {
        let mut strikes = Vec::with_capacity(2);
        if actor.just_punched {
            strikes.push(Strike::Punch);
        }
        if actor.just_kicked {
            strikes.push(Strike::Kick);
        }
        strikes
    }
}

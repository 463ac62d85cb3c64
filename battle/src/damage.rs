//! Client-side damage estimate
//!
//! The server resolves every turn submitted through the turn endpoint. This
//! formula only backs the opponent's reply after a voluntary switch, whose
//! endpoint acknowledges without resolving anything.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::types::{Combatant, Move, MoveCategory};

/// Uniform random factor applied to every damaging hit
pub const DAMAGE_ROLL: RangeInclusive<f64> = 0.85..=1.0;

/// Same-type attack bonus
pub const STAB_MULTIPLIER: f64 = 1.5;

/// Result of one damage computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: u32,
    pub effectiveness: f32,
    pub stab: bool,
}

/// `floor(((2·level/5 + 2) · power · atk/def) / 50) + 2`
pub fn base_damage(level: u8, power: u32, attack: u32, defense: u32) -> u32 {
    let level = f64::from(level);
    let defense = f64::from(defense.max(1));
    let scaled = (2.0 * level / 5.0 + 2.0) * f64::from(power) * f64::from(attack) / defense;
    (scaled / 50.0).floor() as u32 + 2
}

/// Apply STAB, effectiveness and the random factor to a base value.
/// Every hit deals at least 1, immune targets included; the
/// effectiveness line still reports the immunity.
pub fn apply_modifiers(base: u32, stab: bool, effectiveness: f32, roll: f64) -> u32 {
    let mut damage = f64::from(base);
    if stab {
        damage *= STAB_MULTIPLIER;
    }
    damage *= f64::from(effectiveness);
    damage *= roll;

    (damage.floor() as u32).max(1)
}

/// Compute damage of `mv` used by `attacker` against `defender`
pub fn roll_damage<R: Rng + ?Sized>(
    rng: &mut R,
    attacker: &Combatant,
    defender: &Combatant,
    mv: &Move,
) -> DamageRoll {
    let effectiveness = mv
        .move_type
        .map(|t| t.against_all(&defender.types))
        .unwrap_or(1.0);
    let stab = mv.move_type.is_some_and(|t| attacker.has_type(t));

    if !mv.is_damaging() {
        return DamageRoll {
            damage: 0,
            effectiveness,
            stab,
        };
    }

    let (attack, defense) = match mv.category {
        MoveCategory::Special => (attacker.stats.sp_attack, defender.stats.sp_defense),
        _ => (attacker.stats.attack, defender.stats.defense),
    };

    let base = base_damage(attacker.effective_level(), mv.power, attack, defense);
    let roll = rng.gen_range(DAMAGE_ROLL);

    DamageRoll {
        damage: apply_modifiers(base, stab, effectiveness, roll),
        effectiveness,
        stab,
    }
}

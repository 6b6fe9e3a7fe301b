//! Weapon-Derived Damage Resolution
//!
//! Turns an actor's equipped item into a damage template for an ability:
//! base power from the item's attack profile, quality ladder, blade bonus,
//! then the caller-supplied ability multiplier, rounded to an integer.
//!
//! When item data is incomplete (unknown or modded catalogs) the resolver
//! estimates power from market value, then mass, then tech level, clamped
//! to a safe range. Missing data is never an error and never produces zero
//! or negative damage. A missing attack profile for the requested category
//! is absence, not failure: callers reject the cast.

use crate::settings::AbilitySettings;

use super::weapon::{DamageKind, TechLevel, Weapon};

/// Fixed armor penetration per damage category. A deliberate
/// simplification: penetration is a property of the attack class here,
/// not derived from the item.
pub const MELEE_ARMOR_PEN: f32 = 0.1;
pub const RANGED_ARMOR_PEN: f32 = 0.2;
pub const BLAST_ARMOR_PEN: f32 = 0.15;

/// Baseline power when an item offers no usable signal at all.
const FALLBACK_MELEE_POWER: f32 = 8.0;
/// Ranged fallback, tuned for close-range scatterguns.
const FALLBACK_RANGED_POWER: f32 = 12.0;
/// Base power of summoned skill attacks (independent of the weapon).
const SKILL_DAMAGE_BASE: f32 = 15.0;

/// An immutable damage template produced by the resolver and consumed by
/// the application path. `source_label` of `None` means the damage is
/// attributed to the ability itself rather than a weapon (summoned
/// projectiles, skill strikes).
#[derive(Clone, Debug, PartialEq)]
pub struct DamageSpec {
    pub amount: i32,
    pub kind: DamageKind,
    pub armor_penetration: f32,
    pub source_label: Option<String>,
}

/// Which attack profile an ability asks for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WeaponClassHint {
    Melee,
    Ranged,
}

/// Resolve a damage template from an equipped item.
///
/// Returns `None` when there is no item or the item has no profile for
/// the requested class; callers use this to reject the cast.
pub fn resolve(
    weapon: Option<&Weapon>,
    class: WeaponClassHint,
    multiplier: f32,
    settings: &AbilitySettings,
) -> Option<DamageSpec> {
    match class {
        WeaponClassHint::Melee => resolve_melee(weapon?, multiplier, settings),
        WeaponClassHint::Ranged => resolve_ranged(weapon?, multiplier),
    }
}

/// Melee damage: profile power (or fallback estimate), quality ladder,
/// blade category bonus, ability multiplier.
pub fn resolve_melee(
    weapon: &Weapon,
    multiplier: f32,
    settings: &AbilitySettings,
) -> Option<DamageSpec> {
    let profile = weapon.melee?;
    debug_assert!(multiplier >= 0.0, "negative ability multiplier {}", multiplier);

    let mut power = if profile.power > 0.0 {
        profile.power * weapon.quality.damage_multiplier()
    } else {
        fallback_power(weapon, FALLBACK_MELEE_POWER)
    };

    if weapon.is_blade() {
        power *= 1.0 + settings.sword_damage_bonus / 100.0;
    }
    power *= multiplier;

    Some(DamageSpec {
        amount: round_positive(power),
        kind: profile.kind,
        armor_penetration: MELEE_ARMOR_PEN,
        source_label: Some(weapon.label.clone()),
    })
}

/// Ranged damage: profile power (or the scattergun fallback), quality
/// ladder, ability multiplier. No category bonus.
pub fn resolve_ranged(weapon: &Weapon, multiplier: f32) -> Option<DamageSpec> {
    let profile = weapon.ranged?;
    debug_assert!(multiplier >= 0.0, "negative ability multiplier {}", multiplier);

    let power = if profile.power > 0.0 {
        profile.power * weapon.quality.damage_multiplier()
    } else {
        FALLBACK_RANGED_POWER
    };

    Some(DamageSpec {
        amount: round_positive(power * multiplier),
        kind: profile.kind,
        armor_penetration: RANGED_ARMOR_PEN,
        source_label: Some(weapon.label.clone()),
    })
}

/// Damage for summoned projectiles and other skill attacks that do not go
/// through a weapon. Scales with the actor's shooting skill (10% per
/// level) and is attributed to the ability name (no weapon label).
pub fn resolve_skill(shooting_skill: u8, multiplier: f32, kind: DamageKind) -> DamageSpec {
    let skill_multiplier = 1.0 + shooting_skill as f32 * 0.1;
    DamageSpec {
        amount: round_positive(SKILL_DAMAGE_BASE * skill_multiplier * multiplier),
        kind,
        armor_penetration: BLAST_ARMOR_PEN,
        source_label: None,
    }
}

/// A fixed-amount template, for abilities whose damage is a declared
/// constant rather than weapon-derived.
pub fn fixed(amount: i32, kind: DamageKind, armor_penetration: f32) -> DamageSpec {
    DamageSpec {
        amount: amount.max(1),
        kind,
        armor_penetration,
        source_label: None,
    }
}

/// Estimate power for an item whose profile declares no usable number.
/// Market value is the primary signal, mass the secondary, tech level the
/// tertiary; each clamped so one absurd catalog entry cannot produce an
/// absurd hit.
fn fallback_power(weapon: &Weapon, baseline: f32) -> f32 {
    if weapon.market_value > 0.0 {
        let factor = (weapon.market_value / 100.0).clamp(0.1, 2.0);
        return baseline * factor;
    }
    if weapon.mass > 0.0 {
        return (baseline + weapon.mass * 2.0).clamp(5.0, 25.0);
    }
    if weapon.tech_level >= TechLevel::Industrial {
        return 12.0;
    }
    baseline
}

/// Round to an integer amount, never returning less than 1 so a
/// resolvable item always deals damage.
fn round_positive(power: f32) -> i32 {
    (power.round() as i32).max(1)
}

/// Apply a damage template against a combatant's armor and record the
/// wound. Returns the health actually lost.
///
/// Mitigation is a single multiplicative term: armor reduced by the
/// attack's penetration fraction. There is no locational model.
pub fn inflict(
    target: &mut super::components::Combatant,
    spec: &DamageSpec,
) -> f32 {
    let mitigation = (target.armor * (1.0 - spec.armor_penetration)).clamp(0.0, 0.95);
    let effective = spec.amount as f32 * (1.0 - mitigation);
    target.take_injury(effective, false)
}

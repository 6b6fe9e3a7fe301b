//! Void Arc: an instant cone slash that leaves a bleeding brand.
//!
//! A 75-degree cone reaching seven cells, resolved in a single tick.
//! Damage is a declared constant rather than weapon-derived (the weapon
//! is the focus, not the source), and every pawn caught in the cone
//! picks up the Lacerated bleed, with a small chance of an immediate
//! stagger.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::WorldView;
use crate::engine::status::StatusEffect;
use crate::engine::targeting::{self, TargetFilter};
use crate::engine::weapon::DamageKind;
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx,
    TargetSnapshot,
};

const CONE_HALF_ANGLE_DEG: f32 = 37.5;
const CONE_RANGE: i32 = 7;
const BASE_DAMAGE: f32 = 12.0;
const STAGGER_CHANCE: f32 = 0.1;

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    _view: &WorldView,
    _rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_melee_weapon()) {
        return Err(CastError::NoMeleeWeapon);
    }
    if target.cell == ctx.caster_cell {
        return Err(CastError::CannotTargetSelf);
    }

    Ok(ActiveAbility::new(
        AbilityKind::VoidArc,
        AbilityPhase::Executing,
        target,
        AbilityState::Instant,
    ))
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let toward = ability.target.cell;

    // Wave effect along the cone axis, every other cell.
    if let Some((dx, dz)) = caster.cell.direction_to(toward) {
        let mut step = 1;
        while step <= CONE_RANGE {
            let cell = crate::engine::grid::Cell::new(
                caster.cell.x + (dx * step as f32).round() as i32,
                caster.cell.z + (dz * step as f32).round() as i32,
            );
            if view.in_bounds(cell) {
                actions.push(AbilityAction::Visual {
                    kind: VisualKind::SlashArc,
                    cell,
                    scale: 2.0,
                });
            }
            step += 2;
        }
    }
    actions.push(AbilityAction::Sound {
        kind: SoundKind::BladeWhoosh,
        cell: caster.cell,
    });

    let multiplier = settings.damage_multiplier(AbilityKind::VoidArc) * caster.damage_bonus;
    let amount = ((BASE_DAMAGE * multiplier).round() as i32).max(1);
    let filter = TargetFilter::from_settings(caster.entity, caster.combatant.faction, settings);

    // Snapshot everyone in the cone before any damage lands.
    let victims = targeting::collect_in_cone(
        caster.cell,
        toward,
        CONE_HALF_ANGLE_DEG,
        CONE_RANGE,
        &filter,
        view,
    );
    for victim in victims {
        actions.push(AbilityAction::Damage {
            target: victim,
            spec: damage::fixed(amount, DamageKind::Cut, 0.1),
            ability_label: AbilityKind::VoidArc.name().to_string(),
        });
        actions.push(AbilityAction::ApplyStatus {
            target: victim,
            effect: StatusEffect::lacerated().with_source(caster.entity),
        });
        if rng.chance(STAGGER_CHANCE) {
            actions.push(AbilityAction::ApplyStatus {
                target: victim,
                effect: StatusEffect::stagger(0.3).with_source(caster.entity),
            });
        }
        if let Some(pawn) = view.pawn(victim) {
            actions.push(AbilityAction::Visual {
                kind: VisualKind::ImpactSpark,
                cell: pawn.cell,
                scale: 1.2,
            });
            actions.push(AbilityAction::Sound {
                kind: SoundKind::SlashHit,
                cell: pawn.cell,
            });
        }
    }

    ability.transition(AbilityPhase::Complete);
}

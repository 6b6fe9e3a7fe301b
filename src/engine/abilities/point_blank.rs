//! Point Blank: teleport next to an enemy and unload a shotgun into it.
//!
//! One-tick execution: blink to a safe landing beside the target, hit it
//! with full ranged damage plus a stun and a burn chance, then rake a
//! 90-degree cone behind the target with falling-off blast damage. The
//! cone reuses the caster-to-target direction, so pawns standing past
//! the victim catch the spread.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::damage::{self, DamageSpec, BLAST_ARMOR_PEN};
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::{Cell, WorldView};
use crate::engine::status::StatusEffect;
use crate::engine::targeting;
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx,
    TargetSnapshot,
};

/// Cone behind the target: 90 degrees total, 3 cells deep.
const BLAST_HALF_ANGLE_DEG: f32 = 45.0;
const BLAST_RANGE: f32 = 3.0;
/// Blast damage falls from 70% at the target down to 30% at the edge.
const BLAST_FALLOFF_NEAR: f32 = 0.7;
const BLAST_FALLOFF_FAR: f32 = 0.3;
const PRIMARY_BURN_CHANCE: f32 = 0.15;
const BLAST_BURN_CHANCE: f32 = 0.05;

pub fn validate(
    target: TargetSnapshot,
    ctx: &CastContext,
    view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.weapon.is_some_and(|w| w.is_shotgun()) {
        return Err(CastError::NoShotgunWeapon);
    }
    let target_entity = ctx.check_pawn_target(&target, view)?;
    ctx.check_range_band(AbilityKind::PointBlank, &target)?;

    let landing = path_landing(target.cell, ctx, view, rng)?;

    Ok(ActiveAbility::new(
        AbilityKind::PointBlank,
        AbilityPhase::Executing,
        TargetSnapshot::pawn(target_entity, target.cell),
        AbilityState::Blink { landing },
    ))
}

fn path_landing(
    target_cell: Cell,
    ctx: &CastContext,
    view: &WorldView,
    rng: &mut GameRng,
) -> Result<Cell, CastError> {
    crate::engine::path::find_safe_landing(target_cell, ctx.caster, 3, view, rng)
        .ok_or(CastError::NoSafeLanding)
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    let AbilityState::Blink { landing } = &ability.state else {
        ability.phase = AbilityPhase::Cancelled;
        return;
    };
    let landing = *landing;
    let Some(target_entity) = ability.target.entity else {
        ability.transition(AbilityPhase::Cancelled);
        return;
    };
    let target_cell = ability.target.cell;

    // Blink beside the target.
    actions.push(AbilityAction::Visual {
        kind: VisualKind::DustPuff,
        cell: caster.cell,
        scale: 1.5,
    });
    actions.push(AbilityAction::MoveCaster(landing));
    actions.push(AbilityAction::Visual {
        kind: VisualKind::Flash,
        cell: landing,
        scale: 2.5,
    });
    actions.push(AbilityAction::Sound {
        kind: SoundKind::Teleport,
        cell: landing,
    });

    let multiplier = settings.damage_multiplier(AbilityKind::PointBlank) * caster.damage_bonus;
    let Some(primary_spec) = caster
        .weapon
        .and_then(|w| damage::resolve_ranged(w, multiplier))
    else {
        // Weapon lost between validation and execution; nothing fires.
        ability.transition(AbilityPhase::Cancelled);
        return;
    };

    // Full damage, a short stun and a burn chance for the primary target.
    actions.push(AbilityAction::Damage {
        target: target_entity,
        spec: primary_spec.clone(),
        ability_label: AbilityKind::PointBlank.name().to_string(),
    });
    actions.push(AbilityAction::ApplyStatus {
        target: target_entity,
        effect: StatusEffect::stunned(rng.range_inclusive(30, 90) as u32)
            .with_source(caster.entity),
    });
    if rng.chance(PRIMARY_BURN_CHANCE) {
        actions.push(AbilityAction::ApplyStatus {
            target: target_entity,
            effect: StatusEffect::burning(2.0, 300).with_source(caster.entity),
        });
    }
    actions.push(AbilityAction::Sound {
        kind: SoundKind::GunShot,
        cell: landing,
    });
    actions.push(AbilityAction::Visual {
        kind: VisualKind::MuzzleFlash,
        cell: target_cell,
        scale: 2.0,
    });

    // Cone spread behind the target. Direction runs from the landing
    // cell through the target; candidates are snapshotted before any
    // damage applies.
    let Some((dir_x, dir_z)) = landing.direction_to(target_cell) else {
        ability.transition(AbilityPhase::Complete);
        return;
    };
    let max_ring = BLAST_RANGE.ceil() as i32;
    let mut blast_targets: Vec<(bevy::prelude::Entity, Cell, f32)> = Vec::new();
    for ring in 1..=max_ring {
        for cell in crate::engine::path::ring_cells(target_cell, ring) {
            let distance = target_cell.distance_to(cell);
            if distance > BLAST_RANGE {
                continue;
            }
            let Some(occupant) = view.occupant_at(cell) else {
                continue;
            };
            if occupant == target_entity {
                continue;
            }
            if !targeting::should_target(
                caster.entity,
                caster.combatant.faction,
                occupant,
                view,
                settings,
            ) {
                continue;
            }
            let Some((cx, cz)) = landing.direction_to(cell) else {
                continue;
            };
            let dot = (dir_x * cx + dir_z * cz).clamp(-1.0, 1.0);
            if dot.acos() <= BLAST_HALF_ANGLE_DEG.to_radians() + f32::EPSILON {
                blast_targets.push((occupant, cell, distance));
            }
        }
    }

    for (occupant, cell, distance) in blast_targets {
        let falloff = BLAST_FALLOFF_NEAR
            + (BLAST_FALLOFF_FAR - BLAST_FALLOFF_NEAR) * (distance / BLAST_RANGE);
        let blast_spec = DamageSpec {
            amount: ((primary_spec.amount as f32 * falloff).round() as i32).max(1),
            kind: primary_spec.kind,
            armor_penetration: BLAST_ARMOR_PEN,
            source_label: primary_spec.source_label.clone(),
        };
        actions.push(AbilityAction::Damage {
            target: occupant,
            spec: blast_spec,
            ability_label: AbilityKind::PointBlank.name().to_string(),
        });
        if rng.chance(BLAST_BURN_CHANCE) {
            actions.push(AbilityAction::ApplyStatus {
                target: occupant,
                effect: StatusEffect::burning(2.0, 300).with_source(caster.entity),
            });
        }
        actions.push(AbilityAction::Visual {
            kind: VisualKind::MuzzleFlash,
            cell,
            scale: 1.0,
        });
    }

    ability.transition(AbilityPhase::Complete);
}

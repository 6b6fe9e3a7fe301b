//! Transformations: Overdrive and Transcendence.
//!
//! Self-targeted, single-tick abilities. The instance applies a long
//! status effect and completes immediately; everything after that (the
//! damage multiplier, periodic regeneration, expiry) is carried entirely
//! by the status effect's own per-tick logic.
//!
//! Tier rules: Overdrive refuses to cast while either tier is active,
//! and Transcendence may upgrade over Overdrive, in which case the
//! weaker tier is force-removed before the stronger one lands so the
//! bonuses never overlap even transiently.

use crate::engine::cast::{CastContext, CastError};
use crate::engine::components::GameRng;
use crate::engine::effects::{SoundKind, VisualKind};
use crate::engine::grid::WorldView;
use crate::engine::status::{StatusEffect, StatusKind};
use crate::settings::AbilitySettings;

use super::{
    AbilityAction, AbilityKind, AbilityPhase, AbilityState, ActiveAbility, CasterCtx,
    TargetSnapshot,
};

pub fn validate(
    kind: AbilityKind,
    _target: TargetSnapshot,
    ctx: &CastContext,
) -> Result<ActiveAbility, CastError> {
    match kind {
        AbilityKind::Overdrive => {
            if ctx.statuses.has(StatusKind::Overdrive) {
                return Err(CastError::TransformationActive("Overdrive"));
            }
            if ctx.statuses.has(StatusKind::Transcendence) {
                return Err(CastError::StrongerTransformationActive);
            }
        }
        AbilityKind::Transcendence => {
            if ctx.statuses.has(StatusKind::Transcendence) {
                return Err(CastError::TransformationActive("Transcendence"));
            }
        }
        _ => unreachable!("transformation validate called for {:?}", kind),
    }

    // Always self-targeted; the requested target is ignored.
    Ok(ActiveAbility::new(
        kind,
        AbilityPhase::Executing,
        TargetSnapshot::pawn(ctx.caster, ctx.caster_cell),
        AbilityState::Instant,
    ))
}

pub fn tick(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    _view: &WorldView,
    settings: &AbilitySettings,
    _rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    // The multiplier is snapshotted here, at activation: it lives inside
    // the status effect for the whole transformation, so later settings
    // changes only affect the next cast.
    let effect = match ability.kind {
        AbilityKind::Overdrive => {
            StatusEffect::overdrive(settings.damage_multiplier(AbilityKind::Overdrive))
        }
        AbilityKind::Transcendence => {
            // Upgrade path: drop the weaker tier first.
            actions.push(AbilityAction::RemoveStatus {
                target: caster.entity,
                kind: StatusKind::Overdrive,
            });
            StatusEffect::transcendence(settings.damage_multiplier(AbilityKind::Transcendence))
        }
        _ => {
            ability.transition(AbilityPhase::Cancelled);
            return;
        }
    };

    actions.push(AbilityAction::ApplyStatus {
        target: caster.entity,
        effect,
    });
    actions.push(AbilityAction::Visual {
        kind: VisualKind::TransformBurst,
        cell: caster.cell,
        scale: if ability.kind == AbilityKind::Transcendence {
            3.5
        } else {
            2.5
        },
    });
    actions.push(AbilityAction::Sound {
        kind: SoundKind::TransformRoar,
        cell: caster.cell,
    });
    actions.push(AbilityAction::FloatingText {
        target: caster.entity,
        text: format!("{}!", ability.kind.name()),
    });

    ability.transition(AbilityPhase::Complete);
}

//! Ability Cast Controller
//!
//! The entry point of the engine: validates a cast request and, on
//! success, attaches a fresh `ActiveAbility` instance to the caster.
//! Validation is the terminal failure point; nothing in the world mutates
//! when a cast is rejected, and the only observable effect is a rejection
//! message routed through the effect sink and the log.
//!
//! At most one instance may exist per caster. The instance component
//! enforces that structurally, and `try_cast` rejects while one is
//! attached.

use bevy::prelude::*;
use thiserror::Error;

use crate::combat::events::AbilityStartedEvent;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::settings::AbilitySettings;

use super::abilities::defs::AbilityDefs;
use super::abilities::{self, ActiveAbility, AbilityKind, TargetSnapshot};
use super::components::{Combatant, GameRng, TickCount};
use super::effects::EffectSink;
use super::grid::{Cell, GridPos, MapGrid, PawnSnapshot, WorldView};
use super::status::StatusEffects;
use super::weapon::Weapon;

/// Why a cast was rejected during validation. Fully recoverable; no
/// state corruption is possible at this stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastError {
    #[error("this ability is disabled")]
    Disabled,
    #[error("requires a melee weapon equipped")]
    NoMeleeWeapon,
    #[error("requires a pistol or revolver equipped")]
    NoPistolWeapon,
    #[error("requires a shotgun-type weapon equipped")]
    NoShotgunWeapon,
    #[error("requires a ranged weapon equipped")]
    NoRangedWeapon,
    #[error("must target a living creature")]
    MustTargetPawn,
    #[error("cannot target yourself")]
    CannotTargetSelf,
    #[error("target must be between {min:.0} and {max:.0} cells away")]
    OutOfRangeBand { min: f32, max: f32 },
    #[error("no safe landing area near the target")]
    NoSafeLanding,
    #[error("no dash path toward the target")]
    NoPath,
    #[error("another ability is already in progress")]
    AlreadyCasting,
    #[error("caster cannot act right now")]
    CasterIncapacitated,
    #[error("{0} is already active")]
    TransformationActive(&'static str),
    #[error("a stronger transformation is active")]
    StrongerTransformationActive,
}

/// Everything validation needs to know about the caster and environment.
pub struct CastContext<'a> {
    pub caster: Entity,
    pub caster_cell: Cell,
    pub combatant: &'a Combatant,
    pub weapon: Option<&'a Weapon>,
    pub statuses: &'a StatusEffects,
    pub settings: &'a AbilitySettings,
    pub defs: &'a AbilityDefs,
}

impl CastContext<'_> {
    /// Distance from the caster to the requested target cell.
    pub fn target_distance(&self, target: &TargetSnapshot) -> f32 {
        self.caster_cell.distance_to(target.cell)
    }

    /// Common range-band check against this kind's definition.
    pub fn check_range_band(
        &self,
        kind: AbilityKind,
        target: &TargetSnapshot,
    ) -> Result<(), CastError> {
        let def = self.defs.get_unchecked(kind);
        let distance = self.target_distance(target);
        if def.range > 0.0 && (distance > def.range || distance < def.min_range) {
            return Err(CastError::OutOfRangeBand {
                min: def.min_range,
                max: def.range,
            });
        }
        Ok(())
    }

    /// Require a pawn target that is alive, on the map and not the caster.
    pub fn check_pawn_target(
        &self,
        target: &TargetSnapshot,
        view: &WorldView,
    ) -> Result<Entity, CastError> {
        let entity = target.entity.ok_or(CastError::MustTargetPawn)?;
        if entity == self.caster {
            return Err(CastError::CannotTargetSelf);
        }
        if !view.is_valid_target(entity) {
            return Err(CastError::MustTargetPawn);
        }
        Ok(entity)
    }
}

/// Validate a cast and build the instance to attach.
///
/// Checks common preconditions (enabled flag, single-instance rule,
/// caster able to act), then dispatches to the kind's own validation,
/// which builds the initial phase and state.
pub fn try_cast(
    kind: AbilityKind,
    target: TargetSnapshot,
    ctx: &CastContext,
    has_active_instance: bool,
    view: &WorldView,
    rng: &mut GameRng,
) -> Result<ActiveAbility, CastError> {
    if !ctx.settings.enabled(kind) {
        return Err(CastError::Disabled);
    }
    if has_active_instance {
        return Err(CastError::AlreadyCasting);
    }
    if ctx.combatant.is_dead_or_downed() || ctx.statuses.is_incapacitated() {
        return Err(CastError::CasterIncapacitated);
    }

    match kind {
        AbilityKind::Lunge => abilities::lunge::validate(target, ctx, view, rng),
        AbilityKind::GhostDash => abilities::ghost_dash::validate(target, ctx, view, rng),
        AbilityKind::PointBlank => abilities::point_blank::validate(target, ctx, view, rng),
        AbilityKind::Riftburst => abilities::riftburst::validate(target, ctx, view, rng),
        AbilityKind::BulletDive => abilities::bullet_dive::validate(target, ctx, view, rng),
        AbilityKind::BladeRain => abilities::blade_rain::validate(target, ctx, view, rng),
        AbilityKind::ArcWave => abilities::arc_wave::validate(target, ctx, view, rng),
        AbilityKind::VoidArc => abilities::void_arc::validate(target, ctx, view, rng),
        AbilityKind::Cinderfall => abilities::cinderfall::validate(target, ctx, view, rng),
        AbilityKind::Overdrive | AbilityKind::Transcendence => {
            abilities::overdrive::validate(kind, target, ctx)
        }
    }
}

/// A cast request queued for a specific tick, fed to the engine by the
/// host (scenario scripts, AI, player input).
#[derive(Event, Debug, Clone)]
pub struct CastRequest {
    pub caster: Entity,
    pub kind: AbilityKind,
    pub target: TargetSnapshot,
}

/// Process queued cast requests: validate each and attach instances for
/// the ones that pass. Rejections surface as a floating message plus a
/// log entry and nothing else.
pub fn process_cast_requests(
    mut commands: Commands,
    grid: Res<MapGrid>,
    settings: Res<AbilitySettings>,
    defs: Res<AbilityDefs>,
    tick: Res<TickCount>,
    mut rng: ResMut<GameRng>,
    mut combat_log: ResMut<CombatLog>,
    mut effect_sink: ResMut<EffectSink>,
    mut started_events: EventWriter<AbilityStartedEvent>,
    mut requests: EventReader<CastRequest>,
    pawns: Query<(
        Entity,
        &GridPos,
        &Combatant,
        Option<&Weapon>,
        &StatusEffects,
        Option<&ActiveAbility>,
    )>,
) {
    combat_log.tick = tick.0;

    let mut occupants = std::collections::HashMap::new();
    let mut snapshots = std::collections::HashMap::new();
    for (entity, pos, combatant, _, _, _) in pawns.iter() {
        if combatant.is_alive() {
            occupants.insert(pos.0, entity);
        }
        snapshots.insert(
            entity,
            PawnSnapshot {
                cell: pos.0,
                faction: combatant.faction,
                alive: combatant.is_alive(),
                downed: combatant.is_downed(),
            },
        );
    }

    for request in requests.read() {
        let Ok((_, pos, combatant, weapon, statuses, active)) = pawns.get(request.caster) else {
            continue;
        };

        let ctx = CastContext {
            caster: request.caster,
            caster_cell: pos.0,
            combatant,
            weapon,
            statuses,
            settings: &settings,
            defs: &defs,
        };
        let view = WorldView::new(&grid, &occupants, &snapshots);

        match try_cast(
            request.kind,
            request.target,
            &ctx,
            active.is_some(),
            &view,
            &mut rng,
        ) {
            Ok(instance) => {
                combat_log.log(
                    CombatLogEventType::AbilityCast,
                    format!("{} casts {}", combatant.name, request.kind.name()),
                );
                started_events.send(AbilityStartedEvent {
                    caster: request.caster,
                    kind: request.kind,
                });
                commands.entity(request.caster).insert(instance);
            }
            Err(error) => {
                combat_log.log(
                    CombatLogEventType::CastRejected,
                    format!(
                        "{} cannot cast {}: {}",
                        combatant.name,
                        request.kind.name(),
                        error
                    ),
                );
                effect_sink.request_floating_text(request.caster, error.to_string());
            }
        }
    }
}

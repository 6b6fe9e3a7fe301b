//! Ability State Machines
//!
//! One `ActiveAbility` component per in-flight cast, attached to the
//! caster entity. Each simulation tick the machine performs at most the
//! bounded work of its current phase: one dash step, one barrage wave,
//! one warmup pulse. Ability kinds are a closed enum; per-kind behavior
//! lives in one module per kind, dispatched from `tick_ability`.
//!
//! Tick functions never touch the ECS directly. They read a `WorldView`
//! snapshot plus a caster context and emit `AbilityAction`s; the driving
//! system applies those actions in a second pass. That keeps every phase
//! transition inspectable in tests without running a scheduler, and makes
//! the collect-then-apply order explicit where a sweep can kill the pawns
//! it is iterating over.

pub mod arc_wave;
pub mod blade_rain;
pub mod bullet_dive;
pub mod cinderfall;
pub mod defs;
pub mod ghost_dash;
pub mod lunge;
pub mod overdrive;
pub mod point_blank;
pub mod riftburst;
pub mod void_arc;

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::combat::events::{
    AbilityEndedEvent, DamageDealtEvent, StatusAppliedEvent, StatusRemovedEvent,
    StatusRemovalReason,
};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::settings::AbilitySettings;

use super::components::{Combatant, GameRng, TickCount};
use super::damage::{self, DamageSpec};
use super::effects::{EffectSink, SoundKind, VisualKind};
use super::grid::{Cell, GridPos, MapGrid, PawnSnapshot, WorldView};
use super::path::PlannedPath;
use super::projectiles::ProjectileSpawn;
use super::status::{StatusEffect, StatusEffects, StatusKind};
use super::weapon::Weapon;

/// The closed set of ability kinds the engine executes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum AbilityKind {
    /// Dash to an enemy and strike it once on arrival
    Lunge,
    /// Dash straight through obstacles, slashing everything along the way
    GhostDash,
    /// Teleport next to an enemy and fire point-blank, with a cone blast
    PointBlank,
    /// Gather for a moment, then burst-slash an area
    Riftburst,
    /// Leap while raining pistol fire along the jump path
    BulletDive,
    /// Barrage of spectral blades over an area
    BladeRain,
    /// Launch piercing slash waves down a line
    ArcWave,
    /// Instant cone slash that leaves a bleeding brand
    VoidArc,
    /// Barrage of falling fire orbs
    Cinderfall,
    /// Self transformation, first tier
    Overdrive,
    /// Self transformation, second tier
    Transcendence,
}

impl AbilityKind {
    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::Lunge => "Lunge",
            AbilityKind::GhostDash => "Ghost Dash",
            AbilityKind::PointBlank => "Point Blank",
            AbilityKind::Riftburst => "Riftburst",
            AbilityKind::BulletDive => "Bullet Dive",
            AbilityKind::BladeRain => "Blade Rain",
            AbilityKind::ArcWave => "Arc Wave",
            AbilityKind::VoidArc => "Void Arc",
            AbilityKind::Cinderfall => "Cinderfall",
            AbilityKind::Overdrive => "Overdrive",
            AbilityKind::Transcendence => "Transcendence",
        }
    }

    pub fn all() -> [AbilityKind; 11] {
        [
            AbilityKind::Lunge,
            AbilityKind::GhostDash,
            AbilityKind::PointBlank,
            AbilityKind::Riftburst,
            AbilityKind::BulletDive,
            AbilityKind::BladeRain,
            AbilityKind::ArcWave,
            AbilityKind::VoidArc,
            AbilityKind::Cinderfall,
            AbilityKind::Overdrive,
            AbilityKind::Transcendence,
        ]
    }
}

/// Phase of an ability instance. The generic sequence is
/// Warmup -> Executing -> Sustaining -> Complete, with Cancelled as the
/// universal abort; kinds skip phases they do not use.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AbilityPhase {
    Warmup,
    Executing,
    Sustaining,
    Complete,
    Cancelled,
}

impl AbilityPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AbilityPhase::Complete | AbilityPhase::Cancelled)
    }
}

/// The target captured at cast time: a cell, and the entity that stood
/// there if the ability targets a pawn. Entity liveness is re-checked
/// every tick; the cell may go stale and consumers re-check it too.
#[derive(Clone, Copy, Debug)]
pub struct TargetSnapshot {
    pub cell: Cell,
    pub entity: Option<Entity>,
}

impl TargetSnapshot {
    pub fn cell(cell: Cell) -> Self {
        Self { cell, entity: None }
    }

    pub fn pawn(entity: Entity, cell: Cell) -> Self {
        Self {
            cell,
            entity: Some(entity),
        }
    }
}

/// Phase-local counters and data, one variant per execution template.
#[derive(Debug)]
pub enum AbilityState {
    /// Tick-stepped dash along a precomputed path.
    Dash(DashState),
    /// Random warmup then an area burst.
    Burst(BurstState),
    /// Timed launches of projectile entities.
    Volley(VolleyState),
    /// Timed area emissions with a trailing grace window.
    Barrage(BarrageState),
    /// Dash path where every step fires instead of sweeping.
    Dive(DiveState),
    /// One-hop teleport with a landing cell chosen at validation.
    Blink { landing: Cell },
    /// Single-tick execution (cone slash, transformation).
    Instant,
}

#[derive(Debug)]
pub struct DashState {
    pub path: PlannedPath,
    /// Ticks between steps; one cell at most per interval
    pub step_interval: u32,
    pub ticks_since_step: u32,
    /// Pawns already hit during this instance; a dash never hits the
    /// same target twice
    pub already_hit: HashSet<Entity>,
    /// Set once the primary strike has landed
    pub has_struck: bool,
}

impl DashState {
    pub fn new(path: PlannedPath, step_interval: u32) -> Self {
        Self {
            path,
            step_interval,
            ticks_since_step: step_interval,
            already_hit: HashSet::new(),
            has_struck: false,
        }
    }
}

#[derive(Debug)]
pub struct BurstState {
    /// Remaining warmup ticks, decided at cast time
    pub warmup_left: u32,
    /// Ticks between warmup pulses, snapshotted from the definition
    pub pulse_interval: u32,
    /// Emit a visible pulse whenever this hits zero
    pub ticks_until_pulse: u32,
}

#[derive(Debug)]
pub struct VolleyState {
    pub launched: u32,
    /// Total decided once at cast
    pub total: u32,
    pub interval: u32,
    pub ticks_since_launch: u32,
}

#[derive(Debug)]
pub struct BarrageState {
    pub waves_done: u32,
    /// Total decided once at cast
    pub total: u32,
    pub interval: u32,
    pub ticks_since_wave: u32,
    pub radius: f32,
    /// Grace ticks after the last wave before the instance finalizes,
    /// letting in-flight projectiles play out
    pub grace_ticks: u32,
}

#[derive(Debug)]
pub struct DiveState {
    pub path: PlannedPath,
    /// Bullets fired at each path cell, decided once at cast
    pub bullets_per_cell: u32,
    pub fired_in_cell: u32,
    pub total_fired: u32,
    pub interval: u32,
    pub ticks_since_shot: u32,
}

/// One in-flight ability cast. Exactly one may exist per caster; the
/// cast controller rejects casts while one is attached.
#[derive(Component, Debug)]
pub struct ActiveAbility {
    pub kind: AbilityKind,
    pub phase: AbilityPhase,
    pub target: TargetSnapshot,
    pub ticks_in_phase: u32,
    pub state: AbilityState,
}

impl ActiveAbility {
    pub fn new(kind: AbilityKind, phase: AbilityPhase, target: TargetSnapshot, state: AbilityState) -> Self {
        Self {
            kind,
            phase,
            target,
            ticks_in_phase: 0,
            state,
        }
    }

    /// Transition to a new phase, resetting the phase-local tick count.
    pub fn transition(&mut self, phase: AbilityPhase) {
        self.phase = phase;
        self.ticks_in_phase = 0;
    }
}

/// Read-only facts about the caster for one tick of one instance.
pub struct CasterCtx<'a> {
    pub entity: Entity,
    pub cell: Cell,
    pub combatant: &'a Combatant,
    pub weapon: Option<&'a Weapon>,
    /// Outgoing damage multiplier from active transformation buffs
    pub damage_bonus: f32,
}

/// World mutations requested by one tick of one instance, applied by the
/// driving system after the instance's bounded work is done.
#[derive(Debug)]
pub enum AbilityAction {
    /// Teleport-write the caster to a cell
    MoveCaster(Cell),
    Damage {
        target: Entity,
        spec: DamageSpec,
        /// Name used when the damage template itself carries no label
        ability_label: String,
    },
    ApplyStatus {
        target: Entity,
        effect: StatusEffect,
    },
    RemoveStatus {
        target: Entity,
        kind: StatusKind,
    },
    SpawnProjectile(ProjectileSpawn),
    Visual {
        kind: VisualKind,
        cell: Cell,
        scale: f32,
    },
    Sound {
        kind: SoundKind,
        cell: Cell,
    },
    FloatingText {
        target: Entity,
        text: String,
    },
    Log {
        event: CombatLogEventType,
        message: String,
    },
}

/// Advance one instance by one tick of bounded work.
///
/// The caller has already handled cancellation; this only dispatches to
/// the per-kind phase logic and bumps the phase-local tick counter.
pub fn tick_ability(
    ability: &mut ActiveAbility,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    rng: &mut GameRng,
    actions: &mut Vec<AbilityAction>,
) {
    debug_assert!(
        !ability.phase.is_terminal(),
        "ticking a terminal ability instance ({:?})",
        ability.kind
    );

    match ability.kind {
        AbilityKind::Lunge => lunge::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::GhostDash => ghost_dash::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::PointBlank => point_blank::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::Riftburst => riftburst::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::BulletDive => bullet_dive::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::BladeRain => blade_rain::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::ArcWave => arc_wave::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::VoidArc => void_arc::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::Cinderfall => cinderfall::tick(ability, caster, view, settings, rng, actions),
        AbilityKind::Overdrive | AbilityKind::Transcendence => {
            overdrive::tick(ability, caster, view, settings, rng, actions)
        }
    }
    ability.ticks_in_phase += 1;
}

/// Shared sweep helper for dash abilities: damage every valid target in
/// the 3x3 block around `center` that has not been hit by this instance
/// yet. The candidate list is snapshotted before any damage is queued.
pub(crate) fn sweep_3x3(
    center: Cell,
    caster: &CasterCtx,
    view: &WorldView,
    settings: &AbilitySettings,
    already_hit: &mut HashSet<Entity>,
    spec_for: impl Fn() -> Option<DamageSpec>,
    label: &str,
    stagger_severity: f32,
    actions: &mut Vec<AbilityAction>,
) {
    let mut cells = vec![center];
    cells.extend(center.adjacent8());

    // Snapshot candidates first; queued damage may kill or move them.
    let candidates: Vec<Entity> = cells
        .iter()
        .filter_map(|cell| view.occupant_at(*cell))
        .filter(|entity| {
            super::targeting::should_target(
                caster.entity,
                caster.combatant.faction,
                *entity,
                view,
                settings,
            )
        })
        .filter(|entity| !already_hit.contains(entity))
        .collect();

    for target in candidates {
        let Some(spec) = spec_for() else {
            continue;
        };
        already_hit.insert(target);
        actions.push(AbilityAction::Damage {
            target,
            spec,
            ability_label: label.to_string(),
        });
        if stagger_severity > 0.0 {
            actions.push(AbilityAction::ApplyStatus {
                target,
                effect: StatusEffect::stagger(stagger_severity).with_source(caster.entity),
            });
        }
        if let Some(pawn) = view.pawn(target) {
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
}

/// Advance every active ability instance by one tick.
///
/// Runs once per simulation step. Order of work:
/// 1. capture the occupancy snapshot
/// 2. per instance: poll cancellation, then dispatch bounded phase work
/// 3. apply the collected actions (movement, damage, statuses, spawns)
/// 4. detach instances that reached a terminal phase
pub fn tick_active_abilities(
    mut commands: Commands,
    grid: Res<MapGrid>,
    settings: Res<AbilitySettings>,
    tick: Res<TickCount>,
    mut rng: ResMut<GameRng>,
    mut combat_log: ResMut<CombatLog>,
    mut effect_sink: ResMut<EffectSink>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut status_applied: EventWriter<StatusAppliedEvent>,
    mut status_removed: EventWriter<StatusRemovedEvent>,
    mut ended_events: EventWriter<AbilityEndedEvent>,
    mut instances: Query<(Entity, &mut ActiveAbility)>,
    mut pawns: Query<(
        Entity,
        &mut GridPos,
        &mut Combatant,
        Option<&Weapon>,
        &mut StatusEffects,
    )>,
) {
    combat_log.tick = tick.0;

    // Occupancy and pawn snapshot for this tick. Dead pawns leave the
    // grid; downed pawns still occupy their cell.
    let mut occupants: HashMap<Cell, Entity> = HashMap::new();
    let mut snapshots: HashMap<Entity, PawnSnapshot> = HashMap::new();
    let mut names: HashMap<Entity, String> = HashMap::new();
    for (entity, pos, combatant, _, _) in pawns.iter() {
        names.insert(entity, combatant.name.clone());
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

    let mut pending: Vec<(Entity, AbilityKind, Vec<AbilityAction>)> = Vec::new();
    let mut finished: Vec<(Entity, AbilityKind, bool)> = Vec::new();

    for (caster_entity, mut ability) in instances.iter_mut() {
        // Cancellation is polled before any phase work: a dead, downed
        // or despawned caster cancels at the next tick boundary with no
        // partial work and no rollback of what already happened.
        let caster_ok = pawns
            .get(caster_entity)
            .map(|(_, _, combatant, _, _)| !combatant.is_dead_or_downed())
            .unwrap_or(false);
        if !caster_ok {
            ability.transition(AbilityPhase::Cancelled);
            finished.push((caster_entity, ability.kind, true));
            continue;
        }

        // Target-entity liveness: kinds with no fallback target cancel
        // when their pawn target dies or leaves the map.
        if requires_live_target(ability.kind) {
            let target_ok = ability
                .target
                .entity
                .map(|t| snapshots.get(&t).is_some_and(|p| p.alive))
                .unwrap_or(true);
            if !target_ok {
                ability.transition(AbilityPhase::Cancelled);
                finished.push((caster_entity, ability.kind, true));
                continue;
            }
            // Track the target's current cell while it lives.
            if let Some(target) = ability.target.entity {
                if let Some(pawn) = snapshots.get(&target) {
                    ability.target.cell = pawn.cell;
                }
            }
        }

        let Ok((_, pos, combatant, weapon, statuses)) = pawns.get(caster_entity) else {
            continue;
        };
        let ctx = CasterCtx {
            entity: caster_entity,
            cell: pos.0,
            combatant,
            weapon,
            damage_bonus: statuses.damage_multiplier(),
        };
        let view = WorldView::new(&grid, &occupants, &snapshots);

        let mut actions = Vec::new();
        tick_ability(&mut ability, &ctx, &view, &settings, &mut rng, &mut actions);
        pending.push((caster_entity, ability.kind, actions));

        if ability.phase.is_terminal() {
            finished.push((
                caster_entity,
                ability.kind,
                ability.phase == AbilityPhase::Cancelled,
            ));
        }
    }

    // Apply pass: the only world mutations in the ability path.
    for (caster_entity, kind, actions) in pending {
        for action in actions {
            apply_action(
                caster_entity,
                kind,
                action,
                &mut commands,
                &mut pawns,
                &names,
                &mut combat_log,
                &mut effect_sink,
                &mut damage_events,
                &mut status_applied,
                &mut status_removed,
            );
        }
    }

    // Terminal instances deregister by dropping their component.
    for (caster_entity, kind, cancelled) in finished {
        commands.entity(caster_entity).remove::<ActiveAbility>();
        let caster_name = names
            .get(&caster_entity)
            .cloned()
            .unwrap_or_else(|| "unknown caster".to_string());
        if cancelled {
            combat_log.log(
                CombatLogEventType::AbilityCancelled,
                format!("{}'s {} was cancelled", caster_name, kind.name()),
            );
        } else {
            combat_log.log(
                CombatLogEventType::AbilityComplete,
                format!("{}'s {} completed", caster_name, kind.name()),
            );
        }
        ended_events.send(AbilityEndedEvent {
            caster: caster_entity,
            kind,
            cancelled,
        });
    }
}

/// Kinds that track a pawn target and have no fallback when it dies.
fn requires_live_target(kind: AbilityKind) -> bool {
    matches!(kind, AbilityKind::Lunge | AbilityKind::PointBlank)
}

#[allow(clippy::too_many_arguments)]
fn apply_action(
    caster_entity: Entity,
    kind: AbilityKind,
    action: AbilityAction,
    commands: &mut Commands,
    pawns: &mut Query<(
        Entity,
        &mut GridPos,
        &mut Combatant,
        Option<&Weapon>,
        &mut StatusEffects,
    )>,
    names: &HashMap<Entity, String>,
    combat_log: &mut CombatLog,
    effect_sink: &mut EffectSink,
    damage_events: &mut EventWriter<DamageDealtEvent>,
    status_applied: &mut EventWriter<StatusAppliedEvent>,
    status_removed: &mut EventWriter<StatusRemovedEvent>,
) {
    let caster_name = names
        .get(&caster_entity)
        .cloned()
        .unwrap_or_else(|| "unknown caster".to_string());

    match action {
        AbilityAction::MoveCaster(cell) => {
            if let Ok((_, mut pos, _, _, _)) = pawns.get_mut(caster_entity) {
                pos.0 = cell;
            }
        }
        AbilityAction::Damage {
            target,
            spec,
            ability_label,
        } => {
            let Ok((_, _, mut target_combatant, _, _)) = pawns.get_mut(target) else {
                return;
            };
            if !target_combatant.is_alive() {
                return;
            }
            let actual = damage::inflict(&mut target_combatant, &spec);
            let killing_blow = !target_combatant.is_alive();
            let target_name = target_combatant.name.clone();
            drop(target_combatant);

            if let Ok((_, _, mut caster_combatant, _, _)) = pawns.get_mut(caster_entity) {
                caster_combatant.damage_dealt += actual;
            }

            let attribution = spec
                .source_label
                .clone()
                .unwrap_or_else(|| ability_label.clone());
            combat_log.log_damage(
                caster_name.clone(),
                target_name.clone(),
                ability_label.clone(),
                actual,
                killing_blow,
                format!(
                    "{}'s {} hits {} for {:.0} damage ({})",
                    caster_name, ability_label, target_name, actual, attribution
                ),
            );
            damage_events.send(DamageDealtEvent {
                source: Some(caster_entity),
                target,
                amount: actual,
                kind: spec.kind,
                ability: Some(ability_label),
                killing_blow,
            });
            effect_sink.request_floating_text(target, format!("{:.0}", actual));
        }
        AbilityAction::ApplyStatus { target, effect } => {
            let Ok((_, _, target_combatant, _, mut statuses)) = pawns.get_mut(target) else {
                return;
            };
            if !target_combatant.is_alive() {
                return;
            }
            let status_kind = effect.kind;
            let target_name = target_combatant.name.clone();
            statuses.apply(effect);
            combat_log.log(
                CombatLogEventType::StatusApplied,
                format!(
                    "{} gains {} (from {}'s {})",
                    target_name,
                    status_kind.name(),
                    caster_name,
                    kind.name()
                ),
            );
            status_applied.send(StatusAppliedEvent {
                source: Some(caster_entity),
                target,
                kind: status_kind,
            });
        }
        AbilityAction::RemoveStatus { target, kind: status_kind } => {
            let Ok((_, _, target_combatant, _, mut statuses)) = pawns.get_mut(target) else {
                return;
            };
            let target_name = target_combatant.name.clone();
            if statuses.remove(status_kind) {
                combat_log.log(
                    CombatLogEventType::StatusRemoved,
                    format!("{} loses {}", target_name, status_kind.name()),
                );
                status_removed.send(StatusRemovedEvent {
                    target,
                    kind: status_kind,
                    reason: StatusRemovalReason::Superseded,
                });
            }
        }
        AbilityAction::SpawnProjectile(spawn) => {
            commands.spawn(spawn.into_component());
        }
        AbilityAction::Visual { kind, cell, scale } => {
            effect_sink.request_visual(kind, cell, scale);
        }
        AbilityAction::Sound { kind, cell } => {
            effect_sink.request_sound(kind, cell);
        }
        AbilityAction::FloatingText { target, text } => {
            effect_sink.request_floating_text(target, text);
        }
        AbilityAction::Log { event, message } => {
            combat_log.log(event, message);
        }
    }
}

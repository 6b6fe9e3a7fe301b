//! Ability Execution Engine
//!
//! The tick-driven core: state-machine abilities, path planning, area
//! targeting, damage resolution and status effects, advanced exactly one
//! bounded step per simulation tick.
//!
//! ## Tick Phases
//!
//! Engine systems run in three ordered phases each tick:
//!
//! 1. **Upkeep** - status effect pulses, durations and expiry
//! 2. **Abilities** - cast validation, ability state machines, projectiles
//! 3. **Resolution** - death bookkeeping, tick counter advance
//!
//! One `App::update()` is exactly one simulation tick; there is no
//! wall-clock coupling anywhere in the engine.

pub mod abilities;
pub mod cast;
pub mod components;
pub mod damage;
pub mod effects;
pub mod grid;
pub mod path;
pub mod projectiles;
pub mod status;
pub mod targeting;
pub mod weapon;

use bevy::prelude::*;

use crate::combat::events::{
    AbilityEndedEvent, AbilityStartedEvent, CombatantDeathEvent, DamageDealtEvent,
    StatusAppliedEvent, StatusRemovalReason, StatusRemovedEvent,
};
use crate::combat::log::CombatLog;
use crate::settings::AbilitySettings;

use components::{Combatant, GameRng, TickCount};
use status::StatusEffects;

/// System set labels for engine phase ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Status effect pulses, durations, expiry
    Upkeep,
    /// Casts, ability state machines, projectiles
    Abilities,
    /// Deaths and the tick counter advance
    Resolution,
}

/// The engine plugin. The host must also insert a `MapGrid` and an
/// `AbilityDefs` resource before the first update; settings and RNG get
/// defaults when not provided.
pub struct EnginePlugin;

impl Plugin for EnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCount>()
            .init_resource::<CombatLog>()
            .init_resource::<effects::EffectSink>()
            .init_resource::<GameRng>()
            .init_resource::<AbilitySettings>()
            .add_event::<cast::CastRequest>()
            .add_event::<DamageDealtEvent>()
            .add_event::<AbilityStartedEvent>()
            .add_event::<AbilityEndedEvent>()
            .add_event::<StatusAppliedEvent>()
            .add_event::<StatusRemovedEvent>()
            .add_event::<CombatantDeathEvent>()
            .configure_sets(
                Update,
                (
                    TickPhase::Upkeep,
                    TickPhase::Abilities,
                    TickPhase::Resolution,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                status::tick_status_effects.in_set(TickPhase::Upkeep),
            )
            .add_systems(
                Update,
                (
                    cast::process_cast_requests,
                    abilities::tick_active_abilities,
                    projectiles::advance_projectiles,
                )
                    .chain()
                    .in_set(TickPhase::Abilities),
            )
            .add_systems(
                Update,
                (process_deaths, advance_tick)
                    .chain()
                    .in_set(TickPhase::Resolution),
            );
    }
}

/// Mark freshly dead combatants, clear their status effects and log the
/// death once. Killer attribution comes from this tick's killing-blow
/// damage events.
pub fn process_deaths(
    mut combat_log: ResMut<CombatLog>,
    mut damage_events: EventReader<DamageDealtEvent>,
    mut death_events: EventWriter<CombatantDeathEvent>,
    mut status_removed: EventWriter<StatusRemovedEvent>,
    mut combatants: Query<(Entity, &mut Combatant, &mut StatusEffects)>,
) {
    // Last attributable killing blow per victim this tick.
    let mut killers: std::collections::HashMap<Entity, Entity> = std::collections::HashMap::new();
    for event in damage_events.read() {
        if event.killing_blow {
            if let Some(source) = event.source {
                killers.insert(event.target, source);
            }
        }
    }

    let names: std::collections::HashMap<Entity, String> = combatants
        .iter()
        .map(|(entity, combatant, _)| (entity, combatant.name.clone()))
        .collect();

    for (entity, mut combatant, mut statuses) in combatants.iter_mut() {
        if combatant.is_dead || combatant.current_health() > 0.0 {
            continue;
        }
        combatant.is_dead = true;

        // Status effects die with their owner.
        let carried: Vec<_> = statuses.effects.drain(..).collect();
        for effect in carried {
            status_removed.send(StatusRemovedEvent {
                target: entity,
                kind: effect.kind,
                reason: StatusRemovalReason::TargetDied,
            });
        }

        let killer = killers.get(&entity).copied();
        let killer_name = killer.and_then(|k| names.get(&k).cloned());
        combat_log.log_death(
            combatant.name.clone(),
            killer_name.clone(),
            match killer_name {
                Some(k) => format!("{} was slain by {}", combatant.name, k),
                None => format!("{} died", combatant.name),
            },
        );
        death_events.send(CombatantDeathEvent {
            victim: entity,
            killer,
        });
    }
}

/// Advance the global tick counter. Runs last, so every system in a
/// given update observes the same tick value.
pub fn advance_tick(mut tick: ResMut<TickCount>, mut combat_log: ResMut<CombatLog>) {
    tick.0 += 1;
    combat_log.tick = tick.0;
}

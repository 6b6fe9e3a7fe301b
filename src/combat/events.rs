//! Combat events
//!
//! Bevy events emitted by the engine's only world-mutation points. They
//! are the pluggable extension surface: a host that wants to react to
//! damage (cooldown refunds, kill tracking, scoring) registers readers
//! instead of patching engine internals.

use bevy::prelude::*;

use crate::engine::abilities::AbilityKind;
use crate::engine::status::StatusKind;
use crate::engine::weapon::DamageKind;

/// Fired every time damage lands on a combatant.
#[derive(Event, Debug, Clone)]
pub struct DamageDealtEvent {
    /// Entity credited with the damage (None for unattributed ticks)
    pub source: Option<Entity>,
    /// Entity receiving the damage
    pub target: Entity,
    /// Health actually lost, after mitigation
    pub amount: f32,
    pub kind: DamageKind,
    /// Ability or effect name the damage is attributed to
    pub ability: Option<String>,
    /// True if this hit dropped the target to zero
    pub killing_blow: bool,
}

/// Fired when an ability cast passes validation and its instance starts.
#[derive(Event, Debug, Clone)]
pub struct AbilityStartedEvent {
    pub caster: Entity,
    pub kind: AbilityKind,
}

/// Fired when an ability instance reaches a terminal phase.
#[derive(Event, Debug, Clone)]
pub struct AbilityEndedEvent {
    pub caster: Entity,
    pub kind: AbilityKind,
    pub cancelled: bool,
}

/// Fired when a status effect lands on a combatant.
#[derive(Event, Debug, Clone)]
pub struct StatusAppliedEvent {
    pub source: Option<Entity>,
    pub target: Entity,
    pub kind: StatusKind,
}

/// Why a status effect went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRemovalReason {
    /// Duration expired
    Expired,
    /// Force-removed, e.g. a stronger tier superseding a weaker one
    Superseded,
    /// Target died
    TargetDied,
}

/// Fired when a status effect is removed.
#[derive(Event, Debug, Clone)]
pub struct StatusRemovedEvent {
    pub target: Entity,
    pub kind: StatusKind,
    pub reason: StatusRemovalReason,
}

/// Fired when a combatant dies.
#[derive(Event, Debug, Clone)]
pub struct CombatantDeathEvent {
    pub victim: Entity,
    /// Entity that dealt the killing blow, when attributable
    pub killer: Option<Entity>,
}

//! Status Effects
//!
//! Timed effects attached to a combatant: crowd control (stagger, stun),
//! damage over time (burning, laceration) and transformation buffs with
//! periodic regeneration. Includes:
//! - stacking policies (refresh in place, replace if stronger, independent)
//! - sub-interval pulse timers so DOTs hit every Nth tick, not every tick
//! - expiry driven purely by remaining-tick countdown
//!
//! `tick_status_effects` must run exactly once per simulation tick for
//! every effect owner; there is no external timer.

use bevy::prelude::*;

use crate::combat::events::{DamageDealtEvent, StatusRemovalReason, StatusRemovedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::engine::components::Combatant;
use crate::engine::effects::EffectSink;
use crate::engine::weapon::DamageKind;

/// Ticks between damage pulses for burn and bleed effects. Bounds combat
/// log volume: a DOT logs once per second of simulation, not per tick.
pub const DOT_PULSE_INTERVAL: u32 = 60;

/// Tagged status variants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StatusKind {
    /// Brief incapacitation from a heavy hit.
    Stagger,
    /// Longer incapacitation from a point-blank blast.
    Stunned,
    /// Fire damage over time; independent stacks coexist.
    Burning,
    /// Bleeding wound from a void-edged slash.
    Lacerated,
    /// Transformation, first tier: stronger strikes, slow regeneration.
    Overdrive,
    /// Transformation, second tier: replaces Overdrive outright.
    Transcendence,
}

impl StatusKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::Stagger => "Stagger",
            StatusKind::Stunned => "Stunned",
            StatusKind::Burning => "Burning",
            StatusKind::Lacerated => "Lacerated",
            StatusKind::Overdrive => "Overdrive",
            StatusKind::Transcendence => "Transcendence",
        }
    }

    pub fn is_transformation(&self) -> bool {
        matches!(self, StatusKind::Overdrive | StatusKind::Transcendence)
    }

    /// Whether the owner cannot act while this effect is present.
    pub fn incapacitates(&self) -> bool {
        matches!(self, StatusKind::Stagger | StatusKind::Stunned)
    }
}

/// What happens when an effect is applied on top of an existing instance
/// of the same kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StackingPolicy {
    /// Reset the existing instance's duration and magnitude; never a
    /// second instance.
    Refresh,
    /// Keep whichever instance is stronger.
    ReplaceIfStronger,
    /// Instances coexist and age independently.
    Independent,
}

/// Result of an application, for logging.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ApplyOutcome {
    Added,
    Refreshed,
    Replaced,
    RejectedWeaker,
}

/// One active effect on a combatant.
#[derive(Clone, Debug)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Magnitude; meaning depends on kind (damage per pulse for DOTs,
    /// stagger strength for CC).
    pub severity: f32,
    pub remaining_ticks: u32,
    pub stacking: StackingPolicy,
    /// Who applied the effect, for damage attribution.
    pub source: Option<Entity>,
    /// Ticks between periodic pulses; 0 disables pulsing.
    pub pulse_interval: u32,
    pub ticks_until_pulse: u32,
    pub pulses_done: u32,
    /// Outgoing damage multiplier granted while active (transformations).
    pub damage_multiplier: f32,
}

impl StatusEffect {
    fn base(kind: StatusKind, severity: f32, duration: u32, stacking: StackingPolicy) -> Self {
        Self {
            kind,
            severity,
            remaining_ticks: duration,
            stacking,
            source: None,
            pulse_interval: 0,
            ticks_until_pulse: 0,
            pulses_done: 0,
            damage_multiplier: 1.0,
        }
    }

    pub fn with_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    pub fn stagger(severity: f32) -> Self {
        Self::base(StatusKind::Stagger, severity, 120, StackingPolicy::Refresh)
    }

    pub fn stunned(duration: u32) -> Self {
        Self::base(StatusKind::Stunned, 1.0, duration, StackingPolicy::Refresh)
    }

    /// A burn stack: `severity` damage every pulse for `duration` ticks.
    pub fn burning(severity: f32, duration: u32) -> Self {
        let mut effect = Self::base(
            StatusKind::Burning,
            severity,
            duration,
            StackingPolicy::Independent,
        );
        effect.pulse_interval = DOT_PULSE_INTERVAL;
        effect.ticks_until_pulse = DOT_PULSE_INTERVAL;
        effect
    }

    /// The bleeding brand left by a void-edged slash.
    pub fn lacerated() -> Self {
        let mut effect = Self::base(StatusKind::Lacerated, 0.5, 400, StackingPolicy::Refresh);
        effect.pulse_interval = DOT_PULSE_INTERVAL;
        effect.ticks_until_pulse = DOT_PULSE_INTERVAL;
        effect
    }

    /// Transformation tier 1: 30 seconds, heals the worst wound by 2
    /// every second.
    pub fn overdrive(damage_multiplier: f32) -> Self {
        let mut effect = Self::base(
            StatusKind::Overdrive,
            1.0,
            1800,
            StackingPolicy::ReplaceIfStronger,
        );
        effect.pulse_interval = 60;
        effect.ticks_until_pulse = 60;
        effect.damage_multiplier = damage_multiplier;
        effect
    }

    /// Transformation tier 2: 60 seconds, heals up to three wounds by 5
    /// every half second, occasionally mends permanent injuries.
    pub fn transcendence(damage_multiplier: f32) -> Self {
        let mut effect = Self::base(
            StatusKind::Transcendence,
            1.0,
            3600,
            StackingPolicy::ReplaceIfStronger,
        );
        effect.pulse_interval = 30;
        effect.ticks_until_pulse = 30;
        effect.damage_multiplier = damage_multiplier;
        effect
    }
}

/// Active status effects on a combatant.
#[derive(Component, Default, Debug)]
pub struct StatusEffects {
    pub effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Apply an effect under its stacking policy.
    pub fn apply(&mut self, effect: StatusEffect) -> ApplyOutcome {
        match effect.stacking {
            StackingPolicy::Independent => {
                self.effects.push(effect);
                ApplyOutcome::Added
            }
            StackingPolicy::Refresh => {
                if let Some(existing) = self
                    .effects
                    .iter_mut()
                    .find(|e| e.kind == effect.kind)
                {
                    existing.remaining_ticks = effect.remaining_ticks;
                    existing.severity = effect.severity;
                    existing.source = effect.source;
                    ApplyOutcome::Refreshed
                } else {
                    self.effects.push(effect);
                    ApplyOutcome::Added
                }
            }
            StackingPolicy::ReplaceIfStronger => {
                if let Some(index) = self.effects.iter().position(|e| e.kind == effect.kind) {
                    if self.effects[index].damage_multiplier <= effect.damage_multiplier {
                        self.effects[index] = effect;
                        ApplyOutcome::Replaced
                    } else {
                        ApplyOutcome::RejectedWeaker
                    }
                } else {
                    self.effects.push(effect);
                    ApplyOutcome::Added
                }
            }
        }
    }

    /// Force-remove every instance of `kind`. Returns true if anything
    /// was removed. Used by the transformation upgrade path, which must
    /// drop the weaker tier before the stronger one lands.
    pub fn remove(&mut self, kind: StatusKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        self.effects.len() != before
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn count(&self, kind: StatusKind) -> usize {
        self.effects.iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_incapacitated(&self) -> bool {
        self.effects.iter().any(|e| e.kind.incapacitates())
    }

    /// Outgoing damage multiplier from active transformations. Tiers do
    /// not stack (the upgrade path removes the weaker one), so the
    /// strongest present instance wins.
    pub fn damage_multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind.is_transformation())
            .map(|e| e.damage_multiplier)
            .fold(1.0, f32::max)
    }
}

/// Per-tick status processing: pulse DOT damage and regeneration, count
/// durations down, drop expired instances.
pub fn tick_status_effects(
    mut owners: Query<(Entity, &mut Combatant, &mut StatusEffects)>,
    mut combat_log: ResMut<CombatLog>,
    mut effect_sink: ResMut<EffectSink>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut removed_events: EventWriter<StatusRemovedEvent>,
) {
    // Damage credited to effect sources, applied after the main pass so
    // a burning caster and its burning victim never alias.
    let mut source_credit: Vec<(Entity, f32)> = Vec::new();

    // Name snapshot for attribution lines in the log.
    let names: std::collections::HashMap<Entity, String> = owners
        .iter()
        .map(|(entity, combatant, _)| (entity, combatant.name.clone()))
        .collect();

    for (entity, mut combatant, mut statuses) in owners.iter_mut() {
        if !combatant.is_alive() {
            continue;
        }

        let mut pulses: Vec<(StatusKind, f32, Option<Entity>, u32)> = Vec::new();
        for effect in statuses.effects.iter_mut() {
            if effect.pulse_interval > 0 {
                effect.ticks_until_pulse = effect.ticks_until_pulse.saturating_sub(1);
                if effect.ticks_until_pulse == 0 {
                    effect.ticks_until_pulse = effect.pulse_interval;
                    effect.pulses_done += 1;
                    pulses.push((effect.kind, effect.severity, effect.source, effect.pulses_done));
                }
            }
            effect.remaining_ticks = effect.remaining_ticks.saturating_sub(1);
        }

        for (kind, severity, source, pulse_count) in pulses {
            match kind {
                StatusKind::Burning | StatusKind::Lacerated => {
                    let actual = combatant.take_injury(severity, false);
                    if actual > 0.0 {
                        if let Some(source) = source {
                            source_credit.push((source, actual));
                        }
                        let source_name = source
                            .and_then(|s| names.get(&s).cloned())
                            .unwrap_or_else(|| kind.name().to_string());
                        let killing_blow = !combatant.is_alive();
                        combat_log.log_damage(
                            source_name.clone(),
                            combatant.name.clone(),
                            kind.name().to_string(),
                            actual,
                            killing_blow,
                            format!(
                                "{}'s {} ticks for {:.1} damage on {}",
                                source_name,
                                kind.name(),
                                actual,
                                combatant.name
                            ),
                        );
                        damage_events.send(DamageDealtEvent {
                            source,
                            target: entity,
                            amount: actual,
                            kind: if kind == StatusKind::Burning {
                                DamageKind::Burn
                            } else {
                                DamageKind::Cut
                            },
                            ability: Some(kind.name().to_string()),
                            killing_blow,
                        });
                        effect_sink.request_floating_text(entity, format!("{:.0}", actual));
                    }
                }
                StatusKind::Overdrive => {
                    combatant.heal_most_severe(2.0, 1, false);
                }
                StatusKind::Transcendence => {
                    combatant.heal_most_severe(5.0, 3, false);
                    // Every 6th pulse (3 seconds) also mends one
                    // permanent injury a little.
                    if pulse_count % 6 == 0 {
                        combatant.heal_most_severe(2.0, 1, true);
                    }
                }
                StatusKind::Stagger | StatusKind::Stunned => {}
            }
        }

        // Expire.
        let mut expired: Vec<StatusKind> = Vec::new();
        statuses.effects.retain(|e| {
            if e.remaining_ticks == 0 {
                expired.push(e.kind);
                false
            } else {
                true
            }
        });
        for kind in expired {
            combat_log.log(
                CombatLogEventType::StatusRemoved,
                format!("{} fades from {}", kind.name(), combatant.name),
            );
            removed_events.send(StatusRemovedEvent {
                target: entity,
                kind,
                reason: StatusRemovalReason::Expired,
            });
        }
    }

    for (source, amount) in source_credit {
        if let Ok((_, mut source_combatant, _)) = owners.get_mut(source) {
            source_combatant.damage_dealt += amount;
        }
    }
}

//! Combat logging
//!
//! Records all combat events for display and post-run analysis. Entries
//! carry the tick they happened on, a human-readable message and, for
//! damage and deaths, structured data that the aggregation queries and
//! the JSON export work from.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identifier of a combatant in the log ("Raider A").
pub type CombatantId = String;

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Ability cast accepted
    AbilityCast,
    /// Ability cast rejected during validation
    CastRejected,
    /// Ability instance cancelled mid-flight
    AbilityCancelled,
    /// Ability instance completed
    AbilityComplete,
    /// Status effect applied
    StatusApplied,
    /// Status effect removed
    StatusRemoved,
    /// Combatant died
    Death,
    /// Simulation event (run start, run end, ...)
    SimEvent,
}

/// Structured payload attached to entries that feed the aggregations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StructuredEventData {
    Damage {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        killing_blow: bool,
    },
    Death {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
}

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Tick the event happened on
    pub tick: u64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Structured payload, where applicable
    pub data: Option<StructuredEventData>,
}

/// The combat log resource storing all events
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation tick, advanced by the engine once per step
    pub tick: u64,
}

/// Everything the JSON export needs beyond the raw entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimMetadata {
    pub scenario_name: String,
    pub ticks_run: u64,
    pub random_seed: Option<u64>,
}

#[derive(Serialize)]
struct ExportedLog<'a> {
    metadata: &'a SimMetadata,
    entries: &'a [CombatLogEntry],
}

impl CombatLog {
    /// Clear the log for a new run
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tick = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            tick: self.tick,
            event_type,
            message,
            data: None,
        });
    }

    /// Log a damage event with structured data for aggregation.
    pub fn log_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        killing_blow: bool,
        message: String,
    ) {
        self.entries.push(CombatLogEntry {
            tick: self.tick,
            event_type: CombatLogEventType::Damage,
            message,
            data: Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                killing_blow,
            }),
        });
    }

    /// Log a death with killer tracking.
    pub fn log_death(&mut self, victim: CombatantId, killer: Option<CombatantId>, message: String) {
        self.entries.push(CombatLogEntry {
            tick: self.tick,
            event_type: CombatLogEventType::Death,
            message,
            data: Some(StructuredEventData::Death { victim, killer }),
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Total damage dealt by `source`, grouped by ability name.
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for entry in &self.entries {
            if let Some(StructuredEventData::Damage {
                source: s,
                ability,
                amount,
                ..
            }) = &entry.data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    /// Number of killing blows landed by `source`.
    pub fn killing_blows_by(&self, source: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    &e.data,
                    Some(StructuredEventData::Damage {
                        source: s,
                        killing_blow: true,
                        ..
                    }) if s == source
                )
            })
            .count()
    }

    /// Serialize the log (with run metadata) to pretty JSON.
    pub fn to_json(&self, metadata: &SimMetadata) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ExportedLog {
            metadata,
            entries: &self.entries,
        })
    }

    /// Save the log to a JSON file. Returns the path written.
    pub fn save_to_file(
        &self,
        metadata: &SimMetadata,
        path: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let json = self.to_json(metadata)?;
        std::fs::write(path, json)?;
        Ok(path.to_string())
    }
}

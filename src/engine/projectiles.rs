//! Projectile Entities
//!
//! Barrage and volley abilities emit projectile entities that outlive the
//! tick that launched them:
//! - `Piercing`: a slash wave traveling cell by cell down a precomputed
//!   line, damaging each pawn it passes at most once
//! - `Falling`: a summoned blade, orb or bullet that hangs over a cell
//!   for a short delay and then strikes a small radius
//!
//! Damage templates are resolved at launch (the structural snapshot), so
//! a weapon swapped mid-flight does not retroactively change a wave that
//! already left the caster.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::combat::events::DamageDealtEvent;
use crate::combat::log::CombatLog;
use crate::settings::AbilitySettings;

use super::components::{Combatant, GameRng};
use super::damage::{self, DamageSpec};
use super::effects::{EffectSink, SoundKind, VisualKind};
use super::grid::{Cell, GridPos, MapGrid, PawnSnapshot, WorldView};
use super::path::PlannedPath;
use super::status::{StatusEffect, StatusEffects};
use super::targeting;

/// How a projectile moves and strikes.
#[derive(Debug)]
pub enum ProjectileMotion {
    /// Travels the path one cell per `step_interval` ticks, striking
    /// pawns in the cells it enters.
    Piercing {
        path: PlannedPath,
        step_interval: u32,
    },
    /// Hangs over `cell` for `delay_ticks`, then strikes everything
    /// within `impact_radius`.
    Falling {
        cell: Cell,
        delay_ticks: u32,
        impact_radius: f32,
        /// Chance to set each struck pawn burning
        burn_chance: f32,
    },
}

/// Launch description handed from an ability tick to the ECS.
#[derive(Debug)]
pub struct ProjectileSpawn {
    pub source: Entity,
    pub source_faction: u8,
    /// Ability name for attribution and logging
    pub label: String,
    pub spec: DamageSpec,
    pub motion: ProjectileMotion,
}

impl ProjectileSpawn {
    pub fn into_component(self) -> Projectile {
        Projectile {
            source: self.source,
            source_faction: self.source_faction,
            label: self.label,
            spec: self.spec,
            motion: self.motion,
            ticks_since_step: 0,
            already_hit: HashSet::new(),
        }
    }
}

/// An in-flight projectile.
#[derive(Component, Debug)]
pub struct Projectile {
    pub source: Entity,
    pub source_faction: u8,
    pub label: String,
    pub spec: DamageSpec,
    pub motion: ProjectileMotion,
    ticks_since_step: u32,
    /// Pawns already struck by this projectile (piercing only)
    already_hit: HashSet<Entity>,
}

/// Advance every projectile by one tick and resolve impacts.
pub fn advance_projectiles(
    mut commands: Commands,
    grid: Res<MapGrid>,
    settings: Res<AbilitySettings>,
    mut rng: ResMut<GameRng>,
    mut combat_log: ResMut<CombatLog>,
    mut effect_sink: ResMut<EffectSink>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
    mut pawns: Query<(Entity, &GridPos, &mut Combatant, &mut StatusEffects)>,
) {
    // Occupancy snapshot, rebuilt once per tick for all projectiles.
    let mut occupants: HashMap<Cell, Entity> = HashMap::new();
    let mut snapshots: HashMap<Entity, PawnSnapshot> = HashMap::new();
    let mut names: HashMap<Entity, String> = HashMap::new();
    for (entity, pos, combatant, _) in pawns.iter() {
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

    // Hits to apply after iteration: (projectile data is borrowed while
    // we walk the query, and a strike can kill the pawn being iterated).
    struct Hit {
        source: Entity,
        target: Entity,
        spec: DamageSpec,
        label: String,
        burn: bool,
    }
    let mut hits: Vec<Hit> = Vec::new();
    let mut despawn: Vec<Entity> = Vec::new();

    for (projectile_entity, mut projectile) in projectiles.iter_mut() {
        let view = WorldView::new(&grid, &occupants, &snapshots);
        let projectile = &mut *projectile;
        projectile.ticks_since_step += 1;

        match &mut projectile.motion {
            ProjectileMotion::Piercing {
                path,
                step_interval,
            } => {
                if projectile.ticks_since_step < *step_interval {
                    continue;
                }
                projectile.ticks_since_step = 0;

                let Some(cell) = path.advance() else {
                    despawn.push(projectile_entity);
                    continue;
                };
                if !view.in_bounds(cell) {
                    despawn.push(projectile_entity);
                    continue;
                }
                effect_sink.request_visual(VisualKind::SlashArc, cell, 1.0);

                if let Some(target) = view.occupant_at(cell) {
                    if targeting::should_target(
                        projectile.source,
                        projectile.source_faction,
                        target,
                        &view,
                        &settings,
                    ) && !projectile.already_hit.contains(&target)
                    {
                        projectile.already_hit.insert(target);
                        hits.push(Hit {
                            source: projectile.source,
                            target,
                            spec: projectile.spec.clone(),
                            label: projectile.label.clone(),
                            burn: false,
                        });
                    }
                }
                if path.finished() {
                    despawn.push(projectile_entity);
                }
            }
            ProjectileMotion::Falling {
                cell,
                delay_ticks,
                impact_radius,
                burn_chance,
            } => {
                if projectile.ticks_since_step < *delay_ticks {
                    continue;
                }
                let cell = *cell;
                let radius = *impact_radius;
                let burn_chance = *burn_chance;

                effect_sink.request_visual(VisualKind::Flash, cell, 1.0 + radius * 0.5);
                effect_sink.request_sound(SoundKind::BurstImpact, cell);

                let filter = targeting::TargetFilter::from_settings(
                    projectile.source,
                    projectile.source_faction,
                    &settings,
                );
                // Snapshot candidates before applying damage.
                let struck = if radius <= 0.0 {
                    view.occupant_at(cell)
                        .filter(|t| filter.passes(*t, &view))
                        .into_iter()
                        .collect::<Vec<_>>()
                } else {
                    targeting::collect_in_radius(cell, radius, &filter, &view)
                };
                for target in struck {
                    let burn = burn_chance > 0.0 && rng.chance(burn_chance);
                    hits.push(Hit {
                        source: projectile.source,
                        target,
                        spec: projectile.spec.clone(),
                        label: projectile.label.clone(),
                        burn,
                    });
                }
                despawn.push(projectile_entity);
            }
        }
    }

    for hit in hits {
        let Ok((_, pos, mut target_combatant, mut statuses)) = pawns.get_mut(hit.target) else {
            continue;
        };
        if !target_combatant.is_alive() {
            continue;
        }
        let actual = damage::inflict(&mut target_combatant, &hit.spec);
        let killing_blow = !target_combatant.is_alive();
        let target_name = target_combatant.name.clone();
        let target_cell = pos.0;
        if hit.burn {
            statuses.apply(StatusEffect::burning(2.0, 300).with_source(hit.source));
        }
        drop(target_combatant);
        drop(statuses);

        if let Ok((_, _, mut source_combatant, _)) = pawns.get_mut(hit.source) {
            source_combatant.damage_dealt += actual;
        }

        let source_name = names
            .get(&hit.source)
            .cloned()
            .unwrap_or_else(|| hit.label.clone());
        combat_log.log_damage(
            source_name.clone(),
            target_name.clone(),
            hit.label.clone(),
            actual,
            killing_blow,
            format!(
                "{}'s {} strikes {} for {:.0} damage",
                source_name, hit.label, target_name, actual
            ),
        );
        damage_events.send(DamageDealtEvent {
            source: Some(hit.source),
            target: hit.target,
            amount: actual,
            kind: hit.spec.kind,
            ability: Some(hit.label),
            killing_blow,
        });
        effect_sink.request_visual(VisualKind::ImpactSpark, target_cell, 1.0);
        effect_sink.request_floating_text(hit.target, format!("{:.0}", actual));
    }

    for entity in despawn {
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::path::{plan_path, PathMode};
    use crate::engine::weapon::DamageKind;

    #[test]
    fn test_spawn_into_component_carries_spec() {
        let spawn = ProjectileSpawn {
            source: Entity::from_raw(1),
            source_faction: 1,
            label: "Arc Wave".to_string(),
            spec: damage::fixed(10, DamageKind::Cut, 0.1),
            motion: ProjectileMotion::Falling {
                cell: Cell::new(3, 3),
                delay_ticks: 10,
                impact_radius: 1.5,
                burn_chance: 0.0,
            },
        };
        let projectile = spawn.into_component();
        assert_eq!(projectile.spec.amount, 10);
        assert!(projectile.already_hit.is_empty());
    }

    #[test]
    fn test_piercing_path_snapshot_is_immutable() {
        let grid = MapGrid::new(10, 10);
        let occ = HashMap::new();
        let pawns = HashMap::new();
        let view = WorldView::new(&grid, &occ, &pawns);
        let path = plan_path(Cell::new(0, 0), Cell::new(5, 0), PathMode::Bypassing, 25, &view);

        let spawn = ProjectileSpawn {
            source: Entity::from_raw(1),
            source_faction: 1,
            label: "Arc Wave".to_string(),
            spec: damage::fixed(10, DamageKind::Cut, 0.1),
            motion: ProjectileMotion::Piercing {
                path,
                step_interval: 1,
            },
        };
        let projectile = spawn.into_component();
        match &projectile.motion {
            ProjectileMotion::Piercing { path, .. } => assert_eq!(path.len(), 5),
            _ => panic!("expected piercing motion"),
        }
    }
}

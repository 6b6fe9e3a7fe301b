//! Area Targeting
//!
//! Collects candidate targets for area abilities:
//! - `collect_in_radius`: everything within a circular radius, gathered by
//!   expanding rings and deduplicated
//! - `collect_in_cone`: a triangular cone approximation on the square grid,
//!   with an exact angle check against the cone axis
//!
//! Both run over the per-tick `WorldView` snapshot and share one filter,
//! so friendly-fire rules behave identically for dashes, blasts and cones.

use bevy::prelude::*;

use crate::settings::AbilitySettings;

use super::grid::{Cell, WorldView};
use super::path::ring_cells;

/// How a collection treats pawns that are not hostile to the caster.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FriendlyFire {
    /// Apply the relationship gate: allied pawns are excluded.
    Gate,
    /// Hit anything alive in the area regardless of faction.
    Ignore,
}

/// The shared inclusion filter for area collections.
///
/// Composes liveness (dead and downed pawns are never targets), identity
/// (the caster never targets itself) and the optional relationship gate.
#[derive(Clone, Copy, Debug)]
pub struct TargetFilter {
    pub caster: Entity,
    pub caster_faction: u8,
    pub friendly_fire: FriendlyFire,
}

impl TargetFilter {
    pub fn new(caster: Entity, caster_faction: u8, friendly_fire: FriendlyFire) -> Self {
        Self {
            caster,
            caster_faction,
            friendly_fire,
        }
    }

    /// Build the filter from engine settings: the friendly-fire gate is
    /// active when the user has friendly fire disabled.
    pub fn from_settings(caster: Entity, caster_faction: u8, settings: &AbilitySettings) -> Self {
        let friendly_fire = if settings.disable_friendly_fire {
            FriendlyFire::Gate
        } else {
            FriendlyFire::Ignore
        };
        Self::new(caster, caster_faction, friendly_fire)
    }

    pub fn passes(&self, target: Entity, view: &WorldView) -> bool {
        if target == self.caster {
            return false;
        }
        let Some(pawn) = view.pawn(target) else {
            return false;
        };
        if !pawn.alive || pawn.downed {
            return false;
        }
        if self.friendly_fire == FriendlyFire::Gate && pawn.faction == self.caster_faction {
            return false;
        }
        true
    }
}

/// Collect all valid targets within `radius` of `center`.
///
/// Iterates concentric rings outward so near targets are discovered first,
/// but the returned collection is unordered; callers that care about
/// distance sort explicitly.
pub fn collect_in_radius(
    center: Cell,
    radius: f32,
    filter: &TargetFilter,
    view: &WorldView,
) -> Vec<Entity> {
    let mut found = Vec::new();
    let max_ring = radius.ceil() as i32;

    for ring in 0..=max_ring {
        for cell in ring_cells(center, ring) {
            if center.distance_to(cell) > radius {
                continue;
            }
            if let Some(entity) = view.occupant_at(cell) {
                if filter.passes(entity, view) && !found.contains(&entity) {
                    found.push(entity);
                }
            }
        }
    }
    found
}

/// Cells inside a cone of `half_angle_deg` around the direction from
/// `origin` toward `toward`, out to `max_range` cells.
///
/// For each integer distance step the cone's half-width is
/// `distance * tan(half_angle)`; the perpendicular line of cells at that
/// width is scanned and a cell is kept only when the exact angle between
/// its direction from the origin and the cone axis is within the half
/// angle. The boundary is inclusive: a cell sitting exactly on the half
/// angle belongs to the cone.
pub fn cone_cells(
    origin: Cell,
    toward: Cell,
    half_angle_deg: f32,
    max_range: i32,
    view: &WorldView,
) -> Vec<Cell> {
    let mut cells = Vec::new();
    let Some((dir_x, dir_z)) = origin.direction_to(toward) else {
        return cells;
    };
    let half_angle_rad = half_angle_deg.to_radians();
    let half_width_per_cell = half_angle_rad.tan();
    // Perpendicular to the axis, for the line scan at each distance.
    let (perp_x, perp_z) = (-dir_z, dir_x);

    for distance in 1..=max_range {
        let base_x = origin.x as f32 + dir_x * distance as f32;
        let base_z = origin.z as f32 + dir_z * distance as f32;
        let half_width = (distance as f32 * half_width_per_cell).ceil() as i32;

        for offset in -half_width..=half_width {
            let cell = Cell::new(
                (base_x + perp_x * offset as f32).round() as i32,
                (base_z + perp_z * offset as f32).round() as i32,
            );
            if !view.in_bounds(cell) || cell == origin || cells.contains(&cell) {
                continue;
            }
            let Some((cx, cz)) = origin.direction_to(cell) else {
                continue;
            };
            let dot = (dir_x * cx + dir_z * cz).clamp(-1.0, 1.0);
            let angle = dot.acos();
            if angle <= half_angle_rad + f32::EPSILON {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Collect all valid targets inside a cone (see [`cone_cells`]).
pub fn collect_in_cone(
    origin: Cell,
    toward: Cell,
    half_angle_deg: f32,
    max_range: i32,
    filter: &TargetFilter,
    view: &WorldView,
) -> Vec<Entity> {
    let mut found = Vec::new();
    for cell in cone_cells(origin, toward, half_angle_deg, max_range, view) {
        if let Some(entity) = view.occupant_at(cell) {
            if filter.passes(entity, view) && !found.contains(&entity) {
                found.push(entity);
            }
        }
    }
    found
}

/// The relationship gate shared by damage sweeps and status application:
/// never the caster itself, never a dead or downed pawn, and never an
/// allied pawn while friendly fire is disabled.
pub fn should_target(
    caster: Entity,
    caster_faction: u8,
    target: Entity,
    view: &WorldView,
    settings: &AbilitySettings,
) -> bool {
    TargetFilter::from_settings(caster, caster_faction, settings).passes(target, view)
}

/// Nearest hostile pawn to `from`, used by barrage waves that re-acquire
/// a target each emission.
pub fn nearest_hostile(
    from: Cell,
    caster: Entity,
    caster_faction: u8,
    view: &WorldView,
) -> Option<(Entity, Cell)> {
    view.pawns
        .iter()
        .filter(|(entity, pawn)| {
            **entity != caster && pawn.alive && !pawn.downed && pawn.faction != caster_faction
        })
        .min_by(|(_, a), (_, b)| {
            from.distance_to(a.cell)
                .partial_cmp(&from.distance_to(b.cell))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(entity, pawn)| (*entity, pawn.cell))
}

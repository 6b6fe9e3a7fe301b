//! Path Planning for Dash and Teleport Abilities
//!
//! Dash abilities move a caster cell by cell along a straight line computed
//! once at phase entry. Two modes exist:
//! - `Respecting`: the path stops at the first cell a pawn could not stand
//!   on, so the dash halts in front of walls
//! - `Bypassing`: every in-bounds cell on the line is kept regardless of
//!   walkability, for abilities that cut straight through obstacles
//!
//! Also provides the safe-landing search used by every teleporting ability:
//! the nearest cell around a preferred destination that is in bounds,
//! standable, unoccupied and free of hazards.

use bevy::prelude::*;
use smallvec::SmallVec;

use super::components::GameRng;
use super::grid::{Cell, WorldView};

/// How a planned path treats obstacles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathMode {
    /// Truncate at the first non-standable cell.
    Respecting,
    /// Keep every in-bounds cell; walkability is ignored.
    Bypassing,
}

/// An ordered cell sequence computed once and consumed via a cursor.
///
/// Cells are in bounds at computation time but the world can change under
/// the path; consumers re-check each cell before acting on it.
#[derive(Clone, Debug)]
pub struct PlannedPath {
    cells: SmallVec<[Cell; 16]>,
    mode: PathMode,
    cursor: usize,
}

impl PlannedPath {
    /// Build a path directly from cells, for single-hop teleports where
    /// no line needs rasterizing.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>, mode: PathMode) -> Self {
        Self {
            cells: cells.into_iter().collect(),
            mode,
            cursor: 0,
        }
    }

    pub fn mode(&self) -> PathMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Next cell to step onto, without consuming it.
    pub fn peek(&self) -> Option<Cell> {
        self.cells.get(self.cursor).copied()
    }

    /// Consume and return the next cell.
    pub fn advance(&mut self) -> Option<Cell> {
        let cell = self.peek()?;
        self.cursor += 1;
        Some(cell)
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn finished(&self) -> bool {
        self.cursor >= self.cells.len()
    }
}

/// Integer line rasterization from `from` to `to` (a Bresenham walk),
/// excluding the starting cell. The destination cell is included.
pub fn line_cells(from: Cell, to: Cell) -> Vec<Cell> {
    let mut cells = Vec::new();
    if from == to {
        return cells;
    }

    let dx = (to.x - from.x).abs();
    let dz = (to.z - from.z).abs();
    let step_x = if to.x > from.x { 1 } else { -1 };
    let step_z = if to.z > from.z { 1 } else { -1 };
    let mut err = dx - dz;
    let mut x = from.x;
    let mut z = from.z;

    loop {
        let e2 = err * 2;
        if e2 > -dz {
            err -= dz;
            x += step_x;
        }
        if e2 < dx {
            err += dx;
            z += step_z;
        }
        cells.push(Cell::new(x, z));
        if x == to.x && z == to.z {
            break;
        }
    }
    cells
}

/// Compute a dash path from `origin` toward `dest`, truncated to at most
/// `max_len` cells and filtered by `mode`.
pub fn plan_path(
    origin: Cell,
    dest: Cell,
    mode: PathMode,
    max_len: usize,
    view: &WorldView,
) -> PlannedPath {
    let mut cells: SmallVec<[Cell; 16]> = SmallVec::new();

    for cell in line_cells(origin, dest).into_iter().take(max_len) {
        if !view.in_bounds(cell) {
            break;
        }
        match mode {
            PathMode::Respecting => {
                if !view.standable(cell) {
                    break;
                }
                cells.push(cell);
            }
            PathMode::Bypassing => cells.push(cell),
        }
    }

    PlannedPath {
        cells,
        mode,
        cursor: 0,
    }
}

/// Plan a dash that targets an occupied cell: the path stops one cell
/// short so the caster lands adjacent to the target rather than on top of
/// it. If that leaves no path (the caster is already adjacent), the caller
/// falls back to `find_safe_landing` around the target with radius 1.
pub fn plan_path_to_entity(
    origin: Cell,
    target_cell: Cell,
    mode: PathMode,
    max_len: usize,
    view: &WorldView,
) -> PlannedPath {
    let mut path = plan_path(origin, target_cell, mode, max_len, view);
    if path.cells.last() == Some(&target_cell) {
        path.cells.pop();
    }
    path
}

/// Cells forming the square ring at exactly `radius` around `center`,
/// in a fixed scan order. Radius 0 yields just the center.
pub fn ring_cells(center: Cell, radius: i32) -> Vec<Cell> {
    if radius <= 0 {
        return vec![center];
    }
    let mut cells = Vec::with_capacity((radius as usize) * 8);
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            if dx.abs().max(dz.abs()) == radius {
                cells.push(center.offset(dx, dz));
            }
        }
    }
    cells
}

/// Whether `cell` is a safe teleport destination for `actor`.
///
/// Rejects: out of bounds, non-standable terrain (walls, closed doors,
/// deep water, lava), hazardous-but-walkable terrain (marsh), cells
/// occupied by another pawn, cells forbidden for this actor's faction and
/// cells currently on fire.
pub fn is_safe_landing(cell: Cell, actor: Entity, view: &WorldView) -> bool {
    if !view.in_bounds(cell) {
        return false;
    }
    if !view.standable(cell) {
        return false;
    }
    if view
        .grid
        .terrain(cell)
        .is_some_and(|t| t.hazardous())
    {
        return false;
    }
    if view.grid.forbidden(cell) {
        return false;
    }
    if view.grid.on_fire(cell) {
        return false;
    }
    match view.occupant_at(cell) {
        Some(occupant) if occupant != actor => false,
        _ => true,
    }
}

/// Find the nearest safe landing cell around `preferred`.
///
/// Search order is breadth-first by ring: the exact cell, then its 8
/// neighbors, then full rings of increasing radius up to `max_radius`,
/// then a final wide randomized fallback. Returns `None` when nothing
/// qualifies; callers must reject the cast rather than guess.
pub fn find_safe_landing(
    preferred: Cell,
    actor: Entity,
    max_radius: i32,
    view: &WorldView,
    rng: &mut GameRng,
) -> Option<Cell> {
    if is_safe_landing(preferred, actor, view) {
        return Some(preferred);
    }

    for cell in preferred.adjacent8() {
        if is_safe_landing(cell, actor, view) {
            return Some(cell);
        }
    }

    for radius in 2..=max_radius {
        for cell in ring_cells(preferred, radius) {
            if is_safe_landing(cell, actor, view) {
                return Some(cell);
            }
        }
    }

    // Last resort: random probes in a wider square around the target.
    let wide = max_radius + 3;
    for _ in 0..40 {
        let cell = preferred.offset(
            rng.range_inclusive(-wide, wide),
            rng.range_inclusive(-wide, wide),
        );
        if is_safe_landing(cell, actor, view) {
            return Some(cell);
        }
    }

    None
}

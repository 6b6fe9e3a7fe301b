//! Grid World Model
//!
//! The simulation runs on a rectangular cell grid. This module defines:
//! - `Cell`: an integer grid coordinate
//! - `TerrainKind`: what a cell is made of (floor, wall, water, ...)
//! - `MapGrid`: the terrain layer plus per-cell hazard flags
//! - `WorldView`: a per-tick read-only snapshot combining terrain with
//!   occupancy, used by the pure planners (path, targeting)
//!
//! The grid itself never changes mid-tick; occupancy is captured once per
//! tick by the systems that need it.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A single grid coordinate. The simulation plane uses `x` (east) and
/// `z` (north), matching the world axes of the 3D arena it abstracts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance between cell centers.
    pub fn distance_to(&self, other: Cell) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev_distance(&self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    pub fn offset(&self, dx: i32, dz: i32) -> Cell {
        Cell::new(self.x + dx, self.z + dz)
    }

    /// The 8 immediately adjacent cells, in a fixed scan order.
    pub fn adjacent8(&self) -> [Cell; 8] {
        [
            self.offset(0, 1),
            self.offset(1, 1),
            self.offset(1, 0),
            self.offset(1, -1),
            self.offset(0, -1),
            self.offset(-1, -1),
            self.offset(-1, 0),
            self.offset(-1, 1),
        ]
    }

    /// Direction vector toward `other` as unit-length floats.
    /// Returns `None` when the cells coincide.
    pub fn direction_to(&self, other: Cell) -> Option<(f32, f32)> {
        let dx = (other.x - self.x) as f32;
        let dz = (other.z - self.z) as f32;
        let len = (dx * dx + dz * dz).sqrt();
        if len == 0.0 {
            return None;
        }
        Some((dx / len, dz / len))
    }
}

/// Grid position of a combatant. Movement in this engine is always a
/// teleport-write to this component; there is no physics step.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridPos(pub Cell);

/// Terrain classification for a single cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TerrainKind {
    Floor,
    Rough,
    ShallowWater,
    /// Walkable but never a safe teleport destination.
    Marsh,
    DeepWater,
    Lava,
    Wall,
    ClosedDoor,
    OpenDoor,
}

impl TerrainKind {
    /// Whether a pawn can stand here at all (bounds aside).
    pub fn standable(&self) -> bool {
        matches!(
            self,
            TerrainKind::Floor
                | TerrainKind::Rough
                | TerrainKind::ShallowWater
                | TerrainKind::Marsh
                | TerrainKind::OpenDoor
        )
    }

    /// Whether the terrain is dangerous enough that teleport abilities
    /// refuse to land on it even though it may technically be standable.
    pub fn hazardous(&self) -> bool {
        matches!(
            self,
            TerrainKind::Marsh | TerrainKind::DeepWater | TerrainKind::Lava
        )
    }
}

/// Per-cell state beyond terrain. Kept separate so scenario configs can
/// paint hazards without redefining the terrain layer.
#[derive(Clone, Copy, Default, Debug)]
struct CellFlags {
    on_fire: bool,
    forbidden: bool,
}

/// The terrain layer of the simulated world.
///
/// Cells outside the rectangle are out of bounds; every query treats them
/// as non-standable. The grid is owned by the Bevy world as a resource and
/// only mutated between ticks (scenario setup, door/fire toggles).
#[derive(Resource)]
pub struct MapGrid {
    width: i32,
    height: i32,
    terrain: Vec<TerrainKind>,
    flags: Vec<CellFlags>,
}

impl MapGrid {
    /// Create an all-floor grid of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let count = (width * height) as usize;
        Self {
            width,
            height,
            terrain: vec![TerrainKind::Floor; count],
            flags: vec![CellFlags::default(); count],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some((cell.z * self.width + cell.x) as usize)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    pub fn terrain(&self, cell: Cell) -> Option<TerrainKind> {
        self.index(cell).map(|i| self.terrain[i])
    }

    pub fn set_terrain(&mut self, cell: Cell, kind: TerrainKind) {
        if let Some(i) = self.index(cell) {
            self.terrain[i] = kind;
        }
    }

    /// In bounds and standable terrain. Occupancy is not considered here;
    /// that is the `WorldView`'s job.
    pub fn standable(&self, cell: Cell) -> bool {
        self.terrain(cell).is_some_and(|t| t.standable())
    }

    pub fn on_fire(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.flags[i].on_fire)
    }

    pub fn set_on_fire(&mut self, cell: Cell, burning: bool) {
        if let Some(i) = self.index(cell) {
            self.flags[i].on_fire = burning;
        }
    }

    pub fn forbidden(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.flags[i].forbidden)
    }

    pub fn set_forbidden(&mut self, cell: Cell, forbidden: bool) {
        if let Some(i) = self.index(cell) {
            self.flags[i].forbidden = forbidden;
        }
    }
}

/// Minimal facts about one pawn, captured once per tick for the pure
/// planners. Deliberately small: the planners never see components.
#[derive(Clone, Copy, Debug)]
pub struct PawnSnapshot {
    pub cell: Cell,
    pub faction: u8,
    pub alive: bool,
    pub downed: bool,
}

/// Read-only world snapshot handed to path planning and area targeting.
///
/// Built at the top of a system from the grid resource plus a pass over
/// the combatant query, then borrowed for the rest of the tick. Consumers
/// must treat answers as valid for this tick only.
pub struct WorldView<'a> {
    pub grid: &'a MapGrid,
    pub occupants: &'a HashMap<Cell, Entity>,
    pub pawns: &'a HashMap<Entity, PawnSnapshot>,
}

impl<'a> WorldView<'a> {
    pub fn new(
        grid: &'a MapGrid,
        occupants: &'a HashMap<Cell, Entity>,
        pawns: &'a HashMap<Entity, PawnSnapshot>,
    ) -> Self {
        Self {
            grid,
            occupants,
            pawns,
        }
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.grid.in_bounds(cell)
    }

    pub fn standable(&self, cell: Cell) -> bool {
        self.grid.standable(cell)
    }

    /// The pawn standing in `cell`, if any.
    pub fn occupant_at(&self, cell: Cell) -> Option<Entity> {
        self.occupants.get(&cell).copied()
    }

    pub fn pawn(&self, entity: Entity) -> Option<&PawnSnapshot> {
        self.pawns.get(&entity)
    }

    /// Liveness check used by every targeting filter: present on the map,
    /// not dead, not downed.
    pub fn is_valid_target(&self, entity: Entity) -> bool {
        self.pawns
            .get(&entity)
            .is_some_and(|p| p.alive && !p.downed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_checks() {
        let grid = MapGrid::new(10, 8);
        assert!(grid.in_bounds(Cell::new(0, 0)));
        assert!(grid.in_bounds(Cell::new(9, 7)));
        assert!(!grid.in_bounds(Cell::new(10, 0)));
        assert!(!grid.in_bounds(Cell::new(0, 8)));
        assert!(!grid.in_bounds(Cell::new(-1, 3)));
    }

    #[test]
    fn test_wall_is_not_standable() {
        let mut grid = MapGrid::new(5, 5);
        let wall = Cell::new(2, 2);
        assert!(grid.standable(wall));
        grid.set_terrain(wall, TerrainKind::Wall);
        assert!(!grid.standable(wall));
    }

    #[test]
    fn test_out_of_bounds_is_not_standable() {
        let grid = MapGrid::new(5, 5);
        assert!(!grid.standable(Cell::new(7, 7)));
        assert!(grid.terrain(Cell::new(7, 7)).is_none());
    }

    #[test]
    fn test_marsh_standable_but_hazardous() {
        let mut grid = MapGrid::new(5, 5);
        let c = Cell::new(1, 1);
        grid.set_terrain(c, TerrainKind::Marsh);
        assert!(grid.standable(c));
        assert!(grid.terrain(c).unwrap().hazardous());
    }

    #[test]
    fn test_adjacent8_count_and_uniqueness() {
        let center = Cell::new(3, 3);
        let cells = center.adjacent8();
        assert_eq!(cells.len(), 8);
        for c in cells {
            assert_eq!(center.chebyshev_distance(c), 1);
        }
    }

    #[test]
    fn test_direction_to_self_is_none() {
        let c = Cell::new(4, 4);
        assert!(c.direction_to(c).is_none());
    }
}

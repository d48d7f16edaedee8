use log::{debug, info, warn};
use thiserror::Error;

use crate::maze::{find_nearest_cell, Grid};
use crate::types::{Direction, GridPos, PursuerView, ThreatState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PursuerMoveError {
    #[error("maze is not loaded yet")]
    MazeNotReady,
    #[error("unknown pursuer {0}")]
    UnknownPursuer(String),
    #[error("pursuer {0} cannot move right now")]
    MovementDisabled(String),
    #[error("pursuer {id} cannot step from {from} to {to}")]
    NotAdjacent { id: String, from: GridPos, to: GridPos },
    #[error("cell {0} is blocked for pursuers")]
    Blocked(GridPos),
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: String,
    pub spawn: GridPos,
    pub position: GridPos,
    pub facing: Direction,
    pub threat: ThreatState,
    pub collision_enabled: bool,
    pub movement_enabled: bool,
}

impl Pursuer {
    pub fn new(id: impl Into<String>, spawn: GridPos) -> Self {
        Self {
            id: id.into(),
            spawn,
            position: spawn,
            facing: Direction::Up,
            threat: ThreatState::Normal,
            collision_enabled: true,
            movement_enabled: true,
        }
    }

    pub fn set_threat(&mut self, threat: ThreatState) -> bool {
        if self.threat == threat {
            return false;
        }
        debug!("pursuer {} {:?} -> {:?}", self.id, self.threat, threat);
        self.threat = threat;
        true
    }

    pub fn reset_to_spawn(&mut self) {
        self.position = self.spawn;
        self.facing = Direction::Up;
    }

    pub fn view(&self) -> PursuerView {
        PursuerView {
            id: self.id.clone(),
            x: self.position.x,
            y: self.position.y,
            dir: self.facing,
            state: self.threat,
            collision_enabled: self.collision_enabled,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PursuerRoster {
    pursuers: Vec<Pursuer>,
}

impl PursuerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spawns(spawns: &[GridPos]) -> Self {
        let pursuers = spawns
            .iter()
            .enumerate()
            .map(|(idx, spawn)| Pursuer::new(format!("pursuer-{}", idx + 1), *spawn))
            .collect();
        Self { pursuers }
    }

    pub fn get(&self, id: &str) -> Option<&Pursuer> {
        self.pursuers.iter().find(|pursuer| pursuer.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Pursuer> {
        self.pursuers.iter_mut().find(|pursuer| pursuer.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pursuer> {
        self.pursuers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pursuer> {
        self.pursuers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.pursuers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pursuers.is_empty()
    }

    pub fn touching(&self, cell: GridPos) -> Vec<String> {
        self.pursuers
            .iter()
            .filter(|pursuer| pursuer.collision_enabled && pursuer.position == cell)
            .map(|pursuer| pursuer.id.clone())
            .collect()
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        for pursuer in &mut self.pursuers {
            pursuer.movement_enabled = enabled;
        }
    }

    pub fn reset_all_to_spawn(&mut self) {
        for pursuer in &mut self.pursuers {
            pursuer.reset_to_spawn();
        }
    }

    /// Single-cell step requested by the external pursuer driver. Walls block,
    /// the ghost barrier does not.
    pub fn step(
        &mut self,
        id: &str,
        to: GridPos,
        grid: &Grid,
    ) -> Result<GridPos, PursuerMoveError> {
        let pursuer = self
            .get_mut(id)
            .ok_or_else(|| PursuerMoveError::UnknownPursuer(id.to_string()))?;
        if !pursuer.movement_enabled || pursuer.threat == ThreatState::Dead {
            return Err(PursuerMoveError::MovementDisabled(id.to_string()));
        }
        let from = pursuer.position;
        let dir = Direction::CARDINALS
            .into_iter()
            .find(|dir| from.offset(*dir) == to)
            .ok_or_else(|| PursuerMoveError::NotAdjacent {
                id: id.to_string(),
                from,
                to,
            })?;
        if !grid.is_passable_for_pursuer(to) {
            return Err(PursuerMoveError::Blocked(to));
        }
        pursuer.position = to;
        pursuer.facing = dir;
        Ok(from)
    }

    pub fn ensure_passable_spawns(&mut self, grid: &Grid, radius: i32) {
        for pursuer in &mut self.pursuers {
            if grid.is_passable_for_pursuer(pursuer.spawn) {
                continue;
            }
            warn!("pursuer {} spawn {} is blocked", pursuer.id, pursuer.spawn);
            if let Some(found) = find_nearest_cell(grid, pursuer.spawn, radius, |g, p| {
                g.is_passable_for_pursuer(p)
            }) {
                info!("moved pursuer {} to {found}", pursuer.id);
                pursuer.spawn = found;
                pursuer.position = found;
            }
        }
    }

    pub fn views(&self) -> Vec<PursuerView> {
        self.pursuers.iter().map(Pursuer::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // r0: 2 2 2 2 2 2
    // r1: 2 0 8 8 0 2
    // r2: 2 0 0 0 0 2
    // r3: 2 0 8 8 0 2
    // r4: 2 2 2 2 2 2
    fn barrier_grid() -> Grid {
        Grid::generate(&[vec![2, 2, 2], vec![2, 0, 8], vec![2, 0, 0]]).expect("valid quadrant")
    }

    #[test]
    fn roster_assigns_ids_in_spawn_order() {
        let roster = PursuerRoster::from_spawns(&[GridPos::new(1, 1), GridPos::new(4, 1)]);
        let ids = roster.iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["pursuer-1", "pursuer-2"]);
        assert_eq!(roster.touching(GridPos::new(4, 1)), vec!["pursuer-2".to_string()]);
    }

    #[test]
    fn pursuers_cross_the_barrier_but_not_walls() {
        let grid = barrier_grid();
        let mut roster = PursuerRoster::from_spawns(&[GridPos::new(1, 1)]);
        assert_eq!(
            roster.step("pursuer-1", GridPos::new(2, 1), &grid),
            Ok(GridPos::new(1, 1))
        );
        assert_eq!(
            roster.get("pursuer-1").map(|p| p.facing),
            Some(Direction::Right)
        );
        assert_eq!(
            roster.step("pursuer-1", GridPos::new(2, 0), &grid),
            Err(PursuerMoveError::Blocked(GridPos::new(2, 0)))
        );
        assert!(matches!(
            roster.step("pursuer-1", GridPos::new(4, 1), &grid),
            Err(PursuerMoveError::NotAdjacent { .. })
        ));
        assert!(matches!(
            roster.step("ghost", GridPos::new(1, 1), &grid),
            Err(PursuerMoveError::UnknownPursuer(_))
        ));
    }

    #[test]
    fn disabled_or_dead_pursuers_do_not_move() {
        let grid = barrier_grid();
        let mut roster = PursuerRoster::from_spawns(&[GridPos::new(1, 1)]);
        roster.set_movement_enabled(false);
        assert!(matches!(
            roster.step("pursuer-1", GridPos::new(1, 2), &grid),
            Err(PursuerMoveError::MovementDisabled(_))
        ));
        roster.set_movement_enabled(true);
        if let Some(pursuer) = roster.get_mut("pursuer-1") {
            pursuer.set_threat(ThreatState::Dead);
        }
        assert!(roster.step("pursuer-1", GridPos::new(1, 2), &grid).is_err());
    }

    #[test]
    fn blocked_spawn_is_relocated() {
        let grid = barrier_grid();
        let mut roster = PursuerRoster::from_spawns(&[GridPos::new(0, 0)]);
        roster.ensure_passable_spawns(&grid, 5);
        let pursuer = roster.get("pursuer-1").expect("pursuer");
        assert_eq!(pursuer.spawn, GridPos::new(1, 1));
        assert_eq!(pursuer.position, GridPos::new(1, 1));
    }
}

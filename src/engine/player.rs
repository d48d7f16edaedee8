use std::collections::HashSet;

use log::{debug, info, warn};

use super::motion::{Easing, MotionInterpolator};
use crate::maze::{find_nearest_cell, Grid};
use crate::types::{ActorId, Direction, GridPos, PelletKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveStart {
    pub from: GridPos,
    pub to: GridPos,
    pub dir: Direction,
    pub pellet: Option<PelletKind>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Started(MoveStart),
    Bumped { wall: GridPos },
    Blocked,
    Waiting,
}

#[derive(Clone, Debug)]
pub struct PlayerController {
    start: GridPos,
    position: GridPos,
    facing: Direction,
    committed: Direction,
    requested: Direction,
    has_input: bool,
    movement_enabled: bool,
    step_ms: u64,
    last_bump: Option<(GridPos, Direction)>,
    collected: HashSet<GridPos>,
}

impl PlayerController {
    pub fn new(start: GridPos, step_ms: u64) -> Self {
        Self {
            start,
            position: start,
            facing: Direction::Right,
            committed: Direction::None,
            requested: Direction::None,
            has_input: false,
            movement_enabled: true,
            step_ms,
            last_bump: None,
            collected: HashSet::new(),
        }
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    pub fn start(&self) -> GridPos {
        self.start
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn committed(&self) -> Direction {
        self.committed
    }

    pub fn requested(&self) -> Direction {
        self.requested
    }

    pub fn has_input(&self) -> bool {
        self.has_input
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        if self.movement_enabled != enabled {
            debug!("player movement enabled: {enabled}");
        }
        self.movement_enabled = enabled;
    }

    pub fn is_collected(&self, cell: GridPos) -> bool {
        self.collected.contains(&cell)
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    pub fn request(&mut self, dir: Direction) {
        if dir.is_none() {
            return;
        }
        if dir != self.requested {
            self.last_bump = None;
        }
        self.requested = dir;
        if !self.has_input {
            self.has_input = true;
            self.committed = dir;
            debug!("first input received: {dir:?}");
        }
    }

    /// Attempts the next cell step. Only acts when idle, enabled and after the
    /// first input.
    pub fn try_move(
        &mut self,
        now_ms: u64,
        grid: &mut Grid,
        tweens: &mut MotionInterpolator,
    ) -> MoveOutcome {
        if !self.movement_enabled || !self.has_input || tweens.is_tweening(&ActorId::Player) {
            return MoveOutcome::Waiting;
        }

        let requested = self.requested;
        if !requested.is_none() && grid.is_walkable(self.position.offset(requested)) {
            self.committed = requested;
            return MoveOutcome::Started(self.start_move(now_ms, requested, grid, tweens));
        }

        let committed = self.committed;
        if committed != requested
            && !committed.is_none()
            && grid.is_walkable(self.position.offset(committed))
        {
            return MoveOutcome::Started(self.start_move(now_ms, committed, grid, tweens));
        }

        let wall = self.position.offset(requested);
        if self.note_wall_contact() {
            MoveOutcome::Bumped { wall }
        } else {
            MoveOutcome::Blocked
        }
    }

    pub fn note_wall_contact(&mut self) -> bool {
        let key = (self.position, self.requested);
        if self.last_bump == Some(key) {
            return false;
        }
        self.last_bump = Some(key);
        true
    }

    fn start_move(
        &mut self,
        now_ms: u64,
        dir: Direction,
        grid: &mut Grid,
        tweens: &mut MotionInterpolator,
    ) -> MoveStart {
        let from = self.position;
        let to = from.offset(dir);
        self.position = to;
        self.facing = dir;
        self.last_bump = None;
        tweens.schedule(
            ActorId::Player,
            from.to_point(),
            to.to_point(),
            now_ms,
            self.step_ms,
            Easing::Smoothstep,
        );
        let pellet = self.claim_pellet(grid, to);
        MoveStart {
            from,
            to,
            dir,
            pellet,
        }
    }

    pub fn claim_pellet(&mut self, grid: &mut Grid, cell: GridPos) -> Option<PelletKind> {
        if self.collected.contains(&cell) {
            return None;
        }
        let kind = grid.clear_pellet(cell)?;
        self.collected.insert(cell);
        Some(kind)
    }

    pub fn teleport_to(&mut self, cell: GridPos, tweens: &mut MotionInterpolator) {
        tweens.cancel(&ActorId::Player);
        self.position = cell;
        self.last_bump = None;
    }

    pub fn reset_to_start(&mut self, tweens: &mut MotionInterpolator) {
        tweens.cancel(&ActorId::Player);
        self.position = self.start;
        self.facing = Direction::Right;
        self.committed = Direction::None;
        self.requested = Direction::None;
        self.has_input = false;
        self.last_bump = None;
        info!("player reset to start {}", self.start);
    }

    pub fn reset_level(&mut self, tweens: &mut MotionInterpolator) {
        self.reset_to_start(tweens);
        self.collected.clear();
    }

    pub fn ensure_walkable_spawn(&mut self, grid: &Grid, radius: i32) -> Option<GridPos> {
        if grid.is_walkable(self.position) {
            return None;
        }
        warn!("player start {} is not walkable", self.position);
        let found = find_nearest_cell(grid, self.position, radius, |g, p| g.is_walkable(p))?;
        info!("moved player to walkable position {found}");
        self.position = found;
        self.start = found;
        Some(found)
    }
}

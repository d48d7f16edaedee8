use log::{debug, error, info, warn};

use crate::maze::Grid;
use crate::types::GridPos;

#[derive(Clone, Debug)]
pub struct TeleportRouter {
    pair: Option<(GridPos, GridPos)>,
    cooldown_ms: u64,
    search_rows: i32,
    cooldown_until_ms: u64,
}

impl TeleportRouter {
    pub fn new(cooldown_ms: u64, search_rows: i32) -> Self {
        Self {
            pair: None,
            cooldown_ms,
            search_rows,
            cooldown_until_ms: 0,
        }
    }

    pub fn pair(&self) -> Option<(GridPos, GridPos)> {
        self.pair
    }

    pub fn is_teleporter(&self, cell: GridPos) -> bool {
        self.pair
            .map(|(left, right)| cell == left || cell == right)
            .unwrap_or(false)
    }

    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        now_ms < self.cooldown_until_ms
    }

    /// Looks for the first row, starting at the middle and alternating
    /// above/below, whose two boundary cells are both walkable.
    pub fn discover(&mut self, grid: &Grid) -> Option<(GridPos, GridPos)> {
        self.pair = None;
        let middle = grid.rows() / 2;
        let last_col = grid.cols() - 1;

        let mut candidates = vec![middle];
        for offset in 1..=self.search_rows {
            candidates.push(middle - offset);
            candidates.push(middle + offset);
        }

        for row in candidates {
            let left = GridPos::new(0, row);
            let right = GridPos::new(last_col, row);
            if grid.is_walkable(left) && grid.is_walkable(right) {
                if row != middle {
                    debug!("seam found {} rows off the middle", row - middle);
                }
                info!("teleporters at {left} and {right}");
                self.pair = Some((left, right));
                return self.pair;
            }
        }

        error!(
            "no teleporter seam within {} rows of row {middle}",
            self.search_rows
        );
        None
    }

    pub fn try_teleport(&mut self, from: GridPos, now_ms: u64) -> Option<GridPos> {
        let Some((left, right)) = self.pair else {
            warn!("teleport requested at {from} but no teleporters exist");
            return None;
        };
        let target = if from == left {
            right
        } else if from == right {
            left
        } else {
            warn!("{from} is not a teleporter cell");
            return None;
        };
        if self.in_cooldown(now_ms) {
            debug!("teleport at {from} suppressed by cooldown");
            return None;
        }
        self.cooldown_until_ms = now_ms.saturating_add(self.cooldown_ms);
        Some(target)
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown_until_ms = 0;
    }
}

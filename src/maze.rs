use log::{debug, error};
use thiserror::Error;

use crate::types::{Cell, GridPos, PelletKind, Rotation};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("quadrant template is empty")]
    EmptyQuadrant,
    #[error("quadrant row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile code {code} at quadrant ({row}, {col})")]
    UnknownTile { row: usize, col: usize, code: u8 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Mirrors an `H x W` quadrant into a `(2H-1) x 2W` maze. The last
    /// quadrant row becomes the single shared middle row.
    pub fn generate(quadrant: &[Vec<u8>]) -> Result<Self, LayoutError> {
        let h = quadrant.len();
        let w = quadrant.first().map(|row| row.len()).unwrap_or(0);
        if h == 0 || w == 0 {
            return Err(LayoutError::EmptyQuadrant);
        }

        let mut parsed = Vec::with_capacity(h * w);
        for (row_idx, row) in quadrant.iter().enumerate() {
            if row.len() != w {
                return Err(LayoutError::RaggedRow {
                    row: row_idx,
                    expected: w,
                    found: row.len(),
                });
            }
            for (col_idx, &code) in row.iter().enumerate() {
                let cell = Cell::from_code(code).ok_or(LayoutError::UnknownTile {
                    row: row_idx,
                    col: col_idx,
                    code,
                })?;
                parsed.push(cell);
            }
        }

        let full_h = h * 2 - 1;
        let full_w = w * 2;
        let mut cells = vec![Cell::Empty; full_h * full_w];
        for r in 0..h {
            for c in 0..w {
                let cell = parsed[r * w + c];
                let mirrored_c = full_w - 1 - c;
                cells[r * full_w + c] = cell;
                cells[r * full_w + mirrored_c] = cell;
                if r < h - 1 {
                    let mirrored_r = full_h - 1 - r;
                    cells[mirrored_r * full_w + c] = cell;
                    cells[mirrored_r * full_w + mirrored_c] = cell;
                }
            }
        }

        debug!("generated maze {full_h}x{full_w} from {h}x{w} quadrant");
        Ok(Self {
            rows: full_h as i32,
            cols: full_w as i32,
            cells,
        })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.cols && pos.y < self.rows
    }

    pub fn cell(&self, pos: GridPos) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.cells
            .get((pos.y * self.cols + pos.x) as usize)
            .copied()
    }

    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cell(pos).map(Cell::is_walkable).unwrap_or(false)
    }

    pub fn is_passable_for_pursuer(&self, pos: GridPos) -> bool {
        self.cell(pos)
            .map(Cell::is_passable_for_pursuer)
            .unwrap_or(false)
    }

    pub(crate) fn clear_pellet(&mut self, pos: GridPos) -> Option<PelletKind> {
        if !self.in_bounds(pos) {
            return None;
        }
        let idx = (pos.y * self.cols + pos.x) as usize;
        let kind = self.cells[idx].pellet_kind()?;
        self.cells[idx] = Cell::Empty;
        Some(kind)
    }

    pub fn count_pellets(&self) -> u32 {
        self.cells
            .iter()
            .filter(|cell| cell.pellet_kind().is_some())
            .count() as u32
    }

    pub fn render_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|y| {
                (0..self.cols)
                    .map(|x| {
                        let code = self.cell(GridPos::new(x, y)).map(Cell::code).unwrap_or(0);
                        char::from(b'0' + code)
                    })
                    .collect()
            })
            .collect()
    }

    fn wall_at(&self, row: i32, col: i32) -> bool {
        self.cell(GridPos::new(col, row))
            .map(Cell::is_wall_like)
            .unwrap_or(false)
    }

    fn count_run(&self, row: i32, col: i32, dr: i32, dc: i32) -> i32 {
        let mut len = 0;
        let (mut r, mut c) = (row + dr, col + dc);
        while self.wall_at(r, c) {
            len += 1;
            r += dr;
            c += dc;
        }
        len
    }

    fn arm(&self, row: i32, col: i32, dr: i32, dc: i32) -> i32 {
        if self.wall_at(row + dr, col + dc) {
            1 + self.count_run(row, col, dr, dc)
        } else {
            0
        }
    }

    pub fn tile_rotation(&self, row: i32, col: i32) -> Option<Rotation> {
        let cell = self.cell(GridPos::new(col, row))?;
        let up = self.wall_at(row - 1, col);
        let right = self.wall_at(row, col + 1);
        let down = self.wall_at(row + 1, col);
        let left = self.wall_at(row, col - 1);

        let rotation = match cell {
            Cell::Empty => return None,
            Cell::Pellet | Cell::PowerPellet => Rotation::Deg0,
            Cell::OuterWall | Cell::InnerWall | Cell::GhostBarrier => {
                let horizontal = self.arm(row, col, 0, -1) + self.arm(row, col, 0, 1);
                let vertical = self.arm(row, col, -1, 0) + self.arm(row, col, 1, 0);
                if vertical > horizontal {
                    Rotation::Deg90
                } else {
                    Rotation::Deg0
                }
            }
            Cell::OuterCorner => {
                if right && down {
                    Rotation::Deg0
                } else if down && left {
                    Rotation::Deg270
                } else if left && up {
                    Rotation::Deg180
                } else {
                    Rotation::Deg90
                }
            }
            Cell::InnerCorner => {
                let right_arm = self.arm(row, col, 0, 1);
                let down_arm = self.arm(row, col, 1, 0);
                let left_arm = self.arm(row, col, 0, -1);
                let up_arm = self.arm(row, col, -1, 0);
                let scores = [
                    (right_arm + down_arm, Rotation::Deg0),
                    (down_arm + left_arm, Rotation::Deg270),
                    (left_arm + up_arm, Rotation::Deg180),
                    (up_arm + right_arm, Rotation::Deg90),
                ];
                let mut best = scores[0];
                for candidate in &scores[1..] {
                    if candidate.0 > best.0 {
                        best = *candidate;
                    }
                }
                best.1
            }
            Cell::TJunction => {
                if !up {
                    Rotation::Deg0
                } else if !right {
                    Rotation::Deg90
                } else if !down {
                    Rotation::Deg180
                } else {
                    Rotation::Deg270
                }
            }
        };
        Some(rotation)
    }
}

/// Expanding-square search for a cell accepted by `accept`, radius 1 through
/// `max_radius`. Returns `None` (and logs) when nothing qualifies.
pub fn find_nearest_cell(
    grid: &Grid,
    origin: GridPos,
    max_radius: i32,
    accept: impl Fn(&Grid, GridPos) -> bool,
) -> Option<GridPos> {
    for radius in 1..=max_radius {
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                let (Some(x), Some(y)) = (origin.x.checked_add(dx), origin.y.checked_add(dy))
                else {
                    continue;
                };
                let candidate = GridPos::new(x, y);
                if accept(grid, candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    error!("no walkable cell within radius {max_radius} of {origin}");
    None
}

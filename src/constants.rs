use crate::types::GridPos;

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const PLAYER_MOVE_SPEED: f32 = 2.0;
pub const PLAYER_STEP_MS: u64 = (1000.0 / PLAYER_MOVE_SPEED) as u64;

pub const POWER_DURATION_MS: u64 = 10_000;
pub const RECOVERY_THRESHOLD_MS: u64 = 3_000;
pub const PURSUER_RESPAWN_DELAY_MS: u64 = 3_000;

pub const TELEPORT_COOLDOWN_MS: u64 = 500;
pub const TELEPORT_SEARCH_ROWS: i32 = 2;
pub const SPAWN_SEARCH_RADIUS: i32 = 5;
pub const MAX_CELL_COORD: i32 = 4096;

pub const MAX_LIVES: u32 = 3;
pub const DEATH_ANIMATION_MS: u64 = 1_200;
pub const DEATH_ANIMATION_BUFFER_MS: u64 = 0;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const BONUS_SCORE: u32 = 100;
pub const ELIMINATION_SCORE: u32 = 300;

pub const COUNTDOWN_INITIAL_WAIT_MS: u64 = 2_000;
pub const COUNTDOWN_STEP_MS: u64 = 1_000;
pub const COUNTDOWN_GO_MS: u64 = 500;

pub const BONUS_FIRST_DELAY_MS: u64 = 5_000;
pub const BONUS_RETRY_INTERVAL_MS: u64 = 5_000;
pub const BONUS_SPEED: f32 = 3.0;
pub const BONUS_SPAWN_OFFSET: f32 = 2.0;
pub const BONUS_DESPAWN_OFFSET: f32 = 2.0;

pub const PLAYER_CONTACT_RADIUS: f32 = 0.4;
pub const BONUS_CONTACT_RADIUS: f32 = 0.3;

pub const DEFAULT_PLAYER_START: GridPos = GridPos { x: 1, y: 1 };

pub const DEFAULT_PURSUER_SPAWNS: [GridPos; 4] = [
    GridPos { x: 12, y: 13 },
    GridPos { x: 15, y: 13 },
    GridPos { x: 12, y: 15 },
    GridPos { x: 15, y: 15 },
];

pub const DEFAULT_QUADRANT: [[u8; 14]; 15] = [
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 7],
    [2, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 4],
    [2, 5, 3, 4, 4, 3, 5, 3, 4, 4, 4, 3, 5, 4],
    [2, 6, 4, 0, 0, 4, 5, 4, 0, 0, 0, 4, 5, 4],
    [2, 5, 3, 4, 4, 3, 5, 3, 4, 4, 4, 3, 5, 3],
    [2, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
    [2, 5, 3, 4, 4, 3, 5, 3, 3, 5, 3, 4, 4, 4],
    [2, 5, 3, 4, 4, 3, 5, 4, 4, 5, 3, 4, 4, 3],
    [2, 5, 5, 5, 5, 5, 5, 4, 4, 5, 5, 5, 5, 4],
    [1, 2, 2, 2, 2, 1, 5, 4, 3, 4, 4, 3, 0, 4],
    [0, 0, 0, 0, 0, 2, 5, 4, 3, 4, 4, 3, 0, 3],
    [0, 0, 0, 0, 0, 2, 5, 4, 4, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 2, 5, 4, 4, 0, 3, 4, 4, 8],
    [2, 2, 2, 2, 2, 1, 5, 3, 3, 0, 4, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 4, 0, 0, 0],
];

pub fn default_quadrant() -> Vec<Vec<u8>> {
    DEFAULT_QUADRANT.iter().map(|row| row.to_vec()).collect()
}

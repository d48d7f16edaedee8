use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    default_quadrant, BONUS_CONTACT_RADIUS, BONUS_DESPAWN_OFFSET, BONUS_FIRST_DELAY_MS,
    BONUS_RETRY_INTERVAL_MS, BONUS_SCORE, BONUS_SPAWN_OFFSET, BONUS_SPEED,
    COUNTDOWN_GO_MS, COUNTDOWN_INITIAL_WAIT_MS, COUNTDOWN_STEP_MS, DEATH_ANIMATION_BUFFER_MS,
    DEATH_ANIMATION_MS, DEFAULT_PLAYER_START, DEFAULT_PURSUER_SPAWNS, ELIMINATION_SCORE,
    MAX_CELL_COORD, MAX_LIVES, PELLET_SCORE, PLAYER_CONTACT_RADIUS, PLAYER_STEP_MS, POWER_DURATION_MS,
    POWER_PELLET_SCORE, PURSUER_RESPAWN_DELAY_MS, RECOVERY_THRESHOLD_MS, SPAWN_SEARCH_RADIUS,
    TELEPORT_COOLDOWN_MS, TELEPORT_SEARCH_ROWS,
};
use crate::engine::{BonusTiming, CountdownTimings, ScoreValues};
use crate::types::GridPos;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every tunable of a game. Missing JSON keys fall back to the built-in
/// classic values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub player_step_ms: u64,
    pub pursuer_step_ms: u64,
    pub power_duration_ms: u64,
    pub recovery_threshold_ms: u64,
    pub pursuer_respawn_delay_ms: u64,
    pub teleport_cooldown_ms: u64,
    pub teleport_search_rows: i32,
    pub spawn_search_radius: i32,
    pub max_lives: u32,
    pub death_animation_ms: u64,
    pub death_animation_buffer_ms: u64,
    pub pellet_score: u32,
    pub power_pellet_score: u32,
    pub bonus_score: u32,
    pub elimination_score: u32,
    pub countdown_initial_wait_ms: u64,
    pub countdown_step_ms: u64,
    pub countdown_go_ms: u64,
    pub bonus_enabled: bool,
    pub bonus_first_delay_ms: u64,
    pub bonus_retry_interval_ms: u64,
    pub bonus_speed: f32,
    pub bonus_spawn_offset: f32,
    pub bonus_despawn_offset: f32,
    pub player_contact_radius: f32,
    pub bonus_contact_radius: f32,
    pub player_start: GridPos,
    pub pursuer_spawns: Vec<GridPos>,
    pub quadrant: Vec<Vec<u8>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_step_ms: PLAYER_STEP_MS,
            pursuer_step_ms: PLAYER_STEP_MS,
            power_duration_ms: POWER_DURATION_MS,
            recovery_threshold_ms: RECOVERY_THRESHOLD_MS,
            pursuer_respawn_delay_ms: PURSUER_RESPAWN_DELAY_MS,
            teleport_cooldown_ms: TELEPORT_COOLDOWN_MS,
            teleport_search_rows: TELEPORT_SEARCH_ROWS,
            spawn_search_radius: SPAWN_SEARCH_RADIUS,
            max_lives: MAX_LIVES,
            death_animation_ms: DEATH_ANIMATION_MS,
            death_animation_buffer_ms: DEATH_ANIMATION_BUFFER_MS,
            pellet_score: PELLET_SCORE,
            power_pellet_score: POWER_PELLET_SCORE,
            bonus_score: BONUS_SCORE,
            elimination_score: ELIMINATION_SCORE,
            countdown_initial_wait_ms: COUNTDOWN_INITIAL_WAIT_MS,
            countdown_step_ms: COUNTDOWN_STEP_MS,
            countdown_go_ms: COUNTDOWN_GO_MS,
            bonus_enabled: true,
            bonus_first_delay_ms: BONUS_FIRST_DELAY_MS,
            bonus_retry_interval_ms: BONUS_RETRY_INTERVAL_MS,
            bonus_speed: BONUS_SPEED,
            bonus_spawn_offset: BONUS_SPAWN_OFFSET,
            bonus_despawn_offset: BONUS_DESPAWN_OFFSET,
            player_contact_radius: PLAYER_CONTACT_RADIUS,
            bonus_contact_radius: BONUS_CONTACT_RADIUS,
            player_start: DEFAULT_PLAYER_START,
            pursuer_spawns: DEFAULT_PURSUER_SPAWNS.to_vec(),
            quadrant: default_quadrant(),
        }
    }
}

impl GameConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_step_ms == 0 {
            return Err(ConfigError::Invalid("playerStepMs must be > 0".into()));
        }
        if self.max_lives == 0 {
            return Err(ConfigError::Invalid("maxLives must be >= 1".into()));
        }
        if self.recovery_threshold_ms > self.power_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "recoveryThresholdMs ({}) exceeds powerDurationMs ({})",
                self.recovery_threshold_ms, self.power_duration_ms
            )));
        }
        let radii_in_range = |value: i32| (0..=MAX_CELL_COORD).contains(&value);
        if !radii_in_range(self.teleport_search_rows) || !radii_in_range(self.spawn_search_radius) {
            return Err(ConfigError::Invalid(format!(
                "search radii must be within 0..={MAX_CELL_COORD}"
            )));
        }
        let cell_in_range = |cell: &GridPos| {
            cell.x.unsigned_abs() <= MAX_CELL_COORD as u32
                && cell.y.unsigned_abs() <= MAX_CELL_COORD as u32
        };
        if !cell_in_range(&self.player_start) {
            return Err(ConfigError::Invalid(format!(
                "playerStart {} is outside +/-{MAX_CELL_COORD}",
                self.player_start
            )));
        }
        if let Some(spawn) = self.pursuer_spawns.iter().find(|cell| !cell_in_range(cell)) {
            return Err(ConfigError::Invalid(format!(
                "pursuer spawn {spawn} is outside +/-{MAX_CELL_COORD}"
            )));
        }
        let radii = [
            self.bonus_speed,
            self.bonus_spawn_offset,
            self.bonus_despawn_offset,
            self.player_contact_radius,
            self.bonus_contact_radius,
        ];
        if radii.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(ConfigError::Invalid(
                "bonus and contact values must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }

    pub fn score_values(&self) -> ScoreValues {
        ScoreValues {
            pellet: self.pellet_score,
            power_pellet: self.power_pellet_score,
            bonus: self.bonus_score,
            elimination: self.elimination_score,
        }
    }

    pub fn countdown_timings(&self) -> CountdownTimings {
        CountdownTimings {
            initial_wait_ms: self.countdown_initial_wait_ms,
            step_ms: self.countdown_step_ms,
            go_ms: self.countdown_go_ms,
        }
    }

    pub fn bonus_timing(&self) -> BonusTiming {
        BonusTiming {
            first_delay_ms: self.bonus_first_delay_ms,
            retry_interval_ms: self.bonus_retry_interval_ms,
            speed: self.bonus_speed,
            spawn_offset: self.bonus_spawn_offset,
            despawn_offset: self.bonus_despawn_offset,
            contact_radius: self.bonus_contact_radius,
        }
    }

    pub fn death_delay_ms(&self) -> u64 {
        self.death_animation_ms
            .saturating_add(self.death_animation_buffer_ms)
    }
}

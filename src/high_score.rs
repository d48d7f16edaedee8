use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::types::HighScoreRecord;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredBest {
    score: u32,
    #[serde(rename = "timeMs", alias = "time_ms")]
    time_ms: u64,
    #[serde(rename = "updatedAtIso", alias = "updated_at_iso", default)]
    updated_at_iso: String,
}

#[derive(Clone, Debug, Serialize)]
struct HighScoreFile {
    version: u8,
    best: Option<StoredBest>,
}

#[derive(Clone, Debug, Deserialize)]
struct HighScoreFileRaw {
    version: u8,
    #[serde(default)]
    best: Option<serde_json::Value>,
}

pub struct HighScoreStore {
    file_path: PathBuf,
    best: Option<StoredBest>,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let best = load_best(&file_path);
        Self { file_path, best }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn best(&self) -> HighScoreRecord {
        match &self.best {
            Some(best) => HighScoreRecord {
                score: best.score,
                time_ms: Some(best.time_ms),
            },
            None => HighScoreRecord {
                score: 0,
                time_ms: None,
            },
        }
    }

    pub fn submit(&mut self, score: u32, time_ms: u64) -> bool {
        if !beats(score, time_ms, &self.best()) {
            debug!(
                "score {score} in {} does not beat the high score",
                format_time(time_ms)
            );
            return false;
        }
        info!("new high score {score} in {}", format_time(time_ms));
        self.best = Some(StoredBest {
            score,
            time_ms,
            updated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.save();
        true
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                error!(
                    "failed to create high score dir {}: {err}",
                    parent.display()
                );
                return;
            }
        }

        let payload = HighScoreFile {
            version: 1,
            best: self.best.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(err) = fs::write(&self.file_path, text) {
                    error!("failed to write {}: {err}", self.file_path.display());
                }
            }
            Err(err) => {
                error!(
                    "failed to serialize high score for {}: {err}",
                    self.file_path.display()
                );
            }
        }
    }
}

/// Higher score wins; an equal score needs a strictly lower time. A missing
/// record counts as score 0 with an unbounded time.
fn beats(score: u32, time_ms: u64, current: &HighScoreRecord) -> bool {
    let current_time = current.time_ms.unwrap_or(u64::MAX);
    score > current.score || (score == current.score && time_ms < current_time)
}

fn load_best(path: &Path) -> Option<StoredBest> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to read {}: {err}", path.display());
            }
            return None;
        }
    };
    let parsed = match serde_json::from_str::<HighScoreFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            warn!(
                "unsupported high score version {} at {}",
                value.version,
                path.display()
            );
            return None;
        }
        Err(err) => {
            warn!("failed to parse {}: {err}", path.display());
            return None;
        }
    };
    let raw = parsed.best?;
    match serde_json::from_value::<StoredBest>(raw) {
        Ok(best) => Some(best),
        Err(err) => {
            warn!("discarding malformed high score in {}: {err}", path.display());
            None
        }
    }
}

pub fn format_time(time_ms: u64) -> String {
    let total_seconds = time_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

use chrono::Utc;
use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use maze_chase::config::GameConfig;
use maze_chase::constants::TICK_MS;
use maze_chase::engine::GameEngine;
use maze_chase::high_score::{format_time, HighScoreStore};
use maze_chase::types::{
    ActorId, Direction, GameEvent, GameOverReason, GridPos, HighScoreRecord, Snapshot,
    ThreatState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 10;
const AUTOPILOT_SEED_SALT: u64 = 0x5eed_0001;
const PURSUER_SEED_SALT: u64 = 0x5eed_0002;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    high_score_file: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    seed: u64,
    reason: Option<GameOverReason>,
    #[serde(rename = "gameTimeMs")]
    game_time_ms: u64,
    #[serde(rename = "gameTime")]
    game_time: String,
    score: u32,
    #[serde(rename = "livesLeft")]
    lives_left: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "totalPellets")]
    total_pellets: u32,
    #[serde(rename = "pursuersEliminated")]
    pursuers_eliminated: u32,
    #[serde(rename = "bonusesCollected")]
    bonuses_collected: u32,
    #[serde(rename = "powerActivations")]
    power_activations: u32,
    teleports: u32,
    #[serde(rename = "wallBumps")]
    wall_bumps: u32,
    #[serde(rename = "newHighScore")]
    new_high_score: bool,
    anomalies: Vec<AnomalyKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
enum AnomalyKind {
    PlayerOffMaze,
    PelletsGrew,
    PelletsOverTotal,
    LivesOutOfRange,
    ScoreDropped,
    StalePowerMode,
    DeadPursuerCollides,
    TweenOverflow,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    kind: AnomalyKind,
    message: String,
}

#[derive(Debug, Default)]
struct AnomalyLog {
    records: Vec<AnomalyRecord>,
    first_tick: BTreeMap<AnomalyKind, u64>,
}

impl AnomalyLog {
    fn record(&mut self, tick: u64, kind: AnomalyKind, message: String) {
        self.first_tick.entry(kind).or_insert(tick);
        self.records.push(AnomalyRecord {
            tick,
            kind,
            message,
        });
    }

    fn kinds(&self) -> Vec<AnomalyKind> {
        self.first_tick.keys().copied().collect()
    }
}

#[derive(Clone, Debug)]
struct SimulationRun {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
    high_score: Option<HighScoreRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "finishedTick")]
    finished_tick: u64,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "highScore")]
    high_score: Option<HighScoreRecord>,
    result: RunResultLine,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Routes library `log` records into the same JSON line shape as the
/// binary's own lifecycle events.
struct StructuredLogger {
    match_id: String,
    seed: u64,
    level: LevelFilter,
}

impl Log for StructuredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        write_log_line(&StructuredLogLine {
            timestamp_ms: now_ms(),
            level: record.level().as_str().to_lowercase(),
            event: "engine_log".to_string(),
            match_id: self.match_id.clone(),
            seed: Some(self.seed),
            tick: None,
            details: json!({
                "target": record.target(),
                "message": record.args().to_string(),
            }),
        });
    }

    fn flush(&self) {}
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let seed = cli.seed.unwrap_or(run_started_at_ms);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, run_started_at_ms));
    install_logger(&match_id, seed, cli.verbose);

    let config = match cli.config.as_ref() {
        Some(path) => match GameConfig::from_json_file(path) {
            Ok(config) => config,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    &match_id,
                    Some(seed),
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        },
        None => GameConfig::default(),
    };
    let max_ticks = cli.ticks.unwrap_or(DEFAULT_MAX_TICKS);

    emit_log(
        "info",
        "run_started",
        &match_id,
        Some(seed),
        None,
        json!({
            "maxTicks": max_ticks,
            "config": cli.config.as_ref().map(|path| path.to_string_lossy().to_string()),
            "highScoreFile": cli
                .high_score_file
                .as_ref()
                .map(|path| path.to_string_lossy().to_string()),
        }),
    );

    let store = cli.high_score_file.clone().map(HighScoreStore::new);
    let run = run_simulation(config, seed, max_ticks, store);

    for anomaly in &run.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &match_id,
            Some(seed),
            Some(anomaly.tick),
            json!({
                "kind": anomaly.kind,
                "message": anomaly.message,
            }),
        );
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        Some(seed),
        Some(run.finished_tick),
        json!({
            "reason": run.result.reason,
            "score": run.result.score,
            "gameTime": run.result.game_time,
            "anomalyCount": run.anomaly_records.len(),
        }),
    );

    match serde_json::to_string(&run.result) {
        Ok(text) => println!("{text}"),
        Err(error) => emit_log(
            "error",
            "result_serialize_failed",
            &match_id,
            Some(seed),
            None,
            json!({ "error": error.to_string() }),
        ),
    }

    let summary = RunSummary {
        match_id: match_id.clone(),
        started_at_ms: run_started_at_ms,
        finished_at_ms: now_ms(),
        finished_tick: run.finished_tick,
        anomaly_count: run.anomaly_records.len(),
        high_score: run.high_score,
        result: run.result.clone(),
    };

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                Some(seed),
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    if !run.result.anomalies.is_empty() {
        std::process::exit(1);
    }
}

struct Autopilot {
    rng: StdRng,
    current: Direction,
    next_turn_tick: u64,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ AUTOPILOT_SEED_SALT),
            current: Direction::None,
            next_turn_tick: 0,
        }
    }

    fn next_input(&mut self, tick: u64, bumped: bool) -> Option<Direction> {
        if !bumped && tick < self.next_turn_tick {
            return None;
        }
        let choices: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| *dir != self.current)
            .collect();
        let dir = choices[self.rng.random_range(0..choices.len())];
        self.current = dir;
        self.next_turn_tick = tick + self.rng.random_range(30..180);
        Some(dir)
    }
}

fn drive_pursuers(engine: &mut GameEngine, rng: &mut StdRng) {
    let Some(grid) = engine.grid() else {
        return;
    };
    let tweens = engine.tweens();
    let moves: Vec<(String, GridPos)> = engine
        .roster()
        .iter()
        .filter(|pursuer| {
            pursuer.movement_enabled
                && pursuer.threat != ThreatState::Dead
                && !tweens.is_tweening(&ActorId::Pursuer(pursuer.id.clone()))
        })
        .filter_map(|pursuer| {
            let options: Vec<GridPos> = Direction::CARDINALS
                .into_iter()
                .map(|dir| pursuer.position.offset(dir))
                .filter(|cell| grid.is_passable_for_pursuer(*cell))
                .collect();
            if options.is_empty() {
                return None;
            }
            let pick = options[rng.random_range(0..options.len())];
            Some((pursuer.id.clone(), pick))
        })
        .collect();

    for (id, to) in moves {
        if let Err(error) = engine.move_pursuer(&id, to) {
            log::debug!("pursuer move rejected: {error}");
        }
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    power_activations: u32,
    teleports: u32,
    wall_bumps: u32,
}

fn run_simulation(
    config: GameConfig,
    seed: u64,
    max_ticks: u64,
    store: Option<HighScoreStore>,
) -> SimulationRun {
    let max_lives = config.max_lives;
    let mut engine = GameEngine::new(config, seed);
    if let Some(store) = store {
        engine.attach_high_score_store(store);
    }
    let mut autopilot = Autopilot::new(seed);
    let mut pursuer_rng = StdRng::seed_from_u64(seed ^ PURSUER_SEED_SALT);
    let mut counters = RunCounters::default();
    let mut anomalies = AnomalyLog::default();
    let mut previous: Option<Snapshot> = None;
    let mut bumped = false;
    let mut last_tick = 0u64;

    for tick in 0..max_ticks {
        if engine.is_ended() {
            break;
        }
        if let Some(dir) = autopilot.next_input(tick, bumped) {
            engine.queue_input(dir);
        }
        drive_pursuers(&mut engine, &mut pursuer_rng);
        engine.step(TICK_MS);

        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        bumped = false;
        for event in &snapshot.events {
            match event {
                GameEvent::WallBumped { .. } => {
                    bumped = true;
                    counters.wall_bumps += 1;
                }
                GameEvent::PowerModeEntered { .. } => counters.power_activations += 1,
                GameEvent::Teleported { .. } => counters.teleports += 1,
                _ => {}
            }
        }

        let mut messages = collect_snapshot_anomalies(&snapshot, previous.as_ref(), max_lives);
        if let Some(grid) = engine.grid() {
            let cell = GridPos::new(snapshot.player.x, snapshot.player.y);
            if !grid.is_walkable(cell) {
                messages.push((
                    AnomalyKind::PlayerOffMaze,
                    format!("player on non-walkable cell {cell}"),
                ));
            }
        }
        let total_pellets = engine.score().total_pellets();
        if snapshot.remaining_pellets > total_pellets {
            messages.push((
                AnomalyKind::PelletsOverTotal,
                format!(
                    "remaining pellets {} exceed total {total_pellets}",
                    snapshot.remaining_pellets
                ),
            ));
        }
        let tween_limit = engine.roster().len() + 2;
        if engine.tweens().len() > tween_limit {
            messages.push((
                AnomalyKind::TweenOverflow,
                format!(
                    "tween count {} exceeds actor count {tween_limit}",
                    engine.tweens().len()
                ),
            ));
        }
        for (kind, message) in messages {
            anomalies.record(snapshot.tick, kind, message);
        }
        previous = Some(snapshot);
    }

    let summary = engine.build_summary();
    SimulationRun {
        result: RunResultLine {
            seed,
            reason: summary.reason,
            game_time_ms: summary.game_time_ms,
            game_time: format_time(summary.game_time_ms),
            score: summary.score,
            lives_left: summary.lives_left,
            pellets_eaten: summary.pellets_eaten,
            total_pellets: summary.total_pellets,
            pursuers_eliminated: summary.pursuers_eliminated,
            bonuses_collected: summary.bonuses_collected,
            power_activations: counters.power_activations,
            teleports: counters.teleports,
            wall_bumps: counters.wall_bumps,
            new_high_score: summary.new_high_score,
            anomalies: anomalies.kinds(),
        },
        anomaly_records: anomalies.records,
        finished_tick: last_tick,
        high_score: engine.high_score(),
    }
}

fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    previous: Option<&Snapshot>,
    max_lives: u32,
) -> Vec<(AnomalyKind, String)> {
    let mut found = Vec::new();
    if snapshot.lives > max_lives {
        found.push((
            AnomalyKind::LivesOutOfRange,
            format!("lives {} above {max_lives}", snapshot.lives),
        ));
    }
    if let Some(previous) = previous {
        if snapshot.remaining_pellets > previous.remaining_pellets {
            found.push((
                AnomalyKind::PelletsGrew,
                format!(
                    "remaining pellets {} -> {}",
                    previous.remaining_pellets, snapshot.remaining_pellets
                ),
            ));
        }
        if snapshot.score < previous.score {
            found.push((
                AnomalyKind::ScoreDropped,
                format!("score {} -> {}", previous.score, snapshot.score),
            ));
        }
    }
    if snapshot.power.active && snapshot.power.remaining_ms == 0 {
        found.push((
            AnomalyKind::StalePowerMode,
            "power mode active with no time left".to_string(),
        ));
    }
    found.extend(
        snapshot
            .pursuers
            .iter()
            .filter(|pursuer| pursuer.state == ThreatState::Dead && pursuer.collision_enabled)
            .map(|pursuer| {
                (
                    AnomalyKind::DeadPursuerCollides,
                    format!("{} is dead but still collides", pursuer.id),
                )
            }),
    );
    found
}

fn default_match_id(seed: u64, started_at_ms: u64) -> String {
    format!("chase-{seed:016x}-{started_at_ms}")
}

fn install_logger(match_id: &str, seed: u64, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger = StructuredLogger {
        match_id: match_id.to_string(),
        seed,
        level,
    };
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(level);
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    write_log_line(&StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        seed,
        tick,
        details,
    });
}

fn write_log_line(line: &StructuredLogLine) {
    if let Ok(text) = serde_json::to_string(line) {
        eprintln!("{text}");
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

use std::collections::BTreeMap;

use glam::Vec2;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::high_score::{format_time, HighScoreStore};
use crate::maze::{Grid, LayoutError};
use crate::types::{
    ActorId, Direction, GameEvent, GameOverReason, GameSummary, GridPos, HighScoreRecord,
    PelletKind, PlayerView, Snapshot,
};

mod bonus;
mod collision;
mod motion;
mod player;
mod power;
mod pursuer;
mod session;
mod teleport;

pub use self::bonus::{BonusItem, BonusSpawner, BonusTiming};
pub use self::collision::{resolve, CollisionOutcome, CollisionTag, OverlapEvent};
pub use self::motion::{Easing, MotionInterpolator, Tween};
pub use self::player::{MoveOutcome, MoveStart, PlayerController};
pub use self::power::PowerModeController;
pub use self::pursuer::{Pursuer, PursuerMoveError, PursuerRoster};
pub use self::session::{
    Countdown, CountdownTimings, LifeOutcome, LifeTracker, ScoreKeeper, ScoreValues,
};
pub use self::teleport::TeleportRouter;

pub struct GameEngine {
    config: GameConfig,
    quadrant: Vec<Vec<u8>>,
    maze: Option<Grid>,
    setup_done: bool,
    player: PlayerController,
    roster: PursuerRoster,
    power: PowerModeController,
    tweens: MotionInterpolator,
    positions: BTreeMap<ActorId, Vec2>,
    teleport: TeleportRouter,
    bonus: BonusSpawner,
    score: ScoreKeeper,
    lives: LifeTracker,
    countdown: Countdown,
    high_score: Option<HighScoreStore>,
    new_high_score: bool,
    pending_input: Option<Direction>,
    overlaps: Vec<OverlapEvent>,
    events: Vec<GameEvent>,
    pursuer_cells_prev: BTreeMap<String, GridPos>,
    respawn_at_ms: Option<u64>,
    pending_end: Option<GameOverReason>,
    round_running: bool,
    ended: bool,
    end_reason: Option<GameOverReason>,
    tick_counter: u64,
    now_ms: u64,
    game_time_ms: u64,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let maze = match Grid::generate(&config.quadrant) {
            Ok(grid) => Some(grid),
            Err(err) => {
                error!("maze layout rejected, waiting for load_maze: {err}");
                None
            }
        };
        let mut player = PlayerController::new(config.player_start, config.player_step_ms);
        player.set_movement_enabled(false);
        let mut roster = PursuerRoster::from_spawns(&config.pursuer_spawns);
        roster.set_movement_enabled(false);

        Self {
            quadrant: config.quadrant.clone(),
            maze,
            setup_done: false,
            player,
            roster,
            power: PowerModeController::new(
                config.power_duration_ms,
                config.recovery_threshold_ms,
                config.pursuer_respawn_delay_ms,
            ),
            tweens: MotionInterpolator::new(),
            positions: BTreeMap::new(),
            teleport: TeleportRouter::new(config.teleport_cooldown_ms, config.teleport_search_rows),
            bonus: BonusSpawner::new(config.bonus_timing()),
            score: ScoreKeeper::new(config.score_values()),
            lives: LifeTracker::new(config.max_lives),
            countdown: Countdown::new(config.countdown_timings()),
            high_score: None,
            new_high_score: false,
            pending_input: None,
            overlaps: Vec::new(),
            events: Vec::new(),
            pursuer_cells_prev: BTreeMap::new(),
            respawn_at_ms: None,
            pending_end: None,
            round_running: false,
            ended: false,
            end_reason: None,
            tick_counter: 0,
            now_ms: 0,
            game_time_ms: 0,
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn load_maze(&mut self, quadrant: Vec<Vec<u8>>) -> Result<(), LayoutError> {
        Grid::generate(&quadrant)?;
        self.quadrant = quadrant;
        self.restart_level();
        Ok(())
    }

    pub fn attach_high_score_store(&mut self, store: HighScoreStore) {
        self.high_score = Some(store);
    }

    pub fn high_score(&self) -> Option<HighScoreRecord> {
        self.high_score.as_ref().map(HighScoreStore::best)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.maze.as_ref()
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn roster(&self) -> &PursuerRoster {
        &self.roster
    }

    pub fn power(&self) -> &PowerModeController {
        &self.power
    }

    pub fn tweens(&self) -> &MotionInterpolator {
        &self.tweens
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives.lives()
    }

    pub fn teleporters(&self) -> Option<(GridPos, GridPos)> {
        self.teleport.pair()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_round_running(&self) -> bool {
        self.round_running
    }

    pub fn is_dying(&self) -> bool {
        self.respawn_at_ms.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn queue_input(&mut self, dir: Direction) {
        self.pending_input = Some(dir);
    }

    pub fn push_overlap(&mut self, event: OverlapEvent) {
        self.overlaps.push(event);
    }

    pub fn move_pursuer(&mut self, id: &str, to: GridPos) -> Result<(), PursuerMoveError> {
        let grid = self.maze.as_ref().ok_or(PursuerMoveError::MazeNotReady)?;
        let from = self.roster.step(id, to, grid)?;
        self.tweens.schedule(
            ActorId::Pursuer(id.to_string()),
            from.to_point(),
            to.to_point(),
            self.now_ms,
            self.config.pursuer_step_ms,
            Easing::Smoothstep,
        );
        Ok(())
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let now_ms = self.now_ms;

        if !self.ensure_setup() {
            return;
        }
        if !self.countdown.is_finished() && self.countdown.advance(dt_ms, &mut self.events) {
            self.start_round(now_ms);
        }
        if let Some(dir) = self.pending_input.take() {
            self.player.request(dir);
        }
        if self.respawn_at_ms.is_some_and(|at| now_ms >= at) {
            self.finish_respawn();
        }

        let player_before = self.player.position();
        self.update_player(now_ms);
        self.update_motion(now_ms);
        self.detect_overlaps(player_before);
        self.resolve_overlaps(now_ms);
        self.update_power(dt_ms, now_ms);
        if self.round_running && self.config.bonus_enabled && !self.is_dying() {
            self.bonus
                .tick(now_ms, &mut self.rng, &mut self.tweens, &mut self.events);
        }

        if self.round_running {
            self.game_time_ms = self.game_time_ms.saturating_add(dt_ms);
        }
        if let Some(reason) = self.pending_end.take() {
            self.finish_game(reason);
        }
        self.pursuer_cells_prev = self
            .roster
            .iter()
            .map(|pursuer| (pursuer.id.clone(), pursuer.position))
            .collect();
    }

    pub fn restart_level(&mut self) {
        self.maze = match Grid::generate(&self.quadrant) {
            Ok(grid) => Some(grid),
            Err(err) => {
                error!("maze layout rejected on restart: {err}");
                None
            }
        };
        self.setup_done = false;
        self.tweens.clear();
        self.player.reset_level(&mut self.tweens);
        self.player.set_movement_enabled(false);
        self.roster.reset_all_to_spawn();
        self.roster.set_movement_enabled(false);
        self.power.reset(&mut self.roster);
        self.bonus.reset(&mut self.tweens);
        self.teleport.reset_cooldown();
        self.lives.reset();
        self.countdown.restart();
        self.new_high_score = false;
        self.pending_input = None;
        self.overlaps.clear();
        self.respawn_at_ms = None;
        self.pending_end = None;
        self.round_running = false;
        self.ended = false;
        self.end_reason = None;
        self.game_time_ms = 0;
        self.sync_positions();
        info!("level restarted");
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let render = self.player_render_point();
        let snapshot = Snapshot {
            tick: self.tick_counter,
            now_ms: self.now_ms,
            game_time_ms: self.game_time_ms,
            score: self.score.score(),
            lives: self.lives.lives(),
            remaining_pellets: self.score.remaining_pellets(),
            power: self.power.view(),
            player: PlayerView {
                x: self.player.position().x,
                y: self.player.position().y,
                dir: self.player.facing(),
                moving: self.tweens.is_tweening(&ActorId::Player),
                movement_enabled: self.player.movement_enabled(),
                render_x: render.x,
                render_y: render.y,
            },
            pursuers: self.roster.views(),
            bonus: self.bonus.view(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason,
            score: self.score.score(),
            game_time_ms: self.game_time_ms,
            lives_left: self.lives.lives(),
            pellets_eaten: self.score.pellets_eaten(),
            total_pellets: self.score.total_pellets(),
            pursuers_eliminated: self.score.eliminations(),
            bonuses_collected: self.score.bonuses(),
            new_high_score: self.new_high_score,
        }
    }

    fn player_render_point(&self) -> Vec2 {
        self.positions
            .get(&ActorId::Player)
            .copied()
            .unwrap_or_else(|| self.player.position().to_point())
    }

    fn ensure_setup(&mut self) -> bool {
        let Some(grid) = self.maze.as_ref() else {
            debug!("no maze loaded, deferring tick {}", self.tick_counter);
            return false;
        };
        if self.setup_done {
            return true;
        }
        let radius = self.config.spawn_search_radius;
        let (rows, cols) = (grid.rows(), grid.cols());
        self.player.ensure_walkable_spawn(grid, radius);
        self.roster.ensure_passable_spawns(grid, radius);
        self.teleport.discover(grid);
        self.bonus.set_bounds(rows, cols);
        self.score.reset(grid.count_pellets());
        self.sync_positions();
        self.setup_done = true;
        info!(
            "maze ready: {rows}x{cols} with {} pellets",
            self.score.total_pellets()
        );
        true
    }

    fn sync_positions(&mut self) {
        self.positions.clear();
        self.positions
            .insert(ActorId::Player, self.player.position().to_point());
        for pursuer in self.roster.iter() {
            self.positions.insert(
                ActorId::Pursuer(pursuer.id.clone()),
                pursuer.position.to_point(),
            );
        }
    }

    fn start_round(&mut self, now_ms: u64) {
        self.round_running = true;
        self.player.set_movement_enabled(true);
        self.roster.set_movement_enabled(true);
        if self.config.bonus_enabled {
            self.bonus.arm(now_ms);
        }
    }

    fn update_player(&mut self, now_ms: u64) {
        let Some(grid) = self.maze.as_mut() else {
            return;
        };
        match self.player.try_move(now_ms, grid, &mut self.tweens) {
            MoveOutcome::Started(step) => {
                self.events.push(GameEvent::MovementStarted {
                    from: step.from,
                    to: step.to,
                    dir: step.dir,
                });
                if let Some(kind) = step.pellet {
                    self.apply_pellet(kind, step.to);
                }
            }
            MoveOutcome::Bumped { wall } => {
                self.events.push(GameEvent::WallBumped {
                    x: wall.x,
                    y: wall.y,
                });
            }
            MoveOutcome::Blocked | MoveOutcome::Waiting => {}
        }
    }

    fn apply_pellet(&mut self, kind: PelletKind, cell: GridPos) {
        let cleared = match kind {
            PelletKind::Regular => {
                self.events.push(GameEvent::PelletEaten {
                    x: cell.x,
                    y: cell.y,
                });
                self.score.add_pellet_score()
            }
            PelletKind::Power => {
                self.events.push(GameEvent::PowerPelletEaten {
                    x: cell.x,
                    y: cell.y,
                });
                let cleared = self.score.add_power_pellet_score();
                self.power.activate(&mut self.roster, &mut self.events);
                cleared
            }
        };
        if cleared && self.pending_end.is_none() {
            self.events.push(GameEvent::LevelCleared);
            self.pending_end = Some(GameOverReason::LevelCleared);
        }
    }

    fn update_motion(&mut self, now_ms: u64) {
        let completed = self.tweens.tick(now_ms, &mut self.positions);
        if completed.contains(&ActorId::Player) {
            let cell = self.player.position();
            if self.teleport.is_teleporter(cell) {
                self.overlaps.push(OverlapEvent::new("Teleporter", cell));
            }
        }
        self.bonus
            .sync(&self.positions, &completed, &mut self.tweens, &mut self.events);
    }

    fn detect_overlaps(&mut self, player_before: GridPos) {
        if self.is_dying() || !self.round_running {
            return;
        }
        let player_now = self.player.position();
        for pursuer in self.roster.iter() {
            if !pursuer.collision_enabled {
                continue;
            }
            let prev = self
                .pursuer_cells_prev
                .get(&pursuer.id)
                .copied()
                .unwrap_or(pursuer.position);
            let same_cell = pursuer.position == player_now;
            let swapped =
                player_before != player_now && pursuer.position == player_before && prev == player_now;
            if same_cell || swapped {
                self.overlaps
                    .push(OverlapEvent::pursuer(pursuer.id.clone(), player_now));
            }
        }

        let render = self.player_render_point();
        if self
            .bonus
            .touches(render, self.config.player_contact_radius)
        {
            self.overlaps.push(OverlapEvent::new("Cherry", player_now));
        }
    }

    fn resolve_overlaps(&mut self, now_ms: u64) {
        let queued = std::mem::take(&mut self.overlaps);
        if !self.round_running {
            if !queued.is_empty() {
                debug!("dropped {} overlaps before the round started", queued.len());
            }
            return;
        }
        for event in queued {
            let outcome = resolve(&event, &self.roster);
            self.apply_outcome(outcome, now_ms);
        }
    }

    fn apply_outcome(&mut self, outcome: CollisionOutcome, now_ms: u64) {
        match outcome {
            CollisionOutcome::WallBump { cell } => {
                if self.player.note_wall_contact() {
                    self.events.push(GameEvent::WallBumped {
                        x: cell.x,
                        y: cell.y,
                    });
                }
            }
            CollisionOutcome::Pickup { cell } => {
                if cell != self.player.position() {
                    debug!("pellet overlap at {cell} away from the player ignored");
                    return;
                }
                let Some(grid) = self.maze.as_mut() else {
                    return;
                };
                if let Some(kind) = self.player.claim_pellet(grid, cell) {
                    self.apply_pellet(kind, cell);
                }
            }
            CollisionOutcome::LifeLost { pursuer_id } => {
                debug!("caught by {pursuer_id}");
                self.lose_life(now_ms);
            }
            CollisionOutcome::Eliminate { pursuer_id } => {
                if self
                    .power
                    .eliminate(&pursuer_id, now_ms, &mut self.roster, &mut self.events)
                {
                    self.score.add_elimination_score();
                    self.tweens.cancel(&ActorId::Pursuer(pursuer_id));
                }
            }
            CollisionOutcome::Teleport { cell } => self.teleport_player(cell, now_ms),
            CollisionOutcome::BonusCollected => {
                if self
                    .bonus
                    .collect(&mut self.tweens, &mut self.events)
                    .is_some()
                {
                    self.score.add_bonus_score();
                }
            }
            CollisionOutcome::Ignored => {}
        }
    }

    fn teleport_player(&mut self, cell: GridPos, now_ms: u64) {
        if cell != self.player.position() {
            warn!(
                "teleporter overlap at {cell} but the player is at {}",
                self.player.position()
            );
            return;
        }
        let Some(target) = self.teleport.try_teleport(cell, now_ms) else {
            return;
        };
        self.player.teleport_to(target, &mut self.tweens);
        self.positions.insert(ActorId::Player, target.to_point());
        self.events.push(GameEvent::Teleported {
            from: cell,
            to: target,
        });
        if let Some(grid) = self.maze.as_mut() {
            if let Some(kind) = self.player.claim_pellet(grid, target) {
                self.apply_pellet(kind, target);
            }
        }
    }

    fn lose_life(&mut self, now_ms: u64) {
        if self.is_dying() || self.pending_end.is_some() {
            return;
        }
        let outcome = self.lives.lose_life();
        self.events.push(GameEvent::LifeLost {
            lives_left: self.lives.lives(),
        });
        self.player.set_movement_enabled(false);
        self.roster.set_movement_enabled(false);
        self.tweens.cancel(&ActorId::Player);
        match outcome {
            LifeOutcome::GameOver => {
                self.pending_end = Some(GameOverReason::OutOfLives);
            }
            LifeOutcome::Respawn { lives_left } => {
                let at = now_ms.saturating_add(self.config.death_delay_ms());
                info!("{lives_left} lives left, respawning at {at}ms");
                self.respawn_at_ms = Some(at);
            }
        }
    }

    fn finish_respawn(&mut self) {
        self.respawn_at_ms = None;
        self.player.reset_to_start(&mut self.tweens);
        self.player.set_movement_enabled(true);
        for pursuer in self.roster.iter() {
            self.tweens.cancel(&ActorId::Pursuer(pursuer.id.clone()));
        }
        self.roster.reset_all_to_spawn();
        self.roster.set_movement_enabled(true);
        self.power.reset(&mut self.roster);
        self.sync_positions();
        self.pursuer_cells_prev.clear();
        self.events.push(GameEvent::PlayerRespawned);
    }

    fn update_power(&mut self, dt_ms: u64, now_ms: u64) {
        self.power.tick(dt_ms, &mut self.roster, &mut self.events);
        let respawned = self
            .power
            .update_respawns(now_ms, &mut self.roster, &mut self.events);
        for id in respawned {
            let Some(spawn) = self.roster.get(&id).map(|pursuer| pursuer.spawn) else {
                continue;
            };
            let key = ActorId::Pursuer(id);
            self.tweens.cancel(&key);
            self.positions.insert(key, spawn.to_point());
        }
    }

    fn finish_game(&mut self, reason: GameOverReason) {
        self.ended = true;
        self.end_reason = Some(reason);
        self.round_running = false;
        self.respawn_at_ms = None;
        self.player.set_movement_enabled(false);
        self.roster.set_movement_enabled(false);
        self.bonus.disarm();
        info!(
            "game over ({reason:?}): score {} in {}",
            self.score.score(),
            format_time(self.game_time_ms)
        );
        self.events.push(GameEvent::GameOver { reason });
        if let Some(store) = self.high_score.as_mut() {
            self.new_high_score = store.submit(self.score.score(), self.game_time_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::constants::{default_quadrant, TICK_MS};
    use crate::types::ThreatState;

    fn quick_config(quadrant: Vec<Vec<u8>>, start: GridPos, spawns: Vec<GridPos>) -> GameConfig {
        GameConfig {
            countdown_initial_wait_ms: 0,
            countdown_step_ms: 0,
            countdown_go_ms: 0,
            bonus_enabled: false,
            player_start: start,
            pursuer_spawns: spawns,
            quadrant,
            ..GameConfig::default()
        }
    }

    // r0: 2 2 2 2 2 2 2 2
    // r1: 2 0 0 5 5 0 0 2
    // r2: 2 0 0 5 5 0 0 2
    // r3: 2 5 5 5 5 5 5 2
    // r4/r5/r6 mirror r2/r1/r0
    fn room_quadrant() -> Vec<Vec<u8>> {
        vec![
            vec![2, 2, 2, 2],
            vec![2, 0, 0, 5],
            vec![2, 0, 0, 5],
            vec![2, 5, 5, 5],
        ]
    }

    // r0: 2 2 2 2 2 2 2 2
    // r1: 2 0 6 2 2 6 0 2
    // r2: 2 2 2 2 2 2 2 2
    // r3: 2 0 0 0 0 0 0 2
    // r4/r5/r6 mirror r2/r1/r0
    fn power_quadrant() -> Vec<Vec<u8>> {
        vec![
            vec![2, 2, 2, 2],
            vec![2, 0, 6, 2],
            vec![2, 2, 2, 2],
            vec![2, 0, 0, 0],
        ]
    }

    fn power_engine() -> GameEngine {
        GameEngine::new(
            quick_config(
                power_quadrant(),
                GridPos::new(1, 1),
                vec![GridPos::new(1, 3), GridPos::new(6, 3)],
            ),
            7,
        )
    }

    fn run_until(engine: &mut GameEngine, max_ticks: usize, done: impl Fn(&GameEngine) -> bool) -> bool {
        for _ in 0..max_ticks {
            engine.step(TICK_MS);
            if done(engine) {
                return true;
            }
        }
        false
    }

    fn threat(engine: &GameEngine, id: &str) -> ThreatState {
        engine.roster().get(id).map(|p| p.threat).expect("pursuer")
    }

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("high-score.json")
    }

    #[test]
    fn open_room_pellet_scores_exactly_once() {
        let grid = Grid::generate(&room_quadrant()).expect("valid quadrant");
        for row in 1..=2 {
            for col in 1..=2 {
                assert_eq!(grid.cell(GridPos::new(col, row)), Some(crate::types::Cell::Empty));
            }
        }

        let mut engine = GameEngine::new(quick_config(room_quadrant(), GridPos::new(2, 1), vec![]), 1);
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.player().position(), GridPos::new(3, 1));
        assert_eq!(engine.score().score(), 10);
        let total = engine.score().total_pellets();
        assert_eq!(total, 14);

        engine.queue_input(Direction::Left);
        assert!(run_until(&mut engine, 100, |e| e.player().position() == GridPos::new(2, 1)));
        engine.queue_input(Direction::Right);
        assert!(run_until(&mut engine, 100, |e| e.player().position() == GridPos::new(3, 1)));

        assert_eq!(engine.score().score(), 10);
        assert_eq!(engine.score().remaining_pellets(), total - 1);

        // a physics-side pickup report for the same cell changes nothing
        engine.push_overlap(OverlapEvent::new("Pellet", GridPos::new(3, 1)));
        engine.step(TICK_MS);
        assert_eq!(engine.score().score(), 10);
    }

    #[test]
    fn power_pellet_timeline_runs_ten_seconds_with_recovery_at_seven() {
        let mut engine = power_engine();
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        assert!(engine.power().is_active());
        assert_eq!(engine.score().score(), 50);
        assert_eq!(threat(&engine, "pursuer-1"), ThreatState::Scared);
        assert_eq!(engine.power().remaining_ms(), 10_000 - TICK_MS);

        engine.step(7_000 - TICK_MS);
        assert_eq!(engine.power().remaining_ms(), 3_000);
        assert!(engine.roster().iter().all(|p| p.threat == ThreatState::Recovering));

        engine.step(2_999);
        assert!(engine.power().is_active());
        assert_eq!(threat(&engine, "pursuer-2"), ThreatState::Recovering);

        engine.step(1);
        assert!(!engine.power().is_active());
        assert!(engine.roster().iter().all(|p| p.threat == ThreatState::Normal));

        let events = engine.build_snapshot(true).events;
        let recovering = events
            .iter()
            .filter(|event| matches!(event, GameEvent::PowerModeRecovering { .. }))
            .count();
        assert_eq!(recovering, 1);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::PowerModeExited)));
    }

    #[test]
    fn scared_pursuer_is_eliminated_and_respawns_scared() {
        let mut engine = power_engine();
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);

        engine.push_overlap(OverlapEvent::pursuer("pursuer-1", GridPos::new(1, 3)));
        engine.step(TICK_MS);
        assert_eq!(engine.score().score(), 50 + 300);
        assert_eq!(threat(&engine, "pursuer-1"), ThreatState::Dead);
        assert!(!engine.roster().get("pursuer-1").expect("pursuer").collision_enabled);

        // a second report while dead is ignored
        engine.push_overlap(OverlapEvent::pursuer("pursuer-1", GridPos::new(1, 3)));
        engine.step(TICK_MS);
        assert_eq!(engine.score().score(), 350);

        engine.step(3_000 - TICK_MS);
        assert_eq!(threat(&engine, "pursuer-1"), ThreatState::Scared);
        assert!(engine.roster().get("pursuer-1").expect("pursuer").collision_enabled);
        assert_eq!(engine.build_summary().pursuers_eliminated, 1);
    }

    #[test]
    fn caught_player_respawns_after_death_animation() {
        let mut engine = power_engine();
        engine.step(TICK_MS);
        engine.push_overlap(OverlapEvent::pursuer("pursuer-2", GridPos::new(6, 3)));
        engine.step(TICK_MS);
        assert_eq!(engine.lives(), 2);
        assert!(engine.is_dying());
        assert!(!engine.player().movement_enabled());

        // contacts during the death animation cost nothing
        engine.push_overlap(OverlapEvent::pursuer("pursuer-2", GridPos::new(6, 3)));
        engine.step(TICK_MS);
        assert_eq!(engine.lives(), 2);

        engine.step(1_200);
        assert!(!engine.is_dying());
        assert_eq!(engine.player().position(), GridPos::new(1, 1));
        assert!(!engine.player().has_input());
        assert!(engine.player().movement_enabled());
        assert!(engine.roster().iter().all(|p| p.threat == ThreatState::Normal));
        assert!(!engine.power().is_active());
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::PlayerRespawned)));
    }

    #[test]
    fn losing_every_life_ends_the_game() {
        let mut engine = power_engine();
        engine.step(TICK_MS);
        for expected in [2, 1] {
            engine.push_overlap(OverlapEvent::pursuer("pursuer-1", GridPos::new(1, 3)));
            engine.step(TICK_MS);
            assert_eq!(engine.lives(), expected);
            engine.step(1_200);
        }
        engine.push_overlap(OverlapEvent::pursuer("pursuer-1", GridPos::new(1, 3)));
        engine.step(TICK_MS);
        assert!(engine.is_ended());
        assert_eq!(engine.end_reason(), Some(GameOverReason::OutOfLives));
        let summary = engine.build_summary();
        assert_eq!(summary.lives_left, 0);
        assert_eq!(summary.reason, Some(GameOverReason::OutOfLives));

        let tick = engine.build_snapshot(false).tick;
        engine.step(TICK_MS);
        assert_eq!(engine.build_snapshot(false).tick, tick);
    }

    #[test]
    fn grid_contact_and_swap_are_detected() {
        let mut engine = GameEngine::new(
            quick_config(power_quadrant(), GridPos::new(1, 3), vec![GridPos::new(2, 3)]),
            3,
        );
        engine.step(TICK_MS);
        assert_eq!(engine.lives(), 3);

        engine
            .move_pursuer("pursuer-1", GridPos::new(1, 3))
            .expect("pursuer step");
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.player().position(), GridPos::new(2, 3));
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn scared_pursuer_on_player_cell_is_eaten() {
        let mut engine = power_engine();
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        if let Some(pursuer) = engine.roster.get_mut("pursuer-1") {
            pursuer.position = GridPos::new(2, 1);
        }
        engine.step(TICK_MS);
        assert_eq!(threat(&engine, "pursuer-1"), ThreatState::Dead);
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn walking_into_the_seam_teleports_to_the_other_side() {
        let mut engine = GameEngine::new(
            quick_config(
                default_quadrant(),
                GridPos::new(1, 14),
                crate::constants::DEFAULT_PURSUER_SPAWNS.to_vec(),
            ),
            5,
        );
        engine.queue_input(Direction::Left);
        engine.step(TICK_MS);
        assert_eq!(
            engine.teleporters(),
            Some((GridPos::new(0, 14), GridPos::new(27, 14)))
        );
        assert_eq!(engine.player().position(), GridPos::new(0, 14));

        assert!(run_until(&mut engine, 60, |e| e.player().position()
            == GridPos::new(27, 14)));
        let events = engine.build_snapshot(true).events;
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::Teleported { from, to }
                if *from == GridPos::new(0, 14) && *to == GridPos::new(27, 14)
        )));

        assert!(run_until(&mut engine, 10, |e| e.player().position()
            == GridPos::new(26, 14)));
    }

    #[test]
    fn clearing_the_level_ends_the_game_and_records_high_score() {
        let path = temp_file("maze-chase-engine-clear");
        let mut engine = GameEngine::new(
            quick_config(vec![vec![2, 2], vec![2, 5]], GridPos::new(1, 1), vec![]),
            9,
        );
        engine.attach_high_score_store(HighScoreStore::new(path.clone()));

        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.score().remaining_pellets(), 1);
        engine.queue_input(Direction::Left);
        assert!(run_until(&mut engine, 100, GameEngine::is_ended));

        assert_eq!(engine.end_reason(), Some(GameOverReason::LevelCleared));
        let summary = engine.build_summary();
        assert_eq!(summary.score, 20);
        assert_eq!(summary.pellets_eaten, 2);
        assert!(summary.new_high_score);
        assert_eq!(engine.high_score().map(|best| best.score), Some(20));

        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::LevelCleared)));
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver {
                reason: GameOverReason::LevelCleared
            })
        ));

        let _ = fs::remove_file(&path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn missing_maze_defers_until_loaded() {
        let mut engine = GameEngine::new(quick_config(vec![], GridPos::new(1, 1), vec![]), 2);
        for _ in 0..3 {
            engine.queue_input(Direction::Right);
            engine.step(TICK_MS);
        }
        assert!(engine.grid().is_none());
        assert!(!engine.is_round_running());
        assert!(engine.build_snapshot(true).events.is_empty());

        assert_eq!(
            engine.load_maze(vec![vec![2, 2, 2], vec![2, 5]]),
            Err(LayoutError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        engine
            .load_maze(room_quadrant())
            .expect("valid quadrant loads");
        engine.step(TICK_MS);
        assert!(engine.grid().is_some());
        assert!(engine.is_round_running());
        assert_eq!(engine.score().total_pellets(), 14);
    }

    #[test]
    fn countdown_holds_the_player_until_go() {
        let config = GameConfig {
            bonus_enabled: false,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 4);
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        assert!(matches!(
            engine.move_pursuer("pursuer-1", GridPos::new(13, 13)),
            Err(PursuerMoveError::MovementDisabled(_))
        ));

        assert!(!run_until(&mut engine, 300, |e| e.player().position()
            != GridPos::new(1, 1)));
        assert!(run_until(&mut engine, 60, |e| e.player().position()
            == GridPos::new(2, 1)));
        assert!(engine.is_round_running());

        let labels: Vec<String> = engine
            .build_snapshot(true)
            .events
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::CountdownTick { label } => Some(label),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["3", "2", "1", "GO!"]);

        engine
            .move_pursuer("pursuer-1", GridPos::new(13, 13))
            .expect("pursuer step");
        assert!(engine
            .tweens()
            .is_tweening(&ActorId::Pursuer("pursuer-1".to_string())));
    }

    #[test]
    fn start_cell_at_the_i32_edge_is_left_in_place() {
        let mut engine = GameEngine::new(
            quick_config(room_quadrant(), GridPos::new(i32::MAX, 1), vec![]),
            13,
        );
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        engine.step(TICK_MS);
        assert_eq!(engine.player().position(), GridPos::new(i32::MAX, 1));
        assert_eq!(engine.score().score(), 0);
        assert!(!engine.is_ended());
    }

    #[test]
    fn contacts_reported_during_countdown_are_dropped() {
        let config = GameConfig {
            bonus_enabled: false,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 11);
        engine.step(TICK_MS);
        assert!(!engine.is_round_running());

        engine.push_overlap(OverlapEvent::pursuer("pursuer-1", GridPos::new(12, 13)));
        engine.step(TICK_MS);
        assert_eq!(engine.lives(), 3);
        assert!(!engine.is_dying());

        assert!(run_until(&mut engine, 400, GameEngine::is_round_running));
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.score().score(), 0);
    }

    #[test]
    fn restart_level_restores_pellets_score_and_lives() {
        let mut engine = power_engine();
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);
        engine.push_overlap(OverlapEvent::pursuer("pursuer-2", GridPos::new(6, 3)));
        engine.step(TICK_MS);

        engine.restart_level();
        engine.step(TICK_MS);
        assert_eq!(engine.score().score(), 0);
        assert_eq!(engine.score().remaining_pellets(), 4);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.player().position(), GridPos::new(1, 1));
        assert_eq!(engine.player().collected_count(), 0);
        assert!(!engine.power().is_active());
        assert!(engine.roster().iter().all(|p| p.threat == ThreatState::Normal));
    }

    #[test]
    fn snapshot_serializes_and_drains_events() {
        let mut engine = power_engine();
        engine.queue_input(Direction::Right);
        engine.step(TICK_MS);

        let snapshot = engine.build_snapshot(true);
        assert!(!snapshot.events.is_empty());
        let value = serde_json::to_value(&snapshot).expect("serialize snapshot");
        assert_eq!(value["player"]["x"], 2);
        assert!(value["player"]["renderX"].is_number());
        assert_eq!(value["power"]["active"], true);
        assert_eq!(value["pursuers"][0]["state"], "scared");

        assert!(engine.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn bonus_spawns_after_delay_once_round_runs() {
        let config = GameConfig {
            bonus_enabled: true,
            ..quick_config(default_quadrant(), GridPos::new(1, 1), vec![])
        };
        let mut engine = GameEngine::new(config, 21);
        engine.step(TICK_MS);
        assert!(engine.build_snapshot(false).bonus.is_none());
        assert!(run_until(&mut engine, 400, |e| e.bonus.live().is_some()));
        assert!(engine.now_ms() >= 5_000);
        let bonus = engine.build_snapshot(true).bonus.expect("bonus view");
        assert_eq!(bonus.id, 1);
    }
}

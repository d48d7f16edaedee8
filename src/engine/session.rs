use log::{debug, info};

use crate::types::GameEvent;

const COUNTDOWN_LABELS: [&str; 4] = ["3", "2", "1", "GO!"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreValues {
    pub pellet: u32,
    pub power_pellet: u32,
    pub bonus: u32,
    pub elimination: u32,
}

#[derive(Clone, Debug)]
pub struct ScoreKeeper {
    values: ScoreValues,
    score: u32,
    total_pellets: u32,
    remaining_pellets: u32,
    pellets_eaten: u32,
    eliminations: u32,
    bonuses: u32,
}

impl ScoreKeeper {
    pub fn new(values: ScoreValues) -> Self {
        Self {
            values,
            score: 0,
            total_pellets: 0,
            remaining_pellets: 0,
            pellets_eaten: 0,
            eliminations: 0,
            bonuses: 0,
        }
    }

    pub fn reset(&mut self, total_pellets: u32) {
        self.score = 0;
        self.total_pellets = total_pellets;
        self.remaining_pellets = total_pellets;
        self.pellets_eaten = 0;
        self.eliminations = 0;
        self.bonuses = 0;
        debug!("score reset with {total_pellets} pellets");
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_pellets(&self) -> u32 {
        self.total_pellets
    }

    pub fn remaining_pellets(&self) -> u32 {
        self.remaining_pellets
    }

    pub fn pellets_eaten(&self) -> u32 {
        self.pellets_eaten
    }

    pub fn eliminations(&self) -> u32 {
        self.eliminations
    }

    pub fn bonuses(&self) -> u32 {
        self.bonuses
    }

    pub fn is_level_clear(&self) -> bool {
        self.total_pellets > 0 && self.remaining_pellets == 0
    }

    pub fn add_pellet_score(&mut self) -> bool {
        self.score = self.score.saturating_add(self.values.pellet);
        self.consume_pellet()
    }

    pub fn add_power_pellet_score(&mut self) -> bool {
        self.score = self.score.saturating_add(self.values.power_pellet);
        self.consume_pellet()
    }

    pub fn add_bonus_score(&mut self) {
        self.score = self.score.saturating_add(self.values.bonus);
        self.bonuses += 1;
    }

    pub fn add_elimination_score(&mut self) {
        self.score = self.score.saturating_add(self.values.elimination);
        self.eliminations += 1;
    }

    fn consume_pellet(&mut self) -> bool {
        if self.remaining_pellets == 0 {
            return false;
        }
        self.remaining_pellets -= 1;
        self.pellets_eaten += 1;
        if self.remaining_pellets == 0 {
            info!("all {} pellets eaten", self.total_pellets);
            return true;
        }
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeOutcome {
    Respawn { lives_left: u32 },
    GameOver,
}

#[derive(Clone, Debug)]
pub struct LifeTracker {
    max_lives: u32,
    lives: u32,
}

impl LifeTracker {
    pub fn new(max_lives: u32) -> Self {
        Self {
            max_lives,
            lives: max_lives,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    pub fn lose_life(&mut self) -> LifeOutcome {
        self.lives = self.lives.saturating_sub(1);
        info!("life lost, {} left", self.lives);
        if self.lives == 0 {
            LifeOutcome::GameOver
        } else {
            LifeOutcome::Respawn {
                lives_left: self.lives,
            }
        }
    }

    pub fn reset(&mut self) {
        self.lives = self.max_lives;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountdownTimings {
    pub initial_wait_ms: u64,
    pub step_ms: u64,
    pub go_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Countdown {
    timings: CountdownTimings,
    elapsed_ms: u64,
    next_label: usize,
    finished: bool,
}

impl Countdown {
    pub fn new(timings: CountdownTimings) -> Self {
        Self {
            timings,
            elapsed_ms: 0,
            next_label: 0,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
        self.next_label = 0;
        self.finished = false;
    }

    fn label_at(&self, idx: usize) -> u64 {
        self.timings.initial_wait_ms + self.timings.step_ms * idx as u64
    }

    fn end_ms(&self) -> u64 {
        self.label_at(COUNTDOWN_LABELS.len() - 1) + self.timings.go_ms
    }

    pub fn advance(&mut self, dt_ms: u64, events: &mut Vec<GameEvent>) -> bool {
        if self.finished {
            return false;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        while self.next_label < COUNTDOWN_LABELS.len()
            && self.elapsed_ms >= self.label_at(self.next_label)
        {
            let label = COUNTDOWN_LABELS[self.next_label];
            debug!("countdown {label}");
            events.push(GameEvent::CountdownTick {
                label: label.to_string(),
            });
            self.next_label += 1;
        }
        if self.next_label == COUNTDOWN_LABELS.len() && self.elapsed_ms >= self.end_ms() {
            self.finished = true;
            info!("round started");
            events.push(GameEvent::RoundStarted);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> ScoreValues {
        ScoreValues {
            pellet: 10,
            power_pellet: 50,
            bonus: 100,
            elimination: 300,
        }
    }

    fn labels(events: &[GameEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::CountdownTick { label } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn last_pellet_clears_the_level() {
        let mut score = ScoreKeeper::new(values());
        score.reset(3);
        assert!(!score.add_pellet_score());
        assert!(!score.add_power_pellet_score());
        score.add_elimination_score();
        score.add_bonus_score();
        assert!(score.add_pellet_score());
        assert!(score.is_level_clear());
        assert_eq!(score.score(), 10 + 50 + 300 + 100 + 10);
        assert_eq!(score.pellets_eaten(), 3);
        assert!(!score.add_pellet_score());
        assert_eq!(score.pellets_eaten(), 3);
    }

    #[test]
    fn lives_run_out_after_three_losses() {
        let mut lives = LifeTracker::new(3);
        assert_eq!(lives.lose_life(), LifeOutcome::Respawn { lives_left: 2 });
        assert_eq!(lives.lose_life(), LifeOutcome::Respawn { lives_left: 1 });
        assert_eq!(lives.lose_life(), LifeOutcome::GameOver);
        assert_eq!(lives.lives(), 0);
        lives.reset();
        assert_eq!(lives.lives(), 3);
    }

    #[test]
    fn countdown_emits_labels_on_schedule() {
        let mut countdown = Countdown::new(CountdownTimings {
            initial_wait_ms: 2_000,
            step_ms: 1_000,
            go_ms: 500,
        });
        let mut events = Vec::new();

        assert!(!countdown.advance(1_999, &mut events));
        assert!(labels(&events).is_empty());
        countdown.advance(1, &mut events);
        assert_eq!(labels(&events), vec!["3"]);
        countdown.advance(2_000, &mut events);
        assert_eq!(labels(&events), vec!["3", "2", "1"]);
        assert!(!countdown.advance(1_000, &mut events));
        assert_eq!(labels(&events), vec!["3", "2", "1", "GO!"]);
        assert!(countdown.advance(500, &mut events));
        assert!(countdown.is_finished());
        assert!(matches!(events.last(), Some(GameEvent::RoundStarted)));
        assert!(!countdown.advance(1_000, &mut events));
    }

    #[test]
    fn zero_countdown_starts_on_first_tick() {
        let mut countdown = Countdown::new(CountdownTimings {
            initial_wait_ms: 0,
            step_ms: 0,
            go_ms: 0,
        });
        let mut events = Vec::new();
        assert!(countdown.advance(0, &mut events));
        assert_eq!(labels(&events).len(), 4);
    }
}

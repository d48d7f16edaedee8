use log::{debug, info, warn};

use super::pursuer::PursuerRoster;
use crate::types::{GameEvent, PowerView, ThreatState};

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingRespawn {
    pursuer_id: String,
    due_ms: u64,
}

/// Global power-pellet timer and the pursuer threat states it drives.
///
/// Recovery is a one-shot edge per activation: pursuers that are Scared when
/// the timer first drops to the threshold become Recovering, nothing else is
/// enforced afterwards. Dead pursuers are only touched by their own respawn.
#[derive(Clone, Debug)]
pub struct PowerModeController {
    duration_ms: u64,
    recovery_threshold_ms: u64,
    respawn_delay_ms: u64,
    active: bool,
    remaining_ms: u64,
    recovery_triggered: bool,
    pending_respawns: Vec<PendingRespawn>,
}

impl PowerModeController {
    pub fn new(duration_ms: u64, recovery_threshold_ms: u64, respawn_delay_ms: u64) -> Self {
        Self {
            duration_ms,
            recovery_threshold_ms,
            respawn_delay_ms,
            active: false,
            remaining_ms: 0,
            recovery_triggered: false,
            pending_respawns: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn recovery_triggered(&self) -> bool {
        self.recovery_triggered
    }

    pub fn pending_respawns(&self) -> usize {
        self.pending_respawns.len()
    }

    pub fn view(&self) -> PowerView {
        PowerView {
            active: self.active,
            remaining_ms: self.remaining_ms,
            recovery_triggered: self.recovery_triggered,
        }
    }

    pub fn activate(&mut self, roster: &mut PursuerRoster, events: &mut Vec<GameEvent>) {
        if self.active {
            debug!(
                "power mode restarted with {}ms left, recovery fired: {}",
                self.remaining_ms, self.recovery_triggered
            );
        }
        self.active = true;
        self.remaining_ms = self.duration_ms;
        self.recovery_triggered = false;
        for pursuer in roster.iter_mut() {
            if pursuer.threat != ThreatState::Dead {
                pursuer.set_threat(ThreatState::Scared);
            }
        }
        info!("power mode entered for {}ms", self.duration_ms);
        events.push(GameEvent::PowerModeEntered {
            duration_ms: self.duration_ms,
        });
    }

    pub fn tick(&mut self, dt_ms: u64, roster: &mut PursuerRoster, events: &mut Vec<GameEvent>) {
        if !self.active {
            return;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);

        if !self.recovery_triggered
            && self.remaining_ms > 0
            && self.remaining_ms <= self.recovery_threshold_ms
        {
            self.recovery_triggered = true;
            let mut changed = 0;
            for pursuer in roster.iter_mut() {
                if pursuer.threat == ThreatState::Scared {
                    pursuer.set_threat(ThreatState::Recovering);
                    changed += 1;
                }
            }
            debug!("power mode recovering, {changed} pursuers changed");
            events.push(GameEvent::PowerModeRecovering {
                pursuers_changed: changed,
            });
        }

        if self.remaining_ms == 0 {
            self.active = false;
            self.recovery_triggered = false;
            for pursuer in roster.iter_mut() {
                if pursuer.threat != ThreatState::Dead {
                    pursuer.set_threat(ThreatState::Normal);
                }
            }
            info!("power mode exited");
            events.push(GameEvent::PowerModeExited);
        }
    }

    pub fn respawn_state(&self) -> ThreatState {
        if !self.active {
            ThreatState::Normal
        } else if self.recovery_triggered || self.remaining_ms <= self.recovery_threshold_ms {
            ThreatState::Recovering
        } else {
            ThreatState::Scared
        }
    }

    pub fn eliminate(
        &mut self,
        pursuer_id: &str,
        now_ms: u64,
        roster: &mut PursuerRoster,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let Some(pursuer) = roster.get_mut(pursuer_id) else {
            warn!("cannot eliminate unknown pursuer {pursuer_id}");
            return false;
        };
        if pursuer.threat == ThreatState::Dead {
            return false;
        }
        pursuer.set_threat(ThreatState::Dead);
        pursuer.collision_enabled = false;
        let due_ms = now_ms.saturating_add(self.respawn_delay_ms);
        self.pending_respawns.push(PendingRespawn {
            pursuer_id: pursuer_id.to_string(),
            due_ms,
        });
        info!("pursuer {pursuer_id} eliminated, respawn at {due_ms}ms");
        events.push(GameEvent::PursuerEliminated {
            pursuer_id: pursuer_id.to_string(),
        });
        true
    }

    pub fn update_respawns(
        &mut self,
        now_ms: u64,
        roster: &mut PursuerRoster,
        events: &mut Vec<GameEvent>,
    ) -> Vec<String> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_respawns)
            .into_iter()
            .partition(|pending| pending.due_ms <= now_ms);
        self.pending_respawns = waiting;

        let state = self.respawn_state();
        let mut respawned = Vec::with_capacity(due.len());
        for pending in due {
            let Some(pursuer) = roster.get_mut(&pending.pursuer_id) else {
                continue;
            };
            pursuer.collision_enabled = true;
            pursuer.set_threat(state);
            pursuer.reset_to_spawn();
            debug!("pursuer {} respawned as {state:?}", pursuer.id);
            events.push(GameEvent::PursuerRespawned {
                pursuer_id: pending.pursuer_id.clone(),
                state,
            });
            respawned.push(pending.pursuer_id);
        }
        respawned
    }

    pub fn reset(&mut self, roster: &mut PursuerRoster) {
        self.active = false;
        self.remaining_ms = 0;
        self.recovery_triggered = false;
        self.pending_respawns.clear();
        for pursuer in roster.iter_mut() {
            pursuer.set_threat(ThreatState::Normal);
            pursuer.collision_enabled = true;
        }
        debug!("power mode reset");
    }
}

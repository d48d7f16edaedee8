use std::collections::BTreeMap;

use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use super::motion::{Easing, MotionInterpolator};
use crate::types::{ActorId, BonusView, GameEvent};

#[derive(Clone, Debug, PartialEq)]
pub struct BonusItem {
    pub id: u64,
    pub position: Vec2,
    pub target: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusTiming {
    pub first_delay_ms: u64,
    pub retry_interval_ms: u64,
    pub speed: f32,
    pub spawn_offset: f32,
    pub despawn_offset: f32,
    pub contact_radius: f32,
}

/// Spawns a cherry that crosses the maze in a straight line through the
/// centre. At most one is alive at a time.
#[derive(Clone, Debug)]
pub struct BonusSpawner {
    timing: BonusTiming,
    next_attempt_ms: Option<u64>,
    live: Option<BonusItem>,
    next_id: u64,
    center: Vec2,
    half_extent: f32,
}

impl BonusSpawner {
    pub fn new(timing: BonusTiming) -> Self {
        Self {
            timing,
            next_attempt_ms: None,
            live: None,
            next_id: 1,
            center: Vec2::ZERO,
            half_extent: 0.0,
        }
    }

    pub fn set_bounds(&mut self, rows: i32, cols: i32) {
        self.center = Vec2::new((cols - 1) as f32 / 2.0, (rows - 1) as f32 / 2.0);
        self.half_extent = rows.max(cols) as f32 / 2.0;
    }

    pub fn arm(&mut self, now_ms: u64) {
        self.next_attempt_ms = Some(now_ms.saturating_add(self.timing.first_delay_ms));
    }

    pub fn disarm(&mut self) {
        self.next_attempt_ms = None;
    }

    pub fn live(&self) -> Option<&BonusItem> {
        self.live.as_ref()
    }

    pub fn view(&self) -> Option<BonusView> {
        self.live.as_ref().map(|item| BonusView {
            id: item.id,
            x: item.position.x,
            y: item.position.y,
        })
    }

    pub fn tick(
        &mut self,
        now_ms: u64,
        rng: &mut StdRng,
        tweens: &mut MotionInterpolator,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(due) = self.next_attempt_ms else {
            return;
        };
        if now_ms < due {
            return;
        }
        self.next_attempt_ms = Some(now_ms.saturating_add(self.timing.retry_interval_ms));
        if self.live.is_some() {
            return;
        }

        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let heading = Vec2::from_angle(angle);
        let start = self.center + heading * (self.half_extent + self.timing.spawn_offset);
        let target = self.center - heading * (self.half_extent + self.timing.despawn_offset);
        let duration_ms = if self.timing.speed > 0.0 {
            (start.distance(target) / self.timing.speed * 1000.0).round() as u64
        } else {
            0
        };

        let id = self.next_id;
        self.next_id += 1;
        tweens.schedule(
            ActorId::Bonus(id),
            start,
            target,
            now_ms,
            duration_ms,
            Easing::Linear,
        );
        self.live = Some(BonusItem {
            id,
            position: start,
            target,
        });
        info!("bonus {id} spawned, crossing in {duration_ms}ms");
        events.push(GameEvent::BonusSpawned { id });
    }

    pub fn sync(
        &mut self,
        positions: &BTreeMap<ActorId, Vec2>,
        completed: &[ActorId],
        tweens: &mut MotionInterpolator,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(item) = self.live.as_mut() else {
            return;
        };
        let key = ActorId::Bonus(item.id);
        if let Some(position) = positions.get(&key) {
            item.position = *position;
        }
        let limit = self.half_extent + self.timing.despawn_offset + 1.0;
        let out_of_bounds = item.position.distance(self.center) > limit;
        if completed.contains(&key) || out_of_bounds {
            debug!("bonus {} left the maze", item.id);
            self.despawn(tweens, events);
        }
    }

    pub fn touches(&self, point: Vec2, radius: f32) -> bool {
        self.live
            .as_ref()
            .map(|item| item.position.distance(point) <= radius + self.timing.contact_radius)
            .unwrap_or(false)
    }

    pub fn collect(
        &mut self,
        tweens: &mut MotionInterpolator,
        events: &mut Vec<GameEvent>,
    ) -> Option<u64> {
        let item = self.live.take()?;
        tweens.cancel(&ActorId::Bonus(item.id));
        info!("bonus {} collected", item.id);
        events.push(GameEvent::BonusCollected { id: item.id });
        Some(item.id)
    }

    fn despawn(&mut self, tweens: &mut MotionInterpolator, events: &mut Vec<GameEvent>) {
        if let Some(item) = self.live.take() {
            tweens.cancel(&ActorId::Bonus(item.id));
            events.push(GameEvent::BonusDespawned { id: item.id });
        }
    }

    pub fn reset(&mut self, tweens: &mut MotionInterpolator) {
        if let Some(item) = self.live.take() {
            tweens.cancel(&ActorId::Bonus(item.id));
        }
        self.next_attempt_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn timing() -> BonusTiming {
        BonusTiming {
            first_delay_ms: 5_000,
            retry_interval_ms: 5_000,
            speed: 3.0,
            spawn_offset: 2.0,
            despawn_offset: 2.0,
            contact_radius: 0.3,
        }
    }

    fn spawner() -> BonusSpawner {
        let mut spawner = BonusSpawner::new(timing());
        spawner.set_bounds(29, 28);
        spawner.arm(0);
        spawner
    }

    #[test]
    fn first_spawn_waits_for_delay() {
        let mut spawner = spawner();
        let mut rng = StdRng::seed_from_u64(3);
        let mut tweens = MotionInterpolator::new();
        let mut events = Vec::new();

        spawner.tick(4_999, &mut rng, &mut tweens, &mut events);
        assert!(spawner.live().is_none());
        spawner.tick(5_000, &mut rng, &mut tweens, &mut events);
        let item = spawner.live().expect("bonus spawned").clone();
        assert!(tweens.is_tweening(&ActorId::Bonus(item.id)));
        assert!(matches!(events.as_slice(), [GameEvent::BonusSpawned { id: 1 }]));

        let center = Vec2::new(13.5, 14.0);
        assert!((item.position.distance(center) - 16.5).abs() < 1e-3);
        assert!((item.target.distance(center) - 16.5).abs() < 1e-3);
        // start and target are on opposite sides of the centre
        let midpoint = (item.position + item.target) / 2.0;
        assert!(midpoint.distance(center) < 1e-3);

        let tween = tweens.get(&ActorId::Bonus(item.id)).expect("tween");
        assert_eq!(tween.easing, Easing::Linear);
        assert_eq!(tween.duration_ms, 11_000);
    }

    #[test]
    fn crossing_completion_despawns_and_retry_spawns_again() {
        let mut spawner = spawner();
        let mut rng = StdRng::seed_from_u64(11);
        let mut tweens = MotionInterpolator::new();
        let mut events = Vec::new();
        let mut positions = BTreeMap::new();

        spawner.tick(5_000, &mut rng, &mut tweens, &mut events);
        // a live bonus blocks the retry
        spawner.tick(10_000, &mut rng, &mut tweens, &mut events);
        assert_eq!(spawner.live().map(|item| item.id), Some(1));

        let done = tweens.tick(16_000, &mut positions);
        spawner.sync(&positions, &done, &mut tweens, &mut events);
        assert!(spawner.live().is_none());
        assert!(matches!(events.last(), Some(GameEvent::BonusDespawned { id: 1 })));

        spawner.tick(15_000, &mut rng, &mut tweens, &mut events);
        assert_eq!(spawner.live().map(|item| item.id), Some(2));
    }

    #[test]
    fn contact_and_collect() {
        let mut spawner = spawner();
        let mut rng = StdRng::seed_from_u64(5);
        let mut tweens = MotionInterpolator::new();
        let mut events = Vec::new();
        spawner.tick(5_000, &mut rng, &mut tweens, &mut events);
        let position = spawner.live().expect("bonus").position;

        assert!(spawner.touches(position + Vec2::new(0.6, 0.0), 0.4));
        assert!(!spawner.touches(position + Vec2::new(0.8, 0.0), 0.4));

        assert_eq!(spawner.collect(&mut tweens, &mut events), Some(1));
        assert!(tweens.is_empty());
        assert!(!spawner.touches(position, 0.4));
        assert_eq!(spawner.collect(&mut tweens, &mut events), None);
    }

    #[test]
    fn reset_stops_schedule() {
        let mut spawner = spawner();
        let mut rng = StdRng::seed_from_u64(5);
        let mut tweens = MotionInterpolator::new();
        let mut events = Vec::new();
        spawner.tick(5_000, &mut rng, &mut tweens, &mut events);
        spawner.reset(&mut tweens);
        assert!(spawner.live().is_none());
        assert!(tweens.is_empty());
        spawner.tick(50_000, &mut rng, &mut tweens, &mut events);
        assert!(spawner.live().is_none());
    }
}

use std::collections::BTreeMap;

use glam::Vec2;

use crate::types::ActorId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// `3t^2 - 2t^3`, slow start and end.
    #[default]
    Smoothstep,
    /// Constant velocity.
    Linear,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
            Easing::Linear => t,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub start: Vec2,
    pub end: Vec2,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn fraction(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f32;
        (elapsed / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now_ms: u64) -> Vec2 {
        let t = self.fraction(now_ms);
        if t >= 1.0 {
            return self.end;
        }
        self.start.lerp(self.end, self.easing.apply(t))
    }
}

/// Time-driven position tweens, at most one per actor.
#[derive(Clone, Debug, Default)]
pub struct MotionInterpolator {
    tweens: BTreeMap<ActorId, Tween>,
}

impl MotionInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a tween for `actor`, replacing any tween already in flight for it.
    /// Returns `true` when an existing tween was superseded.
    pub fn schedule(
        &mut self,
        actor: ActorId,
        start: Vec2,
        end: Vec2,
        start_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> bool {
        self.tweens
            .insert(
                actor,
                Tween {
                    start,
                    end,
                    start_ms,
                    duration_ms,
                    easing,
                },
            )
            .is_some()
    }

    /// Writes the current sample of every tween into `positions` and drops the
    /// finished ones, which land exactly on their end point. Returns the actors
    /// whose tweens completed.
    pub fn tick(&mut self, now_ms: u64, positions: &mut BTreeMap<ActorId, Vec2>) -> Vec<ActorId> {
        let mut completed = Vec::new();
        for (actor, tween) in &self.tweens {
            positions.insert(actor.clone(), tween.sample(now_ms));
            if tween.fraction(now_ms) >= 1.0 {
                completed.push(actor.clone());
            }
        }
        for actor in &completed {
            self.tweens.remove(actor);
        }
        completed
    }

    pub fn is_tweening(&self, actor: &ActorId) -> bool {
        self.tweens.contains_key(actor)
    }

    pub fn cancel(&mut self, actor: &ActorId) -> Option<Tween> {
        self.tweens.remove(actor)
    }

    pub fn get(&self, actor: &ActorId) -> Option<&Tween> {
        self.tweens.get(actor)
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

use log::{debug, warn};

use super::pursuer::PursuerRoster;
use crate::types::{GridPos, ThreatState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionTag {
    Wall,
    Pellet,
    PowerPellet,
    Ghost,
    Teleporter,
    Cherry,
}

impl CollisionTag {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "wall" => Some(Self::Wall),
            "pellet" => Some(Self::Pellet),
            "powerpellet" | "power_pellet" => Some(Self::PowerPellet),
            "ghost" | "pursuer" => Some(Self::Ghost),
            "teleporter" => Some(Self::Teleporter),
            "cherry" | "bonus" => Some(Self::Cherry),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlapEvent {
    pub tag: String,
    pub cell: GridPos,
    pub other: Option<String>,
}

impl OverlapEvent {
    pub fn new(tag: impl Into<String>, cell: GridPos) -> Self {
        Self {
            tag: tag.into(),
            cell,
            other: None,
        }
    }

    pub fn pursuer(id: impl Into<String>, cell: GridPos) -> Self {
        Self {
            tag: "Ghost".to_string(),
            cell,
            other: Some(id.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollisionOutcome {
    WallBump { cell: GridPos },
    Pickup { cell: GridPos },
    LifeLost { pursuer_id: String },
    Eliminate { pursuer_id: String },
    Teleport { cell: GridPos },
    BonusCollected,
    Ignored,
}

/// Maps an overlap to what it means for the game. Reads pursuer state, never
/// mutates anything.
pub fn resolve(event: &OverlapEvent, roster: &PursuerRoster) -> CollisionOutcome {
    let Some(tag) = CollisionTag::parse(&event.tag) else {
        warn!("ignoring overlap with unknown tag {:?} at {}", event.tag, event.cell);
        return CollisionOutcome::Ignored;
    };

    match tag {
        CollisionTag::Wall => CollisionOutcome::WallBump { cell: event.cell },
        CollisionTag::Pellet | CollisionTag::PowerPellet => {
            CollisionOutcome::Pickup { cell: event.cell }
        }
        CollisionTag::Teleporter => CollisionOutcome::Teleport { cell: event.cell },
        CollisionTag::Cherry => CollisionOutcome::BonusCollected,
        CollisionTag::Ghost => {
            let Some(id) = event.other.as_deref() else {
                warn!("ghost overlap at {} without a pursuer id", event.cell);
                return CollisionOutcome::Ignored;
            };
            let Some(pursuer) = roster.get(id) else {
                warn!("ghost overlap with unknown pursuer {id}");
                return CollisionOutcome::Ignored;
            };
            if !pursuer.collision_enabled {
                debug!("pursuer {id} collision disabled, overlap ignored");
                return CollisionOutcome::Ignored;
            }
            match pursuer.threat {
                ThreatState::Normal => CollisionOutcome::LifeLost {
                    pursuer_id: id.to_string(),
                },
                ThreatState::Scared | ThreatState::Recovering => CollisionOutcome::Eliminate {
                    pursuer_id: id.to_string(),
                },
                ThreatState::Dead => CollisionOutcome::Ignored,
            }
        }
    }
}

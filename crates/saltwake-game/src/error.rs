use saltwake_core::Cell;
use saltwake_world::ClockParseError;
use thiserror::Error;

use crate::npc::NpcId;

/// Errors surfaced to the host by the world manager
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NpcError {
    #[error("unknown NPC {0}")]
    UnknownAgent(NpcId),

    #[error("cell {0} is blocked or occupied")]
    CellUnavailable(Cell),

    #[error("no free walkable cell left on the map")]
    NoFreeCell,

    #[error("invalid content: {0}")]
    Content(#[from] ContentError),
}

/// Problems found while validating an NPC content record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error("record has an empty name")]
    EmptyName,

    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("schedule entry {index}: {source}")]
    ScheduleTime {
        index: usize,
        #[source]
        source: ClockParseError,
    },

    #[error("stat '{name}' must be positive, got {value}")]
    InvalidStat { name: &'static str, value: f32 },

    #[error("failed to parse roster: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Parse(err.to_string())
    }
}

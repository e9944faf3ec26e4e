//! Saltwake Game - NPC behavior for the harbor town
//!
//! Provides pathfinding, the behavior state machine, mood and relationship
//! tracking, daily schedules, and the world manager that ticks every NPC.

pub mod config;
pub mod error;
pub mod npc;

pub use config::AiConfig;
pub use error::{ContentError, NpcError};
pub use npc::behavior::{NpcState, StateMachine, Trigger};
pub use npc::content::{parse_roster, AgentConfig, NpcRecord, ScheduleEntryRecord};
pub use npc::dialogue::{DialogueLineId, Topic};
pub use npc::manager::{AgentSnapshot, DamageOutcome, InteractionOutcome, NpcEvent, NpcWorld, TickReport};
pub use npc::memory::{InteractionKind, InteractionRecord, MemoryLog};
pub use npc::mood::{Mood, MoodState};
pub use npc::pathfinding::{find_path, Connectivity, Path, PathError, SearchLimits};
pub use npc::relationship::{DialogueModifiers, QuestAccess, Relationship, RelationshipTier, TierChange};
pub use npc::schedule::{Routine, Schedule, ScheduleEntry};
pub use npc::{Archetype, NpcAgent, NpcId};

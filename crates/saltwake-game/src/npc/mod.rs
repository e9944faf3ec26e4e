//! NPC system: agents, behavior, mood, schedules, and the world manager

pub mod archetype;
pub mod behavior;
pub mod combat;
pub mod content;
pub mod dialogue;
pub mod manager;
pub mod memory;
pub mod mood;
pub mod pathfinding;
pub mod relationship;
pub mod schedule;

use std::collections::VecDeque;
use std::fmt;

use saltwake_core::{Cell, Facing};
use serde::Serialize;

pub use archetype::Archetype;

use self::archetype::BaseStats;
use self::behavior::{NpcState, StateMachine};
use self::combat::CombatStats;
use self::content::AgentConfig;
use self::memory::{InteractionKind, MemoryLog};
use self::mood::{Mood, MoodState};
use self::relationship::{Relationship, RelationshipTier};
use self::schedule::Schedule;

/// Unique identifier for an NPC, assigned in spawn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NpcId(pub u64);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc#{}", self.0)
    }
}

/// Movement bookkeeping owned by the world manager
#[derive(Debug, Clone, Default)]
pub(crate) struct Navigation {
    /// Cell the current path leads to
    pub target: Option<Cell>,
    /// Remaining cells, next step first
    pub steps: VecDeque<Cell>,
    /// Last search toward `target` found no route
    pub failed: bool,
    /// Consecutive ticks a step claim was refused
    pub blocked_ticks: u32,
    /// Travel is suppressed until this tick after a failed route
    pub retry_at: Option<u64>,
    /// Fraction of a cell walked toward the next step
    pub progress: f32,
}

/// Schedule bookkeeping owned by the world manager
#[derive(Debug, Clone, Default)]
pub(crate) struct Duty {
    /// Index of the active schedule window
    pub window: Option<usize>,
    /// Reached the window's location
    pub on_station: bool,
    pub patrol_index: usize,
    pub wander_target: Option<Cell>,
}

/// One live NPC. Only the world manager mutates it.
#[derive(Debug, Clone)]
pub struct NpcAgent {
    id: NpcId,
    name: String,
    archetype: Archetype,
    home: Cell,
    dialogue_set: String,
    loved_gifts: Vec<String>,
    disliked_gifts: Vec<String>,
    patrol_route: Vec<Cell>,
    schedule: Schedule,
    stats: BaseStats,
    pub(crate) position: Cell,
    pub(crate) facing: Facing,
    pub(crate) combat: CombatStats,
    pub(crate) fsm: StateMachine,
    pub(crate) mood: MoodState,
    pub(crate) relationship: Relationship,
    pub(crate) memory: MemoryLog,
    pub(crate) nav: Navigation,
    pub(crate) duty: Duty,
    /// Seconds of hostility left after being provoked
    pub(crate) grudge: f32,
}

impl NpcAgent {
    pub(crate) fn new(id: NpcId, config: AgentConfig, position: Cell, memory_capacity: usize) -> Self {
        Self {
            id,
            combat: CombatStats::from_base(&config.stats),
            mood: MoodState::new(config.temperament),
            relationship: Relationship::starting_at(config.starting_score),
            name: config.name,
            archetype: config.archetype,
            home: config.home,
            dialogue_set: config.dialogue_set,
            loved_gifts: config.loved_gifts,
            disliked_gifts: config.disliked_gifts,
            patrol_route: config.patrol_route,
            schedule: config.schedule,
            stats: config.stats,
            position,
            facing: Facing::default(),
            fsm: StateMachine::default(),
            memory: MemoryLog::new(memory_capacity),
            nav: Navigation::default(),
            duty: Duty::default(),
            grudge: 0.0,
        }
    }

    pub fn id(&self) -> NpcId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn home(&self) -> Cell {
        self.home
    }

    pub fn state(&self) -> NpcState {
        self.fsm.state()
    }

    pub fn fsm(&self) -> &StateMachine {
        &self.fsm
    }

    pub fn mood(&self) -> Mood {
        self.mood.mood()
    }

    pub fn mood_state(&self) -> &MoodState {
        &self.mood
    }

    pub fn tier(&self) -> RelationshipTier {
        self.relationship.tier()
    }

    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    /// Shop price multiplier: tier discount times mood markup
    pub fn price_modifier(&self) -> f32 {
        self.tier().dialogue_modifiers().price_multiplier * self.mood().price_modifier()
    }

    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn combat(&self) -> &CombatStats {
        &self.combat
    }

    pub fn health(&self) -> f32 {
        self.combat.current_hp
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn patrol_route(&self) -> &[Cell] {
        &self.patrol_route
    }

    pub fn dialogue_set(&self) -> &str {
        &self.dialogue_set
    }

    /// Where the agent is currently headed, if anywhere
    pub fn target(&self) -> Option<Cell> {
        self.nav.target
    }

    /// Cells still to walk on the current path
    pub fn path(&self) -> impl Iterator<Item = Cell> + '_ {
        self.nav.steps.iter().copied()
    }

    /// Interaction kind for handing this NPC `item`
    pub fn gift_kind(&self, item: &str) -> InteractionKind {
        content::gift_kind(&self.loved_gifts, &self.disliked_gifts, item)
    }

    /// Aggressive and either disliking the player or holding a grudge
    pub fn is_hostile(&self) -> bool {
        self.stats.aggressive && (self.tier().is_hostile() || self.grudge > 0.0)
    }

    pub(crate) fn clear_path(&mut self) {
        self.nav.target = None;
        self.nav.steps.clear();
        self.nav.failed = false;
        self.nav.progress = 0.0;
    }
}

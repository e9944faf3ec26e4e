//! NPC behavior state machine
//!
//! Transitions live in one explicit `(state, trigger) -> next` table. Each
//! tick the world manager builds a [`Perception`], [`triggers`] lists the
//! triggers that currently hold in priority order, and the first one with a
//! row for the current state wins. Event triggers (a player talking, being
//! provoked, a failed route) are fired directly with [`StateMachine::fire`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Flee,
    Combat,
    Dialogue,
    Travel,
}

impl NpcState {
    pub fn name(&self) -> &'static str {
        match self {
            NpcState::Idle => "idle",
            NpcState::Patrol => "patrol",
            NpcState::Chase => "chase",
            NpcState::Flee => "flee",
            NpcState::Combat => "combat",
            NpcState::Dialogue => "dialogue",
            NpcState::Travel => "travel",
        }
    }

    /// Combat, chase and flee take precedence over the schedule
    pub fn is_engaged(&self) -> bool {
        matches!(self, NpcState::Chase | NpcState::Combat | NpcState::Flee)
    }
}

/// Triggers in priority order, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Threatened,
    PlayerInReach,
    PlayerOutOfReach,
    HostileSighted,
    PlayerLost,
    SafeDistance,
    Provoked,
    Pacified,
    DialogueRequested,
    DialogueEnded,
    PathBlocked,
    ScheduleTravel,
    ScheduleIdle,
    SchedulePatrol,
}

use NpcState::{Chase, Combat, Dialogue, Flee, Idle, Patrol, Travel};

const TRANSITIONS: &[(NpcState, Trigger, NpcState)] = &[
    (Idle, Trigger::Threatened, Flee),
    (Patrol, Trigger::Threatened, Flee),
    (Travel, Trigger::Threatened, Flee),
    (Dialogue, Trigger::Threatened, Flee),
    (Chase, Trigger::Threatened, Flee),
    (Combat, Trigger::Threatened, Flee),
    (Idle, Trigger::PlayerInReach, Combat),
    (Patrol, Trigger::PlayerInReach, Combat),
    (Travel, Trigger::PlayerInReach, Combat),
    (Chase, Trigger::PlayerInReach, Combat),
    (Combat, Trigger::PlayerOutOfReach, Chase),
    (Idle, Trigger::HostileSighted, Chase),
    (Patrol, Trigger::HostileSighted, Chase),
    (Travel, Trigger::HostileSighted, Chase),
    (Chase, Trigger::PlayerLost, Patrol),
    (Combat, Trigger::PlayerLost, Patrol),
    (Flee, Trigger::SafeDistance, Idle),
    (Idle, Trigger::Provoked, Chase),
    (Patrol, Trigger::Provoked, Chase),
    (Travel, Trigger::Provoked, Chase),
    (Dialogue, Trigger::Provoked, Chase),
    (Chase, Trigger::Pacified, Patrol),
    (Combat, Trigger::Pacified, Patrol),
    (Idle, Trigger::DialogueRequested, Dialogue),
    (Patrol, Trigger::DialogueRequested, Dialogue),
    (Dialogue, Trigger::DialogueEnded, Idle),
    (Travel, Trigger::PathBlocked, Idle),
    (Idle, Trigger::ScheduleTravel, Travel),
    (Patrol, Trigger::ScheduleTravel, Travel),
    (Travel, Trigger::ScheduleIdle, Idle),
    (Patrol, Trigger::ScheduleIdle, Idle),
    (Idle, Trigger::SchedulePatrol, Patrol),
    (Travel, Trigger::SchedulePatrol, Patrol),
];

/// Look up the transition table
pub fn next_state(state: NpcState, trigger: Trigger) -> Option<NpcState> {
    TRANSITIONS
        .iter()
        .find(|(from, t, _)| *from == state && *t == trigger)
        .map(|(_, _, to)| *to)
}

/// What the schedule wants right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSignal {
    Travel,
    Idle,
    Patrol,
}

/// Distances and fractions that drive environment triggers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub entry_radius: f32,
    pub exit_radius: f32,
    pub attack_radius: f32,
    pub dialogue_radius: f32,
    pub flee_health_fraction: f32,
}

/// Snapshot of what one NPC knows this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    /// Distance to the player, `None` when no player is present
    pub player_distance: Option<f32>,
    pub health_fraction: f32,
    /// Aggressive and either disliking the player or holding a grudge
    pub hostile: bool,
    /// Scared, or an unaggressive NPC that counts the player as an enemy
    pub timid: bool,
    pub schedule: Option<ScheduleSignal>,
}

/// Environment triggers that hold for `p`, highest priority first
pub fn triggers(state: NpcState, p: &Perception, t: &Thresholds) -> Vec<Trigger> {
    let within = |radius: f32| p.player_distance.is_some_and(|d| d <= radius);
    let beyond = |radius: f32| p.player_distance.map_or(true, |d| d > radius);

    let mut out = Vec::new();
    let wounded = p.health_fraction < t.flee_health_fraction && within(t.exit_radius);
    if wounded || (p.timid && within(t.entry_radius)) {
        out.push(Trigger::Threatened);
    }
    if p.hostile && within(t.attack_radius) {
        out.push(Trigger::PlayerInReach);
    }
    if state == Combat && p.player_distance.is_some() && beyond(t.attack_radius + 1.0) {
        out.push(Trigger::PlayerOutOfReach);
    }
    if p.hostile && within(t.entry_radius) {
        out.push(Trigger::HostileSighted);
    }
    if beyond(t.exit_radius) {
        out.push(Trigger::PlayerLost);
        out.push(Trigger::SafeDistance);
    }
    if !p.hostile {
        out.push(Trigger::Pacified);
    }
    if state == Dialogue && beyond(t.dialogue_radius) {
        out.push(Trigger::DialogueEnded);
    }
    if let Some(signal) = p.schedule {
        out.push(match signal {
            ScheduleSignal::Travel => Trigger::ScheduleTravel,
            ScheduleSignal::Idle => Trigger::ScheduleIdle,
            ScheduleSignal::Patrol => Trigger::SchedulePatrol,
        });
    }
    out
}

/// A state change that happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: NpcState,
    pub to: NpcState,
    pub trigger: Trigger,
}

const HISTORY_LEN: usize = 10;

/// Per-NPC state machine
#[derive(Debug, Clone, Serialize)]
pub struct StateMachine {
    state: NpcState,
    previous: NpcState,
    /// Seconds spent in the current state
    time_in_state: f32,
    history: VecDeque<Transition>,
}

impl StateMachine {
    pub fn new(initial: NpcState) -> Self {
        Self {
            state: initial,
            previous: initial,
            time_in_state: 0.0,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn state(&self) -> NpcState {
        self.state
    }

    pub fn previous(&self) -> NpcState {
        self.previous
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    /// Most recent transitions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Transition> {
        self.history.iter()
    }

    /// Apply a trigger. Returns the transition if the table has a row.
    pub fn fire(&mut self, trigger: Trigger) -> Option<Transition> {
        let to = next_state(self.state, trigger)?;
        let transition = Transition {
            from: self.state,
            to,
            trigger,
        };
        self.previous = self.state;
        self.state = to;
        self.time_in_state = 0.0;
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(transition);
        Some(transition)
    }

    /// Fire the highest-priority environment trigger that applies
    pub fn evaluate(&mut self, p: &Perception, t: &Thresholds) -> Option<Transition> {
        let trigger = triggers(self.state, p, t)
            .into_iter()
            .find(|&trigger| next_state(self.state, trigger).is_some())?;
        self.fire(trigger)
    }

    pub fn advance(&mut self, dt: f32) {
        self.time_in_state += dt;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(NpcState::Idle)
    }
}

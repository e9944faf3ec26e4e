//! NPC world manager: spawn, despawn, interact with, and tick every NPC
//!
//! Agents live in a `Vec` in spawn order and every phase of a tick walks them
//! in that order, so the same inputs always produce the same world. Movement
//! is claim based: each agent asks for at most one neighbouring cell per tick
//! and [`resolve_claims`] grants a cell only while nobody stands on it.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use saltwake_core::{Cell, Facing, GameTime};
use saltwake_world::{ClockTime, LocationTable, ObstacleMap, Overlay, Passable, WorldClock, WorldTimestamp};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::behavior::{NpcState, Perception, ScheduleSignal, Transition, Trigger};
use super::content::{AgentConfig, NpcRecord};
use super::dialogue::{DialogueLineId, Topic};
use super::memory::{InteractionKind, InteractionRecord};
use super::mood::Mood;
use super::pathfinding::{find_path, PathError};
use super::relationship::{DialogueModifiers, RelationshipTier, TierChange};
use super::schedule::Routine;
use super::{Duty, NpcAgent, NpcId};
use crate::config::AiConfig;
use crate::error::NpcError;

pub use super::combat::DamageOutcome;

/// Seconds an aggressive NPC stays hostile after being provoked
pub const GRUDGE_SECONDS: f32 = 30.0;
const CHASE_SPEED: f32 = 1.2;
const FLEE_SPEED: f32 = 1.5;
const FLEE_STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const WANDER_ATTEMPTS: usize = 8;
/// Most mood decay steps run in one tick; moods have settled long before
const MAX_DECAY_STEPS: u64 = 1000;

/// Read-only view of one agent for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub id: NpcId,
    pub name: String,
    pub position: Cell,
    pub facing: Facing,
    pub state: NpcState,
    pub mood: Mood,
    pub tier: RelationshipTier,
    pub health: f32,
}

/// Result of a player interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionOutcome {
    /// Change actually applied to the relationship score
    pub relationship_delta: i32,
    pub dialogue_line: DialogueLineId,
    pub tier_change: Option<TierChange>,
    pub state: NpcState,
    pub mood: Mood,
    /// What the current tier unlocks in conversation
    pub modifiers: DialogueModifiers,
    /// Shop price multiplier from tier and mood together
    pub price_modifier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NpcEvent {
    StateChanged {
        id: NpcId,
        from: NpcState,
        to: NpcState,
        trigger: Trigger,
    },
    ScheduleChanged {
        id: NpcId,
        activity: String,
        location: Cell,
    },
    PathFailed {
        id: NpcId,
        target: Cell,
        error: PathError,
    },
    /// NPC landed a melee strike on the player
    Struck { id: NpcId, damage: f32 },
}

/// Everything that happened during one tick
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub time: WorldTimestamp,
    pub events: Vec<NpcEvent>,
}

/// Owns all NPCs together with the map, named locations, and clocks
pub struct NpcWorld {
    agents: Vec<NpcAgent>,
    map: ObstacleMap,
    locations: LocationTable,
    clock: WorldClock,
    time: GameTime,
    config: AiConfig,
    player: Option<Cell>,
    next_id: u64,
    tick_count: u64,
    /// Game minutes not yet counted toward a schedule tick
    pending_minutes: u64,
    rng: StdRng,
}

impl NpcWorld {
    pub fn new(map: ObstacleMap, locations: LocationTable, config: AiConfig) -> Self {
        let config = config.validated();
        Self {
            agents: Vec::new(),
            map,
            locations,
            clock: WorldClock::default(),
            time: GameTime::new(config.time.clone()),
            rng: StdRng::seed_from_u64(config.rng_seed),
            config,
            player: None,
            next_id: 1,
            tick_count: 0,
            pending_minutes: 0,
        }
    }

    pub fn with_clock(mut self, clock: WorldClock) -> Self {
        self.clock = clock;
        self
    }

    fn next_npc_id(&mut self) -> NpcId {
        let id = NpcId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn from a content record on the free cell nearest its home
    pub fn spawn(&mut self, record: &NpcRecord) -> Result<NpcId, NpcError> {
        let config = AgentConfig::from_record(record, &self.locations)?;
        let cell = self.free_cell_near(config.home).ok_or(NpcError::NoFreeCell)?;
        Ok(self.insert(config, cell))
    }

    /// Spawn on an exact cell, which must be walkable and unoccupied
    pub fn spawn_at(&mut self, record: &NpcRecord, cell: Cell) -> Result<NpcId, NpcError> {
        let config = AgentConfig::from_record(record, &self.locations)?;
        if !self.map.is_passable(cell) || self.is_occupied(cell) {
            return Err(NpcError::CellUnavailable(cell));
        }
        Ok(self.insert(config, cell))
    }

    fn insert(&mut self, config: AgentConfig, cell: Cell) -> NpcId {
        let id = self.next_npc_id();
        info!("Spawned {} '{}' ({:?}) at {}", id, config.name, config.archetype, cell);
        self.agents
            .push(NpcAgent::new(id, config, cell, self.config.memory_capacity));
        id
    }

    /// Breadth-first search over walkable cells for the nearest free one
    fn free_cell_near(&self, origin: Cell) -> Option<Cell> {
        let occupied: HashSet<Cell> = self.agents.iter().map(|a| a.position).collect();
        let mut seen = HashSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        while let Some(cell) = queue.pop_front() {
            if self.map.is_passable(cell) && !occupied.contains(&cell) {
                return Some(cell);
            }
            for (dx, dy) in FLEE_STEPS {
                let next = cell.offset(dx, dy);
                if self.map.is_passable(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        None
    }

    pub fn despawn(&mut self, id: NpcId) -> Result<NpcAgent, NpcError> {
        let index = self.agent_index(id)?;
        let agent = self.agents.remove(index);
        info!("Despawned {} '{}'", id, agent.name());
        Ok(agent)
    }

    fn agent_index(&self, id: NpcId) -> Result<usize, NpcError> {
        self.agents.iter().position(|a| a.id() == id).ok_or_else(|| {
            warn!("Unknown NPC {}", id);
            NpcError::UnknownAgent(id)
        })
    }

    fn is_occupied(&self, cell: Cell) -> bool {
        self.agents.iter().any(|a| a.position == cell)
    }

    pub fn agent(&self, id: NpcId) -> Option<&NpcAgent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// All agents in spawn order
    pub fn agents(&self) -> impl Iterator<Item = &NpcAgent> {
        self.agents.iter()
    }

    pub fn count(&self) -> usize {
        self.agents.len()
    }

    /// Agents within `radius` cells of `center`, in spawn order
    pub fn agents_in_range(&self, center: Cell, radius: f32) -> Vec<NpcId> {
        self.agents
            .iter()
            .filter(|a| a.position.distance(center) <= radius)
            .map(|a| a.id())
            .collect()
    }

    /// Agent standing on `cell`, if any
    pub fn agent_at(&self, cell: Cell) -> Option<NpcId> {
        self.agents.iter().find(|a| a.position == cell).map(|a| a.id())
    }

    /// Where the player stands; `None` when the player is not on this map
    pub fn set_player_position(&mut self, player: Option<Cell>) {
        self.player = player;
    }

    pub fn player(&self) -> Option<Cell> {
        self.player
    }

    pub fn map(&self) -> &ObstacleMap {
        &self.map
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut WorldClock {
        &mut self.clock
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .map(|a| AgentSnapshot {
                id: a.id(),
                name: a.name().to_string(),
                position: a.position,
                facing: a.facing,
                state: a.state(),
                mood: a.mood(),
                tier: a.tier(),
                health: a.health(),
            })
            .collect()
    }

    /// Record a player interaction and react to it
    pub fn interact(&mut self, id: NpcId, kind: InteractionKind) -> Result<InteractionOutcome, NpcError> {
        let index = self.agent_index(id)?;
        let at = self.clock.timestamp();
        let window = self.config.mood_window;
        let agent = &mut self.agents[index];

        let hostile_before = agent.is_hostile();
        let (applied, tier_change) = agent.relationship.apply(kind.base_delta());
        let record = InteractionRecord::new(at, kind, applied);
        agent.mood.record(&record, window, agent.stats.brave);
        agent.memory.record(record);

        if let Some(change) = tier_change {
            info!(
                "{} '{}' is now {} (score {})",
                id,
                agent.name,
                change.to().name(),
                agent.relationship.score()
            );
        }

        let trigger = match kind {
            InteractionKind::Talk if !hostile_before => Some(Trigger::DialogueRequested),
            k if k.is_hostile() && agent.mood.is_scared() => Some(Trigger::Threatened),
            k if k.is_hostile() && agent.stats.aggressive => {
                agent.grudge = GRUDGE_SECONDS;
                Some(Trigger::Provoked)
            }
            k if k.is_hostile() => Some(Trigger::DialogueEnded),
            _ => None,
        };
        if let Some(transition) = trigger.and_then(|t| agent.fsm.fire(t)) {
            log_transition(agent, &transition);
        }

        let topic = if kind == InteractionKind::Talk && hostile_before {
            Topic::Threat
        } else {
            Topic::for_interaction(kind)
        };
        let mut dialogue_line = DialogueLineId::new(agent.dialogue_set.clone(), topic, agent.tier(), agent.mood());
        if topic == Topic::Greeting {
            dialogue_line = dialogue_line.with_period(at.time.period());
        }
        Ok(InteractionOutcome {
            relationship_delta: applied,
            dialogue_line,
            tier_change,
            state: agent.state(),
            mood: agent.mood(),
            modifiers: agent.tier().dialogue_modifiers(),
            price_modifier: agent.price_modifier(),
        })
    }

    /// Hand the NPC an item, judged against its gift preferences
    pub fn gift(&mut self, id: NpcId, item: &str) -> Result<InteractionOutcome, NpcError> {
        let kind = self.agents[self.agent_index(id)?].gift_kind(item);
        self.interact(id, kind)
    }

    /// Close a conversation. Returns the farewell line.
    pub fn end_dialogue(&mut self, id: NpcId) -> Result<DialogueLineId, NpcError> {
        let index = self.agent_index(id)?;
        let agent = &mut self.agents[index];
        if let Some(transition) = agent.fsm.fire(Trigger::DialogueEnded) {
            log_transition(agent, &transition);
        }
        Ok(DialogueLineId::new(
            agent.dialogue_set.clone(),
            Topic::Farewell,
            agent.tier(),
            agent.mood(),
        ))
    }

    /// Apply damage from the player. Aggressive NPCs are provoked by it.
    pub fn damage_agent(&mut self, id: NpcId, amount: f32) -> Result<DamageOutcome, NpcError> {
        let index = self.agent_index(id)?;
        let agent = &mut self.agents[index];
        let outcome = agent.combat.take_damage(amount);
        debug!("{} took {:.1} damage, {:.1} left", id, outcome.dealt, outcome.remaining);
        if agent.stats.aggressive {
            agent.grudge = GRUDGE_SECONDS;
            if let Some(transition) = agent.fsm.fire(Trigger::Provoked) {
                log_transition(agent, &transition);
            }
        }
        Ok(outcome)
    }

    /// Advance the simulation by `delta_seconds` of real time
    pub fn tick(&mut self, delta_seconds: f32) -> TickReport {
        self.tick_count += 1;
        self.time.update(delta_seconds);
        let dt = self.time.delta_time;

        let minutes = self
            .clock
            .advance(dt as f64 * self.config.game_minutes_per_second as f64);
        self.pending_minutes = self.pending_minutes.saturating_add(minutes);
        let schedule_ticks = self.pending_minutes / self.config.schedule_tick_minutes;
        self.pending_minutes %= self.config.schedule_tick_minutes;
        for _ in 0..schedule_ticks.min(MAX_DECAY_STEPS) {
            for agent in &mut self.agents {
                agent.mood.decay(self.config.mood_decay_rate);
            }
        }

        let positions: Vec<Cell> = self.agents.iter().map(|a| a.position).collect();
        let occupied: HashSet<Cell> = positions.iter().copied().collect();
        let mut ctx = TickContext {
            map: &self.map,
            config: &self.config,
            rng: &mut self.rng,
            occupied: &occupied,
            player: self.player,
            now: self.clock.now(),
            tick: self.tick_count,
            dt,
            events: Vec::new(),
        };

        let claims: Vec<Option<Cell>> = self.agents.iter_mut().map(|agent| plan(agent, &mut ctx)).collect();
        let granted = resolve_claims(&positions, &claims);
        for ((agent, claim), granted) in self.agents.iter_mut().zip(&claims).zip(&granted) {
            commit(agent, *claim, *granted, &mut ctx);
        }

        TickReport {
            tick: self.tick_count,
            time: self.clock.timestamp(),
            events: ctx.events,
        }
    }
}

/// Shared, per-tick inputs for planning and committing one agent
struct TickContext<'a> {
    map: &'a ObstacleMap,
    config: &'a AiConfig,
    rng: &'a mut StdRng,
    /// Cells held at the start of the tick
    occupied: &'a HashSet<Cell>,
    player: Option<Cell>,
    now: ClockTime,
    tick: u64,
    dt: f32,
    events: Vec<NpcEvent>,
}

fn log_transition(agent: &NpcAgent, transition: &Transition) {
    debug!(
        "{} {} -> {} ({:?})",
        agent.id,
        transition.from.name(),
        transition.to.name(),
        transition.trigger
    );
}

fn record_transition(agent: &NpcAgent, transition: Transition, events: &mut Vec<NpcEvent>) {
    log_transition(agent, &transition);
    events.push(NpcEvent::StateChanged {
        id: agent.id,
        from: transition.from,
        to: transition.to,
        trigger: transition.trigger,
    });
}

/// At `location`, or next to it while someone else stands there
fn arrived(position: Cell, location: Cell, ctx: &TickContext) -> bool {
    position == location
        || (position.is_adjacent(location, ctx.config.connectivity.is_diagonal())
            && (ctx.occupied.contains(&location) || !ctx.map.is_passable(location)))
}

/// Schedule, perception, and state machine. Returns the step claim.
fn plan(agent: &mut NpcAgent, ctx: &mut TickContext) -> Option<Cell> {
    let signal = follow_schedule(agent, ctx);
    let perception = Perception {
        player_distance: ctx.player.map(|p| agent.position.distance(p)),
        health_fraction: agent.combat.hp_fraction(),
        hostile: agent.is_hostile(),
        timid: agent.mood.is_scared()
            || (!agent.stats.aggressive && agent.tier() == RelationshipTier::Enemy),
        schedule: Some(signal),
    };
    if let Some(transition) = agent.fsm.evaluate(&perception, &ctx.config.thresholds()) {
        if transition.to == NpcState::Combat {
            agent.combat.reset_attack();
        }
        record_transition(agent, transition, &mut ctx.events);
    }

    let destination = match agent.state() {
        NpcState::Flee => return flee_step(agent, ctx),
        NpcState::Travel => agent
            .duty
            .window
            .map(|w| agent.schedule.entries()[w].location),
        NpcState::Patrol => patrol_waypoint(agent, ctx),
        NpcState::Chase => ctx.player,
        NpcState::Idle | NpcState::Dialogue | NpcState::Combat => None,
    };
    let Some(destination) = destination else {
        agent.clear_path();
        return None;
    };
    route(agent, destination, ctx);
    step_claim(agent, ctx)
}

fn follow_schedule(agent: &mut NpcAgent, ctx: &mut TickContext) -> ScheduleSignal {
    let window = agent.schedule.active_index(ctx.now);
    let entry = &agent.schedule.entries()[window];
    if agent.duty.window != Some(window) {
        debug!("{} starts '{}' at {}", agent.id, entry.activity, entry.location);
        agent.duty = Duty {
            window: Some(window),
            ..Default::default()
        };
        agent.nav.retry_at = None;
        ctx.events.push(NpcEvent::ScheduleChanged {
            id: agent.id,
            activity: entry.activity.clone(),
            location: entry.location,
        });
    }

    let at_location = arrived(agent.position, entry.location, ctx);
    agent.duty.on_station = match entry.routine {
        Routine::Idle => at_location,
        // Patrols walk away from the start, so arrival sticks for the window
        Routine::Patrol => agent.duty.on_station || at_location,
    };

    let retrying = match agent.nav.retry_at {
        Some(at) if ctx.tick < at => true,
        Some(_) => {
            agent.nav.retry_at = None;
            false
        }
        None => false,
    };

    if !agent.duty.on_station {
        return if retrying {
            ScheduleSignal::Idle
        } else {
            ScheduleSignal::Travel
        };
    }
    match entry.routine {
        Routine::Idle => ScheduleSignal::Idle,
        Routine::Patrol => ScheduleSignal::Patrol,
    }
}

/// Next waypoint of the active patrol, or a wander spot near its start
fn patrol_waypoint(agent: &mut NpcAgent, ctx: &mut TickContext) -> Option<Cell> {
    let entry = &agent.schedule.entries()[agent.duty.window?];
    let route = if entry.route.is_empty() {
        &agent.patrol_route
    } else {
        &entry.route
    };

    if !route.is_empty() {
        let mut index = agent.duty.patrol_index % route.len();
        if arrived(agent.position, route[index], ctx) {
            index = (index + 1) % route.len();
        }
        agent.duty.patrol_index = index;
        return Some(route[index]);
    }

    if let Some(spot) = agent.duty.wander_target {
        let taken = spot != agent.position && ctx.occupied.contains(&spot);
        if spot != agent.position && !taken && !agent.nav.failed {
            return Some(spot);
        }
    }
    let anchor = entry.location;
    let radius = ctx.config.patrol_wander_radius;
    for _ in 0..WANDER_ATTEMPTS {
        let spot = anchor.offset(ctx.rng.gen_range(-radius..=radius), ctx.rng.gen_range(-radius..=radius));
        if spot != agent.position && ctx.map.is_passable(spot) && !ctx.occupied.contains(&spot) {
            agent.duty.wander_target = Some(spot);
            return Some(spot);
        }
    }
    agent.duty.wander_target = None;
    None
}

/// Recompute the path when the destination changed, the path ran out, or the
/// agent has been held in place too long. A held-up agent routes around the
/// other agents and the player.
fn route(agent: &mut NpcAgent, destination: Cell, ctx: &mut TickContext) {
    if agent.position == destination {
        agent.nav.target = Some(destination);
        agent.nav.steps.clear();
        return;
    }

    let changed = agent.nav.target != Some(destination);
    if changed {
        agent.nav.target = Some(destination);
        agent.nav.steps.clear();
        agent.nav.failed = false;
        agent.nav.blocked_ticks = 0;
    }
    let stale = agent.nav.steps.is_empty() && !agent.nav.failed;
    let blocked = agent.nav.blocked_ticks >= ctx.config.repath_after_blocked_ticks;
    let limits = ctx.config.search_limits();

    if blocked && !changed && !stale {
        agent.nav.blocked_ticks = 0;
        let mut others = ctx.occupied.clone();
        others.extend(ctx.player);
        others.remove(&agent.position);
        others.remove(&destination);
        // No way around the crowd: keep the old path and wait
        if let Ok(path) = find_path(agent.position, destination, &Overlay::new(ctx.map, &others), limits) {
            debug!("{} routing around agents to {}", agent.id, destination);
            agent.nav.steps = path.steps().collect();
        }
        return;
    }
    if !changed && !stale {
        return;
    }

    match find_path(agent.position, destination, ctx.map, limits) {
        Ok(path) => {
            debug!("{} path to {}: {} steps", agent.id, destination, path.len());
            agent.nav.steps = path.steps().collect();
        }
        Err(error) => {
            debug!("{} cannot reach {}: {}", agent.id, destination, error);
            agent.nav.failed = true;
            agent.nav.steps.clear();
            ctx.events.push(NpcEvent::PathFailed {
                id: agent.id,
                target: destination,
                error,
            });
            match agent.state() {
                NpcState::Travel => {
                    agent.nav.retry_at = Some(ctx.tick + ctx.config.path_retry_ticks);
                    if let Some(transition) = agent.fsm.fire(Trigger::PathBlocked) {
                        record_transition(agent, transition, &mut ctx.events);
                    }
                }
                NpcState::Patrol => {
                    agent.duty.patrol_index += 1;
                    agent.duty.wander_target = None;
                }
                _ => {}
            }
        }
    }
}

fn step_claim(agent: &mut NpcAgent, ctx: &TickContext) -> Option<Cell> {
    let Some(&next) = agent.nav.steps.front() else {
        agent.nav.progress = 0.0;
        return None;
    };
    if !agent.position.is_adjacent(next, ctx.config.connectivity.is_diagonal()) {
        agent.nav.steps.clear();
        return None;
    }

    let multiplier = if agent.state() == NpcState::Chase { CHASE_SPEED } else { 1.0 };
    agent.nav.progress = (agent.nav.progress + agent.stats.speed * multiplier * ctx.dt).min(1.0);
    if agent.nav.progress < 1.0 {
        return None;
    }
    if ctx.player == Some(next) {
        // Held up by the player, which counts toward routing around them
        agent.nav.blocked_ticks += 1;
        return None;
    }
    Some(next)
}

/// Greedy step that best increases the distance to the player
fn flee_step(agent: &mut NpcAgent, ctx: &TickContext) -> Option<Cell> {
    agent.nav.target = None;
    agent.nav.steps.clear();
    let player = ctx.player?;

    agent.nav.progress = (agent.nav.progress + agent.stats.speed * FLEE_SPEED * ctx.dt).min(1.0);
    if agent.nav.progress < 1.0 {
        return None;
    }

    let away = (agent.position.as_vec2() - player.as_vec2()).normalize_or_zero();
    let current = agent.position.distance(player);
    let mut best: Option<(f32, Cell)> = None;
    for (dx, dy) in FLEE_STEPS {
        let cell = agent.position.offset(dx, dy);
        if !ctx.map.is_passable(cell) || ctx.occupied.contains(&cell) || cell.distance(player) <= current {
            continue;
        }
        let score = away.dot(Vec2::new(dx as f32, dy as f32));
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, cell));
        }
    }
    best.map(|(_, cell)| cell)
}

/// Grant step claims in passes over spawn order. A claim succeeds only while
/// its target cell is free, so a cell vacated earlier in the tick can be taken
/// in a later pass and exactly one agent wins a contested cell.
pub(crate) fn resolve_claims(positions: &[Cell], claims: &[Option<Cell>]) -> Vec<bool> {
    let mut holders: HashMap<Cell, usize> = positions.iter().enumerate().map(|(i, c)| (*c, i)).collect();
    let mut granted = vec![false; positions.len()];
    loop {
        let mut moved = false;
        for (i, claim) in claims.iter().enumerate() {
            let Some(cell) = *claim else { continue };
            if granted[i] || holders.contains_key(&cell) {
                continue;
            }
            holders.remove(&positions[i]);
            holders.insert(cell, i);
            granted[i] = true;
            moved = true;
        }
        if !moved {
            return granted;
        }
    }
}

fn commit(agent: &mut NpcAgent, claim: Option<Cell>, granted: bool, ctx: &mut TickContext) {
    if let Some(cell) = claim {
        if granted {
            if let Some(facing) = Facing::toward(agent.position, cell) {
                agent.facing = facing;
            }
            agent.position = cell;
            if agent.nav.steps.front() == Some(&cell) {
                agent.nav.steps.pop_front();
            }
            agent.nav.progress = 0.0;
            agent.nav.blocked_ticks = 0;
        } else {
            agent.nav.blocked_ticks += 1;
        }
    }

    let state = agent.state();
    if matches!(state, NpcState::Combat | NpcState::Dialogue) {
        if let Some(facing) = ctx.player.and_then(|p| Facing::toward(agent.position, p)) {
            agent.facing = facing;
        }
    }

    let in_reach = ctx
        .player
        .is_some_and(|p| agent.position.distance(p) <= ctx.config.attack_radius);
    if state == NpcState::Combat && in_reach && agent.combat.update_attack(ctx.dt) {
        debug!("{} strikes for {:.1}", agent.id, agent.combat.attack);
        ctx.events.push(NpcEvent::Struck {
            id: agent.id,
            damage: agent.combat.attack,
        });
    }

    if matches!(state, NpcState::Idle | NpcState::Dialogue) {
        agent.combat.regenerate(ctx.config.idle_regen_per_second * ctx.dt);
    }
    agent.grudge = (agent.grudge - ctx.dt).max(0.0);
    agent.fsm.advance(ctx.dt);
}

#[cfg(test)]
mod tests {
    use saltwake_core::TimeConfig;

    use super::*;
    use crate::npc::archetype::Archetype;
    use crate::npc::relationship::QuestAccess;
    use crate::npc::schedule::ScheduleEntryRecord;

    fn config() -> AiConfig {
        AiConfig {
            time: TimeConfig {
                max_delta_time: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn open_world(width: u32, height: u32) -> NpcWorld {
        let locations = LocationTable::new()
            .with("cottage", Cell::new(2, 2))
            .with("tavern", Cell::new(width as i32 - 2, height as i32 - 2));
        NpcWorld::new(ObstacleMap::new(width, height), locations, config())
    }

    /// Record that idles at its home all day
    fn homebody(name: &str, archetype: Archetype, home: &str) -> NpcRecord {
        let mut record = NpcRecord::new(name, archetype, home);
        record.schedule = Some(vec![ScheduleEntryRecord::new("00:00", "home", Routine::Idle, "rest")]);
        record
    }

    fn traveller(name: &str, home: &str, destination: &str) -> NpcRecord {
        let mut record = NpcRecord::new(name, Archetype::Villager, home);
        record.schedule = Some(vec![ScheduleEntryRecord::new("00:00", destination, Routine::Idle, "visit")]);
        record
    }

    fn assert_no_shared_cells(world: &NpcWorld) {
        let mut seen = HashSet::new();
        for agent in world.agents() {
            assert!(world.map().is_walkable(agent.position()), "{} on a wall", agent.id());
            assert!(seen.insert(agent.position()), "two agents share {}", agent.position());
        }
    }

    #[test]
    fn test_spawn_finds_free_cells() {
        let mut world = open_world(10, 10);
        let ids: Vec<NpcId> = (0..3)
            .map(|i| world.spawn(&homebody(&format!("v{i}"), Archetype::Villager, "cottage")).unwrap())
            .collect();
        assert_eq!(ids, vec![NpcId(1), NpcId(2), NpcId(3)]);
        assert_eq!(world.agent(ids[0]).unwrap().position(), Cell::new(2, 2));
        assert_no_shared_cells(&world);

        assert_eq!(
            world.spawn_at(&homebody("late", Archetype::Villager, "cottage"), Cell::new(2, 2)),
            Err(NpcError::CellUnavailable(Cell::new(2, 2)))
        );
    }

    #[test]
    fn test_unknown_agent_is_an_error() {
        let mut world = open_world(6, 6);
        let missing = NpcId(42);
        assert_eq!(
            world.interact(missing, InteractionKind::Talk),
            Err(NpcError::UnknownAgent(missing))
        );
        assert!(world.despawn(missing).is_err());
        assert!(world.damage_agent(missing, 5.0).is_err());
        assert!(world.agent(missing).is_none());
    }

    #[test]
    fn test_bad_record_rejected() {
        let mut world = open_world(6, 6);
        let result = world.spawn(&NpcRecord::new("Lost", Archetype::Villager, "atlantis"));
        assert!(matches!(result, Err(NpcError::Content(_))));
        assert_eq!(world.count(), 0);
    }

    #[test]
    fn test_five_gifts_make_a_friend() {
        let mut world = open_world(6, 6);
        let id = world.spawn(&homebody("Nell", Archetype::Villager, "cottage")).unwrap();
        assert_eq!(world.agent(id).unwrap().tier(), RelationshipTier::Stranger);

        let mut outcome = None;
        for _ in 0..5 {
            outcome = Some(world.interact(id, InteractionKind::Gift).unwrap());
        }
        let outcome = outcome.unwrap();
        assert_eq!(outcome.relationship_delta, 5);
        assert_eq!(
            outcome.tier_change,
            Some(TierChange::Promoted {
                from: RelationshipTier::Acquaintance,
                to: RelationshipTier::Friend
            })
        );
        assert_eq!(world.agent(id).unwrap().tier(), RelationshipTier::Friend);
        assert_eq!(world.agent(id).unwrap().relationship().score(), 25);
    }

    #[test]
    fn test_gift_preferences() {
        let mut world = open_world(6, 6);
        let mut record = homebody("Marta", Archetype::Fisherman, "cottage");
        record.loved_gifts = vec!["pearl".into()];
        let id = world.spawn(&record).unwrap();
        let outcome = world.gift(id, "pearl").unwrap();
        assert_eq!(outcome.relationship_delta, 25);
        assert_eq!(outcome.dialogue_line.to_string(), "fisherman/thanks/friend/friendly");
    }

    #[test]
    fn test_memory_capped_fifo() {
        let mut world = open_world(6, 6);
        let id = world.spawn(&homebody("Ivy", Archetype::Villager, "cottage")).unwrap();
        for _ in 0..55 {
            world.interact(id, InteractionKind::Talk).unwrap();
        }
        world.interact(id, InteractionKind::Compliment).unwrap();
        let memory = world.agent(id).unwrap().memory();
        assert_eq!(memory.len(), 50);
        assert_eq!(memory.last().map(|r| r.kind()), Some(InteractionKind::Compliment));
        assert_eq!(memory.times(InteractionKind::Talk), 55);
    }

    #[test]
    fn test_identical_histories_give_identical_tiers() {
        let sequence = [
            InteractionKind::Talk,
            InteractionKind::Insult,
            InteractionKind::Gift,
            InteractionKind::QuestCompleted,
            InteractionKind::Theft,
            InteractionKind::Rescue,
        ];
        let mut world = open_world(8, 8);
        let a = world.spawn(&homebody("A", Archetype::Merchant, "cottage")).unwrap();
        let b = world.spawn(&homebody("B", Archetype::Merchant, "cottage")).unwrap();
        for kind in sequence {
            world.interact(a, kind).unwrap();
            world.tick(0.5);
            world.interact(b, kind).unwrap();
        }
        let (a, b) = (world.agent(a).unwrap(), world.agent(b).unwrap());
        assert_eq!(a.relationship().score(), b.relationship().score());
        assert_eq!(a.tier(), b.tier());
    }

    #[test]
    fn test_contested_cell_goes_to_earlier_agent() {
        let positions = [Cell::new(0, 1), Cell::new(2, 1)];
        let claims = [Some(Cell::new(1, 1)), Some(Cell::new(1, 1))];
        assert_eq!(resolve_claims(&positions, &claims), vec![true, false]);
    }

    #[test]
    fn test_claims_follow_a_vacated_cell() {
        // The second agent moves first, then the first one takes its cell
        let positions = [Cell::new(0, 0), Cell::new(1, 0)];
        let claims = [Some(Cell::new(1, 0)), Some(Cell::new(2, 0))];
        assert_eq!(resolve_claims(&positions, &claims), vec![true, true]);

        // Head-on swaps never pass through each other
        let claims = [Some(Cell::new(1, 0)), Some(Cell::new(0, 0))];
        assert_eq!(resolve_claims(&positions, &claims), vec![false, false]);
    }

    #[test]
    fn test_travel_reaches_schedule_location() {
        let map = ObstacleMap::from_ascii(
            "
            ..........
            ....#.....
            ....#.....
            ....#.....
            ..........
            ",
        )
        .unwrap();
        let locations = LocationTable::new()
            .with("cottage", Cell::new(1, 2))
            .with("tavern", Cell::new(8, 2));
        let mut world = NpcWorld::new(map, locations, config());
        let id = world.spawn(&traveller("Bo", "cottage", "tavern")).unwrap();

        let report = world.tick(0.5);
        assert!(report.events.iter().any(|e| matches!(
            e,
            NpcEvent::StateChanged { to: NpcState::Travel, trigger: Trigger::ScheduleTravel, .. }
        )));

        for _ in 0..30 {
            world.tick(0.5);
        }
        let agent = world.agent(id).unwrap();
        assert_eq!(agent.position(), Cell::new(8, 2));
        assert_eq!(agent.state(), NpcState::Idle);
    }

    #[test]
    fn test_unreachable_target_idles_while_others_move() {
        let map = ObstacleMap::from_ascii(
            "
            ..........
            .......###
            .......#..
            .......###
            ..........
            ",
        )
        .unwrap();
        let locations = LocationTable::new()
            .with("cottage", Cell::new(0, 0))
            .with("shed", Cell::new(0, 4))
            .with("island", Cell::new(9, 2))
            .with("tavern", Cell::new(5, 4));
        let mut world = NpcWorld::new(map, locations, config());
        let stuck = world.spawn(&traveller("Stuck", "cottage", "island")).unwrap();
        let walker = world.spawn(&traveller("Walker", "shed", "tavern")).unwrap();

        let mut failures = 0;
        for _ in 0..10 {
            let report = world.tick(0.5);
            failures += report
                .events
                .iter()
                .filter(|e| matches!(e, NpcEvent::PathFailed { id, .. } if *id == stuck))
                .count();
        }
        assert_eq!(failures, 1);
        let stuck = world.agent(stuck).unwrap();
        assert_eq!(stuck.position(), Cell::new(0, 0));
        assert_eq!(stuck.state(), NpcState::Idle);
        assert_eq!(world.agent(walker).unwrap().position(), Cell::new(5, 4));
    }

    #[test]
    fn test_no_shared_cells_under_traffic() {
        let map = ObstacleMap::from_ascii(
            "
            ............
            .####..####.
            ............
            .##.####.##.
            ............
            ",
        )
        .unwrap();
        let locations = LocationTable::new()
            .with("west", Cell::new(0, 2))
            .with("east", Cell::new(11, 2))
            .with("north", Cell::new(5, 0))
            .with("south", Cell::new(6, 4));
        let mut world = NpcWorld::new(
            map,
            locations,
            AiConfig {
                game_minutes_per_second: 20.0,
                ..config()
            },
        );
        let places = ["west", "east", "north", "south"];
        for i in 0..8 {
            let mut record = NpcRecord::new(format!("n{i}"), Archetype::Villager, places[i % 4]);
            record.schedule = Some(vec![
                ScheduleEntryRecord::new("06:00", places[(i + 1) % 4], Routine::Idle, "a"),
                ScheduleEntryRecord::new("06:30", places[(i + 2) % 4], Routine::Patrol, "b"),
                ScheduleEntryRecord::new("07:00", places[(i + 3) % 4], Routine::Idle, "c"),
            ]);
            world.spawn(&record).unwrap();
        }
        world.set_player_position(Some(Cell::new(6, 2)));

        for _ in 0..500 {
            world.tick(0.5);
            assert_no_shared_cells(&world);
            assert!(world.agent_at(Cell::new(6, 2)).is_none());
        }
    }

    #[test]
    fn test_talk_then_walk_away() {
        let mut world = open_world(16, 6);
        let id = world.spawn(&homebody("Rosa", Archetype::Merchant, "cottage")).unwrap();
        world.set_player_position(Some(Cell::new(3, 2)));
        world.tick(0.5);

        let outcome = world.interact(id, InteractionKind::Talk).unwrap();
        assert_eq!(outcome.state, NpcState::Dialogue);
        assert_eq!(outcome.dialogue_line.topic, Topic::Greeting);
        world.tick(0.5);
        assert_eq!(world.agent(id).unwrap().state(), NpcState::Dialogue);
        assert_eq!(world.agent(id).unwrap().facing(), Facing::Right);

        world.set_player_position(Some(Cell::new(12, 2)));
        let report = world.tick(0.5);
        assert!(report.events.contains(&NpcEvent::StateChanged {
            id,
            from: NpcState::Dialogue,
            to: NpcState::Idle,
            trigger: Trigger::DialogueEnded,
        }));
    }

    #[test]
    fn test_end_dialogue() {
        let mut world = open_world(8, 8);
        let id = world.spawn(&homebody("Rosa", Archetype::Merchant, "cottage")).unwrap();
        world.interact(id, InteractionKind::Talk).unwrap();
        let farewell = world.end_dialogue(id).unwrap();
        assert_eq!(farewell.topic, Topic::Farewell);
        assert_eq!(world.agent(id).unwrap().state(), NpcState::Idle);
    }

    #[test]
    fn test_pirate_chases_and_strikes() {
        let mut world = open_world(12, 6);
        let id = world.spawn(&homebody("Red", Archetype::Pirate, "cottage")).unwrap();
        world.set_player_position(Some(Cell::new(7, 2)));

        let mut struck = false;
        for _ in 0..12 {
            let report = world.tick(0.5);
            struck |= report.events.iter().any(|e| matches!(e, NpcEvent::Struck { .. }));
        }
        let pirate = world.agent(id).unwrap();
        assert!(struck);
        assert_eq!(pirate.state(), NpcState::Combat);
        assert_eq!(pirate.position(), Cell::new(6, 2));
        assert_eq!(pirate.facing(), Facing::Right);
    }

    #[test]
    fn test_talking_to_a_hostile_npc_draws_a_threat() {
        let mut world = open_world(8, 8);
        let id = world.spawn(&homebody("Red", Archetype::Pirate, "cottage")).unwrap();
        let outcome = world.interact(id, InteractionKind::Talk).unwrap();
        assert_eq!(outcome.dialogue_line.topic, Topic::Threat);
        assert_ne!(outcome.state, NpcState::Dialogue);
    }

    #[test]
    fn test_theft_provokes_a_guard() {
        let mut world = open_world(8, 8);
        let id = world.spawn(&homebody("Gus", Archetype::Guard, "cottage")).unwrap();
        let outcome = world.interact(id, InteractionKind::Theft).unwrap();
        assert_eq!(outcome.state, NpcState::Chase);
        assert_eq!(outcome.tier_change.map(|c| c.to()), Some(RelationshipTier::Disliked));
        assert!(world.agent(id).unwrap().is_hostile());
    }

    #[test]
    fn test_attack_scares_a_villager() {
        let mut world = open_world(8, 8);
        let id = world.spawn(&homebody("Pip", Archetype::Villager, "cottage")).unwrap();
        let outcome = world.interact(id, InteractionKind::Attack).unwrap();
        assert_eq!(outcome.mood, Mood::Scared);
        assert_eq!(outcome.state, NpcState::Flee);
    }

    #[test]
    fn test_wounded_npc_flees() {
        let mut world = open_world(20, 20);
        let mut record = homebody("Tam", Archetype::Villager, "cottage");
        record.stats.brave = Some(true);
        let id = world.spawn_at(&record, Cell::new(10, 10)).unwrap();
        world.set_player_position(Some(Cell::new(10, 12)));

        let hit = world.damage_agent(id, 60.0).unwrap();
        assert_eq!(hit.dealt, 59.0);
        assert!(!hit.knocked_out);

        let report = world.tick(0.5);
        assert!(report.events.iter().any(|e| matches!(
            e,
            NpcEvent::StateChanged { to: NpcState::Flee, trigger: Trigger::Threatened, .. }
        )));
        for _ in 0..4 {
            world.tick(0.5);
        }
        let agent = world.agent(id).unwrap();
        assert!(agent.position().distance(Cell::new(10, 12)) > 5.0);
    }

    #[test]
    fn test_despawn_and_range_queries() {
        let mut world = open_world(10, 10);
        let a = world.spawn_at(&homebody("A", Archetype::Villager, "cottage"), Cell::new(1, 1)).unwrap();
        let b = world.spawn_at(&homebody("B", Archetype::Villager, "cottage"), Cell::new(8, 8)).unwrap();
        assert_eq!(world.agents_in_range(Cell::new(0, 0), 3.0), vec![a]);
        assert_eq!(world.agent_at(Cell::new(8, 8)), Some(b));

        let removed = world.despawn(a).unwrap();
        assert_eq!(removed.name(), "A");
        assert_eq!(world.count(), 1);
        assert!(world.spawn_at(&homebody("C", Archetype::Villager, "cottage"), Cell::new(1, 1)).is_ok());
    }

    #[test]
    fn test_snapshot_json() {
        let mut world = open_world(6, 6);
        world.spawn(&homebody("Nell", Archetype::Villager, "cottage")).unwrap();
        world.tick(0.5);
        let json = serde_json::to_value(world.snapshots()).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["name"], "Nell");
        assert_eq!(json[0]["state"], "idle");
        assert_eq!(json[0]["tier"], "stranger");
        assert_eq!(json[0]["position"]["x"], 2);
    }

    #[test]
    fn test_schedule_window_change_reported() {
        let map = ObstacleMap::new(10, 4);
        let locations = LocationTable::new()
            .with("cottage", Cell::new(1, 1))
            .with("tavern", Cell::new(8, 1));
        let mut world = NpcWorld::new(map, locations, config()).with_clock(WorldClock::new(ClockTime::hm(7, 59)));
        let mut record = NpcRecord::new("Lou", Archetype::Villager, "cottage");
        record.schedule = Some(vec![
            ScheduleEntryRecord::new("06:00", "home", Routine::Idle, "breakfast"),
            ScheduleEntryRecord::new("08:00", "tavern", Routine::Idle, "work"),
        ]);
        let id = world.spawn(&record).unwrap();

        world.tick(0.5);
        assert_eq!(world.agent(id).unwrap().state(), NpcState::Idle);

        // 07:59.5 -> 08:00.5
        let report = world.tick(1.0);
        assert!(report.events.contains(&NpcEvent::ScheduleChanged {
            id,
            activity: "work".into(),
            location: Cell::new(8, 1),
        }));
        assert_eq!(world.agent(id).unwrap().state(), NpcState::Travel);
    }

    #[test]
    fn test_mood_decays_on_schedule_ticks() {
        let mut world = NpcWorld::new(
            ObstacleMap::new(6, 6),
            LocationTable::new().with("cottage", Cell::new(2, 2)),
            AiConfig {
                game_minutes_per_second: 10.0,
                mood_decay_rate: 0.5,
                ..config()
            },
        );
        let id = world.spawn(&homebody("Ada", Archetype::Fisherman, "cottage")).unwrap();
        world.interact(id, InteractionKind::LovedGift).unwrap();
        assert_eq!(world.agent(id).unwrap().mood(), Mood::Happy);
        for _ in 0..20 {
            world.tick(1.0);
        }
        assert_eq!(world.agent(id).unwrap().mood(), Mood::Neutral);
    }

    #[test]
    fn test_player_in_the_way_is_walked_around() {
        let locations = LocationTable::new()
            .with("start", Cell::new(0, 1))
            .with("goal", Cell::new(4, 1));
        let mut world = NpcWorld::new(ObstacleMap::new(5, 3), locations, config());
        let id = world.spawn(&traveller("Bo", "start", "goal")).unwrap();
        world.set_player_position(Some(Cell::new(2, 1)));

        for _ in 0..40 {
            world.tick(0.5);
            assert_ne!(world.agent(id).unwrap().position(), Cell::new(2, 1));
        }
        let agent = world.agent(id).unwrap();
        assert_eq!(agent.position(), Cell::new(4, 1));
        assert_eq!(agent.state(), NpcState::Idle);
    }

    #[test]
    fn test_runaway_clock_rate_still_ticks() {
        let mut world = NpcWorld::new(
            ObstacleMap::new(6, 6),
            LocationTable::new().with("cottage", Cell::new(2, 2)),
            AiConfig {
                game_minutes_per_second: f32::MAX,
                ..config()
            },
        );
        world.spawn(&homebody("Ada", Archetype::Villager, "cottage")).unwrap();
        world.tick(0.5);
        // Clamped to a day per second: half a day passes
        assert_eq!(world.clock().now(), ClockTime::hm(18, 0));
        assert_eq!(world.clock().day(), 0);
    }

    #[test]
    fn test_greeting_and_prices_follow_tier_and_mood() {
        let mut world = open_world(6, 6);
        let id = world.spawn(&homebody("Rosa", Archetype::Merchant, "cottage")).unwrap();

        let hello = world.interact(id, InteractionKind::Talk).unwrap();
        assert_eq!(hello.dialogue_line.to_string(), "merchant/greeting/stranger/neutral/morning");
        assert_eq!(hello.modifiers.quests, QuestAccess::Basic);
        assert_eq!(hello.price_modifier, 1.0);

        let thanks = world.interact(id, InteractionKind::LovedGift).unwrap();
        assert_eq!(thanks.dialogue_line.period, None);
        assert_eq!(thanks.modifiers.quests, QuestAccess::Standard);
        assert_eq!(thanks.mood, Mood::Happy);
        assert!((thanks.price_modifier - 0.81).abs() < 1e-5);
    }

    #[test]
    fn test_short_attack_radius_still_reaches_combat() {
        let mut world = NpcWorld::new(
            ObstacleMap::new(12, 6),
            LocationTable::new().with("cottage", Cell::new(2, 2)),
            AiConfig {
                attack_radius: 0.2,
                ..config()
            },
        );
        let id = world.spawn(&homebody("Red", Archetype::Pirate, "cottage")).unwrap();
        world.set_player_position(Some(Cell::new(7, 2)));
        for _ in 0..12 {
            world.tick(0.5);
        }
        let pirate = world.agent(id).unwrap();
        assert_eq!(pirate.state(), NpcState::Combat);
        assert_eq!(pirate.position(), Cell::new(6, 2));
    }

    #[test]
    fn test_first_strike_waits_a_cooldown() {
        let mut world = open_world(8, 8);
        let id = world
            .spawn_at(&homebody("Red", Archetype::Pirate, "cottage"), Cell::new(2, 2))
            .unwrap();
        world.set_player_position(Some(Cell::new(3, 2)));

        let mut strikes = Vec::new();
        for _ in 0..6 {
            let report = world.tick(0.5);
            if report.events.iter().any(|e| matches!(e, NpcEvent::Struck { .. })) {
                strikes.push(report.tick);
            }
        }
        assert_eq!(world.agent(id).unwrap().state(), NpcState::Combat);
        // 1.5 s cooldown at 0.5 s per tick, counted from entering combat
        assert_eq!(strikes, vec![3, 6]);
    }
}

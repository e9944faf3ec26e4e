//! Tunables for the NPC simulation
//!
//! Loaded by the host from `settings.toml`; every field has a default.

use saltwake_core::TimeConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::npc::behavior::Thresholds;
use crate::npc::pathfinding::{Connectivity, SearchLimits};

/// All NPC AI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Distance (cells) at which a hostile NPC starts chasing
    pub awareness_entry_radius: f32,
    /// Distance (cells) beyond which a chase is given up. Must exceed the entry radius.
    pub awareness_exit_radius: f32,
    /// Distance (cells) at which melee combat starts
    pub attack_radius: f32,
    /// Conversations end once the player is farther than this
    pub dialogue_radius: f32,
    /// Health fraction below which NPCs flee
    pub flee_health_fraction: f32,
    /// Interaction records kept per NPC
    pub memory_capacity: usize,
    /// How many recent records drive mood
    pub mood_window: usize,
    /// Fraction of the distance to the resting mood recovered per schedule tick
    pub mood_decay_rate: f32,
    /// Game minutes between schedule ticks
    pub schedule_tick_minutes: u64,
    /// Game minutes that pass per real second
    pub game_minutes_per_second: f32,
    /// Pathfinder node expansion cap
    pub max_path_expansions: usize,
    /// Movement connectivity for the pathfinder
    pub connectivity: Connectivity,
    /// Ticks to idle before retrying a failed schedule route
    pub path_retry_ticks: u64,
    /// Ticks an NPC may be held in place before it routes around other NPCs
    pub repath_after_blocked_ticks: u32,
    /// Radius (cells) of wandering when a patrol has no route
    pub patrol_wander_radius: i32,
    /// Health regained per second while idle or talking
    pub idle_regen_per_second: f32,
    /// Seed for patrol wander choices
    pub rng_seed: u64,
    /// Frame delta clamp and time scale
    pub time: TimeConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            awareness_entry_radius: 6.0,
            awareness_exit_radius: 9.0,
            attack_radius: 1.5,
            dialogue_radius: 3.0,
            flee_health_fraction: 0.3,
            memory_capacity: 50,
            mood_window: 5,
            mood_decay_rate: 0.1,
            schedule_tick_minutes: 10,
            game_minutes_per_second: 1.0,
            max_path_expansions: 4096,
            connectivity: Connectivity::Four,
            path_retry_ticks: 120,
            repath_after_blocked_ticks: 8,
            patrol_wander_radius: 3,
            idle_regen_per_second: 1.0,
            rng_seed: 0x5a17_3a4e,
            time: TimeConfig::default(),
        }
    }
}

/// Fastest world clock: one game day per real second
pub const MAX_GAME_MINUTES_PER_SECOND: f32 = 1440.0;
/// Upper bound for `time.time_scale`
pub const MAX_TIME_SCALE: f32 = 16.0;
/// Upper bound for `time.max_delta_time`, in seconds
pub const MAX_FRAME_DELTA: f32 = 1.0;

impl AiConfig {
    /// Repair out-of-range values so the simulation can always run
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        for (name, value, default) in [
            ("awareness_entry_radius", &mut self.awareness_entry_radius, defaults.awareness_entry_radius),
            ("awareness_exit_radius", &mut self.awareness_exit_radius, defaults.awareness_exit_radius),
            ("attack_radius", &mut self.attack_radius, defaults.attack_radius),
            ("dialogue_radius", &mut self.dialogue_radius, defaults.dialogue_radius),
            ("flee_health_fraction", &mut self.flee_health_fraction, defaults.flee_health_fraction),
            ("mood_decay_rate", &mut self.mood_decay_rate, defaults.mood_decay_rate),
            ("game_minutes_per_second", &mut self.game_minutes_per_second, defaults.game_minutes_per_second),
            ("idle_regen_per_second", &mut self.idle_regen_per_second, defaults.idle_regen_per_second),
            ("time.time_scale", &mut self.time.time_scale, defaults.time.time_scale),
            ("time.max_delta_time", &mut self.time.max_delta_time, defaults.time.max_delta_time),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warn!("{} = {} is invalid, using {}", name, value, default);
                *value = default;
            }
        }
        if self.time.max_delta_time == 0.0 {
            warn!("time.max_delta_time must be positive, using {}", defaults.time.max_delta_time);
            self.time.max_delta_time = defaults.time.max_delta_time;
        }
        self.time.max_delta_time = self.time.max_delta_time.min(MAX_FRAME_DELTA);
        self.time.time_scale = self.time.time_scale.min(MAX_TIME_SCALE);
        self.game_minutes_per_second = self.game_minutes_per_second.min(MAX_GAME_MINUTES_PER_SECOND);

        // An NPC next to the player must be within striking range
        let min_attack = if self.connectivity.is_diagonal() {
            std::f32::consts::SQRT_2
        } else {
            1.0
        };
        if self.attack_radius < min_attack {
            warn!("attack_radius {} cannot reach a neighbouring cell, using {}", self.attack_radius, min_attack);
            self.attack_radius = min_attack;
        }
        if self.dialogue_radius < 1.0 {
            warn!("dialogue_radius {} is too small, using 1", self.dialogue_radius);
            self.dialogue_radius = 1.0;
        }
        if self.awareness_entry_radius <= self.attack_radius {
            warn!(
                "awareness_entry_radius {} must exceed attack radius {}, widening",
                self.awareness_entry_radius, self.attack_radius
            );
            self.awareness_entry_radius = self.attack_radius + 1.0;
        }
        if self.awareness_exit_radius <= self.awareness_entry_radius {
            warn!(
                "awareness_exit_radius {} must exceed entry radius {}, widening",
                self.awareness_exit_radius, self.awareness_entry_radius
            );
            self.awareness_exit_radius = self.awareness_entry_radius + 1.0;
        }
        self.flee_health_fraction = self.flee_health_fraction.clamp(0.0, 1.0);
        self.mood_decay_rate = self.mood_decay_rate.clamp(0.0, 1.0);
        self.memory_capacity = self.memory_capacity.max(1);
        self.mood_window = self.mood_window.max(1);
        self.schedule_tick_minutes = self.schedule_tick_minutes.max(1);
        self.max_path_expansions = self.max_path_expansions.max(1);
        self.patrol_wander_radius = self.patrol_wander_radius.max(1);
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            entry_radius: self.awareness_entry_radius,
            exit_radius: self.awareness_exit_radius,
            attack_radius: self.attack_radius,
            dialogue_radius: self.dialogue_radius,
            flee_health_fraction: self.flee_health_fraction,
        }
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            connectivity: self.connectivity,
            max_expansions: self.max_path_expansions,
        }
    }
}

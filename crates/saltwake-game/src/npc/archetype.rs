//! NPC archetypes: default stats, temperament, and daily timelines

use serde::{Deserialize, Serialize};

use super::schedule::{Routine, ScheduleEntryRecord};

/// Broad kind of townsperson, chosen in content records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Merchant,
    Fisherman,
    TavernKeeper,
    Guard,
    Pirate,
    #[default]
    Villager,
}

/// Every location name referenced by the built-in timelines and routes
pub const TEMPLATE_LOCATIONS: &[&str] = &[
    "market_stall",
    "fish_market",
    "tavern",
    "tavern_bar",
    "tavern_kitchen",
    "tavern_room",
    "dock_main",
    "pier_end_1",
    "pier_end_2",
    "barracks",
    "plaza_center",
    "mansion_gate",
    "beach_path",
    "hideout",
];

/// Stats an archetype starts with before record overrides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: f32,
    pub attack: f32,
    pub defense: f32,
    /// Movement speed in cells per second
    pub speed: f32,
    /// Brave NPCs are never scared by an attack
    pub brave: bool,
    /// Aggressive NPCs fight back and chase disliked players
    pub aggressive: bool,
}

/// Per-record stat tweaks; unset fields keep the archetype value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatOverrides {
    pub max_health: Option<f32>,
    pub attack: Option<f32>,
    pub defense: Option<f32>,
    pub speed: Option<f32>,
    pub brave: Option<bool>,
    pub aggressive: Option<bool>,
}

impl BaseStats {
    pub fn with_overrides(self, overrides: &StatOverrides) -> Self {
        Self {
            max_health: overrides.max_health.unwrap_or(self.max_health),
            attack: overrides.attack.unwrap_or(self.attack),
            defense: overrides.defense.unwrap_or(self.defense),
            speed: overrides.speed.unwrap_or(self.speed),
            brave: overrides.brave.unwrap_or(self.brave),
            aggressive: overrides.aggressive.unwrap_or(self.aggressive),
        }
    }
}

impl Archetype {
    pub fn default_stats(&self) -> BaseStats {
        let (max_health, attack, defense, speed, brave, aggressive) = match self {
            Archetype::Merchant => (80.0, 4.0, 2.0, 3.0, false, false),
            Archetype::Fisherman => (100.0, 6.0, 3.0, 3.0, true, false),
            Archetype::TavernKeeper => (90.0, 5.0, 3.0, 2.5, true, false),
            Archetype::Guard => (150.0, 12.0, 8.0, 3.5, true, true),
            Archetype::Pirate => (120.0, 10.0, 4.0, 4.0, true, true),
            Archetype::Villager => (70.0, 3.0, 1.0, 3.0, false, false),
        };
        BaseStats {
            max_health,
            attack,
            defense,
            speed,
            brave,
            aggressive,
        }
    }

    /// Resting mood valence
    pub fn temperament(&self) -> f32 {
        match self {
            Archetype::Merchant | Archetype::Villager => 5.0,
            Archetype::TavernKeeper => 10.0,
            Archetype::Fisherman | Archetype::Guard => 0.0,
            Archetype::Pirate => -10.0,
        }
    }

    /// Relationship score before the player has done anything
    pub fn starting_score(&self) -> i32 {
        match self {
            Archetype::Pirate => -35,
            _ => 0,
        }
    }

    /// Dialogue set used when a record names none
    pub fn dialogue_set(&self) -> &'static str {
        match self {
            Archetype::Merchant => "merchant",
            Archetype::Fisherman => "fisherman",
            Archetype::TavernKeeper => "tavern_keeper",
            Archetype::Guard => "guard",
            Archetype::Pirate => "pirate",
            Archetype::Villager => "villager",
        }
    }

    /// Route walked by patrol windows that name no route of their own
    pub fn default_patrol_route(&self) -> &'static [&'static str] {
        match self {
            Archetype::Guard => &["plaza_center", "market_stall", "dock_main", "tavern", "mansion_gate"],
            Archetype::Pirate => &["hideout", "beach_path", "pier_end_2"],
            _ => &[],
        }
    }

    /// Daily timeline over named locations
    pub fn default_schedule(&self) -> Vec<ScheduleEntryRecord> {
        use Routine::{Idle, Patrol};
        let idle = |time, location, activity| ScheduleEntryRecord::new(time, location, Idle, activity);
        let patrol = |time, location, activity| ScheduleEntryRecord::new(time, location, Patrol, activity);

        match self {
            Archetype::Merchant => vec![
                idle("05:00", "home", "wake_up"),
                idle("06:00", "market_stall", "setup_shop"),
                idle("07:00", "market_stall", "work"),
                idle("16:30", "market_stall", "close_shop"),
                idle("17:00", "tavern", "socialize"),
                idle("19:30", "home", "dinner"),
                idle("22:00", "home", "sleep"),
            ],
            Archetype::Fisherman => vec![
                idle("04:00", "home", "wake_up"),
                idle("04:40", "dock_main", "prepare_boat"),
                idle("05:30", "pier_end_1", "fishing"),
                idle("11:30", "fish_market", "return_catch"),
                idle("12:30", "tavern", "lunch"),
                idle("13:30", "dock_main", "repair_nets"),
                idle("15:30", "pier_end_2", "afternoon_fishing"),
                idle("18:30", "dock_main", "clean_boat"),
                idle("19:00", "tavern", "dinner_drinks"),
                idle("22:00", "home", "sleep"),
            ],
            Archetype::TavernKeeper => vec![
                idle("09:00", "tavern_room", "wake_up"),
                idle("09:30", "tavern_kitchen", "breakfast"),
                idle("10:00", "tavern", "clean_tavern"),
                idle("12:00", "tavern_kitchen", "prepare_food"),
                idle("14:00", "tavern_bar", "serve_customers"),
                idle("01:00", "tavern", "close_tavern"),
                idle("02:00", "tavern_room", "sleep"),
            ],
            Archetype::Guard => vec![
                idle("06:00", "barracks", "wake_up"),
                patrol("07:00", "plaza_center", "morning_patrol")
                    .with_route(&["plaza_center", "market_stall", "dock_main"]),
                idle("10:00", "mansion_gate", "guard_post"),
                idle("12:00", "barracks", "lunch"),
                patrol("13:00", "mansion_gate", "afternoon_patrol")
                    .with_route(&["mansion_gate", "plaza_center", "tavern"]),
                idle("16:00", "barracks", "training"),
                patrol("19:00", "tavern", "evening_patrol")
                    .with_route(&["tavern", "plaza_center", "dock_main", "beach_path"]),
                idle("22:00", "dock_main", "night_watch"),
                idle("02:00", "barracks", "off_duty"),
            ],
            Archetype::Pirate => vec![
                idle("10:00", "hideout", "wake_up"),
                patrol("11:00", "beach_path", "scout_beach"),
                idle("14:00", "tavern", "drink"),
                patrol("18:00", "dock_main", "prowl_docks").with_route(&["dock_main", "pier_end_2", "beach_path"]),
                idle("23:00", "hideout", "sleep"),
            ],
            Archetype::Villager => vec![
                idle("07:00", "home", "wake_up"),
                idle("08:00", "fish_market", "shopping"),
                idle("10:00", "plaza_center", "chat"),
                idle("12:00", "home", "lunch"),
                idle("14:00", "market_stall", "browse"),
                idle("17:00", "tavern", "socialize"),
                idle("20:00", "home", "sleep"),
            ],
        }
    }
}

//! NPC content records and their validation
//!
//! Records are authored as JSON (or TOML) and turned into an [`AgentConfig`]
//! at spawn time. Only a missing name or home rejects a record; every other
//! bad field is logged and replaced with the archetype default. A record with
//! no archetype is a villager.

use saltwake_core::Cell;
use saltwake_world::LocationTable;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::archetype::{Archetype, BaseStats, StatOverrides};
use super::memory::InteractionKind;
use super::schedule::{resolve_location, Schedule};
use crate::error::ContentError;

pub use super::schedule::ScheduleEntryRecord;

/// One NPC as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub name: String,
    #[serde(default)]
    pub archetype: Archetype,
    /// Location name of the NPC's home
    pub home: String,
    /// Replaces the archetype timeline when present
    #[serde(default)]
    pub schedule: Option<Vec<ScheduleEntryRecord>>,
    #[serde(default)]
    pub stats: StatOverrides,
    #[serde(default)]
    pub patrol_route: Option<Vec<String>>,
    #[serde(default)]
    pub dialogue_set: Option<String>,
    #[serde(default)]
    pub loved_gifts: Vec<String>,
    #[serde(default)]
    pub disliked_gifts: Vec<String>,
    #[serde(default)]
    pub starting_score: Option<i32>,
    #[serde(default)]
    pub temperament: Option<f32>,
}

impl NpcRecord {
    pub fn new(name: impl Into<String>, archetype: Archetype, home: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            archetype,
            home: home.into(),
            schedule: None,
            stats: StatOverrides::default(),
            patrol_route: None,
            dialogue_set: None,
            loved_gifts: Vec::new(),
            disliked_gifts: Vec::new(),
            starting_score: None,
            temperament: None,
        }
    }

    /// Interaction kind for handing this NPC `item`
    pub fn gift_kind(&self, item: &str) -> InteractionKind {
        gift_kind(&self.loved_gifts, &self.disliked_gifts, item)
    }

    /// Strict check of every field, for content tooling
    pub fn validate(&self, locations: &LocationTable) -> Result<(), ContentError> {
        if self.name.trim().is_empty() {
            return Err(ContentError::EmptyName);
        }
        let home = home_cell(&self.home, locations)?;
        if let Some(records) = &self.schedule {
            Schedule::from_records(records, locations, home)?;
        }
        for (name, value) in stat_values(&self.stats) {
            if stat_invalid(name, value) {
                return Err(ContentError::InvalidStat { name, value });
            }
        }
        for name in self.patrol_route.iter().flatten() {
            resolve_location(name, locations, home)?;
        }
        Ok(())
    }
}

pub(crate) fn gift_kind(loved: &[String], disliked: &[String], item: &str) -> InteractionKind {
    if loved.iter().any(|g| g == item) {
        InteractionKind::LovedGift
    } else if disliked.iter().any(|g| g == item) {
        InteractionKind::DislikedGift
    } else {
        InteractionKind::Gift
    }
}

fn home_cell(name: &str, locations: &LocationTable) -> Result<Cell, ContentError> {
    locations
        .get(name)
        .ok_or_else(|| ContentError::UnknownLocation(name.to_string()))
}

/// Defense may be zero; every other stat must be positive
fn stat_invalid(name: &str, value: f32) -> bool {
    if name == "defense" {
        value < 0.0
    } else {
        value <= 0.0
    }
}

fn stat_values(stats: &StatOverrides) -> Vec<(&'static str, f32)> {
    [
        ("max_health", stats.max_health),
        ("attack", stats.attack),
        ("defense", stats.defense),
        ("speed", stats.speed),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect()
}

/// Validated, resolved settings for spawning one NPC
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub archetype: Archetype,
    pub home: Cell,
    pub schedule: Schedule,
    pub stats: BaseStats,
    pub patrol_route: Vec<Cell>,
    pub dialogue_set: String,
    pub loved_gifts: Vec<String>,
    pub disliked_gifts: Vec<String>,
    pub starting_score: i32,
    pub temperament: f32,
}

impl AgentConfig {
    pub fn from_record(record: &NpcRecord, locations: &LocationTable) -> Result<Self, ContentError> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(ContentError::EmptyName);
        }
        let archetype = record.archetype;
        let home = home_cell(&record.home, locations)?;

        let schedule = match &record.schedule {
            Some(records) => Schedule::from_records(records, locations, home).unwrap_or_else(|err| {
                warn!("{name}: bad schedule ({err}), using the {archetype:?} timeline");
                archetype_schedule(name, archetype, locations, home)
            }),
            None => archetype_schedule(name, archetype, locations, home),
        };

        let mut overrides = record.stats;
        for (stat, value) in stat_values(&overrides) {
            if stat_invalid(stat, value) {
                warn!("{name}: {stat} = {value} is invalid, using the archetype value");
                match stat {
                    "max_health" => overrides.max_health = None,
                    "attack" => overrides.attack = None,
                    "defense" => overrides.defense = None,
                    _ => overrides.speed = None,
                }
            }
        }
        let stats = archetype.default_stats().with_overrides(&overrides);

        let route_names: Vec<&str> = match &record.patrol_route {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => archetype.default_patrol_route().to_vec(),
        };
        let patrol_route = route_names
            .into_iter()
            .filter_map(|place| match resolve_location(place, locations, home) {
                Ok(cell) => Some(cell),
                Err(err) => {
                    warn!("{name}: dropping patrol waypoint ({err})");
                    None
                }
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            archetype,
            home,
            schedule,
            stats,
            patrol_route,
            dialogue_set: record
                .dialogue_set
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| archetype.dialogue_set().to_string()),
            loved_gifts: record.loved_gifts.clone(),
            disliked_gifts: record.disliked_gifts.clone(),
            starting_score: record.starting_score.unwrap_or_else(|| archetype.starting_score()),
            temperament: record.temperament.unwrap_or_else(|| archetype.temperament()),
        })
    }
}

fn archetype_schedule(name: &str, archetype: Archetype, locations: &LocationTable, home: Cell) -> Schedule {
    Schedule::from_records(&archetype.default_schedule(), locations, home).unwrap_or_else(|err| {
        warn!("{name}: {archetype:?} timeline unusable here ({err}), idling at home");
        Schedule::idle_at(home)
    })
}

/// Parse a JSON array of records. Entries that do not deserialize are
/// logged and skipped so the rest of the roster still loads.
pub fn parse_roster(json: &str) -> Result<Vec<NpcRecord>, ContentError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<NpcRecord>(entry) {
            Ok(record) => records.push(record),
            Err(err) => warn!("Skipping roster entry {}: {}", index, err),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use saltwake_world::ClockTime;

    use super::*;
    use crate::npc::archetype::TEMPLATE_LOCATIONS;
    use crate::npc::schedule::Routine;

    fn town() -> LocationTable {
        let mut table = LocationTable::new().with("cottage", Cell::new(1, 1));
        for (i, name) in TEMPLATE_LOCATIONS.iter().enumerate() {
            table.insert(*name, Cell::new(i as i32 + 2, 3));
        }
        table
    }

    #[test]
    fn test_roster_from_json() {
        let roster = parse_roster(
            r#"[
                {
                    "name": "Old Marta",
                    "archetype": "fisherman",
                    "home": "cottage",
                    "loved_gifts": ["pearl"],
                    "disliked_gifts": ["seaweed"],
                    "stats": { "speed": 2.0 }
                },
                { "name": "Gus", "archetype": "guard", "home": "barracks" }
            ]"#,
        )
        .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].gift_kind("pearl"), InteractionKind::LovedGift);
        assert_eq!(roster[0].gift_kind("seaweed"), InteractionKind::DislikedGift);
        assert_eq!(roster[0].gift_kind("cod"), InteractionKind::Gift);
        assert_eq!(roster[0].stats.speed, Some(2.0));
        assert!(roster.iter().all(|r| r.validate(&town()).is_ok()));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_roster("{\"name\": \"Ada\"}"), Err(ContentError::Parse(_))));
        assert!(matches!(parse_roster("[{\"name\": "), Err(ContentError::Parse(_))));
    }

    #[test]
    fn test_bad_entries_do_not_sink_the_roster() {
        let roster = parse_roster(
            r#"[
                { "name": "Ada", "archetype": "merchant", "home": "cottage" },
                { "name": 3, "home": "cottage" },
                { "name": "Bo" },
                { "name": "Cy", "home": "cottage" }
            ]"#,
        )
        .unwrap();
        let names: Vec<&str> = roster.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Cy"]);
        assert_eq!(roster[1].archetype, Archetype::Villager);
        assert!(roster[1].validate(&town()).is_ok());
    }

    #[test]
    fn test_archetype_defaults_fill_in() {
        let config = AgentConfig::from_record(&NpcRecord::new("Gus", Archetype::Guard, "barracks"), &town()).unwrap();
        assert_eq!(config.home, town().get("barracks").unwrap());
        assert_eq!(config.dialogue_set, "guard");
        assert_eq!(config.patrol_route.len(), 5);
        assert_eq!(config.schedule.len(), Archetype::Guard.default_schedule().len());
        assert_eq!(config.stats, Archetype::Guard.default_stats());
    }

    #[test]
    fn test_bad_fields_fall_back() {
        let mut record = NpcRecord::new("Pip", Archetype::Villager, "cottage");
        record.schedule = Some(vec![ScheduleEntryRecord::new("9am", "tavern", Routine::Idle, "")]);
        record.stats.speed = Some(-1.0);
        record.patrol_route = Some(vec!["tavern".into(), "moon".into()]);
        assert!(record.validate(&town()).is_err());

        let config = AgentConfig::from_record(&record, &town()).unwrap();
        assert_eq!(config.stats.speed, Archetype::Villager.default_stats().speed);
        assert_eq!(config.patrol_route, vec![town().get("tavern").unwrap()]);
        // Fell back to the villager timeline
        assert_eq!(
            config.schedule.active(ClockTime::hm(8, 0)).location,
            town().get("fish_market").unwrap()
        );
    }

    #[test]
    fn test_missing_template_location_idles_at_home() {
        let sparse = LocationTable::new().with("cottage", Cell::new(4, 4));
        let config = AgentConfig::from_record(&NpcRecord::new("Lou", Archetype::Merchant, "cottage"), &sparse).unwrap();
        assert_eq!(config.schedule.len(), 1);
        assert_eq!(config.schedule.active(ClockTime::hm(12, 0)).location, Cell::new(4, 4));
    }

    #[test]
    fn test_rejects_unplaceable_records() {
        assert_eq!(
            AgentConfig::from_record(&NpcRecord::new("  ", Archetype::Villager, "cottage"), &town()).unwrap_err(),
            ContentError::EmptyName
        );
        assert_eq!(
            AgentConfig::from_record(&NpcRecord::new("Ned", Archetype::Villager, "nowhere"), &town()).unwrap_err(),
            ContentError::UnknownLocation("nowhere".into())
        );
    }
}

//! Daily schedules: which place and routine is active at a time of day

use saltwake_core::Cell;
use saltwake_world::{ClockTime, LocationTable};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// Location name that resolves to the NPC's own home cell
pub const HOME: &str = "home";

/// What an NPC does once it reaches a schedule location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routine {
    #[default]
    Idle,
    Patrol,
}

/// One window of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub start: ClockTime,
    pub location: Cell,
    pub routine: Routine,
    /// Free-form label such as "fishing" or "night_watch"
    pub activity: String,
    /// Waypoints for a patrol window; empty means the NPC's default route
    pub route: Vec<Cell>,
}

impl ScheduleEntry {
    pub fn idle(start: ClockTime, location: Cell, activity: impl Into<String>) -> Self {
        Self {
            start,
            location,
            routine: Routine::Idle,
            activity: activity.into(),
            route: Vec::new(),
        }
    }
}

/// Schedule entry as written in content files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntryRecord {
    /// "HH:MM"
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub routine: Routine,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub route: Vec<String>,
}

impl ScheduleEntryRecord {
    pub fn new(time: &str, location: &str, routine: Routine, activity: &str) -> Self {
        Self {
            time: time.to_string(),
            location: location.to_string(),
            routine,
            activity: activity.to_string(),
            route: Vec::new(),
        }
    }

    pub fn with_route(mut self, route: &[&str]) -> Self {
        self.route = route.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Entries sorted by start time. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Build from entries, sorting by start. An empty list becomes idling at `home`.
    pub fn new(mut entries: Vec<ScheduleEntry>, home: Cell) -> Self {
        if entries.is_empty() {
            return Self::idle_at(home);
        }
        entries.sort_by_key(|e| e.start);
        Self { entries }
    }

    /// Single all-day idle window
    pub fn idle_at(home: Cell) -> Self {
        Self {
            entries: vec![ScheduleEntry::idle(ClockTime::MIDNIGHT, home, "rest")],
        }
    }

    /// Resolve content records against named locations
    pub fn from_records(
        records: &[ScheduleEntryRecord],
        locations: &LocationTable,
        home: Cell,
    ) -> Result<Self, ContentError> {
        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let start = record
                .time
                .parse::<ClockTime>()
                .map_err(|source| ContentError::ScheduleTime { index, source })?;
            let location = resolve_location(&record.location, locations, home)?;
            let route = record
                .route
                .iter()
                .map(|name| resolve_location(name, locations, home))
                .collect::<Result<Vec<_>, _>>()?;
            entries.push(ScheduleEntry {
                start,
                location,
                routine: record.routine,
                activity: record.activity.clone(),
                route,
            });
        }
        Ok(Self::new(entries, home))
    }

    /// Index of the window active at `now`: the last entry starting at or
    /// before `now`, or the last entry of the day when `now` precedes all.
    pub fn active_index(&self, now: ClockTime) -> usize {
        self.entries
            .iter()
            .rposition(|e| e.start <= now)
            .unwrap_or(self.entries.len() - 1)
    }

    pub fn active(&self, now: ClockTime) -> &ScheduleEntry {
        &self.entries[self.active_index(now)]
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn resolve_location(
    name: &str,
    locations: &LocationTable,
    home: Cell,
) -> Result<Cell, ContentError> {
    if name == HOME {
        return Ok(home);
    }
    locations
        .get(name)
        .ok_or_else(|| ContentError::UnknownLocation(name.to_string()))
}

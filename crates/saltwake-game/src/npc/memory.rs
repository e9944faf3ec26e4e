//! Per-NPC interaction memory

use std::collections::{HashMap, VecDeque};

use saltwake_world::WorldTimestamp;
use serde::{Deserialize, Serialize};

/// Things the player can do to an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Talk,
    Compliment,
    Gift,
    LovedGift,
    DislikedGift,
    QuestCompleted,
    QuestFailed,
    Insult,
    Theft,
    Attack,
    Rescue,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 11] = [
        InteractionKind::Talk,
        InteractionKind::Compliment,
        InteractionKind::Gift,
        InteractionKind::LovedGift,
        InteractionKind::DislikedGift,
        InteractionKind::QuestCompleted,
        InteractionKind::QuestFailed,
        InteractionKind::Insult,
        InteractionKind::Theft,
        InteractionKind::Attack,
        InteractionKind::Rescue,
    ];

    /// Relationship change before clamping
    pub fn base_delta(&self) -> i32 {
        match self {
            InteractionKind::Talk => 2,
            InteractionKind::Compliment => 8,
            InteractionKind::Gift => 5,
            InteractionKind::LovedGift => 25,
            InteractionKind::DislikedGift => -10,
            InteractionKind::QuestCompleted => 20,
            InteractionKind::QuestFailed => -15,
            InteractionKind::Insult => -12,
            InteractionKind::Theft => -40,
            InteractionKind::Attack => -50,
            InteractionKind::Rescue => 50,
        }
    }

    /// Acts that can provoke an aggressive NPC
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            InteractionKind::Insult | InteractionKind::Theft | InteractionKind::Attack
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionKind::Talk => "talk",
            InteractionKind::Compliment => "compliment",
            InteractionKind::Gift => "gift",
            InteractionKind::LovedGift => "loved_gift",
            InteractionKind::DislikedGift => "disliked_gift",
            InteractionKind::QuestCompleted => "quest_completed",
            InteractionKind::QuestFailed => "quest_failed",
            InteractionKind::Insult => "insult",
            InteractionKind::Theft => "theft",
            InteractionKind::Attack => "attack",
            InteractionKind::Rescue => "rescue",
        }
    }
}

/// One remembered interaction. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InteractionRecord {
    at: WorldTimestamp,
    kind: InteractionKind,
    relationship_delta: i32,
}

impl InteractionRecord {
    pub fn new(at: WorldTimestamp, kind: InteractionKind, relationship_delta: i32) -> Self {
        Self {
            at,
            kind,
            relationship_delta,
        }
    }

    pub fn at(&self) -> WorldTimestamp {
        self.at
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    /// Delta actually applied to the relationship score
    pub fn relationship_delta(&self) -> i32 {
        self.relationship_delta
    }
}

/// Bounded, append-only interaction log with FIFO eviction.
///
/// Lifetime counts per kind survive eviction so an NPC still "remembers"
/// being robbed long after the record itself has scrolled out.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryLog {
    capacity: usize,
    records: VecDeque<InteractionRecord>,
    impressions: HashMap<InteractionKind, u32>,
}

impl MemoryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
            impressions: HashMap::new(),
        }
    }

    /// Append a record. Returns the evicted oldest record when full.
    pub fn record(&mut self, record: InteractionRecord) -> Option<InteractionRecord> {
        *self.impressions.entry(record.kind).or_insert(0) += 1;
        let evicted = if self.records.len() == self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        evicted
    }

    /// Up to `n` most recent records, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &InteractionRecord> {
        self.records.iter().skip(self.records.len().saturating_sub(n))
    }

    pub fn last(&self) -> Option<&InteractionRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionRecord> {
        self.records.iter()
    }

    /// Whether a record of this kind is still in the log
    pub fn remembers(&self, kind: InteractionKind) -> bool {
        self.records.iter().any(|r| r.kind == kind)
    }

    /// Lifetime count for a kind, including evicted records
    pub fn times(&self, kind: InteractionKind) -> u32 {
        self.impressions.get(&kind).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use saltwake_world::ClockTime;

    use super::*;

    fn at(minute: u16) -> WorldTimestamp {
        WorldTimestamp {
            day: 0,
            time: ClockTime::from_minutes(minute),
        }
    }

    #[test]
    fn test_base_deltas() {
        assert_eq!(InteractionKind::Gift.base_delta(), 5);
        assert_eq!(InteractionKind::Attack.base_delta(), -50);
        assert!(InteractionKind::Theft.is_hostile());
        assert!(!InteractionKind::QuestFailed.is_hostile());
        for kind in InteractionKind::ALL {
            assert!(kind.base_delta().abs() <= 50, "{}", kind.name());
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let mut log = MemoryLog::new(3);
        for minute in 0..3 {
            assert!(log.record(InteractionRecord::new(at(minute), InteractionKind::Talk, 2)).is_none());
        }
        let evicted = log
            .record(InteractionRecord::new(at(3), InteractionKind::Theft, -40))
            .unwrap();
        assert_eq!(evicted.at(), at(0));
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(|r| r.kind()), Some(InteractionKind::Theft));
        assert_eq!(log.iter().next().map(|r| r.at()), Some(at(1)));
    }

    #[test]
    fn test_recent_window() {
        let mut log = MemoryLog::new(10);
        for minute in 0..7 {
            log.record(InteractionRecord::new(at(minute), InteractionKind::Gift, 5));
        }
        let recent: Vec<u16> = log.recent(5).map(|r| r.at().time.minute_of_day()).collect();
        assert_eq!(recent, vec![2, 3, 4, 5, 6]);
        assert_eq!(log.recent(50).count(), 7);
    }

    #[test]
    fn test_impressions_survive_eviction() {
        let mut log = MemoryLog::new(1);
        log.record(InteractionRecord::new(at(0), InteractionKind::Theft, -40));
        log.record(InteractionRecord::new(at(1), InteractionKind::Talk, 2));
        assert!(!log.remembers(InteractionKind::Theft));
        assert_eq!(log.times(InteractionKind::Theft), 1);
        assert_eq!(log.times(InteractionKind::Talk), 1);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&InteractionKind::LovedGift).unwrap();
        assert_eq!(json, "\"loved_gift\"");
    }
}

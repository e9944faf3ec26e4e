//! Dialogue line ids handed to the presentation layer
//!
//! The core never holds dialogue text. It picks a line id from the NPC's
//! dialogue set, the topic, the relationship tier and the mood tone, plus the
//! time of day for greetings. The host looks the id up in its own content,
//! walking [`DialogueLineId::fallbacks`] until something matches.

use std::fmt;

use saltwake_world::DayPeriod;
use serde::{Serialize, Serializer};

use super::memory::InteractionKind;
use super::mood::Mood;
use super::relationship::RelationshipTier;

/// Set consulted when an NPC's own set has no line
pub const COMMON_SET: &str = "common";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Greeting,
    Thanks,
    Hurt,
    Farewell,
    Threat,
}

impl Topic {
    /// Topic an NPC responds with after an interaction
    pub fn for_interaction(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::Talk => Topic::Greeting,
            InteractionKind::Compliment
            | InteractionKind::Gift
            | InteractionKind::LovedGift
            | InteractionKind::QuestCompleted
            | InteractionKind::Rescue => Topic::Thanks,
            InteractionKind::DislikedGift
            | InteractionKind::QuestFailed
            | InteractionKind::Insult
            | InteractionKind::Theft => Topic::Hurt,
            InteractionKind::Attack => Topic::Threat,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Topic::Greeting => "greeting",
            Topic::Thanks => "thanks",
            Topic::Hurt => "hurt",
            Topic::Farewell => "farewell",
            Topic::Threat => "threat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLineId {
    pub set: String,
    pub topic: Topic,
    pub tier: RelationshipTier,
    pub mood: Mood,
    /// Time of day, set on greetings
    pub period: Option<DayPeriod>,
}

impl DialogueLineId {
    pub fn new(set: impl Into<String>, topic: Topic, tier: RelationshipTier, mood: Mood) -> Self {
        Self {
            set: set.into(),
            topic,
            tier,
            mood,
            period: None,
        }
    }

    pub fn with_period(mut self, period: DayPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Lookup keys from most to least specific
    pub fn fallbacks(&self) -> Vec<String> {
        let topic = self.topic.key();
        let tier = self.tier.key();
        let tone = self.mood.tone();
        let mut keys = vec![self.to_string()];
        if self.period.is_some() {
            keys.push(format!("{}/{topic}/{tier}/{tone}", self.set));
        }
        keys.extend([
            format!("{}/{topic}/{tier}", self.set),
            format!("{}/{topic}", self.set),
            format!("{COMMON_SET}/{topic}/{tier}"),
            format!("{COMMON_SET}/{topic}"),
        ]);
        keys
    }
}

impl fmt::Display for DialogueLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.set,
            self.topic.key(),
            self.tier.key(),
            self.mood.tone()
        )?;
        if let Some(period) = self.period {
            write!(f, "/{}", period.name())?;
        }
        Ok(())
    }
}

impl Serialize for DialogueLineId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

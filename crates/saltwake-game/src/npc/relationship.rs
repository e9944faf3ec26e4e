//! Relationship score and the tiers derived from it

use serde::{Deserialize, Serialize};

/// Bounds of the accumulated score
pub const MIN_SCORE: i32 = -100;
pub const MAX_SCORE: i32 = 100;
/// Largest change a single interaction may apply
pub const MAX_DELTA: i32 = 50;

/// Relationship tier, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipTier {
    Enemy,
    Disliked,
    Wary,
    Stranger,
    Acquaintance,
    Friend,
    CloseFriend,
    BestFriend,
}

impl RelationshipTier {
    /// Get the tier for a score in [-100, 100]
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=-61 => RelationshipTier::Enemy,
            -60..=-31 => RelationshipTier::Disliked,
            -30..=-1 => RelationshipTier::Wary,
            0..=9 => RelationshipTier::Stranger,
            10..=24 => RelationshipTier::Acquaintance,
            25..=49 => RelationshipTier::Friend,
            50..=79 => RelationshipTier::CloseFriend,
            _ => RelationshipTier::BestFriend,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RelationshipTier::Enemy => "Enemy",
            RelationshipTier::Disliked => "Disliked",
            RelationshipTier::Wary => "Wary",
            RelationshipTier::Stranger => "Stranger",
            RelationshipTier::Acquaintance => "Acquaintance",
            RelationshipTier::Friend => "Friend",
            RelationshipTier::CloseFriend => "Close Friend",
            RelationshipTier::BestFriend => "Best Friend",
        }
    }

    /// Stable identifier used in dialogue line ids
    pub fn key(&self) -> &'static str {
        match self {
            RelationshipTier::Enemy => "enemy",
            RelationshipTier::Disliked => "disliked",
            RelationshipTier::Wary => "wary",
            RelationshipTier::Stranger => "stranger",
            RelationshipTier::Acquaintance => "acquaintance",
            RelationshipTier::Friend => "friend",
            RelationshipTier::CloseFriend => "close_friend",
            RelationshipTier::BestFriend => "best_friend",
        }
    }

    /// Tiers at which an aggressive NPC turns on the player
    pub fn is_hostile(&self) -> bool {
        *self <= RelationshipTier::Disliked
    }

    pub fn dialogue_modifiers(&self) -> DialogueModifiers {
        let (price_multiplier, shares_secrets, quests) = match self {
            RelationshipTier::BestFriend => (0.7, true, QuestAccess::Special),
            RelationshipTier::CloseFriend => (0.8, true, QuestAccess::Advanced),
            RelationshipTier::Friend => (0.9, false, QuestAccess::Standard),
            RelationshipTier::Acquaintance | RelationshipTier::Stranger => (1.0, false, QuestAccess::Basic),
            RelationshipTier::Wary => (1.0, false, QuestAccess::None),
            RelationshipTier::Disliked => (1.15, false, QuestAccess::None),
            RelationshipTier::Enemy => (1.5, false, QuestAccess::None),
        };
        DialogueModifiers {
            price_multiplier,
            shares_secrets,
            quests,
        }
    }
}

/// Quests an NPC will offer at a given tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestAccess {
    None,
    Basic,
    Standard,
    Advanced,
    Special,
}

/// What a relationship tier unlocks in conversation and trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DialogueModifiers {
    /// Shop price multiplier before mood is applied
    pub price_multiplier: f32,
    pub shares_secrets: bool,
    pub quests: QuestAccess,
}

/// Tier movement caused by a single interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum TierChange {
    Promoted { from: RelationshipTier, to: RelationshipTier },
    Demoted { from: RelationshipTier, to: RelationshipTier },
}

impl TierChange {
    pub fn to(&self) -> RelationshipTier {
        match self {
            TierChange::Promoted { to, .. } | TierChange::Demoted { to, .. } => *to,
        }
    }
}

/// Relationship with the player. The tier is always derived from the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    score: i32,
}

impl Relationship {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(score: i32) -> Self {
        Self {
            score: score.clamp(MIN_SCORE, MAX_SCORE),
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn tier(&self) -> RelationshipTier {
        RelationshipTier::from_score(self.score)
    }

    /// Apply a delta, bounded to ±50 and clamped to the score range.
    /// Returns the change actually applied and any tier movement.
    pub fn apply(&mut self, delta: i32) -> (i32, Option<TierChange>) {
        let before = self.tier();
        let old = self.score;
        self.score = (self.score + delta.clamp(-MAX_DELTA, MAX_DELTA)).clamp(MIN_SCORE, MAX_SCORE);
        let after = self.tier();

        let change = match after.cmp(&before) {
            std::cmp::Ordering::Greater => Some(TierChange::Promoted { from: before, to: after }),
            std::cmp::Ordering::Less => Some(TierChange::Demoted { from: before, to: after }),
            std::cmp::Ordering::Equal => None,
        };
        (self.score - old, change)
    }
}

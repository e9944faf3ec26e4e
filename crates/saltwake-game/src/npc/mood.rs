//! NPC mood derived from recent interactions

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::memory::{InteractionKind, InteractionRecord};

/// Schedule ticks an unbrave NPC stays scared after being attacked
pub const FRIGHT_TICKS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Joyful,
    Happy,
    Content,
    #[default]
    Neutral,
    Sad,
    Annoyed,
    Angry,
    Scared,
}

impl Mood {
    /// Discrete mood for a valence value
    pub fn from_valence(valence: f32) -> Self {
        if valence > 40.0 {
            Mood::Joyful
        } else if valence > 10.0 {
            Mood::Happy
        } else if valence > 5.0 {
            Mood::Content
        } else if valence < -40.0 {
            Mood::Angry
        } else if valence < -10.0 {
            Mood::Annoyed
        } else if valence < -5.0 {
            Mood::Sad
        } else {
            Mood::Neutral
        }
    }

    /// Multiplier applied to shop prices
    pub fn price_modifier(&self) -> f32 {
        match self {
            Mood::Joyful => 0.85,
            Mood::Happy => 0.9,
            Mood::Content | Mood::Neutral | Mood::Sad => 1.0,
            Mood::Annoyed => 1.15,
            Mood::Angry => 1.3,
            Mood::Scared => 0.8,
        }
    }

    /// Dialogue tone key
    pub fn tone(&self) -> &'static str {
        match self {
            Mood::Joyful => "enthusiastic",
            Mood::Happy => "friendly",
            Mood::Content => "neutral",
            Mood::Neutral => "businesslike",
            Mood::Sad => "melancholy",
            Mood::Annoyed => "curt",
            Mood::Angry => "hostile",
            Mood::Scared => "nervous",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mood::Joyful => "joyful",
            Mood::Happy => "happy",
            Mood::Content => "content",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Annoyed => "annoyed",
            Mood::Angry => "angry",
            Mood::Scared => "scared",
        }
    }
}

/// Continuous mood state of one NPC.
///
/// Valence is the temperament plus the deltas of the most recent
/// interactions. Each schedule tick fades those deltas, so an interaction
/// long after the last one starts from a calm mood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodState {
    valence: f32,
    /// Resting valence the mood decays back to
    temperament: f32,
    /// Faded deltas of the last interactions, oldest first
    recent: VecDeque<f32>,
    /// Remaining schedule ticks of fright
    fright: u32,
}

impl MoodState {
    pub fn new(temperament: f32) -> Self {
        let temperament = temperament.clamp(-100.0, 100.0);
        Self {
            valence: temperament,
            temperament,
            recent: VecDeque::new(),
            fright: 0,
        }
    }

    pub fn valence(&self) -> f32 {
        self.valence
    }

    pub fn temperament(&self) -> f32 {
        self.temperament
    }

    pub fn mood(&self) -> Mood {
        if self.fright > 0 {
            Mood::Scared
        } else {
            Mood::from_valence(self.valence)
        }
    }

    pub fn is_scared(&self) -> bool {
        self.fright > 0
    }

    /// React to an interaction that was just recorded. Only the last
    /// `window` interactions count toward the valence.
    pub fn record(&mut self, record: &InteractionRecord, window: usize, brave: bool) {
        self.recent.push_back(record.relationship_delta() as f32);
        while self.recent.len() > window.max(1) {
            self.recent.pop_front();
        }
        self.refresh();

        let attacked = record.kind() == InteractionKind::Attack;
        self.fright = if attacked && !brave { FRIGHT_TICKS } else { 0 };
    }

    /// One schedule tick of recovery toward the temperament
    pub fn decay(&mut self, rate: f32) {
        let keep = 1.0 - rate.clamp(0.0, 1.0);
        for delta in &mut self.recent {
            *delta *= keep;
        }
        if self.recent.iter().sum::<f32>().abs() < 0.01 {
            self.recent.iter_mut().for_each(|delta| *delta = 0.0);
        }
        self.refresh();
        self.fright = self.fright.saturating_sub(1);
    }

    fn refresh(&mut self) {
        let offset: f32 = self.recent.iter().sum();
        self.valence = (self.temperament + offset).clamp(-100.0, 100.0);
    }
}

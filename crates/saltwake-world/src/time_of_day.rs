//! World clock: minute-of-day time that wraps at midnight

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minutes in one in-game day
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Errors from parsing an `HH:MM` clock string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockParseError {
    #[error("expected HH:MM, got '{0}'")]
    Format(String),

    #[error("time out of range: '{0}'")]
    OutOfRange(String),
}

/// A time of day at minute resolution (00:00 to 23:59)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build from hours and minutes, wrapping past midnight
    pub const fn hm(hours: u16, minutes: u16) -> Self {
        Self((hours * 60 + minutes) % MINUTES_PER_DAY)
    }

    /// Build from minutes since midnight, wrapping past midnight
    pub const fn from_minutes(minutes: u16) -> Self {
        Self(minutes % MINUTES_PER_DAY)
    }

    pub fn minute_of_day(&self) -> u16 {
        self.0
    }

    pub fn hours(&self) -> u16 {
        self.0 / 60
    }

    pub fn minutes(&self) -> u16 {
        self.0 % 60
    }

    /// Period of the day used for greetings
    pub fn period(&self) -> DayPeriod {
        match self.hours() {
            5..=11 => DayPeriod::Morning,
            12..=16 => DayPeriod::Afternoon,
            17..=20 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }
}

impl FromStr for ClockTime {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ClockParseError::Format(s.to_string()))?;
        let hours: u16 = h.parse().map_err(|_| ClockParseError::Format(s.to_string()))?;
        let minutes: u16 = m.parse().map_err(|_| ClockParseError::Format(s.to_string()))?;
        if hours > 23 || minutes > 59 {
            return Err(ClockParseError::OutOfRange(s.to_string()));
        }
        Ok(Self::hm(hours, minutes))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

/// Coarse period of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub fn name(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Night => "night",
        }
    }
}

/// Point in world time: day counter plus time of day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldTimestamp {
    pub day: u32,
    pub time: ClockTime,
}

/// Running world clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldClock {
    day: u32,
    /// Minutes since midnight, fractional
    minute_of_day: f64,
    /// Whether the clock is paused
    pub paused: bool,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(ClockTime::hm(6, 0))
    }
}

impl WorldClock {
    /// Create with a specific starting time on day 0
    pub fn new(start: ClockTime) -> Self {
        Self {
            day: 0,
            minute_of_day: start.minute_of_day() as f64,
            paused: false,
        }
    }

    /// Advance by game minutes. Returns the number of whole minute marks
    /// crossed, which callers use to drive minute-based cadences. Negative
    /// and non-finite amounts are ignored.
    pub fn advance(&mut self, game_minutes: f64) -> u64 {
        if self.paused || !game_minutes.is_finite() || game_minutes <= 0.0 {
            return 0;
        }
        let before = self.total_minutes();
        let day_len = MINUTES_PER_DAY as f64;
        let minute = self.minute_of_day + game_minutes;
        let days = (minute / day_len).floor().min(u32::MAX as f64) as u32;
        self.day = self.day.saturating_add(days);
        self.minute_of_day = minute.rem_euclid(day_len);
        (self.total_minutes().floor() - before.floor()).max(0.0) as u64
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn now(&self) -> ClockTime {
        ClockTime::from_minutes(self.minute_of_day.floor() as u16)
    }

    pub fn timestamp(&self) -> WorldTimestamp {
        WorldTimestamp {
            day: self.day,
            time: self.now(),
        }
    }

    /// Minutes since day 0 midnight
    pub fn total_minutes(&self) -> f64 {
        self.day as f64 * MINUTES_PER_DAY as f64 + self.minute_of_day
    }
}

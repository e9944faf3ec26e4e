//! Saltwake World - Static world data shared by every agent
//!
//! Provides the walkability grid, named locations, and the world clock.

pub mod grid;
pub mod locations;
pub mod time_of_day;

pub use grid::{GridError, ObstacleMap, Overlay, Passable};
pub use locations::LocationTable;
pub use time_of_day::{ClockParseError, ClockTime, DayPeriod, WorldClock, WorldTimestamp};

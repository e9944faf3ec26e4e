//! Saltwake Core - Core types shared by the Saltwake NPC simulation
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Grid coordinates and facing directions
//! - Frame time tracking for the host loop
//! - Math primitives (re-exported from glam)

pub mod time;
pub mod types;

pub use glam::{IVec2, Vec2};
pub use time::{GameTime, TimeConfig};
pub use types::{Cell, Facing};

//! Shared value types used across the plaza client crates.
//!
//! # Invariants
//! - Types here carry no behavior that depends on world state.
//! - Wire spellings (lowercase facings and directions) are fixed by serde attributes.

mod types;

pub use glam::Vec2;
pub use types::{AvatarKind, Direction, Facing, PlayerId, Rect, Rgba};

//! World Kernel: the client's mirror of server-authoritative world state.
//!
//! # Invariants
//! - All state mutations flow through explicit operations and mark the world dirty.
//! - Incoming snapshots replace stored ones wholesale; there is no field-level merge.
//! - Avatar descriptors are shared by reference and never evicted.

pub mod player;
pub mod world;

pub use player::{AvatarDescriptor, PlayerSnapshot};
pub use world::{World, WorldEvent};

//! Rendering: camera tracking and a renderer-agnostic display list.
//!
//! # Invariants
//! - Rendering never mutates world truth; it reads the world and a viewport.
//! - The viewport always lies inside `[0, world - output]` on each axis
//!   (collapsing to 0 when the output is larger than the world).
//! - A frame contains no commands for a culled entity or for one whose sprite
//!   is not loaded yet.
//!
//! Backends consume a [`Frame`] through the [`Renderer`] trait. The debug
//! text renderer ships here; pixel backends live with the host application.

pub mod camera;
mod compositor;
mod frame;
mod renderer;

pub use camera::{Camera, compute_viewport};
pub use compositor::{
    AVATAR_SIZE, Compositor, CompositorConfig, Scene, StatusBadge, sprite_facing,
};
pub use frame::{DrawCommand, Frame, FrameStats, TextAlign};
pub use renderer::{DebugTextRenderer, Renderer};

//! Sprite catalog: resolves `(avatar kind, facing, frame)` to decoded images.
//!
//! Images are requested from a loader on first use and delivered later through
//! [`SpriteCatalog::complete`]. The renderer consumes images by key, never by
//! raw file path, and treats a missing image as "skip this frame".
//!
//! # Invariants
//! - At most one request is ever issued per key.
//! - Ready and failed entries are final; nothing is invalidated or retried.

mod catalog;
mod raster;

pub use catalog::{ImageKey, LoadQueue, QueuedLoader, Slot, SpriteCatalog, SpriteKey, SpriteLoader};
pub use raster::{AssetError, Image, decode_png, load_image, resolve_source};

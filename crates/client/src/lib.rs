//! The client reactor.
//!
//! All state lives in one explicit [`ClientContext`]. The host feeds typed
//! [`Event`]s into [`Client::handle`] one at a time; each is applied to
//! completion before the next.
//!
//! # Invariants
//! - An inbound message is decoded fully before the world is touched.
//! - Any number of mutations between two ticks produce at most one frame.
//! - Once a join is rejected, no further join is sent for the session.
//! - Outbound messages are dropped, never queued, while the link is down.

pub mod config;
mod context;
mod reactor;

pub use config::{ClientConfig, ConfigError};
pub use context::{ClientContext, LinkStatus, SessionState};
pub use reactor::{Client, Event};

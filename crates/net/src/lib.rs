//! Networking: the `action`-tagged JSON protocol and the transport seam.
//!
//! # Invariants
//! - Inbound messages decode fully or not at all; a decode error never
//!   yields a partially built message.
//! - Unknown actions decode to [`ServerMessage::Unknown`] rather than failing.
//! - Sends while the link is down fail with [`TransportError::NotConnected`];
//!   nothing is queued for a later connection.

pub mod protocol;
pub mod transport;
pub mod ws;

pub use protocol::{ClientMessage, JoinOutcome, ProtocolError, ServerMessage};
pub use transport::{LinkEvent, Outbox, RecordingOutbox, TransportError};
pub use ws::{TransportConfig, WsOutbox, spawn_ws_transport};

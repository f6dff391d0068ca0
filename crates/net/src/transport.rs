use crate::protocol::{ClientMessage, ProtocolError};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("link is not connected")]
    NotConnected,
    #[error("transport task has shut down")]
    Shutdown,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// What the link reports back to the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    /// One inbound text frame, undecoded.
    Message(String),
    Closed,
    Error(String),
}

/// Fire-and-forget outbound side of the link.
///
/// Implementations fail rather than buffer while disconnected.
pub trait Outbox {
    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;
}

/// Outbox that keeps every message it is given. Used offline and in tests.
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    sent: Vec<ClientMessage>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[ClientMessage] {
        &self.sent
    }

    pub fn take(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.sent)
    }
}

impl Outbox for RecordingOutbox {
    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        self.sent.push(message.clone());
        Ok(())
    }
}

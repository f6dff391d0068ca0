//! Developer tooling: store inspector and inbound transcripts.
//!
//! # Invariants
//! - Tools only read the world; they never mutate it.
//! - A transcript holds inbound frames verbatim, one JSON record per line,
//!   so a replay goes through the same decoder as a live session.

pub mod inspector;
pub mod transcript;

pub use inspector::{PlayerInfo, StoreInspector, StoreSummary};
pub use transcript::{TranscriptEntry, TranscriptError, TranscriptWriter, read_transcript};

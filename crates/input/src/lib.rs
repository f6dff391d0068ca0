//! Input: held directional keys reduced to one outbound movement intent.
//!
//! # Invariants
//! - Only one direction is ever sent at a time.
//! - Every change of the held set yields exactly one intent; repeats of the
//!   same key state yield none.

pub mod intent;

pub use intent::{HeldDirections, InputEvent, Intent, IntentReducer, ParseInputError, reduce};

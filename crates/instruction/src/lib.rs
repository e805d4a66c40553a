//! Instruction model and dispatcher.
//!
//! A raw instruction is the wire shape `{name, arguments}` where `arguments`
//! may be a structured object or a JSON-encoded string. Decoding turns it
//! into the closed [`Instruction`] enum (five operations); the dispatcher
//! routes each decoded instruction to exactly one store operation and folds
//! every failure into a per-instruction [`Outcome`] envelope, so batch
//! callers collect results without one failure aborting the rest.

mod dispatch;
mod error;
mod model;

pub use crate::dispatch::{Dispatcher, Outcome};
pub use crate::error::ValidationError;
pub use crate::model::{Instruction, RawInstruction};

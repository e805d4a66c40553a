//! Streaming assembly of tool calls from an incremental model stream.
//!
//! Two feed shapes are supported; a session is wired to exactly one:
//!
//! - [`DeltaAssembler`] consumes structured tool-call deltas keyed by a
//!   stream-assigned slot index, accumulating name and payload fragments
//!   until the payload parses as complete JSON.
//! - [`BlockAssembler`] consumes free text and extracts instructions from
//!   fenced code blocks as their closing fences arrive.
//!
//! Both guarantee at-most-once emission per logical instruction, emission in
//! completion-arrival order, and a no-raise boundary: malformed input
//! degrades to "not yet complete" or "dropped", never to an error.

mod call;
mod delta;
mod text;

pub use crate::call::AssembledCall;
pub use crate::delta::{CallDelta, DeltaAssembler};
pub use crate::text::BlockAssembler;

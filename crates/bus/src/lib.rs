use assembler::CallDelta;
use core_types::{FeedKind, SessionId, StreamId};
use instruction::{Outcome, RawInstruction};
use std::sync::mpsc::{Receiver, Sender, channel};
use tree_store::TreeSnapshot;

#[derive(Debug)]
pub enum CoreCommand {
    /// Open one model stream for a session; `feed` fixes which fragment
    /// shape the stream carries.
    StreamStart {
        session_id: SessionId,
        stream_id: StreamId,
        feed: FeedKind,
    },
    /// One structured tool-call fragment (delta feed only).
    StreamDelta {
        session_id: SessionId,
        stream_id: StreamId,
        delta: CallDelta,
    },
    /// One raw text chunk (text feed only).
    StreamText {
        session_id: SessionId,
        stream_id: StreamId,
        text: String,
    },
    /// End of turn: flush the assembler and close the stream.
    StreamDone {
        session_id: SessionId,
        stream_id: StreamId,
    },
    /// Abort mid-stream; incomplete fragments are discarded, not applied.
    CancelStream {
        session_id: SessionId,
        stream_id: StreamId,
    },
}

#[derive(Debug)]
pub enum CoreEvent {
    StreamStarted {
        session_id: SessionId,
        stream_id: StreamId,
    },
    /// One event per applied instruction, in application order, for the
    /// presentation layer.
    InstructionApplied {
        session_id: SessionId,
        stream_id: StreamId,
        call_id: String,
        instruction: RawInstruction,
        outcome: Outcome,
    },
    /// Stream closed (done or cancelled); carries the final tree projection.
    StreamClosed {
        session_id: SessionId,
        stream_id: StreamId,
        snapshot: Box<TreeSnapshot>,
    },
}

pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// Channel bundle plus the runtime-side ends.
    pub fn new() -> (Self, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = channel();
        let (evt_tx, evt_rx) = channel();
        (
            Self {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}

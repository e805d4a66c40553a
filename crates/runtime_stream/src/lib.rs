//! Stream driver: owns one assembler/dispatcher/store triple per open
//! stream and turns bus commands into applied instructions and events.
//!
//! This is the only suspension point in the system; it blocks on the command
//! channel between chunks, so no core state is ever mutated concurrently.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use assembler::{AssembledCall, BlockAssembler, DeltaAssembler};
use bus::{CoreCommand, CoreEvent};
use core_types::{FeedKind, SessionId, StreamId};
use instruction::Dispatcher;

type Key = (SessionId, StreamId);

enum Feed {
    Delta(DeltaAssembler),
    Text(BlockAssembler),
}

struct StreamState {
    feed: Feed,
    dispatcher: Dispatcher,
}

impl StreamState {
    fn new(feed: FeedKind) -> Self {
        let feed = match feed {
            FeedKind::Delta => Feed::Delta(DeltaAssembler::new()),
            FeedKind::Text => Feed::Text(BlockAssembler::new()),
        };
        Self {
            feed,
            dispatcher: Dispatcher::new(),
        }
    }
}

pub fn start_stream_runtime(
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || run(cmd_rx, evt_tx))
}

fn run(cmd_rx: Receiver<CoreCommand>, evt_tx: Sender<CoreEvent>) {
    let mut streams: HashMap<Key, StreamState> = HashMap::new();

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            CoreCommand::StreamStart {
                session_id,
                stream_id,
                feed,
            } => {
                // A restart for a live key replaces it; the old stream's
                // partial state is dropped, never applied.
                streams.insert((session_id, stream_id), StreamState::new(feed));
                let _ = evt_tx.send(CoreEvent::StreamStarted {
                    session_id,
                    stream_id,
                });
            }
            CoreCommand::StreamDelta {
                session_id,
                stream_id,
                delta,
            } => {
                if let Some(state) = streams.get_mut(&(session_id, stream_id)) {
                    match &mut state.feed {
                        Feed::Delta(assembler) => {
                            if let Some(call) = assembler.push(&delta) {
                                apply(state, session_id, stream_id, call, &evt_tx);
                            }
                        }
                        Feed::Text(_) => {
                            log::debug!(target: "runtime.stream", "delta fragment on a text stream dropped");
                        }
                    }
                }
            }
            CoreCommand::StreamText {
                session_id,
                stream_id,
                text,
            } => {
                if let Some(state) = streams.get_mut(&(session_id, stream_id)) {
                    match &mut state.feed {
                        Feed::Text(assembler) => {
                            for call in assembler.push(&text) {
                                apply(state, session_id, stream_id, call, &evt_tx);
                            }
                        }
                        Feed::Delta(_) => {
                            log::debug!(target: "runtime.stream", "text chunk on a delta stream dropped");
                        }
                    }
                }
            }
            CoreCommand::StreamDone {
                session_id,
                stream_id,
            } => {
                if let Some(mut state) = streams.remove(&(session_id, stream_id)) {
                    let calls = match &mut state.feed {
                        Feed::Delta(assembler) => assembler.finish(),
                        Feed::Text(assembler) => assembler.flush(),
                    };
                    for call in calls {
                        apply(&mut state, session_id, stream_id, call, &evt_tx);
                    }
                    close(state, session_id, stream_id, &evt_tx);
                }
            }
            CoreCommand::CancelStream {
                session_id,
                stream_id,
            } => {
                // No terminal pass on abort: incomplete fragments are
                // discarded, not applied.
                if let Some(state) = streams.remove(&(session_id, stream_id)) {
                    log::debug!(target: "runtime.stream", "stream ({session_id}, {stream_id}) cancelled");
                    close(state, session_id, stream_id, &evt_tx);
                }
            }
        }
    }
}

fn apply(
    state: &mut StreamState,
    session_id: SessionId,
    stream_id: StreamId,
    call: AssembledCall,
    evt_tx: &Sender<CoreEvent>,
) {
    let outcome = state.dispatcher.execute(&call.instruction);
    let _ = evt_tx.send(CoreEvent::InstructionApplied {
        session_id,
        stream_id,
        call_id: call.call_id,
        instruction: call.instruction,
        outcome,
    });
}

fn close(
    state: StreamState,
    session_id: SessionId,
    stream_id: StreamId,
    evt_tx: &Sender<CoreEvent>,
) {
    let snapshot = state.dispatcher.store().inspect();
    let _ = evt_tx.send(CoreEvent::StreamClosed {
        session_id,
        stream_id,
        snapshot: Box::new(snapshot),
    });
}

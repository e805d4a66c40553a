use crate::call::AssembledCall;
use instruction::RawInstruction;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One fragment of a structured tool-call stream.
///
/// `slot` is the stream-assigned index grouping fragments of one logical
/// call; it is the grouping key because the call's own id may not be known
/// until later fragments arrive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallDelta {
    pub slot: u32,
    pub call_id: Option<String>,
    pub name: Option<String>,
    /// Payload text streamed token by token; concatenated across deltas.
    pub arguments: Option<String>,
}

#[derive(Debug, Default)]
struct PendingCall {
    call_id: String,
    name: String,
    arguments: String,
}

impl PendingCall {
    /// A pending call is complete the moment its accumulated payload parses
    /// as a JSON value and a name has arrived.
    fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.arguments.is_empty()
            && serde_json::from_str::<Value>(&self.arguments).is_ok()
    }

    fn into_call(self, slot: u32) -> AssembledCall {
        let call_id = if self.call_id.is_empty() {
            format!("slot-{slot}")
        } else {
            self.call_id
        };
        // Arguments stay a raw JSON string; the dispatcher parses them.
        AssembledCall::new(
            call_id,
            RawInstruction::new(self.name, Value::String(self.arguments)),
        )
    }
}

/// Reassembles structured tool-call deltas into whole calls.
///
/// A slot is retired the instant it emits; transports may redeliver
/// fragments for a completed slot and those are ignored, never re-emitted.
#[derive(Debug, Default)]
pub struct DeltaAssembler {
    pending: HashMap<u32, PendingCall>,
    retired: HashSet<u32>,
}

impl DeltaAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one fragment; returns the completed call if this fragment
    /// finished its slot.
    pub fn push(&mut self, delta: &CallDelta) -> Option<AssembledCall> {
        if self.retired.contains(&delta.slot) {
            log::trace!(target: "assembler.delta", "ignoring fragment for retired slot {}", delta.slot);
            return None;
        }
        let pending = self.pending.entry(delta.slot).or_default();
        if let Some(call_id) = delta.call_id.as_deref().filter(|s| !s.is_empty()) {
            // Ids and names arrive whole; last write wins.
            pending.call_id = call_id.to_string();
        }
        if let Some(name) = delta.name.as_deref().filter(|s| !s.is_empty()) {
            pending.name = name.to_string();
        }
        if let Some(arguments) = delta.arguments.as_deref() {
            pending.arguments.push_str(arguments);
        }

        if !pending.is_complete() {
            return None;
        }
        let completed = self
            .pending
            .remove(&delta.slot)
            .expect("pending entry exists; it was just updated");
        self.retired.insert(delta.slot);
        log::debug!(target: "assembler.delta", "slot {} completed as {:?}", delta.slot, completed.name);
        Some(completed.into_call(delta.slot))
    }

    /// Terminal pass at end of turn: any slot whose payload now parses (and
    /// that has a name) is emitted in slot order; the rest ended mid-fragment
    /// and are silently dropped.
    pub fn finish(&mut self) -> Vec<AssembledCall> {
        let mut slots: Vec<u32> = self.pending.keys().copied().collect();
        slots.sort_unstable();
        let mut calls = Vec::new();
        for slot in slots {
            let Some(pending) = self.pending.remove(&slot) else {
                continue;
            };
            self.retired.insert(slot);
            if pending.is_complete() {
                calls.push(pending.into_call(slot));
            } else {
                log::debug!(target: "assembler.delta", "dropping incomplete slot {slot} at end of turn");
            }
        }
        calls
    }

    /// Return to a fresh state for session reuse.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.retired.clear();
    }
}

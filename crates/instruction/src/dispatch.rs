use crate::model::{Instruction, RawInstruction};
use serde::Serialize;
use tree_store::NodeStore;

/// Per-instruction result envelope. Failures never escape the dispatcher as
/// panics or early returns; a batch always yields one outcome per entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// The instruction was applied. `node` carries the affected id where one
    /// exists (the final id for create/update, the target otherwise); a
    /// redundant removal applies with no node.
    Applied { node: Option<String> },
    Failed { error: String },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    fn failed(err: impl std::fmt::Display) -> Self {
        Outcome::Failed {
            error: err.to_string(),
        }
    }
}

/// Routes fully-formed instructions to the node store it owns.
pub struct Dispatcher {
    store: NodeStore,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_store(NodeStore::new())
    }

    pub fn with_store(store: NodeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn into_store(self) -> NodeStore {
        self.store
    }

    /// Validate and apply one instruction.
    pub fn execute(&mut self, raw: &RawInstruction) -> Outcome {
        let instruction = match Instruction::decode(raw) {
            Ok(instruction) => instruction,
            Err(err) => {
                log::debug!(target: "dispatch", "rejected {:?}: {err}", raw.name);
                return Outcome::failed(err);
            }
        };
        let outcome = self.apply(instruction);
        log::trace!(target: "dispatch", "{:?} -> {outcome:?}", raw.name);
        outcome
    }

    /// Apply a batch; the result list matches the input one-to-one, and a
    /// failed entry never aborts the remainder.
    pub fn execute_batch(&mut self, batch: &[RawInstruction]) -> Vec<Outcome> {
        batch.iter().map(|raw| self.execute(raw)).collect()
    }

    fn apply(&mut self, instruction: Instruction) -> Outcome {
        match instruction {
            Instruction::Create {
                parent_id,
                label,
                attributes,
            } => {
                let id = self
                    .store
                    .create_node(parent_id.as_deref(), &label, attributes);
                Outcome::Applied { node: Some(id) }
            }
            Instruction::Update {
                target_id,
                attributes,
            } => match self.store.update_node(&target_id, attributes) {
                Ok(final_id) => Outcome::Applied {
                    node: Some(final_id),
                },
                Err(err) => Outcome::failed(err),
            },
            Instruction::SetText { target_id, text } => {
                match self.store.set_text(&target_id, &text) {
                    Ok(()) => Outcome::Applied {
                        node: Some(target_id),
                    },
                    Err(err) => Outcome::failed(err),
                }
            }
            Instruction::AppendText { target_id, text } => {
                match self.store.append_text(&target_id, &text) {
                    Ok(()) => Outcome::Applied {
                        node: Some(target_id),
                    },
                    Err(err) => Outcome::failed(err),
                }
            }
            Instruction::Remove { target_id } => {
                let removed = self.store.remove_node(&target_id);
                Outcome::Applied {
                    node: removed.then_some(target_id),
                }
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

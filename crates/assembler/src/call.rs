use instruction::RawInstruction;

/// One fully-formed tool call released by an assembler.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledCall {
    /// Transport-supplied call id where one exists, otherwise derived from
    /// the slot or block position.
    pub call_id: String,
    pub instruction: RawInstruction,
}

impl AssembledCall {
    pub fn new(call_id: impl Into<String>, instruction: RawInstruction) -> Self {
        Self {
            call_id: call_id.into(),
            instruction,
        }
    }
}

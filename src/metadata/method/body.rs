//! Method body container: local variables plus the instruction block.

use crate::{
    assembly::{InstructionBlock, SequenceLabel},
    metadata::typesystem::TypeSignature,
};

/// A local variable declared by a method body.
///
/// The name is documentation only; it is not part of the binary encoding.
pub struct LocalVariable {
    /// Variable name (for diagnostics and debugging)
    pub name: String,
    /// The type of this variable
    pub signature: TypeSignature,
}

/// An executable method body.
///
/// A body owns its local variable table and exactly one top-level
/// [`InstructionBlock`]. Scaffolded bodies (see [`crate::assembly::scaffold`])
/// follow the convention that the first sequence of the block is the
/// principal, caller-filled sequence and the last is the return sequence.
pub struct MethodBody {
    /// Declared local variables, in slot order
    pub locals: Vec<LocalVariable>,
    /// The top-level instruction block
    pub block: InstructionBlock,
}

impl Default for MethodBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodBody {
    /// Creates an empty body with no locals and an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locals: Vec::new(),
            block: InstructionBlock::new(),
        }
    }

    /// The label of the principal (caller-filled) sequence of a scaffolded
    /// body: by convention the first sequence of the block.
    #[must_use]
    pub fn principal_label(&self) -> Option<SequenceLabel> {
        self.block.sequences().next().map(|s| s.label())
    }
}

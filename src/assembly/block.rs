//! Instruction blocks and sequences.
//!
//! A method body owns one [`InstructionBlock`]; the block owns an ordered
//! list of [`InstructionSequence`]s. Control falls through sequences in list
//! order, and branch instructions reference sequences by [`SequenceLabel`].
//! Labels are stable for the lifetime of the block: structural edits splice
//! instructions within a labeled sequence rather than re-labeling, so every
//! branch target keeps meaning the same program point.

use std::fmt;

use crate::{assembly::Instruction, Result};

/// Identifies one [`InstructionSequence`] within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceLabel(pub(crate) u32);

impl SequenceLabel {
    /// The raw label value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SequenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// An ordered run of instructions addressed by one label.
pub struct InstructionSequence {
    label: SequenceLabel,
    instructions: Vec<Instruction>,
}

impl InstructionSequence {
    fn new(label: SequenceLabel) -> Self {
        Self {
            label,
            instructions: Vec::new(),
        }
    }

    /// The label of this sequence.
    #[must_use]
    pub fn label(&self) -> SequenceLabel {
        self.label
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// The instructions of this sequence, in program order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Whether the sequence holds no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The top-level instruction container of a method body.
pub struct InstructionBlock {
    sequences: Vec<InstructionSequence>,
    next_label: u32,
}

impl Default for InstructionBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sequences: Vec::new(),
            next_label: 0,
        }
    }

    /// Appends a new empty sequence and returns its label.
    pub fn new_sequence(&mut self) -> SequenceLabel {
        let label = self.fresh_label();
        self.sequences.push(InstructionSequence::new(label));
        label
    }

    /// Creates a fresh, detached sequence owned by the caller.
    ///
    /// Detached sequences are the construction vehicle for
    /// [`InstructionBlock::splice_instruction`]: build the replacement
    /// instructions in one, then splice it in.
    pub fn detached_sequence(&mut self) -> InstructionSequence {
        InstructionSequence::new(self.fresh_label())
    }

    /// Looks up a sequence by label.
    #[must_use]
    pub fn sequence(&self, label: SequenceLabel) -> Option<&InstructionSequence> {
        self.sequences.iter().find(|s| s.label == label)
    }

    /// Appends one instruction to the sequence with the given label.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SequenceNotFound`] if no sequence carries the
    /// label.
    pub fn emit(&mut self, label: SequenceLabel, instruction: Instruction) -> Result<()> {
        let sequence = self
            .sequences
            .iter_mut()
            .find(|s| s.label == label)
            .ok_or(crate::Error::SequenceNotFound(label.0))?;
        sequence.push(instruction);
        Ok(())
    }

    /// The sequences of this block, in fall-through order.
    pub fn sequences(&self) -> impl Iterator<Item = &InstructionSequence> {
        self.sequences.iter()
    }

    /// All instructions of the block, flattened into program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.sequences.iter().flat_map(|s| s.instructions.iter())
    }

    /// Total instruction count across all sequences.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.sequences.iter().map(|s| s.instructions.len()).sum()
    }

    /// Replaces exactly one instruction with the contents of a detached
    /// sequence, in place.
    ///
    /// The host sequence keeps its label and every surrounding instruction,
    /// so all branch targets and the fall-through successor are preserved;
    /// only the addressed instruction changes.
    ///
    /// # Arguments
    ///
    /// * `label` - Sequence holding the instruction to replace
    /// * `index` - Position of the instruction within that sequence
    /// * `replacement` - Detached sequence whose instructions take its place
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SequenceNotFound`] for an unknown label, or
    /// [`crate::Error::Malformed`] if `index` is out of range.
    pub fn splice_instruction(
        &mut self,
        label: SequenceLabel,
        index: usize,
        replacement: InstructionSequence,
    ) -> Result<()> {
        let sequence = self
            .sequences
            .iter_mut()
            .find(|s| s.label == label)
            .ok_or(crate::Error::SequenceNotFound(label.0))?;

        if index >= sequence.instructions.len() {
            return Err(malformed_error!(
                "splice index {} out of range for sequence {} ({} instructions)",
                index,
                label,
                sequence.instructions.len()
            ));
        }

        sequence
            .instructions
            .splice(index..=index, replacement.instructions);
        Ok(())
    }

    fn fresh_label(&mut self) -> SequenceLabel {
        let label = SequenceLabel(self.next_label);
        self.next_label += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::Token;

    #[test]
    fn test_emit_and_flatten() {
        let mut block = InstructionBlock::new();
        let first = block.new_sequence();
        let second = block.new_sequence();

        block.emit(first, Instruction::nop()).unwrap();
        block.emit(second, Instruction::ret()).unwrap();

        let flat: Vec<_> = block.instructions().copied().collect();
        assert_eq!(flat, vec![Instruction::nop(), Instruction::ret()]);
        assert_eq!(block.instruction_count(), 2);
    }

    #[test]
    fn test_emit_to_unknown_label_fails() {
        let mut block = InstructionBlock::new();
        let label = block.new_sequence();
        drop(block);

        let mut other = InstructionBlock::new();
        assert!(matches!(
            other.emit(label, Instruction::nop()),
            Err(crate::Error::SequenceNotFound(_))
        ));
    }

    #[test]
    fn test_splice_preserves_surroundings() {
        let target = Token::new(0x0600_0001);
        let mut block = InstructionBlock::new();
        let label = block.new_sequence();
        block.emit(label, Instruction::ldarg(0)).unwrap();
        block.emit(label, Instruction::call(target)).unwrap();
        block.emit(label, Instruction::ret()).unwrap();

        let mut replacement = block.detached_sequence();
        replacement.push(Instruction::callvirt(target));
        block.splice_instruction(label, 1, replacement).unwrap();

        let flat: Vec<_> = block.instructions().copied().collect();
        assert_eq!(
            flat,
            vec![
                Instruction::ldarg(0),
                Instruction::callvirt(target),
                Instruction::ret()
            ]
        );
        // the sequence kept its label
        assert_eq!(block.sequence(label).unwrap().instructions().len(), 3);
    }

    #[test]
    fn test_splice_out_of_range_fails() {
        let mut block = InstructionBlock::new();
        let label = block.new_sequence();
        block.emit(label, Instruction::ret()).unwrap();

        let replacement = block.detached_sequence();
        assert!(block.splice_instruction(label, 1, replacement).is_err());
    }

    #[test]
    fn test_labels_are_unique() {
        let mut block = InstructionBlock::new();
        let a = block.new_sequence();
        let b = block.new_sequence();
        let detached = block.detached_sequence();
        assert_ne!(a, b);
        assert_ne!(detached.label(), a);
        assert_ne!(detached.label(), b);
    }
}

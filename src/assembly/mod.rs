//! Instruction-level building blocks for method bodies.
//!
//! This module owns the representation weaving passes synthesize and rewrite:
//! instructions, labeled instruction sequences, the block structure that ties
//! them into a method body, and the scaffold builder that manufactures empty
//! bodies.
//!
//! # Key Types
//! - [`Instruction`], [`OpCode`], [`Operand`], [`FlowType`] - One CIL operation
//! - [`InstructionSequence`], [`InstructionBlock`], [`SequenceLabel`] - Body structure
//! - [`BodyScaffold`] - Empty-body builder ("return default value" skeletons)
//!
//! # Example
//! ```rust
//! use cilweave::assembly::{BodyScaffold, Instruction};
//! use cilweave::metadata::method::MethodSignature;
//!
//! let body = BodyScaffold::for_signature(&MethodSignature::void()).build();
//! assert_eq!(body.block.instruction_count(), 1); // just `ret`
//! ```

mod block;
mod instruction;
pub mod scaffold;

pub use block::{InstructionBlock, InstructionSequence, SequenceLabel};
pub use instruction::{FlowType, Instruction, OpCode, Operand};
pub use scaffold::{create_empty_method, BodyScaffold, RETURN_LOCAL};

//! CIL instruction representation for synthesized and rewritten bodies.

use strum::EnumIter;

use crate::{assembly::SequenceLabel, metadata::token::Token};

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Falls through to the next instruction
    Next,
    /// Transfers control to a labeled sequence
    Branch,
    /// Calls another method and continues after it returns
    Call,
    /// Leaves the method
    Return,
}

/// The instruction set the weaving engine emits and rewrites.
///
/// This is deliberately the subset a weave touches: scaffold plumbing
/// (loads, stores, return), the two dispatch kinds of method invocation, and
/// the function-pointer loads the call-site rewriter has to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum OpCode {
    /// No operation
    Nop,
    /// Load argument by index
    Ldarg,
    /// Load local variable by index
    Ldloc,
    /// Store to local variable by index
    Stloc,
    /// Load 32-bit integer constant
    LdcI4,
    /// Direct-dispatch method call
    Call,
    /// Virtual-dispatch method call
    CallVirt,
    /// Load method pointer (direct)
    Ldftn,
    /// Load method pointer (virtual)
    Ldvirtftn,
    /// Unconditional branch to a labeled sequence
    Br,
    /// Return from the method
    Ret,
}

impl OpCode {
    /// The textual mnemonic of this opcode.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Ldarg => "ldarg",
            OpCode::Ldloc => "ldloc",
            OpCode::Stloc => "stloc",
            OpCode::LdcI4 => "ldc.i4",
            OpCode::Call => "call",
            OpCode::CallVirt => "callvirt",
            OpCode::Ldftn => "ldftn",
            OpCode::Ldvirtftn => "ldvirtftn",
            OpCode::Br => "br",
            OpCode::Ret => "ret",
        }
    }

    /// The control-flow class of this opcode.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        match self {
            OpCode::Call | OpCode::CallVirt => FlowType::Call,
            OpCode::Br => FlowType::Branch,
            OpCode::Ret => FlowType::Return,
            _ => FlowType::Next,
        }
    }
}

/// Instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No operand
    None,
    /// Local variable slot index
    Local(u16),
    /// Argument index
    Arg(u16),
    /// 32-bit integer immediate
    Int32(i32),
    /// Method token (call targets and function-pointer loads)
    Method(Token),
    /// Branch target sequence label
    Target(SequenceLabel),
}

/// A decoded or synthesized CIL instruction: opcode plus operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation
    pub opcode: OpCode,
    /// The operand, [`Operand::None`] where the opcode takes none
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction from opcode and operand.
    #[must_use]
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Self { opcode, operand }
    }

    /// `nop`
    #[must_use]
    pub fn nop() -> Self {
        Self::new(OpCode::Nop, Operand::None)
    }

    /// `ret`
    #[must_use]
    pub fn ret() -> Self {
        Self::new(OpCode::Ret, Operand::None)
    }

    /// `ldloc <slot>`
    #[must_use]
    pub fn ldloc(slot: u16) -> Self {
        Self::new(OpCode::Ldloc, Operand::Local(slot))
    }

    /// `stloc <slot>`
    #[must_use]
    pub fn stloc(slot: u16) -> Self {
        Self::new(OpCode::Stloc, Operand::Local(slot))
    }

    /// `ldarg <index>`
    #[must_use]
    pub fn ldarg(index: u16) -> Self {
        Self::new(OpCode::Ldarg, Operand::Arg(index))
    }

    /// `ldc.i4 <value>`
    #[must_use]
    pub fn ldc_i4(value: i32) -> Self {
        Self::new(OpCode::LdcI4, Operand::Int32(value))
    }

    /// `call <method>`
    #[must_use]
    pub fn call(target: Token) -> Self {
        Self::new(OpCode::Call, Operand::Method(target))
    }

    /// `callvirt <method>`
    #[must_use]
    pub fn callvirt(target: Token) -> Self {
        Self::new(OpCode::CallVirt, Operand::Method(target))
    }

    /// `ldftn <method>`
    #[must_use]
    pub fn ldftn(target: Token) -> Self {
        Self::new(OpCode::Ldftn, Operand::Method(target))
    }

    /// `br <label>`
    #[must_use]
    pub fn br(target: SequenceLabel) -> Self {
        Self::new(OpCode::Br, Operand::Target(target))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_mnemonics_are_unique_and_nonempty() {
        let mut seen = HashSet::new();
        for opcode in OpCode::iter() {
            let mnemonic = opcode.mnemonic();
            assert!(!mnemonic.is_empty());
            assert!(seen.insert(mnemonic), "duplicate mnemonic {mnemonic}");
        }
    }

    #[test]
    fn test_flow_classification() {
        assert_eq!(OpCode::Call.flow(), FlowType::Call);
        assert_eq!(OpCode::CallVirt.flow(), FlowType::Call);
        assert_eq!(OpCode::Ret.flow(), FlowType::Return);
        assert_eq!(OpCode::Br.flow(), FlowType::Branch);
        assert_eq!(OpCode::Ldloc.flow(), FlowType::Next);
    }

    #[test]
    fn test_call_constructors_carry_operand() {
        let target = Token::new(0x0600_0001);
        assert_eq!(Instruction::call(target).operand, Operand::Method(target));
        assert_eq!(
            Instruction::callvirt(target).operand,
            Operand::Method(target)
        );
        assert_eq!(Instruction::ret().operand, Operand::None);
    }
}

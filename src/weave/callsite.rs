//! Call-site rewriting: direct dispatch to virtual dispatch.
//!
//! [`CallSiteUpgrader`] is the single-purpose instruction rewriter of the
//! engine: every `call` instruction in a given method set becomes a
//! `callvirt` carrying the identical target operand. Each match is replaced
//! by splicing a freshly built one-instruction sequence over the original
//! instruction, leaving the surrounding control flow untouched - this is an
//! instruction-for-instruction substitution, not a block restructuring.
//!
//! Known incompleteness, carried forward deliberately: `ldftn` instructions
//! that load a pointer to one of the affected methods are NOT retargeted to
//! `ldvirtftn`. Delegates constructed from such pointers keep direct-dispatch
//! semantics.

use crate::{
    assembly::{Instruction, OpCode, Operand, SequenceLabel},
    metadata::{
        diagnostics::DiagnosticCategory,
        method::{MethodBody, MethodRc},
        token::Token,
    },
    weave::WeaveContext,
    Result,
};

/// Rewrites direct calls to virtual calls across a method set.
#[derive(Default)]
pub struct CallSiteUpgrader;

impl CallSiteUpgrader {
    /// Creates a new upgrader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Upgrades every `call` instruction in every body of `methods` to
    /// `callvirt`, preserving operands. Returns the number of rewritten
    /// call sites.
    ///
    /// Methods without a body are skipped; that is a normal state (abstract
    /// and external methods), not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a `call` instruction carries a
    /// non-method operand, or [`crate::Error::LockError`] on a poisoned body
    /// lock.
    pub fn upgrade_dispatch(&self, methods: &[MethodRc], ctx: &WeaveContext) -> Result<usize> {
        let mut total = 0;
        for method in methods {
            if !method.has_body() {
                continue;
            }
            total += method.with_body_mut(Self::upgrade_body)??;
        }

        if total > 0 {
            ctx.diagnostics.info(
                DiagnosticCategory::Rewrite,
                format!("upgraded {total} direct call site(s) to virtual dispatch"),
            );
        }
        Ok(total)
    }

    fn upgrade_body(body: &mut MethodBody) -> Result<usize> {
        // collect matches first; splicing replaces one instruction with one,
        // so recorded indices stay valid
        let mut matches: Vec<(SequenceLabel, usize, Token)> = Vec::new();
        for sequence in body.block.sequences() {
            for (index, instruction) in sequence.instructions().iter().enumerate() {
                if instruction.opcode != OpCode::Call {
                    continue;
                }
                let Operand::Method(target) = instruction.operand else {
                    return Err(malformed_error!(
                        "call instruction in sequence {} has non-method operand {:?}",
                        sequence.label(),
                        instruction.operand
                    ));
                };
                matches.push((sequence.label(), index, target));
            }
        }

        let count = matches.len();
        for (label, index, target) in matches {
            let mut replacement = body.block.detached_sequence();
            replacement.push(Instruction::callvirt(target));
            body.block.splice_instruction(label, index, replacement)?;
        }
        Ok(count)
    }
}

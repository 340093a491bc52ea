//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use cilweave::prelude::*;
//!
//! let registry = TypeRegistry::new();
//! let diagnostics = Diagnostics::new();
//! let ctx = WeaveContext::new(&registry, &diagnostics);
//! # let _ = ctx;
//! ```

pub use crate::{
    assembly::{
        create_empty_method, BodyScaffold, Instruction, InstructionBlock, InstructionSequence,
        OpCode, Operand, SequenceLabel,
    },
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
        method::{CilMethod, MethodBody, MethodRc, MethodSignature},
        token::Token,
        typesystem::{
            CilType, CilTypeRc, CilTypeRef, Field, FieldRc, TypeRegistry, TypeSignature,
            TypeSource,
        },
    },
    weave::{
        CallSiteUpgrader, DispatchNormalizer, SerializabilityWalker, WeaveContext, WeavePass,
    },
    Error, Result,
};

//! Method body scaffolding.
//!
//! [`BodyScaffold`] manufactures the skeleton of a method body: a return-value
//! local (for non-void signatures), an empty principal sequence for the caller
//! to fill, and a terminal return sequence that loads the local and returns.
//! Left untouched, the scaffold is a complete "return default value" method -
//! locals are zero-initialized by the runtime, so the return sequence executed
//! alone yields the default of the return type.
//!
//! The scaffold guarantees only its own shape. Whatever the caller emits into
//! the principal sequence must assign the return local on every path that
//! falls through to the return sequence; the scaffold does not verify that.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::assembly::{BodyScaffold, Instruction};
//! use cilweave::metadata::method::MethodSignature;
//! use cilweave::metadata::typesystem::TypeSignature;
//!
//! let signature = MethodSignature::new(TypeSignature::I4, Vec::new());
//! let mut body = BodyScaffold::for_signature(&signature).build();
//!
//! // fill the principal sequence: return 42
//! let principal = body.principal_label().unwrap();
//! body.block.emit(principal, Instruction::ldc_i4(42)).unwrap();
//! body.block.emit(principal, Instruction::stloc(0)).unwrap();
//! ```

use crate::{
    assembly::Instruction,
    metadata::{
        method::{CilMethod, LocalVariable, MethodBody, MethodSignature},
        token::Token,
        typesystem::TypeSignature,
    },
    Result,
};

/// Slot index of the return-value local declared by a non-void scaffold.
pub const RETURN_LOCAL: u16 = 0;

/// Builder for empty method body skeletons.
pub struct BodyScaffold {
    signature: MethodSignature,
    extra_locals: Vec<(String, TypeSignature)>,
}

impl BodyScaffold {
    /// Starts a scaffold for the given method signature.
    #[must_use]
    pub fn for_signature(signature: &MethodSignature) -> Self {
        Self {
            signature: signature.clone(),
            extra_locals: Vec::new(),
        }
    }

    /// Declares an additional local variable, after the return local.
    ///
    /// The name is used for documentation purposes only.
    #[must_use]
    pub fn local(mut self, name: &str, local_type: TypeSignature) -> Self {
        self.extra_locals.push((name.to_string(), local_type));
        self
    }

    /// Builds the scaffold body.
    ///
    /// The returned body has the principal sequence first (empty, label
    /// retrievable through [`MethodBody::principal_label`]) and the return
    /// sequence last. For non-void signatures, local slot
    /// [`RETURN_LOCAL`] holds the return value.
    #[must_use]
    pub fn build(self) -> MethodBody {
        let mut body = MethodBody::new();

        let returns_value = !self.signature.returns_void();
        if returns_value {
            body.locals.push(LocalVariable {
                name: "retval".to_string(),
                signature: self.signature.return_type.clone(),
            });
        }
        for (name, signature) in self.extra_locals {
            body.locals.push(LocalVariable { name, signature });
        }

        // principal first, return sequence last; fall-through order is the
        // only edge between them
        let _principal = body.block.new_sequence();
        let ret = body.block.new_sequence();
        if returns_value {
            // emitting into sequences just created cannot fail
            let _ = body.block.emit(ret, Instruction::ldloc(RETURN_LOCAL));
        }
        let _ = body.block.emit(ret, Instruction::ret());

        body
    }
}

/// Synthesizes a method node with an empty scaffold body attached.
///
/// The result is a valid "do nothing, return default" method. The caller
/// fills the principal sequence afterwards and attaches the method to its
/// declaring type.
///
/// # Arguments
///
/// * `token` - Token assigned to the new method
/// * `name` - Method name
/// * `signature` - Return and parameter types
/// * `flags` - Raw method attribute word for the new method
///
/// # Errors
///
/// Returns [`crate::Error::LockError`] if the freshly created body lock is
/// poisoned, which cannot happen in practice.
pub fn create_empty_method(
    token: Token,
    name: impl Into<String>,
    signature: MethodSignature,
    flags: u32,
) -> Result<CilMethod> {
    let body = BodyScaffold::for_signature(&signature).build();
    let method = CilMethod::new(token, name, signature, flags, Vec::new());
    method.set_body(body)?;
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::OpCode;
    use crate::metadata::token::TABLE_METHOD_DEF;

    #[test]
    fn test_nonvoid_scaffold_shape() {
        let signature = MethodSignature::new(TypeSignature::I4, Vec::new());
        let body = BodyScaffold::for_signature(&signature).build();

        assert_eq!(body.locals.len(), 1);
        assert_eq!(body.locals[0].signature, TypeSignature::I4);

        let flat: Vec<_> = body.block.instructions().copied().collect();
        assert_eq!(
            flat,
            vec![Instruction::ldloc(RETURN_LOCAL), Instruction::ret()]
        );
    }

    #[test]
    fn test_void_scaffold_has_no_return_local() {
        let body = BodyScaffold::for_signature(&MethodSignature::void()).build();

        assert!(body.locals.is_empty());
        let flat: Vec<_> = body.block.instructions().copied().collect();
        assert_eq!(flat, vec![Instruction::ret()]);
    }

    #[test]
    fn test_principal_sequence_is_first_and_empty() {
        let signature = MethodSignature::new(TypeSignature::String, Vec::new());
        let body = BodyScaffold::for_signature(&signature).build();

        let principal = body.principal_label().unwrap();
        assert!(body.block.sequence(principal).unwrap().is_empty());
    }

    #[test]
    fn test_filled_principal_precedes_return() {
        let signature = MethodSignature::new(TypeSignature::I4, Vec::new());
        let mut body = BodyScaffold::for_signature(&signature).build();
        let principal = body.principal_label().unwrap();

        body.block
            .emit(principal, Instruction::ldc_i4(7))
            .unwrap();
        body.block
            .emit(principal, Instruction::stloc(RETURN_LOCAL))
            .unwrap();

        let opcodes: Vec<OpCode> = body.block.instructions().map(|i| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![OpCode::LdcI4, OpCode::Stloc, OpCode::Ldloc, OpCode::Ret]
        );
    }

    #[test]
    fn test_extra_locals_follow_return_local() {
        let signature = MethodSignature::new(TypeSignature::I4, Vec::new());
        let body = BodyScaffold::for_signature(&signature)
            .local("temp", TypeSignature::Boolean)
            .build();

        assert_eq!(body.locals.len(), 2);
        assert_eq!(body.locals[1].name, "temp");
    }

    #[test]
    fn test_create_empty_method() {
        let method = create_empty_method(
            Token::from_parts(TABLE_METHOD_DEF, 9),
            "GetDefault",
            MethodSignature::new(TypeSignature::I4, Vec::new()),
            0x0006,
        )
        .unwrap();

        assert!(method.has_body());
        let flat = method
            .with_body(|body| body.block.instructions().copied().collect::<Vec<_>>())
            .unwrap();
        assert_eq!(flat, vec![Instruction::ldloc(0), Instruction::ret()]);
    }
}

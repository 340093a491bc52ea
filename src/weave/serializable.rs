//! Serializability closure propagation.
//!
//! Given a seed set of marker-annotated types, [`SerializabilityWalker`]
//! computes the transitive closure of types reachable through field types,
//! generic arguments, array element types and base types, and marks every
//! locally owned type in that closure serializable. Externally owned types
//! are never mutated: they only get a verification check, and a warning
//! diagnostic when they fail it.
//!
//! This is a depth-first reachability computation over a graph that may
//! contain cycles (self-referential fields, mutually referencing types), so
//! the walker keeps an explicit visited set of type tokens and processes each
//! distinct type node at most once per invocation. That bound is what makes
//! the walk terminate: the set of distinct type nodes in a module is always
//! finite, however deeply generic instantiations nest.

use std::collections::HashSet;

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        token::Token,
        typesystem::{CilTypeRc, TypeSignature},
    },
    weave::{WeaveContext, WeavePass},
    Result,
};

/// The serializability propagation pass.
///
/// # Example
///
/// ```rust,no_run
/// use cilweave::metadata::{diagnostics::Diagnostics, typesystem::TypeRegistry};
/// use cilweave::weave::{SerializabilityWalker, WeaveContext, WeavePass};
///
/// let registry = TypeRegistry::new();
/// let diagnostics = Diagnostics::new();
/// // ... host loads the module into the registry ...
/// let ctx = WeaveContext::new(&registry, &diagnostics);
/// let walker = SerializabilityWalker::new("Messaging.MessageAttribute");
/// walker.run(&ctx)?;
/// # Ok::<(), cilweave::Error>(())
/// ```
pub struct SerializabilityWalker {
    marker: String,
}

impl SerializabilityWalker {
    /// Creates a walker seeded by types carrying the given marker attribute.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Computes the reachable closure of the seed types and marks every
    /// locally owned member serializable.
    ///
    /// Idempotent: the mark is monotonic, and running twice over the same
    /// seeds yields the same flag state as running once.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeNotFound`] if a generic instantiation's
    /// element type cannot be resolved - a structural impossibility that
    /// aborts the pass. Unresolvable plain field types only produce a
    /// warning diagnostic.
    pub fn propagate(&self, seeds: &[CilTypeRc], ctx: &WeaveContext) -> Result<()> {
        let mut visited = HashSet::new();
        for seed in seeds {
            self.descend(seed, &mut visited, ctx)?;
        }
        Ok(())
    }

    /// Dispatch on ownership: locally owned types are walked and mutated,
    /// externally owned types are verified only.
    fn descend(
        &self,
        ty: &CilTypeRc,
        visited: &mut HashSet<Token>,
        ctx: &WeaveContext,
    ) -> Result<()> {
        if !visited.insert(ty.token) {
            return Ok(());
        }

        if !ty.is_local() {
            if !ty.is_serializable() {
                ctx.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Propagation,
                        format!(
                            "externally owned type {} is reachable from a serializable type but is not serializable",
                            ty.fullname()
                        ),
                    )
                    .with_token(ty.token),
                );
            }
            return Ok(());
        }

        ty.mark_serializable();

        for (_, field) in ty.fields.iter() {
            if field.excluded {
                continue;
            }
            self.visit_signature(&field.signature, visited, ctx, false)?;
        }

        if let Some(base) = ty.base().and_then(|b| b.upgrade()) {
            self.descend(&base, visited, ctx)?;
        }

        Ok(())
    }

    /// Traversal rule over one type signature tree.
    ///
    /// `required` marks positions where resolution failure is a structural
    /// impossibility (generic-instantiation element types) rather than a
    /// reportable gap.
    fn visit_signature(
        &self,
        signature: &TypeSignature,
        visited: &mut HashSet<Token>,
        ctx: &WeaveContext,
        required: bool,
    ) -> Result<()> {
        match signature {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                match ctx.registry.resolve(token) {
                    Some(ty) => self.descend(&ty, visited, ctx),
                    None if required => Err(crate::Error::TypeNotFound(*token)),
                    None => {
                        ctx.diagnostics.push(
                            Diagnostic::new(
                                DiagnosticSeverity::Warning,
                                DiagnosticCategory::Type,
                                format!("unresolvable field type {token}"),
                            )
                            .with_token(*token),
                        );
                        Ok(())
                    }
                }
            }
            TypeSignature::GenericInst(element, args) => {
                self.visit_signature(element, visited, ctx, true)?;
                for arg in args {
                    self.visit_signature(arg, visited, ctx, false)?;
                }
                Ok(())
            }
            TypeSignature::SzArray(element)
            | TypeSignature::Array(element, _)
            | TypeSignature::ByRef(element)
            | TypeSignature::Ptr(element) => {
                self.visit_signature(element, visited, ctx, required)
            }
            // primitives, generic parameters and unknowns are terminal
            _ => Ok(()),
        }
    }
}

impl WeavePass for SerializabilityWalker {
    fn name(&self) -> &'static str {
        "serializability-propagation"
    }

    fn run(&self, ctx: &WeaveContext) -> Result<()> {
        let seeds = ctx.registry.types_with_attribute(&self.marker);
        self.propagate(&seeds, ctx)
    }

    fn description(&self) -> &'static str {
        "Marks every type reachable from marker-annotated types as serializable"
    }
}

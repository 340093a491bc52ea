//! Shared context handed to every weaving pass.

use crate::metadata::{diagnostics::Diagnostics, typesystem::TypeRegistry};

/// Everything a pass needs to query and report: the type registry of the
/// module under transformation and the diagnostics sink.
///
/// The context borrows both; a weaving run owns them and hands the same
/// context to each pass in sequence. Passes mutate the module through the
/// nodes the registry hands out, never through the context itself.
pub struct WeaveContext<'a> {
    /// Read surface over the module's type graph.
    pub registry: &'a TypeRegistry,
    /// Non-fatal reporting channel.
    pub diagnostics: &'a Diagnostics,
}

impl<'a> WeaveContext<'a> {
    /// Creates a context over a registry and a diagnostics sink.
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, diagnostics: &'a Diagnostics) -> Self {
        Self {
            registry,
            diagnostics,
        }
    }
}

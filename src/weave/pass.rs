//! Pass trait for the weaving pipeline.

use crate::{weave::WeaveContext, Result};

/// A weaving pass over one module snapshot.
///
/// Passes run single-threaded, synchronously and to completion: each pass
/// fully owns the module for its duration, and the host runs passes in a
/// fixed order. A pass discovers its own seed elements through the registry
/// (typically a marker-attribute query), mutates the graph in place, and
/// reports non-fatal findings to the context's diagnostics sink.
///
/// Returning an error aborts the whole transformation run for the module;
/// policy violations must go through diagnostics instead.
pub trait WeavePass {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Run the pass against the module.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural impossibilities in the module
    /// model; the build host treats that as a failed build step.
    fn run(&self, ctx: &WeaveContext) -> Result<()>;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

//! Weaving passes: the transformation engine.
//!
//! A weaving run is batch-oriented and single-threaded: the host loads a
//! module snapshot into a [`crate::metadata::typesystem::TypeRegistry`],
//! builds a [`WeaveContext`], and runs passes in a fixed order. Each pass
//! owns the module for its duration and runs to completion before the next
//! reads its output. There is no retry, timeout or cancellation; a pass
//! either completes or the whole build step fails.
//!
//! # Key Components
//!
//! - [`WeavePass`] - The pass trait hosts drive
//! - [`WeaveContext`] - Registry + diagnostics handle shared by the passes
//! - [`SerializabilityWalker`] - Closure propagation of the serializable flag
//! - [`DispatchNormalizer`] - Promotes annotated methods to virtual dispatch
//! - [`CallSiteUpgrader`] - Direct-call to virtual-call body rewriting
//!
//! # Example
//!
//! ```rust,no_run
//! use cilweave::metadata::{diagnostics::Diagnostics, typesystem::TypeRegistry};
//! use cilweave::weave::{DispatchNormalizer, SerializabilityWalker, WeaveContext, WeavePass};
//!
//! let registry = TypeRegistry::new();
//! let diagnostics = Diagnostics::new();
//! // ... host loads the module ...
//! let ctx = WeaveContext::new(&registry, &diagnostics);
//!
//! let passes: Vec<Box<dyn WeavePass>> = vec![
//!     Box::new(SerializabilityWalker::new("Messaging.MessageAttribute")),
//!     Box::new(DispatchNormalizer::new("Weaving.MakeVirtualAttribute")),
//! ];
//! for pass in &passes {
//!     pass.run(&ctx)?;
//! }
//! print!("{}", diagnostics.summary());
//! # Ok::<(), cilweave::Error>(())
//! ```

mod callsite;
mod context;
mod dispatch;
mod pass;
mod serializable;

pub use callsite::CallSiteUpgrader;
pub use context::WeaveContext;
pub use dispatch::{is_immediate_base, DispatchNormalizer, SERIALIZATION_HOOKS};
pub use pass::WeavePass;
pub use serializable::SerializabilityWalker;

// Copyright 2026 The cilweave contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # cilweave
//!
//! A compile-time weaving engine for .NET modules: given a loaded module's
//! type/method/field graph and a set of marker-annotated elements, `cilweave`
//! mutates the graph in place - metadata attribute bits, dispatch-control
//! flags, and method body instruction sequences - and hands it back to the
//! build host for serialization.
//!
//! ## Features
//!
//! - **Closure propagation** - mark every type reachable from annotated seed
//!   types as serializable, cycle-safe and idempotent
//! - **Dispatch normalization** - promote annotated methods to virtual
//!   dispatch and repair the hide/override chain across deep hierarchies
//! - **Call-site rewriting** - upgrade direct `call` instructions to
//!   `callvirt` without disturbing surrounding control flow
//! - **Body synthesis** - scaffold valid "return default value" method
//!   bodies for higher-level weaves to fill
//! - **Lenient diagnostics** - policy violations are reported, never fatal;
//!   only structural impossibilities abort a build step
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cilweave::prelude::*;
//!
//! let registry = TypeRegistry::new();
//! let diagnostics = Diagnostics::new();
//! // ... the build host loads the module into the registry ...
//!
//! let ctx = WeaveContext::new(&registry, &diagnostics);
//! SerializabilityWalker::new("Messaging.MessageAttribute").run(&ctx)?;
//! DispatchNormalizer::new("Weaving.MakeVirtualAttribute").run(&ctx)?;
//!
//! if diagnostics.has_warnings() {
//!     print!("{}", diagnostics.summary());
//! }
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! ## Scope
//!
//! The engine consumes an already-loaded module model and produces a mutated
//! one. Reading and writing the binary module format, build configuration,
//! task ordering and the attribute declaration surface belong to the host.

#[macro_use]
pub(crate) mod error;

/// Instruction-level building blocks: opcodes, sequences, blocks, scaffolds.
///
/// See [`assembly::BodyScaffold`] for synthesizing empty method bodies and
/// [`assembly::InstructionBlock`] for the splice-based rewrite surface.
pub mod assembly;

/// Metadata model of the module being woven.
///
/// # Key Components
///
/// - [`metadata::token`] - Element identity and stable ordering
/// - [`metadata::typesystem`] - Type nodes, signatures, registry
/// - [`metadata::method`] - Method records and dispatch-control bits
/// - [`metadata::diagnostics`] - Non-fatal reporting channel
pub mod metadata;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

/// The weaving passes and their shared context.
///
/// See [`weave::SerializabilityWalker`] and [`weave::DispatchNormalizer`]
/// for the two top-level passes.
pub mod weave;

/// `cilweave` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. Used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `cilweave` Error type
///
/// The main error type for all operations in this crate. Structural
/// impossibilities surface here; policy violations travel through
/// [`metadata::diagnostics`] instead.
pub use error::Error;

//! Metadata model of the module being woven.
//!
//! Everything a weaving pass reads or mutates lives here: tokens (element
//! identity), the type system graph, method records with their dispatch bits,
//! and the diagnostics sink passes report into.
//!
//! # Key Components
//!
//! - [`token`] - Metadata tokens for cross-references and stable ordering
//! - [`typesystem`] - Type nodes, signatures and the type registry
//! - [`method`] - Method records, dispatch-control flags, bodies
//! - [`diagnostics`] - Non-fatal reporting channel for weaving runs

pub mod diagnostics;
pub mod method;
pub mod token;
pub mod typesystem;

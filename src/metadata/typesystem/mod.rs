//! Type system representation of the module being woven.
//!
//! This module owns the node types of the type graph and the registry the
//! weaving passes query it through.
//!
//! # Key Components
//!
//! - [`CilType`] - A type node: fields, base type, methods, mutable attribute word
//! - [`CilTypeRef`] - Weak reference between type nodes (cycle safe)
//! - [`Field`] - A declared field with its type signature edge
//! - [`TypeSignature`] - Immutable signature trees referenced by fields and methods
//! - [`TypeSource`] - Local (mutable) vs external (verification-only) ownership
//! - [`TypeRegistry`] - Token- and name-indexed lookup with stable enumeration

mod base;
mod registry;
mod signature;

pub use base::{CilType, CilTypeRc, CilTypeRef, Field, FieldRc, TypeSource};
pub use registry::TypeRegistry;
pub use signature::TypeSignature;

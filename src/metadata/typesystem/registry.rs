//! Central type registry for the module being woven.
//!
//! The [`TypeRegistry`] is the read interface every weaving pass uses to walk
//! the type graph: lookup by token, lookup by name, stable enumeration, and
//! "everything carrying marker attribute K" queries for seed discovery. The
//! host populates it once at module load; afterwards the passes only query.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: primary index over a `SkipMap`, so iteration
//!   order is token order - a stable, deterministic order the dispatch
//!   normalizer's ordering guarantees rest on
//! - **Name-based lookup**: secondary `DashMap` index over full names
//! - **Indirect references**: `TypeRef` tokens map through a redirect table to
//!   the concrete type node they resolve to
//!
//! Queries never fail on well-formed input: a miss is `None` or an empty
//! vector, not an error. Passes that cannot proceed without a resolution turn
//! the miss into [`crate::Error::TypeNotFound`] themselves.

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    metadata::{
        method::MethodRc,
        token::Token,
        typesystem::base::CilTypeRc,
    },
    Result,
};

/// Registry of every type node of a module, local and external.
///
/// External types (dependency modules) are registered under their `TypeRef`
/// token so signature resolution finds them; their [`crate::metadata::typesystem::TypeSource`]
/// marks them verification-only.
pub struct TypeRegistry {
    /// Primary storage, keyed by raw token value; iteration is token order.
    types: SkipMap<u32, CilTypeRc>,
    /// Full name -> token secondary index.
    fullname_index: DashMap<String, Token>,
    /// `TypeRef` token -> concrete type token redirects.
    type_ref_targets: DashMap<u32, Token>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: SkipMap::new(),
            fullname_index: DashMap::new(),
            type_ref_targets: DashMap::new(),
        }
    }

    /// Register a type node under its token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeInsert`] if a type with the same token is
    /// already registered.
    pub fn insert(&self, ty: &CilTypeRc) -> Result<()> {
        if self.types.contains_key(&ty.token.value()) {
            return Err(crate::Error::TypeInsert(ty.token));
        }

        self.fullname_index.insert(ty.fullname(), ty.token);
        self.types.insert(ty.token.value(), ty.clone());
        Ok(())
    }

    /// Register an indirect reference: a `TypeRef` token that resolves to the
    /// given concrete type token.
    pub fn insert_type_ref(&self, type_ref: Token, target: Token) {
        self.type_ref_targets.insert(type_ref.value(), target);
    }

    /// Look up a type by its exact token.
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<CilTypeRc> {
        self.types.get(&token.value()).map(|e| e.value().clone())
    }

    /// Resolve a possibly indirect type token to its type node.
    ///
    /// A `TypeDef` token resolves directly; a `TypeRef` token follows the
    /// redirect table first and falls back to a directly registered node
    /// (external types live under their `TypeRef` token).
    #[must_use]
    pub fn resolve(&self, token: &Token) -> Option<CilTypeRc> {
        if token.is_type_ref() {
            if let Some(target) = self.type_ref_targets.get(&token.value()) {
                return self.get(target.value());
            }
        }
        self.get(token)
    }

    /// Look up a type by its namespace-qualified name.
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<CilTypeRc> {
        self.fullname_index
            .get(fullname)
            .and_then(|token| self.get(token.value()))
    }

    /// All registered types, in token order.
    #[must_use]
    pub fn types(&self) -> Vec<CilTypeRc> {
        self.types.iter().map(|e| e.value().clone()).collect()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Every type carrying the given custom attribute, in token order.
    ///
    /// This is the seed query for type-level weaves: "every type in the
    /// module marked with annotation kind K".
    #[must_use]
    pub fn types_with_attribute(&self, fullname: &str) -> Vec<CilTypeRc> {
        self.types
            .iter()
            .map(|e| e.value().clone())
            .filter(|t| t.has_custom_attribute(fullname))
            .collect()
    }

    /// Every method of the module, in declaring-type token order and, within
    /// a type, declaration order. This order is stable across runs.
    #[must_use]
    pub fn all_methods(&self) -> Vec<MethodRc> {
        self.types
            .iter()
            .flat_map(|e| {
                e.value()
                    .methods
                    .iter()
                    .map(|(_, m)| m.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Every method carrying the given custom attribute, in the stable order
    /// of [`TypeRegistry::all_methods`].
    ///
    /// This is the seed query for method-level weaves.
    #[must_use]
    pub fn methods_with_attribute(&self, fullname: &str) -> Vec<MethodRc> {
        self.all_methods()
            .into_iter()
            .filter(|m| m.has_custom_attribute(fullname))
            .collect()
    }
}

//! Core type nodes of the module model.
//!
//! A [`CilType`] is one node of the type graph the weaving passes operate on:
//! its declared fields, its base type, its methods and a mutable attribute
//! word. Types reference each other through [`CilTypeRef`], a weak reference
//! wrapper that keeps cyclic type graphs (self-referential and mutually
//! referential types are legal and common) from leaking.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock, Weak,
};

use bitflags::bitflags;

use crate::{
    metadata::{
        method::MethodRc,
        token::Token,
        typesystem::signature::TypeSignature,
    },
    Result,
};

/// A reference counted [`CilType`]
pub type CilTypeRc = Arc<CilType>;

/// A reference counted [`Field`]
pub type FieldRc = Arc<Field>;

bitflags! {
    /// ECMA-335 `TypeAttributes` bits the weaving engine cares about.
    ///
    /// The packed word is a storage detail; passes go through the named
    /// accessors on [`CilType`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TypeAttributes: u32 {
        /// Type is an interface
        const INTERFACE = 0x0020;
        /// Type is abstract
        const ABSTRACT = 0x0080;
        /// Type cannot be derived from
        const SEALED = 0x0100;
        /// Type is serializable
        const SERIALIZABLE = 0x2000;
    }
}

/// Where a type is defined, relative to the module being woven.
///
/// Only types of the current module may be mutated by a pass; external types
/// are verification-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSource {
    /// Defined in the module currently being transformed.
    CurrentModule,
    /// Defined in a dependency module; the string names the owning assembly.
    External(String),
}

/// A smart reference to a [`CilType`] that holds a weak pointer, so base-type
/// and declaring-type back-references never form reference cycles.
#[derive(Clone, Debug)]
pub struct CilTypeRef {
    weak_ref: Weak<CilType>,
}

impl CilTypeRef {
    /// Create a new `CilTypeRef` from a strong reference
    pub fn new(strong_ref: &CilTypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<CilTypeRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced type is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Get the token of the referenced type (if still alive)
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.upgrade().map(|t| t.token)
    }

    /// Get the name of the referenced type (if still alive)
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.upgrade().map(|t| t.name.clone())
    }
}

impl From<CilTypeRc> for CilTypeRef {
    fn from(strong_ref: CilTypeRc) -> Self {
        Self::new(&strong_ref)
    }
}

/// A field declared by a [`CilType`].
///
/// Fields carry the type signature edge the closure walker follows, and an
/// exclusion flag (the `[NonSerialized]` analog): excluded fields contribute
/// no edge.
pub struct Field {
    /// Metadata token of this field
    pub token: Token,
    /// Field name
    pub name: String,
    /// Type signature of the field
    pub signature: TypeSignature,
    /// Field is excluded from the serializability transform
    pub excluded: bool,
}

impl Field {
    /// Create a new field.
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>, signature: TypeSignature) -> Self {
        Self {
            token,
            name: name.into(),
            signature,
            excluded: false,
        }
    }

    /// Mark the field as excluded from the transform.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }
}

/// One type of the module model.
///
/// Created once when the module is loaded and never removed within a weaving
/// run. The attribute word is the only mutable piece of metadata on the node;
/// member lists are append-only.
pub struct CilType {
    /// Metadata token of this type
    pub token: Token,
    /// Namespace of this type
    pub namespace: String,
    /// Simple name of this type
    pub name: String,
    /// Where this type is defined; immutable after load
    pub source: TypeSource,
    /// Base type reference, absent for `System.Object` and interfaces
    base: OnceLock<CilTypeRef>,
    /// Declared fields, in declaration order
    pub fields: Arc<boxcar::Vec<FieldRc>>,
    /// Declared methods, in declaration order
    pub methods: Arc<boxcar::Vec<MethodRc>>,
    /// Packed `TypeAttributes` word
    attributes: AtomicU32,
    /// Full names of custom attributes applied to this type
    pub custom_attributes: Vec<String>,
}

impl CilType {
    /// Create a new type node.
    ///
    /// # Arguments
    ///
    /// * `token` - Metadata token identifying the type
    /// * `namespace` - Namespace, may be empty
    /// * `name` - Simple type name
    /// * `source` - Defining module classification
    /// * `attributes` - Raw `TypeAttributes` word as loaded from metadata
    /// * `custom_attributes` - Full names of applied custom attributes
    #[must_use]
    pub fn new(
        token: Token,
        namespace: impl Into<String>,
        name: impl Into<String>,
        source: TypeSource,
        attributes: u32,
        custom_attributes: Vec<String>,
    ) -> Self {
        Self {
            token,
            namespace: namespace.into(),
            name: name.into(),
            source,
            base: OnceLock::new(),
            fields: Arc::new(boxcar::Vec::new()),
            methods: Arc::new(boxcar::Vec::new()),
            attributes: AtomicU32::new(attributes),
            custom_attributes,
        }
    }

    /// The namespace-qualified name of this type.
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Set the base type reference. Fails if a base was already assigned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeError`] if the base type is already set.
    pub fn set_base(&self, base: &CilTypeRc) -> Result<()> {
        self.base
            .set(CilTypeRef::new(base))
            .map_err(|_| crate::Error::TypeError(format!("base of {} already set", self.token)))
    }

    /// The base type reference, if any.
    #[must_use]
    pub fn base(&self) -> Option<CilTypeRef> {
        self.base.get().cloned()
    }

    /// Append a declared field.
    pub fn add_field(&self, field: FieldRc) {
        self.fields.push(field);
    }

    /// Attach a method to a type, wiring up the declaring-type back-reference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeError`] if the method already has a
    /// declaring type.
    pub fn attach_method(declaring: &CilTypeRc, method: MethodRc) -> Result<()> {
        method.set_declaring(declaring)?;
        declaring.methods.push(method);
        Ok(())
    }

    /// Is this type defined in the module being woven?
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.source == TypeSource::CurrentModule
    }

    /// Is this type sealed?
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags().contains(TypeAttributes::SEALED)
    }

    /// Is this type an interface?
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags().contains(TypeAttributes::INTERFACE)
    }

    /// Is this type marked serializable?
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        self.flags().contains(TypeAttributes::SERIALIZABLE)
    }

    /// Set the serializable attribute bit.
    ///
    /// Monotonic and idempotent: once set the bit stays set, and marking an
    /// already-marked type is a no-op.
    pub fn mark_serializable(&self) {
        self.attributes
            .fetch_or(TypeAttributes::SERIALIZABLE.bits(), Ordering::Relaxed);
    }

    /// Does this type carry a custom attribute with the given full name?
    #[must_use]
    pub fn has_custom_attribute(&self, fullname: &str) -> bool {
        self.custom_attributes.iter().any(|a| a == fullname)
    }

    /// The raw attribute word, for round-tripping back to metadata.
    #[must_use]
    pub fn attributes_raw(&self) -> u32 {
        self.attributes.load(Ordering::Relaxed)
    }

    fn flags(&self) -> TypeAttributes {
        TypeAttributes::from_bits_truncate(self.attributes.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TABLE_TYPE_DEF;

    fn test_type(row: u32, attributes: u32) -> CilTypeRc {
        Arc::new(CilType::new(
            Token::from_parts(TABLE_TYPE_DEF, row),
            "Test",
            format!("Type{row}"),
            TypeSource::CurrentModule,
            attributes,
            Vec::new(),
        ))
    }

    #[test]
    fn test_fullname() {
        let ty = test_type(1, 0);
        assert_eq!(ty.fullname(), "Test.Type1");

        let global = CilType::new(
            Token::from_parts(TABLE_TYPE_DEF, 2),
            "",
            "Global",
            TypeSource::CurrentModule,
            0,
            Vec::new(),
        );
        assert_eq!(global.fullname(), "Global");
    }

    #[test]
    fn test_serializable_flag_is_monotonic() {
        let ty = test_type(1, 0);
        assert!(!ty.is_serializable());

        ty.mark_serializable();
        assert!(ty.is_serializable());

        // marking twice keeps the flag set and changes nothing else
        let before = ty.attributes_raw();
        ty.mark_serializable();
        assert!(ty.is_serializable());
        assert_eq!(ty.attributes_raw(), before);
    }

    #[test]
    fn test_base_set_once() {
        let base = test_type(1, 0);
        let derived = test_type(2, 0);

        assert!(derived.base().is_none());
        derived.set_base(&base).unwrap();
        assert_eq!(derived.base().and_then(|b| b.token()), Some(base.token));
        assert!(derived.set_base(&base).is_err());
    }

    #[test]
    fn test_type_ref_weak_semantics() {
        let base = test_type(1, 0);
        let type_ref = CilTypeRef::new(&base);
        assert!(type_ref.is_valid());
        assert_eq!(type_ref.name().as_deref(), Some("Type1"));

        drop(base);
        assert!(!type_ref.is_valid());
        assert!(type_ref.upgrade().is_none());
    }

    #[test]
    fn test_sealed_and_serializable_bits() {
        let ty = test_type(1, 0x0100 | 0x2000);
        assert!(ty.is_sealed());
        assert!(ty.is_serializable());
        assert!(!ty.is_interface());
    }
}

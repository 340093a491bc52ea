//! Method nodes and their dispatch-control metadata.
//!
//! A [`CilMethod`] is the flat method record the dispatch normalizer reasons
//! over: identity, declaring-type back-reference, signature, a packed
//! attribute word, and an optional body. The attribute word is mutated in
//! place through named bit accessors only; no pass ever performs structural
//! changes to a method node.
//!
//! # Key Types
//! - [`CilMethod`] - A method record with dispatch bits and body
//! - [`MethodSignature`] - Return and parameter type signatures
//! - [`MethodBody`], [`LocalVariable`] - Executable body container
//! - [`MethodAccessFlags`], [`MethodVtableFlags`], [`MethodModifiers`] - Attribute flag groups

mod body;
mod types;

pub use body::{LocalVariable, MethodBody};
pub use types::{MethodAccessFlags, MethodModifiers, MethodVtableFlags};

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock, RwLock,
};

use crate::{
    metadata::{
        token::Token,
        typesystem::{CilTypeRc, CilTypeRef, TypeSignature},
    },
    Result,
};

/// A reference counted [`CilMethod`]
pub type MethodRc = Arc<CilMethod>;

/// Return and parameter types of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    /// Return type; [`TypeSignature::Void`] for void methods
    pub return_type: TypeSignature,
    /// Parameter types, in declaration order
    pub params: Vec<TypeSignature>,
}

impl MethodSignature {
    /// Creates a new method signature.
    #[must_use]
    pub fn new(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        Self {
            return_type,
            params,
        }
    }

    /// A zero-argument void signature.
    #[must_use]
    pub fn void() -> Self {
        Self::new(TypeSignature::Void, Vec::new())
    }

    /// Whether the method returns nothing.
    #[must_use]
    pub fn returns_void(&self) -> bool {
        self.return_type == TypeSignature::Void
    }

    /// Structural signature match: same parameter types and return type.
    ///
    /// Together with a name comparison this is the override/hide relation the
    /// dispatch normalizer checks between a method and its base-type
    /// counterpart.
    #[must_use]
    pub fn matches(&self, other: &MethodSignature) -> bool {
        self.return_type == other.return_type && self.params == other.params
    }
}

/// One method of the module model.
///
/// Created at module load (or synthesized by a weave); the attribute word and
/// the body are the only mutable pieces.
pub struct CilMethod {
    /// Metadata token of this method
    pub token: Token,
    /// Method name
    pub name: String,
    /// Declaring type back-reference, set when the method is attached
    declaring: OnceLock<CilTypeRef>,
    /// Method signature
    pub signature: MethodSignature,
    /// Packed ECMA-335 `MethodAttributes` word
    flags: AtomicU32,
    /// Executable body, absent for abstract and external methods
    body: RwLock<Option<MethodBody>>,
    /// Full names of custom attributes applied to this method
    pub custom_attributes: Vec<String>,
}

impl CilMethod {
    /// Creates a new method record without a body.
    ///
    /// # Arguments
    ///
    /// * `token` - Metadata token identifying the method
    /// * `name` - Method name
    /// * `signature` - Return and parameter types
    /// * `flags` - Raw `MethodAttributes` word as loaded from metadata
    /// * `custom_attributes` - Full names of applied custom attributes
    #[must_use]
    pub fn new(
        token: Token,
        name: impl Into<String>,
        signature: MethodSignature,
        flags: u32,
        custom_attributes: Vec<String>,
    ) -> Self {
        Self {
            token,
            name: name.into(),
            declaring: OnceLock::new(),
            signature,
            flags: AtomicU32::new(flags),
            body: RwLock::new(None),
            custom_attributes,
        }
    }

    /// Wire up the declaring-type back-reference. Called once, when the
    /// method is attached to its type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeError`] if a declaring type was already set.
    pub(crate) fn set_declaring(&self, declaring: &CilTypeRc) -> Result<()> {
        self.declaring
            .set(CilTypeRef::new(declaring))
            .map_err(|_| {
                crate::Error::TypeError(format!("declaring type of {} already set", self.token))
            })
    }

    /// The declaring type, if attached and still alive.
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring.get().and_then(CilTypeRef::upgrade)
    }

    /// The raw attribute word, for round-tripping back to metadata and for
    /// asserting that a method was left untouched.
    #[must_use]
    pub fn flags_raw(&self) -> u32 {
        self.flags.load(Ordering::Relaxed)
    }

    /// Member access of this method.
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags_raw())
    }

    /// Is this method publicly visible?
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access() == MethodAccessFlags::PUBLIC
    }

    /// Is this method static?
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Is this method virtual (dynamically dispatched)?
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.modifiers().contains(MethodModifiers::VIRTUAL)
    }

    /// Is this method final (sealed against overriding)?
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers().contains(MethodModifiers::FINAL)
    }

    /// Is this method abstract?
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers().contains(MethodModifiers::ABSTRACT)
    }

    /// Does this method take a new vtable slot (hide) rather than reuse the
    /// base slot (override)?
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        MethodVtableFlags::from_method_flags(self.flags_raw())
            .contains(MethodVtableFlags::NEW_SLOT)
    }

    /// Is this an instance or type constructor?
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Set or clear the virtual bit.
    pub fn set_virtual(&self, value: bool) {
        self.set_bits(MethodModifiers::VIRTUAL.bits(), value);
    }

    /// Set or clear the final (sealed) bit.
    pub fn set_final(&self, value: bool) {
        self.set_bits(MethodModifiers::FINAL.bits(), value);
    }

    /// Set or clear the new-slot bit. Clearing turns a hiding method into an
    /// overriding one.
    pub fn set_new_slot(&self, value: bool) {
        self.set_bits(MethodVtableFlags::NEW_SLOT.bits(), value);
    }

    /// Does this method have an executable body?
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.read().map(|b| b.is_some()).unwrap_or(false)
    }

    /// Attach or replace the method body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LockError`] if the body lock is poisoned.
    pub fn set_body(&self, body: MethodBody) -> Result<()> {
        let mut guard = self.body.write().map_err(|_| crate::Error::LockError)?;
        *guard = Some(body);
        Ok(())
    }

    /// Run a closure against the method body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BodyMissing`] if the method has no body, or
    /// [`crate::Error::LockError`] if the body lock is poisoned.
    pub fn with_body<R>(&self, f: impl FnOnce(&MethodBody) -> R) -> Result<R> {
        let guard = self.body.read().map_err(|_| crate::Error::LockError)?;
        match guard.as_ref() {
            Some(body) => Ok(f(body)),
            None => Err(crate::Error::BodyMissing(self.token)),
        }
    }

    /// Run a mutating closure against the method body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BodyMissing`] if the method has no body, or
    /// [`crate::Error::LockError`] if the body lock is poisoned.
    pub fn with_body_mut<R>(&self, f: impl FnOnce(&mut MethodBody) -> R) -> Result<R> {
        let mut guard = self.body.write().map_err(|_| crate::Error::LockError)?;
        match guard.as_mut() {
            Some(body) => Ok(f(body)),
            None => Err(crate::Error::BodyMissing(self.token)),
        }
    }

    /// Does this method carry a custom attribute with the given full name?
    #[must_use]
    pub fn has_custom_attribute(&self, fullname: &str) -> bool {
        self.custom_attributes.iter().any(|a| a == fullname)
    }

    fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags_raw())
    }

    fn set_bits(&self, mask: u32, value: bool) {
        if value {
            self.flags.fetch_or(mask, Ordering::Relaxed);
        } else {
            self.flags.fetch_and(!mask, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TABLE_METHOD_DEF;

    fn test_method(flags: u32) -> CilMethod {
        CilMethod::new(
            Token::from_parts(TABLE_METHOD_DEF, 1),
            "M",
            MethodSignature::void(),
            flags,
            Vec::new(),
        )
    }

    #[test]
    fn test_dispatch_bit_accessors() {
        // public virtual newslot
        let method = test_method(0x0006 | 0x0040 | 0x0100);
        assert!(method.is_public());
        assert!(method.is_virtual());
        assert!(method.is_new_slot());
        assert!(!method.is_final());
        assert!(!method.is_static());
    }

    #[test]
    fn test_bit_mutation_round_trip() {
        let method = test_method(0x0006);
        assert!(!method.is_virtual());

        method.set_virtual(true);
        method.set_new_slot(true);
        assert!(method.is_virtual());
        assert!(method.is_new_slot());

        method.set_new_slot(false);
        assert!(method.is_virtual());
        assert!(!method.is_new_slot());

        // access bits survive modifier mutation
        assert!(method.is_public());
    }

    #[test]
    fn test_constructor_recognition() {
        let ctor = CilMethod::new(
            Token::from_parts(TABLE_METHOD_DEF, 2),
            ".ctor",
            MethodSignature::void(),
            0x0006,
            Vec::new(),
        );
        assert!(ctor.is_constructor());
        assert!(!test_method(0x0006).is_constructor());
    }

    #[test]
    fn test_signature_matching() {
        let a = MethodSignature::new(TypeSignature::I4, vec![TypeSignature::String]);
        let b = MethodSignature::new(TypeSignature::I4, vec![TypeSignature::String]);
        let c = MethodSignature::new(TypeSignature::I4, vec![TypeSignature::I4]);

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_body_access_without_body() {
        let method = test_method(0x0006);
        assert!(!method.has_body());
        assert!(matches!(
            method.with_body(|_| ()),
            Err(crate::Error::BodyMissing(_))
        ));
    }
}

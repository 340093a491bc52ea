//! Method attribute flags for dispatch-control metadata.
//!
//! One packed ECMA-335 `MethodAttributes` word carries three logical groups:
//! member access, vtable layout, and modifiers. The groups are extracted
//! through masks, as the binary format defines them; passes never touch the
//! raw word directly and instead use the named accessors on
//! [`crate::metadata::method::CilMethod`].

use bitflags::bitflags;

/// Bitmask for `ACCESS` state extraction
pub const METHOD_ACCESS_MASK: u32 = 0x0007;
/// Bitmask for `VTABLE_LAYOUT` information extraction
pub const METHOD_VTABLE_LAYOUT_MASK: u32 = 0x0100;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method access flags
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract access flags from a raw method attribute word
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & METHOD_ACCESS_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method vtable layout flags
    pub struct MethodVtableFlags: u32 {
        /// Method reuses existing slot in vtable (overrides)
        const REUSE_SLOT = 0x0000;
        /// Method always gets a new slot in the vtable (hides)
        const NEW_SLOT = 0x0100;
    }
}

impl MethodVtableFlags {
    /// Extract vtable layout flags from a raw method attribute word
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & METHOD_VTABLE_LAYOUT_MASK)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
    }
}

impl MethodModifiers {
    /// Extract method modifiers from a raw method attribute word
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & !METHOD_ACCESS_MASK & !METHOD_VTABLE_LAYOUT_MASK)
    }
}

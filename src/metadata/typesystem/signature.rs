//! Type signatures for fields, parameters and return values.
//!
//! A [`TypeSignature`] is the immutable, tree-shaped description of a type as
//! it appears in a member signature: either a terminal (primitives, generic
//! parameters) or a composite that references other signatures and, at the
//! leaves, concrete types by token. The serializability walker traverses these
//! trees to discover every type reachable from a field.

use crate::metadata::token::Token;

/// Tagged union over the type shapes a member signature can carry.
///
/// Token-carrying variants ([`TypeSignature::Class`] and
/// [`TypeSignature::ValueType`]) may hold either a `TypeDef` token (a concrete
/// type of the current module) or a `TypeRef` token (an indirect reference
/// that the registry resolves to a concrete type, possibly in another
/// module). Everything else is structural.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    /// Not defined
    #[default]
    Unknown,
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// CIL reference type, identified by a `TypeDef` or `TypeRef` token
    Class(Token),
    /// CIL value type, identified by a `TypeDef` or `TypeRef` token
    ValueType(Token),
    /// Generic type parameter, by index into the declaring type's parameter list
    GenericParam(u32),
    /// Generic type instantiation: element type plus ordered type arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Single-dimensional array with zero lower bound
    SzArray(Box<TypeSignature>),
    /// Multi-dimensional array: element type and rank
    Array(Box<TypeSignature>, u32),
    /// Type passed by reference
    ByRef(Box<TypeSignature>),
    /// Unmanaged pointer to a type
    Ptr(Box<TypeSignature>),
}

impl TypeSignature {
    /// Check if this signature is a primitive/intrinsic terminal.
    ///
    /// Primitives never contribute edges to a closure walk.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSignature::Void
                | TypeSignature::Boolean
                | TypeSignature::Char
                | TypeSignature::I1
                | TypeSignature::U1
                | TypeSignature::I2
                | TypeSignature::U2
                | TypeSignature::I4
                | TypeSignature::U4
                | TypeSignature::I8
                | TypeSignature::U8
                | TypeSignature::R4
                | TypeSignature::R8
                | TypeSignature::I
                | TypeSignature::U
                | TypeSignature::String
                | TypeSignature::Object
        )
    }

    /// Returns the type token if this signature directly references a type.
    #[must_use]
    pub fn type_token(&self) -> Option<Token> {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => Some(*token),
            _ => None,
        }
    }
}

//! Metadata tokens for cross-references and stable ordering.

use std::fmt;

/// A metadata token identifying an element of the module being woven.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// Every node in the module model (types, fields, methods) carries exactly one
/// token, and tokens are the identities the weaving passes key their visited
/// sets and ordering guarantees on. Iterating a token-keyed collection yields
/// a stable, deterministic order across runs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

/// Table identifier for `TypeRef` tokens (indirect type references).
pub const TABLE_TYPE_REF: u8 = 0x01;
/// Table identifier for `TypeDef` tokens (types defined in a module).
pub const TABLE_TYPE_DEF: u8 = 0x02;
/// Table identifier for `Field` tokens.
pub const TABLE_FIELD: u8 = 0x04;
/// Table identifier for `MethodDef` tokens.
pub const TABLE_METHOD_DEF: u8 = 0x06;

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table identifier and a row index.
    ///
    /// Only the low 24 bits of `row` are significant.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this token references the `TypeRef` table.
    #[must_use]
    pub fn is_type_ref(&self) -> bool {
        self.table() == TABLE_TYPE_REF
    }

    /// Returns true if this token references the `TypeDef` table.
    #[must_use]
    pub fn is_type_def(&self) -> bool {
        self.table() == TABLE_TYPE_DEF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(0x{:08X})", self.0)
    }
}

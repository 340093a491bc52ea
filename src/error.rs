use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Weaving distinguishes two failure regimes: structural impossibilities in the module
/// model surface here and abort the current pass, while policy violations are recorded
/// through [`crate::metadata::diagnostics`] and never raise an `Error`.
///
/// # Error Categories
///
/// ## Module Model Errors
/// - [`Error::Malformed`] - Inconsistent or invalid module structure
/// - [`Error::TypeNotFound`] - Requested type not present in the type registry
/// - [`Error::TypeInsert`] - Failed to register a new type in the registry
/// - [`Error::TypeError`] - General type system operation error
///
/// ## Method and Body Errors
/// - [`Error::MethodNotFound`] - Requested method not present in the module
/// - [`Error::BodyMissing`] - Operation required a method body that does not exist
/// - [`Error::SequenceNotFound`] - Instruction block has no sequence with the given label
///
/// ## Synchronization Errors
/// - [`Error::LockError`] - Poisoned lock on a shared node
#[derive(Error, Debug)]
pub enum Error {
    /// The module model is damaged or internally inconsistent.
    ///
    /// The error carries the source location where the malformation was
    /// detected, for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to find a type in the registry.
    ///
    /// This is the "structural impossibility" case of the weaving error
    /// taxonomy: a signature references a type token that the module model
    /// cannot resolve. Aborts the pass that hit it.
    ///
    /// The associated [`Token`] identifies which type was not found.
    #[error("Failed to find type in registry - {0}")]
    TypeNotFound(Token),

    /// Failed to insert a new type into the registry.
    ///
    /// Typically caused by a conflicting metadata token.
    #[error("Failed to insert new type into registry - {0}")]
    TypeInsert(Token),

    /// General error during type system usage.
    #[error("{0}")]
    TypeError(String),

    /// Failed to find a method in the module.
    ///
    /// The associated [`Token`] identifies which method was not found.
    #[error("Failed to find method - {0}")]
    MethodNotFound(Token),

    /// An operation required a method body, but the method has none.
    ///
    /// The associated [`Token`] identifies the body-less method.
    #[error("Method has no body - {0}")]
    BodyMissing(Token),

    /// An instruction block contains no sequence with the requested label.
    #[error("No instruction sequence with label {0}")]
    SequenceNotFound(u32),

    /// Failed to lock target.
    ///
    /// A shared node's lock was poisoned by a panicking writer.
    #[error("Failed to lock target")]
    LockError,
}

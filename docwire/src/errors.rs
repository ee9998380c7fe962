use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for codec operations
///
/// Each kind names one category of failure so callers can tell a setup defect
/// (an unregistered leaf codec) apart from a data defect (malformed bytes) or a
/// precondition violation (asking for the `_id` of a document without one).
///
/// # Examples
///
/// ```rust,ignore
/// use docwire::errors::{DocwireError, ErrorKind, DocwireResult};
///
/// fn example() -> DocwireResult<()> {
///     Err(DocwireError::new("No codec registered for Decimal128", ErrorKind::CodecConfigurationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Configuration Errors
    /// No leaf codec is registered for a value type, or no default type is
    /// mapped for a wire type tag
    CodecConfigurationError,

    // Input Errors
    /// The byte stream is truncated, carries an unknown tag, a bad length or a
    /// missing terminator
    MalformedInput,

    // Identifier Errors
    /// The document has no `_id` field
    MissingIdentifier,

    // Operation Errors
    /// A reader or writer was driven out of order
    InvalidOperation,

    // Data Errors
    /// A value of an unexpected variant was handed to a leaf codec
    InvalidDataType,
    /// Error encoding or decoding text data
    EncodingError,
    /// Error mapping a value to or from an external representation
    ObjectMappingError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CodecConfigurationError => write!(f, "Codec configuration error"),
            ErrorKind::MalformedInput => write!(f, "Malformed input"),
            ErrorKind::MissingIdentifier => write!(f, "Missing identifier"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
        }
    }
}

/// Custom codec error type.
///
/// `DocwireError` carries the error message, its kind and an optional cause.
/// A backtrace is captured when the error is created.
///
/// # Examples
///
/// ```rust,ignore
/// use docwire::errors::{DocwireError, ErrorKind};
///
/// let err = DocwireError::new("Unexpected end of document", ErrorKind::MalformedInput);
///
/// let cause = DocwireError::new("Length prefix overruns the input", ErrorKind::MalformedInput);
/// let err = DocwireError::new_with_cause("Could not decode document", ErrorKind::MalformedInput, cause);
/// ```
#[derive(Clone)]
pub struct DocwireError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocwireError>>,
    backtrace: Atomic<Backtrace>,
}

impl DocwireError {
    /// Creates a new `DocwireError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocwireError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DocwireError` that wraps the error which caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocwireError) -> Self {
        DocwireError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocwireError> {
        self.cause.as_deref()
    }
}

impl Display for DocwireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocwireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DocwireError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for codec operations.
pub type DocwireResult<T> = Result<T, DocwireError>;

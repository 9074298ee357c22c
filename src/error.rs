//! Error types for JSON encoding.
//!
//! Encoding is lenient by default: values with no JSON representation (for
//! example function pointers) encode to nothing rather than failing. The
//! errors below are the only ways an encode can abort.
//!
//! ## Error Categories
//!
//! - **Marshaler failures**: a registered encoder or a capability
//!   ([`AppendJson`](crate::AppendJson), [`MarshalJson`](crate::MarshalJson),
//!   [`MarshalText`](crate::MarshalText)) returned an error
//! - **Invalid numbers**: a [`RawNumber`](crate::RawNumber) holds text that is
//!   not JSON number syntax
//! - **Invalid JSON**: a capability produced malformed JSON while validation
//!   was requested
//! - **I/O Errors**: writing to the output sink failed
//!
//! When an error is returned, whatever was already appended to the destination
//! buffer is incomplete and must not be used.
//!
//! ## Examples
//!
//! ```rust
//! use jsonplan::{to_vec, Error, RawNumber};
//!
//! let result = to_vec(&RawNumber::new("12abc"));
//! assert!(matches!(result, Err(Error::InvalidNumber(_))));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while writing encoded output
    #[error("IO error: {0}")]
    Io(String),

    /// A custom encoder or capability method failed
    #[error("error calling {method} for type {type_name}: {msg}")]
    Marshaler {
        type_name: &'static str,
        method: &'static str,
        msg: String,
    },

    /// A raw number literal is not valid JSON number syntax
    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),

    /// A capability produced bytes that are not a single JSON value
    #[error("invalid JSON produced for type {type_name}: {msg}")]
    InvalidJson { type_name: &'static str, msg: String },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a marshaler error for a failed capability or registered encoder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonplan::Error;
    ///
    /// let err = Error::marshaler("Celsius", "marshal_text", "out of range");
    /// assert!(err.to_string().contains("marshal_text"));
    /// ```
    pub fn marshaler<T: fmt::Display>(type_name: &'static str, method: &'static str, msg: T) -> Self {
        Error::Marshaler {
            type_name,
            method,
            msg: msg.to_string(),
        }
    }

    /// Creates an invalid number error for a malformed raw literal.
    pub fn invalid_number(literal: &str) -> Self {
        Error::InvalidNumber(literal.to_string())
    }

    /// Creates an invalid JSON error for malformed capability output.
    pub fn invalid_json<T: fmt::Display>(type_name: &'static str, msg: T) -> Self {
        Error::InvalidJson {
            type_name,
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonplan::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

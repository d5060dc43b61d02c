#![warn(missing_docs)]
//! This library wraps [rcgen] and [x509_parser] to provide the pieces of a
//! small, single-shot PKI tool: creating self-signed root CAs, generating
//! certificate signing requests, signing them with a CA key, converting
//! material between PEM and DER and printing certificate details.
//!
//! Every operation reads its inputs, builds a template, calls into the
//! crypto backend and hands the encoded result back to the caller, which
//! decides where to write it.

pub mod cert;
mod error;
pub mod format;
pub mod inspect;
pub mod logging;
pub mod name;
pub mod prompt;

pub use error::Error;

/// A specialized `Result` type.
pub type Result<T> = std::result::Result<T, Error>;

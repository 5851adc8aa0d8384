use crate::Error;
use std::fmt::{self, Display};

/// Classification of the failures raised by the client itself.
///
/// Transport and server errors coming out of a [`Backend`](crate::Backend) carry no
/// kind, they are propagated unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input is invalid for the current schema. Fix the input and retry.
    Programming,
    /// The server reported a shape that cannot happen.
    Internal,
    /// The operation is not supported by this client (two-phase commit, isolation levels).
    NotSupported,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Programming => "Programming error",
            ErrorKind::Internal => "Internal error",
            ErrorKind::NotSupported => "Not supported",
        })
    }
}

/// Typed error stored inside an [`Error`], recover it with [`error_kind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn client_error(kind: ErrorKind, message: impl Into<String>) -> Error {
    let error = Error::new(ClientError::new(kind, message));
    log::error!("{:#}", error);
    error
}

pub fn programming_error(message: impl Into<String>) -> Error {
    client_error(ErrorKind::Programming, message)
}

pub fn internal_error(message: impl Into<String>) -> Error {
    client_error(ErrorKind::Internal, message)
}

pub fn not_supported(message: impl Into<String>) -> Error {
    client_error(ErrorKind::NotSupported, message)
}

/// Kind of the first [`ClientError`] found in the chain of `error`, contexts included.
pub fn error_kind(error: &Error) -> Option<ErrorKind> {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ClientError>())
        .map(|e| e.kind)
}

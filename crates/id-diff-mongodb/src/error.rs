//! Mapping of MongoDB driver errors onto source errors.

use std::io;

use id_diff::SourceError;
use mongodb::error::{Error as MongoError, ErrorKind};
use thiserror::Error;

/// Server error codes that mean the credentials were not accepted.
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
/// `maxTimeMS` expired on the server.
const MAX_TIME_MS_EXPIRED: i32 = 50;

/// Invalid `db.collection` namespace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("namespace '{0}' must have the form <database>.<collection>")]
    Malformed(String),

    #[error("namespace '{0}' has an empty database name")]
    EmptyDatabase(String),

    #[error("namespace '{0}' has an empty collection name")]
    EmptyCollection(String),
}

impl From<NamespaceError> for SourceError {
    fn from(err: NamespaceError) -> Self {
        SourceError::Config(err.to_string())
    }
}

/// Classify a driver error raised while talking to `endpoint`.
pub fn classify(endpoint: &str, err: MongoError) -> SourceError {
    let endpoint = endpoint.to_string();
    match err.kind.as_ref() {
        ErrorKind::Authentication { message, .. } => SourceError::Authentication {
            endpoint,
            message: message.clone(),
        },
        ErrorKind::ServerSelection { message, .. } => SourceError::Connection {
            endpoint,
            message: message.clone(),
        },
        ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::TimedOut => {
            SourceError::Timeout(format!("{endpoint}: {io_err}"))
        }
        ErrorKind::Io(io_err) => SourceError::Connection {
            endpoint,
            message: io_err.to_string(),
        },
        ErrorKind::ConnectionPoolCleared { message, .. } => SourceError::Connection {
            endpoint,
            message: message.clone(),
        },
        ErrorKind::Command(command) => match command.code {
            UNAUTHORIZED | AUTHENTICATION_FAILED => SourceError::Authentication {
                endpoint,
                message: command.message.clone(),
            },
            MAX_TIME_MS_EXPIRED => SourceError::Timeout(format!("{endpoint}: {}", command.message)),
            _ => SourceError::Read(format!("{endpoint}: {}", command.message)),
        },
        ErrorKind::InvalidArgument { message, .. } => {
            SourceError::Config(format!("{endpoint}: {message}"))
        }
        _ => SourceError::Read(format!("{endpoint}: {err}")),
    }
}

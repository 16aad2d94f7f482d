//! Error type shared by the connection and the public client API.

use std::path::PathBuf;

use icm_core::{MessageType, ProtocolError, ReplyError, ReplyKind};
use thiserror::Error;

use crate::infrastructure::config::ConfigError;

/// Errors returned by [`crate::IcmClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The compositor socket could not be opened.
    #[error("failed to connect to compositor at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The connection closed before the operation could complete.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation needs a connection and `connect()` has not been called.
    #[error("not connected")]
    NotConnected,

    /// A reply arrived but could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The message passed as a query expects no reply.
    #[error("{0:?} is not a query")]
    NotAQuery(MessageType),

    /// A query was answered with a reply of a different kind.
    #[error("expected a {expected:?} reply, got {actual:?}")]
    UnexpectedReply {
        expected: ReplyKind,
        actual: ReplyKind,
    },

    /// A mesh's vertex list does not match its declared grid.
    #[error("mesh of {width}x{height} needs {expected} vertices, got {actual}")]
    MeshSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

impl From<ReplyError> for ClientError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionClosed => ClientError::ConnectionClosed,
            ReplyError::Decode(e) => ClientError::Protocol(e),
        }
    }
}

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::io;

/// A failure raised by the remote-invocation layer itself, as distinct from
/// an application failure raised by the server object it carries calls to
/// (spec.md "Transport error" in the error taxonomy). Never serialized onto
/// the wire; it is always synthesized locally by the stub or skeleton.
#[derive(Debug, Display, Error, From)]
pub enum TransportError {
    #[display(fmt = "failed to connect to {_0}")]
    Connect(#[error(not(source))] std::net::SocketAddr),

    #[display(fmt = "io error: {_0}")]
    Io(io::Error),

    #[display(fmt = "connection closed before a complete reply was received")]
    ConnectionClosed,

    #[display(fmt = "protocol violation: {_0}")]
    Protocol(#[error(not(source))] String),
}

/// A remote-failure descriptor: what the wire actually carries when the
/// server object's call raised an application error rather than returning a
/// value. Reconstructed into an equivalent local error by the caller.
#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, Eq)]
#[display(fmt = "{kind}: {message}")]
pub struct RemoteFailure {
    pub kind: String,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// The error every stub method returns: either the invocation layer failed
/// outright, or it succeeded and the server object reported an application
/// failure.
#[derive(Debug, Display, Error, From)]
pub enum CallError {
    #[display(fmt = "{_0}")]
    Transport(TransportError),

    #[display(fmt = "{_0}")]
    Remote(#[error(not(source))] RemoteFailure),
}

use derive_more::{Display, Error};
use rpcfs_net::RemoteFailure;

/// The application-level failure taxonomy from spec.md §7, reconstructed
/// locally from a [`RemoteFailure`] descriptor the way distant's client
/// turns a `distant_core::data::Error` reply back into a local
/// `std::io::Error`.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum FsError {
    #[display(fmt = "not found: {_0}")]
    NotFound(#[error(not(source))] String),

    #[display(fmt = "out of range: {_0}")]
    OutOfRange(#[error(not(source))] String),

    #[display(fmt = "already registered: {_0}")]
    AlreadyRegistered(#[error(not(source))] String),

    #[display(fmt = "{_0}")]
    Other(#[error(not(source))] String),
}

impl FsError {
    fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound(_) => "not_found",
            FsError::OutOfRange(_) => "out_of_range",
            FsError::AlreadyRegistered(_) => "already_registered",
            FsError::Other(_) => "other",
        }
    }

    fn message(&self) -> &str {
        match self {
            FsError::NotFound(m)
            | FsError::OutOfRange(m)
            | FsError::AlreadyRegistered(m)
            | FsError::Other(m) => m,
        }
    }
}

impl From<FsError> for RemoteFailure {
    fn from(err: FsError) -> Self {
        RemoteFailure::new(err.kind(), err.message())
    }
}

impl From<RemoteFailure> for FsError {
    fn from(failure: RemoteFailure) -> Self {
        match failure.kind.as_str() {
            "not_found" => FsError::NotFound(failure.message),
            "out_of_range" => FsError::OutOfRange(failure.message),
            "already_registered" => FsError::AlreadyRegistered(failure.message),
            _ => FsError::Other(failure.message),
        }
    }
}

/// What a stub call against one of this system's four remote interfaces
/// returns: either the invocation layer failed (never retried, surfaced as
/// distinct from an application failure per spec.md §7), or the call
/// completed and the server object reported an [`FsError`].
pub type CallResult<T> = Result<T, FsCallError>;

#[derive(Debug, Display, Error)]
pub enum FsCallError {
    #[display(fmt = "{_0}")]
    Transport(rpcfs_net::TransportError),

    #[display(fmt = "{_0}")]
    Remote(#[error(not(source))] FsError),
}

impl From<rpcfs_net::CallError> for FsCallError {
    fn from(err: rpcfs_net::CallError) -> Self {
        match err {
            rpcfs_net::CallError::Transport(t) => FsCallError::Transport(t),
            rpcfs_net::CallError::Remote(r) => FsCallError::Remote(FsError::from(r)),
        }
    }
}

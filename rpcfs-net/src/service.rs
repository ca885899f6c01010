use crate::RemoteFailure;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io;

/// A server object exposing one remote interface. `Request`/`Response` are
/// the per-interface payload enums defined by `rpcfs-common`; `dispatch` is
/// the application logic a [`crate::Skeleton`] invokes for each decoded call.
///
/// The three extension hooks below default to the policy spec.md calls for
/// and mirror `distant-net`'s `stopped`/`listen_error`/`service_error`
/// skeleton hooks, expressed here as overridable trait methods rather than
/// virtual dispatch on a base class.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    /// Stable name identifying this remote interface, used for stub
    /// equality/`Display` and recovered on the wire from [`crate::RemoteRef`].
    const INTERFACE: &'static str;

    /// Handles one decoded call. An `Err` here becomes a [`RemoteFailure`]
    /// reply, never a transport error.
    async fn dispatch(&self, request: Self::Request) -> Result<Self::Response, RemoteFailure>;

    /// Invoked exactly once after the skeleton stops, carrying `None` for a
    /// clean `stop()` or `Some(cause)` if the listener terminated on its own.
    fn stopped(&self, _cause: Option<&io::Error>) {}

    /// Invoked when the listener's `accept()` call fails. Returning `true`
    /// resumes listening; the default policy is to stop.
    fn listen_error(&self, err: &io::Error) -> bool {
        log::error!("listener error, stopping: {err}");
        false
    }

    /// Invoked when a connection worker fails to decode, dispatch, or write
    /// a reply. The connection is always closed regardless of return value.
    fn service_error(&self, err: &io::Error) {
        log::warn!("connection worker error: {err}");
    }
}

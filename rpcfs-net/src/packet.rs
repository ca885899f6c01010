use crate::RemoteFailure;
use serde::{Deserialize, Serialize};

/// Unique id associated with a request or response, following distant-net's
/// convention of a random string rather than a sequence counter (so ids stay
/// unique across independently-dialed connections with no shared state).
pub type Id = String;

fn new_id() -> Id {
    rand::random::<u64>().to_string()
}

/// A call frame: a method identifier (carried by `T`, the per-interface
/// request enum) plus a unique id used only for logging/debugging, since
/// this protocol has exactly one call in flight per connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request<T> {
    pub id: Id,
    pub payload: T,
}

impl<T> Request<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: new_id(),
            payload,
        }
    }
}

/// A reply frame: either the call's return value or a [`RemoteFailure`]
/// descriptor reconstructable into an equivalent local application error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response<T> {
    pub id: Id,
    pub origin_id: Id,
    pub payload: Result<T, RemoteFailure>,
}

impl<T> Response<T> {
    pub fn new(origin_id: Id, payload: Result<T, RemoteFailure>) -> Self {
        Self {
            id: new_id(),
            origin_id,
            payload,
        }
    }
}

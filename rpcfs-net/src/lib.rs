//! Remote-invocation runtime shared by the naming server and storage servers.
//!
//! This crate is the "hard part" described as C2-C4 in the system design: a
//! length-prefixed MessagePack wire codec, a multithreaded (task-per-connection)
//! [`Skeleton`] that dispatches decoded calls to a server object, and a
//! [`Stub`]-building helper that ships calls to a bound address and turns a
//! remote failure back into a local error.
//!
//! Interfaces are plain Rust traits whose methods return `Result<T, CallError>`;
//! unlike the dynamically-dispatched proxies this runtime is modeled on, the
//! "every method can fail with a transport error" rule is therefore enforced by
//! the type system rather than validated at construction time.

mod error;
mod frame;
mod packet;
mod service;
mod skeleton;
mod stub;
mod transport;
mod utils;

pub use error::{CallError, RemoteFailure, TransportError};
pub use frame::Frame;
pub use packet::{Id, Request, Response};
pub use service::Service;
pub use skeleton::{Skeleton, SkeletonState};
pub use stub::{RemoteRef, WireInterface};

/// Re-exported so downstream crates can build request/response payloads
/// without taking a direct dependency on the serialization backend.
pub use serde;

//! Shared [`Path`] type, the four remote-interface definitions (C2's
//! request/response payloads), and the application error taxonomy used by
//! both the naming server and every storage server.
//!
//! This crate sits directly on top of `rpcfs-net`'s generic `Service`/
//! `RemoteRef`: `protocol` declares the wire payloads, `storage` and
//! `naming` adapt them into typed handler traits (server side) and stub
//! extension traits (client side) so callers never construct a raw request
//! enum by hand.

mod error;
mod naming;
mod path;
mod protocol;
mod storage;

pub use error::{CallResult, FsCallError, FsError};
pub use naming::{
    ClientService, ClientServiceHandler, ClientServiceStub, RegistrationHandler,
    RegistrationService, RegistrationStub,
};
pub use path::{InvalidPath, Path};
pub use protocol::{
    ClientHandle, ClientServiceRequest, ClientServiceResponse, CommandHandle, RegistrationHandle,
    RegistrationRequest, RegistrationResponse, StorageAccessRequest, StorageAccessResponse,
    StorageCommandRequest, StorageCommandResponse, StorageHandle,
};
pub use storage::{
    StorageAccessHandler, StorageAccessService, StorageAccessStub, StorageCommandHandler,
    StorageCommandService, StorageCommandStub,
};

use crate::path::Path;
use rpcfs_net::{RemoteRef, WireInterface};
use serde::{Deserialize, Serialize};

/// Byte-I/O interface (spec.md §4.5) exposed by every storage server.
pub type StorageHandle = RemoteRef<StorageAccessRequest>;

/// Command interface (spec.md §4.5) exposed by every storage server.
pub type CommandHandle = RemoteRef<StorageCommandRequest>;

/// Client service interface (spec.md §4.7) exposed by the naming server.
pub type ClientHandle = RemoteRef<ClientServiceRequest>;

/// Registration interface (spec.md §4.7) exposed by the naming server.
pub type RegistrationHandle = RemoteRef<RegistrationRequest>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StorageAccessRequest {
    Size { path: Path },
    Read { path: Path, offset: i64, length: i64 },
    Write { path: Path, offset: i64, data: Vec<u8> },
}

impl WireInterface for StorageAccessRequest {
    const WIRE_INTERFACE_NAME: &'static str = "StorageAccess";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StorageAccessResponse {
    Size(u64),
    Read(Vec<u8>),
    Write,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StorageCommandRequest {
    Create { path: Path },
    Delete { path: Path },
}

impl WireInterface for StorageCommandRequest {
    const WIRE_INTERFACE_NAME: &'static str = "StorageCommand";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StorageCommandResponse {
    Create(bool),
    Delete(bool),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ClientServiceRequest {
    IsDirectory { path: Path },
    List { dir: Path },
    CreateFile { path: Path },
    CreateDirectory { path: Path },
    Delete { path: Path },
    GetStorage { path: Path },
}

impl WireInterface for ClientServiceRequest {
    const WIRE_INTERFACE_NAME: &'static str = "ClientService";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ClientServiceResponse {
    IsDirectory(bool),
    List(Vec<String>),
    CreateFile(bool),
    CreateDirectory(bool),
    Delete(bool),
    GetStorage(StorageHandle),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegistrationRequest {
    Register {
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    },
}

impl WireInterface for RegistrationRequest {
    const WIRE_INTERFACE_NAME: &'static str = "Registration";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RegistrationResponse {
    Register(Vec<Path>),
}

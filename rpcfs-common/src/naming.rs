use crate::error::{CallResult, FsCallError, FsError};
use crate::path::Path;
use crate::protocol::{
    ClientHandle, ClientServiceRequest, ClientServiceResponse, CommandHandle, RegistrationHandle,
    RegistrationRequest, RegistrationResponse, StorageHandle,
};
use async_trait::async_trait;
use rpcfs_net::{RemoteFailure, Service};
use std::sync::Arc;

/// Server-side implementation of the naming server's client service
/// interface (spec.md §4.7).
#[async_trait]
pub trait ClientServiceHandler: Send + Sync + 'static {
    async fn is_directory(&self, path: Path) -> Result<bool, FsError>;
    async fn list(&self, dir: Path) -> Result<Vec<String>, FsError>;
    async fn create_file(&self, path: Path) -> Result<bool, FsError>;
    async fn create_directory(&self, path: Path) -> Result<bool, FsError>;
    async fn delete(&self, path: Path) -> Result<bool, FsError>;
    async fn get_storage(&self, path: Path) -> Result<StorageHandle, FsError>;
}

pub struct ClientService<H>(pub Arc<H>);

#[async_trait]
impl<H: ClientServiceHandler> Service for ClientService<H> {
    type Request = ClientServiceRequest;
    type Response = ClientServiceResponse;
    const INTERFACE: &'static str = "ClientService";

    async fn dispatch(&self, request: Self::Request) -> Result<Self::Response, RemoteFailure> {
        let result = match request {
            ClientServiceRequest::IsDirectory { path } => self
                .0
                .is_directory(path)
                .await
                .map(ClientServiceResponse::IsDirectory),
            ClientServiceRequest::List { dir } => {
                self.0.list(dir).await.map(ClientServiceResponse::List)
            }
            ClientServiceRequest::CreateFile { path } => self
                .0
                .create_file(path)
                .await
                .map(ClientServiceResponse::CreateFile),
            ClientServiceRequest::CreateDirectory { path } => self
                .0
                .create_directory(path)
                .await
                .map(ClientServiceResponse::CreateDirectory),
            ClientServiceRequest::Delete { path } => {
                self.0.delete(path).await.map(ClientServiceResponse::Delete)
            }
            ClientServiceRequest::GetStorage { path } => self
                .0
                .get_storage(path)
                .await
                .map(ClientServiceResponse::GetStorage),
        };
        result.map_err(RemoteFailure::from)
    }
}

/// Server-side implementation of the naming server's registration interface
/// (spec.md §4.7).
#[async_trait]
pub trait RegistrationHandler: Send + Sync + 'static {
    async fn register(
        &self,
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, FsError>;
}

pub struct RegistrationService<H>(pub Arc<H>);

#[async_trait]
impl<H: RegistrationHandler> Service for RegistrationService<H> {
    type Request = RegistrationRequest;
    type Response = RegistrationResponse;
    const INTERFACE: &'static str = "Registration";

    async fn dispatch(&self, request: Self::Request) -> Result<Self::Response, RemoteFailure> {
        let RegistrationRequest::Register {
            storage,
            command,
            paths,
        } = request;
        self.0
            .register(storage, command, paths)
            .await
            .map(RegistrationResponse::Register)
            .map_err(RemoteFailure::from)
    }
}

/// Client-side convenience methods for a [`ClientHandle`].
#[async_trait]
pub trait ClientServiceStub {
    async fn is_directory(&self, path: Path) -> CallResult<bool>;
    async fn list(&self, dir: Path) -> CallResult<Vec<String>>;
    async fn create_file(&self, path: Path) -> CallResult<bool>;
    async fn create_directory(&self, path: Path) -> CallResult<bool>;
    async fn delete(&self, path: Path) -> CallResult<bool>;
    async fn get_storage(&self, path: Path) -> CallResult<StorageHandle>;
}

#[async_trait]
impl ClientServiceStub for ClientHandle {
    async fn is_directory(&self, path: Path) -> CallResult<bool> {
        match self.call(ClientServiceRequest::IsDirectory { path }).await? {
            ClientServiceResponse::IsDirectory(v) => Ok(v),
            other => unexpected(other),
        }
    }

    async fn list(&self, dir: Path) -> CallResult<Vec<String>> {
        match self.call(ClientServiceRequest::List { dir }).await? {
            ClientServiceResponse::List(names) => Ok(names),
            other => unexpected(other),
        }
    }

    async fn create_file(&self, path: Path) -> CallResult<bool> {
        match self.call(ClientServiceRequest::CreateFile { path }).await? {
            ClientServiceResponse::CreateFile(v) => Ok(v),
            other => unexpected(other),
        }
    }

    async fn create_directory(&self, path: Path) -> CallResult<bool> {
        match self
            .call(ClientServiceRequest::CreateDirectory { path })
            .await?
        {
            ClientServiceResponse::CreateDirectory(v) => Ok(v),
            other => unexpected(other),
        }
    }

    async fn delete(&self, path: Path) -> CallResult<bool> {
        match self.call(ClientServiceRequest::Delete { path }).await? {
            ClientServiceResponse::Delete(v) => Ok(v),
            other => unexpected(other),
        }
    }

    async fn get_storage(&self, path: Path) -> CallResult<StorageHandle> {
        match self.call(ClientServiceRequest::GetStorage { path }).await? {
            ClientServiceResponse::GetStorage(handle) => Ok(handle),
            other => unexpected(other),
        }
    }
}

fn unexpected<T>(response: ClientServiceResponse) -> CallResult<T> {
    Err(FsCallError::Remote(FsError::Other(format!(
        "unexpected response variant: {response:?}"
    ))))
}

/// Client-side convenience method for a [`RegistrationHandle`], used by a
/// storage server joining the cluster at startup.
#[async_trait]
pub trait RegistrationStub {
    async fn register(
        &self,
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    ) -> CallResult<Vec<Path>>;
}

#[async_trait]
impl RegistrationStub for RegistrationHandle {
    async fn register(
        &self,
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    ) -> CallResult<Vec<Path>> {
        match self
            .call(RegistrationRequest::Register {
                storage,
                command,
                paths,
            })
            .await?
        {
            RegistrationResponse::Register(to_delete) => Ok(to_delete),
        }
    }
}

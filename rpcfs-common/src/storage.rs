use crate::error::{CallResult, FsError};
use crate::path::Path;
use crate::protocol::{
    CommandHandle, StorageAccessRequest, StorageAccessResponse, StorageCommandRequest,
    StorageCommandResponse, StorageHandle,
};
use async_trait::async_trait;
use rpcfs_net::{RemoteFailure, Service};
use std::sync::Arc;

/// Server-side implementation of the byte-I/O interface (spec.md §4.5).
/// A storage server implements this once; [`StorageAccessService`] adapts it
/// to [`rpcfs_net::Service`] for use with a [`rpcfs_net::Skeleton`].
#[async_trait]
pub trait StorageAccessHandler: Send + Sync + 'static {
    async fn size(&self, path: Path) -> Result<u64, FsError>;
    async fn read(&self, path: Path, offset: i64, length: i64) -> Result<Vec<u8>, FsError>;
    async fn write(&self, path: Path, offset: i64, data: Vec<u8>) -> Result<(), FsError>;
}

pub struct StorageAccessService<H>(pub Arc<H>);

#[async_trait]
impl<H: StorageAccessHandler> Service for StorageAccessService<H> {
    type Request = StorageAccessRequest;
    type Response = StorageAccessResponse;
    const INTERFACE: &'static str = "StorageAccess";

    async fn dispatch(&self, request: Self::Request) -> Result<Self::Response, RemoteFailure> {
        let result = match request {
            StorageAccessRequest::Size { path } => {
                self.0.size(path).await.map(StorageAccessResponse::Size)
            }
            StorageAccessRequest::Read {
                path,
                offset,
                length,
            } => self
                .0
                .read(path, offset, length)
                .await
                .map(StorageAccessResponse::Read),
            StorageAccessRequest::Write { path, offset, data } => self
                .0
                .write(path, offset, data)
                .await
                .map(|()| StorageAccessResponse::Write),
        };
        result.map_err(RemoteFailure::from)
    }
}

/// Server-side implementation of the command interface (spec.md §4.5).
#[async_trait]
pub trait StorageCommandHandler: Send + Sync + 'static {
    async fn create(&self, path: Path) -> Result<bool, FsError>;
    async fn delete(&self, path: Path) -> Result<bool, FsError>;
}

pub struct StorageCommandService<H>(pub Arc<H>);

#[async_trait]
impl<H: StorageCommandHandler> Service for StorageCommandService<H> {
    type Request = StorageCommandRequest;
    type Response = StorageCommandResponse;
    const INTERFACE: &'static str = "StorageCommand";

    async fn dispatch(&self, request: Self::Request) -> Result<Self::Response, RemoteFailure> {
        let result = match request {
            StorageCommandRequest::Create { path } => self
                .0
                .create(path)
                .await
                .map(StorageCommandResponse::Create),
            StorageCommandRequest::Delete { path } => self
                .0
                .delete(path)
                .await
                .map(StorageCommandResponse::Delete),
        };
        result.map_err(RemoteFailure::from)
    }
}

/// Client-side convenience methods for a [`StorageHandle`], mirroring the
/// generated-proxy ergonomics spec.md describes for C4 stubs.
#[async_trait]
pub trait StorageAccessStub {
    async fn size(&self, path: Path) -> CallResult<u64>;
    async fn read(&self, path: Path, offset: i64, length: i64) -> CallResult<Vec<u8>>;
    async fn write(&self, path: Path, offset: i64, data: Vec<u8>) -> CallResult<()>;
}

#[async_trait]
impl StorageAccessStub for StorageHandle {
    async fn size(&self, path: Path) -> CallResult<u64> {
        match self.call(StorageAccessRequest::Size { path }).await? {
            StorageAccessResponse::Size(n) => Ok(n),
            other => unexpected_variant(other),
        }
    }

    async fn read(&self, path: Path, offset: i64, length: i64) -> CallResult<Vec<u8>> {
        match self
            .call(StorageAccessRequest::Read {
                path,
                offset,
                length,
            })
            .await?
        {
            StorageAccessResponse::Read(bytes) => Ok(bytes),
            other => unexpected_variant(other),
        }
    }

    async fn write(&self, path: Path, offset: i64, data: Vec<u8>) -> CallResult<()> {
        match self
            .call(StorageAccessRequest::Write { path, offset, data })
            .await?
        {
            StorageAccessResponse::Write => Ok(()),
            other => unexpected_variant(other),
        }
    }
}

fn unexpected_variant<T>(response: StorageAccessResponse) -> CallResult<T> {
    Err(crate::error::FsCallError::Remote(FsError::Other(format!(
        "unexpected response variant: {response:?}"
    ))))
}

/// Client-side convenience methods for a [`CommandHandle`].
#[async_trait]
pub trait StorageCommandStub {
    async fn create(&self, path: Path) -> CallResult<bool>;
    async fn delete(&self, path: Path) -> CallResult<bool>;
}

#[async_trait]
impl StorageCommandStub for CommandHandle {
    async fn create(&self, path: Path) -> CallResult<bool> {
        match self.call(StorageCommandRequest::Create { path }).await? {
            StorageCommandResponse::Create(ok) => Ok(ok),
            other => Err(crate::error::FsCallError::Remote(FsError::Other(format!(
                "unexpected response variant: {other:?}"
            )))),
        }
    }

    async fn delete(&self, path: Path) -> CallResult<bool> {
        match self.call(StorageCommandRequest::Delete { path }).await? {
            StorageCommandResponse::Delete(ok) => Ok(ok),
            other => Err(crate::error::FsCallError::Remote(FsError::Other(format!(
                "unexpected response variant: {other:?}"
            )))),
        }
    }
}

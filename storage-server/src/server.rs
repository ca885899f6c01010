use crate::error::StorageServerError;
use async_trait::async_trait;
use rpcfs_common::{
    CommandHandle, FsError, Path, RegistrationHandle, RegistrationStub, StorageAccessHandler,
    StorageAccessService, StorageCommandHandler, StorageCommandService, StorageHandle,
};
use rpcfs_net::{RemoteRef, Skeleton};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// Hosts one directory subtree on local disk (spec.md §4.5). Every byte-I/O
/// and command operation is serialized under `io_lock` -- the "single
/// coarse lock" concurrency requirement from spec.md §4.5/§5, guaranteeing
/// per-file atomicity of a read/write/create/delete without per-node locks.
pub struct StorageServer {
    root: PathBuf,
    io_lock: Mutex<()>,
}

fn io_err_to_fs(path: &Path, err: io::Error) -> FsError {
    FsError::Other(format!("{path}: {err}"))
}

impl StorageServer {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            io_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &StdPath {
        &self.root
    }

    /// The file this namespace path maps to on local disk: `<root>/a/b/c`
    /// for namespace path `/a/b/c` (spec.md §6 "on-disk layout").
    pub(crate) fn local_path(&self, path: &Path) -> PathBuf {
        let mut local = self.root.clone();
        for component in path.components() {
            local.push(component);
        }
        local
    }

    /// Must be called while holding `io_lock` -- it only checks existence,
    /// it doesn't itself serialize against a concurrent `create`/`delete`.
    async fn existing_file(&self, path: &Path) -> Result<PathBuf, FsError> {
        let local = self.local_path(path);
        let metadata = tokio::fs::metadata(&local)
            .await
            .map_err(|_| FsError::NotFound(path.to_string()))?;
        if !metadata.is_file() {
            return Err(FsError::NotFound(format!("{path} is a directory")));
        }
        Ok(local)
    }
}

#[async_trait]
impl StorageAccessHandler for StorageServer {
    async fn size(&self, path: Path) -> Result<u64, FsError> {
        let _guard = self.io_lock.lock().await;
        let local = self.existing_file(&path).await?;
        let metadata = tokio::fs::metadata(&local)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        Ok(metadata.len())
    }

    async fn read(&self, path: Path, offset: i64, length: i64) -> Result<Vec<u8>, FsError> {
        let _guard = self.io_lock.lock().await;
        let local = self.existing_file(&path).await?;

        let metadata = tokio::fs::metadata(&local)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        let size = metadata.len() as i64;

        if offset < 0 || length < 0 || offset.saturating_add(length) > size {
            return Err(FsError::OutOfRange(format!(
                "read({path}, offset={offset}, length={length}) out of bounds for size {size}"
            )));
        }

        let mut file = tokio::fs::File::open(&local)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        file.seek(std::io::SeekFrom::Start(offset as u64))
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;

        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        Ok(buf)
    }

    async fn write(&self, path: Path, offset: i64, data: Vec<u8>) -> Result<(), FsError> {
        if offset < 0 {
            return Err(FsError::OutOfRange(format!(
                "write({path}, offset={offset}) has a negative offset"
            )));
        }
        let _guard = self.io_lock.lock().await;
        let local = self.existing_file(&path).await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if offset == 0 {
            options.truncate(true);
        }
        let mut file = options
            .open(&local)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        file.seek(std::io::SeekFrom::Start(offset as u64))
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        file.write_all(&data)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl StorageCommandHandler for StorageServer {
    async fn create(&self, path: Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        let local = self.local_path(&path);
        let _guard = self.io_lock.lock().await;

        if tokio::fs::try_exists(&local).await.unwrap_or(false) {
            return Ok(false);
        }
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err_to_fs(&path, e))?;
        }
        tokio::fs::File::create(&local)
            .await
            .map_err(|e| io_err_to_fs(&path, e))?;
        Ok(true)
    }

    async fn delete(&self, path: Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        let local = self.local_path(&path);
        let _guard = self.io_lock.lock().await;

        match tokio::fs::metadata(&local).await {
            Ok(metadata) if metadata.is_dir() => {
                tokio::fs::remove_dir_all(&local)
                    .await
                    .map_err(|e| io_err_to_fs(&path, e))?;
            }
            Ok(_) => {
                tokio::fs::remove_file(&local)
                    .await
                    .map_err(|e| io_err_to_fs(&path, e))?;
            }
            // Directory deletes fan out to every storage server that owns a
            // file somewhere under the subtree (naming-server's
            // `command_handles_under`); a server with nothing there has
            // nothing to do.
            Err(_) => {}
        }
        Ok(true)
    }
}

/// Walks up from `start` toward (but not including) `root`, removing each
/// ancestor directory that `remove_dir` accepts (i.e. is empty), stopping at
/// the first non-empty one. Mirrors spec.md §4.5 step 5, "prune any
/// directories that became empty".
async fn prune_empty_ancestors(root: &StdPath, start: &StdPath) {
    let mut dir = start.to_path_buf();
    while dir != root {
        match tokio::fs::remove_dir(&dir).await {
            Ok(()) => match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            },
            Err(_) => break,
        }
    }
}

/// Owns the storage server's two skeletons and the shared [`StorageServer`]
/// state they dispatch to, plus the registration flow described in
/// spec.md §4.5 steps 3-5.
pub struct StorageServerHandle {
    server: Arc<StorageServer>,
    access_skeleton: Skeleton<StorageAccessService<StorageServer>>,
    command_skeleton: Skeleton<StorageCommandService<StorageServer>>,
}

impl StorageServerHandle {
    /// Validates that `root` exists and is a directory (spec.md §4.5 step 1)
    /// and binds (but does not yet start) the two skeletons.
    pub fn bind(root: PathBuf, bind_host: IpAddr, access_port: u16, command_port: u16) -> io::Result<Self> {
        let metadata = std::fs::metadata(&root).map_err(|_| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("storage root {} does not exist", root.display()),
            )
        })?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("storage root {} is not a directory", root.display()),
            ));
        }

        let server = Arc::new(StorageServer::new(root));
        let access_skeleton = Skeleton::bind(
            SocketAddr::new(bind_host, access_port),
            StorageAccessService(Arc::clone(&server)),
        );
        let command_skeleton = Skeleton::bind(
            SocketAddr::new(bind_host, command_port),
            StorageCommandService(Arc::clone(&server)),
        );

        Ok(Self {
            server,
            access_skeleton,
            command_skeleton,
        })
    }

    pub async fn start(&self) -> io::Result<()> {
        self.access_skeleton.start().await?;
        self.command_skeleton.start().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        self.access_skeleton.stop().await;
        self.command_skeleton.stop().await;
    }

    pub fn access_address(&self) -> SocketAddr {
        self.access_skeleton.address()
    }

    pub fn command_address(&self) -> SocketAddr {
        self.command_skeleton.address()
    }

    pub fn access_stub(&self, advertise_host: IpAddr) -> StorageHandle {
        RemoteRef::from_skeleton_with_hostname(&self.access_skeleton, advertise_host)
            .expect("access skeleton must be running before a stub is built")
    }

    pub fn command_stub(&self, advertise_host: IpAddr) -> CommandHandle {
        RemoteRef::from_skeleton_with_hostname(&self.command_skeleton, advertise_host)
            .expect("command skeleton must be running before a stub is built")
    }

    /// Enumerates local files, registers with the naming server at
    /// `registration_address` (spec.md §4.5 step 4), then deletes whatever
    /// the naming server reports as already present elsewhere and prunes any
    /// directories that become empty as a result (step 5).
    pub async fn register(
        &self,
        registration_address: SocketAddr,
        advertise_host: IpAddr,
    ) -> Result<Vec<Path>, StorageServerError> {
        let paths = Path::walk_files(self.server.root())?;

        let registration: RegistrationHandle =
            RemoteRef::from_address("Registration", registration_address);
        let to_delete = registration
            .register(
                self.access_stub(advertise_host),
                self.command_stub(advertise_host),
                paths,
            )
            .await?;

        for path in &to_delete {
            let local = self.server.local_path(path);
            if tokio::fs::remove_file(&local).await.is_ok() {
                if let Some(parent) = local.parent() {
                    prune_empty_ancestors(self.server.root(), parent).await;
                }
            }
        }

        Ok(to_delete)
    }
}

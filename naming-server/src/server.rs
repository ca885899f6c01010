use crate::namespace::Namespace;
use async_trait::async_trait;
use rpcfs_common::{
    ClientService, ClientServiceHandler, CommandHandle, FsError, Path, RegistrationHandler,
    RegistrationService, StorageCommandStub, StorageHandle,
};
use rpcfs_net::Skeleton;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

/// The naming server's in-process state: one namespace tree plus the set of
/// registered storage servers (spec.md §3 "storage server registry").
/// Membership is monotonic -- no pair is ever removed (Design Notes §9,
/// open question 4: registration is irreversible, preserved as specified).
pub struct NamingServer {
    namespace: Namespace,
    registry: RwLock<Vec<(StorageHandle, CommandHandle)>>,
}

impl NamingServer {
    pub fn new() -> Self {
        Self {
            namespace: Namespace::new(),
            registry: RwLock::new(Vec::new()),
        }
    }

    /// Deterministic tie-break for `createFile`'s "some registered storage
    /// server" (spec.md §4.7, Design Notes open question 1): the
    /// first-registered storage server still in the registry. Registration
    /// never removes entries, so in practice this is simply the first
    /// element.
    fn pick_storage_server(&self) -> Option<(StorageHandle, CommandHandle)> {
        self.registry.read().unwrap().first().cloned()
    }

    fn is_already_registered(&self, storage: &StorageHandle, command: &CommandHandle) -> bool {
        self.registry
            .read()
            .unwrap()
            .iter()
            .any(|(s, c)| s == storage || c == command)
    }
}

impl Default for NamingServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientServiceHandler for NamingServer {
    async fn is_directory(&self, path: Path) -> Result<bool, FsError> {
        self.namespace.is_directory(&path)
    }

    async fn list(&self, dir: Path) -> Result<Vec<String>, FsError> {
        self.namespace.list(&dir)
    }

    async fn create_file(&self, path: Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        // Fast precondition check under a shared read lock -- purely an
        // early-out so an invalid call doesn't pick a storage server or make
        // a remote `create` RPC. It can be stale under a race (another
        // caller's create lands between this check and the write below), but
        // `Namespace::create_file` re-validates parent-exists and
        // not-already-exists atomically under one write lock, so a race here
        // can only ever cost a wasted remote call, never a corrupted
        // namespace (spec.md §8 testable property 7).
        if !self.namespace.parent_exists(&path) {
            return Err(FsError::NotFound(path.parent().to_string()));
        }
        if self.namespace.path_exists(&path) {
            return Ok(false);
        }

        // spec.md §4.7: "When no storage server is registered, createFile
        // fails with a transport error." That error kind only exists on the
        // local invocation layer in this port (it never crosses the wire),
        // so here it surfaces as an ordinary application failure instead --
        // recorded as a deliberate deviation in DESIGN.md.
        let (storage, command) = self.pick_storage_server().ok_or_else(|| {
            FsError::Other("no storage server is registered".to_string())
        })?;

        command
            .create(path.clone())
            .await
            .map_err(|e| FsError::Other(e.to_string()))?;

        self.namespace.create_file(&path, storage, command)
    }

    async fn create_directory(&self, path: Path) -> Result<bool, FsError> {
        self.namespace.create_directory(&path)
    }

    async fn delete(&self, path: Path) -> Result<bool, FsError> {
        if !self.namespace.path_exists(&path) {
            return Err(FsError::NotFound(path.to_string()));
        }

        let handles = self.namespace.command_handles_under(&path);

        // spec.md §7: the namespace mutation is not rolled back if the
        // remote delete subsequently fails -- a known caveat, not a defect.
        self.namespace.delete(&path);

        let mut all_ok = true;
        for handle in handles {
            match handle.delete(path.clone()).await {
                Ok(true) => {}
                Ok(false) | Err(_) => all_ok = false,
            }
        }
        Ok(all_ok)
    }

    async fn get_storage(&self, path: Path) -> Result<StorageHandle, FsError> {
        self.namespace.get_storage_handle(&path)
    }
}

#[async_trait]
impl RegistrationHandler for NamingServer {
    async fn register(
        &self,
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, FsError> {
        if self.is_already_registered(&storage, &command) {
            return Err(FsError::AlreadyRegistered(format!(
                "{storage} / {command}"
            )));
        }

        let mut to_delete = Vec::new();
        let mut to_add = Vec::new();
        for path in paths {
            if path.is_root() {
                continue;
            }
            if self.namespace.path_exists(&path) {
                to_delete.push(path);
            } else {
                to_add.push(path);
            }
        }

        for path in &to_add {
            self.namespace
                .add_file(path, storage.clone(), command.clone());
        }

        self.registry.write().unwrap().push((storage, command));
        Ok(to_delete)
    }
}

/// Owns the naming server's two skeletons (client service, registration) and
/// the shared [`NamingServer`] state they both dispatch to, mirroring how
/// `distant_net::server::builder::tcp::TcpServerBuilder` pairs a server
/// object with a `start`/`stop` lifecycle (spec.md §4.7).
pub struct NamingServerHandle {
    server: Arc<NamingServer>,
    client_skeleton: Skeleton<ClientService<NamingServer>>,
    registration_skeleton: Skeleton<RegistrationService<NamingServer>>,
}

impl NamingServerHandle {
    pub fn bind(client_addr: SocketAddr, registration_addr: SocketAddr) -> Self {
        let server = Arc::new(NamingServer::new());
        let client_skeleton = Skeleton::bind(client_addr, ClientService(Arc::clone(&server)));
        let registration_skeleton =
            Skeleton::bind(registration_addr, RegistrationService(Arc::clone(&server)));
        Self {
            server,
            client_skeleton,
            registration_skeleton,
        }
    }

    pub async fn start(&self) -> io::Result<()> {
        self.client_skeleton.start().await?;
        self.registration_skeleton.start().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        self.client_skeleton.stop().await;
        self.registration_skeleton.stop().await;
    }

    pub fn client_address(&self) -> SocketAddr {
        self.client_skeleton.address()
    }

    pub fn registration_address(&self) -> SocketAddr {
        self.registration_skeleton.address()
    }

    pub fn server(&self) -> &Arc<NamingServer> {
        &self.server
    }
}

use async_trait::async_trait;
use rpcfs_common::{
    CommandHandle, FsError, Path, RegistrationHandler, RegistrationService, StorageHandle,
};
use rpcfs_net::Skeleton;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use storage_server::StorageServerHandle;

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

/// A naming server stand-in that always cedes every registered path back to
/// the caller, so the test can assert the storage server deletes its local
/// copies and prunes the directories that become empty.
struct CedeEverything {
    seen: Mutex<Vec<(StorageHandle, CommandHandle, Vec<Path>)>>,
}

#[async_trait]
impl RegistrationHandler for CedeEverything {
    async fn register(
        &self,
        storage: StorageHandle,
        command: CommandHandle,
        paths: Vec<Path>,
    ) -> Result<Vec<Path>, FsError> {
        self.seen
            .lock()
            .unwrap()
            .push((storage, command, paths.clone()));
        Ok(paths)
    }
}

#[tokio::test]
async fn registration_deletes_ceded_files_and_prunes_empty_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("b")).unwrap();
    std::fs::write(dir.path().join("a"), b"hi").unwrap();
    std::fs::write(dir.path().join("b").join("c"), b"hi").unwrap();

    let naming_handler = std::sync::Arc::new(CedeEverything {
        seen: Mutex::new(Vec::new()),
    });
    let registration_skeleton = Skeleton::bind(loopback(0), RegistrationService(naming_handler));
    registration_skeleton.start().await.unwrap();

    let storage = StorageServerHandle::bind(
        dir.path().to_path_buf(),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        0,
        0,
    )
    .unwrap();
    storage.start().await.unwrap();

    let to_delete = storage
        .register(
            registration_skeleton.address(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )
        .await
        .unwrap();

    let mut deleted: Vec<String> = to_delete.iter().map(Path::to_canonical_string).collect();
    deleted.sort();
    assert_eq!(deleted, vec!["/a", "/b/c"]);

    assert!(!dir.path().join("a").exists());
    assert!(!dir.path().join("b").join("c").exists());
    assert!(
        !dir.path().join("b").exists(),
        "emptied directory should have been pruned"
    );

    storage.stop().await;
    registration_skeleton.stop().await;
}

#[tokio::test]
async fn bind_fails_when_root_is_missing() {
    let missing = std::env::temp_dir().join("storage-server-test-missing-root-xyz");
    let result = StorageServerHandle::bind(missing, IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 0);
    assert!(result.is_err());
}

#[tokio::test]
async fn bind_fails_when_root_is_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("not-a-directory");
    std::fs::write(&file_path, b"x").unwrap();

    let result = StorageServerHandle::bind(file_path, IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 0);
    assert!(result.is_err());
}

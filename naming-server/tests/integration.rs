use async_trait::async_trait;
use naming_server::NamingServerHandle;
use rpcfs_common::{
    ClientServiceRequest, ClientServiceResponse, CommandHandle, FsError, Path, RegistrationRequest,
    RegistrationResponse, StorageAccessHandler, StorageAccessService, StorageAccessStub,
    StorageCommandHandler, StorageCommandService, StorageCommandStub, StorageHandle,
};
use rpcfs_net::{RemoteRef, Skeleton};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use tokio::sync::Barrier;

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

async fn start_naming_server() -> NamingServerHandle {
    let handle = NamingServerHandle::bind(loopback(0), loopback(0));
    handle.start().await.expect("naming server should bind");
    handle
}

/// A storage server stand-in that never touches a real disk: `create` and
/// `delete` just remember what happened, which is all the naming-server
/// scenarios in spec.md §8 need from the storage side.
struct MockStorage {
    created: Mutex<Vec<Path>>,
    deleted: Mutex<Vec<Path>>,
}

impl MockStorage {
    fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StorageCommandHandler for MockStorage {
    async fn create(&self, path: Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        self.created.lock().unwrap().push(path);
        Ok(true)
    }

    async fn delete(&self, path: Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        self.deleted.lock().unwrap().push(path);
        Ok(true)
    }
}

#[async_trait]
impl StorageAccessHandler for MockStorage {
    async fn size(&self, _path: Path) -> Result<u64, FsError> {
        Ok(0)
    }

    async fn read(&self, _path: Path, _offset: i64, _length: i64) -> Result<Vec<u8>, FsError> {
        Ok(Vec::new())
    }

    async fn write(&self, _path: Path, _offset: i64, _data: Vec<u8>) -> Result<(), FsError> {
        Ok(())
    }
}

struct MockStorageServer {
    access_skeleton: Skeleton<StorageAccessService<MockStorage>>,
    command_skeleton: Skeleton<StorageCommandService<MockStorage>>,
}

impl MockStorageServer {
    async fn start() -> Self {
        let storage = std::sync::Arc::new(MockStorage::new());
        let access_skeleton = Skeleton::bind(loopback(0), StorageAccessService(storage.clone()));
        let command_skeleton = Skeleton::bind(loopback(0), StorageCommandService(storage));
        access_skeleton.start().await.unwrap();
        command_skeleton.start().await.unwrap();
        Self {
            access_skeleton,
            command_skeleton,
        }
    }

    async fn storage_handle(&self) -> StorageHandle {
        RemoteRef::from_skeleton(&self.access_skeleton).await.unwrap()
    }

    async fn command_handle(&self) -> CommandHandle {
        RemoteRef::from_skeleton(&self.command_skeleton).await.unwrap()
    }

    async fn stop(&self) {
        self.access_skeleton.stop().await;
        self.command_skeleton.stop().await;
    }
}

async fn client_call(
    addr: SocketAddr,
    request: ClientServiceRequest,
) -> Result<ClientServiceResponse, rpcfs_net::CallError> {
    let stub: RemoteRef<ClientServiceRequest> =
        RemoteRef::from_address("ClientService", addr);
    stub.call(request).await
}

async fn register(
    addr: SocketAddr,
    storage: StorageHandle,
    command: CommandHandle,
    paths: Vec<Path>,
) -> Result<Vec<Path>, rpcfs_net::CallError> {
    let stub: RemoteRef<RegistrationRequest> = RemoteRef::from_address("Registration", addr);
    let RegistrationResponse::Register(to_delete) = stub
        .call(RegistrationRequest::Register {
            storage,
            command,
            paths,
        })
        .await?;
    Ok(to_delete)
}

#[tokio::test]
async fn s1_register_and_list() {
    let naming = start_naming_server().await;
    let storage_a = MockStorageServer::start().await;

    let paths = vec![
        Path::new("/a").unwrap(),
        Path::new("/b/c").unwrap(),
        Path::new("/b/d").unwrap(),
    ];
    let to_delete = register(
        naming.registration_address(),
        storage_a.storage_handle().await,
        storage_a.command_handle().await,
        paths,
    )
    .await
    .unwrap();
    assert!(to_delete.is_empty());

    let root_listing = client_call(
        naming.client_address(),
        ClientServiceRequest::List { dir: Path::root() },
    )
    .await
    .unwrap();
    match root_listing {
        ClientServiceResponse::List(mut names) => {
            names.sort();
            assert_eq!(names, vec!["a", "b"]);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let b_listing = client_call(
        naming.client_address(),
        ClientServiceRequest::List {
            dir: Path::new("/b").unwrap(),
        },
    )
    .await
    .unwrap();
    match b_listing {
        ClientServiceResponse::List(mut names) => {
            names.sort();
            assert_eq!(names, vec!["c", "d"]);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let is_b_dir = client_call(
        naming.client_address(),
        ClientServiceRequest::IsDirectory {
            path: Path::new("/b").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(is_b_dir, ClientServiceResponse::IsDirectory(true)));

    let is_a_dir = client_call(
        naming.client_address(),
        ClientServiceRequest::IsDirectory {
            path: Path::new("/a").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(is_a_dir, ClientServiceResponse::IsDirectory(false)));

    storage_a.stop().await;
    naming.stop().await;
}

#[tokio::test]
async fn s2_duplicate_registration_cedes_to_incumbent() {
    let naming = start_naming_server().await;
    let storage_a = MockStorageServer::start().await;
    let storage_b = MockStorageServer::start().await;

    register(
        naming.registration_address(),
        storage_a.storage_handle().await,
        storage_a.command_handle().await,
        vec![Path::new("/a").unwrap(), Path::new("/b/c").unwrap()],
    )
    .await
    .unwrap();

    let to_delete = register(
        naming.registration_address(),
        storage_b.storage_handle().await,
        storage_b.command_handle().await,
        vec![Path::new("/a").unwrap(), Path::new("/e").unwrap()],
    )
    .await
    .unwrap();
    assert_eq!(to_delete, vec![Path::new("/a").unwrap()]);

    let storage_of_a = client_call(
        naming.client_address(),
        ClientServiceRequest::GetStorage {
            path: Path::new("/a").unwrap(),
        },
    )
    .await
    .unwrap();
    match storage_of_a {
        ClientServiceResponse::GetStorage(handle) => {
            assert_eq!(handle, storage_a.storage_handle().await)
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let storage_of_e = client_call(
        naming.client_address(),
        ClientServiceRequest::GetStorage {
            path: Path::new("/e").unwrap(),
        },
    )
    .await
    .unwrap();
    match storage_of_e {
        ClientServiceResponse::GetStorage(handle) => {
            assert_eq!(handle, storage_b.storage_handle().await)
        }
        other => panic!("unexpected response: {other:?}"),
    }

    storage_a.stop().await;
    storage_b.stop().await;
    naming.stop().await;
}

#[tokio::test]
async fn s3_create_with_missing_parent() {
    let naming = start_naming_server().await;

    let no_storage_result = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateFile {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await;
    assert!(matches!(
        no_storage_result,
        Err(rpcfs_net::CallError::Remote(_))
    ));

    let storage = MockStorageServer::start().await;
    register(
        naming.registration_address(),
        storage.storage_handle().await,
        storage.command_handle().await,
        vec![],
    )
    .await
    .unwrap();

    let missing_parent = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateFile {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await;
    assert!(matches!(
        missing_parent,
        Err(rpcfs_net::CallError::Remote(_))
    ));

    let made_dir = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateDirectory {
            path: Path::new("/x").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        made_dir,
        ClientServiceResponse::CreateDirectory(true)
    ));

    let made_file = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateFile {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(made_file, ClientServiceResponse::CreateFile(true)));

    // Idempotent createFile (spec.md §8 universal invariant 7).
    let made_file_again = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateFile {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        made_file_again,
        ClientServiceResponse::CreateFile(false)
    ));

    let storage_of_xy = client_call(
        naming.client_address(),
        ClientServiceRequest::GetStorage {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        storage_of_xy,
        ClientServiceResponse::GetStorage(_)
    ));

    storage.stop().await;
    naming.stop().await;
}

#[tokio::test]
async fn create_file_with_no_storage_server_registered_fails() {
    let naming = start_naming_server().await;

    let made_dir = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateDirectory {
            path: Path::new("/x").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        made_dir,
        ClientServiceResponse::CreateDirectory(true)
    ));

    let result = client_call(
        naming.client_address(),
        ClientServiceRequest::CreateFile {
            path: Path::new("/x/y").unwrap(),
        },
    )
    .await;
    assert!(matches!(result, Err(rpcfs_net::CallError::Remote(_))));

    naming.stop().await;
}

#[tokio::test]
async fn s4_delete_subtree() {
    let naming = start_naming_server().await;
    let storage = MockStorageServer::start().await;

    register(
        naming.registration_address(),
        storage.storage_handle().await,
        storage.command_handle().await,
        vec![Path::new("/b/c").unwrap(), Path::new("/b/d").unwrap()],
    )
    .await
    .unwrap();

    let deleted = client_call(
        naming.client_address(),
        ClientServiceRequest::Delete {
            path: Path::new("/b").unwrap(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(deleted, ClientServiceResponse::Delete(true)));

    let exists = client_call(
        naming.client_address(),
        ClientServiceRequest::IsDirectory {
            path: Path::new("/b").unwrap(),
        },
    )
    .await;
    assert!(matches!(exists, Err(rpcfs_net::CallError::Remote(_))));

    storage.stop().await;
    naming.stop().await;
}

/// The client uses `getStorage` to obtain a direct handle to the storage
/// server, then talks to it without going back through the naming server --
/// so once that storage server is gone, the failure the client observes is
/// a transport error, never a namespace `NotFound` (spec.md §8 scenario S6).
#[tokio::test]
async fn s6_transport_error_surfaces_distinctly_not_as_not_found() {
    let naming = start_naming_server().await;
    let storage = MockStorageServer::start().await;

    register(
        naming.registration_address(),
        storage.storage_handle().await,
        storage.command_handle().await,
        vec![Path::new("/a").unwrap()],
    )
    .await
    .unwrap();

    let handle = match client_call(
        naming.client_address(),
        ClientServiceRequest::GetStorage {
            path: Path::new("/a").unwrap(),
        },
    )
    .await
    .unwrap()
    {
        ClientServiceResponse::GetStorage(handle) => handle,
        other => panic!("unexpected response: {other:?}"),
    };

    storage.stop().await;

    let result = handle.read(Path::new("/a").unwrap(), 0, 1).await;
    assert!(
        matches!(
            result,
            Err(rpcfs_common::FsCallError::Transport(_))
        ),
        "expected a transport error, got {result:?}"
    );

    naming.stop().await;
}

/// spec.md §8 testable property 7 ("idempotent createFile ... does not
/// change the namespace") has to hold under concurrency, not just when calls
/// happen to be serialized. A `Barrier` releases every task at once so all
/// three dial in and race to create the *same* directory; exactly one may
/// observe `true`, and the namespace must end up with exactly one node for
/// that path regardless of which task won.
#[tokio::test]
async fn concurrent_create_directory_calls_for_the_same_path_do_not_corrupt_the_tree() {
    let naming = std::sync::Arc::new(start_naming_server().await);
    let racers = 8;
    let barrier = std::sync::Arc::new(Barrier::new(racers));

    let mut tasks = Vec::new();
    for _ in 0..racers {
        let naming = naming.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            client_call(
                naming.client_address(),
                ClientServiceRequest::CreateDirectory {
                    path: Path::new("/racing").unwrap(),
                },
            )
            .await
            .unwrap()
        }));
    }

    let mut true_count = 0;
    let mut false_count = 0;
    for task in tasks {
        match task.await.unwrap() {
            ClientServiceResponse::CreateDirectory(true) => true_count += 1,
            ClientServiceResponse::CreateDirectory(false) => false_count += 1,
            other => panic!("unexpected response: {other:?}"),
        }
    }
    assert_eq!(true_count, 1, "exactly one racer should have created the directory");
    assert_eq!(false_count, racers - 1);

    let listing = client_call(
        naming.client_address(),
        ClientServiceRequest::List { dir: Path::root() },
    )
    .await
    .unwrap();
    match listing {
        ClientServiceResponse::List(names) => assert_eq!(names, vec!["racing"]),
        other => panic!("unexpected response: {other:?}"),
    }

    naming.stop().await;
}

/// Same race, but for `createFile`, which also has to pick and record a
/// storage binding atomically with the namespace insert.
#[tokio::test]
async fn concurrent_create_file_calls_for_the_same_path_do_not_corrupt_the_tree() {
    let naming = std::sync::Arc::new(start_naming_server().await);
    let storage = MockStorageServer::start().await;
    register(
        naming.registration_address(),
        storage.storage_handle().await,
        storage.command_handle().await,
        vec![],
    )
    .await
    .unwrap();

    let racers = 8;
    let barrier = std::sync::Arc::new(Barrier::new(racers));
    let mut tasks = Vec::new();
    for _ in 0..racers {
        let naming = naming.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            client_call(
                naming.client_address(),
                ClientServiceRequest::CreateFile {
                    path: Path::new("/racing-file").unwrap(),
                },
            )
            .await
            .unwrap()
        }));
    }

    let mut true_count = 0;
    let mut false_count = 0;
    for task in tasks {
        match task.await.unwrap() {
            ClientServiceResponse::CreateFile(true) => true_count += 1,
            ClientServiceResponse::CreateFile(false) => false_count += 1,
            other => panic!("unexpected response: {other:?}"),
        }
    }
    assert_eq!(true_count, 1, "exactly one racer should have created the file");
    assert_eq!(false_count, racers - 1);

    let listing = client_call(
        naming.client_address(),
        ClientServiceRequest::List { dir: Path::root() },
    )
    .await
    .unwrap();
    match listing {
        ClientServiceResponse::List(names) => assert_eq!(names, vec!["racing-file"]),
        other => panic!("unexpected response: {other:?}"),
    }

    storage.stop().await;
    naming.stop().await;
}

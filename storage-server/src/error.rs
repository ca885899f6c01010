use derive_more::{Display, Error, From};

/// Errors a storage server can hit outside the four remote methods
/// themselves: walking its local root, or talking to the naming server
/// during registration.
#[derive(Debug, Display, Error, From)]
pub enum StorageServerError {
    #[display(fmt = "local filesystem error: {_0}")]
    Io(std::io::Error),

    #[display(fmt = "{_0}")]
    Call(rpcfs_common::FsCallError),
}

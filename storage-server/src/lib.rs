//! The storage server (C5): hosts a subtree of the distributed filesystem on
//! local disk, exposing the byte-I/O and command interfaces from spec.md
//! §4.5, and registers its pre-existing contents with a naming server at
//! startup.

mod config;
mod constants;
mod error;
mod server;

pub use config::{Cli, Config};
pub use constants::DEFAULT_REGISTRATION_PORT;
pub use error::StorageServerError;
pub use server::{StorageServer, StorageServerHandle};

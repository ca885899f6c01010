//! The naming server (C6 + C7): the in-memory directory tree, the
//! storage-server registry, and the two remote interfaces built on top of
//! them -- client service and registration (spec.md §4.7).
//!
//! The namespace tree itself lives in [`namespace`]; [`server`] adapts it
//! into `rpcfs_common`'s handler traits and owns the pair of skeletons a
//! running naming server binds.

mod config;
mod constants;
mod namespace;
mod server;

pub use config::Cli;
pub use constants::{DEFAULT_CLIENT_PORT, DEFAULT_REGISTRATION_PORT};
pub use namespace::Namespace;
pub use server::{NamingServer, NamingServerHandle};

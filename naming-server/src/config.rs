use crate::constants::{DEFAULT_CLIENT_PORT, DEFAULT_REGISTRATION_PORT};
use clap::Parser;

/// Command-line configuration for the naming server. The naming server has
/// no persisted state (spec.md §6 "Persisted state: None on the naming
/// server"), so unlike the storage server there is no config-file layer --
/// everything it needs is a pair of ports.
#[derive(Debug, Parser)]
#[command(name = "naming-server", about = "Owns the distributed filesystem's directory namespace")]
pub struct Cli {
    /// Port the client service interface binds to.
    #[arg(long, default_value_t = DEFAULT_CLIENT_PORT)]
    pub client_port: u16,

    /// Port the registration interface binds to.
    #[arg(long, default_value_t = DEFAULT_REGISTRATION_PORT)]
    pub registration_port: u16,

    /// Increase log verbosity; repeatable (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

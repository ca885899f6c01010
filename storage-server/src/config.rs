use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Command-line configuration for the storage server. `--config` layers a
/// TOML file underneath these flags (`Config::load`), mirroring the
/// teacher's "explicit flag overrides file, file overrides default"
/// precedence (spec.md §3's Configuration addendum).
#[derive(Debug, Parser)]
#[command(name = "storage-server", about = "Hosts a subtree of the distributed filesystem on local disk")]
pub struct Cli {
    /// TOML file providing defaults for any flag not passed explicitly.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local directory this storage server exposes as its namespace subtree.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Network interface the two skeletons bind to.
    #[arg(long)]
    pub bind_host: Option<IpAddr>,

    /// Hostname advertised to the naming server -- may differ from
    /// `bind_host` when that interface is a wildcard address (spec.md §4.5
    /// "bind the two skeletons to the externally-routable hostname").
    #[arg(long)]
    pub advertise_host: Option<IpAddr>,

    /// Port for the byte-I/O interface. Defaults to an OS-assigned port.
    #[arg(long)]
    pub access_port: Option<u16>,

    /// Port for the command interface. Defaults to an OS-assigned port.
    #[arg(long)]
    pub command_port: Option<u16>,

    /// Address of the naming server's registration interface.
    #[arg(long)]
    pub naming_registration_address: Option<SocketAddr>,

    /// Increase log verbosity; repeatable (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FileConfig {
    root: Option<PathBuf>,
    bind_host: Option<IpAddr>,
    advertise_host: Option<IpAddr>,
    access_port: Option<u16>,
    command_port: Option<u16>,
    naming_registration_address: Option<SocketAddr>,
}

/// The fully-resolved configuration a [`crate::StorageServerHandle`] is
/// built from.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub bind_host: IpAddr,
    pub advertise_host: IpAddr,
    pub access_port: u16,
    pub command_port: u16,
    pub naming_registration_address: SocketAddr,
    pub verbose: u8,
}

impl Config {
    /// Resolves a [`Config`] from `cli`, reading `cli.config` (if set) as a
    /// TOML overlay. An explicit flag always wins over the file, and the
    /// file always wins over the built-in default.
    pub fn load(cli: Cli) -> std::io::Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?
            }
            None => FileConfig::default(),
        };

        Ok(Self {
            root: cli.root.or(file.root).unwrap_or_else(|| PathBuf::from(".")),
            bind_host: cli
                .bind_host
                .or(file.bind_host)
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            advertise_host: cli
                .advertise_host
                .or(file.advertise_host)
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            access_port: cli.access_port.or(file.access_port).unwrap_or(0),
            command_port: cli.command_port.or(file.command_port).unwrap_or(0),
            naming_registration_address: cli
                .naming_registration_address
                .or(file.naming_registration_address)
                .unwrap_or_else(|| {
                    SocketAddr::new(
                        IpAddr::V4(Ipv4Addr::LOCALHOST),
                        crate::DEFAULT_REGISTRATION_PORT,
                    )
                }),
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            config: None,
            root: None,
            bind_host: None,
            advertise_host: None,
            access_port: None,
            command_port: None,
            naming_registration_address: None,
            verbose: 0,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::load(empty_cli()).unwrap();
        assert_eq!(config.access_port, 0);
        assert_eq!(config.advertise_host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn explicit_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("storage.toml");
        std::fs::write(&config_path, "access-port = 9001\n").unwrap();

        let mut cli = empty_cli();
        cli.config = Some(config_path);
        cli.access_port = Some(9002);

        let config = Config::load(cli).unwrap();
        assert_eq!(config.access_port, 9002);
    }

    #[test]
    fn config_file_overrides_default_when_flag_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("storage.toml");
        std::fs::write(&config_path, "access-port = 9001\n").unwrap();

        let mut cli = empty_cli();
        cli.config = Some(config_path);

        let config = Config::load(cli).unwrap();
        assert_eq!(config.access_port, 9001);
    }
}

use clap::Parser;
use naming_server::{Cli, NamingServerHandle};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let client_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cli.client_port);
    let registration_addr =
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cli.registration_port);

    let handle = NamingServerHandle::bind(client_addr, registration_addr);
    handle.start().await?;

    log::info!(
        "naming server listening: client={}, registration={}",
        handle.client_address(),
        handle.registration_address(),
    );

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");
    handle.stop().await;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

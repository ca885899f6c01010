use clap::Parser;
use storage_server::{Cli, Config, StorageServerHandle};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load(cli)?;

    let handle = StorageServerHandle::bind(
        config.root.clone(),
        config.bind_host,
        config.access_port,
        config.command_port,
    )?;
    handle.start().await?;

    log::info!(
        "storage server listening: access={}, command={}",
        handle.access_address(),
        handle.command_address(),
    );

    match handle
        .register(config.naming_registration_address, config.advertise_host)
        .await
    {
        Ok(to_delete) => {
            log::info!(
                "registered with naming server at {}, ceded {} path(s)",
                config.naming_registration_address,
                to_delete.len(),
            );
        }
        Err(err) => {
            log::error!("registration with naming server failed: {err}");
            handle.stop().await;
            return Err(std::io::Error::new(std::io::ErrorKind::Other, err.to_string()));
        }
    }

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

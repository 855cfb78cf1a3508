//! peertrade CLI binary

use clap::Parser;
use peertrade::cli::{Cli, Commands, TradeApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node(args) => {
            let config = args.resolve()?;
            tracing::info!(
                "Starting peertrade node '{}' on port {}",
                config.node.name,
                config.node.port
            );

            let app = TradeApp::new(config).await?;
            tracing::info!("Local peer {} on {}", app.local_peer_id(), app.listen_addr());

            app.spawn_local_avatar();
            app.connect_configured_peers().await;

            tracing::info!("Node running. Type 'quit' to stop.");
            app.run().await?;
        }

        Commands::Config(args) => {
            let config = args.resolve()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

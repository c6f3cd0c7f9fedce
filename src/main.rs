use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

use cli::Cli;
use packetward::config::Config;
use packetward::engine::{self, CaptureOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = Config::load_or_default(cli.config.as_deref());

    let options = CaptureOptions {
        device: cli.device,
        snaplen: cli.snaplen,
        promiscuous: cli.promiscuous,
        path: cli.path,
        source: cli.source,
        filter: cli.filter,
    };

    if let Err(e) = engine::run(&options, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

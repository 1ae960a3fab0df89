use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// NDN certificate bundle tool
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Path to the forwarder's Unix socket
    #[clap(long, global = true, default_value = ndn_bundle_face::DEFAULT_FORWARDER_SOCKET)]
    socket: PathBuf,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an Interest and print the received Data
    Interest {
        /// Name to request (NDN URI format)
        name: String,

        /// Interest lifetime in milliseconds
        #[clap(short, long, default_value = "4000")]
        lifetime: u64,

        /// Require fresh data
        #[clap(long)]
        fresh: bool,
    },

    /// Walk a signing key's certificate chain and publish it as a bundle
    Bundle {
        /// Signing key name to start the chain walk from
        key_name: String,

        /// Name the bundle will be requested under
        bundle_name: String,

        /// Chain depth cap
        #[clap(long, default_value = "25")]
        max_size: usize,
    },

    /// Fetch a Data packet and validate it against a trust anchor
    Validate {
        /// Name of the data to fetch and validate
        name: String,

        /// File holding the wire-encoded trust anchor certificate
        #[clap(short, long)]
        anchor: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" },
    ))
    .init();

    match cli.command {
        Commands::Interest {
            name,
            lifetime,
            fresh,
        } => commands::interest::run(&cli.socket, &name, lifetime, fresh).await,
        Commands::Bundle {
            key_name,
            bundle_name,
            max_size,
        } => commands::bundle::run(&cli.socket, &key_name, &bundle_name, max_size).await,
        Commands::Validate { name, anchor } => {
            commands::validate::run(&cli.socket, &name, &anchor).await
        }
    }
}

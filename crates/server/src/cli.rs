use clap::{Parser, Subcommand};

/// FleetLock rolling-reboot coordination server.
#[derive(Parser, Debug)]
#[command(name = "fleetlock-server", about = "FleetLock server")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Expand environment variables (`${VAR}`) in the config file before
    /// parsing.
    #[arg(long)]
    pub env: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the server version and exit.
    Version,
}

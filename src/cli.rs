use clap::Parser;

/// Drone Dispatch CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "drone-dispatch",
    version,
    about = "Fleet management service for delivery drones and their medication loads"
)]
pub struct Cli {
    /// SQLite database URL (e.g. sqlite://dispatch.db)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Address to bind the HTTP server to (e.g. 0.0.0.0:8080)
    #[arg(long)]
    pub bind_addr: Option<String>,

    /// Battery sweep interval in seconds
    #[arg(long)]
    pub sweep_interval: Option<u64>,
}

use std::env;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub sweep_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is required")?;

        let bind_addr = env::var("BIND_ADDR").map_err(|_| "BIND_ADDR is required")?;

        let sweep_interval_seconds = env::var("SWEEP_INTERVAL_SECONDS")
            .map_err(|_| "SWEEP_INTERVAL_SECONDS is required")?
            .parse::<u64>()
            .map_err(|_| "SWEEP_INTERVAL_SECONDS must be a valid number")?;

        Ok(Self {
            database_url,
            bind_addr,
            sweep_interval_seconds,
        })
    }

    /// Apply CLI flag overrides on top of the env-derived config.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(addr) = &cli.bind_addr {
            self.bind_addr = addr.clone();
        }
        if let Some(interval) = cli.sweep_interval {
            self.sweep_interval_seconds = interval;
        }
        self
    }
}

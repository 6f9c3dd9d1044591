use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use drone_dispatch::api;
use drone_dispatch::cli::Cli;
use drone_dispatch::config::Config;
use drone_dispatch::db;
use drone_dispatch::error::AppError;
use drone_dispatch::logging::init_logging;
use drone_dispatch::metrics::AppMetrics;
use drone_dispatch::repository::DroneRepository;
use drone_dispatch::scheduler;
use drone_dispatch::services::drones::DroneService;
use drone_dispatch::services::medications::MedicationService;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()
        .map(|config| config.apply_cli(&cli))
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });

    tracing::info!("Service starting with config: {:?}", config);

    let pool = match db::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!("Failed to open database {}: {}", config.database_url, err);
            std::process::exit(1);
        }
    };

    let repository = Arc::new(DroneRepository::new(pool));
    let drone_service = Arc::new(DroneService::new(repository.clone()));
    let medication_service = Arc::new(MedicationService::new(repository));

    let metrics = Arc::new(AppMetrics::new().unwrap_or_else(|err| {
        tracing::error!("Failed to register metrics: {}", err);
        std::process::exit(1);
    }));

    // Background battery sweep. Runs until Ctrl+C, independently of the
    // HTTP server's graceful shutdown.
    let sweep_service = drone_service.clone();
    let sweep_metrics = metrics.clone();
    let sweep_interval = config.sweep_interval_seconds;
    tokio::spawn(async move {
        scheduler::run_battery_sweep(sweep_service, sweep_metrics, sweep_interval).await;
    });

    let context = Arc::new(api::ApiContext {
        drones: drone_service,
        medications: medication_service,
        metrics,
    });
    let app = api::build_router(context);

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, err);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.bind_addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", err);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received. Stopping server.");
}

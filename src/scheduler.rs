//! Periodic battery sweep.
//!
//! Drives the background check over the fleet: each tick finds drones whose
//! battery has dropped below the loading minimum, records a "Low Battery"
//! audit event for each, and attempts to demote them to IDLE through the
//! same state-change path the API uses.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};

use crate::error::AppError;
use crate::metrics::AppMetrics;
use crate::model::DroneState;
use crate::services::drones::DroneService;

/// Run the battery sweep loop.
///
/// On each tick:
/// 1. Query drones with low battery that are not currently LOADING
/// 2. Record a "Low Battery" audit event for each
/// 3. Attempt to demote each drone to IDLE; the state-change battery guard
///    rejects this for drones below the minimum, so the audit entry is the
///    only durable record
///
/// Per-drone errors are logged and the loop continues — a single failed
/// sweep should never take down the scheduler. A tick runs to completion
/// before the next can fire; late ticks are skipped rather than bunched.
///
/// Runs until `Ctrl+C` (SIGINT) is received.
pub async fn run_battery_sweep(
    service: Arc<DroneService>,
    metrics: Arc<AppMetrics>,
    sweep_interval_seconds: u64,
) {
    let mut interval = time::interval(Duration::from_secs(sweep_interval_seconds));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        "Battery sweep started (interval: {}s)",
        sweep_interval_seconds
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sweep_once(&service, &metrics).await;
            }

            _ = signal::ctrl_c() => {
                tracing::info!("Shutdown signal received. Stopping battery sweep.");
                break;
            }
        }
    }

    tracing::info!("Battery sweep stopped cleanly");
}

/// Execute a single sweep cycle. Extracted for testability.
async fn sweep_once(service: &Arc<DroneService>, metrics: &Arc<AppMetrics>) {
    metrics.sweep_ticks_total.inc();

    let drones = match service.find_low_battery_drones().await {
        Ok(drones) => drones,
        Err(err) => {
            tracing::error!("Battery sweep query failed — skipping tick: {}", err);
            return;
        }
    };

    if drones.is_empty() {
        metrics.last_sweep_timestamp.set(Utc::now().timestamp() as f64);
        return;
    }

    tracing::info!("Battery sweep found {} low-battery drones", drones.len());

    for drone in &drones {
        if let Err(err) = service.record_low_battery(drone).await {
            tracing::error!(
                "Failed to record low battery for drone {}: {}",
                drone.serial_number,
                err
            );
            continue;
        }
        metrics.low_battery_events_total.inc();

        // The battery guard rejects this demotion for drones below the
        // minimum, leaving their state untouched.
        match service
            .change_drone_state(&drone.serial_number, DroneState::Idle)
            .await
        {
            Ok(_) => {}
            Err(AppError::BatteryLow(_)) => {
                tracing::debug!(
                    "Drone {} kept its state: battery too low for a state change",
                    drone.serial_number
                );
            }
            Err(err) => {
                tracing::error!(
                    "Failed to change state for drone {}: {}",
                    drone.serial_number,
                    err
                );
            }
        }
    }

    metrics.last_sweep_timestamp.set(Utc::now().timestamp() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::create_pool;
    use crate::model::{DroneModel, NewDrone};
    use crate::repository::DroneRepository;

    async fn make_service() -> Arc<DroneService> {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        Arc::new(DroneService::new(Arc::new(DroneRepository::new(pool))))
    }

    fn make_metrics() -> Arc<AppMetrics> {
        Arc::new(AppMetrics::new().unwrap())
    }

    fn make_new_drone(serial: &str, battery: i64, state: DroneState) -> NewDrone {
        NewDrone {
            serial_number: serial.to_string(),
            model: DroneModel::Middleweight,
            weight_limit: 300,
            battery_capacity: battery,
            state,
        }
    }

    async fn register_with_battery(service: &DroneService, serial: &str, battery: i64) {
        // Registration forces IDLE, so drop the battery afterwards to set
        // up a low-battery drone.
        service
            .register_drone(make_new_drone(serial, 80, DroneState::Idle))
            .await
            .unwrap();
        if battery != 80 {
            service.change_battery_capacity(serial, battery).await.unwrap();
        }
    }

    #[tokio::test]
    async fn sweep_records_low_battery_event_per_drone() {
        let service = make_service().await;
        let metrics = make_metrics();
        register_with_battery(&service, "DR_LOW_1", 10).await;
        register_with_battery(&service, "DR_LOW_2", 5).await;
        register_with_battery(&service, "DR_FULL", 90).await;

        sweep_once(&service, &metrics).await;

        let logs = service.get_audit_log_events().await.unwrap();
        let low_battery: Vec<_> = logs
            .iter()
            .filter(|log| log.event_description == "Low Battery")
            .collect();
        assert_eq!(low_battery.len(), 2);
        assert!((metrics.low_battery_events_total.get() - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sweep_audits_but_never_demotes_below_minimum_drones() {
        let service = make_service().await;
        let metrics = make_metrics();
        register_with_battery(&service, "DR_LOW", 10).await;

        sweep_once(&service, &metrics).await;

        // The demotion is rejected by the battery guard, so the only trace
        // of the sweep is the "Low Battery" entry.
        let logs = service.get_audit_log_events().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event_description, "Low Battery");
        assert_eq!(service.check_drone_battery_level("DR_LOW").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn sweep_skips_loading_drones() {
        let service = make_service().await;
        let metrics = make_metrics();
        // A drone that went into LOADING before its battery dropped.
        register_with_battery(&service, "DR_LOADING", 80).await;
        service
            .change_drone_state("DR_LOADING", DroneState::Loading)
            .await
            .unwrap();
        service.change_battery_capacity("DR_LOADING", 10).await.unwrap();

        sweep_once(&service, &metrics).await;

        let logs = service.get_audit_log_events().await.unwrap();
        assert!(!logs.iter().any(|log| log.event_description == "Low Battery"));
    }

    #[tokio::test]
    async fn sweep_with_healthy_fleet_records_nothing() {
        let service = make_service().await;
        let metrics = make_metrics();
        register_with_battery(&service, "DR_FULL", 90).await;

        sweep_once(&service, &metrics).await;

        assert!(service.get_audit_log_events().await.unwrap().is_empty());
        assert!((metrics.sweep_ticks_total.get() - 1.0).abs() < f64::EPSILON);
        assert!(metrics.last_sweep_timestamp.get() > 0.0);
    }

    #[tokio::test]
    async fn two_sweeps_accumulate_audit_entries() {
        let service = make_service().await;
        let metrics = make_metrics();
        register_with_battery(&service, "DR_LOW", 10).await;

        sweep_once(&service, &metrics).await;
        sweep_once(&service, &metrics).await;

        let logs = service.get_audit_log_events().await.unwrap();
        let low_battery = logs
            .iter()
            .filter(|log| log.event_description == "Low Battery")
            .count();
        assert_eq!(low_battery, 2);
        assert!((metrics.sweep_ticks_total.get() - 2.0).abs() < f64::EPSILON);
    }
}

//! Database repository for drone fleet persistence.
//!
//! All SQLite read/write logic lives here. The services call into
//! [`DroneRepository`] for lookups and for the multi-statement operations
//! (loading, state changes with audit entries, low-battery records), which
//! each run inside a single transaction.
//!
//! Enum columns are stored as their upper-case TEXT names and audit
//! timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::model::{AuditLog, Drone, DroneState, LoadedMedication, NewDrone, NewMedication};

/// Repository for reading and writing drone fleet data to SQLite.
pub struct DroneRepository {
    pool: SqlitePool,
}

fn map_drone_row(row: &SqliteRow) -> Option<Drone> {
    let id: i64 = row.try_get("id").ok()?;
    let serial_number: String = row.try_get("serial_number").ok()?;
    let model: String = row.try_get("model").ok()?;
    let weight_limit: i64 = row.try_get("weight_limit").ok()?;
    let battery_capacity: i64 = row.try_get("battery_capacity").ok()?;
    let state: String = row.try_get("state").ok()?;

    Some(Drone {
        id,
        serial_number,
        model: model.parse().ok()?,
        weight_limit,
        battery_capacity,
        state: state.parse().ok()?,
    })
}

fn map_audit_row(row: &SqliteRow) -> Option<AuditLog> {
    let id: i64 = row.try_get("id").ok()?;
    let drone_id: i64 = row.try_get("drone_id").ok()?;
    let drone_serial_number: String = row.try_get("drone_serial_number").ok()?;
    let event_description: String = row.try_get("event_description").ok()?;
    let timestamp_str: String = row.try_get("event_timestamp").ok()?;

    let event_timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .ok()?
        .with_timezone(&Utc);

    Some(AuditLog {
        id,
        drone_id,
        drone_serial_number,
        event_description,
        event_timestamp,
    })
}

impl DroneRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---- Drones ----

    /// Insert a new drone and return the stored row.
    pub async fn insert_drone(&self, drone: &NewDrone) -> Result<Drone, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO drones (serial_number, model, weight_limit, battery_capacity, state)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&drone.serial_number)
        .bind(drone.model.as_str())
        .bind(drone.weight_limit)
        .bind(drone.battery_capacity)
        .bind(drone.state.as_str())
        .execute(&self.pool)
        .await?;

        Ok(Drone {
            id: result.last_insert_rowid(),
            serial_number: drone.serial_number.clone(),
            model: drone.model,
            weight_limit: drone.weight_limit,
            battery_capacity: drone.battery_capacity,
            state: drone.state,
        })
    }

    pub async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Drone>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, serial_number, model, weight_limit, battery_capacity, state
             FROM drones
             WHERE serial_number = ?",
        )
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(map_drone_row))
    }

    pub async fn serial_exists(&self, serial_number: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM drones WHERE serial_number = ?")
            .bind(serial_number)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("cnt").unwrap_or(0);
        Ok(count > 0)
    }

    pub async fn find_by_state(&self, state: DroneState) -> Result<Vec<Drone>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, serial_number, model, weight_limit, battery_capacity, state
             FROM drones
             WHERE state = ?
             ORDER BY id ASC",
        )
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(map_drone_row).collect())
    }

    /// Drones with battery below `threshold` that are not in the excluded
    /// state. Used by the battery sweep (excludes LOADING drones).
    pub async fn find_low_battery(
        &self,
        threshold: i64,
        excluded_state: DroneState,
    ) -> Result<Vec<Drone>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, serial_number, model, weight_limit, battery_capacity, state
             FROM drones
             WHERE battery_capacity < ? AND state != ?
             ORDER BY id ASC",
        )
        .bind(threshold)
        .bind(excluded_state.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(map_drone_row).collect())
    }

    /// Update every mutable column of an existing drone row.
    pub async fn update_drone(&self, drone: &Drone) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE drones
             SET model = ?, weight_limit = ?, battery_capacity = ?, state = ?
             WHERE id = ?",
        )
        .bind(drone.model.as_str())
        .bind(drone.weight_limit)
        .bind(drone.battery_capacity)
        .bind(drone.state.as_str())
        .bind(drone.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- Loading ----

    /// Load medications onto a drone in a single transaction: upsert each
    /// medication by code, add this call's occurrence count to the join
    /// quantity, and move the drone to LOADED. Returns the updated drone.
    pub async fn load_medications(
        &self,
        drone: &Drone,
        medications: &[NewMedication],
    ) -> Result<Drone, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Fold repeats of the same code within this call into one
        // occurrence count.
        let mut counted: Vec<(&NewMedication, i64)> = Vec::new();
        for medication in medications {
            match counted
                .iter_mut()
                .find(|(existing, _)| existing.code == medication.code)
            {
                Some((_, count)) => *count += 1,
                None => counted.push((medication, 1)),
            }
        }

        for (medication, count) in counted {
            sqlx::query(
                "INSERT INTO medications (name, weight, code, image)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(code) DO UPDATE SET
                     name = excluded.name,
                     weight = excluded.weight,
                     image = excluded.image",
            )
            .bind(&medication.name)
            .bind(medication.weight)
            .bind(&medication.code)
            .bind(&medication.image)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query("SELECT id FROM medications WHERE code = ?")
                .bind(&medication.code)
                .fetch_one(&mut *tx)
                .await?;
            let medication_id: i64 = row.try_get("id")?;

            sqlx::query(
                "INSERT INTO drone_medications (drone_id, medication_id, quantity)
                 VALUES (?, ?, ?)
                 ON CONFLICT(drone_id, medication_id) DO UPDATE SET
                     quantity = quantity + excluded.quantity",
            )
            .bind(drone.id)
            .bind(medication_id)
            .bind(count)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE drones SET state = ? WHERE id = ?")
            .bind(DroneState::Loaded.as_str())
            .bind(drone.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut updated = drone.clone();
        updated.state = DroneState::Loaded;
        Ok(updated)
    }

    /// All medications currently joined to the drone with the given serial,
    /// with their cumulative quantities. Unknown serials yield an empty list.
    pub async fn loaded_medications(
        &self,
        serial_number: &str,
    ) -> Result<Vec<LoadedMedication>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT m.id, m.name, m.weight, m.code, m.image, dm.quantity
             FROM medications m
             JOIN drone_medications dm ON dm.medication_id = m.id
             JOIN drones d ON d.id = dm.drone_id
             WHERE d.serial_number = ?
             ORDER BY m.id ASC",
        )
        .bind(serial_number)
        .fetch_all(&self.pool)
        .await?;

        let medications = rows
            .into_iter()
            .filter_map(|row| {
                let id: i64 = row.try_get("id").ok()?;
                let name: String = row.try_get("name").ok()?;
                let weight: i64 = row.try_get("weight").ok()?;
                let code: String = row.try_get("code").ok()?;
                let image: String = row.try_get("image").ok()?;
                let quantity: i64 = row.try_get("quantity").ok()?;

                Some(LoadedMedication {
                    id,
                    name,
                    weight,
                    code,
                    image,
                    quantity,
                })
            })
            .collect();

        Ok(medications)
    }

    // ---- State changes and audit ----

    /// Set the drone's state and append the audit entry in one transaction.
    /// Returns the updated drone.
    pub async fn update_state_with_audit(
        &self,
        drone: &Drone,
        new_state: DroneState,
        event_description: &str,
    ) -> Result<Drone, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE drones SET state = ? WHERE id = ?")
            .bind(new_state.as_str())
            .bind(drone.id)
            .execute(&mut *tx)
            .await?;

        let timestamp = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO audit_logs (drone_id, drone_serial_number, event_description, event_timestamp)
             VALUES (?, ?, ?, ?)",
        )
        .bind(drone.id)
        .bind(&drone.serial_number)
        .bind(event_description)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut updated = drone.clone();
        updated.state = new_state;
        Ok(updated)
    }

    /// Append a low-battery audit entry and re-save the drone row unchanged,
    /// in one transaction. The state is deliberately left as it is.
    pub async fn record_low_battery(
        &self,
        drone: &Drone,
        event_description: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let timestamp = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO audit_logs (drone_id, drone_serial_number, event_description, event_timestamp)
             VALUES (?, ?, ?, ?)",
        )
        .bind(drone.id)
        .bind(&drone.serial_number)
        .bind(event_description)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE drones
             SET model = ?, weight_limit = ?, battery_capacity = ?, state = ?
             WHERE id = ?",
        )
        .bind(drone.model.as_str())
        .bind(drone.weight_limit)
        .bind(drone.battery_capacity)
        .bind(drone.state.as_str())
        .bind(drone.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// All audit entries, oldest first.
    pub async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, drone_id, drone_serial_number, event_description, event_timestamp
             FROM audit_logs
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(map_audit_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::model::DroneModel;

    async fn make_repo() -> DroneRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        DroneRepository::new(pool)
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

    fn make_medication(code: &str, weight: i64) -> NewMedication {
        NewMedication {
            name: format!("med_{}", code),
            weight,
            code: code.to_string(),
            image: "https://img.example.com/med.png".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_by_serial_roundtrip() {
        let repo = make_repo().await;
        let saved = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();
        assert!(saved.id > 0);

        let found = repo.find_by_serial("DR_001").await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert_eq!(found.model, DroneModel::Middleweight);
        assert_eq!(found.state, DroneState::Idle);
    }

    #[tokio::test]
    async fn find_by_serial_returns_none_for_unknown() {
        let repo = make_repo().await;
        assert!(repo.find_by_serial("MISSING").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_serial_insert_fails() {
        let repo = make_repo().await;
        repo.insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();

        let result = repo
            .insert_drone(&make_new_drone("DR_001", 50, DroneState::Idle))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn serial_exists_reflects_inserts() {
        let repo = make_repo().await;
        assert!(!repo.serial_exists("DR_001").await.unwrap());
        repo.insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();
        assert!(repo.serial_exists("DR_001").await.unwrap());
    }

    #[tokio::test]
    async fn find_by_state_filters_on_state() {
        let repo = make_repo().await;
        repo.insert_drone(&make_new_drone("DR_001", 80, DroneState::Loading))
            .await
            .unwrap();
        repo.insert_drone(&make_new_drone("DR_002", 80, DroneState::Idle))
            .await
            .unwrap();
        repo.insert_drone(&make_new_drone("DR_003", 80, DroneState::Loading))
            .await
            .unwrap();

        let loading = repo.find_by_state(DroneState::Loading).await.unwrap();
        assert_eq!(loading.len(), 2);
        assert_eq!(loading[0].serial_number, "DR_001");
        assert_eq!(loading[1].serial_number, "DR_003");
    }

    #[tokio::test]
    async fn find_low_battery_excludes_given_state() {
        let repo = make_repo().await;
        repo.insert_drone(&make_new_drone("DR_LOW_IDLE", 10, DroneState::Idle))
            .await
            .unwrap();
        repo.insert_drone(&make_new_drone("DR_LOW_LOADING", 10, DroneState::Loading))
            .await
            .unwrap();
        repo.insert_drone(&make_new_drone("DR_FULL", 90, DroneState::Idle))
            .await
            .unwrap();

        let low = repo
            .find_low_battery(25, DroneState::Loading)
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].serial_number, "DR_LOW_IDLE");
    }

    #[tokio::test]
    async fn update_drone_persists_all_columns() {
        let repo = make_repo().await;
        let mut drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();

        drone.battery_capacity = 55;
        drone.state = DroneState::Returning;
        repo.update_drone(&drone).await.unwrap();

        let found = repo.find_by_serial("DR_001").await.unwrap().unwrap();
        assert_eq!(found.battery_capacity, 55);
        assert_eq!(found.state, DroneState::Returning);
    }

    #[tokio::test]
    async fn load_medications_sets_state_loaded_and_stores_join_rows() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Loading))
            .await
            .unwrap();

        let updated = repo
            .load_medications(&drone, &[make_medication("ASP_01", 120)])
            .await
            .unwrap();
        assert_eq!(updated.state, DroneState::Loaded);

        let loaded = repo.loaded_medications("DR_001").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].code, "ASP_01");
        assert_eq!(loaded[0].quantity, 1);
    }

    #[tokio::test]
    async fn repeat_loads_accumulate_quantity() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Loading))
            .await
            .unwrap();

        repo.load_medications(&drone, &[make_medication("ASP_01", 120)])
            .await
            .unwrap();
        repo.load_medications(&drone, &[make_medication("ASP_01", 120)])
            .await
            .unwrap();

        let loaded = repo.loaded_medications("DR_001").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].quantity, 2);
    }

    #[tokio::test]
    async fn one_call_listing_the_same_code_twice_counts_both() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Loading))
            .await
            .unwrap();

        repo.load_medications(
            &drone,
            &[make_medication("ASP_01", 120), make_medication("ASP_01", 120)],
        )
        .await
        .unwrap();

        let loaded = repo.loaded_medications("DR_001").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].quantity, 2);
    }

    #[tokio::test]
    async fn loaded_medications_empty_for_unknown_serial() {
        let repo = make_repo().await;
        let loaded = repo.loaded_medications("MISSING").await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn update_state_with_audit_changes_state_and_appends_entry() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();

        let updated = repo
            .update_state_with_audit(&drone, DroneState::Loading, "Changed state to LOADING")
            .await
            .unwrap();
        assert_eq!(updated.state, DroneState::Loading);

        let logs = repo.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].drone_id, drone.id);
        assert_eq!(logs[0].drone_serial_number, "DR_001");
        assert_eq!(logs[0].event_description, "Changed state to LOADING");
    }

    #[tokio::test]
    async fn record_low_battery_appends_entry_without_touching_state() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 10, DroneState::Delivering))
            .await
            .unwrap();

        repo.record_low_battery(&drone, "Low Battery").await.unwrap();

        let found = repo.find_by_serial("DR_001").await.unwrap().unwrap();
        assert_eq!(found.state, DroneState::Delivering);
        assert_eq!(found.battery_capacity, 10);

        let logs = repo.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event_description, "Low Battery");
    }

    #[tokio::test]
    async fn audit_logs_listed_oldest_first() {
        let repo = make_repo().await;
        let drone = repo
            .insert_drone(&make_new_drone("DR_001", 80, DroneState::Idle))
            .await
            .unwrap();

        repo.update_state_with_audit(&drone, DroneState::Loading, "Changed state to LOADING")
            .await
            .unwrap();
        repo.record_low_battery(&drone, "Low Battery").await.unwrap();

        let logs = repo.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].event_description, "Changed state to LOADING");
        assert_eq!(logs[1].event_description, "Low Battery");
    }
}

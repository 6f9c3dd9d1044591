//! SQLite pool construction and embedded schema migration.
//!
//! [`create_pool`] opens (or creates) the database at the given URL and
//! applies the schema before handing the pool out, so every caller sees a
//! fully migrated database.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS drones (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        serial_number TEXT NOT NULL UNIQUE,
        model TEXT NOT NULL,
        weight_limit INTEGER NOT NULL,
        battery_capacity INTEGER NOT NULL,
        state TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS medications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        weight INTEGER NOT NULL,
        code TEXT NOT NULL UNIQUE,
        image TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS drone_medications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        drone_id INTEGER NOT NULL REFERENCES drones(id),
        medication_id INTEGER NOT NULL REFERENCES medications(id),
        quantity INTEGER NOT NULL,
        UNIQUE (drone_id, medication_id)
    )",
    "CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        drone_id INTEGER NOT NULL,
        drone_serial_number TEXT NOT NULL,
        event_description TEXT NOT NULL,
        event_timestamp TEXT NOT NULL
    )",
];

/// Open a SQLite pool for `database_url` and apply the schema.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // An in-memory database exists per connection, so the pool is pinned to
    // a single connection to keep every handle on the same database.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    Ok(pool)
}

//! SQLite adapter: implementation of `PredictionStore`.
//!
//! Owns the predictions schema and the connection lifecycle. The connection
//! is opened once at startup, guarded by the retry policy below, and then
//! protected by a `Mutex` so each logical operation is a scoped
//! lock → use → release, on every exit path.
//!
//! Per-request writes never retry: a retried insert could duplicate an
//! audit row. The retry window exists only around initial open + schema
//! setup.
//!
//! # Mutex Behavior
//!
//! A poisoned mutex (from panic in another thread) will cause panic. This
//! fail-fast behavior is intentional for audit-trail integrity.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection};

use crate::config::StoreConfig;
use crate::domain::{PredictionRecord, RiskCategory};
use crate::ports::{NewPrediction, PredictionStore};

/// Ceiling applied to listing reads regardless of the caller's limit.
const MAX_LISTING: usize = 1000;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable after {attempts} connection attempts: {detail}")]
    Unavailable { attempts: u32, detail: String },
}

/// Fixed-delay retry for startup-time store acquisition.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Run `op` until it succeeds or `attempts` calls have failed, sleeping
    /// `delay` between consecutive calls.
    ///
    /// # Errors
    /// Returns the number of attempts made and the last error.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, (u32, E)>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut made = 0;
        loop {
            made += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if made < attempts => {
                    tracing::warn!(
                        "Store connection attempt {made}/{attempts} failed: {e}; retrying in {:?}",
                        self.delay
                    );
                    std::thread::sleep(self.delay);
                }
                Err(e) => return Err((made, e)),
            }
        }
    }
}

/// SQLite prediction store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store described by `config`, retrying the initial open and
    /// schema setup with the configured fixed-delay policy.
    ///
    /// This is the only place in the store that retries; see module docs.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` once every attempt has failed.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent() {
            // Best-effort: a missing directory surfaces through the open below.
            let _ = std::fs::create_dir_all(parent);
        }
        let policy = RetryPolicy {
            attempts: config.connect_attempts,
            delay: config.connect_delay,
        };
        let conn = policy
            .run(|| Self::try_open(&config.path))
            .map_err(|(attempts, e)| StoreError::Unavailable {
                attempts,
                detail: e.to_string(),
            })?;

        tracing::info!("Prediction store ready at {}", config.path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn try_open(path: &Path) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(conn)
    }
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            gender TEXT NOT NULL,
            age REAL NOT NULL,
            hypertension INTEGER NOT NULL,
            heart_disease INTEGER NOT NULL,
            avg_glucose_level REAL NOT NULL,
            bmi REAL NOT NULL,
            smoking_status TEXT NOT NULL,
            name TEXT NOT NULL,
            country TEXT NOT NULL,
            province TEXT NOT NULL,
            probability REAL NOT NULL,
            risk_category TEXT NOT NULL,
            contributing_factors TEXT NOT NULL,
            prediction_data TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_predictions_timestamp
            ON predictions(timestamp DESC);
        ",
    )
}

impl PredictionStore for SqliteStore {
    type Error = StoreError;

    fn ensure_schema(&self) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        init_schema(&conn)?;
        Ok(())
    }

    fn insert(&self, prediction: &NewPrediction<'_>) -> Result<i64, Self::Error> {
        let factors = serde_json::to_string(&prediction.result.contributing_factors)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let payload = serde_json::to_string(prediction.payload)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().expect("Lock failed");
        let now = chrono::Utc::now().to_rfc3339();
        let patient = prediction.patient;

        conn.execute(
            r"
            INSERT INTO predictions (
                timestamp, gender, age, hypertension, heart_disease,
                avg_glucose_level, bmi, smoking_status, name, country,
                province, probability, risk_category, contributing_factors,
                prediction_data
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ",
            params![
                now,
                patient.gender.as_str(),
                patient.age,
                i64::from(patient.hypertension),
                i64::from(patient.heart_disease),
                patient.avg_glucose_level,
                patient.bmi,
                patient.smoking_status,
                patient.name,
                patient.country,
                patient.province,
                prediction.result.probability,
                prediction.result.risk_category.as_str(),
                factors,
                payload,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Persisted prediction {id}");
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, Self::Error> {
        let limit = limit.min(MAX_LISTING);
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            r"
            SELECT id, timestamp, gender, age, hypertension, heart_disease,
                   avg_glucose_level, bmi, smoking_status, name, country,
                   province, probability, risk_category, contributing_factors,
                   prediction_data
            FROM predictions
            ORDER BY timestamp DESC, id DESC
            LIMIT ?1
            ",
        )?;

        // Fetch raw rows inside the statement, decode blobs afterwards so
        // JSON errors surface as StoreError rather than a lossy fallback.
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    gender: row.get(2)?,
                    age: row.get(3)?,
                    hypertension: row.get(4)?,
                    heart_disease: row.get(5)?,
                    avg_glucose_level: row.get(6)?,
                    bmi: row.get(7)?,
                    smoking_status: row.get(8)?,
                    name: row.get(9)?,
                    country: row.get(10)?,
                    province: row.get(11)?,
                    probability: row.get(12)?,
                    risk_category: row.get(13)?,
                    contributing_factors: row.get(14)?,
                    prediction_data: row.get(15)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRow::decode).collect()
    }

    fn count(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

struct RawRow {
    id: i64,
    timestamp: String,
    gender: String,
    age: f64,
    hypertension: i64,
    heart_disease: i64,
    avg_glucose_level: f64,
    bmi: f64,
    smoking_status: String,
    name: String,
    country: String,
    province: String,
    probability: f64,
    risk_category: String,
    contributing_factors: String,
    prediction_data: String,
}

impl RawRow {
    fn decode(self) -> Result<PredictionRecord, StoreError> {
        let timestamp = chrono::DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| StoreError::Serialization(format!("row {}: {e}", self.id)))?;
        let contributing_factors: Vec<String> = serde_json::from_str(&self.contributing_factors)
            .map_err(|e| StoreError::Serialization(format!("row {}: {e}", self.id)))?;
        let prediction_data: serde_json::Value = serde_json::from_str(&self.prediction_data)
            .map_err(|e| StoreError::Serialization(format!("row {}: {e}", self.id)))?;

        Ok(PredictionRecord {
            id: self.id,
            timestamp,
            gender: self.gender,
            age: self.age,
            hypertension: self.hypertension as u8,
            heart_disease: self.heart_disease as u8,
            avg_glucose_level: self.avg_glucose_level,
            bmi: self.bmi,
            smoking_status: self.smoking_status,
            name: self.name,
            country: self.country,
            province: self.province,
            probability: self.probability,
            risk_category: RiskCategory::from_str_lossy(&self.risk_category),
            contributing_factors,
            prediction_data,
        })
    }
}

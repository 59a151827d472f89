use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::shared::SyncError;

/// String-keyed configuration store shared with the UI and other services
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;

    /// Writes every entry or none of them
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), SyncError>;
}

/// In-memory implementation of ConfigStore for development and testing
///
/// Values are lost when the process exits. Every `set` counts as a mutation,
/// which lets tests observe how many writes actually reached the store.
pub struct InMemoryConfigStore {
    values: Mutex<HashMap<String, String>>,
    mutations: Mutex<Vec<String>>,
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConfigStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    /// Creates a store with pre-populated values; these do not count as mutations
    pub fn with_values(values: Vec<(&str, &str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.values.lock().unwrap();
            for (key, value) in values {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    /// Number of `set` calls received so far
    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    /// Keys written so far, in write order
    pub fn mutated_keys(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        debug!(key = %key, "Setting config value in memory");

        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.mutations.lock().unwrap().push(key.to_string());
        Ok(())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), SyncError> {
        debug!("Setting config values in memory");

        let mut values = self.values.lock().unwrap();
        let mut mutations = self.mutations.lock().unwrap();
        for (key, value) in entries {
            values.insert(key.clone(), value.clone());
            mutations.push(key.clone());
        }
        Ok(())
    }
}

const UPSERT_VALUE: &str =
    "INSERT INTO plugin_config (config_group, key, value, updated_at) VALUES ($1, $2, $3, now())
     ON CONFLICT (config_group, key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()";

/// PostgreSQL implementation of the config store, one row per (group, key)
pub struct PostgresConfigStore {
    pool: PgPool,
    group: String,
}

impl PostgresConfigStore {
    pub fn new(pool: PgPool, group: impl Into<String>) -> Self {
        Self {
            pool,
            group: group.into(),
        }
    }

    /// Creates the backing table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), SyncError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS plugin_config (
                config_group TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (config_group, key)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create plugin_config table");
            SyncError::Store(e.to_string())
        })?;

        Ok(())
    }
}

#[async_trait]
impl ConfigStore for PostgresConfigStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let row = sqlx::query("SELECT value FROM plugin_config WHERE config_group = $1 AND key = $2")
            .bind(&self.group)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to read config value from database");
                SyncError::Store(e.to_string())
            })?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        debug!(key = %key, group = %self.group, "Writing config value to database");

        sqlx::query(UPSERT_VALUE)
            .bind(&self.group)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, key = %key, "Failed to write config value to database");
                SyncError::Store(e.to_string())
            })?;

        Ok(())
    }

    /// Upserts all entries in one transaction; dropping it on error rolls back
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), SyncError> {
        debug!(group = %self.group, "Writing config values to database");

        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to begin config transaction");
            SyncError::Store(e.to_string())
        })?;

        for (key, value) in entries {
            sqlx::query(UPSERT_VALUE)
                .bind(&self.group)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    warn!(error = %e, key = %key, "Failed to write config value to database");
                    SyncError::Store(e.to_string())
                })?;
        }

        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit config transaction");
            SyncError::Store(e.to_string())
        })?;

        Ok(())
    }
}

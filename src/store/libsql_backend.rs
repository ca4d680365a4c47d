//! libSQL backend for the settings table and the wizard record.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::WizardStore;
use crate::wizard::model::{WizardResult, settings_keys};

/// libSQL-backed settings store.
///
/// Holds a single connection reused for all operations.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    user_id: String,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            user_id: settings_keys::DEFAULT_USER.to_string(),
        })
    }

    /// Raw JSON text stored under `key`.
    pub async fn get_setting(&self, user_id: &str, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get_setting: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_setting: {e}"))),
        }
    }

    pub async fn set_setting(&self, user_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![user_id, key, value, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set_setting: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl WizardStore for LibSqlStore {
    async fn load(&self) -> Result<Option<WizardResult>, StoreError> {
        let Some(raw) = self
            .get_setting(&self.user_id, settings_keys::WIZARD_DATA)
            .await?
        else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                key: settings_keys::WIZARD_DATA.to_string(),
                reason: e.to_string(),
            })
    }

    async fn save(&self, result: &WizardResult) -> Result<(), StoreError> {
        let value =
            serde_json::to_string(result).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_setting(&self.user_id, settings_keys::WIZARD_DATA, &value)
            .await?;
        debug!(
            streets = result.selected_streets.len(),
            offers = result.selected_offers.len(),
            creatives = result.generated_creatives.len(),
            "Saved wizard record"
        );
        Ok(())
    }
}

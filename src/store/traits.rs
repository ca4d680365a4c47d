//! `WizardStore`: typed access to the persisted wizard record.

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::wizard::model::WizardResult;

/// Load/save interface for the `"wizardData"` record.
///
/// Injected into the session host and the dashboard pages instead of reading
/// a global settings table directly.
#[async_trait]
pub trait WizardStore: Send + Sync {
    /// The stored record, or `None` if the wizard was never completed.
    async fn load(&self) -> Result<Option<WizardResult>, StoreError>;

    /// Replace the stored record.
    async fn save(&self, result: &WizardResult) -> Result<(), StoreError>;
}

/// Load the record, treating any failure as "no data yet".
pub async fn load_or_empty(store: &dyn WizardStore) -> Option<WizardResult> {
    match store.load().await {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Failed to load wizard record; showing empty state");
            None
        }
    }
}

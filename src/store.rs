use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::db::Db;
use crate::logging::Timer;
use crate::models::{add_tracking_parameter, SettingsRecord, TrackingParameterList};

/// Storage key holding the serialized [`SettingsRecord`].
pub const SETTINGS_KEY: &str = "settings";

const EVENT_CAPACITY: usize = 100;

/// Broadcast to every open surface after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SettingsEvent {
    SettingsUpdated,
}

/// Read/modify/write access to the single persisted settings record.
#[derive(Clone)]
pub struct SettingsStore {
    db: Db,
    event_tx: broadcast::Sender<SettingsEvent>,
}

impl SettingsStore {
    pub fn new(db: Db) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { db, event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.event_tx.subscribe()
    }

    /// Returns the stored record, or the defaults when nothing was saved yet.
    /// A corrupt entry is logged and treated as missing.
    pub async fn load(&self) -> Result<SettingsRecord> {
        let _timer = Timer::new("settings.load");
        let raw = self
            .db
            .get_entry(SETTINGS_KEY)
            .await
            .context("Failed to read settings")?;

        let record = match raw {
            None => SettingsRecord::default(),
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Stored settings are corrupt, using defaults");
                SettingsRecord::default()
            }),
        };
        Ok(record)
    }

    pub async fn save(&self, record: &SettingsRecord) -> Result<()> {
        let _timer = Timer::new("settings.save");
        let json = serde_json::to_string(record)?;
        self.db
            .set_entry(SETTINGS_KEY, &json)
            .await
            .context("Failed to write settings")?;

        info!(
            tracking_parameters = record.tracking_parameters.len(),
            language = ?record.language,
            theme = ?record.theme,
            "Settings saved"
        );
        self.notify();
        Ok(())
    }

    /// Replaces only the tracking list, keeping language and theme.
    pub async fn save_tracking_parameters(&self, list: TrackingParameterList) -> Result<SettingsRecord> {
        let mut record = self.load().await?;
        record.tracking_parameters = list;
        self.save(&record).await?;
        Ok(record)
    }

    /// Adds `name` to the stored list. Storage is written only when the list changed.
    pub async fn add_and_save_tracking_parameter(&self, name: &str) -> Result<TrackingParameterList> {
        let mut record = self.load().await?;
        let updated = add_tracking_parameter(&record.tracking_parameters, name);
        if updated != record.tracking_parameters {
            record.tracking_parameters = updated.clone();
            self.save(&record).await?;
        } else {
            debug!(name, "Tracking parameter already present or blank");
        }
        Ok(updated)
    }

    /// Drops the stored record so the next load returns the defaults.
    pub async fn reset(&self) -> Result<()> {
        self.db.remove_entry(SETTINGS_KEY).await?;
        info!("Settings reset to defaults");
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        if self.event_tx.send(SettingsEvent::SettingsUpdated).is_err() {
            debug!("No surface is listening for settings updates");
        }
    }
}

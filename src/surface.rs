use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::models::SettingsRecord;
use crate::store::SettingsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Popup,
    Options,
}

/// One extension context with its own local copy of the settings.
///
/// The copy is refreshed from storage after every `settingsUpdated`
/// notification; concurrent writers are last-writer-wins.
pub struct Surface {
    kind: SurfaceKind,
    store: SettingsStore,
    local: watch::Sender<SettingsRecord>,
}

impl Surface {
    pub async fn open(kind: SurfaceKind, store: SettingsStore) -> Result<Self> {
        let record = store.load().await?;
        let (local, _) = watch::channel(record);
        Ok(Self { kind, store, local })
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn settings(&self) -> SettingsRecord {
        self.local.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SettingsRecord> {
        self.local.subscribe()
    }

    pub async fn save(&self, record: SettingsRecord) -> Result<()> {
        self.store.save(&record).await?;
        self.local.send_replace(record);
        Ok(())
    }

    pub async fn reload(&self) -> Result<()> {
        let record = self.store.load().await?;
        self.local.send_replace(record);
        Ok(())
    }

    /// Reloads the local copy whenever the store broadcasts an update.
    ///
    /// The subscription is taken before the task starts, so no notification
    /// sent after this call returns is missed.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let mut rx = self.store.subscribe();
        let store = self.store.clone();
        let local = self.local.clone();
        let kind = self.kind;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(?kind, skipped, "Surface lagged behind settings updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                match store.load().await {
                    Ok(record) => {
                        local.send_replace(record);
                        info!(?kind, "Reloaded settings");
                    }
                    Err(e) => error!(?kind, error = %e, "Failed to reload settings"),
                }
            }
        })
    }
}

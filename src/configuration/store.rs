use tokio::sync::watch;
use tracing::debug;

use crate::models::{DemoSettings, DemoSettingsPatch};

/// Owned, shared demo settings.
///
/// The store is created once at startup and handed to the stage controllers
/// by `Arc`. Every patch is visible to `get()` immediately and wakes every
/// subscriber.
#[derive(Debug)]
pub struct DemoSettingsStore {
    sender: watch::Sender<DemoSettings>,
}

impl DemoSettingsStore {
    /// Create a store seeded with the given settings
    pub fn new(initial: DemoSettings) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    /// Current settings snapshot
    pub fn get(&self) -> DemoSettings {
        *self.sender.borrow()
    }

    /// Shallow-merge `patch` into the current settings and notify subscribers
    pub fn patch(&self, patch: DemoSettingsPatch) -> DemoSettings {
        self.sender.send_modify(|settings| settings.apply(&patch));
        let updated = self.get();
        debug!(?updated, "demo settings patched");
        updated
    }

    /// Put every switch back to its default
    pub fn reset(&self) {
        self.sender.send_replace(DemoSettings::default());
    }

    /// Receive a notification on every patch
    pub fn subscribe(&self) -> watch::Receiver<DemoSettings> {
        self.sender.subscribe()
    }
}

impl Default for DemoSettingsStore {
    fn default() -> Self {
        Self::new(DemoSettings::default())
    }
}

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::media::MediaKind;
use crate::system::KeyValueStore;

/// Storage key for the preferred label of `kind`.
///
/// These names are shared with already persisted data; never rename them.
pub fn storage_key(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::AudioInput => "PREFERRED_AUDIO_INPUT_LABEL",
        MediaKind::AudioOutput => "PREFERRED_AUDIO_OUTPUT_LABEL",
        MediaKind::VideoInput => "PREFERRED_VIDEO_INPUT_LABEL",
    }
}

/// Last chosen display label per media kind, last write wins
pub struct PreferenceStore<S: KeyValueStore> {
    store: S,
    key_prefix: String,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, "")
    }

    /// Prepend `key_prefix` to every storage key
    pub fn with_prefix(store: S, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_for(&self, kind: MediaKind) -> String {
        format!("{}{}", self.key_prefix, storage_key(kind))
    }

    pub fn save(&self, kind: MediaKind, label: &str) -> Result<()> {
        let key = self.key_for(kind);
        self.store
            .set(&key, label)
            .with_context(|| format!("Failed to store preferred {} label", kind))?;
        info!("Saved preferred {} device: {}", kind, label);
        Ok(())
    }

    /// Stored label for `kind`; an empty stored value counts as absent
    pub fn load(&self, kind: MediaKind) -> Result<Option<String>> {
        let key = self.key_for(kind);
        let value = self
            .store
            .get(&key)
            .with_context(|| format!("Failed to read preferred {} label", kind))?
            .filter(|label| !label.is_empty());
        debug!("Preferred {} device: {:?}", kind, value);
        Ok(value)
    }

    pub fn backing_store(&self) -> &S {
        &self.store
    }
}

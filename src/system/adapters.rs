use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{debug, info};

use crate::media::Device;
use crate::system::traits::{
    DeviceChangeCallback, DeviceProvider, FileSystemInterface, KeyValueStore, SubscriptionId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registered device-change callbacks, keyed by subscription id
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, DeviceChangeCallback)>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: DeviceChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.callbacks).push((id, callback));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut callbacks = lock(&self.callbacks);
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        lock(&self.callbacks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered callback
    pub fn notify(&self) {
        let callbacks = lock(&self.callbacks);
        debug!("Notifying {} device change subscribers", callbacks.len());
        for (_, callback) in callbacks.iter() {
            callback();
        }
    }
}

/// Production implementation of FileSystemInterface using std::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write file {}: {}", path.display(), e))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| anyhow::anyhow!("Failed to create directory: {}", e))
    }

    fn get_modified_time(&self, path: &Path) -> Result<SystemTime> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| anyhow::anyhow!("Failed to get file metadata: {}", e))?;
        metadata
            .modified()
            .map_err(|e| anyhow::anyhow!("Failed to get modified time: {}", e))
    }
}

/// In-process key-value store. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Key-value store persisted as a flat TOML table
pub struct FileStore<F: FileSystemInterface> {
    file_system: F,
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl<F: FileSystemInterface> FileStore<F> {
    pub fn new(file_system: F, path: PathBuf) -> Self {
        Self {
            file_system,
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        if !self.file_system.file_exists(&self.path) {
            return Ok(BTreeMap::new());
        }

        let content = self
            .file_system
            .read_file(&self.path)
            .with_context(|| format!("Failed to read preference file: {}", self.path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse preference file: {}", self.path.display()))
    }
}

impl FileStore<StandardFileSystem> {
    pub fn new_production(path: PathBuf) -> Self {
        Self::new(StandardFileSystem, path)
    }
}

impl<F: FileSystemInterface> KeyValueStore for FileStore<F> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_table()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = lock(&self.write_lock);

        let mut table = self.read_table()?;
        table.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            self.file_system.create_dir(parent).with_context(|| {
                format!("Failed to create preference directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string(&table).context("Failed to serialize preferences")?;
        self.file_system
            .write_file(&self.path, &content)
            .with_context(|| format!("Failed to write preference file: {}", self.path.display()))?;

        debug!("Stored '{}' in {}", key, self.path.display());
        Ok(())
    }
}

/// On-disk device inventory: `[[devices]]` tables with device_id, kind, label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInventory {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Device provider backed by an inventory file.
///
/// Device changes are detected by [`InventoryProvider::poll_for_changes`],
/// which fires subscribers when the file's modified time moves.
pub struct InventoryProvider<F: FileSystemInterface> {
    file_system: F,
    inventory_path: PathBuf,
    callbacks: CallbackRegistry,
    last_modified: Mutex<Option<SystemTime>>,
}

impl<F: FileSystemInterface> InventoryProvider<F> {
    pub fn new(file_system: F, inventory_path: PathBuf) -> Self {
        let last_modified = file_system.get_modified_time(&inventory_path).ok();
        Self {
            file_system,
            inventory_path,
            callbacks: CallbackRegistry::new(),
            last_modified: Mutex::new(last_modified),
        }
    }

    pub fn inventory_path(&self) -> &Path {
        &self.inventory_path
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }

    fn read_inventory(&self) -> Result<DeviceInventory> {
        let content = self
            .file_system
            .read_file(&self.inventory_path)
            .with_context(|| {
                format!(
                    "Failed to read device inventory: {}",
                    self.inventory_path.display()
                )
            })?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse device inventory: {}",
                self.inventory_path.display()
            )
        })
    }

    /// Compare the inventory's modified time with the last observed one and
    /// notify subscribers when it changed. Returns whether a change was seen.
    pub fn poll_for_changes(&self) -> bool {
        let current = self
            .file_system
            .get_modified_time(&self.inventory_path)
            .ok();

        let changed = {
            let mut last = lock(&self.last_modified);
            if *last != current {
                *last = current;
                true
            } else {
                false
            }
        };

        if changed {
            info!(
                "Device inventory changed: {}",
                self.inventory_path.display()
            );
            self.callbacks.notify();
        }
        changed
    }

    /// Notify subscribers without checking the file (e.g. on SIGHUP)
    pub fn trigger_device_change(&self) {
        self.callbacks.notify();
    }
}

impl InventoryProvider<StandardFileSystem> {
    pub fn new_production(inventory_path: PathBuf) -> Self {
        Self::new(StandardFileSystem, inventory_path)
    }
}

impl<F: FileSystemInterface> DeviceProvider for InventoryProvider<F> {
    async fn enumerate(&self) -> Result<Vec<Device>> {
        let inventory = self.read_inventory()?;
        debug!(
            "Inventory {} lists {} devices",
            self.inventory_path.display(),
            inventory.devices.len()
        );
        Ok(inventory.devices)
    }

    fn subscribe(&self, callback: DeviceChangeCallback) -> Result<SubscriptionId> {
        Ok(self.callbacks.add(callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        if !self.callbacks.remove(id) {
            debug!("Ignoring unsubscribe for unknown subscription {:?}", id);
        }
        Ok(())
    }
}

impl<P: DeviceProvider + ?Sized> DeviceProvider for Arc<P> {
    fn enumerate(&self) -> impl std::future::Future<Output = Result<Vec<Device>>> + Send {
        (**self).enumerate()
    }

    fn subscribe(&self, callback: DeviceChangeCallback) -> Result<SubscriptionId> {
        (**self).subscribe(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        (**self).unsubscribe(id)
    }
}

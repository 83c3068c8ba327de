use anyhow::Result;
use std::future::Future;
use std::path::Path;

use crate::media::Device;

/// Callback invoked when the device topology changes
pub type DeviceChangeCallback = Box<dyn Fn() + Send + Sync>;

/// Handle returned by [`DeviceProvider::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Trait for device enumeration - abstracts the platform's media device service
pub trait DeviceProvider: Send + Sync {
    /// Enumerate every device the platform currently exposes, in platform order
    fn enumerate(&self) -> impl Future<Output = Result<Vec<Device>>> + Send;

    /// Register a callback for device change notifications
    /// The callback will be invoked when devices are plugged in or removed
    fn subscribe(&self, callback: DeviceChangeCallback) -> Result<SubscriptionId>;

    /// Remove a previously registered callback. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}

/// Trait for string key-value persistence - abstracts browser-style local storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface: Send + Sync {
    /// Read the entire contents of a file
    fn read_file(&self, path: &Path) -> Result<String>;

    /// Write content to a file, replacing it
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a file exists
    fn file_exists(&self, path: &Path) -> bool;

    /// Create the directory structure for a file
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Get the last modified time of a file (for watching changes)
    fn get_modified_time(&self, path: &Path) -> Result<std::time::SystemTime>;
}

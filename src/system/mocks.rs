use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::media::Device;
use crate::system::adapters::CallbackRegistry;
use crate::system::traits::{
    DeviceChangeCallback, DeviceProvider, FileSystemInterface, SubscriptionId,
};

/// Mock device provider for testing - provides controllable device behavior
#[derive(Clone, Default)]
pub struct MockDeviceProvider {
    pub devices: Arc<Mutex<Vec<Device>>>,
    pub callbacks: Arc<CallbackRegistry>,
    pub enumerate_calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub should_fail_enumeration: Arc<AtomicBool>,
    pub should_hang: Arc<AtomicBool>,
    pub enumeration_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockDeviceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<Device>) -> Self {
        let provider = Self::new();
        provider.set_devices(devices);
        provider
    }

    /// Replace the device list without notifying subscribers
    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Append a device without notifying subscribers
    pub fn add_device(&self, device: Device) {
        self.devices.lock().unwrap().push(device);
    }

    /// Append a device and notify subscribers, like a hot-plug event
    pub fn plug_in(&self, device: Device) {
        self.add_device(device);
        self.trigger_device_change();
    }

    /// Remove a device by id and notify subscribers
    pub fn unplug(&self, device_id: &str) {
        self.devices
            .lock()
            .unwrap()
            .retain(|d| d.device_id != device_id);
        self.trigger_device_change();
    }

    /// Trigger all registered device change callbacks
    pub fn trigger_device_change(&self) {
        self.callbacks.notify();
    }

    /// Configure the mock to fail enumeration
    pub fn set_enumeration_failure(&self, should_fail: bool) {
        self.should_fail_enumeration
            .store(should_fail, Ordering::SeqCst);
    }

    /// Configure the mock to never answer enumeration requests
    pub fn set_hang(&self, should_hang: bool) {
        self.should_hang.store(should_hang, Ordering::SeqCst);
    }

    /// Delay every enumeration by `delay`
    pub fn set_enumeration_delay(&self, delay: Option<Duration>) {
        *self.enumeration_delay.lock().unwrap() = delay;
    }

    pub fn enumerate_call_count(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    /// Highest number of enumerations observed running at once
    pub fn max_concurrent_enumerations(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Enumerations currently awaiting an answer
    pub fn enumerations_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<Vec<Device>> {
        if self.should_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let delay = *self.enumeration_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail_enumeration.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Mock enumeration failure"));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    /// Get count of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }
}

/// Counts one enumeration as in flight until dropped, including when the
/// enumeration future is cancelled mid-await
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DeviceProvider for MockDeviceProvider {
    async fn enumerate(&self) -> Result<Vec<Device>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
        self.answer().await
    }

    fn subscribe(&self, callback: DeviceChangeCallback) -> Result<SubscriptionId> {
        Ok(self.callbacks.add(callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.callbacks.remove(id);
        Ok(())
    }
}

/// Mock file system for testing - in-memory files with call recording
#[derive(Clone)]
pub struct MockFileSystem {
    pub files: Arc<Mutex<HashMap<PathBuf, String>>>,
    pub modified_times: Arc<Mutex<HashMap<PathBuf, SystemTime>>>,
    pub read_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub directory_creation_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub should_fail_read: Arc<Mutex<bool>>,
    pub should_fail_write: Arc<Mutex<bool>>,
    pub should_fail_create_dir: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            modified_times: Arc::new(Mutex::new(HashMap::new())),
            read_calls: Arc::new(Mutex::new(Vec::new())),
            write_calls: Arc::new(Mutex::new(Vec::new())),
            directory_creation_calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_read: Arc::new(Mutex::new(false)),
            should_fail_write: Arc::new(Mutex::new(false)),
            should_fail_create_dir: Arc::new(Mutex::new(false)),
        }
    }

    /// Add a file to the mock file system
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content);
    }

    /// Remove a file from the mock file system
    pub fn remove_file<P: AsRef<Path>>(&self, path: P) {
        self.files.lock().unwrap().remove(path.as_ref());
        self.modified_times.lock().unwrap().remove(path.as_ref());
    }

    /// Override the modified time reported for a file
    pub fn set_modified_time<P: AsRef<Path>>(&self, path: P, time: SystemTime) {
        self.modified_times
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), time);
    }

    /// Get all read calls that were made
    pub fn get_read_calls(&self) -> Vec<PathBuf> {
        self.read_calls.lock().unwrap().clone()
    }

    /// Get all write calls that were made
    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    /// Get all directory creation calls that were made
    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.directory_creation_calls.lock().unwrap().clone()
    }

    /// Clear all call histories
    pub fn clear_call_history(&self) {
        self.read_calls.lock().unwrap().clear();
        self.write_calls.lock().unwrap().clear();
        self.directory_creation_calls.lock().unwrap().clear();
    }

    /// Configure the mock to fail read operations
    pub fn set_read_failure(&self, should_fail: bool) {
        *self.should_fail_read.lock().unwrap() = should_fail;
    }

    /// Configure the mock to fail write operations
    pub fn set_write_failure(&self, should_fail: bool) {
        *self.should_fail_write.lock().unwrap() = should_fail;
    }

    /// Configure the mock to fail directory creation
    pub fn set_create_dir_failure(&self, should_fail: bool) {
        *self.should_fail_create_dir.lock().unwrap() = should_fail;
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        self.read_calls.lock().unwrap().push(path.to_path_buf());

        if *self.should_fail_read.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock read failure"));
        }

        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));

        if *self.should_fail_write.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock write failure"));
        }

        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.directory_creation_calls
            .lock()
            .unwrap()
            .push(path.to_path_buf());

        if *self.should_fail_create_dir.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock create directory failure"));
        }

        Ok(())
    }

    fn get_modified_time(&self, path: &Path) -> Result<SystemTime> {
        if !self.file_exists(path) {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
        // Fixed time unless a test overrides it
        Ok(self
            .modified_times
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(SystemTime::UNIX_EPOCH + Duration::from_secs(1000)))
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

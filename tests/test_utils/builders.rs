//! Test utility builders for creating device records and controls
//!
//! Individual helpers may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use std::sync::Arc;

use media_device_select::{
    Device, DeviceSelect, MediaKind, MemoryStore, MockDeviceProvider, PreferenceStore,
};

/// Builder for creating test Device instances
pub struct DeviceBuilder {
    device_id: String,
    kind: MediaKind,
    label: String,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self {
            device_id: "test_device_1".to_string(),
            kind: MediaKind::AudioInput,
            label: "Test Device".to_string(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.device_id = id.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Label withheld, as before permission is granted
    pub fn unlabelled(mut self) -> Self {
        self.label.clear();
        self
    }

    /// Placeholder record with no device id
    pub fn placeholder(mut self) -> Self {
        self.device_id.clear();
        self.label.clear();
        self
    }

    pub fn audio_input(mut self) -> Self {
        self.kind = MediaKind::AudioInput;
        self
    }

    pub fn audio_output(mut self) -> Self {
        self.kind = MediaKind::AudioOutput;
        self
    }

    pub fn video_input(mut self) -> Self {
        self.kind = MediaKind::VideoInput;
        self
    }

    pub fn build(self) -> Device {
        Device::new(self.device_id, self.kind, self.label)
    }
}

impl Default for DeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub type TestControl = DeviceSelect<MockDeviceProvider, MemoryStore>;

/// Control over a mock provider and a fresh in-memory store
pub fn control_for(kind: MediaKind, provider: &MockDeviceProvider) -> (TestControl, MemoryStore) {
    let store = MemoryStore::new();
    let control = control_with_store(kind, provider, &store);
    (control, store)
}

/// Control over a mock provider sharing an existing store
pub fn control_with_store(
    kind: MediaKind,
    provider: &MockDeviceProvider,
    store: &MemoryStore,
) -> TestControl {
    DeviceSelect::new(
        kind,
        Arc::new(provider.clone()),
        PreferenceStore::new(store.clone()),
    )
    .expect("Failed to create test control")
}

/// Helper functions for creating common test scenarios
pub mod scenarios {
    use super::*;

    pub fn built_in_mic() -> Device {
        DeviceBuilder::new().id("d1").label("Built-in Mic").build()
    }

    pub fn usb_mic() -> Device {
        DeviceBuilder::new().id("d2").label("USB Mic").build()
    }

    /// Microphones with devices of other kinds interleaved
    pub fn mixed_inventory() -> Vec<Device> {
        vec![
            built_in_mic(),
            DeviceBuilder::new()
                .id("spk")
                .label("Speakers")
                .audio_output()
                .build(),
            usb_mic(),
            DeviceBuilder::new()
                .id("cam")
                .label("Webcam")
                .video_input()
                .build(),
        ]
    }

    /// Three microphones whose labels are still withheld
    pub fn unlabelled_mics() -> Vec<Device> {
        vec![
            DeviceBuilder::new().id("m1").unlabelled().build(),
            DeviceBuilder::new().id("m2").unlabelled().build(),
            DeviceBuilder::new().id("m3").unlabelled().build(),
        ]
    }
}

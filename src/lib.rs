pub mod config;
pub mod control;
pub mod logging;
pub mod media;
pub mod preferences;
pub mod reconcile;
pub mod service;
pub mod system;

pub use config::{Config, ConfigLoader};
pub use control::{ControlEvent, DeviceSelect, RenderOptions};
pub use media::{Device, DeviceCatalog, MediaKind, MediaStream, MediaTrack};
pub use preferences::PreferenceStore;
pub use reconcile::{EntryList, SelectionHint, UiEntry};
pub use system::{
    DeviceProvider, FileStore, FileSystemInterface, InventoryProvider, KeyValueStore,
    MemoryStore, StandardFileSystem,
};

#[cfg(any(test, feature = "test-mocks"))]
pub use system::{MockDeviceProvider, MockFileSystem};

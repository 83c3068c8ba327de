use std::sync::Arc;

use media_device_select::media::{labels_visible, label_for};
use media_device_select::preferences::storage_key;
use media_device_select::{
    DeviceCatalog, FileStore, KeyValueStore, MediaKind, MemoryStore, MockDeviceProvider,
    PreferenceStore,
};

mod test_utils;
use test_utils::builders::{DeviceBuilder, scenarios};

/// Permission inference from label visibility
#[cfg(test)]
mod permission_inference {
    use super::*;

    #[tokio::test]
    async fn test_all_labelled_means_granted() {
        let provider = MockDeviceProvider::with_devices(scenarios::mixed_inventory());
        let catalog = DeviceCatalog::new(Arc::new(provider));

        assert!(catalog.permission_granted(MediaKind::AudioInput).await.unwrap());
    }

    #[tokio::test]
    async fn test_any_unlabelled_means_withheld() {
        let mut devices = scenarios::mixed_inventory();
        devices.push(DeviceBuilder::new().id("d9").unlabelled().build());
        let catalog = DeviceCatalog::new(Arc::new(MockDeviceProvider::with_devices(devices)));

        assert!(!catalog.permission_granted(MediaKind::AudioInput).await.unwrap());
        // Other kinds are judged on their own devices
        assert!(catalog.permission_granted(MediaKind::VideoInput).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_devices_counts_as_granted() {
        let catalog = DeviceCatalog::new(Arc::new(MockDeviceProvider::new()));

        assert!(catalog.permission_granted(MediaKind::VideoInput).await.unwrap());
        assert!(labels_visible(&[]));
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_a_permission_answer() {
        let provider = MockDeviceProvider::with_devices(scenarios::mixed_inventory());
        provider.set_enumeration_failure(true);
        let catalog = DeviceCatalog::new(Arc::new(provider));

        assert!(catalog.permission_granted(MediaKind::AudioInput).await.is_err());
    }
}

/// Display label resolution
#[cfg(test)]
mod labels {
    use super::*;

    #[test]
    fn test_video_fallback_at_index_two() {
        let device = DeviceBuilder::new().id("v").unlabelled().video_input().build();
        assert_eq!(label_for(&device, 2), "Video Input 3");
    }

    #[tokio::test]
    async fn test_fallback_index_counts_within_kind_only() {
        let devices = vec![
            DeviceBuilder::new().id("spk").unlabelled().audio_output().build(),
            DeviceBuilder::new().id("m1").unlabelled().build(),
            DeviceBuilder::new().id("cam").unlabelled().video_input().build(),
            DeviceBuilder::new().id("m2").unlabelled().build(),
        ];
        let catalog = DeviceCatalog::new(Arc::new(MockDeviceProvider::with_devices(devices)));

        let mics = catalog.list_devices(MediaKind::AudioInput).await.unwrap();
        let labels: Vec<String> = mics
            .iter()
            .enumerate()
            .map(|(i, d)| label_for(d, i))
            .collect();
        assert_eq!(labels, vec!["Audio Input 1", "Audio Input 2"]);
    }
}

/// Preference persistence
#[cfg(test)]
mod preference_store {
    use super::*;

    #[test]
    fn test_round_trip_and_kind_isolation() {
        let prefs = PreferenceStore::new(MemoryStore::new());
        prefs.save(MediaKind::AudioInput, "USB Mic").unwrap();

        assert_eq!(
            prefs.load(MediaKind::AudioInput).unwrap().as_deref(),
            Some("USB Mic")
        );
        assert_eq!(prefs.load(MediaKind::AudioOutput).unwrap(), None);
    }

    #[test]
    fn test_storage_keys_are_stable() {
        assert_eq!(storage_key(MediaKind::AudioInput), "PREFERRED_AUDIO_INPUT_LABEL");
        assert_eq!(storage_key(MediaKind::AudioOutput), "PREFERRED_AUDIO_OUTPUT_LABEL");
        assert_eq!(storage_key(MediaKind::VideoInput), "PREFERRED_VIDEO_INPUT_LABEL");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/preferences.toml");

        {
            let prefs = PreferenceStore::new(FileStore::new_production(path.clone()));
            prefs.save(MediaKind::VideoInput, "Webcam \"HD\"").unwrap();
            prefs.save(MediaKind::AudioInput, "USB Mic").unwrap();
        }

        let reopened = PreferenceStore::new(FileStore::new_production(path.clone()));
        assert_eq!(
            reopened.load(MediaKind::VideoInput).unwrap().as_deref(),
            Some("Webcam \"HD\"")
        );
        assert_eq!(
            reopened.load(MediaKind::AudioInput).unwrap().as_deref(),
            Some("USB Mic")
        );
        assert_eq!(reopened.load(MediaKind::AudioOutput).unwrap(), None);
    }

    #[test]
    fn test_corrupt_preference_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "PREFERRED_AUDIO_INPUT_LABEL = ").unwrap();

        let store = FileStore::new_production(path);
        assert!(store.get("PREFERRED_AUDIO_INPUT_LABEL").is_err());
    }
}

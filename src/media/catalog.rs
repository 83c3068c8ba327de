use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use super::device::{Device, MediaKind};
use crate::system::DeviceProvider;

/// Whether device labels are visible for a device sequence.
///
/// Platforms withhold labels until the user grants access, so label
/// visibility stands in for a direct permission query. An empty sequence
/// counts as granted.
pub fn labels_visible(devices: &[Device]) -> bool {
    devices.iter().all(Device::has_label)
}

/// Kind-filtered view over a device provider
pub struct DeviceCatalog<P: DeviceProvider> {
    provider: Arc<P>,
}

impl<P: DeviceProvider> Clone for DeviceCatalog<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: DeviceProvider> DeviceCatalog<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Query the provider once and keep devices of `kind`, in provider order.
    /// Provider failures propagate unchanged apart from added context.
    pub async fn list_devices(&self, kind: MediaKind) -> Result<Vec<Device>> {
        let devices = self
            .provider
            .enumerate()
            .await
            .with_context(|| format!("Failed to enumerate {} devices", kind))?;

        let filtered: Vec<Device> = devices.into_iter().filter(|d| d.kind == kind).collect();
        debug!("Found {} {} devices", filtered.len(), kind);
        Ok(filtered)
    }

    /// Inferred permission state for `kind`, see [`labels_visible`]
    pub async fn permission_granted(&self, kind: MediaKind) -> Result<bool> {
        let devices = self.list_devices(kind).await?;
        let granted = labels_visible(&devices);
        debug!("Permission for {} devices granted: {}", kind, granted);
        Ok(granted)
    }
}

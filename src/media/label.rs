use super::device::Device;

/// Display text for a device at `index` in the filtered device sequence.
///
/// Withheld labels fall back to `"<Kind> <index + 1>"`, which is only stable
/// for one render pass since provider ordering may change between passes.
pub fn label_for(device: &Device, index: usize) -> String {
    if device.has_label() {
        device.label.clone()
    } else {
        format!("{} {}", device.kind.display_name(), index + 1)
    }
}

//! Render decisions, computed without touching the entry list.

use tracing::debug;

use crate::media::{Device, label_for};

/// Explicit selection target for a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionHint {
    /// Select the entry whose display text equals this label
    Label(String),
    /// Select the entry for this device id
    DeviceId(String),
}

impl SelectionHint {
    /// Whether an entry with this key and display text satisfies the hint
    pub fn matches(&self, key: &str, display_text: &str) -> bool {
        match self {
            SelectionHint::Label(label) => label == display_text,
            SelectionHint::DeviceId(id) => id == key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub key: String,
    pub display_text: String,
}

/// Desired entries, in provider order, plus the key that must end up selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPlan {
    pub entries: Vec<PlannedEntry>,
    pub selected: Option<String>,
}

impl RenderPlan {
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }
}

/// Decide the entries and selection for one render pass.
///
/// `devices` must already be filtered to one kind; fallback labels use each
/// device's position in that sequence, placeholders included. Placeholder
/// records (empty id) never become entries. The first entry matching `hint`
/// wins; otherwise the entry whose key equals `previous`. With neither, no
/// key is forced and the list keeps its own default.
pub fn plan_render(
    devices: &[Device],
    previous: Option<&str>,
    hint: Option<&SelectionHint>,
) -> RenderPlan {
    let entries: Vec<PlannedEntry> = devices
        .iter()
        .enumerate()
        .filter(|(_, device)| !device.is_placeholder())
        .map(|(index, device)| PlannedEntry {
            key: device.device_id.clone(),
            display_text: label_for(device, index),
        })
        .collect();

    let from_hint = hint.and_then(|hint| {
        entries
            .iter()
            .find(|e| hint.matches(&e.key, &e.display_text))
    });
    let from_previous =
        || previous.and_then(|previous| entries.iter().find(|e| e.key == previous));

    let selected = from_hint.or_else(from_previous).map(|e| e.key.clone());

    debug!(
        "Planned {} entries, selected: {:?}",
        entries.len(),
        selected
    );

    RenderPlan { entries, selected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    fn mics() -> Vec<Device> {
        vec![
            Device::new("d1", MediaKind::AudioInput, "Built-in Mic"),
            Device::new("d2", MediaKind::AudioInput, "USB Mic"),
            Device::new("d3", MediaKind::AudioInput, "Headset"),
        ]
    }

    #[test]
    fn test_placeholders_are_skipped_but_keep_their_index() {
        let devices = vec![
            Device::new("", MediaKind::VideoInput, ""),
            Device::new("cam", MediaKind::VideoInput, ""),
        ];
        let plan = plan_render(&devices, None, None);

        assert_eq!(plan.keys(), vec!["cam"]);
        assert_eq!(plan.entries[0].display_text, "Video Input 2");
    }

    #[test]
    fn test_hint_beats_previous() {
        let hint = SelectionHint::Label("Headset".to_string());
        let plan = plan_render(&mics(), Some("d2"), Some(&hint));
        assert_eq!(plan.selected.as_deref(), Some("d3"));
    }

    #[test]
    fn test_previous_used_when_hint_misses() {
        let hint = SelectionHint::Label("Unplugged Mic".to_string());
        let plan = plan_render(&mics(), Some("d2"), Some(&hint));
        assert_eq!(plan.selected.as_deref(), Some("d2"));
    }

    #[test]
    fn test_device_id_hint() {
        let hint = SelectionHint::DeviceId("d3".to_string());
        let plan = plan_render(&mics(), Some("d1"), Some(&hint));
        assert_eq!(plan.selected.as_deref(), Some("d3"));
    }

    #[test]
    fn test_first_label_match_wins() {
        let devices = vec![
            Device::new("a", MediaKind::AudioOutput, "Speakers"),
            Device::new("b", MediaKind::AudioOutput, "Speakers"),
        ];
        let hint = SelectionHint::Label("Speakers".to_string());
        let plan = plan_render(&devices, None, Some(&hint));
        assert_eq!(plan.selected.as_deref(), Some("a"));
    }

    #[test]
    fn test_no_selection_forced_without_inputs() {
        let plan = plan_render(&mics(), Some("gone"), None);
        assert_eq!(plan.selected, None);
        assert_eq!(plan.entries.len(), 3);
    }
}

use crate::reconcile::SelectionHint;

/// Work items consumed by a control's event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Device topology changed; triggers a full re-render
    DevicesChanged,
    /// The user picked the entry with this display text. It is already
    /// persisted when the event is queued.
    SelectionChanged(String),
    /// Stop the event loop
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Entry to select in preference to the previous selection
    pub selected: Option<SelectionHint>,
}

impl RenderOptions {
    pub fn select_label(label: impl Into<String>) -> Self {
        Self {
            selected: Some(SelectionHint::Label(label.into())),
        }
    }

    pub fn select_device(device_id: impl Into<String>) -> Self {
        Self {
            selected: Some(SelectionHint::DeviceId(device_id.into())),
        }
    }
}

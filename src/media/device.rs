use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The class of device a selection control is bound to.
///
/// Serialized with the same spelling the host page uses in the control's
/// `data-type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "audioinput")]
    AudioInput,
    #[serde(rename = "audiooutput")]
    AudioOutput,
    #[serde(rename = "videoinput")]
    VideoInput,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [
        MediaKind::AudioInput,
        MediaKind::AudioOutput,
        MediaKind::VideoInput,
    ];

    /// Attribute spelling, e.g. `audioinput`
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::AudioInput => "audioinput",
            MediaKind::AudioOutput => "audiooutput",
            MediaKind::VideoInput => "videoinput",
        }
    }

    /// Prefix used for fallback labels when the real label is withheld
    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::AudioInput => "Audio Input",
            MediaKind::AudioOutput => "Audio Output",
            MediaKind::VideoInput => "Video Input",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audioinput" | "audio-input" => Ok(MediaKind::AudioInput),
            "audiooutput" | "audio-output" => Ok(MediaKind::AudioOutput),
            "videoinput" | "video-input" => Ok(MediaKind::VideoInput),
            other => bail!(
                "Unknown media kind '{}' (expected audioinput, audiooutput or videoinput)",
                other
            ),
        }
    }
}

/// One device record as reported by the enumeration provider.
///
/// `label` is empty while the user has not granted access to devices of
/// this kind; `device_id` is empty for placeholder records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub label: String,
}

impl Device {
    pub fn new(device_id: impl Into<String>, kind: MediaKind, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
            label: label.into(),
        }
    }

    pub fn has_label(&self) -> bool {
        !self.label.is_empty()
    }

    /// Placeholder records carry no id and never become selectable
    pub fn is_placeholder(&self) -> bool {
        self.device_id.is_empty()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            if self.label.is_empty() {
                "<label withheld>"
            } else {
                self.label.as_str()
            },
            self.kind,
            if self.device_id.is_empty() {
                "<no id>"
            } else {
                self.device_id.as_str()
            }
        )
    }
}

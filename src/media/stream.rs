use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::device::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A live capture track; only its metadata is consumed here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub kind: TrackKind,
    pub label: String,
}

impl MediaTrack {
    pub fn audio(label: impl Into<String>) -> Self {
        Self {
            kind: TrackKind::Audio,
            label: label.into(),
        }
    }

    pub fn video(label: impl Into<String>) -> Self {
        Self {
            kind: TrackKind::Video,
            label: label.into(),
        }
    }
}

/// An active capture association, reduced to the tracks it carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    pub tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }
}

/// Label of the device a stream is actually using for `kind`.
///
/// Audio input reads the first audio track, video input the first video
/// track. Output devices are not observable through a capture stream.
pub fn label_from_stream(stream: &MediaStream, kind: MediaKind) -> Result<String> {
    let track = match kind {
        MediaKind::AudioInput => stream.audio_tracks().next(),
        MediaKind::VideoInput => stream.video_tracks().next(),
        MediaKind::AudioOutput => {
            bail!("Stream-driven selection does not apply to audio output devices")
        }
    };

    match track {
        Some(track) => Ok(track.label.clone()),
        None => bail!("Stream has no track for {} devices", kind),
    }
}

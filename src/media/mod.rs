pub mod catalog;
pub mod device;
pub mod label;
pub mod stream;

pub use catalog::{DeviceCatalog, labels_visible};
pub use device::{Device, MediaKind};
pub use label::label_for;
pub use stream::{MediaStream, MediaTrack, TrackKind, label_from_stream};

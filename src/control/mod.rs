pub mod events;
pub mod select;

pub use events::{ControlEvent, RenderOptions};
pub use select::DeviceSelect;

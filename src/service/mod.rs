pub mod signals;

pub use signals::{SignalHandler, SignalType};

pub mod store;

pub use store::{PreferenceStore, storage_key};

pub mod entries;
pub mod plan;

pub use entries::{EntryList, UiEntry};
pub use plan::{PlannedEntry, RenderPlan, SelectionHint, plan_render};

//! Ordered, single-selection entry list.
//!
//! Behaves like a single-choice list widget: selecting an entry deselects all
//! others, and whenever the list is non-empty with nothing selected the first
//! entry becomes selected.

use serde::Serialize;
use tracing::debug;

use super::plan::RenderPlan;

/// One selectable option, keyed by device id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiEntry {
    pub key: String,
    pub display_text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EntryList {
    entries: Vec<UiEntry>,
    // Bumped whenever the selected key changes
    revision: u64,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[UiEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&UiEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn find_by_text(&self, text: &str) -> Option<&UiEntry> {
        self.entries.iter().find(|e| e.display_text == text)
    }

    pub fn selected(&self) -> Option<&UiEntry> {
        self.entries.iter().find(|e| e.selected)
    }

    /// Key of the selected entry, the list's current value
    pub fn value(&self) -> Option<&str> {
        self.selected().map(|e| e.key.as_str())
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selected().map(|e| e.display_text.as_str())
    }

    /// Append an entry for `key` unless one exists. Returns true if created.
    pub fn find_or_create(&mut self, key: &str) -> bool {
        if self.get(key).is_some() {
            return false;
        }
        let previous = self.value().map(str::to_string);
        self.entries.push(UiEntry {
            key: key.to_string(),
            display_text: String::new(),
            selected: false,
        });
        self.ensure_selection();
        self.bump_if_changed(previous.as_deref());
        true
    }

    pub fn relabel(&mut self, key: &str, text: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            if entry.display_text != text {
                entry.display_text = text.to_string();
            }
        }
    }

    /// Set or clear the selection flag of one entry
    pub fn set_selected(&mut self, key: &str, selected: bool) {
        let previous = self.value().map(str::to_string);

        if selected {
            if self.get(key).is_none() {
                return;
            }
            for entry in &mut self.entries {
                entry.selected = entry.key == key;
            }
        } else if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.selected = false;
            self.ensure_selection();
        }

        self.bump_if_changed(previous.as_deref());
    }

    /// Make the entry whose text is `label` the sole selected entry.
    ///
    /// Returns false without touching the list when nothing matches or the
    /// match is already selected.
    pub fn select_by_label(&mut self, label: &str) -> bool {
        let key = match self.find_by_text(label) {
            Some(entry) if !entry.selected => entry.key.clone(),
            Some(_) => {
                debug!("Entry '{}' already selected", label);
                return false;
            }
            None => {
                debug!("No entry labelled '{}'", label);
                return false;
            }
        };
        self.set_selected(&key, true);
        true
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        let had_selection = self.value().is_some();
        self.entries.clear();
        if had_selection {
            self.revision += 1;
        }
    }

    /// Apply a render plan: create missing entries in plan order, relabel
    /// them and set their selection flags. Entries absent from the plan stay.
    pub fn apply(&mut self, plan: &RenderPlan) {
        for planned in &plan.entries {
            self.find_or_create(&planned.key);
            self.relabel(&planned.key, &planned.display_text);
            let selected = plan.selected.as_deref() == Some(planned.key.as_str());
            self.set_selected(&planned.key, selected);
        }
    }

    fn ensure_selection(&mut self) {
        if !self.entries.iter().any(|e| e.selected) {
            if let Some(first) = self.entries.first_mut() {
                first.selected = true;
            }
        }
    }

    fn bump_if_changed(&mut self, previous: Option<&str>) {
        if self.value() != previous {
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(keys: &[(&str, &str)]) -> EntryList {
        let mut list = EntryList::new();
        for (key, text) in keys {
            list.find_or_create(key);
            list.relabel(key, text);
        }
        list
    }

    #[test]
    fn test_first_entry_is_selected_by_default() {
        let list = list(&[("d1", "Built-in Mic"), ("d2", "USB Mic")]);
        assert_eq!(list.value(), Some("d1"));
        assert_eq!(list.entries().iter().filter(|e| e.selected).count(), 1);
    }

    #[test]
    fn test_selecting_one_deselects_others() {
        let mut list = list(&[("d1", "A"), ("d2", "B"), ("d3", "C")]);
        list.set_selected("d3", true);
        list.set_selected("d2", true);

        assert_eq!(list.value(), Some("d2"));
        assert_eq!(list.entries().iter().filter(|e| e.selected).count(), 1);
    }

    #[test]
    fn test_deselecting_falls_back_to_first() {
        let mut list = list(&[("d1", "A"), ("d2", "B")]);
        list.set_selected("d2", true);
        list.set_selected("d2", false);
        assert_eq!(list.value(), Some("d1"));
    }

    #[test]
    fn test_select_unknown_key_is_ignored() {
        let mut list = list(&[("d1", "A")]);
        let revision = list.revision();
        list.set_selected("nope", true);
        assert_eq!(list.value(), Some("d1"));
        assert_eq!(list.revision(), revision);
    }

    #[test]
    fn test_select_by_label_no_op_when_current() {
        let mut list = list(&[("d1", "A"), ("d2", "B")]);
        let revision = list.revision();

        assert!(!list.select_by_label("A"));
        assert!(!list.select_by_label("missing"));
        assert_eq!(list.revision(), revision);

        assert!(list.select_by_label("B"));
        assert_eq!(list.value(), Some("d2"));
        assert_eq!(list.revision(), revision + 1);
    }

    #[test]
    fn test_find_or_create_keeps_keys_unique() {
        let mut list = list(&[("d1", "A")]);
        assert!(!list.find_or_create("d1"));
        assert!(list.find_or_create("d2"));
        assert_eq!(list.keys(), vec!["d1", "d2"]);
    }

    #[test]
    fn test_clear_empties_the_list() {
        let mut list = list(&[("d1", "A")]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.value(), None);
    }
}

use media_device_select::reconcile::{EntryList, SelectionHint, plan_render};
use media_device_select::{Device, MediaKind};

mod test_utils;
use test_utils::builders::DeviceBuilder;

fn render(list: &mut EntryList, devices: &[Device], hint: Option<&SelectionHint>) {
    let previous = list.value().map(str::to_string);
    let plan = plan_render(devices, previous.as_deref(), hint);
    list.apply(&plan);
}

fn selected_count(list: &EntryList) -> usize {
    list.entries().iter().filter(|e| e.selected).count()
}

fn sequences() -> Vec<Vec<Device>> {
    vec![
        vec![DeviceBuilder::new().id("solo").label("Only Mic").build()],
        vec![
            DeviceBuilder::new().id("a").label("Mic A").build(),
            DeviceBuilder::new().id("b").unlabelled().build(),
            DeviceBuilder::new().id("c").label("Mic C").build(),
        ],
        vec![
            DeviceBuilder::new().placeholder().build(),
            DeviceBuilder::new().id("x").unlabelled().build(),
            DeviceBuilder::new().id("y").unlabelled().build(),
        ],
        (0..8)
            .map(|i| {
                DeviceBuilder::new()
                    .id(&format!("dev-{}", i))
                    .label(&format!("Device {}", i))
                    .video_input()
                    .build()
            })
            .collect(),
    ]
}

/// Properties that must hold for any device sequence with unique ids
#[cfg(test)]
mod render_properties {
    use super::*;

    #[test]
    fn test_entries_match_non_placeholder_devices() {
        for devices in sequences() {
            let mut list = EntryList::new();
            render(&mut list, &devices, None);

            let expected: Vec<&str> = devices
                .iter()
                .filter(|d| !d.device_id.is_empty())
                .map(|d| d.device_id.as_str())
                .collect();
            assert_eq!(list.keys(), expected);
        }
    }

    #[test]
    fn test_exactly_one_selected_after_first_render() {
        for devices in sequences() {
            let mut list = EntryList::new();
            render(&mut list, &devices, None);
            assert_eq!(selected_count(&list), 1);
        }
    }

    #[test]
    fn test_render_is_idempotent() {
        for devices in sequences() {
            let mut list = EntryList::new();
            render(&mut list, &devices, None);
            let first = list.entries().to_vec();

            render(&mut list, &devices, None);
            assert_eq!(list.entries(), first.as_slice());
        }
    }

    #[test]
    fn test_hint_selection_is_exclusive() {
        for devices in sequences() {
            let mut list = EntryList::new();
            render(&mut list, &devices, None);

            let last = list.entries().last().unwrap().display_text.clone();
            render(&mut list, &devices, Some(&SelectionHint::Label(last.clone())));

            assert_eq!(selected_count(&list), 1);
            assert_eq!(list.selected_text(), Some(last.as_str()));
        }
    }
}

/// Incremental rendering over an existing list
#[cfg(test)]
mod incremental_rendering {
    use super::*;

    #[test]
    fn test_new_devices_are_appended_in_provider_order() {
        let mut list = EntryList::new();
        render(
            &mut list,
            &[DeviceBuilder::new().id("b").label("Zeta").build()],
            None,
        );
        render(
            &mut list,
            &[
                DeviceBuilder::new().id("c").label("Alpha").build(),
                DeviceBuilder::new().id("b").label("Zeta").build(),
            ],
            None,
        );

        // Not re-sorted: existing entries keep their slot
        assert_eq!(list.keys(), vec!["b", "c"]);
        assert_eq!(list.value(), Some("b"));
    }

    #[test]
    fn test_relabel_when_permission_arrives() {
        let mut list = EntryList::new();
        render(
            &mut list,
            &[
                DeviceBuilder::new().id("m1").unlabelled().build(),
                DeviceBuilder::new().id("m2").unlabelled().build(),
            ],
            None,
        );
        assert_eq!(list.get("m2").unwrap().display_text, "Audio Input 2");

        render(
            &mut list,
            &[
                DeviceBuilder::new().id("m1").label("Built-in Mic").build(),
                DeviceBuilder::new().id("m2").label("USB Mic").build(),
            ],
            None,
        );
        assert_eq!(list.get("m2").unwrap().display_text, "USB Mic");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_removed_devices_linger_until_full_rebuild() {
        let both = vec![
            DeviceBuilder::new().id("d1").label("Built-in Mic").build(),
            DeviceBuilder::new().id("d2").label("USB Mic").build(),
        ];
        let mut list = EntryList::new();
        render(&mut list, &both, Some(&SelectionHint::DeviceId("d2".into())));
        assert_eq!(list.value(), Some("d2"));

        let remaining = vec![DeviceBuilder::new().id("d1").label("Built-in Mic").build()];
        render(&mut list, &remaining, None);

        // Stale entry keeps its orphaned selection
        assert_eq!(list.keys(), vec!["d1", "d2"]);
        assert_eq!(list.value(), Some("d2"));

        let previous = list.value().map(str::to_string);
        list.clear();
        list.apply(&plan_render(&remaining, previous.as_deref(), None));
        assert_eq!(list.keys(), vec!["d1"]);
        assert_eq!(list.value(), Some("d1"));
    }

    #[test]
    fn test_fallback_labels_follow_current_order() {
        let mut list = EntryList::new();
        let first_pass = vec![
            Device::new("x", MediaKind::VideoInput, ""),
            Device::new("y", MediaKind::VideoInput, ""),
        ];
        render(&mut list, &first_pass, None);
        assert_eq!(list.get("y").unwrap().display_text, "Video Input 2");

        let reordered = vec![
            Device::new("y", MediaKind::VideoInput, ""),
            Device::new("x", MediaKind::VideoInput, ""),
        ];
        render(&mut list, &reordered, None);
        assert_eq!(list.get("y").unwrap().display_text, "Video Input 1");
        assert_eq!(list.get("x").unwrap().display_text, "Video Input 2");
    }
}

/// Selection by label
#[cfg(test)]
mod select_by_label {
    use super::*;

    #[test]
    fn test_select_by_current_label_fires_no_change() {
        let mut list = EntryList::new();
        render(
            &mut list,
            &[
                DeviceBuilder::new().id("d1").label("Built-in Mic").build(),
                DeviceBuilder::new().id("d2").label("USB Mic").build(),
            ],
            None,
        );
        let revision = list.revision();

        assert!(!list.select_by_label("Built-in Mic"));
        assert_eq!(list.revision(), revision);

        assert!(list.select_by_label("USB Mic"));
        assert_eq!(list.revision(), revision + 1);
        assert_eq!(selected_count(&list), 1);
    }

    #[test]
    fn test_missing_label_is_not_an_error() {
        let mut list = EntryList::new();
        assert!(!list.select_by_label("Anything"));

        render(
            &mut list,
            &[DeviceBuilder::new().id("d1").label("Built-in Mic").build()],
            None,
        );
        assert!(!list.select_by_label("Unplugged Mic"));
        assert_eq!(list.value(), Some("d1"));
    }
}

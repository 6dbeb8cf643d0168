//! Property tests for wizard navigation

use chrono::Duration;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use HostelBridge::state::{WizardDraft, WizardKind, WizardManager};

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,15}"
}

/// Valid input for the first four student steps
fn student_steps() -> impl Strategy<Value = Vec<Map<String, Value>>> {
    (
        name(),
        name(),
        prop::sample::select(vec!["male", "female", "other"]),
        "[6-9][0-9]{9}",
        "[1-9][0-9]{5}",
        0u32..=100,
        name(),
    )
        .prop_map(|(first, last, gender, phone, pincode, percentage, guardian)| {
            vec![
                object(json!({
                    "first_name": first,
                    "last_name": last,
                    "date_of_birth": "2007-09-01",
                    "gender": gender
                })),
                object(json!({
                    "email": format!("{}.{}@example.org", first.to_lowercase(), last.to_lowercase()),
                    "phone": phone,
                    "address": "221 Baker Street",
                    "city": "Jaipur",
                    "state": "Rajasthan",
                    "pincode": pincode
                })),
                object(json!({
                    "education_level": "higher_secondary",
                    "school_name": "Kendriya Vidyalaya",
                    "board": "CBSE",
                    "percentage": percentage
                })),
                object(json!({
                    "guardian_name": format!("{} {}", guardian, last),
                    "guardian_phone": phone
                })),
            ]
        })
}

proptest! {
    #[test]
    fn form_data_is_union_of_submitted_steps(steps in student_steps(), k in 1usize..=4) {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));

        for step in &steps[..k] {
            manager.next(&mut draft, step).unwrap();
        }

        prop_assert_eq!(draft.step as usize, k + 1);
        let submitted: std::collections::BTreeSet<&String> = steps[..k].iter().flat_map(|s| s.keys()).collect();
        let stored: std::collections::BTreeSet<&String> = draft.form_data.keys().collect();
        prop_assert_eq!(stored, submitted);
    }

    #[test]
    fn invalid_input_does_not_advance(steps in student_steps(), gender in "[a-z]{1,10}") {
        prop_assume!(!["male", "female", "other"].contains(&gender.as_str()));
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));

        let mut bad = steps[0].clone();
        bad.insert("gender".to_string(), json!(gender));
        let before = draft.clone();

        prop_assert!(manager.next(&mut draft, &bad).is_err());
        prop_assert_eq!(draft, before);
    }

    #[test]
    fn back_after_next_keeps_values(steps in student_steps(), k in 1usize..=3) {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));
        for step in &steps[..k] {
            manager.next(&mut draft, step).unwrap();
        }
        let at = draft.step;
        let data = draft.form_data.clone();

        manager.next(&mut draft, &steps[k]).unwrap();
        manager.back(&mut draft);

        prop_assert_eq!(draft.step, at);
        for (key, value) in &data {
            prop_assert_eq!(draft.form_data.get(key), Some(value));
        }
    }

    #[test]
    fn step_stays_within_bounds(moves in prop::collection::vec(any::<bool>(), 0..20), steps in student_steps()) {
        let manager = WizardManager::new();
        let total = manager.get(WizardKind::Student).unwrap().step_count();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));

        for forward in moves {
            if forward && (draft.step as usize) <= steps.len() {
                let index = draft.step as usize - 1;
                manager.next(&mut draft, &steps[index]).unwrap();
            } else {
                manager.back(&mut draft);
            }
            prop_assert!(draft.step >= 1 && draft.step <= total);
        }
    }
}

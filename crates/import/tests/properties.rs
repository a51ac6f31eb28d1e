// Property-based tests for normalization and duplicate detection.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use contactgrid_import::duplicate::find_duplicates;
use contactgrid_import::extract::{name_course_place_key, normalize_email, normalize_phone};
use contactgrid_import::model::{CanonicalField, CellValue, Provenance, Record};
use contactgrid_import::normalize::{fill_header_blanks, fill_vertical_blanks, normalize_cell};

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Arbitrary header/cell text: mostly words, sometimes blank.
fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[A-Za-z ]{1,12}",
        1 => Just(String::new()),
    ]
}

fn arb_cell_value() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Empty),
        r"\s{0,3}[ -~]{0,20}\s{0,3}".prop_map(CellValue::Text),
        any::<i64>().prop_map(CellValue::Int),
        any::<f64>().prop_map(CellValue::Float),
        any::<bool>().prop_map(CellValue::Bool),
    ]
}

fn record(i: usize, email: &str, phone: &str) -> Record {
    Record {
        name: "Ann".into(),
        email: email.into(),
        phone: phone.into(),
        course: "Art".into(),
        place: "Goa".into(),
        provenance: Provenance { sheet_name: "S".into(), row_idx: i + 1 },
        normalized_email: normalize_email(email),
        normalized_phone: normalize_phone(phone),
        name_course_place_key: name_course_place_key("Ann", "Art", "Goa"),
    }
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn normalize_cell_is_always_trimmed(value in arb_cell_value()) {
        let out = normalize_cell(&value);
        prop_assert_eq!(out.trim(), out.as_str());
    }

    #[test]
    fn header_fill_preserves_length_and_non_blanks(headers in prop::collection::vec(arb_cell(), 0..12)) {
        let filled = fill_header_blanks(&headers);
        prop_assert_eq!(filled.len(), headers.len());
        let first_non_blank = headers.iter().position(|h| !h.is_empty());
        for (i, (before, after)) in headers.iter().zip(&filled).enumerate() {
            if !before.is_empty() {
                prop_assert_eq!(before, after);
            } else if first_non_blank.map_or(true, |f| i < f) {
                prop_assert!(after.is_empty());
            } else {
                prop_assert!(!after.is_empty());
            }
        }
    }

    #[test]
    fn vertical_fill_leaves_other_columns(rows in prop::collection::vec(prop::collection::vec(arb_cell(), 3), 0..10)) {
        let filled = fill_vertical_blanks(&rows, &[1]);
        for (before, after) in rows.iter().zip(&filled) {
            prop_assert_eq!(&before[0], &after[0]);
            prop_assert_eq!(&before[2], &after[2]);
        }
    }

    #[test]
    fn each_repeated_email_flagged_once_per_extra_holder(
        emails in prop::collection::vec(prop_oneof![Just("a@x.com"), Just("b@x.com"), Just("c@x.com")], 0..20)
    ) {
        let records: Vec<Record> = emails
            .iter()
            .enumerate()
            .map(|(i, e)| record(i, e, &format!("{:010}", i)))
            .collect();
        let flagged = find_duplicates(&records);
        let distinct: HashSet<&&str> = emails.iter().collect();
        prop_assert_eq!(flagged.len(), emails.len() - distinct.len());
        prop_assert!(flagged.iter().all(|e| e.field == CanonicalField::Email));
    }
}

//! Property tests: row count and column layout survive de-identification.

use deid_common::{column_texts, text_frame};
use deid_crosswalk::{Crosswalk, CrosswalkBuilder, CrosswalkSource};
use deid_transform::{DeidentifyConfig, deidentify_frame};
use proptest::prelude::*;

const COLUMNS: [&str; 5] = ["id", "name", "dob", "eye", "seen"];

fn crosswalk() -> Crosswalk {
    let ids: Vec<String> = (0..5).map(|i| i.to_string()).collect();
    let tokens: Vec<String> = (0..5).map(|i| format!("tok{i}")).collect();
    let offsets: Vec<String> = (0..5).map(|i| (i * 7 - 10).to_string()).collect();
    let token_df = text_frame(vec![
        ("mrn", ids.iter().map(|s| Some(s.as_str())).collect()),
        ("token", tokens.iter().map(|s| Some(s.as_str())).collect()),
    ])
    .unwrap();
    let offset_df = text_frame(vec![
        ("mrn", ids.iter().map(|s| Some(s.as_str())).collect()),
        ("day_offset", offsets.iter().map(|s| Some(s.as_str())).collect()),
    ])
    .unwrap();
    CrosswalkBuilder::new()
        .with_token_source(CrosswalkSource::new("t", token_df, "mrn", "token"))
        .with_offset_source(CrosswalkSource::new("o", offset_df, "mrn", "day_offset"))
        .build()
        .unwrap()
}

fn cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[0-9]{1,2}".prop_map(Some),
        "20[0-2][0-9]-0[1-9]-1[0-9]".prop_map(Some),
        "[a-z ]{0,6}".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn rows_and_columns_are_preserved(
        rows in prop::collection::vec(prop::collection::vec(cell(), 5), 0..30),
        remove_mask in prop::collection::vec(any::<bool>(), 4),
        blank_dob in any::<bool>(),
    ) {
        let columns: Vec<(&str, Vec<Option<&str>>)> = COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, name)| (*name, rows.iter().map(|row| row[idx].as_deref()).collect()))
            .collect();
        let input = text_frame(columns).unwrap();

        // Columns after "id" may be removed; "seen" is shifted when kept.
        let mut builder = DeidentifyConfig::builder("id");
        let mut expected = vec!["id".to_string()];
        for (name, remove) in COLUMNS[1..].iter().zip(&remove_mask) {
            if *remove {
                builder = builder.remove(*name);
            } else {
                expected.push(name.to_string());
            }
        }
        if blank_dob && !remove_mask[1] {
            builder = builder.blank("dob");
        }
        if !remove_mask[3] {
            builder = builder.shift_date("seen", "%Y-%m-%d");
        }
        let config = builder.build().unwrap();

        let out = deidentify_frame(input, &config, &crosswalk(), "prop").unwrap();

        prop_assert_eq!(out.frame.height(), rows.len());
        let names: Vec<String> = out
            .frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        prop_assert_eq!(names, expected);
        if blank_dob && !remove_mask[1] {
            prop_assert!(column_texts(&out.frame, "dob").unwrap().iter().all(Option::is_none));
        }
        if !remove_mask[0] {
            let original: Vec<Option<String>> = rows.iter().map(|row| row[1].clone()).collect();
            prop_assert_eq!(column_texts(&out.frame, "name").unwrap(), original);
        }
    }
}

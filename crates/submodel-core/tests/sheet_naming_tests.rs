// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use proptest::prelude::*;
use submodel_core::{
    params, Model, ModelDefinition, ModelOptions, ParamMap, ParamValue, Properties, PropertyList,
    SheetSpec, SubmodelError, DEFAULT_NAME_ORDERING,
};
mod common;

fn known_properties() -> Vec<(&'static str, ParamValue)> {
    vec![
        ("eye", ParamValue::from("Left")),
        ("level", ParamValue::from("LGN")),
        ("cone", ParamValue::from("L")),
        ("polarity", ParamValue::from("On")),
        ("SF", ParamValue::from(2)),
        ("opponent", ParamValue::from("RedGreen")),
        ("surround", ParamValue::from("Blue")),
        ("colour", ParamValue::from("ignored")),
    ]
}

proptest! {
    // Any subset of known keys, supplied in any order, names the sheet by
    // concatenating the retained values in canonical key order.
    #[test]
    fn name_follows_canonical_order_for_any_subset(
        order in Just(known_properties()).prop_shuffle(),
        keep in 1usize..8,
    ) {
        let mut subset: Vec<_> = order.into_iter().take(keep).collect();
        if !subset.iter().any(|(k, _)| *k == "level") {
            subset.push(("level", ParamValue::from("LGN")));
        }
        let input: ParamMap = subset
            .iter()
            .cloned()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();

        let sheet = SheetSpec::new(common::cortex_sheet(), &input).unwrap();
        let expected: String = DEFAULT_NAME_ORDERING
            .iter()
            .filter_map(|key| {
                subset
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.to_string())
            })
            .collect();
        prop_assert_eq!(sheet.name(), expected.as_str());
        let keys: Vec<&str> = sheet.properties().iter().map(|(k, _)| k).collect();
        let canonical: Vec<&str> = DEFAULT_NAME_ORDERING
            .iter()
            .copied()
            .filter(|key| keys.contains(key))
            .collect();
        prop_assert_eq!(keys, canonical);
        prop_assert!(!sheet.properties().contains_key("colour"));
    }
}

#[test]
fn full_property_set_names_in_canonical_order() {
    let map: ParamMap = known_properties()
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    let props = Properties::canonical(&map, DEFAULT_NAME_ORDERING);
    assert_eq!(props.name(), "LeftLGNLOn2RedGreenBlue");
    assert_eq!(props.len(), 7);
}

fn level_only(_: &Model) -> Vec<(String, PropertyList)> {
    vec![("V1".to_owned(), PropertyList::values("polarity", ["On"]))]
}

#[test]
fn custom_name_ordering_without_level_fails_setup() {
    let definition = ModelDefinition::builder("NoLevel")
        .training_patterns(common::no_patterns)
        .name_ordering(&["polarity"])
        .sheets(level_only)
        .sheet(&common::cortex_sheet(), "V1", common::no_params)
        .build()
        .unwrap();
    let err = Model::new(definition, &ModelOptions::default()).unwrap_err();
    assert!(matches!(err, SubmodelError::MissingLevel { .. }));
}

#[test]
fn custom_name_ordering_changes_the_name() {
    let definition = ModelDefinition::builder("PolarityFirst")
        .training_patterns(common::no_patterns)
        .name_ordering(&["polarity", "level"])
        .sheets(level_only)
        .sheet(&common::cortex_sheet(), "V1", common::no_params)
        .build()
        .unwrap();
    let model = Model::new(definition, &ModelOptions::default()).unwrap();
    let names: Vec<_> = model.sheets().values().map(SheetSpec::name).collect();
    assert_eq!(names, vec!["OnV1"]);
}

fn unknown_level(_: &Model) -> Vec<(String, PropertyList)> {
    vec![
        ("Skipped".to_owned(), PropertyList::Skip),
        ("Nowhere".to_owned(), PropertyList::Identity),
    ]
}

#[test]
fn skipped_levels_need_no_registration_but_others_do() {
    let definition = ModelDefinition::builder("Unknown")
        .training_patterns(common::no_patterns)
        .sheets(unknown_level)
        .build()
        .unwrap();
    let err = Model::new(definition, &ModelOptions::default()).unwrap_err();
    assert!(matches!(err, SubmodelError::UnknownSheetLevel(level) if level == "Nowhere"));
}

#[test]
fn duplicate_sheet_names_replace_in_place() {
    fn twice(_: &Model) -> Vec<(String, PropertyList)> {
        vec![(
            "V1".to_owned(),
            PropertyList::List(vec![
                params([("SF", ParamValue::from(1))]),
                params([("SF", ParamValue::from(1)), ("colour", "red".into())]),
            ]),
        )]
    }
    let definition = ModelDefinition::builder("Twice")
        .training_patterns(common::no_patterns)
        .sheets(twice)
        .sheet(&common::cortex_sheet(), "V1", common::no_params)
        .build()
        .unwrap();
    let model = Model::new(definition, &ModelOptions::default()).unwrap();
    assert_eq!(model.sheets().len(), 1);
}

#[test]
fn whole_float_and_int_properties_name_distinct_sheets() {
    fn int_and_float(_: &Model) -> Vec<(String, PropertyList)> {
        vec![(
            "V1".to_owned(),
            PropertyList::List(vec![
                params([("SF", ParamValue::from(1))]),
                params([("SF", ParamValue::from(1.0))]),
            ]),
        )]
    }
    let definition = ModelDefinition::builder("IntAndFloat")
        .training_patterns(common::no_patterns)
        .sheets(int_and_float)
        .sheet(&common::cortex_sheet(), "V1", common::no_params)
        .build()
        .unwrap();
    let model = Model::new(definition, &ModelOptions::default()).unwrap();
    let names: Vec<_> = model.sheets().values().map(SheetSpec::name).collect();
    assert_eq!(names, vec!["V11", "V11.0"]);
}

#[test]
fn level_supplied_in_properties_is_rejected() {
    fn relabelled(_: &Model) -> Vec<(String, PropertyList)> {
        vec![(
            "V1".to_owned(),
            PropertyList::List(vec![params([("level", ParamValue::from("LGN"))])]),
        )]
    }
    let definition = ModelDefinition::builder("Relabelled")
        .training_patterns(common::no_patterns)
        .sheets(relabelled)
        .sheet(&common::cortex_sheet(), "V1", common::no_params)
        .build()
        .unwrap();
    let err = Model::new(definition, &ModelOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        SubmodelError::LevelInProperties { level, given } if level == "V1" && given == "LGN"
    ));
}

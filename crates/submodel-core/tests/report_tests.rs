// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use submodel_core::demo::early_vision::early_vision_definition;
use submodel_core::{
    Component, ConfigError, Model, ModelDefinition, ModelOptions, Selection, SetupStage,
    SubmodelError,
};
mod common;

#[test]
fn summary_lists_incoming_projections_under_each_sheet() {
    let model = Model::new(common::all_to_v1(), &ModelOptions::default()).unwrap();
    let summary = model.summary();
    let expected = "\
=======
AllToV1
=======

Retina : GeneratorSheet

V11 : CFSheet
   V11.FromRetina [Retina -> V11] : CFProjection
   V11.FromV11 [V11 -> V11] : CFProjection
   V11.FromV12 [V12 -> V11] : CFProjection

V12 : CFSheet
   V12.FromRetina [Retina -> V12] : CFProjection
   V12.FromV11 [V11 -> V12] : CFProjection
   V12.FromV12 [V12 -> V12] : CFProjection
";
    assert_eq!(summary, expected);
    assert_eq!(model.summary(), summary);
}

#[test]
fn modifications_report_changed_keys_per_component() {
    let mut options = ModelOptions::default();
    options
        .overrides
        .insert("area".to_owned(), submodel_core::ParamValue::Float(1.5));
    let model = Model::new(common::all_to_v1(), &options).unwrap();
    let report = model.modifications(&[Component::Model, Component::Sheets]);
    let expected = "\
=====
Model
=====

AllToV1 : [area]

======
Sheets
======

Retina : []
V11    : [nominal_density]
V12    : [nominal_density]
";
    assert_eq!(report, expected);

    let projections = model.modifications(&[Component::Projections]);
    assert!(projections.contains("V11.FromRetina : [name]"));
}

#[test]
fn missing_training_patterns_hook_is_an_error() {
    let definition = ModelDefinition::builder("Bare")
        .sheets(common::retina_and_two_v1)
        .build()
        .unwrap();
    let err = Model::new(definition.clone(), &ModelOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        SubmodelError::MissingHook { hook: "training_patterns", .. }
    ));

    let sheets_only = ModelOptions {
        setup: Selection::Only(vec![SetupStage::Sheets]),
        ..ModelOptions::default()
    };
    let err = Model::new(definition, &sheets_only).unwrap_err();
    assert!(matches!(err, SubmodelError::UnknownSheetLevel(level) if level == "Retina"));
}

#[test]
fn missing_sheets_hook_is_an_error() {
    let definition = ModelDefinition::builder("NoSheets")
        .training_patterns(common::no_patterns)
        .build()
        .unwrap();
    let err = Model::new(definition, &ModelOptions::default()).unwrap_err();
    assert!(matches!(err, SubmodelError::MissingHook { hook: "sheets", .. }));
}

#[test]
fn empty_setup_selection_builds_nothing() {
    let options = ModelOptions::from_json_str(r#"{"setup": false}"#).unwrap();
    let model = Model::new(early_vision_definition().unwrap(), &options).unwrap();
    assert!(model.sheets().is_empty());
    assert!(model.attrs().is_empty());
    assert!(model.training_patterns().is_empty());
}

#[test]
fn demo_overrides_flow_into_parameters() {
    let options = ModelOptions::from_json_str(
        r#"{"overrides": {"gain_control": false, "cortex_density": 12.0}}"#,
    )
    .unwrap();
    let model = Model::new(early_vision_definition().unwrap(), &options).unwrap();
    assert_eq!(model.projections().len(), 6);
    let v1 = model.sheets().get_name("V1").unwrap();
    assert_eq!(
        v1.instantiation_parameters()["nominal_density"],
        submodel_core::ParamValue::Float(12.0)
    );
}

#[test]
fn unknown_config_field_is_rejected() {
    let err = ModelOptions::from_json_str(r#"{"setupp": true}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Serde(_)));
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use std::collections::BTreeMap;

use proptest::prelude::*;
use submodel_core::{
    params, DecoratorSet, Model, ModelDefinition, ModelOptions, ObjectType, ObjectTypeRef,
    ParamMap, ParamValue, PriorityCounter, Properties, SubmodelError,
};
mod common;

fn sheet_types() -> Vec<ObjectTypeRef> {
    (0..3)
        .map(|i| ObjectType::sheet(format!("Sheet{i}")).shared())
        .collect()
}

proptest! {
    // Whatever decorator a registration lands on, the last registration of
    // a label is the one that resolves.
    #[test]
    fn last_registration_wins_across_decorators(
        registrations in prop::collection::vec((0usize..3, 0usize..4), 1..40)
    ) {
        let types = sheet_types();
        let mut counter = PriorityCounter::default();
        let mut set: DecoratorSet<usize> = DecoratorSet::new();
        let mut expected_fn = BTreeMap::new();
        let mut expected_type = BTreeMap::new();
        for (step, (decorator, label)) in registrations.iter().enumerate() {
            let label = format!("L{label}");
            set.register(&mut counter, &types[*decorator], label.clone(), step);
            expected_fn.insert(label.clone(), step);
            expected_type.insert(label, types[*decorator].name().to_owned());
        }
        prop_assert_eq!(set.collect_labels(), expected_fn);
        let resolved: BTreeMap<String, String> = set
            .collect_types()
            .into_iter()
            .map(|(label, ty)| (label, ty.name().to_owned()))
            .collect();
        prop_assert_eq!(resolved, expected_type);
    }
}

fn base_v1(_: &Model, _: &Properties) -> ParamMap {
    params([("nominal_density", ParamValue::from(10))])
}

fn derived_v1(_: &Model, _: &Properties) -> ParamMap {
    params([("nominal_density", ParamValue::from(99))])
}

#[test]
fn derived_definition_overrides_inherited_level() {
    let base = common::all_to_v1();
    let settling = ObjectType::sheet("SettlingCFSheet")
        .with_param("nominal_density", 24)
        .shared();
    let derived = base
        .derive("Derived")
        .sheet(&settling, "V1", derived_v1)
        .build()
        .unwrap();

    assert_eq!(derived.sheet_types()["V1"].name(), "SettlingCFSheet");
    assert_eq!(base.sheet_types()["V1"].name(), "CFSheet");

    let model = Model::new(derived, &ModelOptions::default()).unwrap();
    let v11 = model.sheets().get_name("V11").unwrap();
    assert_eq!(v11.sheet_type().name(), "SettlingCFSheet");
    assert_eq!(
        v11.instantiation_parameters()["nominal_density"],
        ParamValue::Int(99)
    );
}

#[test]
fn reregistering_on_the_same_type_still_outranks() {
    let definition = common::all_to_v1_builder()
        .sheet(&common::cortex_sheet(), "V1", base_v1)
        .build()
        .unwrap();
    let model = Model::new(definition.clone(), &ModelOptions::default()).unwrap();
    let v12 = model.sheets().get_name("V12").unwrap();
    assert_eq!(
        v12.instantiation_parameters()["nominal_density"],
        ParamValue::Int(10)
    );
    let cortex = definition
        .sheet_decorators()
        .decorators()
        .iter()
        .find(|d| d.name() == "CFSheet")
        .unwrap();
    assert_eq!(cortex.labels().len(), 1);
}

#[test]
fn projection_type_on_a_sheet_level_is_rejected() {
    let err = ModelDefinition::builder("Broken")
        .sheet(&common::projection(), "V1", base_v1)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        SubmodelError::KindMismatch { expected: "sheet", .. }
    ));
}

#[test]
fn priorities_continue_through_derive() {
    let base = common::all_to_v1_builder();
    let before = base.next_priority();
    let definition = base.build().unwrap();
    let derived = definition.derive("Child");
    assert_eq!(derived.next_priority(), before);
}

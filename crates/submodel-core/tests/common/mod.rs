// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
use std::sync::Arc;

use submodel_core::{
    params, Model, ModelBuilder, ModelDefinition, ObjectType, ObjectTypeRef, ParamMap, ParamValue,
    PatternGenerator, Properties, PropertyList,
};

pub fn input_sheet() -> ObjectTypeRef {
    ObjectType::sheet("GeneratorSheet")
        .with_param("nominal_density", 24)
        .shared()
}

pub fn cortex_sheet() -> ObjectTypeRef {
    ObjectType::sheet("CFSheet")
        .with_param("nominal_density", 24)
        .shared()
}

pub fn projection() -> ObjectTypeRef {
    ObjectType::projection("CFProjection")
        .with_param("strength", 1.0)
        .shared()
}

pub fn no_params(_: &Model, _: &Properties) -> ParamMap {
    ParamMap::new()
}

pub fn dense(_: &Model, _: &Properties) -> ParamMap {
    params([("nominal_density", ParamValue::from(48))])
}

pub fn accept_all(_: &Model, _: &Properties) -> Option<ParamMap> {
    Some(ParamMap::new())
}

/// One projection per source, named after it.
pub fn named_after_source(_: &Model, src: &Properties, _: &Properties) -> Vec<ParamMap> {
    vec![params([("name", ParamValue::from(format!("From{}", src.name())))])]
}

/// The same name for every source: collides per destination.
pub fn fixed_name(_: &Model, _: &Properties, _: &Properties) -> Vec<ParamMap> {
    vec![params([("name", ParamValue::from("Afferent"))])]
}

pub fn no_patterns(_: &Model) -> Vec<(String, PatternGenerator)> {
    Vec::new()
}

pub fn retina_and_two_v1(_: &Model) -> Vec<(String, PropertyList)> {
    vec![
        ("Retina".to_owned(), PropertyList::List(vec![ParamMap::new()])),
        (
            "V1".to_owned(),
            PropertyList::List(vec![
                params([("SF", ParamValue::from(1))]),
                params([("SF", ParamValue::from(2))]),
            ]),
        ),
    ]
}

/// Retina plus two V1 sheets; every V1 sheet accepts input from every sheet.
pub fn all_to_v1_builder() -> ModelBuilder {
    ModelDefinition::builder("AllToV1")
        .parameter("area", 1.0)
        .training_patterns(no_patterns)
        .sheets(retina_and_two_v1)
        .sheet(&input_sheet(), "Retina", no_params)
        .sheet(&cortex_sheet(), "V1", dense)
        .projection(&projection(), "V1_incoming", named_after_source)
        .match_condition("V1", "V1_incoming", accept_all)
}

pub fn all_to_v1() -> Arc<ModelDefinition> {
    all_to_v1_builder().build().unwrap()
}

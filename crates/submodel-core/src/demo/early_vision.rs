// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A small early-vision model: one generator retina, an On/Off pair of LGN
//! sheets with optional lateral gain control, and a settling V1 sheet with
//! afferent input from each LGN sheet and lateral excitation/inhibition.

use std::sync::Arc;

use tracing::debug;

use crate::definition::{ModelDefinition, PatternGenerator, PropertyList};
use crate::error::SubmodelError;
use crate::model::Model;
use crate::object_type::{ObjectType, ObjectTypeRef};
use crate::ordering::OrderEntry;
use crate::tree::AttrTree;
use crate::value::{params, ParamMap, ParamValue, Properties};

/// Name of the demo model.
pub const EARLY_VISION_MODEL_NAME: &str = "EarlyVision";

/// Matchname of Retina → LGN projections.
pub const LGN_AFFERENT: &str = "afferent";
/// Matchname of LGN self-projections (gain control).
pub const LGN_LATERAL_GAIN: &str = "lateral_gain";
/// Matchname of LGN → V1 projections.
pub const V1_AFFERENT: &str = "V1_afferent";
/// Matchname of V1 self-projections (excitatory and inhibitory).
pub const V1_LATERAL: &str = "V1_lateral";

/// Generator sheet type used for the retina.
pub fn generator_sheet() -> ObjectTypeRef {
    ObjectType::sheet("GeneratorSheet")
        .with_param("nominal_density", 24.0)
        .with_param("nominal_bounds", 0.5)
        .with_param("period", 1.0)
        .with_param("phase", 0.05)
        .shared()
}

/// Plain connection-field sheet type used for the LGN.
pub fn cf_sheet() -> ObjectTypeRef {
    ObjectType::sheet("CFSheet")
        .with_param("nominal_density", 24.0)
        .with_param("nominal_bounds", 0.5)
        .with_param("tsettle", 0)
        .shared()
}

/// Settling sheet type used for V1.
pub fn settling_cf_sheet() -> ObjectTypeRef {
    ObjectType::sheet("SettlingCFSheet")
        .with_param("nominal_density", 24.0)
        .with_param("nominal_bounds", 0.5)
        .with_param("tsettle", 16)
        .with_param("plastic", true)
        .shared()
}

/// Connection-field projection type.
pub fn cf_projection() -> ObjectTypeRef {
    ObjectType::projection("CFProjection")
        .with_param("strength", 1.0)
        .with_param("delay", 0.05)
        .with_param("learning_rate", 0.0)
        .with_param("nominal_bounds_template", 0.25)
        .shared()
}

/// Projection type whose weights are shared across units.
pub fn shared_weight_cf_projection() -> ObjectTypeRef {
    ObjectType::projection("SharedWeightCFProjection")
        .with_param("strength", 1.0)
        .with_param("delay", 0.05)
        .with_param("nominal_bounds_template", 0.25)
        .shared()
}

fn attributes(model: &Model, mut attrs: AttrTree<ParamValue>) -> AttrTree<ParamValue> {
    let area = model.param_f64("area", 1.0);
    let v1_aff_radius = 0.27083;
    let lgn_aff_radius = 0.375;
    let lgn_area = area + 2.0 * v1_aff_radius;
    attrs.set_path("v1_aff_radius", ParamValue::Float(v1_aff_radius));
    attrs.set_path("lgn_aff_radius", ParamValue::Float(lgn_aff_radius));
    attrs.set_path("lgn_area", ParamValue::Float(lgn_area));
    attrs.set_path("retina_area", ParamValue::Float(lgn_area + 2.0 * lgn_aff_radius));
    attrs
}

fn attr_f64(model: &Model, name: &str, fallback: f64) -> f64 {
    model
        .attrs()
        .get_name(name)
        .and_then(ParamValue::as_f64)
        .unwrap_or(fallback)
}

fn training_patterns(model: &Model) -> Vec<(String, PatternGenerator)> {
    let scale = model.param_f64("contrast", 1.0);
    vec![(
        "Retina".to_owned(),
        PatternGenerator {
            kind: "Gaussian".to_owned(),
            parameters: params([
                ("size", ParamValue::from(0.088388)),
                ("aspect_ratio", 4.66667.into()),
                ("scale", scale.into()),
            ]),
        },
    )]
}

fn sheets(_: &Model) -> Vec<(String, PropertyList)> {
    vec![
        ("Retina".to_owned(), PropertyList::Identity),
        ("LGN".to_owned(), PropertyList::values("polarity", ["On", "Off"])),
        ("V1".to_owned(), PropertyList::Identity),
    ]
}

fn analysis(model: &Model) {
    debug!(model = model.name(), "analysis defaults configured");
}

fn retina_params(model: &Model, _: &Properties) -> ParamMap {
    params([
        ("nominal_density", ParamValue::from(model.param_f64("retina_density", 24.0))),
        ("nominal_bounds", attr_f64(model, "retina_area", 1.0).into()),
    ])
}

fn lgn_params(model: &Model, _: &Properties) -> ParamMap {
    params([
        ("nominal_density", ParamValue::from(model.param_f64("lgn_density", 24.0))),
        ("nominal_bounds", attr_f64(model, "lgn_area", 1.0).into()),
        ("tsettle", 2.into()),
    ])
}

fn v1_params(model: &Model, _: &Properties) -> ParamMap {
    params([
        ("nominal_density", ParamValue::from(model.param_f64("cortex_density", 47.0))),
        ("nominal_bounds", model.param_f64("area", 1.0).into()),
    ])
}

fn lgn_afferent_match(_: &Model, _: &Properties) -> Option<ParamMap> {
    Some(params([("level", ParamValue::from("Retina"))]))
}

fn lgn_lateral_gain_match(model: &Model, dest: &Properties) -> Option<ParamMap> {
    if model.param("gain_control") != Some(&ParamValue::Bool(true)) {
        return None;
    }
    let polarity = dest.get("polarity")?.clone();
    Some(params([("level", ParamValue::from("LGN")), ("polarity", polarity)]))
}

fn v1_afferent_match(_: &Model, _: &Properties) -> Option<ParamMap> {
    Some(params([("level", ParamValue::from("LGN"))]))
}

fn v1_lateral_match(_: &Model, _: &Properties) -> Option<ParamMap> {
    Some(params([("level", ParamValue::from("V1"))]))
}

fn lgn_afferent_params(model: &Model, _: &Properties, _: &Properties) -> Vec<ParamMap> {
    vec![params([
        ("name", ParamValue::from("Afferent")),
        ("strength", (2.33 * model.param_f64("strength_factor", 1.0)).into()),
        ("nominal_bounds_template", attr_f64(model, "lgn_aff_radius", 0.375).into()),
    ])]
}

fn lgn_lateral_gain_params(_: &Model, _: &Properties, _: &Properties) -> Vec<ParamMap> {
    vec![params([
        ("name", ParamValue::from("LateralGC")),
        ("strength", 0.6.into()),
        ("nominal_bounds_template", 0.25.into()),
    ])]
}

fn v1_afferent_params(model: &Model, src: &Properties, _: &Properties) -> Vec<ParamMap> {
    let polarity = src.get("polarity").map(ToString::to_string).unwrap_or_default();
    vec![params([
        ("name", ParamValue::from(format!("LGN{polarity}Afferent"))),
        ("strength", (1.5 * model.param_f64("strength_factor", 1.0)).into()),
        ("learning_rate", 0.1.into()),
        ("nominal_bounds_template", attr_f64(model, "v1_aff_radius", 0.27083).into()),
    ])]
}

fn v1_lateral_params(_: &Model, _: &Properties, _: &Properties) -> Vec<ParamMap> {
    vec![
        params([
            ("name", ParamValue::from("LateralExcitatory")),
            ("strength", 1.7.into()),
            ("learning_rate", 0.0.into()),
            ("nominal_bounds_template", 0.104.into()),
        ]),
        params([
            ("name", ParamValue::from("LateralInhibitory")),
            ("strength", (-1.4).into()),
            ("learning_rate", 0.35.into()),
            ("nominal_bounds_template", 0.22917.into()),
        ]),
    ]
}

/// Builds the early-vision model definition.
///
/// # Errors
/// Only fails if the registrations above are inconsistent.
pub fn early_vision_definition() -> Result<Arc<ModelDefinition>, SubmodelError> {
    let cf = cf_projection();
    ModelDefinition::builder(EARLY_VISION_MODEL_NAME)
        .parameter("area", 1.0)
        .parameter("retina_density", 24.0)
        .parameter("lgn_density", 24.0)
        .parameter("cortex_density", 47.0)
        .parameter("strength_factor", 1.0)
        .parameter("contrast", 1.0)
        .parameter("gain_control", true)
        .attributes(attributes)
        .training_patterns(training_patterns)
        .sheets(sheets)
        .analysis(analysis)
        .sheet(&generator_sheet(), "Retina", retina_params)
        .sheet(&cf_sheet(), "LGN", lgn_params)
        .sheet(&settling_cf_sheet(), "V1", v1_params)
        .projection(&shared_weight_cf_projection(), LGN_AFFERENT, lgn_afferent_params)
        .projection(&shared_weight_cf_projection(), LGN_LATERAL_GAIN, lgn_lateral_gain_params)
        .projection(&cf, V1_AFFERENT, v1_afferent_params)
        .projection(&cf, V1_LATERAL, v1_lateral_params)
        .match_condition("LGN", LGN_AFFERENT, lgn_afferent_match)
        .match_condition("LGN", LGN_LATERAL_GAIN, lgn_lateral_gain_match)
        .match_condition("V1", V1_AFFERENT, v1_afferent_match)
        .match_condition("V1", V1_LATERAL, v1_lateral_match)
        .build()
}

/// Connection order reproducing the historical instantiation sequence:
/// LGN afferents, gain control, V1 afferents On before Off, then V1 laterals.
pub fn legacy_connection_order() -> Vec<OrderEntry> {
    vec![
        OrderEntry::name(LGN_AFFERENT),
        OrderEntry::name(LGN_LATERAL_GAIN),
        OrderEntry::by_property(V1_AFFERENT, "polarity", "On"),
        OrderEntry::by_property(V1_AFFERENT, "polarity", "Off"),
        OrderEntry::name(V1_LATERAL),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ModelOptions;

    #[test]
    fn demo_builds_expected_sheets() {
        let model =
            Model::new(early_vision_definition().unwrap(), &ModelOptions::default()).unwrap();
        let names: Vec<_> = model.sheets().values().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, vec!["Retina", "LGNOn", "LGNOff", "V1"]);
        // 2 LGN afferents + 2 gain control + 2 V1 afferents + 2 V1 laterals.
        assert_eq!(model.projections().len(), 8);
        assert_eq!(model.training_patterns().len(), 1);
        assert!(model.attrs().get_name("lgn_area").is_some());
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Model definitions: registered sheet/projection labels, matchconditions,
//! model parameters and setup hooks, frozen by an explicit builder step.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SubmodelError;
use crate::matchcond::MatchConditions;
use crate::model::Model;
use crate::object_type::{ObjectKind, ObjectTypeRef, ParamDescriptor};
use crate::registry::{DecoratorSet, Priority, PriorityCounter};
use crate::rule::{MatchFn, ProjectionParamsFn, SheetParamsFn};
use crate::tree::AttrTree;
use crate::value::{ParamMap, ParamValue, DEFAULT_NAME_ORDERING};

/// Per-level sheet population returned by the sheets hook.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyList {
    /// No sheets at this level.
    #[default]
    Skip,
    /// Exactly one sheet with no properties beyond `level`.
    Identity,
    /// One sheet per property mapping. An empty list behaves like `Skip`.
    /// Mappings must not contain `level`; setup adds it from the list's key.
    List(Vec<ParamMap>),
}

impl PropertyList {
    /// One sheet per value of a single property, e.g.
    /// `PropertyList::values("polarity", ["On", "Off"])`.
    pub fn values<V, I>(key: &str, values: I) -> Self
    where
        V: Into<ParamValue>,
        I: IntoIterator<Item = V>,
    {
        Self::List(
            values
                .into_iter()
                .map(|v| std::iter::once((key.to_owned(), v.into())).collect())
                .collect(),
        )
    }

    /// Property mappings to expand, or `None` when the level is skipped.
    pub fn into_property_maps(self) -> Option<Vec<ParamMap>> {
        match self {
            Self::Skip => None,
            Self::Identity => Some(vec![ParamMap::new()]),
            Self::List(list) if list.is_empty() => None,
            Self::List(list) => Some(list),
        }
    }
}

impl From<Vec<ParamMap>> for PropertyList {
    fn from(value: Vec<ParamMap>) -> Self {
        Self::List(value)
    }
}

/// Descriptor of a training pattern generator feeding an input sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternGenerator {
    /// Generator kind (e.g. `"Gaussian"`).
    pub kind: String,
    /// Generator parameters.
    #[serde(default)]
    pub parameters: ParamMap,
}

/// Returns `level -> property list` in level order.
pub type SheetsHook = fn(&Model) -> Vec<(String, PropertyList)>;
/// Returns `sheet name -> pattern generator`.
pub type TrainingPatternsHook = fn(&Model) -> Vec<(String, PatternGenerator)>;
/// Precomputes derived attributes from the model parameters.
pub type AttributesHook = fn(&Model, AttrTree<ParamValue>) -> AttrTree<ParamValue>;
/// Configures analysis defaults once the model is set up.
pub type AnalysisHook = fn(&Model);

#[derive(Debug, Clone, Copy, Default)]
struct Hooks {
    sheets: Option<SheetsHook>,
    training_patterns: Option<TrainingPatternsHook>,
    attributes: Option<AttributesHook>,
    analysis: Option<AnalysisHook>,
}

/// A frozen model definition.
///
/// Holds the two label registries (sheet levels and projection
/// matchnames), resolved once at build time, plus matchconditions and
/// hooks. Definitions are shared between every [`Model`] built from them.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    name: String,
    parameters: Vec<ParamDescriptor>,
    name_ordering: Vec<String>,
    sheet_decorators: DecoratorSet<SheetParamsFn>,
    projection_decorators: DecoratorSet<ProjectionParamsFn>,
    match_conditions: MatchConditions,
    hooks: Hooks,
    counter: PriorityCounter,
    sheet_labels: BTreeMap<String, SheetParamsFn>,
    sheet_types: BTreeMap<String, ObjectTypeRef>,
    projection_labels: BTreeMap<String, ProjectionParamsFn>,
    projection_types: BTreeMap<String, ObjectTypeRef>,
}

impl ModelDefinition {
    /// Starts an empty definition.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            parameters: Vec::new(),
            name_ordering: DEFAULT_NAME_ORDERING.iter().map(|s| (*s).to_owned()).collect(),
            sheet_decorators: DecoratorSet::new(),
            projection_decorators: DecoratorSet::new(),
            match_conditions: MatchConditions::new(),
            hooks: Hooks::default(),
            counter: PriorityCounter::default(),
        }
    }

    /// Starts a definition inheriting everything from `self`.
    ///
    /// The builder continues this definition's priority counter, so any
    /// label it registers outranks the inherited registration of that label.
    pub fn derive(&self, name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            parameters: self.parameters.clone(),
            name_ordering: self.name_ordering.clone(),
            sheet_decorators: self.sheet_decorators.clone(),
            projection_decorators: self.projection_decorators.clone(),
            match_conditions: self.match_conditions.clone(),
            hooks: self.hooks,
            counter: self.counter.clone(),
        }
    }

    /// Definition name, used as the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared model parameters with defaults.
    pub fn parameters(&self) -> &[ParamDescriptor] {
        &self.parameters
    }

    /// Canonical property order used to name sheets.
    pub fn name_ordering(&self) -> &[String] {
        &self.name_ordering
    }

    /// Resolved `level -> sheet parameter function`.
    pub fn sheet_labels(&self) -> &BTreeMap<String, SheetParamsFn> {
        &self.sheet_labels
    }

    /// Resolved `level -> sheet type`.
    pub fn sheet_types(&self) -> &BTreeMap<String, ObjectTypeRef> {
        &self.sheet_types
    }

    /// Resolved `matchname -> projection parameter function`.
    pub fn projection_labels(&self) -> &BTreeMap<String, ProjectionParamsFn> {
        &self.projection_labels
    }

    /// Resolved `matchname -> projection type`.
    pub fn projection_types(&self) -> &BTreeMap<String, ObjectTypeRef> {
        &self.projection_types
    }

    /// Registered sheet decorators.
    pub fn sheet_decorators(&self) -> &DecoratorSet<SheetParamsFn> {
        &self.sheet_decorators
    }

    /// Registered projection decorators.
    pub fn projection_decorators(&self) -> &DecoratorSet<ProjectionParamsFn> {
        &self.projection_decorators
    }

    /// Matchcondition table.
    pub fn match_conditions(&self) -> &MatchConditions {
        &self.match_conditions
    }

    pub(crate) fn sheets_hook(&self) -> Option<SheetsHook> {
        self.hooks.sheets
    }

    pub(crate) fn training_patterns_hook(&self) -> Option<TrainingPatternsHook> {
        self.hooks.training_patterns
    }

    pub(crate) fn attributes_hook(&self) -> Option<AttributesHook> {
        self.hooks.attributes
    }

    pub(crate) fn analysis_hook(&self) -> Option<AnalysisHook> {
        self.hooks.analysis
    }
}

/// Accumulates registrations for a [`ModelDefinition`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    parameters: Vec<ParamDescriptor>,
    name_ordering: Vec<String>,
    sheet_decorators: DecoratorSet<SheetParamsFn>,
    projection_decorators: DecoratorSet<ProjectionParamsFn>,
    match_conditions: MatchConditions,
    hooks: Hooks,
    counter: PriorityCounter,
}

impl ModelBuilder {
    /// Declares a model parameter (or replaces an inherited default).
    pub fn parameter(mut self, name: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        let name = name.into();
        let default = default.into();
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.default = default,
            None => self.parameters.push(ParamDescriptor { name, default }),
        }
        self
    }

    /// Replaces the canonical property order used for sheet names.
    pub fn name_ordering<S: AsRef<str>>(mut self, ordering: &[S]) -> Self {
        self.name_ordering = ordering.iter().map(|s| s.as_ref().to_owned()).collect();
        self
    }

    /// Registers the sheet type and parameter function for `level`.
    pub fn sheet(
        mut self,
        sheet_type: &ObjectTypeRef,
        level: impl Into<String>,
        params: SheetParamsFn,
    ) -> Self {
        self.sheet_decorators
            .register(&mut self.counter, sheet_type, level, params);
        self
    }

    /// Registers the projection type and parameter function for `matchname`.
    pub fn projection(
        mut self,
        projection_type: &ObjectTypeRef,
        matchname: impl Into<String>,
        params: ProjectionParamsFn,
    ) -> Self {
        self.projection_decorators
            .register(&mut self.counter, projection_type, matchname, params);
        self
    }

    /// Registers a matching rule for destinations at `level`.
    ///
    /// `matchname` must name a projection registration.
    pub fn match_condition(
        mut self,
        level: impl Into<String>,
        matchname: impl Into<String>,
        rule: MatchFn,
    ) -> Self {
        self.match_conditions.register(level, matchname, rule);
        self
    }

    /// Supplies the per-level sheet population hook.
    pub fn sheets(mut self, hook: SheetsHook) -> Self {
        self.hooks.sheets = Some(hook);
        self
    }

    /// Supplies the training pattern hook.
    pub fn training_patterns(mut self, hook: TrainingPatternsHook) -> Self {
        self.hooks.training_patterns = Some(hook);
        self
    }

    /// Supplies the attribute precomputation hook.
    pub fn attributes(mut self, hook: AttributesHook) -> Self {
        self.hooks.attributes = Some(hook);
        self
    }

    /// Supplies the analysis setup hook.
    pub fn analysis(mut self, hook: AnalysisHook) -> Self {
        self.hooks.analysis = Some(hook);
        self
    }

    /// Priority the next registration will receive.
    pub fn next_priority(&self) -> Priority {
        self.counter.peek()
    }

    /// Freezes the definition and resolves label overrides.
    ///
    /// # Errors
    /// [`SubmodelError::KindMismatch`] when a projection type was registered
    /// as a sheet level or vice versa.
    pub fn build(self) -> Result<Arc<ModelDefinition>, SubmodelError> {
        let sheet_types = self.sheet_decorators.collect_types();
        check_kind(&sheet_types, ObjectKind::Sheet)?;
        let projection_types = self.projection_decorators.collect_types();
        check_kind(&projection_types, ObjectKind::Projection)?;
        Ok(Arc::new(ModelDefinition {
            sheet_labels: self.sheet_decorators.collect_labels(),
            projection_labels: self.projection_decorators.collect_labels(),
            sheet_types,
            projection_types,
            name: self.name,
            parameters: self.parameters,
            name_ordering: self.name_ordering,
            sheet_decorators: self.sheet_decorators,
            projection_decorators: self.projection_decorators,
            match_conditions: self.match_conditions,
            hooks: self.hooks,
            counter: self.counter,
        }))
    }
}

fn check_kind(
    types: &BTreeMap<String, ObjectTypeRef>,
    expected: ObjectKind,
) -> Result<(), SubmodelError> {
    for (label, ty) in types {
        if ty.kind() != expected {
            return Err(SubmodelError::KindMismatch {
                label: label.clone(),
                type_name: ty.name().to_owned(),
                expected: match expected {
                    ObjectKind::Sheet => "sheet",
                    ObjectKind::Projection => "projection",
                },
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_type::ObjectType;
    use crate::value::{params, Properties};

    fn base_params(_: &Model, _: &Properties) -> ParamMap {
        params([("tag", ParamValue::from("base"))])
    }

    fn derived_params(_: &Model, _: &Properties) -> ParamMap {
        params([("tag", ParamValue::from("derived"))])
    }

    #[test]
    fn derived_definition_overrides_inherited_label() {
        let cf = ObjectType::sheet("CFSheet").shared();
        let settling = ObjectType::sheet("SettlingCFSheet").shared();
        let base = ModelDefinition::builder("Base")
            .sheet(&cf, "V1", base_params)
            .build()
            .unwrap();
        let derived = base
            .derive("Derived")
            .sheet(&settling, "V1", derived_params)
            .build()
            .unwrap();
        assert_eq!(derived.sheet_types()["V1"].name(), "SettlingCFSheet");
        assert_eq!(base.sheet_types()["V1"].name(), "CFSheet");
        let f = derived.sheet_labels()["V1"];
        assert!(f as usize == derived_params as SheetParamsFn as usize);
    }

    #[test]
    fn projection_type_cannot_back_a_sheet_level() {
        let proj = ObjectType::projection("CFProjection").shared();
        let err = ModelDefinition::builder("Broken")
            .sheet(&proj, "V1", base_params)
            .build()
            .unwrap_err();
        assert!(matches!(err, SubmodelError::KindMismatch { expected: "sheet", .. }));
    }

    #[test]
    fn property_list_shapes() {
        assert_eq!(PropertyList::Skip.into_property_maps(), None);
        assert_eq!(PropertyList::List(vec![]).into_property_maps(), None);
        assert_eq!(
            PropertyList::Identity.into_property_maps(),
            Some(vec![ParamMap::new()])
        );
        let list = PropertyList::values("polarity", ["On", "Off"])
            .into_property_maps()
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1]["polarity"], ParamValue::from("Off"));
    }
}

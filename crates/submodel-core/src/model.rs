// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Model orchestration: setup stages, projection matching and ordered
//! instantiation.
//!
//! Ordering invariant: sheets are instantiated in construction order and
//! projections in ascending precedence, ties broken by construction order.
//! Construction order is the (source, destination) cross product over sheets
//! with the source as the outer loop, then the matchcondition registration
//! order, then the order of parameter sets. Any change to these rules changes
//! how downstream consumers draw from a shared random stream and is a
//! breaking change.

use std::sync::Arc;

use tracing::{debug, info};

use crate::definition::{ModelDefinition, PatternGenerator};
use crate::error::SubmodelError;
use crate::matchcond::{matchcondition_holds, Conditions};
use crate::options::{CollisionPolicy, InstantiateStage, ModelOptions, Selection, SetupStage};
use crate::runtime::Runtime;
use crate::spec::{ProjectionSpec, SheetSpec, Specified};
use crate::tree::{AttrTree, TreePath};
use crate::value::{ParamMap, ParamValue};

/// Collections reported by [`Model::modifications`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Model-level parameters.
    Model,
    /// Sheet specs.
    Sheets,
    /// Projection specs.
    Projections,
}

impl Component {
    /// Every component in reporting order.
    pub const ALL: [Self; 3] = [Self::Model, Self::Sheets, Self::Projections];

    fn title(self) -> &'static str {
        match self {
            Self::Model => "Model",
            Self::Sheets => "Sheets",
            Self::Projections => "Projections",
        }
    }
}

/// A model instance: the specs produced by running a [`ModelDefinition`]'s
/// setup stages against a set of model parameters.
#[derive(Debug, Clone)]
pub struct Model {
    definition: Arc<ModelDefinition>,
    parameters: ParamMap,
    default_parameters: ParamMap,
    time_dependent: bool,
    projection_collision: CollisionPolicy,
    attrs: AttrTree<ParamValue>,
    training_patterns: AttrTree<PatternGenerator>,
    sheets: AttrTree<SheetSpec>,
    projections: AttrTree<ProjectionSpec>,
}

impl Model {
    /// Creates a model and runs the setup stages selected in `options`.
    ///
    /// # Errors
    /// [`SubmodelError::UnknownModelParameter`] for overrides the definition
    /// does not declare, or any error raised by [`Model::setup`].
    pub fn new(
        definition: Arc<ModelDefinition>,
        options: &ModelOptions,
    ) -> Result<Self, SubmodelError> {
        let default_parameters: ParamMap = definition
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();
        let mut parameters = default_parameters.clone();
        for (name, value) in &options.overrides {
            if !parameters.contains_key(name) {
                return Err(SubmodelError::UnknownModelParameter(name.clone()));
            }
            parameters.insert(name.clone(), value.clone());
        }
        let mut model = Self {
            definition,
            parameters,
            default_parameters,
            time_dependent: options.time_dependent,
            projection_collision: options.projection_collision,
            attrs: AttrTree::new(),
            training_patterns: AttrTree::new(),
            sheets: AttrTree::new(),
            projections: AttrTree::new(),
        };
        model.setup(&options.setup)?;
        Ok(model)
    }

    /// Model name (the definition's name).
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The definition this model was built from.
    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    /// Current model parameters.
    pub fn parameters(&self) -> &ParamMap {
        &self.parameters
    }

    /// Looks up one model parameter.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Numeric model parameter, or `fallback` when absent or non-numeric.
    pub fn param_f64(&self, name: &str, fallback: f64) -> f64 {
        self.param(name).and_then(ParamValue::as_f64).unwrap_or(fallback)
    }

    /// Model parameters that differ from their declared defaults.
    pub fn modified_parameters(&self) -> ParamMap {
        self.parameters
            .iter()
            .filter(|(k, v)| self.default_parameters.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether stochastic consumers are time-driven.
    pub fn time_dependent(&self) -> bool {
        self.time_dependent
    }

    /// Attributes precomputed by the attributes hook.
    pub fn attrs(&self) -> &AttrTree<ParamValue> {
        &self.attrs
    }

    /// Training pattern generators keyed by target sheet name.
    pub fn training_patterns(&self) -> &AttrTree<PatternGenerator> {
        &self.training_patterns
    }

    /// Sheet specs keyed by canonical name.
    pub fn sheets(&self) -> &AttrTree<SheetSpec> {
        &self.sheets
    }

    /// Mutable sheet specs, for adjusting parameters before instantiation.
    pub fn sheets_mut(&mut self) -> &mut AttrTree<SheetSpec> {
        &mut self.sheets
    }

    /// Projection specs keyed by `(dest, name)`.
    pub fn projections(&self) -> &AttrTree<ProjectionSpec> {
        &self.projections
    }

    /// Mutable projection specs, for adjusting parameters or precedence.
    pub fn projections_mut(&mut self) -> &mut AttrTree<ProjectionSpec> {
        &mut self.projections
    }

    /// Runs the selected setup stages in their fixed order.
    ///
    /// Stages are not incremental: re-running `sheets` or `projections` on a
    /// model that already has specs merges into the existing collections.
    ///
    /// # Errors
    /// Missing hooks, unknown levels or matchnames, and missing projection
    /// names all abort setup at the point they are detected.
    pub fn setup(&mut self, stages: &Selection<SetupStage>) -> Result<(), SubmodelError> {
        for stage in SetupStage::ALL {
            if !stages.includes(&stage) {
                continue;
            }
            debug!(model = self.name(), stage = stage.as_str(), "setup stage");
            match stage {
                SetupStage::Attributes => self.setup_attributes(),
                SetupStage::TrainingPatterns => self.setup_training_patterns()?,
                SetupStage::Sheets => {
                    self.setup_sheets()?;
                    self.update_sheet_spec_parameters()?;
                }
                SetupStage::Projections => self.compute_projection_specs()?,
                SetupStage::Analysis => {
                    if let Some(hook) = self.definition.analysis_hook() {
                        hook(self);
                    }
                }
            }
        }
        Ok(())
    }

    fn setup_attributes(&mut self) {
        if let Some(hook) = self.definition.attributes_hook() {
            let attrs = std::mem::take(&mut self.attrs);
            self.attrs = hook(self, attrs);
        }
    }

    fn setup_training_patterns(&mut self) -> Result<(), SubmodelError> {
        let hook = self
            .definition
            .training_patterns_hook()
            .ok_or_else(|| self.missing_hook("training_patterns"))?;
        for (name, pattern) in hook(self) {
            self.training_patterns.set_path(name.as_str(), pattern);
        }
        Ok(())
    }

    fn setup_sheets(&mut self) -> Result<(), SubmodelError> {
        let hook = self
            .definition
            .sheets_hook()
            .ok_or_else(|| self.missing_hook("sheets"))?;
        let levels = hook(self);
        for (ordering, (level, property_list)) in levels.into_iter().enumerate() {
            let Some(property_maps) = property_list.into_property_maps() else {
                debug!(level = level.as_str(), "no sheets at level");
                continue;
            };
            let sheet_type = self
                .definition
                .sheet_types()
                .get(&level)
                .cloned()
                .ok_or_else(|| SubmodelError::UnknownSheetLevel(level.clone()))?;
            for mut properties in property_maps {
                if let Some(given) = properties.get("level") {
                    return Err(SubmodelError::LevelInProperties {
                        level,
                        given: given.to_string(),
                    });
                }
                properties.insert("level".to_owned(), ParamValue::Str(level.clone()));
                let mut sheet = SheetSpec::with_name_ordering(
                    sheet_type.clone(),
                    &properties,
                    self.definition.name_ordering(),
                )?;
                sheet.set_sort_precedence(i64::try_from(ordering).unwrap_or(i64::MAX));
                let name = sheet.name().to_owned();
                debug!(sheet = name.as_str(), level = level.as_str(), "sheet spec");
                self.sheets.set_path(name.as_str(), sheet);
            }
        }
        Ok(())
    }

    fn update_sheet_spec_parameters(&mut self) -> Result<(), SubmodelError> {
        let mut updates = Vec::with_capacity(self.sheets.len());
        for sheet in self.sheets.values() {
            let level = sheet.level();
            let params = self
                .definition
                .sheet_labels()
                .get(&level)
                .ok_or(SubmodelError::MissingSheetParameters(level))?;
            updates.push(params(self, sheet.properties()));
        }
        for (sheet, update) in self.sheets.values_mut().zip(updates) {
            sheet.update(update);
        }
        Ok(())
    }

    /// Matchconditions for every sheet as a destination, in sheet order.
    /// Destinations at a level without rules get `None` (no incoming edges).
    fn destination_conditions(&self) -> Result<Vec<Option<Conditions>>, SubmodelError> {
        let table = self.definition.match_conditions();
        self.sheets
            .values()
            .map(|dest| {
                let level = dest.level();
                if table.contains(&level) {
                    table
                        .compute_conditions(&level, self, dest.properties())
                        .map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    fn compute_projection_specs(&mut self) -> Result<(), SubmodelError> {
        let conditions = self.destination_conditions()?;
        let mut created = Vec::new();
        for src in self.sheets.values() {
            for (dest, dest_conditions) in self.sheets.values().zip(&conditions) {
                let Some(dest_conditions) = dest_conditions else {
                    continue;
                };
                for (matchname, criteria) in dest_conditions {
                    if !matchcondition_holds(criteria.as_ref(), src.properties()) {
                        continue;
                    }
                    created.extend(self.projections_for(matchname, src, dest)?);
                }
            }
        }

        for (path, projection) in created {
            let label = path.to_string();
            if self.projection_collision == CollisionPolicy::Error
                && self.projections.contains(&path)
            {
                return Err(SubmodelError::DuplicateProjection(label));
            }
            if self.projections.set_path(path, projection).is_some() {
                debug!(projection = label.as_str(), "projection replaced");
            }
        }
        Ok(())
    }

    fn projections_for(
        &self,
        matchname: &str,
        src: &SheetSpec,
        dest: &SheetSpec,
    ) -> Result<Vec<(TreePath, ProjectionSpec)>, SubmodelError> {
        let unknown = || SubmodelError::UnknownProjection(matchname.to_owned());
        let projection_type = self
            .definition
            .projection_types()
            .get(matchname)
            .ok_or_else(unknown)?;
        let params = self
            .definition
            .projection_labels()
            .get(matchname)
            .ok_or_else(unknown)?;

        params(self, src.properties(), dest.properties())
            .into_iter()
            .map(|paramset| {
                let Some(local) = paramset
                    .get("name")
                    .and_then(ParamValue::as_str)
                    .map(str::to_owned)
                else {
                    return Err(SubmodelError::MissingProjectionName {
                        matchname: matchname.to_owned(),
                        dest: dest.name().to_owned(),
                    });
                };
                let mut projection = ProjectionSpec::new(projection_type.clone(), src, dest);
                projection.update(paramset);
                projection.set_matchname(matchname);
                debug!(
                    matchname,
                    src = src.name(),
                    dest = dest.name(),
                    name = local.as_str(),
                    "projection spec"
                );
                Ok((TreePath::new([dest.name(), local.as_str()]), projection))
            })
            .collect()
    }

    /// Projections in instantiation order: ascending precedence, ties in
    /// construction order.
    pub fn ordered_projections(&self) -> Vec<&ProjectionSpec> {
        let mut ordered: Vec<&ProjectionSpec> = self.projections.values().collect();
        ordered.sort_by_key(|p| p.sort_precedence());
        ordered
    }

    /// Sheets in precedence order, ties in construction order.
    pub fn ordered_sheets(&self) -> Vec<&SheetSpec> {
        let mut ordered: Vec<&SheetSpec> = self.sheets.values().collect();
        ordered.sort_by_key(|s| s.sort_precedence());
        ordered
    }

    /// Instantiates the selected collections into `runtime`.
    ///
    /// Sheets go in construction order; projections follow
    /// [`Model::ordered_projections`].
    ///
    /// # Errors
    /// Propagates the first runtime failure.
    pub fn instantiate<R: Runtime>(
        &self,
        runtime: &mut R,
        stages: &Selection<InstantiateStage>,
        verbose: bool,
    ) -> Result<(), SubmodelError> {
        if stages.includes(&InstantiateStage::Sheets) {
            for sheet in self.sheets.values() {
                let message = format!("Level {}: Sheet {}", sheet.level(), sheet.name());
                if verbose {
                    info!("{message}");
                } else {
                    debug!("{message}");
                }
                sheet.instantiate(runtime)?;
            }
        }
        if stages.includes(&InstantiateStage::Projections) {
            for projection in self.ordered_projections() {
                let message = format!(
                    "Match {}: Connection {}->{} {}",
                    projection.matchname().unwrap_or("?"),
                    projection.src(),
                    projection.dest(),
                    projection.local_name().unwrap_or("?"),
                );
                if verbose {
                    info!("{message}");
                } else {
                    debug!("{message}");
                }
                projection.instantiate(runtime)?;
            }
        }
        Ok(())
    }

    /// Multi-line overview: each sheet followed by its incoming projections.
    pub fn summary(&self) -> String {
        let rule = "=".repeat(self.name().len());
        let mut lines = vec![rule.clone(), self.name().to_owned(), rule, String::new()];
        for sheet in self.ordered_sheets() {
            lines.push(sheet.summary());
            let mut incoming: Vec<&ProjectionSpec> = self
                .projections
                .values()
                .filter(|p| p.dest() == sheet.name())
                .collect();
            incoming.sort_by_key(|p| p.to_string());
            for projection in incoming {
                lines.push(format!("   {}", projection.summary()));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }

    /// Lists the modified parameter names of each requested component.
    pub fn modifications(&self, components: &[Component]) -> String {
        let mut lines = Vec::new();
        for component in components {
            let title = component.title();
            let heading = "=".repeat(title.len());
            lines.extend([heading.clone(), title.to_owned(), heading, String::new()]);

            let rows: Vec<(String, ParamMap)> = match component {
                Component::Model => vec![(self.name().to_owned(), self.modified_parameters())],
                Component::Sheets => self
                    .ordered_sheets()
                    .into_iter()
                    .map(|s| (s.to_string(), s.modified_parameters()))
                    .collect(),
                Component::Projections => self
                    .ordered_projections()
                    .into_iter()
                    .map(|p| (p.to_string(), p.modified_parameters()))
                    .collect(),
            };
            let padding = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
            for (name, modified) in rows {
                let keys: Vec<&str> = modified.keys().map(String::as_str).collect();
                lines.push(format!("{name:<padding$} : [{}]", keys.join(", ")));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }

    fn missing_hook(&self, hook: &'static str) -> SubmodelError {
        SubmodelError::MissingHook {
            model: self.name().to_owned(),
            hook,
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Model construction options and their JSON configuration form.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::ordering::OrderEntry;
use crate::value::ParamMap;

/// Error type for loading options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Setup stages, in the order [`crate::Model::setup`] runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStage {
    /// Precompute model attributes.
    Attributes,
    /// Collect training pattern generators.
    TrainingPatterns,
    /// Expand property lists into sheet specs.
    Sheets,
    /// Match sheets and build projection specs.
    Projections,
    /// Configure analysis defaults.
    Analysis,
}

impl SetupStage {
    /// Every stage in execution order.
    pub const ALL: [Self; 5] = [
        Self::Attributes,
        Self::TrainingPatterns,
        Self::Sheets,
        Self::Projections,
        Self::Analysis,
    ];

    /// snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attributes => "attributes",
            Self::TrainingPatterns => "training_patterns",
            Self::Sheets => "sheets",
            Self::Projections => "projections",
            Self::Analysis => "analysis",
        }
    }
}

impl FromStr for SetupStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown setup stage {s:?}"))
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instantiation stages, in the order [`crate::Model::instantiate`] runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstantiateStage {
    /// Register every sheet.
    Sheets,
    /// Connect every projection.
    Projections,
}

impl InstantiateStage {
    /// Every stage in execution order.
    pub const ALL: [Self; 2] = [Self::Sheets, Self::Projections];

    /// snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sheets => "sheets",
            Self::Projections => "projections",
        }
    }
}

impl FromStr for InstantiateStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown instantiate stage {s:?}"))
    }
}

/// Either every stage, or an explicit subset.
///
/// Serialized as `true` (every stage), `false` (none) or a list of stage
/// names. The order of a subset is irrelevant: stages always run in their
/// fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    /// Every stage.
    #[default]
    All,
    /// Only the listed stages.
    Only(Vec<T>),
}

impl<T: PartialEq> Selection<T> {
    /// An empty subset.
    pub fn none() -> Self {
        Self::Only(Vec::new())
    }

    /// Returns `true` when `stage` is selected.
    pub fn includes(&self, stage: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(stages) => stages.contains(stage),
        }
    }
}

impl<T> From<Vec<T>> for Selection<T> {
    fn from(value: Vec<T>) -> Self {
        Self::Only(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionRepr<T> {
    Flag(bool),
    List(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SelectionRepr::deserialize(deserializer)? {
            SelectionRepr::Flag(true) => Self::All,
            SelectionRepr::Flag(false) => Self::Only(Vec::new()),
            SelectionRepr::List(list) => Self::Only(list),
        })
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_bool(true),
            Self::Only(list) => list.serialize(serializer),
        }
    }
}

/// What to do when two projections resolve to the same `(dest, name)` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The later projection replaces the earlier one in place.
    #[default]
    Overwrite,
    /// Setup fails with [`crate::SubmodelError::DuplicateProjection`].
    Error,
}

/// Options for constructing and instantiating a [`crate::Model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOptions {
    /// Setup stages run at construction.
    pub setup: Selection<SetupStage>,
    /// Stages run by instantiation.
    pub instantiate: Selection<InstantiateStage>,
    /// Whether stochastic consumers are time-driven rather than
    /// call-order-driven. When `false`, instantiation order matters and
    /// `connection_order` should usually be given.
    pub time_dependent: bool,
    /// Overrides of declared model parameters.
    pub overrides: ParamMap,
    /// Duplicate projection path handling.
    pub projection_collision: CollisionPolicy,
    /// Legacy explicit projection order.
    pub connection_order: Option<Vec<OrderEntry>>,
    /// Log instantiation at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            setup: Selection::All,
            instantiate: Selection::All,
            time_dependent: true,
            overrides: ParamMap::new(),
            projection_collision: CollisionPolicy::Overwrite,
            connection_order: None,
            verbose: false,
        }
    }
}

impl ModelOptions {
    /// Parses options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ParamValue;

    #[test]
    fn defaults_fill_missing_fields() {
        let opts = ModelOptions::from_json_str("{}").unwrap();
        assert_eq!(opts, ModelOptions::default());
        assert!(opts.time_dependent);
    }

    #[test]
    fn selections_accept_flags_and_lists() {
        let opts = ModelOptions::from_json_str(
            r#"{
                "setup": ["sheets", "projections"],
                "instantiate": false,
                "time_dependent": false,
                "overrides": {"area": 1.5},
                "projection_collision": "error",
                "connection_order": ["A", ["B", {"polarity": "On"}]]
            }"#,
        )
        .unwrap();
        assert!(opts.setup.includes(&SetupStage::Sheets));
        assert!(!opts.setup.includes(&SetupStage::Attributes));
        assert!(!opts.instantiate.includes(&InstantiateStage::Sheets));
        assert_eq!(opts.overrides["area"], ParamValue::Float(1.5));
        assert_eq!(opts.projection_collision, CollisionPolicy::Error);
        let order = opts.connection_order.unwrap();
        assert_eq!(order.len(), 2);
        assert!(order[0].criteria.is_none());
        assert_eq!(order[1].matchname, "B");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            ModelOptions::from_json_str(r#"{"setpu": true}"#),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn stage_names_parse() {
        assert_eq!("training_patterns".parse(), Ok(SetupStage::TrainingPatterns));
        assert!("nonsense".parse::<SetupStage>().is_err());
        assert_eq!("projections".parse(), Ok(InstantiateStage::Projections));
    }
}

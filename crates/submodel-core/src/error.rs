// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for model definition, setup, ordering and instantiation.

use thiserror::Error;

/// Errors raised while defining, setting up or instantiating a model.
///
/// Every variant describes a model-definition mistake; none of them are
/// transient and none are retried.
#[derive(Debug, Error)]
pub enum SubmodelError {
    /// A sheet property mapping did not contain `level`.
    #[error("sheet spec always requires a 'level' property (got {properties})")]
    MissingLevel {
        /// Rendered properties that were supplied.
        properties: String,
    },
    /// A property mapping from the sheets hook carried its own `level`.
    #[error("properties for level {level:?} must not set 'level' (got {given:?})")]
    LevelInProperties {
        /// Level the mapping was listed under.
        level: String,
        /// The `level` value the mapping supplied.
        given: String,
    },
    /// No sheet type was registered for a level named by the sheets hook.
    #[error("no sheet type registered for level {0:?}")]
    UnknownSheetLevel(String),
    /// No parameter function was registered for a level that has sheets.
    #[error("parameters for sheet level {0:?} not specified")]
    MissingSheetParameters(String),
    /// Match conditions were requested for a level with no table.
    #[error("no match conditions defined for level {0:?}")]
    UnknownMatchLevel(String),
    /// A matchcondition named a projection label with no registration.
    #[error("no projection registered for matchname {0:?}")]
    UnknownProjection(String),
    /// A projection parameter set did not supply a string `name`.
    #[error("projection parameters from {matchname:?} into {dest:?} lack a string 'name'")]
    MissingProjectionName {
        /// Matchname whose parameter function produced the set.
        matchname: String,
        /// Destination sheet name.
        dest: String,
    },
    /// Two projections resolved to the same `(dest, name)` path.
    #[error("duplicate projection {0:?}")]
    DuplicateProjection(String),
    /// An override named a parameter the model does not declare.
    #[error("unknown model parameter {0:?}")]
    UnknownModelParameter(String),
    /// A specification was resolved before it was instantiated.
    #[error("{0:?} has not been instantiated in the runtime")]
    NotInstantiated(String),
    /// A runtime type was registered under the wrong object kind.
    #[error("{type_name:?} registered for {label:?} is not a {expected} type")]
    KindMismatch {
        /// Level or matchname the type was registered under.
        label: String,
        /// Runtime type name.
        type_name: String,
        /// Expected kind ("sheet" or "projection").
        expected: &'static str,
    },
    /// A setup hook required by the requested stages was not supplied.
    #[error("model {model:?} does not define the {hook} hook")]
    MissingHook {
        /// Model name.
        model: String,
        /// Hook name.
        hook: &'static str,
    },
    /// The runtime rejected a register/connect call.
    #[error("runtime error: {0}")]
    Runtime(String),
    /// Legacy projection ordering failed.
    #[error(transparent)]
    Ordering(#[from] OrderingError),
}

/// Failures of the legacy explicit projection ordering helper.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    /// No entry in the connection order names the projection's matchname.
    #[error("could not order projection {0:?}")]
    Unmatched(String),
    /// Several entries share a matchname but do not each name one common key.
    #[error("please specify only a single property to sort on (projection {0:?})")]
    NotSingleKey(String),
    /// The source sheet lacks the property used to disambiguate.
    #[error("source of projection {projection:?} has no property {key:?}")]
    MissingSourceProperty {
        /// Projection name.
        projection: String,
        /// Disambiguating property key.
        key: String,
    },
    /// Zero or several entries matched the source property value.
    #[error("could not order projection {projection:?} by property {key:?}")]
    Ambiguous {
        /// Projection name.
        projection: String,
        /// Disambiguating property key.
        key: String,
    },
    /// The destination level has no matchcondition table.
    #[error("no match conditions defined for level {0:?}")]
    UnknownLevel(String),
}

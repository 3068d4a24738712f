// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! submodel-core: declarative sheet/projection model specification.
//!
//! A [`ModelDefinition`] registers, per sheet level, the runtime type and the
//! function computing sheet parameters; per matchname, the projection type
//! and the function computing projection parameters; and, per destination
//! level, the rules deciding which sources connect to it. A [`Model`] expands
//! the definition's per-level property lists into [`SheetSpec`]s, searches
//! every (source, destination) pair for matching rules to build
//! [`ProjectionSpec`]s, and instantiates everything into a [`Runtime`] in a
//! deterministic order.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::float_cmp))]

/// Demo model definitions (early-vision retina/LGN/V1).
pub mod demo;

mod definition;
mod error;
mod matchcond;
mod model;
mod object_type;
mod options;
mod ordering;
mod registry;
mod rule;
mod runtime;
mod spec;
mod tree;
mod value;

// Re-exports for stable public API
/// Model definitions, the builder and setup hook shapes.
pub use definition::{
    AnalysisHook, AttributesHook, ModelBuilder, ModelDefinition, PatternGenerator, PropertyList,
    SheetsHook, TrainingPatternsHook,
};
/// Error types.
pub use error::{OrderingError, SubmodelError};
/// Matchcondition table and the acceptance test.
pub use matchcond::{matchcondition_holds, Conditions, MatchConditions};
/// Model orchestration.
pub use model::{Component, Model};
/// Runtime type descriptors.
pub use object_type::{ObjectKind, ObjectType, ObjectTypeRef, ParamDescriptor};
/// Construction options and configuration loading.
pub use options::{
    CollisionPolicy, ConfigError, InstantiateStage, ModelOptions, Selection, SetupStage,
};
/// Legacy explicit projection ordering.
pub use ordering::{order_projections, OrderEntry};
/// Priority-ordered label registries.
pub use registry::{collect, DecoratorSet, Priority, PriorityCounter, TypeDecorator};
/// Parameter and match function shapes.
pub use rule::{MatchFn, ProjectionParamsFn, SheetParamsFn};
/// Runtime port and in-memory recorder.
pub use runtime::{Instance, RecordingRuntime, Runtime, RuntimeCall};
/// Specifications.
pub use spec::{ProjectionSpec, SheetSpec, Specification, Specified};
/// Path-indexed collections.
pub use tree::{AttrTree, TreePath};
/// Parameter values and sheet properties.
pub use value::{params, ParamMap, ParamValue, Properties, DEFAULT_NAME_ORDERING};

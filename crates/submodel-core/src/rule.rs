// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Function shapes a model definition registers.
use crate::model::Model;
use crate::value::{ParamMap, Properties};

/// Computes the parameters for every sheet of one level from its properties.
pub type SheetParamsFn = fn(&Model, &Properties) -> ParamMap;

/// Computes the parameter sets for projections from `src` into `dest`.
///
/// Always a sequence: one matchname may produce several distinct edges into
/// the same destination (e.g. split by a source property). Every set must
/// carry a string `name`.
pub type ProjectionParamsFn = fn(&Model, &Properties, &Properties) -> Vec<ParamMap>;

/// Given a destination's properties, yields the criteria a candidate source
/// must satisfy, or `None` when the rule does not apply to this destination.
pub type MatchFn = fn(&Model, &Properties) -> Option<ParamMap>;

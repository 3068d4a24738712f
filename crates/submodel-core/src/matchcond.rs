// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-level matching rules deciding which sources connect to a destination.

use crate::error::SubmodelError;
use crate::model::Model;
use crate::rule::MatchFn;
use crate::value::{ParamMap, Properties};

/// Criteria produced by every rule of a level, in registration order.
pub type Conditions = Vec<(String, Option<ParamMap>)>;

/// `level -> (method name -> rule)` table.
///
/// Unlike the label registries there is no priority here: registering the
/// same `(level, method)` again replaces the rule in place.
#[derive(Debug, Clone, Default)]
pub struct MatchConditions {
    levels: Vec<(String, Vec<(String, MatchFn)>)>,
}

impl MatchConditions {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `rule` under `(level, method_name)`.
    pub fn register(
        &mut self,
        level: impl Into<String>,
        method_name: impl Into<String>,
        rule: MatchFn,
    ) {
        let level = level.into();
        let method_name = method_name.into();
        let rules = match self.levels.iter().position(|(l, _)| *l == level) {
            Some(slot) => &mut self.levels[slot].1,
            None => {
                self.levels.push((level, Vec::new()));
                let last = self.levels.len() - 1;
                &mut self.levels[last].1
            }
        };
        match rules.iter_mut().find(|(name, _)| *name == method_name) {
            Some(existing) => existing.1 = rule,
            None => rules.push((method_name, rule)),
        }
    }

    /// Returns `true` when at least one rule exists for `level`.
    pub fn contains(&self, level: &str) -> bool {
        self.levels.iter().any(|(l, _)| l == level)
    }

    /// Levels with rules, in first-registration order.
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|(l, _)| l.as_str())
    }

    /// Evaluates every rule registered for `level`.
    ///
    /// # Errors
    /// [`SubmodelError::UnknownMatchLevel`] when `level` has no rules.
    pub fn compute_conditions(
        &self,
        level: &str,
        model: &Model,
        properties: &Properties,
    ) -> Result<Conditions, SubmodelError> {
        let Some((_, rules)) = self.levels.iter().find(|(l, _)| l == level) else {
            return Err(SubmodelError::UnknownMatchLevel(level.to_owned()));
        };
        Ok(rules
            .iter()
            .map(|(name, rule)| (name.clone(), rule(model, properties)))
            .collect())
    }
}

/// Decides whether a candidate source satisfies `criteria`.
///
/// * `None` never holds.
/// * Keys absent from the source are ignored, so empty criteria always hold.
/// * For shared keys the string form of the source value must occur inside
///   the string form of the criterion value: `{"polarity": "OnOff"}` admits
///   sources with polarity `On` and `Off`.
pub fn matchcondition_holds(criteria: Option<&ParamMap>, src: &Properties) -> bool {
    let Some(criteria) = criteria else {
        return false;
    };
    criteria.iter().all(|(key, wanted)| match src.get(key) {
        Some(actual) => wanted.to_string().contains(&actual.to_string()),
        None => true,
    })
}

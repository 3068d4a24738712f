// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Legacy explicit projection ordering.
//!
//! Only needed to reproduce a fixed pseudo-random consumption order when
//! stochastic consumers are not time-driven. New models should leave every
//! projection at precedence 0 and rely on registration order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::OrderingError;
use crate::model::Model;
use crate::spec::Specified;
use crate::value::{ParamMap, ParamValue};

/// One position in a connection order: a matchname, optionally narrowed by
/// a single source-sheet property.
///
/// Serialized as `"matchname"` or `["matchname", {"key": value}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntry {
    /// Matchname of the projections this entry positions.
    pub matchname: String,
    /// Source property criteria; must hold exactly one key when the
    /// matchname appears more than once in the order.
    pub criteria: Option<ParamMap>,
}

impl OrderEntry {
    /// Matches every projection produced by `matchname`.
    pub fn name(matchname: impl Into<String>) -> Self {
        Self {
            matchname: matchname.into(),
            criteria: None,
        }
    }

    /// Matches projections produced by `matchname` whose source has
    /// property `key` equal to `value`.
    pub fn by_property(
        matchname: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self {
            matchname: matchname.into(),
            criteria: Some(std::iter::once((key.into(), value.into())).collect()),
        }
    }
}

impl From<&str> for OrderEntry {
    fn from(value: &str) -> Self {
        Self::name(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OrderEntryRepr {
    Name(String),
    Pair(String, ParamMap),
}

impl<'de> Deserialize<'de> for OrderEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match OrderEntryRepr::deserialize(deserializer)? {
            OrderEntryRepr::Name(matchname) => Self::name(matchname),
            OrderEntryRepr::Pair(matchname, criteria) => Self {
                matchname,
                criteria: Some(criteria),
            },
        })
    }
}

impl Serialize for OrderEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.criteria {
            None => OrderEntryRepr::Name(self.matchname.clone()).serialize(serializer),
            Some(criteria) => {
                OrderEntryRepr::Pair(self.matchname.clone(), criteria.clone()).serialize(serializer)
            }
        }
    }
}

/// Sets every projection's precedence to the position of the entry in
/// `connection_order` that matches it.
///
/// A matchname listed once matches unconditionally. A matchname listed
/// several times is disambiguated by one property key shared by all of its
/// entries, compared for equality against the projection's source sheet.
///
/// # Errors
/// Fails on the first projection that cannot be placed; no precedence is
/// changed in that case.
pub fn order_projections(
    model: &mut Model,
    connection_order: &[OrderEntry],
) -> Result<(), OrderingError> {
    let mut assignments = Vec::with_capacity(model.projections().len());
    for (path, spec) in model.projections().iter() {
        let label = spec.to_string();
        let matchname = spec.matchname().unwrap_or_default();
        let matches: Vec<(usize, &OrderEntry)> = connection_order
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.matchname == matchname)
            .collect();

        let position = match matches.as_slice() {
            [] => return Err(OrderingError::Unmatched(label)),
            [(position, _)] => *position,
            _ => {
                let key = shared_single_key(&matches)
                    .ok_or_else(|| OrderingError::NotSingleKey(label.clone()))?;
                let dest_level = model
                    .sheets()
                    .get_name(spec.dest())
                    .map_or_else(|| spec.dest().to_owned(), |sheet| sheet.level());
                if !model.definition().match_conditions().contains(&dest_level) {
                    return Err(OrderingError::UnknownLevel(dest_level));
                }
                let value = model
                    .sheets()
                    .get_name(spec.src())
                    .and_then(|sheet| sheet.properties().get(key))
                    .ok_or_else(|| OrderingError::MissingSourceProperty {
                        projection: label.clone(),
                        key: key.to_owned(),
                    })?;
                let hits: Vec<usize> = matches
                    .iter()
                    .filter(|(_, entry)| {
                        entry
                            .criteria
                            .as_ref()
                            .and_then(|criteria| criteria.get(key))
                            == Some(value)
                    })
                    .map(|(position, _)| *position)
                    .collect();
                match hits.as_slice() {
                    [position] => *position,
                    _ => {
                        return Err(OrderingError::Ambiguous {
                            projection: label,
                            key: key.to_owned(),
                        })
                    }
                }
            }
        };
        assignments.push((path.clone(), position));
    }

    for (path, position) in assignments {
        if let Some(spec) = model.projections_mut().get_mut(&path) {
            spec.set_sort_precedence(i64::try_from(position).unwrap_or(i64::MAX));
        }
    }
    Ok(())
}

/// The one key every entry's criteria consists of, if there is one.
fn shared_single_key<'a>(matches: &[(usize, &'a OrderEntry)]) -> Option<&'a str> {
    let mut shared: Option<&str> = None;
    for (_, entry) in matches {
        let criteria = entry.criteria.as_ref()?;
        if criteria.len() != 1 {
            return None;
        }
        let key = criteria.keys().next()?.as_str();
        match shared {
            Some(existing) if existing != key => return None,
            _ => shared = Some(key),
        }
    }
    shared
}

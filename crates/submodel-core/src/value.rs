// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parameter values, parameter maps and canonically ordered sheet properties.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyword-argument style mapping passed to runtime objects.
///
/// Backed by a `BTreeMap` so iteration (and therefore every downstream
/// ordering that depends on it) is identical run-over-run.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Canonical key order used to derive sheet names from their properties.
pub const DEFAULT_NAME_ORDERING: &[&str] =
    &["eye", "level", "cone", "polarity", "SF", "opponent", "surround"];

/// A dynamically typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ParamValue {
    /// Absent / unset value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String value.
    Str(String),
    /// Ordered list of values.
    List(Vec<ParamValue>),
    /// Nested mapping.
    Map(ParamMap),
}

impl ParamValue {
    /// Returns the string slice when this is a [`ParamValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `f64` for numeric variants.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the integer when this is a [`ParamValue::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the nested map when this is a [`ParamValue::Map`].
    pub fn as_map(&self) -> Option<&ParamMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// The "string form" of a value: used verbatim for sheet names and for
/// substring matching of properties. Strings render without quotes.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Whole floats keep a `.0` so `1.0` never names the same sheet as `1`.
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        Self::List(value)
    }
}

impl From<ParamMap> for ParamValue {
    fn from(value: ParamMap) -> Self {
        Self::Map(value)
    }
}

/// Builds a [`ParamMap`] from `(key, value)` pairs.
///
/// ```
/// use submodel_core::{params, ParamValue};
/// let p = params([("name", ParamValue::from("Afferent")), ("strength", 1.5.into())]);
/// assert_eq!(p["strength"], ParamValue::Float(1.5));
/// ```
pub fn params<K, I>(pairs: I) -> ParamMap
where
    K: Into<String>,
    I: IntoIterator<Item = (K, ParamValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Sheet properties restricted to, and ordered by, a canonical key order.
///
/// The concatenated string forms of the values (in that order) are the
/// sheet's name, so two property sets that agree on every canonical key
/// always produce the same name regardless of how they were supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties {
    entries: Vec<(String, ParamValue)>,
}

impl Properties {
    /// Filters `input` against `ordering`, keeping only keys named there, in
    /// that order. Keys outside the ordering are dropped.
    pub fn canonical<S: AsRef<str>>(input: &ParamMap, ordering: &[S]) -> Self {
        let entries = ordering
            .iter()
            .filter_map(|key| {
                let key = key.as_ref();
                input.get(key).map(|v| (key.to_owned(), v.clone()))
            })
            .collect();
        Self { entries }
    }

    /// Looks up a property by key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The mandatory `level` property, when present.
    pub fn level(&self) -> Option<&ParamValue> {
        self.get("level")
    }

    /// Iterates `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of retained properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no property was retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concatenation of the value string forms in canonical order.
    pub fn name(&self) -> String {
        self.entries.iter().map(|(_, v)| v.to_string()).collect()
    }

    /// Copies the properties into an (unordered) parameter map.
    pub fn to_param_map(&self) -> ParamMap {
        self.entries.iter().cloned().collect()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k:?}: {v:?}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_drops_unknown_keys_and_orders() {
        let input = params([
            ("SF", ParamValue::from(2)),
            ("colour", "red".into()),
            ("level", "V1".into()),
        ]);
        let props = Properties::canonical(&input, DEFAULT_NAME_ORDERING);
        let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["level", "SF"]);
        assert_eq!(props.name(), "V12");
        assert!(!props.contains_key("colour"));
    }

    #[test]
    fn display_renders_strings_bare() {
        assert_eq!(ParamValue::from("OnOff").to_string(), "OnOff");
        assert_eq!(ParamValue::from(3).to_string(), "3");
        assert_eq!(ParamValue::from(1.5).to_string(), "1.5");
        let list = ParamValue::List(vec!["a".into(), 1.into()]);
        assert_eq!(list.to_string(), "[a, 1]");
    }

    #[test]
    fn whole_floats_stay_distinct_from_ints() {
        assert_eq!(ParamValue::from(1.0).to_string(), "1.0");
        assert_eq!(ParamValue::from(-2.0).to_string(), "-2.0");
        assert_ne!(ParamValue::from(1.0).to_string(), ParamValue::from(1).to_string());

        let level = ParamValue::from("V1");
        let int = params([("level", level.clone()), ("SF", 1.into())]);
        let float = params([("level", level), ("SF", 1.0.into())]);
        assert_eq!(Properties::canonical(&int, DEFAULT_NAME_ORDERING).name(), "V11");
        assert_eq!(Properties::canonical(&float, DEFAULT_NAME_ORDERING).name(), "V11.0");
    }

    #[test]
    fn untagged_json_round_trips_numbers() {
        let v: ParamValue = serde_json::from_str("1").unwrap();
        assert_eq!(v, ParamValue::Int(1));
        let v: ParamValue = serde_json::from_str("0.25").unwrap();
        assert_eq!(v, ParamValue::Float(0.25));
        let v: ParamValue = serde_json::from_str(r#"{"polarity":"On"}"#).unwrap();
        assert_eq!(v.as_map().and_then(|m| m["polarity"].as_str()), Some("On"));
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sheet and projection specifications.
//!
//! A specification is a template for a runtime object: the parameters it
//! will be constructed with (seeded from the runtime type's declared
//! defaults) and a precedence used to order instantiation.

use std::cmp::Ordering;
use std::fmt;

use crate::error::SubmodelError;
use crate::object_type::{ObjectType, ObjectTypeRef};
use crate::runtime::Runtime;
use crate::value::{ParamMap, ParamValue, Properties, DEFAULT_NAME_ORDERING};

/// Parameter keys a projection receives positionally rather than as
/// keyword parameters.
const POSITIONAL_PROJECTION_KEYS: [&str; 2] = ["src", "dest"];

/// Parameter state shared by every specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    parameters: ParamMap,
    default_parameters: ParamMap,
    sort_precedence: i64,
}

impl Specification {
    /// Seeds parameters from the declared defaults of `object_type`.
    pub fn new(object_type: &ObjectType) -> Self {
        let parameters = object_type.defaults();
        Self {
            default_parameters: parameters.clone(),
            parameters,
            sort_precedence: 0,
        }
    }

    /// Current parameters.
    pub fn parameters(&self) -> &ParamMap {
        &self.parameters
    }

    /// Defaults recorded at construction.
    pub fn default_parameters(&self) -> &ParamMap {
        &self.default_parameters
    }

    /// Merges `partial` into the parameters; keys not named are untouched.
    pub fn update(&mut self, partial: ParamMap) {
        self.parameters.extend(partial);
    }

    /// Parameters whose value differs from the recorded default.
    ///
    /// Keys that were never declared by the runtime type count as modified.
    pub fn modified_parameters(&self) -> ParamMap {
        self.parameters
            .iter()
            .filter(|(k, v)| self.default_parameters.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Ordering key for instantiation.
    pub fn sort_precedence(&self) -> i64 {
        self.sort_precedence
    }

    /// Sets the ordering key.
    pub fn set_sort_precedence(&mut self, precedence: i64) {
        self.sort_precedence = precedence;
    }

    fn remove_parameter(&mut self, key: &str) {
        self.parameters.remove(key);
    }
}

/// Common behaviour of sheet and projection specifications.
///
/// `Display` renders the name the runtime registers the object under.
pub trait Specified: fmt::Display {
    /// Shared parameter state.
    fn specification(&self) -> &Specification;

    /// Mutable shared parameter state.
    fn specification_mut(&mut self) -> &mut Specification;

    /// One-line description including the runtime type name.
    fn summary(&self) -> String;

    /// Merges `partial` into the parameters.
    fn update(&mut self, partial: ParamMap) {
        self.specification_mut().update(partial);
    }

    /// Parameters that differ from their defaults.
    fn modified_parameters(&self) -> ParamMap {
        self.specification().modified_parameters()
    }

    /// Ordering key for instantiation.
    fn sort_precedence(&self) -> i64 {
        self.specification().sort_precedence()
    }

    /// Sets the ordering key.
    fn set_sort_precedence(&mut self, precedence: i64) {
        self.specification_mut().set_sort_precedence(precedence);
    }

    /// Compares by precedence only; ties are resolved by the caller's
    /// stable sort.
    fn cmp_precedence(&self, other: &dyn Specified) -> Ordering {
        self.sort_precedence().cmp(&other.sort_precedence())
    }

    /// Returns the runtime object already registered under this spec's name.
    ///
    /// # Errors
    /// [`SubmodelError::NotInstantiated`] when the runtime holds nothing under
    /// that name.
    fn resolve<'r, R: Runtime>(&self, runtime: &'r R) -> Result<&'r R::Instance, SubmodelError>
    where
        Self: Sized,
    {
        let name = self.to_string();
        runtime.lookup(&name).ok_or(SubmodelError::NotInstantiated(name))
    }
}

/// Template for a sheet (node).
#[derive(Debug, Clone)]
pub struct SheetSpec {
    spec: Specification,
    sheet_type: ObjectTypeRef,
    properties: Properties,
    name: String,
}

impl SheetSpec {
    /// Builds a sheet spec using [`DEFAULT_NAME_ORDERING`].
    ///
    /// # Errors
    /// [`SubmodelError::MissingLevel`] when `properties` has no `level`.
    pub fn new(sheet_type: ObjectTypeRef, properties: &ParamMap) -> Result<Self, SubmodelError> {
        Self::with_name_ordering(sheet_type, properties, DEFAULT_NAME_ORDERING)
    }

    /// Builds a sheet spec whose properties are filtered and ordered by
    /// `ordering`.
    ///
    /// # Errors
    /// [`SubmodelError::MissingLevel`] when `level` is absent from
    /// `properties` or from `ordering`.
    pub fn with_name_ordering<S: AsRef<str>>(
        sheet_type: ObjectTypeRef,
        properties: &ParamMap,
        ordering: &[S],
    ) -> Result<Self, SubmodelError> {
        let canonical = Properties::canonical(properties, ordering);
        if !properties.contains_key("level") || !canonical.contains_key("level") {
            return Err(SubmodelError::MissingLevel {
                properties: format!("{properties:?}"),
            });
        }
        Ok(Self {
            spec: Specification::new(&sheet_type),
            name: canonical.name(),
            properties: canonical,
            sheet_type,
        })
    }

    /// Canonically ordered properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The `level` property in string form.
    pub fn level(&self) -> String {
        self.properties
            .level()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Canonical name (concatenated property values).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runtime type this spec instantiates.
    pub fn sheet_type(&self) -> &ObjectType {
        &self.sheet_type
    }

    /// Parameters the runtime receives: all spec parameters, with
    /// `properties` set to the `properties` parameter overlaid by this
    /// spec's own properties.
    pub fn instantiation_parameters(&self) -> ParamMap {
        let mut merged = self
            .spec
            .parameters()
            .get("properties")
            .and_then(ParamValue::as_map)
            .cloned()
            .unwrap_or_default();
        merged.extend(self.properties.to_param_map());
        let mut params = self.spec.parameters().clone();
        params.insert("properties".to_owned(), ParamValue::Map(merged));
        params
    }

    /// Constructs the sheet and registers it under this spec's name.
    ///
    /// # Errors
    /// Propagates the runtime's failure.
    pub fn instantiate<R: Runtime>(&self, runtime: &mut R) -> Result<(), SubmodelError> {
        runtime.register(&self.name, &self.sheet_type, self.instantiation_parameters())
    }
}

impl fmt::Display for SheetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Specified for SheetSpec {
    fn specification(&self) -> &Specification {
        &self.spec
    }

    fn specification_mut(&mut self) -> &mut Specification {
        &mut self.spec
    }

    fn summary(&self) -> String {
        format!("{} : {}", self.name, self.sheet_type.name())
    }
}

/// Template for a projection (edge) between two sheets.
///
/// The endpoints are held by name; the sheet specs themselves stay owned by
/// the model that built them.
#[derive(Debug, Clone)]
pub struct ProjectionSpec {
    spec: Specification,
    projection_type: ObjectTypeRef,
    src: String,
    dest: String,
    matchname: Option<String>,
}

impl ProjectionSpec {
    /// Builds a projection spec from `src` into `dest`.
    pub fn new(projection_type: ObjectTypeRef, src: &SheetSpec, dest: &SheetSpec) -> Self {
        Self::between(projection_type, src.name(), dest.name())
    }

    /// Builds a projection spec between two sheet names.
    pub fn between(
        projection_type: ObjectTypeRef,
        src: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        let mut spec = Specification::new(&projection_type);
        for key in POSITIONAL_PROJECTION_KEYS {
            spec.remove_parameter(key);
        }
        Self {
            spec,
            projection_type,
            src: src.into(),
            dest: dest.into(),
            matchname: None,
        }
    }

    /// Source sheet name.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Destination sheet name.
    pub fn dest(&self) -> &str {
        &self.dest
    }

    /// The destination-local `name` parameter, when it is a string.
    pub fn local_name(&self) -> Option<&str> {
        self.spec.parameters().get("name").and_then(ParamValue::as_str)
    }

    /// Matchname of the rule that produced this projection.
    pub fn matchname(&self) -> Option<&str> {
        self.matchname.as_deref()
    }

    /// Tags the projection with its originating matchname.
    pub fn set_matchname(&mut self, matchname: impl Into<String>) {
        self.matchname = Some(matchname.into());
    }

    /// Runtime type this spec instantiates.
    pub fn projection_type(&self) -> &ObjectType {
        &self.projection_type
    }

    /// Keyword parameters handed to the runtime (never `src`/`dest`).
    pub fn instantiation_parameters(&self) -> ParamMap {
        let mut params = self.spec.parameters().clone();
        for key in POSITIONAL_PROJECTION_KEYS {
            params.remove(key);
        }
        params
    }

    /// Connects `src` to `dest` in the runtime.
    ///
    /// # Errors
    /// Propagates the runtime's failure.
    pub fn instantiate<R: Runtime>(&self, runtime: &mut R) -> Result<(), SubmodelError> {
        runtime.connect(
            &self.src,
            &self.dest,
            &self.projection_type,
            self.instantiation_parameters(),
        )
    }
}

impl fmt::Display for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spec.parameters().get("name") {
            Some(name) => write!(f, "{}.{}", self.dest, name),
            None => write!(f, "{}.", self.dest),
        }
    }
}

impl Specified for ProjectionSpec {
    fn specification(&self) -> &Specification {
        &self.spec
    }

    fn specification_mut(&mut self) -> &mut Specification {
        &mut self.spec
    }

    fn summary(&self) -> String {
        format!(
            "{self} [{} -> {}] : {}",
            self.src,
            self.dest,
            self.projection_type.name()
        )
    }
}

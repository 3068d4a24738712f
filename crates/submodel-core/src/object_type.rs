// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Descriptors for runtime node and edge types.
//!
//! The runtime owns the real sheet and projection implementations; the
//! planner only needs a name, a kind, and the ordered declared parameters
//! with their defaults.

use std::sync::Arc;

use crate::value::{ParamMap, ParamValue};

/// Whether a runtime type produces nodes or edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A sheet (node) type.
    Sheet,
    /// A projection (edge) type.
    Projection,
}

/// A declared parameter of a runtime type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter name.
    pub name: String,
    /// Default value seeded into every specification of the owning type.
    pub default: ParamValue,
}

/// Runtime type descriptor: the introspection surface a sheet or projection
/// implementation exposes to the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    name: String,
    kind: ObjectKind,
    params: Vec<ParamDescriptor>,
}

/// Shared handle to a runtime type descriptor.
pub type ObjectTypeRef = Arc<ObjectType>;

impl ObjectType {
    /// Starts a descriptor for a sheet type.
    ///
    /// Sheet types always declare `name` and `properties`.
    pub fn sheet(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Sheet,
            params: Vec::new(),
        }
        .with_param("name", ParamValue::Null)
        .with_param("properties", ParamValue::Map(ParamMap::new()))
    }

    /// Starts a descriptor for a projection type.
    ///
    /// Projection types always declare `name`, `src` and `dest`.
    pub fn projection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Projection,
            params: Vec::new(),
        }
        .with_param("name", ParamValue::Null)
        .with_param("src", ParamValue::Null)
        .with_param("dest", ParamValue::Null)
    }

    /// Declares (or redeclares) a parameter with its default.
    pub fn with_param(mut self, name: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        let name = name.into();
        let default = default.into();
        if let Some(existing) = self.params.iter_mut().find(|p| p.name == name) {
            existing.default = default;
        } else {
            self.params.push(ParamDescriptor { name, default });
        }
        self
    }

    /// Wraps the descriptor in a shared handle.
    pub fn shared(self) -> ObjectTypeRef {
        Arc::new(self)
    }

    /// Type name as reported in summaries.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node or edge type.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Declared defaults as a parameter map.
    pub fn defaults(&self) -> ParamMap {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_a_param_replaces_its_default() {
        let ty = ObjectType::sheet("CFSheet")
            .with_param("nominal_density", 24)
            .with_param("nominal_density", 48);
        assert_eq!(ty.kind(), ObjectKind::Sheet);
        let defaults = ty.defaults();
        assert_eq!(defaults["nominal_density"], ParamValue::Int(48));
        assert_eq!(defaults["properties"], ParamValue::Map(ParamMap::new()));
        assert_eq!(ty.params().len(), 3);
    }
}

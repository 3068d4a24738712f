// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the external simulation runtime, plus an in-memory recorder.

use std::collections::BTreeMap;

use blake3::Hasher;

use crate::error::SubmodelError;
use crate::object_type::ObjectType;
use crate::value::{ParamMap, ParamValue};

/// The three calls the planner makes into a simulation runtime.
pub trait Runtime {
    /// Resolved object type handed back by [`Runtime::lookup`].
    type Instance;

    /// Constructs a node of `object_type` and registers it under `name`.
    fn register(
        &mut self,
        name: &str,
        object_type: &ObjectType,
        params: ParamMap,
    ) -> Result<(), SubmodelError>;

    /// Constructs an edge of `projection_type` from `src` to `dest`.
    ///
    /// `params` never contains `src` or `dest`; the endpoints are passed
    /// positionally.
    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        projection_type: &ObjectType,
        params: ParamMap,
    ) -> Result<(), SubmodelError>;

    /// Returns the instance registered under `name`, if any.
    fn lookup(&self, name: &str) -> Option<&Self::Instance>;
}

/// An object constructed by [`RecordingRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Registered name (`<sheet>` or `<dest>.<projection>`).
    pub name: String,
    /// Runtime type name.
    pub type_name: String,
    /// Parameters the object was constructed with.
    pub params: ParamMap,
    /// `(src, dest)` for projections.
    pub endpoints: Option<(String, String)>,
}

/// One call observed by [`RecordingRuntime`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    /// A sheet registration.
    Register {
        /// Sheet name.
        name: String,
        /// Sheet type name.
        type_name: String,
    },
    /// A projection connection.
    Connect {
        /// Source sheet name.
        src: String,
        /// Destination sheet name.
        dest: String,
        /// Projection type name.
        type_name: String,
        /// Projection name (local to `dest`).
        name: String,
    },
}

/// In-memory runtime that records every call.
///
/// Useful for inspecting an instantiation plan and for checking that the
/// plan is reproducible: [`RecordingRuntime::digest`] changes whenever the
/// order, names, types or parameters of the calls change.
#[derive(Debug, Default, Clone)]
pub struct RecordingRuntime {
    instances: BTreeMap<String, Instance>,
    calls: Vec<RuntimeCall>,
    hasher_input: Vec<Vec<u8>>,
}

impl RecordingRuntime {
    /// Creates an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in the order they were made.
    pub fn calls(&self) -> &[RuntimeCall] {
        &self.calls
    }

    /// All registered instances keyed by name.
    pub fn instances(&self) -> &BTreeMap<String, Instance> {
        &self.instances
    }

    /// BLAKE3 digest over the ordered call log.
    ///
    /// Each call contributes a tag byte followed by length-prefixed
    /// (8-byte little-endian) UTF-8 fields; parameters contribute their
    /// key/value string forms in key order.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(&(self.hasher_input.len() as u64).to_le_bytes());
        for record in &self.hasher_input {
            hasher.update(record);
        }
        hasher.finalize().into()
    }

    /// Hex form of [`RecordingRuntime::digest`].
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    fn record(&mut self, tag: u8, fields: &[&str], params: &ParamMap) {
        let mut bytes = vec![tag];
        for field in fields {
            push_field(&mut bytes, field);
        }
        bytes.extend_from_slice(&(params.len() as u64).to_le_bytes());
        for (k, v) in params {
            push_field(&mut bytes, k);
            push_field(&mut bytes, &v.to_string());
        }
        self.hasher_input.push(bytes);
    }
}

fn push_field(bytes: &mut Vec<u8>, field: &str) {
    bytes.extend_from_slice(&(field.len() as u64).to_le_bytes());
    bytes.extend_from_slice(field.as_bytes());
}

impl Runtime for RecordingRuntime {
    type Instance = Instance;

    fn register(
        &mut self,
        name: &str,
        object_type: &ObjectType,
        params: ParamMap,
    ) -> Result<(), SubmodelError> {
        self.record(0, &[name, object_type.name()], &params);
        self.calls.push(RuntimeCall::Register {
            name: name.to_owned(),
            type_name: object_type.name().to_owned(),
        });
        self.instances.insert(
            name.to_owned(),
            Instance {
                name: name.to_owned(),
                type_name: object_type.name().to_owned(),
                params,
                endpoints: None,
            },
        );
        Ok(())
    }

    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        projection_type: &ObjectType,
        params: ParamMap,
    ) -> Result<(), SubmodelError> {
        if !self.instances.contains_key(src) {
            return Err(SubmodelError::Runtime(format!("unknown source sheet {src:?}")));
        }
        if !self.instances.contains_key(dest) {
            return Err(SubmodelError::Runtime(format!("unknown destination sheet {dest:?}")));
        }
        let Some(local) = params.get("name").and_then(ParamValue::as_str).map(str::to_owned) else {
            return Err(SubmodelError::Runtime(format!(
                "projection into {dest:?} has no name"
            )));
        };
        self.record(1, &[src, dest, projection_type.name(), &local], &params);
        self.calls.push(RuntimeCall::Connect {
            src: src.to_owned(),
            dest: dest.to_owned(),
            type_name: projection_type.name().to_owned(),
            name: local.clone(),
        });
        let full = format!("{dest}.{local}");
        self.instances.insert(
            full.clone(),
            Instance {
                name: full,
                type_name: projection_type.name().to_owned(),
                params,
                endpoints: Some((src.to_owned(), dest.to_owned())),
            },
        );
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{params, ParamValue};

    #[test]
    fn connect_requires_registered_endpoints() {
        let sheet = ObjectType::sheet("GeneratorSheet");
        let proj = ObjectType::projection("CFProjection");
        let mut rt = RecordingRuntime::new();
        rt.register("Retina", &sheet, ParamMap::new()).unwrap();
        let err = rt
            .connect("Retina", "V1", &proj, params([("name", ParamValue::from("Afferent"))]))
            .unwrap_err();
        assert!(matches!(err, SubmodelError::Runtime(_)));
    }

    #[test]
    fn digest_depends_on_call_order() {
        let sheet = ObjectType::sheet("GeneratorSheet");
        let mut a = RecordingRuntime::new();
        a.register("A", &sheet, ParamMap::new()).unwrap();
        a.register("B", &sheet, ParamMap::new()).unwrap();
        let mut b = RecordingRuntime::new();
        b.register("B", &sheet, ParamMap::new()).unwrap();
        b.register("A", &sheet, ParamMap::new()).unwrap();
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest_hex().len(), 64);
        assert_eq!(a.lookup("A").map(|i| i.type_name.as_str()), Some("GeneratorSheet"));
    }
}

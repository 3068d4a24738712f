// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Priority-ordered label registries.
//!
//! Each runtime type gets a [`TypeDecorator`] recording, per label, the
//! priority at which the label was registered together with the runtime type
//! and the parameter function. [`collect`] flattens every contribution of a
//! [`DecoratorSet`], orders it by ascending priority and overwrites on
//! duplicate labels, so the highest-priority registration of a label wins.
//!
//! Priorities come from a [`PriorityCounter`] owned by the model builder, so
//! a derived model's registrations always outrank the ones it inherits.

use std::collections::BTreeMap;

use crate::object_type::ObjectTypeRef;

/// Registration priority. Unique per registration and strictly increasing
/// in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u64);

impl Priority {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic source of [`Priority`] values. Never reuses or decreases.
#[derive(Debug, Clone, Default)]
pub struct PriorityCounter {
    next: u64,
}

impl PriorityCounter {
    /// Issues the next priority.
    pub fn issue(&mut self) -> Priority {
        let issued = Priority(self.next);
        self.next += 1;
        issued
    }

    /// The priority the next call to [`PriorityCounter::issue`] returns.
    pub fn peek(&self) -> Priority {
        Priority(self.next)
    }
}

/// Label contributions made on behalf of one runtime type.
#[derive(Debug, Clone)]
pub struct TypeDecorator<F> {
    object_type: ObjectTypeRef,
    types: BTreeMap<String, (Priority, ObjectTypeRef)>,
    labels: BTreeMap<String, (Priority, F)>,
}

impl<F: Clone> TypeDecorator<F> {
    /// Creates an empty decorator bound to `object_type`.
    pub fn new(object_type: ObjectTypeRef) -> Self {
        Self {
            object_type,
            types: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Name of the bound runtime type.
    pub fn name(&self) -> &str {
        self.object_type.name()
    }

    /// Records `function` under `label` at the counter's next priority.
    ///
    /// Re-registering a label on the same decorator replaces the previous
    /// contribution and its priority.
    pub fn decorate(
        &mut self,
        counter: &mut PriorityCounter,
        label: impl Into<String>,
        function: F,
    ) -> Priority {
        let label = label.into();
        let priority = counter.issue();
        self.types
            .insert(label.clone(), (priority, self.object_type.clone()));
        self.labels.insert(label, (priority, function));
        priority
    }

    /// `label -> (priority, runtime type)` contributions.
    pub fn types(&self) -> &BTreeMap<String, (Priority, ObjectTypeRef)> {
        &self.types
    }

    /// `label -> (priority, function)` contributions.
    pub fn labels(&self) -> &BTreeMap<String, (Priority, F)> {
        &self.labels
    }
}

/// Every decorator relevant to one object kind (sheets or projections).
#[derive(Debug, Clone)]
pub struct DecoratorSet<F> {
    decorators: Vec<TypeDecorator<F>>,
}

impl<F> Default for DecoratorSet<F> {
    fn default() -> Self {
        Self {
            decorators: Vec::new(),
        }
    }
}

impl<F: Clone> DecoratorSet<F> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the decorator for `object_type`, creating it on first use.
    pub fn decorator_mut(&mut self, object_type: &ObjectTypeRef) -> &mut TypeDecorator<F> {
        let slot = match self
            .decorators
            .iter()
            .position(|d| d.name() == object_type.name())
        {
            Some(slot) => slot,
            None => {
                self.decorators.push(TypeDecorator::new(object_type.clone()));
                self.decorators.len() - 1
            }
        };
        &mut self.decorators[slot]
    }

    /// Registers `function` under `label` for `object_type`.
    pub fn register(
        &mut self,
        counter: &mut PriorityCounter,
        object_type: &ObjectTypeRef,
        label: impl Into<String>,
        function: F,
    ) -> Priority {
        self.decorator_mut(object_type)
            .decorate(counter, label, function)
    }

    /// Decorators in first-use order.
    pub fn decorators(&self) -> &[TypeDecorator<F>] {
        &self.decorators
    }

    /// Resolved `label -> function`.
    pub fn collect_labels(&self) -> BTreeMap<String, F> {
        collect(self.decorators.iter().flat_map(|d| {
            d.labels()
                .iter()
                .map(|(label, (priority, f))| (label.as_str(), *priority, f))
        }))
    }

    /// Resolved `label -> runtime type`.
    pub fn collect_types(&self) -> BTreeMap<String, ObjectTypeRef> {
        collect(self.decorators.iter().flat_map(|d| {
            d.types()
                .iter()
                .map(|(label, (priority, ty))| (label.as_str(), *priority, ty))
        }))
    }
}

/// Flattens `(label, priority, value)` contributions and keeps, per label,
/// the value with the highest priority.
pub fn collect<'a, V, I>(contributions: I) -> BTreeMap<String, V>
where
    V: Clone + 'a,
    I: IntoIterator<Item = (&'a str, Priority, &'a V)>,
{
    let mut flattened: Vec<_> = contributions.into_iter().collect();
    flattened.sort_by_key(|(_, priority, _)| *priority);
    let mut resolved = BTreeMap::new();
    for (label, _, value) in flattened {
        resolved.insert(label.to_owned(), value.clone());
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_type::ObjectType;

    #[test]
    fn counter_is_strictly_increasing() {
        let mut counter = PriorityCounter::default();
        let a = counter.issue();
        let b = counter.issue();
        assert!(b > a);
        assert_eq!(counter.peek().value(), b.value() + 1);
    }

    #[test]
    fn later_registration_wins_across_decorators() {
        let mut counter = PriorityCounter::default();
        let mut set: DecoratorSet<&'static str> = DecoratorSet::new();
        let cf = ObjectType::sheet("CFSheet").shared();
        let settling = ObjectType::sheet("SettlingCFSheet").shared();
        // Declared on the later decorator first, but with a lower priority.
        set.register(&mut counter, &settling, "V1", "base");
        set.register(&mut counter, &cf, "V1", "derived");
        assert_eq!(set.collect_labels()["V1"], "derived");
        assert_eq!(set.collect_types()["V1"].name(), "CFSheet");
        assert_eq!(set.decorators().len(), 2);
    }
}

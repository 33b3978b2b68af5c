//! Named entity templates.
//!
//! A prototype is a list of components in their serialized form, e.g.
//!
//! ```json
//! {
//!   "archer": [
//!     {"Spatial": {"size": [1, 1], "collision_layer": "Ground"}},
//!     {"Health": {"max_health": 40, "constitution": "Biological"}},
//!     {"Attacker": {"power": 6, "range": 5.0, "delay": 1.5}}
//!   ]
//! }
//! ```
//!
//! Each component is validated when the prototype is registered. An
//! [`Identity`] naming the prototype is attached on instantiation, so it must
//! not be listed.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::component::{Component, ComponentKind, Identity};
use crate::SimError;

/// All prototypes known to a world.
#[derive(Debug, Clone, Default)]
pub struct PrototypeRegistry {
    prototypes: BTreeMap<String, Vec<Value>>,
}

impl PrototypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog: a JSON object mapping names to component lists.
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedPrototype`] if the document is not such an
    /// object, or if any prototype fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let catalog: BTreeMap<String, Value> =
            serde_json::from_str(json).map_err(|e| SimError::MalformedPrototype {
                name: "<catalog>".to_owned(),
                details: e.to_string(),
            })?;
        let mut registry = Self::new();
        for (name, components) in catalog {
            registry.register_json(&name, components)?;
        }
        Ok(registry)
    }

    /// Register (or replace) a prototype from its JSON component list.
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedPrototype`] if the value is not an array of
    /// components, lists a kind twice, or lists `Identity`;
    /// [`SimError::InvalidComponent`] if a component fails its own checks.
    pub fn register_json(&mut self, name: &str, components: Value) -> Result<(), SimError> {
        let malformed = |details: String| SimError::MalformedPrototype {
            name: name.to_owned(),
            details,
        };
        if name.is_empty() {
            return Err(malformed("prototype name must not be empty".to_owned()));
        }
        let Value::Array(values) = components else {
            return Err(malformed("expected an array of components".to_owned()));
        };

        let mut kinds = BTreeSet::new();
        for value in &values {
            let component: Component = serde_json::from_value(value.clone())
                .map_err(|e| malformed(e.to_string()))?;
            let kind = component.kind();
            if kind == ComponentKind::Identity {
                return Err(malformed("Identity is attached automatically".to_owned()));
            }
            if !kinds.insert(kind) {
                return Err(malformed(format!("{kind} listed twice")));
            }
            component
                .validate()
                .map_err(|details| SimError::InvalidComponent { kind, details })?;
        }

        tracing::trace!(prototype = name, components = values.len(), "registered prototype");
        self.prototypes.insert(name.to_owned(), values);
        Ok(())
    }

    /// Register a prototype from component values.
    pub fn register(&mut self, name: &str, components: &[Component]) -> Result<(), SimError> {
        let values = components
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SimError::MalformedPrototype {
                name: name.to_owned(),
                details: e.to_string(),
            })?;
        self.register_json(name, Value::Array(values))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Build fresh components for `name`, `Identity` first.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownPrototype`] if `name` is not registered.
    pub fn instantiate(&self, name: &str) -> Result<Vec<Component>, SimError> {
        let values = self
            .prototypes
            .get(name)
            .ok_or_else(|| SimError::UnknownPrototype {
                name: name.to_owned(),
            })?;
        let mut components = Vec::with_capacity(values.len() + 1);
        components.push(Identity::new(name).into());
        for value in values {
            let component = serde_json::from_value(value.clone()).map_err(|e| {
                SimError::MalformedPrototype {
                    name: name.to_owned(),
                    details: e.to_string(),
                }
            })?;
            components.push(component);
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CATALOG: &str = r#"{
        "archer": [
            {"Spatial": {"size": [1, 1], "collision_layer": "Ground"}},
            {"Health": {"max_health": 40, "constitution": "Biological"}},
            {"Attacker": {"power": 6, "range": 5.0, "delay": 1.5}},
            {"TaskQueue": {}}
        ],
        "wall": [
            {"Spatial": {"size": [1, 1], "collision_layer": "Ground"}},
            {"Health": {"max_health": 200, "constitution": "Mechanical", "armor_type": "Structure"}}
        ]
    }"#;

    #[test]
    fn catalog_loads_and_instantiates() {
        let registry = PrototypeRegistry::from_json_str(CATALOG).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["archer", "wall"]);

        let components = registry.instantiate("archer").unwrap();
        let kinds: Vec<_> = components.iter().map(Component::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Identity,
                ComponentKind::Spatial,
                ComponentKind::Health,
                ComponentKind::Attacker,
                ComponentKind::TaskQueue,
            ]
        );
    }

    #[test]
    fn unknown_prototype() {
        let registry = PrototypeRegistry::new();
        assert!(matches!(
            registry.instantiate("ghost"),
            Err(SimError::UnknownPrototype { .. })
        ));
    }

    #[test]
    fn missing_mandatory_property_is_rejected() {
        let mut registry = PrototypeRegistry::new();
        let err = registry
            .register_json("bad", json!([{"Health": {"constitution": "Biological"}}]))
            .unwrap_err();
        assert!(matches!(err, SimError::MalformedPrototype { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut registry = PrototypeRegistry::new();
        let err = registry
            .register_json("huge", json!([{"Spatial": {"size": [20, 1], "collision_layer": "Air"}}]))
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidComponent {
                kind: ComponentKind::Spatial,
                ..
            }
        ));
    }

    #[test]
    fn duplicates_and_identity_are_rejected() {
        let mut registry = PrototypeRegistry::new();
        assert!(registry
            .register_json("twice", json!([{"Mobile": {"speed": 1.0}}, {"Mobile": {"speed": 2.0}}]))
            .is_err());
        assert!(registry
            .register_json("named", json!([{"Identity": {"prototype": "x"}}]))
            .is_err());
        assert!(registry.is_empty());
    }
}

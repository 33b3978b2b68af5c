//! Component kinds, the tagged [`Component`] enum, and the persistence
//! attribute contract.
//!
//! The set of component kinds is closed and known at compile time. Each
//! concrete component type implements [`ComponentData`], which declares its
//! kind, the stats it owns, and how each of its properties is persisted.
//! The [`Component`] enum is the storage representation: an entity keeps one
//! `Option<Component>` slot per [`ComponentKind`].
//!
//! # Persistence contract
//!
//! Every property of a component is classified as exactly one of:
//!
//! - [`PropertyAttribute::Mandatory`]: must be present when instantiating from
//!   a prototype (serde field without a default).
//! - [`PropertyAttribute::Persistent`]: saved and loaded, optional with a
//!   default (`#[serde(default)]`).
//! - [`PropertyAttribute::Transient`]: derived at runtime, never saved
//!   (`#[serde(skip)]` or computed by a method).
//!
//! The serialized form of a component therefore carries exactly its
//! Mandatory and Persistent properties, and reconstructing a component from
//! it reproduces identical transient outputs.

pub mod identity;
pub mod movement;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter};

use crate::combat::attacker::Attacker;
use crate::combat::healer::Healer;
use crate::combat::health::Health;
use crate::combat::kamikaze::Kamikaze;
use crate::faction::{FactionMembership, FactionRegistry};
use crate::production::build::{BuildProgress, Builder};
use crate::production::train::{TrainProgress, Trainer};
use crate::spatial::Spatial;
use crate::stat::{Stat, StatValue};
use crate::task::queue::TaskQueue;

pub use identity::{Cost, Identity};
pub use movement::{Mobile, Vision};

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Every kind of component an entity can carry.
///
/// The discriminant doubles as the slot index in [`Entity`](crate::entity::Entity)
/// storage, so the order of variants is part of the snapshot format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumCount,
    EnumIter,
    strum::Display,
)]
pub enum ComponentKind {
    Identity,
    Cost,
    Spatial,
    Mobile,
    Vision,
    Health,
    Attacker,
    Kamikaze,
    Healer,
    Builder,
    Trainer,
    BuildProgress,
    TrainProgress,
    FactionMembership,
    TaskQueue,
}

/// Number of component slots on an entity.
pub const COMPONENT_SLOTS: usize = <ComponentKind as EnumCount>::COUNT;

impl ComponentKind {
    /// Slot index of this kind.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Property attributes
// ---------------------------------------------------------------------------

/// How a component property is treated by serializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyAttribute {
    /// Required when instantiating from a prototype.
    Mandatory,
    /// Saved and loaded; optional, with a default.
    Persistent,
    /// Computed at runtime; never saved.
    Transient,
}

/// A named component property and its persistence attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub attribute: PropertyAttribute,
}

impl Property {
    pub const fn mandatory(name: &'static str) -> Self {
        Self {
            name,
            attribute: PropertyAttribute::Mandatory,
        }
    }

    pub const fn persistent(name: &'static str) -> Self {
        Self {
            name,
            attribute: PropertyAttribute::Persistent,
        }
    }

    pub const fn transient(name: &'static str) -> Self {
        Self {
            name,
            attribute: PropertyAttribute::Transient,
        }
    }

    /// Whether the property appears in the serialized form.
    pub fn is_serialized(&self) -> bool {
        self.attribute != PropertyAttribute::Transient
    }
}

// ---------------------------------------------------------------------------
// ComponentData
// ---------------------------------------------------------------------------

/// Static description of a concrete component type.
pub trait ComponentData: Sized + Into<Component> {
    /// The slot this component occupies.
    const KIND: ComponentKind;

    /// Stats whose base value this component stores.
    const STATS: &'static [Stat] = &[];

    /// Persistence classification of every property.
    const PROPERTIES: &'static [Property];

    /// Base value of one of this component's own stats.
    ///
    /// Returns `None` if `stat` is not declared by this component.
    fn base_stat(&self, _stat: Stat) -> Option<StatValue> {
        None
    }

    /// Check values that serde alone cannot enforce.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Borrow this type out of a [`Component`] if the variant matches.
    fn downcast(component: &Component) -> Option<&Self>;

    /// Mutably borrow this type out of a [`Component`] if the variant matches.
    fn downcast_mut(component: &mut Component) -> Option<&mut Self>;
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

macro_rules! components {
    ($($variant:ident),* $(,)?) => {
        /// A component instance, tagged by kind.
        ///
        /// Serialized in serde's externally tagged form, e.g.
        /// `{"Mobile": {"speed": 3.0}}`.
        #[derive(Debug, Serialize, Deserialize)]
        pub enum Component {
            $($variant($variant),)*
        }

        impl Component {
            /// The kind of this component.
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Component::$variant(_) => ComponentKind::$variant,)*
                }
            }

            /// Base value of a stat declared by this component.
            pub fn base_stat(&self, stat: Stat) -> Option<StatValue> {
                match self {
                    $(Component::$variant(c) => c.base_stat(stat),)*
                }
            }

            /// Run the component's own validation.
            pub fn validate(&self) -> Result<(), String> {
                match self {
                    $(Component::$variant(c) => c.validate(),)*
                }
            }
        }

        impl ComponentKind {
            /// Stats declared by this component kind.
            pub fn stats(self) -> &'static [Stat] {
                match self {
                    $(ComponentKind::$variant => <$variant as ComponentData>::STATS,)*
                }
            }

            /// Persistence classification of this kind's properties.
            pub fn properties(self) -> &'static [Property] {
                match self {
                    $(ComponentKind::$variant => <$variant as ComponentData>::PROPERTIES,)*
                }
            }
        }

        $(
            impl From<$variant> for Component {
                fn from(component: $variant) -> Self {
                    Component::$variant(component)
                }
            }
        )*
    };
}

components! {
    Identity,
    Cost,
    Spatial,
    Mobile,
    Vision,
    Health,
    Attacker,
    Kamikaze,
    Healer,
    Builder,
    Trainer,
    BuildProgress,
    TrainProgress,
    FactionMembership,
    TaskQueue,
}

/// Implements the downcast half of [`ComponentData`] for a type whose
/// [`Component`] variant carries the same name.
macro_rules! impl_downcast {
    ($variant:ident) => {
        fn downcast(component: &$crate::component::Component) -> Option<&Self> {
            match component {
                $crate::component::Component::$variant(c) => Some(c),
                _ => None,
            }
        }

        fn downcast_mut(component: &mut $crate::component::Component) -> Option<&mut Self> {
            match component {
                $crate::component::Component::$variant(c) => Some(c),
                _ => None,
            }
        }
    };
}
pub(crate) use impl_downcast;

impl Component {
    /// Bonus this component contributes to a stat declared by another kind.
    ///
    /// Only faction membership contributes bonuses today (technology
    /// upgrades researched by the faction).
    pub fn stat_bonus(&self, stat: Stat, factions: &FactionRegistry) -> Option<StatValue> {
        match self {
            Component::FactionMembership(membership) => membership.stat_bonus(stat, factions),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn slot_indices_are_dense() {
        for (expected, kind) in ComponentKind::iter().enumerate() {
            assert_eq!(kind.index(), expected);
        }
        assert_eq!(ComponentKind::iter().count(), COMPONENT_SLOTS);
    }

    #[test]
    fn every_stat_belongs_to_its_declaring_kind() {
        for kind in ComponentKind::iter() {
            for stat in kind.stats() {
                assert_eq!(stat.component(), kind, "{stat} declared under {kind}");
            }
        }
    }

    #[test]
    fn stat_names_unique_within_kind() {
        for kind in ComponentKind::iter() {
            let mut names: Vec<&str> = kind.stats().iter().map(|s| s.name()).collect();
            names.sort_unstable();
            let before = names.len();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate stat name in {kind}");
        }
    }

    #[test]
    fn every_property_has_a_unique_name() {
        for kind in ComponentKind::iter() {
            let mut names: Vec<&str> = kind.properties().iter().map(|p| p.name).collect();
            names.sort_unstable();
            let before = names.len();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate property name in {kind}");
        }
    }

    #[test]
    fn component_kind_matches_variant() {
        let component: Component = Mobile::new(2.0).into();
        assert_eq!(component.kind(), ComponentKind::Mobile);
        assert!(Mobile::downcast(&component).is_some());
        assert!(Vision::downcast(&component).is_none());
    }

    #[test]
    fn externally_tagged_serialization() {
        let component: Component = Vision::new(7.5).into();
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json, serde_json::json!({"Vision": {"range": 7.5}}));
    }
}

//! Stat identities and typed stat values.
//!
//! A [`Stat`] names a characteristic declared by one component kind, for
//! example `Attacker::POWER`. Stats are `const` values living next to the
//! component that declares them; they are compared structurally, so matching
//! a stat against its declaration is a plain `match` with no name lookup.
//!
//! A [`StatValue`] is the number itself, either an integer or a real. Mixing
//! the two in arithmetic is a programming error and panics: a silent
//! conversion would hide a desynchronization between lockstep peers.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::component::ComponentKind;

// ---------------------------------------------------------------------------
// StatValueKind
// ---------------------------------------------------------------------------

/// Numeric representation of a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatValueKind {
    /// Whole numbers (`i32`).
    Integer,
    /// Real numbers (`f32`).
    Real,
}

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// Identity of a stat: the declaring component kind plus a name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stat {
    component: ComponentKind,
    name: &'static str,
    value_kind: StatValueKind,
}

impl Stat {
    /// Declare an integer stat owned by `component`.
    pub const fn integer(component: ComponentKind, name: &'static str) -> Self {
        Self {
            component,
            name,
            value_kind: StatValueKind::Integer,
        }
    }

    /// Declare a real stat owned by `component`.
    pub const fn real(component: ComponentKind, name: &'static str) -> Self {
        Self {
            component,
            name,
            value_kind: StatValueKind::Real,
        }
    }

    /// The component kind that stores the base value of this stat.
    #[inline]
    pub fn component(self) -> ComponentKind {
        self.component
    }

    /// Human-readable name, unique within the declaring component kind.
    #[inline]
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Whether values of this stat are integers or reals.
    #[inline]
    pub fn value_kind(self) -> StatValueKind {
        self.value_kind
    }

    /// The additive identity for this stat's value kind.
    pub fn zero(self) -> StatValue {
        StatValue::zero(self.value_kind)
    }

    /// Look a stat up by its qualified name, e.g. `"Attacker.Power"`.
    pub fn find(qualified: &str) -> Option<Stat> {
        let (component, name) = qualified.split_once('.')?;
        ComponentKind::iter()
            .find(|kind| kind.to_string() == component)?
            .stats()
            .iter()
            .copied()
            .find(|stat| stat.name() == name)
    }
}

impl fmt::Debug for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stat({}.{})", self.component, self.name)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.name)
    }
}

// ---------------------------------------------------------------------------
// StatValue
// ---------------------------------------------------------------------------

/// The value of a stat for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatValue {
    /// An integer value.
    Integer(i32),
    /// A real value.
    Real(f32),
}

impl StatValue {
    /// Zero of the given kind.
    pub fn zero(kind: StatValueKind) -> Self {
        match kind {
            StatValueKind::Integer => StatValue::Integer(0),
            StatValueKind::Real => StatValue::Real(0.0),
        }
    }

    /// The kind of this value.
    pub fn kind(self) -> StatValueKind {
        match self {
            StatValue::Integer(_) => StatValueKind::Integer,
            StatValue::Real(_) => StatValueKind::Real,
        }
    }

    /// The value as an `f32`. Integers convert exactly up to 2^24.
    pub fn to_f32(self) -> f32 {
        match self {
            StatValue::Integer(v) => v as f32,
            StatValue::Real(v) => v,
        }
    }

    /// The integer payload.
    ///
    /// # Panics
    ///
    /// Panics if this is a real value.
    pub fn to_i32(self) -> i32 {
        match self {
            StatValue::Integer(v) => v,
            StatValue::Real(v) => panic!("expected an integer stat value, found real {v}"),
        }
    }

    /// Add two values of the same kind, returning `None` on a kind mismatch.
    pub fn checked_add(self, other: StatValue) -> Option<StatValue> {
        match (self, other) {
            (StatValue::Integer(a), StatValue::Integer(b)) => {
                Some(StatValue::Integer(a.wrapping_add(b)))
            }
            (StatValue::Real(a), StatValue::Real(b)) => Some(StatValue::Real(a + b)),
            _ => None,
        }
    }

    /// Subtract two values of the same kind, returning `None` on a kind mismatch.
    pub fn checked_sub(self, other: StatValue) -> Option<StatValue> {
        self.checked_add(-other)
    }
}

impl Add for StatValue {
    type Output = StatValue;

    /// # Panics
    ///
    /// Panics when adding an integer to a real.
    fn add(self, rhs: StatValue) -> StatValue {
        self.checked_add(rhs).unwrap_or_else(|| {
            panic!("cannot add stat values of different kinds: {self:?} + {rhs:?}")
        })
    }
}

impl Sub for StatValue {
    type Output = StatValue;

    /// # Panics
    ///
    /// Panics when subtracting values of different kinds.
    fn sub(self, rhs: StatValue) -> StatValue {
        self.checked_sub(rhs).unwrap_or_else(|| {
            panic!("cannot subtract stat values of different kinds: {self:?} - {rhs:?}")
        })
    }
}

impl Neg for StatValue {
    type Output = StatValue;

    fn neg(self) -> StatValue {
        match self {
            StatValue::Integer(v) => StatValue::Integer(v.wrapping_neg()),
            StatValue::Real(v) => StatValue::Real(-v),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Integer(v) => write!(f, "{v}"),
            StatValue::Real(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

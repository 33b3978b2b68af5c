//! The faction collaborator interface and faction membership.
//!
//! Economy bookkeeping lives outside the core. The simulation only asks a
//! faction three things: its diplomatic stance toward another faction,
//! the technology bonus it grants to a stat, and a food token reserving the
//! upkeep of one entity. Tokens are opaque; dropping one releases its food.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::component::{impl_downcast, ComponentData, ComponentKind, Property};
use crate::stat::{Stat, StatValue};

// ---------------------------------------------------------------------------
// Identifiers and stances
// ---------------------------------------------------------------------------

/// Index of a faction in the [`FactionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

bitflags! {
    /// How one faction regards another. The empty set means enemy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DiplomaticStance: u8 {
        const ALLIED_VICTORY = 1 << 0;
        const SHARED_VISION  = 1 << 1;
        const SHARED_CONTROL = 1 << 2;
    }
}

impl DiplomaticStance {
    pub const ENEMY: Self = Self::empty();

    /// Allied factions do not attack each other.
    pub fn is_allied(self) -> bool {
        self.contains(Self::ALLIED_VICTORY)
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Reservation of food for one entity. Dropping the token releases it.
pub trait FoodToken: fmt::Debug {
    /// Food held by this token.
    fn amount(&self) -> i32;
}

/// A player or AI side, as seen by the simulation.
pub trait Faction: fmt::Debug {
    fn name(&self) -> &str;

    /// Stance of this faction toward `other`. Never called with its own id.
    fn diplomatic_stance(&self, other: FactionId) -> DiplomaticStance;

    /// Researched bonus toward `stat`, if any.
    fn technology_bonus(&self, stat: Stat) -> Option<StatValue>;

    /// Reserve `amount` food until the returned token is dropped.
    fn create_food_token(&mut self, amount: i32) -> Box<dyn FoodToken>;
}

// ---------------------------------------------------------------------------
// FactionRegistry
// ---------------------------------------------------------------------------

/// All factions of a match, indexed by [`FactionId`].
#[derive(Debug, Default)]
pub struct FactionRegistry {
    factions: Vec<Box<dyn Faction>>,
}

impl FactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a faction and return its id. Ids are assigned in registration
    /// order starting at 0.
    pub fn register(&mut self, faction: Box<dyn Faction>) -> FactionId {
        let id = FactionId(self.factions.len() as u32);
        self.factions.push(faction);
        id
    }

    pub fn get(&self, id: FactionId) -> Option<&dyn Faction> {
        self.factions.get(id.0 as usize).map(|f| f.as_ref())
    }

    pub fn get_mut(&mut self, id: FactionId) -> Option<&mut (dyn Faction + 'static)> {
        self.factions.get_mut(id.0 as usize).map(|f| f.as_mut())
    }

    pub fn contains(&self, id: FactionId) -> bool {
        (id.0 as usize) < self.factions.len()
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    /// Whether `a` treats `b` as an ally. A faction is always allied with
    /// itself; an unknown faction is allied with nobody.
    pub fn are_allied(&self, a: FactionId, b: FactionId) -> bool {
        if a == b {
            return true;
        }
        self.get(a)
            .is_some_and(|faction| faction.diplomatic_stance(b).is_allied())
    }
}

// ---------------------------------------------------------------------------
// BasicFaction
// ---------------------------------------------------------------------------

/// A plain in-memory faction: fixed stances, a bonus table, and a food
/// counter.
#[derive(Debug)]
pub struct BasicFaction {
    name: String,
    stances: BTreeMap<FactionId, DiplomaticStance>,
    bonuses: Vec<(Stat, StatValue)>,
    food_used: Rc<Cell<i32>>,
}

impl BasicFaction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stances: BTreeMap::new(),
            bonuses: Vec::new(),
            food_used: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_stance(mut self, other: FactionId, stance: DiplomaticStance) -> Self {
        self.set_stance(other, stance);
        self
    }

    pub fn set_stance(&mut self, other: FactionId, stance: DiplomaticStance) {
        self.stances.insert(other, stance);
    }

    /// Set the bonus for `stat`, replacing any previous one.
    pub fn set_technology_bonus(&mut self, stat: Stat, bonus: StatValue) {
        assert_eq!(
            stat.value_kind(),
            bonus.kind(),
            "bonus for {stat} has the wrong value kind"
        );
        match self.bonuses.iter_mut().find(|(s, _)| *s == stat) {
            Some(entry) => entry.1 = bonus,
            None => self.bonuses.push((stat, bonus)),
        }
    }

    /// Food currently reserved by live tokens.
    pub fn food_used(&self) -> i32 {
        self.food_used.get()
    }

    /// Shared view of the food counter, readable after the faction is moved
    /// into a registry.
    pub fn food_counter(&self) -> FoodCounter {
        FoodCounter(Rc::clone(&self.food_used))
    }
}

impl Faction for BasicFaction {
    fn name(&self) -> &str {
        &self.name
    }

    fn diplomatic_stance(&self, other: FactionId) -> DiplomaticStance {
        self.stances.get(&other).copied().unwrap_or(DiplomaticStance::ENEMY)
    }

    fn technology_bonus(&self, stat: Stat) -> Option<StatValue> {
        self.bonuses.iter().find(|(s, _)| *s == stat).map(|(_, v)| *v)
    }

    fn create_food_token(&mut self, amount: i32) -> Box<dyn FoodToken> {
        self.food_used.set(self.food_used.get() + amount);
        Box::new(BasicFoodToken {
            amount,
            counter: Rc::clone(&self.food_used),
        })
    }
}

/// Read-only handle on a [`BasicFaction`]'s food usage.
#[derive(Debug, Clone)]
pub struct FoodCounter(Rc<Cell<i32>>);

impl FoodCounter {
    pub fn get(&self) -> i32 {
        self.0.get()
    }
}

#[derive(Debug)]
struct BasicFoodToken {
    amount: i32,
    counter: Rc<Cell<i32>>,
}

impl FoodToken for BasicFoodToken {
    fn amount(&self) -> i32 {
        self.amount
    }
}

impl Drop for BasicFoodToken {
    fn drop(&mut self) {
        self.counter.set(self.counter.get() - self.amount);
    }
}

// ---------------------------------------------------------------------------
// FactionMembership
// ---------------------------------------------------------------------------

/// Ties an entity to a faction. Contributes the faction's technology
/// bonuses to every stat of the entity.
#[derive(Debug, Serialize, Deserialize)]
pub struct FactionMembership {
    faction: FactionId,
    #[serde(skip)]
    food_token: Option<Box<dyn FoodToken>>,
}

impl FactionMembership {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            food_token: None,
        }
    }

    #[inline]
    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// Food reserved for this entity, if a token is held.
    pub fn reserved_food(&self) -> Option<i32> {
        self.food_token.as_ref().map(|t| t.amount())
    }

    pub(crate) fn hold_food_token(&mut self, token: Box<dyn FoodToken>) {
        self.food_token = Some(token);
    }

    /// Drop the token, returning the food to the faction. Idempotent.
    pub(crate) fn release_food_token(&mut self) {
        self.food_token = None;
    }

    pub fn stat_bonus(&self, stat: Stat, factions: &FactionRegistry) -> Option<StatValue> {
        factions
            .get(self.faction)
            .and_then(|faction| faction.technology_bonus(stat))
    }
}

impl ComponentData for FactionMembership {
    const KIND: ComponentKind = ComponentKind::FactionMembership;
    const PROPERTIES: &'static [Property] = &[
        Property::mandatory("faction"),
        Property::transient("food_token"),
    ];

    impl_downcast!(FactionMembership);
}

//! Actions: a street's worth of placements plus an optional discard
//!
//! Equality, hashing, and ordering treat the placements as an unordered
//! multiset: the constructor sorts them into a canonical order. The `Ord`
//! impl doubles as the deterministic lexicographic tie-break used by the
//! generator and the node statistics.

use core::fmt;

use pineapple_engine::{Card, GameState, PlacementTriple, Row};

/// One card into one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placement {
    pub card: Card,
    pub row: Row,
    pub index: usize,
}

impl Placement {
    pub fn new(card: Card, row: Row, index: usize) -> Placement {
        Placement { card, row, index }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}[{}]", self.card, self.row, self.index)
    }
}

/// A complete decision for one street.
///
/// The initial street places five cards with no discard; every later
/// street places two and discards the third.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Action {
    placements: Vec<Placement>,
    discard: Option<Card>,
}

impl Action {
    /// Build an action; placements are canonicalized so that two actions
    /// with the same placement multiset compare equal.
    pub fn new(mut placements: Vec<Placement>, discard: Option<Card>) -> Action {
        placements.sort_unstable();
        Action { placements, discard }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn discard(&self) -> Option<Card> {
        self.discard
    }

    /// The placements in the triple form the engine consumes.
    pub fn placement_triples(&self) -> Vec<PlacementTriple> {
        self.placements
            .iter()
            .map(|p| (p.card, p.row, p.index))
            .collect()
    }

    /// Apply this action to a state.
    pub fn apply(&self, state: &mut GameState) -> Result<(), pineapple_engine::EngineError> {
        state.place_cards(&self.placement_triples(), self.discard)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "place [")?;
        for (i, p) in self.placements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "]")?;
        if let Some(d) = self.discard {
            write!(f, " discard {d}")?;
        }
        Ok(())
    }
}

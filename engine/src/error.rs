//! Error taxonomy for the domain layer
//!
//! Every precondition failure in the engine surfaces as one of these
//! variants, carrying the offending arguments. The search layer wraps
//! this type; nothing is logged and swallowed inside the core.

use crate::arrangement::Row;
use crate::card::Card;

/// Errors raised by the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A card string, hand size, or snapshot shape violates the grammar.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The card is already placed somewhere in the arrangement.
    #[error("card {card} already used")]
    CardAlreadyUsed { card: Card },

    /// The target slot already holds a card.
    #[error("{row} slot {index} already occupied")]
    SlotOccupied { row: Row, index: usize },

    /// The slot index is out of range for the row.
    #[error("index {index} out of range for {row} row")]
    BadIndex { row: Row, index: usize },

    /// A hand evaluator was called on a non-3, non-5 card multiset.
    #[error("hand must contain 3 or 5 cards, got {0}")]
    WrongHandSize(usize),

    /// Placement count, discard presence, or consumed cards do not match
    /// what the current street requires.
    #[error("illegal action: {0}")]
    IllegalAction(String),

    /// A deal was requested with fewer cards remaining than the draw needs.
    #[error("insufficient cards: need {needed}, {available} remaining")]
    InsufficientCards { needed: usize, available: usize },

    /// `pop` was called on an empty card set.
    #[error("pop from empty card set")]
    EmptySet,
}

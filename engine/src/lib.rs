//! Pineapple Engine - OFC domain types and rules
//!
//! This crate contains the domain layer of the Pineapple OFC solver:
//! cards and bit-packed card sets, the 3/5-card hand evaluator, the
//! three-row arrangement with foul checking and royalties, head-to-head
//! scoring, and the street-by-street game state with its portable
//! serialized form.
//!
//! The engine is platform-agnostic and has zero knowledge of the search
//! layer built on top of it.

pub mod arrangement;
pub mod card;
pub mod card_set;
pub mod error;
pub mod game;
pub mod hand;
pub mod scoring;

pub use arrangement::{Arrangement, FoulReason, RoyaltyPoints, Row};
pub use card::{Card, Rank, Suit};
pub use card_set::CardSet;
pub use error::EngineError;
pub use game::{
    ArrangementSnapshot, GameSnapshot, GameState, HistoryRecord, PlacementTriple, Street,
};
pub use hand::{evaluate_five, evaluate_three, HandCategory, HandRank};
pub use scoring::{score_against_field, score_heads_up, FOUL_PENALTY_HEADS_UP, SCOOP_BONUS};

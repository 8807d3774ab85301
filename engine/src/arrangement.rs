//! The 3/5/5 arrangement: placement, foul checking, royalties
//!
//! An arrangement owns the thirteen slots of one player's board plus the
//! set of consumed card values. Slots are write-once; `remove` exists only
//! for rollback. Foul determination is deferred until all thirteen slots
//! are filled.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank};
use crate::card_set::CardSet;
use crate::error::EngineError;
use crate::hand::{evaluate_five, evaluate_three, HandCategory, HandRank};

/// One of the three rows of an OFC board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Row {
    Front,
    Middle,
    Back,
}

impl Row {
    /// All rows, front first.
    pub const ALL: [Row; 3] = [Row::Front, Row::Middle, Row::Back];

    /// Number of slots in the row.
    pub fn capacity(self) -> usize {
        match self {
            Row::Front => 3,
            Row::Middle | Row::Back => 5,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Row::Front => "front",
            Row::Middle => "middle",
            Row::Back => "back",
        })
    }
}

/// Why a completed arrangement fouls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoulReason {
    /// The back row is weaker than the middle row.
    BackBelowMiddle,
    /// The middle row is weaker than the front row under the OFC rule.
    MiddleBelowFront,
}

impl fmt::Display for FoulReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FoulReason::BackBelowMiddle => "back row weaker than middle row",
            FoulReason::MiddleBelowFront => "middle row weaker than front row",
        })
    }
}

/// Royalty points earned per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoyaltyPoints {
    pub front: u32,
    pub middle: u32,
    pub back: u32,
}

impl RoyaltyPoints {
    pub fn total(self) -> u32 {
        self.front + self.middle + self.back
    }
}

/// A player's board: front (3), middle (5), back (5).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Arrangement {
    front: [Option<Card>; 3],
    middle: [Option<Card>; 5],
    back: [Option<Card>; 5],
    used: CardSet,
}

impl Arrangement {
    pub fn new() -> Arrangement {
        Arrangement::default()
    }

    fn slots(&self, row: Row) -> &[Option<Card>] {
        match row {
            Row::Front => &self.front,
            Row::Middle => &self.middle,
            Row::Back => &self.back,
        }
    }

    fn slots_mut(&mut self, row: Row) -> &mut [Option<Card>] {
        match row {
            Row::Front => &mut self.front,
            Row::Middle => &mut self.middle,
            Row::Back => &mut self.back,
        }
    }

    /// Place a card into an empty slot.
    pub fn place(&mut self, card: Card, row: Row, index: usize) -> Result<(), EngineError> {
        if index >= row.capacity() {
            return Err(EngineError::BadIndex { row, index });
        }
        if self.used.contains(card) {
            return Err(EngineError::CardAlreadyUsed { card });
        }
        let slot = &mut self.slots_mut(row)[index];
        if slot.is_some() {
            return Err(EngineError::SlotOccupied { row, index });
        }
        *slot = Some(card);
        self.used.insert(card);
        Ok(())
    }

    /// Clear a slot and return its card. Rollback only.
    pub fn remove(&mut self, row: Row, index: usize) -> Option<Card> {
        if index >= row.capacity() {
            return None;
        }
        let card = self.slots_mut(row)[index].take();
        if let Some(card) = card {
            self.used.remove(card);
        }
        card
    }

    /// The card occupying a slot, if any.
    pub fn slot(&self, row: Row, index: usize) -> Option<Card> {
        self.slots(row).get(index).copied().flatten()
    }

    /// All slots of a row, empty positions included.
    pub fn row_slots(&self, row: Row) -> &[Option<Card>] {
        self.slots(row)
    }

    /// The cards currently in a row.
    pub fn row_cards(&self, row: Row) -> Vec<Card> {
        self.slots(row).iter().flatten().copied().collect()
    }

    /// Number of cards placed in a row.
    pub fn row_len(&self, row: Row) -> usize {
        self.slots(row).iter().flatten().count()
    }

    /// Set of all placed card values.
    pub fn used_cards(&self) -> CardSet {
        self.used
    }

    /// Total number of placed cards.
    pub fn placed_count(&self) -> usize {
        self.used.len()
    }

    /// True once all thirteen slots are filled.
    pub fn is_complete(&self) -> bool {
        self.placed_count() == 13
    }

    /// The rank of a row, once that row is full.
    pub fn row_rank(&self, row: Row) -> Option<HandRank> {
        let cards = self.row_cards(row);
        if cards.len() != row.capacity() {
            return None;
        }
        match row {
            Row::Front => evaluate_three(&cards).ok(),
            Row::Middle | Row::Back => evaluate_five(&cards).ok(),
        }
    }

    /// Validate a completed arrangement against `back >= middle >= front`.
    ///
    /// A partial arrangement is never invalid; foul determination waits
    /// for completion. The front comparison uses the OFC rule: any 5-card
    /// category beats any 3-card category, except that a trips front beats
    /// a two-pair-or-less middle.
    pub fn validate_complete(&self) -> Result<(), FoulReason> {
        if !self.is_complete() {
            return Ok(());
        }
        // Rows are full here, so the ranks exist
        let (Some(front), Some(middle), Some(back)) = (
            self.row_rank(Row::Front),
            self.row_rank(Row::Middle),
            self.row_rank(Row::Back),
        ) else {
            return Ok(());
        };

        if back < middle {
            return Err(FoulReason::BackBelowMiddle);
        }
        if !five_beats_front(&middle, &front) {
            return Err(FoulReason::MiddleBelowFront);
        }
        Ok(())
    }

    /// Royalty points for a completed arrangement, zero otherwise.
    pub fn royalties(&self) -> RoyaltyPoints {
        if !self.is_complete() {
            return RoyaltyPoints::default();
        }
        let mut points = RoyaltyPoints::default();

        if let Some(front) = self.row_rank(Row::Front) {
            points.front = match front.category {
                // 66 pays 1, each rank above adds one, AA pays 9
                HandCategory::Pair if front.primary >= Rank::Six.value() => {
                    (front.primary - Rank::Six.value() + 1) as u32
                }
                // 222 pays 10 up through AAA at 22
                HandCategory::ThreeOfAKind => 10 + front.primary as u32,
                _ => 0,
            };
        }

        if let Some(middle) = self.row_rank(Row::Middle) {
            points.middle = match middle.category {
                HandCategory::ThreeOfAKind => 2,
                HandCategory::Straight => 4,
                HandCategory::Flush => 8,
                HandCategory::FullHouse => 12,
                HandCategory::FourOfAKind => 20,
                HandCategory::StraightFlush => 30,
                HandCategory::RoyalFlush => 50,
                _ => 0,
            };
        }

        if let Some(back) = self.row_rank(Row::Back) {
            points.back = match back.category {
                HandCategory::Straight => 2,
                HandCategory::Flush => 4,
                HandCategory::FullHouse => 6,
                HandCategory::FourOfAKind => 10,
                HandCategory::StraightFlush => 15,
                HandCategory::RoyalFlush => 25,
                _ => 0,
            };
        }

        points
    }

    /// Fantasyland qualification: front pair of queens or better, or trips.
    pub fn qualifies_fantasyland(&self) -> bool {
        match self.row_rank(Row::Front) {
            Some(front) => match front.category {
                HandCategory::ThreeOfAKind => true,
                HandCategory::Pair => front.primary >= Rank::Queen.value(),
                _ => false,
            },
            None => false,
        }
    }
}

/// OFC comparison of a full 5-card row against the 3-card front.
fn five_beats_front(five: &HandRank, front: &HandRank) -> bool {
    !(front.category == HandCategory::ThreeOfAKind && five.category <= HandCategory::TwoPair)
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |slots: &[Option<Card>]| {
            slots
                .iter()
                .map(|s| s.map(|c| c.to_string()).unwrap_or_else(|| "__".into()))
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(f, "Front:  {}", render(&self.front))?;
        writeln!(f, "Middle: {}", render(&self.middle))?;
        write!(f, "Back:   {}", render(&self.back))
    }
}

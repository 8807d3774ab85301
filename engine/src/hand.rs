//! Hand categorization for 3-card and 5-card OFC rows
//!
//! Hands are ranked by `(category, primary, secondary, kickers)`. Jokers
//! act as wildcards: each candidate category is reachable when the joker
//! budget covers the missing cards, and the highest reachable category
//! wins. Within the chosen category jokers take whatever value maximizes
//! the rank, defaulting to aces in kicker positions.

use core::fmt;

use crate::card::{Card, Rank};
use crate::error::EngineError;

/// Poker hand categories from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandCategory {
    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            HandCategory::HighCard => "High Card",
            HandCategory::Pair => "Pair",
            HandCategory::TwoPair => "Two Pair",
            HandCategory::ThreeOfAKind => "Three of a Kind",
            HandCategory::Straight => "Straight",
            HandCategory::Flush => "Flush",
            HandCategory::FullHouse => "Full House",
            HandCategory::FourOfAKind => "Four of a Kind",
            HandCategory::StraightFlush => "Straight Flush",
            HandCategory::RoyalFlush => "Royal Flush",
        }
    }

    /// Categories a 3-card front hand can take.
    pub fn is_valid_for_front(self) -> bool {
        matches!(
            self,
            HandCategory::HighCard | HandCategory::Pair | HandCategory::ThreeOfAKind
        )
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A fully ordered hand rank: category plus tie-breaking ranks.
///
/// `primary` is the defining rank (pair rank, straight high card, trips
/// rank); `secondary` is set for two pair and full house; `kickers` hold
/// the remaining ranks highest first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandRank {
    pub category: HandCategory,
    pub primary: u8,
    pub secondary: Option<u8>,
    pub kickers: Vec<u8>,
}

impl HandRank {
    fn new(category: HandCategory, primary: u8) -> HandRank {
        HandRank {
            category,
            primary,
            secondary: None,
            kickers: Vec::new(),
        }
    }

    fn with_kickers(category: HandCategory, primary: u8, kickers: Vec<u8>) -> HandRank {
        HandRank {
            category,
            primary,
            secondary: None,
            kickers,
        }
    }

    fn with_secondary(
        category: HandCategory,
        primary: u8,
        secondary: u8,
        kickers: Vec<u8>,
    ) -> HandRank {
        HandRank {
            category,
            primary,
            secondary: Some(secondary),
            kickers,
        }
    }
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        (self.category, self.primary, self.secondary, &self.kickers).cmp(&(
            other.category,
            other.primary,
            other.secondary,
            &other.kickers,
        ))
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank_char = |v: u8| Rank::from_value(v).map(Rank::to_char).unwrap_or('?');
        match self.category {
            HandCategory::Pair => write!(f, "Pair of {}s", rank_char(self.primary)),
            HandCategory::TwoPair => write!(
                f,
                "Two Pair, {}s and {}s",
                rank_char(self.primary),
                rank_char(self.secondary.unwrap_or(0))
            ),
            HandCategory::FullHouse => write!(
                f,
                "{}s full of {}s",
                rank_char(self.primary),
                rank_char(self.secondary.unwrap_or(0))
            ),
            HandCategory::Straight | HandCategory::StraightFlush if self.primary == 3 => {
                write!(f, "{}, A-5", self.category)
            }
            HandCategory::RoyalFlush => write!(f, "Royal Flush"),
            _ => write!(f, "{}, {}-high", self.category, rank_char(self.primary)),
        }
    }
}

/// Rank multiplicities of the standard cards, sorted by count descending
/// then rank descending, plus the joker count.
fn rank_profile(cards: &[Card]) -> (Vec<(u8, usize)>, usize) {
    let mut counts = [0usize; 13];
    let mut jokers = 0;
    for card in cards {
        if card.is_joker() {
            jokers += 1;
        } else {
            counts[card.rank_value() as usize] += 1;
        }
    }
    let mut profile: Vec<(u8, usize)> = (0..13u8)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (r, counts[r as usize]))
        .collect();
    profile.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    (profile, jokers)
}

/// Straight detection over the unique ranks present, jokers filling gaps.
///
/// The ace-low window (A-2-3-4-5) is checked first and reports a five-high
/// straight (primary 3); otherwise the highest window whose absent ranks
/// number at most `jokers` wins. All jokers counts as ace-high.
fn straight_high(ranks_present: &[bool; 13], jokers: usize) -> Option<u8> {
    if !ranks_present.iter().any(|&p| p) {
        return Some(Rank::Ace.value());
    }
    if ranks_present[Rank::Ace.value() as usize] {
        let wheel = [Rank::Ace.value(), 0, 1, 2, 3];
        let gaps = wheel.iter().filter(|&&r| !ranks_present[r as usize]).count();
        if gaps <= jokers {
            return Some(3);
        }
    }
    for high in (4..=12u8).rev() {
        let gaps = (0..5)
            .filter(|offset| !ranks_present[(high - offset) as usize])
            .count();
        if gaps <= jokers {
            return Some(high);
        }
    }
    None
}

/// Categorize a 3-card front hand: high card, pair, or three of a kind.
pub fn evaluate_three(cards: &[Card]) -> Result<HandRank, EngineError> {
    if cards.len() != 3 {
        return Err(EngineError::WrongHandSize(cards.len()));
    }
    let (profile, jokers) = rank_profile(cards);

    if profile.is_empty() {
        // All jokers make three aces
        return Ok(HandRank::new(HandCategory::ThreeOfAKind, Rank::Ace.value()));
    }

    let (top_rank, top_count) = profile[0];
    if top_count + jokers >= 3 {
        return Ok(HandRank::new(HandCategory::ThreeOfAKind, top_rank));
    }

    if top_count + jokers >= 2 {
        let kickers: Vec<u8> = profile[1..].iter().map(|&(r, _)| r).collect();
        return Ok(HandRank::with_kickers(HandCategory::Pair, top_rank, kickers));
    }

    let kickers: Vec<u8> = profile.iter().map(|&(r, _)| r).collect();
    Ok(HandRank::with_kickers(
        HandCategory::HighCard,
        kickers[0],
        kickers,
    ))
}

/// Categorize a 5-card hand.
pub fn evaluate_five(cards: &[Card]) -> Result<HandRank, EngineError> {
    if cards.len() != 5 {
        return Err(EngineError::WrongHandSize(cards.len()));
    }

    let (profile, jokers) = rank_profile(cards);

    let mut suit_counts = [0usize; 4];
    let mut ranks_present = [false; 13];
    for card in cards {
        if !card.is_joker() {
            suit_counts[card.suit_value() as usize] += 1;
            ranks_present[card.rank_value() as usize] = true;
        }
    }

    let flush_suit = (0..4u8).find(|&s| suit_counts[s as usize] + jokers >= 5);
    let straight = straight_high(&ranks_present, jokers);

    // With five cards a flush means every standard card shares the suit,
    // so flush + straight is always a straight flush.
    if let (Some(_), Some(high)) = (flush_suit, straight) {
        return Ok(if high == Rank::Ace.value() {
            HandRank::new(HandCategory::RoyalFlush, high)
        } else {
            HandRank::new(HandCategory::StraightFlush, high)
        });
    }

    if let Some(&(top_rank, top_count)) = profile.first() {
        if top_count + jokers >= 4 {
            // A lone-rank hand leaves a joker as the kicker, so it plays
            // as an ace
            let kicker = profile
                .get(1)
                .map(|&(r, _)| r)
                .unwrap_or_else(|| Rank::Ace.value());
            return Ok(HandRank::with_kickers(
                HandCategory::FourOfAKind,
                top_rank,
                vec![kicker],
            ));
        }

        if profile.len() >= 2 && top_count + jokers >= 3 {
            let jokers_used = 3usize.saturating_sub(top_count);
            let remaining = jokers - jokers_used;
            let (second_rank, second_count) = profile[1];
            if second_count + remaining >= 2 {
                return Ok(HandRank::with_secondary(
                    HandCategory::FullHouse,
                    top_rank,
                    second_rank,
                    Vec::new(),
                ));
            }
        }
    }

    if let Some(suit) = flush_suit {
        let mut ranks: Vec<u8> = cards
            .iter()
            .filter(|c| !c.is_joker() && c.suit_value() == suit)
            .map(|c| c.rank_value())
            .collect();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        // Jokers fill the highest missing slots as aces
        let fill = jokers.min(5 - ranks.len());
        let mut full = vec![Rank::Ace.value(); fill];
        full.extend(ranks);
        return Ok(HandRank::with_kickers(
            HandCategory::Flush,
            full[0],
            full[1..].to_vec(),
        ));
    }

    if let Some(high) = straight {
        return Ok(HandRank::new(HandCategory::Straight, high));
    }

    if let Some(&(top_rank, top_count)) = profile.first() {
        if top_count + jokers >= 3 {
            let kickers: Vec<u8> = profile[1..].iter().map(|&(r, _)| r).collect();
            return Ok(HandRank::with_kickers(
                HandCategory::ThreeOfAKind,
                top_rank,
                kickers,
            ));
        }

        if profile.len() >= 2 {
            let (second_rank, second_count) = profile[1];
            if top_count >= 2 && second_count + jokers >= 2 {
                let kickers = profile.get(2).map(|&(r, _)| vec![r]).unwrap_or_default();
                return Ok(HandRank::with_secondary(
                    HandCategory::TwoPair,
                    top_rank,
                    second_rank,
                    kickers,
                ));
            }
        }

        if top_count + jokers >= 2 {
            let kickers: Vec<u8> = profile[1..].iter().map(|&(r, _)| r).collect();
            return Ok(HandRank::with_kickers(HandCategory::Pair, top_rank, kickers));
        }
    }

    let mut ranks: Vec<u8> = Vec::with_capacity(5);
    ranks.extend(std::iter::repeat(Rank::Ace.value()).take(jokers));
    for &(rank, count) in &profile {
        ranks.extend(std::iter::repeat(rank).take(count));
    }
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    Ok(HandRank::with_kickers(
        HandCategory::HighCard,
        ranks[0],
        ranks[1..].to_vec(),
    ))
}

//! Card primitives: ranks, suits, and the packed card value
//!
//! A standard card packs rank and suit into a single byte as
//! `rank * 4 + suit` (0-51). Two sentinel values above the standard range
//! represent jokers, so a two-joker deck still fits in one `CardSet`
//! bitmask. Jokers have no rank or suit of their own; evaluators treat
//! them as wildcards.

use core::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// Card ranks ordered deuce to ace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Two = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Seven = 5,
    Eight = 6,
    Nine = 7,
    Ten = 8,
    Jack = 9,
    Queen = 10,
    King = 11,
    Ace = 12,
}

const RANK_CHARS: &str = "23456789TJQKA";

impl Rank {
    /// Numeric value in 0..=12 (Two = 0, Ace = 12).
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Rank from its numeric value, if in range.
    pub fn from_value(value: u8) -> Option<Rank> {
        match value {
            0 => Some(Rank::Two),
            1 => Some(Rank::Three),
            2 => Some(Rank::Four),
            3 => Some(Rank::Five),
            4 => Some(Rank::Six),
            5 => Some(Rank::Seven),
            6 => Some(Rank::Eight),
            7 => Some(Rank::Nine),
            8 => Some(Rank::Ten),
            9 => Some(Rank::Jack),
            10 => Some(Rank::Queen),
            11 => Some(Rank::King),
            12 => Some(Rank::Ace),
            _ => None,
        }
    }

    /// Rank from a display character (`2`-`9`, `T`, `J`, `Q`, `K`, `A`,
    /// letters case-insensitive).
    pub fn from_char(c: char) -> Option<Rank> {
        let c = c.to_ascii_uppercase();
        RANK_CHARS
            .find(c)
            .and_then(|idx| Rank::from_value(idx as u8))
    }

    /// Display character for the rank.
    pub fn to_char(self) -> char {
        RANK_CHARS.as_bytes()[self.value() as usize] as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Card suits. Unordered tags; the numeric values only fix the packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    /// Numeric value in 0..=3.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Suit from its numeric value, if in range.
    pub fn from_value(value: u8) -> Option<Suit> {
        match value {
            0 => Some(Suit::Clubs),
            1 => Some(Suit::Diamonds),
            2 => Some(Suit::Hearts),
            3 => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Suit from `c`/`d`/`h`/`s` (case-insensitive) or the unicode symbols.
    pub fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_lowercase() {
            'c' | '♣' => Some(Suit::Clubs),
            'd' | '♦' => Some(Suit::Diamonds),
            'h' | '♥' => Some(Suit::Hearts),
            's' | '♠' => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Single-character representation.
    pub fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// An immutable card, packed into a single byte.
///
/// Standard cards occupy 0-51 (`rank * 4 + suit`). The two joker sentinels
/// occupy 52 and 53; they are externally indistinguishable (both parse from
/// and print as `"JOKER"`) but carry distinct values so that a two-joker
/// deck remains a well-formed set.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    /// First joker sentinel.
    pub const JOKER: Card = Card(52);
    /// Second joker sentinel, used only in two-joker decks.
    pub const JOKER_B: Card = Card(53);

    /// Number of distinct card values (52 standard + 2 joker sentinels).
    pub const VALUE_COUNT: usize = 54;

    /// Card from rank and suit. Total over its inputs.
    pub fn from_rank_suit(rank: Rank, suit: Suit) -> Card {
        Card(rank.value() * 4 + suit.value())
    }

    /// Card from its packed value, if in range.
    pub fn from_value(value: u8) -> Option<Card> {
        (value < Card::VALUE_COUNT as u8).then_some(Card(value))
    }

    /// The packed value (0-53). Doubles as the bit index in `CardSet`.
    pub fn value(self) -> u8 {
        self.0
    }

    /// True for either joker sentinel.
    pub fn is_joker(self) -> bool {
        self.0 >= 52
    }

    /// Rank of the card, `None` for jokers.
    pub fn rank(self) -> Option<Rank> {
        if self.is_joker() {
            None
        } else {
            Rank::from_value(self.0 / 4)
        }
    }

    /// Suit of the card, `None` for jokers.
    pub fn suit(self) -> Option<Suit> {
        if self.is_joker() {
            None
        } else {
            Suit::from_value(self.0 % 4)
        }
    }

    /// Rank as a numeric value for sorting. Jokers count as aces.
    pub fn rank_value(self) -> u8 {
        if self.is_joker() {
            Rank::Ace.value()
        } else {
            self.0 / 4
        }
    }

    /// Suit as a numeric value; 0 for jokers.
    pub fn suit_value(self) -> u8 {
        if self.is_joker() {
            0
        } else {
            self.0 % 4
        }
    }

    /// The full deck for a game with `num_jokers` jokers (0-2).
    pub fn deck(num_jokers: usize) -> Result<Vec<Card>, EngineError> {
        if num_jokers > 2 {
            return Err(EngineError::InvalidFormat(format!(
                "number of jokers must be 0-2, got {num_jokers}"
            )));
        }
        let mut deck: Vec<Card> = (0..52).map(Card).collect();
        deck.extend([Card::JOKER, Card::JOKER_B].into_iter().take(num_jokers));
        Ok(deck)
    }

    /// Parse a card from its string form: two characters (rank then suit)
    /// or `"JOKER"` case-insensitively.
    pub fn parse(s: &str) -> Result<Card, EngineError> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("JOKER") {
            return Ok(Card::JOKER);
        }
        let invalid = || EngineError::InvalidFormat(format!("invalid card string: '{s}'"));
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(invalid());
        }
        let rank = Rank::from_char(chars[0]).ok_or_else(invalid)?;
        let suit = Suit::from_char(chars[1]).ok_or_else(invalid)?;
        Ok(Card::from_rank_suit(rank, suit))
    }
}

impl FromStr for Card {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::parse(s)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            write!(f, "JOKER")
        } else {
            // rank()/suit() are always present for standard values
            let rank = Rank::from_value(self.0 / 4).ok_or(fmt::Error)?;
            let suit = Suit::from_value(self.0 % 4).ok_or(fmt::Error)?;
            write!(f, "{rank}{suit}")
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Card({self})")
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Card::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_cards() {
        let cases = [
            ("As", Rank::Ace, Suit::Spades),
            ("AS", Rank::Ace, Suit::Spades),
            ("Td", Rank::Ten, Suit::Diamonds),
            ("2c", Rank::Two, Suit::Clubs),
            ("kh", Rank::King, Suit::Hearts),
            ("9♠", Rank::Nine, Suit::Spades),
        ];
        for (s, rank, suit) in cases {
            let card = Card::parse(s).unwrap();
            assert_eq!(card, Card::from_rank_suit(rank, suit), "parsing '{s}'");
        }
    }

    #[test]
    fn test_parse_joker() {
        assert_eq!(Card::parse("JOKER").unwrap(), Card::JOKER);
        assert_eq!(Card::parse("joker").unwrap(), Card::JOKER);
        assert!(Card::JOKER.is_joker());
        assert!(Card::JOKER.rank().is_none());
        assert!(Card::JOKER.suit().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for s in ["", "A", "ASD", "1s", "Ax", "XX", "JOKERS"] {
            assert!(
                matches!(Card::parse(s), Err(EngineError::InvalidFormat(_))),
                "'{s}' should not parse"
            );
        }
    }

    #[test]
    fn test_packed_value_round_trip() {
        for value in 0..52u8 {
            let card = Card::from_value(value).unwrap();
            let rank = card.rank().unwrap();
            let suit = card.suit().unwrap();
            assert_eq!(Card::from_rank_suit(rank, suit), card);
        }
        assert!(Card::from_value(54).is_none());
    }

    #[test]
    fn test_ordering() {
        let two_c = Card::parse("2c").unwrap();
        let two_s = Card::parse("2s").unwrap();
        let ace_s = Card::parse("As").unwrap();
        assert!(two_c < two_s);
        assert!(two_s < ace_s);
        // Jokers compare above every standard card
        assert!(ace_s < Card::JOKER);
        assert!(Card::JOKER < Card::JOKER_B);
        assert_eq!(Card::JOKER.rank_value(), Rank::Ace.value());
    }

    #[test]
    fn test_display_round_trip() {
        for value in 0..52u8 {
            let card = Card::from_value(value).unwrap();
            assert_eq!(Card::parse(&card.to_string()).unwrap(), card);
        }
        assert_eq!(Card::JOKER.to_string(), "JOKER");
        // The second sentinel prints identically; identity is internal only
        assert_eq!(Card::JOKER_B.to_string(), "JOKER");
    }

    #[test]
    fn test_deck_sizes() {
        assert_eq!(Card::deck(0).unwrap().len(), 52);
        assert_eq!(Card::deck(2).unwrap().len(), 54);
        assert!(Card::deck(3).is_err());
        let deck = Card::deck(1).unwrap();
        assert_eq!(deck.iter().filter(|c| c.is_joker()).count(), 1);
    }

    #[test]
    fn test_serde_string_form() {
        let card = Card::parse("Qh").unwrap();
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, "\"Qh\"");
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
        assert!(serde_json::from_str::<Card>("\"Zz\"").is_err());
    }
}

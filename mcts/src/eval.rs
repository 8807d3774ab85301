//! Heuristic state evaluation
//!
//! Produces an expected-score estimate in roughly [-25, +50] against a
//! generic opponent. Completed arrangements are scored from fixed per-row
//! win-probability tables plus royalties; partial arrangements combine
//! row strength, royalty potential, and a heavily weighted foul risk.
//! The numeric constants are deliberate and locked by tests.

use pineapple_engine::{Arrangement, Card, GameState, HandCategory, HandRank, Rank, Row};

/// Penalty returned for a fouled arrangement.
pub const FOUL_VALUE: f64 = -20.0;

/// Weight applied to the foul-risk term for partial states.
const FOUL_RISK_WEIGHT: f64 = 20.0;

/// Terminal bonus for qualifying for Fantasyland.
const FANTASYLAND_BONUS: f64 = 5.0;

/// Evaluates game states and arrangements. Stateless and freely sharable
/// across search workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateEvaluator;

impl StateEvaluator {
    pub fn new() -> StateEvaluator {
        StateEvaluator
    }

    /// Expected-score estimate for a state, terminal or not.
    pub fn evaluate(&self, state: &GameState) -> f64 {
        if state.is_complete() {
            return self.evaluate_final(state.arrangement());
        }
        let arrangement = state.arrangement();
        let strength = self.partial_strength(arrangement);
        let royalty_potential = self.royalty_potential(arrangement);
        let foul_risk = self.foul_risk(arrangement);
        strength + royalty_potential - foul_risk * FOUL_RISK_WEIGHT
    }

    /// Expected score of a completed arrangement against a typical
    /// opponent: expected row points, scoop equity, royalties, and the
    /// Fantasyland bonus. Fouls cost a flat penalty.
    pub fn evaluate_final(&self, arrangement: &Arrangement) -> f64 {
        if arrangement.validate_complete().is_err() {
            return FOUL_VALUE;
        }

        let royalties = arrangement.royalties().total() as f64;

        let probs: Vec<f64> = Row::ALL
            .iter()
            .map(|&row| match arrangement.row_rank(row) {
                Some(rank) => win_probability(row, &rank),
                None => 0.5,
            })
            .collect();

        let expected_rows: f64 = probs.iter().map(|p| (p - 0.5) * 2.0).sum();
        let scoop: f64 = probs.iter().product::<f64>() * 3.0;

        let mut total = expected_rows + scoop + royalties;
        if arrangement.qualifies_fantasyland() {
            total += FANTASYLAND_BONUS;
        }
        total
    }

    /// Strength contribution of each row, full or partial.
    fn partial_strength(&self, arrangement: &Arrangement) -> f64 {
        let mut score = 0.0;
        for row in Row::ALL {
            if let Some(rank) = arrangement.row_rank(row) {
                score += full_row_strength(row, &rank);
            } else {
                let cards = arrangement.row_cards(row);
                if cards.len() >= 2 {
                    score += partial_row_strength(row, &cards);
                }
            }
        }
        score
    }

    /// Achievable-future royalties estimated from partial contents.
    fn royalty_potential(&self, arrangement: &Arrangement) -> f64 {
        let mut potential = 0.0;

        let front = arrangement.row_cards(Row::Front);
        if front.len() < 3 {
            let counts = rank_counts(&front);
            for (rank, count) in counts {
                if count == 2 && rank >= Rank::Six.value() {
                    // Qualifying pair already placed: its royalty is live
                    potential += (rank - Rank::Six.value() + 1) as f64;
                } else if count == 1 && rank >= Rank::Queen.value() {
                    potential += 2.0;
                }
            }
        }

        let middle = arrangement.row_cards(Row::Middle);
        if middle.len() >= 2 {
            potential += trips_potential(&middle) * 2.0;
        }

        let back = arrangement.row_cards(Row::Back);
        if back.len() >= 3 {
            let straight = straight_potential(&back);
            let flush = flush_potential(&back);
            potential += straight.max(flush) * 2.0;
        }

        potential
    }

    /// Foul risk in [0, 1] from the currently observed row strengths.
    fn foul_risk(&self, arrangement: &Arrangement) -> f64 {
        let strength = |row: Row| -> i32 {
            if let Some(rank) = arrangement.row_rank(row) {
                rank.category as i32
            } else {
                let cards = arrangement.row_cards(row);
                if cards.len() >= 2 && has_pair(&cards) {
                    1
                } else {
                    0
                }
            }
        };

        let front = strength(Row::Front);
        let middle = strength(Row::Middle);
        let back = strength(Row::Back);

        let mut risk: f64 = 0.0;
        if front > middle + 1 {
            risk += 0.5;
        }
        if middle > back + 1 {
            risk += 0.5;
        }
        // A strong front committed early leaves little room to outgrow it
        if arrangement.row_len(Row::Front) < 3 && front >= 2 {
            risk += 0.3;
        }
        risk.min(1.0)
    }
}

/// Fixed per-row win probabilities against a typical opponent, keyed on
/// hand category with a small adjustment for pair rank.
pub(crate) fn win_probability(row: Row, rank: &HandRank) -> f64 {
    let base = match row {
        Row::Front => match rank.category {
            HandCategory::HighCard => 0.30,
            HandCategory::Pair => 0.60,
            HandCategory::ThreeOfAKind => 0.95,
            _ => 0.50,
        },
        Row::Middle => match rank.category {
            HandCategory::HighCard => 0.10,
            HandCategory::Pair => 0.25,
            HandCategory::TwoPair => 0.45,
            HandCategory::ThreeOfAKind => 0.70,
            HandCategory::Straight => 0.80,
            HandCategory::Flush => 0.85,
            HandCategory::FullHouse => 0.90,
            HandCategory::FourOfAKind => 0.95,
            HandCategory::StraightFlush => 0.99,
            HandCategory::RoyalFlush => 1.0,
        },
        Row::Back => match rank.category {
            HandCategory::HighCard => 0.05,
            HandCategory::Pair => 0.15,
            HandCategory::TwoPair => 0.35,
            HandCategory::ThreeOfAKind => 0.55,
            HandCategory::Straight => 0.65,
            HandCategory::Flush => 0.75,
            HandCategory::FullHouse => 0.85,
            HandCategory::FourOfAKind => 0.92,
            HandCategory::StraightFlush => 0.98,
            HandCategory::RoyalFlush => 1.0,
        },
    };

    let adjusted = if rank.category == HandCategory::Pair {
        base + (rank.primary as f64 - 6.0) * 0.02
    } else {
        base
    };
    adjusted.clamp(0.0, 1.0)
}

/// Strength of a completed row: category base score, rank adjustment for
/// pairs and trips, position multiplier.
fn full_row_strength(row: Row, rank: &HandRank) -> f64 {
    let base = match rank.category {
        HandCategory::HighCard => 0.0,
        HandCategory::Pair => 2.0,
        HandCategory::TwoPair => 4.0,
        HandCategory::ThreeOfAKind => 6.0,
        HandCategory::Straight => 8.0,
        HandCategory::Flush => 10.0,
        HandCategory::FullHouse => 12.0,
        HandCategory::FourOfAKind => 15.0,
        HandCategory::StraightFlush => 20.0,
        HandCategory::RoyalFlush => 25.0,
    };

    let adjusted = match rank.category {
        HandCategory::Pair => base + rank.primary as f64 * 0.3,
        HandCategory::ThreeOfAKind => base + rank.primary as f64 * 0.2,
        _ => base,
    };

    match row {
        Row::Front => adjusted * 0.8,
        Row::Middle => adjusted,
        Row::Back => adjusted * 1.2,
    }
}

/// Heuristic strength of a partially filled row: made pairs and trips,
/// flush-draw density, connected-rank runs.
fn partial_row_strength(row: Row, cards: &[Card]) -> f64 {
    let mut score = 0.0;

    for (rank, count) in rank_counts(cards) {
        if count >= 2 {
            score += 2.0 + rank as f64 * 0.1;
        }
        if count >= 3 {
            score += 4.0 + rank as f64 * 0.2;
        }
    }

    if row != Row::Front {
        for count in suit_counts(cards) {
            if count >= 3 {
                score += 1.5;
            }
            if count >= 4 {
                score += 3.0;
            }
        }
        score += straight_potential(cards);
    }

    score
}

fn rank_counts(cards: &[Card]) -> Vec<(u8, usize)> {
    let mut counts = [0usize; 13];
    for card in cards {
        if !card.is_joker() {
            counts[card.rank_value() as usize] += 1;
        }
    }
    (0..13u8)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (r, counts[r as usize]))
        .collect()
}

fn suit_counts(cards: &[Card]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for card in cards {
        if !card.is_joker() {
            counts[card.suit_value() as usize] += 1;
        }
    }
    counts
}

fn has_pair(cards: &[Card]) -> bool {
    rank_counts(cards).iter().any(|&(_, count)| count >= 2)
}

/// Likelihood-flavored score for completing a straight from these cards.
fn straight_potential(cards: &[Card]) -> f64 {
    if cards.len() < 3 {
        return 0.0;
    }
    let mut ranks: Vec<u8> = cards
        .iter()
        .filter(|c| !c.is_joker())
        .map(|c| c.rank_value())
        .collect();
    ranks.sort_unstable();
    ranks.dedup();
    if ranks.is_empty() {
        return 0.0;
    }

    let mut best = 1.0f64;
    let mut current = 1.0f64;
    for window in ranks.windows(2) {
        let gap = window[1] - window[0];
        if gap == 1 {
            current += 1.0;
            best = best.max(current);
        } else if gap <= 2 {
            current += 0.5;
        } else {
            current = 1.0;
        }
    }

    // Ace plays low toward the wheel
    if ranks.contains(&Rank::Ace.value()) && ranks.iter().any(|&r| r <= 4) {
        best = best.max(2.0);
    }

    if best >= 4.0 {
        2.0
    } else if best >= 3.0 {
        1.0
    } else {
        0.0
    }
}

/// Score for a developing trips draw.
fn trips_potential(cards: &[Card]) -> f64 {
    if rank_counts(cards).iter().any(|&(_, count)| count >= 2) {
        0.3
    } else {
        0.0
    }
}

/// Score for a developing flush draw.
fn flush_potential(cards: &[Card]) -> f64 {
    let max_suit = suit_counts(cards).into_iter().max().unwrap_or(0);
    if max_suit >= 4 {
        0.8
    } else if max_suit >= 3 {
        0.3
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pineapple_engine::GameSnapshot;

    fn board(front: &[&str], middle: &[&str], back: &[&str]) -> Arrangement {
        let mut arr = Arrangement::new();
        for (row, cards) in [(Row::Front, front), (Row::Middle, middle), (Row::Back, back)] {
            for (i, s) in cards.iter().enumerate() {
                arr.place(Card::parse(s).unwrap(), row, i).unwrap();
            }
        }
        arr
    }

    fn rank_of(category: HandCategory, primary: u8) -> HandRank {
        HandRank {
            category,
            primary,
            secondary: None,
            kickers: Vec::new(),
        }
    }

    #[test]
    fn test_win_probability_tables_are_locked() {
        let trips = rank_of(HandCategory::ThreeOfAKind, 5);
        assert_eq!(win_probability(Row::Front, &trips), 0.95);
        assert_eq!(win_probability(Row::Middle, &trips), 0.70);
        assert_eq!(win_probability(Row::Back, &trips), 0.55);

        let flush = rank_of(HandCategory::Flush, 12);
        assert_eq!(win_probability(Row::Middle, &flush), 0.85);
        assert_eq!(win_probability(Row::Back, &flush), 0.75);

        let royal = rank_of(HandCategory::RoyalFlush, 12);
        assert_eq!(win_probability(Row::Back, &royal), 1.0);

        // Pair probabilities shift 2% per rank away from sixes
        let aces = rank_of(HandCategory::Pair, Rank::Ace.value());
        let sixes = rank_of(HandCategory::Pair, 6);
        assert_eq!(win_probability(Row::Front, &sixes), 0.60);
        assert!((win_probability(Row::Front, &aces) - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_fouled_arrangement_scores_fixed_penalty() {
        let fouled = board(
            &["Ah", "As", "Ad"],
            &["Qh", "Jc", "9d", "5c", "3h"],
            &["Kh", "Ks", "Kc", "2d", "2h"],
        );
        assert!(fouled.validate_complete().is_err());
        assert_eq!(StateEvaluator::new().evaluate_final(&fouled), FOUL_VALUE);
    }

    #[test]
    fn test_terminal_value_includes_royalties_and_fantasyland() {
        let evaluator = StateEvaluator::new();

        // Royal back, boat middle, QQ front: royalties 25 + 12 + 7 = 44
        let monster = board(
            &["Qc", "Qd", "9h"],
            &["Ah", "As", "Ad", "Kc", "Kh"],
            &["Ts", "Js", "Qs", "Ks", "As"],
        );
        assert_eq!(monster.royalties().total(), 44);
        assert!(monster.qualifies_fantasyland());
        let value = evaluator.evaluate_final(&monster);
        assert!(
            value > 44.0,
            "royalties plus positive equity plus Fantasyland, got {value}"
        );

        let modest = board(
            &["2c", "5d", "9h"],
            &["Ah", "As", "Kd", "Qc", "Jh"],
            &["Kh", "Ks", "Kc", "2d", "2h"],
        );
        assert!(evaluator.evaluate_final(&modest) < value);
    }

    #[test]
    fn test_partial_state_foul_risk_penalizes_strong_front() {
        let evaluator = StateEvaluator::new();

        // Trips in front against developing middle and back
        let risky = board(&["Kh", "Kd", "Kc"], &["2c", "7d"], &["3d", "8s"]);
        // Same skeleton with a harmless front
        let safe = board(&["4h", "9d", "Kc"], &["2c", "7d"], &["3d", "8s"]);

        let mut snapshot_base = GameSnapshot {
            num_players: 2,
            player_index: 0,
            num_jokers: 0,
            current_street: pineapple_engine::Street::Third,
            current_hand: vec![],
            arrangement: pineapple_engine::ArrangementSnapshot {
                front: vec![None, None, None],
                middle: vec![None; 5],
                back: vec![None; 5],
            },
            opponent_consumed: vec![],
            seed: Some(1),
        };
        // Build two states sharing everything but the arrangement
        let fill = |snapshot: &mut GameSnapshot, arr: &Arrangement| {
            for (row, slot_out) in [
                (Row::Front, &mut snapshot.arrangement.front),
                (Row::Middle, &mut snapshot.arrangement.middle),
                (Row::Back, &mut snapshot.arrangement.back),
            ] {
                for (i, slot) in arr.row_slots(row).iter().enumerate() {
                    slot_out[i] = slot.map(|c| c.to_string());
                }
            }
        };

        let mut risky_snapshot = snapshot_base.clone();
        fill(&mut risky_snapshot, &risky);
        let risky_state = GameState::from_snapshot(&risky_snapshot).unwrap();

        fill(&mut snapshot_base, &safe);
        let safe_state = GameState::from_snapshot(&snapshot_base).unwrap();

        assert!(
            evaluator.evaluate(&risky_state) < evaluator.evaluate(&safe_state),
            "a trips front over weak rows must evaluate worse"
        );
    }

    #[test]
    fn test_completing_a_stronger_back_never_hurts() {
        let evaluator = StateEvaluator::new();

        // Four spades in the back: completing the flush beats a brick
        let flush_board = board(&["2c", "7d"], &["9c", "Th"], &["2s", "7s", "9s", "Js", "Ks"]);
        let brick_board = board(&["2c", "7d"], &["9c", "Th"], &["2s", "7s", "9s", "Js", "4d"]);

        let flush_rank = flush_board.row_rank(Row::Back).unwrap();
        assert_eq!(flush_rank.category, HandCategory::Flush);

        let strong = StateEvaluator::default();
        let snapshot = |arr: &Arrangement| {
            let mut snap = GameSnapshot {
                num_players: 2,
                player_index: 0,
                num_jokers: 0,
                current_street: pineapple_engine::Street::Second,
                current_hand: vec![],
                arrangement: pineapple_engine::ArrangementSnapshot {
                    front: vec![None, None, None],
                    middle: vec![None; 5],
                    back: vec![None; 5],
                },
                opponent_consumed: vec![],
                seed: Some(1),
            };
            for (row, slots) in [
                (Row::Front, &mut snap.arrangement.front),
                (Row::Middle, &mut snap.arrangement.middle),
                (Row::Back, &mut snap.arrangement.back),
            ] {
                for (i, slot) in arr.row_slots(row).iter().enumerate() {
                    slots[i] = slot.map(|c| c.to_string());
                }
            }
            snap
        };

        let flush_state = GameState::from_snapshot(&snapshot(&flush_board)).unwrap();
        let brick_state = GameState::from_snapshot(&snapshot(&brick_board)).unwrap();
        assert!(strong.evaluate(&flush_state) >= evaluator.evaluate(&brick_state));
    }
}

//! Head-to-head OFC scoring
//!
//! Scores are signed integers from the first player's perspective. A foul
//! concedes the heads-up penalty plus the opponent's royalties and scores
//! no rows; winning all three rows earns the scoop bonus on top of the
//! row points and royalty difference.

use crate::arrangement::{Arrangement, Row};

/// Points conceded to the opponent by a fouling player, heads-up.
pub const FOUL_PENALTY_HEADS_UP: i32 = 6;

/// Bonus for winning all three rows against one opponent.
pub const SCOOP_BONUS: i32 = 3;

fn fouls(arrangement: &Arrangement) -> bool {
    !arrangement.is_complete() || arrangement.validate_complete().is_err()
}

/// Score two completed arrangements from `a`'s perspective.
pub fn score_heads_up(a: &Arrangement, b: &Arrangement) -> i32 {
    let a_fouls = fouls(a);
    let b_fouls = fouls(b);

    if a_fouls && b_fouls {
        return 0;
    }
    if a_fouls {
        return -(FOUL_PENALTY_HEADS_UP + b.royalties().total() as i32);
    }
    if b_fouls {
        return FOUL_PENALTY_HEADS_UP + a.royalties().total() as i32;
    }

    let mut points = 0;
    let mut wins = 0;
    let mut losses = 0;
    for row in Row::ALL {
        // Both boards are complete here, so the ranks exist
        match (a.row_rank(row), b.row_rank(row)) {
            (Some(ours), Some(theirs)) => {
                if ours > theirs {
                    points += 1;
                    wins += 1;
                } else if theirs > ours {
                    points -= 1;
                    losses += 1;
                }
            }
            _ => {}
        }
    }

    if wins == 3 {
        points += SCOOP_BONUS;
    } else if losses == 3 {
        points -= SCOOP_BONUS;
    }

    points + a.royalties().total() as i32 - b.royalties().total() as i32
}

/// Score one player against several opponents: the sum of the pairwise
/// heads-up results.
pub fn score_against_field(player: &Arrangement, opponents: &[Arrangement]) -> i32 {
    opponents
        .iter()
        .map(|opponent| score_heads_up(player, opponent))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Card;

    fn board(front: &[&str], middle: &[&str], back: &[&str]) -> Arrangement {
        let mut arr = Arrangement::new();
        for (row, cards) in [(Row::Front, front), (Row::Middle, middle), (Row::Back, back)] {
            for (i, s) in cards.iter().enumerate() {
                arr.place(Card::parse(s).unwrap(), row, i).unwrap();
            }
        }
        arr
    }

    fn strong_board() -> Arrangement {
        // Trips front (10), boat middle (12), quads back (10)
        board(
            &["2c", "2d", "2h"],
            &["Ah", "As", "Ad", "Kc", "Kh"],
            &["9h", "9s", "9c", "9d", "3h"],
        )
    }

    fn weak_board() -> Arrangement {
        board(
            &["3c", "5d", "8h"],
            &["Jh", "Js", "4d", "6c", "7h"],
            &["Qh", "Qs", "Tc", "2s", "4h"],
        )
    }

    fn fouled_board() -> Arrangement {
        // Back weaker than middle
        board(
            &["3c", "5d", "8h"],
            &["Qh", "Qs", "Tc", "2s", "4h"],
            &["Jh", "5s", "4d", "6c", "7h"],
        )
    }

    #[test]
    fn test_both_foul_scores_zero() {
        assert_eq!(score_heads_up(&fouled_board(), &fouled_board()), 0);
    }

    #[test]
    fn test_single_foul_pays_penalty_plus_royalties() {
        let strong = strong_board();
        let royalties = strong.royalties().total() as i32;
        assert_eq!(
            score_heads_up(&strong, &fouled_board()),
            FOUL_PENALTY_HEADS_UP + royalties
        );
        assert_eq!(
            score_heads_up(&fouled_board(), &strong),
            -(FOUL_PENALTY_HEADS_UP + royalties)
        );
    }

    #[test]
    fn test_scoop_applied_iff_all_rows_won() {
        let strong = strong_board();
        let weak = weak_board();
        // Strong wins every row: 3 row points + scoop + royalty diff (32 - 0)
        assert_eq!(score_heads_up(&strong, &weak), 3 + SCOOP_BONUS + 32);

        // Splitting rows gives no scoop: a royal back beats strong's quads
        let mixed = board(
            &["3c", "5d", "8h"],
            &["Jd", "Js", "4d", "6c", "7h"],
            &["Ah", "Kh", "Qh", "Jh", "Th"],
        );
        let score = score_heads_up(&strong, &mixed);
        // Strong takes front and middle, loses back: 1 + 1 - 1, no scoop,
        // royalty diff 32 - 25
        assert_eq!(score, 1 + 32 - 25);
    }

    #[test]
    fn test_antisymmetry_without_fouls() {
        let a = strong_board();
        let b = weak_board();
        assert_eq!(score_heads_up(&a, &b), -score_heads_up(&b, &a));
        assert_eq!(score_heads_up(&a, &a), 0);
    }

    #[test]
    fn test_multi_opponent_sum() {
        let player = strong_board();
        let opponents = [weak_board(), fouled_board()];
        let expected =
            score_heads_up(&player, &opponents[0]) + score_heads_up(&player, &opponents[1]);
        assert_eq!(score_against_field(&player, &opponents), expected);
    }

    #[test]
    fn test_incomplete_board_counts_as_foul() {
        let mut partial = Arrangement::new();
        partial.place(Card::parse("As").unwrap(), Row::Back, 0).unwrap();
        let complete = strong_board();
        let royalties = complete.royalties().total() as i32;
        assert_eq!(
            score_heads_up(&complete, &partial),
            FOUL_PENALTY_HEADS_UP + royalties
        );
    }
}

//! Template-driven action generation
//!
//! Enumerating every legal placement is hopeless (the initial street alone
//! has over 10^5 raw placements), so candidates come from poker templates:
//! pair anchors, flush anchors, straight anchors, and rank-sorted balanced
//! distributions as a safety net. Regular streets enumerate 2-card
//! placements per discard choice under a cheap heuristic filter. The
//! surviving candidates are scored by applying them to a scratch state and
//! evaluating the result.

use std::collections::BTreeSet;

use pineapple_engine::{Card, GameState, Row, Street};

use crate::action::{Action, Placement};
use crate::eval::StateEvaluator;

/// Candidate cap for the initial street.
pub const K_INITIAL: usize = 20;

/// Candidate cap for the pineapple streets.
pub const K_REGULAR: usize = 15;

/// Placements retained per discard choice before full scoring.
const PLACEMENTS_PER_DISCARD: usize = 5;

/// Penalty per rank step for throwing away high cards.
const DISCARD_RANK_PENALTY: f64 = 0.1;

/// Open slots of one street, partitioned by row.
struct OpenSlots {
    front: Vec<(Row, usize)>,
    middle: Vec<(Row, usize)>,
    back: Vec<(Row, usize)>,
}

impl OpenSlots {
    fn of(state: &GameState) -> OpenSlots {
        let mut slots = OpenSlots {
            front: Vec::new(),
            middle: Vec::new(),
            back: Vec::new(),
        };
        for (row, index) in state.valid_placements() {
            match row {
                Row::Front => slots.front.push((row, index)),
                Row::Middle => slots.middle.push((row, index)),
                Row::Back => slots.back.push((row, index)),
            }
        }
        slots
    }

    fn total(&self) -> usize {
        self.front.len() + self.middle.len() + self.back.len()
    }
}

/// Generates a bounded, prioritized set of legal actions for a state.
/// Stateless and freely sharable across search workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionGenerator {
    evaluator: StateEvaluator,
}

impl ActionGenerator {
    pub fn new() -> ActionGenerator {
        ActionGenerator {
            evaluator: StateEvaluator::new(),
        }
    }

    /// Candidate actions, best first. Empty when the state is complete or
    /// no hand is waiting to be placed.
    pub fn generate(&self, state: &GameState) -> Vec<Action> {
        if state.is_complete() || state.current_hand().is_empty() {
            return Vec::new();
        }
        match state.street() {
            Street::Initial => self.initial_actions(state),
            _ => self.regular_actions(state),
        }
    }

    /// Score for one action: apply it to a scratch state and evaluate.
    /// Regular-street actions pay for the rank of the card they throw away.
    pub fn score_action(&self, state: &GameState, action: &Action) -> Option<f64> {
        let mut scratch = state.clone();
        action.apply(&mut scratch).ok()?;
        let mut score = self.evaluator.evaluate(&scratch);
        if let Some(discard) = action.discard() {
            score -= DISCARD_RANK_PENALTY * discard.rank_value() as f64;
        }
        Some(score)
    }

    fn initial_actions(&self, state: &GameState) -> Vec<Action> {
        let hand = state.current_hand().to_vec();
        let slots = OpenSlots::of(state);
        if hand.len() != 5 || slots.total() < 5 {
            return Vec::new();
        }

        let mut candidates: BTreeSet<Action> = BTreeSet::new();

        self.pair_templates(&hand, &slots, &mut candidates);
        self.flush_templates(&hand, &slots, &mut candidates);
        self.straight_templates(&hand, &slots, &mut candidates);
        self.balanced_templates(&hand, &slots, &mut candidates);

        self.rank_and_truncate(state, candidates, K_INITIAL)
    }

    fn regular_actions(&self, state: &GameState) -> Vec<Action> {
        let hand = state.current_hand().to_vec();
        let open = state.valid_placements();
        if hand.len() != 3 || open.len() < 2 {
            return Vec::new();
        }

        let mut candidates: BTreeSet<Action> = BTreeSet::new();

        for discard_index in 0..3 {
            let discard = hand[discard_index];
            let keep: Vec<Card> = hand
                .iter()
                .copied()
                .enumerate()
                .filter(|&(i, _)| i != discard_index)
                .map(|(_, c)| c)
                .collect();

            // All ordered two-card placements over the open slots, filtered
            // by the cheap heuristic before the expensive scoring pass
            let mut scored: Vec<(f64, Action)> = Vec::new();
            for &(row_a, idx_a) in &open {
                for &(row_b, idx_b) in &open {
                    if (row_a, idx_a) == (row_b, idx_b) {
                        continue;
                    }
                    let placements = vec![
                        Placement::new(keep[0], row_a, idx_a),
                        Placement::new(keep[1], row_b, idx_b),
                    ];
                    let quick = self.quick_evaluate_placement(state, &placements);
                    scored.push((quick, Action::new(placements, Some(discard))));
                }
            }
            scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
            for (_, action) in scored.into_iter().take(PLACEMENTS_PER_DISCARD) {
                candidates.insert(action);
            }
        }

        self.rank_and_truncate(state, candidates, K_REGULAR)
    }

    /// Cheap placement heuristic: high cards belong toward the back, pairs
    /// in front and suited density in the long rows are worth a bump.
    fn quick_evaluate_placement(&self, state: &GameState, placements: &[Placement]) -> f64 {
        let arrangement = state.arrangement();
        let mut score = 0.0;
        for placement in placements {
            let rank = placement.card.rank_value() as f64;
            match placement.row {
                Row::Back => score += rank * 0.2,
                Row::Middle => score += rank * 0.1,
                Row::Front => {
                    for existing in arrangement.row_cards(Row::Front) {
                        if existing.rank_value() == placement.card.rank_value() {
                            score += 3.0;
                        }
                    }
                }
            }
            if placement.row != Row::Front {
                let suited = arrangement
                    .row_cards(placement.row)
                    .iter()
                    .filter(|c| !c.is_joker() && c.suit_value() == placement.card.suit_value())
                    .count();
                if !placement.card.is_joker() && suited >= 2 {
                    score += 1.5;
                }
            }
        }
        score
    }

    /// Pair anchors: each natural pair goes front (royalty hunting, rank
    /// six or better) and middle (safe), with the leftovers spread
    /// highest-to-back.
    fn pair_templates(&self, hand: &[Card], slots: &OpenSlots, out: &mut BTreeSet<Action>) {
        for (rank, cards) in natural_pairs(hand) {
            let pair = [cards[0], cards[1]];
            let mut rest: Vec<Card> = hand
                .iter()
                .copied()
                .filter(|c| *c != pair[0] && *c != pair[1])
                .collect();
            rest.sort_by(|a, b| b.rank_value().cmp(&a.rank_value()));

            // Sixes or better chase the front royalty ladder
            if rank >= 4
                && slots.front.len() >= 2
                && slots.back.len() >= 2
                && !slots.middle.is_empty()
            {
                // Pair front, highest leftovers back
                let placements = vec![
                    Placement::new(pair[0], slots.front[0].0, slots.front[0].1),
                    Placement::new(pair[1], slots.front[1].0, slots.front[1].1),
                    Placement::new(rest[0], slots.back[0].0, slots.back[0].1),
                    Placement::new(rest[1], slots.back[1].0, slots.back[1].1),
                    Placement::new(rest[2], slots.middle[0].0, slots.middle[0].1),
                ];
                out.insert(Action::new(placements, None));
            }

            if slots.middle.len() >= 2 && slots.front.len() >= 2 && !slots.back.is_empty() {
                // Pair middle, highest leftover back, low cards front
                let placements = vec![
                    Placement::new(pair[0], slots.middle[0].0, slots.middle[0].1),
                    Placement::new(pair[1], slots.middle[1].0, slots.middle[1].1),
                    Placement::new(rest[0], slots.back[0].0, slots.back[0].1),
                    Placement::new(rest[1], slots.front[0].0, slots.front[0].1),
                    Placement::new(rest[2], slots.front[1].0, slots.front[1].1),
                ];
                out.insert(Action::new(placements, None));
            }
        }
    }

    /// Flush anchors: three or more of a suit (jokers count) go to the
    /// back contiguously, leftovers fill middle then front by rank.
    fn flush_templates(&self, hand: &[Card], slots: &OpenSlots, out: &mut BTreeSet<Action>) {
        let jokers: Vec<Card> = hand.iter().copied().filter(|c| c.is_joker()).collect();
        for suit in 0..4u8 {
            let mut suited: Vec<Card> = hand
                .iter()
                .copied()
                .filter(|c| !c.is_joker() && c.suit_value() == suit)
                .collect();
            if suited.len() + jokers.len() < 3 {
                continue;
            }
            suited.sort_by(|a, b| b.rank_value().cmp(&a.rank_value()));
            suited.extend(jokers.iter().copied());

            let anchored: Vec<Card> = suited.iter().copied().take(5).collect();
            let mut rest: Vec<Card> = hand
                .iter()
                .copied()
                .filter(|c| !anchored.contains(c))
                .collect();
            rest.sort_by(|a, b| b.rank_value().cmp(&a.rank_value()));

            // Prefer the back row, fall back to the middle when occupied
            for (anchor, spill) in [(&slots.back, &slots.middle), (&slots.middle, &slots.back)] {
                if anchor.len() < anchored.len() {
                    continue;
                }
                let filler: Vec<(Row, usize)> =
                    spill.iter().chain(slots.front.iter()).copied().collect();
                if filler.len() < rest.len() {
                    continue;
                }
                let mut placements: Vec<Placement> = anchored
                    .iter()
                    .zip(anchor.iter())
                    .map(|(&c, &(row, idx))| Placement::new(c, row, idx))
                    .collect();
                for (&card, &(row, idx)) in rest.iter().zip(filler.iter()) {
                    placements.push(Placement::new(card, row, idx));
                }
                if placements.len() == 5 {
                    out.insert(Action::new(placements, None));
                }
                break;
            }
        }
    }

    /// Straight anchors: the longest joker-aware connected chain goes to
    /// the middle or the back.
    fn straight_templates(&self, hand: &[Card], slots: &OpenSlots, out: &mut BTreeSet<Action>) {
        let chain = longest_connected_chain(hand);
        if chain.len() < 3 {
            return;
        }
        let mut rest: Vec<Card> = hand.iter().copied().filter(|c| !chain.contains(c)).collect();
        rest.sort_by(|a, b| b.rank_value().cmp(&a.rank_value()));

        for (anchor, spill) in [(&slots.back, &slots.middle), (&slots.middle, &slots.back)] {
            if anchor.len() < chain.len() {
                continue;
            }
            let mut placements: Vec<Placement> = chain
                .iter()
                .zip(anchor.iter())
                .map(|(&c, &(row, idx))| Placement::new(c, row, idx))
                .collect();
            let filler: Vec<(Row, usize)> =
                spill.iter().chain(slots.front.iter()).copied().collect();
            if filler.len() < rest.len() {
                continue;
            }
            for (&card, &(row, idx)) in rest.iter().zip(filler.iter()) {
                placements.push(Placement::new(card, row, idx));
            }
            if placements.len() == 5 {
                out.insert(Action::new(placements, None));
            }
        }
    }

    /// Rank-sorted balanced baselines: 2-2-1, 2-1-2, and 1-2-2 with the
    /// low cards forward. Always part of the candidate set.
    fn balanced_templates(&self, hand: &[Card], slots: &OpenSlots, out: &mut BTreeSet<Action>) {
        let mut sorted = hand.to_vec();
        sorted.sort_by_key(|c| c.rank_value());

        let shapes: [(usize, usize, usize); 3] = [(2, 2, 1), (2, 1, 2), (1, 2, 2)];
        for (n_front, n_middle, n_back) in shapes {
            if slots.front.len() < n_front
                || slots.middle.len() < n_middle
                || slots.back.len() < n_back
            {
                continue;
            }
            let mut placements = Vec::with_capacity(5);
            let mut cards = sorted.iter();
            for i in 0..n_front {
                if let Some(&c) = cards.next() {
                    placements.push(Placement::new(c, slots.front[i].0, slots.front[i].1));
                }
            }
            for i in 0..n_middle {
                if let Some(&c) = cards.next() {
                    placements.push(Placement::new(c, slots.middle[i].0, slots.middle[i].1));
                }
            }
            for i in 0..n_back {
                if let Some(&c) = cards.next() {
                    placements.push(Placement::new(c, slots.back[i].0, slots.back[i].1));
                }
            }
            if placements.len() == 5 {
                out.insert(Action::new(placements, None));
            }
        }
    }

    /// Full scoring pass: evaluate every candidate against a scratch
    /// state, order best first with the action ordering as tie-break, cap
    /// the list.
    fn rank_and_truncate(
        &self,
        state: &GameState,
        candidates: BTreeSet<Action>,
        cap: usize,
    ) -> Vec<Action> {
        let mut scored: Vec<(f64, Action)> = candidates
            .into_iter()
            .filter_map(|action| self.score_action(state, &action).map(|s| (s, action)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(cap);
        scored.into_iter().map(|(_, action)| action).collect()
    }
}

/// Natural pairs in the hand: rank value plus the first two cards of it.
fn natural_pairs(hand: &[Card]) -> Vec<(u8, Vec<Card>)> {
    let mut by_rank: Vec<(u8, Vec<Card>)> = Vec::new();
    for rank in (0..13u8).rev() {
        let cards: Vec<Card> = hand
            .iter()
            .copied()
            .filter(|c| !c.is_joker() && c.rank_value() == rank)
            .collect();
        if cards.len() >= 2 {
            by_rank.push((rank, cards));
        }
    }
    by_rank
}

/// Longest run of connected ranks, jokers bridging one gap each.
fn longest_connected_chain(hand: &[Card]) -> Vec<Card> {
    let mut standard: Vec<Card> = hand.iter().copied().filter(|c| !c.is_joker()).collect();
    let jokers: Vec<Card> = hand.iter().copied().filter(|c| c.is_joker()).collect();
    standard.sort_by_key(|c| c.rank_value());
    standard.dedup_by_key(|c| c.rank_value());

    if standard.len() < 2 {
        let mut chain = standard;
        chain.extend(jokers);
        return chain;
    }

    let mut best: Vec<Card> = Vec::new();
    let mut current: Vec<Card> = vec![standard[0]];
    let mut budget = jokers.len();

    for pair in standard.windows(2) {
        let gap = pair[1].rank_value() - pair[0].rank_value() - 1;
        if (gap as usize) <= budget {
            budget -= gap as usize;
            current.push(pair[1]);
        } else {
            if current.len() > best.len() {
                best = current.clone();
            }
            current = vec![pair[1]];
            budget = jokers.len();
        }
    }
    if current.len() > best.len() {
        best = current;
    }
    best.extend(jokers);
    best
}

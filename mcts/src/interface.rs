//! The single public operation: `solve`
//!
//! Callers hand in a game state and a configuration; the solver returns
//! the best action with value estimates and visit statistics in a
//! serialization-friendly form. Cards cross this boundary as two-char
//! strings (or `"JOKER"`), rows as `"front"` / `"middle"` / `"back"`.

use serde::{Deserialize, Serialize};

use pineapple_engine::{Card, GameState, Row};

use crate::action::{Action, Placement};
use crate::error::SolverError;
use crate::mcts::{MctsConfig, MctsEngine};
use crate::node::ActionStats;

/// Root visits at which confidence saturates.
const CONFIDENCE_VISITS: f64 = 10_000.0;

/// Cap on the reported top-action list.
const TOP_ACTIONS: usize = 5;

/// One placement in wire form: `(card, row, index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDto {
    pub card: String,
    pub row: Row,
    pub index: usize,
}

/// An action in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDto {
    pub placements: Vec<PlacementDto>,
    pub discard: Option<String>,
}

impl ActionDto {
    fn from_action(action: &Action) -> ActionDto {
        ActionDto {
            placements: action
                .placements()
                .iter()
                .map(|p| PlacementDto {
                    card: p.card.to_string(),
                    row: p.row,
                    index: p.index,
                })
                .collect(),
            discard: action.discard().map(|c| c.to_string()),
        }
    }

    /// Parse back into a domain action.
    pub fn to_action(&self) -> Result<Action, SolverError> {
        let mut placements = Vec::with_capacity(self.placements.len());
        for p in &self.placements {
            placements.push(Placement::new(Card::parse(&p.card)?, p.row, p.index));
        }
        let discard = match &self.discard {
            Some(s) => Some(Card::parse(s)?),
            None => None,
        };
        Ok(Action::new(placements, discard))
    }
}

/// Visit statistics for one root action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopActionDto {
    pub action: ActionDto,
    pub visits: u64,
    pub mean_reward: f64,
}

/// Result of a `solve` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub best_action: ActionDto,
    pub expected_score: f64,
    /// `min(root_visits / 10000, 0.99)`.
    pub confidence: f64,
    pub simulations_run: u64,
    pub elapsed_seconds: f64,
    pub top_actions: Vec<TopActionDto>,
}

/// Run a search over `state` and report the best action found.
///
/// Errors: `state_terminal` for completed games, `bad_configuration` for
/// unusable configs, `search_cancelled` when stopped before the first
/// simulation, and engine errors for malformed states.
pub fn solve(state: &GameState, config: &MctsConfig) -> Result<SolveResponse, SolverError> {
    let engine = MctsEngine::new(config.clone());
    let report = engine.search(state)?;

    let confidence = (report.root_visits as f64 / CONFIDENCE_VISITS).min(0.99);
    let top_actions = report
        .actions
        .iter()
        .take(TOP_ACTIONS)
        .map(|stats: &ActionStats| TopActionDto {
            action: ActionDto::from_action(&stats.action),
            visits: stats.visits,
            mean_reward: stats.mean_reward,
        })
        .collect();

    Ok(SolveResponse {
        best_action: ActionDto::from_action(&report.best_action),
        expected_score: report.expected_score(),
        confidence,
        simulations_run: report.simulations,
        elapsed_seconds: report.elapsed.as_secs_f64(),
        top_actions,
    })
}

//! The Monte-Carlo Tree Search engine
//!
//! One simulation runs selection (UCB descent with virtual loss applied
//! along the path), progressive widening, expansion, evaluation (terminal
//! scoring or a shallow heuristic rollout), and backpropagation. The
//! sequential driver runs the loop inline; the parallel driver shares the
//! root across a rayon pool of symmetric workers, each with a PRNG stream
//! split deterministically from the engine seed and its worker index.
//!
//! The tree lives in a per-search arena and is torn down when the search
//! returns; callers receive the extracted statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use pineapple_engine::{EngineError, GameState, Row, Street};

use crate::action::{Action, Placement};
use crate::arena::Arena;
use crate::error::SolverError;
use crate::eval::StateEvaluator;
use crate::generator::ActionGenerator;
use crate::node::{ActionStats, Node};

/// Progress observer: `(simulations_completed, elapsed_seconds)`.
pub type ProgressFn = dyn Fn(u64, f64) + Send + Sync;

/// How often the progress callback fires, in simulations.
const PROGRESS_INTERVAL: u64 = 100;

/// Search configuration.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Wall-clock budget, used when `num_simulations` is unset.
    pub time_limit: Duration,
    /// Exact simulation budget; overrides the time limit when set.
    pub num_simulations: Option<u64>,
    /// UCB exploration constant.
    pub c_puct: f64,
    /// Worker thread count; 1 runs the sequential driver.
    pub num_threads: usize,
    /// Cap on street advances during a rollout.
    pub max_rollout_depth: u32,
    /// Amount a traversing worker subtracts from a node's reward (and
    /// adds to its visits) until it backpropagates.
    pub virtual_loss: f64,
    /// Enables progressive widening of the expansion frontier.
    pub progressive_widening: bool,
    /// Widening slope: allowed children grow with `pw_constant * sqrt(N)`.
    pub pw_constant: f64,
    /// Visit floor inside the widening formula.
    pub pw_threshold: u32,
}

impl Default for MctsConfig {
    fn default() -> MctsConfig {
        MctsConfig {
            time_limit: Duration::from_secs(30),
            num_simulations: None,
            c_puct: 1.4,
            num_threads: 1,
            max_rollout_depth: 20,
            virtual_loss: 1.0,
            progressive_widening: true,
            pw_constant: 1.5,
            pw_threshold: 10,
        }
    }
}

impl MctsConfig {
    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.time_limit <= Duration::ZERO {
            return Err(SolverError::BadConfiguration(
                "time_limit must be positive".into(),
            ));
        }
        if self.num_simulations == Some(0) {
            return Err(SolverError::BadConfiguration(
                "num_simulations must be positive".into(),
            ));
        }
        if !(1..=64).contains(&self.num_threads) {
            return Err(SolverError::BadConfiguration(format!(
                "num_threads must be in 1..=64, got {}",
                self.num_threads
            )));
        }
        if self.c_puct <= 0.0 {
            return Err(SolverError::BadConfiguration(
                "c_puct must be positive".into(),
            ));
        }
        if self.pw_constant <= 0.0 || self.pw_threshold == 0 {
            return Err(SolverError::BadConfiguration(
                "progressive widening constants must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Statistics extracted from a finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub best_action: Action,
    pub simulations: u64,
    pub elapsed: Duration,
    pub root_visits: u64,
    /// Per-root-action statistics, most visited first.
    pub actions: Vec<ActionStats>,
}

impl SearchReport {
    /// Mean reward of the chosen action's subtree.
    pub fn expected_score(&self) -> f64 {
        self.actions
            .iter()
            .find(|stats| stats.action == self.best_action)
            .map(|stats| stats.mean_reward)
            .unwrap_or(0.0)
    }
}

/// The search engine. Holds configuration and the shared stop flag; each
/// `search` call builds and tears down its own tree.
pub struct MctsEngine {
    config: MctsConfig,
    evaluator: StateEvaluator,
    generator: ActionGenerator,
    stop: Arc<AtomicBool>,
    progress: Option<Arc<ProgressFn>>,
}

impl MctsEngine {
    pub fn new(config: MctsConfig) -> MctsEngine {
        MctsEngine {
            config,
            evaluator: StateEvaluator::new(),
            generator: ActionGenerator::new(),
            stop: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Flag observed by workers at simulation boundaries. Raising it stops
    /// the search after in-flight simulations finish.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Install a progress observer, invoked about every 100 simulations.
    pub fn set_progress<F>(&mut self, callback: F)
    where
        F: Fn(u64, f64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    /// Run the search and return the extracted statistics.
    pub fn search(&self, state: &GameState) -> Result<SearchReport, SolverError> {
        self.config.validate()?;
        if state.is_complete() {
            return Err(SolverError::StateTerminal);
        }
        if state.current_hand().is_empty() {
            return Err(SolverError::Engine(EngineError::IllegalAction(
                "no dealt hand to place; deal a street first".into(),
            )));
        }

        let seed = state.seed().unwrap_or_else(rand::random);
        let start = Instant::now();
        let completed = AtomicU64::new(0);

        let arena = Arena::new();
        let root = arena.alloc(Node::new(state.clone(), None, None));

        if self.config.num_threads == 1 {
            let mut rng = worker_rng(seed, 0);
            while let Some(ticket) = self.claim_ticket(&completed, start) {
                self.simulate(&arena, root, &mut rng);
                self.report_progress(ticket + 1, start);
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .build()
                .map_err(|e| SolverError::BadConfiguration(e.to_string()))?;
            // broadcast blocks until every worker returns, so the tree is
            // quiescent when statistics are read below
            pool.broadcast(|ctx| {
                let mut rng = worker_rng(seed, ctx.index());
                while let Some(ticket) = self.claim_ticket(&completed, start) {
                    self.simulate(&arena, root, &mut rng);
                    self.report_progress(ticket + 1, start);
                }
            });
        }

        let simulations = completed.load(Ordering::Acquire);
        if simulations == 0 {
            return Err(SolverError::SearchCancelled);
        }
        let best_action = root.best_action().ok_or(SolverError::SearchCancelled)?;

        Ok(SearchReport {
            best_action,
            simulations,
            elapsed: start.elapsed(),
            root_visits: root.visits() as u64,
            actions: root.action_statistics(),
        })
    }

    /// Reserve the next simulation slot, or `None` when a stop condition
    /// fired. Reserving before running keeps the completed count exact
    /// under parallel workers.
    fn claim_ticket(&self, completed: &AtomicU64, start: Instant) -> Option<u64> {
        if self.stop.load(Ordering::Acquire) {
            return None;
        }
        match self.config.num_simulations {
            Some(target) => {
                let ticket = completed.fetch_add(1, Ordering::AcqRel);
                if ticket >= target {
                    completed.fetch_sub(1, Ordering::AcqRel);
                    None
                } else {
                    Some(ticket)
                }
            }
            None => {
                if start.elapsed() >= self.config.time_limit {
                    return None;
                }
                Some(completed.fetch_add(1, Ordering::AcqRel))
            }
        }
    }

    fn report_progress(&self, completed: u64, start: Instant) {
        if let Some(progress) = &self.progress {
            if completed % PROGRESS_INTERVAL == 0 {
                progress(completed, start.elapsed().as_secs_f64());
            }
        }
    }

    /// One simulation: descend, widen, expand, evaluate, backpropagate.
    fn simulate<'a>(
        &self,
        arena: &'a Arena<Node<'a>>,
        root: &'a Node<'a>,
        rng: &mut Xoshiro256PlusPlus,
    ) {
        let virtual_loss = self.config.virtual_loss;
        let mut path: Vec<&'a Node<'a>> = Vec::with_capacity(8);
        root.add_virtual_loss();
        path.push(root);

        let mut node = root;
        let leaf = loop {
            if node.is_terminal() {
                break node;
            }

            let mut table = node.table();
            if !table.generated {
                table.actions = self.generator.generate(node.state());
                table.generated = true;
            }

            let allowed = self
                .allowed_children(node.visits())
                .min(table.actions.len());

            if table.children.len() < allowed {
                // Expand the next candidate in priority order
                let action = table.actions[table.children.len()].clone();
                let mut next = node.state().clone();
                match action.apply(&mut next) {
                    Ok(()) => {
                        let child = arena.alloc(Node::new(next, Some(node), Some(action)));
                        table.children.push(child);
                        drop(table);
                        child.add_virtual_loss();
                        path.push(child);
                        break child;
                    }
                    Err(_) => {
                        // Candidates are generated legal; drop a rogue one
                        let frontier = table.children.len();
                        table.actions.remove(frontier);
                        continue;
                    }
                }
            }

            if table.children.is_empty() {
                // Non-terminal but no legal action: evaluate in place
                drop(table);
                break node;
            }
            drop(table);

            match node.select_child(self.config.c_puct, virtual_loss) {
                Some(child) => {
                    child.add_virtual_loss();
                    path.push(child);
                    node = child;
                }
                None => break node,
            }
        };

        let reward = if leaf.is_terminal() {
            self.evaluator.evaluate_final(leaf.state().arrangement())
        } else {
            self.rollout(leaf.state(), rng)
        };

        for traversed in path.iter().rev() {
            traversed.remove_virtual_loss();
            traversed.update(reward);
        }
    }

    /// Progressive widening: the number of children a node may have given
    /// its visit count. The threshold acts as a floor on the visit count
    /// inside the formula, so fresh nodes start from a small window.
    fn allowed_children(&self, visits: u32) -> usize {
        if !self.config.progressive_widening {
            return usize::MAX;
        }
        let n = visits.max(self.config.pw_threshold) as f64;
        ((self.config.pw_constant * n.sqrt()).floor() as usize).max(1)
    }

    /// Shallow heuristic playout: deal and place with a cheap fixed policy
    /// until the game completes or the depth cap is reached, then evaluate.
    fn rollout(&self, state: &GameState, rng: &mut Xoshiro256PlusPlus) -> f64 {
        let mut sim = state.clone();
        // Decouple the playout's deals from the node's own stream
        sim.reseed(rng.gen());

        let mut depth = 0;
        while !sim.is_complete() && depth < self.config.max_rollout_depth {
            if sim.current_hand().is_empty() && sim.deal_street().is_err() {
                break;
            }
            let Some(action) = rollout_policy(&sim) else {
                break;
            };
            if action.apply(&mut sim).is_err() {
                break;
            }
            depth += 1;
        }
        self.evaluator.evaluate(&sim)
    }
}

/// Thread-local PRNG stream, split from the engine seed by worker index.
fn worker_rng(seed: u64, worker: usize) -> Xoshiro256PlusPlus {
    let stream = seed ^ (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    Xoshiro256PlusPlus::seed_from_u64(stream)
}

/// The rollout policy: rank-sorted placement, no search.
///
/// Initial street: lowest two cards go front, the next two middle, the
/// highest back. Later streets: keep the two highest cards, discard the
/// lowest, and fill open slots preferring back, then middle, then front.
fn rollout_policy(state: &GameState) -> Option<Action> {
    let hand = state.current_hand();
    if hand.is_empty() {
        return None;
    }
    let open = state.valid_placements();

    let mut sorted = hand.to_vec();
    sorted.sort_by(|a, b| b.rank_value().cmp(&a.rank_value()));

    if state.street() == Street::Initial {
        if open.len() < 5 {
            return None;
        }
        let take = |row: Row, count: usize| -> Vec<(Row, usize)> {
            open.iter()
                .copied()
                .filter(|&(r, _)| r == row)
                .take(count)
                .collect()
        };
        let front = take(Row::Front, 2);
        let middle = take(Row::Middle, 2);
        let back = take(Row::Back, 1);
        if front.len() == 2 && middle.len() == 2 && back.len() == 1 {
            let placements = vec![
                Placement::new(sorted[4], front[0].0, front[0].1),
                Placement::new(sorted[3], front[1].0, front[1].1),
                Placement::new(sorted[2], middle[0].0, middle[0].1),
                Placement::new(sorted[1], middle[1].0, middle[1].1),
                Placement::new(sorted[0], back[0].0, back[0].1),
            ];
            return Some(Action::new(placements, None));
        }
        // Odd layouts fall back to slot order
        let placements: Vec<Placement> = sorted
            .iter()
            .zip(open.iter())
            .map(|(&card, &(row, idx))| Placement::new(card, row, idx))
            .collect();
        return (placements.len() == 5).then(|| Action::new(placements, None));
    }

    if open.len() < 2 || hand.len() != 3 {
        return None;
    }
    let keep = [sorted[0], sorted[1]];
    let discard = sorted[2];

    let mut preferred: Vec<(Row, usize)> = Vec::with_capacity(open.len());
    for row in [Row::Back, Row::Middle, Row::Front] {
        preferred.extend(open.iter().copied().filter(|&(r, _)| r == row));
    }
    let placements = vec![
        Placement::new(keep[0], preferred[0].0, preferred[0].1),
        Placement::new(keep[1], preferred[1].0, preferred[1].1),
    ];
    Some(Action::new(placements, Some(discard)))
}

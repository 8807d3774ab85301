//! Search tree nodes
//!
//! A node owns the game state it represents and its statistics. Children
//! live in the search arena and are referenced by priority order: the
//! child at position `i` was expanded from the candidate action at
//! position `i`, so the expansion frontier is just a length comparison
//! between the two vectors (progressive widening moves the allowed
//! frontier, the engine drives it).
//!
//! Scalars are atomics and the child table sits behind a per-node mutex,
//! so concurrent workers never take a tree-wide lock. Parent references
//! point upward only; the arena owns every node.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, MutexGuard};
use pineapple_engine::GameState;

use crate::action::Action;
use crate::atomic_float::AtomicF64;

/// Visit and reward statistics for one root action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStats {
    pub action: Action,
    pub visits: u64,
    pub mean_reward: f64,
}

/// Candidate actions and expanded children of one node.
pub(crate) struct ChildTable<'a> {
    /// Priority-ordered candidates from the action generator.
    pub actions: Vec<Action>,
    /// Expanded children; `children[i]` corresponds to `actions[i]`.
    pub children: Vec<&'a Node<'a>>,
    /// Whether `actions` has been generated yet.
    pub generated: bool,
}

/// One node of the search tree.
pub struct Node<'a> {
    parent: Option<&'a Node<'a>>,
    action: Option<Action>,
    state: GameState,
    terminal: bool,
    visits: AtomicU32,
    virtual_count: AtomicU32,
    reward_sum: AtomicF64,
    table: Mutex<ChildTable<'a>>,
}

impl<'a> Node<'a> {
    pub fn new(state: GameState, parent: Option<&'a Node<'a>>, action: Option<Action>) -> Node<'a> {
        let terminal = state.is_complete();
        Node {
            parent,
            action,
            state,
            terminal,
            visits: AtomicU32::new(0),
            virtual_count: AtomicU32::new(0),
            reward_sum: AtomicF64::new(0.0),
            table: Mutex::new(ChildTable {
                actions: Vec::new(),
                children: Vec::new(),
                generated: false,
            }),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn parent(&self) -> Option<&'a Node<'a>> {
        self.parent
    }

    /// The action that produced this node from its parent.
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Acquire)
    }

    pub fn reward_sum(&self) -> f64 {
        self.reward_sum.load(Ordering::Acquire)
    }

    pub fn mean_reward(&self) -> f64 {
        let visits = self.visits();
        if visits == 0 {
            0.0
        } else {
            self.reward_sum() / visits as f64
        }
    }

    pub(crate) fn table(&self) -> MutexGuard<'_, ChildTable<'a>> {
        self.table.lock()
    }

    /// Record one real visit. Backpropagation walks the path; this does
    /// not recurse.
    pub fn update(&self, reward: f64) {
        self.visits.fetch_add(1, Ordering::AcqRel);
        self.reward_sum.fetch_add(reward, Ordering::AcqRel);
    }

    /// Temporarily discourage concurrent workers from taking this node.
    pub fn add_virtual_loss(&self) {
        self.virtual_count.fetch_add(1, Ordering::AcqRel);
    }

    pub fn remove_virtual_loss(&self) {
        self.virtual_count.fetch_sub(1, Ordering::AcqRel);
    }

    /// Visits as seen by selection: real visits plus `virtual_loss` for
    /// each outstanding descent through this node.
    pub fn effective_visits(&self, virtual_loss: f64) -> f64 {
        self.visits() as f64 + self.virtual_count.load(Ordering::Acquire) as f64 * virtual_loss
    }

    /// Mean reward as seen by selection, with each outstanding virtual
    /// loss subtracting `virtual_loss` from the reward sum.
    fn effective_mean(&self, virtual_loss: f64) -> f64 {
        let n = self.effective_visits(virtual_loss);
        if n == 0.0 {
            return 0.0;
        }
        let penalized =
            self.reward_sum() - self.virtual_count.load(Ordering::Acquire) as f64 * virtual_loss;
        penalized / n
    }

    /// UCB1 value of this node as a child of a parent with `parent_visits`
    /// effective visits. Unvisited nodes score infinity.
    pub fn ucb(&self, parent_visits: f64, c: f64, virtual_loss: f64) -> f64 {
        let n = self.effective_visits(virtual_loss);
        if n == 0.0 {
            return f64::INFINITY;
        }
        let exploration = c * (parent_visits.max(1.0).ln() / n).sqrt();
        self.effective_mean(virtual_loss) + exploration
    }

    /// UCB-best expanded child, if any.
    pub fn select_child(&self, c: f64, virtual_loss: f64) -> Option<&'a Node<'a>> {
        let parent_visits = self.effective_visits(virtual_loss);
        let table = self.table();
        let mut best: Option<(&'a Node<'a>, f64)> = None;
        for &child in &table.children {
            let score = child.ucb(parent_visits, c, virtual_loss);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child, score)),
            }
        }
        best.map(|(child, _)| child)
    }

    /// The action whose child has the most visits; ties break toward the
    /// higher mean reward and then the smaller action.
    pub fn best_action(&self) -> Option<Action> {
        let table = self.table();
        let mut best: Option<(&'a Node<'a>, &Action)> = None;
        for (child, action) in table.children.iter().zip(table.actions.iter()) {
            let better = match best {
                None => true,
                Some((current, current_action)) => {
                    let lhs = (child.visits(), child.mean_reward());
                    let rhs = (current.visits(), current.mean_reward());
                    lhs.0 > rhs.0
                        || (lhs.0 == rhs.0 && lhs.1 > rhs.1)
                        || (lhs.0 == rhs.0 && lhs.1 == rhs.1 && action < current_action)
                }
            };
            if better {
                best = Some((*child, action));
            }
        }
        best.map(|(_, action)| action.clone())
    }

    /// Per-action statistics, most visited first.
    pub fn action_statistics(&self) -> Vec<ActionStats> {
        let table = self.table();
        let mut stats: Vec<ActionStats> = table
            .children
            .iter()
            .zip(table.actions.iter())
            .map(|(child, action)| ActionStats {
                action: action.clone(),
                visits: child.visits() as u64,
                mean_reward: child.mean_reward(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then_with(|| b.mean_reward.total_cmp(&a.mean_reward))
                .then_with(|| a.action.cmp(&b.action))
        });
        stats
    }
}

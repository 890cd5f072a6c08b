//! Adversarial game tree search
//!
//! One engine covers three modes that share move generation, simulation and
//! evaluation:
//!
//! * [`SearchMode::Minimax`] expands every move
//! * [`SearchMode::AlphaBeta`] threads an alpha-beta window and stops expanding
//!   siblings once `beta <= alpha`; it returns the same move and value as
//!   [`SearchMode::Minimax`] for an open root window
//! * [`SearchMode::Expectiminimax`] places a chance node after every choice,
//!   where the disc may drift into a neighbouring column (see [`DriftModel`])
//!
//! [`DriftModel`]: crate::config::DriftModel

use log::{debug, trace};

use std::fmt;
use std::time::Instant;

use crate::{
    board::{Board, Player},
    config::{SearchConfig, TerminalRule},
    tree::{Bounds, NodeId, NodeKind, SearchNode, SearchTree, TerminalKind, TreeMetadata},
    WIN_SCORE,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchMode {
    Minimax,
    AlphaBeta,
    Expectiminimax,
}

impl SearchMode {
    /// Name used in tree metadata
    pub fn algorithm(&self) -> &'static str {
        match self {
            SearchMode::Minimax => "minimax_no_pruning",
            SearchMode::AlphaBeta => "minimax_with_pruning",
            SearchMode::Expectiminimax => "expectiminimax",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.algorithm())
    }
}

/// Outcome of a top-level search
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// `None` only when the root offers no move to choose from
    pub best_move: Option<usize>,
    /// Backed-up (or expected) value from the perspective player's point of view
    pub value: f64,
    /// Nodes visited, pruned placeholders excluded
    pub node_count: usize,
    pub tree: Option<SearchTree>,
}

impl SearchResult {
    /// The searched move, or the first valid column of `board` when the search found none
    pub fn chosen_move(&self, board: &Board) -> Option<usize> {
        self.best_move.or_else(|| fallback_move(board))
    }
}

/// The first valid column, used when a search returns no move
pub fn fallback_move(board: &Board) -> Option<usize> {
    board.valid_moves().first().copied()
}

/// Searches `board` to `depth` plies with the default configuration for `mode`
///
/// `maximizing` tells whether the side to move is the maximizing player
/// ([`Player::One`] by default).
pub fn search(board: &Board, depth: u32, maximizing: bool, mode: SearchMode) -> SearchResult {
    Searcher::new(SearchConfig::new(mode)).search(board, depth, maximizing)
}

#[derive(Copy, Clone, Debug)]
struct Window {
    alpha: f64,
    beta: f64,
}

impl Window {
    fn open() -> Self {
        Self {
            alpha: f64::NEG_INFINITY,
            beta: f64::INFINITY,
        }
    }
}

/// How a node was reached from its parent
struct Edge {
    parent: Option<NodeId>,
    column: Option<usize>,
    probability: Option<f64>,
}

impl Edge {
    fn root() -> Self {
        Self {
            parent: None,
            column: None,
            probability: None,
        }
    }

    fn child(parent: Option<NodeId>, column: usize) -> Self {
        Self {
            parent,
            column: Some(column),
            probability: None,
        }
    }
}

/// A configured search engine
///
/// The board handed to [`Searcher::search`] is never modified: every
/// simulated move is played on a fresh copy, so sibling branches never see
/// each other's discs.
#[derive(Clone)]
pub struct Searcher {
    config: SearchConfig,

    /// The number of nodes visited by the last search (for diagnostics only)
    pub node_count: usize,
    tree: Option<SearchTree>,
}

impl Searcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            node_count: 0,
            tree: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches `board` to `depth` plies and returns the best move and its value
    pub fn search(&mut self, board: &Board, depth: u32, maximizing: bool) -> SearchResult {
        let start = Instant::now();
        self.node_count = 0;
        self.tree = if self.config.record_tree {
            Some(SearchTree::new())
        } else {
            None
        };

        debug!(
            "Starting {} search at depth {}, {} to move",
            self.config.mode,
            depth,
            self.disc(maximizing)
        );

        let window = Window {
            alpha: self.config.alpha,
            beta: self.config.beta,
        };
        let (best_move, value) = self.node(board, depth, maximizing, window, Edge::root());
        let elapsed = start.elapsed();

        debug!(
            "Search finished: best move {:?}, value {:.1}, {} nodes in {:.3}s",
            best_move,
            value,
            self.node_count,
            elapsed.as_secs_f64()
        );

        let metadata = TreeMetadata {
            algorithm: self.config.mode.algorithm().to_string(),
            max_depth: depth,
            total_nodes: 0,
            best_move,
            best_value: value,
            computation_time: elapsed.as_secs_f64(),
            current_turn: self.disc(maximizing).number(),
            board_width: board.width(),
            board_height: board.height(),
        };
        let tree = self.tree.take().map(|mut tree| {
            tree.set_metadata(TreeMetadata {
                total_nodes: tree.len(),
                ..metadata
            });
            tree
        });

        SearchResult {
            best_move,
            value,
            node_count: self.node_count,
            tree,
        }
    }

    /// The player whose disc is dropped by the side to move
    fn disc(&self, maximizing: bool) -> Player {
        if maximizing {
            self.config.perspective
        } else {
            self.config.perspective.other()
        }
    }

    fn evaluate(&self, board: &Board) -> f64 {
        self.config.weights.evaluate(board, self.config.perspective)
    }

    /// Returns the classification and value of a node where recursion stops
    fn cutoff(&self, board: &Board, depth: u32) -> Option<(TerminalKind, f64)> {
        if depth == 0 {
            return Some((TerminalKind::Leaf, self.evaluate(board)));
        }
        match self.config.terminal_rule {
            TerminalRule::ConnectFour => {
                if let Some(winner) = board.has_connect_four() {
                    let value = if winner == self.config.perspective {
                        WIN_SCORE
                    } else {
                        -WIN_SCORE
                    };
                    return Some((TerminalKind::Win, value));
                }
                if board.is_full() {
                    return Some((TerminalKind::Draw, 0.0));
                }
            }
            TerminalRule::AnyScore => {
                let (one, two) = board.score();
                if one > 0 || two > 0 {
                    return Some((TerminalKind::Win, self.evaluate(board)));
                }
                if board.is_full() {
                    return Some((TerminalKind::Draw, self.evaluate(board)));
                }
            }
        }
        None
    }

    /// Performs the search below a MAX or MIN node
    ///
    /// Returns the best move found here and its backed-up value
    fn node(
        &mut self,
        board: &Board,
        depth: u32,
        maximizing: bool,
        mut window: Window,
        edge: Edge,
    ) -> (Option<usize>, f64) {
        self.node_count += 1;

        let kind = if maximizing {
            NodeKind::Max { best_move: None }
        } else {
            NodeKind::Min { best_move: None }
        };
        let id = self.open(board, depth, kind, &edge);
        if self.config.mode == SearchMode::AlphaBeta {
            self.record(id, |node| {
                node.bounds = Some(Bounds {
                    alpha: window.alpha,
                    beta: window.beta,
                })
            });
        }

        if let Some((terminal_type, value)) = self.cutoff(board, depth) {
            self.record(id, |node| {
                node.kind = NodeKind::Terminal { terminal_type };
                node.value = Some(value);
            });
            return (None, value);
        }

        let disc = self.disc(maximizing);
        let moves = board.valid_moves();

        let mut best_move = None;
        let mut best_value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for (i, &column) in moves.iter().enumerate() {
            let value = match self.config.mode {
                SearchMode::Expectiminimax => self.chance(board, column, depth, maximizing, id),
                SearchMode::Minimax | SearchMode::AlphaBeta => {
                    let next = board.with_move(column, disc);
                    self.node(&next, depth - 1, !maximizing, window, Edge::child(id, column))
                        .1
                }
            };

            // ties keep the earlier column
            if (maximizing && value > best_value) || (!maximizing && value < best_value) {
                best_value = value;
                best_move = Some(column);
            }

            if self.config.mode == SearchMode::AlphaBeta {
                if maximizing {
                    window.alpha = window.alpha.max(best_value);
                } else {
                    window.beta = window.beta.min(best_value);
                }
                // the opponent will never let play reach this node, skip the remaining moves
                if window.beta <= window.alpha {
                    trace!(
                        "Cut-off at depth {} after column {}, pruning {:?}",
                        depth,
                        column,
                        &moves[i + 1..]
                    );
                    self.record_pruned(id, depth - 1, !maximizing, &moves[i + 1..], window);
                    break;
                }
            }
        }

        self.record(id, |node| {
            node.set_best_move(best_move);
            node.value = Some(best_value);
        });
        (best_move, best_value)
    }

    /// Expected value of the side to move aiming a disc at `column`
    fn chance(
        &mut self,
        board: &Board,
        column: usize,
        depth: u32,
        maximizing: bool,
        parent: Option<NodeId>,
    ) -> f64 {
        self.node_count += 1;
        let id = self.open(board, depth, NodeKind::Chance, &Edge::child(parent, column));

        let outcomes = self.config.drift.distribution(board, column);
        let value = if outcomes.is_empty() {
            trace!("No landing column survives for column {}, evaluating in place", column);
            self.evaluate(board)
        } else {
            let disc = self.disc(maximizing);
            let mut expected = 0.0;
            for (landing, probability) in outcomes {
                let next = board.with_move(landing, disc);
                let edge = Edge {
                    parent: id,
                    column: Some(landing),
                    probability: Some(probability),
                };
                let (_, value) = self.node(&next, depth - 1, !maximizing, Window::open(), edge);
                expected += probability * value;
            }
            expected
        };

        self.record(id, |node| node.value = Some(value));
        value
    }

    /// Adds a node to the tree when recording
    fn open(&mut self, board: &Board, depth: u32, kind: NodeKind, edge: &Edge) -> Option<NodeId> {
        let tree = self.tree.as_mut()?;
        let id = tree.open(edge.parent, depth, edge.column, kind);
        let node = tree.node_mut(id);
        node.board = Some(board.snapshot());
        node.probability = edge.probability;
        Some(id)
    }

    fn record<F: FnOnce(&mut SearchNode)>(&mut self, id: Option<NodeId>, update: F) {
        if let (Some(tree), Some(id)) = (self.tree.as_mut(), id) {
            update(tree.node_mut(id));
        }
    }

    /// Adds an unevaluated placeholder for every skipped sibling
    fn record_pruned(
        &mut self,
        parent: Option<NodeId>,
        depth: u32,
        maximizing: bool,
        columns: &[usize],
        window: Window,
    ) {
        let (tree, parent) = match (self.tree.as_mut(), parent) {
            (Some(tree), Some(parent)) => (tree, parent),
            _ => return,
        };
        for &column in columns {
            let kind = if maximizing {
                NodeKind::Max { best_move: None }
            } else {
                NodeKind::Min { best_move: None }
            };
            let id = tree.open(Some(parent), depth, Some(column), kind);
            let node = tree.node_mut(id);
            node.pruned = true;
            node.bounds = Some(Bounds {
                alpha: window.alpha,
                beta: window.beta,
            });
        }
    }
}

//! Game tree search for gravity-drop connection games such as 'Connect 4'
//!
//! A [`Searcher`] picks a column for the side to move with one of three
//! interchangeable algorithms: plain minimax, minimax with alpha-beta pruning,
//! or expectiminimax where a dropped disc may drift into a neighbouring column.
//! Positions at the search horizon are scored by a static heuristic, and every
//! visited node can optionally be captured in a [`SearchTree`] for inspection.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_search::{search, Board, SearchMode, WIN_SCORE};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = Board::from_moves(7, 6, "112233")?;
//! let result = search(&board, 2, true, SearchMode::AlphaBeta);
//!
//! assert_eq!(result.best_move, Some(3));
//! assert_eq!(result.value, WIN_SCORE);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod heuristic;

pub mod config;

pub mod search;

pub mod tree;

mod test;

pub use board::{Board, BoardError, Cell, Player};
pub use config::{DriftModel, SearchConfig, TerminalRule};
pub use heuristic::{evaluate, HeuristicWeights};
pub use search::{fallback_move, search, SearchMode, SearchResult, Searcher};
pub use tree::{NodeId, NodeKind, SearchNode, SearchTree, TerminalKind, TreeStats};

/// The width of the standard game board in tiles
pub const DEFAULT_WIDTH: usize = 7;

/// The height of the standard game board in tiles
pub const DEFAULT_HEIGHT: usize = 6;

/// The largest supported board side
pub const MAX_DIMENSION: usize = 16;

/// Number of aligned discs that make a win
pub const CONNECT: usize = 4;

/// Magnitude of a won position, larger than any heuristic sum
pub const WIN_SCORE: f64 = 1e9;

// the standard board must fit the dimension limit and hold a full alignment
const_assert!(DEFAULT_WIDTH <= MAX_DIMENSION && DEFAULT_HEIGHT <= MAX_DIMENSION);
const_assert!(DEFAULT_WIDTH >= CONNECT && DEFAULT_HEIGHT >= CONNECT);

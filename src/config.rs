//! Search configuration

use crate::{board::Board, heuristic::HeuristicWeights, search::SearchMode, Player};

/// How the engine decides that the game has ended at a node
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TerminalRule {
    /// Any run of four ends the game; wins are worth [`WIN_SCORE`](crate::WIN_SCORE)
    /// toward the winner and a full board is a draw worth 0
    ConnectFour,
    /// Either player's accumulating score being positive (or a full board) ends
    /// the game; terminal positions are valued by the heuristic evaluator
    AnyScore,
}

impl Default for TerminalRule {
    fn default() -> Self {
        TerminalRule::ConnectFour
    }
}

/// Where a disc lands relative to the column it was aimed at
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriftModel {
    pub center: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for DriftModel {
    fn default() -> Self {
        Self {
            center: 0.6,
            left: 0.2,
            right: 0.2,
        }
    }
}

impl DriftModel {
    pub fn new(center: f64, left: f64, right: f64) -> Self {
        Self {
            center,
            left,
            right,
        }
    }

    /// Landing columns for a disc aimed at `column` and their probabilities
    ///
    /// Off-board and full targets are dropped and the remaining weights are
    /// renormalised to sum to one. Returns an empty list when no probability
    /// mass survives. Outcomes are ordered aimed, left, right.
    pub fn distribution(&self, board: &Board, column: usize) -> Vec<(usize, f64)> {
        let mut targets = vec![(Some(column), self.center)];
        targets.push((column.checked_sub(1), self.left));
        targets.push((Some(column + 1), self.right));

        let surviving: Vec<(usize, f64)> = targets
            .into_iter()
            .filter_map(|(target, weight)| match target {
                Some(target) if board.playable(target) && weight > 0.0 => Some((target, weight)),
                _ => None,
            })
            .collect();

        let total: f64 = surviving.iter().map(|(_, weight)| weight).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        surviving
            .into_iter()
            .map(|(target, weight)| (target, weight / total))
            .collect()
    }
}

/// Everything that parametrises a [`Searcher`](crate::search::Searcher)
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// The maximizing side; values are positive when they favour this player
    pub perspective: Player,
    pub terminal_rule: TerminalRule,
    /// Chance model, only used by [`SearchMode::Expectiminimax`]
    pub drift: DriftModel,
    pub weights: HeuristicWeights,
    /// Initial alpha bound, only used by [`SearchMode::AlphaBeta`]
    pub alpha: f64,
    /// Initial beta bound, only used by [`SearchMode::AlphaBeta`]
    pub beta: f64,
    /// Keep every visited node in a [`SearchTree`](crate::tree::SearchTree)
    pub record_tree: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::AlphaBeta,
            perspective: Player::One,
            terminal_rule: TerminalRule::default(),
            drift: DriftModel::default(),
            weights: HeuristicWeights::default(),
            alpha: f64::NEG_INFINITY,
            beta: f64::INFINITY,
            record_tree: false,
        }
    }
}

impl SearchConfig {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_perspective(mut self, perspective: Player) -> Self {
        self.perspective = perspective;
        self
    }

    pub fn with_terminal_rule(mut self, terminal_rule: TerminalRule) -> Self {
        self.terminal_rule = terminal_rule;
        self
    }

    pub fn with_drift(mut self, drift: DriftModel) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_window(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn recording(mut self) -> Self {
        self.record_tree = true;
        self
    }
}

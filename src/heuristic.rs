//! Static position evaluation used at the search horizon
//!
//! The score is the sum of three independent terms, each signed `+1` for
//! discs (or windows) favouring the perspective player and `-1` for the
//! opponent:
//!
//! * a center term: a bell-shaped falloff from the board's geometric center,
//!   normalised by the board's half diagonal, plus a smaller Manhattan term
//! * a cluster term: the squared length of same-player runs reachable ahead
//!   of every disc, scaled down on larger boards
//! * a window term: every on-board window of [`CONNECT`] cells is classified
//!   by its disc counts (wins, open threes, even-row threes, open twos)

use crate::{
    board::{Board, Player, DIRECTIONS},
    CONNECT,
};

/// Tunable constants of the evaluator
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeuristicWeights {
    /// Peak of the bell-shaped center falloff
    pub center: f64,
    /// Weight of the Manhattan distance to the center
    pub manhattan: f64,
    /// Scale of the squared cluster run length
    pub cluster: f64,
    /// Bonus for a completed window
    pub window_win: f64,
    /// Bonus for three discs and one empty cell
    pub three: f64,
    /// Extra bonus when the missing cell of a three sits on an odd row
    pub parity: f64,
    /// Bonus for two discs and two empty cells
    pub two: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            center: 4.0,
            manhattan: 1.0,
            cluster: 2.0,
            window_win: 100_000.0,
            three: 50.0,
            parity: 20.0,
            two: 5.0,
        }
    }
}

/// Evaluates `board` for `perspective` with the default weights
pub fn evaluate(board: &Board, perspective: Player) -> f64 {
    HeuristicWeights::default().evaluate(board, perspective)
}

impl HeuristicWeights {
    pub fn evaluate(&self, board: &Board, perspective: Player) -> f64 {
        self.center_term(board, perspective)
            + self.cluster_term(board, perspective)
            + self.window_term(board, perspective)
    }

    fn sign(owner: Player, perspective: Player) -> f64 {
        if owner == perspective {
            1.0
        } else {
            -1.0
        }
    }

    pub fn center_term(&self, board: &Board, perspective: Player) -> f64 {
        let (width, height) = (board.width() as f64, board.height() as f64);
        let center_x = (width - 1.0) / 2.0;
        let center_y = (height - 1.0) / 2.0;
        let half_diagonal_sq = (width * width + height * height) / 4.0;
        let max_manhattan = center_x + center_y;

        let mut score = 0.0;
        for column in 0..board.width() {
            for row in 0..board.column_height(column) {
                let owner = match board.get(column, row).owner() {
                    Some(owner) => owner,
                    None => continue,
                };
                let dx = column as f64 - center_x;
                let dy = row as f64 - center_y;

                let bell = self.center * (-2.0 * (dx * dx + dy * dy) / half_diagonal_sq).exp();
                let manhattan = if max_manhattan > 0.0 {
                    self.manhattan * (1.0 - (dx.abs() + dy.abs()) / max_manhattan)
                } else {
                    self.manhattan
                };
                score += Self::sign(owner, perspective) * (bell + manhattan);
            }
        }
        score
    }

    pub fn cluster_term(&self, board: &Board, perspective: Player) -> f64 {
        let normaliser = (board.width().max(board.height()) as f64).sqrt();

        let mut score = 0.0;
        for column in 0..board.width() {
            for row in 0..board.column_height(column) {
                let cell = board.get(column, row);
                let owner = match cell.owner() {
                    Some(owner) => owner,
                    None => continue,
                };
                for &(dc, dr) in DIRECTIONS.iter() {
                    // neighbours ahead of the disc, excluding the disc itself
                    let mut run = 0;
                    let (mut x, mut y) = (column as i32 + dc, row as i32 + dr);
                    while board.cell_at(x, y) == Some(cell) {
                        run += 1;
                        x += dc;
                        y += dr;
                    }
                    let run = run as f64;
                    score += Self::sign(owner, perspective) * self.cluster * run * run / normaliser;
                }
            }
        }
        score
    }

    pub fn window_term(&self, board: &Board, perspective: Player) -> f64 {
        let span = CONNECT as i32 - 1;
        let own_cell = perspective.cell();
        let opp_cell = perspective.other().cell();

        let mut score = 0.0;
        for column in 0..board.width() as i32 {
            for row in 0..board.height() as i32 {
                for &(dc, dr) in DIRECTIONS.iter() {
                    // the whole window must lie on the board
                    if board.cell_at(column + span * dc, row + span * dr).is_none() {
                        continue;
                    }
                    let (mut own, mut opp, mut empty) = (0, 0, 0);
                    let mut empty_row = 0;
                    for i in 0..CONNECT as i32 {
                        match board.cell_at(column + i * dc, row + i * dr) {
                            Some(c) if c == own_cell => own += 1,
                            Some(c) if c == opp_cell => opp += 1,
                            _ => {
                                empty += 1;
                                empty_row = row + i * dr;
                            }
                        }
                    }
                    score += self.score_window(own, opp, empty, empty_row);
                }
            }
        }
        score
    }

    fn score_window(&self, own: usize, opp: usize, empty: usize, empty_row: i32) -> f64 {
        let three = |sign: f64| {
            let parity = if empty_row % 2 == 1 { self.parity } else { 0.0 };
            sign * (self.three + parity)
        };
        if own == CONNECT {
            self.window_win
        } else if opp == CONNECT {
            -self.window_win
        } else if own == CONNECT - 1 && empty == 1 {
            three(1.0)
        } else if opp == CONNECT - 1 && empty == 1 {
            three(-1.0)
        } else if own == CONNECT - 2 && empty == 2 {
            self.two
        } else if opp == CONNECT - 2 && empty == 2 {
            -self.two
        } else {
            0.0
        }
    }
}

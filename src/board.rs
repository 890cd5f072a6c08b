//! Grid state, gravity placement and run-length scoring

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use std::fmt;

use crate::{CONNECT, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION};

/// Step vectors for horizontal, vertical and the two diagonal alignments
pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }

    /// 1 for the first player, 2 for the second
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Cell {
    PlayerOne,
    PlayerTwo,
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(&self) -> Option<Player> {
        match self {
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
            Cell::Empty => None,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Cell::PlayerOne => '1',
            Cell::PlayerTwo => '2',
            Cell::Empty => '0',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("column {column} out of range, board has {width} columns")]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("invalid board dimensions {width}x{height}, both must be between 1 and {max}", max = MAX_DIMENSION)]
    InvalidDimensions { width: usize, height: usize },

    #[error("could not parse '{0}' as a valid move")]
    InvalidMove(char),

    #[error("invalid position, game is over")]
    GameOver,
}

/// A `width` x `height` connection board
///
/// Cells are stored left-to-right, bottom-to-top, so row 0 is the bottom row
/// and discs in a column always occupy rows `0..column_height`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    heights: Vec<usize>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
            heights: vec![0; width],
        })
    }

    /// Builds a position from a string of 1-indexed column digits, players alternating
    /// and starting with [`Player::One`]
    pub fn from_moves<S: AsRef<str>>(width: usize, height: usize, moves: S) -> Result<Self, BoardError> {
        let mut board = Self::new(width, height)?;
        let mut player = Player::One;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column >= 1 && column <= width => {
                    // abort if the position was already won
                    if board.has_connect_four().is_some() {
                        return Err(BoardError::GameOver);
                    }
                    board.play(column - 1, player)?;
                    player = player.other();
                }
                _ => return Err(BoardError::InvalidMove(column_char)),
            }
        }
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, column: usize, row: usize) -> Cell {
        self.cells[column + self.width * row]
    }

    /// The cell at signed coordinates, `None` when off-board
    pub fn cell_at(&self, column: i32, row: i32) -> Option<Cell> {
        if column < 0 || row < 0 || column >= self.width as i32 || row >= self.height as i32 {
            None
        } else {
            Some(self.get(column as usize, row as usize))
        }
    }

    pub fn column_height(&self, column: usize) -> usize {
        self.heights[column]
    }

    pub fn num_moves(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Whether a disc can be dropped in `column`; off-board columns are never playable
    pub fn playable(&self, column: usize) -> bool {
        column < self.width && self.heights[column] < self.height
    }

    /// Playable columns in ascending order
    pub fn valid_moves(&self) -> Vec<usize> {
        (0..self.width).filter(|&column| self.playable(column)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h == self.height)
    }

    /// The side to move, derived from the number of discs of each player
    pub fn to_move(&self) -> Player {
        let ones = self.cells.iter().filter(|c| **c == Cell::PlayerOne).count();
        let twos = self.cells.iter().filter(|c| **c == Cell::PlayerTwo).count();
        if ones > twos {
            Player::Two
        } else {
            Player::One
        }
    }

    fn check_column(&self, column: usize) -> Result<(), BoardError> {
        if column >= self.width {
            return Err(BoardError::ColumnOutOfRange {
                column,
                width: self.width,
            });
        }
        if self.heights[column] >= self.height {
            return Err(BoardError::ColumnFull(column));
        }
        Ok(())
    }

    /// Places a disc in the lowest empty row of `column`, returning that row
    pub fn play(&mut self, column: usize, player: Player) -> Result<usize, BoardError> {
        self.check_column(column)?;
        Ok(self.place(column, player))
    }

    /// Returns a copy of this board with a disc dropped in `column`, leaving `self` untouched
    pub fn drop(&self, column: usize, player: Player) -> Result<Board, BoardError> {
        self.check_column(column)?;
        Ok(self.with_move(column, player))
    }

    /// Copy-then-place for columns already known to be playable
    pub(crate) fn with_move(&self, column: usize, player: Player) -> Board {
        debug_assert!(self.playable(column));
        let mut next = self.clone();
        next.place(column, player);
        next
    }

    fn place(&mut self, column: usize, player: Player) -> usize {
        let row = self.heights[column];
        self.cells[column + self.width * row] = player.cell();
        self.heights[column] += 1;
        row
    }

    /// Length of the same-owner run starting at (`column`, `row`) and walking along (`dc`, `dr`)
    fn run_length(&self, column: usize, row: usize, (dc, dr): (i32, i32)) -> usize {
        let owner = self.get(column, row);
        let mut length = 0;
        let (mut x, mut y) = (column as i32, row as i32);
        while self.cell_at(x, y) == Some(owner) {
            length += 1;
            x += dc;
            y += dr;
        }
        length
    }

    /// Lengths and owners of every maximal run, one entry per run and direction
    fn runs(&self) -> impl Iterator<Item = (Player, usize)> + '_ {
        (0..self.width)
            .flat_map(move |column| (0..self.height).map(move |row| (column, row)))
            .flat_map(move |(column, row)| {
                DIRECTIONS.iter().filter_map(move |&(dc, dr)| {
                    let owner = self.get(column, row).owner()?;
                    // only count from the start of a run
                    let previous = self.cell_at(column as i32 - dc, row as i32 - dr);
                    if previous == Some(owner.cell()) {
                        return None;
                    }
                    Some((owner, self.run_length(column, row, (dc, dr))))
                })
            })
    }

    /// Accumulating run-length score `(player one, player two)`
    ///
    /// Every maximal run of length `L` contributes `L - 3` (when positive) to its
    /// owner, so a run of five scores two.
    pub fn score(&self) -> (usize, usize) {
        let mut score = (0, 0);
        for (owner, length) in self.runs() {
            let increment = length.saturating_sub(CONNECT - 1);
            match owner {
                Player::One => score.0 += increment,
                Player::Two => score.1 += increment,
            }
        }
        score
    }

    /// The owner of the first run of four or more found, scanning columns left to right
    pub fn has_connect_four(&self) -> Option<Player> {
        self.runs()
            .find(|&(_, length)| length >= CONNECT)
            .map(|(owner, _)| owner)
    }

    /// Rows from top to bottom as `0`/`1`/`2` digits, one line per row
    pub fn snapshot(&self) -> String {
        (0..self.height)
            .rev()
            .map(|row| {
                (0..self.width)
                    .map(|column| self.get(column, row).symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Random legal history of at most `plies` moves that never completes a connect-four
    pub fn random_playout<R: Rng>(
        width: usize,
        height: usize,
        plies: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new(width, height)?;
        let mut player = Player::One;
        for _ in 0..plies {
            let mut moves = board.valid_moves();
            moves.shuffle(rng);
            let next = moves
                .into_iter()
                .map(|column| board.with_move(column, player))
                .find(|next| next.has_connect_four().is_none());
            match next {
                Some(next) => board = next,
                None => break,
            }
            player = player.other();
        }
        Ok(board)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            cells: vec![Cell::Empty; DEFAULT_WIDTH * DEFAULT_HEIGHT],
            heights: vec![0; DEFAULT_WIDTH],
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: String = (1..=self.width).map(|x| format!("{:>2}", x % 10)).collect();
        writeln!(f, "{}", columns)?;
        for row in (0..self.height).rev() {
            let line: String = (0..self.width)
                .map(|column| match self.get(column, row) {
                    Cell::PlayerOne => " X",
                    Cell::PlayerTwo => " O",
                    Cell::Empty => " .",
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

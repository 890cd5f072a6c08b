use clap::{ArgEnum, Parser, Subcommand};

use connect4_search::{SearchMode, TerminalRule, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Pick moves in gravity-drop connection games with game tree search
#[derive(Parser)]
pub struct Args {
    /// Log verbosity, repeat for more detail
    #[clap(short, long, parse(from_occurrences), global = true)]
    pub verbose: usize,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search one position and print the chosen column
    Analyse(AnalyseArgs),
    /// Compare minimax and alpha-beta on random positions
    Bench(BenchArgs),
}

#[derive(clap::Args)]
pub struct AnalyseArgs {
    /// Moves played so far as 1-indexed column digits, e.g. 4453
    #[clap(long, default_value = "")]
    pub moves: String,
    #[clap(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,
    #[clap(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: usize,
    /// Search depth in plies
    #[clap(short, long, default_value_t = 4)]
    pub depth: u32,
    #[clap(short, long, arg_enum, default_value = "alpha-beta")]
    pub mode: Mode,
    #[clap(short, long, arg_enum, default_value = "connect-four")]
    pub terminal: Terminal,
    /// Print node counts of the search tree
    #[clap(long)]
    pub stats: bool,
    /// Print the search tree as an indented outline
    #[clap(long)]
    pub outline: bool,
    /// Print the board of every searched node
    #[clap(long)]
    pub boards: bool,
    /// Print only the search tree as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct BenchArgs {
    /// Number of random positions
    #[clap(short, long, default_value_t = 200)]
    pub positions: usize,
    /// Random plies played to reach each position
    #[clap(long, default_value_t = 12)]
    pub plies: usize,
    #[clap(short, long, default_value_t = 4)]
    pub depth: u32,
    #[clap(short, long, default_value_t = 0)]
    pub seed: u64,
    #[clap(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,
    #[clap(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: usize,
}

#[derive(ArgEnum, Copy, Clone, Debug)]
pub enum Mode {
    Minimax,
    AlphaBeta,
    Expectiminimax,
}

impl From<Mode> for SearchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Minimax => SearchMode::Minimax,
            Mode::AlphaBeta => SearchMode::AlphaBeta,
            Mode::Expectiminimax => SearchMode::Expectiminimax,
        }
    }
}

#[derive(ArgEnum, Copy, Clone, Debug)]
pub enum Terminal {
    ConnectFour,
    AnyScore,
}

impl From<Terminal> for TerminalRule {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::ConnectFour => TerminalRule::ConnectFour,
            Terminal::AnyScore => TerminalRule::AnyScore,
        }
    }
}

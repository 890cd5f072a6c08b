use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use std::time::Instant;

use connect4_search::*;

mod cli;
use cli::*;

fn main() -> Result<()> {
    let args = Args::parse();

    simple_logging::log_to_stderr(match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });

    match args.command {
        Command::Analyse(args) => analyse(args),
        Command::Bench(args) => bench(args),
    }
}

fn analyse(args: AnalyseArgs) -> Result<()> {
    let board = Board::from_moves(args.width, args.height, &args.moves)?;
    let to_move = board.to_move();
    info!("Analysing {}x{} position '{}'", board.width(), board.height(), args.moves);

    let mut config = SearchConfig::new(args.mode.into()).with_terminal_rule(args.terminal.into());
    if args.stats || args.outline || args.boards || args.json {
        config = config.recording();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(&format!("Searching {} plies ({})", args.depth, config.mode));
    spinner.enable_steady_tick(100);
    // the default perspective maximizes for player one
    let result = Searcher::new(config).search(&board, args.depth, to_move == Player::One);
    spinner.finish_and_clear();

    if args.json {
        let tree = result
            .tree
            .as_ref()
            .ok_or_else(|| anyhow!("search did not record a tree"))?;
        println!("{}", tree.to_json()?);
        return Ok(());
    }

    print!("{}", board);
    match (result.best_move, result.chosen_move(&board)) {
        (Some(column), _) => println!("{} plays column {}", to_move, column + 1),
        (None, Some(column)) => println!(
            "Search found no move, {} falls back to column {}",
            to_move,
            column + 1
        ),
        (None, None) => println!("No legal move"),
    }
    println!("Value: {:.1}, nodes searched: {}", result.value, result.node_count);

    if let Some(tree) = &result.tree {
        if args.stats {
            let stats = tree.stats();
            println!("Tree statistics:");
            println!("  Total nodes explored: {}", stats.total);
            println!("  MAX nodes: {}", stats.max_nodes);
            println!("  MIN nodes: {}", stats.min_nodes);
            println!("  Chance nodes: {}", stats.chance_nodes);
            println!("  Terminal nodes: {}", stats.terminal);
            println!("  Pruned branches: {}", stats.pruned);
            for (depth, count) in stats.nodes_by_depth.iter().rev() {
                println!("    Depth {}: {} nodes", depth, count);
            }
        }
        if args.outline {
            print!("{}", tree.outline());
        }
        if args.boards {
            for view in tree.board_views() {
                let column = view.column.map_or("ROOT".to_string(), |c| (c + 1).to_string());
                println!("#{} depth {} move {}\n{}\n", view.id, view.depth, column, view.board);
            }
        }
    }
    Ok(())
}

struct Comparison {
    minimax_nodes: usize,
    alpha_beta_nodes: usize,
    agree: bool,
}

fn bench(args: BenchArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let positions = (0..args.positions)
        .map(|_| Board::random_playout(args.width, args.height, args.plies, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;

    let progress = ProgressBar::new(positions.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Comparing searches: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let start = Instant::now();
    let depth = args.depth;
    // positions are independent, each search itself stays single-threaded
    let comparisons: Vec<Comparison> = positions
        .par_iter()
        .map(|board| {
            let maximizing = board.to_move() == Player::One;
            let full = search(board, depth, maximizing, SearchMode::Minimax);
            let pruned = search(board, depth, maximizing, SearchMode::AlphaBeta);
            progress.inc(1);
            Comparison {
                minimax_nodes: full.node_count,
                alpha_beta_nodes: pruned.node_count,
                agree: full.best_move == pruned.best_move && full.value == pruned.value,
            }
        })
        .collect();
    progress.finish();

    let minimax_nodes: usize = comparisons.iter().map(|c| c.minimax_nodes).sum();
    let alpha_beta_nodes: usize = comparisons.iter().map(|c| c.alpha_beta_nodes).sum();
    let disagreements = comparisons.iter().filter(|c| !c.agree).count();

    println!(
        "{} positions at depth {} searched in {}",
        comparisons.len(),
        depth,
        HumanDuration(start.elapsed())
    );
    println!("Minimax nodes: {}", minimax_nodes);
    println!(
        "Alpha-beta nodes: {} ({:.1}% of minimax)",
        alpha_beta_nodes,
        100.0 * alpha_beta_nodes as f64 / minimax_nodes.max(1) as f64
    );
    if disagreements > 0 {
        warn!("{} positions where alpha-beta disagreed with minimax", disagreements);
    }
    println!("Disagreements: {}", disagreements);
    Ok(())
}

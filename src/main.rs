use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use num_format::{Locale, ToFormattedString};

use mateinx::board::Side;
use mateinx::position::validate_start;
use mateinx::search::{SearchOptions, SearchOutcome, solve};
use mateinx::setup::{GameFile, build_position};

#[derive(Parser)]
#[command(
    name = "mateinx",
    version,
    about = "Proves or refutes a forced checkmate within a fixed number of moves"
)]
struct Cli {
    /// JSON game description to analyze
    input: PathBuf,

    /// Maximum number of full moves to explore (mate in N)
    #[arg(short = 'm', long = "moves", default_value_t = 2)]
    moves: u16,

    /// Search for all solutions instead of stopping at the first find
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Use the explicit-stack traversal instead of host recursion
    #[arg(long)]
    iterative: bool,

    /// Skip re-expanding positions already explored at a shallower depth
    #[arg(long)]
    memoize: bool,

    /// Disable survivor pruning (slower; the winning moves do not change)
    #[arg(long = "no-trim")]
    no_trim: bool,

    /// Abort the search after expanding this many positions
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Show attack footprint counts on board squares
    #[arg(short = 'c', long = "show-attacks")]
    show_attacks: bool,

    /// Echo the parsed json description
    #[arg(short = 'j', long = "show-json")]
    show_json: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    log_panics::init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
    if let Err(e) = result {
        eprintln!("failed to initialize logging: {e}");
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    banner();

    let text = fs::read_to_string(&cli.input)
        .map_err(|e| format!("cannot read '{}': {e}", cli.input.display()))?;
    let file: GameFile = serde_json::from_str(&text)
        .map_err(|e| format!("cannot parse '{}' as a game description: {e}", cli.input.display()))?;
    let setup = file.game;

    println!("Starting game (json input): {}", cli.input.display());
    if cli.show_json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            println!("{}\n", serde_json::to_string_pretty(&value).unwrap_or(text.clone()));
        }
    }

    let mut position = match build_position(&setup) {
        Ok(pos) => pos,
        Err(report) => {
            println!("{report}");
            return Err(String::from("invalid game description, not searching"));
        }
    };

    if let Err(err) = validate_start(&mut position) {
        println!("{}", position.render());
        return Err(format!("{err}"));
    }

    println!("Initial game configuration is valid:");
    println!("{}", position.render());
    if cli.show_attacks {
        for side in [Side::White, Side::Black] {
            println!("\nAttack footprint for {side}:");
            println!("{}", position.attack_grid(side));
        }
    }

    if cli.moves == 0 {
        debug!("0 moves requested, validation only");
        return Ok(());
    }

    let options = SearchOptions {
        mate_in: cli.moves,
        find_all: cli.all,
        iterative: cli.iterative,
        memoize: cli.memoize,
        survivor_pruning: !cli.no_trim,
        max_nodes: cli.max_nodes,
    };
    info!(
        "searching for {} mate-in-{} solution(s), depth bound {} plies",
        if cli.all { "ALL" } else { "the first" },
        cli.moves,
        cli.moves * 2
    );

    let start = Instant::now();
    let outcome = solve(position, &options).map_err(|e| format!("search aborted: {e}"))?;
    let elapsed = start.elapsed();

    print_summary(&outcome, cli.moves);
    info!(
        "explored {} positions in {elapsed:#?} ({} expansion calls)",
        outcome.stats.nodes.to_formatted_string(&Locale::en),
        outcome.stats.calls.to_formatted_string(&Locale::en)
    );
    if outcome.stats.node_cap_hit {
        info!("stopped early: node cap of {} reached", cli.max_nodes.unwrap_or(0));
    }
    Ok(())
}

fn banner() {
    let bar = "=".repeat(48);
    println!("{bar}");
    println!("|      mateinx v{:<32}|", env!("CARGO_PKG_VERSION"));
    println!("{bar}");
}

fn print_summary(outcome: &SearchOutcome, moves: u16) {
    if outcome.has_solution() {
        println!("\nMate-in-{moves} tree of moves:");
        let (tree, nodes_in_solution) = outcome.render_winning_tree();
        print!("{tree}");
        println!("\nTotal number of nodes in solution: {nodes_in_solution}");
        println!(
            "Found {} first move(s) which can mate-in-{moves}:",
            outcome.first_move_count()
        );
        for token in outcome.winning_first_moves() {
            println!("    {token}");
        }
    } else {
        println!(
            "\nNo moves for {} found to mate-in-{moves}",
            outcome.arena[outcome.root].to_move
        );
    }

    println!("\nWins  found per depth: {:?}", outcome.stats.wins_per_depth);
    println!("Draws found per depth: {:?}", outcome.stats.draws_per_depth);
    println!(
        "Prunes: survivor {}, first-solution {}, revisit {}",
        outcome.stats.survivor_trims, outcome.stats.first_solution_trims, outcome.stats.revisit_skips
    );
    println!(
        "Total expansion calls: {}",
        outcome.stats.calls.to_formatted_string(&Locale::en)
    );
    println!(
        "Total games processed: {}",
        outcome.stats.nodes.to_formatted_string(&Locale::en)
    );
}

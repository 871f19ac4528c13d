use std::{path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;

use klotski_solver::{
    load, shortest_path, Goal, MoveMode, Outcome, Search, SearchConfig, State, N_LAYERS,
};

// Puzzle files hold the piece count, then one `shape x y` line per piece
// (1-based; 1 = 1x1, 2 = horizontal, 3 = vertical, 4 = 2x2), and may end
// with `goal piece x y`. See the puzzles/ directory.
#[derive(Parser, Debug)]
#[command(name = "klotski", about = "Breadth-first sliding block puzzle solver")]
struct Args {
    /// Puzzle description file
    puzzle: PathBuf,

    /// Let a piece slide two cells, straight or around a corner, as one move
    #[arg(long)]
    composite: bool,

    /// Move-count layers remembered by the visited set
    #[arg(long, default_value_t = N_LAYERS)]
    layers: usize,

    /// Piece that has to reach the target, numbered from 1 in file order
    #[arg(long, value_parser = parse_piece)]
    piece: Option<usize>,

    /// Target cell for that piece, as X,Y (1-based)
    #[arg(long, value_parser = parse_cell)]
    target: Option<(i32, i32)>,

    /// Give up after expanding this many states
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Remember every state instead of a window of layers
    #[arg(long)]
    exact: bool,
}

fn parse_cell(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: i32 = x.trim().parse().map_err(|e| format!("bad X: {e}"))?;
    let y: i32 = y.trim().parse().map_err(|e| format!("bad Y: {e}"))?;
    if x < 1 || y < 1 {
        return Err("coordinates start at 1".to_string());
    }
    Ok((x - 1, y - 1))
}

fn parse_piece(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("pieces are numbered from 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("bad piece: {e}")),
    }
}

fn goal_for(args: &Args, from_file: Option<Goal>) -> Goal {
    let mut goal = from_file.unwrap_or_default();
    if let Some(piece) = args.piece {
        goal.piece = piece - 1;
    }
    if let Some((x, y)) = args.target {
        goal.x = x;
        goal.y = y;
    }
    goal
}

fn print_solution<'a>(path: impl IntoIterator<Item = &'a State>) {
    let path: Vec<_> = path.into_iter().collect();
    println!("Found a solution in {} moves:", path.len() - 1);
    for (n, state) in path.iter().enumerate() {
        match state.last_move() {
            Some(mv) => println!("n={}: {}", n, mv),
            None => println!("n={}: start", n),
        }
        println!("{}", state.fingerprint(true));
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let puzzle = match load(&args.puzzle) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.puzzle.display());
            return ExitCode::from(2);
        }
    };

    let config = SearchConfig {
        goal: goal_for(&args, puzzle.goal),
        mode: if args.composite {
            MoveMode::Composite
        } else {
            MoveMode::Single
        },
        layers: args.layers,
        max_nodes: args.max_nodes,
    };

    println!("{}", puzzle.initial);
    println!("level =\n{}", puzzle.initial.fingerprint(true));
    let goal = config.goal;
    println!("goal: piece {} to {} {}", goal.piece + 1, goal.x + 1, goal.y + 1);
    println!("----");

    let started = Instant::now();
    if args.exact {
        match shortest_path(puzzle.initial, config.goal, config.mode) {
            Ok(Some(path)) => print_solution(path.iter().map(|s| &**s)),
            Ok(None) => println!("No solution found"),
            Err(e) => {
                eprintln!("Search failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let mut search = match Search::new(config) {
            Ok(search) => search,
            Err(e) => {
                eprintln!("Bad configuration: {e}");
                return ExitCode::from(2);
            }
        };

        match search.solve(puzzle.initial) {
            Ok(Outcome::Solved(state)) => {
                let mut path: Vec<&State> = state.ancestors().collect();
                path.reverse();
                print_solution(path);
            }
            Ok(Outcome::Exhausted) => println!("No solution found"),
            Ok(Outcome::BudgetExceeded) => println!(
                "Gave up after expanding {} states",
                search.stats().expanded
            ),
            Err(e) => {
                eprintln!("Search failed: {e}");
                return ExitCode::FAILURE;
            }
        }
        println!("{}", search.stats());
    }

    let elapsed = started.elapsed();
    println!("time: {:.3} ms", elapsed.as_secs_f64() * 1000.0);

    ExitCode::SUCCESS
}

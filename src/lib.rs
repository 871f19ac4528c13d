//! Breadth-first solver for sliding-block puzzles in the Klotski family:
//! rectangular pieces of four fixed shapes on a grid, one of which has to be
//! brought to a target cell.
//!
//! States share their pieces copy-on-write, are compared by an occupancy
//! fingerprint that ignores piece identity, and are remembered in a window
//! of the last few search layers only.

pub mod error;
pub mod exact;
pub mod load;
pub mod moves;
pub mod piece;
pub mod search;
pub mod state;
pub mod visited;

pub use error::{LoadError, SearchError};
pub use exact::shortest_path;
pub use load::{load, parse_puzzle, Puzzle};
pub use moves::{Direction, Move, MoveMode};
pub use piece::{Piece, Shape};
pub use search::{solve, Goal, Outcome, Search, SearchConfig, SearchStats};
pub use state::State;
pub use visited::{LayeredVisited, N_LAYERS};

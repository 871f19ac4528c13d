use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("out of memory while growing the frontier: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("goal piece {0} is not on the board")]
    UnknownPiece(usize),

    #[error("the visited set needs at least one layer")]
    NoLayers,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read puzzle: {0}")]
    Io(#[from] std::io::Error),

    #[error("puzzle has no piece count")]
    MissingCount,

    #[error("puzzle declares no pieces")]
    Empty,

    #[error("line {line}: cannot parse {text:?}")]
    Malformed { line: usize, text: String },

    #[error("line {line}: unknown shape type {shape}")]
    UnknownShape { line: usize, shape: i32 },

    #[error("line {line}: coordinates start at 1, got ({x}, {y})")]
    BadCoordinate { line: usize, x: i32, y: i32 },

    #[error("expected {expected} pieces, found {found}")]
    CountMismatch { expected: usize, found: usize },

    #[error("pieces {0} and {1} overlap")]
    Overlap(usize, usize),

    #[error("goal names piece {piece} but there are only {count} pieces")]
    BadGoal { piece: usize, count: usize },
}

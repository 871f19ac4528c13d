use std::{
    fmt::{self, Display},
    ops::Neg,
};

use smallvec::{smallvec, SmallVec};

/// Unit step directions, in the order successors are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    /// (dx, dy) with y growing downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Direction {
        self.opposite()
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        })
    }
}

pub type Steps = SmallVec<[Direction; 2]>;

/// Whether a single search step may slide a piece by one or two cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoveMode {
    #[default]
    Single,
    /// A second step in the same direction, or around a corner.
    Composite,
}

fn one(dir: Direction) -> Steps {
    smallvec![dir]
}

fn two(first: Direction, second: Direction) -> Steps {
    smallvec![first, second]
}

/// Every step sequence tried for each piece under `mode`.
///
/// Composite mode adds, after each single step, the same step again and the
/// two perpendicular steps. Going straight back is never generated.
#[auto_enums::auto_enum(Iterator)]
pub fn step_sequences(mode: MoveMode) -> impl Iterator<Item = Steps> {
    match mode {
        MoveMode::Single => Direction::ALL.into_iter().map(one),
        MoveMode::Composite => Direction::ALL.into_iter().flat_map(|first| {
            std::iter::once(one(first)).chain(
                Direction::ALL
                    .into_iter()
                    .filter(move |&second| {
                        second == first || second.is_horizontal() != first.is_horizontal()
                    })
                    .map(move |second| two(first, second)),
            )
        }),
    }
}

/// The move that produced a state: which piece slot, and how it slid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub slot: usize,
    pub steps: Steps,
}

impl Move {
    /// The move that undoes this one.
    pub fn reversed(&self) -> Move {
        Move {
            slot: self.slot,
            steps: self.steps.iter().rev().map(|d| -*d).collect(),
        }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "piece {}", self.slot + 1)?;
        for step in &self.steps {
            write!(f, " {}", step)?;
        }
        Ok(())
    }
}

use std::fmt::{self, Display};

use itertools::iproduct;

use crate::moves::Direction;

/// The fixed catalog of block shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Unit,
    // 1 high, 2 wide
    Horizontal,
    Vertical,
    Square,
}

impl Shape {
    pub const ALL: [Shape; 4] = [
        Shape::Unit,
        Shape::Horizontal,
        Shape::Vertical,
        Shape::Square,
    ];

    /// Looks up a shape by its 1-based catalog number, as used in puzzle files.
    pub fn from_catalog(n: i32) -> Option<Shape> {
        match n {
            1 => Some(Shape::Unit),
            2 => Some(Shape::Horizontal),
            3 => Some(Shape::Vertical),
            4 => Some(Shape::Square),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Unit => "1x1",
            Shape::Horizontal => "hori",
            Shape::Vertical => "vert",
            Shape::Square => "2x2",
        }
    }

    pub fn height(self) -> i32 {
        match self {
            Shape::Unit | Shape::Horizontal => 1,
            Shape::Vertical | Shape::Square => 2,
        }
    }

    pub fn width(self) -> i32 {
        match self {
            Shape::Unit | Shape::Vertical => 1,
            Shape::Horizontal | Shape::Square => 2,
        }
    }

    /// Cell marker used in shape-keyed fingerprints.
    pub fn tag(self) -> u8 {
        self.name().as_bytes()[0]
    }
}

/// A block on the grid. Pieces are shared between states behind an `Rc`
/// and only ever mutated through `Rc::make_mut`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    id: usize,
    shape: Shape,
    x: i32,
    y: i32,
}

impl Piece {
    pub fn new(id: usize, shape: Shape, x: i32, y: i32) -> Piece {
        Piece { id, shape, x, y }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    // exclusive
    pub fn right(&self) -> i32 {
        self.x + self.shape.width()
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.shape.height()
    }

    pub fn translate(&mut self, dir: Direction) {
        let (dx, dy) = dir.offset();
        self.x += dx;
        self.y += dy;
    }

    pub fn translated(&self, dir: Direction) -> Piece {
        let mut moved = *self;
        moved.translate(dir);
        moved
    }

    pub fn overlaps(&self, other: &Piece) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Occupied cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        iproduct!(self.y..self.bottom(), self.x..self.right()).map(|(y, x)| (x, y))
    }

    /// Cell marker used in identity-keyed fingerprints: the id as a base-36 digit.
    pub fn label(&self) -> u8 {
        // from_digit cannot fail for a value below the radix
        std::char::from_digit((self.id % 36) as u32, 36).map_or(b'?', |c| c as u8)
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based, like puzzle files
        write!(
            f,
            "{:>4}: {} {} | id={}",
            self.shape.name(),
            self.x + 1,
            self.y + 1,
            self.id
        )
    }
}

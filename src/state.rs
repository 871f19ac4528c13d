use std::{
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
    rc::Rc,
};

use itertools::Itertools;
use once_cell::unsync::OnceCell;

use crate::{
    moves::{Direction, Move},
    piece::Piece,
};

/// Display-only serial number of a state.
pub type StateId = usize;

/// Marker for unoccupied cells in fingerprints.
pub const EMPTY: u8 = b'.';

// bytes of the shape key that feed the hash digest
const HASH_SAMPLES: [usize; 4] = [0, 8, 12, 20];

/// One board configuration.
///
/// Pieces are shared with the parent and sibling states until moved.
/// Equality and hashing only look at the shape-keyed fingerprint, so two
/// states that put the same shapes on the same cells are the same node of the
/// search, whichever slot holds which piece.
pub struct State {
    id: StateId,
    pieces: Box<[Rc<Piece>]>,
    width: i32,
    height: i32,
    moves: u32,
    shape_key: OnceCell<String>,
    identity_key: OnceCell<String>,
    parent: Option<Rc<State>>,
    last_move: Option<Move>,
}

impl State {
    /// Builds an initial state; the board is the bounding box of the pieces,
    /// anchored at (0, 0). Piece origins must not be negative.
    pub fn new(id: StateId, pieces: Vec<Piece>) -> State {
        debug_assert!(
            pieces.iter().all(|p| p.x() >= 0 && p.y() >= 0),
            "piece off the board: {:?}",
            pieces.iter().find(|p| p.x() < 0 || p.y() < 0)
        );
        let width = pieces.iter().map(Piece::right).max().unwrap_or(0);
        let height = pieces.iter().map(Piece::bottom).max().unwrap_or(0);

        State {
            id,
            pieces: pieces.into_iter().map(Rc::new).collect(),
            width,
            height,
            moves: 0,
            shape_key: OnceCell::new(),
            identity_key: OnceCell::new(),
            parent: None,
            last_move: None,
        }
    }

    /// Same board, every slot sharing the same piece, no parent and no
    /// cached fingerprints.
    pub fn duplicate(&self, id: StateId) -> State {
        State {
            id,
            pieces: self.pieces.clone(),
            width: self.width,
            height: self.height,
            moves: self.moves,
            shape_key: OnceCell::new(),
            identity_key: OnceCell::new(),
            parent: None,
            last_move: None,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    // depth in the search tree
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pieces(&self) -> &[Rc<Piece>] {
        &self.pieces
    }

    pub fn piece(&self, slot: usize) -> Option<&Piece> {
        self.pieces.get(slot).map(|p| &**p)
    }

    /// Slot currently holding the piece with identity `id`.
    pub fn slot_of(&self, id: usize) -> Option<usize> {
        self.pieces.iter().position(|p| p.id() == id)
    }

    pub fn parent(&self) -> Option<&Rc<State>> {
        self.parent.as_ref()
    }

    /// The move that led here from the parent.
    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// This state, its parent, and so on back to the initial state.
    pub fn ancestors(&self) -> impl Iterator<Item = &State> {
        std::iter::successors(Some(self), |s| s.parent.as_deref())
    }

    /// Links this state under `parent` and shares it.
    pub fn into_child_of(mut self, parent: &Rc<State>) -> Rc<State> {
        self.parent = Some(Rc::clone(parent));
        Rc::new(self)
    }

    /// Whether the piece in `slot` can slide one cell towards `dir` without
    /// leaving the board or running into another piece.
    pub fn can_move(&self, slot: usize, dir: Direction) -> bool {
        let Some(piece) = self.pieces.get(slot) else {
            return false;
        };
        let moved = piece.translated(dir);

        moved.x() >= 0
            && moved.y() >= 0
            && moved.right() <= self.width
            && moved.bottom() <= self.height
            && self
                .pieces
                .iter()
                .enumerate()
                .all(|(i, other)| i == slot || !moved.overlaps(other))
    }

    /// Applies `steps` one after the other to the piece in `slot` on a fresh
    /// duplicate. Each step is checked against the partially moved board.
    /// Returns `None` as soon as a step is illegal; the duplicate is dropped.
    ///
    /// However many steps are given, the successor is one move deeper.
    pub fn moved(&self, slot: usize, steps: &[Direction], id: StateId) -> Option<State> {
        let mut next = self.duplicate(id);
        for &dir in steps {
            if !next.can_move(slot, dir) {
                return None;
            }
            // copies the piece only while it is still shared with `self`
            Rc::make_mut(&mut next.pieces[slot]).translate(dir);
        }

        next.moves += 1;
        next.last_move = Some(Move {
            slot,
            steps: steps.iter().copied().collect(),
        });
        Some(next)
    }

    /// The board as text: `height` rows of `width` cells, each row ending
    /// in `\n`. Cells hold the shape tag, or the piece label when
    /// `by_identity` is set. Computed once per state.
    pub fn fingerprint(&self, by_identity: bool) -> &str {
        if by_identity {
            self.identity_key.get_or_init(|| self.render(Piece::label))
        } else {
            self.shape_key
                .get_or_init(|| self.render(|p| p.shape().tag()))
        }
    }

    /// The fingerprint used for equality and hashing.
    pub fn shape_key(&self) -> &str {
        self.fingerprint(false)
    }

    fn render(&self, mark: impl Fn(&Piece) -> u8) -> String {
        let stride = self.width as usize + 1;
        let mut grid = vec![EMPTY; stride * self.height as usize];
        for row in grid.chunks_mut(stride) {
            row[stride - 1] = b'\n';
        }

        for piece in self.pieces.iter() {
            let cell = mark(piece.as_ref());
            for (x, y) in piece.cells() {
                grid[stride * y as usize + x as usize] = cell;
            }
        }

        grid.into_iter().map(char::from).collect()
    }

    /// Cheap digest of the shape key: a few sampled bytes packed together.
    /// Collisions are expected and settled by `Eq`.
    pub fn digest(&self) -> u32 {
        let key = self.shape_key().as_bytes();
        HASH_SAMPLES
            .iter()
            .enumerate()
            .map(|(i, &at)| u32::from(key.get(at).copied().unwrap_or(0)) << (8 * i))
            .fold(0, |acc, b| acc | b)
    }

    /// First pair of slots whose pieces overlap, if any.
    pub fn overlapping_pair(&self) -> Option<(usize, usize)> {
        (0..self.pieces.len())
            .tuple_combinations()
            .find(|&(a, b)| self.pieces[a].overlaps(&self.pieces[b]))
    }

    /// No piece off the board and no two pieces on the same cell.
    pub fn is_consistent(&self) -> bool {
        self.pieces.iter().all(|p| {
            p.x() >= 0 && p.y() >= 0 && p.right() <= self.width && p.bottom() <= self.height
        }) && self.overlapping_pair().is_none()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.shape_key() == other.shape_key()
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.digest());
    }
}

impl Drop for State {
    // unwinds the parent chain in a loop; a recursive drop of a long
    // solution path would run out of stack
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(rc) = parent {
            parent = match Rc::try_unwrap(rc) {
                Ok(mut state) => state.parent.take(),
                Err(_) => None,
            };
        }
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("moves", &self.moves)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pieces", &self.pieces)
            .finish()
    }
}

impl Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state[{}] = {{ id={}", self.pieces.len(), self.id)?;
        writeln!(f, "  w={}, h={}", self.width, self.height)?;
        writeln!(f, "  n_moves={}", self.moves)?;
        for piece in self.pieces.iter() {
            writeln!(f, "  {}", piece)?;
        }
        write!(f, "}}")
    }
}

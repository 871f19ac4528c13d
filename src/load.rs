use std::{fs, path::Path, str::FromStr};

use itertools::Itertools;
use log::debug;

use crate::{
    error::LoadError,
    piece::{Piece, Shape},
    search::Goal,
    state::State,
};

/// A loaded puzzle: the starting board and, if the file names one, its goal.
#[derive(Debug)]
pub struct Puzzle {
    pub initial: State,
    pub goal: Option<Goal>,
}

impl FromStr for Puzzle {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_puzzle(s)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Puzzle, LoadError> {
    fs::read_to_string(path)?.parse()
}

fn numbers(line: usize, text: &str) -> Result<Vec<i32>, LoadError> {
    text.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| LoadError::Malformed {
                line,
                text: text.to_string(),
            })
        })
        .collect()
}

// Format:
// the piece count on the first line,
// then one `shape x y` line per piece, 1-based,
// with shapes 1 = 1x1, 2 = horizontal 1x2, 3 = vertical 2x1, 4 = 2x2,
// and optionally `goal piece x y`, also 1-based.
//
// Lines that are blank, indented or start with '#' are skipped.
pub fn parse_puzzle(text: &str) -> Result<Puzzle, LoadError> {
    let mut count = None;
    let mut pieces = Vec::new();
    let mut goal = None;

    for (ix, raw) in text.lines().enumerate() {
        let line = ix + 1;
        if raw.is_empty() || raw.starts_with(char::is_whitespace) || raw.starts_with('#') {
            continue;
        }

        let malformed = || LoadError::Malformed {
            line,
            text: raw.to_string(),
        };

        if let Some(rest) = raw.strip_prefix("goal") {
            let (piece, x, y) = numbers(line, rest)?
                .into_iter()
                .collect_tuple()
                .ok_or_else(malformed)?;
            if piece < 1 || x < 1 || y < 1 {
                return Err(LoadError::BadCoordinate { line, x, y });
            }
            goal = Some(Goal::new(piece as usize - 1, x - 1, y - 1));
            continue;
        }

        let values = numbers(line, raw)?;
        if count.is_none() {
            match values.as_slice() {
                &[n] if n > 0 => count = Some(n as usize),
                &[_] => return Err(LoadError::Empty),
                _ => return Err(LoadError::MissingCount),
            }
            continue;
        }

        let (kind, x, y) = values.into_iter().collect_tuple().ok_or_else(malformed)?;
        if kind == 0 {
            // placeholder
            continue;
        }
        let shape = Shape::from_catalog(kind).ok_or(LoadError::UnknownShape { line, shape: kind })?;
        if x < 1 || y < 1 {
            return Err(LoadError::BadCoordinate { line, x, y });
        }

        pieces.push(Piece::new(pieces.len(), shape, x - 1, y - 1));
    }

    let expected = count.ok_or(LoadError::MissingCount)?;
    if pieces.len() != expected {
        return Err(LoadError::CountMismatch {
            expected,
            found: pieces.len(),
        });
    }

    if let Some(goal) = goal {
        if goal.piece >= pieces.len() {
            return Err(LoadError::BadGoal {
                piece: goal.piece + 1,
                count: pieces.len(),
            });
        }
    }

    let initial = State::new(0, pieces);
    if let Some((a, b)) = initial.overlapping_pair() {
        return Err(LoadError::Overlap(a + 1, b + 1));
    }

    debug!(
        "loaded {} pieces on a {}x{} board",
        initial.pieces().len(),
        initial.width(),
        initial.height()
    );
    Ok(Puzzle { initial, goal })
}

#[cfg(test)]
mod test {
    use super::*;

    const TEST_INPUT: &str = "
# classic layout
10
3 1 1
4 2 1
3 4 1
3 1 3
2 2 3
3 4 3
1 2 4
1 3 4
1 1 5
1 4 5
goal 2 2 4
";

    #[test]
    fn loads_classic_layout() {
        let puzzle: Puzzle = TEST_INPUT.parse().unwrap();
        let state = &puzzle.initial;

        assert_eq!(state.pieces().len(), 10);
        assert_eq!((state.width(), state.height()), (4, 5));
        assert_eq!(state.piece(1).unwrap().shape(), Shape::Square);
        assert_eq!(state.piece(1).unwrap().position(), (1, 0));
        assert_eq!(state.slot_of(4), Some(4));
        assert_eq!(puzzle.goal, Some(Goal::default()));
        assert_eq!(state.fingerprint(false), "v22v\nv22v\nvhhv\nv11v\n1..1\n");
    }

    #[test]
    fn skips_placeholders_and_indented_lines() {
        let puzzle = parse_puzzle("2\n  this is ignored\n0 5 5\n1 1 1\n\n1 2 1\n").unwrap();
        assert_eq!(puzzle.initial.pieces().len(), 2);
        assert_eq!(puzzle.goal, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse_puzzle(""), Err(LoadError::MissingCount)));
        assert!(matches!(parse_puzzle("0\n"), Err(LoadError::Empty)));
        assert!(matches!(parse_puzzle("1 2\n"), Err(LoadError::MissingCount)));
        assert!(matches!(
            parse_puzzle("1\n5 1 1\n"),
            Err(LoadError::UnknownShape { line: 2, shape: 5 })
        ));
        assert!(matches!(
            parse_puzzle("1\n1 0 1\n"),
            Err(LoadError::BadCoordinate { line: 2, .. })
        ));
        assert!(matches!(
            parse_puzzle("1\n1 x 1\n"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_puzzle("1\n1 1\n"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_puzzle("2\n1 1 1\n"),
            Err(LoadError::CountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse_puzzle("2\n4 1 1\n1 2 2\n"),
            Err(LoadError::Overlap(1, 2))
        ));
        assert!(matches!(
            parse_puzzle("1\n1 1 1\ngoal 2 1 1\n"),
            Err(LoadError::BadGoal { piece: 2, count: 1 })
        ));
    }

    #[test]
    fn sample_puzzles_load() {
        for name in ["classic", "mini", "corridor", "stuck"] {
            let path = format!("{}/puzzles/{}.txt", env!("CARGO_MANIFEST_DIR"), name);
            let puzzle = load(&path).unwrap();
            assert!(puzzle.goal.is_some(), "{}", name);
            assert!(puzzle.initial.is_consistent());
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load("/definitely/not/a/puzzle.txt"),
            Err(LoadError::Io(_))
        ));
    }
}

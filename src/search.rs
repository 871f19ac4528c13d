use std::{collections::VecDeque, fmt, rc::Rc};

use itertools::Itertools;
use log::{debug, info};

use crate::{
    error::SearchError,
    moves::{step_sequences, Direction, MoveMode, Steps},
    state::{State, StateId},
    visited::{LayeredVisited, N_LAYERS},
};

/// A piece (by identity) that has to reach a cell (0-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Goal {
    pub piece: usize,
    pub x: i32,
    pub y: i32,
}

impl Goal {
    pub fn new(piece: usize, x: i32, y: i32) -> Goal {
        Goal { piece, x, y }
    }

    /// `slot` is where the goal piece sits, as found by `State::slot_of`.
    pub fn is_met(&self, state: &State, slot: usize) -> bool {
        state
            .piece(slot)
            .map_or(false, |p| p.position() == (self.x, self.y))
    }
}

impl Default for Goal {
    // the big square of the classic layout, bottom centre
    fn default() -> Self {
        Goal::new(1, 1, 3)
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub goal: Goal,
    pub mode: MoveMode,
    /// Width of the visited window, in move-count layers.
    pub layers: usize,
    /// Stop after expanding this many states.
    pub max_nodes: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            goal: Goal::default(),
            mode: MoveMode::Single,
            layers: N_LAYERS,
            max_nodes: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: u64,
    pub generated: u64,
    // successors the window had already seen
    pub duplicates: u64,
    pub peak_frontier: usize,
    pub depth: u32,
    pub layers_advanced: u64,
    /// State ids handed out, legal or not.
    pub states_created: usize,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expanded {} states, generated {} ({} duplicates), peak frontier {}, depth {}, n states={}",
            self.expanded,
            self.generated,
            self.duplicates,
            self.peak_frontier,
            self.depth,
            self.states_created
        )
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// The goal state; its ancestors are the solution path.
    Solved(Rc<State>),
    /// The frontier ran dry. With a narrow window this is not a proof that
    /// the puzzle has no solution.
    Exhausted,
    BudgetExceeded,
}

impl Outcome {
    pub fn solution(&self) -> Option<&Rc<State>> {
        match self {
            Outcome::Solved(state) => Some(state),
            _ => None,
        }
    }
}

/// Everything one breadth-first search owns: configuration, the visited
/// window, the id counter and statistics. Independent searches share nothing.
pub struct Search {
    config: SearchConfig,
    visited: LayeredVisited,
    next_id: StateId,
    stats: SearchStats,
}

impl Search {
    pub fn new(config: SearchConfig) -> Result<Search, SearchError> {
        if config.layers == 0 {
            return Err(SearchError::NoLayers);
        }

        Ok(Search {
            visited: LayeredVisited::new(config.layers),
            config,
            next_id: 0,
            stats: SearchStats::default(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn visited(&self) -> &LayeredVisited {
        &self.visited
    }

    fn next_id(&mut self) -> StateId {
        let id = self.next_id;
        self.next_id += 1;
        self.stats.states_created = self.next_id;
        id
    }

    /// `state` with the piece in `slot` slid along `steps`, or `None` if
    /// any step is illegal.
    pub fn successor(&mut self, state: &State, slot: usize, steps: &[Direction]) -> Option<State> {
        let id = self.next_id();
        state.moved(slot, steps, id)
    }

    /// Breadth-first search from `initial` until the goal piece reaches
    /// its target cell or the frontier is empty.
    pub fn solve(&mut self, initial: State) -> Result<Outcome, SearchError> {
        let goal = self.config.goal;
        let target_slot = initial
            .slot_of(goal.piece)
            .ok_or(SearchError::UnknownPiece(goal.piece))?;
        let sequences: Vec<Steps> = step_sequences(self.config.mode).collect();

        // ids keep counting across searches; everything else starts afresh
        self.next_id = self.next_id.max(initial.id() + 1);
        self.stats = SearchStats {
            states_created: self.next_id,
            ..SearchStats::default()
        };
        self.visited.clear();

        let initial = Rc::new(initial);
        // the first pop opens a layer too, so the root's layer only holds the root
        let mut last_moves = None;
        self.visited.mark_seen(Rc::clone(&initial));

        let mut frontier = VecDeque::new();
        frontier.try_reserve(1)?;
        frontier.push_back(initial);
        self.stats.peak_frontier = 1;

        while let Some(state) = frontier.pop_front() {
            if goal.is_met(&state, target_slot) {
                info!(
                    "solved in {} moves after expanding {} states",
                    state.moves(),
                    self.stats.expanded
                );
                return Ok(Outcome::Solved(state));
            }

            if let Some(max) = self.config.max_nodes {
                if self.stats.expanded >= max {
                    info!("gave up after expanding {} states", self.stats.expanded);
                    return Ok(Outcome::BudgetExceeded);
                }
            }

            // FIFO order means move counts never decrease
            if last_moves != Some(state.moves()) {
                self.visited.advance_layer();
                self.stats.layers_advanced += 1;
                last_moves = Some(state.moves());
                debug!(
                    "depth {}: frontier {}, remembered {}",
                    state.moves(),
                    frontier.len() + 1,
                    self.visited.len()
                );
            }
            self.stats.depth = state.moves();
            self.stats.expanded += 1;

            for (slot, steps) in (0..state.pieces().len()).cartesian_product(&sequences) {
                let Some(next) = self.successor(&state, slot, steps) else {
                    continue;
                };
                self.stats.generated += 1;

                if self.visited.has_been_seen(&next) {
                    self.stats.duplicates += 1;
                    continue;
                }

                let next = next.into_child_of(&state);
                self.visited.mark_seen(Rc::clone(&next));
                frontier.try_reserve(1)?;
                frontier.push_back(next);
            }

            self.stats.peak_frontier = self.stats.peak_frontier.max(frontier.len());
        }

        info!(
            "no solution after expanding {} states",
            self.stats.expanded
        );
        Ok(Outcome::Exhausted)
    }
}

/// Runs a fresh search with `config`.
pub fn solve(initial: State, config: SearchConfig) -> Result<(Outcome, SearchStats), SearchError> {
    let mut search = Search::new(config)?;
    let outcome = search.solve(initial)?;
    Ok((outcome, *search.stats()))
}

#[cfg(test)]
mod test {
    use std::rc::Weak;

    use super::*;
    use crate::{
        exact::shortest_path,
        load::parse_puzzle,
        piece::{Piece, Shape},
    };

    const CORRIDOR: &str = "
3
1 1 1
2 2 1
1 3 2
goal 1 3 1
";

    const MINI: &str = "
4
4 1 1
1 3 1
1 1 3
1 3 3
goal 1 2 2
";

    const CLASSIC: &str = "
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
";

    fn setup(text: &str, mode: MoveMode) -> (State, SearchConfig) {
        let puzzle = parse_puzzle(text).unwrap();
        let config = SearchConfig {
            goal: puzzle.goal.unwrap_or_default(),
            mode,
            ..SearchConfig::default()
        };
        (puzzle.initial, config)
    }

    fn solution_length(text: &str, mode: MoveMode) -> Option<u32> {
        let (initial, config) = setup(text, mode);
        let (outcome, _) = solve(initial, config).unwrap();
        outcome.solution().map(|s| s.moves())
    }

    #[test]
    fn one_step_to_goal() {
        let initial = State::new(0, vec![Piece::new(0, Shape::Unit, 1, 1)]);
        let config = SearchConfig {
            goal: Goal::new(0, 0, 1),
            ..SearchConfig::default()
        };
        let (outcome, _) = solve(initial, config).unwrap();
        let goal = outcome.solution().unwrap();

        assert_eq!(goal.moves(), 1);
        assert_eq!(goal.ancestors().count(), 2);
        assert_eq!(goal.width(), 2);
        assert_eq!(goal.shape_key(), "..\n1.\n");
    }

    #[test]
    fn already_solved() {
        let (initial, config) = setup(CLASSIC, MoveMode::Single);
        let config = SearchConfig {
            goal: Goal::new(1, 1, 0),
            ..config
        };
        let (outcome, stats) = solve(initial, config).unwrap();
        let goal = outcome.solution().unwrap();

        assert_eq!(goal.moves(), 0);
        assert!(goal.parent().is_none());
        assert_eq!(stats.expanded, 0);
    }

    #[test]
    fn packed_board_is_exhausted() {
        let initial = State::new(0, vec![Piece::new(0, Shape::Square, 0, 0)]);
        let config = SearchConfig {
            goal: Goal::new(0, 1, 1),
            ..SearchConfig::default()
        };
        let (outcome, stats) = solve(initial, config).unwrap();

        assert!(matches!(outcome, Outcome::Exhausted));
        assert_eq!(stats.expanded, 1);
        assert_eq!(stats.peak_frontier, 1);
        assert_eq!(stats.generated, 0);
    }

    #[test]
    fn small_puzzles() {
        assert_eq!(solution_length(CORRIDOR, MoveMode::Single), Some(5));
        assert_eq!(solution_length(CORRIDOR, MoveMode::Composite), Some(3));
        assert_eq!(solution_length(MINI, MoveMode::Single), Some(11));
        assert_eq!(solution_length(MINI, MoveMode::Composite), Some(7));
    }

    #[test]
    fn check_expected() {
        assert_eq!(solution_length(CLASSIC, MoveMode::Single), Some(116));
        // minimal moves is 81 when a piece may slide two cells at once
        assert_eq!(solution_length(CLASSIC, MoveMode::Composite), Some(81));
    }

    #[test]
    fn matches_unbounded_search() {
        for text in [CORRIDOR, MINI] {
            for mode in [MoveMode::Single, MoveMode::Composite] {
                let (initial, config) = setup(text, mode);
                let exact = shortest_path(initial, config.goal, mode)
                    .unwrap()
                    .map(|path| path.len() as u32 - 1);
                assert_eq!(solution_length(text, mode), exact);
            }
        }
    }

    #[test]
    fn solution_path_replays() {
        let (initial, config) = setup(MINI, MoveMode::Composite);
        let (outcome, _) = solve(initial, config).unwrap();
        let goal = outcome.solution().unwrap();

        let path: Vec<&State> = goal.ancestors().collect();
        assert_eq!(path.len() as u32, goal.moves() + 1);
        for (child, parent) in path.iter().tuple_windows() {
            let mv = child.last_move().unwrap();
            let replayed = parent.moved(mv.slot, &mv.steps, 0).unwrap();
            assert_eq!(&replayed, *child);
            assert_eq!(child.moves(), parent.moves() + 1);
            assert!(child.is_consistent());
        }
        assert!(path.last().unwrap().last_move().is_none());
    }

    #[test]
    fn narrow_window_still_solves() {
        for text in [CORRIDOR, MINI] {
            let (initial, config) = setup(text, MoveMode::Single);
            let narrow = SearchConfig { layers: 1, ..config };
            let mut search = Search::new(narrow).unwrap();
            let outcome = search.solve(initial).unwrap();

            assert_eq!(
                outcome.solution().map(|s| s.moves()),
                solution_length(text, MoveMode::Single)
            );
            assert_eq!(search.visited().layer_count(), 1);
        }
    }

    #[test]
    fn window_never_grows() {
        let (initial, config) = setup(MINI, MoveMode::Single);
        let mut search = Search::new(config).unwrap();
        search.solve(initial).unwrap();

        // one advance per depth expanded, the window itself stays the same size
        assert_eq!(search.visited().layer_count(), N_LAYERS);
        assert_eq!(search.stats().layers_advanced, u64::from(search.stats().depth) + 1);
        assert!(search.stats().depth >= 10);
    }

    #[test]
    fn window_holds_at_most_n_layers_of_depths() {
        for max_nodes in 1..200 {
            let (initial, config) = setup(MINI, MoveMode::Single);
            let config = SearchConfig {
                max_nodes: Some(max_nodes),
                ..config
            };
            let mut search = Search::new(config).unwrap();
            search.solve(initial).unwrap();

            let depths: Vec<u32> = search.visited().iter().map(|s| s.moves()).unique().collect();
            assert!(
                depths.len() <= N_LAYERS,
                "after {} expansions the window holds depths {:?}",
                max_nodes,
                depths
            );
        }
    }

    #[test]
    fn each_layer_holds_one_depth() {
        let (initial, config) = setup(CLASSIC, MoveMode::Single);
        let config = SearchConfig {
            max_nodes: Some(500),
            ..config
        };
        let mut search = Search::new(config).unwrap();
        search.solve(initial).unwrap();

        for layer in search.visited().layers() {
            assert!(layer.iter().map(|s| s.moves()).unique().count() <= 1);
        }
    }

    #[test]
    fn budget_stops_search() {
        let (initial, config) = setup(CLASSIC, MoveMode::Single);
        let config = SearchConfig {
            max_nodes: Some(3),
            ..config
        };
        let (outcome, stats) = solve(initial, config).unwrap();

        assert!(matches!(outcome, Outcome::BudgetExceeded));
        assert_eq!(stats.expanded, 3);
    }

    #[test]
    fn bad_configuration() {
        let (initial, config) = setup(CORRIDOR, MoveMode::Single);
        let missing = SearchConfig {
            goal: Goal::new(42, 0, 0),
            ..config.clone()
        };
        assert!(matches!(
            solve(initial, missing),
            Err(SearchError::UnknownPiece(42))
        ));

        let no_layers = SearchConfig { layers: 0, ..config };
        assert!(matches!(Search::new(no_layers), Err(SearchError::NoLayers)));
    }

    #[test]
    fn everything_released_after_search() {
        let (initial, config) = setup(MINI, MoveMode::Single);
        let pieces: Vec<Weak<_>> = initial.pieces().iter().map(Rc::downgrade).collect();

        let mut search = Search::new(config).unwrap();
        let outcome = search.solve(initial).unwrap();
        let goal = outcome.solution().unwrap();

        let mut root = goal;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        let weak_root = Rc::downgrade(root);
        let weak_goal = Rc::downgrade(goal);

        drop(search);
        assert!(weak_goal.upgrade().is_some());
        drop(outcome);

        assert!(weak_goal.upgrade().is_none());
        assert!(weak_root.upgrade().is_none());
        assert!(pieces.iter().all(|p| p.upgrade().is_none()));
    }

    #[test]
    fn ids_continue_across_searches() {
        let (initial, config) = setup(CORRIDOR, MoveMode::Single);
        let mut search = Search::new(config).unwrap();
        search.solve(initial).unwrap();
        let after_first = search.stats().states_created;

        let (initial, _) = setup(CORRIDOR, MoveMode::Single);
        let outcome = search.solve(initial).unwrap();
        assert_eq!(outcome.solution().map(|s| s.moves()), Some(5));
        assert!(search.stats().states_created > after_first);
    }
}

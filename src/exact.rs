use std::rc::Rc;

use itertools::Itertools;
use pathfinding::directed::bfs::bfs;

use crate::{
    error::SearchError,
    moves::{step_sequences, MoveMode, Steps},
    search::Goal,
    state::State,
};

/// Shortest solution with an unbounded visited set, initial state first.
///
/// Walks the same successor function as [`crate::Search`] but never forgets a
/// state, so memory grows with the whole reachable space. Useful as a check on
/// the layered search and for small puzzles.
pub fn shortest_path(
    initial: State,
    goal: Goal,
    mode: MoveMode,
) -> Result<Option<Vec<Rc<State>>>, SearchError> {
    let target_slot = initial
        .slot_of(goal.piece)
        .ok_or(SearchError::UnknownPiece(goal.piece))?;
    let sequences: Vec<Steps> = step_sequences(mode).collect();
    let mut next_id = initial.id() + 1;

    let start = Rc::new(initial);
    let path = bfs(
        &start,
        |state: &Rc<State>| {
            (0..state.pieces().len())
                .cartesian_product(&sequences)
                .filter_map(|(slot, steps)| {
                    let id = next_id;
                    next_id += 1;
                    state.moved(slot, steps, id)
                })
                .map(Rc::new)
                .collect::<Vec<_>>()
        },
        |state| goal.is_met(state, target_slot),
    );

    Ok(path)
}

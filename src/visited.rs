use std::{
    collections::{HashSet, VecDeque},
    rc::Rc,
};

use crate::state::State;

/// Default number of move-count layers remembered.
pub const N_LAYERS: usize = 3;

/// A sliding window of visited sets, oldest first.
///
/// Only the last few layers of the search are remembered, so a state last
/// seen before the window will be explored again. Each entry keeps its state
/// alive until its layer is evicted.
pub struct LayeredVisited {
    layers: VecDeque<HashSet<Rc<State>>>,
}

impl LayeredVisited {
    /// `layers` is clamped to at least one.
    pub fn new(layers: usize) -> LayeredVisited {
        LayeredVisited {
            layers: (0..layers.max(1)).map(|_| HashSet::new()).collect(),
        }
    }

    /// Remembers `state` in the newest layer. Returns false if an equal
    /// state was already in that layer, in which case the old entry stays.
    pub fn mark_seen(&mut self, state: Rc<State>) -> bool {
        match self.layers.back_mut() {
            Some(newest) => newest.insert(state),
            None => false,
        }
    }

    pub fn has_been_seen(&self, state: &State) -> bool {
        self.layers.iter().any(|layer| layer.contains(state))
    }

    /// Drops the oldest layer and opens an empty newest one.
    pub fn advance_layer(&mut self) {
        if let Some(mut oldest) = self.layers.pop_front() {
            // keep the allocation around for the next layer
            oldest.clear();
            self.layers.push_back(oldest);
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Oldest first.
    pub fn layers(&self) -> impl Iterator<Item = &HashSet<Rc<State>>> + '_ {
        self.layers.iter()
    }

    pub fn layer_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.layers.iter().map(HashSet::len)
    }

    /// Every remembered state, across all layers.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<State>> + '_ {
        self.layers.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.layer_sizes().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.layers.iter_mut().for_each(HashSet::clear);
    }
}

impl Default for LayeredVisited {
    fn default() -> Self {
        LayeredVisited::new(N_LAYERS)
    }
}

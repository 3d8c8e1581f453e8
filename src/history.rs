/*!
Append-only record of the states a chain has visited.

Every appended state is stored by value: each distinct graph is kept once in
an arena (shared with the lookup index) and the chain itself is a trace of
arena indices. Entries are
immutable once recorded, and two entries compare equal exactly when the
graphs are structurally equal.
*/

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::GraphState;

#[derive(Debug, Clone, Default)]
pub struct ChainHistory {
    states: Vec<Arc<GraphState>>,
    index: HashMap<Arc<GraphState>, usize>,
    trace: Vec<usize>,
}

impl ChainHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of `state`.
    pub fn push(&mut self, state: &GraphState) {
        let id = match self.index.get(state) {
            Some(&id) => id,
            None => {
                let id = self.states.len();
                let snapshot = Arc::new(state.clone());
                self.index.insert(Arc::clone(&snapshot), id);
                self.states.push(snapshot);
                id
            }
        };
        self.trace.push(id);
    }

    /// Number of recorded steps, including repeats.
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn get(&self, step: usize) -> Option<&GraphState> {
        self.trace.get(step).map(|&id| self.states[id].as_ref())
    }

    pub fn last(&self) -> Option<&GraphState> {
        self.trace.last().map(|&id| self.states[id].as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphState> + '_ {
        self.trace.iter().map(|&id| self.states[id].as_ref())
    }

    /// Each distinct visited state, in order of first visit.
    pub fn distinct_states(&self) -> &[Arc<GraphState>] {
        &self.states
    }

    /// Arena index of `state`, if it was ever recorded.
    pub fn id_of(&self, state: &GraphState) -> Option<usize> {
        self.index.get(state).copied()
    }

    /// Arena index of every step.
    pub fn trace(&self) -> &[usize] {
        &self.trace
    }
}

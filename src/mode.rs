/*!
Frequency summary of a chain: which graphs were visited most often.

# Examples

```rust
use graph_mcmc::geometry::Vertex;
use graph_mcmc::graph::GraphState;
use graph_mcmc::history::ChainHistory;
use graph_mcmc::mode::mode_subset;

let g = GraphState::from_path(vec![Vertex::from([0.0]), Vertex::from([1.0])]).unwrap();
let mut history = ChainHistory::new();
history.push(&g);
history.push(&g);

let modes = mode_subset(&history, 99.0).unwrap();
assert_eq!(modes, vec![g]);
```
*/

use crate::error::{GraphMcmcError, Result};
use crate::graph::GraphState;
use crate::history::ChainHistory;

/// Visit counts per distinct state, most frequent first.
///
/// Ties are ordered by the canonical edge set so the order is reproducible.
#[derive(Debug, Clone)]
pub struct FrequencyTable<'a> {
    history: &'a ChainHistory,
    counts: Vec<usize>, // by arena index
    order: Vec<usize>, // arena indices, most frequent first
}

impl<'a> FrequencyTable<'a> {
    pub fn from_history(history: &'a ChainHistory) -> Self {
        let mut counts = vec![0usize; history.distinct_states().len()];
        for &id in history.trace() {
            counts[id] += 1;
        }
        let states = history.distinct_states();
        let mut order: Vec<usize> = (0..counts.len()).collect();
        order.sort_by(|&a, &b| {
            counts[b]
                .cmp(&counts[a])
                .then_with(|| states[a].edge_set().cmp(states[b].edge_set()))
        });
        Self {
            history,
            counts,
            order,
        }
    }

    /// Number of distinct states.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of visits, i.e. the chain length.
    pub fn total(&self) -> usize {
        self.history.len()
    }

    pub fn count(&self, state: &GraphState) -> usize {
        self.history
            .id_of(state)
            .map_or(0, |id| self.counts[id])
    }

    pub fn most_common(&self) -> impl Iterator<Item = (&'a GraphState, usize)> + '_ {
        let states = self.history.distinct_states();
        self.order
            .iter()
            .map(move |&id| (states[id].as_ref(), self.counts[id]))
    }
}

/// The most frequently visited states whose combined visit count first
/// reaches `percentile`% of the chain length.
///
/// `percentile` must lie in `(0, 100]`.
pub fn mode_subset(history: &ChainHistory, percentile: f64) -> Result<Vec<GraphState>> {
    if !(percentile > 0.0 && percentile <= 100.0) {
        return Err(GraphMcmcError::InvalidParameter(format!(
            "percentile must lie in (0, 100], got {percentile}"
        )));
    }
    let table = FrequencyTable::from_history(history);
    let threshold = percentile / 100.0 * table.total() as f64;

    let mut modes = Vec::new();
    let mut cumulative = 0usize;
    for (state, count) in table.most_common() {
        modes.push(state.clone());
        cumulative += count;
        if cumulative as f64 >= threshold {
            break;
        }
    }
    Ok(modes)
}

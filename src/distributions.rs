/*!
Target and proposal distributions over graph states.

The target is the Boltzmann-like density `exp(-theta(G) / T)` where `theta`
is the energy functional from [`crate::connectivity::energy`]. The proposal
toggles a single edge: it either adds an edge between two non-adjacent
vertices or removes an edge that is not a bridge, so every proposed graph is
connected.

# Examples

```rust
use graph_mcmc::distributions::{EdgeToggleProposal, ProposalDistribution, TargetDistribution, ThetaEnergy};
use graph_mcmc::geometry::Vertex;
use graph_mcmc::graph::GraphState;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let graph = GraphState::from_path(vec![
    Vertex::from([0.0, 0.0]),
    Vertex::from([1.0, 0.0]),
    Vertex::from([1.0, 1.0]),
])
.unwrap();

let target = ThetaEnergy::new(1.0, 1.0).unwrap();
let lp = target.unnorm_log_prob(&graph).unwrap();
assert!(lp < 0.0);

// A path is a spanning tree, so the only possible move is an addition.
let mut rng = SmallRng::seed_from_u64(42);
let candidate = EdgeToggleProposal.sample(&graph, &mut rng).unwrap();
assert_eq!(candidate.n_edges(), 3);
```
*/

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::connectivity::{bridges, energy};
use crate::error::{GraphMcmcError, Result};
use crate::graph::{Edge, GraphState};

/// A trait for target distributions from which we want to sample.
pub trait TargetDistribution<S> {
    /// Returns the log of the unnormalized density of `state`.
    fn unnorm_log_prob(&self, state: &S) -> Result<f64>;
}

/// A trait for generating proposals in Metropolis–Hastings.
///
/// Proposals carry no random state of their own; they draw from the RNG of
/// the chain that uses them.
pub trait ProposalDistribution<S> {
    /// Samples a new state from q(x' | x). Never mutates `current`.
    fn sample<R: Rng + ?Sized>(&self, current: &S, rng: &mut R) -> Result<S>;

    /// Evaluates log q(to | from).
    fn log_prob(&self, from: &S, to: &S) -> Result<f64>;
}

/// `exp(-theta / T)` with `theta = r * total weight + sum of anchor distances`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaEnergy {
    /// Weight `r` of the total edge length term.
    pub edge_cost: f64,
    /// Temperature `T`.
    pub temperature: f64,
}

impl ThetaEnergy {
    pub fn new(edge_cost: f64, temperature: f64) -> Result<Self> {
        if !edge_cost.is_finite() {
            return Err(GraphMcmcError::InvalidParameter(format!(
                "edge cost must be finite, got {edge_cost}"
            )));
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(GraphMcmcError::InvalidParameter(format!(
                "temperature must be positive and finite, got {temperature}"
            )));
        }
        Ok(Self {
            edge_cost,
            temperature,
        })
    }

    /// Theta of `graph`, measured from its anchor.
    pub fn energy(&self, graph: &GraphState) -> Result<f64> {
        energy(graph, graph.anchor(), self.edge_cost)
    }
}

impl Default for ThetaEnergy {
    fn default() -> Self {
        Self {
            edge_cost: 1.0,
            temperature: 1.0,
        }
    }
}

impl TargetDistribution<GraphState> for ThetaEnergy {
    fn unnorm_log_prob(&self, state: &GraphState) -> Result<f64> {
        Ok(-self.energy(state)? / self.temperature)
    }
}

/// The two structural moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Add,
    Remove,
}

/// Probability of proposing an addition: the fraction of room left between
/// the current edge count and the complete graph, `(maxE - e) / (maxE - minE)`.
pub fn add_probability(graph: &GraphState) -> f64 {
    let max_e = graph.max_edges() as f64;
    let min_e = graph.min_edges() as f64;
    let e = graph.n_edges() as f64;
    if max_e <= min_e {
        return if e < max_e { 1.0 } else { 0.0 };
    }
    ((max_e - e) / (max_e - min_e)).clamp(0.0, 1.0)
}

/// Draws the move kind: `Add` if `U < add_probability(graph)`, else `Remove`.
pub fn choose_move_kind<R: Rng + ?Sized>(graph: &GraphState, rng: &mut R) -> MoveKind {
    let u: f64 = rng.gen();
    if u < add_probability(graph) {
        MoveKind::Add
    } else {
        MoveKind::Remove
    }
}

/// Copy of `graph` with one extra edge, chosen uniformly among the
/// non-adjacent vertex pairs.
pub fn propose_add<R: Rng + ?Sized>(graph: &GraphState, rng: &mut R) -> Result<GraphState> {
    if graph.is_complete() {
        return Err(GraphMcmcError::SaturatedGraph);
    }
    let n = graph.n_vertices();
    let missing: Vec<Edge> = (0..n)
        .flat_map(|a| ((a + 1)..n).map(move |b| Edge::new(a, b)))
        .filter(|e| !graph.edge_set().contains(e))
        .collect();
    let edge = *missing.choose(rng).ok_or(GraphMcmcError::SaturatedGraph)?;

    let mut candidate = graph.clone();
    candidate.add_edge(edge);
    Ok(candidate)
}

/// Copy of `graph` without one edge, chosen uniformly among the edges that
/// are not bridges.
pub fn propose_remove<R: Rng + ?Sized>(graph: &GraphState, rng: &mut R) -> Result<GraphState> {
    let bridges = bridges(graph)?;
    let removable: Vec<Edge> = graph.edges().filter(|e| !bridges.contains(e)).collect();
    let edge = *removable
        .choose(rng)
        .ok_or(GraphMcmcError::NoRemovableEdge)?;

    let mut candidate = graph.clone();
    candidate.remove_edge(edge);
    Ok(candidate)
}

/**
Single-edge toggle proposal.

Picks the move kind with [`choose_move_kind`] and then delegates to
[`propose_add`] or [`propose_remove`]. The proposal density is approximated
by one over the number of edges eligible for the inverse move,
`1 / (maxE - |bridges(to)|)`, which does not depend on `from`.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeToggleProposal;

impl ProposalDistribution<GraphState> for EdgeToggleProposal {
    fn sample<R: Rng + ?Sized>(&self, current: &GraphState, rng: &mut R) -> Result<GraphState> {
        let kind = choose_move_kind(current, rng);
        trace!(?kind, edges = current.n_edges(), "proposing move");
        match kind {
            MoveKind::Add => propose_add(current, rng),
            MoveKind::Remove => propose_remove(current, rng),
        }
    }

    fn log_prob(&self, _from: &GraphState, to: &GraphState) -> Result<f64> {
        let eligible = to.max_edges() - bridges(to)?.len();
        Ok(-(eligible as f64).ln())
    }
}

/*!
# Metropolis–Hastings over graphs

This module implements a Metropolis–Hastings sampler whose states are
connected weighted graphs ([`GraphState`]). It is generic over a target
distribution `D` and a proposal distribution `Q` implementing
[`TargetDistribution`] and [`ProposalDistribution`]; the usual choice is
[`ThetaEnergy`](crate::distributions::ThetaEnergy) with
[`EdgeToggleProposal`](crate::distributions::EdgeToggleProposal).

## Overview

- **Single chain**: [`GraphMarkovChain`] owns its current graph, its full
  history, its running statistics and its RNG. Nothing is shared with other
  chains.
- **Parallel chains**: [`MetropolisHastings`] holds several independent chains
  started from the same graph and runs them on the rayon pool via
  [`ChainRunner`](crate::core::ChainRunner).
- **Reproducibility**: `set_seed(seed)` gives chain `i` the seed `seed + i`.

## Example Usage

```rust
use graph_mcmc::core::ChainRunner;
use graph_mcmc::distributions::{EdgeToggleProposal, ThetaEnergy};
use graph_mcmc::geometry::Vertex;
use graph_mcmc::graph::GraphState;
use graph_mcmc::metropolis_hastings::MetropolisHastings;

let initial = GraphState::from_path(vec![
    Vertex::from([0.0, 0.0]),
    Vertex::from([1.0, 0.0]),
    Vertex::from([1.0, 1.0]),
    Vertex::from([0.0, 1.0]),
])
.unwrap();

let mut mh = MetropolisHastings::new(ThetaEnergy::default(), EdgeToggleProposal, &initial, 2)
    .unwrap()
    .set_seed(42);
mh.run(100).unwrap();

assert_eq!(mh.chains[0].history().len(), 101);
let ensemble = mh.ensemble_stats().unwrap();
assert_eq!(ensemble.n_chains, 2);
```
*/

use rand::prelude::*;
use rand_distr::Open01;
use tracing::{debug, trace};

use crate::connectivity::is_connected;
use crate::core::{HasChains, MarkovChain};
use crate::distributions::{ProposalDistribution, TargetDistribution};
use crate::error::{GraphMcmcError, Result};
use crate::graph::GraphState;
use crate::history::ChainHistory;
use crate::mode::mode_subset;
use crate::stats::{collect_ensemble, ChainStats, ChainTracker, EnsembleStats, Observables};

/// The smallest vertex count for which both moves can ever happen.
pub const MIN_VERTICES: usize = 3;

/// A single Metropolis–Hastings chain over graphs.
#[derive(Debug, Clone)]
pub struct GraphMarkovChain<D, Q> {
    /// The target distribution to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate graphs.
    pub proposal: Q,
    /// The chain-specific random seed.
    pub seed: u64,
    current_state: GraphState,
    current_lp: f64,
    current_observables: Observables,
    history: ChainHistory,
    tracker: ChainTracker,
    rng: SmallRng,
}

impl<D, Q> GraphMarkovChain<D, Q>
where
    D: TargetDistribution<GraphState>,
    Q: ProposalDistribution<GraphState>,
{
    /**
    Creates a chain starting at `initial_state`.

    The initial graph becomes the first history entry and the first
    observation of the running means.

    # Errors

    * [`GraphMcmcError::InvalidInput`] if the graph has fewer than
      [`MIN_VERTICES`] vertices.
    * [`GraphMcmcError::InvalidState`] if the graph is disconnected.
    */
    pub fn new(target: D, proposal: Q, initial_state: GraphState) -> Result<Self> {
        if initial_state.n_vertices() < MIN_VERTICES {
            return Err(GraphMcmcError::InvalidInput(format!(
                "a chain needs at least {MIN_VERTICES} vertices, got {}",
                initial_state.n_vertices()
            )));
        }
        if !is_connected(&initial_state) {
            return Err(GraphMcmcError::InvalidState(
                "initial graph is disconnected".to_string(),
            ));
        }

        let current_lp = target.unnorm_log_prob(&initial_state)?;
        let current_observables = Observables::of(&initial_state)?;
        let mut history = ChainHistory::new();
        history.push(&initial_state);
        let mut tracker = ChainTracker::new();
        tracker.observe(&current_observables);

        let seed = thread_rng().gen::<u64>();
        debug!(
            vertices = initial_state.n_vertices(),
            edges = initial_state.n_edges(),
            current_lp,
            "created graph chain"
        );

        Ok(Self {
            target,
            proposal,
            seed,
            current_state: initial_state,
            current_lp,
            current_observables,
            history,
            tracker,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Every state the chain has been in, initial state included.
    pub fn history(&self) -> &ChainHistory {
        &self.history
    }

    pub fn stats(&self) -> ChainStats {
        self.tracker.stats()
    }

    /// Unnormalized log-density of the current state.
    pub fn current_log_prob(&self) -> f64 {
        self.current_lp
    }

    /// The most visited states covering `percentile`% of the history.
    pub fn modes(&self, percentile: f64) -> Result<Vec<GraphState>> {
        mode_subset(&self.history, percentile)
    }
}

impl<D, Q> MarkovChain for GraphMarkovChain<D, Q>
where
    D: TargetDistribution<GraphState>,
    Q: ProposalDistribution<GraphState>,
{
    type State = GraphState;

    /**
    Performs one Metropolis–Hastings update step.

    The log acceptance ratio is

    \[
    \log \alpha = \min\left(0,\ \left[\log p(\text{proposed}) + \log q(\text{current} \mid \text{proposed})\right]
                  - \left[\log p(\text{current}) + \log q(\text{proposed} \mid \text{current})\right]\right)
    \]

    and the proposal is accepted iff \(\log U \le \log \alpha\). Either way the
    resulting state is appended to the history and folded into the running
    means. If any part of the step fails, the chain is left unchanged.
    */
    fn step(&mut self) -> Result<&GraphState> {
        let proposed = self.proposal.sample(&self.current_state, &mut self.rng)?;
        let proposed_lp = self.target.unnorm_log_prob(&proposed)?;
        let log_q_forward = self.proposal.log_prob(&self.current_state, &proposed)?;
        let log_q_backward = self.proposal.log_prob(&proposed, &self.current_state)?;
        let log_accept_ratio =
            ((proposed_lp + log_q_backward) - (self.current_lp + log_q_forward)).min(0.0);
        // `f64::min` ignores a NaN operand, which would accept the move.
        if log_accept_ratio.is_nan() {
            return Err(GraphMcmcError::InvalidState(format!(
                "undefined acceptance ratio (current log density {}, proposed {proposed_lp})",
                self.current_lp
            )));
        }

        let u: f64 = self.rng.sample(Open01);
        let accepted = u.ln() <= log_accept_ratio;
        trace!(
            current_lp = self.current_lp,
            proposed_lp,
            log_accept_ratio,
            accepted,
            "metropolis-hastings step"
        );

        if accepted {
            let observables = Observables::of(&proposed)?;
            self.current_state = proposed;
            self.current_lp = proposed_lp;
            self.current_observables = observables;
        }
        self.history.push(&self.current_state);
        self.tracker.record_proposal(accepted);
        self.tracker.observe(&self.current_observables);

        Ok(&self.current_state)
    }

    fn current_state(&self) -> &GraphState {
        &self.current_state
    }
}

/**
Independent graph chains run side by side.

Each chain starts from its own copy of the same initial graph and owns all of
its mutable state, so chains never synchronise while running.
*/
#[derive(Debug, Clone)]
pub struct MetropolisHastings<D, Q> {
    /// The target distribution we want to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate graphs.
    pub proposal: Q,
    /// The vector of independent Markov chains.
    pub chains: Vec<GraphMarkovChain<D, Q>>,
    /// The global random seed.
    pub seed: u64,
}

impl<D, Q> MetropolisHastings<D, Q>
where
    D: TargetDistribution<GraphState> + Clone + Send,
    Q: ProposalDistribution<GraphState> + Clone + Send,
{
    /// Creates `n_chains` chains starting at `initial_state`, seeded
    /// `seed, seed + 1, ...` from a random global seed.
    pub fn new(target: D, proposal: Q, initial_state: &GraphState, n_chains: usize) -> Result<Self> {
        if n_chains == 0 {
            return Err(GraphMcmcError::InvalidParameter(
                "at least one chain is required".to_string(),
            ));
        }
        let chains = (0..n_chains)
            .map(|_| GraphMarkovChain::new(target.clone(), proposal.clone(), initial_state.clone()))
            .collect::<Result<Vec<_>>>()?;
        let seed = thread_rng().gen::<u64>();
        debug!(n_chains, "created graph sampler");

        Ok(Self {
            target,
            proposal,
            chains,
            seed,
        }
        .set_seed(seed))
    }

    /// Sets a new global seed; chain `i` gets `seed + i`.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        for (i, chain) in self.chains.iter_mut().enumerate() {
            chain.reseed(seed.wrapping_add(i as u64));
        }
        self
    }

    pub fn stats(&self) -> Vec<ChainStats> {
        self.chains.iter().map(|c| c.stats()).collect()
    }

    /// Running means averaged over all chains.
    pub fn ensemble_stats(&self) -> Result<EnsembleStats> {
        collect_ensemble(&self.stats())
    }
}

impl<D, Q> HasChains for MetropolisHastings<D, Q>
where
    D: TargetDistribution<GraphState> + Clone + Send,
    Q: ProposalDistribution<GraphState> + Clone + Send,
{
    type Chain = GraphMarkovChain<D, Q>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::bridges;
    use crate::core::{run_chain, ChainRunner};
    use crate::distributions::{EdgeToggleProposal, ThetaEnergy};
    use crate::geometry::Vertex;
    use approx::assert_abs_diff_eq;

    fn pentagon() -> GraphState {
        let vertices = (0..5)
            .map(|k| {
                let a = 2.0 * std::f64::consts::PI * k as f64 / 5.0;
                Vertex::from([a.cos(), a.sin()])
            })
            .collect();
        GraphState::from_path(vertices).unwrap()
    }

    fn chain(temperature: f64) -> GraphMarkovChain<ThetaEnergy, EdgeToggleProposal> {
        chain_with(1.0, temperature)
    }

    fn chain_with(
        edge_cost: f64,
        temperature: f64,
    ) -> GraphMarkovChain<ThetaEnergy, EdgeToggleProposal> {
        GraphMarkovChain::new(
            ThetaEnergy::new(edge_cost, temperature).unwrap(),
            EdgeToggleProposal,
            pentagon(),
        )
        .unwrap()
        .set_seed(42)
    }

    /// A proposal that always fails, to check that a failed step changes nothing.
    #[derive(Clone)]
    struct Broken;

    impl ProposalDistribution<GraphState> for Broken {
        fn sample<R: Rng + ?Sized>(&self, _: &GraphState, _: &mut R) -> Result<GraphState> {
            Err(GraphMcmcError::SaturatedGraph)
        }

        fn log_prob(&self, _: &GraphState, _: &GraphState) -> Result<f64> {
            Ok(0.0)
        }
    }

    /// A target that is flat, so only the proposal correction matters.
    #[derive(Clone)]
    struct Flat;

    impl TargetDistribution<GraphState> for Flat {
        fn unnorm_log_prob(&self, _: &GraphState) -> Result<f64> {
            Ok(0.0)
        }
    }

    /// A target with infinite density everywhere, so the density ratio is `inf - inf`.
    #[derive(Clone)]
    struct Unbounded;

    impl TargetDistribution<GraphState> for Unbounded {
        fn unnorm_log_prob(&self, _: &GraphState) -> Result<f64> {
            Ok(f64::INFINITY)
        }
    }

    #[test]
    fn test_history_length_is_steps_plus_one() {
        let mut c = chain(1.0);
        run_chain(&mut c, 250).unwrap();
        assert_eq!(c.history().len(), 251);
        assert_eq!(c.stats().n, 251);
        assert_eq!(c.history().get(0), Some(&pentagon()));
        assert_eq!(c.history().last(), Some(c.current_state()));
    }

    #[test]
    fn test_states_stay_connected_and_move_by_one_edge() {
        let mut c = chain(5.0);
        let mut previous = c.current_state().clone();
        for _ in 0..500 {
            let next = c.step().unwrap().clone();
            assert!(is_connected(&next));
            let diff = previous.n_edges().abs_diff(next.n_edges());
            assert!(diff <= 1);
            if diff == 0 {
                assert_eq!(previous, next, "rejection keeps the state");
            }
            previous = next;
        }
    }

    #[test]
    fn test_running_means_match_history() {
        let mut c = chain(2.0);
        run_chain(&mut c, 300).unwrap();

        let n = c.history().len() as f64;
        let mean_edges = c.history().iter().map(|g| g.n_edges() as f64).sum::<f64>() / n;
        let mean_degree = c
            .history()
            .iter()
            .map(|g| g.anchor_degree() as f64)
            .sum::<f64>()
            / n;
        let mean_ecc = c
            .history()
            .iter()
            .map(|g| Observables::of(g).unwrap().eccentricity)
            .sum::<f64>()
            / n;

        let stats = c.stats();
        assert_abs_diff_eq!(stats.mean.edge_count, mean_edges, epsilon = 1e-9);
        assert_abs_diff_eq!(stats.mean.anchor_degree, mean_degree, epsilon = 1e-9);
        assert_abs_diff_eq!(stats.mean.eccentricity, mean_ecc, epsilon = 1e-9);
    }

    #[test]
    fn test_low_temperature_favours_sparse_graphs() {
        // With a large edge cost every extra edge raises the energy, so a cold
        // chain never leaves the initial spanning tree.
        let mut cold = chain_with(100.0, 0.01);
        run_chain(&mut cold, 500).unwrap();
        let mut hot = chain_with(100.0, 1_000.0);
        run_chain(&mut hot, 500).unwrap();
        assert_eq!(cold.stats().mean.edge_count, 4.0);
        assert_eq!(cold.stats().p_accept, 0.0);
        assert!(hot.stats().mean.edge_count > 4.0);
    }

    #[test]
    fn test_flat_target_always_leaves_a_spanning_tree() {
        // From a tree every candidate has fewer bridges than the tree, so
        // q_current / q_candidate > 1 and the first move is always accepted.
        for seed in 0..50 {
            let mut c = GraphMarkovChain::new(Flat, EdgeToggleProposal, pentagon())
                .unwrap()
                .set_seed(seed);
            let before = bridges(c.current_state()).unwrap().len();
            let next = c.step().unwrap().clone();
            assert_eq!(next.n_edges(), 5);
            assert!(bridges(&next).unwrap().len() < before);
        }
    }

    #[test]
    fn test_failed_step_leaves_chain_untouched() {
        let mut c = GraphMarkovChain::new(ThetaEnergy::default(), Broken, pentagon()).unwrap();
        assert!(matches!(c.step(), Err(GraphMcmcError::SaturatedGraph)));
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.stats().n, 1);
        assert_eq!(c.current_state(), &pentagon());
    }

    #[test]
    fn test_undefined_acceptance_ratio_is_an_error() {
        let mut c = GraphMarkovChain::new(Unbounded, EdgeToggleProposal, pentagon())
            .unwrap()
            .set_seed(1);
        assert!(matches!(c.step(), Err(GraphMcmcError::InvalidState(_))));
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.stats().p_accept, 0.0);
        assert_eq!(c.current_state(), &pentagon());
    }

    #[test]
    fn test_rejects_bad_initial_graphs() {
        let too_small =
            GraphState::from_path(vec![Vertex::from([0.0, 0.0]), Vertex::from([1.0, 0.0])])
                .unwrap();
        assert!(matches!(
            GraphMarkovChain::new(ThetaEnergy::default(), EdgeToggleProposal, too_small),
            Err(GraphMcmcError::InvalidInput(_))
        ));

        let split = GraphState::from_edges(
            vec![
                Vertex::from([0.0, 0.0]),
                Vertex::from([1.0, 0.0]),
                Vertex::from([2.0, 0.0]),
            ],
            &[(0, 1)],
        )
        .unwrap();
        assert!(matches!(
            GraphMarkovChain::new(ThetaEnergy::default(), EdgeToggleProposal, split),
            Err(GraphMcmcError::InvalidState(_))
        ));
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = chain(1.0);
        let mut b = chain(1.0);
        run_chain(&mut a, 200).unwrap();
        run_chain(&mut b, 200).unwrap();
        assert_eq!(a.history().trace(), b.history().trace());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_set_seed_gives_each_chain_its_own_seed() {
        let mh = MetropolisHastings::new(ThetaEnergy::default(), EdgeToggleProposal, &pentagon(), 3)
            .unwrap()
            .set_seed(42);
        assert_eq!(mh.seed, 42);
        let seeds: Vec<u64> = mh.chains.iter().map(|c| c.seed).collect();
        assert_eq!(seeds, vec![42, 43, 44]);
    }

    #[test]
    fn test_parallel_run_and_average() {
        let mut mh =
            MetropolisHastings::new(ThetaEnergy::default(), EdgeToggleProposal, &pentagon(), 4)
                .unwrap()
                .set_seed(7);
        mh.run(150).unwrap();

        for c in &mh.chains {
            assert_eq!(c.history().len(), 151);
        }
        let per_chain = mh.stats();
        let ensemble = mh.ensemble_stats().unwrap();
        let expected = per_chain.iter().map(|s| s.mean.edge_count).sum::<f64>() / 4.0;
        assert_eq!(ensemble.n_chains, 4);
        assert_abs_diff_eq!(ensemble.mean.edge_count, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_chains_is_an_error() {
        assert!(
            MetropolisHastings::new(ThetaEnergy::default(), EdgeToggleProposal, &pentagon(), 0)
                .is_err()
        );
    }
}

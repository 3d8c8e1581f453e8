//! Running statistics of a chain and their reduction across chains.

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::connectivity::longest_shortest_path;
use crate::error::{GraphMcmcError, Result};
use crate::graph::GraphState;

/// Folds `value` into a mean over `count` previous observations.
pub fn online_mean(mean: f64, count: u64, value: f64) -> f64 {
    let n = count as f64;
    (mean * n + value) / (n + 1.0)
}

/// The scalar observables tracked along a chain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observables {
    /// Degree of the anchor vertex.
    pub anchor_degree: f64,
    /// Number of edges.
    pub edge_count: f64,
    /// Longest anchor-rooted shortest path.
    pub eccentricity: f64,
}

impl Observables {
    pub fn of(graph: &GraphState) -> Result<Self> {
        Ok(Self {
            anchor_degree: graph.anchor_degree() as f64,
            edge_count: graph.n_edges() as f64,
            eccentricity: longest_shortest_path(graph, graph.anchor())?,
        })
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.anchor_degree, self.edge_count, self.eccentricity]
    }

    fn from_array(a: ArrayView1<f64>) -> Self {
        Self {
            anchor_degree: a[0],
            edge_count: a[1],
            eccentricity: a[2],
        }
    }
}

/// Per-chain online means plus acceptance bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainTracker {
    n: u64,
    n_proposals: u64,
    n_accepted: u64,
    mean: Observables,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Number of states folded into the means.
    pub n: u64,
    /// Fraction of proposals that were accepted.
    pub p_accept: f64,
    pub mean: Observables,
}

impl ChainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one chain entry into every running mean.
    pub fn observe(&mut self, x: &Observables) {
        self.mean = Observables {
            anchor_degree: online_mean(self.mean.anchor_degree, self.n, x.anchor_degree),
            edge_count: online_mean(self.mean.edge_count, self.n, x.edge_count),
            eccentricity: online_mean(self.mean.eccentricity, self.n, x.eccentricity),
        };
        self.n += 1;
    }

    pub fn record_proposal(&mut self, accepted: bool) {
        self.n_proposals += 1;
        if accepted {
            self.n_accepted += 1;
        }
    }

    pub fn p_accept(&self) -> f64 {
        if self.n_proposals == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_proposals as f64
        }
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            n: self.n,
            p_accept: self.p_accept(),
            mean: self.mean,
        }
    }
}

/// Chain statistics averaged over an ensemble of independent chains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleStats {
    pub n_chains: usize,
    /// Arithmetic mean of the per-chain means.
    pub mean: Observables,
    /// Between-chain standard deviation of the per-chain means.
    pub std: Observables,
    pub p_accept: f64,
}

/// Averages the per-chain statistics.
pub fn collect_ensemble(all_chain_stats: &[ChainStats]) -> Result<EnsembleStats> {
    let n_chains = all_chain_stats.len();
    if n_chains == 0 {
        return Err(GraphMcmcError::InvalidInput(
            "cannot average over zero chains".to_string(),
        ));
    }
    let flat: Vec<f64> = all_chain_stats
        .iter()
        .flat_map(|s| s.mean.to_array())
        .collect();
    let means = Array2::from_shape_vec((n_chains, 3), flat)
        .map_err(|e| GraphMcmcError::InvalidInput(e.to_string()))?;

    let global = means
        .mean_axis(Axis(0))
        .ok_or_else(|| GraphMcmcError::InvalidInput("empty ensemble".to_string()))?;
    let ddof = if n_chains > 1 { 1.0 } else { 0.0 };
    let spread = means.std_axis(Axis(0), ddof);
    let p_accept = all_chain_stats.iter().map(|s| s.p_accept).sum::<f64>() / n_chains as f64;

    Ok(EnsembleStats {
        n_chains,
        mean: Observables::from_array(global.view()),
        std: Observables::from_array(spread.view()),
        p_accept,
    })
}

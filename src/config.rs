//! Sampler configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GraphMcmcError, Result};

/// Parameters of a single chain or an ensemble run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Weight `r` of the total edge length in the energy.
    pub edge_cost: f64,
    /// Temperature `T` of the acceptance rule.
    pub temperature: f64,
    /// Steps per chain.
    pub n_steps: usize,
    /// Chains in an ensemble run. `None` means one per available CPU.
    pub n_chains: Option<usize>,
    /// Base seed; chain `i` uses `seed + i`. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Percentile of visit mass kept by the mode summary.
    pub mode_percentile: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            edge_cost: 1.0,
            temperature: 1.0,
            n_steps: 1_000,
            n_chains: None,
            seed: None,
            mode_percentile: 99.0,
        }
    }
}

impl SamplerConfig {
    pub fn with_edge_cost(mut self, edge_cost: f64) -> Self {
        self.edge_cost = edge_cost;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    pub fn with_n_chains(mut self, n_chains: usize) -> Self {
        self.n_chains = Some(n_chains);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode_percentile(mut self, percentile: f64) -> Self {
        self.mode_percentile = percentile;
        self
    }

    /// Number of chains for an ensemble run.
    pub fn resolved_n_chains(&self) -> usize {
        self.n_chains.unwrap_or_else(available_chains)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.edge_cost.is_finite() {
            return Err(GraphMcmcError::InvalidParameter(format!(
                "edge cost must be finite, got {}",
                self.edge_cost
            )));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(GraphMcmcError::InvalidParameter(format!(
                "temperature must be positive and finite, got {}",
                self.temperature
            )));
        }
        if self.n_chains == Some(0) {
            return Err(GraphMcmcError::InvalidParameter(
                "at least one chain is required".to_string(),
            ));
        }
        if !(self.mode_percentile > 0.0 && self.mode_percentile <= 100.0) {
            return Err(GraphMcmcError::InvalidParameter(format!(
                "mode percentile must lie in (0, 100], got {}",
                self.mode_percentile
            )));
        }
        Ok(())
    }
}

/// One chain per available parallel execution unit, or 1 if unknown.
pub fn available_chains() -> usize {
    match std::thread::available_parallelism() {
        Ok(v) => v.get(),
        Err(e) => {
            tracing::warn!(error = %e, "could not get number of threads; defaulting to 1");
            1
        }
    }
}

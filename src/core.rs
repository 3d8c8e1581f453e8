use indicatif::ProgressBar;
use indicatif::{MultiProgress, ProgressStyle};
use rayon::prelude::*;

use crate::error::Result;

pub trait MarkovChain {
    type State;

    /// Does one iteration of the chain, returning the new current state.
    fn step(&mut self) -> Result<&Self::State>;

    /// Get the current state without stepping.
    fn current_state(&self) -> &Self::State;
}

pub fn run_chain<M: MarkovChain>(chain: &mut M, n_steps: usize) -> Result<()> {
    for _ in 0..n_steps {
        chain.step()?;
    }
    Ok(())
}

pub fn run_chain_with_progress<M: MarkovChain>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<()> {
    pb.set_length(n_steps as u64);

    for _ in 0..n_steps {
        chain.step()?;
        pb.inc(1);
    }

    Ok(())
}

/// A trait for "anything that owns multiple MarkovChains".
pub trait HasChains {
    type Chain: MarkovChain + Send;

    /// Returns a mutable reference to the vector of chains.
    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

pub trait ChainRunner: HasChains {
    /// Runs every chain for `n_steps` in parallel. The first error aborts the run.
    fn run(&mut self, n_steps: usize) -> Result<()> {
        self.chains_mut()
            .par_iter_mut()
            .try_for_each(|chain| run_chain(chain, n_steps))
    }

    fn run_with_progress(&mut self, n_steps: usize) -> Result<()> {
        let multi = MultiProgress::new();
        let pb_style = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-");

        self.chains_mut()
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(i, chain)| {
                let pb = multi.add(ProgressBar::new(n_steps as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(pb_style.clone());

                let result = run_chain_with_progress(chain, n_steps, &pb);
                match &result {
                    Ok(()) => pb.finish_with_message("Done!"),
                    Err(e) => pb.abandon_with_message(e.to_string()),
                }
                result
            })
    }
}

impl<T: HasChains> ChainRunner for T {}

//! Metropolis–Hastings sampling over connected weighted graphs embedded in
//! Euclidean space, with parallel independent chains.

pub mod config;
pub mod connectivity;
pub mod core;
pub mod distributions;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod metropolis_hastings;
pub mod mode;
pub mod simulation;
pub mod stats;

pub use error::{GraphMcmcError, Result};

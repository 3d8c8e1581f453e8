use graph_mcmc::config::SamplerConfig;
use graph_mcmc::geometry::Vertex;
use graph_mcmc::simulation::{run_ensemble, run_single};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Eight points on a circle, connected as a path to start with.
    let vertices: Vec<Vertex> = (0..8)
        .map(|k| {
            let a = 2.0 * std::f64::consts::PI * k as f64 / 8.0;
            Vertex::from([a.cos(), a.sin()])
        })
        .collect();

    let config = SamplerConfig::default()
        .with_edge_cost(1.0)
        .with_temperature(1.0)
        .with_n_steps(5_000)
        .with_seed(42);

    let single = run_single(vertices.clone(), &config)?;
    println!(
        "single chain: anchor degree {:.3}, edges {:.3}, eccentricity {:.3}, acceptance {:.3}",
        single.mean_anchor_degree, single.mean_edge_count, single.mean_eccentricity, single.p_accept
    );
    println!("{} mode states, most visited:", single.modes.len());
    if let Some(top) = single.modes.first() {
        println!("  {top}");
    }

    let ensemble = run_ensemble(vertices, &config)?;
    println!(
        "{} chains: anchor degree {:.3} (± {:.3}), edges {:.3} (± {:.3}), eccentricity {:.3} (± {:.3})",
        ensemble.n_chains,
        ensemble.mean.anchor_degree,
        ensemble.std.anchor_degree,
        ensemble.mean.edge_count,
        ensemble.std.edge_count,
        ensemble.mean.eccentricity,
        ensemble.std.eccentricity,
    );
    Ok(())
}

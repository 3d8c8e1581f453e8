/*!
Connectivity analysis and the anchor-rooted path functionals.

All functions here are read-only with respect to the graph they are given.
Those that need a connected graph fail with
[`GraphMcmcError::InvalidState`] instead of returning a meaningless value.

# Examples

```rust
use graph_mcmc::connectivity::energy;
use graph_mcmc::geometry::Vertex;
use graph_mcmc::graph::GraphState;

// One edge of length 5: r * 5 + (0 + 5) = 10.
let graph = GraphState::from_path(vec![Vertex::from([0.0, 0.0]), Vertex::from([3.0, 4.0])]).unwrap();
assert_eq!(energy(&graph, graph.anchor(), 1.0).unwrap(), 10.0);
```
*/

use std::collections::BTreeSet;

use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::NodeIndex;
use petgraph::visit::{depth_first_search, DfsEvent, EdgeRef, Time};

use crate::error::{GraphMcmcError, Result};
use crate::graph::{Edge, GraphState};

/// Returns `true` if every vertex can be reached from every other vertex.
pub fn is_connected(graph: &GraphState) -> bool {
    graph.n_vertices() == 0 || connected_components(&graph.to_ungraph()) == 1
}

fn require_connected(graph: &GraphState) -> Result<()> {
    if is_connected(graph) {
        Ok(())
    } else {
        Err(GraphMcmcError::InvalidState(format!(
            "graph with {} vertices and {} edges is disconnected",
            graph.n_vertices(),
            graph.n_edges()
        )))
    }
}

/// All edges whose removal would disconnect the graph.
///
/// One depth-first traversal from the anchor tracks low-link values, so the
/// cost is linear in the size of the graph. The graph is not modified.
pub fn bridges(graph: &GraphState) -> Result<BTreeSet<Edge>> {
    require_connected(graph)?;

    let view = graph.to_ungraph();
    let n = view.node_count();
    let mut disc = vec![0; n];
    let mut low = vec![0; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut out = BTreeSet::new();

    depth_first_search(&view, Some(NodeIndex::new(graph.anchor())), |event| {
        match event {
            DfsEvent::Discover(v, Time(t)) => {
                disc[v.index()] = t;
                low[v.index()] = t;
            }
            DfsEvent::TreeEdge(u, v) => parent[v.index()] = Some(u.index()),
            // Undirected: the edge back to the parent shows up as a back edge.
            DfsEvent::BackEdge(u, v) if parent[u.index()] != Some(v.index()) => {
                low[u.index()] = low[u.index()].min(disc[v.index()]);
            }
            DfsEvent::Finish(v, _) => {
                let v = v.index();
                if let Some(p) = parent[v] {
                    low[p] = low[p].min(low[v]);
                    if low[v] > disc[p] {
                        out.insert(Edge::new(p, v));
                    }
                }
            }
            _ => {}
        }
    });

    Ok(out)
}

/// Weighted shortest-path distance from `source` to every vertex (Dijkstra).
/// Unreachable vertices get `f64::INFINITY`.
pub fn shortest_path_lengths(graph: &GraphState, source: usize) -> Vec<f64> {
    let view = graph.to_ungraph();
    let reached = dijkstra(&view, NodeIndex::new(source), None, |e| *e.weight());
    (0..graph.n_vertices())
        .map(|i| {
            reached
                .get(&NodeIndex::new(i))
                .copied()
                .unwrap_or(f64::INFINITY)
        })
        .collect()
}

fn anchored_lengths(graph: &GraphState, anchor: usize) -> Result<Vec<f64>> {
    if anchor >= graph.n_vertices() {
        return Err(GraphMcmcError::InvalidInput(format!(
            "anchor {anchor} is outside 0..{}",
            graph.n_vertices()
        )));
    }
    require_connected(graph)?;
    Ok(shortest_path_lengths(graph, anchor))
}

/// The largest shortest-path distance from `anchor` to any vertex.
pub fn longest_shortest_path(graph: &GraphState, anchor: usize) -> Result<f64> {
    Ok(anchored_lengths(graph, anchor)?
        .into_iter()
        .fold(0.0, f64::max))
}

/// The theta functional:
/// `r * (total edge weight) + sum over v of dist(anchor, v)`.
pub fn energy(graph: &GraphState, anchor: usize, r: f64) -> Result<f64> {
    let reach: f64 = anchored_lengths(graph, anchor)?.into_iter().sum();
    Ok(r * graph.total_weight() + reach)
}

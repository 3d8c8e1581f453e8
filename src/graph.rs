/*!
The state space of the sampler: weighted graphs over a fixed vertex set.

A [`GraphState`] pairs a shared [`VertexSet`] with a mutable set of edges. Edge
weights are never stored; the weight of an edge is always the Euclidean
distance between its endpoints. Equality and hashing are structural: two
states over the same vertex set are equal iff they have the same anchor and
the same edge set, regardless of how they were produced.

# Examples

```rust
use graph_mcmc::geometry::Vertex;
use graph_mcmc::graph::GraphState;

let graph = GraphState::from_path(vec![
    Vertex::from([0.0, 0.0]),
    Vertex::from([3.0, 4.0]),
    Vertex::from([6.0, 0.0]),
])
.unwrap();
assert_eq!(graph.n_edges(), 2);
assert_eq!(graph.total_weight(), 10.0);
```
*/

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{GraphMcmcError, Result};
use crate::geometry::{Vertex, VertexSet};

/// An undirected edge between two distinct vertex indices, stored with `u < v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    u: usize,
    v: usize,
}

impl Edge {
    /// Creates the edge `{a, b}`. The endpoint order does not matter.
    ///
    /// # Panics
    /// Panics if `a == b`.
    pub fn new(a: usize, b: usize) -> Self {
        assert_ne!(a, b, "an edge needs two distinct endpoints");
        if a < b {
            Self { u: a, v: b }
        } else {
            Self { u: b, v: a }
        }
    }

    pub fn u(&self) -> usize {
        self.u
    }

    pub fn v(&self) -> usize {
        self.v
    }

    pub fn contains(&self, x: usize) -> bool {
        self.u == x || self.v == x
    }
}

/// A weighted graph over a fixed vertex set with one anchor vertex.
#[derive(Debug, Clone)]
pub struct GraphState {
    vertices: Arc<VertexSet>,
    edges: BTreeSet<Edge>,
    anchor: usize,
}

impl GraphState {
    /// Builds the path graph that connects consecutive input vertices.
    /// The first vertex is the anchor.
    pub fn from_path(vertices: Vec<Vertex>) -> Result<Self> {
        let vertices = Arc::new(VertexSet::new(vertices)?);
        let edges = (1..vertices.len()).map(|i| Edge::new(i - 1, i)).collect();
        Ok(Self {
            vertices,
            edges,
            anchor: 0,
        })
    }

    /// Builds a graph with an arbitrary edge set given as index pairs into
    /// `vertices`. The first vertex is the anchor.
    ///
    /// The result is not required to be connected; operations that need
    /// connectivity check it themselves.
    pub fn from_edges(vertices: Vec<Vertex>, edges: &[(usize, usize)]) -> Result<Self> {
        let vertices = Arc::new(VertexSet::new(vertices)?);
        let n = vertices.len();
        let mut edge_set = BTreeSet::new();
        for &(a, b) in edges {
            if a >= n || b >= n {
                return Err(GraphMcmcError::InvalidInput(format!(
                    "edge ({a}, {b}) references a vertex outside 0..{n}"
                )));
            }
            if a == b {
                return Err(GraphMcmcError::InvalidInput(format!(
                    "self loop at vertex {a}"
                )));
            }
            edge_set.insert(Edge::new(a, b));
        }
        Ok(Self {
            vertices,
            edges: edge_set,
            anchor: 0,
        })
    }

    /// Moves the anchor to vertex `index`.
    pub fn with_anchor(mut self, index: usize) -> Result<Self> {
        if index >= self.n_vertices() {
            return Err(GraphMcmcError::InvalidInput(format!(
                "anchor {index} is outside 0..{}",
                self.n_vertices()
            )));
        }
        self.anchor = index;
        Ok(self)
    }

    pub fn vertex_set(&self) -> &VertexSet {
        &self.vertices
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// The canonical, sorted edge set.
    pub fn edge_set(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        a != b && self.edges.contains(&Edge::new(a, b))
    }

    /// Weight of `edge`: the distance between its endpoints.
    pub fn weight(&self, edge: Edge) -> f64 {
        self.vertices.distance(edge.u, edge.v)
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|&e| self.weight(e)).sum()
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.edges.iter().filter(|e| e.contains(vertex)).count()
    }

    pub fn anchor_degree(&self) -> usize {
        self.degree(self.anchor)
    }

    /// Edge count of the complete graph on this vertex set, n(n-1)/2.
    pub fn max_edges(&self) -> usize {
        let n = self.n_vertices();
        n * n.saturating_sub(1) / 2
    }

    /// Edge count of a spanning tree on this vertex set, n-1.
    pub fn min_edges(&self) -> usize {
        self.n_vertices().saturating_sub(1)
    }

    pub fn is_complete(&self) -> bool {
        self.n_edges() == self.max_edges()
    }

    /// Connected with exactly n-1 edges, so every edge is a bridge.
    pub fn is_spanning_tree(&self) -> bool {
        self.n_edges() == self.min_edges() && crate::connectivity::is_connected(self)
    }

    /// An undirected petgraph view of this state. Node `i` carries vertex
    /// index `i` and every edge carries its weight.
    pub fn to_ungraph(&self) -> UnGraph<usize, f64> {
        let mut g = UnGraph::with_capacity(self.n_vertices(), self.n_edges());
        for i in 0..self.n_vertices() {
            g.add_node(i);
        }
        for &e in &self.edges {
            g.add_edge(NodeIndex::new(e.u), NodeIndex::new(e.v), self.weight(e));
        }
        g
    }

    /// Returns `true` if the edge was not present before.
    pub(crate) fn add_edge(&mut self, edge: Edge) -> bool {
        self.edges.insert(edge)
    }

    /// Returns `true` if the edge was present before.
    pub(crate) fn remove_edge(&mut self, edge: Edge) -> bool {
        self.edges.remove(&edge)
    }
}

impl PartialEq for GraphState {
    fn eq(&self, other: &Self) -> bool {
        self.anchor == other.anchor
            && self.edges == other.edges
            && (Arc::ptr_eq(&self.vertices, &other.vertices) || self.vertices == other.vertices)
    }
}

impl Eq for GraphState {}

impl Hash for GraphState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.anchor.hash(state);
        self.edges.hash(state);
    }
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.edges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}-{}",
                self.vertices.vertex(e.u),
                self.vertices.vertex(e.v)
            )?;
        }
        write!(f, "}}")
    }
}

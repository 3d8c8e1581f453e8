/*!
Points in Euclidean space and the fixed vertex set a chain lives on.

A [`VertexSet`] is built once per chain and never changes afterwards. It
stores the coordinates of every vertex together with the full matrix of
pairwise distances, so that edge weights are looked up rather than recomputed
on every energy evaluation.

# Examples

```rust
use graph_mcmc::geometry::{distance, Vertex, VertexSet};

let a = Vertex::from([0.0, 0.0]);
let b = Vertex::from([3.0, 4.0]);
assert_eq!(distance(&a, &b).unwrap(), 5.0);

let set = VertexSet::new(vec![a, b]).unwrap();
assert_eq!(set.distance(0, 1), 5.0);
```
*/

use std::fmt;

use crate::error::{GraphMcmcError, Result};

/// A point in d-dimensional space. Two vertices are the same vertex iff their
/// coordinates are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    coords: Vec<f64>,
}

impl Vertex {
    pub fn new(coords: Vec<f64>) -> Self {
        Self { coords }
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }
}

impl From<Vec<f64>> for Vertex {
    fn from(coords: Vec<f64>) -> Self {
        Self::new(coords)
    }
}

impl<const N: usize> From<[f64; N]> for Vertex {
    fn from(coords: [f64; N]) -> Self {
        Self::new(coords.to_vec())
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, ")")
    }
}

/// Euclidean distance between two vertices.
///
/// Fails with [`GraphMcmcError::DimensionMismatch`] if the vertices do not have
/// the same number of coordinates.
pub fn distance(a: &Vertex, b: &Vertex) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(GraphMcmcError::DimensionMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(a.coords
        .iter()
        .zip(b.coords.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

/// The fixed, ordered vertex set of a graph, with cached pairwise distances.
///
/// Vertices are addressed by their index in the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSet {
    vertices: Vec<Vertex>,
    distances: Vec<f64>, // n x n, row-major
}

impl VertexSet {
    /// Validates `vertices` and precomputes all pairwise distances.
    ///
    /// The list must be non-empty, every coordinate and every pairwise
    /// distance finite, all vertices of the same dimension and no vertex may
    /// appear twice.
    pub fn new(vertices: Vec<Vertex>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(GraphMcmcError::InvalidInput(
                "vertex list is empty".to_string(),
            ));
        }
        if let Some(v) = vertices
            .iter()
            .find(|v| v.coords.iter().any(|x| !x.is_finite()))
        {
            return Err(GraphMcmcError::InvalidInput(format!(
                "vertex {v} has a non-finite coordinate"
            )));
        }

        let n = vertices.len();
        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                if vertices[i] == vertices[j] {
                    return Err(GraphMcmcError::InvalidInput(format!(
                        "vertex {} appears more than once",
                        vertices[i]
                    )));
                }
                let d = distance(&vertices[i], &vertices[j])?;
                if !d.is_finite() {
                    return Err(GraphMcmcError::InvalidInput(format!(
                        "distance between {} and {} overflows",
                        vertices[i], vertices[j]
                    )));
                }
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }

        Ok(Self {
            vertices,
            distances,
        })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index of the vertex with exactly these coordinates, if present.
    pub fn position(&self, vertex: &Vertex) -> Option<usize> {
        self.vertices.iter().position(|v| v == vertex)
    }

    /// Cached distance between vertices `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.vertices.len() + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance_3_4_5() {
        let d = distance(&Vertex::from([0.0, 0.0]), &Vertex::from([3.0, 4.0])).unwrap();
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_higher_dim() {
        let a = Vertex::from([1.0, 2.0, 3.0, 4.0]);
        let b = Vertex::from([2.0, 3.0, 4.0, 5.0]);
        assert_abs_diff_eq!(distance(&a, &b).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let err = distance(&Vertex::from([0.0, 0.0]), &Vertex::from([1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(
            err,
            GraphMcmcError::DimensionMismatch { left: 2, right: 3 }
        ));
    }

    #[test]
    fn test_vertex_set_caches_symmetric_distances() {
        let set = VertexSet::new(vec![
            Vertex::from([0.0, 0.0]),
            Vertex::from([3.0, 4.0]),
            Vertex::from([6.0, 0.0]),
        ])
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_abs_diff_eq!(set.distance(0, 1), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(set.distance(1, 2), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(set.distance(2, 0), 6.0, epsilon = 1e-12);
        assert_eq!(set.distance(1, 1), 0.0);
        assert_eq!(set.position(&Vertex::from([6.0, 0.0])), Some(2));
    }

    #[test]
    fn test_vertex_set_rejects_bad_input() {
        assert!(matches!(
            VertexSet::new(vec![]),
            Err(GraphMcmcError::InvalidInput(_))
        ));
        assert!(matches!(
            VertexSet::new(vec![Vertex::from([1.0, 1.0]), Vertex::from([1.0, 1.0])]),
            Err(GraphMcmcError::InvalidInput(_))
        ));
        assert!(matches!(
            VertexSet::new(vec![Vertex::from([f64::NAN, 1.0])]),
            Err(GraphMcmcError::InvalidInput(_))
        ));
        assert!(matches!(
            VertexSet::new(vec![Vertex::from([0.0]), Vertex::from([1.0, 1.0])]),
            Err(GraphMcmcError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_vertex_set_rejects_overflowing_distances() {
        // Finite coordinates whose squared differences overflow to infinity.
        let far = vec![
            Vertex::from([0.0, 0.0]),
            Vertex::from([1e200, 0.0]),
            Vertex::from([1e200, 1e200]),
            Vertex::from([0.0, 1e200]),
        ];
        assert!(matches!(
            VertexSet::new(far),
            Err(GraphMcmcError::InvalidInput(_))
        ));
        // Large but representable spreads are still fine.
        let wide = VertexSet::new(vec![Vertex::from([0.0, 0.0]), Vertex::from([3e150, 4e150])])
            .unwrap();
        assert_abs_diff_eq!(wide.distance(0, 1), 5e150, epsilon = 1e138);
    }

    #[test]
    fn test_vertex_display() {
        assert_eq!(Vertex::from([3.0, 4.5]).to_string(), "(3, 4.5)");
    }
}

//! Dense distance matrix.

use crate::error::{Error, Result};
use crate::models::PointSet;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A dense n×n distance matrix stored in row-major order.
///
/// Rows and columns are dense node indices (see [`PointSet::index_of`]).
/// Every matrix produced by this type is symmetric, has a zero diagonal and
/// holds finite non-negative entries.
///
/// # Examples
///
/// ```
/// use u_tsp_exact::models::PointSet;
/// use u_tsp_exact::distance::DistanceMatrix;
///
/// let points: PointSet = [(0, (0.0, 0.0)), (1, (3.0, 4.0)), (2, (6.0, 8.0))]
///     .into_iter()
///     .collect();
/// let dm = DistanceMatrix::from_points(&points).unwrap();
/// assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Computes a Euclidean distance matrix from point coordinates.
    ///
    /// Fails with `InvalidInput` on a non-finite coordinate or on a pair of
    /// finite points whose distance overflows.
    pub fn from_points(points: &PointSet) -> Result<Self> {
        points.validate()?;
        let coords: Vec<_> = points.iter().collect();
        let n = coords.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = coords[i].1.distance_to(coords[j].1);
                if !d.is_finite() {
                    return Err(Error::invalid_input(format!(
                        "distance between nodes {} and {} is not finite",
                        coords[i].0, coords[j].0
                    )));
                }
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Ok(Self { data, size: n })
    }

    /// Creates a distance matrix from an explicit n×n grid.
    ///
    /// The grid must be square, finite, non-negative, symmetric and have a
    /// zero diagonal.
    pub fn from_data(size: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != size * size {
            return Err(Error::invalid_input(format!(
                "expected {} entries for a {size}x{size} matrix, got {}",
                size * size,
                data.len()
            )));
        }
        if let Some(v) = data.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::invalid_input(format!(
                "distance {v} is not a finite non-negative value"
            )));
        }
        let dm = Self { data, size };
        if (0..size).any(|i| dm.get(i, i) != 0.0) {
            return Err(Error::invalid_input("diagonal must be zero"));
        }
        if !dm.is_symmetric(SYMMETRY_TOLERANCE) {
            return Err(Error::invalid_input("distance matrix must be symmetric"));
        }
        Ok(dm)
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Length of the closed tour visiting `order` (dense indices), closing
    /// edge included.
    pub fn tour_length(&self, order: &[usize]) -> f64 {
        let n = order.len();
        (0..n).map(|k| self.get(order[k], order[(k + 1) % n])).sum()
    }
}

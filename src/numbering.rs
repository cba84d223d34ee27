//! Global numbering of the GLL points of a mesh.
//!
//! Neighboring elements share the GLL points on their common edges and corners. The
//! numbering maps every GLL point `(iz, ix)` of every element to its global degree of
//! freedom (DOF), commonly called `ibool`.
use crate::grid_index;
use crate::metric::MetricField;
use crate::Real;
use log::info;
use nalgebra::Point2;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Tolerance for coincident GLL points, relative to the size of the bounding box of the mesh.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NumberingError {
    /// The length of the map is not a multiple of the number of GLL points per element.
    InvalidLength { len: usize, points_per_element: usize },
    /// Two GLL points of the same element are mapped to the same DOF.
    DuplicateDof {
        element_index: usize,
        iz: usize,
        ix: usize,
        dof: usize,
    },
}

impl fmt::Display for NumberingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength {
                len,
                points_per_element,
            } => write!(
                f,
                "Global numbering of length {} does not consist of whole elements with {} GLL points each",
                len, points_per_element
            ),
            Self::DuplicateDof {
                element_index,
                iz,
                ix,
                dof,
            } => write!(
                f,
                "GLL point (iz, ix) = ({}, {}) of element {} maps to DOF {}, which is already used by the same element",
                iz, ix, element_index, dof
            ),
        }
    }
}

impl Error for NumberingError {}

/// Map from the GLL points of every element to global DOF indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalNumbering {
    ngllz: usize,
    ngllx: usize,
    nglob: usize,
    // Element-major, ordered by `grid_index` within each element
    ibool: Vec<usize>,
}

impl GlobalNumbering {
    /// Creates a numbering from an externally computed map.
    ///
    /// `ibool` holds the DOFs of one element after the other, each ordered by
    /// [`grid_index`]. The number of global DOFs is one more than the largest index.
    pub fn from_ibool(ngllz: usize, ngllx: usize, ibool: Vec<usize>) -> Result<Self, NumberingError> {
        let points_per_element = ngllz * ngllx;
        if points_per_element == 0 || ibool.len() % points_per_element != 0 {
            return Err(NumberingError::InvalidLength {
                len: ibool.len(),
                points_per_element,
            });
        }

        let mut seen = Vec::with_capacity(points_per_element);
        for (element_index, dofs) in ibool.chunks_exact(points_per_element).enumerate() {
            seen.clear();
            for ix in 0..ngllx {
                for iz in 0..ngllz {
                    let dof = dofs[grid_index(iz, ix, ngllz)];
                    if seen.contains(&dof) {
                        return Err(NumberingError::DuplicateDof {
                            element_index,
                            iz,
                            ix,
                            dof,
                        });
                    }
                    seen.push(dof);
                }
            }
        }

        let nglob = ibool.iter().max().map_or(0, |max| max + 1);
        Ok(Self {
            ngllz,
            ngllx,
            nglob,
            ibool,
        })
    }

    /// Numbers the GLL points of a mesh by merging points that coincide to within the given
    /// absolute tolerance.
    ///
    /// DOFs are assigned in the order in which they are first encountered when traversing
    /// the elements in order, and the GLL points of each element in storage order.
    pub fn from_coordinates<T: Real>(metric: &MetricField<T>, tolerance: f64) -> Self {
        let (ngllz, ngllx) = metric.element_shape();
        let points: Vec<[f64; 2]> = metric.coordinates().iter().map(to_f64_point).collect();
        let groups = group_coincident_points(&points, tolerance);

        // Assign DOFs to groups in first-touch order
        let mut group_dofs = vec![usize::MAX; points.len()];
        let mut nglob = 0;
        let ibool = groups
            .iter()
            .map(|&group| {
                if group_dofs[group] == usize::MAX {
                    group_dofs[group] = nglob;
                    nglob += 1;
                }
                group_dofs[group]
            })
            .collect();

        info!(
            "Numbered {} GLL points of {} elements with {} global DOFs",
            points.len(),
            metric.num_elements(),
            nglob
        );

        Self {
            ngllz,
            ngllx,
            nglob,
            ibool,
        }
    }

    /// Numbers the GLL points of a mesh with a tolerance of [`DEFAULT_RELATIVE_TOLERANCE`]
    /// times the size of the bounding box of all GLL points.
    pub fn from_metric_field<T: Real>(metric: &MetricField<T>) -> Self {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in metric.coordinates().iter().map(to_f64_point) {
            for d in 0..2 {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }
        let extent = (max[0] - min[0]).max(max[1] - min[1]).max(0.0);
        let tolerance = if extent.is_finite() {
            DEFAULT_RELATIVE_TOLERANCE * extent
        } else {
            0.0
        };
        Self::from_coordinates(metric, tolerance)
    }

    /// Number of global DOFs.
    pub fn nglob(&self) -> usize {
        self.nglob
    }

    /// Grid dimensions `(ngllz, ngllx)` of each element.
    pub fn element_shape(&self) -> (usize, usize) {
        (self.ngllz, self.ngllx)
    }

    pub fn num_elements(&self) -> usize {
        self.ibool.len() / (self.ngllz * self.ngllx)
    }

    /// The DOFs of the element's GLL points, ordered by [`grid_index`].
    pub fn element_dofs(&self, element_index: usize) -> &[usize] {
        let n = self.ngllz * self.ngllx;
        &self.ibool[n * element_index..n * (element_index + 1)]
    }

    pub fn iglob(&self, element_index: usize, iz: usize, ix: usize) -> usize {
        self.element_dofs(element_index)[grid_index(iz, ix, self.ngllz)]
    }

    /// The DOF sets of all elements, in element order.
    pub fn element_dof_sets(&self) -> impl '_ + ExactSizeIterator<Item = &[usize]> {
        self.ibool.chunks_exact(self.ngllz * self.ngllx)
    }

    pub fn ibool(&self) -> &[usize] {
        &self.ibool
    }
}

fn to_f64_point<T: Real>(p: &Point2<T>) -> [f64; 2] {
    [p.x.to_subset().unwrap_or(f64::NAN), p.y.to_subset().unwrap_or(f64::NAN)]
}

/// Assigns every point the index of a representative point it coincides with.
///
/// Points are visited in order, and each point not yet assigned becomes the representative
/// of all unassigned points within `tolerance` of it, found through an R-tree.
fn group_coincident_points(points: &[[f64; 2]], tolerance: f64) -> Vec<usize> {
    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, &p)| GeomWithData::new(p, i))
            .collect(),
    );

    let mut groups = vec![usize::MAX; points.len()];
    for (i, point) in points.iter().enumerate() {
        if groups[i] != usize::MAX {
            continue;
        }
        groups[i] = i;
        for neighbor in tree.locate_within_distance(*point, tolerance * tolerance) {
            if groups[neighbor.data] == usize::MAX {
                groups[neighbor.data] = i;
            }
        }
    }
    groups
}

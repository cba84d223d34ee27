//! Metric terms of the isoparametric mapping, cached at every GLL point of a mesh.
//!
//! The metric terms are the entries of the inverse Jacobian matrix,
//!
//! ```text
//! [ xix     xiz    ]   [ dxi/dx     dxi/dz    ]
//! [ gammax  gammaz ] = [ dgamma/dx  dgamma/dz ],
//! ```
//!
//! which the gradient kernel uses to turn reference derivatives into physical derivatives.
//! The geometry of a mesh does not change during a simulation, so the terms are computed once
//! and the Jacobian of every element is validated only at that point.
use crate::grid_index;
use crate::jacobian::{
    compute_locations_from_shape_functions, compute_partial_derivatives_from_shape_derivatives, PartialDerivatives,
};
use crate::mesh::SpectralMesh;
use crate::quadrature::ElementQuadrature;
use crate::shape::ShapeFunctionTable;
use crate::Real;
use log::{info, warn};
use nalgebra::Point2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Default ratio of largest to smallest Jacobian within an element above which the element
/// is reported as strongly distorted.
pub const DEFAULT_DISTORTION_WARNING_RATIO: f64 = 10.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTerms<T> {
    pub xix: T,
    pub xiz: T,
    pub gammax: T,
    pub gammaz: T,
    /// The Jacobian determinant of the mapping.
    pub jacobian: T,
}

impl<T: Real> MetricTerms<T> {
    /// Inverts the Jacobian matrix given by the partial derivatives.
    ///
    /// The Jacobian is not validated. A vanishing determinant produces non-finite terms.
    pub fn from_partial_derivatives(pd: &PartialDerivatives<T>) -> Self {
        let jacobian = pd.jacobian();
        Self {
            xix: pd.dz_dgamma / jacobian,
            xiz: -pd.dx_dgamma / jacobian,
            gammax: -pd.dz_dxi / jacobian,
            gammaz: pd.dx_dxi / jacobian,
            jacobian,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GeometryError {
    /// The mapping of an element is degenerate or inverted at a GLL point.
    NonPositiveJacobian {
        element_index: usize,
        iz: usize,
        ix: usize,
        jacobian: f64,
    },
}

impl GeometryError {
    /// The index of the offending element.
    pub fn element_index(&self) -> usize {
        match self {
            Self::NonPositiveJacobian { element_index, .. } => *element_index,
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveJacobian {
                element_index,
                iz,
                ix,
                jacobian,
            } => write!(
                f,
                "Non-positive Jacobian {:e} in element {} at GLL point (iz, ix) = ({}, {}). \
                 The element is inverted or its control nodes are ordered incorrectly.",
                jacobian, element_index, iz, ix
            ),
        }
    }
}

impl Error for GeometryError {}

/// Metric terms and physical coordinates at every GLL point of every element of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricField<T: Real> {
    ngllz: usize,
    ngllx: usize,
    // Element-major, ordered by `grid_index` within each element
    terms: Vec<MetricTerms<T>>,
    coordinates: Vec<Point2<T>>,
}

/// The metric terms and GLL point coordinates of a single element.
#[derive(Debug, Copy, Clone)]
pub struct ElementMetric<'a, T: Real> {
    ngllz: usize,
    terms: &'a [MetricTerms<T>],
    coordinates: &'a [Point2<T>],
}

impl<'a, T: Real> ElementMetric<'a, T> {
    /// The terms at every GLL point, ordered by [`grid_index`].
    pub fn terms(&self) -> &'a [MetricTerms<T>] {
        self.terms
    }

    pub fn coordinates(&self) -> &'a [Point2<T>] {
        self.coordinates
    }

    pub fn at(&self, iz: usize, ix: usize) -> &'a MetricTerms<T> {
        &self.terms[grid_index(iz, ix, self.ngllz)]
    }

    pub fn coordinate_at(&self, iz: usize, ix: usize) -> &'a Point2<T> {
        &self.coordinates[grid_index(iz, ix, self.ngllz)]
    }
}

struct ElementGeometry<T: Real> {
    terms: Vec<MetricTerms<T>>,
    coordinates: Vec<Point2<T>>,
    min_jacobian: T,
    max_jacobian: T,
}

fn compute_element_geometry<T: Real>(
    mesh: &SpectralMesh<T>,
    table: &ShapeFunctionTable<T>,
    element_index: usize,
) -> Result<ElementGeometry<T>, GeometryError> {
    let (ngllz, ngllx) = table.shape();
    let mut coorg = Vec::with_capacity(mesh.layout().num_control_nodes());
    mesh.populate_element_control_nodes(&mut coorg, element_index);

    let mut terms = Vec::with_capacity(ngllz * ngllx);
    let mut coordinates = Vec::with_capacity(ngllz * ngllx);
    let mut min_jacobian = T::max_value().unwrap_or_else(T::one);
    let mut max_jacobian = T::zero();
    // Iterate in storage order, so that pushing yields grid_index ordering
    for ix in 0..ngllx {
        for iz in 0..ngllz {
            let pd = compute_partial_derivatives_from_shape_derivatives(&coorg, table.derivatives(iz, ix));
            let jacobian = pd.jacobian();
            if !(jacobian > T::zero()) {
                return Err(GeometryError::NonPositiveJacobian {
                    element_index,
                    iz,
                    ix,
                    jacobian: jacobian.to_subset().unwrap_or(f64::NAN),
                });
            }
            min_jacobian = min_jacobian.min(jacobian);
            max_jacobian = max_jacobian.max(jacobian);
            terms.push(MetricTerms::from_partial_derivatives(&pd));
            coordinates.push(compute_locations_from_shape_functions(&coorg, table.values(iz, ix).as_slice()));
        }
    }

    Ok(ElementGeometry {
        terms,
        coordinates,
        min_jacobian,
        max_jacobian,
    })
}

impl<T: Real> MetricField<T> {
    /// Computes the metric terms of every element, warning about elements whose Jacobian
    /// varies by more than [`DEFAULT_DISTORTION_WARNING_RATIO`].
    pub fn compute(mesh: &SpectralMesh<T>, quadrature: &ElementQuadrature<T>) -> Result<Self, GeometryError> {
        Self::compute_with_warning_ratio(mesh, quadrature, DEFAULT_DISTORTION_WARNING_RATIO)
    }

    /// Computes the metric terms of every element.
    ///
    /// Fails if the Jacobian is not strictly positive at some GLL point. If several elements
    /// are invalid, the error refers to the one with the smallest index.
    pub fn compute_with_warning_ratio(
        mesh: &SpectralMesh<T>,
        quadrature: &ElementQuadrature<T>,
        distortion_warning_ratio: f64,
    ) -> Result<Self, GeometryError> {
        let table = ShapeFunctionTable::new(mesh.layout(), quadrature.x.points(), quadrature.z.points());
        let (ngllz, ngllx) = table.shape();

        let results: Vec<_> = (0..mesh.num_elements())
            .into_par_iter()
            .map(|element_index| compute_element_geometry(mesh, &table, element_index))
            .collect();

        let num_points = mesh.num_elements() * ngllz * ngllx;
        let mut terms = Vec::with_capacity(num_points);
        let mut coordinates = Vec::with_capacity(num_points);
        let mut num_distorted = 0;
        for (element_index, result) in results.into_iter().enumerate() {
            let geometry = result?;
            let ratio = (geometry.max_jacobian / geometry.min_jacobian)
                .to_subset()
                .unwrap_or(f64::INFINITY);
            if ratio > distortion_warning_ratio {
                num_distorted += 1;
                warn!(
                    "Element {} is strongly distorted: Jacobian varies by a factor of {:.3e} (threshold {})",
                    element_index, ratio, distortion_warning_ratio
                );
            }
            terms.extend(geometry.terms);
            coordinates.extend(geometry.coordinates);
        }

        info!(
            "Computed metric terms for {} elements with {} x {} GLL points ({} strongly distorted)",
            mesh.num_elements(),
            ngllz,
            ngllx,
            num_distorted
        );

        Ok(Self {
            ngllz,
            ngllx,
            terms,
            coordinates,
        })
    }
}

impl<T: Real> MetricField<T> {
    /// Grid dimensions `(ngllz, ngllx)` of each element.
    pub fn element_shape(&self) -> (usize, usize) {
        (self.ngllz, self.ngllx)
    }

    fn points_per_element(&self) -> usize {
        self.ngllz * self.ngllx
    }

    pub fn num_elements(&self) -> usize {
        if self.points_per_element() == 0 {
            0
        } else {
            self.terms.len() / self.points_per_element()
        }
    }

    /// # Panics
    ///
    /// Panics if the element index is out of bounds.
    pub fn element(&self, element_index: usize) -> ElementMetric<'_, T> {
        let n = self.points_per_element();
        let range = n * element_index..n * (element_index + 1);
        ElementMetric {
            ngllz: self.ngllz,
            terms: &self.terms[range.clone()],
            coordinates: &self.coordinates[range],
        }
    }

    /// Coordinates of all GLL points, element by element.
    pub fn coordinates(&self) -> &[Point2<T>] {
        &self.coordinates
    }
}

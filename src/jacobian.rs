//! The isoparametric mapping from the reference square to a physical element.
//!
//! All functions take the coordinates of the element's control nodes (`coorg`) in the order
//! described in [`shape`](crate::shape). The functions perform no validation of the
//! resulting geometry; the Jacobian of every element is checked once, when the
//! [`MetricField`](crate::metric::MetricField) is built.
use crate::shape::{shape_function_derivatives, shape_functions, ControlNodeLayout};
use crate::Real;
use itertools::izip;
use nalgebra::{Matrix2, Matrix2xX, Point2};
use serde::{Deserialize, Serialize};

/// Partial derivatives of the physical coordinates with respect to the reference coordinates
/// at a single point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDerivatives<T> {
    pub dx_dxi: T,
    pub dz_dxi: T,
    pub dx_dgamma: T,
    pub dz_dgamma: T,
}

impl<T: Real> PartialDerivatives<T> {
    /// The determinant of the Jacobian matrix.
    pub fn jacobian(&self) -> T {
        compute_jacobian(self.dx_dxi, self.dz_dxi, self.dx_dgamma, self.dz_dgamma)
    }

    /// The Jacobian matrix `[[dx/dxi, dx/dgamma], [dz/dxi, dz/dgamma]]`.
    pub fn to_matrix(&self) -> Matrix2<T> {
        Matrix2::new(self.dx_dxi, self.dx_dgamma, self.dz_dxi, self.dz_dgamma)
    }
}

fn assert_control_node_count<T: Real>(coorg: &[Point2<T>], expected: usize) {
    assert_eq!(
        coorg.len(),
        expected,
        "Number of control node coordinates does not match the number of shape functions"
    );
}

/// Maps the reference coordinates `xi = (xi, gamma)` to physical coordinates `(x, z)`.
pub fn compute_locations<T: Real>(coorg: &[Point2<T>], layout: ControlNodeLayout, xi: &Point2<T>) -> Point2<T> {
    let shape = shape_functions(layout, xi);
    compute_locations_from_shape_functions(coorg, shape.as_slice())
}

/// Physical coordinates of a point given the shape function values at the point.
///
/// # Panics
///
/// Panics if there is not exactly one shape function value per control node.
pub fn compute_locations_from_shape_functions<T: Real>(coorg: &[Point2<T>], shape: &[T]) -> Point2<T> {
    assert_control_node_count(coorg, shape.len());
    let mut location = Point2::origin();
    for (x_a, &n_a) in izip!(coorg, shape) {
        location.coords += x_a.coords * n_a;
    }
    location
}

/// Partial derivatives of the mapping at the reference coordinates `xi = (xi, gamma)`.
pub fn compute_partial_derivatives<T: Real>(
    coorg: &[Point2<T>],
    layout: ControlNodeLayout,
    xi: &Point2<T>,
) -> PartialDerivatives<T> {
    let dershape = shape_function_derivatives(layout, xi);
    compute_partial_derivatives_from_shape_derivatives(coorg, &dershape)
}

/// Partial derivatives of the mapping given the shape function derivatives at the point.
///
/// # Panics
///
/// Panics if there is not exactly one column of derivatives per control node.
pub fn compute_partial_derivatives_from_shape_derivatives<T: Real>(
    coorg: &[Point2<T>],
    dershape: &Matrix2xX<T>,
) -> PartialDerivatives<T> {
    assert_control_node_count(coorg, dershape.ncols());
    let mut pd = PartialDerivatives {
        dx_dxi: T::zero(),
        dz_dxi: T::zero(),
        dx_dgamma: T::zero(),
        dz_dgamma: T::zero(),
    };
    for (x_a, dn_a) in izip!(coorg, dershape.column_iter()) {
        pd.dx_dxi += dn_a[0] * x_a.x;
        pd.dz_dxi += dn_a[0] * x_a.y;
        pd.dx_dgamma += dn_a[1] * x_a.x;
        pd.dz_dgamma += dn_a[1] * x_a.y;
    }
    pd
}

/// The Jacobian determinant `(dx/dxi)(dz/dgamma) - (dx/dgamma)(dz/dxi)`.
pub fn compute_jacobian<T: Real>(dx_dxi: T, dz_dxi: T, dx_dgamma: T, dz_dgamma: T) -> T {
    dx_dxi * dz_dgamma - dx_dgamma * dz_dxi
}

/// The Jacobian determinant of the mapping at the reference coordinates `xi = (xi, gamma)`.
pub fn compute_jacobian_at<T: Real>(coorg: &[Point2<T>], layout: ControlNodeLayout, xi: &Point2<T>) -> T {
    compute_partial_derivatives(coorg, layout, xi).jacobian()
}

//! Isoparametric shape functions of the control-node layouts of a spectral element.
//!
//! Control nodes are ordered as follows, in reference coordinates `(xi, gamma)`:
//!
//! ```text
//!   3 ---- 6 ---- 2
//!   |             |
//!   7      8      5        (-1, -1), (1, -1), (1, 1), (-1, 1),
//!   |             |        (0, -1), (1, 0), (0, 1), (-1, 0),
//!   0 ---- 4 ---- 1        (0, 0)
//! ```
//!
//! A 4-node element only has the corners `0 ..= 3`. Shape functions assume this ordering;
//! a mesh that violates it silently produces wrong geometry.
use crate::{grid_index, Real};
use nalgebra::{DVector, Dyn, Matrix2xX, Point2, Vector2, U2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;

/// The number and placement of control nodes defining the geometry of an element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum ControlNodeLayout {
    /// Four corner nodes, bilinear shape functions.
    Quad4,
    /// Corners, edge midpoints and center, biquadratic shape functions.
    Quad9,
}

/// The requested number of control nodes per element is not supported.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnsupportedControlNodeCount(pub usize);

impl fmt::Display for UnsupportedControlNodeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported number of control nodes per element (ngnod = {}), expected 4 or 9",
            self.0
        )
    }
}

impl Error for UnsupportedControlNodeCount {}

impl TryFrom<usize> for ControlNodeLayout {
    type Error = UnsupportedControlNodeCount;

    fn try_from(ngnod: usize) -> Result<Self, Self::Error> {
        match ngnod {
            4 => Ok(Self::Quad4),
            9 => Ok(Self::Quad9),
            _ => Err(UnsupportedControlNodeCount(ngnod)),
        }
    }
}

impl From<ControlNodeLayout> for usize {
    fn from(layout: ControlNodeLayout) -> Self {
        layout.num_control_nodes()
    }
}

impl ControlNodeLayout {
    /// The number of control nodes per element, commonly called `ngnod`.
    pub fn num_control_nodes(&self) -> usize {
        match self {
            Self::Quad4 => 4,
            Self::Quad9 => 9,
        }
    }

    /// Reference coordinates of the control nodes, in layout order.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference_control_nodes<T: Real>(&self) -> Vec<Point2<T>> {
        let p = |x, y| Point2::new(x, y);
        let mut nodes = vec![p(-1.0, -1.0), p(1.0, -1.0), p(1.0, 1.0), p(-1.0, 1.0)];
        if let Self::Quad9 = self {
            nodes.extend([p(0.0, -1.0), p(1.0, 0.0), p(0.0, 1.0), p(-1.0, 0.0), p(0.0, 0.0)]);
        }
        nodes
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad4_phi<T: Real>(alpha: T, beta: T, xi: &Point2<T>) -> T {
    (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad4_phi_grad<T: Real>(alpha: T, beta: T, xi: &Point2<T>) -> Vector2<T> {
    Vector2::new(alpha * (1.0 + beta * xi[1]) / 4.0, beta * (1.0 + alpha * xi[0]) / 4.0)
}

/// The 1D quadratic Lagrange polynomial that is one at `alpha` and zero at the two other
/// points of `{-1, 0, 1}`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi * xi + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_grad_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

/// Evaluates all shape functions `N_a(xi, gamma)` of the layout into `values`.
///
/// # Panics
///
/// Panics if `values` does not have exactly one entry per control node.
#[rustfmt::skip]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn populate_shape_functions<T: Real>(layout: ControlNodeLayout, values: &mut [T], xi: &Point2<T>) {
    assert_eq!(values.len(), layout.num_control_nodes(), "Shape function buffer has wrong length");
    match layout {
        ControlNodeLayout::Quad4 => {
            values[0] = quad4_phi(-1.0, -1.0, xi);
            values[1] = quad4_phi( 1.0, -1.0, xi);
            values[2] = quad4_phi( 1.0,  1.0, xi);
            values[3] = quad4_phi(-1.0,  1.0, xi);
        }
        ControlNodeLayout::Quad9 => {
            // Separable: N_{alpha, beta}(xi, gamma) = N_alpha(xi) * N_beta(gamma)
            let phi = |alpha, beta| quad9_phi_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1]);
            values[0] = phi(-1.0, -1.0);
            values[1] = phi( 1.0, -1.0);
            values[2] = phi( 1.0,  1.0);
            values[3] = phi(-1.0,  1.0);
            values[4] = phi( 0.0, -1.0);
            values[5] = phi( 1.0,  0.0);
            values[6] = phi( 0.0,  1.0);
            values[7] = phi(-1.0,  0.0);
            values[8] = phi( 0.0,  0.0);
        }
    }
}

/// Evaluates the local derivatives of all shape functions into `derivatives`.
///
/// Column `a` holds `(dN_a/dxi, dN_a/dgamma)`.
///
/// # Panics
///
/// Panics if `derivatives` does not have exactly one column per control node.
#[rustfmt::skip]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn populate_shape_function_derivatives<T: Real>(
    layout: ControlNodeLayout,
    derivatives: &mut Matrix2xX<T>,
    xi: &Point2<T>,
) {
    assert_eq!(derivatives.ncols(), layout.num_control_nodes(), "Derivative buffer has wrong number of columns");
    match layout {
        ControlNodeLayout::Quad4 => {
            derivatives.set_column(0, &quad4_phi_grad(-1.0, -1.0, xi));
            derivatives.set_column(1, &quad4_phi_grad( 1.0, -1.0, xi));
            derivatives.set_column(2, &quad4_phi_grad( 1.0,  1.0, xi));
            derivatives.set_column(3, &quad4_phi_grad(-1.0,  1.0, xi));
        }
        ControlNodeLayout::Quad9 => {
            let (x, y) = (xi[0], xi[1]);
            let phi_grad = |alpha, beta| Vector2::new(
                quad9_phi_1d(beta, y) * quad9_phi_grad_1d(alpha, x),
                quad9_phi_1d(alpha, x) * quad9_phi_grad_1d(beta, y),
            );
            derivatives.set_column(0, &phi_grad(-1.0, -1.0));
            derivatives.set_column(1, &phi_grad( 1.0, -1.0));
            derivatives.set_column(2, &phi_grad( 1.0,  1.0));
            derivatives.set_column(3, &phi_grad(-1.0,  1.0));
            derivatives.set_column(4, &phi_grad( 0.0, -1.0));
            derivatives.set_column(5, &phi_grad( 1.0,  0.0));
            derivatives.set_column(6, &phi_grad( 0.0,  1.0));
            derivatives.set_column(7, &phi_grad(-1.0,  0.0));
            derivatives.set_column(8, &phi_grad( 0.0,  0.0));
        }
    }
}

/// Shape function values `N_a(xi, gamma)` for every control node of the layout.
pub fn shape_functions<T: Real>(layout: ControlNodeLayout, xi: &Point2<T>) -> DVector<T> {
    let mut values = DVector::zeros(layout.num_control_nodes());
    populate_shape_functions(layout, values.as_mut_slice(), xi);
    values
}

/// Local shape function derivatives, one column `(dN_a/dxi, dN_a/dgamma)` per control node.
pub fn shape_function_derivatives<T: Real>(layout: ControlNodeLayout, xi: &Point2<T>) -> Matrix2xX<T> {
    let mut derivatives = Matrix2xX::zeros_generic(U2, Dyn(layout.num_control_nodes()));
    populate_shape_function_derivatives(layout, &mut derivatives, xi);
    derivatives
}

/// Shape functions and their derivatives tabulated at every point of a tensor-product grid.
///
/// Every element of a mesh shares the same reference grid, so the table is computed once
/// and reused for all elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFunctionTable<T: Real> {
    layout: ControlNodeLayout,
    ngllz: usize,
    ngllx: usize,
    values: Vec<DVector<T>>,
    derivatives: Vec<Matrix2xX<T>>,
}

impl<T: Real> ShapeFunctionTable<T> {
    /// Tabulates the layout's shape functions at the points `(xi_nodes[ix], gamma_nodes[iz])`.
    pub fn new(layout: ControlNodeLayout, xi_nodes: &[T], gamma_nodes: &[T]) -> Self {
        let (ngllx, ngllz) = (xi_nodes.len(), gamma_nodes.len());
        let mut values = vec![DVector::zeros(0); ngllx * ngllz];
        let mut derivatives = vec![Matrix2xX::zeros_generic(U2, Dyn(0)); ngllx * ngllz];
        for (ix, &xi) in xi_nodes.iter().enumerate() {
            for (iz, &gamma) in gamma_nodes.iter().enumerate() {
                let p = Point2::new(xi, gamma);
                let idx = grid_index(iz, ix, ngllz);
                values[idx] = shape_functions(layout, &p);
                derivatives[idx] = shape_function_derivatives(layout, &p);
            }
        }
        Self {
            layout,
            ngllz,
            ngllx,
            values,
            derivatives,
        }
    }

    pub fn layout(&self) -> ControlNodeLayout {
        self.layout
    }

    /// Grid dimensions `(ngllz, ngllx)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ngllz, self.ngllx)
    }

    pub fn values(&self, iz: usize, ix: usize) -> &DVector<T> {
        &self.values[grid_index(iz, ix, self.ngllz)]
    }

    pub fn derivatives(&self, iz: usize, ix: usize) -> &Matrix2xX<T> {
        &self.derivatives[grid_index(iz, ix, self.ngllz)]
    }
}

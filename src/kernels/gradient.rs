use crate::allocators::ElementAllocator;
use crate::grid_index;
use crate::metric::MetricTerms;
use crate::Real;
use nalgebra::{Const, DefaultAllocator, Dim, OMatrix, SMatrix};
use serde::{Deserialize, Serialize};

/// Spatial derivatives of a two-component field at a single GLL point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementGradient<T> {
    pub duxdx: T,
    pub duxdz: T,
    pub duzdx: T,
    pub duzdz: T,
}

/// Spatial derivatives of a two-component field at every GLL point of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGradients<T: Real, Z: Dim, X: Dim>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    pub duxdx: OMatrix<T, Z, X>,
    pub duxdz: OMatrix<T, Z, X>,
    pub duzdx: OMatrix<T, Z, X>,
    pub duzdz: OMatrix<T, Z, X>,
}

impl<T: Real, Z: Dim, X: Dim> FieldGradients<T, Z, X>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    pub fn zeros_generic(z: Z, x: X) -> Self {
        Self {
            duxdx: OMatrix::zeros_generic(z, x),
            duxdz: OMatrix::zeros_generic(z, x),
            duzdx: OMatrix::zeros_generic(z, x),
            duzdz: OMatrix::zeros_generic(z, x),
        }
    }

    pub fn at(&self, iz: usize, ix: usize) -> DisplacementGradient<T> {
        DisplacementGradient {
            duxdx: self.duxdx[(iz, ix)],
            duxdz: self.duxdz[(iz, ix)],
            duzdx: self.duzdx[(iz, ix)],
            duzdz: self.duzdz[(iz, ix)],
        }
    }
}

/// Computes the spatial derivatives of a two-component field at the GLL points of an element.
///
/// The reference derivatives are obtained by applying the 1D differentiation matrices along
/// each direction,
///
/// ```text
/// df/dxi(iz, ix)    = sum_l hprime_xx(ix, l) f(iz, l),
/// df/dgamma(iz, ix) = sum_l hprime_zz(iz, l) f(l, ix),
/// ```
///
/// and combined with the metric terms into `df/dx = xix df/dxi + gammax df/dgamma` and
/// `df/dz = xiz df/dxi + gammaz df/dgamma`. The metric terms are ordered by [`grid_index`].
///
/// # Panics
///
/// Dimensions are only checked in debug builds. Inconsistent dimensions panic there and
/// give unspecified results or an out-of-bounds panic otherwise.
pub fn compute_gradients_2d<T, Z, X>(
    hprime_xx: &OMatrix<T, X, X>,
    hprime_zz: &OMatrix<T, Z, Z>,
    metric: &[MetricTerms<T>],
    field_x: &OMatrix<T, Z, X>,
    field_z: &OMatrix<T, Z, X>,
    gradients: &mut FieldGradients<T, Z, X>,
) where
    T: Real,
    Z: Dim,
    X: Dim,
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    let (nz, nx) = field_x.shape();
    debug_assert_eq!(field_z.shape(), (nz, nx), "Field components must have the same shape");
    debug_assert_eq!(hprime_xx.shape(), (nx, nx), "Differentiation matrix along xi has wrong shape");
    debug_assert_eq!(hprime_zz.shape(), (nz, nz), "Differentiation matrix along gamma has wrong shape");
    debug_assert_eq!(metric.len(), nz * nx, "Need exactly one set of metric terms per GLL point");
    debug_assert_eq!(gradients.duxdx.shape(), (nz, nx), "Gradient storage has wrong shape");

    for ix in 0..nx {
        for iz in 0..nz {
            let mut sum_hprime_x1 = T::zero();
            let mut sum_hprime_x3 = T::zero();
            for l in 0..nx {
                let h = hprime_xx[(ix, l)];
                sum_hprime_x1 += h * field_x[(iz, l)];
                sum_hprime_x3 += h * field_z[(iz, l)];
            }

            let mut sum_hprime_z1 = T::zero();
            let mut sum_hprime_z3 = T::zero();
            for l in 0..nz {
                let h = hprime_zz[(iz, l)];
                sum_hprime_z1 += h * field_x[(l, ix)];
                sum_hprime_z3 += h * field_z[(l, ix)];
            }

            let m = &metric[grid_index(iz, ix, nz)];
            gradients.duxdx[(iz, ix)] = m.xix * sum_hprime_x1 + m.gammax * sum_hprime_z1;
            gradients.duxdz[(iz, ix)] = m.xiz * sum_hprime_x1 + m.gammaz * sum_hprime_z1;
            gradients.duzdx[(iz, ix)] = m.xix * sum_hprime_x3 + m.gammax * sum_hprime_z3;
            gradients.duzdz[(iz, ix)] = m.xiz * sum_hprime_x3 + m.gammaz * sum_hprime_z3;
        }
    }
}

/// [`compute_gradients_2d`] for an `N x N` grid of GLL points known at compile time.
pub fn compute_gradients_2d_fixed<T: Real, const N: usize>(
    hprime_xx: &SMatrix<T, N, N>,
    hprime_zz: &SMatrix<T, N, N>,
    metric: &[MetricTerms<T>],
    field_x: &SMatrix<T, N, N>,
    field_z: &SMatrix<T, N, N>,
    gradients: &mut FieldGradients<T, Const<N>, Const<N>>,
) {
    compute_gradients_2d(hprime_xx, hprime_zz, metric, field_x, field_z, gradients)
}

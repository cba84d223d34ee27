use crate::allocators::ElementAllocator;
use crate::field::ScatterTarget;
use crate::grid_index;
use crate::metric::MetricTerms;
use crate::Real;
use nalgebra::{Const, DefaultAllocator, Dim, OMatrix, OVector, SMatrix, SVector, Vector2};
use serde::{Deserialize, Serialize};

/// The symmetric stress tensor at a single GLL point.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stress<T> {
    pub sigma_xx: T,
    pub sigma_zz: T,
    pub sigma_xz: T,
}

/// Stress combined with the metric terms and the Jacobian at every GLL point of an element.
///
/// `integrand1` and `integrand2` are the `x` and `z` components of the flux through lines of
/// constant `xi`, `integrand3` and `integrand4` the flux through lines of constant `gamma`.
#[derive(Debug, Clone, PartialEq)]
pub struct StressIntegrands<T: Real, Z: Dim, X: Dim>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    pub integrand1: OMatrix<T, Z, X>,
    pub integrand2: OMatrix<T, Z, X>,
    pub integrand3: OMatrix<T, Z, X>,
    pub integrand4: OMatrix<T, Z, X>,
}

impl<T: Real, Z: Dim, X: Dim> StressIntegrands<T, Z, X>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    pub fn zeros_generic(z: Z, x: X) -> Self {
        Self {
            integrand1: OMatrix::zeros_generic(z, x),
            integrand2: OMatrix::zeros_generic(z, x),
            integrand3: OMatrix::zeros_generic(z, x),
            integrand4: OMatrix::zeros_generic(z, x),
        }
    }

    pub fn fill_zero(&mut self) {
        self.integrand1.fill(T::zero());
        self.integrand2.fill(T::zero());
        self.integrand3.fill(T::zero());
        self.integrand4.fill(T::zero());
    }

    /// Adds the integrands of the given stress at the GLL point `(iz, ix)`.
    pub fn accumulate_from_stress(&mut self, iz: usize, ix: usize, metric: &MetricTerms<T>, stress: &Stress<T>) {
        let MetricTerms {
            xix,
            xiz,
            gammax,
            gammaz,
            jacobian,
        } = *metric;
        let Stress {
            sigma_xx,
            sigma_zz,
            sigma_xz,
        } = *stress;
        self.integrand1[(iz, ix)] += jacobian * (sigma_xx * xix + sigma_xz * xiz);
        self.integrand2[(iz, ix)] += jacobian * (sigma_xz * xix + sigma_zz * xiz);
        self.integrand3[(iz, ix)] += jacobian * (sigma_xx * gammax + sigma_xz * gammaz);
        self.integrand4[(iz, ix)] += jacobian * (sigma_xz * gammax + sigma_zz * gammaz);
    }
}

/// Integrates the stress integrands of an element against the derivatives of the basis
/// functions and adds the result into `target`.
///
/// For each GLL point, the contribution to the `x` component is
///
/// ```text
/// -( wz(iz) sum_l hprimewgll_xx(ix, l) integrand1(iz, l)
///  + wx(ix) sum_l hprimewgll_zz(iz, l) integrand3(l, ix) ),
/// ```
///
/// and analogously with `integrand2` and `integrand4` for the `z` component. The result is
/// the action `-K u` of the stiffness operator. Contributions are passed to `target` by
/// [`grid_index`].
///
/// # Panics
///
/// Dimensions are only checked in debug builds. Inconsistent dimensions panic there and
/// give unspecified results or an out-of-bounds panic otherwise.
pub fn add_contributions<T, Z, X, S>(
    hprimewgll_xx: &OMatrix<T, X, X>,
    hprimewgll_zz: &OMatrix<T, Z, Z>,
    wx: &OVector<T, X>,
    wz: &OVector<T, Z>,
    integrands: &StressIntegrands<T, Z, X>,
    target: &mut S,
) where
    T: Real,
    Z: Dim,
    X: Dim,
    S: ?Sized + ScatterTarget<T>,
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    let (nz, nx) = integrands.integrand1.shape();
    debug_assert_eq!(hprimewgll_xx.shape(), (nx, nx), "Weighted differentiation matrix along xi has wrong shape");
    debug_assert_eq!(hprimewgll_zz.shape(), (nz, nz), "Weighted differentiation matrix along gamma has wrong shape");
    debug_assert_eq!(wx.len(), nx, "Weights along xi have wrong length");
    debug_assert_eq!(wz.len(), nz, "Weights along gamma have wrong length");

    for ix in 0..nx {
        for iz in 0..nz {
            let mut tempx1 = T::zero();
            let mut tempz1 = T::zero();
            for l in 0..nx {
                let h = hprimewgll_xx[(ix, l)];
                tempx1 += h * integrands.integrand1[(iz, l)];
                tempz1 += h * integrands.integrand2[(iz, l)];
            }

            let mut tempx3 = T::zero();
            let mut tempz3 = T::zero();
            for l in 0..nz {
                let h = hprimewgll_zz[(iz, l)];
                tempx3 += h * integrands.integrand3[(l, ix)];
                tempz3 += h * integrands.integrand4[(l, ix)];
            }

            let sum_terms_x = -(wz[iz] * tempx1 + wx[ix] * tempx3);
            let sum_terms_z = -(wz[iz] * tempz1 + wx[ix] * tempz3);
            target.add_local(grid_index(iz, ix, nz), Vector2::new(sum_terms_x, sum_terms_z));
        }
    }
}

/// [`add_contributions`] for an `N x N` grid of GLL points known at compile time.
pub fn add_contributions_fixed<T, S, const N: usize>(
    hprimewgll_xx: &SMatrix<T, N, N>,
    hprimewgll_zz: &SMatrix<T, N, N>,
    wx: &SVector<T, N>,
    wz: &SVector<T, N>,
    integrands: &StressIntegrands<T, Const<N>, Const<N>>,
    target: &mut S,
) where
    T: Real,
    S: ?Sized + ScatterTarget<T>,
{
    add_contributions(hprimewgll_xx, hprimewgll_zz, wx, wz, integrands, target)
}

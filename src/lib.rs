//! Spectral-element geometry and matrix-free elastic stiffness kernels in two dimensions.
//!
//! The crate covers the per-element core of a spectral-element wave solver:
//!
//! - [`shape`] and [`jacobian`] map the reference square onto curved 4- or 9-node
//!   quadrilaterals,
//! - [`metric`] caches the inverted Jacobian (metric terms) at every GLL point of every
//!   element, validating the geometry once,
//! - [`kernels`] computes field gradients and integrates stress integrands back into a
//!   global acceleration field,
//! - [`operator`] drives the kernels over all elements, sequentially or in parallel over a
//!   graph coloring of the elements.
use nalgebra::RealField;

pub mod allocators;
pub mod config;
pub mod field;
pub mod jacobian;
pub mod kernels;
pub mod mesh;
pub mod metric;
pub mod numbering;
pub mod operator;
pub mod quadrature;
pub mod scratch;
pub mod shape;

pub(crate) mod workspace;

pub extern crate nalgebra;
pub extern crate sem2d_paradis as paradis;

/// Scalar type used throughout the crate.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// Index of the GLL point `(iz, ix)` in flat per-element arrays.
///
/// Element grids are stored column-major with `iz` as the row index, which is the storage
/// order of an `ngllz x ngllx` [`nalgebra`] matrix.
#[inline(always)]
pub fn grid_index(iz: usize, ix: usize, ngllz: usize) -> usize {
    ix * ngllz + iz
}

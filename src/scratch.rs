//! Per-element scratch storage.
//!
//! Processing an element needs a handful of small tensors. They are kept in an
//! [`ElementScratch`], which is checked out of a [`ScratchPool`] for the duration of a single
//! element through a [`ScratchScope`], and returned to the pool when the scope ends, whether
//! processing succeeded or panicked.
use crate::allocators::ElementAllocator;
use crate::kernels::{FieldGradients, StressIntegrands};
use crate::quadrature::{ElementQuadrature, GllQuadrature};
use crate::workspace::Workspace;
use crate::Real;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DefaultAllocator, Dim, OMatrix, OVector, Vector2, U1};
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Scratch tensors for processing a single element with a `Z x X` grid of GLL points.
///
/// The quadrature tables are copied in on creation, so that kernels operate on tensors of
/// the same (possibly fixed) dimensions as the element tensors.
#[derive(Debug, Clone)]
pub struct ElementScratch<T: Real, Z: Dim, X: Dim>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    pub hprime_xx: OMatrix<T, X, X>,
    pub hprime_zz: OMatrix<T, Z, Z>,
    pub hprimewgll_xx: OMatrix<T, X, X>,
    pub hprimewgll_zz: OMatrix<T, Z, Z>,
    pub wx: OVector<T, X>,
    pub wz: OVector<T, Z>,
    pub field_x: OMatrix<T, Z, X>,
    pub field_z: OMatrix<T, Z, X>,
    pub gradients: FieldGradients<T, Z, X>,
    pub integrands: StressIntegrands<T, Z, X>,
}

fn load_table<T: Real, D: Dim>(n: D, table: &DMatrix<T>) -> OMatrix<T, D, D>
where
    DefaultAllocator: Allocator<T, D, D>,
{
    OMatrix::from_fn_generic(n, n, |i, j| table[(i, j)])
}

fn load_weights<T: Real, D: Dim>(n: D, quadrature: &GllQuadrature<T>) -> OVector<T, D>
where
    DefaultAllocator: Allocator<T, D, U1>,
{
    OVector::from_fn_generic(n, U1, |i, _| quadrature.weights()[i])
}

impl<T: Real, Z: Dim, X: Dim> ElementScratch<T, Z, X>
where
    DefaultAllocator: ElementAllocator<T, Z, X>,
{
    /// Creates scratch storage for elements integrated with the given quadrature.
    ///
    /// # Panics
    ///
    /// Panics if `Z` or `X` is a fixed dimension that differs from the number of GLL points
    /// of the quadrature in that direction.
    pub fn new(quadrature: &ElementQuadrature<T>) -> Self {
        let z = Z::from_usize(quadrature.ngllz());
        let x = X::from_usize(quadrature.ngllx());
        Self {
            hprime_xx: load_table(x, quadrature.x.hprime()),
            hprime_zz: load_table(z, quadrature.z.hprime()),
            hprimewgll_xx: load_table(x, quadrature.x.hprimewgll()),
            hprimewgll_zz: load_table(z, quadrature.z.hprimewgll()),
            wx: load_weights(x, &quadrature.x),
            wz: load_weights(z, &quadrature.z),
            field_x: OMatrix::zeros_generic(z, x),
            field_z: OMatrix::zeros_generic(z, x),
            gradients: FieldGradients::zeros_generic(z, x),
            integrands: StressIntegrands::zeros_generic(z, x),
        }
    }

    /// Grid dimensions `(ngllz, ngllx)`.
    pub fn shape(&self) -> (usize, usize) {
        self.field_x.shape()
    }

    /// Gathers the values of a global field at the element's DOFs, ordered by
    /// [`grid_index`](crate::grid_index), into `field_x` and `field_z`.
    ///
    /// # Panics
    ///
    /// Panics if the number of DOFs does not match the grid or a DOF is out of bounds.
    pub fn load_field(&mut self, element_dofs: &[usize], field: &[Vector2<T>]) {
        let (nz, nx) = self.shape();
        assert_eq!(element_dofs.len(), nz * nx, "Need exactly one DOF per GLL point");
        // Column-major storage coincides with grid_index ordering
        for ((&dof, ux), uz) in element_dofs
            .iter()
            .zip(self.field_x.iter_mut())
            .zip(self.field_z.iter_mut())
        {
            let u = &field[dof];
            *ux = u.x;
            *uz = u.y;
        }
    }
}

/// A per-thread pool of scratch storage.
#[derive(Debug, Default)]
pub struct ScratchPool {
    workspace: RefCell<Workspace>,
}

impl ScratchPool {
    /// Checks out scratch storage of type `S`, creating it if the pool holds none.
    pub fn acquire<S, F>(&self, create: F) -> ScratchScope<'_, S>
    where
        S: 'static + Send,
        F: FnOnce() -> S,
    {
        let existing = self.workspace.borrow_mut().take::<S>();
        ScratchScope {
            pool: self,
            scratch: Some(existing.unwrap_or_else(create)),
        }
    }
}

/// Exclusive access to scratch storage checked out of a [`ScratchPool`].
///
/// The storage is returned to the pool when the scope is dropped.
#[derive(Debug)]
pub struct ScratchScope<'a, S: 'static + Send> {
    pool: &'a ScratchPool,
    // Only `None` while dropping
    scratch: Option<S>,
}

impl<'a, S: 'static + Send> Deref for ScratchScope<'a, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.scratch
            .as_ref()
            .expect("Internal error: Scratch is only released on drop")
    }
}

impl<'a, S: 'static + Send> DerefMut for ScratchScope<'a, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.scratch
            .as_mut()
            .expect("Internal error: Scratch is only released on drop")
    }
}

impl<'a, S: 'static + Send> Drop for ScratchScope<'a, S> {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            self.pool.workspace.borrow_mut().insert(scratch);
        }
    }
}

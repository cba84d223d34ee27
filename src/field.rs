//! Global nodal fields and scatter targets for element contributions.
use crate::Real;
use nalgebra::{Scalar, Vector2};
use paradis::slice::ParallelSliceAccess;
use paradis::SubsetAccess;
use serde::{Deserialize, Serialize};

/// A two-component field with one value per global DOF, such as the displacement or the
/// acceleration of the mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodalField<T: Scalar> {
    values: Vec<Vector2<T>>,
}

impl<T: Real> NodalField<T> {
    pub fn zeros(nglob: usize) -> Self {
        Self {
            values: vec![Vector2::zeros(); nglob],
        }
    }

    /// Resets every value to zero, typically at the start of a timestep.
    pub fn fill_zero(&mut self) {
        self.values.fill(Vector2::zeros());
    }

    /// A target that adds contributions of the element with the given DOFs into this field.
    pub fn element_scatter<'a>(&'a mut self, element_dofs: &'a [usize]) -> ElementScatter<'a, T> {
        ElementScatter {
            element_dofs,
            values: &mut self.values,
        }
    }
}

impl<T: Scalar> NodalField<T> {
    pub fn from_values(values: Vec<Vector2<T>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Vector2<T>] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [Vector2<T>] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<Vector2<T>> {
        self.values
    }
}

/// Receives the contributions of a single element, addressed by the element's local
/// GLL point index ([`grid_index`](crate::grid_index)).
pub trait ScatterTarget<T> {
    fn add_local(&mut self, local_index: usize, value: Vector2<T>);
}

/// Adds element contributions into a global field through the element's DOF map.
#[derive(Debug)]
pub struct ElementScatter<'a, T: Scalar> {
    element_dofs: &'a [usize],
    values: &'a mut [Vector2<T>],
}

impl<'a, T: Real> ElementScatter<'a, T> {
    pub fn new(element_dofs: &'a [usize], values: &'a mut [Vector2<T>]) -> Self {
        Self { element_dofs, values }
    }
}

impl<'a, T: Real> ScatterTarget<T> for ElementScatter<'a, T> {
    #[inline]
    fn add_local(&mut self, local_index: usize, value: Vector2<T>) {
        self.values[self.element_dofs[local_index]] += value;
    }
}

/// During colored parallel accumulation, each element has exclusive access to the records
/// of its DOFs, which are the global indices of its subset in local order.
impl<'data, T: Real> ScatterTarget<T> for SubsetAccess<'data, ParallelSliceAccess<'data, Vector2<T>>> {
    #[inline]
    fn add_local(&mut self, local_index: usize, value: Vector2<T>) {
        *self.get_mut(local_index) += value;
    }
}

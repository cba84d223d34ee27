//! Helper traits for allocator trait bounds.
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, Dim, Scalar, U1};

/// Allocators for the tensors of an element with an `Z x X` grid of quadrature points.
///
/// Covers the grid tensors themselves, the differentiation tables of both directions and
/// the weight vectors.
pub trait ElementAllocator<T: Scalar, Z: Dim, X: Dim>:
    Allocator<T, Z, X> + Allocator<T, X, X> + Allocator<T, Z, Z> + Allocator<T, X, U1> + Allocator<T, Z, U1>
{
}

impl<T, Z, X> ElementAllocator<T, Z, X> for DefaultAllocator
where
    T: Scalar,
    Z: Dim,
    X: Dim,
    DefaultAllocator:
        Allocator<T, Z, X> + Allocator<T, X, X> + Allocator<T, Z, Z> + Allocator<T, X, U1> + Allocator<T, Z, U1>,
{
}

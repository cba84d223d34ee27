//! Per-element tensor-product kernels.
//!
//! Element tensors are `Z x X` matrices indexed by `(iz, ix)`, where `Z` and `X` are the
//! number of GLL points along `gamma` and `xi`. Every kernel is written once, generically
//! over the dimension types: with [`Dyn`](nalgebra::Dyn) dimensions the grid size is chosen
//! at runtime, while [`Const`](nalgebra::Const) dimensions produce a fixed-order
//! instantiation with stack-allocated tensors and loop bounds known at compile time. The
//! `_fixed` functions are shorthands for the latter.
mod gradient;
mod integration;

pub use gradient::*;
pub use integration::*;

/// Orders for which fixed-order kernel instantiations are available.
pub const FIXED_ORDERS: std::ops::RangeInclusive<usize> = 2..=8;

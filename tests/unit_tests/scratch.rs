use nalgebra::{Dyn, Vector2, U3};
use sem2d::quadrature::ElementQuadrature;
use sem2d::scratch::{ElementScratch, ScratchPool};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use util::assert_panics;

#[test]
fn scratch_is_reused_after_release() {
    let pool = ScratchPool::default();
    let created = Cell::new(0);
    let create = || {
        created.set(created.get() + 1);
        vec![0.0f64; 4]
    };

    {
        let mut scratch = pool.acquire(create);
        scratch[0] = 1.0;
    }
    {
        let scratch = pool.acquire(create);
        // The released storage is handed out again, contents included
        assert_eq!(scratch[0], 1.0);
    }
    assert_eq!(created.get(), 1);

    // Nested scopes need separate storage
    {
        let _a = pool.acquire(create);
        let _b = pool.acquire(create);
    }
    assert_eq!(created.get(), 2);
    {
        let _a = pool.acquire(create);
        let _b = pool.acquire(create);
    }
    assert_eq!(created.get(), 2);
}

#[test]
fn scratch_of_different_types_is_kept_apart() {
    let pool = ScratchPool::default();
    drop(pool.acquire(|| 3usize));
    drop(pool.acquire(|| vec![1u8]));
    assert_eq!(*pool.acquire(|| 0usize), 3);
    assert_eq!(*pool.acquire(Vec::<u8>::new), vec![1u8]);
}

#[test]
fn scratch_is_released_on_panic() {
    let pool = ScratchPool::default();
    let created = Cell::new(0);
    let create = || {
        created.set(created.get() + 1);
        vec![0.0f64; 4]
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _scratch = pool.acquire(create);
        panic!("Element processing failed");
    }));
    assert!(result.is_err());

    let _scratch = pool.acquire(create);
    assert_eq!(created.get(), 1);
}

#[test]
fn element_scratch_matches_quadrature() {
    let quadrature = ElementQuadrature::<f64>::gll(3, 4).unwrap();
    let scratch = ElementScratch::<f64, Dyn, Dyn>::new(&quadrature);
    assert_eq!(scratch.shape(), (4, 3));
    assert_eq!(&scratch.hprime_xx, quadrature.x.hprime());
    assert_eq!(&scratch.hprimewgll_zz, quadrature.z.hprimewgll());
    assert_eq!(scratch.wz.as_slice(), quadrature.z.weights());

    let quadrature = ElementQuadrature::<f64>::gll(3, 3).unwrap();
    let scratch = ElementScratch::<f64, U3, U3>::new(&quadrature);
    assert_eq!(scratch.shape(), (3, 3));
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(scratch.hprime_zz[(i, j)], quadrature.z.hprime()[(i, j)]);
        }
    }
}

#[test]
fn element_scratch_rejects_mismatched_fixed_dimensions() {
    let quadrature = ElementQuadrature::<f64>::gll(4, 4).unwrap();
    assert_panics!(ElementScratch::<f64, U3, U3>::new(&quadrature));
}

#[test]
fn load_field_gathers_element_values() {
    let quadrature = ElementQuadrature::<f64>::gll(2, 3).unwrap();
    let mut scratch = ElementScratch::<f64, Dyn, Dyn>::new(&quadrature);
    let field: Vec<_> = (0..10).map(|i| Vector2::new(i as f64, -(i as f64))).collect();
    let dofs = [9, 2, 4, 0, 7, 5];
    scratch.load_field(&dofs, &field);

    // (iz, ix) = (1, 1) has grid index 4
    assert_eq!(scratch.field_x[(1, 1)], 7.0);
    assert_eq!(scratch.field_z[(1, 1)], -7.0);
    assert_eq!(scratch.field_x[(2, 0)], 4.0);
    assert_eq!(scratch.field_x.as_slice(), &[9.0, 2.0, 4.0, 0.0, 7.0, 5.0]);

    assert_panics!({
        let mut scratch = scratch.clone();
        scratch.load_field(&dofs[..5], &field)
    });
}

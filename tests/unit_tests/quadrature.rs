use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use sem2d::quadrature::{ElementQuadrature, GllQuadrature, QuadratureError};

#[test]
fn two_point_rule() {
    let q = GllQuadrature::<f64>::new(2).unwrap();
    assert_eq!(q.points(), &[-1.0, 1.0]);
    assert_eq!(q.weights(), &[1.0, 1.0]);
    #[rustfmt::skip]
    let expected_hprime = DMatrix::from_row_slice(2, 2, &[
        -0.5, 0.5,
        -0.5, 0.5,
    ]);
    assert_matrix_eq!(q.hprime().clone(), expected_hprime, comp = abs, tol = 1e-15);
    assert_matrix_eq!(q.hprimewgll().clone(), expected_hprime.transpose(), comp = abs, tol = 1e-15);
}

#[test]
fn three_point_rule() {
    let q = GllQuadrature::<f64>::new(3).unwrap();
    assert_eq!(q.points(), &[-1.0, 0.0, 1.0]);
    let expected_weights = DVector::from_column_slice(&[1.0 / 3.0, 4.0 / 3.0, 1.0 / 3.0]);
    assert_matrix_eq!(DVector::from_column_slice(q.weights()), expected_weights, comp = abs, tol = 1e-15);
    #[rustfmt::skip]
    let expected_hprime = DMatrix::from_row_slice(3, 3, &[
        -1.5,  2.0, -0.5,
        -0.5,  0.0,  0.5,
         0.5, -2.0,  1.5,
    ]);
    assert_matrix_eq!(q.hprime().clone(), expected_hprime, comp = abs, tol = 1e-14);
}

#[test]
fn five_point_rule() {
    let q = GllQuadrature::<f64>::new(5).unwrap();
    let a = (3.0f64 / 7.0).sqrt();
    let expected_points = DVector::from_column_slice(&[-1.0, -a, 0.0, a, 1.0]);
    let expected_weights = DVector::from_column_slice(&[0.1, 49.0 / 90.0, 32.0 / 45.0, 49.0 / 90.0, 0.1]);
    assert_matrix_eq!(DVector::from_column_slice(q.points()), expected_points, comp = abs, tol = 1e-14);
    assert_matrix_eq!(DVector::from_column_slice(q.weights()), expected_weights, comp = abs, tol = 1e-14);
}

#[test]
fn rules_integrate_polynomials_exactly() {
    for n in 2..=10 {
        let q = GllQuadrature::<f64>::new(n).unwrap();
        assert_eq!(q.num_points(), n);
        // GLL quadrature is exact for polynomials of degree 2n - 3
        for k in 0..=(2 * n - 3) {
            let integral: f64 = q
                .points()
                .iter()
                .zip(q.weights())
                .map(|(x, w)| w * x.powi(k as i32))
                .sum();
            let expected = if k % 2 == 0 { 2.0 / (k as f64 + 1.0) } else { 0.0 };
            assert_scalar_eq!(integral, expected, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn points_are_ascending_and_symmetric() {
    for n in 2..=12 {
        let q = GllQuadrature::<f64>::new(n).unwrap();
        let points = q.points();
        assert_eq!(points[0], -1.0);
        assert_eq!(points[n - 1], 1.0);
        assert!(points.windows(2).all(|w| w[0] < w[1]));
        for i in 0..n {
            assert_eq!(points[i], -points[n - 1 - i]);
            assert_scalar_eq!(q.weights()[i], q.weights()[n - 1 - i], comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn differentiation_matrix_is_exact_for_polynomials() {
    for n in 2..=10 {
        let q = GllQuadrature::<f64>::new(n).unwrap();
        let x = DVector::from_column_slice(q.points());
        // Polynomials of degree up to n - 1 are interpolated exactly
        for k in 0..n {
            let f = x.map(|x| x.powi(k as i32));
            let expected = x.map(|x| if k == 0 { 0.0 } else { k as f64 * x.powi(k as i32 - 1) });
            let df = q.hprime() * f;
            assert_matrix_eq!(df, expected, comp = abs, tol = 1e-11);
        }
    }
}

#[test]
fn weighted_differentiation_matrix_integrates_basis_derivatives() {
    for n in 2..=8 {
        let q = GllQuadrature::<f64>::new(n).unwrap();
        let hw = q.hprimewgll();
        for i in 0..n {
            for k in 0..n {
                assert_eq!(hw[(i, k)], q.weights()[k] * q.hprime()[(k, i)]);
            }
            // The integral of l_i' over [-1, 1] is l_i(1) - l_i(-1)
            let expected = if i == n - 1 {
                1.0
            } else if i == 0 {
                -1.0
            } else {
                0.0
            };
            assert_scalar_eq!(hw.row(i).sum(), expected, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn new_rejects_too_few_points() {
    assert_eq!(GllQuadrature::<f64>::new(0), Err(QuadratureError::TooFewPoints(0)));
    assert_eq!(GllQuadrature::<f64>::new(1), Err(QuadratureError::TooFewPoints(1)));
}

#[test]
fn from_tables_checks_dimensions() {
    let reference = GllQuadrature::<f64>::new(3).unwrap();
    let from_tables = GllQuadrature::from_tables(
        reference.points().to_vec(),
        reference.weights().to_vec(),
        reference.hprime().clone(),
    )
    .unwrap();
    assert_eq!(from_tables, reference);

    let err = GllQuadrature::from_tables(vec![-1.0, 0.0, 1.0], vec![1.0, 1.0], DMatrix::zeros(3, 3)).unwrap_err();
    assert_eq!(
        err,
        QuadratureError::DimensionMismatch {
            num_points: 3,
            num_weights: 2,
            hprime_shape: (3, 3)
        }
    );

    let err = GllQuadrature::from_tables(vec![-1.0, 1.0], vec![1.0, 1.0], DMatrix::zeros(2, 3)).unwrap_err();
    assert!(matches!(err, QuadratureError::DimensionMismatch { hprime_shape: (2, 3), .. }));
    assert!(err.to_string().contains("(2, 3)"));

    let err = GllQuadrature::<f64>::from_tables(vec![0.0], vec![2.0], DMatrix::zeros(1, 1)).unwrap_err();
    assert_eq!(err, QuadratureError::TooFewPoints(1));
}

#[test]
fn element_quadrature_pairs_directions() {
    let q = ElementQuadrature::<f64>::gll(3, 4).unwrap();
    assert_eq!(q.ngllx(), 3);
    assert_eq!(q.ngllz(), 4);
    assert!(!q.is_isotropic());
    assert!(ElementQuadrature::<f64>::gll(5, 5).unwrap().is_isotropic());
    assert!(ElementQuadrature::<f64>::gll(5, 1).is_err());
}

#[test]
fn single_precision_rule() {
    let q = GllQuadrature::<f32>::new(4).unwrap();
    let sum: f32 = q.weights().iter().sum();
    assert_scalar_eq!(sum, 2.0f32, comp = abs, tol = 1e-6);
}

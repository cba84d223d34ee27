//! Test helpers shared by the crates in the workspace.
use nalgebra::{Dim, Matrix, RawStorage};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Asserts that every entry of two matrices agrees to within the given *relative* tolerance,
/// measured against the largest absolute entry of the expected matrix.
#[macro_export]
macro_rules! assert_matrix_rel_eq {
    ($actual:expr, $expected:expr, reltol = $tol:expr) => {{
        let error = $crate::max_relative_error(&$actual, &$expected);
        if !(error <= $tol) {
            println!("reltol: {:e}", $tol);
            println!("actual: {}", $actual);
            println!("expected: {}", $expected);
            println!("relative error: {:e}", error);
        }
        assert!(error <= $tol);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// The largest absolute difference between corresponding entries, scaled by the largest
/// absolute entry of `expected` (or by one, if `expected` is all zeros).
///
/// # Panics
///
/// Panics if the matrices do not have the same shape.
pub fn max_relative_error<R1, C1, S1, R2, C2, S2>(
    actual: &Matrix<f64, R1, C1, S1>,
    expected: &Matrix<f64, R2, C2, S2>,
) -> f64
where
    R1: Dim,
    C1: Dim,
    S1: RawStorage<f64, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: RawStorage<f64, R2, C2>,
{
    assert_eq!(actual.shape(), expected.shape(), "Matrices must have the same shape");
    let scale = expected.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };
    actual
        .iter()
        .zip(expected.iter())
        .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()))
        / scale
}

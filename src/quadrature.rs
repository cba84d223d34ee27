//! Gauss-Lobatto-Legendre (GLL) quadrature and differentiation tables.
//!
//! A spectral element interpolates fields with Lagrange polynomials `l_j` through the GLL
//! points of each direction. The same points serve as quadrature points, so a 1D rule
//! consists of
//!
//! - the points `x_i` in `[-1, 1]`, in ascending order,
//! - the weights `w_i`,
//! - the differentiation matrix `hprime(i, j) = l_j'(x_i)`.
//!
//! Tables are usually supplied by the caller through [`GllQuadrature::from_tables`], but
//! [`GllQuadrature::new`] computes them for any number of points.
use crate::Real;
use nalgebra::DMatrix;
use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuadratureError {
    /// A GLL rule needs at least both end points of the interval.
    TooFewPoints(usize),
    /// The dimensions of the supplied tables are inconsistent.
    DimensionMismatch {
        num_points: usize,
        num_weights: usize,
        hprime_shape: (usize, usize),
    },
    /// Newton's method did not converge to a GLL point.
    NotConverged { num_points: usize },
}

impl fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints(n) => write!(f, "A GLL rule needs at least 2 points, got {}", n),
            Self::DimensionMismatch {
                num_points,
                num_weights,
                hprime_shape,
            } => write!(
                f,
                "Inconsistent quadrature tables: {} points, {} weights, differentiation matrix of shape {:?}",
                num_points, num_weights, hprime_shape
            ),
            Self::NotConverged { num_points } => {
                write!(f, "Failed to compute the points of the {}-point GLL rule", num_points)
            }
        }
    }
}

impl Error for QuadratureError {}

/// Evaluates `(P_n(x), P_{n - 1}(x))` by the three-term recurrence
/// `m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)`.
fn legendre_pair(n: usize, x: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
    }
    (p1, p2)
}

const MAX_NEWTON_ITERATIONS: usize = 100;

/// GLL points in ascending order, for `n >= 2` points.
fn gll_points(n: usize) -> Result<Vec<f64>, QuadratureError> {
    let degree = n - 1;
    let mut points = vec![0.0; n];
    // Only compute the lower half, the rest follows by symmetry
    for i in 0..(n + 1) / 2 {
        // Chebyshev-Gauss-Lobatto points are a good initial guess
        let mut x = -(PI * i as f64 / degree as f64).cos();
        let mut converged = false;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            // The interior GLL points are the roots of P_N'(x), which is proportional to
            // x P_N(x) - P_{N - 1}(x). This update also leaves the end points fixed.
            let (p, p_prev) = legendre_pair(degree, x);
            let dx = (x * p - p_prev) / (n as f64 * p);
            x -= dx;
            if dx.abs() <= 1e-14 {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(QuadratureError::NotConverged { num_points: n });
        }
        points[i] = x;
        points[n - 1 - i] = -x;
    }
    if n % 2 == 1 {
        points[n / 2] = 0.0;
    }
    Ok(points)
}

/// A one-dimensional GLL rule with its differentiation tables.
#[derive(Debug, Clone, PartialEq)]
pub struct GllQuadrature<T: Real> {
    points: Vec<T>,
    weights: Vec<T>,
    hprime: DMatrix<T>,
    hprimewgll: DMatrix<T>,
}

impl<T: Real> GllQuadrature<T> {
    /// Computes the GLL rule with `num_points` points.
    pub fn new(num_points: usize) -> Result<Self, QuadratureError> {
        let n = num_points;
        if n < 2 {
            return Err(QuadratureError::TooFewPoints(n));
        }
        let degree = n - 1;
        let points = gll_points(n)?;
        let p_n: Vec<f64> = points.iter().map(|&x| legendre_pair(degree, x).0).collect();

        let nn1 = (degree * (degree + 1)) as f64;
        let weights: Vec<f64> = p_n.iter().map(|p| 2.0 / (nn1 * p * p)).collect();

        let hprime = DMatrix::from_fn(n, n, |i, j| {
            if i != j {
                p_n[i] / (p_n[j] * (points[i] - points[j]))
            } else if i == 0 {
                -nn1 / 4.0
            } else if i == degree {
                nn1 / 4.0
            } else {
                0.0
            }
        });

        let convert = |x: f64| T::from_f64(x).expect("GLL tables must be representable in T");
        Self::from_tables(
            points.into_iter().map(convert).collect(),
            weights.into_iter().map(convert).collect(),
            hprime.map(convert),
        )
    }

    /// Creates a rule from externally computed tables.
    ///
    /// `hprime` must be the `n x n` matrix with entries `hprime(i, j) = l_j'(x_i)`.
    pub fn from_tables(points: Vec<T>, weights: Vec<T>, hprime: DMatrix<T>) -> Result<Self, QuadratureError> {
        let n = points.len();
        if n < 2 {
            return Err(QuadratureError::TooFewPoints(n));
        }
        if weights.len() != n || hprime.shape() != (n, n) {
            return Err(QuadratureError::DimensionMismatch {
                num_points: n,
                num_weights: weights.len(),
                hprime_shape: hprime.shape(),
            });
        }
        let hprimewgll = DMatrix::from_fn(n, n, |i, k| weights[k] * hprime[(k, i)]);
        Ok(Self {
            points,
            weights,
            hprime,
            hprimewgll,
        })
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    /// The differentiation matrix, `hprime(i, j) = l_j'(x_i)`.
    pub fn hprime(&self) -> &DMatrix<T> {
        &self.hprime
    }

    /// The transposed, weighted differentiation matrix, `hprimewgll(i, k) = w_k hprime(k, i)`.
    ///
    /// Used to integrate against the derivatives of the basis functions:
    /// `sum_k hprimewgll(i, k) f(x_k)` approximates the integral of `l_i' f`.
    pub fn hprimewgll(&self) -> &DMatrix<T> {
        &self.hprimewgll
    }
}

/// The tensor-product rule of an element: one 1D rule for each reference direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementQuadrature<T: Real> {
    /// The rule along `xi`.
    pub x: GllQuadrature<T>,
    /// The rule along `gamma`.
    pub z: GllQuadrature<T>,
}

impl<T: Real> ElementQuadrature<T> {
    pub fn gll(ngllx: usize, ngllz: usize) -> Result<Self, QuadratureError> {
        Ok(Self {
            x: GllQuadrature::new(ngllx)?,
            z: GllQuadrature::new(ngllz)?,
        })
    }

    pub fn ngllx(&self) -> usize {
        self.x.num_points()
    }

    pub fn ngllz(&self) -> usize {
        self.z.num_points()
    }

    /// Whether both directions use the same number of points.
    pub fn is_isotropic(&self) -> bool {
        self.ngllx() == self.ngllz()
    }
}

//! Retention time alignment between two raw files.
//!
//! Rows that carry a feature in both files give paired retention times
//! `(rt_in_file_a, rt_in_file_b)`. A cubic polynomial fitted on those pairs
//! maps a retention time observed in file A to the one expected in file B.

use nalgebra::{
    DMatrix,
    DVector,
    SVD,
};
use std::fmt::Display;
use tracing::debug;

/// Highest polynomial degree used for the fit.
pub const MAX_DEGREE: usize = 3;

/// Singular values below this are treated as zero in the least-squares solve.
const SINGULAR_VALUE_EPS: f64 = 1e-10;

/// Iteration cap for the SVD; exceeding it counts as a failed fit.
const MAX_SVD_ITERATIONS: usize = 1_000;

/// Errors for fitting and evaluating a retention time regression.
#[derive(Debug, Clone, PartialEq)]
pub enum RegressionError {
    /// Returned when fitting is attempted with no (finite) input points.
    NoPoints,
    /// Returned when fewer than two distinct x values are available.
    InsufficientPoints { distinct: usize },
    /// Returned when the least-squares solve does not converge or yields
    /// non-finite coefficients.
    NotConverged,
    /// Returned when evaluating the polynomial produces a non-finite value.
    NonFinitePrediction(f64),
}

impl Display for RegressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPoints => write!(f, "No points to fit the regression"),
            Self::InsufficientPoints { distinct } => write!(
                f,
                "Need at least 2 distinct x values to fit the regression, got {}",
                distinct
            ),
            Self::NotConverged => write!(f, "Polynomial least squares fit did not converge"),
            Self::NonFinitePrediction(x) => write!(f, "Non-finite prediction for x = {}", x),
        }
    }
}

impl std::error::Error for RegressionError {}

/// A pair of retention times for the same row in two files.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

/// Accumulates retention time pairs before fitting.
#[derive(Debug, Clone, Default)]
pub struct RegressionBuilder {
    points: Vec<Point>,
}

impl RegressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64, y: f64) {
        self.points.push(Point { x, y });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn fit(self) -> Result<PolynomialCurve, RegressionError> {
        PolynomialCurve::fit(self.points)
    }
}

/// Fitted polynomial mapping retention times of one file onto another.
///
/// The polynomial is evaluated on a standardized abscissa,
/// `(x - x_center) / x_scale`, which keeps the cubic term well conditioned
/// for retention times in the thousands of seconds.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PolynomialCurve {
    points: Vec<Point>,
    /// Coefficients in increasing power order.
    coefficients: Vec<f64>,
    x_center: f64,
    x_scale: f64,
}

impl PolynomialCurve {
    /// Fits the curve by linear least squares (SVD solve).
    ///
    /// The degree is [`MAX_DEGREE`], lowered to `distinct_x - 1` when there
    /// are not enough distinct abscissae to pin down a cubic.
    pub fn fit(points: Vec<Point>) -> Result<Self, RegressionError> {
        let mut points: Vec<Point> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();
        if points.is_empty() {
            return Err(RegressionError::NoPoints);
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

        let distinct = 1 + points.windows(2).filter(|w| w[0].x != w[1].x).count();
        if distinct < 2 {
            return Err(RegressionError::InsufficientPoints { distinct });
        }
        let degree = MAX_DEGREE.min(distinct - 1);

        let n = points.len();
        let x_center = points.iter().map(|p| p.x).sum::<f64>() / n as f64;
        let x_scale = points
            .iter()
            .map(|p| (p.x - x_center).abs())
            .fold(0.0, f64::max);

        let design = DMatrix::from_fn(n, degree + 1, |r, c| {
            ((points[r].x - x_center) / x_scale).powi(c as i32)
        });
        let rhs = DVector::from_iterator(n, points.iter().map(|p| p.y));

        let svd = SVD::try_new(design, true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
            .ok_or(RegressionError::NotConverged)?;
        let solution = svd
            .solve(&rhs, SINGULAR_VALUE_EPS)
            .map_err(|_| RegressionError::NotConverged)?;
        let coefficients: Vec<f64> = solution.iter().copied().collect();
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(RegressionError::NotConverged);
        }

        let curve = Self {
            points,
            coefficients,
            x_center,
            x_scale,
        };
        debug!(
            "Fitted degree {} RT regression on {} points, RMSE: {}",
            degree,
            n,
            curve.rmse()
        );
        Ok(curve)
    }

    /// Predicts the retention time in the target file for `x_val`.
    pub fn predict(&self, x_val: f64) -> Result<f64, RegressionError> {
        let t = (x_val - self.x_center) / self.x_scale;
        let y = self
            .coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(RegressionError::NonFinitePrediction(x_val))
        }
    }

    /// Root mean squared error of the fit over its own training points.
    pub fn rmse(&self) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for p in self.points.iter() {
            if let Ok(pred) = self.predict(p.x) {
                total += (pred - p.y).powi(2);
                count += 1;
            }
        }
        if count == 0 {
            f64::NAN
        } else {
            (total / count as f64).sqrt()
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Training points, sorted by `x`.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

use crate::LifeTabResult;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

// Search range for the roughness penalty α
const MIN_ALPHA: f64 = 1e-12;
const MAX_ALPHA: f64 = 1e20;
const MAX_BISECTIONS: usize = 200;

/// Natural cubic smoothing spline with a residual bound.
///
/// Among all natural cubic splines with knots at the data abscissae, the fit
/// is the smoothest one whose residual sum of squares does not exceed `s`:
///
/// ```text
/// minimise  ∫ g''(t)² dt   subject to   Σᵢ (yᵢ − g(xᵢ))² ≤ s
/// ```
///
/// `s = 0` interpolates the data. When `s` is at least the residual of the
/// least-squares line the fit is that line.
///
/// The penalised form `Σ (yᵢ − gᵢ)² + α ∫ g''²` is solved with the Reinsch
/// system `(R + α QᵀQ) γ = Qᵀy`, `g = y − α Q γ`, and α is found by
/// bisection on `log α` since the residual grows monotonically with α.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    // Fitted values at the knots
    g: Vec<f64>,
    // Second derivatives at the knots, zero at both ends
    gamma: Vec<f64>,
    alpha: f64,
    rss: f64,
}

impl SmoothingSpline {
    /// Fit to points with strictly increasing, finite `x`.
    ///
    /// `s = None` uses the number of points as the residual bound.
    ///
    /// # Errors
    /// - Fewer than 3 points, or `x` and `y` of different lengths
    /// - Non-finite values or `x` not strictly increasing
    /// - Negative or non-finite `s`
    pub fn fit(x: &[f64], y: &[f64], s: Option<f64>) -> LifeTabResult<Self> {
        validate_points(x, y)?;
        let s = s.unwrap_or(x.len() as f64);
        if !s.is_finite() || s < 0.0 {
            return Err(format!("smoothing factor must be finite and non-negative, got {s}").into());
        }

        let system = ReinschSystem::new(x, y);

        if s == 0.0 {
            let (g, gamma) = system.solve(0.0)?;
            return Ok(Self::from_parts(x, y, g, gamma, 0.0));
        }

        let (line_g, line_rss) = least_squares_line(x, y)?;
        if line_rss <= s {
            warn!("smoothing spline: s={s} exceeds linear residual {line_rss}, falling back to the line");
            let gamma = vec![0.0; x.len()];
            return Ok(Self::from_parts(x, y, line_g, gamma, f64::INFINITY));
        }

        let rss_at = |alpha: f64| -> LifeTabResult<f64> {
            let (g, _) = system.solve(alpha)?;
            Ok(residual_sum_of_squares(y, &g))
        };

        // Bracket the target residual
        let mut lo: f64 = 1.0;
        while lo > MIN_ALPHA && rss_at(lo)? > s {
            lo /= 10.0;
        }
        let mut hi = lo.max(1.0);
        while hi < MAX_ALPHA && rss_at(hi)? < s {
            hi *= 10.0;
        }

        // Geometric bisection, keeping rss(lo) ≤ s
        for _ in 0..MAX_BISECTIONS {
            if hi / lo <= 1.0 + 1e-12 {
                break;
            }
            let mid = (lo * hi).sqrt();
            if rss_at(mid)? <= s {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let (g, gamma) = system.solve(lo)?;
        debug!("smoothing spline: n={}, s={s}, alpha={lo:e}", x.len());
        Ok(Self::from_parts(x, y, g, gamma, lo))
    }

    fn from_parts(x: &[f64], y: &[f64], g: Vec<f64>, gamma: Vec<f64>, alpha: f64) -> Self {
        let rss = residual_sum_of_squares(y, &g);
        Self {
            x: x.to_vec(),
            g,
            gamma,
            alpha,
            rss,
        }
    }

    /// Roughness penalty α of the fit (0 for interpolation, ∞ for the linear limit).
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Residual sum of squares at the knots.
    pub fn residual_sum_of_squares(&self) -> f64 {
        self.rss
    }

    pub fn knot_values(&self) -> &[f64] {
        &self.g
    }

    /// Evaluate at `t`. Outside the knot range the natural spline continues linearly.
    pub fn evaluate(&self, t: f64) -> f64 {
        let x = &self.x;
        let g = &self.g;
        let gamma = &self.gamma;
        let n = x.len();

        if t <= x[0] {
            let h = x[1] - x[0];
            let slope = (g[1] - g[0]) / h - h * (2.0 * gamma[0] + gamma[1]) / 6.0;
            return g[0] + slope * (t - x[0]);
        }
        if t >= x[n - 1] {
            let h = x[n - 1] - x[n - 2];
            let slope = (g[n - 1] - g[n - 2]) / h + h * (gamma[n - 2] + 2.0 * gamma[n - 1]) / 6.0;
            return g[n - 1] + slope * (t - x[n - 1]);
        }

        // x[i] ≤ t < x[i + 1]
        let i = x.partition_point(|&xi| xi <= t) - 1;
        let h = x[i + 1] - x[i];
        let dl = t - x[i];
        let dr = x[i + 1] - t;

        (dl * g[i + 1] + dr * g[i]) / h
            - dl * dr / 6.0 * ((1.0 + dl / h) * gamma[i + 1] + (1.0 + dr / h) * gamma[i])
    }

    pub fn evaluate_many(&self, ts: &[f64]) -> Vec<f64> {
        ts.iter().map(|&t| self.evaluate(t)).collect()
    }
}

// =======================================
// PRIVATE FUNCTIONS
// =======================================

/// Matrices of the Reinsch algorithm for one data set.
///
/// Column k of Q (k = 0..n−3) has non-zeros at rows k, k+1, k+2:
/// `1/hₖ`, `−1/hₖ − 1/hₖ₊₁`, `1/hₖ₊₁`. R is tridiagonal with
/// diagonal `(hₖ + hₖ₊₁)/3` and off-diagonal `hₖ₊₁/6`.
struct ReinschSystem {
    y: DVector<f64>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    qtq: DMatrix<f64>,
    qty: DVector<f64>,
}

impl ReinschSystem {
    fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len();
        let m = n - 2;
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        let mut q = DMatrix::zeros(n, m);
        let mut r = DMatrix::zeros(m, m);
        for k in 0..m {
            q[(k, k)] = 1.0 / h[k];
            q[(k + 1, k)] = -1.0 / h[k] - 1.0 / h[k + 1];
            q[(k + 2, k)] = 1.0 / h[k + 1];
            r[(k, k)] = (h[k] + h[k + 1]) / 3.0;
            if k + 1 < m {
                r[(k, k + 1)] = h[k + 1] / 6.0;
                r[(k + 1, k)] = h[k + 1] / 6.0;
            }
        }

        let y = DVector::from_column_slice(y);
        let qt = q.transpose();
        let qtq = &qt * &q;
        let qty = &qt * &y;

        Self { y, q, r, qtq, qty }
    }

    /// Solve for penalty α; returns knot values g and full-length second derivatives γ.
    fn solve(&self, alpha: f64) -> LifeTabResult<(Vec<f64>, Vec<f64>)> {
        // A = R + α QᵀQ is symmetric positive definite for α ≥ 0
        let a = &self.r + &self.qtq * alpha;
        let cholesky = a
            .cholesky()
            .ok_or_else(|| format!("smoothing system is not positive definite for alpha={alpha:e}"))?;
        let inner = cholesky.solve(&self.qty);

        // g = y − α Q γ
        let g = &self.y - (&self.q * &inner) * alpha;

        let n = self.y.len();
        let mut gamma = vec![0.0; n];
        gamma[1..n - 1].copy_from_slice(inner.as_slice());
        Ok((g.as_slice().to_vec(), gamma))
    }
}

/// Least-squares line through the points; fitted values and their residual sum of squares.
fn least_squares_line(x: &[f64], y: &[f64]) -> LifeTabResult<(Vec<f64>, f64)> {
    let design = DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(y);
    let coefficients = solve_least_squares(&design, &target)
        .ok_or("least-squares line is singular")?;

    let fitted = &design * &coefficients;
    let fitted = fitted.as_slice().to_vec();
    let rss = residual_sum_of_squares(y, &fitted);
    Ok((fitted, rss))
}

fn solve_least_squares(a: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let at = a.transpose();
    let ata = &at * a;
    let aty = at * y;
    ata.lu().solve(&aty)
}

fn residual_sum_of_squares(y: &[f64], g: &[f64]) -> f64 {
    y.iter().zip(g.iter()).map(|(a, b)| (a - b).powi(2)).sum()
}

fn validate_points(x: &[f64], y: &[f64]) -> LifeTabResult<()> {
    if x.len() != y.len() {
        return Err(format!("x has {} points but y has {}", x.len(), y.len()).into());
    }
    if x.len() < 3 {
        return Err("smoothing spline needs at least 3 points".into());
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err("smoothing spline points must be finite".into());
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err("smoothing spline x values must be strictly increasing".into());
    }
    Ok(())
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ages(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_linear_data_is_reproduced_for_any_s() {
        let x = ages(12);
        let y: Vec<f64> = x.iter().map(|t| 3.0 + 0.5 * t).collect();
        for s in [Some(0.0), Some(1.0), None, Some(1e6)] {
            let spline = SmoothingSpline::fit(&x, &y, s).unwrap();
            for t in [0.0, 2.25, 7.5, 11.0, 13.0] {
                assert_abs_diff_eq!(spline.evaluate(t), 3.0 + 0.5 * t, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_s_interpolates() {
        let x = ages(10);
        let y: Vec<f64> = x.iter().map(|t| (t * 0.7).sin() * 10.0).collect();
        let spline = SmoothingSpline::fit(&x, &y, Some(0.0)).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_abs_diff_eq!(spline.evaluate(*xi), *yi, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(spline.residual_sum_of_squares(), 0.0, epsilon = 1e-18);
    }

    #[test]
    fn test_residual_matches_bound() {
        let x = ages(40);
        // Smooth trend plus deterministic wiggle
        let y: Vec<f64> = x
            .iter()
            .map(|t| 100.0 + 2.0 * t + 0.05 * t * t + if (*t as i64) % 2 == 0 { 3.0 } else { -3.0 })
            .collect();
        let s = 150.0;
        let spline = SmoothingSpline::fit(&x, &y, Some(s)).unwrap();
        assert!(spline.residual_sum_of_squares() <= s + 1e-9);
        assert_abs_diff_eq!(spline.residual_sum_of_squares(), s, epsilon = 1e-6 * s);
        assert!(spline.alpha() > 0.0 && spline.alpha().is_finite());
    }

    #[test]
    fn test_larger_s_is_smoother() {
        let x = ages(30);
        let y: Vec<f64> = x.iter().map(|t| t * t + if (*t as i64) % 3 == 0 { 20.0 } else { 0.0 }).collect();
        let tight = SmoothingSpline::fit(&x, &y, Some(500.0)).unwrap();
        let loose = SmoothingSpline::fit(&x, &y, Some(3000.0)).unwrap();
        assert!(loose.alpha() > tight.alpha());
        assert!(loose.residual_sum_of_squares() > tight.residual_sum_of_squares());
    }

    #[test]
    fn test_curve_is_continuous_at_knots() {
        let x = ages(8);
        let y = vec![1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 3.0, 6.0];
        let spline = SmoothingSpline::fit(&x, &y, Some(2.0)).unwrap();
        for xi in &x[1..x.len() - 1] {
            let left = spline.evaluate(xi - 1e-9);
            let right = spline.evaluate(xi + 1e-9);
            assert_abs_diff_eq!(left, right, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_linear_limit_solves_normal_equations() {
        let x = ages(15);
        let y: Vec<f64> = x
            .iter()
            .map(|t| 2.0 + 3.0 * t + if (*t as i64) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let spline = SmoothingSpline::fit(&x, &y, Some(1e6)).unwrap();
        assert!(spline.alpha().is_infinite());

        // Residuals are orthogonal to both columns of the design matrix
        let residuals: Vec<f64> = y.iter().zip(spline.knot_values()).map(|(a, b)| a - b).collect();
        let sum: f64 = residuals.iter().sum();
        let weighted: f64 = residuals.iter().zip(x.iter()).map(|(r, t)| r * t).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(weighted, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_fitted_values_satisfy_reinsch_relation() {
        // For any α the fit satisfies Qᵀg = Rγ
        let x: Vec<f64> = vec![0.0, 1.0, 2.5, 3.0, 4.5, 6.0, 7.0];
        let y = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 5.5];
        let spline = SmoothingSpline::fit(&x, &y, Some(1.5)).unwrap();
        let g = spline.knot_values();
        let gamma = &spline.gamma;
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        for k in 0..x.len() - 2 {
            let qtg = g[k] / h[k] - g[k + 1] * (1.0 / h[k] + 1.0 / h[k + 1]) + g[k + 2] / h[k + 1];
            let rgamma = h[k] / 6.0 * gamma[k] + (h[k] + h[k + 1]) / 3.0 * gamma[k + 1]
                + h[k + 1] / 6.0 * gamma[k + 2];
            assert_abs_diff_eq!(qtg, rgamma, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(SmoothingSpline::fit(&[0.0, 1.0], &[1.0, 2.0], None).is_err());
        assert!(SmoothingSpline::fit(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0], None).is_err());
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0], None).is_err());
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], Some(-1.0)).is_err());
    }
}

use crate::lt_config::Sex;
use bon::builder;

// =======================================
// COEFFICIENTS
// =======================================

/// One sex's piecewise-linear `a₀` regression.
///
/// ```text
/// m₀ < low               : a₀ = low_intercept + low_slope · m₀
/// low ≤ m₀ < high        : a₀ = mid_intercept + mid_slope · m₀
/// m₀ ≥ high              : a₀ = plateau
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfantA0Coefficients {
    pub low: f64,
    pub high: f64,
    pub low_intercept: f64,
    pub low_slope: f64,
    pub mid_intercept: f64,
    pub mid_slope: f64,
    pub plateau: f64,
}

/// Andreev-Kingkade male coefficients.
pub const MALE_A0: InfantA0Coefficients = InfantA0Coefficients {
    low: 0.0230,
    high: 0.08307,
    low_intercept: 0.14929,
    low_slope: -1.99545,
    mid_intercept: 0.02832,
    mid_slope: 3.26201,
    plateau: 0.29915,
};

/// Andreev-Kingkade female coefficients.
pub const FEMALE_A0: InfantA0Coefficients = InfantA0Coefficients {
    low: 0.01724,
    high: 0.06891,
    low_intercept: 0.14903,
    low_slope: -2.05527,
    mid_intercept: 0.04667,
    mid_slope: 3.88089,
    plateau: 0.31411,
};

impl InfantA0Coefficients {
    pub fn for_sex(sex: Sex) -> Self {
        match sex {
            Sex::Male => MALE_A0,
            // Both-sexes tables follow the non-male branch
            Sex::Female | Sex::Total => FEMALE_A0,
        }
    }

    pub fn evaluate(&self, m0: f64) -> f64 {
        if m0.is_nan() {
            return f64::NAN;
        }
        if m0 < self.low {
            self.low_intercept + self.low_slope * m0
        } else if m0 < self.high {
            self.mid_intercept + self.mid_slope * m0
        } else {
            self.plateau
        }
    }
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Infant separation factor a₀: average fraction of the first year lived by infants who die in it.
///
/// Piecewise-linear in the infant mortality rate m₀ with sex-specific
/// breakpoints (Andreev & Kingkade, 2015).
///
/// # Formula
/// ```text
/// Male:   m₀ < 0.0230         a₀ = 0.14929 − 1.99545·m₀
///         0.0230 ≤ m₀ < 0.08307  a₀ = 0.02832 + 3.26201·m₀
///         m₀ ≥ 0.08307         a₀ = 0.29915
///
/// Female: m₀ < 0.01724        a₀ = 0.14903 − 2.05527·m₀
///         0.01724 ≤ m₀ < 0.06891 a₀ = 0.04667 + 3.88089·m₀
///         m₀ ≥ 0.06891         a₀ = 0.31411
/// ```
///
/// A NaN rate gives a NaN factor.
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// let a = a0().m0(0.01).sex(Sex::Male).call();
/// assert!((a - 0.1293355).abs() < 1e-12);
/// ```
#[builder]
pub fn a0(m0: f64, sex: Sex) -> f64 {
    InfantA0Coefficients::for_sex(sex).evaluate(m0)
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_a0_male_low() {
        let ans = a0().m0(0.01).sex(Sex::Male).call();
        assert_abs_diff_eq!(ans, 0.14929 - 1.99545 * 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(ans, 0.1293355, epsilon = 1e-12);
    }

    #[test]
    fn test_a0_branches() {
        // Male middle and plateau
        assert_abs_diff_eq!(
            a0().m0(0.05).sex(Sex::Male).call(),
            0.02832 + 3.26201 * 0.05,
            epsilon = 1e-15
        );
        assert_eq!(a0().m0(0.2).sex(Sex::Male).call(), 0.29915);

        // Female all three
        assert_abs_diff_eq!(
            a0().m0(0.01).sex(Sex::Female).call(),
            0.1284773,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            a0().m0(0.03).sex(Sex::Female).call(),
            0.04667 + 3.88089 * 0.03,
            epsilon = 1e-15
        );
        assert_eq!(a0().m0(0.07).sex(Sex::Female).call(), 0.31411);

        // Breakpoints belong to the upper piece
        assert_abs_diff_eq!(
            a0().m0(0.0230).sex(Sex::Male).call(),
            0.02832 + 3.26201 * 0.0230,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_a0_total_uses_female_branch() {
        assert_eq!(
            a0().m0(0.004).sex(Sex::Total).call(),
            a0().m0(0.004).sex(Sex::Female).call()
        );
    }

    #[test]
    fn test_a0_nan() {
        assert!(a0().m0(f64::NAN).sex(Sex::Female).call().is_nan());
    }

    #[test]
    fn test_a0_regression_is_nearly_continuous() {
        // Published regression pieces meet (to a few 1e-4) at every breakpoint
        for coef in [MALE_A0, FEMALE_A0] {
            let low_at = coef.low_intercept + coef.low_slope * coef.low;
            let mid_at_low = coef.mid_intercept + coef.mid_slope * coef.low;
            let mid_at_high = coef.mid_intercept + coef.mid_slope * coef.high;
            assert_abs_diff_eq!(low_at, mid_at_low, epsilon = 5e-4);
            assert_abs_diff_eq!(mid_at_high, coef.plateau, epsilon = 5e-4);
        }
    }

    #[test]
    fn test_a0_male_threshold_0_230_breaks_range() {
        // With a low breakpoint of 0.230 the male low piece runs past its domain
        // and yields a negative separation factor, so 0.0230 is the only usable value.
        let misprint = InfantA0Coefficients {
            low: 0.230,
            ..MALE_A0
        };
        for i in 0..=200 {
            let m0 = i as f64 * 0.001;
            let a = a0().m0(m0).sex(Sex::Male).call();
            assert!((0.0..1.0).contains(&a), "a0({m0}) = {a}");
        }
        assert!(misprint.evaluate(0.1) < 0.0);
    }
}

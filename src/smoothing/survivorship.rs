use super::hazard::SurvivalCurve;
use crate::helpers::round_to;
use bon::builder;
use log::debug;
use polars::prelude::*;

/// Highest survivorship percentile.
pub const MAX_PERCENTILE: usize = 100;

/// Ages at which the survival curve crosses each integer percentile.
///
/// `s(p)` for `p` in `1..=100` is the first grid age whose survival
/// percentage rounds up to `p`. `s(0)` is the last grid age.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivorshipAges {
    ages: [f64; MAX_PERCENTILE + 1],
}

impl SurvivorshipAges {
    /// Age for percentile `p`; NaN for a percentile the curve never reaches or for `p > 100`.
    pub fn s(&self, p: usize) -> f64 {
        self.ages.get(p).copied().unwrap_or(f64::NAN)
    }

    /// All values ordered `s0, s1, …, s100`.
    pub fn as_slice(&self) -> &[f64] {
        &self.ages
    }

    /// One-row frame with columns `s0` … `s100`.
    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .ages
            .iter()
            .enumerate()
            .map(|(p, age)| Series::new(format!("s{p}").into(), [*age]).into_column())
            .collect();
        DataFrame::new(columns)
    }
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Survivorship-age stage: read percentile ages off a survival curve.
///
/// The survival function is rescaled to a percentage. For each percentile
/// `p` the recorded age is the smallest age where `ceil(round(100 · Sₓ, 3)) == p`.
/// A percentile skipped by a steep drop, or never reached before the grid
/// ends, is NaN.
#[builder]
pub fn survivorship_ages(survival: &SurvivalCurve) -> SurvivorshipAges {
    let mut ages = [f64::NAN; MAX_PERCENTILE + 1];

    for (age, s) in survival.age().iter().zip(survival.Sx()) {
        let pct = round_to(100.0 * s, 3).ceil();
        if !pct.is_finite() || pct < 1.0 || pct > MAX_PERCENTILE as f64 {
            continue;
        }
        let p = pct as usize;
        if ages[p].is_nan() {
            ages[p] = *age;
        }
    }

    ages[0] = survival
        .age()
        .iter()
        .copied()
        .fold(f64::NAN, f64::max);

    let missing = ages[1..].iter().filter(|a| a.is_nan()).count();
    if missing > 0 {
        debug!("survival curve did not cross {missing} of {MAX_PERCENTILE} percentiles");
    }

    SurvivorshipAges { ages }
}

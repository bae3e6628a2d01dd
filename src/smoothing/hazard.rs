#![allow(non_snake_case)]

use super::spline::SmoothingSpline;
use super::{CountSeries, SmoothingConfig};
use crate::LifeTabResult;
use crate::helpers::cumulative_trapezoid;
use bon::builder;
use log::{debug, warn};
use polars::prelude::*;

/// Smoothed death counts, exposures and mortality rate on a fine age grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedCurve {
    age: Vec<f64>,
    Dx: Vec<f64>,
    Nx: Vec<f64>,
    Mx: Vec<f64>,
}

impl SmoothedCurve {
    pub fn age(&self) -> &[f64] {
        &self.age
    }

    pub fn Dx(&self) -> &[f64] {
        &self.Dx
    }

    pub fn Nx(&self) -> &[f64] {
        &self.Nx
    }

    pub fn Mx(&self) -> &[f64] {
        &self.Mx
    }

    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("age".into(), self.age.clone()).into_column(),
            Series::new("Dx".into(), self.Dx.clone()).into_column(),
            Series::new("Nx".into(), self.Nx.clone()).into_column(),
            Series::new("Mx".into(), self.Mx.clone()).into_column(),
        ])
    }
}

/// Continuous-age survival functions derived from a hazard.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalCurve {
    age: Vec<f64>,
    hx: Vec<f64>,
    Hx: Vec<f64>,
    Sx: Vec<f64>,
    Fx: Vec<f64>,
    fx: Vec<f64>,
}

impl SurvivalCurve {
    /// Build from a hazard sampled on an increasing age grid.
    ///
    /// # Formula
    /// ```text
    /// Hₓ = ∫₀ˣ h(t) dt   (cumulative trapezoid, H at the first age = 0)
    /// Sₓ = exp(−Hₓ)
    /// Fₓ = 1 − Sₓ
    /// fₓ = hₓ · Sₓ
    /// ```
    pub fn from_hazard(age: Vec<f64>, hx: Vec<f64>) -> LifeTabResult<Self> {
        if age.is_empty() {
            return Err("survival curve needs at least one age".into());
        }
        let Hx = cumulative_trapezoid(&hx, &age)?;
        let Sx: Vec<f64> = Hx.iter().map(|H| (-H).exp()).collect();
        let Fx: Vec<f64> = Sx.iter().map(|S| 1.0 - S).collect();
        let fx: Vec<f64> = hx.iter().zip(Sx.iter()).map(|(h, S)| h * S).collect();

        Ok(Self {
            age,
            hx,
            Hx,
            Sx,
            Fx,
            fx,
        })
    }

    pub fn age(&self) -> &[f64] {
        &self.age
    }

    pub fn hx(&self) -> &[f64] {
        &self.hx
    }

    pub fn Hx(&self) -> &[f64] {
        &self.Hx
    }

    pub fn Sx(&self) -> &[f64] {
        &self.Sx
    }

    pub fn Fx(&self) -> &[f64] {
        &self.Fx
    }

    pub fn fx(&self) -> &[f64] {
        &self.fx
    }

    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("age".into(), self.age.clone()).into_column(),
            Series::new("hx".into(), self.hx.clone()).into_column(),
            Series::new("Hx".into(), self.Hx.clone()).into_column(),
            Series::new("Sx".into(), self.Sx.clone()).into_column(),
            Series::new("Fx".into(), self.Fx.clone()).into_column(),
            Series::new("fx".into(), self.fx.clone()).into_column(),
        ])
    }
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Smoothing stage: spline-smoothed Dx and Nx on a fine grid and `Mx = |Dx| / |Nx|`.
///
/// Absolute values guard against spline overshoot below zero. Where the
/// smoothed exposure is 0 the rate is infinite or NaN and is left as is.
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// let counts = CountSeries::new(
///     vec![0.0, 1.0, 2.0, 3.0],
///     vec![10.0, 10.0, 10.0, 10.0],
///     vec![1000.0, 1000.0, 1000.0, 1000.0],
/// )?;
/// let config = SmoothingConfig::builder().end_age(3.0).build()?;
/// let smoothed = smooth_counts().counts(&counts).config(&config).call()?;
/// assert!((smoothed.Mx()[150] - 0.01).abs() < 1e-9);
/// # LifeTabResult::Ok(())
/// ```
#[builder]
pub fn smooth_counts(counts: &CountSeries, config: &SmoothingConfig) -> LifeTabResult<SmoothedCurve> {
    let spline_dx = SmoothingSpline::fit(counts.ages(), counts.deaths(), config.s_dx)?;
    let spline_nx = SmoothingSpline::fit(counts.ages(), counts.exposures(), config.s_nx)?;

    let age = config.age_grid();
    let Dx: Vec<f64> = spline_dx.evaluate_many(&age).iter().map(|v| v.abs()).collect();
    let Nx: Vec<f64> = spline_nx.evaluate_many(&age).iter().map(|v| v.abs()).collect();
    let Mx: Vec<f64> = Dx.iter().zip(Nx.iter()).map(|(d, n)| (d / n).abs()).collect();

    if Nx.iter().any(|n| *n == 0.0) {
        warn!("smoothed exposure reaches zero on the grid; Mx is undefined there");
    }
    debug!(
        "smoothed {} points onto {} grid ages (alpha Dx={:e}, Nx={:e})",
        counts.ages().len(),
        age.len(),
        spline_dx.alpha(),
        spline_nx.alpha()
    );

    Ok(SmoothedCurve { age, Dx, Nx, Mx })
}

/// Survival stage: treat the smoothed rate as the hazard and integrate it.
///
/// See [`SurvivalCurve::from_hazard`] for the formulas.
#[builder]
pub fn survival_curve(smoothed: &SmoothedCurve) -> LifeTabResult<SurvivalCurve> {
    SurvivalCurve::from_hazard(smoothed.age.clone(), smoothed.Mx.clone())
}

//! # Smoothed Hazard and Survivorship Ages
//!
//! Derives survivorship ages from raw death and exposure counts in three strictly ordered stages:
//!
//! 1. **Smoothing**: smoothing splines through Dx and Nx by age, evaluated on a fine grid,
//!    give a continuous mortality rate `Mx = |Dx| / |Nx|`
//! 2. **Survival**: `Mx` is taken as the hazard; cumulative hazard by trapezoidal
//!    integration gives `Sx = exp(−Hx)`, `Fx = 1 − Sx` and `fx = hx · Sx`
//! 3. **Survivorship ages**: the first age at which the survival percentage reaches each
//!    integer percentile `s1..s100`, plus `s0` (the last grid age)
//!
//! Each stage consumes the previous stage's output type, so they cannot run out of order.
//!
//! ## Usage Example
//! ```rust
//! # use lifetab::prelude::*;
//! let ages: Vec<f64> = (0..=110).map(f64::from).collect();
//! let exposures: Vec<f64> = ages.iter().map(|_| 50_000.0).collect();
//! let deaths: Vec<f64> = ages.iter().map(|x| 50_000.0 * 0.0001 * (0.09 * x).exp()).collect();
//!
//! let counts = CountSeries::new(ages, deaths, exposures)?;
//! let config = SmoothingConfig::builder().s_dx(30.0).s_nx(30.0).build()?;
//!
//! let smoothed = smooth_counts().counts(&counts).config(&config).call()?;
//! let survival = survival_curve().smoothed(&smoothed).call()?;
//! let s_ages = survivorship_ages().survival(&survival).call();
//! println!("median age at death: {:.2}", s_ages.s(50));
//! # LifeTabResult::Ok(())
//! ```
//!
//! ## Submodules
//! - [`spline`] — natural cubic smoothing spline with a residual bound
//! - [`hazard`] — smoothing stage and survival stage
//! - [`survivorship`] — percentile ages of the survival curve

// Module structure
pub mod hazard;
pub mod spline;
pub mod survivorship;

use crate::LifeTabResult;
use crate::params::CountSeriesParams;
use bon::bon;
use garde::Validate;

// ===============================================
// SMOOTHING CONFIGURATION
// ===============================================

/// Settings for the smoothing stage.
#[derive(Debug, Clone, PartialEq, Validate)]
#[garde(allow_unvalidated)]
pub struct SmoothingConfig {
    /// Residual bound for the death-count spline; `None` uses the number of data points.
    pub s_dx: Option<f64>,

    /// Residual bound for the exposure spline; `None` uses the number of data points.
    pub s_nx: Option<f64>,

    /// First age of the evaluation grid.
    #[garde(custom(validate_finite))]
    pub start_age: f64,

    /// End of the evaluation grid (exclusive).
    #[garde(custom(validate_finite))]
    pub end_age: f64,

    /// Grid spacing.
    #[garde(custom(validate_step))]
    pub step: f64,
}

fn validate_finite(value: &f64, _context: &()) -> garde::Result {
    if !value.is_finite() {
        return Err(garde::Error::new("value must be finite"));
    }
    Ok(())
}

fn validate_step(value: &f64, _context: &()) -> garde::Result {
    if !value.is_finite() || *value <= 0.0 {
        return Err(garde::Error::new(format!("step must be positive, got {value}")));
    }
    Ok(())
}

impl SmoothingConfig {
    /// Validate with cross-field validation using Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()?;
        self.validate_custom_constraints()
    }

    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut report = garde::Report::new();

        for (path, value) in [("s_dx", self.s_dx), ("s_nx", self.s_nx)] {
            if let Some(s) = value {
                if !s.is_finite() || s < 0.0 {
                    report.append(
                        garde::Path::new(path),
                        garde::Error::new(format!(
                            "smoothing factor must be finite and non-negative, got {s}"
                        )),
                    );
                }
            }
        }

        if self.end_age <= self.start_age {
            report.append(
                garde::Path::new("end_age"),
                garde::Error::new(format!(
                    "end_age {} must be greater than start_age {}",
                    self.end_age, self.start_age
                )),
            );
        }

        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }
}

#[bon]
impl SmoothingConfig {
    #[builder]
    pub fn new(
        s_dx: Option<f64>,
        s_nx: Option<f64>,
        #[builder(default = 0.0)] start_age: f64,
        #[builder(default = 110.0)] end_age: f64,
        #[builder(default = 0.01)] step: f64,
    ) -> LifeTabResult<Self> {
        let config = SmoothingConfig {
            s_dx,
            s_nx,
            start_age,
            end_age,
            step,
        };

        config
            .validate_all()
            .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

        Ok(config)
    }

    /// Regular grid `start_age, start_age + step, …` strictly below `end_age`.
    pub fn age_grid(&self) -> Vec<f64> {
        let span = (self.end_age - self.start_age) / self.step;
        // Guard against span landing a hair above an integer
        let count = (span - 1e-9).ceil().max(0.0) as usize;
        (0..count)
            .map(|i| self.start_age + i as f64 * self.step)
            .collect()
    }
}

// ===============================================
// RAW COUNTS
// ===============================================

/// Death counts and exposures by age for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSeries {
    ages: Vec<f64>,
    deaths: Vec<f64>,
    exposures: Vec<f64>,
}

impl CountSeries {
    /// Create a count series; rows are sorted by age first.
    ///
    /// # Errors
    /// - Fewer than 3 ages, or vectors of different lengths
    /// - Duplicate or non-finite ages
    /// - Negative or non-finite counts
    pub fn new(ages: Vec<f64>, deaths: Vec<f64>, exposures: Vec<f64>) -> LifeTabResult<Self> {
        let (ages, deaths, exposures) = if ages.len() == deaths.len() && ages.len() == exposures.len() {
            sort_by_age(ages, deaths, exposures)
        } else {
            (ages, deaths, exposures)
        };

        let params = CountSeriesParams {
            ages,
            deaths,
            exposures,
        };

        params
            .validate_all()
            .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

        Ok(Self {
            ages: params.ages,
            deaths: params.deaths,
            exposures: params.exposures,
        })
    }

    pub fn ages(&self) -> &[f64] {
        &self.ages
    }

    pub fn deaths(&self) -> &[f64] {
        &self.deaths
    }

    pub fn exposures(&self) -> &[f64] {
        &self.exposures
    }
}

fn sort_by_age(ages: Vec<f64>, deaths: Vec<f64>, exposures: Vec<f64>) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rows: Vec<(f64, f64, f64)> = ages
        .into_iter()
        .zip(deaths)
        .zip(exposures)
        .map(|((a, d), n)| (a, d, n))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ages = Vec::with_capacity(rows.len());
    let mut deaths = Vec::with_capacity(rows.len());
    let mut exposures = Vec::with_capacity(rows.len());
    for (a, d, n) in rows {
        ages.push(a);
        deaths.push(d);
        exposures.push(n);
    }
    (ages, deaths, exposures)
}

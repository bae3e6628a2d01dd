use bon::Builder;
use garde::Validate;

// =======================================
// MORTALITY SCHEDULE PARAMETER STRUCT
// =======================================

/// Largest rate an interior age may carry: with aₓ = ½, `qₓ = mₓ / (1 + ½ mₓ) ≤ 1` iff `mₓ ≤ 2`.
pub const MAX_INTERIOR_RATE: f64 = 2.0;

#[derive(Debug, Clone, Validate, Builder)]
#[garde(allow_unvalidated)]
pub struct ScheduleParams {
    // Single-year ages, must start at 0 and be contiguous
    #[garde(length(min = 1))]
    pub ages: Vec<u32>,

    // Mortality rates, one per age
    // Non-negative and finite; NaN only at the first or last age
    #[garde(length(min = 1))]
    pub mx: Vec<f64>,
}

impl ScheduleParams {
    /// Validate with cross-field validation using Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        // First run garde's built-in validations
        self.validate()?;

        // Then run our custom cross-field validations
        self.validate_custom_constraints()
    }

    /// Custom cross-field validations that garde can't handle with attributes
    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut errors: ErrorVec = Vec::new();

        if self.ages.len() != self.mx.len() {
            errors.push((
                "mx",
                format!(
                    "schedule has {} ages but {} rates",
                    self.ages.len(),
                    self.mx.len()
                ),
            ));
            return into_report(errors);
        }

        validate_contiguous_ages_from_zero(&self.ages, &mut errors);

        let omega = self.mx.len() - 1;
        for (i, &m) in self.mx.iter().enumerate() {
            let age = self.ages[i];
            if m.is_nan() {
                if i != 0 && i != omega {
                    errors.push((
                        "mx",
                        format!("rate at age {age} is missing; only the first and last ages may be NaN"),
                    ));
                }
            } else if m.is_infinite() {
                errors.push(("mx", format!("rate at age {age} must be finite")));
            } else if m < 0.0 {
                errors.push(("mx", format!("rate at age {age} must be non-negative, got {m}")));
            } else if i != 0 && i != omega && m > MAX_INTERIOR_RATE {
                errors.push((
                    "mx",
                    format!(
                        "rate at age {age} is {m}; above {MAX_INTERIOR_RATE} the probability of death exceeds 1"
                    ),
                ));
            }
        }

        into_report(errors)
    }
}

// =======================================
// COMPLETE LIFE TABLE PARAMETER STRUCT
// =======================================
#[derive(Debug, Clone, Validate)]
#[garde(allow_unvalidated)]
#[allow(non_snake_case)]
pub struct LifeTableParams {
    // Single-year ages, must start at 0 and be contiguous
    #[garde(length(min = 1))]
    pub ages: Vec<u32>,

    // Probability of death, within [0, 1] where present
    pub qx: Vec<f64>,

    // Survivors, lx[0] is the radix
    pub lx: Vec<f64>,

    // Remaining columns, checked for length only
    pub mx: Vec<f64>,
    pub ax: Vec<f64>,
    pub dx: Vec<f64>,
    pub Lx: Vec<f64>,
    pub Tx: Vec<f64>,
    pub ex: Vec<f64>,
}

impl LifeTableParams {
    /// Validate with cross-field validation using Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()?;
        self.validate_custom_constraints()
    }

    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut errors: ErrorVec = Vec::new();
        let n = self.ages.len();

        let columns: [(&'static str, usize); 8] = [
            ("mx", self.mx.len()),
            ("ax", self.ax.len()),
            ("qx", self.qx.len()),
            ("lx", self.lx.len()),
            ("dx", self.dx.len()),
            ("Lx", self.Lx.len()),
            ("Tx", self.Tx.len()),
            ("ex", self.ex.len()),
        ];
        for (name, len) in columns {
            if len != n {
                errors.push((name, format!("table has {n} ages but {len} {name} values")));
            }
        }
        if !errors.is_empty() {
            return into_report(errors);
        }

        validate_contiguous_ages_from_zero(&self.ages, &mut errors);

        let l0 = self.lx[0];
        if !l0.is_finite() || l0 <= 0.0 {
            errors.push(("lx", format!("lx at age 0 is the radix and must be positive, got {l0}")));
        }
        if self.lx.iter().any(|l| !l.is_finite() || *l < 0.0) {
            errors.push(("lx", "survivors must be finite and non-negative".into()));
        } else if self.lx.windows(2).any(|w| w[1] > w[0]) {
            errors.push(("lx", "survivors must not increase with age".into()));
        }

        for (age, q) in self.ages.iter().zip(self.qx.iter()) {
            if !q.is_nan() && !(0.0..=1.0).contains(q) {
                errors.push(("qx", format!("probability of death at age {age} must lie in [0, 1], got {q}")));
            }
        }

        into_report(errors)
    }
}

// =======================================
// RAW COUNTS PARAMETER STRUCT
// =======================================
#[derive(Debug, Clone, Validate, Builder)]
#[garde(allow_unvalidated)]
pub struct CountSeriesParams {
    // Ages, strictly increasing (need at least 3 points for a cubic smoothing spline)
    #[garde(length(min = 3))]
    pub ages: Vec<f64>,

    // Death counts Dx, one per age
    pub deaths: Vec<f64>,

    // Exposure counts Nx, one per age
    pub exposures: Vec<f64>,
}

impl CountSeriesParams {
    /// Validate with cross-field validation using Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()?;
        self.validate_custom_constraints()
    }

    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut errors: ErrorVec = Vec::new();
        let n = self.ages.len();

        if self.deaths.len() != n || self.exposures.len() != n {
            errors.push((
                "",
                format!(
                    "ages ({n}), deaths ({}) and exposures ({}) must have the same length",
                    self.deaths.len(),
                    self.exposures.len()
                ),
            ));
            return into_report(errors);
        }

        if self.ages.iter().any(|a| !a.is_finite()) {
            errors.push(("ages", "ages must be finite".into()));
        } else if self.ages.windows(2).any(|w| w[1] <= w[0]) {
            errors.push(("ages", "ages must be strictly increasing".into()));
        }

        validate_counts("deaths", &self.deaths, &mut errors);
        validate_counts("exposures", &self.exposures, &mut errors);

        into_report(errors)
    }
}

// =======================================
// PRIVATE FUNCTIONS
// =======================================

type ErrorVec = Vec<(&'static str, String)>;

fn into_report(errors: ErrorVec) -> Result<(), garde::Report> {
    let mut report = garde::Report::new();

    // Convert errors to report
    for (path, message) in errors {
        report.append(garde::Path::new(path), garde::Error::new(message));
    }

    // Return Ok if no errors, otherwise return the complete report
    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

fn validate_contiguous_ages_from_zero(ages: &[u32], errors: &mut ErrorVec) {
    if let Some(&first) = ages.first() {
        if first != 0 {
            errors.push(("ages", format!("ages must start at 0, got {first}")));
        }
    }

    let is_consecutive = ages.windows(2).all(|w| w[0].checked_add(1) == Some(w[1]));
    if !is_consecutive {
        errors.push((
            "ages",
            "ages must be contiguous whole numbers in ascending order (step 1)".into(),
        ));
    }
}

fn validate_counts(name: &'static str, values: &[f64], errors: &mut ErrorVec) {
    if values.iter().any(|v| !v.is_finite()) {
        errors.push((name, format!("{name} must be finite")));
    } else if values.iter().any(|v| *v < 0.0) {
        errors.push((name, format!("{name} must be non-negative")));
    }
}

//! # Life Table Configuration (LifeTableConfig)
//!
//! Configure a period life table from a validated mortality schedule.
//!
//! This module provides the `LifeTableConfig` struct and related types:
//! - Mortality schedule (`mx` by single year of age, last age open-ended)
//! - Sex of the population, which selects the infant separation factor coefficients
//! - Radix (starting cohort size)
//!
//! ## Quick Start
//! ```rust
//! # use lifetab::prelude::*;
//! let data = MortalitySchedule::from_rates(vec![0.01, 0.002, 0.001, 0.15])?;
//! let config = LifeTableConfig::builder()
//!     .data(data)
//!     .sex(Sex::Female)
//!     .build()?;
//! println!("Config created with radix: {:?}", config.radix);
//! # LifeTabResult::Ok(())
//! ```
//!
//! ## Configuration Options
//! - **data**: Mortality schedule under struct [`MortalitySchedule`]
//! - **sex**: Sex of the population (female, male or total)
//! - **radix**: Initial cohort size, default 1
//!
//! ## See Also
//! - [`crate::life_table`] for life table construction and lifespan measures
//! - [`crate::groups`] for grouped (population × sex × period) pipelines

// Create a structure for the module
pub mod mx_data;

use self::mx_data::MortalitySchedule;
use crate::life_table::infant::a0;
use crate::LifeTabResult;
use bon::bon;
use garde::Validate;
use std::fmt;
use std::str::FromStr;

// ===============================================
// SEX
// ===============================================

/// Sex of the population a schedule describes.
///
/// The separation factor at age 0 uses sex-specific coefficients. `Total`
/// (both sexes combined) follows the non-male branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
    Total,
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Total => "Total",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sex {
    type Err = Box<dyn std::error::Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "female" | "females" => Ok(Sex::Female),
            "m" | "male" | "males" => Ok(Sex::Male),
            "t" | "total" | "both" => Ok(Sex::Total),
            other => Err(format!("Unrecognised sex label '{other}'").into()),
        }
    }
}

// ===============================================
// LIFE TABLE CONFIGURATION
// ===============================================

/// Configuration for building one period life table.
///
/// See the module documentation for usage and examples.
#[derive(Debug, Clone, Validate)]
#[garde(allow_unvalidated)]
pub struct LifeTableConfig {
    /// Source mortality schedule (validated on construction).
    pub data: MortalitySchedule,

    /// Sex of the population.
    pub sex: Sex,

    /// Initial cohort size (radix). Common values: 1 (proportions), 100,000 (HMD tables).
    #[garde(range(min = 1))]
    pub radix: u32,
}

#[bon]
impl LifeTableConfig {
    #[builder]
    pub fn new(
        data: MortalitySchedule,
        sex: Sex,
        #[builder(default = 1)] radix: u32,
    ) -> LifeTabResult<Self> {
        let config = LifeTableConfig { data, sex, radix };

        config
            .validate_all()
            .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

        Ok(config)
    }

    /// Validate with cross-field validation using Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()?;
        self.validate_custom_constraints()
    }

    /// The infant rate depends on the sex through a₀: `q₀ ≤ 1` iff `a₀ · m₀ ≤ 1`.
    fn validate_custom_constraints(&self) -> Result<(), garde::Report> {
        let mut report = garde::Report::new();

        let m0 = self.data.mx()[0];
        if self.data.omega() > 0 && !m0.is_nan() {
            let a0 = a0().m0(m0).sex(self.sex).call();
            if a0 * m0 > 1.0 {
                report.append(
                    garde::Path::new("data"),
                    garde::Error::new(format!(
                        "infant rate {m0} with a0 = {a0} gives a probability of death above 1"
                    )),
                );
            }
        }

        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }

    /// Index of the open-ended terminal age group.
    pub fn omega(&self) -> usize {
        self.data.omega()
    }

    pub fn max_age(&self) -> u32 {
        self.data.ages()[self.data.omega()]
    }
}

//! # lifetab
//!
//! Period life tables and lifespan inequality measures from age-specific mortality rates.
//!
//! ## Features
//! - **Life Tables**: aₓ, qₓ, lₓ, dₓ, Lₓ, Tₓ, eₓ from single-year mortality rates with an open terminal age
//! - **Infant Separation Factor**: Andreev-Kingkade a₀ by sex
//! - **Lifespan Inequality**: H (entropy-like), v (log-inverted CV), G (Gini-like) and sd of age at death
//! - **Sex Disparity**: φ, the probability that a female dies before a male
//! - **Smoothed Survivorship**: spline-smoothed hazard from raw counts, survival curve and percentile ages s0..s100
//! - **Grouped Pipelines**: population × sex × period groups from long DataFrames, processed in parallel
//! - **Builder Pattern**: All functions use builder pattern with automatic parameter validation
//!
//! ## Quick Start
//!
//! ```rust
//! use lifetab::prelude::*;
//!
//! let data = MortalitySchedule::from_rates(vec![0.01, 0.002, 0.001, 0.15])?;
//!
//! // Radix defaults to 1
//! let config = LifeTableConfig::builder()
//!     .data(data)
//!     .sex(Sex::Female)
//!     .build()?;
//!
//! let lt = life_table().lt(&config).call()?;
//! let summary = inequality_summary().lt(&lt).call();
//!
//! println!("e0: {:.4}", lt.e0());
//! println!("H: {:.4}, v: {:.4}, G: {:.4}", summary.H, summary.v, summary.G);
//! # LifeTabResult::Ok(())
//! ```
//!
//! ## Supported Functions
//!
//! - **Life Table**: `life_table`, `a0`
//! - **Inequality**: `H`, `v`, `G`, `sd`, `inequality_summary`
//! - **Disparity**: `phi`, `sex_disparity`
//! - **Smoothing**: `smooth_counts`, `survival_curve`, `survivorship_ages`
//! - **Groups**: `group_schedules`, `group_counts`, `life_tables`, `inequality_by_group`,
//!   `sex_disparity_by_group`, `survivorship_by_group` and the matching `*_frame` functions
//!
//! ## Notes
//! - Common builder methods: `.lt()`, `.female()`, `.male()`, `.counts()`, `.config()`
//! - Undefined numeric results are NaN and propagate rather than raising errors
//! - Logging goes through the `log` facade; install any logger to see it

pub type LifeTabResult<T> = Result<T, Box<dyn std::error::Error>>;
pub mod groups;
pub mod helpers;
pub mod life_table;
pub mod lt_config;
pub mod macros;
pub mod params;
pub mod prelude;
pub mod smoothing;

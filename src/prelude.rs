//! # lifetab Prelude
//!
//! Conveniently re-exports the most common types and functions for life table calculations.
//! Import this module to access all primary lifetab features with a single `use` statement.
//!
//! ## Example
//!
//! ```rust
//! # use lifetab::prelude::*;
//! use polars::prelude::*;
//! let df = df! {
//!     "age" => [0, 1, 2],
//!     "mx" => [0.005, 0.001, 0.25]
//! }?;
//! let data = MortalitySchedule::from_df(df)?;
//! let config = LifeTableConfig::builder()
//!     .data(data)
//!     .sex(Sex::Male)
//!     .radix(100_000)
//!     .build()?;
//! let lt = life_table().lt(&config).call()?;
//! println!("e0: {:.4}", lt.e0());
//! # LifeTabResult::Ok(())
//! ```

// Package Result type for lifetab functions
pub use crate::LifeTabResult;

// Life table configuration and input data
pub use crate::lt_config::mx_data::MortalitySchedule;
pub use crate::lt_config::{LifeTableConfig, Sex};

// Life table and lifespan measures
pub use crate::life_table::disparity::*;
pub use crate::life_table::inequality::*;
pub use crate::life_table::infant::*;
pub use crate::life_table::table::*;

// Smoothed hazard pipeline
pub use crate::smoothing::hazard::*;
pub use crate::smoothing::spline::SmoothingSpline;
pub use crate::smoothing::survivorship::*;
pub use crate::smoothing::{CountSeries, SmoothingConfig};

// Grouped pipelines
pub use crate::groups::*;

// Macros
pub use crate::mxdf;

// Most commonly used Polars types for working with schedules and results
pub use polars::prelude::{DataFrame, LazyFrame, PolarsError, PolarsResult, Series};

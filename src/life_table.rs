//! # Period Life Tables and Lifespan Measures
//!
//! This module turns a mortality schedule into a life table and summarises it:
//!
//! - Infant separation factor a₀ (Andreev-Kingkade piecewise regression)
//! - Life table columns aₓ, qₓ, lₓ, dₓ, Lₓ, Tₓ, eₓ with an open terminal interval
//! - Lifespan inequality: H (entropy-like), v (log-inverted CV), G (Gini-like), sd
//! - Sex disparity φ from a female and a male table
//!
//! ## Submodules
//! - [`infant`] — separation factor for deaths in the first year of life
//! - [`table`] — life table construction
//! - [`inequality`] — H, v, G and age-at-death standard deviation
//! - [`disparity`] — φ outsurvival statistic and the per-sex summary record
//!
//! ## Usage Example
//! ```rust
//! # use lifetab::prelude::*;
//! let mx: Vec<f64> = (0..=110).map(|x| 0.00005 * 1.095f64.powi(x)).collect();
//! let female = LifeTableConfig::builder()
//!     .data(MortalitySchedule::from_rates(mx.clone())?)
//!     .sex(Sex::Female)
//!     .radix(100_000)
//!     .build()?;
//! let male = LifeTableConfig::builder()
//!     .data(MortalitySchedule::from_rates(mx.iter().map(|m| m * 1.3).collect())?)
//!     .sex(Sex::Male)
//!     .radix(100_000)
//!     .build()?;
//!
//! let lt_f = life_table().lt(&female).call()?;
//! let lt_m = life_table().lt(&male).call()?;
//!
//! let summary = inequality_summary().lt(&lt_f).call();
//! let record = sex_disparity().female(&lt_f).male(&lt_m).call()?;
//!
//! println!("e0 = {:.2}, G = {:.4}, phi = {:.4}", summary.e0, summary.G, record.phi);
//! # LifeTabResult::Ok(())
//! ```
//!
//! ## Notes
//! - Undefined numeric results (zero terminal rate, zero survivors) are NaN and are propagated, never replaced.
//! - All measures weight deaths per unit radix, so they do not depend on the radix chosen.

// Module structure
pub mod disparity;
pub mod inequality;
pub mod infant;
pub mod table;

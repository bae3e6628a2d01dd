use super::inequality::sd;
use super::table::LifeTable;
use crate::LifeTabResult;
use crate::helpers::nansum;
use bon::builder;

/// Female/male lifespan comparison for one population and period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SexDisparityRecord {
    pub phi: f64,
    pub e0_female: f64,
    pub e0_male: f64,
    pub sd_female: f64,
    pub sd_male: f64,
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Outsurvival statistic φ: probability that a female dies before a male, ties split evenly.
///
/// Both tables are rescaled to a radix of 1 before combining. Terms that
/// are NaN are dropped from the sums.
///
/// # Formula
/// ```text
/// φ = Σ_{x<ω} dₓᶠ · lₓ₊₁ᵐ + ½ · Σₓ dₓᶠ · dₓᵐ
/// ```
///
/// Two identical tables give φ = ½.
///
/// # Errors
/// - The two tables cover a different number of age groups
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// let mx = vec![0.005, 0.001, 0.002, 0.01, 0.3];
/// let f = LifeTableConfig::builder()
///     .data(MortalitySchedule::from_rates(mx.clone())?)
///     .sex(Sex::Female)
///     .build()?;
/// let m = LifeTableConfig::builder()
///     .data(MortalitySchedule::from_rates(mx)?)
///     .sex(Sex::Male)
///     .build()?;
/// let female = life_table().lt(&f).call()?;
/// let male = life_table().lt(&m).call()?;
/// let value = phi().female(&female).male(&male).call()?;
/// assert!((value - 0.5).abs() < 1e-3);
/// # LifeTabResult::Ok(())
/// ```
#[builder]
pub fn phi(female: &LifeTable, male: &LifeTable) -> LifeTabResult<f64> {
    if female.len() != male.len() {
        return Err(format!(
            "phi requires life tables with the same age groups: female has {}, male has {}",
            female.len(),
            male.len()
        )
        .into());
    }

    let dx_f = female.dx_unit();
    let dx_m = male.dx_unit();
    let lx_m = male.lx_unit();

    // Female dies in x while the male is still alive at x + 1
    let outsurvived = nansum(dx_f.iter().zip(lx_m.iter().skip(1)).map(|(d, l)| d * l));

    // Both die in the same interval
    let ties = nansum(dx_f.iter().zip(dx_m.iter()).map(|(a, b)| a * b)) / 2.0;

    Ok(outsurvived + ties)
}

/// φ together with each sex's life expectancy and age-at-death standard deviation.
#[builder]
pub fn sex_disparity(female: &LifeTable, male: &LifeTable) -> LifeTabResult<SexDisparityRecord> {
    Ok(SexDisparityRecord {
        phi: phi().female(female).male(male).call()?,
        e0_female: female.e0(),
        e0_male: male.e0(),
        sd_female: sd().lt(female).call(),
        sd_male: sd().lt(male).call(),
    })
}

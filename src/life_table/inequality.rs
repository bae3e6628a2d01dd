#![allow(non_snake_case)]

use super::table::LifeTable;
use bon::builder;

/// Lifespan inequality measures derived from one life table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InequalitySummary {
    /// Entropy-like lifespan equality index (larger is more equal).
    pub H: f64,
    /// Log-inverted coefficient of variation of age at death (larger is more equal).
    pub v: f64,
    /// Gini-like mean pairwise difference of age at death.
    pub G: f64,
    /// Standard deviation of age at death.
    pub sd: f64,
    /// Life expectancy at birth.
    pub e0: f64,
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Lifespan equality index H.
///
/// Deaths are weighted per unit radix, `wₓ = dₓ / l₀`.
///
/// # Formula
/// ```text
/// V = Σ_{x<ω} wₓ · (eₓ + aₓ·(e_ω − eₓ)) + e_ω
/// H = −ln(V / e₀)
/// ```
///
/// NaN when e₀ is not finite or zero.
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// # let data = MortalitySchedule::from_rates(vec![0.01, 0.002, 0.001, 0.15])?;
/// # let config = LifeTableConfig::builder().data(data).sex(Sex::Female).build()?;
/// let lt = life_table().lt(&config).call()?;
/// let h = H().lt(&lt).call();
/// assert!(h.is_finite());
/// # LifeTabResult::Ok(())
/// ```
#[builder]
pub fn H(lt: &LifeTable) -> f64 {
    let e0 = lt.e0();
    if !has_usable_e0(e0) {
        return f64::NAN;
    }

    let omega = lt.omega();
    let w = lt.dx_unit();
    let ex = lt.ex();
    let ax = lt.ax();
    let e_omega = ex[omega];

    let V: f64 = (0..omega)
        .map(|i| w[i] * (ex[i] + ax[i] * (e_omega - ex[i])))
        .sum::<f64>()
        + e_omega;

    negative_log(V / e0)
}

/// Standard deviation of age at death.
///
/// ```text
/// sd = sqrt( Σₓ wₓ · (x + aₓ − e₀)² )
/// ```
#[builder]
pub fn sd(lt: &LifeTable) -> f64 {
    age_at_death_variance(lt).sqrt()
}

/// Lifespan variation index v: the negative log of the coefficient of variation.
///
/// # Formula
/// ```text
/// v = −ln( sd / e₀ )
/// ```
///
/// NaN when e₀ is not finite or zero, and when every death falls at the
/// same age (sd = 0).
#[builder]
pub fn v(lt: &LifeTable) -> f64 {
    let e0 = lt.e0();
    if !has_usable_e0(e0) {
        return f64::NAN;
    }
    negative_log(age_at_death_variance(lt).sqrt() / e0)
}

/// Gini-like index G of age at death.
///
/// # Formula
/// ```text
/// G = Σᵢ Σⱼ wᵢ · wⱼ · |(i + aᵢ) − (j + aⱼ)| / (2 · e₀)
/// ```
///
/// NaN when e₀ is not finite or zero; otherwise G ≥ 0.
#[builder]
pub fn G(lt: &LifeTable) -> f64 {
    let e0 = lt.e0();
    if !has_usable_e0(e0) {
        return f64::NAN;
    }

    let w = lt.dx_unit();
    let ages = lt.age_at_death();

    let mut total = 0.0;
    for (wi, ai) in w.iter().zip(ages.iter()) {
        for (wj, aj) in w.iter().zip(ages.iter()) {
            total += wi * wj * (ai - aj).abs();
        }
    }

    total / (2.0 * e0)
}

/// All lifespan inequality measures of one life table.
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// # let data = MortalitySchedule::from_rates(vec![0.01, 0.002, 0.001, 0.15])?;
/// # let config = LifeTableConfig::builder().data(data).sex(Sex::Female).build()?;
/// let lt = life_table().lt(&config).call()?;
/// let summary = inequality_summary().lt(&lt).call();
/// println!("H={:.4} v={:.4} G={:.4}", summary.H, summary.v, summary.G);
/// # LifeTabResult::Ok(())
/// ```
#[builder]
pub fn inequality_summary(lt: &LifeTable) -> InequalitySummary {
    InequalitySummary {
        H: H().lt(lt).call(),
        v: v().lt(lt).call(),
        G: G().lt(lt).call(),
        sd: sd().lt(lt).call(),
        e0: lt.e0(),
    }
}

// =======================================
// PRIVATE FUNCTIONS
// =======================================

fn has_usable_e0(e0: f64) -> bool {
    e0.is_finite() && e0 != 0.0
}

/// `−ln(ratio)`, NaN for a non-positive ratio.
fn negative_log(ratio: f64) -> f64 {
    if ratio > 0.0 { -ratio.ln() } else { f64::NAN }
}

fn age_at_death_variance(lt: &LifeTable) -> f64 {
    let e0 = lt.e0();
    let w = lt.dx_unit();
    lt.age_at_death()
        .iter()
        .zip(w.iter())
        .map(|(a, wi)| wi * (a - e0).powi(2))
        .sum()
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::life_table::table::life_table;
    use crate::lt_config::mx_data::MortalitySchedule;
    use crate::lt_config::{LifeTableConfig, Sex};
    use approx::assert_abs_diff_eq;

    fn build(mx: Vec<f64>, sex: Sex, radix: u32) -> LifeTable {
        let data = MortalitySchedule::from_rates(mx).unwrap();
        let config = LifeTableConfig::builder()
            .data(data)
            .sex(sex)
            .radix(radix)
            .build()
            .unwrap();
        life_table().lt(&config).call().unwrap()
    }

    fn gompertz(omega: i32) -> Vec<f64> {
        (0..=omega).map(|x| 0.00005 * (1.095f64).powi(x)).collect()
    }

    #[test]
    fn test_hand_computed_measures() {
        let lt = build(vec![0.01, 0.002, 0.001, 0.15], Sex::Female, 1);
        let s = inequality_summary().lt(&lt).call();
        assert_abs_diff_eq!(s.H, 0.3424644998984466, epsilon = 1e-10);
        assert_abs_diff_eq!(s.sd, 1.03474396077299, epsilon = 1e-10);
        assert_abs_diff_eq!(s.v, 2.2222694052852168, epsilon = 1e-10);
        assert_abs_diff_eq!(s.G, 0.012182162112779194, epsilon = 1e-10);
        assert_abs_diff_eq!(s.e0, 9.5488757065858, epsilon = 1e-10);
    }

    #[test]
    fn test_measures_finite_and_gini_non_negative() {
        let lt = build(gompertz(110), Sex::Male, 100_000);
        let s = inequality_summary().lt(&lt).call();
        assert!(s.H.is_finite());
        assert!(s.v.is_finite());
        assert!(s.G.is_finite());
        assert!(s.G >= 0.0);
    }

    #[test]
    fn test_measures_invariant_to_radix() {
        let a = inequality_summary().lt(&build(gompertz(100), Sex::Female, 1)).call();
        let b = inequality_summary()
            .lt(&build(gompertz(100), Sex::Female, 100_000))
            .call();
        assert_abs_diff_eq!(a.H, b.H, epsilon = 1e-10);
        assert_abs_diff_eq!(a.v, b.v, epsilon = 1e-10);
        assert_abs_diff_eq!(a.G, b.G, epsilon = 1e-10);
    }

    #[test]
    fn test_everyone_dies_at_once_has_zero_gini() {
        // Only the open interval: one age at death, no dispersion
        let lt = build(vec![0.5], Sex::Female, 1);
        assert_abs_diff_eq!(G().lt(&lt).call(), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(sd().lt(&lt).call(), 0.0, epsilon = 1e-15);

        // ln(0) is undefined, never infinite
        let v_value = v().lt(&lt).call();
        assert!(v_value.is_nan(), "v = {v_value}");
        assert_abs_diff_eq!(H().lt(&lt).call(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_non_finite_e0_propagates_nan() {
        let lt = build(vec![0.01, 0.002, 0.0], Sex::Female, 1);
        let s = inequality_summary().lt(&lt).call();
        assert!(s.H.is_nan());
        assert!(s.v.is_nan());
        assert!(s.G.is_nan());
    }
}

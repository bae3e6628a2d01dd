#![allow(non_snake_case)]

use super::infant::a0;
use crate::LifeTabResult;
use crate::helpers::reverse_cumsum;
use crate::lt_config::mx_data::{age_column_to_vec, rate_column_to_vec};
use crate::lt_config::{LifeTableConfig, Sex};
use crate::params::LifeTableParams;
use bon::builder;
use log::{debug, warn};
use polars::prelude::*;

/// A complete period life table.
///
/// Every column is indexed by single year of age `0..=ω`, the last entry
/// being the open-ended interval. Built once by [`life_table`], never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct LifeTable {
    sex: Sex,
    radix: f64,
    age: Vec<u32>,
    mx: Vec<f64>,
    ax: Vec<f64>,
    qx: Vec<f64>,
    lx: Vec<f64>,
    dx: Vec<f64>,
    Lx: Vec<f64>,
    Tx: Vec<f64>,
    ex: Vec<f64>,
}

impl LifeTable {
    /// Load a complete table, such as one published by the Human Mortality
    /// Database, with columns `age, mx, qx, ax, lx, dx, Lx, Tx, ex`.
    ///
    /// Column order does not matter and rows are sorted by age. Age labels
    /// like `"110+"` are accepted. The radix is read from `lx` at age 0, so
    /// tables on any radix work with [`LifeTable::lx_unit`] and the measures
    /// built on it.
    ///
    /// # Errors
    /// - a required column is missing
    /// - ages are not contiguous from 0
    /// - `lx` is not a positive, non-increasing column
    /// - `qx` falls outside `[0, 1]`
    pub fn from_df(df: DataFrame, sex: Sex) -> LifeTabResult<Self> {
        if df.height() == 0 {
            return Err("DataFrame must contain at least one row of data".into());
        }

        let age = age_column_to_vec(df.column("age")?)?;
        let mut order: Vec<usize> = (0..age.len()).collect();
        order.sort_by_key(|&i| age[i]);

        let column = |name: &str| -> LifeTabResult<Vec<f64>> {
            let values = rate_column_to_vec(df.column(name)?)?;
            Ok(order.iter().map(|&i| values.get(i).copied().unwrap_or(f64::NAN)).collect())
        };

        let params = LifeTableParams {
            ages: order.iter().map(|&i| age[i]).collect(),
            mx: column("mx")?,
            qx: column("qx")?,
            ax: column("ax")?,
            lx: column("lx")?,
            dx: column("dx")?,
            Lx: column("Lx")?,
            Tx: column("Tx")?,
            ex: column("ex")?,
        };

        params
            .validate_all()
            .map_err(|e| format!("Validation failed: {e}"))?;

        debug!(
            "life table loaded: sex={}, ages 0..={}, radix={}",
            sex,
            params.ages[params.ages.len() - 1],
            params.lx[0]
        );

        Ok(LifeTable {
            sex,
            radix: params.lx[0],
            age: params.ages,
            mx: params.mx,
            ax: params.ax,
            qx: params.qx,
            lx: params.lx,
            dx: params.dx,
            Lx: params.Lx,
            Tx: params.Tx,
            ex: params.ex,
        })
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn radix(&self) -> f64 {
        self.radix
    }

    /// Index of the open-ended terminal age group.
    pub fn omega(&self) -> usize {
        self.age.len() - 1
    }

    pub fn len(&self) -> usize {
        self.age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
    }

    pub fn age(&self) -> &[u32] {
        &self.age
    }

    pub fn mx(&self) -> &[f64] {
        &self.mx
    }

    pub fn ax(&self) -> &[f64] {
        &self.ax
    }

    pub fn qx(&self) -> &[f64] {
        &self.qx
    }

    pub fn lx(&self) -> &[f64] {
        &self.lx
    }

    pub fn dx(&self) -> &[f64] {
        &self.dx
    }

    pub fn Lx(&self) -> &[f64] {
        &self.Lx
    }

    pub fn Tx(&self) -> &[f64] {
        &self.Tx
    }

    pub fn ex(&self) -> &[f64] {
        &self.ex
    }

    /// Life expectancy at birth, e₀.
    pub fn e0(&self) -> f64 {
        self.ex[0]
    }

    /// Survivors rescaled to a radix of 1: `lx / l₀`.
    pub fn lx_unit(&self) -> Vec<f64> {
        self.lx.iter().map(|l| l / self.radix).collect()
    }

    /// Deaths rescaled to a radix of 1: `dx / l₀`.
    pub fn dx_unit(&self) -> Vec<f64> {
        self.dx.iter().map(|d| d / self.radix).collect()
    }

    /// Mean age at death in each interval: `x + aₓ`.
    pub fn age_at_death(&self) -> Vec<f64> {
        self.age
            .iter()
            .zip(self.ax.iter())
            .map(|(&x, &a)| f64::from(x) + a)
            .collect()
    }

    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("age".into(), self.age.clone()).into_column(),
            Series::new("mx".into(), self.mx.clone()).into_column(),
            Series::new("ax".into(), self.ax.clone()).into_column(),
            Series::new("qx".into(), self.qx.clone()).into_column(),
            Series::new("lx".into(), self.lx.clone()).into_column(),
            Series::new("dx".into(), self.dx.clone()).into_column(),
            Series::new("Lx".into(), self.Lx.clone()).into_column(),
            Series::new("Tx".into(), self.Tx.clone()).into_column(),
            Series::new("ex".into(), self.ex.clone()).into_column(),
        ])
    }
}

// =======================================
// PUBLIC FUNCTIONS
// =======================================

/// Build a period life table from a mortality schedule.
///
/// # Formula
/// ```text
/// aₓ = 0.5                       interior ages
/// a₀ = a0(m₀, sex)               infant separation factor
/// a_ω = 1 / m_ω                  open interval
///
/// qₓ = mₓ / (1 + (1 − aₓ)·mₓ)    x < ω
/// q_ω = 1                        (NaN if the raw value is NaN)
///
/// pₓ = 1 − qₓ                    (NaN treated as 0)
/// l₀ = radix,  lₓ = lₓ₋₁ · pₓ₋₁
/// dₓ = lₓ · qₓ
/// Lₓ = lₓ − (1 − aₓ)·dₓ          x < ω
/// L_ω = l_ω · a_ω
/// Tₓ = Σ_{x≤j<ω} Lⱼ + L_ω
/// eₓ = Tₓ / lₓ                   (NaN when lₓ = 0)
/// ```
///
/// Numeric edge cases are not errors: a zero terminal rate makes `a_ω`
/// infinite and `q_ω` NaN, and that NaN flows through to `d_ω`, `L_ω`, `Tₓ`
/// and `eₓ`.
///
/// # Example
/// ```rust
/// # use lifetab::prelude::*;
/// let data = MortalitySchedule::from_rates(vec![0.01, 0.002, 0.001, 0.15])?;
/// let config = LifeTableConfig::builder().data(data).sex(Sex::Female).build()?;
/// let lt = life_table().lt(&config).call()?;
/// println!("e0 = {:.4}", lt.e0());
/// # LifeTabResult::Ok(())
/// ```
#[builder]
pub fn life_table(lt: &LifeTableConfig) -> LifeTabResult<LifeTable> {
    let mx = lt.data.mx().to_vec();
    let age = lt.data.ages().to_vec();
    let omega = lt.data.omega();
    let radix = f64::from(lt.radix);
    let n = mx.len();

    // 1. Separation factors
    let mut ax = vec![0.5; n];
    ax[0] = a0().m0(mx[0]).sex(lt.sex).call();
    ax[omega] = 1.0 / mx[omega];
    if mx[omega] == 0.0 {
        warn!("terminal mortality rate is zero at age {}; open interval is undefined", age[omega]);
    }

    // 2. Probability of death
    let mut qx: Vec<f64> = mx
        .iter()
        .zip(ax.iter())
        .map(|(&m, &a)| m / (1.0 + (1.0 - a) * m))
        .collect();
    qx[omega] = terminal_qx(qx[omega]);

    // 3. Survival probability, undefined intervals are not survived
    let px: Vec<f64> = qx
        .iter()
        .map(|q| {
            let p = 1.0 - q;
            if p.is_nan() { 0.0 } else { p }
        })
        .collect();

    // 4. Survivors
    let mut lx = Vec::with_capacity(n);
    lx.push(radix);
    for i in 1..n {
        lx.push(lx[i - 1] * px[i - 1]);
    }
    if lx[omega] == 0.0 {
        warn!("no survivors reach the open interval at age {}", age[omega]);
    }

    // 5. Deaths
    let dx: Vec<f64> = lx.iter().zip(qx.iter()).map(|(l, q)| l * q).collect();

    // 6. Person-years lived in the interval
    let mut Lx: Vec<f64> = (0..n).map(|i| lx[i] - (1.0 - ax[i]) * dx[i]).collect();
    Lx[omega] = lx[omega] * ax[omega];

    // 7. Person-years remaining, open interval added once
    let mut Tx = reverse_cumsum(&Lx[..omega]);
    Tx.push(0.0);
    for t in Tx.iter_mut() {
        *t += Lx[omega];
    }

    // 8. Life expectancy
    let ex: Vec<f64> = Tx
        .iter()
        .zip(lx.iter())
        .map(|(&t, &l)| if l == 0.0 { f64::NAN } else { t / l })
        .collect();

    debug!(
        "life table built: sex={}, ages 0..={}, e0={:.4}",
        lt.sex, age[omega], ex[0]
    );

    Ok(LifeTable {
        sex: lt.sex,
        radix,
        age,
        mx,
        ax,
        qx,
        lx,
        dx,
        Lx,
        Tx,
        ex,
    })
}

// =======================================
// PRIVATE FUNCTIONS
// =======================================

/// The open interval exhausts the cohort: q_ω = 1 unless the raw value is NaN.
fn terminal_qx(raw: f64) -> f64 {
    if raw.is_nan() { f64::NAN } else { 1.0 }
}

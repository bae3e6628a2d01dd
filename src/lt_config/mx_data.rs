use crate::LifeTabResult;
use crate::params::ScheduleParams;
use bon::bon;
use polars::prelude::*;

/// Age-specific mortality rates `mx` for single years of age `0..=ω`.
///
/// The last entry is the open-ended interval (for example "110+"). A schedule
/// is validated on construction and immutable afterwards:
/// - ages are contiguous integers starting at 0
/// - rates are non-negative and finite, or NaN at the first or last age only
#[derive(Debug, Clone, PartialEq)]
pub struct MortalitySchedule {
    ages: Vec<u32>,
    mx: Vec<f64>,
}

#[bon]
impl MortalitySchedule {
    /// Create a schedule from matching age and rate vectors.
    ///
    /// # Errors
    /// - Empty schedule
    /// - Ages and rates of different lengths
    /// - Ages not contiguous from 0
    /// - Negative or infinite rates, or NaN at an interior age
    ///
    /// # Examples
    /// ```rust
    /// # use lifetab::prelude::*;
    /// let data = MortalitySchedule::new(vec![0, 1, 2], vec![0.005, 0.001, 0.2])?;
    /// assert_eq!(data.omega(), 2);
    /// # LifeTabResult::Ok(())
    /// ```
    pub fn new(ages: Vec<u32>, mx: Vec<f64>) -> LifeTabResult<Self> {
        let params = ScheduleParams {
            ages: ages.clone(),
            mx: mx.clone(),
        };

        params
            .validate_all()
            .map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?;

        Ok(Self { ages, mx })
    }

    /// Create a schedule from rates alone, ages being `0..rates.len()`.
    pub fn from_rates(mx: Vec<f64>) -> LifeTabResult<Self> {
        let ages = (0..mx.len() as u32).collect();
        Self::new(ages, mx)
    }

    /// Create a schedule from death counts and exposures: `mx = Dx / Nx`.
    ///
    /// Zero exposure yields a zero rate.
    ///
    /// # Example
    /// ```rust
    /// # use lifetab::prelude::*;
    /// let data = MortalitySchedule::from_counts()
    ///     .ages(vec![0, 1, 2])
    ///     .deaths(vec![50.0, 10.0, 400.0])
    ///     .exposures(vec![10_000.0, 9_900.0, 2_000.0])
    ///     .call()?;
    /// assert!((data.mx()[2] - 0.2).abs() < 1e-12);
    /// # LifeTabResult::Ok(())
    /// ```
    #[builder]
    pub fn from_counts(ages: Vec<u32>, deaths: Vec<f64>, exposures: Vec<f64>) -> LifeTabResult<Self> {
        if deaths.len() != exposures.len() {
            return Err(format!(
                "deaths ({}) and exposures ({}) must have the same length",
                deaths.len(),
                exposures.len()
            )
            .into());
        }

        let mx = deaths
            .iter()
            .zip(exposures.iter())
            .map(|(&d, &n)| if n == 0.0 { 0.0 } else { d / n })
            .collect();

        Self::new(ages, mx)
    }

    /// Create a schedule from a DataFrame with columns `age` and `mx`.
    ///
    /// Rows are sorted by age. `age` may be numeric or a label such as
    /// `"110+"`; null rates become NaN.
    ///
    /// # Examples
    /// ```rust
    /// # use lifetab::prelude::*;
    /// use polars::prelude::*;
    ///
    /// let df = df! {
    ///     "age" => ["1", "0", "2+"],
    ///     "mx" => [0.002, 0.01, 0.15]
    /// }?;
    ///
    /// let data = MortalitySchedule::from_df(df)?;
    /// assert_eq!(data.ages(), &[0, 1, 2]);
    /// # LifeTabResult::Ok(())
    /// ```
    pub fn from_df(df: DataFrame) -> LifeTabResult<Self> {
        if df.height() == 0 {
            return Err("DataFrame must contain at least one row of data".into());
        }

        let ages = age_column_to_vec(df.column("age")?)?;
        let mx = rate_column_to_vec(df.column("mx")?)?;

        let mut rows: Vec<(u32, f64)> = ages.into_iter().zip(mx).collect();
        rows.sort_by_key(|(age, _)| *age);
        let (ages, mx): (Vec<u32>, Vec<f64>) = rows.into_iter().unzip();

        Self::new(ages, mx)
    }

    pub fn ages(&self) -> &[u32] {
        &self.ages
    }

    pub fn mx(&self) -> &[f64] {
        &self.mx
    }

    pub fn len(&self) -> usize {
        self.mx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mx.is_empty()
    }

    /// Index of the open-ended terminal age group.
    pub fn omega(&self) -> usize {
        self.mx.len() - 1
    }

    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("age".into(), self.ages.clone()).into_column(),
            Series::new("mx".into(), self.mx.clone()).into_column(),
        ])
    }
}

// ================================================
// PRIVATE FUNCTIONS
// ================================================

/// Read an age column that is either numeric or holds labels like "110+".
pub(crate) fn age_column_to_vec(column: &Column) -> LifeTabResult<Vec<u32>> {
    if column.dtype() == &DataType::String {
        column
            .str()?
            .into_iter()
            .map(|opt| match opt {
                Some(label) => crate::helpers::parse_age_label(label),
                None => Err("Age column must not contain nulls".into()),
            })
            .collect()
    } else {
        let casted = column.cast(&DataType::UInt32)?;
        casted
            .u32()?
            .into_iter()
            .map(|opt| opt.ok_or_else(|| "Age column must not contain nulls".into()))
            .collect()
    }
}

/// Read a numeric column as f64, nulls mapped to NaN.
pub(crate) fn rate_column_to_vec(column: &Column) -> LifeTabResult<Vec<f64>> {
    let casted = column.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|opt| opt.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

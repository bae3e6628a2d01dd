//! # Grouped Pipelines
//!
//! Runs the life table and smoothing pipelines over many
//! population × sex × period groups held in one long DataFrame.
//!
//! Every pipeline has the same shape: split the frame into groups keyed by
//! [`GroupKey`], apply a pure per-group function in parallel, and collect
//! into a `BTreeMap` so results come back in a stable order. The `*_frame`
//! functions flatten a result map back into a DataFrame with the key columns
//! `population`, `sex`, `period` in front.
//!
//! ## Input columns
//! - Life tables: `population`, `sex`, `period`, `age`, `mx`
//! - Smoothing: `population`, `sex`, `period`, `age`, `deaths`, `exposures`
//!
//! `sex` uses the labels accepted by [`Sex`]'s `FromStr` (`f`, `male`, `total`, …).
//! `age` may be numeric or a label such as `"110+"`.
//!
//! ## Usage Example
//! ```rust
//! # use lifetab::prelude::*;
//! use polars::prelude::*;
//!
//! let df = df! {
//!     "population" => ["SWE", "SWE", "SWE", "SWE", "SWE", "SWE"],
//!     "sex" => ["f", "f", "f", "m", "m", "m"],
//!     "period" => [2000, 2000, 2000, 2000, 2000, 2000],
//!     "age" => ["0", "1", "2+", "0", "1", "2+"],
//!     "mx" => [0.004, 0.001, 0.3, 0.005, 0.002, 0.4],
//! }?;
//!
//! let schedules = group_schedules(&df)?;
//! let tables = life_tables().schedules(&schedules).call()?;
//! let summaries = inequality_by_group(&tables);
//! let disparities = sex_disparity_by_group(&tables)?;
//!
//! let out = inequality_frame(&summaries)?;
//! assert_eq!(out.height(), 2);
//! assert_eq!(disparity_frame(&disparities)?.height(), 1);
//! # LifeTabResult::Ok(())
//! ```

use crate::LifeTabResult;
use crate::life_table::disparity::{SexDisparityRecord, sex_disparity};
use crate::life_table::inequality::{InequalitySummary, inequality_summary};
use crate::life_table::table::{LifeTable, life_table};
use crate::lt_config::mx_data::{MortalitySchedule, age_column_to_vec, rate_column_to_vec};
use crate::lt_config::{LifeTableConfig, Sex};
use crate::smoothing::hazard::{smooth_counts, survival_curve};
use crate::smoothing::survivorship::{MAX_PERCENTILE, SurvivorshipAges, survivorship_ages};
use crate::smoothing::{CountSeries, SmoothingConfig};
use bon::builder;
use log::debug;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

// ===============================================
// KEYS
// ===============================================

/// Identifies one population × sex × period group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub population: String,
    pub sex: Sex,
    pub period: i32,
}

impl GroupKey {
    pub fn new(population: impl Into<String>, sex: Sex, period: i32) -> Self {
        Self {
            population: population.into(),
            sex,
            period,
        }
    }

    /// The same population and period with a different sex.
    pub fn with_sex(&self, sex: Sex) -> Self {
        Self {
            population: self.population.clone(),
            sex,
            period: self.period,
        }
    }

    /// Key of the sex-disparity join.
    pub fn population_period(&self) -> PopulationPeriod {
        PopulationPeriod {
            population: self.population.clone(),
            period: self.period,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.population, self.sex, self.period)
    }
}

/// Identifies one population × period pair, the grain of sex disparity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopulationPeriod {
    pub population: String,
    pub period: i32,
}

// ===============================================
// SPLITTING
// ===============================================

/// Split a long `population, sex, period, age, mx` frame into one schedule per group.
///
/// Rows within a group may come in any order.
///
/// # Errors
/// - A required column is missing
/// - Null keys or unrecognised sex labels
/// - A group whose schedule fails validation (see [`MortalitySchedule::new`])
pub fn group_schedules(df: &DataFrame) -> LifeTabResult<BTreeMap<GroupKey, MortalitySchedule>> {
    let keys = key_rows(df)?;
    let ages = age_column_to_vec(df.column("age")?)?;
    let mx = rate_column_to_vec(df.column("mx")?)?;

    let mut rows: BTreeMap<GroupKey, Vec<(u32, f64)>> = BTreeMap::new();
    for ((key, age), m) in keys.into_iter().zip(ages).zip(mx) {
        rows.entry(key).or_default().push((age, m));
    }

    let mut schedules = BTreeMap::new();
    for (key, mut group) in rows {
        group.sort_by_key(|(age, _)| *age);
        let (ages, mx): (Vec<u32>, Vec<f64>) = group.into_iter().unzip();
        let schedule =
            MortalitySchedule::new(ages, mx).map_err(|err| format!("group {key}: {err}"))?;
        schedules.insert(key, schedule);
    }

    debug!("split frame of {} rows into {} schedules", df.height(), schedules.len());
    Ok(schedules)
}

/// Split a long `population, sex, period, age, deaths, exposures` frame into one count series per group.
pub fn group_counts(df: &DataFrame) -> LifeTabResult<BTreeMap<GroupKey, CountSeries>> {
    let keys = key_rows(df)?;
    let ages: Vec<f64> = age_column_to_vec(df.column("age")?)?
        .into_iter()
        .map(f64::from)
        .collect();
    let deaths = rate_column_to_vec(df.column("deaths")?)?;
    let exposures = rate_column_to_vec(df.column("exposures")?)?;

    let mut rows: BTreeMap<GroupKey, (Vec<f64>, Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (((key, age), d), n) in keys.into_iter().zip(ages).zip(deaths).zip(exposures) {
        let entry = rows.entry(key).or_default();
        entry.0.push(age);
        entry.1.push(d);
        entry.2.push(n);
    }

    let mut series = BTreeMap::new();
    for (key, (ages, deaths, exposures)) in rows {
        let counts =
            CountSeries::new(ages, deaths, exposures).map_err(|err| format!("group {key}: {err}"))?;
        series.insert(key, counts);
    }

    debug!("split frame of {} rows into {} count series", df.height(), series.len());
    Ok(series)
}

// ===============================================
// PER-GROUP PIPELINES
// ===============================================

/// Build a life table for every group in parallel.
///
/// Each group's sex selects its infant separation factor.
#[builder]
pub fn life_tables(
    schedules: &BTreeMap<GroupKey, MortalitySchedule>,
    #[builder(default = 1)] radix: u32,
) -> LifeTabResult<BTreeMap<GroupKey, LifeTable>> {
    let tables = schedules
        .par_iter()
        .map(|(key, schedule)| {
            build_table(key, schedule, radix)
                .map(|lt| (key.clone(), lt))
                .map_err(|err| format!("group {key}: {err}"))
        })
        .collect::<Result<BTreeMap<_, _>, String>>()?;

    debug!("built {} life tables", tables.len());
    Ok(tables)
}

fn build_table(key: &GroupKey, schedule: &MortalitySchedule, radix: u32) -> LifeTabResult<LifeTable> {
    let config = LifeTableConfig::builder()
        .data(schedule.clone())
        .sex(key.sex)
        .radix(radix)
        .build()?;
    life_table().lt(&config).call()
}

/// Inequality measures for every life table.
pub fn inequality_by_group(
    tables: &BTreeMap<GroupKey, LifeTable>,
) -> BTreeMap<GroupKey, InequalitySummary> {
    tables
        .par_iter()
        .map(|(key, lt)| (key.clone(), inequality_summary().lt(lt).call()))
        .collect()
}

/// Sex disparity for every population and period that has both a female and a male table.
///
/// Groups without a partner of the opposite sex, and `Total` groups, are skipped.
pub fn sex_disparity_by_group(
    tables: &BTreeMap<GroupKey, LifeTable>,
) -> LifeTabResult<BTreeMap<PopulationPeriod, SexDisparityRecord>> {
    let pairs: Vec<(PopulationPeriod, &LifeTable, &LifeTable)> = tables
        .iter()
        .filter(|(key, _)| key.sex == Sex::Female)
        .filter_map(|(key, female)| match tables.get(&key.with_sex(Sex::Male)) {
            Some(male) => Some((key.population_period(), female, male)),
            None => {
                debug!("no male table to pair with {key}");
                None
            }
        })
        .collect();

    let records = pairs
        .par_iter()
        .map(|(pp, female, male)| {
            sex_disparity()
                .female(*female)
                .male(*male)
                .call()
                .map(|record| (pp.clone(), record))
                .map_err(|err| format!("{}/{}: {err}", pp.population, pp.period))
        })
        .collect::<Result<BTreeMap<_, _>, String>>()?;

    Ok(records)
}

/// Smoothing, survival and survivorship-age stages for every group in parallel.
#[builder]
pub fn survivorship_by_group(
    counts: &BTreeMap<GroupKey, CountSeries>,
    config: &SmoothingConfig,
) -> LifeTabResult<BTreeMap<GroupKey, SurvivorshipAges>> {
    let ages = counts
        .par_iter()
        .map(|(key, series)| {
            survivorship_for(series, config)
                .map(|s_ages| (key.clone(), s_ages))
                .map_err(|err| format!("group {key}: {err}"))
        })
        .collect::<Result<BTreeMap<_, _>, String>>()?;

    debug!("computed survivorship ages for {} groups", ages.len());
    Ok(ages)
}

fn survivorship_for(series: &CountSeries, config: &SmoothingConfig) -> LifeTabResult<SurvivorshipAges> {
    let smoothed = smooth_counts().counts(series).config(config).call()?;
    let survival = survival_curve().smoothed(&smoothed).call()?;
    Ok(survivorship_ages().survival(&survival).call())
}

// ===============================================
// FLATTENING
// ===============================================

/// Stack all life tables into one frame, one row per group and age.
pub fn life_table_frame(tables: &BTreeMap<GroupKey, LifeTable>) -> LifeTabResult<DataFrame> {
    let mut stacked: Option<DataFrame> = None;
    for (key, lt) in tables {
        let body = lt.to_df()?;
        let keys = vec![key; body.height()];
        let mut columns = key_columns(&keys);
        columns.extend(body.take_columns());
        let frame = DataFrame::new(columns)?;

        match stacked.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&frame)?;
            }
            None => stacked = Some(frame),
        }
    }
    Ok(stacked.unwrap_or_else(DataFrame::empty))
}

/// One row per group with columns `H`, `v`, `G`, `sd`, `e0`.
pub fn inequality_frame(summaries: &BTreeMap<GroupKey, InequalitySummary>) -> PolarsResult<DataFrame> {
    let keys: Vec<&GroupKey> = summaries.keys().collect();
    let values: Vec<&InequalitySummary> = summaries.values().collect();

    let mut columns = key_columns(&keys);
    columns.extend([
        measure_column("H", &values, |s| s.H),
        measure_column("v", &values, |s| s.v),
        measure_column("G", &values, |s| s.G),
        measure_column("sd", &values, |s| s.sd),
        measure_column("e0", &values, |s| s.e0),
    ]);
    DataFrame::new(columns)
}

/// One row per population and period with `phi` and the per-sex e0 and sd.
pub fn disparity_frame(
    records: &BTreeMap<PopulationPeriod, SexDisparityRecord>,
) -> PolarsResult<DataFrame> {
    let population: Vec<&str> = records.keys().map(|k| k.population.as_str()).collect();
    let period: Vec<i32> = records.keys().map(|k| k.period).collect();
    let values: Vec<&SexDisparityRecord> = records.values().collect();

    DataFrame::new(vec![
        Series::new("population".into(), population).into_column(),
        Series::new("period".into(), period).into_column(),
        measure_column("phi", &values, |r| r.phi),
        measure_column("e0_female", &values, |r| r.e0_female),
        measure_column("e0_male", &values, |r| r.e0_male),
        measure_column("sd_female", &values, |r| r.sd_female),
        measure_column("sd_male", &values, |r| r.sd_male),
    ])
}

/// One row per group with columns `s0` … `s100`.
pub fn survivorship_frame(ages: &BTreeMap<GroupKey, SurvivorshipAges>) -> PolarsResult<DataFrame> {
    let keys: Vec<&GroupKey> = ages.keys().collect();
    let values: Vec<&SurvivorshipAges> = ages.values().collect();

    let mut columns = key_columns(&keys);
    for p in 0..=MAX_PERCENTILE {
        let column: Vec<f64> = values.iter().map(|s| s.s(p)).collect();
        columns.push(Series::new(format!("s{p}").into(), column).into_column());
    }
    DataFrame::new(columns)
}

// ================================================
// PRIVATE FUNCTIONS
// ================================================

/// Parse the `population`, `sex` and `period` columns row by row.
fn key_rows(df: &DataFrame) -> LifeTabResult<Vec<GroupKey>> {
    let population = df.column("population")?.cast(&DataType::String)?;
    let sex = df.column("sex")?.cast(&DataType::String)?;
    let period = df.column("period")?.cast(&DataType::Int32)?;

    population
        .str()?
        .into_iter()
        .zip(sex.str()?)
        .zip(period.i32()?)
        .enumerate()
        .map(|(row, ((population, sex), period))| match (population, sex, period) {
            (Some(population), Some(sex), Some(period)) => {
                Ok(GroupKey::new(population, sex.parse::<Sex>()?, period))
            }
            _ => Err(format!("row {row}: population, sex and period must not be null").into()),
        })
        .collect()
}

fn key_columns(keys: &[&GroupKey]) -> Vec<Column> {
    let population: Vec<&str> = keys.iter().map(|k| k.population.as_str()).collect();
    let sex: Vec<&str> = keys.iter().map(|k| k.sex.label()).collect();
    let period: Vec<i32> = keys.iter().map(|k| k.period).collect();
    vec![
        Series::new("population".into(), population).into_column(),
        Series::new("sex".into(), sex).into_column(),
        Series::new("period".into(), period).into_column(),
    ]
}

fn measure_column<T>(name: &str, values: &[&T], get: impl Fn(&T) -> f64) -> Column {
    let column: Vec<f64> = values.iter().map(|v| get(*v)).collect();
    Series::new(name.into(), column).into_column()
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_frame() -> DataFrame {
        df! {
            "population" => ["A", "A", "A", "A", "A", "A", "B", "B", "B"],
            "sex" => ["f", "f", "f", "m", "m", "m", "f", "f", "f"],
            "period" => [2000, 2000, 2000, 2000, 2000, 2000, 2010, 2010, 2010],
            "age" => ["1", "0", "2+", "0", "1", "2+", "0", "1", "2+"],
            "mx" => [0.002, 0.01, 0.15, 0.012, 0.003, 0.2, 0.008, 0.001, 0.1],
        }
        .expect("Failed to create test DataFrame")
    }

    #[test]
    fn test_group_schedules_splits_and_sorts() {
        let schedules = group_schedules(&sample_frame()).unwrap();
        assert_eq!(schedules.len(), 3);

        let key = GroupKey::new("A", Sex::Female, 2000);
        let schedule = &schedules[&key];
        assert_eq!(schedule.ages(), &[0, 1, 2]);
        assert_eq!(schedule.mx(), &[0.01, 0.002, 0.15]);

        // BTreeMap order: population, then sex, then period
        let order: Vec<String> = schedules.keys().map(|k| k.to_string()).collect();
        assert_eq!(order, vec!["A/Female/2000", "A/Male/2000", "B/Female/2010"]);
    }

    #[test]
    fn test_group_schedules_errors() {
        let bad_sex = df! {
            "population" => ["A"],
            "sex" => ["x"],
            "period" => [2000],
            "age" => [0],
            "mx" => [0.1],
        }
        .unwrap();
        assert!(group_schedules(&bad_sex).is_err());

        let missing_mx = df! {
            "population" => ["A"],
            "sex" => ["f"],
            "period" => [2000],
            "age" => [0],
        }
        .unwrap();
        assert!(group_schedules(&missing_mx).is_err());
    }

    #[test]
    fn test_grouped_tables_match_direct_construction() {
        let schedules = group_schedules(&sample_frame()).unwrap();
        let tables = life_tables().schedules(&schedules).radix(100_000).call().unwrap();

        let key = GroupKey::new("A", Sex::Female, 2000);
        let config = LifeTableConfig::builder()
            .data(schedules[&key].clone())
            .sex(Sex::Female)
            .radix(100_000)
            .build()
            .unwrap();
        let direct = life_table().lt(&config).call().unwrap();
        assert_eq!(tables[&key], direct);
    }

    #[test]
    fn test_disparity_pairs_only_complete_groups() {
        let schedules = group_schedules(&sample_frame()).unwrap();
        let tables = life_tables().schedules(&schedules).call().unwrap();
        let records = sex_disparity_by_group(&tables).unwrap();

        // Population B has no male table
        assert_eq!(records.len(), 1);
        let record = records.values().next().unwrap();
        let female = &tables[&GroupKey::new("A", Sex::Female, 2000)];
        assert_abs_diff_eq!(record.e0_female, female.e0(), epsilon = 1e-12);
        // Males have higher mortality at every age, so females die first less often
        assert!(record.phi < 0.5);
    }

    #[test]
    fn test_frames() {
        let schedules = group_schedules(&sample_frame()).unwrap();
        let tables = life_tables().schedules(&schedules).call().unwrap();

        let lt_df = life_table_frame(&tables).unwrap();
        assert_eq!(lt_df.height(), 9);
        let names: Vec<&str> = lt_df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names[..4], ["population", "sex", "period", "age"]);

        let ineq = inequality_frame(&inequality_by_group(&tables)).unwrap();
        assert_eq!(ineq.shape(), (3, 8));

        let disp = disparity_frame(&sex_disparity_by_group(&tables).unwrap()).unwrap();
        assert_eq!(disp.shape(), (1, 7));
    }

    #[test]
    fn test_survivorship_by_group() {
        let n = 41;
        let population = vec!["A"; 2 * n];
        let sex: Vec<&str> = (0..2 * n).map(|i| if i < n { "f" } else { "m" }).collect();
        let period = vec![2000; 2 * n];
        let age: Vec<u32> = (0..2 * n as u32).map(|i| i % n as u32).collect();
        let deaths: Vec<f64> = (0..2 * n).map(|i| if i < n { 50.0 } else { 100.0 }).collect();
        let exposures = vec![1000.0; 2 * n];

        let df = df! {
            "population" => population,
            "sex" => sex,
            "period" => period,
            "age" => age,
            "deaths" => deaths,
            "exposures" => exposures,
        }
        .unwrap();

        let counts = group_counts(&df).unwrap();
        let config = SmoothingConfig::builder().end_age(40.0).build().unwrap();
        let ages = survivorship_by_group().counts(&counts).config(&config).call().unwrap();

        let female = &ages[&GroupKey::new("A", Sex::Female, 2000)];
        let male = &ages[&GroupKey::new("A", Sex::Male, 2000)];
        assert_abs_diff_eq!(female.s(50), 2f64.ln() / 0.05, epsilon = 0.011);
        assert_abs_diff_eq!(male.s(50), 2f64.ln() / 0.1, epsilon = 0.011);

        let frame = survivorship_frame(&ages).unwrap();
        assert_eq!(frame.shape(), (2, 3 + 101));
    }
}

//! # Integration Tests for lifetab Prelude
//!
//! This integration test verifies that the prelude module properly re-exports
//! all commonly used types and functions from the lifetab crate, ensuring that
//! users can import everything they need with a single `use` statement.

use approx::assert_abs_diff_eq;
use lifetab::prelude::*;
use polars::df;

fn gompertz(scale: f64) -> Vec<f64> {
    (0..=110).map(|x| scale * 0.00005 * 1.095f64.powi(x)).collect()
}

fn table(mx: Vec<f64>, sex: Sex, radix: u32) -> LifeTable {
    let config = LifeTableConfig::builder()
        .data(MortalitySchedule::from_rates(mx).expect("valid schedule"))
        .sex(sex)
        .radix(radix)
        .build()
        .expect("valid config");
    life_table().lt(&config).call().expect("life table")
}

#[test]
fn test_prelude_imports_basic_types() {
    let sex: Sex = "females".parse().expect("known label");
    assert_eq!(sex, Sex::Female);

    let _config_type_name = std::any::type_name::<LifeTableConfig>();
    let _curve_type_name = std::any::type_name::<SurvivalCurve>();
    assert!(_config_type_name.contains("LifeTableConfig"));
    assert!(_curve_type_name.contains("SurvivalCurve"));
}

#[test]
fn test_prelude_imports_polars_types() {
    let _df_type_name = std::any::type_name::<DataFrame>();
    let _series_type_name = std::any::type_name::<Series>();
    let _result_type_name = std::any::type_name::<PolarsResult<f64>>();

    assert!(_df_type_name.contains("DataFrame"));
    assert!(_series_type_name.contains("Series"));
    assert!(_result_type_name.contains("PolarsError"));
}

#[test]
fn test_prelude_function_accessibility() {
    let _life_table_fn = life_table;
    let _a0_fn = a0;
    let _h_fn = H;
    let _v_fn = v;
    let _g_fn = G;
    let _sd_fn = sd;
    let _phi_fn = phi;
    let _smooth_fn = smooth_counts;
    let _survival_fn = survival_curve;
    let _ages_fn = survivorship_ages;
}

#[test]
fn test_life_table_from_dataframe() {
    let df = df! {
        "age" => ["0", "1", "2", "3+"],
        "mx" => [0.01, 0.002, 0.001, 0.15],
    }
    .expect("Failed to create DataFrame");

    let data = MortalitySchedule::from_df(df).expect("Failed to create schedule");
    let config = LifeTableConfig::builder()
        .data(data)
        .sex(Sex::Female)
        .build()
        .unwrap();
    let lt = life_table().lt(&config).call().unwrap();

    assert_abs_diff_eq!(lt.e0(), 9.5488757065858, epsilon = 1e-10);
    assert_abs_diff_eq!(lt.ex()[3], 1.0 / 0.15, epsilon = 1e-12);

    let out = lt.to_df().unwrap();
    assert_eq!(out.height(), 4);
    assert!(out.column("Tx").is_ok());
}

#[test]
fn test_measures_through_prelude() {
    let lt = table(gompertz(1.0), Sex::Female, 100_000);
    let summary = inequality_summary().lt(&lt).call();

    assert_abs_diff_eq!(summary.H, H().lt(&lt).call(), epsilon = 1e-15);
    assert_abs_diff_eq!(summary.v, v().lt(&lt).call(), epsilon = 1e-15);
    assert_abs_diff_eq!(summary.G, G().lt(&lt).call(), epsilon = 1e-15);
    assert!(summary.G > 0.0);
    assert!(summary.sd > 0.0);
    assert_abs_diff_eq!(summary.e0, lt.e0(), epsilon = 1e-15);
}

#[test]
fn test_higher_mortality_lowers_e0_and_phi() {
    let female = table(gompertz(1.0), Sex::Female, 100_000);
    let male = table(gompertz(1.4), Sex::Male, 100_000);

    let record = sex_disparity().female(&female).male(&male).call().unwrap();
    assert!(record.e0_female > record.e0_male);
    assert!(record.phi < 0.5);

    let swapped = phi().female(&male).male(&female).call().unwrap();
    assert_abs_diff_eq!(record.phi + swapped, 1.0, epsilon = 1e-9);
}

#[test]
fn test_smoothing_pipeline_through_prelude() {
    let ages: Vec<f64> = (0..=60).map(f64::from).collect();
    let exposures = vec![5_000.0; ages.len()];
    let deaths = vec![100.0; ages.len()];

    let counts = CountSeries::new(ages, deaths, exposures).unwrap();
    let config = SmoothingConfig::builder().end_age(60.0).build().unwrap();

    let smoothed = smooth_counts().counts(&counts).config(&config).call().unwrap();
    let survival = survival_curve().smoothed(&smoothed).call().unwrap();
    let s_ages = survivorship_ages().survival(&survival).call();

    assert_abs_diff_eq!(s_ages.s(50), 2f64.ln() / 0.02, epsilon = 0.011);
    assert_eq!(s_ages.s(100), 0.0);
    assert!(s_ages.s(1).is_nan());
}

//! # lifetab Basic Usage Example
//!
//! This example demonstrates the basic usage of the lifetab crate:
//! life tables, lifespan inequality, sex disparity and survivorship ages.
//!
//! Run with `RUST_LOG=debug` to see the library's log output.

use lifetab::prelude::*;
use polars::prelude::*;

fn gompertz_makeham(scale: f64) -> Vec<f64> {
    (0..=110)
        .map(|x| scale * (0.0002 + 0.00003 * 1.1f64.powi(x)))
        .collect()
}

fn main() -> LifeTabResult<()> {
    env_logger::init();

    println!("lifetab Basic Usage Example");
    println!("===========================");
    println!();

    // Method 1: schedule from a plain vector of rates
    println!("Building female and male schedules...");
    let female = LifeTableConfig::builder()
        .data(MortalitySchedule::from_rates(gompertz_makeham(1.0))?)
        .sex(Sex::Female)
        .radix(100_000)
        .build()?;

    // Method 2: schedule from a DataFrame with an open-ended age label
    let male_mx = gompertz_makeham(1.3);
    let labels: Vec<String> = (0..male_mx.len())
        .map(|x| if x == male_mx.len() - 1 { format!("{x}+") } else { x.to_string() })
        .collect();
    let df = df! {
        "age" => labels,
        "mx" => male_mx,
    }?;
    let male = LifeTableConfig::builder()
        .data(MortalitySchedule::from_df(df)?)
        .sex(Sex::Male)
        .radix(100_000)
        .build()?;

    let lt_f = life_table().lt(&female).call()?;
    let lt_m = life_table().lt(&male).call()?;

    println!("\n=== Life Tables (radix 100,000) ===");
    for age in [0usize, 1, 30, 65, 90] {
        println!(
            "  age {age:>3}: female lx {:>10.1} ex {:>6.2} | male lx {:>10.1} ex {:>6.2}",
            lt_f.lx()[age],
            lt_f.ex()[age],
            lt_m.lx()[age],
            lt_m.ex()[age]
        );
    }

    println!("\n=== Lifespan Inequality ===");
    for (label, lt) in [("Female", &lt_f), ("Male", &lt_m)] {
        let summary = inequality_summary().lt(lt).call();
        println!(
            "  {label:<6}: e0 {:.3}  H {:.4}  v {:.4}  G {:.4}  sd {:.3}",
            summary.e0, summary.H, summary.v, summary.G, summary.sd
        );
    }

    println!("\n=== Sex Disparity ===");
    let record = sex_disparity().female(&lt_f).male(&lt_m).call()?;
    println!("  phi (female dies first): {:.4}", record.phi);
    println!("  e0 gap: {:.3} years", record.e0_female - record.e0_male);

    println!("\n=== Survivorship Ages from Raw Counts ===");
    let ages: Vec<f64> = (0..=110).map(f64::from).collect();
    let exposures: Vec<f64> = ages.iter().map(|x| 100_000.0 * (-0.02 * x).exp()).collect();
    let deaths: Vec<f64> = ages
        .iter()
        .zip(exposures.iter())
        .map(|(x, n)| n * 0.0001 * (0.09 * x).exp())
        .collect();
    let counts = CountSeries::new(ages, deaths, exposures)?;
    let config = SmoothingConfig::builder().s_dx(500.0).s_nx(500.0).build()?;

    let smoothed = smooth_counts().counts(&counts).config(&config).call()?;
    let survival = survival_curve().smoothed(&smoothed).call()?;
    let s_ages = survivorship_ages().survival(&survival).call();
    for p in [90, 75, 50, 25, 10] {
        println!("  s{p}: {:.2}", s_ages.s(p));
    }

    println!("\n✓ Example completed");
    Ok(())
}

/// Macro to create a MortalitySchedule from `age` and `mx` column literals.
///
/// Ages may be integers or labels such as `"2+"`; rows are sorted by age.
///
/// Usage:
/// ```rust
/// # use lifetab::prelude::*;
/// let data = mxdf! {
///     "age" => [0_u32, 1, 2],
///     "mx" => [0.005_f64, 0.001, 0.25],
/// }?;
/// assert_eq!(data.omega(), 2);
/// # LifeTabResult::Ok(())
/// ```
#[macro_export]
macro_rules! mxdf {
    ($($name:expr => $val:expr),+ $(,)?) => {{
        use $crate::lt_config::mx_data::MortalitySchedule;
        use polars::prelude::df;
        let df_result = df! { $($name => $val),+ };
        match df_result {
            Ok(df) => MortalitySchedule::from_df(df),
            Err(e) => Err(e.into()),
        }
    }};
}

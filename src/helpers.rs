use crate::LifeTabResult;

// ================================================
// PUBLIC FUNCTIONS
// ================================================

/// Sum that skips NaN terms (`numpy.nansum` semantics). An all-NaN input sums to 0.
pub fn nansum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().filter(|v| !v.is_nan()).sum()
}

/// Reverse cumulative sum: `out[i] = Σ_{j≥i} values[j]`.
pub fn reverse_cumsum(values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut acc = 0.0;
    for (i, v) in values.iter().enumerate().rev() {
        acc += v;
        out[i] = acc;
    }
    out
}

/// Cumulative trapezoidal integral of `y` over `x`, starting at 0.
///
/// ```text
/// I₀ = 0
/// Iᵢ = Iᵢ₋₁ + (xᵢ - xᵢ₋₁) · (yᵢ + yᵢ₋₁) / 2
/// ```
pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> LifeTabResult<Vec<f64>> {
    if y.len() != x.len() {
        return Err(format!(
            "cumulative_trapezoid: y has {} points but x has {}",
            y.len(),
            x.len()
        )
        .into());
    }

    let mut out = Vec::with_capacity(y.len());
    let mut acc = 0.0;
    for i in 0..y.len() {
        if i > 0 {
            acc += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
        }
        out.push(acc);
    }
    Ok(out)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Parse an age label into its integer lower bound.
///
/// The leading run of digits is the age: `"110+"` becomes 110 and the
/// range `"1-4"` becomes 1.
pub fn parse_age_label(label: &str) -> LifeTabResult<u32> {
    let trimmed = label.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..end];
    if digits.is_empty() {
        return Err(format!("Age label '{label}' does not start with an age").into());
    }
    digits
        .parse::<u32>()
        .map_err(|e| format!("Age label '{label}' is not a valid age: {e}").into())
}

//! Guarded ratio arithmetic shared by every analysis.
//!
//! Division by zero is never a fault here: it yields `None`, which the
//! artifact serialises as `null`.

/// `numerator / denominator`, `None` on a zero or non-finite denominator.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Return on investment, `(return - cost) / cost`.
pub fn roi(estimated_return: f64, cost: f64) -> Option<f64> {
    ratio(estimated_return - cost, cost)
}

/// Return on ad spend, `return / cost`.
pub fn roas(estimated_return: f64, cost: f64) -> Option<f64> {
    ratio(estimated_return, cost)
}

/// `successes / attempts`, `None` when there were no attempts.
pub fn conversion_rate(successes: f64, attempts: f64) -> Option<f64> {
    ratio(successes, attempts)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    ratio(values.iter().sum(), values.len() as f64)
}

/// Mean of the defined values only.
pub fn mean_defined(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.into_iter().flatten().collect();
    mean(&defined)
}

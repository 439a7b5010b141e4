use crate::score::clamp_score;

/// Causal exponential moving average with decay `alpha` in `(0, 1]`.
///
/// Each step is re-clamped so accumulated rounding never leaves `[0, 100]`.
pub fn ema(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;

    for &value in values {
        let current = clamp_score(value);
        let next = match previous {
            None => current,
            Some(prev) => clamp_score(alpha * current + (1.0 - alpha) * prev),
        };
        smoothed.push(next);
        previous = Some(next);
    }

    smoothed
}

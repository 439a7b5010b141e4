pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Bounds a score to `[0, 100]`. NaN counts as zero.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

use std::str::FromStr;

use crate::score::clamp_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapStrategy {
    Linear,
    Carry,
}

impl GapStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            GapStrategy::Linear => "linear",
            GapStrategy::Carry => "carry",
        }
    }
}

impl FromStr for GapStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "linear" => Ok(GapStrategy::Linear),
            "carry" => Ok(GapStrategy::Carry),
            other => Err(other.to_string()),
        }
    }
}

/// Resolves every run of missing buckets from its neighbours.
///
/// With both neighbours known, `Linear` interpolates and `Carry` repeats the
/// preceding value even when the following one is closer. With one neighbour
/// the run takes that neighbour's value; with none it becomes `0.0`.
pub fn fill_gaps(series: &[Option<f64>], strategy: GapStrategy) -> Vec<f64> {
    let mut filled = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    let mut i = 0;

    while i < series.len() {
        if let Some(value) = series[i] {
            let value = clamp_score(value);
            filled.push(value);
            prev = Some(value);
            i += 1;
            continue;
        }

        let run_start = i;
        while i < series.len() && series[i].is_none() {
            i += 1;
        }
        let gap = i - run_start;
        let next = series.get(i).copied().flatten().map(clamp_score);

        match (prev, next, strategy) {
            (Some(before), Some(after), GapStrategy::Linear) => {
                let step = (after - before) / (gap + 1) as f64;
                filled.extend((1..=gap).map(|offset| clamp_score(before + step * offset as f64)));
            }
            (Some(before), _, _) => filled.extend(std::iter::repeat(before).take(gap)),
            (None, Some(after), _) => filled.extend(std::iter::repeat(after).take(gap)),
            (None, None, _) => filled.extend(std::iter::repeat(0.0).take(gap)),
        }
    }

    filled
}

//! Nan-aware reductions
//!
//! Every reduction skips non-finite values. A sample with no finite values
//! reduces to `NaN`.

/// Finite values of a sample, sorted ascending
pub fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(f64::total_cmp);
    finite
}

pub fn nan_sum(values: &[f64]) -> f64 {
    let finite = finite_sorted(values);
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().sum()
}

pub fn nan_mean(values: &[f64]) -> f64 {
    let finite = finite_sorted(values);
    mean_of(&finite)
}

/// Population standard deviation (zero degrees of freedom)
pub fn nan_std(values: &[f64]) -> f64 {
    let finite = finite_sorted(values);
    let mean = mean_of(&finite);
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / finite.len() as f64;
    variance.sqrt()
}

pub fn nan_min(values: &[f64]) -> f64 {
    finite_sorted(values).first().copied().unwrap_or(f64::NAN)
}

pub fn nan_max(values: &[f64]) -> f64 {
    finite_sorted(values).last().copied().unwrap_or(f64::NAN)
}

/// Quantile `q` in `[0, 1]`, linearly interpolated between closest ranks
pub fn nan_quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&finite_sorted(values), q)
}

pub fn nan_median(values: &[f64]) -> f64 {
    nan_quantile(values, 0.5)
}

/// Quantile of an already sorted, finite sample
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn mean_of(finite: &[f64]) -> f64 {
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

/// The seven-number description used by every summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Describe {
    /// Describe a sample; an empty sample is described as the single value 0
    pub fn of(values: &[f64]) -> Self {
        let zero = [0.0];
        let values = if values.is_empty() { &zero[..] } else { values };
        let sorted = finite_sorted(values);
        let mean = mean_of(&sorted);
        Self {
            mean,
            std: nan_std(&sorted),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    pub fn to_vec(self) -> Vec<f64> {
        vec![
            self.mean,
            self.std,
            self.min,
            self.q1,
            self.median,
            self.q3,
            self.max,
        ]
    }
}

//! Statistical helpers for the analytics calculations

/// Summary statistics over a sample
///
/// Variance and standard deviation are population statistics (divided by
/// `n`, not `n - 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Distribution {
    /// Calculate distribution from a dataset; `None` for an empty sample
    pub fn from_data(data: &[f64]) -> Option<Self> {
        let mean = mean(data)?;
        let count = data.len();

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            variance,
            min,
            max,
            count,
        })
    }

    /// Standard deviation relative to the mean; `None` when the mean is zero
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        if self.mean > 0.0 {
            Some(self.std_dev / self.mean)
        } else {
            None
        }
    }
}

/// Arithmetic mean; `None` for an empty sample
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

/// Mean of the values that are present
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean(&present)
}

/// `part / whole * 100`, guarding against an empty whole
pub fn percentage(part: f64, whole: f64) -> Option<f64> {
    if whole > 0.0 {
        Some(part / whole * 100.0)
    } else {
        None
    }
}

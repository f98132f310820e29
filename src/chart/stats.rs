use crate::data::model::MeasurementSet;
use crate::error::InputError;

/// Summary statistics shown in the chart's statistics block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (Bessel-corrected, N − 1).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation. Undefined below two points.
pub fn sample_std_dev(values: &[f64]) -> Result<f64, InputError> {
    let n = values.len();
    if n < 2 {
        return Err(InputError::TooFewPoints { count: n });
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((ss / (n - 1) as f64).sqrt())
}

pub fn summarize(set: &MeasurementSet) -> Result<Summary, InputError> {
    let values = set.values();
    let std_dev = sample_std_dev(values)?;
    Ok(Summary {
        count: values.len(),
        mean: mean(values),
        std_dev,
        min: set.min(),
        max: set.max(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hand_computed_fixture() {
        let set = MeasurementSet::new(vec![0.100, 0.102, 0.098, 0.101]).unwrap();
        let s = summarize(&set).unwrap();
        assert_eq!(s.count, 4);
        assert_abs_diff_eq!(s.mean, 0.10025, epsilon = 1e-12);
        // sqrt(8.75e-6 / 3)
        assert_abs_diff_eq!(s.std_dev, 0.0017078, epsilon = 1e-6);
        assert_eq!(s.min, 0.098);
        assert_eq!(s.max, 0.102);
    }

    #[test]
    fn mean_is_sum_over_n() {
        let values = [0.098, 0.105, 0.099];
        assert_abs_diff_eq!(mean(&values), 0.302 / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn single_point_is_rejected() {
        let set = MeasurementSet::new(vec![0.1]).unwrap();
        assert_eq!(summarize(&set), Err(InputError::TooFewPoints { count: 1 }));
    }

    #[test]
    fn constant_series_has_zero_spread() {
        let s = sample_std_dev(&[0.25, 0.25, 0.25]).unwrap();
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-15);
    }
}

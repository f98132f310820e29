use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::InputError;

// ---------------------------------------------------------------------------
// MeasurementSet – ordered thickness readings around the coil
// ---------------------------------------------------------------------------

/// Ordered thickness readings in millimetres, one per point around the
/// coil circumference. Never empty, every value finite.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    values: Vec<f64>,
}

impl MeasurementSet {
    pub fn new(values: Vec<f64>) -> Result<Self, InputError> {
        if values.is_empty() {
            return Err(InputError::Empty);
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonFinite { index });
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

// ---------------------------------------------------------------------------
// ToleranceBand – nominal thickness and its acceptable range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    pub nominal: f64,
    pub minimum: f64,
    pub maximum: f64,
}

/// Problems with a band as typed into the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandWarning {
    /// `minimum >= maximum`; submission is blocked.
    MinimumNotBelowMaximum,
    /// Nominal outside `[minimum, maximum]`; highlighted only.
    NominalOutsideBand,
}

impl fmt::Display for BandWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandWarning::MinimumNotBelowMaximum => {
                write!(f, "O valor mínimo deve ser menor que o máximo")
            }
            BandWarning::NominalOutsideBand => {
                write!(f, "O valor nominal está fora dos limites mínimo e máximo")
            }
        }
    }
}

impl ToleranceBand {
    /// A reading is flagged only when strictly outside the band.
    pub fn is_out_of_tolerance(&self, value: f64) -> bool {
        value < self.minimum || value > self.maximum
    }

    pub fn warnings(&self) -> Vec<BandWarning> {
        let mut out = Vec::new();
        if self.minimum >= self.maximum {
            out.push(BandWarning::MinimumNotBelowMaximum);
        }
        if self.is_out_of_tolerance(self.nominal) {
            out.push(BandWarning::NominalOutsideBand);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// InspectionMetadata – passthrough strings describing the inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionMetadata {
    pub coil_id: String,
    /// Production order (OP).
    pub operation: String,
    /// Analyst who took the readings.
    pub operator: String,
    pub coordinator: String,
    pub product: String,
    pub machine: String,
    pub shift: String,
    pub meter_serial: String,
    /// Kept as text, formatted `dd/mm/yyyy` by the form.
    pub date: String,
}

impl InspectionMetadata {
    pub fn format_date(date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }
}

// ---------------------------------------------------------------------------
// ChartArtifact / InspectionRecord – outputs of one submission
// ---------------------------------------------------------------------------

/// A rendered chart on disk. The core never touches it after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub filename: String,
    pub filepath: PathBuf,
}

/// Everything one spreadsheet row holds.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    pub metadata: InspectionMetadata,
    pub band: ToleranceBand,
    pub measurements: Vec<f64>,
    /// Chart filename; empty for rows written by older versions.
    pub chart: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> ToleranceBand {
        ToleranceBand { nominal: 0.100, minimum: 0.097, maximum: 0.103 }
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert_eq!(MeasurementSet::new(vec![]), Err(InputError::Empty));
        assert_eq!(
            MeasurementSet::new(vec![0.1, f64::NAN]),
            Err(InputError::NonFinite { index: 1 })
        );
        assert_eq!(
            MeasurementSet::new(vec![f64::INFINITY]),
            Err(InputError::NonFinite { index: 0 })
        );
    }

    #[test]
    fn min_max() {
        let set = MeasurementSet::new(vec![0.098, 0.105, 0.099]).unwrap();
        assert_eq!(set.min(), 0.098);
        assert_eq!(set.max(), 0.105);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn boundaries_are_in_tolerance() {
        let b = band();
        assert!(!b.is_out_of_tolerance(0.097));
        assert!(!b.is_out_of_tolerance(0.103));
        assert!(!b.is_out_of_tolerance(0.100));
        assert!(b.is_out_of_tolerance(0.0969));
        assert!(b.is_out_of_tolerance(0.105));
    }

    #[test]
    fn band_warnings() {
        assert!(band().warnings().is_empty());

        let inverted = ToleranceBand { nominal: 0.100, minimum: 0.103, maximum: 0.097 };
        assert_eq!(
            inverted.warnings(),
            vec![BandWarning::MinimumNotBelowMaximum, BandWarning::NominalOutsideBand]
        );

        let off_nominal = ToleranceBand { nominal: 0.110, ..band() };
        assert_eq!(off_nominal.warnings(), vec![BandWarning::NominalOutsideBand]);
    }

    #[test]
    fn date_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(InspectionMetadata::format_date(d), "07/03/2024");
    }
}

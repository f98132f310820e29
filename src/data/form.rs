use chrono::NaiveDate;

use super::model::{BandWarning, InspectionMetadata, MeasurementSet, ToleranceBand};
use crate::error::InputError;

// ---------------------------------------------------------------------------
// Inspection form – raw text as typed by the operator
// ---------------------------------------------------------------------------

/// Form contents before validation. Point fields are kept in order; blank
/// ones are skipped on submit.
#[derive(Debug, Clone)]
pub struct InspectionForm {
    pub date: NaiveDate,
    pub shift: String,
    pub meter_serial: String,
    pub operator: String,
    pub coordinator: String,
    pub coil_id: String,
    pub machine: String,
    pub operation: String,
    pub product: String,
    pub nominal: String,
    pub minimum: String,
    pub maximum: String,
    pub points: Vec<String>,
}

/// A validated form, ready for the chart and the spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub metadata: InspectionMetadata,
    pub band: ToleranceBand,
    pub measurements: MeasurementSet,
}

impl InspectionForm {
    pub fn new(date: NaiveDate, point_count: usize) -> Self {
        Self {
            date,
            shift: String::new(),
            meter_serial: String::new(),
            operator: String::new(),
            coordinator: String::new(),
            coil_id: String::new(),
            machine: String::new(),
            operation: String::new(),
            product: String::new(),
            nominal: String::new(),
            minimum: String::new(),
            maximum: String::new(),
            points: vec![String::new(); point_count],
        }
    }

    pub fn add_point(&mut self) {
        self.points.push(String::new());
    }

    pub fn remove_point(&mut self) {
        self.points.pop();
    }

    /// Replace the point list with pasted text, one value per line.
    pub fn paste_points(&mut self, text: &str) {
        self.points = parse_pasted_points(text);
    }

    pub fn set_points(&mut self, values: &[f64]) {
        self.points = values.iter().map(|v| v.to_string()).collect();
    }

    /// Clear the readings and coil for the next inspection; the crew,
    /// machine and band usually stay the same.
    pub fn reset_for_next(&mut self) {
        self.coil_id.clear();
        let n = self.points.len();
        self.points = vec![String::new(); n];
    }

    pub fn metadata(&self) -> InspectionMetadata {
        InspectionMetadata {
            coil_id: self.coil_id.trim().to_string(),
            operation: self.operation.trim().to_string(),
            operator: self.operator.trim().to_string(),
            coordinator: self.coordinator.trim().to_string(),
            product: self.product.trim().to_string(),
            machine: self.machine.trim().to_string(),
            shift: self.shift.trim().to_string(),
            meter_serial: self.meter_serial.trim().to_string(),
            date: InspectionMetadata::format_date(self.date),
        }
    }

    pub fn band(&self) -> Result<ToleranceBand, InputError> {
        Ok(ToleranceBand {
            nominal: parse_number("Nominal", &self.nominal)?,
            minimum: parse_number("Mínimo", &self.minimum)?,
            maximum: parse_number("Máximo", &self.maximum)?,
        })
    }

    /// Band warnings for live highlighting; empty while the band is incomplete.
    pub fn band_warnings(&self) -> Vec<BandWarning> {
        self.band().map(|b| b.warnings()).unwrap_or_default()
    }

    /// Non-blank points in order.
    pub fn measurements(&self) -> Result<Vec<f64>, InputError> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.trim().is_empty())
            .map(|(i, p)| parse_number(&format!("Ponto {}", i + 1), p))
            .collect()
    }

    /// Per-field flag: `true` when the field parses and lies outside the band.
    pub fn point_flags(&self) -> Vec<bool> {
        let band = self.band().ok();
        self.points
            .iter()
            .map(|p| match (band, parse_number("", p)) {
                (Some(b), Ok(v)) => b.is_out_of_tolerance(v),
                _ => false,
            })
            .collect()
    }

    pub fn has_out_of_tolerance_points(&self) -> bool {
        self.point_flags().into_iter().any(|f| f)
    }

    pub fn validate(&self) -> Result<Submission, InputError> {
        if self.coil_id.trim().is_empty() {
            return Err(InputError::MissingField("Bobina"));
        }
        let band = self.band()?;
        if band.minimum >= band.maximum {
            return Err(InputError::InvertedBand { minimum: band.minimum, maximum: band.maximum });
        }
        let values = self.measurements()?;
        if values.len() == 1 {
            return Err(InputError::TooFewPoints { count: 1 });
        }
        Ok(Submission {
            metadata: self.metadata(),
            band,
            measurements: MeasurementSet::new(values)?,
        })
    }
}

/// Split pasted text into point fields, one per non-blank line.
pub fn parse_pasted_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decimal point or decimal comma; surrounding blanks ignored.
fn parse_number(field: &str, value: &str) -> Result<f64, InputError> {
    let trimmed = value.trim();
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InputError::InvalidNumber {
            field: field.to_string(),
            value: trimmed.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> InspectionForm {
        let mut form = InspectionForm::new(NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(), 4);
        form.coil_id = " B-77 ".into();
        form.nominal = "0.100".into();
        form.minimum = "0,097".into();
        form.maximum = "0.103".into();
        form.points = vec!["0.098".into(), "".into(), "0.105".into(), " 0.099 ".into()];
        form
    }

    #[test]
    fn valid_form() {
        let sub = filled().validate().unwrap();
        assert_eq!(sub.metadata.coil_id, "B-77");
        assert_eq!(sub.metadata.date, "05/11/2024");
        assert_eq!(sub.band.minimum, 0.097);
        assert_eq!(sub.measurements.values(), &[0.098, 0.105, 0.099]);
    }

    #[test]
    fn bad_point_names_its_field() {
        let mut form = filled();
        form.points[1] = "abc".into();
        assert_eq!(
            form.validate(),
            Err(InputError::InvalidNumber { field: "Ponto 2".into(), value: "abc".into() })
        );
    }

    #[test]
    fn required_and_band_checks() {
        let mut form = filled();
        form.coil_id = "  ".into();
        assert_eq!(form.validate(), Err(InputError::MissingField("Bobina")));

        let mut form = filled();
        form.minimum = "0.103".into();
        assert!(matches!(form.validate(), Err(InputError::InvertedBand { .. })));
        assert!(form.band_warnings().contains(&BandWarning::MinimumNotBelowMaximum));

        let mut form = filled();
        form.maximum = "".into();
        assert!(matches!(form.validate(), Err(InputError::InvalidNumber { .. })));
        assert!(form.band_warnings().is_empty());
    }

    #[test]
    fn point_count_rules() {
        let mut form = filled();
        form.points = vec!["".into(), " ".into()];
        assert_eq!(form.validate(), Err(InputError::Empty));
        form.points = vec!["0.1".into()];
        assert_eq!(form.validate(), Err(InputError::TooFewPoints { count: 1 }));
    }

    #[test]
    fn flags_follow_band() {
        let form = filled();
        assert_eq!(form.point_flags(), vec![false, false, true, false]);
        assert!(form.has_out_of_tolerance_points());
    }

    #[test]
    fn paste_and_edit_points() {
        let mut form = filled();
        form.paste_points("0.1\r\n\n 0.2 \n0.3\n");
        assert_eq!(form.points, vec!["0.1", "0.2", "0.3"]);
        form.add_point();
        assert_eq!(form.points.len(), 4);
        form.remove_point();
        form.set_points(&[0.5, 0.25]);
        assert_eq!(form.points, vec!["0.5", "0.25"]);
        form.reset_for_next();
        assert_eq!(form.points, vec!["", ""]);
        assert!(form.coil_id.is_empty());
        assert_eq!(form.nominal, "0.100");
    }
}

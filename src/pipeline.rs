use anyhow::{Context, Result};

use crate::chart::render::point_labels;
use crate::chart::stats::{summarize, Summary};
use crate::chart::render_chart;
use crate::config::AppConfig;
use crate::data::form::Submission;
use crate::data::model::{ChartArtifact, InspectionRecord};
use crate::data::spreadsheet::SpreadsheetStore;

/// What the result view shows after a successful submit.
#[derive(Debug, Clone)]
pub struct InspectionOutcome {
    pub artifact: ChartArtifact,
    pub summary: Summary,
    /// Zero-based indices of points outside the band.
    pub flagged: Vec<usize>,
    pub record: InspectionRecord,
}

/// Render the chart, then record the row that references it.
///
/// The chart goes first so the row never points at a missing file; if the
/// spreadsheet write fails the chart stays on disk and the error is returned.
pub fn submit(
    submission: &Submission,
    config: &AppConfig,
    store: &SpreadsheetStore,
) -> Result<InspectionOutcome> {
    let Submission { metadata, band, measurements } = submission;

    let summary = summarize(measurements)?;
    let artifact = render_chart(measurements, band, metadata, &config.chart_dir, &config.chart)
        .context("rendering chart")?;

    let record = InspectionRecord {
        metadata: metadata.clone(),
        band: *band,
        measurements: measurements.values().to_vec(),
        chart: artifact.filename.clone(),
    };
    store.append(&record).context("saving to spreadsheet")?;

    let flagged = point_labels(measurements, band)
        .into_iter()
        .filter(|l| l.flagged)
        .map(|l| l.index)
        .collect();

    Ok(InspectionOutcome { artifact, summary, flagged, record })
}

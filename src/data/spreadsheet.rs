use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::model::{InspectionMetadata, InspectionRecord, ToleranceBand};

/// Fixed leading columns; `Ponto 1..N` follow.
pub const FIXED_COLUMNS: [&str; 13] = [
    "Data",
    "Turno",
    "Série do Medidor",
    "Analista",
    "Coordenador",
    "Bobina",
    "Máquina",
    "OP",
    "Produto",
    "Nominal",
    "Mínimo",
    "Máximo",
    "Gráfico",
];

// ---------------------------------------------------------------------------
// Spreadsheet store – one CSV row per inspection
// ---------------------------------------------------------------------------

/// Append-only CSV workbook. Rows may carry different point counts.
#[derive(Debug, Clone)]
pub struct SpreadsheetStore {
    path: PathBuf,
}

impl SpreadsheetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first when the file is new.
    ///
    /// A row with more points than the header triggers a rewrite of the whole
    /// file under a wider header, so every stored point has a column name.
    pub fn append(&self, record: &InspectionRecord) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let width = FIXED_COLUMNS.len() + record.measurements.len();
        match self.header_width()? {
            Some(current) if current < width => self.rewrite_with(record)?,
            current => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .with_context(|| format!("opening {}", self.path.display()))?;

                let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
                if current.is_none() {
                    writer
                        .write_record(header(record.measurements.len()))
                        .context("writing spreadsheet header")?;
                }
                writer.write_record(to_row(record)).context("writing spreadsheet row")?;
                writer.flush().context("flushing spreadsheet")?;
            }
        }

        log::info!(
            "Saved inspection for coil '{}' to {}",
            record.metadata.coil_id,
            self.path.display()
        );
        Ok(())
    }

    /// All rows in file order. A missing file is an empty workbook.
    pub fn read_records(&self) -> Result<Vec<InspectionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        let mut records = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let row = result.with_context(|| format!("spreadsheet row {row_no}"))?;
            let fields: Vec<&str> = row.iter().collect();
            records.push(from_row(&fields).with_context(|| format!("spreadsheet row {row_no}"))?);
        }
        Ok(records)
    }
}

impl SpreadsheetStore {
    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Column count of the header line, `None` for a missing or empty file.
    fn header_width(&self) -> Result<Option<usize>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        match reader.records().next() {
            Some(first) => Ok(Some(first.context("reading spreadsheet header")?.len())),
            None => Ok(None),
        }
    }

    /// Copy every row under a header wide enough for `record`, add `record`,
    /// and swap the result in place of the old file.
    fn rewrite_with(&self, record: &InspectionRecord) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .context("reading spreadsheet rows")?;

        let row = to_row(record);
        let width = rows.iter().map(|r| r.len()).chain([row.len()]).max().unwrap_or(row.len());

        let mut tmp = tempfile::NamedTempFile::new_in(self.dir())
            .with_context(|| format!("creating temp file in {}", self.dir().display()))?;
        {
            let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(&mut tmp);
            writer
                .write_record(header(width.saturating_sub(FIXED_COLUMNS.len())))
                .context("writing spreadsheet header")?;
            for existing in &rows {
                writer.write_record(existing).context("copying spreadsheet row")?;
            }
            writer.write_record(&row).context("writing spreadsheet row")?;
            writer.flush().context("flushing spreadsheet")?;
        }
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        log::info!("Widened {} header to {width} columns", self.path.display());
        Ok(())
    }
}

pub fn header(points: usize) -> Vec<String> {
    FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain((1..=points).map(|i| format!("Ponto {i}")))
        .collect()
}

fn to_row(record: &InspectionRecord) -> Vec<String> {
    let m = &record.metadata;
    let b = &record.band;
    [
        m.date.clone(),
        m.shift.clone(),
        m.meter_serial.clone(),
        m.operator.clone(),
        m.coordinator.clone(),
        m.coil_id.clone(),
        m.machine.clone(),
        m.operation.clone(),
        m.product.clone(),
        b.nominal.to_string(),
        b.minimum.to_string(),
        b.maximum.to_string(),
        record.chart.clone(),
    ]
    .into_iter()
    .chain(record.measurements.iter().map(|v| v.to_string()))
    .collect()
}

fn from_row(fields: &[&str]) -> Result<InspectionRecord> {
    if fields.len() < FIXED_COLUMNS.len() {
        bail!("expected at least {} columns, got {}", FIXED_COLUMNS.len(), fields.len());
    }
    let num = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("{}: '{}' is not a number", FIXED_COLUMNS[i], fields[i]))
    };
    let metadata = InspectionMetadata {
        date: fields[0].to_string(),
        shift: fields[1].to_string(),
        meter_serial: fields[2].to_string(),
        operator: fields[3].to_string(),
        coordinator: fields[4].to_string(),
        coil_id: fields[5].to_string(),
        machine: fields[6].to_string(),
        operation: fields[7].to_string(),
        product: fields[8].to_string(),
    };
    let band = ToleranceBand { nominal: num(9)?, minimum: num(10)?, maximum: num(11)? };
    let measurements = fields[FIXED_COLUMNS.len()..]
        .iter()
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<f64>().with_context(|| format!("point '{f}' is not a number")))
        .collect::<Result<Vec<_>>>()?;
    Ok(InspectionRecord { metadata, band, measurements, chart: fields[12].to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(coil: &str, points: Vec<f64>) -> InspectionRecord {
        InspectionRecord {
            metadata: InspectionMetadata {
                coil_id: coil.into(),
                operation: "OP1".into(),
                operator: "Ana, Silva".into(),
                date: "05/11/2024".into(),
                shift: "A".into(),
                ..Default::default()
            },
            band: ToleranceBand { nominal: 0.1, minimum: 0.097, maximum: 0.103 },
            measurements: points,
            chart: format!("grafico_bobina_{coil}_20241105_080000.png"),
        }
    }

    #[test]
    fn header_lists_points() {
        let h = header(3);
        assert_eq!(h.len(), 16);
        assert_eq!(h[0], "Data");
        assert_eq!(h[15], "Ponto 3");
    }

    #[test]
    fn appends_rows_with_varying_point_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpreadsheetStore::new(dir.path().join("sub").join("dados.csv"));
        assert!(store.read_records().unwrap().is_empty());

        let first = record("B1", vec![0.1, 0.101, 0.099]);
        let second = record("B2", vec![0.1, 0.102, 0.098, 0.1, 0.104]);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let rows = store.read_records().unwrap();
        assert_eq!(rows, vec![first, second]);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("Data,")).count(), 1);
        assert!(text.contains("\"Ana, Silva\""));
    }

    fn header_line(store: &SpreadsheetStore) -> Vec<String> {
        let text = std::fs::read_to_string(store.path()).unwrap();
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(text.as_bytes());
        reader.records().next().unwrap().unwrap().iter().map(String::from).collect()
    }

    #[test]
    fn wider_row_widens_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpreadsheetStore::new(dir.path().join("dados.csv"));

        let first = record("B1", vec![0.1, 0.101, 0.099]);
        let second = record("B2", vec![0.1, 0.102, 0.098, 0.1, 0.104]);
        let third = record("B3", vec![0.1, 0.1, 0.1, 0.1]);
        store.append(&first).unwrap();
        assert_eq!(header_line(&store).len(), 16);

        store.append(&second).unwrap();
        let h = header_line(&store);
        assert_eq!(h.len(), 18);
        assert_eq!(h[16], "Ponto 4");
        assert_eq!(h[17], "Ponto 5");

        // narrower rows leave the header alone
        store.append(&third).unwrap();
        assert_eq!(header_line(&store), h);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("Data,")).count(), 1);
        assert_eq!(store.read_records().unwrap(), vec![first, second, third]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

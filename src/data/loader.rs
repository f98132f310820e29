use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

/// Column holding the thickness readings in imported spreadsheets.
pub const THICKNESS_COLUMN: &str = "Espessura";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load measurement points from the `Espessura` column of a file.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx`/`.xls` – first sheet, header in the first row
/// * `.csv`     – header row, one reading per row
/// * `.json`    – `[{ "Espessura": 0.101, ... }, ...]`
/// * `.parquet` – numeric `Espessura` column
///
/// A file without the column yields no points. Blank/null cells are skipped;
/// text, `NaN` or infinite readings are errors naming the row.
pub fn load_points(path: &Path) -> Result<Vec<f64>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let points = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" => load_excel(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!("Imported {} points from {}", points.len(), path.display());
    Ok(points)
}

fn missing_column(path: &Path) -> Vec<f64> {
    log::warn!("{}: no '{THICKNESS_COLUMN}' column, nothing imported", path.display());
    Vec::new()
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn load_excel(path: &Path) -> Result<Vec<f64>> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no sheets")?
        .context("reading first sheet")?;
    // Row numbers as Excel shows them.
    let first_row = range.start().map_or(0, |(row, _)| row as usize) + 1;

    let mut rows = range.rows();
    let Some(idx) = rows.next().and_then(|header| {
        header
            .iter()
            .position(|c| matches!(c, Data::String(s) if s.trim() == THICKNESS_COLUMN))
    }) else {
        return Ok(missing_column(path));
    };

    let mut points = Vec::new();
    for (i, row) in rows.enumerate() {
        let row_no = first_row + 1 + i;
        let value = match row.get(idx) {
            None | Some(Data::Empty) => continue,
            Some(Data::String(s)) if s.trim().is_empty() => continue,
            Some(Data::Float(v)) => finite(*v),
            Some(Data::Int(v)) => Ok(*v as f64),
            Some(Data::String(s)) => parse_decimal(s.trim()),
            Some(other) => bail!("Sheet row {row_no}: '{other}' is not a number"),
        };
        points.push(value.with_context(|| format!("Sheet row {row_no}: not a valid reading"))?);
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let Some(idx) = headers.iter().position(|h| h.trim() == THICKNESS_COLUMN) else {
        return Ok(missing_column(path));
    };

    let mut points = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = record.get(idx).unwrap_or("").trim();
        if cell.is_empty() {
            continue;
        }
        let value = parse_decimal(cell)
            .with_context(|| format!("CSV row {row_no}: '{cell}' is not a number"))?;
        points.push(value);
    }
    Ok(points)
}

/// Accepts both `0.101` and the comma-decimal `0,101`.
fn parse_decimal(cell: &str) -> Result<f64> {
    finite(cell.replace(',', ".").parse::<f64>()?)
}

fn finite(value: f64) -> Result<f64> {
    if !value.is_finite() {
        bail!("{value} is not a finite reading");
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    if !records
        .iter()
        .any(|r| r.as_object().is_some_and(|o| o.contains_key(THICKNESS_COLUMN)))
    {
        return Ok(missing_column(path));
    }

    let mut points = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        match obj.get(THICKNESS_COLUMN) {
            None | Some(JsonValue::Null) => continue,
            Some(JsonValue::Number(n)) => {
                points.push(n.as_f64().with_context(|| format!("Row {i}: bad number"))?)
            }
            Some(JsonValue::String(s)) if s.trim().is_empty() => continue,
            Some(JsonValue::String(s)) => points.push(
                parse_decimal(s.trim()).with_context(|| format!("Row {i}: '{s}' is not a number"))?,
            ),
            Some(other) => bail!("Row {i}: '{THICKNESS_COLUMN}' is {other}, expected a number"),
        }
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    if builder.schema().index_of(THICKNESS_COLUMN).is_err() {
        return Ok(missing_column(path));
    }
    let reader = builder.build().context("building parquet reader")?;

    let mut points = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let idx = batch
            .schema()
            .index_of(THICKNESS_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet batch missing '{THICKNESS_COLUMN}' column"))?;
        extract_f64_column(batch.column(idx).as_ref(), &mut points)?;
    }
    Ok(points)
}

/// Append the non-null values of a numeric (or numeric-text) column.
fn extract_f64_column(col: &dyn Array, out: &mut Vec<f64>) -> Result<()> {
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().context("expected Float64Array")?;
            for (row, v) in arr.iter().enumerate() {
                if let Some(v) = v {
                    out.push(finite(v).with_context(|| format!("Row {row}"))?);
                }
            }
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().context("expected Float32Array")?;
            for (row, v) in arr.iter().enumerate() {
                if let Some(v) = v {
                    out.push(finite(f64::from(v)).with_context(|| format!("Row {row}"))?);
                }
            }
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().context("expected Int64Array")?;
            out.extend(arr.iter().flatten().map(|v| v as f64));
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().context("expected Int32Array")?;
            out.extend(arr.iter().flatten().map(f64::from));
        }
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().context("expected StringArray")?;
            for (row, cell) in arr.iter().enumerate() {
                let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
                    continue;
                };
                out.push(
                    parse_decimal(cell)
                        .with_context(|| format!("Row {row}: '{cell}' is not a number"))?,
                );
            }
        }
        other => bail!("'{THICKNESS_COLUMN}' has type {other:?}, expected a numeric column"),
    }
    Ok(())
}

/// Data layer: core types, form parsing, import and storage.
///
/// Architecture:
/// ```text
///   form fields ──┐        .csv / .json / .parquet
///                 │               │
///                 ▼               ▼
///   ┌──────────────┐        ┌──────────┐
///   │     form      │ ◄───── │  loader   │  "Espessura" column → points
///   └──────────────┘        └──────────┘
///        │ validate
///        ▼
///   ┌──────────────┐
///   │  Submission   │  metadata + band + MeasurementSet
///   └──────────────┘
///        │ (after the chart is rendered)
///        ▼
///   ┌──────────────┐
///   │ spreadsheet   │  one CSV row per inspection
///   └──────────────┘
/// ```

pub mod form;
pub mod loader;
pub mod model;
pub mod spreadsheet;

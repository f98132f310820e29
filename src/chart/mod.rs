/// Chart pipeline: measurements in, PNG on disk out.
///
/// ```text
///  MeasurementSet + ToleranceBand + InspectionMetadata
///        │
///        ├──► stats   mean, sample std dev, min, max
///        ├──► polar   angles (north, clockwise) + radial axis range
///        ▼
///   ┌──────────┐
///   │  render   │  compose Canvas → SVG → PNG
///   └──────────┘
///        │
///        ▼
///   naming: grafico_bobina_<coil>_<YYYYMMDD_HHMMSS>.png
/// ```

pub mod canvas;
pub mod naming;
pub mod polar;
pub mod render;
pub mod stats;

pub use render::{render_chart, render_chart_at};

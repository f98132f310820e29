use thiserror::Error;

// ---------------------------------------------------------------------------
// Input validation errors – raised before any drawing happens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("at least one measurement point is required")]
    Empty,
    #[error("measurement {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("standard deviation needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },
    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: String, value: String },
    #[error("minimum ({minimum:.5}) must be below maximum ({maximum:.5})")]
    InvertedBand { minimum: f64, maximum: f64 },
    #[error("{0} is required")]
    MissingField(&'static str),
}

// ---------------------------------------------------------------------------
// Rendering errors – composition, rasterisation, file write
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("font error: {0}")]
    Font(String),
    #[error("SVG parse error: {0}")]
    Svg(String),
    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by the chart entry point.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

//! Polar layout of measurement points.
//!
//! Point `i` of `N` sits at angle `2πi/N`. Angle 0 points north and angles
//! grow clockwise, matching how the readings are taken around the coil.

use std::f64::consts::TAU;

use crate::data::model::{MeasurementSet, ToleranceBand};

/// One vertex of the measured polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarPoint {
    /// Radians, clockwise from north.
    pub angle: f64,
    pub value: f64,
}

impl PolarPoint {
    /// Unit direction in a y-up frame (`sin θ`, `cos θ`).
    pub fn direction(&self) -> (f64, f64) {
        (self.angle.sin(), self.angle.cos())
    }
}

/// Angle of point `index` out of `count`.
pub fn point_angle(index: usize, count: usize) -> f64 {
    TAU * index as f64 / count as f64
}

/// N evenly spaced points plus a closing copy of the first.
pub fn layout(values: &[f64]) -> Vec<PolarPoint> {
    let n = values.len();
    let mut points: Vec<PolarPoint> = values
        .iter()
        .enumerate()
        .map(|(i, &value)| PolarPoint { angle: point_angle(i, n), value })
        .collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

// ---------------------------------------------------------------------------
// Radial axis
// ---------------------------------------------------------------------------

/// Radial value range mapped onto `[0, 1]` of the plot radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub lower: f64,
    pub upper: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Fraction of the plot radius for `value`, clamped to `[0, 1]`.
    pub fn radius_fraction(&self, value: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return 0.5;
        }
        ((value - self.lower) / span).clamp(0.0, 1.0)
    }

    /// `count + 1` evenly spaced values from `lower` to `upper`.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let count = count.max(1);
        (0..=count)
            .map(|i| self.lower + self.span() * i as f64 / count as f64)
            .collect()
    }
}

/// Band and data bounds widened by `margin` on each side.
pub fn axis_range(set: &MeasurementSet, band: &ToleranceBand, margin: f64) -> AxisRange {
    AxisRange {
        lower: band.minimum.min(set.min()) - margin,
        upper: band.maximum.max(set.max()) + margin,
    }
}

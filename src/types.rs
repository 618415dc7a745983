//! Shared data model: points, detection parameters, and store records.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// RGB color triple, serialized as `[r, g, b]`.
pub type Rgb8 = [u8; 3];

/// A nucleus center in original-image pixel coordinates.
///
/// Serialized as a `[x, y]` pair so records match the JSON shape the
/// interactive front end reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance; point "equality" downstream is proximity, never
    /// exact coordinate match.
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Fully resolved parameter set for one detection run.
///
/// `min_area` drives the detector; the remaining fields only affect the
/// preview overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParameters {
    pub min_area: u32,
    pub marker_radius: u32,
    pub line_thickness: u32,
    pub color: Rgb8,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            min_area: 30,
            marker_radius: 6,
            line_thickness: 2,
            color: [255, 0, 0],
        }
    }
}

impl DetectionParameters {
    /// Layers defaults, then the store suggestion, then explicit user
    /// overrides. Overrides win per field, per run; nothing is written back.
    pub fn resolved(suggestion: Option<&PartialParams>, overrides: &PartialParams) -> Self {
        let mut params = Self::default();
        if let Some(suggested) = suggestion {
            params.apply(suggested);
        }
        params.apply(overrides);
        params
    }

    pub fn apply(&mut self, partial: &PartialParams) {
        if let Some(v) = partial.min_area {
            self.min_area = v;
        }
        if let Some(v) = partial.marker_radius {
            self.marker_radius = v;
        }
        if let Some(v) = partial.line_thickness {
            self.line_thickness = v;
        }
        if let Some(v) = partial.color {
            self.color = v;
        }
    }
}

/// Sparse parameter set: a recommendation or a user override. Absent fields
/// fall through to the next layer in [`DetectionParameters::resolved`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_thickness: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb8>,
}

impl From<&DetectionParameters> for PartialParams {
    fn from(params: &DetectionParameters) -> Self {
        Self {
            min_area: Some(params.min_area),
            marker_radius: Some(params.marker_radius),
            line_thickness: Some(params.line_thickness),
            color: Some(params.color),
        }
    }
}

/// Summary counts attached to a [`ParamRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub auto_count: usize,
    pub final_count: usize,
}

/// One entry of the parameter-recommendation corpus. Append-only: records
/// are never edited or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRecord {
    pub features: FeatureVector,
    pub params: PartialParams,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance_to(b), 5.0);
    }

    #[test]
    fn point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(7, -2)).unwrap();
        assert_eq!(json, "[7,-2]");
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Point::new(7, -2));
    }

    #[test]
    fn overrides_beat_suggestion() {
        let suggestion = PartialParams {
            min_area: Some(50),
            color: Some([0, 255, 0]),
            ..Default::default()
        };
        let overrides = PartialParams {
            min_area: Some(80),
            ..Default::default()
        };
        let params = DetectionParameters::resolved(Some(&suggestion), &overrides);
        assert_eq!(params.min_area, 80);
        assert_eq!(params.color, [0, 255, 0]);
        assert_eq!(params.marker_radius, DetectionParameters::default().marker_radius);
    }
}

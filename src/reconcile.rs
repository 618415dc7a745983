//! Maps canvas annotations back to original-image coordinates and merges
//! them with automatic detections.

use serde_json::Value;

use crate::types::Point;

/// Removal blast radius: one click clears every detection this close.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 12.0;
/// Collision radius for manual adds.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 6.0;
/// Largest canvas dimension the front end will display without shrinking.
pub const DEFAULT_MAX_DISPLAY_DIM: u32 = 1200;

/// Scale applied when the display image was produced from the original:
/// `min(1.0, max_display_dim / max(w, h))`. Passed explicitly so canvas
/// coordinates and detection coordinates can never silently diverge.
pub fn display_scale(width: u32, height: u32, max_display_dim: u32) -> f64 {
    let largest = width.max(height);
    if largest == 0 {
        return 1.0;
    }
    (max_display_dim as f64 / largest as f64).min(1.0)
}

/// Extracts annotation centers from one drawable-canvas layer
/// (`{"objects": [{left, top, width?, height?}, ...]}`) and re-projects
/// them from display space to original-image space.
///
/// Each object's center is `(left + width/2, top + height/2)`, width and
/// height defaulting to zero. Objects missing `left` or `top` are skipped;
/// the rest of the batch still goes through.
pub fn canvas_points(layer: &Value, scale: f64) -> Vec<Point> {
    let Some(objects) = layer.get("objects").and_then(Value::as_array) else {
        return Vec::new();
    };
    if scale <= 0.0 {
        return Vec::new();
    }
    let mut points = Vec::new();
    for object in objects {
        let (Some(left), Some(top)) = (field(object, "left"), field(object, "top")) else {
            continue;
        };
        let w = field(object, "width").unwrap_or(0.0);
        let h = field(object, "height").unwrap_or(0.0);
        let cx = left + w / 2.0;
        let cy = top + h / 2.0;
        points.push(Point::new(
            (cx / scale).round() as i32,
            (cy / scale).round() as i32,
        ));
    }
    points
}

fn field(object: &Value, key: &str) -> Option<f64> {
    object.get(key).and_then(Value::as_f64)
}

/// Merges automatic detections with manual corrections.
///
/// Removals act as a proximity set-difference: every auto point within
/// `merge_threshold` of any removal click is dropped, independent of
/// removal order. Adds are then appended unless within `dedup_threshold`
/// of a point already accepted, checked against the progressively built
/// set so near-duplicate adds collapse to one. Output order: surviving
/// autos in original order, then accepted adds in input order. The input
/// slices are never mutated.
pub fn reconcile(
    auto_points: &[Point],
    added_points: &[Point],
    removed_points: &[Point],
    merge_threshold: f64,
    dedup_threshold: f64,
) -> Vec<Point> {
    let mut working: Vec<Point> = auto_points.to_vec();
    working.retain(|p| {
        !removed_points
            .iter()
            .any(|r| p.distance_to(*r) < merge_threshold)
    });
    for &add in added_points {
        if working.iter().any(|p| p.distance_to(add) < dedup_threshold) {
            continue;
        }
        working.push(add);
    }
    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canvas_objects_map_through_scale() {
        let layer = json!({
            "objects": [
                {"left": 100.0, "top": 40.0, "width": 10.0, "height": 10.0},
                {"left": 30.0, "top": 60.0},
                {"top": 5.0}
            ]
        });
        let points = canvas_points(&layer, 0.5);
        // (105, 45) / 0.5 and (30, 60) / 0.5; the malformed third is skipped.
        assert_eq!(points, vec![Point::new(210, 90), Point::new(60, 120)]);
    }

    #[test]
    fn missing_objects_key_is_empty() {
        assert!(canvas_points(&json!({}), 1.0).is_empty());
    }

    #[test]
    fn scale_caps_at_one() {
        assert_eq!(display_scale(800, 600, 1200), 1.0);
        assert_eq!(display_scale(2400, 1200, 1200), 0.5);
        assert_eq!(display_scale(0, 0, 1200), 1.0);
    }
}

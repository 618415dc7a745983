//! External contour extraction and moment centroids.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use super::DetectionError;
use crate::types::Point;

/// Traces external contours of the mask and returns the centroid of every
/// contour whose polygon area reaches `min_area`, in discovery order.
/// Degenerate contours with zero area are skipped silently.
pub fn contour_centroids(
    mask: &[u8],
    width: u32,
    height: u32,
    min_area: u32,
) -> Result<Vec<Point>, DetectionError> {
    let mask_img = GrayImage::from_raw(width, height, mask.to_vec())
        .ok_or(DetectionError::MaskLayout)?;
    let contours = find_contours::<i32>(&mask_img);

    let mut centers = Vec::new();
    for contour in &contours {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let Some((area, cx, cy)) = polygon_centroid(&contour.points) else {
            continue;
        };
        if area < min_area as f64 {
            continue;
        }
        centers.push(Point::new(cx as i32, cy as i32));
    }
    Ok(centers)
}

/// Shoelace area and centroid of a closed pixel polygon; `None` for
/// degenerate (zero-moment) contours. Matches moment-based contour
/// centroids: both derive from Green's theorem over the boundary.
fn polygon_centroid(points: &[imageproc::point::Point<i32>]) -> Option<(f64, f64, f64)> {
    if points.len() < 3 {
        return None;
    }
    let mut doubled_area = 0f64;
    let mut cx = 0f64;
    let mut cy = 0f64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let cross = (p.x as f64) * (q.y as f64) - (q.x as f64) * (p.y as f64);
        doubled_area += cross;
        cx += (p.x as f64 + q.x as f64) * cross;
        cy += (p.y as f64 + q.y as f64) * cross;
    }
    if doubled_area == 0.0 {
        return None;
    }
    let area = doubled_area / 2.0;
    Some((area.abs(), cx / (6.0 * area), cy / (6.0 * area)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_square(width: u32, height: u32, x0: u32, y0: u32, size: u32) -> Vec<u8> {
        let mut mask = vec![0u8; (width * height) as usize];
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                mask[(y * width + x) as usize] = 255;
            }
        }
        mask
    }

    #[test]
    fn square_centroid() {
        let mask = filled_square(40, 40, 10, 10, 11);
        let centers = contour_centroids(&mask, 40, 40, 30).unwrap();
        assert_eq!(centers.len(), 1);
        let c = centers[0];
        assert!((c.x - 15).abs() <= 1, "x was {}", c.x);
        assert!((c.y - 15).abs() <= 1, "y was {}", c.y);
    }

    #[test]
    fn min_area_filters_small_blobs() {
        let mut mask = filled_square(40, 40, 5, 5, 10);
        // 2x2 speck, boundary polygon area well under the floor
        mask[(30 * 40 + 30) as usize] = 255;
        mask[(30 * 40 + 31) as usize] = 255;
        mask[(31 * 40 + 30) as usize] = 255;
        mask[(31 * 40 + 31) as usize] = 255;
        let centers = contour_centroids(&mask, 40, 40, 20).unwrap();
        assert_eq!(centers.len(), 1);
    }

    #[test]
    fn empty_mask_yields_no_centers() {
        let mask = vec![0u8; 16 * 16];
        assert!(contour_centroids(&mask, 16, 16, 1).unwrap().is_empty());
    }
}

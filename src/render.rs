//! Preview overlay: point markers drawn onto an RGB canvas.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use crate::types::{Point, Rgb8};

/// Draws a marker at every point, projecting original-image coordinates
/// into the canvas space by `scale` (1.0 when drawing on the original).
/// Thickness 0 means filled; otherwise `thickness` concentric rings.
/// Markers near the border clip silently.
pub fn draw_markers(
    canvas: &mut RgbImage,
    points: &[Point],
    radius: u32,
    thickness: u32,
    color: Rgb8,
    scale: f64,
) {
    let color = Rgb(color);
    for p in points {
        let cx = (p.x as f64 * scale).round() as i32;
        let cy = (p.y as f64 * scale).round() as i32;
        if thickness == 0 {
            draw_filled_circle_mut(canvas, (cx, cy), radius as i32, color);
            continue;
        }
        for ring in 0..thickness {
            let r = radius as i32 - ring as i32;
            if r <= 0 {
                break;
            }
            draw_hollow_circle_mut(canvas, (cx, cy), r, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_marker_paints_center() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        draw_markers(&mut canvas, &[Point::new(10, 10)], 3, 0, [255, 0, 0], 1.0);
        assert_eq!(canvas.get_pixel(10, 10), &Rgb([255, 0, 0]));
    }

    #[test]
    fn markers_project_through_scale() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        // Original coordinate 30 lands at 15 under a 0.5 display scale.
        draw_markers(&mut canvas, &[Point::new(30, 30)], 2, 0, [0, 255, 0], 0.5);
        assert_eq!(canvas.get_pixel(15, 15), &Rgb([0, 255, 0]));
    }

    #[test]
    fn out_of_bounds_marker_is_clipped() {
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        draw_markers(&mut canvas, &[Point::new(50, 50)], 4, 2, [255, 0, 0], 1.0);
        // Nothing painted, nothing panicked.
        assert!(canvas.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}

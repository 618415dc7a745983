use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use nucleus_counter::detect::{DetectConfig, Polarity, detect_centers};
use nucleus_counter::types::Point;

fn blob_image(
    width: u32,
    height: u32,
    background: u8,
    blob: u8,
    centers: &[(i32, i32)],
    radius: i32,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([background; 3]));
    for &(x, y) in centers {
        draw_filled_circle_mut(&mut img, (x, y), radius, Rgb([blob; 3]));
    }
    img
}

fn nearest_distance(points: &[Point], target: (i32, i32)) -> f64 {
    points
        .iter()
        .map(|p| p.distance_to(Point::new(target.0, target.1)))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn uniform_image_detects_nothing() {
    let img = RgbImage::from_pixel(120, 90, Rgb([128, 128, 128]));
    let centers = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    assert!(centers.is_empty());
}

#[test]
fn dark_blobs_on_bright_background() {
    let targets = [(50, 50), (150, 150)];
    let img = blob_image(200, 200, 255, 30, &targets, 10);
    let centers = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    eprintln!("centers: {centers:?}");
    assert_eq!(centers.len(), 2);
    for &t in &targets {
        assert!(
            nearest_distance(&centers, t) <= 3.0,
            "no center near {t:?} in {centers:?}"
        );
    }
}

#[test]
fn min_area_floor_filters_everything() {
    let img = blob_image(200, 200, 255, 30, &[(50, 50), (150, 150)], 10);
    let config = DetectConfig {
        min_area: 1000,
        ..Default::default()
    };
    let centers = detect_centers(&img, &config).expect("detect failed");
    assert!(centers.is_empty());
}

#[test]
fn bright_polarity_override_finds_bright_nuclei() {
    let targets = [(60, 60), (140, 120)];
    let img = blob_image(200, 200, 5, 220, &targets, 10);
    let config = DetectConfig {
        polarity: Polarity::Bright,
        ..Default::default()
    };
    let centers = detect_centers(&img, &config).expect("detect failed");
    assert_eq!(centers.len(), 2);
    for &t in &targets {
        assert!(nearest_distance(&centers, t) <= 3.0);
    }
}

#[test]
fn watershed_splits_touching_nuclei() {
    // Two overlapping circles 26px apart: a single connected component
    // whose distance-transform cores are still separate.
    let targets = [(80, 100), (106, 100)];
    let img = blob_image(200, 200, 255, 30, &targets, 14);

    let merged = detect_centers(
        &img,
        &DetectConfig {
            use_watershed: false,
            ..Default::default()
        },
    )
    .expect("detect failed");
    assert_eq!(merged.len(), 1, "expected one merged blob: {merged:?}");

    let split = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    eprintln!("split centers: {split:?}");
    assert_eq!(split.len(), 2, "watershed should split: {split:?}");
    for &t in &targets {
        assert!(
            nearest_distance(&split, t) <= 5.0,
            "no center near {t:?} in {split:?}"
        );
    }
}

#[test]
fn watershed_split_does_not_depend_on_contrast_enhancement() {
    // The flood relief is the raw grayscale, so toggling enhancement must
    // not change how the touching pair separates.
    let img = blob_image(200, 200, 255, 30, &[(80, 100), (106, 100)], 14);
    let with_clahe = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    let without = detect_centers(
        &img,
        &DetectConfig {
            use_clahe: false,
            ..Default::default()
        },
    )
    .expect("detect failed");
    assert_eq!(with_clahe.len(), 2);
    assert_eq!(without.len(), 2);
}

#[test]
fn detection_is_deterministic() {
    let img = blob_image(160, 160, 240, 20, &[(40, 40), (120, 90)], 9);
    let a = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    let b = detect_centers(&img, &DetectConfig::default()).expect("detect failed");
    assert_eq!(a, b);
}

#[test]
fn clahe_toggle_still_finds_high_contrast_blobs() {
    let targets = [(50, 50), (150, 150)];
    let img = blob_image(200, 200, 255, 30, &targets, 10);
    let config = DetectConfig {
        use_clahe: false,
        ..Default::default()
    };
    let centers = detect_centers(&img, &config).expect("detect failed");
    assert_eq!(centers.len(), 2);
}

//! Fixed-size image descriptor used as the similarity key for parameter
//! recommendation. Never persisted as an identifier.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// `contrast` is the population standard deviation of grayscale
/// intensities, `mean_intensity` the arithmetic mean, `shape` is
/// `(height, width)` and serializes as `[h, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub contrast: f64,
    pub mean_intensity: f64,
    pub shape: (u32, u32),
}

/// Pure and deterministic: the same grayscale buffer always yields the
/// same descriptor.
pub fn extract(gray: &GrayImage) -> FeatureVector {
    let (width, height) = gray.dimensions();
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return FeatureVector {
            contrast: 0.0,
            mean_intensity: 0.0,
            shape: (height, width),
        };
    }
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = pixels
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    FeatureVector {
        contrast: variance.sqrt(),
        mean_intensity: mean,
        shape: (height, width),
    }
}

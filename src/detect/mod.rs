//! Nucleus center detection: grayscale → adaptive contrast → Otsu
//! binarization → morphological cleanup → watershed splitting → contour
//! centroids.

mod clahe;
mod contours;
mod morphology;
mod threshold;
mod watershed;

use image::{GrayImage, RgbImage};
use kornia::image::{Image, ImageError, ImageSize, allocator::CpuAllocator};
use kornia::imgproc;
use thiserror::Error;

use crate::features;
use crate::types::Point;

pub use contours::contour_centroids;
pub use morphology::{dilate, erode, open};

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("kornia image error: {0}")]
    Kornia(#[from] ImageError),
    #[error("mask buffer does not match image dimensions")]
    MaskLayout,
}

/// Which intensity class counts as foreground after thresholding.
///
/// `Auto` compares the mean intensity inside vs. outside the raw Otsu mask
/// and flips so the darker class becomes foreground; stains with bright
/// nuclei on dark background need the explicit `Bright` override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    Auto,
    /// Foreground is the class brighter than the threshold.
    Bright,
    /// Foreground is the class at or below the threshold.
    Dark,
}

/// Pipeline configuration. The toggles collapse the historical
/// with/without-CLAHE and with/without-watershed variants into one
/// parameterized path.
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Contours below this area are discarded.
    pub min_area: u32,
    pub use_clahe: bool,
    pub use_watershed: bool,
    pub polarity: Polarity,
    /// Sure-foreground seed threshold as a fraction of the distance-map
    /// maximum; clamped to [0.4, 0.7].
    pub seed_fraction: f32,
    pub opening_iterations: usize,
    /// CLAHE tile grid (tiles × tiles).
    pub clahe_tiles: usize,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            min_area: 30,
            use_clahe: true,
            use_watershed: true,
            polarity: Polarity::Auto,
            seed_fraction: 0.5,
            opening_iterations: 2,
            clahe_tiles: 8,
        }
    }
}

/// Converts an RGB buffer to grayscale.
pub fn grayscale(rgb: &RgbImage) -> Result<GrayImage, DetectionError> {
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::from_raw(width, height, Vec::new()).ok_or(DetectionError::MaskLayout);
    }
    let size = ImageSize {
        width: width as usize,
        height: height as usize,
    };
    let src = CpuImage::<u8, 3>::new(size, rgb.as_raw().clone(), CpuAllocator)?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(size, 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&src, &mut gray)?;
    GrayImage::from_raw(width, height, gray.as_slice().to_vec()).ok_or(DetectionError::MaskLayout)
}

/// Runs the full pipeline and returns centers in contour discovery order.
///
/// The order is a raster-scan artifact, not geometrically meaningful. A
/// uniform image legitimately yields an empty list; no well-formed buffer
/// is an error.
pub fn detect_centers(rgb: &RgbImage, config: &DetectConfig) -> Result<Vec<Point>, DetectionError> {
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }
    let w = width as usize;
    let h = height as usize;

    let gray = grayscale(rgb)?;
    let gray_pixels = gray.as_raw();

    // Lower global contrast gets a stronger clip limit. The 40/80 bands
    // are heuristic, carried over from observed behavior.
    let enhanced = if config.use_clahe {
        let contrast = features::extract(&gray).contrast;
        clahe::equalize(
            gray_pixels,
            w,
            h,
            config.clahe_tiles,
            clahe::clip_limit_for(contrast),
        )
    } else {
        gray_pixels.clone()
    };

    let otsu = threshold::otsu_level(&enhanced);
    let size = ImageSize {
        width: w,
        height: h,
    };
    let enhanced_img = CpuImage::<u8, 1>::new(size, enhanced.clone(), CpuAllocator)?;
    let mut binary = CpuImage::<u8, 1>::from_size_val(size, 0u8, CpuAllocator)?;
    imgproc::threshold::threshold_binary(&enhanced_img, &mut binary, otsu, 255)?;

    let mut mask = binary.as_slice().to_vec();
    threshold::resolve_polarity(&enhanced, &mut mask, config.polarity);

    // Structuring element scales with resolution, floor of 3, forced odd.
    let kernel_side = (w.min(h) / 300).max(3) | 1;
    let mut cleaned = mask;
    for _ in 0..config.opening_iterations {
        cleaned = morphology::open(&cleaned, w, h, kernel_side);
    }

    // The flood runs over the unenhanced grayscale: contrast enhancement
    // helps thresholding but would reshape the relief the basins grow on.
    if config.use_watershed {
        watershed::split_touching(
            &mut cleaned,
            gray_pixels,
            w,
            h,
            config.seed_fraction.clamp(0.4, 0.7),
            kernel_side,
        );
    }

    contours::contour_centroids(&cleaned, width, height, config.min_area)
}

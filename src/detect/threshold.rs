//! Otsu threshold selection and foreground polarity resolution.

use super::Polarity;

/// Between-class-variance-maximizing threshold over the 256-bin histogram.
pub fn otsu_level(pixels: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &v in pixels {
        histogram[v as usize] += 1;
    }
    let total = pixels.len() as f64;
    if total == 0.0 {
        return 128;
    }
    let sum_total = histogram
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum::<f64>();

    let mut sum_b = 0f64;
    let mut weight_b = 0f64;
    let mut max_variance = f64::MIN;
    let mut level = 128u8;
    for (v, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }
        sum_b += v as f64 * count as f64;
        let mean_b = sum_b / weight_b;
        let mean_f = (sum_total - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);
        if variance > max_variance {
            max_variance = variance;
            level = v as u8;
        }
    }
    level
}

/// Fixes which class is foreground in the raw threshold mask.
///
/// The raw mask marks the bright class. `Auto` compares mean intensity
/// inside vs. outside and inverts when the inside is brighter, so nuclei
/// are assumed to be the darker class. Best effort only: low-contrast or
/// inverted-stain images can misclassify, hence the explicit overrides.
pub fn resolve_polarity(gray: &[u8], mask: &mut [u8], polarity: Polarity) {
    match polarity {
        Polarity::Bright => {}
        Polarity::Dark => invert(mask),
        Polarity::Auto => {
            let mut inside_sum = 0u64;
            let mut inside_count = 0u64;
            let mut outside_sum = 0u64;
            let mut outside_count = 0u64;
            for (i, &m) in mask.iter().enumerate() {
                if m != 0 {
                    inside_sum += gray[i] as u64;
                    inside_count += 1;
                } else {
                    outside_sum += gray[i] as u64;
                    outside_count += 1;
                }
            }
            if inside_count == 0 {
                return;
            }
            if outside_count == 0 {
                // The threshold separated nothing (uniform image); there
                // is no minority class to call foreground.
                invert(mask);
                return;
            }
            let inside_mean = inside_sum as f64 / inside_count as f64;
            let outside_mean = outside_sum as f64 / outside_count as f64;
            if inside_mean > outside_mean {
                invert(mask);
            }
        }
    }
}

fn invert(mask: &mut [u8]) {
    for px in mask.iter_mut() {
        *px = if *px == 0 { 255 } else { 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_separates_bimodal() {
        let mut pixels = vec![30u8; 500];
        pixels.extend(vec![220u8; 500]);
        let level = otsu_level(&pixels);
        assert!(level >= 30 && level < 220);
    }

    #[test]
    fn auto_polarity_picks_darker_class() {
        // Dark blob (value 10) on bright background (240); raw mask marks
        // the bright background, auto flips it.
        let gray = vec![240, 240, 10, 240];
        let mut mask = vec![255, 255, 0, 255];
        resolve_polarity(&gray, &mut mask, Polarity::Auto);
        assert_eq!(mask, vec![0, 0, 255, 0]);
    }

    #[test]
    fn explicit_bright_keeps_raw_mask() {
        let gray = vec![240, 10];
        let mut mask = vec![255, 0];
        resolve_polarity(&gray, &mut mask, Polarity::Bright);
        assert_eq!(mask, vec![255, 0]);
    }
}

//! Contrast-limited adaptive histogram equalization over an 8-bit plane.

/// Clip strength from global contrast, three discrete bands.
pub fn clip_limit_for(contrast: f64) -> f32 {
    if contrast < 40.0 {
        4.0
    } else if contrast < 80.0 {
        2.0
    } else {
        1.5
    }
}

/// Equalizes `pixels` over a `tiles × tiles` grid with the given clip
/// limit, bilinearly interpolating between neighboring tile mappings.
pub fn equalize(
    pixels: &[u8],
    width: usize,
    height: usize,
    tiles: usize,
    clip_limit: f32,
) -> Vec<u8> {
    if width == 0 || height == 0 || pixels.len() != width * height {
        return pixels.to_vec();
    }
    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    // Recomputed from the tile size: ceil division can otherwise leave
    // trailing tiles empty on small images, and an empty tile's all-zero
    // mapping would bleed into the border interpolation.
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    // One clipped-CDF lookup table per tile.
    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut histogram = [0u32; 256];
            for y in y0..y1 {
                let row = &pixels[y * width + x0..y * width + x1];
                for &v in row {
                    histogram[v as usize] += 1;
                }
            }
            let count = ((x1 - x0) * (y1 - y0)) as u32;
            luts[ty * tiles_x + tx] = clipped_cdf_lut(&mut histogram, count, clip_limit);
        }
    }

    let mut out = vec![0u8; pixels.len()];
    for y in 0..height {
        // Position relative to tile centers.
        // Clamped at zero so border pixels take the edge tile outright.
        let fy = ((y as f32 + 0.5) / tile_h as f32 - 0.5).max(0.0);
        let ty0 = (fy.floor() as usize).min(tiles_y - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = fy - fy.floor();

        for x in 0..width {
            let fx = ((x as f32 + 0.5) / tile_w as f32 - 0.5).max(0.0);
            let tx0 = (fx.floor() as usize).min(tiles_x - 1);
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = fx - fx.floor();

            let v = pixels[y * width + x] as usize;
            let tl = luts[ty0 * tiles_x + tx0][v] as f32;
            let tr = luts[ty0 * tiles_x + tx1][v] as f32;
            let bl = luts[ty1 * tiles_x + tx0][v] as f32;
            let br = luts[ty1 * tiles_x + tx1][v] as f32;
            let top = tl + (tr - tl) * wx;
            let bottom = bl + (br - bl) * wx;
            out[y * width + x] = (top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn clipped_cdf_lut(histogram: &mut [u32; 256], count: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if count == 0 {
        return lut;
    }
    // Clip each bin at clip_limit times the uniform bin height and spread
    // the excess evenly.
    let limit = ((clip_limit * count as f32 / 256.0).round() as u32).max(1);
    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let bump = excess / 256;
    let mut remainder = excess % 256;
    for bin in histogram.iter_mut() {
        *bin += bump;
        if remainder > 0 {
            *bin += 1;
            remainder -= 1;
        }
    }

    let mut cumulative = 0u64;
    for (v, &bin) in histogram.iter().enumerate() {
        cumulative += bin as u64;
        lut[v] = ((cumulative * 255) / count as u64).min(255) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_bands() {
        assert_eq!(clip_limit_for(10.0), 4.0);
        assert_eq!(clip_limit_for(40.0), 2.0);
        assert_eq!(clip_limit_for(79.9), 2.0);
        assert_eq!(clip_limit_for(80.0), 1.5);
    }

    #[test]
    fn uniform_plane_stays_flat() {
        let pixels = vec![180u8; 64 * 64];
        let out = equalize(&pixels, 64, 64, 8, 4.0);
        // All tiles share the same mapping, so the plane stays uniform.
        let first = out[0];
        assert!(out.iter().all(|&v| v == first));
    }

    #[test]
    fn small_image_has_no_empty_tiles() {
        // 10px wide with an 8-tile request: ceil division would make the
        // trailing tiles empty and drag border pixels toward zero.
        let pixels = vec![100u8; 10 * 10];
        let out = equalize(&pixels, 10, 10, 8, 2.0);
        let first = out[0];
        assert!(out.iter().all(|&v| v == first), "border darkened: {out:?}");
    }

    #[test]
    fn dark_and_bright_stay_ordered() {
        let mut pixels = vec![200u8; 32 * 32];
        for i in 0..64 {
            pixels[i] = 20;
        }
        let out = equalize(&pixels, 32, 32, 4, 2.0);
        for (i, &v) in out.iter().enumerate() {
            if pixels[i] == 20 {
                assert!(v < out[32 * 32 - 1]);
            }
        }
    }
}

//! Binary morphology over a flat mask slice (non-zero = foreground).

/// Erosion with a square structuring element of odd side `side`. Pixels
/// whose neighborhood reaches outside the image erode away, as if the
/// border were background.
pub fn erode(mask: &[u8], width: usize, height: usize, side: usize) -> Vec<u8> {
    let radius = (side / 2) as isize;
    let mut out = vec![0u8; mask.len()];
    for y in 0..height as isize {
        'pixel: for x in 0..width as isize {
            let idx = y as usize * width + x as usize;
            if mask[idx] == 0 {
                continue;
            }
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue 'pixel;
                    }
                    if mask[ny as usize * width + nx as usize] == 0 {
                        continue 'pixel;
                    }
                }
            }
            out[idx] = 255;
        }
    }
    out
}

/// Dilation with the same square element; out-of-bounds taps are ignored.
pub fn dilate(mask: &[u8], width: usize, height: usize, side: usize) -> Vec<u8> {
    let radius = (side / 2) as isize;
    let mut out = vec![0u8; mask.len()];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let idx = y as usize * width + x as usize;
            if mask[idx] == 0 {
                continue;
            }
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    out[ny as usize * width + nx as usize] = 255;
                }
            }
        }
    }
    out
}

/// Opening (erosion then dilation) removes speckle smaller than the
/// structuring element without shrinking surviving blobs.
pub fn open(mask: &[u8], width: usize, height: usize, side: usize) -> Vec<u8> {
    dilate(&erode(mask, width, height, side), width, height, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(width: usize, height: usize, x0: usize, y0: usize, size: usize) -> Vec<u8> {
        let mut mask = vec![0u8; width * height];
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                mask[y * width + x] = 255;
            }
        }
        mask
    }

    #[test]
    fn opening_removes_single_pixel_speckle() {
        let mut mask = vec![0u8; 20 * 20];
        mask[5 * 20 + 5] = 255;
        let opened = open(&mask, 20, 20, 3);
        assert!(opened.iter().all(|&v| v == 0));
    }

    #[test]
    fn opening_keeps_large_square() {
        let mask = square_mask(30, 30, 10, 10, 8);
        let opened = open(&mask, 30, 30, 3);
        let kept = opened.iter().filter(|&&v| v != 0).count();
        // Interior survives; only the rim can change.
        assert!(kept >= 36);
        assert!(opened[15 * 30 + 15] != 0);
    }

    #[test]
    fn dilate_grows_by_radius() {
        let mut mask = vec![0u8; 9 * 9];
        mask[4 * 9 + 4] = 255;
        let dilated = dilate(&mask, 9, 9, 3);
        assert_eq!(dilated.iter().filter(|&&v| v != 0).count(), 9);
    }
}

//! Marker-based watershed splitting of touching blobs.
//!
//! Seeds come from the distance-transform cores of the cleaned mask, the
//! certain background from a dilated copy, and a Meyer-style priority
//! flood over the original grayscale assigns the undecided band. Ridge
//! pixels, where two basins meet, are erased from the mask so touching
//! nuclei separate into distinct contours.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use super::morphology;

const SQRT2: f32 = std::f32::consts::SQRT_2;

const UNDECIDED: u32 = 0;
const BACKGROUND: u32 = 1;
const RIDGE: u32 = u32::MAX;

// 8-connectivity throughout: basins grown this way are never diagonally
// adjacent to a different basin, so erasing the ridge really disconnects
// the touching blobs for the (8-connected) contour tracer.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub fn split_touching(
    mask: &mut [u8],
    elevation: &[u8],
    width: usize,
    height: usize,
    seed_fraction: f32,
    kernel_side: usize,
) {
    if mask.is_empty() {
        return;
    }
    let dist = distance_transform(mask, width, height);
    let max_dist = dist
        .iter()
        .filter(|d| d.is_finite())
        .fold(0.0f32, |a, &b| a.max(b));
    if max_dist <= 0.0 {
        return;
    }
    let seed_level = seed_fraction * max_dist;

    let mut sure_bg = mask.to_vec();
    for _ in 0..3 {
        sure_bg = morphology::dilate(&sure_bg, width, height, kernel_side);
    }

    // 1 = certain background, 2.. = seed components, 0 = undecided band.
    let mut markers = vec![UNDECIDED; mask.len()];
    for (i, marker) in markers.iter_mut().enumerate() {
        if sure_bg[i] == 0 {
            *marker = BACKGROUND;
        }
    }
    let seeds: Vec<bool> = dist
        .iter()
        .map(|&d| d.is_finite() && d > seed_level)
        .collect();
    let seed_labels = label_seed_components(&seeds, &mut markers, width, height);
    if seed_labels == 0 {
        return;
    }

    flood(&mut markers, elevation, width, height);

    for (i, &marker) in markers.iter().enumerate() {
        if marker == RIDGE {
            mask[i] = 0;
        }
    }
}

/// Two-pass chamfer distance to the nearest background pixel. Foreground
/// with no background anywhere in the image stays infinite.
pub fn distance_transform(mask: &[u8], width: usize, height: usize) -> Vec<f32> {
    let mut dist: Vec<f32> = mask
        .iter()
        .map(|&m| if m != 0 { f32::INFINITY } else { 0.0 })
        .collect();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if dist[idx] == 0.0 {
                continue;
            }
            let mut d = dist[idx];
            if x > 0 {
                d = d.min(dist[idx - 1] + 1.0);
            }
            if y > 0 {
                d = d.min(dist[idx - width] + 1.0);
                if x > 0 {
                    d = d.min(dist[idx - width - 1] + SQRT2);
                }
                if x + 1 < width {
                    d = d.min(dist[idx - width + 1] + SQRT2);
                }
            }
            dist[idx] = d;
        }
    }
    for y in (0..height).rev() {
        for x in (0..width).rev() {
            let idx = y * width + x;
            if dist[idx] == 0.0 {
                continue;
            }
            let mut d = dist[idx];
            if x + 1 < width {
                d = d.min(dist[idx + 1] + 1.0);
            }
            if y + 1 < height {
                d = d.min(dist[idx + width] + 1.0);
                if x + 1 < width {
                    d = d.min(dist[idx + width + 1] + SQRT2);
                }
                if x > 0 {
                    d = d.min(dist[idx + width - 1] + SQRT2);
                }
            }
            dist[idx] = d;
        }
    }
    dist
}

/// BFS-labels connected seed regions with 2, 3, ... and returns how many
/// components were found.
fn label_seed_components(
    seeds: &[bool],
    markers: &mut [u32],
    width: usize,
    height: usize,
) -> u32 {
    let mut next_label = 2u32;
    for start in 0..seeds.len() {
        if !seeds[start] || markers[start] >= 2 {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        markers[start] = next_label;
        while let Some(idx) = queue.pop_front() {
            let y = idx / width;
            let x = idx % width;
            for (dx, dy) in NEIGHBORS {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let next = ny as usize * width + nx as usize;
                if seeds[next] && markers[next] < 2 {
                    markers[next] = next_label;
                    queue.push_back(next);
                }
            }
        }
        next_label += 1;
    }
    next_label - 2
}

/// Meyer flood: undecided pixels are claimed lowest-elevation-first by the
/// adjacent basin; pixels reached by two basins become ridge.
fn flood(markers: &mut [u32], elevation: &[u8], width: usize, height: usize) {
    let mut heap: BinaryHeap<Reverse<(u8, u64, usize)>> = BinaryHeap::new();
    let mut queued = vec![false; markers.len()];
    let mut sequence = 0u64;

    let mut push = |heap: &mut BinaryHeap<Reverse<(u8, u64, usize)>>,
                    queued: &mut [bool],
                    sequence: &mut u64,
                    idx: usize| {
        if !queued[idx] {
            queued[idx] = true;
            *sequence += 1;
            heap.push(Reverse((elevation[idx], *sequence, idx)));
        }
    };

    for idx in 0..markers.len() {
        if markers[idx] == UNDECIDED {
            continue;
        }
        let y = idx / width;
        let x = idx % width;
        for (dx, dy) in NEIGHBORS {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                continue;
            }
            let next = ny as usize * width + nx as usize;
            if markers[next] == UNDECIDED {
                push(&mut heap, &mut queued, &mut sequence, next);
            }
        }
    }

    while let Some(Reverse((_, _, idx))) = heap.pop() {
        if markers[idx] != UNDECIDED {
            continue;
        }
        let y = idx / width;
        let x = idx % width;
        let mut claim = UNDECIDED;
        let mut contested = false;
        for (dx, dy) in NEIGHBORS {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                continue;
            }
            let label = markers[ny as usize * width + nx as usize];
            if label == UNDECIDED || label == RIDGE {
                continue;
            }
            if claim == UNDECIDED {
                claim = label;
            } else if claim != label {
                contested = true;
            }
        }
        if contested {
            markers[idx] = RIDGE;
            continue;
        }
        if claim == UNDECIDED {
            // All labeled neighbors turned to ridge; leave the pixel be.
            continue;
        }
        markers[idx] = claim;
        for (dx, dy) in NEIGHBORS {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                continue;
            }
            let next = ny as usize * width + nx as usize;
            if markers[next] == UNDECIDED {
                push(&mut heap, &mut queued, &mut sequence, next);
            }
        }
    }
}

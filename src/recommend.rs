//! k-nearest-neighbor parameter recommendation over the append-only
//! parameter corpus.

use std::path::PathBuf;

use crate::features::FeatureVector;
use crate::store::{JsonStore, StagedWrite, StoreError};
use crate::types::{ParamRecord, PartialParams, Rgb8};

/// Default neighbor count for [`suggest`].
pub const DEFAULT_K: usize = 3;

/// Scalar dissimilarity between two feature vectors; lower is more
/// similar. The terms mix intensity units and pixels and are deliberately
/// unnormalized: the weighting is carried over from observed behavior and
/// remains an open calibration question.
pub fn dissimilarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let (ha, wa) = a.shape;
    let (hb, wb) = b.shape;
    (a.contrast - b.contrast).abs()
        + (a.mean_intensity - b.mean_intensity).abs()
        + ((ha as f64 - hb as f64).abs() + (wa as f64 - wb as f64).abs()) / 1000.0
}

/// Averages the parameters of the `k` records most similar to `features`.
///
/// Returns `None` on an empty corpus (callers fall back to defaults).
/// Numeric fields are the rounded mean over the neighbors that define
/// them; fields absent from every neighbor stay absent. `color` is the
/// most frequent value among the neighbors, ties broken by ascending
/// score order.
pub fn suggest(
    records: &[ParamRecord],
    features: &FeatureVector,
    k: usize,
) -> Option<PartialParams> {
    if records.is_empty() || k == 0 {
        return None;
    }
    let mut scored: Vec<(f64, &ParamRecord)> = records
        .iter()
        .map(|r| (dissimilarity(features, &r.features), r))
        .collect();
    // Stable sort keeps insertion order among equal scores.
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(k);
    let neighbors: Vec<&ParamRecord> = scored.into_iter().map(|(_, r)| r).collect();

    Some(PartialParams {
        min_area: rounded_mean(&neighbors, |p| p.min_area),
        marker_radius: rounded_mean(&neighbors, |p| p.marker_radius),
        line_thickness: rounded_mean(&neighbors, |p| p.line_thickness),
        color: modal_color(&neighbors),
    })
}

fn rounded_mean(
    neighbors: &[&ParamRecord],
    field: impl Fn(&PartialParams) -> Option<u32>,
) -> Option<u32> {
    let values: Vec<u32> = neighbors.iter().filter_map(|r| field(&r.params)).collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Some((sum / values.len() as f64).round() as u32)
}

fn modal_color(neighbors: &[&ParamRecord]) -> Option<Rgb8> {
    let mut tally: Vec<(Rgb8, usize)> = Vec::new();
    for record in neighbors {
        let Some(color) = record.params.color else {
            continue;
        };
        match tally.iter_mut().find(|(c, _)| *c == color) {
            Some((_, n)) => *n += 1,
            None => tally.push((color, 1)),
        }
    }
    // First-encountered wins a tie; tally order follows neighbor order,
    // which is ascending score.
    let mut best: Option<(Rgb8, usize)> = None;
    for (color, count) in tally {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((color, count)),
        }
    }
    best.map(|(color, _)| color)
}

/// The parameter corpus on disk, paired with the recommender.
pub struct ParamStore {
    store: JsonStore<ParamRecord>,
}

impl ParamStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::open(path),
        }
    }

    pub fn load(&self) -> Result<Vec<ParamRecord>, StoreError> {
        self.store.load()
    }

    pub fn suggest(
        &self,
        features: &FeatureVector,
        k: usize,
    ) -> Result<Option<PartialParams>, StoreError> {
        let records = self.store.load()?;
        Ok(suggest(&records, features, k))
    }

    pub fn append(&self, record: ParamRecord) -> Result<(), StoreError> {
        self.store.append(record)
    }

    pub(crate) fn stage(&self, record: ParamRecord) -> Result<StagedWrite<'_>, StoreError> {
        self.store.stage(record)
    }
}

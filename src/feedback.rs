//! Persists a corrected result: one record into the feedback log, one into
//! the parameter-recommendation corpus.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::recommend::ParamStore;
use crate::store::{JsonStore, StoreError};
use crate::types::{DetectionParameters, ParamRecord, PartialParams, Point, RecordMeta};

/// One committed correction. `orig_shape` is `[height, width]`,
/// `timestamp` a Unix epoch float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: f64,
    pub image_name: String,
    pub orig_shape: (u32, u32),
    pub features: FeatureVector,
    pub params_used: DetectionParameters,
    pub auto_count: usize,
    pub added_count: usize,
    pub removed_count: usize,
    pub final_count: usize,
    pub added_points: Vec<Point>,
    pub removed_points: Vec<Point>,
    pub final_points: Vec<Point>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

/// Everything the front end hands over on an explicit save action.
pub struct Correction<'a> {
    pub image_name: &'a str,
    pub features: FeatureVector,
    pub params_used: DetectionParameters,
    pub auto_points: &'a [Point],
    pub added_points: &'a [Point],
    pub removed_points: &'a [Point],
    pub final_points: &'a [Point],
    pub label: &'a str,
}

/// The pair of stores updated together on save. This is the only mutation
/// of process-wide state, and it happens exactly once per save action.
pub struct FeedbackSink {
    feedback: JsonStore<FeedbackRecord>,
    params: ParamStore,
}

impl FeedbackSink {
    pub fn open(feedback_path: impl Into<PathBuf>, params_path: impl Into<PathBuf>) -> Self {
        Self {
            feedback: JsonStore::open(feedback_path),
            params: ParamStore::open(params_path),
        }
    }

    pub fn params_store(&self) -> &ParamStore {
        &self.params
    }

    pub fn feedback_log(&self) -> &JsonStore<FeedbackRecord> {
        &self.feedback
    }

    /// Appends one record to each store.
    ///
    /// Both rewrites are staged to temp files before either rename, so a
    /// failure while loading or serializing leaves both stores untouched.
    /// Each stage holds its store's writer lock until committed, which
    /// serializes this against concurrent appends on either store. A crash
    /// between the two renames can still leave the feedback log one record
    /// ahead of the corpus; that residual window is accepted for the
    /// single-user model. Existing records are never edited, deleted, or
    /// deduplicated.
    pub fn commit(&self, correction: &Correction<'_>) -> Result<FeedbackRecord, StoreError> {
        let record = FeedbackRecord {
            timestamp: unix_timestamp(),
            image_name: correction.image_name.to_string(),
            orig_shape: correction.features.shape,
            features: correction.features,
            params_used: correction.params_used.clone(),
            auto_count: correction.auto_points.len(),
            added_count: correction.added_points.len(),
            removed_count: correction.removed_points.len(),
            final_count: correction.final_points.len(),
            added_points: correction.added_points.to_vec(),
            removed_points: correction.removed_points.to_vec(),
            final_points: correction.final_points.to_vec(),
            label: correction.label.to_string(),
        };
        let param_record = ParamRecord {
            features: correction.features,
            params: PartialParams::from(&correction.params_used),
            meta: RecordMeta {
                auto_count: record.auto_count,
                final_count: record.final_count,
            },
        };

        let staged_feedback = self.feedback.stage(record.clone())?;
        let staged_params = match self.params.stage(param_record) {
            Ok(staged) => staged,
            Err(err) => {
                staged_feedback.discard();
                return Err(err);
            }
        };
        if let Err(err) = staged_feedback.commit() {
            staged_params.discard();
            return Err(err);
        }
        staged_params.commit()?;
        Ok(record)
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

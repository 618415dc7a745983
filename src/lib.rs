//! Core pipeline of an interactive nucleus-counting tool.
//!
//! A microscopy image goes in; an automatic segmentation pipeline proposes
//! candidate nucleus centers; user add/remove clicks from a (possibly
//! display-scaled) canvas are re-projected and merged with the proposal
//! into a final point set; the correction can be exported as CSV and
//! recorded into two append-only stores, one of which seeds a
//! nearest-neighbor parameter recommender for visually similar images.
//!
//! The interactive front end itself (upload widget, sliders, canvases) is
//! an external collaborator: it feeds raw bytes and canvas JSON in and
//! takes point lists and overlays out.

pub mod detect;
pub mod export;
pub mod features;
pub mod feedback;
pub mod loader;
pub mod reconcile;
pub mod recommend;
pub mod render;
pub mod store;
pub mod types;

pub use detect::{DetectConfig, DetectionError, Polarity, detect_centers, grayscale};
pub use features::{FeatureVector, extract};
pub use feedback::{Correction, FeedbackRecord, FeedbackSink};
pub use loader::{LoadError, load_rgb};
pub use reconcile::{canvas_points, display_scale, reconcile};
pub use recommend::{ParamStore, suggest};
pub use types::{DetectionParameters, ParamRecord, PartialParams, Point};

// src/lib.rs
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod extractor;
pub mod features;
pub mod geometry;
pub mod landmarks;
pub mod mediapipe_bridge;
pub mod reference;
pub mod similarity;

pub use config::{GradingConfig, PassPolicy, Thresholds};
pub use error::{GradeError, Result};
pub use evaluation::{
    evaluate_sequence, evaluate_sequence_detailed, evaluate_static, grade_sequence, grade_static,
    Evaluation, SequenceReport,
};
pub use extractor::{extract_snapshot, FeatureExtractor};
pub use features::{AnswerSequence, FacialExpression, SignFeatureSnapshot};
pub use landmarks::{Landmark, LandmarkFrame, LandmarkKind, LandmarkSet, Side};
pub use reference::{DirectoryReferenceStore, InMemoryReferenceStore, ReferenceStore};

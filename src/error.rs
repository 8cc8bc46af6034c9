// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::landmarks::LandmarkKind;

#[derive(Debug, Error)]
pub enum GradeError {
    /// A landmark set was present but not of its kind's fixed length.
    #[error("{kind} landmark set has {actual} points, expected {expected}")]
    LandmarkCount {
        kind: LandmarkKind,
        expected: usize,
        actual: usize,
    },

    /// A landmark set sits in a frame slot meant for another kind.
    #[error("{slot} slot expects a {expected} landmark set, found a {found} set")]
    WrongKind {
        slot: &'static str,
        expected: LandmarkKind,
        found: LandmarkKind,
    },

    #[error("document does not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("no reference gesture available for lesson {lesson_id}")]
    NoReference { lesson_id: u64 },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid grading configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GradeError>;

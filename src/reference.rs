// src/reference.rs - Answer keys supplied by the reference-data collaborator
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{GradeError, Result};
use crate::features::{AnswerSequence, SignFeatureSnapshot};

/// Source of reference snapshots, addressed by lesson id.
///
/// `Ok(None)` means no reference is available for the lesson, which callers
/// must keep apart from a reference that exists but does not match.
pub trait ReferenceStore {
    fn answer_frames(&self, lesson_id: u64) -> Result<Option<AnswerSequence>>;

    /// Like `answer_frames`, but a missing or empty reference is an error.
    fn require(&self, lesson_id: u64) -> Result<AnswerSequence> {
        match self.answer_frames(lesson_id)? {
            Some(frames) if !frames.is_empty() => Ok(frames),
            _ => Err(GradeError::NoReference { lesson_id }),
        }
    }
}

/// A lesson file holds one snapshot (static sign) or a list (dynamic sign).
#[derive(Deserialize)]
#[serde(untagged)]
enum LessonDocument {
    Sequence(Vec<SignFeatureSnapshot>),
    Single(Box<SignFeatureSnapshot>),
}

impl LessonDocument {
    fn into_frames(self) -> AnswerSequence {
        match self {
            LessonDocument::Sequence(frames) => frames,
            LessonDocument::Single(frame) => vec![*frame],
        }
    }
}

/// Parses a lesson document. Untagged parsing hides the failing key, so on
/// failure the single-snapshot parse is repeated to surface its error.
pub fn parse_answer_frames(json: &str) -> Result<AnswerSequence> {
    match serde_json::from_str::<LessonDocument>(json) {
        Ok(document) => Ok(document.into_frames()),
        Err(_) if json.trim_start().starts_with('[') => {
            Ok(serde_json::from_str::<Vec<SignFeatureSnapshot>>(json)?)
        }
        Err(_) => Ok(vec![SignFeatureSnapshot::from_json(json)?]),
    }
}

/// Reads `<root>/<lesson_id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryReferenceStore {
    root: PathBuf,
}

impl DirectoryReferenceStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn lesson_path(&self, lesson_id: u64) -> PathBuf {
        self.root.join(format!("{}.json", lesson_id))
    }
}

impl ReferenceStore for DirectoryReferenceStore {
    fn answer_frames(&self, lesson_id: u64) -> Result<Option<AnswerSequence>> {
        let path = self.lesson_path(lesson_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(GradeError::Io { path, source }),
        };

        let frames = parse_answer_frames(&content)?;
        info!("Loaded {} reference frame(s) for lesson {}", frames.len(), lesson_id);
        Ok(Some(frames))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    lessons: HashMap<u64, AnswerSequence>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lesson_id: u64, frames: AnswerSequence) {
        self.lessons.insert(lesson_id, frames);
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn answer_frames(&self, lesson_id: u64) -> Result<Option<AnswerSequence>> {
        Ok(self.lessons.get(&lesson_id).cloned())
    }
}

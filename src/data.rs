// src/data.rs - Session export of grading results
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::evaluation::{Evaluation, FrameScore, SequenceReport};

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: usize,
    score: f64,
    total_features: usize,
    mismatched_features: usize,
    worst: bool,
}

pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
    frames: Vec<FrameScore>,
    evaluation: Option<Evaluation>,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            frames: Vec::new(),
            evaluation: None,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_report(&mut self, report: &SequenceReport) {
        self.frames = report.frames.clone();
        self.evaluation = Some(report.evaluation.clone());
    }

    pub fn add_evaluation(&mut self, evaluation: &Evaluation) {
        self.frames.clear();
        self.evaluation = Some(evaluation.clone());
    }

    /// Writes one row per graded frame to `frame_scores.csv`.
    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("frame_scores.csv");
        fs::create_dir_all(self.session_dir())
            .with_context(|| format!("Failed to create {}", self.session_dir().display()))?;

        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;
        let mut writer = Writer::from_writer(file);

        let worst = self.evaluation.as_ref().and_then(|e| e.worst_frame_idx);
        for frame in &self.frames {
            writer.serialize(FrameRecord {
                frame: frame.index,
                score: frame.score,
                total_features: frame.total,
                mismatched_features: frame.mismatched,
                worst: worst == Some(frame.index),
            })?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    /// Writes the evaluation, diff-log included, to `evaluation.json`.
    pub fn export_evaluation(&self) -> Result<PathBuf> {
        let evaluation = self
            .evaluation
            .as_ref()
            .context("No evaluation recorded for this session")?;

        let json_path = self.session_dir().join("evaluation.json");
        fs::create_dir_all(self.session_dir())?;
        fs::write(&json_path, serde_json::to_string_pretty(evaluation)?)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        Ok(json_path)
    }
}

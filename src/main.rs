// src/main.rs
mod args;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, Level};

use args::{Args, Command};
use sign_grader::data::SessionExporter;
use sign_grader::mediapipe_bridge::{frames_from_json, HolisticPayload};
use sign_grader::{
    evaluate_static, extract_snapshot, grade_sequence, grade_static, DirectoryReferenceStore,
    FacialExpression, GradeError, GradingConfig, LandmarkFrame, ReferenceStore, SignFeatureSnapshot,
};

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<GradeError>() {
                Some(GradeError::NoReference { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = GradingConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Extract { frame, expression, pad } => {
            let frame = read_frame(&frame, pad)?;
            let snapshot = extract_snapshot(&frame, parse_expression(expression), &config.thresholds)?;
            print_json(&snapshot)
        }
        Command::Grade {
            lesson,
            references,
            frame,
            expression,
            pad,
        } => {
            let reference = DirectoryReferenceStore::new(references).require(lesson)?;
            if reference.len() > 1 {
                info!("Lesson {} is dynamic, grading against its first frame", lesson);
            }
            let frame = read_frame(&frame, pad)?;
            let evaluation = grade_static(&frame, parse_expression(expression), &reference[0], &config)?;
            print_json(&evaluation)
        }
        Command::GradeSequence {
            lesson,
            references,
            frames,
            expression,
            pad,
            export,
        } => {
            let reference = DirectoryReferenceStore::new(references).require(lesson)?;
            let content = read(&frames)?;
            let frames = frames_from_json(&content, pad)?;
            let report = grade_sequence(&frames, parse_expression(expression), &reference, &config)?;

            if let Some(dir) = export {
                let mut exporter = SessionExporter::new(dir, None);
                exporter.add_report(&report);
                exporter.export_csv()?;
                exporter.export_evaluation()?;
                info!("Session exported to {}", exporter.session_dir().display());
            }
            print_json(&report.evaluation)
        }
        Command::Compare { reference, learner } => {
            let reference = SignFeatureSnapshot::from_json(&read(&reference)?)?;
            let learner = SignFeatureSnapshot::from_json(&read(&learner)?)?;
            print_json(&evaluate_static(&learner, &reference, &config.policy))
        }
    }
}

fn parse_expression(label: Option<String>) -> Option<FacialExpression> {
    label
        .filter(|label| !label.eq_ignore_ascii_case("none"))
        .map(|label| FacialExpression::from_label(&label))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_frame(path: &Path, pad: bool) -> Result<LandmarkFrame> {
    let payload = HolisticPayload::from_json(&read(path)?)?;
    let frame = if pad {
        payload.into_padded_frame()?
    } else {
        payload.into_frame()?
    };
    Ok(frame)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

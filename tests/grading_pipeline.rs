use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use sign_grader::mediapipe_bridge::{frames_from_json, HolisticPayload};
use sign_grader::{
    extract_snapshot, grade_sequence, grade_static, DirectoryReferenceStore, FacialExpression, GradeError,
    GradingConfig, InMemoryReferenceStore, ReferenceStore, Thresholds,
};

const FINGER_X: [f64; 4] = [0.40, 0.47, 0.54, 0.61];

fn point(x: f64, y: f64) -> Value {
    json!({"x": x, "y": y, "z": 0.0})
}

fn open_hand() -> Vec<Value> {
    let mut points = vec![
        point(0.5, 0.8),
        point(0.45, 0.78),
        point(0.40, 0.75),
        point(0.35, 0.72),
        point(0.30, 0.70),
    ];
    for x in FINGER_X {
        for y in [0.70, 0.65, 0.60, 0.55] {
            points.push(point(x, y));
        }
    }
    points
}

fn fist() -> Vec<Value> {
    let mut points = open_hand();
    for (finger, x) in FINGER_X.iter().enumerate() {
        points[8 + finger * 4] = point(*x, 0.75);
    }
    points[4] = point(0.58, 0.70);
    points
}

fn payload(right_hand: Vec<Value>) -> String {
    json!({"rightHand": right_hand, "leftHand": null, "pose": [], "face": null}).to_string()
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sign_grader_it_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_learner_matching_reference_passes() {
    let config = GradingConfig::default();
    let frame = HolisticPayload::from_json(&payload(open_hand())).unwrap().into_frame().unwrap();
    let reference = extract_snapshot(&frame, Some(FacialExpression::Neutral), &config.thresholds).unwrap();

    let evaluation = grade_static(&frame, Some(FacialExpression::Neutral), &reference, &config).unwrap();
    assert_eq!(evaluation.score, 1.0);
    assert!(evaluation.is_correct);
    assert!(evaluation.wrong_parts().is_none());
}

#[test]
fn test_wrong_handshape_is_reported_under_right_hand() {
    let config = GradingConfig::default();
    let reference_frame = HolisticPayload::from_json(&payload(fist())).unwrap().into_frame().unwrap();
    let reference = extract_snapshot(&reference_frame, None, &config.thresholds).unwrap();

    let learner_frame = HolisticPayload::from_json(&payload(open_hand())).unwrap().into_frame().unwrap();
    let evaluation = grade_static(&learner_frame, None, &reference, &config).unwrap();

    assert!(evaluation.score < 1.0);
    assert!(!evaluation.is_correct);
    let wrong = evaluation.wrong_parts().unwrap();
    assert_eq!(wrong["right"]["handshape"]["finger_flexion"]["index_folded"], json!(true));
    assert!(!wrong.contains_key("left"));
}

#[test]
fn test_short_hand_needs_padding() {
    let mut points = open_hand();
    points.truncate(18);
    let raw = payload(points);

    let err = HolisticPayload::from_json(&raw).unwrap().into_frame().unwrap_err();
    assert!(matches!(err, GradeError::LandmarkCount { actual: 18, .. }));

    let frame = HolisticPayload::from_json(&raw).unwrap().into_padded_frame().unwrap();
    let snapshot = extract_snapshot(&frame, None, &Thresholds::default()).unwrap();
    assert!(snapshot.right.present);
}

#[test]
fn test_sequence_against_directory_reference() {
    let dir = scratch_dir();
    let config = GradingConfig::default();
    let store = DirectoryReferenceStore::new(&dir);

    let reference_frames = frames_from_json(
        &format!("[{}, {}, {}]", payload(open_hand()), payload(fist()), payload(open_hand())),
        false,
    )
    .unwrap();
    let reference: Vec<_> = reference_frames
        .iter()
        .map(|frame| extract_snapshot(frame, None, &config.thresholds).unwrap())
        .collect();
    fs::write(store.lesson_path(12), serde_json::to_string(&reference).unwrap()).unwrap();

    // learner holds an open hand throughout and adds a fourth frame
    let learner = frames_from_json(
        &format!(
            "[{}, {}, {}, {}]",
            payload(open_hand()),
            payload(open_hand()),
            payload(open_hand()),
            payload(fist())
        ),
        false,
    )
    .unwrap();

    let answer = store.require(12).unwrap();
    let report = grade_sequence(&learner, None, &answer, &config).unwrap();
    let evaluation = &report.evaluation;

    assert_eq!(evaluation.frames_compared, 3);
    assert_eq!(evaluation.frames_ignored, 1);
    assert_eq!(evaluation.worst_frame_idx, Some(1));
    assert!(!evaluation.is_correct);
    assert_eq!(report.frames[0].score, 1.0);
    assert_eq!(report.frames[2].score, 1.0);
    assert!(report.frames[1].score < 1.0);
    assert!(evaluation.diff_log.contains_key("right"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn test_missing_lesson_is_distinct_from_mismatch() {
    let store = InMemoryReferenceStore::new();
    assert!(matches!(store.require(99), Err(GradeError::NoReference { lesson_id: 99 })));
}

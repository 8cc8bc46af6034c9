// src/mediapipe_bridge.rs - Holistic landmark payload sent by the capture front end
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::landmarks::{Landmark, LandmarkFrame, LandmarkKind, LandmarkSet};

/// Raw MediaPipe Holistic output as JSON. Parts that were not detected are
/// `null`, missing, or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolisticPayload {
    #[serde(default, alias = "leftHand", alias = "left_hand")]
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, alias = "rightHand", alias = "right_hand")]
    pub right_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, alias = "pose")]
    pub pose_landmarks: Option<Vec<Landmark>>,
    #[serde(default, alias = "face")]
    pub face_landmarks: Option<Vec<Landmark>>,
}

impl HolisticPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a frame, rejecting any present part that is not exactly its
    /// kind's fixed length.
    pub fn into_frame(self) -> Result<LandmarkFrame> {
        self.build(false)
    }

    /// Producer-side variant: zero-pads short parts up to the fixed length
    /// before building the frame. Oversized parts are still rejected.
    pub fn into_padded_frame(self) -> Result<LandmarkFrame> {
        self.build(true)
    }

    fn build(self, pad: bool) -> Result<LandmarkFrame> {
        Ok(LandmarkFrame {
            left_hand: to_set(self.left_hand_landmarks, LandmarkKind::Hand, pad)?,
            right_hand: to_set(self.right_hand_landmarks, LandmarkKind::Hand, pad)?,
            pose: to_set(self.pose_landmarks, LandmarkKind::Pose, pad)?,
            face: to_set(self.face_landmarks, LandmarkKind::Face, pad)?,
        })
    }
}

fn to_set(points: Option<Vec<Landmark>>, kind: LandmarkKind, pad: bool) -> Result<Option<LandmarkSet>> {
    let mut points = match points {
        Some(points) if !points.is_empty() => points,
        _ => return Ok(None),
    };

    // Detected points without a confidence count as fully visible.
    for point in points.iter_mut().filter(|p| p.visibility.is_none()) {
        point.visibility = Some(1.0);
    }

    let expected = kind.expected_len();
    if pad && points.len() < expected {
        debug!("Zero-padding {} landmarks from {} to {}", kind, points.len(), expected);
        points.resize(
            expected,
            Landmark {
                visibility: Some(0.0),
                ..Landmark::default()
            },
        );
    }

    LandmarkSet::new(kind, points).map(Some)
}

/// Parses a JSON array of payloads, one per sampled instant of a clip.
pub fn frames_from_json(json: &str, pad: bool) -> Result<Vec<LandmarkFrame>> {
    let payloads: Vec<HolisticPayload> = serde_json::from_str(json)?;
    payloads
        .into_iter()
        .map(|payload| payload.build(pad))
        .collect()
}

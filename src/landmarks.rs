// src/landmarks.rs - Landmark sets as produced by the pose-estimation collaborator
use std::fmt;
use std::ops::Index;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{GradeError, Result};

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

// Pose and face mesh indices used for location
pub const POSE_LEFT_SHOULDER: usize = 11;
pub const POSE_RIGHT_SHOULDER: usize = 12;
pub const FACE_NOSE_TIP: usize = 1;
pub const FACE_CHIN: usize = 152;

/// One normalized, image-relative point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, visibility: None }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkKind {
    Hand,
    Pose,
    Face,
}

impl LandmarkKind {
    /// Fixed number of points every present set of this kind carries.
    pub const fn expected_len(self) -> usize {
        match self {
            LandmarkKind::Hand => 21,
            LandmarkKind::Pose => 33,
            LandmarkKind::Face => 468,
        }
    }
}

impl fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LandmarkKind::Hand => "hand",
            LandmarkKind::Pose => "pose",
            LandmarkKind::Face => "face",
        };
        f.write_str(name)
    }
}

/// A detected body part. Construction enforces the fixed length, so every
/// anatomical index used by the extractor is in bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    kind: LandmarkKind,
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(kind: LandmarkKind, points: Vec<Landmark>) -> Result<Self> {
        let expected = kind.expected_len();
        if points.len() != expected {
            return Err(GradeError::LandmarkCount {
                kind,
                expected,
                actual: points.len(),
            });
        }
        Ok(Self { kind, points })
    }

    pub fn kind(&self) -> LandmarkKind {
        self.kind
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn position(&self, index: usize) -> Vector3<f64> {
        self.points[index].position()
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.points[index]
    }
}

/// A single instant's detection result. Any part may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    pub left_hand: Option<LandmarkSet>,
    pub right_hand: Option<LandmarkSet>,
    pub pose: Option<LandmarkSet>,
    pub face: Option<LandmarkSet>,
}

impl LandmarkFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_left_hand(mut self, set: LandmarkSet) -> Result<Self> {
        self.left_hand = Some(expect_kind(set, "left hand", LandmarkKind::Hand)?);
        Ok(self)
    }

    pub fn with_right_hand(mut self, set: LandmarkSet) -> Result<Self> {
        self.right_hand = Some(expect_kind(set, "right hand", LandmarkKind::Hand)?);
        Ok(self)
    }

    pub fn with_pose(mut self, set: LandmarkSet) -> Result<Self> {
        self.pose = Some(expect_kind(set, "pose", LandmarkKind::Pose)?);
        Ok(self)
    }

    pub fn with_face(mut self, set: LandmarkSet) -> Result<Self> {
        self.face = Some(expect_kind(set, "face", LandmarkKind::Face)?);
        Ok(self)
    }

    /// Checks every present part sits in the slot for its kind. Lengths are
    /// already guaranteed by `LandmarkSet::new`.
    pub fn validate(&self) -> Result<()> {
        let slots = [
            (&self.left_hand, "left hand", LandmarkKind::Hand),
            (&self.right_hand, "right hand", LandmarkKind::Hand),
            (&self.pose, "pose", LandmarkKind::Pose),
            (&self.face, "face", LandmarkKind::Face),
        ];
        for (part, slot, kind) in slots {
            if let Some(set) = part {
                check_kind(set, slot, kind)?;
            }
        }
        Ok(())
    }

    pub fn hand(&self, side: Side) -> Option<&LandmarkSet> {
        match side {
            Side::Left => self.left_hand.as_ref(),
            Side::Right => self.right_hand.as_ref(),
        }
    }
}

fn expect_kind(set: LandmarkSet, slot: &'static str, kind: LandmarkKind) -> Result<LandmarkSet> {
    check_kind(&set, slot, kind)?;
    Ok(set)
}

fn check_kind(set: &LandmarkSet, slot: &'static str, kind: LandmarkKind) -> Result<()> {
    if set.kind == kind {
        Ok(())
    } else {
        Err(GradeError::WrongKind {
            slot,
            expected: kind,
            found: set.kind,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

// src/extractor.rs - Landmark geometry -> symbolic sign features
use tracing::debug;

use crate::config::Thresholds;
use crate::error::Result;
use crate::features::{
    FacialExpression, FingerContact, FingerFlexion, FingerRelation, FingerSelection, HandFeatureRecord,
    Handshape, InterHandRelation, Location, Orientation, SignFeatureSnapshot, ThumbConfiguration,
};
use crate::geometry::{distance, finger_direction, landmark_distance, palm_normal};
use crate::landmarks::{
    LandmarkFrame, LandmarkSet, Side, FACE_CHIN, FACE_NOSE_TIP, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_MCP, PINKY_PIP, PINKY_TIP, POSE_LEFT_SHOULDER, POSE_RIGHT_SHOULDER, RING_PIP, RING_TIP, THUMB_TIP,
    WRIST,
};

/// Deterministic, model-free feature extractor. Holds only its thresholds, so
/// one instance can serve any number of frames concurrently.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    thresholds: Thresholds,
}

impl FeatureExtractor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Builds the snapshot for one frame. Absent parts are valid input; a part
    /// in the wrong slot or of the wrong length is a schema error.
    pub fn extract(
        &self,
        frame: &LandmarkFrame,
        expression: Option<FacialExpression>,
    ) -> Result<SignFeatureSnapshot> {
        frame.validate()?;

        let left = self.analyze_hand(frame, Side::Left);
        let right = self.analyze_hand(frame, Side::Right);
        let inter_hand_relation = self.inter_hand_relation(frame.left_hand.as_ref(), frame.right_hand.as_ref());
        let finger_relation = self.finger_relation(frame.right_hand.as_ref().or(frame.left_hand.as_ref()));

        Ok(SignFeatureSnapshot {
            left,
            right,
            inter_hand_relation,
            finger_relation,
            facial_expression: expression,
        })
    }

    /// Features of one hand, or the canonical empty record if it was not detected.
    pub fn analyze_hand(&self, frame: &LandmarkFrame, side: Side) -> HandFeatureRecord {
        let Some(hand) = frame.hand(side) else {
            return HandFeatureRecord::absent();
        };
        debug!("{} hand detected", side.as_str());

        HandFeatureRecord {
            present: true,
            handshape: self.handshape(hand),
            orientation: self.orientation(hand, side),
            location: self.location(hand, frame.face.as_ref(), frame.pose.as_ref()),
        }
    }

    fn handshape(&self, hand: &LandmarkSet) -> Handshape {
        let t = &self.thresholds;

        // A finger is folded when its tip is closer to the wrist than its PIP joint.
        let folded = |pip: usize, tip: usize| {
            landmark_distance(hand, tip, WRIST) < landmark_distance(hand, pip, WRIST)
        };
        let thumb_folded = landmark_distance(hand, THUMB_TIP, PINKY_MCP) < t.thumb_fold_distance;
        let index_folded = folded(INDEX_PIP, INDEX_TIP);
        let middle_folded = folded(MIDDLE_PIP, MIDDLE_TIP);
        let ring_folded = folded(RING_PIP, RING_TIP);
        let pinky_folded = folded(PINKY_PIP, PINKY_TIP);

        let touching = |a: usize, b: usize| landmark_distance(hand, a, b) < t.fingertip_contact;
        let index_middle = touching(INDEX_TIP, MIDDLE_TIP);
        let middle_ring = touching(MIDDLE_TIP, RING_TIP);
        let ring_pinky = touching(RING_TIP, PINKY_TIP);

        Handshape {
            finger_selection: FingerSelection {
                thumb: !thumb_folded,
                index: !index_folded,
                middle: !middle_folded,
                ring: !ring_folded,
                pinky: !pinky_folded,
            },
            finger_flexion: FingerFlexion {
                thumb_extended: !thumb_folded,
                thumb_folded,
                index_extended: !index_folded,
                index_folded,
                middle_extended: !middle_folded,
                middle_folded,
                ring_extended: !ring_folded,
                ring_folded,
                pinky_extended: !pinky_folded,
                pinky_folded,
            },
            thumb_configuration: ThumbConfiguration {
                thumb_opposed: thumb_folded,
                thumb_crossing: false,
                thumb_contact_index: touching(THUMB_TIP, INDEX_TIP),
                thumb_contact_middle: touching(THUMB_TIP, MIDDLE_TIP),
                thumb_contact_ring: touching(THUMB_TIP, RING_TIP),
                thumb_contact_pinky: touching(THUMB_TIP, PINKY_TIP),
            },
            finger_contact: FingerContact {
                index_middle_contact: index_middle,
                middle_ring_contact: middle_ring,
                ring_pinky_contact: ring_pinky,
                all_fingers_spread: !(index_middle || middle_ring),
                all_fingers_closed: index_middle && middle_ring && ring_pinky,
            },
        }
    }

    fn orientation(&self, hand: &LandmarkSet, side: Side) -> Orientation {
        let axis = self.thresholds.orientation_axis;
        let normal = palm_normal(hand, side);
        let pointing = finger_direction(hand);

        // Image y grows downwards and z grows away from the camera.
        // Left/right facing and wrist rotation are not recoverable from these
        // two edges and stay at their neutral defaults.
        Orientation {
            palm_up: normal.y < -axis,
            palm_down: normal.y > axis,
            palm_forward: normal.z < -axis,
            palm_backward: normal.z > axis,
            fingers_up: pointing.y < -axis,
            fingers_down: pointing.y > axis,
            fingers_forward: pointing.z < -axis,
            wrist_neutral: true,
            ..Orientation::default()
        }
    }

    fn location(&self, hand: &LandmarkSet, face: Option<&LandmarkSet>, pose: Option<&LandmarkSet>) -> Location {
        let t = &self.thresholds;
        let mut location = Location::default();
        // Depth alone is too noisy to judge distance from the body.
        location.spatial_distance.near = true;

        let (Some(face), Some(pose)) = (face, pose) else {
            return location;
        };

        let wrist = hand.position(WRIST);
        let chest_y = (pose[POSE_LEFT_SHOULDER].y + pose[POSE_RIGHT_SHOULDER].y) / 2.0;
        let nose_y = face[FACE_NOSE_TIP].y;

        let high = wrist.y < nose_y;
        let low = !high && wrist.y > chest_y;
        let at_chin = distance(&wrist, &face.position(FACE_CHIN)) < t.chin_proximity;
        let at_chest = (wrist.y - chest_y).abs() < t.chest_band;

        location.major.head = high;
        location.major.face = at_chin;
        location.major.torso = at_chest;
        location.face.chin = at_chin;
        location.torso.chest = at_chest;
        location.spatial_height.high = high;
        location.spatial_height.low = low;
        location.spatial_height.mid = !high && !low;
        location
    }

    pub fn inter_hand_relation(&self, left: Option<&LandmarkSet>, right: Option<&LandmarkSet>) -> InterHandRelation {
        let t = &self.thresholds;
        let (Some(left), Some(right)) = (left, right) else {
            return InterHandRelation::default();
        };

        let wrist_gap = distance(&left.position(WRIST), &right.position(WRIST));
        let tip_gap = distance(&left.position(INDEX_TIP), &right.position(INDEX_TIP));

        InterHandRelation {
            both_present: true,
            forming_single_shape: wrist_gap < t.single_shape_distance,
            // Handedness labels from the pose model already mirror the hands.
            mirrored_shape: true,
            hand_distance_close: wrist_gap < t.hand_distance_close,
            finger_tips_facing: tip_gap < t.finger_tips_facing,
        }
    }

    /// Index/middle crossing of a single hand; the caller picks which hand.
    pub fn finger_relation(&self, hand: Option<&LandmarkSet>) -> FingerRelation {
        let Some(hand) = hand else {
            return FingerRelation::default();
        };

        let gap = self.thresholds.crossing_gap;
        let index_tip = &hand[INDEX_TIP];
        let middle_tip = &hand[MIDDLE_TIP];
        let crossed = (index_tip.x - middle_tip.x).abs() < gap && (index_tip.y - middle_tip.y).abs() < gap;

        // Smaller z is closer to the camera, i.e. on top.
        FingerRelation {
            index_middle_crossed: crossed,
            index_over_middle: crossed && index_tip.z < middle_tip.z,
            middle_over_index: crossed && middle_tip.z < index_tip.z,
        }
    }
}

/// One-shot extraction with explicit thresholds.
pub fn extract_snapshot(
    frame: &LandmarkFrame,
    expression: Option<FacialExpression>,
    thresholds: &Thresholds,
) -> Result<SignFeatureSnapshot> {
    FeatureExtractor::new(thresholds.clone()).extract(frame, expression)
}

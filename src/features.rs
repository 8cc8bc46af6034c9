// src/features.rs - Fixed-shape symbolic description of a sign at one instant
use std::borrow::Cow;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::similarity::{diff_leaf, DiffLog, FeatureNode, FeatureRecord, Leaf, Tally};

// Declares a record and wires every field into the lock-step comparison, in
// declaration order.
macro_rules! feature_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty ),*
        }

        impl FeatureRecord for $name {
            fn diff_record(&self, learner: &Self, tally: &mut Tally) -> DiffLog {
                let mut log = DiffLog::new();
                $(
                    if let Some(diff) = FeatureNode::diff(&self.$field, &learner.$field, tally) {
                        log.insert(stringify!($field).to_string(), diff);
                    }
                )*
                log
            }
        }

        impl FeatureNode for $name {
            fn leaf_count(&self) -> usize {
                0 $( + FeatureNode::leaf_count(&self.$field) )*
            }

            fn diff(&self, learner: &Self, tally: &mut Tally) -> Option<Value> {
                let log = self.diff_record(learner, tally);
                if log.is_empty() {
                    None
                } else {
                    Some(Value::Object(log))
                }
            }

            fn expected(&self) -> Value {
                let mut map = DiffLog::new();
                $(
                    map.insert(stringify!($field).to_string(), FeatureNode::expected(&self.$field));
                )*
                Value::Object(map)
            }
        }
    };
}

// A record made only of boolean flags. Flags also accept "true"/"false" text
// so answer keys written by other tools load unchanged.
macro_rules! flag_group {
    ( $(#[$meta:meta])* pub struct $name:ident { $( $field:ident ),* $(,)? } ) => {
        feature_record! {
            $(#[$meta])*
            pub struct $name {
                $( #[serde(deserialize_with = "lenient_bool")] pub $field: bool ),*
            }
        }
    };
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Text(String),
    }

    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(flag) => Ok(flag),
        RawFlag::Text(text) => match text.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!("expected a boolean flag, found {:?}", other))),
        },
    }
}

// ---------------------------------------------------------------------------
// Handshape
// ---------------------------------------------------------------------------

flag_group! {
    /// Which fingers are selected (extended).
    pub struct FingerSelection { thumb, index, middle, ring, pinky }
}

flag_group! {
    pub struct FingerFlexion {
        thumb_extended, thumb_folded,
        index_extended, index_folded,
        middle_extended, middle_folded,
        ring_extended, ring_folded,
        pinky_extended, pinky_folded,
    }
}

flag_group! {
    pub struct ThumbConfiguration {
        thumb_opposed,
        thumb_crossing,
        thumb_contact_index,
        thumb_contact_middle,
        thumb_contact_ring,
        thumb_contact_pinky,
    }
}

flag_group! {
    pub struct FingerContact {
        index_middle_contact,
        middle_ring_contact,
        ring_pinky_contact,
        all_fingers_spread,
        all_fingers_closed,
    }
}

feature_record! {
    pub struct Handshape {
        pub finger_selection: FingerSelection,
        pub finger_flexion: FingerFlexion,
        pub thumb_configuration: ThumbConfiguration,
        pub finger_contact: FingerContact,
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

flag_group! {
    /// Palm facing, finger pointing and wrist rotation.
    pub struct Orientation {
        palm_up, palm_down, palm_left, palm_right, palm_forward, palm_backward,
        fingers_up, fingers_down, fingers_left, fingers_right, fingers_forward, fingers_backward,
        wrist_pronated, wrist_supinated, wrist_neutral,
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

flag_group! {
    pub struct MajorLocation { head, face, neck, torso, arm, handspace }
}

flag_group! {
    pub struct FaceLocation { forehead, eye, nose, mouth, chin, cheek, ear }
}

flag_group! {
    pub struct TorsoLocation { chest, sternum, stomach, waist }
}

flag_group! {
    pub struct ArmLocation { upper_arm, forearm, wrist }
}

flag_group! {
    pub struct HandRelativeLocation { palm, back_of_hand }
}

flag_group! {
    pub struct SpatialHeight { high, mid, low }
}

flag_group! {
    pub struct SpatialDistance { contact, near, far }
}

feature_record! {
    pub struct Location {
        pub major: MajorLocation,
        pub face: FaceLocation,
        pub torso: TorsoLocation,
        pub arm: ArmLocation,
        pub hand_relative: HandRelativeLocation,
        pub spatial_height: SpatialHeight,
        pub spatial_distance: SpatialDistance,
    }
}

// ---------------------------------------------------------------------------
// Per hand, two-hand and snapshot records
// ---------------------------------------------------------------------------

feature_record! {
    /// Symbolic description of one hand. The `Default` value is the canonical
    /// record for an undetected hand: every flag false, `present` false.
    pub struct HandFeatureRecord {
        #[serde(deserialize_with = "lenient_bool")]
        pub present: bool,
        pub handshape: Handshape,
        pub orientation: Orientation,
        pub location: Location,
    }
}

impl HandFeatureRecord {
    pub fn absent() -> Self {
        Self::default()
    }
}

flag_group! {
    /// Proximity and symmetry of the two hands. All false unless both are present.
    pub struct InterHandRelation {
        both_present,
        forming_single_shape,
        mirrored_shape,
        hand_distance_close,
        finger_tips_facing,
    }
}

flag_group! {
    /// Index/middle fingertip crossing on one hand.
    pub struct FingerRelation {
        index_middle_crossed,
        index_over_middle,
        middle_over_index,
    }
}

/// Label from an external facial-expression classifier. Stored labels load
/// through [`FacialExpression::from_label`], so any casing is accepted and the
/// classifier's `Unknown`/`Error` markers load as `Uncertain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum FacialExpression {
    Curious,
    Positive,
    Negative,
    Neutral,
    /// The classifier could not decide.
    Uncertain,
}

impl FacialExpression {
    pub fn as_str(self) -> &'static str {
        match self {
            FacialExpression::Curious => "Curious",
            FacialExpression::Positive => "Positive",
            FacialExpression::Negative => "Negative",
            FacialExpression::Neutral => "Neutral",
            FacialExpression::Uncertain => "Uncertain",
        }
    }

    /// Case-insensitive parse of a classifier label. Anything outside the
    /// closed set maps to `Uncertain`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "curious" => FacialExpression::Curious,
            "positive" => FacialExpression::Positive,
            "negative" => FacialExpression::Negative,
            "neutral" => FacialExpression::Neutral,
            _ => FacialExpression::Uncertain,
        }
    }
}

impl From<String> for FacialExpression {
    fn from(label: String) -> Self {
        FacialExpression::from_label(&label)
    }
}

impl Leaf for FacialExpression {
    fn token(&self) -> Cow<'static, str> {
        Cow::Owned(self.as_str().to_lowercase())
    }

    fn to_value(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl FeatureNode for FacialExpression {
    fn leaf_count(&self) -> usize {
        1
    }

    fn diff(&self, learner: &Self, tally: &mut Tally) -> Option<Value> {
        diff_leaf(self, learner, tally)
    }

    fn expected(&self) -> Value {
        self.to_value()
    }
}

feature_record! {
    /// The comparable unit of a sign at one instant. Immutable once produced.
    pub struct SignFeatureSnapshot {
        pub left: HandFeatureRecord,
        pub right: HandFeatureRecord,
        pub inter_hand_relation: InterHandRelation,
        pub finger_relation: FingerRelation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub facial_expression: Option<FacialExpression>,
    }
}

impl SignFeatureSnapshot {
    /// Parses a snapshot document. Every top-level and nested key except the
    /// facial expression is required.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_expression(mut self, expression: Option<FacialExpression>) -> Self {
        self.facial_expression = expression;
        self
    }
}

/// Ordered snapshots of one sign: length 1 for static signs, one per sampled
/// instant for dynamic signs.
pub type AnswerSequence = Vec<SignFeatureSnapshot>;

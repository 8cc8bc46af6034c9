// src/evaluation.rs - Static and dynamic grading of a learner attempt
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{GradingConfig, PassPolicy};
use crate::error::Result;
use crate::extractor::FeatureExtractor;
use crate::features::{FacialExpression, SignFeatureSnapshot};
use crate::landmarks::LandmarkFrame;
use crate::similarity::{compare, round_score, DiffLog, FeatureRecord};

/// Result handed to the feedback collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub score: f64,
    pub is_correct: bool,
    /// Expected values of every mismatched leaf. For sequences, only the
    /// worst frame pair's mismatches.
    pub diff_log: DiffLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_frame_idx: Option<usize>,
    pub frames_compared: usize,
    /// Frames beyond the shorter sequence that were not graded.
    pub frames_ignored: usize,
}

impl Evaluation {
    /// What the learner has to change, or `None` when the attempt passed.
    pub fn wrong_parts(&self) -> Option<&DiffLog> {
        if self.is_correct {
            None
        } else {
            Some(&self.diff_log)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameScore {
    pub index: usize,
    pub score: f64,
    pub total: usize,
    pub mismatched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceReport {
    pub evaluation: Evaluation,
    pub frames: Vec<FrameScore>,
}

/// Grades one learner tree against its reference.
pub fn evaluate_static<T: FeatureRecord>(learner: &T, reference: &T, policy: &PassPolicy) -> Evaluation {
    let comparison = compare(reference, learner);
    debug!(
        "Matched {}/{} features, score {:.3}",
        comparison.tally.matched, comparison.tally.total, comparison.score
    );

    Evaluation {
        score: comparison.score,
        is_correct: policy.passes(comparison.score),
        diff_log: comparison.diff_log,
        worst_frame_idx: None,
        frames_compared: 1,
        frames_ignored: 0,
    }
}

/// Grades two sequences aligned strictly by index over the shorter length.
pub fn evaluate_sequence<T: FeatureRecord>(learner: &[T], reference: &[T], policy: &PassPolicy) -> Evaluation {
    evaluate_sequence_detailed(learner, reference, policy).evaluation
}

/// Like [`evaluate_sequence`], also returning every per-frame score.
pub fn evaluate_sequence_detailed<T: FeatureRecord>(
    learner: &[T],
    reference: &[T],
    policy: &PassPolicy,
) -> SequenceReport {
    let compared = learner.len().min(reference.len());
    let ignored = learner.len().max(reference.len()) - compared;
    if ignored > 0 {
        warn!(
            "Sequence length mismatch: learner {} frames, reference {} frames; ignoring {} trailing frame(s)",
            learner.len(),
            reference.len(),
            ignored
        );
    }

    if compared == 0 {
        return SequenceReport {
            evaluation: Evaluation {
                score: 0.0,
                is_correct: false,
                diff_log: DiffLog::new(),
                worst_frame_idx: Some(0),
                frames_compared: 0,
                frames_ignored: ignored,
            },
            frames: Vec::new(),
        };
    }

    let mut frames = Vec::with_capacity(compared);
    let mut score_sum = 0.0;
    let mut worst: Option<(usize, f64, DiffLog)> = None;

    for (index, (learner_frame, reference_frame)) in learner.iter().zip(reference).enumerate() {
        let comparison = compare(reference_frame, learner_frame);
        score_sum += comparison.score;
        frames.push(FrameScore {
            index,
            score: comparison.score,
            total: comparison.tally.total,
            mismatched: comparison.tally.mismatched(),
        });

        // Strict `<` keeps the earliest frame on ties.
        let is_worse = worst.as_ref().map_or(true, |(_, score, _)| comparison.score < *score);
        if is_worse {
            worst = Some((index, comparison.score, comparison.diff_log));
        }
    }

    let score = round_score(score_sum / compared as f64);
    let (worst_idx, _, diff_log) = worst.unwrap_or_default();
    debug!("Sequence score {:.3} over {} frames, worst frame {}", score, compared, worst_idx);

    SequenceReport {
        evaluation: Evaluation {
            score,
            is_correct: policy.passes(score),
            diff_log,
            worst_frame_idx: Some(worst_idx),
            frames_compared: compared,
            frames_ignored: ignored,
        },
        frames,
    }
}

/// Extracts the learner's frame and grades it against a static reference.
pub fn grade_static(
    frame: &LandmarkFrame,
    expression: Option<FacialExpression>,
    reference: &SignFeatureSnapshot,
    config: &GradingConfig,
) -> Result<Evaluation> {
    let extractor = FeatureExtractor::new(config.thresholds.clone());
    let learner = extractor.extract(frame, expression)?;
    Ok(evaluate_static(&learner, reference, &config.policy))
}

/// Extracts every sampled learner frame and grades the clip against a
/// dynamic reference. The expression label, if any, applies to every frame.
pub fn grade_sequence(
    frames: &[LandmarkFrame],
    expression: Option<FacialExpression>,
    reference: &[SignFeatureSnapshot],
    config: &GradingConfig,
) -> Result<SequenceReport> {
    let extractor = FeatureExtractor::new(config.thresholds.clone());
    let learner = frames
        .iter()
        .map(|frame| extractor.extract(frame, expression))
        .collect::<Result<Vec<_>>>()?;
    Ok(evaluate_sequence_detailed(&learner, reference, &config.policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{HandFeatureRecord, InterHandRelation};
    use serde_json::json;

    fn relation(flags: [bool; 5]) -> InterHandRelation {
        InterHandRelation {
            both_present: flags[0],
            forming_single_shape: flags[1],
            mirrored_shape: flags[2],
            hand_distance_close: flags[3],
            finger_tips_facing: flags[4],
        }
    }

    #[test]
    fn test_identical_snapshots_score_one() {
        let mut snapshot = SignFeatureSnapshot::default();
        snapshot.right.present = true;
        snapshot.right.handshape.finger_selection.index = true;
        let result = evaluate_static(&snapshot.clone(), &snapshot, &PassPolicy::strict());
        assert_eq!(result.score, 1.0);
        assert!(result.is_correct);
        assert!(result.diff_log.is_empty());
        assert!(result.wrong_parts().is_none());
    }

    #[test]
    fn test_single_flag_mismatch_end_to_end() {
        let mut reference = HandFeatureRecord::absent();
        reference.handshape.finger_selection.index = true;
        let learner = HandFeatureRecord::absent();

        let result = evaluate_static(&learner, &reference, &PassPolicy::strict());
        assert_eq!(result.score, round_score(69.0 / 70.0));
        assert!(!result.is_correct);
        assert_eq!(
            serde_json::Value::Object(result.diff_log),
            json!({"handshape": {"finger_selection": {"index": true}}})
        );
    }

    #[test]
    fn test_each_flip_costs_one_leaf() {
        let reference = HandFeatureRecord::absent();
        let mut learner = reference.clone();
        learner.orientation.palm_up = true;
        let one = compare(&reference, &learner);
        learner.location.torso.chest = true;
        let two = compare(&reference, &learner);

        assert_eq!(one.tally.total, two.tally.total);
        assert_eq!(one.tally.matched - two.tally.matched, 1);
        assert_eq!(two.tally.matched, 68);
        assert!(two.score < one.score);
    }

    #[test]
    fn test_tolerance_policy_accepts_near_miss() {
        let mut reference = HandFeatureRecord::absent();
        reference.handshape.finger_selection.index = true;
        let learner = HandFeatureRecord::absent();
        let result = evaluate_static(&learner, &reference, &PassPolicy::with_threshold(0.95));
        assert!(result.is_correct);
        assert!(result.wrong_parts().is_none());
    }

    #[test]
    fn test_reference_expression_missing_from_learner() {
        let reference = SignFeatureSnapshot::default().with_expression(Some(FacialExpression::Curious));
        let learner = SignFeatureSnapshot::default();
        let result = evaluate_static(&learner, &reference, &PassPolicy::strict());
        assert_eq!(result.score, round_score(148.0 / 149.0));
        assert_eq!(result.diff_log["facial_expression"], json!("Curious"));
    }

    #[test]
    fn test_worst_frame_is_first_minimum() {
        let reference = vec![relation([false; 5]); 3];
        // 3 of 5 flags wrong -> 0.4
        let wrong = relation([true, true, true, false, false]);
        let learner = vec![relation([false; 5]), wrong.clone(), wrong];

        let report = evaluate_sequence_detailed(&learner, &reference, &PassPolicy::strict());
        let scores: Vec<f64> = report.frames.iter().map(|f| f.score).collect();
        assert_eq!(scores, vec![1.0, 0.4, 0.4]);
        assert_eq!(report.evaluation.worst_frame_idx, Some(1));
        assert_eq!(report.evaluation.score, 0.6);
        assert!(!report.evaluation.is_correct);
        assert_eq!(report.evaluation.diff_log.len(), 3);
    }

    #[test]
    fn test_extra_learner_frames_are_ignored() {
        let reference = vec![relation([false; 5]); 3];
        let mut learner = vec![relation([false; 5]); 5];
        learner[4] = relation([true; 5]);

        let result = evaluate_sequence(&learner, &reference, &PassPolicy::strict());
        assert_eq!(result.frames_compared, 3);
        assert_eq!(result.frames_ignored, 2);
        assert_eq!(result.score, 1.0);
        assert!(result.is_correct);
        assert_eq!(result.worst_frame_idx, Some(0));
    }

    #[test]
    fn test_empty_sequence() {
        let reference: Vec<InterHandRelation> = Vec::new();
        let learner = vec![relation([false; 5])];
        let result = evaluate_sequence(&learner, &reference, &PassPolicy::strict());
        assert_eq!(result.score, 0.0);
        assert!(!result.is_correct);
        assert_eq!(result.worst_frame_idx, Some(0));
        assert!(result.diff_log.is_empty());
    }

    #[test]
    fn test_grade_static_from_empty_frame() {
        let config = GradingConfig::default();
        let reference = SignFeatureSnapshot::default();
        let result = grade_static(&LandmarkFrame::new(), None, &reference, &config).unwrap();
        assert_eq!(result.score, 1.0);
        assert!(result.is_correct);
    }
}

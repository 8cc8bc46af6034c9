// src/similarity.rs - Lock-step comparison of two feature trees
//
// The reference tree drives the walk. Every leaf bumps `total`; a leaf whose
// lower-cased token equals the learner's bumps `matched`. Branches without a
// mismatch are pruned, so the diff-log only holds what has to change, keyed by
// path and carrying the reference's expected value.
use std::borrow::Cow;

use serde_json::{Map, Value};

/// Pruned sub-tree of the reference holding only mismatched leaves.
pub type DiffLog = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub matched: usize,
}

impl Tally {
    pub fn mismatched(&self) -> usize {
        self.total - self.matched
    }

    /// matched / total rounded to 3 decimals, 0.0 for an empty schema.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round_score(self.matched as f64 / self.total as f64)
    }
}

pub fn round_score(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A terminal value of the feature tree.
pub trait Leaf {
    /// Lower-cased textual form used for value-tolerant equality.
    fn token(&self) -> Cow<'static, str>;
    fn to_value(&self) -> Value;
}

impl Leaf for bool {
    fn token(&self) -> Cow<'static, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

pub trait FeatureNode {
    /// Leaves this node contributes when it is part of the reference.
    fn leaf_count(&self) -> usize;

    /// Compares `self` (the reference) against `learner`, returning the
    /// pruned diff of this node, if any leaf differs.
    fn diff(&self, learner: &Self, tally: &mut Tally) -> Option<Value>;

    /// The whole node as expected values.
    fn expected(&self) -> Value;
}

/// A node with named children. Only records can be the root of a comparison.
pub trait FeatureRecord: FeatureNode {
    fn diff_record(&self, learner: &Self, tally: &mut Tally) -> DiffLog;
}

pub fn diff_leaf<T: Leaf>(reference: &T, learner: &T, tally: &mut Tally) -> Option<Value> {
    tally.total += 1;
    if reference.token() == learner.token() {
        tally.matched += 1;
        None
    } else {
        Some(reference.to_value())
    }
}

impl FeatureNode for bool {
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

/// Optional nodes only exist in the schema when the reference carries them.
/// A learner without the value compares as the token `none` on every leaf,
/// which no real leaf equals.
impl<T: FeatureNode> FeatureNode for Option<T> {
    fn leaf_count(&self) -> usize {
        self.as_ref().map_or(0, FeatureNode::leaf_count)
    }

    fn diff(&self, learner: &Self, tally: &mut Tally) -> Option<Value> {
        match (self, learner) {
            (None, _) => None,
            (Some(reference), Some(learner)) => reference.diff(learner, tally),
            (Some(reference), None) => {
                tally.total += reference.leaf_count();
                Some(reference.expected())
            }
        }
    }

    fn expected(&self) -> Value {
        self.as_ref().map_or(Value::Null, FeatureNode::expected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub tally: Tally,
    pub score: f64,
    pub diff_log: DiffLog,
}

/// Diffs a learner tree against the reference tree of the same type.
pub fn compare<T: FeatureRecord>(reference: &T, learner: &T) -> Comparison {
    let mut tally = Tally::default();
    let diff_log = reference.diff_record(learner, &mut tally);

    if tally.total == 0 {
        return Comparison {
            tally,
            score: 0.0,
            diff_log: DiffLog::new(),
        };
    }

    Comparison {
        tally,
        score: tally.score(),
        diff_log,
    }
}

//! Tolerance-based comparison of a live stance against its reference.

use std::fmt;

use serde::Serialize;

use crate::{
    AngleSet, JointAngleName, LandmarkFrame, PoseProfile, PoseType, ScoringConfig,
};

/// Outcome tier of one evaluated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoseStatus {
    /// The detector found no usable skeleton.
    NoPose,
    /// The active pose has no reference to compare against.
    NoReference,
    Perfect,
    VeryGood,
    NeedsAdjustment,
}

impl PoseStatus {
    /// Whether the frame was compared against a reference.
    pub fn is_scored(self) -> bool {
        matches!(
            self,
            PoseStatus::Perfect | PoseStatus::VeryGood | PoseStatus::NeedsAdjustment
        )
    }

    pub fn message(self) -> &'static str {
        match self {
            PoseStatus::NoPose => "No pose detected",
            PoseStatus::NoReference => "No reference angles set",
            PoseStatus::Perfect => "Perfect pose!",
            PoseStatus::VeryGood => "Very good, almost there",
            PoseStatus::NeedsAdjustment => "Needs adjustment",
        }
    }
}

impl fmt::Display for PoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Adjustment {
    Increase,
    Reduce,
}

/// Directive for one joint that is outside its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub joint: JointAngleName,
    pub adjustment: Adjustment,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.adjustment {
            Adjustment::Increase => "Increase",
            Adjustment::Reduce => "Reduce",
        };
        write!(f, "{verb} {} angle", self.joint.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointScore {
    pub joint: JointAngleName,
    pub current: f32,
    pub target: f32,
    pub tolerance: f32,
    /// Percentage in `[0, 100]`.
    pub accuracy: f32,
    pub within_tolerance: bool,
}

/// Per-frame result handed to the display and voice layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub pose: PoseType,
    pub status: PoseStatus,
    /// Unweighted mean of the seven joint accuracies, `0.0` when unscored.
    pub overall: f32,
    pub joints: Vec<JointScore>,
    pub suggestions: Vec<Correction>,
    /// Pose recognised in the frame, `None` when accuracy is too low.
    pub identified: Option<PoseType>,
    #[serde(skip)]
    primary_count: usize,
}

impl AccuracyReport {
    fn unscored(pose: PoseType, status: PoseStatus) -> Self {
        Self {
            pose,
            status,
            overall: 0.0,
            joints: Vec::new(),
            suggestions: Vec::new(),
            identified: None,
            primary_count: 0,
        }
    }

    /// Leading suggestions meant for on-screen display.
    pub fn primary_suggestions(&self) -> &[Correction] {
        let count = self.primary_count.min(self.suggestions.len());
        &self.suggestions[..count]
    }

    pub fn joint(&self, joint: JointAngleName) -> Option<&JointScore> {
        self.joints.iter().find(|score| score.joint == joint)
    }
}

/// Accuracy of a single joint: 100 on target, falling linearly to 0 one
/// tolerance away and never below.
pub fn joint_accuracy(difference: f32, tolerance: f32) -> f32 {
    let difference = difference.abs();
    if difference.is_nan() {
        return 0.0;
    }
    if tolerance <= 0.0 {
        return if difference == 0.0 { 100.0 } else { 0.0 };
    }

    (100.0 - (difference / tolerance) * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Default)]
pub struct ConformanceScorer {
    config: ScoringConfig,
}

impl ConformanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores `frame` for the active `pose` against its reference, if any.
    pub fn evaluate(
        &self,
        frame: &LandmarkFrame,
        pose: PoseType,
        profile: Option<&PoseProfile>,
    ) -> AccuracyReport {
        if frame.is_empty() {
            return AccuracyReport::unscored(pose, PoseStatus::NoPose);
        }

        let Some(profile) = profile else {
            return AccuracyReport::unscored(pose, PoseStatus::NoReference);
        };

        match AngleSet::from_frame(frame) {
            Ok(current) => self.score(&current, profile),
            Err(err) => {
                tracing::debug!(%err, "frame lacks landmarks required by the joint topology");
                AccuracyReport::unscored(pose, PoseStatus::NoPose)
            }
        }
    }

    /// Compares already derived angles against `profile`.
    pub fn score(&self, current: &AngleSet, profile: &PoseProfile) -> AccuracyReport {
        let mut joints = Vec::with_capacity(JointAngleName::COUNT);
        let mut suggestions = Vec::new();

        for (joint, angle) in current.iter() {
            let target = profile.target(joint);
            let tolerance = profile.tolerance(joint);
            let difference = (angle - target).abs();
            let within_tolerance = difference <= tolerance;

            if !within_tolerance {
                let adjustment = if angle < target {
                    Adjustment::Increase
                } else {
                    Adjustment::Reduce
                };
                suggestions.push(Correction { joint, adjustment });
            }

            joints.push(JointScore {
                joint,
                current: angle,
                target,
                tolerance,
                accuracy: joint_accuracy(difference, tolerance),
                within_tolerance,
            });
        }

        let overall = joints.iter().map(|score| score.accuracy).sum::<f32>() / joints.len() as f32;
        let identified = (overall > self.config.identify_threshold).then_some(profile.pose);

        AccuracyReport {
            pose: profile.pose,
            status: self.status_for(overall),
            overall,
            joints,
            suggestions,
            identified,
            primary_count: self.config.primary_suggestions,
        }
    }

    fn status_for(&self, overall: f32) -> PoseStatus {
        if overall > self.config.perfect_threshold {
            PoseStatus::Perfect
        } else if overall > self.config.very_good_threshold {
            PoseStatus::VeryGood
        } else {
            PoseStatus::NeedsAdjustment
        }
    }
}

use std::{
    collections::{hash_map::Entry, BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{AngleSet, JointAngleName, JointMap, LandmarkFrame, NatyaError, Result};

/// Tolerance applied to every joint unless configured otherwise, in degrees.
pub const DEFAULT_TOLERANCE: f32 = 5.0;

/// Named stances the trainer knows how to score.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PoseType {
    #[default]
    Araimandi,
    Muzhumandi,
    Samapadam,
}

/// Static descriptive text for a stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseInfo {
    pub description: &'static str,
    pub significance: &'static str,
    pub tips: &'static str,
}

impl PoseType {
    pub const ALL: [PoseType; 3] = [
        PoseType::Araimandi,
        PoseType::Muzhumandi,
        PoseType::Samapadam,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PoseType::Araimandi => "Araimandi",
            PoseType::Muzhumandi => "Muzhumandi",
            PoseType::Samapadam => "Samapadam",
        }
    }

    /// Built-in target angles, listed in [`JointAngleName::ALL`] order.
    pub fn default_targets(self) -> AngleSet {
        let values = match self {
            PoseType::Araimandi => [99.2, 114.3, 137.6, 136.0, 138.5, 36.4, 25.4],
            PoseType::Muzhumandi => [177.7, 80.6, 178.1, 6.3, 12.4, 7.3, 15.1],
            PoseType::Samapadam => [176.1, 176.1, 174.3, 177.2, 175.0, 10.5, 7.3],
        };
        AngleSet::from_fn(|joint| values[joint.index()])
    }

    pub fn info(self) -> PoseInfo {
        match self {
            PoseType::Araimandi => PoseInfo {
                description: "Araimandi is a fundamental stance in Bharatanatyam where the dancer \
                    maintains a half-sitting position. The knees are bent outward, and thighs are \
                    parallel to the ground, creating a diamond shape. This position requires strong \
                    leg muscles and proper alignment.",
                significance: "It's considered the mother of all dance positions in Bharatanatyam, \
                    representing readiness and strength.",
                tips: "Keep your back straight, distribute weight evenly, and ensure knees point outward.",
            },
            PoseType::Muzhumandi => PoseInfo {
                description: "Muzhumandi is a full-sitting position where one leg is bent while the \
                    other knee touches the ground. It's an advanced position that requires \
                    flexibility and balance.",
                significance: "This pose demonstrates the dancer's mastery over body control and \
                    ground-level movements.",
                tips: "Practice with support initially, focus on hip flexibility, and maintain proper \
                    spine alignment.",
            },
            PoseType::Samapadam => PoseInfo {
                description: "Samapadam is the basic standing position where the feet are placed \
                    together. It's the starting position for many dance sequences.",
                significance: "This pose represents balance, symmetry, and the beginning of the \
                    dance journey.",
                tips: "Keep weight evenly distributed, maintain straight posture, and stay relaxed \
                    but alert.",
            },
        }
    }
}

impl fmt::Display for PoseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PoseType {
    type Err = NatyaError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|pose| pose.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| NatyaError::UnknownPose(value.to_string()))
    }
}

/// Complete reference for one stance: a target and a tolerance per joint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseProfile {
    pub pose: PoseType,
    pub targets: AngleSet,
    pub tolerances: JointMap<f32>,
}

impl PoseProfile {
    pub fn new(pose: PoseType, targets: AngleSet, tolerance: f32) -> Self {
        Self {
            pose,
            targets,
            tolerances: JointMap::splat(tolerance),
        }
    }

    /// Builds a profile from a loosely keyed table, as found in config files.
    /// Every joint must be present.
    pub fn from_targets(
        pose: PoseType,
        targets: &BTreeMap<JointAngleName, f32>,
        tolerance: f32,
    ) -> Result<Self> {
        let targets = AngleSet::try_from_fn(|joint| {
            targets
                .get(&joint)
                .copied()
                .ok_or(NatyaError::MissingReferenceAngle { pose, joint })
        })?;
        Ok(Self::new(pose, targets, tolerance))
    }

    pub fn target(&self, joint: JointAngleName) -> f32 {
        self.targets.get(joint)
    }

    pub fn tolerance(&self, joint: JointAngleName) -> f32 {
        self.tolerances.get(joint)
    }
}

/// Reference stances plus the currently selected pose.
#[derive(Debug, Clone)]
pub struct PoseProfileStore {
    profiles: HashMap<PoseType, PoseProfile>,
    active: PoseType,
    tolerance: f32,
}

impl Default for PoseProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseProfileStore {
    /// Store seeded with the built-in stances.
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_TOLERANCE)
    }

    /// Store seeded with the built-in stances, using `tolerance` for captures
    /// and defaults alike.
    pub fn with_tolerance(tolerance: f32) -> Self {
        let mut store = Self::empty_with_tolerance(tolerance);
        for pose in PoseType::ALL {
            store.insert(PoseProfile::new(pose, pose.default_targets(), tolerance));
        }
        store
    }

    /// Store without any reference.
    pub fn empty() -> Self {
        Self::empty_with_tolerance(DEFAULT_TOLERANCE)
    }

    fn empty_with_tolerance(tolerance: f32) -> Self {
        Self {
            profiles: HashMap::new(),
            active: PoseType::default(),
            tolerance,
        }
    }

    /// Replaces the reference for `profile.pose`.
    pub fn insert(&mut self, profile: PoseProfile) {
        self.profiles.insert(profile.pose, profile);
    }

    /// Records the stance in `frame` as the reference for `pose`. The previous
    /// reference is left untouched when the frame has no usable skeleton.
    pub fn capture(&mut self, pose: PoseType, frame: &LandmarkFrame) -> Result<&PoseProfile> {
        let targets = AngleSet::from_frame(frame)?;
        let profile = PoseProfile::new(pose, targets, self.tolerance);

        tracing::info!(%pose, targets = ?profile.targets, "captured reference pose");

        let stored = match self.profiles.entry(pose) {
            Entry::Occupied(mut slot) => {
                slot.insert(profile);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(profile),
        };
        Ok(stored)
    }

    /// Removes the reference for `pose`, returning it if one existed.
    pub fn clear(&mut self, pose: PoseType) -> Option<PoseProfile> {
        let removed = self.profiles.remove(&pose);
        tracing::info!(%pose, existed = removed.is_some(), "cleared reference pose");
        removed
    }

    pub fn get(&self, pose: PoseType) -> Option<&PoseProfile> {
        self.profiles.get(&pose)
    }

    /// Makes `pose` the active stance. Returns whether it has a reference.
    pub fn select(&mut self, pose: PoseType) -> bool {
        self.active = pose;
        let has_reference = self.profiles.contains_key(&pose);
        tracing::debug!(%pose, has_reference, "selected pose");
        has_reference
    }

    pub fn active(&self) -> PoseType {
        self.active
    }

    pub fn active_profile(&self) -> Option<&PoseProfile> {
        self.get(self.active)
    }

    /// All stored references, ordered by pose.
    pub fn profiles(&self) -> Vec<&PoseProfile> {
        let mut profiles: Vec<_> = self.profiles.values().collect();
        profiles.sort_by_key(|profile| profile.pose);
        profiles
    }
}

//! Landmark frames and the fixed joint topology read from them.

use std::{fmt, str::FromStr};

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::{angle::joint_angle, NatyaError, Point2, Result};

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_HEEL: usize = 29;
pub const RIGHT_HEEL: usize = 30;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// Number of points in the body topology emitted by the detector.
pub const BODY_LANDMARK_COUNT: usize = 33;

/// Vertical distance of the synthetic point placed above the hip for the
/// thigh angles. Negative because image `y` grows downwards.
pub const THIGH_VERTICAL_OFFSET: f32 = -0.2;

/// Single detected landmark. `z` is carried through but never scored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Landmarks detected for one video frame. An empty frame means the detector
/// found no skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Frame for which the detector reported nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<Point2> {
        self.landmarks.get(index).map(Landmark::point)
    }

    /// Landmark at `index`, rejected when missing or not finite.
    fn require(&self, index: usize) -> Result<Point2> {
        self.point(index)
            .filter(|point| point.x.is_finite() && point.y.is_finite())
            .ok_or(NatyaError::LandmarksUnavailable)
    }
}

/// The seven joint angles scored by the engine, in feedback order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum JointAngleName {
    LeftKnee,
    RightKnee,
    Back,
    LeftThigh,
    RightThigh,
    LeftFoot,
    RightFoot,
}

/// First point of a joint triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayAnchor {
    Landmark(usize),
    /// Synthetic point straight above the given landmark.
    AboveLandmark(usize),
}

/// Landmark triple whose middle point is the angle vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTopology {
    pub start: RayAnchor,
    pub vertex: usize,
    pub end: usize,
}

impl JointAngleName {
    pub const COUNT: usize = 7;

    pub const ALL: [JointAngleName; Self::COUNT] = [
        JointAngleName::LeftKnee,
        JointAngleName::RightKnee,
        JointAngleName::Back,
        JointAngleName::LeftThigh,
        JointAngleName::RightThigh,
        JointAngleName::LeftFoot,
        JointAngleName::RightFoot,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            JointAngleName::LeftKnee => "left_knee",
            JointAngleName::RightKnee => "right_knee",
            JointAngleName::Back => "back",
            JointAngleName::LeftThigh => "left_thigh",
            JointAngleName::RightThigh => "right_thigh",
            JointAngleName::LeftFoot => "left_foot",
            JointAngleName::RightFoot => "right_foot",
        }
    }

    /// Human readable name used in spoken and displayed corrections.
    pub fn label(self) -> &'static str {
        match self {
            JointAngleName::LeftKnee => "Left Knee",
            JointAngleName::RightKnee => "Right Knee",
            JointAngleName::Back => "Back",
            JointAngleName::LeftThigh => "Left Thigh",
            JointAngleName::RightThigh => "Right Thigh",
            JointAngleName::LeftFoot => "Left Foot",
            JointAngleName::RightFoot => "Right Foot",
        }
    }

    pub fn group(self) -> JointGroup {
        match self {
            JointAngleName::LeftKnee | JointAngleName::RightKnee => JointGroup::Legs,
            JointAngleName::Back => JointGroup::Back,
            JointAngleName::LeftThigh | JointAngleName::RightThigh => JointGroup::Thighs,
            JointAngleName::LeftFoot | JointAngleName::RightFoot => JointGroup::Feet,
        }
    }

    pub fn topology(self) -> JointTopology {
        use RayAnchor::{AboveLandmark, Landmark};

        let (start, vertex, end) = match self {
            JointAngleName::LeftKnee => (Landmark(LEFT_HIP), LEFT_KNEE, LEFT_ANKLE),
            JointAngleName::RightKnee => (Landmark(RIGHT_HIP), RIGHT_KNEE, RIGHT_ANKLE),
            JointAngleName::Back => (Landmark(LEFT_SHOULDER), LEFT_HIP, LEFT_KNEE),
            JointAngleName::LeftThigh => (AboveLandmark(LEFT_HIP), LEFT_HIP, LEFT_KNEE),
            JointAngleName::RightThigh => (AboveLandmark(RIGHT_HIP), RIGHT_HIP, RIGHT_KNEE),
            JointAngleName::LeftFoot => (Landmark(LEFT_ANKLE), LEFT_FOOT_INDEX, LEFT_HEEL),
            JointAngleName::RightFoot => (Landmark(RIGHT_ANKLE), RIGHT_FOOT_INDEX, RIGHT_HEEL),
        };

        JointTopology { start, vertex, end }
    }

    /// Computes this joint's angle from a frame.
    pub fn measure(self, frame: &LandmarkFrame) -> Result<f32> {
        let topology = self.topology();
        let start = match topology.start {
            RayAnchor::Landmark(index) => frame.require(index)?,
            RayAnchor::AboveLandmark(index) => {
                frame.require(index)?.offset_y(THIGH_VERTICAL_OFFSET)
            }
        };
        let vertex = frame.require(topology.vertex)?;
        let end = frame.require(topology.end)?;

        Ok(joint_angle(start, vertex, end))
    }
}

impl fmt::Display for JointAngleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for JointAngleName {
    type Err = NatyaError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|joint| joint.key() == value)
            .ok_or(NatyaError::InvalidInput("unknown joint angle name"))
    }
}

/// Display grouping for corrections: legs, back, thighs, then feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointGroup {
    Legs,
    Back,
    Thighs,
    Feet,
}

/// One value per joint. Always complete, so lookups cannot miss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointMap<T> {
    values: [T; JointAngleName::COUNT],
}

impl<T: Copy> JointMap<T> {
    pub fn splat(value: T) -> Self {
        Self {
            values: [value; JointAngleName::COUNT],
        }
    }

    pub fn from_fn(mut f: impl FnMut(JointAngleName) -> T) -> Self {
        Self {
            values: JointAngleName::ALL.map(&mut f),
        }
    }

    pub fn try_from_fn<E>(
        mut f: impl FnMut(JointAngleName) -> std::result::Result<T, E>,
    ) -> std::result::Result<Self, E>
    where
        T: Default,
    {
        let mut values = [T::default(); JointAngleName::COUNT];
        for joint in JointAngleName::ALL {
            values[joint.index()] = f(joint)?;
        }
        Ok(Self { values })
    }

    pub fn get(&self, joint: JointAngleName) -> T {
        self.values[joint.index()]
    }

    pub fn set(&mut self, joint: JointAngleName, value: T) {
        self.values[joint.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointAngleName, T)> + '_ {
        JointAngleName::ALL
            .into_iter()
            .map(move |joint| (joint, self.values[joint.index()]))
    }
}

impl<T: Copy + Serialize> Serialize for JointMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(JointAngleName::COUNT))?;
        for (joint, value) in self.iter() {
            map.serialize_entry(joint.key(), &value)?;
        }
        map.end()
    }
}

/// Current angles of all seven joints, in degrees.
pub type AngleSet = JointMap<f32>;

impl AngleSet {
    /// Derives every joint angle from a frame. Fails if the frame is empty or
    /// lacks any landmark the topology reads.
    pub fn from_frame(frame: &LandmarkFrame) -> Result<Self> {
        if frame.is_empty() {
            return Err(NatyaError::LandmarksUnavailable);
        }

        Self::try_from_fn(|joint| joint.measure(frame))
    }
}

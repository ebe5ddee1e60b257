//! Pose-conformance scoring engine for the Natya pose trainer.
//!
//! The crate turns per-frame body landmarks into joint angles, compares them
//! with a reference stance and keeps the session state that evolves across
//! frames: the rolling skill level and the voice feedback cooldown. Capture,
//! rendering and speech synthesis live outside this crate; the [`voice`]
//! module only defines the hand-off to a speech backend.

pub mod angle;
pub mod config;
pub mod error;
pub mod feedback;
pub mod landmarks;
pub mod level;
pub mod profile;
pub mod scoring;
pub mod session;
pub mod voice;

pub use angle::{joint_angle, Point2};
pub use config::{AppConfig, FeedbackConfig, LevelConfig, ScoringConfig};
pub use error::{NatyaError, Result};
pub use feedback::FeedbackGate;
pub use landmarks::{AngleSet, JointAngleName, JointGroup, JointMap, Landmark, LandmarkFrame};
pub use level::{LevelChangeEvent, LevelTracker, SkillLevel};
pub use profile::{PoseInfo, PoseProfile, PoseProfileStore, PoseType};
pub use scoring::{
    joint_accuracy, AccuracyReport, Adjustment, ConformanceScorer, Correction, JointScore,
    PoseStatus,
};
pub use session::{FrameOutcome, ScoringSession, SharedSession};
pub use voice::{SpeechSink, VoiceChannel};

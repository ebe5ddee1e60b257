//! Per-frame pipeline tying the scorer, level tracker and feedback gate to
//! the reference store.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::{
    AccuracyReport, AppConfig, ConformanceScorer, Correction, FeedbackGate, LandmarkFrame,
    LevelChangeEvent, LevelTracker, NatyaError, PoseProfile, PoseProfileStore, PoseType, Result,
    SkillLevel,
};

const NO_CLEAR_POSE: &str = "I don't detect a clear pose at the moment. Please ensure you're in \
    frame and maintaining the position.";

/// Everything the display and voice layers need after one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub report: AccuracyReport,
    pub level: SkillLevel,
    pub level_change: Option<LevelChangeEvent>,
    /// Correction to hand to the voice channel this frame.
    pub speak: Option<Correction>,
}

impl FrameOutcome {
    /// Spoken lines for this frame, level announcement first.
    pub fn utterances(&self) -> Vec<String> {
        self.level_change
            .iter()
            .map(LevelChangeEvent::announcement)
            .chain(self.speak.iter().map(ToString::to_string))
            .collect()
    }
}

/// Mutable state of one practice session.
#[derive(Debug, Clone, Default)]
pub struct ScoringSession {
    store: PoseProfileStore,
    scorer: ConformanceScorer,
    tracker: LevelTracker,
    gate: FeedbackGate,
    identified: Option<PoseType>,
}

impl ScoringSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session from configuration, applying reference overrides on
    /// top of the built-in stances.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let mut store = PoseProfileStore::with_tolerance(config.scoring.default_tolerance);
        for profile in config.reference_profiles()? {
            store.insert(profile);
        }

        Ok(Self::with_store(store, config))
    }

    /// Builds a session around an existing store.
    pub fn with_store(store: PoseProfileStore, config: &AppConfig) -> Self {
        Self {
            store,
            scorer: ConformanceScorer::new(config.scoring.clone()),
            tracker: LevelTracker::new(config.level),
            gate: FeedbackGate::new(config.feedback),
            identified: None,
        }
    }

    /// Scores one frame and advances level and feedback state. Unscored
    /// frames leave the history and the cooldown untouched.
    pub fn process(&mut self, frame: &LandmarkFrame) -> FrameOutcome {
        let pose = self.store.active();
        let report = self.scorer.evaluate(frame, pose, self.store.active_profile());

        let (level_change, speak) = if report.status.is_scored() {
            let level_change = self.tracker.record(report.overall);
            let speak = self.gate.consider(&report.suggestions);
            (level_change, speak)
        } else {
            (None, None)
        };
        self.identified = report.identified;

        FrameOutcome {
            report,
            level: self.tracker.level(),
            level_change,
            speak,
        }
    }

    pub fn capture(&mut self, pose: PoseType, frame: &LandmarkFrame) -> Result<PoseProfile> {
        self.store.capture(pose, frame).cloned()
    }

    /// Captures the reference for the active pose.
    pub fn capture_active(&mut self, frame: &LandmarkFrame) -> Result<PoseProfile> {
        self.capture(self.store.active(), frame)
    }

    pub fn clear(&mut self, pose: PoseType) -> Option<PoseProfile> {
        self.store.clear(pose)
    }

    /// Makes `pose` active. Returns whether it has a reference.
    pub fn select(&mut self, pose: PoseType) -> bool {
        self.store.select(pose)
    }

    pub fn active_pose(&self) -> PoseType {
        self.store.active()
    }

    pub fn level(&self) -> SkillLevel {
        self.tracker.level()
    }

    pub fn store(&self) -> &PoseProfileStore {
        &self.store
    }

    pub fn tracker(&self) -> &LevelTracker {
        &self.tracker
    }

    pub fn gate(&self) -> &FeedbackGate {
        &self.gate
    }

    /// Pose recognised in the latest frame.
    pub fn identified_pose(&self) -> Option<PoseType> {
        self.identified
    }

    /// Answer to "what pose is this?" based on the latest frame.
    pub fn describe_current_pose(&self) -> String {
        match self.identified {
            Some(pose) => {
                let info = pose.info();
                format!("You are currently in {pose}. {} {}", info.description, info.tips)
            }
            None => NO_CLEAR_POSE.to_string(),
        }
    }
}

/// Thread-safe handle for hosts that receive frames on another thread.
/// Capture and evaluation serialise on the same lock.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<ScoringSession>>,
}

impl SharedSession {
    pub fn new(session: ScoringSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn process(&self, frame: &LandmarkFrame) -> Result<FrameOutcome> {
        Ok(self.lock()?.process(frame))
    }

    pub fn capture(&self, pose: PoseType, frame: &LandmarkFrame) -> Result<PoseProfile> {
        self.lock()?.capture(pose, frame)
    }

    pub fn clear(&self, pose: PoseType) -> Result<Option<PoseProfile>> {
        Ok(self.lock()?.clear(pose))
    }

    pub fn select(&self, pose: PoseType) -> Result<bool> {
        Ok(self.lock()?.select(pose))
    }

    pub fn level(&self) -> Result<SkillLevel> {
        Ok(self.lock()?.level())
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with<T>(&self, f: impl FnOnce(&mut ScoringSession) -> T) -> Result<T> {
        let mut session = self.lock()?;
        Ok(f(&mut session))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ScoringSession>> {
        self.inner
            .lock()
            .map_err(|_| NatyaError::msg("scoring session has been poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{
        landmarks::fixtures::{bent_frame, standing_frame},
        PoseStatus,
    };

    fn session_with_standing_reference() -> ScoringSession {
        let mut session = ScoringSession::new();
        session.select(PoseType::Samapadam);
        session.capture_active(&standing_frame()).unwrap();
        session
    }

    #[test]
    fn matching_frames_promote_after_five_samples() {
        let mut session = session_with_standing_reference();
        let frame = standing_frame();

        for _ in 0..4 {
            let outcome = session.process(&frame);
            assert_eq!(outcome.report.status, PoseStatus::Perfect);
            assert!(outcome.level_change.is_none());
            assert!(outcome.speak.is_none());
        }

        let outcome = session.process(&frame);
        let event = outcome.level_change.expect("fifth perfect frame");
        assert_eq!(event.level, SkillLevel::Expert);
        assert_eq!(outcome.level, SkillLevel::Expert);
        assert_eq!(
            outcome.utterances(),
            ["Congratulations! You are now at Expert level!"]
        );
        assert_eq!(session.tracker().len(), 5);
    }

    #[test]
    fn missing_reference_leaves_history_untouched() {
        let mut session = ScoringSession::new();
        session.clear(PoseType::Muzhumandi);
        assert!(!session.select(PoseType::Muzhumandi));

        let outcome = session.process(&standing_frame());

        assert_eq!(outcome.report.status, PoseStatus::NoReference);
        assert!(outcome.report.suggestions.is_empty());
        assert!(session.tracker().is_empty());
        assert_eq!(session.gate().cooldown(), 0);
    }

    #[test]
    fn empty_frames_are_not_recorded() {
        let mut session = session_with_standing_reference();
        let outcome = session.process(&LandmarkFrame::empty());

        assert_eq!(outcome.report.status, PoseStatus::NoPose);
        assert!(session.tracker().is_empty());
        assert_eq!(session.identified_pose(), None);
    }

    #[test]
    fn unscored_frames_do_not_tick_cooldown() {
        let mut session = session_with_standing_reference();
        assert!(session.process(&bent_frame()).speak.is_some());
        assert_eq!(session.gate().cooldown(), 50);

        let outcome = session.process(&LandmarkFrame::empty());
        assert_eq!(outcome.report.status, PoseStatus::NoPose);
        assert_eq!(session.gate().cooldown(), 50);
        assert_eq!(session.tracker().len(), 1);
    }

    #[test]
    fn non_finite_landmarks_do_not_skew_history() {
        let mut session = session_with_standing_reference();
        let mut landmarks = standing_frame().landmarks().to_vec();
        landmarks[crate::landmarks::LEFT_KNEE].x = f32::NAN;

        let outcome = session.process(&LandmarkFrame::new(landmarks));
        assert_eq!(outcome.report.status, PoseStatus::NoPose);
        assert!(session.tracker().is_empty());

        for _ in 0..5 {
            session.process(&standing_frame());
        }
        assert_eq!(session.tracker().average(), Some(100.0));
        assert_eq!(session.level(), SkillLevel::Expert);
    }

    #[test]
    fn corrections_are_spoken_once_per_cooldown() {
        let mut session = session_with_standing_reference();
        let frame = bent_frame();

        let first = session.process(&frame);
        let spoken = first.speak.expect("first correction is spoken");
        assert_eq!(Some(&spoken), first.report.suggestions.first());
        assert_eq!(session.gate().cooldown(), 50);

        let second = session.process(&frame);
        assert!(second.speak.is_none());
        assert_eq!(session.gate().cooldown(), 49);
    }

    #[test]
    fn failed_capture_keeps_reference() {
        let mut session = session_with_standing_reference();
        let before = session.store().active_profile().cloned();

        assert!(session.capture_active(&LandmarkFrame::empty()).is_err());
        assert_eq!(session.store().active_profile().cloned(), before);
    }

    #[test]
    fn describes_identified_pose() {
        let mut session = session_with_standing_reference();
        assert!(session.describe_current_pose().starts_with("I don't detect"));

        session.process(&standing_frame());
        let answer = session.describe_current_pose();
        assert!(answer.starts_with("You are currently in Samapadam."));
        assert!(answer.contains(PoseType::Samapadam.info().tips));
    }

    #[test]
    fn config_overrides_builtin_reference() {
        let mut config = AppConfig::default();
        config.references.insert(
            PoseType::Araimandi,
            crate::JointAngleName::ALL
                .iter()
                .map(|&joint| (joint, 120.0))
                .collect(),
        );
        config.scoring.default_tolerance = 8.0;

        let session = ScoringSession::from_config(&config).unwrap();
        let profile = session.store().get(PoseType::Araimandi).unwrap();
        assert_eq!(profile.target(crate::JointAngleName::Back), 120.0);
        assert_eq!(profile.tolerance(crate::JointAngleName::Back), 8.0);

        let untouched = session.store().get(PoseType::Samapadam).unwrap();
        assert_eq!(untouched.targets, PoseType::Samapadam.default_targets());
    }

    #[test]
    fn shared_session_accepts_frames_from_another_thread() {
        let shared = SharedSession::new(session_with_standing_reference());
        let producer = shared.clone();

        let worker = thread::spawn(move || {
            for _ in 0..6 {
                producer.process(&standing_frame()).unwrap();
            }
        });
        worker.join().unwrap();

        assert_eq!(shared.level().unwrap(), SkillLevel::Expert);
        assert_eq!(shared.with(|session| session.tracker().len()).unwrap(), 6);
    }
}

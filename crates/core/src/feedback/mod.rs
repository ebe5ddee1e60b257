use crate::{Correction, FeedbackConfig};

/// Decides whether the top correction of a frame should be spoken.
///
/// After each emission the gate stays closed for a fixed number of frames.
/// Once open, it still suppresses a correction identical to the last one
/// spoken.
#[derive(Debug, Clone)]
pub struct FeedbackGate {
    cooldown: u32,
    cooldown_frames: u32,
    last_emitted: Option<Correction>,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl FeedbackGate {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            cooldown: 0,
            cooldown_frames: config.cooldown_frames,
            last_emitted: None,
        }
    }

    /// Frames left before the gate opens again.
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn last_emitted(&self) -> Option<&Correction> {
        self.last_emitted.as_ref()
    }

    /// Runs once per scored frame with that frame's ordered corrections.
    pub fn consider(&mut self, suggestions: &[Correction]) -> Option<Correction> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let top = *suggestions.first()?;
        if self.last_emitted == Some(top) {
            return None;
        }

        tracing::debug!(correction = %top, "emitting voice feedback");
        self.last_emitted = Some(top);
        self.cooldown = self.cooldown_frames;
        Some(top)
    }

    pub fn reset(&mut self) {
        self.cooldown = 0;
        self.last_emitted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Adjustment, JointAngleName};

    fn correction(joint: JointAngleName, adjustment: Adjustment) -> Correction {
        Correction { joint, adjustment }
    }

    #[test]
    fn emits_top_suggestion_then_cools_down() {
        let mut gate = FeedbackGate::default();
        let reduce = correction(JointAngleName::LeftKnee, Adjustment::Reduce);
        let increase = correction(JointAngleName::Back, Adjustment::Increase);

        assert_eq!(gate.consider(&[reduce, increase]), Some(reduce));
        assert_eq!(gate.cooldown(), 50);

        for remaining in (0..50).rev() {
            assert_eq!(gate.consider(&[increase]), None);
            assert_eq!(gate.cooldown(), remaining);
        }

        assert_eq!(gate.consider(&[increase]), Some(increase));
    }

    #[test]
    fn identical_repeat_is_suppressed_while_open() {
        let mut gate = FeedbackGate::new(FeedbackConfig { cooldown_frames: 2 });
        let reduce = correction(JointAngleName::RightFoot, Adjustment::Reduce);

        assert_eq!(gate.consider(&[reduce]), Some(reduce));
        assert_eq!(gate.consider(&[reduce]), None);
        assert_eq!(gate.consider(&[reduce]), None);
        assert_eq!(gate.cooldown(), 0);

        assert_eq!(gate.consider(&[reduce]), None);
        assert_eq!(gate.cooldown(), 0);
        assert_eq!(gate.last_emitted(), Some(&reduce));
    }

    #[test]
    fn empty_suggestions_emit_nothing() {
        let mut gate = FeedbackGate::default();
        assert_eq!(gate.consider(&[]), None);
        assert_eq!(gate.cooldown(), 0);
        assert!(gate.last_emitted().is_none());
    }

    #[test]
    fn reset_forgets_last_emission() {
        let mut gate = FeedbackGate::default();
        let reduce = correction(JointAngleName::LeftThigh, Adjustment::Reduce);
        gate.consider(&[reduce]);
        gate.reset();
        assert_eq!(gate.consider(&[reduce]), Some(reduce));
    }
}

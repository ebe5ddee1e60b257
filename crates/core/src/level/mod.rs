use std::{collections::VecDeque, fmt};

use serde::Serialize;

use crate::LevelConfig;

/// Skill tier derived from the rolling mean of recent accuracies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Tiers in ascending order.
    pub const ALL: [SkillLevel; 4] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ];

    /// Minimum rolling-mean accuracy for the tier.
    pub fn threshold(self) -> f32 {
        match self {
            SkillLevel::Beginner => 75.0,
            SkillLevel::Intermediate => 85.0,
            SkillLevel::Advanced => 92.0,
            SkillLevel::Expert => 97.0,
        }
    }

    /// Highest tier whose threshold `average` meets. Beginner is the floor.
    pub fn for_average(average: f32) -> Self {
        Self::ALL
            .into_iter()
            .filter(|level| average >= level.threshold())
            .last()
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelChangeEvent {
    pub previous: SkillLevel,
    pub level: SkillLevel,
    /// Rolling mean that triggered the change.
    pub average: f32,
}

impl LevelChangeEvent {
    pub fn announcement(&self) -> String {
        format!("Congratulations! You are now at {} level!", self.level)
    }
}

/// Rolling window of overall accuracies and the tier derived from it.
#[derive(Debug, Clone)]
pub struct LevelTracker {
    history: VecDeque<f32>,
    window: usize,
    min_samples: usize,
    level: SkillLevel,
}

impl Default for LevelTracker {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}

impl LevelTracker {
    pub fn new(config: LevelConfig) -> Self {
        let window = config.window.max(1);
        Self {
            history: VecDeque::with_capacity(window + 1),
            window,
            min_samples: config.min_samples.clamp(1, window),
            level: SkillLevel::default(),
        }
    }

    pub fn level(&self) -> SkillLevel {
        self.level
    }

    /// Samples currently in the window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Mean of the window, if any sample exists.
    pub fn average(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f32>() / self.history.len() as f32)
    }

    /// Appends a sample and re-derives the tier once enough samples exist.
    pub fn record(&mut self, overall: f32) -> Option<LevelChangeEvent> {
        self.history.push_back(overall);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        if self.history.len() < self.min_samples {
            return None;
        }

        let average = self.average()?;
        let level = SkillLevel::for_average(average);
        if level == self.level {
            return None;
        }

        let event = LevelChangeEvent {
            previous: self.level,
            level,
            average,
        };
        self.level = level;
        tracing::info!(previous = %event.previous, level = %level, average, "skill level changed");
        Some(event)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.level = SkillLevel::default();
    }
}

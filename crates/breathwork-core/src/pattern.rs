//! Breathing pattern descriptors.
//!
//! A [`BreathingPattern`] is immutable once built and always valid: inhale and
//! exhale last at least one second, the two holds may be zero (skipped).
//! Deserialization runs through the same validation as [`BreathingPattern::new`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Phase;

/// Display theme the UI paints a pattern with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Primary,
    Secondary,
    Accent,
    Success,
}

/// Per-phase durations in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub inhale: u32,
    pub hold1: u32,
    pub exhale: u32,
    pub hold2: u32,
}

impl PhaseTimings {
    pub const fn new(inhale: u32, hold1: u32, exhale: u32, hold2: u32) -> Self {
        Self {
            inhale,
            hold1,
            exhale,
            hold2,
        }
    }

    /// Configured seconds for `phase`. Zero means the phase is skipped.
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold1 => self.hold1,
            Phase::Exhale => self.exhale,
            Phase::Hold2 => self.hold2,
        }
    }

    /// Length of one full cycle in seconds.
    pub fn cycle_secs(&self) -> u64 {
        [self.inhale, self.hold1, self.exhale, self.hold2]
            .iter()
            .map(|&s| u64::from(s))
            .sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inhale == 0 {
            return Err(ValidationError::ZeroPhase { phase: "inhale" });
        }
        if self.exhale == 0 {
            return Err(ValidationError::ZeroPhase { phase: "exhale" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PatternRecord")]
pub struct BreathingPattern {
    id: String,
    name: String,
    description: String,
    color_theme: ColorTheme,
    #[serde(flatten)]
    timings: PhaseTimings,
}

/// Unvalidated wire form of a pattern.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    color_theme: ColorTheme,
    #[serde(flatten)]
    timings: PhaseTimings,
}

impl TryFrom<PatternRecord> for BreathingPattern {
    type Error = ValidationError;

    fn try_from(record: PatternRecord) -> Result<Self, Self::Error> {
        Ok(BreathingPattern::new(record.id, record.name, record.timings)?
            .with_description(record.description)
            .with_color_theme(record.color_theme))
    }
}

impl BreathingPattern {
    /// Build a pattern, rejecting zero-length inhale or exhale.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        timings: PhaseTimings,
    ) -> Result<Self, ValidationError> {
        timings.validate()?;
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::invalid("id", "pattern id must not be empty"));
        }
        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            color_theme: ColorTheme::default(),
            timings,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color_theme(mut self, color_theme: ColorTheme) -> Self {
        self.color_theme = color_theme;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn color_theme(&self) -> ColorTheme {
        self.color_theme
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        self.timings.duration_of(phase)
    }

    /// Breaths per minute if the pattern is followed without pause.
    pub fn breaths_per_minute(&self) -> f64 {
        60.0 / self.timings.cycle_secs() as f64
    }
}

//! Static exercise catalog.
//!
//! Four breathing exercises seeded at startup, read-only afterwards. The wire
//! shape nests the phase durations under `steps`:
//!
//! ```json
//! {"id":"4-7-8","name":"4-7-8 Technique","description":"Relaxation breath",
//!  "colorTheme":"secondary","steps":{"inhale":4,"hold1":7,"exhale":8,"hold2":0}}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ValidationError};
use crate::pattern::{BreathingPattern, ColorTheme, PhaseTimings};

/// Exercise id selected on first run.
pub const DEFAULT_EXERCISE_ID: &str = "box-breathing";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color_theme: ColorTheme,
    pub steps: PhaseTimings,
}

impl Exercise {
    pub fn to_pattern(&self) -> Result<BreathingPattern, ValidationError> {
        Ok(BreathingPattern::new(&self.id, &self.name, self.steps)?
            .with_description(&self.description)
            .with_color_theme(self.color_theme))
    }
}

impl From<&BreathingPattern> for Exercise {
    fn from(pattern: &BreathingPattern) -> Self {
        Self {
            id: pattern.id().to_string(),
            name: pattern.name().to_string(),
            description: pattern.description().to_string(),
            color_theme: pattern.color_theme(),
            steps: pattern.timings(),
        }
    }
}

/// Read access to the exercise catalog.
pub trait ExerciseStore: Send + Sync {
    /// All exercises in seed order.
    fn list_exercises(&self) -> Vec<Exercise>;

    fn get_exercise(&self, id: &str) -> Option<Exercise>;

    /// Look up `id` and convert it to a validated pattern.
    fn pattern(&self, id: &str) -> crate::error::Result<BreathingPattern> {
        let exercise = self
            .get_exercise(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        Ok(exercise.to_pattern()?)
    }
}

/// In-memory catalog.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    exercises: Vec<Exercise>,
}

impl MemoryCatalog {
    /// Catalog holding the four built-in exercises.
    pub fn seeded() -> Self {
        Self {
            exercises: builtin_exercises(),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ExerciseStore for MemoryCatalog {
    fn list_exercises(&self) -> Vec<Exercise> {
        self.exercises.clone()
    }

    fn get_exercise(&self, id: &str) -> Option<Exercise> {
        self.exercises.iter().find(|e| e.id == id).cloned()
    }
}

fn exercise(
    id: &str,
    name: &str,
    description: &str,
    color_theme: ColorTheme,
    steps: PhaseTimings,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        color_theme,
        steps,
    }
}

fn builtin_exercises() -> Vec<Exercise> {
    vec![
        exercise(
            "box-breathing",
            "Box Breathing",
            "Inhale, Hold, Exhale, Hold",
            ColorTheme::Primary,
            PhaseTimings::new(4, 4, 4, 4),
        ),
        exercise(
            "4-7-8",
            "4-7-8 Technique",
            "Relaxation breath",
            ColorTheme::Secondary,
            PhaseTimings::new(4, 7, 8, 0),
        ),
        exercise(
            "deep-calm",
            "Deep Calm",
            "Stress relief breathing",
            ColorTheme::Accent,
            PhaseTimings::new(6, 2, 7, 0),
        ),
        exercise(
            "energizing",
            "Energizing Breath",
            "Morning activation",
            ColorTheme::Success,
            PhaseTimings::new(2, 0, 2, 0),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn seeded_order_is_stable() {
        let ids: Vec<_> = MemoryCatalog::seeded()
            .list_exercises()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["box-breathing", "4-7-8", "deep-calm", "energizing"]);
    }

    #[test]
    fn every_builtin_is_a_valid_pattern() {
        let catalog = MemoryCatalog::seeded();
        for e in catalog.list_exercises() {
            assert!(e.to_pattern().is_ok(), "{} should validate", e.id);
        }
    }

    #[test]
    fn get_unknown_is_none() {
        let catalog = MemoryCatalog::seeded();
        assert!(catalog.get_exercise("wim-hof").is_none());
        assert!(matches!(
            catalog.pattern("wim-hof"),
            Err(CoreError::Catalog(CatalogError::NotFound(_)))
        ));
    }

    #[test]
    fn default_exercise_exists() {
        let p = MemoryCatalog::seeded().pattern(DEFAULT_EXERCISE_ID).unwrap();
        assert_eq!(p.timings(), PhaseTimings::new(4, 4, 4, 4));
    }

    #[test]
    fn wire_shape_nests_steps() {
        let e = MemoryCatalog::seeded().get_exercise("deep-calm").unwrap();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["colorTheme"], "accent");
        assert_eq!(json["steps"]["inhale"], 6);
        assert_eq!(json["steps"]["hold2"], 0);
    }

    #[test]
    fn pattern_converts_back_to_exercise() {
        let catalog = MemoryCatalog::seeded();
        let original = catalog.get_exercise("4-7-8").unwrap();
        let pattern = original.to_pattern().unwrap();
        assert_eq!(Exercise::from(&pattern), original);
    }
}

use serde::{Deserialize, Serialize};

use crate::pattern::PhaseTimings;

/// One segment of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    /// Hold after inhaling.
    Hold1,
    Exhale,
    /// Hold after exhaling.
    Hold2,
}

impl Phase {
    /// Human-readable label. Both holds read "Hold".
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Hold1 | Phase::Hold2 => "Hold",
            Phase::Exhale => "Exhale",
        }
    }

    /// Cyclic successor under `timings`; zero-length holds are skipped.
    ///
    /// Inhale and exhale are assumed non-zero (guaranteed by
    /// [`PhaseTimings::validate`]).
    pub fn next(self, timings: &PhaseTimings) -> Phase {
        match self {
            Phase::Inhale if timings.hold1 > 0 => Phase::Hold1,
            Phase::Inhale | Phase::Hold1 => Phase::Exhale,
            Phase::Exhale if timings.hold2 > 0 => Phase::Hold2,
            Phase::Exhale | Phase::Hold2 => Phase::Inhale,
        }
    }

    /// `self` if it has a duration under `timings`, otherwise its successor.
    ///
    /// Used when a new pattern lands while the engine sits on a hold the new
    /// pattern skips.
    pub fn settle(self, timings: &PhaseTimings) -> Phase {
        if timings.duration_of(self) == 0 {
            self.next(timings)
        } else {
            self
        }
    }
}

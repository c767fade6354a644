use serde::Serialize;

use crate::timer::Phase;

/// Track id meaning "no background sound".
pub const NO_BACKGROUND: &str = "none";

/// Background tracks sit well under the cues.
pub const BACKGROUND_GAIN: f32 = 0.15;

/// Synthesized cue: a sine tone with a 50 ms attack decaying to silence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CueTone {
    pub frequency_hz: f32,
    pub attack_ms: u32,
    pub length_ms: u32,
    pub peak_gain: f32,
}

/// Continuous background drone with slow frequency modulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundTone {
    pub track: &'static str,
    pub frequency_hz: f32,
    /// Modulation depth as a fraction of `frequency_hz`.
    pub modulation: f32,
    pub lfo_hz: f32,
}

pub fn cue_tone(phase: Phase) -> CueTone {
    let frequency_hz = match phase {
        Phase::Inhale => 440.0,
        Phase::Hold1 | Phase::Hold2 => 392.0,
        Phase::Exhale => 329.63,
    };
    CueTone {
        frequency_hz,
        attack_ms: 50,
        length_ms: 300,
        peak_gain: 0.3,
    }
}

const OCEAN: BackgroundTone = BackgroundTone {
    track: "ocean",
    frequency_hz: 77.0,
    modulation: 0.1,
    lfo_hz: 0.2,
};

const FOREST: BackgroundTone = BackgroundTone {
    track: "forest",
    frequency_hz: 196.0,
    modulation: 0.05,
    lfo_hz: 0.2,
};

/// Tone for `track`. Unknown ids play the ocean drone; `"none"` plays nothing.
pub fn background_tone(track: &str) -> Option<BackgroundTone> {
    match track {
        NO_BACKGROUND | "" => None,
        "forest" => Some(FOREST),
        _ => Some(OCEAN),
    }
}

/// Linear gain for a 0..=100 volume, clamped.
pub(crate) fn gain(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

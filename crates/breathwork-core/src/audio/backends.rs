use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use super::tones::{background_tone, cue_tone, gain, BACKGROUND_GAIN};
use super::AudioService;
use crate::timer::Phase;

/// One call made against an [`AudioService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AudioCommand {
    Init,
    Shutdown,
    PlayCue { phase: Phase, volume: u8 },
    PlayBackground { track: String, volume: u8 },
    StopBackground,
    StopCues,
    SetVolume { volume: u8 },
}

/// Discards every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioService for SilentAudio {
    fn play_cue(&self, _phase: Phase, _volume: u8) {}
    fn play_background(&self, _track: &str, _volume: u8) {}
    fn stop_background(&self) {}
    fn stop_cues(&self) {}
    fn set_volume(&self, _volume: u8) {}
}

/// Records commands in call order.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    log: Mutex<Vec<AudioCommand>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<AudioCommand>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, command: AudioCommand) {
        self.log().push(command);
    }

    pub fn commands(&self) -> Vec<AudioCommand> {
        self.log().clone()
    }

    pub fn take_commands(&self) -> Vec<AudioCommand> {
        std::mem::take(&mut *self.log())
    }
}

impl AudioService for RecordingAudio {
    fn init(&self) {
        self.push(AudioCommand::Init);
    }

    fn shutdown(&self) {
        self.push(AudioCommand::Shutdown);
    }

    fn play_cue(&self, phase: Phase, volume: u8) {
        self.push(AudioCommand::PlayCue { phase, volume });
    }

    fn play_background(&self, track: &str, volume: u8) {
        self.push(AudioCommand::PlayBackground {
            track: track.to_string(),
            volume,
        });
    }

    fn stop_background(&self) {
        self.push(AudioCommand::StopBackground);
    }

    fn stop_cues(&self) {
        self.push(AudioCommand::StopCues);
    }

    fn set_volume(&self, volume: u8) {
        self.push(AudioCommand::SetVolume { volume });
    }
}

/// Logs what would be synthesized instead of producing sound.
///
/// Keeps track of the playing background so volume changes can report the
/// effective gain.
#[derive(Debug, Default)]
pub struct TracingAudio {
    background: Mutex<Option<String>>,
}

impl TracingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn background(&self) -> MutexGuard<'_, Option<String>> {
        self.background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AudioService for TracingAudio {
    fn init(&self) {
        tracing::debug!("audio: device opened");
    }

    fn shutdown(&self) {
        tracing::debug!("audio: device closed");
    }

    fn play_cue(&self, phase: Phase, volume: u8) {
        let tone = cue_tone(phase);
        tracing::info!(
            phase = phase.label(),
            frequency_hz = tone.frequency_hz,
            gain = tone.peak_gain * gain(volume),
            "audio: cue"
        );
    }

    fn play_background(&self, track: &str, volume: u8) {
        let mut current = self.background();
        *current = None;
        match background_tone(track) {
            Some(tone) => {
                tracing::info!(
                    track = tone.track,
                    frequency_hz = tone.frequency_hz,
                    gain = gain(volume) * BACKGROUND_GAIN,
                    "audio: background started"
                );
                *current = Some(tone.track.to_string());
            }
            None => tracing::debug!(track, "audio: no background for track"),
        }
    }

    fn stop_background(&self) {
        if let Some(track) = self.background().take() {
            tracing::info!(track = %track, "audio: background stopped");
        }
    }

    fn stop_cues(&self) {
        tracing::debug!("audio: cue channel silenced");
    }

    fn set_volume(&self, volume: u8) {
        match self.background().as_deref() {
            Some(track) => tracing::info!(
                track,
                gain = gain(volume) * BACKGROUND_GAIN,
                "audio: background volume"
            ),
            None => tracing::debug!(volume, "audio: volume set with no background playing"),
        }
    }
}

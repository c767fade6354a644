//! Audio service seam.
//!
//! The timing engine only issues commands; how a cue or background track is
//! produced is up to the [`AudioService`] implementation. Implementations never
//! report failures back to the engine: a broken audio device must not stall the
//! breathing cadence, so problems are logged and swallowed.
//!
//! The service is a process-wide singleton. Install it once with [`install`],
//! hand [`shared`] to each engine, and call [`shutdown`] on exit.

mod backends;
mod tones;

pub use backends::{AudioCommand, RecordingAudio, SilentAudio, TracingAudio};
pub use tones::{background_tone, cue_tone, BackgroundTone, CueTone, BACKGROUND_GAIN, NO_BACKGROUND};

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Phase;

/// Every audio backend implements this trait.
pub trait AudioService: Send + Sync {
    /// Acquire the output device. Called once by [`install`].
    fn init(&self) {}

    /// Release the output device.
    fn shutdown(&self) {}

    /// Short tone marking the start of `phase`.
    fn play_cue(&self, phase: Phase, volume: u8);

    /// Start `track`, replacing whatever background is playing.
    fn play_background(&self, track: &str, volume: u8);

    fn stop_background(&self);

    /// Silence the cue channel.
    fn stop_cues(&self);

    /// Re-apply the volume to the playing background track without restarting it.
    fn set_volume(&self, volume: u8);
}

/// Audio preferences the engine passes through to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    /// Background track id, or `"none"`.
    pub background: String,
    /// 0..=100
    pub volume: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            background: "ocean".into(),
            volume: 80,
        }
    }
}

impl AudioSettings {
    pub fn has_background(&self) -> bool {
        !self.background.is_empty() && self.background != NO_BACKGROUND
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.volume > 100 {
            return Err(ValidationError::invalid(
                "volume",
                format!("{} is outside 0..=100", self.volume),
            ));
        }
        Ok(())
    }
}

static SERVICE: OnceLock<Arc<dyn AudioService>> = OnceLock::new();

/// Install the process-wide audio service and initialise it.
///
/// Returns `false` (and leaves the existing service in place) if one was
/// already installed.
pub fn install(service: Arc<dyn AudioService>) -> bool {
    let candidate = Arc::clone(&service);
    if SERVICE.set(candidate).is_err() {
        tracing::warn!("audio service already installed; ignoring replacement");
        return false;
    }
    service.init();
    true
}

/// The installed service, or a silent one if nothing was installed.
pub fn shared() -> Arc<dyn AudioService> {
    SERVICE
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(SilentAudio))
}

/// Stop everything and release the installed service's device.
pub fn shutdown() {
    if let Some(service) = SERVICE.get() {
        service.stop_cues();
        service.stop_background();
        service.shutdown();
    }
}

//! Terminal audio backend: rings the bell on every cue and leaves the rest
//! of the synthesis to the log.

use std::io::Write;

use breathwork_core::audio::TracingAudio;
use breathwork_core::{AudioService, Phase};

fn ring() -> std::io::Result<()> {
    let mut err = std::io::stderr();
    err.write_all(b"\x07")?;
    err.flush()
}

#[derive(Debug, Default)]
pub struct BellAudio {
    log: TracingAudio,
}

impl AudioService for BellAudio {
    fn init(&self) {
        self.log.init();
    }

    fn shutdown(&self) {
        self.log.shutdown();
    }

    fn play_cue(&self, phase: Phase, volume: u8) {
        self.log.play_cue(phase, volume);
        if volume == 0 {
            return;
        }
        if let Err(e) = ring() {
            tracing::warn!(error = %e, "could not ring terminal bell");
        }
    }

    fn play_background(&self, track: &str, volume: u8) {
        self.log.play_background(track, volume);
    }

    fn stop_background(&self) {
        self.log.stop_background();
    }

    fn stop_cues(&self) {
        self.log.stop_cues();
    }

    fn set_volume(&self, volume: u8) {
        self.log.set_volume(volume);
    }
}

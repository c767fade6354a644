//! Phase timing engine.
//!
//! The engine is an explicit state machine. It never sleeps or spawns: timers
//! are armed through a [`Scheduler`] and come back through [`PhaseEngine::fire`].
//!
//! ## Timers
//!
//! ```text
//! Countdown        every 1s while running   -> remaining -= 1, stop at 0
//! PhaseTransition  once, phase_duration     -> next phase, re-arm
//! ```
//!
//! Every firing carries the generation it was armed under. The generation is
//! bumped on start, pause, reset and pattern change, so a firing that was
//! already in flight when its timer got cancelled is dropped instead of
//! advancing the phase a second time.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PhaseEngine::new(pattern, 5, AudioSettings::default(), scheduler, audio::shared())?;
//! engine.start();
//! // host loop:
//! while let Some(firing) = rx.recv().await {
//!     if let Some(event) = engine.fire(firing) { /* render */ }
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::scheduler::{CancelToken, ManualScheduler, Scheduler, TimerFiring, TimerKind};
use crate::audio::{AudioService, AudioSettings};
use crate::error::ValidationError;
use crate::events::Event;
use crate::pattern::BreathingPattern;

const TICK: Duration = Duration::from_secs(1);

/// Observable session state, read by the UI on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub phase_label: String,
    pub phase_duration_secs: u32,
    pub remaining_secs: u64,
    pub is_running: bool,
}

pub struct PhaseEngine<S: Scheduler> {
    pattern: BreathingPattern,
    session_minutes: u32,
    audio_settings: AudioSettings,
    phase: Phase,
    phase_duration: u32,
    remaining_secs: u64,
    running: bool,
    generation: u64,
    countdown: Option<CancelToken>,
    phase_timer: Option<CancelToken>,
    scheduler: S,
    audio: Arc<dyn AudioService>,
    on_reset: Option<Box<dyn FnMut() + Send>>,
}

impl<S: Scheduler> PhaseEngine<S> {
    /// Create an idle engine positioned at Inhale with the full session ahead.
    pub fn new(
        pattern: BreathingPattern,
        session_minutes: u32,
        audio_settings: AudioSettings,
        scheduler: S,
        audio: Arc<dyn AudioService>,
    ) -> Result<Self, ValidationError> {
        validate_minutes(session_minutes)?;
        audio_settings.validate()?;
        let phase_duration = pattern.duration_of(Phase::Inhale);
        Ok(Self {
            pattern,
            session_minutes,
            audio_settings,
            phase: Phase::Inhale,
            phase_duration,
            remaining_secs: minutes_to_secs(session_minutes),
            running: false,
            generation: 0,
            countdown: None,
            phase_timer: None,
            scheduler,
            audio,
            on_reset: None,
        })
    }

    /// Register a callback invoked after every [`reset`](Self::reset).
    pub fn on_reset(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_reset = Some(Box::new(callback));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_label(&self) -> &'static str {
        self.phase.label()
    }

    pub fn phase_duration(&self) -> u32 {
        self.phase_duration
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn session_minutes(&self) -> u32 {
        self.session_minutes
    }

    pub fn audio_settings(&self) -> &AudioSettings {
        &self.audio_settings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            phase_duration_secs: self.phase_duration,
            remaining_secs: self.remaining_secs,
            is_running: self.running,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            pattern_id: self.pattern.id().to_string(),
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            phase_duration_secs: self.phase_duration,
            remaining_secs: self.remaining_secs,
            is_running: self.running,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or restart) pacing from the current phase at its full duration.
    ///
    /// No-op while running. A session that already counted down to zero
    /// starts over with the full duration.
    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.session_total_secs();
        }

        self.cancel_timers();
        self.generation += 1;
        self.running = true;

        if self.audio_settings.has_background() {
            self.audio
                .play_background(&self.audio_settings.background, self.audio_settings.volume);
        }
        if self.audio_settings.enabled {
            self.audio.play_cue(self.phase, self.audio_settings.volume);
        }

        let countdown = self.scheduler.schedule_repeating(
            TICK,
            TimerFiring {
                kind: TimerKind::Countdown,
                generation: self.generation,
            },
        );
        self.countdown = Some(countdown);
        self.arm_phase_timer();

        tracing::info!(
            pattern = self.pattern.id(),
            phase = ?self.phase,
            remaining_secs = self.remaining_secs,
            "session started"
        );
        Some(Event::SessionStarted {
            pattern_id: self.pattern.id().to_string(),
            phase: self.phase,
            phase_duration_secs: self.phase_duration,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop both timers and silence the cue channel. The background track
    /// keeps playing; see [`toggle_play_pause`](Self::toggle_play_pause).
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.cancel_timers();
        self.generation += 1;
        self.running = false;
        self.audio.stop_cues();

        tracing::info!(
            phase = ?self.phase,
            remaining_secs = self.remaining_secs,
            "session paused"
        );
        Some(Event::SessionPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Pause (and stop the background track) if running, otherwise start.
    pub fn toggle_play_pause(&mut self) -> Option<Event> {
        if self.running {
            let event = self.pause();
            self.audio.stop_background();
            event
        } else {
            self.start()
        }
    }

    /// Stop, rewind to Inhale and restore the full session duration.
    /// The engine stays idle.
    pub fn reset(&mut self) -> Event {
        self.pause();
        self.cancel_timers();
        self.generation += 1;
        self.remaining_secs = self.session_total_secs();
        self.phase = Phase::Inhale;
        self.phase_duration = self.pattern.duration_of(Phase::Inhale);

        if let Some(callback) = self.on_reset.as_mut() {
            callback();
        }

        tracing::info!(remaining_secs = self.remaining_secs, "session reset");
        Event::SessionReset {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    /// Swap the breathing pattern.
    ///
    /// While running this is a stop-then-start: the old timers are cancelled
    /// and the current phase restarts with the new pattern's duration. If the
    /// current phase is a hold the new pattern skips, the engine moves on to
    /// the following phase.
    pub fn set_pattern(&mut self, pattern: BreathingPattern) -> Option<Event> {
        let was_running = self.running;
        if was_running {
            self.pause();
        }

        self.pattern = pattern;
        self.phase = self.phase.settle(&self.pattern.timings());
        self.phase_duration = self.pattern.duration_of(self.phase);
        self.generation += 1;
        tracing::debug!(
            pattern = self.pattern.id(),
            phase = ?self.phase,
            phase_duration = self.phase_duration,
            "pattern changed"
        );

        if was_running {
            self.start()
        } else {
            None
        }
    }

    /// Change the session length. Applied immediately while idle; while
    /// running it takes effect at the next reset.
    pub fn set_session_minutes(&mut self, minutes: u32) -> Result<(), ValidationError> {
        validate_minutes(minutes)?;
        self.session_minutes = minutes;
        if !self.running {
            self.remaining_secs = self.session_total_secs();
        }
        Ok(())
    }

    /// Apply new audio settings without disturbing the phase cadence.
    pub fn set_audio_settings(&mut self, settings: AudioSettings) -> Result<(), ValidationError> {
        settings.validate()?;
        let old = std::mem::replace(&mut self.audio_settings, settings);
        let new = &self.audio_settings;

        if old.enabled && !new.enabled {
            self.audio.stop_cues();
        }

        if old.background != new.background {
            self.audio.stop_background();
            if self.running && new.has_background() {
                self.audio.play_background(&new.background, new.volume);
            }
        } else if old.volume != new.volume && self.running && new.has_background() {
            self.audio.set_volume(new.volume);
        }
        Ok(())
    }

    /// Deliver a timer firing. Firings from a superseded generation, or any
    /// firing while stopped, are ignored.
    pub fn fire(&mut self, firing: TimerFiring) -> Option<Event> {
        if !self.running || firing.generation != self.generation {
            tracing::debug!(
                kind = ?firing.kind,
                firing_generation = firing.generation,
                generation = self.generation,
                "discarding stale timer firing"
            );
            return None;
        }
        match firing.kind {
            TimerKind::Countdown => self.tick_countdown(),
            TimerKind::PhaseTransition => self.advance_phase(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn session_total_secs(&self) -> u64 {
        minutes_to_secs(self.session_minutes)
    }

    fn tick_countdown(&mut self) -> Option<Event> {
        if self.remaining_secs <= 1 {
            return self.complete();
        }
        self.remaining_secs -= 1;
        Some(Event::CountdownTick {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    fn complete(&mut self) -> Option<Event> {
        self.remaining_secs = 0;
        self.pause();
        self.audio.stop_background();
        tracing::info!(pattern = self.pattern.id(), "session completed");
        Some(Event::SessionCompleted {
            pattern_id: self.pattern.id().to_string(),
            at: Utc::now(),
        })
    }

    fn advance_phase(&mut self) -> Option<Event> {
        // Both timers start together with whole-second periods, so a phase
        // boundary seen with one second left lands on the final tick.
        if self.remaining_secs <= 1 {
            return self.complete();
        }

        // The one-shot that brought us here is spent.
        self.phase_timer = None;

        self.phase = self.phase.next(&self.pattern.timings());
        self.phase_duration = self.pattern.duration_of(self.phase);
        if self.audio_settings.enabled {
            self.audio.play_cue(self.phase, self.audio_settings.volume);
        }
        self.arm_phase_timer();

        Some(Event::PhaseChanged {
            phase: self.phase,
            label: self.phase.label().to_string(),
            duration_secs: self.phase_duration,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    fn arm_phase_timer(&mut self) {
        if let Some(token) = self.phase_timer.take() {
            self.scheduler.cancel(token);
        }
        let delay = Duration::from_secs(u64::from(self.phase_duration));
        tracing::debug!(phase = ?self.phase, ?delay, generation = self.generation, "arming phase timer");
        let token = self.scheduler.schedule_once(
            delay,
            TimerFiring {
                kind: TimerKind::PhaseTransition,
                generation: self.generation,
            },
        );
        self.phase_timer = Some(token);
    }

    fn cancel_timers(&mut self) {
        if let Some(token) = self.countdown.take() {
            self.scheduler.cancel(token);
        }
        if let Some(token) = self.phase_timer.take() {
            self.scheduler.cancel(token);
        }
    }
}

impl PhaseEngine<ManualScheduler> {
    /// Advance the virtual clock by `by`, delivering every firing that falls
    /// due on the way. Returns the events produced, in order.
    pub fn advance_by(&mut self, by: Duration) -> Vec<Event> {
        let target = self.scheduler.now() + by;
        let mut events = Vec::new();
        while let Some(firing) = self.scheduler.pop_due(target) {
            events.extend(self.fire(firing));
        }
        self.scheduler.set_now(target);
        events
    }

    pub fn advance_secs(&mut self, secs: u64) -> Vec<Event> {
        self.advance_by(Duration::from_secs(secs))
    }
}

impl<S: Scheduler> Drop for PhaseEngine<S> {
    fn drop(&mut self) {
        self.cancel_timers();
        self.audio.stop_cues();
        self.audio.stop_background();
    }
}

impl<S: Scheduler> fmt::Debug for PhaseEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseEngine")
            .field("pattern", &self.pattern.id())
            .field("session_minutes", &self.session_minutes)
            .field("phase", &self.phase)
            .field("phase_duration", &self.phase_duration)
            .field("remaining_secs", &self.remaining_secs)
            .field("running", &self.running)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

fn validate_minutes(minutes: u32) -> Result<(), ValidationError> {
    if minutes == 0 {
        return Err(ValidationError::invalid(
            "session_minutes",
            "session must last at least one minute",
        ));
    }
    Ok(())
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

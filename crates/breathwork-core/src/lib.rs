//! # Breathwork Core Library
//!
//! This library provides the core logic for Breathwork, a guided-breathing
//! timer. The CLI binary is a thin layer over the same library; any other host
//! (desktop shell, web bridge) drives the same engine.
//!
//! ## Architecture
//!
//! - **Phase Engine**: A scheduler-driven state machine that paces inhale, hold
//!   and exhale phases and counts the session down. It arms timers through a
//!   [`Scheduler`] and the host hands firings back via [`PhaseEngine::fire`]
//! - **Audio**: A process-wide [`AudioService`] the engine sends cue and
//!   background commands to
//! - **Catalog**: The four built-in breathing exercises
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PhaseEngine`]: Core timing state machine
//! - [`BreathingPattern`]: Validated per-phase durations
//! - [`ExerciseStore`]: Read access to the exercise catalog
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod catalog;
pub mod error;
pub mod events;
pub mod pattern;
pub mod storage;
pub mod timer;

pub use audio::{AudioService, AudioSettings};
pub use catalog::{Exercise, ExerciseStore, MemoryCatalog};
pub use error::{CatalogError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use pattern::{BreathingPattern, ColorTheme, PhaseTimings};
pub use storage::Config;
pub use timer::{
    format_clock, ManualScheduler, Phase, PhaseEngine, Scheduler, SessionState, TimerFiring,
    TimerKind, TokioScheduler,
};

mod clock;
mod engine;
mod phase;
mod scheduler;

pub use clock::{format_clock, phase_progress};
pub use engine::{PhaseEngine, SessionState};
pub use phase::Phase;
pub use scheduler::{
    CancelToken, ManualScheduler, Scheduler, TimerFiring, TimerKind, TokioScheduler, MAX_SPEED,
    MIN_SPEED,
};

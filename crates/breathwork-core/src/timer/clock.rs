use std::time::Duration;

/// Remaining-time readout, `m:ss`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// 0.0 .. 1.0 progress through a phase of `duration_secs`, given how long
/// the host has been in it.
pub fn phase_progress(elapsed: Duration, duration_secs: u32) -> f64 {
    if duration_secs == 0 {
        return 1.0;
    }
    (elapsed.as_secs_f64() / f64::from(duration_secs)).clamp(0.0, 1.0)
}

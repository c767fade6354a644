use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use breathwork_core::audio::{self, RecordingAudio};
use breathwork_core::timer::phase_progress;
use breathwork_core::{
    format_clock, AudioSettings, BreathingPattern, Config, Event, ExerciseStore, ManualScheduler,
    MemoryCatalog, PhaseEngine, TokioScheduler,
};
use clap::{Args, Subcommand};
use tokio::time::Instant;

use crate::bell::BellAudio;

const BAR_WIDTH: usize = 20;
const REDRAW: Duration = Duration::from_millis(250);

#[derive(Args)]
pub struct SessionOpts {
    /// Exercise ID (defaults to session.pattern from config)
    #[arg(long)]
    pattern: Option<String>,
    /// Session length in minutes
    #[arg(long)]
    minutes: Option<u32>,
    /// Disable phase cues
    #[arg(long)]
    no_audio: bool,
    /// Background track: ocean, forest or none
    #[arg(long)]
    sound: Option<String>,
    /// Volume 0-100
    #[arg(long)]
    volume: Option<u8>,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a live session in the terminal (Ctrl-C stops)
    Run {
        #[command(flatten)]
        opts: SessionOpts,
        /// Run timers this many times faster than real time (0.01 to 1000)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Run a session on a virtual clock and print events as JSON lines
    Simulate {
        #[command(flatten)]
        opts: SessionOpts,
        /// Virtual seconds to advance
        #[arg(long)]
        seconds: u64,
        /// Also print the audio commands the engine issued
        #[arg(long)]
        audio_log: bool,
    },
}

/// Session parameters after merging command-line flags over the config file.
struct Resolved {
    pattern: BreathingPattern,
    minutes: u32,
    audio: AudioSettings,
}

impl SessionOpts {
    fn resolve(self) -> Result<Resolved, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let id = self.pattern.unwrap_or(config.session.pattern);
        let pattern = MemoryCatalog::seeded().pattern(&id)?;

        let mut audio = config.audio;
        if self.no_audio {
            audio.enabled = false;
        }
        if let Some(sound) = self.sound {
            audio.background = sound;
        }
        if let Some(volume) = self.volume {
            audio.volume = volume;
        }

        Ok(Resolved {
            pattern,
            minutes: self.minutes.unwrap_or(config.session.duration_minutes),
            audio,
        })
    }
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run { opts, speed } => {
            let resolved = opts.resolve()?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(resolved, speed))
        }
        SessionAction::Simulate {
            opts,
            seconds,
            audio_log,
        } => simulate(opts.resolve()?, seconds, audio_log),
    }
}

async fn run_live(resolved: Resolved, speed: f64) -> Result<(), Box<dyn std::error::Error>> {
    let (scheduler, mut rx) = TokioScheduler::new();
    let scheduler = scheduler.with_speed(speed)?;
    audio::install(Arc::new(BellAudio::default()));

    let mut engine = PhaseEngine::new(
        resolved.pattern,
        resolved.minutes,
        resolved.audio,
        scheduler,
        audio::shared(),
    )?;

    println!(
        "{} for {} min. Ctrl-C to stop.",
        engine.pattern().name(),
        resolved.minutes
    );

    let mut phase_started = Instant::now();
    if let Some(event) = engine.start() {
        render_event(&event);
    }

    let mut redraw = tokio::time::interval(REDRAW);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            firing = rx.recv() => {
                let Some(firing) = firing else { break };
                let Some(event) = engine.fire(firing) else { continue };
                if matches!(event, Event::PhaseChanged { .. }) {
                    phase_started = Instant::now();
                }
                render_event(&event);
                if matches!(event, Event::SessionCompleted { .. }) {
                    break;
                }
            }
            _ = redraw.tick() => {
                let elapsed = phase_started.elapsed().mul_f64(speed);
                render_status(&engine, phase_progress(elapsed, engine.phase_duration()))?;
            }
            _ = &mut ctrl_c => {
                engine.toggle_play_pause();
                println!();
                println!("stopped with {} left", format_clock(engine.remaining_secs()));
                break;
            }
        }
    }

    drop(engine);
    audio::shutdown();
    Ok(())
}

fn render_event(event: &Event) {
    match event {
        Event::SessionStarted {
            phase,
            phase_duration_secs,
            ..
        } => {
            println!("{} ({}s)", phase.label(), phase_duration_secs);
        }
        Event::PhaseChanged {
            label,
            duration_secs,
            ..
        } => {
            println!();
            println!("{label} ({duration_secs}s)");
        }
        Event::SessionCompleted { .. } => {
            println!();
            println!(
                "Session complete at {}",
                chrono::Local::now().format("%H:%M")
            );
        }
        _ => {}
    }
}

fn render_status(
    engine: &PhaseEngine<TokioScheduler>,
    progress: f64,
) -> std::io::Result<()> {
    let filled = ((progress * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let mut out = std::io::stdout();
    write!(
        out,
        "\r{:<6} [{}{}] {}",
        engine.phase_label(),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        format_clock(engine.remaining_secs())
    )?;
    out.flush()
}

fn simulate(
    resolved: Resolved,
    seconds: u64,
    audio_log: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = Arc::new(RecordingAudio::new());
    let mut engine = PhaseEngine::new(
        resolved.pattern,
        resolved.minutes,
        resolved.audio,
        ManualScheduler::new(),
        recorder.clone(),
    )?;

    let mut out = std::io::stdout().lock();
    let mut emit = |events: Vec<Event>| -> Result<bool, Box<dyn std::error::Error>> {
        let mut done = false;
        for event in &events {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
            done |= matches!(event, Event::SessionCompleted { .. });
        }
        if audio_log {
            for command in recorder.take_commands() {
                writeln!(out, "{}", serde_json::to_string(&command)?)?;
            }
        }
        Ok(done)
    };

    emit(engine.start().into_iter().collect())?;
    for _ in 0..seconds {
        if emit(engine.advance_secs(1))? {
            break;
        }
    }

    let snapshot = engine.snapshot();
    writeln!(out, "{}", serde_json::to_string(&snapshot)?)?;
    Ok(())
}

//! Headless driver — detection and render ticks on one calloop event loop.
//!
//! The two ticks are independent timers.  Each callback runs to completion
//! before the loop dispatches the next, so the render tick only ever sees
//! state committed by a whole detection tick.  Supports graceful signal
//! handling, an exit timer for CI, and periodic status logging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use tracing::{debug, info};

use super::KeypointSource;
use crate::engine::InteractionEngine;
use crate::scene::SceneSink;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Headless loop timing.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Detection tick period in milliseconds.
    pub detect_interval_ms: u64,
    /// Render tick period in milliseconds.
    pub render_interval_ms: u64,
    /// Longest single dispatch wait in milliseconds.
    pub poll_interval_ms: u64,
    /// Seconds between status log lines.
    pub status_interval_s: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            detect_interval_ms: 33,
            render_interval_ms: 16,
            poll_interval_ms: 100,
            status_interval_s: 60,
        }
    }
}

/// Totals reported when the loop exits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub detect_ticks: u64,
    pub render_ticks: u64,
    pub events: u64,
    pub blocks: usize,
    pub yaw: f32,
}

struct LoopState {
    engine: InteractionEngine,
    source: Box<dyn KeypointSource>,
    sink: Box<dyn SceneSink>,
    started: Instant,
    running: bool,
    render_ticks: u64,
    events: u64,
}

impl LoopState {
    fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn detect(&mut self) {
        let now = self.elapsed_ms();
        let Some(batch) = self.source.next_batch(now) else {
            info!("Keypoint source {} exhausted", self.source.name());
            self.running = false;
            return;
        };
        for event in self.engine.update(&batch.frames, batch.timestamp_ms) {
            debug!("{}", event.to_sexp());
            self.events += 1;
        }
    }

    fn render(&mut self) {
        let snapshot = self.engine.snapshot();
        self.sink.present(&snapshot);
        self.render_ticks += 1;
    }
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Drive `engine` from `source` until the source runs dry, a signal
/// arrives, or `exit_after` elapses.
pub fn run(
    engine: InteractionEngine,
    source: Box<dyn KeypointSource>,
    sink: Box<dyn SceneSink>,
    exit_after: Option<Duration>,
    config: HeadlessConfig,
) -> anyhow::Result<RunSummary> {
    let mut event_loop = EventLoop::<LoopState>::try_new()?;
    let handle = event_loop.handle();

    let detect_interval = Duration::from_millis(config.detect_interval_ms.max(1));
    handle
        .insert_source(
            Timer::from_duration(detect_interval),
            move |_, _, state: &mut LoopState| {
                if state.running {
                    state.detect();
                }
                TimeoutAction::ToDuration(detect_interval)
            },
        )
        .map_err(|e| anyhow!("failed to insert detection timer: {}", e.error))?;

    let render_interval = Duration::from_millis(config.render_interval_ms.max(1));
    handle
        .insert_source(
            Timer::from_duration(render_interval),
            move |_, _, state: &mut LoopState| {
                if state.running {
                    state.render();
                }
                TimeoutAction::ToDuration(render_interval)
            },
        )
        .map_err(|e| anyhow!("failed to insert render timer: {}", e.error))?;

    // Signal handling via libc (avoids calloop version conflicts)
    install_signal_handlers();

    info!(
        "Headless loop initialized (source: {}, detect: {}ms, render: {}ms)",
        source.name(),
        config.detect_interval_ms,
        config.render_interval_ms
    );

    let mut state = LoopState {
        engine,
        source,
        sink,
        started: Instant::now(),
        running: true,
        render_ticks: 0,
        events: 0,
    };

    let mut last_status_log = Instant::now();
    let status_interval = Duration::from_secs(config.status_interval_s.max(1));
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    while state.running {
        // Check global shutdown flag (set by signal handler)
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            state.running = false;
            break;
        }

        // Exit timer for CI
        if let Some(dur) = exit_after {
            if state.started.elapsed() >= dur {
                info!("Exit timer fired after {:.1}s", dur.as_secs_f64());
                state.running = false;
                break;
            }
        }

        // Periodic status logging
        if last_status_log.elapsed() >= status_interval {
            info!(
                "Status: {} detection tick(s), {} event(s), {}",
                state.engine.ticks(),
                state.events,
                state.engine.structure().status_sexp()
            );
            last_status_log = Instant::now();
        }

        event_loop.dispatch(Some(poll_interval), &mut state)?;
    }

    let summary = RunSummary {
        detect_ticks: state.engine.ticks(),
        render_ticks: state.render_ticks,
        events: state.events,
        blocks: state.engine.structure().len(),
        yaw: state.engine.structure().yaw(),
    };
    info!(
        "Headless loop shutting down ({} detection tick(s), {} block(s), yaw {:.3})",
        summary.detect_ticks, summary.blocks, summary.yaw
    );
    Ok(summary)
}

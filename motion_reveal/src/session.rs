// THEORY:
// The `session` module is the top-level API of the engine. A `MotionRevealSession`
// owns everything one reveal needs: configuration, the grid model, the retained
// previous frame, the warm-up counter and the event subscribers. External code only
// ever feeds it frames, signals and images, and reads back reports.
//
// Per tick:
// 1.  Readiness gate: a viewport must be configured and, when the profile asks for
//     it, the reference image must be loaded. Ticks before that are dropped.
// 2.  Warm-up gate: the first `warmup_ticks` ready ticks only prime the previous
//     frame, letting camera exposure and focus settle.
// 3.  Analysis against the previous frame, then dispatch of newly revealed cells to
//     the subscribers.
// 4.  The current frame is moved into the "previous" slot. No pixel copy.
//
// A viewport change is a barrier: the retained frame is dropped so nothing is ever
// compared against a buffer of stale dimensions. Re-configuring with the same size
// is not a change and keeps the retained frame.

use crate::config::{SessionConfig, validate_threshold};
use crate::core_modules::cell_table::CellTable;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::grid::{AnchorMode, Grid};
use crate::core_modules::grid_model::GridModel;
use crate::core_modules::motion_analyzer::{Analysis, analyze};
use crate::core_modules::reveal_event::{RevealEvent, RevealSink};
use crate::error::{Result, RevealError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Coarse state of a reveal, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStatus {
    /// Viewport or reference image still missing.
    NotReady,
    /// Inside the warm-up period.
    Calibrating { remaining_ticks: u64 },
    /// Detecting, nothing revealed yet.
    WaitingForMotion,
    /// Some but not all cells revealed.
    Revealing,
    /// Every cell revealed.
    Complete,
}

/// Snapshot of how far the reveal has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealProgress {
    pub revealed: usize,
    pub total: usize,
    pub status: RevealStatus,
}

/// The outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// The session was not ready; the frame was discarded.
    NotReady,
    /// The frame was retained but detection is still suppressed.
    WarmingUp { remaining_ticks: u64 },
    /// The first ready frame: nothing to compare against yet.
    AwaitingPreviousFrame,
    /// Motion analysis ran.
    Analyzed(Analysis),
}

impl TickReport {
    /// Cells revealed during this tick.
    pub fn newly_revealed(&self) -> &[RevealEvent] {
        match self {
            TickReport::Analyzed(analysis) => &analysis.newly_revealed,
            _ => &[],
        }
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            TickReport::Analyzed(analysis) => Some(analysis),
            _ => None,
        }
    }
}

/// An owned motion-reveal session.
pub struct MotionRevealSession {
    config: SessionConfig,
    model: GridModel,
    previous: Option<FrameBuffer>,
    ticks_since_ready: u64,
    /// Last frame size warned about while it differs from the viewport.
    mismatched_frame: Option<(u32, u32)>,
    sinks: Vec<Box<dyn RevealSink>>,
}

impl MotionRevealSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let model = GridModel::new(config.columns, config.rows)?;
        Ok(Self {
            config,
            model,
            previous: None,
            ticks_since_ready: 0,
            mismatched_frame: None,
            sinks: Vec::new(),
        })
    }

    /// Sets or changes the viewport. A new size acts as a resize barrier: the
    /// retained previous frame is dropped. Revealed state always survives.
    pub fn configure(&mut self, viewport_width: u32, viewport_height: u32) -> Result<()> {
        let viewport = (viewport_width, viewport_height);
        let resized = self.model.grid().map(Grid::viewport) != Some(viewport);
        self.model.configure(
            viewport_width,
            viewport_height,
            self.config.columns,
            self.config.rows,
            self.config.anchor,
        )?;
        if resized {
            self.previous = None;
            self.mismatched_frame = None;
            info!(viewport_width, viewport_height, "viewport configured");
        }
        Ok(())
    }

    /// Changes the partition at runtime. Resets motion and revealed state.
    pub fn set_grid_size(&mut self, columns: u32, rows: u32) -> Result<()> {
        self.model.set_partition(columns, rows)?;
        self.config.columns = columns;
        self.config.rows = rows;
        Ok(())
    }

    /// Changes the grid anchor, e.g. when a centered reference image changes size.
    pub fn set_anchor(&mut self, anchor: AnchorMode) -> Result<()> {
        if let Some((width, height)) = self.model.grid().map(Grid::viewport) {
            self.model
                .configure(width, height, self.config.columns, self.config.rows, anchor)?;
        } else if let AnchorMode::Centered { width, height } = anchor {
            if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
                return Err(RevealError::InvalidContent { width, height });
            }
        }
        self.config.anchor = anchor;
        Ok(())
    }

    /// Takes effect on the very next analysis.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.config.threshold = threshold;
        Ok(())
    }

    /// Loads the reference image, before or after the camera is ready.
    pub fn set_reference_image(&mut self, image: FrameBuffer) {
        self.model
            .set_reference(image, self.config.reference_sample_stride);
    }

    /// Registers a subscriber for reveal events.
    pub fn subscribe(&mut self, sink: impl RevealSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn is_ready(&self) -> bool {
        self.model.grid().is_some() && (self.model.has_reference() || !self.config.wait_for_reference)
    }

    /// Processes one camera frame, timestamping events with the system clock.
    pub fn tick(&mut self, frame: FrameBuffer) -> TickReport {
        self.tick_at(frame, now_millis())
    }

    /// Processes one camera frame with an explicit event timestamp.
    pub fn tick_at(&mut self, frame: FrameBuffer, timestamp_millis: u64) -> TickReport {
        let Some(viewport) = self.model.grid().map(Grid::viewport) else {
            return TickReport::NotReady;
        };
        if !self.is_ready() {
            return TickReport::NotReady;
        }
        self.note_frame_size(frame.dimensions(), viewport);

        self.ticks_since_ready += 1;
        let report = if self.ticks_since_ready <= self.config.warmup_ticks {
            TickReport::WarmingUp {
                remaining_ticks: self.config.warmup_ticks - self.ticks_since_ready,
            }
        } else if self.previous.is_none() {
            TickReport::AwaitingPreviousFrame
        } else {
            let params = self.config.analysis_params();
            let analysis = analyze(
                self.previous.as_ref(),
                Some(&frame),
                &mut self.model,
                &params,
                timestamp_millis,
            );
            self.dispatch(&analysis.newly_revealed);
            TickReport::Analyzed(analysis)
        };

        self.previous = Some(frame);
        self.log_progress(&report);
        report
    }

    fn note_frame_size(&mut self, frame: (u32, u32), viewport: (u32, u32)) {
        if frame == viewport {
            self.mismatched_frame = None;
            return;
        }
        if self.mismatched_frame == Some(frame) {
            debug!(frame_width = frame.0, frame_height = frame.1, "frame size still differs from viewport");
            return;
        }
        self.mismatched_frame = Some(frame);
        warn!(
            frame_width = frame.0,
            frame_height = frame.1,
            viewport_width = viewport.0,
            viewport_height = viewport.1,
            "frame size differs from viewport, out-of-range samples will be skipped"
        );
    }

    fn dispatch(&mut self, events: &[RevealEvent]) {
        if !self.config.emit_brightness_events {
            return;
        }
        for event in events {
            for sink in self.sinks.iter_mut() {
                sink.on_reveal(event);
            }
        }
    }

    fn log_progress(&self, report: &TickReport) {
        let interval = self.config.log_interval_ticks;
        if interval > 0 && self.ticks_since_ready % interval == 0 {
            let progress = self.progress();
            debug!(
                tick = self.ticks_since_ready,
                revealed = progress.revealed,
                total = progress.total,
                "reveal progress"
            );
        }
        if !report.newly_revealed().is_empty() && self.model.all_revealed() {
            info!(tick = self.ticks_since_ready, "reference image fully revealed");
        }
    }

    /// Clears `revealed` for the given cells, or all cells when `None`.
    pub fn reset(&mut self, cells: Option<&[(u32, u32)]>) -> usize {
        let cleared = self.model.reset(cells);
        info!(cleared, "reveal reset");
        cleared
    }

    /// Clears every cell and restarts the warm-up period.
    pub fn recalibrate(&mut self) {
        self.model.reset(None);
        self.ticks_since_ready = 0;
        info!(warmup_ticks = self.config.warmup_ticks, "recalibrating");
    }

    /// Ends the session, returning the final progress.
    pub fn close(self) -> RevealProgress {
        let progress = self.progress();
        info!(
            revealed = progress.revealed,
            total = progress.total,
            "session closed"
        );
        progress
    }

    pub fn progress(&self) -> RevealProgress {
        let revealed = self.model.revealed_count();
        let total = self.model.revealed().len();
        let status = if !self.is_ready() {
            RevealStatus::NotReady
        } else if self.ticks_since_ready <= self.config.warmup_ticks {
            RevealStatus::Calibrating {
                remaining_ticks: self.config.warmup_ticks - self.ticks_since_ready,
            }
        } else if revealed == total {
            RevealStatus::Complete
        } else if revealed > 0 {
            RevealStatus::Revealing
        } else {
            RevealStatus::WaitingForMotion
        };
        RevealProgress {
            revealed,
            total,
            status,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.model.grid()
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn motion(&self) -> &CellTable<bool> {
        self.model.motion()
    }

    pub fn revealed(&self) -> &CellTable<bool> {
        self.model.revealed()
    }

    pub fn brightness(&self) -> Option<&CellTable<f64>> {
        self.model.brightness()
    }

    pub fn ticks_since_ready(&self) -> u64 {
        self.ticks_since_ready
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

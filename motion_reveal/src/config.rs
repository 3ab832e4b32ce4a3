// THEORY:
// `SessionConfig` is the single description of a deployment. One struct covers every
// profile; the presets mirror the two that exist in practice (a small windowed demo
// and a fullscreen installation). A config is validated once, when a session is
// built, so the per-tick path never re-checks it.

use crate::core_modules::grid::AnchorMode;
use crate::core_modules::motion_analyzer::AnalysisParams;
use crate::error::{Result, RevealError};

/// Configuration for a [`MotionRevealSession`](crate::session::MotionRevealSession).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Placement of the grid in the viewport.
    pub anchor: AnchorMode,
    /// Mean luminance delta a cell must exceed to count as moving. Raw
    /// luminance units (0..=255), not normalized; compared with strict `>`.
    pub threshold: f64,
    /// Camera sampling stride on both axes.
    pub sample_stride: u32,
    /// Reference-image sampling stride for brightness precomputation.
    pub reference_sample_stride: u32,
    /// Ticks after readiness during which no analysis runs.
    pub warmup_ticks: u64,
    /// Dispatch reveal events to subscribers.
    pub emit_brightness_events: bool,
    /// Readiness also requires the reference image to be loaded.
    pub wait_for_reference: bool,
    /// Score cells on the rayon pool.
    pub parallel: bool,
    /// Emit a progress debug line every N ticks (0 = never).
    pub log_interval_ticks: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::installation()
    }
}

impl SessionConfig {
    /// Fullscreen installation profile: 3x4 grid over the whole viewport, a
    /// sensitive threshold, sparse sampling and a long warm-up.
    pub fn installation() -> Self {
        Self {
            columns: 3,
            rows: 4,
            anchor: AnchorMode::Fullscreen,
            threshold: 25.0,
            sample_stride: 4,
            reference_sample_stride: 1,
            warmup_ticks: 60,
            emit_brightness_events: true,
            wait_for_reference: true,
            parallel: false,
            log_interval_ticks: 60,
        }
    }

    /// Windowed demo profile: a 270x480 2x3 grid centered in the viewport, full
    /// precision sampling, no warm-up and no events.
    pub fn windowed_demo() -> Self {
        Self {
            columns: 2,
            rows: 3,
            anchor: AnchorMode::Centered {
                width: 270.0,
                height: 480.0,
            },
            threshold: 30.0,
            sample_stride: 1,
            reference_sample_stride: 1,
            warmup_ticks: 0,
            emit_brightness_events: false,
            wait_for_reference: false,
            parallel: false,
            log_interval_ticks: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(RevealError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.sample_stride == 0 || self.reference_sample_stride == 0 {
            return Err(RevealError::ZeroStride);
        }
        validate_threshold(self.threshold)?;
        if let AnchorMode::Centered { width, height } = self.anchor {
            if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
                return Err(RevealError::InvalidContent { width, height });
            }
        }
        Ok(())
    }

    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            threshold: self.threshold,
            sample_stride: self.sample_stride,
            parallel: self.parallel,
        }
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(RevealError::InvalidThreshold(threshold))
    }
}

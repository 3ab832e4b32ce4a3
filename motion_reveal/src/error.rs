// THEORY:
// The error module lists the only failures the engine admits: caller mistakes.
// A bad configuration or a malformed buffer is rejected at construction time with a
// `RevealError`. Missing camera frames, or a reference image that never arrives, are
// "not ready" states handled by the session, never errors.

use thiserror::Error;

/// Errors raised by configuration and frame-buffer construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RevealError {
    #[error("grid must have at least one column and one row, got {columns}x{rows}")]
    EmptyGrid { columns: u32, rows: u32 },

    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },

    #[error("centered content must have a positive size, got {width}x{height}")]
    InvalidContent { width: f64, height: f64 },

    #[error("sample stride must be at least 1")]
    ZeroStride,

    #[error("threshold must be a finite, non-negative luminance value, got {0}")]
    InvalidThreshold(f64),

    #[error("unsupported channel count {0}: expected 3 (RGB) or 4 (RGBA)")]
    UnsupportedChannels(u8),

    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("cell table holds {actual} cells, expected {expected}")]
    CellCountMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RevealError>;

//! `spec.md` §7: the handful of operations that return `Result` — `init`,
//! `viewport`, `swap`, `free` — surface `PipelineError`. Every other
//! operation (draw calls, matrix-stack ops) reports through the message sink
//! and never returns an error value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("allocation failed while resizing framebuffer to {width}x{height}")]
    Allocation { width: u32, height: u32 },

    #[error("framebuffer was already initialized")]
    AlreadyInitialized,

    #[error("framebuffer must be initialized before this operation")]
    NotInitialized,

    #[error("present thread panicked or failed to join")]
    PresenterJoin,
}

pub type Result<T> = std::result::Result<T, PipelineError>;

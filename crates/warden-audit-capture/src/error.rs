//! Capture errors.

use thiserror::Error;
use warden_audit_filter::IndexError;
use warden_audit_processor::ProcessorError;
use warden_audit_sink::SinkError;
use warden_common_config::ConfigError;

/// Error raised while flushing a unit of work. The unit of work is back to
/// idle when this is returned.
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("processing failed: {0}")]
    Processor(#[from] ProcessorError),

    #[error("delivery failed: {0}")]
    Sink(#[from] SinkError),
}

/// Error assembling a pipeline from configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown pipeline: {name}")]
    UnknownPipeline { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid filter list: {0}")]
    Index(#[from] IndexError),

    #[error("cannot open sink: {0}")]
    Sink(#[from] SinkError),
}

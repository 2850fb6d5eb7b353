//! Error taxonomy shared across the core pipeline.
//!
//! Each component (`fetch`, `sink`) defines its own narrow error type; this
//! module composes them into the one `Error` the scheduler and CLI actually
//! propagate, the way the teacher crate layers `anyhow::Error` over typed
//! backend failures.

use crate::{fetch::FetchError, sink::SinkError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid flags, unparseable regex, malformed label/annotation, invalid URL,
    /// or a dotted-key collision in the materialized payload.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

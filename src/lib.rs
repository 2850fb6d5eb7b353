#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod fetch;
pub mod scheduler;
pub mod selector;
pub mod sink;
pub mod util;

pub use error::{Error, Result};
pub use fetch::{CommitHandle, FetchError, FileEntry, FileMode, Fetcher};
pub use scheduler::Scheduler;
pub use selector::Selector;
pub use sink::{MergeType, Sink, SinkError, UploaderOptions};

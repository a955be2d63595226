//! Paged, cancellable loading of scatter points from the labeling backend.

pub mod error;
pub mod loader;
pub mod protocol;
pub mod source;

pub use error::LoadError;
pub use loader::{Accumulated, LoaderConfig, LoaderStatus, PageStream, PointLoader};
pub use protocol::*;
pub use source::{BoxFuture, HttpSourceConfig, HttpTaskSource, MemoryTaskSource, TaskSource};

//! Logging abstractions
//!
//! The library never installs a subscriber. `TracingLogger` forwards to the
//! `tracing` crate so the host application decides where records go.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;

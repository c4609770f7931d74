//! Logger backed by `tracing` events

use super::traits::Logger;

/// Forwards every message to a `tracing` event
///
/// Events are emitted under the `gcpkit` target with a `component` field, so a
/// subscriber filter like `gcpkit=debug` enables them.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::with_component("secrets")
    }

    /// Create a logger tagged with a custom component name
    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "gcpkit", component = %self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "gcpkit", component = %self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "gcpkit", component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "gcpkit", component = %self.component, "{}", message);
    }
}

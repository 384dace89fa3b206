use crate::traits::{NullTelemetry, Output, Telemetry, TerminalOutput};
#[cfg(test)]
use crate::traits::{MemoryTelemetry, MockOutput};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub output: Arc<dyn Output>,
    pub telemetry: Arc<dyn Telemetry>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            output: Arc::new(TerminalOutput),
            telemetry: Arc::new(NullTelemetry),
        }
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    #[allow(dead_code)]
    pub fn test() -> Self {
        Self {
            output: Arc::new(MockOutput::new()),
            telemetry: Arc::new(MemoryTelemetry::new()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            output: Arc::clone(&self.output),
            telemetry: Arc::clone(&self.telemetry),
        }
    }
}

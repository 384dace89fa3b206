use std::sync::Mutex;

/// Severity of a telemetry trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum TraceLevel {
    Verbose,
    Info,
    Warn,
    Error,
    Critical,
}

/// Trait for emitting telemetry traces.
///
/// Handles are passed explicitly into every component that traces; there
/// is no process-global client. `NullTelemetry` is the default for both
/// production runs without an emitter and tests.
pub trait Telemetry: Send + Sync {
    /// Record a trace message at the given level
    fn trace(&self, level: TraceLevel, message: &str);

    /// Flush and shut down the underlying emitter
    fn close(&self);
}

/// Telemetry implementation that discards everything
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn trace(&self, _level: TraceLevel, _message: &str) {}

    fn close(&self) {}
}

/// Telemetry implementation for testing (captures traces in memory)
#[allow(dead_code)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<(TraceLevel, String)>>,
}

#[allow(dead_code)]
impl MemoryTelemetry {
    pub fn new() -> Self {
        Self {
            traces: Mutex::new(Vec::new()),
        }
    }

    /// Get all captured traces
    pub fn get_traces(&self) -> Vec<(TraceLevel, String)> {
        self.traces.lock().unwrap().clone()
    }

    /// Check if any trace message contains the given fragment
    pub fn contains(&self, fragment: &str) -> bool {
        self.traces
            .lock()
            .unwrap()
            .iter()
            .any(|(_, message)| message.contains(fragment))
    }
}

impl Default for MemoryTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry for MemoryTelemetry {
    fn trace(&self, level: TraceLevel, message: &str) {
        self.traces
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }

    fn close(&self) {}
}

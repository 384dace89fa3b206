pub mod output;
pub mod telemetry;

pub use output::{Output, TerminalOutput};
pub use telemetry::{NullTelemetry, Telemetry, TraceLevel};

#[cfg(test)]
pub use output::MockOutput;
#[cfg(test)]
pub use telemetry::MemoryTelemetry;

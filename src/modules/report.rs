//! Operator log sink
//!
//! Consumes categorised log events from the bus and renders them as plain
//! text lines: `WARNING:` for notices, `ERROR:` for errors. An unknown
//! category is reported once through the diagnostic log and treated as a
//! notice.

use std::io::Write;

use tracing::warn;

use crate::bus::{Message, Module, Reception, CATEGORY_ERROR, CATEGORY_NOTICE};

/// The reporting module.
pub struct ReportModule {
    sink: Box<dyn Write + Send>,
}

impl ReportModule {
    /// Report to standard output.
    pub fn new() -> Self {
        Self::with_sink(Box::new(std::io::stdout()))
    }

    /// Report to an arbitrary sink.
    pub fn with_sink(sink: Box<dyn Write + Send>) -> Self {
        Self { sink }
    }

    fn render(&mut self, category: &str, message: &str) {
        let prefix = match category {
            CATEGORY_NOTICE => "WARNING:",
            CATEGORY_ERROR => "ERROR:",
            other => {
                warn!("unknown log category {:?}, defaulting to notice", other);
                "WARNING:"
            }
        };
        if let Err(e) = writeln!(self.sink, "{} {}", prefix, message) {
            warn!("failed to write log line: {}", e);
        }
    }
}

impl Default for ReportModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ReportModule {
    fn name(&self) -> &'static str {
        "report"
    }

    fn topics(&self) -> &'static [&'static str] {
        &[crate::bus::TOPIC_LOG]
    }

    fn receive(&mut self, message: &Message) -> Reception {
        if let Message::Log(event) = message {
            self.render(&event.category, &event.message);
        }
        Reception::allow()
    }
}

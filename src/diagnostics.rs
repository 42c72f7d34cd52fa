//! Injected logging sink.
//!
//! Components never write to the process-wide logger directly. They hold a
//! [`Diagnostics`] handle given to them at construction, which forwards
//! records either to the `log` facade (the default) or to a caller-owned
//! [`log::Log`] implementation.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

/// Log target used when none is configured.
pub const DEFAULT_TARGET: &str = "ipfilter";

#[derive(Clone)]
enum Sink {
    Global,
    Custom(Arc<dyn Log>),
}

/// Logging handle passed into list loaders and dialers.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Sink,
    target: &'static str,
}

impl Diagnostics {
    /// Forward to whatever logger is installed through the `log` facade.
    pub fn global() -> Self {
        Self {
            sink: Sink::Global,
            target: DEFAULT_TARGET,
        }
    }

    /// Forward to a caller-owned logger.
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self {
            sink: Sink::Custom(sink),
            target: DEFAULT_TARGET,
        }
    }

    /// Set the target attached to every record.
    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    /// Get the target attached to every record.
    pub fn target(&self) -> &'static str {
        self.target
    }

    fn logger(&self) -> &dyn Log {
        match &self.sink {
            Sink::Global => log::logger(),
            Sink::Custom(sink) => sink.as_ref(),
        }
    }

    /// Check whether records at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        if matches!(self.sink, Sink::Global) && level > log::max_level() {
            return false;
        }
        let metadata = Metadata::builder().level(level).target(self.target).build();
        self.logger().enabled(&metadata)
    }

    /// Emit a record at `level`.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.logger().log(
            &Record::builder()
                .args(args)
                .level(level)
                .target(self.target)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    /// Emit a record at [`Level::Error`].
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Emit a record at [`Level::Warn`].
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    /// Emit a record at [`Level::Info`].
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    /// Emit a record at [`Level::Debug`].
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match self.sink {
            Sink::Global => "global",
            Sink::Custom(_) => "custom",
        };
        f.debug_struct("Diagnostics")
            .field("sink", &sink)
            .field("target", &self.target)
            .finish()
    }
}

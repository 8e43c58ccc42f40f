use alloc::{format, sync::Arc};
use tracing::{debug, error, info, warn};

use crate::any::TypeInfo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

/// Logger which can be registered in a resolver and shared between services.
pub trait Logger: Send + Sync {
    /// Messages below this level are dropped.
    fn level(&self) -> LogLevel;

    fn write(&self, message: &str, level: LogLevel);

    /// Writes a message on behalf of the `source` type.
    fn write_for(&self, message: &str, source: TypeInfo, level: LogLevel) {
        self.write(&format!("{}: {message}", source.short_name()), level);
    }
}

/// Gives loggers bound to a source type.
pub trait LogManager: Send + Sync {
    fn get_logger(&self, source: TypeInfo) -> Arc<dyn Logger>;
}

/// [`Logger`] emitting `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger {
    level: LogLevel,
}

impl TracingLogger {
    #[inline]
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Logger for TracingLogger {
    #[inline]
    fn level(&self) -> LogLevel {
        self.level
    }

    fn write(&self, message: &str, level: LogLevel) {
        if level < self.level {
            return;
        }
        match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
            LogLevel::Fatal => error!(fatal = true, "{}", message),
        }
    }

    fn write_for(&self, message: &str, source: TypeInfo, level: LogLevel) {
        if level < self.level {
            return;
        }
        match level {
            LogLevel::Debug => debug!(source = source.name, "{}", message),
            LogLevel::Info => info!(source = source.name, "{}", message),
            LogLevel::Warn => warn!(source = source.name, "{}", message),
            LogLevel::Error => error!(source = source.name, "{}", message),
            LogLevel::Fatal => error!(source = source.name, fatal = true, "{}", message),
        }
    }
}

/// [`LogManager`] giving loggers which write through one shared [`Logger`].
#[derive(Clone)]
pub struct DefaultLogManager {
    logger: Arc<dyn Logger>,
}

impl Default for DefaultLogManager {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger::default()))
    }
}

impl DefaultLogManager {
    #[inline]
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl LogManager for DefaultLogManager {
    fn get_logger(&self, source: TypeInfo) -> Arc<dyn Logger> {
        Arc::new(SourceLogger {
            inner: self.logger.clone(),
            source,
        })
    }
}

struct SourceLogger {
    inner: Arc<dyn Logger>,
    source: TypeInfo,
}

impl Logger for SourceLogger {
    #[inline]
    fn level(&self) -> LogLevel {
        self.inner.level()
    }

    #[inline]
    fn write(&self, message: &str, level: LogLevel) {
        self.inner.write_for(message, self.source, level);
    }

    #[inline]
    fn write_for(&self, message: &str, source: TypeInfo, level: LogLevel) {
        self.inner.write_for(message, source, level);
    }
}

//! Request-scoped structured logging.
//!
//! Events go out under the [`REQUEST_TARGET`] target with the request
//! context attached as `tracing` fields. Whether they end up as JSON or as
//! human-readable lines is up to the installed subscriber.

use std::fmt;
use std::time::{Duration, Instant};

use http::StatusCode;
use isle_core::{Method, RequestId};
use tracing::Level;

/// `tracing` target of every request event.
pub const REQUEST_TARGET: &str = "isle::request";

/// One request event, as handed to `tracing`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    /// Request ID for correlation.
    pub request_id: String,
    pub method: Option<Method>,
    /// Matched route id.
    pub route: Option<String>,
    pub path: Option<String>,
    pub status: Option<u16>,
    pub elapsed_ms: Option<u64>,
    pub error: Option<String>,
    /// Microseconds since the request started.
    pub elapsed_us: u64,
}

macro_rules! request_event {
    ($level:expr, $entry:expr) => {{
        let entry = $entry;
        tracing::event!(
            target: REQUEST_TARGET,
            $level,
            request_id = %entry.request_id,
            method = entry.method.map(|m| m.as_str()),
            route = entry.route.as_deref(),
            path = entry.path.as_deref(),
            status = entry.status,
            elapsed_ms = entry.elapsed_ms,
            error = entry.error.as_deref(),
            elapsed_us = entry.elapsed_us,
            "{}",
            entry.message
        )
    }};
}

impl LogEntry {
    /// Emit as a `tracing` event. Unset fields are left out.
    pub fn emit(&self) {
        match self.level {
            Level::ERROR => request_event!(Level::ERROR, self),
            Level::WARN => request_event!(Level::WARN, self),
            Level::INFO => request_event!(Level::INFO, self),
            Level::DEBUG => request_event!(Level::DEBUG, self),
            _ => request_event!(Level::TRACE, self),
        }
    }
}

/// Request-scoped logger carrying the request id, method and matched
/// route into every event it emits.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: RequestId,
    method: Option<Method>,
    route: Option<String>,
    start_time: Instant,
}

impl RequestLogger {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            method: None,
            route: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the matched route id.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::INFO, message)
    }

    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, Level::ERROR, message)
    }
}

/// Fluent builder for one request event.
pub struct LogBuilder<'a> {
    logger: &'a RequestLogger,
    level: Level,
    message: String,
    path: Option<String>,
    status: Option<u16>,
    elapsed_ms: Option<u64>,
    error: Option<String>,
}

impl<'a> LogBuilder<'a> {
    pub fn new(logger: &'a RequestLogger, level: Level, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            path: None,
            status: None,
            elapsed_ms: None,
            error: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    /// Request duration, recorded in milliseconds.
    pub fn elapsed(mut self, duration: Duration) -> Self {
        self.elapsed_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn error(mut self, error: &dyn fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// The entry this builder would emit.
    pub fn build(&self) -> LogEntry {
        LogEntry {
            level: self.level,
            message: self.message.clone(),
            request_id: self.logger.request_id.to_string(),
            method: self.logger.method,
            route: self.logger.route.clone(),
            path: self.path.clone(),
            status: self.status,
            elapsed_ms: self.elapsed_ms,
            error: self.error.clone(),
            elapsed_us: self.logger.start_time.elapsed().as_micros() as u64,
        }
    }

    pub fn emit(self) {
        self.build().emit();
    }
}

//! Main logger implementation

use super::{
    checked_entry::{CheckedEntry, CheckedWrite},
    encoder::Encoder,
    entry::{Clock, EpochClock, Entry, SystemClock},
    error::{LoggerError, Result},
    facility::{Facility, IoFacility, NopFacility},
    field::Field,
    hook::Hook,
    json_encoder::JsonEncoder,
    level::{AtomicLevel, Level, LevelEnabler},
    metrics::LoggerMetrics,
    sampling::{SamplingConfig, SamplingFacility},
    tee::tee,
    termination::Termination,
    write_syncer::{lock, DiscardSink, WriteSyncer},
};
use chrono::{SecondsFormat, Utc};
use std::backtrace::Backtrace;
use std::panic::Location;
use std::sync::Arc;

/// State shared by a logger and every logger derived from it
pub(crate) struct LoggerShared {
    pub(crate) error_output: Arc<dyn WriteSyncer>,
    pub(crate) hooks: Vec<Hook>,
    pub(crate) metrics: LoggerMetrics,
}

/// Write one `"<time> logger error: <err>"` line and sync; failures are dropped
pub(crate) fn report_error(output: &dyn WriteSyncer, err: &LoggerError) {
    let line = format!(
        "{} logger error: {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        err
    );
    let _ = output.write(line.as_bytes());
    let _ = output.sync();
}

/// Leveled, structured logger
///
/// Cheap to clone; clones and children created by [`with`](Self::with) share
/// the level, hooks, error output and metrics of their parent.
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
/// use std::sync::Arc;
///
/// let sink = MemorySink::new();
/// let mut logger = Logger::builder()
///     .output(Arc::new(sink.clone()))
///     .build();
/// logger.stub_time();
///
/// logger.error("Oh no!", &[Field::string("user", "jane@test.com"), Field::int("visits", 42)]);
/// assert_eq!(
///     sink.contents(),
///     "{\"msg\":\"Oh no!\",\"level\":\"error\",\"ts\":0,\"fields\":{\"user\":\"jane@test.com\",\"visits\":42}}\n"
/// );
/// ```
#[derive(Clone)]
pub struct Logger {
    facility: Arc<dyn Facility>,
    level: AtomicLevel,
    shared: Arc<LoggerShared>,
    development: bool,
    add_caller: bool,
    add_stack: Option<Arc<dyn LevelEnabler>>,
    clock: Arc<dyn Clock>,
}

impl Logger {
    /// Logger over `facility`, with errors reported to stderr
    ///
    /// The logger's own level starts at `Debug`, leaving filtering to the
    /// facility until [`set_level`](Self::set_level) is called.
    pub fn new(facility: Arc<dyn Facility>) -> Self {
        Self {
            facility,
            level: AtomicLevel::new(Level::Debug),
            shared: Arc::new(LoggerShared {
                error_output: Arc::new(lock(std::io::stderr())),
                hooks: Vec::new(),
                metrics: LoggerMetrics::new(),
            }),
            development: false,
            add_caller: false,
            add_stack: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Logger that writes nothing, ever
    pub fn nop() -> Self {
        Self {
            facility: Arc::new(NopFacility),
            level: AtomicLevel::new(Level::Fatal),
            shared: Arc::new(LoggerShared {
                error_output: Arc::new(DiscardSink),
                hooks: Vec::new(),
                metrics: LoggerMetrics::new(),
            }),
            development: false,
            add_caller: false,
            add_stack: None,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn level(&self) -> Level {
        self.level.level()
    }

    /// Change the minimum level of this logger and all of its relatives
    pub fn set_level(&self, level: Level) {
        self.level.set_level(level);
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level) && self.facility.enabled(level)
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    /// Replace the clock with one that always reports the Unix epoch
    pub fn stub_time(&mut self) {
        self.clock = Arc::new(EpochClock);
    }

    /// Child logger with `fields` added to its context
    #[must_use]
    pub fn with(&self, fields: &[Field]) -> Logger {
        let mut child = self.clone();
        if !fields.is_empty() {
            child.facility = self.facility.with(fields);
        }
        child
    }

    /// Stage an entry if `level` is enabled
    ///
    /// Entries that must terminate the process are always staged so the
    /// termination is reported even when no facility accepts them.
    ///
    /// The caller is the nearest frame not marked `#[track_caller]`, so
    /// wrappers that should be skipped in caller annotations carry the
    /// attribute themselves.
    #[track_caller]
    pub fn check(&self, level: Level, message: &str) -> Option<CheckedEntry> {
        let caller = if self.add_caller {
            Some(Location::caller())
        } else {
            None
        };
        self.check_at(level, message, caller)
    }

    fn check_at(
        &self,
        level: Level,
        message: &str,
        caller: Option<&'static Location<'static>>,
    ) -> Option<CheckedEntry> {
        let termination = match level {
            Level::Panic => Some(Termination::panic(message)),
            Level::Fatal => Some(Termination::exit()),
            Level::DPanic if self.development => Some(Termination::panic(message)),
            _ => None,
        };
        if termination.is_none() && !self.enabled(level) {
            return None;
        }

        let mut entry = Entry::new(level, message, self.clock.now()).with_caller(caller);
        let checked = if self.level.enabled(level) {
            if self.add_stack.as_ref().is_some_and(|e| e.enabled(level)) {
                entry.stack = Some(Backtrace::force_capture().to_string());
            }
            Arc::clone(&self.facility).check(&entry, None)
        } else {
            None
        };
        // Hooks and metrics only apply to entries some facility accepted
        let checked = checked.map(|c| c.with_shared(Arc::clone(&self.shared)));
        match termination {
            Some(termination) => Some(
                checked
                    .unwrap_or_else(|| CheckedEntry::new(entry))
                    .should(termination),
            ),
            None => checked,
        }
    }

    /// Log at `level`; any termination request is handed back
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) -> Option<Termination> {
        self.check(level, message).write(fields)
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        let _ = self.log(Level::Debug, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        let _ = self.log(Level::Info, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        let _ = self.log(Level::Warn, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        let _ = self.log(Level::Error, message, fields);
    }

    /// Panic in development, behave like `error` otherwise
    #[track_caller]
    pub fn dpanic(&self, message: &str, fields: &[Field]) -> Option<Termination> {
        self.log(Level::DPanic, message, fields)
    }

    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> Termination {
        self.log(Level::Panic, message, fields)
            .unwrap_or_else(|| Termination::panic(message))
    }

    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> Termination {
        self.log(Level::Fatal, message, fields)
            .unwrap_or_else(Termination::exit)
    }

    /// Fatal in development, Error otherwise
    #[track_caller]
    pub fn dfatal(&self, message: &str, fields: &[Field]) -> Option<Termination> {
        let level = if self.development {
            Level::Fatal
        } else {
            Level::Error
        };
        self.log(level, message, fields)
    }

    /// Flush buffered output
    pub fn sync(&self) -> Result<()> {
        self.facility.sync()
    }

    /// Counters shared by this logger and its relatives
    ///
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let logger = Logger::builder().output(Arc::new(MemorySink::new())).build();
    /// logger.info("ready", &[]);
    /// assert_eq!(logger.metrics().written_count(), 1);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    pub fn facility(&self) -> &Arc<dyn Facility> {
        &self.facility
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level.level())
            .field("development", &self.development)
            .field("add_caller", &self.add_caller)
            .field("add_stack", &self.add_stack.is_some())
            .field("hooks", &self.shared.hooks.len())
            .finish()
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// Defaults: JSON to stdout at `Info`, errors to stderr, wall-clock time.
///
/// # Example
/// ```
/// use rust_structured_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .level(Level::Debug)
///     .encoder(LogfmtEncoder::new())
///     .output(Arc::new(MemorySink::new()))
///     .hook(hook(|_entry| Ok(())))
///     .fields(vec![Field::string("service", "billing")])
///     .build();
/// assert!(logger.enabled(Level::Debug));
/// ```
pub struct LoggerBuilder {
    level: Level,
    encoder: Box<dyn Encoder>,
    output: Arc<dyn WriteSyncer>,
    error_output: Arc<dyn WriteSyncer>,
    hooks: Vec<Hook>,
    extra: Vec<Arc<dyn Facility>>,
    sampling: Option<SamplingConfig>,
    fields: Vec<Field>,
    development: bool,
    add_caller: bool,
    add_stack: Option<Arc<dyn LevelEnabler>>,
    clock: Arc<dyn Clock>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            encoder: Box::new(JsonEncoder::new()),
            output: Arc::new(lock(std::io::stdout())),
            error_output: Arc::new(lock(std::io::stderr())),
            hooks: Vec::new(),
            extra: Vec::new(),
            sampling: None,
            fields: Vec::new(),
            development: false,
            add_caller: false,
            add_stack: None,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, output: Arc<dyn WriteSyncer>) -> Self {
        self.output = output;
        self
    }

    /// Where internal errors are reported
    #[must_use = "builder methods return a new value"]
    pub fn error_output(mut self, output: Arc<dyn WriteSyncer>) -> Self {
        self.error_output = output;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Also write to `facility`
    #[must_use = "builder methods return a new value"]
    pub fn tee(mut self, facility: Arc<dyn Facility>) -> Self {
        self.extra.push(facility);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sampling(mut self, config: SamplingConfig) -> Self {
        self.sampling = Some(config);
        self
    }

    /// Context carried by every entry
    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields.extend(fields.into_iter().map(Field::keep));
        self
    }

    /// Makes `dpanic` panic and `dfatal` exit
    #[must_use = "builder methods return a new value"]
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Annotate entries with the calling file and line
    #[must_use = "builder methods return a new value"]
    pub fn add_caller(mut self, add_caller: bool) -> Self {
        self.add_caller = add_caller;
        self
    }

    /// Record a backtrace on entries that `enabler` accepts
    #[must_use = "builder methods return a new value"]
    pub fn stacktrace(mut self, enabler: impl LevelEnabler + 'static) -> Self {
        self.add_stack = Some(Arc::new(enabler));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn stub_time(self) -> Self {
        self.clock(Arc::new(EpochClock))
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Logger {
        let level = AtomicLevel::new(self.level);
        let io: Arc<dyn Facility> =
            Arc::new(IoFacility::new(self.encoder, self.output, level.clone()));

        let mut facilities = Vec::with_capacity(1 + self.extra.len());
        facilities.push(io);
        facilities.extend(self.extra);
        let mut facility = tee(facilities);

        if let Some(config) = self.sampling {
            facility = Arc::new(SamplingFacility::new(facility, config));
        }
        if !self.fields.is_empty() {
            facility = facility.with(&self.fields);
        }

        Logger {
            facility,
            level,
            shared: Arc::new(LoggerShared {
                error_output: self.error_output,
                hooks: self.hooks,
                metrics: LoggerMetrics::new(),
            }),
            development: self.development,
            add_caller: self.add_caller,
            add_stack: self.add_stack,
            clock: self.clock,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hook::hook;
    use crate::sinks::MemorySink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn memory_logger(level: Level) -> (MemorySink, MemorySink, Logger) {
        let out = MemorySink::new();
        let errors = MemorySink::new();
        let logger = Logger::builder()
            .level(level)
            .output(Arc::new(out.clone()))
            .error_output(Arc::new(errors.clone()))
            .stub_time()
            .build();
        (out, errors, logger)
    }

    #[test]
    fn test_builder_defaults() {
        let logger = Logger::builder().output(Arc::new(DiscardSink)).build();
        assert_eq!(logger.level(), Level::Info);
        assert!(!logger.enabled(Level::Debug));
        assert!(logger.enabled(Level::Info));
        assert!(!logger.is_development());
    }

    #[test]
    fn test_disabled_level_is_not_staged() {
        let (out, _, logger) = memory_logger(Level::Warn);
        assert!(logger.check(Level::Info, "quiet").is_none());
        logger.info("quiet", &[]);
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_warn_without_fields() {
        let (out, _, logger) = memory_logger(Level::Info);
        logger.warn("Log without structured data...", &[]);
        assert_eq!(
            out.contents(),
            "{\"msg\":\"Log without structured data...\",\"level\":\"warn\",\"ts\":0,\"fields\":{}}\n"
        );
    }

    #[test]
    fn test_set_level_is_shared_with_children() {
        let (out, _, logger) = memory_logger(Level::Info);
        let child = logger.with(&[Field::int("child", 1)]);

        child.set_level(Level::Debug);
        assert_eq!(logger.level(), Level::Debug);
        logger.debug("parent", &[]);
        child.debug("child", &[]);
        assert_eq!(out.lines().len(), 2);
    }

    #[test]
    fn test_panic_and_fatal_return_terminations() {
        let (out, _, logger) = memory_logger(Level::Info);
        assert_eq!(
            logger.panic("bad", &[]),
            Termination::Panic {
                message: "bad".to_string()
            }
        );
        assert_eq!(logger.fatal("worse", &[]), Termination::Exit { code: 1 });
        assert_eq!(out.lines().len(), 2);
    }

    #[test]
    fn test_termination_survives_disabled_facility() {
        let out = MemorySink::new();
        let logger = Logger::builder()
            .level(Level::Fatal)
            .output(Arc::new(out.clone()))
            .build();
        assert!(logger.check(Level::Panic, "x").is_some());
        assert!(matches!(
            logger.panic("unlogged", &[]),
            Termination::Panic { .. }
        ));
        assert!(out.contents().is_empty());
    }

    #[test]
    fn test_unlogged_termination_skips_hooks() {
        let out = MemorySink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let logger = Logger::builder()
            .level(Level::Fatal)
            .output(Arc::new(out.clone()))
            .hook(hook(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build();

        assert_eq!(
            logger.panic("disabled", &[]),
            Termination::Panic {
                message: "disabled".to_string()
            }
        );
        assert!(out.contents().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(logger.metrics().written_count(), 0);

        assert_eq!(logger.fatal("enabled", &[]), Termination::Exit { code: 1 });
        assert_eq!(out.lines().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dpanic_depends_on_development() {
        let (_, _, logger) = memory_logger(Level::Info);
        assert!(logger.dpanic("prod", &[]).is_none());

        let dev = Logger::builder()
            .output(Arc::new(DiscardSink))
            .development(true)
            .build();
        assert!(matches!(
            dev.dpanic("dev", &[]),
            Some(Termination::Panic { .. })
        ));
    }

    #[test]
    fn test_dfatal_levels() {
        let (out, _, logger) = memory_logger(Level::Info);
        assert!(logger.dfatal("prod", &[]).is_none());
        assert!(out.contents().contains("\"level\":\"error\""));

        let dev_out = MemorySink::new();
        let dev = Logger::builder()
            .output(Arc::new(dev_out.clone()))
            .development(true)
            .build();
        assert_eq!(dev.dfatal("dev", &[]), Some(Termination::Exit { code: 1 }));
        assert!(dev_out.contents().contains("\"level\":\"fatal\""));
    }

    #[test]
    fn test_hook_errors_are_reported() {
        let out = MemorySink::new();
        let errors = MemorySink::new();
        let logger = Logger::builder()
            .output(Arc::new(out.clone()))
            .error_output(Arc::new(errors.clone()))
            .hook(hook(|_| Err(LoggerError::hook("audit offline"))))
            .build();

        logger.info("still written", &[]);
        assert_eq!(out.lines().len(), 1);
        assert!(errors
            .contents()
            .ends_with(" logger error: Hook failed: audit offline\n"));
        assert_eq!(logger.metrics().hook_error_count(), 1);
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let out = MemorySink::new();
        let logger = Logger::builder()
            .output(Arc::new(out.clone()))
            .add_caller(true)
            .build();
        let line = line!() + 1;
        logger.info("where", &[]);
        assert!(
            out.contents().contains(&format!("\"caller\":\"{}:{}\"", file!(), line)),
            "{}",
            out.contents()
        );
    }

    #[track_caller]
    fn audit(logger: &Logger, message: &str) {
        logger.warn(message, &[Field::string("audit", "yes")]);
    }

    #[test]
    fn test_caller_skips_track_caller_wrappers() {
        let out = MemorySink::new();
        let logger = Logger::builder()
            .output(Arc::new(out.clone()))
            .add_caller(true)
            .build();
        let line = line!() + 1;
        audit(&logger, "wrapped");
        assert!(
            out.contents().contains(&format!("\"caller\":\"{}:{}\"", file!(), line)),
            "{}",
            out.contents()
        );
    }

    #[test]
    fn test_stacktrace_only_at_enabled_levels() {
        let out = MemorySink::new();
        let logger = Logger::builder()
            .output(Arc::new(out.clone()))
            .stacktrace(Level::Error)
            .build();
        logger.warn("no stack", &[]);
        logger.error("with stack", &[]);

        let lines = out.lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].contains("\"stacktrace\""));
        let record: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert!(record["stacktrace"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn test_nop_logger() {
        let logger = Logger::nop();
        assert!(!logger.enabled(Level::Fatal));
        assert!(logger.check(Level::Error, "nothing").is_none());
        assert!(logger.sync().is_ok());
    }

    #[test]
    fn test_initial_fields_are_context() {
        let out = MemorySink::new();
        let logger = Logger::builder()
            .output(Arc::new(out.clone()))
            .fields(vec![Field::string("service", "billing")])
            .build();
        logger.info("up", &[Field::int("port", 8080)]);
        assert!(out
            .contents()
            .contains("\"fields\":{\"service\":\"billing\",\"port\":8080}"));
    }
}

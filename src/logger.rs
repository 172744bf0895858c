//! The per-request log accumulator.
//!
//! A [`Logger`] is a value, not a sink. It carries a severity threshold and a
//! list of key/value fields, and every "add a field" operation hands back a
//! *new* logger:
//!
//! ```rust
//! use reqtrail::Logger;
//! use tracing::Level;
//!
//! let base = Logger::new(Level::INFO).with("service", "users");
//! let req  = base.with("method", "GET");
//!
//! assert_eq!(base.fields().len(), 1);   // untouched
//! assert_eq!(req.fields().len(), 2);
//! ```
//!
//! Fields live behind an `Arc<[Field]>`, so cloning a logger is one atomic
//! increment. Deriving copies the field list once, which is fine for the
//! handful of fields a request accumulates.
//!
//! Emission goes through [`tracing`]: [`Logger::info`] and friends render the
//! fields as `key=value` pairs and forward a single event at the matching
//! level. Whatever subscriber the application installed decides where it ends
//! up.

use std::fmt;
use std::sync::Arc;

use tracing::Level;

// ── Value ─────────────────────────────────────────────────────────────────────

/// A structured scalar attached to a [`Logger`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl Value {
    /// Returns the string payload, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _            => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s)  => write!(f, "{s:?}"),
            Self::I64(n)  => write!(f, "{n}"),
            Self::U64(n)  => write!(f, "{n}"),
            Self::F64(n)  => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Str(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Self::I64(n) }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self { Self::U64(n) }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self { Self::U64(n.into()) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::F64(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

// ── Field ─────────────────────────────────────────────────────────────────────

/// One key/value pair of a [`Logger`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: String,
    value: Value,
}

impl Field {
    pub fn key(&self) -> &str { &self.key }
    pub fn value(&self) -> &Value { &self.value }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// An immutable, append-only set of log fields plus a severity threshold.
///
/// `Logger::default()` is the disabled logger: no threshold, no fields. It is
/// what [`Scope::lookup`](crate::Scope::lookup) returns when nothing was
/// attached, and it still accumulates fields so downstream code can read them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Logger {
    level: Option<Level>,
    fields: Arc<[Field]>,
}

impl Logger {
    /// A logger that emits events at `level` and anything more severe.
    pub fn new(level: Level) -> Self {
        Self { level: Some(level), fields: Arc::from(Vec::new()) }
    }

    /// A logger that never emits. Fields can still be attached and read.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns a new logger with `key = value` added.
    ///
    /// If `key` is already present its value is replaced in place, so the
    /// field order stays stable and the last writer wins. `self` is never
    /// modified.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = Field { key: key.into(), value: value.into() };
        let mut fields = self.fields.to_vec();
        match fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => *existing = field,
            None           => fields.push(field),
        }
        Self { level: self.level, fields: fields.into() }
    }

    /// Returns a new logger with the same fields and a different threshold.
    #[must_use]
    pub fn with_level(&self, level: Option<Level>) -> Self {
        Self { level, fields: Arc::clone(&self.fields) }
    }

    pub fn level(&self) -> Option<Level> { self.level }
    pub fn fields(&self) -> &[Field] { &self.fields }

    /// Looks up a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// `true` when an event at `level` passes this logger's threshold.
    ///
    /// `tracing` orders levels by verbosity (`TRACE > DEBUG > … > ERROR`), so
    /// an event is enabled when it is no more verbose than the threshold.
    pub fn enabled(&self, level: Level) -> bool {
        self.level.is_some_and(|threshold| level <= threshold)
    }

    /// Emits `message` with every attached field at `level`, if enabled.
    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let fields = Rendered(&self.fields);
        match level {
            Level::ERROR => tracing::error!(target: "reqtrail", fields = %fields, "{message}"),
            Level::WARN  => tracing::warn!(target: "reqtrail", fields = %fields, "{message}"),
            Level::INFO  => tracing::info!(target: "reqtrail", fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: "reqtrail", fields = %fields, "{message}"),
            _            => tracing::trace!(target: "reqtrail", fields = %fields, "{message}"),
        }
    }

    pub fn error(&self, message: &str) { self.log(Level::ERROR, message) }
    pub fn warn(&self, message: &str)  { self.log(Level::WARN, message) }
    pub fn info(&self, message: &str)  { self.log(Level::INFO, message) }
    pub fn debug(&self, message: &str) { self.log(Level::DEBUG, message) }
}

/// Renders fields as space-separated `key=value` pairs.
impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Rendered(&self.fields), f)
    }
}

struct Rendered<'a>(&'a [Field]);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", field.key, field.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_leaves_the_original_untouched() {
        let base = Logger::new(Level::INFO).with("a", "1");
        let derived = base.with("b", "2");

        assert_eq!(base.fields().len(), 1);
        assert_eq!(base.get("b"), None);
        assert_eq!(derived.get("a"), Some(&Value::from("1")));
        assert_eq!(derived.get("b"), Some(&Value::from("2")));
    }

    #[test]
    fn distinct_keys_commute() {
        let base = Logger::disabled();
        let ab = base.with("a", "x").with("b", "y");
        let ba = base.with("b", "y").with("a", "x");

        for key in ["a", "b"] {
            assert_eq!(ab.get(key), ba.get(key));
        }
        assert_eq!(ab.fields().len(), 2);
    }

    #[test]
    fn same_key_last_write_wins_in_place() {
        let logger = Logger::disabled()
            .with("k", "first")
            .with("other", 1_i64)
            .with("k", "second");

        assert_eq!(logger.fields().len(), 2);
        assert_eq!(logger.fields()[0].key(), "k");
        assert_eq!(logger.get("k").and_then(Value::as_str), Some("second"));
    }

    #[test]
    fn disabled_logger_accumulates_but_never_enables() {
        let logger = Logger::disabled().with("url", "/foo");
        assert_eq!(logger.level(), None);
        assert!(!logger.enabled(Level::ERROR));
        assert_eq!(logger.get("url").and_then(Value::as_str), Some("/foo"));
    }

    #[test]
    fn threshold_follows_tracing_verbosity() {
        let logger = Logger::new(Level::INFO);
        assert!(logger.enabled(Level::ERROR));
        assert!(logger.enabled(Level::INFO));
        assert!(!logger.enabled(Level::DEBUG));
    }

    #[test]
    fn with_level_keeps_fields() {
        let logger = Logger::new(Level::WARN).with("a", true);
        let verbose = logger.with_level(Some(Level::TRACE));
        assert_eq!(verbose.fields(), logger.fields());
        assert!(verbose.enabled(Level::TRACE));
    }

    #[test]
    fn display_renders_key_value_pairs() {
        let logger = Logger::disabled()
            .with("method", "GET")
            .with("status", 200_u16)
            .with("ok", true);
        assert_eq!(logger.to_string(), r#"method="GET" status=200 ok=true"#);
    }

    #[test]
    fn log_is_a_no_op_when_disabled() {
        // Nothing to observe beyond "does not panic without a subscriber".
        Logger::disabled().with("a", "b").error("ignored");
        Logger::new(Level::DEBUG).with("a", "b").debug("emitted");
    }
}

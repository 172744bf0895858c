//! Per-request scope.
//!
//! Every [`Request`](crate::Request) owns one [`Scope`]: a typed-key store
//! that carries the request's [`Logger`] and [`RequestId`] down the middleware
//! chain. Nothing here is global. A middleware takes the request by value,
//! derives a new scope from the old one and hands the request on, so whatever
//! runs later sees the update and whatever ran earlier is unaffected.
//!
//! Values are keyed by type, backed by [`http::Extensions`]. The logger and id
//! sit in private newtype slots so user data of the same type cannot collide
//! with them.

use crate::id::RequestId;
use crate::logger::Logger;

#[derive(Clone)]
struct LoggerSlot(Logger);

#[derive(Clone, Copy)]
struct IdSlot(RequestId);

/// Typed key/value store scoped to one request.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    entries: http::Extensions,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a scope in which [`lookup`](Scope::lookup) yields `logger`.
    /// Every other entry is carried over unchanged.
    #[must_use]
    pub fn attach(mut self, logger: Logger) -> Self {
        self.entries.insert(LoggerSlot(logger));
        self
    }

    /// The most recently attached logger, or [`Logger::disabled`] if none.
    ///
    /// Never fails: an empty scope is a normal state, not an error.
    pub fn lookup(&self) -> Logger {
        self.entries
            .get::<LoggerSlot>()
            .map(|slot| slot.0.clone())
            .unwrap_or_default()
    }

    /// Returns a scope carrying `id` as the request identity.
    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.entries.insert(IdSlot(id));
        self
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.entries.get::<IdSlot>().map(|slot| slot.0)
    }

    /// Stores an arbitrary value, replacing any previous value of type `T`.
    #[must_use]
    pub fn insert<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries.insert(value);
        self
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.entries.get::<T>()
    }
}

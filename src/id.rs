//! Request identity.
//!
//! A [`RequestId`] is a UUIDv7: 48 bits of millisecond timestamp followed by
//! random bits. Rendered in the lower-case hyphenated form it is 36 URL-safe
//! characters, and ids generated by the same process sort in creation order,
//! so lexical comparison doubles as a rough timeline. Do not use that ordering
//! to reason about causality across processes.

use std::fmt;

use uuid::Uuid;
use uuid::fmt::Hyphenated;

/// A globally unique, fixed-width request identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Length of the textual form.
    pub const LEN: usize = Hyphenated::LENGTH;

    /// Generates a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid { &self.0 }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self { Self(uuid) }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0; Hyphenated::LENGTH];
        f.write_str(self.0.as_hyphenated().encode_lower(&mut buf))
    }
}

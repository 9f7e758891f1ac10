use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Who made a commit, and when.
///
/// Timestamps are wall-clock milliseconds since the UNIX epoch. They are
/// informational only: commit ordering comes from parent links, never from
/// clocks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp_ms: u64,
}

impl Signature {
    /// Create a signature with an explicit timestamp.
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp_ms,
        }
    }

    /// Create a signature stamped with the current wall-clock time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::new(name, email, timestamp_ms)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_epoch() {
        let sig = Signature::now("quay", "quay@localhost");
        assert!(sig.timestamp_ms > 0);
    }

    #[test]
    fn display_format() {
        let sig = Signature::new("Ada", "ada@example.org", 0);
        assert_eq!(sig.to_string(), "Ada <ada@example.org>");
    }
}

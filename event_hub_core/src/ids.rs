// user identity: an opaque, non-empty string key.

use crate::errors::HubError;
use std::fmt;
use std::sync::Arc;

/// Opaque user identity. Cheap to clone (backed by `Arc<str>`) since the same
/// identity is held concurrently by registry snapshots, client-table shard
/// entries, and `Client` handles.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct UserId(Arc<str>);

impl UserId {
    pub fn new(id: impl Into<Arc<str>>) -> Result<Self, HubError> {
        let id = id.into();
        if id.is_empty() {
            return Err(HubError::EmptyKey("UserId"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({:?})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_rejected() {
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn non_empty_string_round_trips() {
        let id = UserId::new("u1").unwrap();
        assert_eq!(id.as_str(), "u1");
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(UserId::new("u1").unwrap(), UserId::new("u1").unwrap());
        assert_ne!(UserId::new("u1").unwrap(), UserId::new("u2").unwrap());
    }
}

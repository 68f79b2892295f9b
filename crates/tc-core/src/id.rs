use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter shared by every generated id so that clones, duplicates and new
/// shapes never collide with each other inside one process.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A lightweight, interned identifier for scene nodes.
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a unique id with a variant prefix (e.g. `text_3`, `rect_7`).
    pub fn with_prefix(prefix: &str) -> Self {
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            // Template ids are hand-written, so skip anything already in use.
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(serde::de::Error::custom("node id must not be empty"));
        }
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("headline-text");
        let b = NodeId::intern("headline-text");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "headline-text");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = NodeId::with_prefix("rect");
        let b = NodeId::with_prefix("rect");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rect_"));
    }

    #[test]
    fn prefixed_ids_skip_existing_names() {
        let next = COUNTER.load(Ordering::Relaxed);
        let taken = NodeId::intern(&format!("skip_{next}"));
        let fresh = NodeId::with_prefix("skip");
        assert_ne!(taken, fresh);
    }
}

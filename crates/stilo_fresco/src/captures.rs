//! Ordered capture maps.
//!
//! Capture order is emission order: the serialised object's keys appear
//! exactly as the transformer wrote them at the call site. `serde_json`'s
//! map type does not guarantee insertion order, so both maps here are
//! vectors of pairs, and [`ResolvedCaptures`] serialises itself entry by
//! entry.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use stilo_carton::CompactString;

use crate::value::CaptureValue;

/// The captures argument of an inline-task call, in call-site order.
#[derive(Debug, Default)]
pub struct Captures {
    entries: Vec<(CompactString, CaptureValue)>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<CompactString>, value: impl Into<CaptureValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<CompactString>, value: impl Into<CaptureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Captures {
    type Item = (CompactString, CaptureValue);
    type IntoIter = std::vec::IntoIter<(CompactString, CaptureValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Captures after resolution, ready for serialisation. Created per render
/// and discarded after the script source is assembled.
#[derive(Debug, Default)]
pub struct ResolvedCaptures {
    entries: Vec<(CompactString, Value)>,
}

impl ResolvedCaptures {
    pub(crate) fn push(&mut self, name: CompactString, value: Value) {
        self.entries.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResolvedCaptures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

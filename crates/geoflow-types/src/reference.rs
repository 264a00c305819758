//! Embedded output references.
//!
//! An input port whose value is `"<operation>_to_<output>"` is wired to output
//! `<output>` of operation `<operation>`. Connections and these strings are two
//! encodings of the same edge.

use std::fmt;

use serde_json::Value;

/// Separator between the producer id and the output index.
pub const REFERENCE_SEPARATOR: &str = "_to_";

/// A reference to one output of an upstream operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputReference {
    /// Id of the producing operation.
    pub operation: String,
    /// Index of the producer's output port.
    pub output: usize,
}

impl OutputReference {
    /// Create a reference to `operation`'s output `output`.
    pub fn new(operation: impl Into<String>, output: usize) -> Self {
        Self {
            operation: operation.into(),
            output,
        }
    }

    /// Parse a reference string.
    ///
    /// The split happens on the last separator so operation ids may themselves
    /// contain `_to_`. Returns `None` when the suffix is not a port index.
    pub fn parse(s: &str) -> Option<Self> {
        let (operation, index) = s.rsplit_once(REFERENCE_SEPARATOR)?;
        if operation.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self {
            operation: operation.to_string(),
            output: index.parse().ok()?,
        })
    }

    /// Parse a reference out of a port value, if it is a reference string.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.operation, REFERENCE_SEPARATOR, self.output)
    }
}

use serde::{Deserialize, Serialize};

/// Options applied when opening cursors for a query tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpanOptions {
    /// Whether matches carry payloads. Operators reading class entries (focus,
    /// class filters) collect them below themselves regardless.
    pub collect_payloads: bool,
}

impl SpanOptions {
    pub fn with_collect_payloads(mut self, collect_payloads: bool) -> SpanOptions {
        self.collect_payloads = collect_payloads;
        self
    }
}

impl Default for SpanOptions {
    fn default() -> Self {
        SpanOptions {
            collect_payloads: true,
        }
    }
}

//! Snapshot model for dashboard payloads
//!
//! The portal API returns dashboard-specific JSON whose shape the console
//! does not own. Payloads are kept opaque and read through dotted-path
//! lookups with optional defaults; a missing field simply leaves its render
//! target untouched. Each snapshot replaces the previous one in full.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One fetched payload, as delivered by a refresh tick.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    value: Value,
    received_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            received_at: Utc::now(),
        }
    }

    /// When this payload arrived at the console
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Resolve a dotted path like `performance.cpu.usage_percent`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.value, |node, key| node.get(key))
    }

    /// Numeric field read as a percentage, clamped to 0..=100.
    pub fn percent(&self, path: &str) -> Option<f64> {
        self.lookup(path)
            .and_then(Value::as_f64)
            .map(|pct| pct.clamp(0.0, 100.0))
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    pub fn integer(&self, path: &str) -> Option<i64> {
        self.lookup(path).and_then(Value::as_i64)
    }

    pub fn array(&self, path: &str) -> Option<&Vec<Value>> {
        self.lookup(path).and_then(Value::as_array)
    }

    /// ISO-8601 `timestamp` field from the payload root, if present
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.text("timestamp")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Severity bands for usage gauges, mirroring the portal's progress-bar
/// coloring: above 85 percent is critical, 70 to 85 is elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    Warning,
    Danger,
}

impl UsageLevel {
    pub fn from_percent(pct: f64) -> Self {
        if pct > 85.0 {
            UsageLevel::Danger
        } else if pct >= 70.0 {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

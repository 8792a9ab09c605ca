//! Recurring-task support
//!
//! A recurring task is an unbounded forward chain of one-task-at-a-time instances: when an
//! instance is completed, the next one is materialized with a due date computed from the
//! task's [`RecurrencePattern`]. The completed instance stays around (it remains visible in
//! "completed" views), only its successor is new.
//!
//! Patterns are decoded leniently on purpose: they were historically stored as free-form
//! JSON, so an unknown frequency or a non-numeric interval must degrade to something safe
//! (advance by one day / interval of 1) rather than fail the completion.

use chrono::{DateTime, Duration, Months, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Task, TaskStatus};

/// How often a task repeats
#[derive(Clone, Debug, PartialEq)]
pub enum RecurrenceFreq {
    Daily,
    Weekly,
    Monthly,
    /// Anything this crate does not recognize. Kept verbatim so the stored pattern
    /// round-trips unchanged along the chain.
    Other(String),
}

impl RecurrenceFreq {
    pub fn as_str(&self) -> &str {
        match self {
            RecurrenceFreq::Daily => "daily",
            RecurrenceFreq::Weekly => "weekly",
            RecurrenceFreq::Monthly => "monthly",
            RecurrenceFreq::Other(raw) => raw,
        }
    }
}

impl Serialize for RecurrenceFreq {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecurrenceFreq {
    fn deserialize<D>(deserializer: D) -> Result<RecurrenceFreq, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_ascii_lowercase().as_str() {
            "daily" => RecurrenceFreq::Daily,
            "weekly" => RecurrenceFreq::Weekly,
            "monthly" => RecurrenceFreq::Monthly,
            _ => RecurrenceFreq::Other(raw),
        })
    }
}

/// A small structured specification of how to compute a task's next occurrence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    #[serde(rename = "type")]
    pub freq: RecurrenceFreq,
    /// Every `interval` days/weeks/months. Always at least 1.
    #[serde(default = "default_interval", deserialize_with = "lenient_interval")]
    pub interval: u32,
}

impl RecurrencePattern {
    pub fn new(freq: RecurrenceFreq, interval: u32) -> Self {
        Self {
            freq,
            interval: interval.max(1),
        }
    }

    /// Decode a pattern from its stored JSON form, e.g. `{"type":"weekly","interval":2}`.
    /// Returns `None` when the value is not even an object with a `type` field, in which
    /// case completion falls back to the 1-day default advance.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

fn default_interval() -> u32 {
    1
}

/// Accepts a number, a numeric string, or garbage (mapped to 1).
fn lenient_interval<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
        Anything(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n >= 1 => n as u32,
        Raw::Number(_) => 1,
        Raw::Text(s) => match s.trim().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => 1,
        },
        Raw::Anything(_) => 1,
    })
}

/// Compute the next occurrence's due date.
///
/// Monthly advances use calendar month arithmetic: the day of month is clamped to the end
/// of shorter months (Jan 31 + 1 month is Feb 28/29), it never rolls over into the next one.
pub fn next_due_date(from: DateTime<Utc>, pattern: Option<&RecurrencePattern>) -> DateTime<Utc> {
    let pattern = match pattern {
        None => return from + Duration::days(1),
        Some(p) => p,
    };
    let interval = pattern.interval.max(1);

    match pattern.freq {
        RecurrenceFreq::Daily => from + Duration::days(i64::from(interval)),
        RecurrenceFreq::Weekly => from + Duration::weeks(i64::from(interval)),
        RecurrenceFreq::Monthly => from
            .checked_add_months(Months::new(interval))
            // only reachable near the end of the representable date range
            .unwrap_or_else(|| from + Duration::days(30 * i64::from(interval))),
        RecurrenceFreq::Other(_) => from + Duration::days(1),
    }
}

/// Build the follow-up instance for a task that has just been completed.
///
/// Everything is carried over except: the id (freshly generated), the timestamps (now),
/// the status (back to pending) and the due date (advanced per the pattern, from the
/// previous due date or from now when there was none).
pub fn successor_of(task: &Task) -> Task {
    let now = Utc::now();
    let base = task.due_date.unwrap_or(now);

    Task {
        id: Uuid::new_v4().to_hyphenated().to_string(),
        status: TaskStatus::Pending,
        due_date: Some(next_due_date(base, task.recurrence_pattern.as_ref())),
        created_at: now,
        updated_at: now,
        ..task.clone()
    }
}

//! Result normalization
//!
//! Maps the raw JSON payload from the brief service into [`BriefResult`] and
//! provides the display-only derivations (priority tier, deadline urgency,
//! summary counts). Nothing here mutates the payload, filters, or re-orders.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::transfer::RawBriefPayload;

pub const UNASSIGNED: &str = "Unassigned";
pub const NOT_AVAILABLE: &str = "N/A";
pub const DELIVERABLE_NOT_SPECIFIED: &str = "Not specified";

/// Normalized outcome of a successful submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BriefResult {
    /// Opaque reference used to fetch the generated document
    pub artifact_reference: Option<String>,
    /// Generated brief text, when the service includes it
    pub brief: Option<String>,
    pub meetings: Vec<Meeting>,
    pub actions: Vec<ActionItem>,
    pub team_used: Option<Value>,
    pub file_info: Option<Value>,
}

impl BriefResult {
    pub fn summary_counts(&self) -> SummaryCounts {
        summary_counts(&self.actions)
    }

    /// e.g. "2 meetings, 3 actions (1 high / 2 medium / 0 low)"
    pub fn summary_line(&self) -> String {
        let counts = self.summary_counts();
        format!(
            "{} meeting{}, {} action{} ({} high / {} medium / {} low)",
            self.meetings.len(),
            if self.meetings.len() == 1 { "" } else { "s" },
            self.actions.len(),
            if self.actions.len() == 1 { "" } else { "s" },
            counts.high,
            counts.medium,
            counts.low,
        )
    }
}

/// Proposed meeting extracted by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meeting {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub suggested_time: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub duration_minutes: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub meeting_type: String,
    #[serde(deserialize_with = "string_list")]
    pub attendee_names: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub attendee_roles: Vec<String>,
    /// Attendee email addresses
    #[serde(deserialize_with = "string_list")]
    pub attendees: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub attendee_departments: Vec<String>,
    pub agenda: Option<String>,
    pub teams_link: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
}

/// One meeting attendee, assembled from the index-aligned sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attendee<'a> {
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub email: Option<&'a str>,
    pub department: Option<&'a str>,
}

impl Meeting {
    /// Attendees in name order. Entry `i` takes `attendee_roles[i]` etc. when
    /// present; shorter sequences leave the remaining fields absent.
    pub fn attendees(&self) -> Vec<Attendee<'_>> {
        self.attendee_names
            .iter()
            .enumerate()
            .map(|(i, name)| Attendee {
                name,
                role: self.attendee_roles.get(i).map(String::as_str),
                email: self.attendees.get(i).map(String::as_str),
                department: self.attendee_departments.get(i).map(String::as_str),
            })
            .collect()
    }

    pub fn priority_tier(&self) -> PriorityTier {
        priority_tier(&self.priority)
    }

    /// Suggested time for display; raw string when it cannot be parsed
    pub fn display_time(&self) -> String {
        format_timestamp(&self.suggested_time)
    }

    /// Agenda lines with embedded line breaks preserved
    pub fn agenda_lines(&self) -> Vec<&str> {
        self.agenda
            .as_deref()
            .map(|a| a.lines().collect())
            .unwrap_or_default()
    }
}

/// Action item extracted by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionItem {
    #[serde(deserialize_with = "null_as_default")]
    pub task: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "string_list")]
    pub assignee_name: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub assignee_role: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub assignee_departments: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub deadline: String,
    pub deliverable: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub dependencies: Vec<String>,
}

/// Assignee of an action item. Only the first element of each sequence counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignee<'a> {
    pub name: Option<&'a str>,
    pub role: Option<&'a str>,
    pub department: Option<&'a str>,
}

impl<'a> Assignee<'a> {
    pub fn display_name(&self) -> &'a str {
        self.name.unwrap_or(UNASSIGNED)
    }

    pub fn display_role(&self) -> &'a str {
        self.role.unwrap_or(NOT_AVAILABLE)
    }

    pub fn display_department(&self) -> &'a str {
        self.department.unwrap_or(NOT_AVAILABLE)
    }
}

impl ActionItem {
    pub fn assignee(&self) -> Assignee<'_> {
        Assignee {
            name: self.assignee_name.first().map(String::as_str),
            role: self.assignee_role.first().map(String::as_str),
            department: self.assignee_departments.first().map(String::as_str),
        }
    }

    pub fn deliverable_or_default(&self) -> &str {
        match self.deliverable.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => DELIVERABLE_NOT_SPECIFIED,
        }
    }

    pub fn priority_tier(&self) -> PriorityTier {
        priority_tier(&self.priority)
    }

    pub fn deadline_urgency(&self) -> DeadlineUrgency {
        deadline_urgency(&self.deadline)
    }

    pub fn deadline_label(&self) -> String {
        deadline_label(&self.deadline)
    }
}

/// Build a [`BriefResult`] from the raw payload.
///
/// Missing or malformed `meetings`/`actions` become empty sequences. A record
/// that cannot be read keeps its slot as a default record so positions match
/// the payload.
pub fn normalize(raw: &RawBriefPayload) -> BriefResult {
    let meetings: Vec<Meeting> = records(raw, "meetings");
    let actions: Vec<ActionItem> = records(raw, "actions");

    let artifact_reference = ["artifact_reference", "pdf_path"]
        .iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .find(|r| !r.trim().is_empty())
        .map(str::to_string);

    debug!(
        meetings = meetings.len(),
        actions = actions.len(),
        has_artifact = artifact_reference.is_some(),
        "Normalized brief payload"
    );

    BriefResult {
        artifact_reference,
        brief: raw.get("brief").and_then(Value::as_str).map(str::to_string),
        meetings,
        actions,
        team_used: passthrough(raw, "team_used"),
        file_info: passthrough(raw, "file_info"),
    }
}

fn records<T>(raw: &Value, key: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let Some(items) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item.clone()).unwrap_or_else(|e| {
                warn!("Unreadable {} entry at index {}: {}", key, i, e);
                T::default()
            })
        })
        .collect()
}

fn passthrough(raw: &Value, key: &str) -> Option<Value> {
    raw.get(key).filter(|v| !v.is_null()).cloned()
}

// ============================================================================
// Display derivations
// ============================================================================

/// Visual tier for a priority token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    Urgent,
    Caution,
    Normal,
}

pub fn priority_tier(priority: &str) -> PriorityTier {
    match priority.trim().to_lowercase().as_str() {
        "high" => PriorityTier::Urgent,
        "medium" => PriorityTier::Caution,
        _ => PriorityTier::Normal,
    }
}

/// Priority as shown to the user (upper-cased)
pub fn priority_label(priority: &str) -> String {
    priority.trim().to_uppercase()
}

/// Urgency tier for a deadline token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineUrgency {
    MostUrgent,
    ModeratelyUrgent,
    LeastUrgent,
}

pub fn deadline_urgency(deadline: &str) -> DeadlineUrgency {
    match deadline.trim() {
        "1_day" => DeadlineUrgency::MostUrgent,
        "3_days" => DeadlineUrgency::ModeratelyUrgent,
        _ => DeadlineUrgency::LeastUrgent,
    }
}

/// "3_days" -> "3 days"
pub fn deadline_label(deadline: &str) -> String {
    deadline.replace('_', " ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Count actions by priority; unrecognized priorities count nowhere
pub fn summary_counts(actions: &[ActionItem]) -> SummaryCounts {
    actions
        .iter()
        .fold(SummaryCounts::default(), |mut counts, action| {
            match action.priority.trim().to_lowercase().as_str() {
                "high" => counts.high += 1,
                "medium" => counts.medium += 1,
                "low" => counts.low += 1,
                _ => {}
            }
            counts
        })
}

const DISPLAY_TIME_FORMAT: &str = "%a, %b %-d, %Y %-I:%M %p";

/// Format a service timestamp in the local time zone
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

/// Format a service timestamp in `tz`. Offset-qualified timestamps are
/// converted; naive ones are shown as written. Unparseable input is
/// returned unchanged.
pub fn format_timestamp_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(tz).format(DISPLAY_TIME_FORMAT).to_string();
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return naive.format(DISPLAY_TIME_FORMAT).to_string();
        }
    }

    raw.to_string()
}

// ============================================================================
// Lenient field readers
// ============================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts an array of strings, a single string, or null
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Accepts integers, floats, and numeric strings
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let minutes = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(minutes).unwrap_or(u32::MAX))
}

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Calendar every submitted schedule is written to.
pub const CALENDAR_NAME: &str = "Class Schedule";

/// One course's concrete slot within a candidate schedule.
///
/// Fields the client does not interpret are kept in `extra` and sent back to
/// the calendar endpoint unchanged. A `location`, `start` or `end` that is
/// `null` or missing is omitted when the placement is sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    /// Professor for the section.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Placement {
    pub fn start_time(&self) -> Option<DateTime<Local>> {
        self.start.as_deref().and_then(parse_timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end.as_deref().and_then(parse_timestamp)
    }
}

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 or a naive ISO timestamp taken as local time.
fn parse_timestamp(ts: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M"))
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: Vec<Placement>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cons: Vec<String>,
}

/// `data` of a successful generate response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<ScheduleOption>,
}

impl ScheduleResult {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recommendations.len()
    }
}

/// Body of `POST /api/add-to-calendar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSubmission {
    pub schedule: Vec<Placement>,
    pub calendar_name: String,
}

impl CalendarSubmission {
    pub fn new(schedule: Vec<Placement>) -> Self {
        Self {
            schedule,
            calendar_name: CALENDAR_NAME.to_string(),
        }
    }
}

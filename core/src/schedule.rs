use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::humidity::{HumidityLevel, infer_humidity};
use crate::models::WateringRecord;

/// Days added to the due date by the snooze action.
pub const SNOOZE_DAYS: i64 = 2;

/// Fallback care interval when a plant has no recorded interval.
#[must_use]
pub fn default_interval_days(category: &str) -> i64 {
    let lower = category.to_lowercase();
    if lower.contains("succulent") || lower.contains("cacti") {
        21
    } else {
        7
    }
}

#[must_use]
pub fn add_days(base: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    base + Duration::days(days)
}

/// Parse a stored timestamp. Accepts RFC 3339, a bare datetime, or a bare
/// date (midnight UTC). Returns `None` rather than failing on malformed
/// input; absent and unparseable are treated the same everywhere.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Format a stored timestamp for display ("Mar 4, 2026"). Absent or
/// malformed input renders as an em dash.
#[must_use]
pub fn format_date(value: Option<&str>) -> String {
    match value.and_then(parse_timestamp) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "—".to_string(),
    }
}

/// Where a plant stands relative to its next due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
    NoSchedule,
    Overdue,
    Soon,
    Scheduled,
}

impl DueStatus {
    /// Status chip text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NoSchedule => "set schedule",
            Self::Overdue => "overdue",
            Self::Soon => "due soon",
            Self::Scheduled => "scheduled",
        }
    }
}

/// Classify a due timestamp against `now`. The checks form a strict
/// priority chain: no schedule, then overdue, then soon (within one day,
/// inclusive), then scheduled.
#[must_use]
pub fn classify_due_status(next_water_due_at: Option<&str>, now: DateTime<Utc>) -> DueStatus {
    let Some(due) = next_water_due_at.and_then(parse_timestamp) else {
        return DueStatus::NoSchedule;
    };
    if due < now {
        DueStatus::Overdue
    } else if due <= add_days(now, 1) {
        DueStatus::Soon
    } else {
        DueStatus::Scheduled
    }
}

/// Merge the row returned by the store over what was known locally.
/// Field precedence: server value, then previous local value, then the
/// value computed for the upsert.
#[must_use]
pub fn merge_record(
    server: &WateringRecord,
    previous: &WateringRecord,
    computed: &WateringRecord,
) -> WateringRecord {
    WateringRecord {
        plant_name: if server.plant_name.is_empty() {
            previous.plant_name.clone()
        } else {
            server.plant_name.clone()
        },
        category: pick(&server.category, &previous.category, &computed.category),
        default_interval_days: server
            .default_interval_days
            .or(previous.default_interval_days)
            .or(computed.default_interval_days),
        last_watered_at: pick(
            &server.last_watered_at,
            &previous.last_watered_at,
            &computed.last_watered_at,
        ),
        next_water_due_at: pick(
            &server.next_water_due_at,
            &previous.next_water_due_at,
            &computed.next_water_due_at,
        ),
    }
}

fn pick(
    server: &Option<String>,
    previous: &Option<String>,
    computed: &Option<String>,
) -> Option<String> {
    server
        .clone()
        .or_else(|| previous.clone())
        .or_else(|| computed.clone())
}

/// Per-plant schedule state as known locally: the last stored row (or a
/// placeholder when nothing is persisted yet) plus the editable interval.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    pub plant_name: String,
    /// Catalog category, written back on every upsert.
    pub category: String,
    /// Current interval in days, as shown in the interval input.
    pub interval_days: i64,
    pub record: WateringRecord,
    /// False while the record is a local placeholder that has never been
    /// stored.
    pub persisted: bool,
    pub load_error: Option<String>,
}

impl ScheduleState {
    /// State for a row loaded from the store. The interval falls back to
    /// the category default when the row carries none.
    #[must_use]
    pub fn from_record(record: WateringRecord, plant_name: &str, category: &str) -> Self {
        let interval_days = record
            .default_interval_days
            .unwrap_or_else(|| default_interval_days(category));
        Self {
            plant_name: plant_name.to_string(),
            category: category.to_string(),
            interval_days,
            record,
            persisted: true,
            load_error: None,
        }
    }

    /// Local-only placeholder for a plant with no stored row. Not
    /// persisted until a mutation succeeds.
    #[must_use]
    pub fn placeholder(plant_name: &str, category: &str) -> Self {
        let interval_days = default_interval_days(category);
        let record = WateringRecord {
            plant_name: plant_name.to_string(),
            category: (!category.is_empty()).then(|| category.to_string()),
            default_interval_days: Some(interval_days),
            last_watered_at: None,
            next_water_due_at: None,
        };
        Self {
            plant_name: plant_name.to_string(),
            category: category.to_string(),
            interval_days,
            record,
            persisted: false,
            load_error: None,
        }
    }

    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> DueStatus {
        classify_due_status(self.record.next_water_due_at.as_deref(), now)
    }

    #[must_use]
    pub fn status(&self) -> DueStatus {
        self.status_at(Utc::now())
    }
}

/// Serializable card-level view of a schedule state, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub plant_name: String,
    pub category: String,
    pub interval_days: i64,
    pub last_watered_at: Option<String>,
    pub next_water_due_at: Option<String>,
    pub last_watered_display: String,
    pub next_due_display: String,
    pub status: DueStatus,
    pub status_label: &'static str,
    pub overdue: bool,
    pub humidity: HumidityLevel,
    pub humidity_range: &'static str,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

impl ScheduleView {
    /// Build the display view for a state. `notes` is the plant's catalog
    /// notes text, used for humidity inference.
    #[must_use]
    pub fn build(state: &ScheduleState, notes: &str, now: DateTime<Utc>) -> Self {
        let status = state.status_at(now);
        let humidity = infer_humidity(notes, &state.category);
        Self {
            plant_name: state.plant_name.clone(),
            category: state.category.clone(),
            interval_days: state.interval_days,
            last_watered_at: state.record.last_watered_at.clone(),
            next_water_due_at: state.record.next_water_due_at.clone(),
            last_watered_display: format_date(state.record.last_watered_at.as_deref()),
            next_due_display: format_date(state.record.next_water_due_at.as_deref()),
            status,
            status_label: status.label(),
            overdue: status == DueStatus::Overdue,
            humidity,
            humidity_range: humidity.range(),
            persisted: state.persisted,
            load_error: state.load_error.clone(),
        }
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Plant, WateringRecord, validate_interval_days};
use crate::schedule::{SNOOZE_DAYS, ScheduleState, add_days, merge_record, parse_timestamp};

/// Error surfaced when the per-plant read fails.
pub const LOAD_ERROR: &str = "Failed to load watering status";
/// Error surfaced when the interval upsert fails.
pub const SAVE_INTERVAL_ERROR: &str = "Failed to save interval";
/// Error surfaced when the mark-watered upsert fails.
pub const MARK_WATERED_ERROR: &str = "Failed to mark watered";
/// Error surfaced when the snooze upsert fails.
pub const SNOOZE_ERROR: &str = "Failed to snooze";

/// Keyed access to the hosted watering table.
///
/// The store is optional at deploy time: `available()` is the capability
/// check consumers branch on, and the other operations fail cleanly when
/// it returns false. "Row not found" is `Ok(None)`, distinct from an
/// error.
#[async_trait]
pub trait WateringStore: Send + Sync {
    fn available(&self) -> bool;
    async fn fetch(&self, plant_name: &str) -> Result<Option<WateringRecord>>;
    async fn fetch_all(&self) -> Result<Vec<WateringRecord>>;
    /// Insert or replace the row for `record.plant_name`, returning the
    /// stored row. Fields absent from `record` must survive on the
    /// backend untouched.
    async fn upsert(&self, record: &WateringRecord) -> Result<WateringRecord>;
}

/// Per-plant watering schedule operations over a [`WateringStore`].
///
/// Every mutation follows the same shape: compute new fields, upsert the
/// row, and only on success merge the returned row over the previous
/// state. On failure the caller's state is untouched and the error
/// carries the action's display message.
pub struct ScheduleService<S> {
    store: S,
}

impl<S: WateringStore> ScheduleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn available(&self) -> bool {
        self.store.available()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the schedule state for one plant. Never fails: an unavailable
    /// store or a missing row yields a local placeholder, and a read
    /// error yields the placeholder with `load_error` set. Mutations stay
    /// attemptable in every case.
    pub async fn load(&self, plant_name: &str, category: &str) -> ScheduleState {
        if !self.store.available() {
            return ScheduleState::placeholder(plant_name, category);
        }
        match self.store.fetch(plant_name).await {
            Ok(Some(record)) => ScheduleState::from_record(record, plant_name, category),
            Ok(None) => ScheduleState::placeholder(plant_name, category),
            Err(_) => {
                let mut state = ScheduleState::placeholder(plant_name, category);
                state.load_error = Some(LOAD_ERROR.to_string());
                state
            }
        }
    }

    /// Load schedule states for the whole catalog with a single
    /// fetch-all, joining rows to plants by name.
    pub async fn load_all(&self, plants: &[Plant]) -> Vec<ScheduleState> {
        if !self.store.available() {
            return plants
                .iter()
                .map(|p| ScheduleState::placeholder(&p.name, &p.category))
                .collect();
        }
        match self.store.fetch_all().await {
            Ok(records) => {
                let mut by_name: HashMap<String, WateringRecord> = records
                    .into_iter()
                    .map(|r| (r.plant_name.clone(), r))
                    .collect();
                plants
                    .iter()
                    .map(|p| match by_name.remove(&p.name) {
                        Some(record) => ScheduleState::from_record(record, &p.name, &p.category),
                        None => ScheduleState::placeholder(&p.name, &p.category),
                    })
                    .collect()
            }
            Err(_) => plants
                .iter()
                .map(|p| {
                    let mut state = ScheduleState::placeholder(&p.name, &p.category);
                    state.load_error = Some(LOAD_ERROR.to_string());
                    state
                })
                .collect(),
        }
    }

    /// Set the care interval. Rejected outright for non-positive values.
    /// The candidate due date is recomputed from the last-watered
    /// timestamp when one exists; otherwise the stored due date is kept
    /// as is, never fabricated from "now".
    pub async fn set_interval(
        &self,
        state: &ScheduleState,
        new_interval: i64,
    ) -> Result<ScheduleState> {
        validate_interval_days(new_interval)?;
        let next_due = match state.record.last_watered_at.as_deref().and_then(parse_timestamp) {
            Some(last) => Some(add_days(last, new_interval).to_rfc3339()),
            None => state.record.next_water_due_at.clone(),
        };
        let payload = WateringRecord {
            plant_name: state.plant_name.clone(),
            category: self.payload_category(state),
            default_interval_days: Some(new_interval),
            last_watered_at: None,
            next_water_due_at: next_due,
        };
        let stored = self
            .store
            .upsert(&payload)
            .await
            .context(SAVE_INTERVAL_ERROR)?;
        Ok(merged_state(state, &payload, &stored, new_interval))
    }

    /// Record a watering now: last watered becomes `now` and the due date
    /// becomes `now` plus the current interval.
    pub async fn mark_watered(&self, state: &ScheduleState) -> Result<ScheduleState> {
        self.mark_watered_at(state, Utc::now()).await
    }

    pub async fn mark_watered_at(
        &self,
        state: &ScheduleState,
        now: DateTime<Utc>,
    ) -> Result<ScheduleState> {
        let payload = WateringRecord {
            plant_name: state.plant_name.clone(),
            category: self.payload_category(state),
            default_interval_days: Some(state.interval_days),
            last_watered_at: Some(now.to_rfc3339()),
            next_water_due_at: Some(add_days(now, state.interval_days).to_rfc3339()),
        };
        let stored = self
            .store
            .upsert(&payload)
            .await
            .context(MARK_WATERED_ERROR)?;
        Ok(merged_state(state, &payload, &stored, state.interval_days))
    }

    /// Push the due date back two days. Anchors on the existing due date
    /// when one exists, else on `now`. Never touches last watered.
    pub async fn snooze(&self, state: &ScheduleState) -> Result<ScheduleState> {
        self.snooze_at(state, Utc::now()).await
    }

    pub async fn snooze_at(
        &self,
        state: &ScheduleState,
        now: DateTime<Utc>,
    ) -> Result<ScheduleState> {
        let anchor = state
            .record
            .next_water_due_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let payload = WateringRecord {
            plant_name: state.plant_name.clone(),
            category: self.payload_category(state),
            default_interval_days: Some(state.interval_days),
            last_watered_at: None,
            next_water_due_at: Some(add_days(anchor, SNOOZE_DAYS).to_rfc3339()),
        };
        let stored = self.store.upsert(&payload).await.context(SNOOZE_ERROR)?;
        Ok(merged_state(state, &payload, &stored, state.interval_days))
    }

    fn payload_category(&self, state: &ScheduleState) -> Option<String> {
        (!state.category.is_empty()).then(|| state.category.clone())
    }
}

fn merged_state(
    state: &ScheduleState,
    computed: &WateringRecord,
    stored: &WateringRecord,
    interval_days: i64,
) -> ScheduleState {
    ScheduleState {
        plant_name: state.plant_name.clone(),
        category: state.category.clone(),
        interval_days,
        record: merge_record(stored, &state.record, computed),
        persisted: true,
        load_error: None,
    }
}

/// In-memory [`WateringStore`] used by tests and local experiments.
///
/// Mirrors the hosted table's upsert semantics: fields absent from the
/// payload keep their stored values, and the returned row is the full
/// stored state. Failure and unavailability can be simulated.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, WateringRecord>>,
    offline: bool,
    fail: AtomicBool,
    last_upsert: Mutex<Option<WateringRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports itself unconfigured.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, record: WateringRecord) {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.insert(record.plant_name.clone(), record);
    }

    /// Make subsequent operations fail, or stop failing.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// The raw payload passed to the most recent upsert.
    #[must_use]
    pub fn last_upsert(&self) -> Option<WateringRecord> {
        self.last_upsert
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn check(&self) -> Result<()> {
        if self.offline {
            bail!("watering store is not configured");
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("simulated store failure");
        }
        Ok(())
    }
}

#[async_trait]
impl WateringStore for MemoryStore {
    fn available(&self) -> bool {
        !self.offline
    }

    async fn fetch(&self, plant_name: &str) -> Result<Option<WateringRecord>> {
        self.check()?;
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.get(plant_name).cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<WateringRecord>> {
        self.check()?;
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut all: Vec<WateringRecord> = rows.values().cloned().collect();
        all.sort_by(|a, b| a.plant_name.cmp(&b.plant_name));
        Ok(all)
    }

    async fn upsert(&self, record: &WateringRecord) -> Result<WateringRecord> {
        self.check()?;
        {
            let mut last = self
                .last_upsert
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *last = Some(record.clone());
        }
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let merged = match rows.get(&record.plant_name) {
            Some(existing) => WateringRecord {
                plant_name: record.plant_name.clone(),
                category: record.category.clone().or_else(|| existing.category.clone()),
                default_interval_days: record
                    .default_interval_days
                    .or(existing.default_interval_days),
                last_watered_at: record
                    .last_watered_at
                    .clone()
                    .or_else(|| existing.last_watered_at.clone()),
                next_water_due_at: record
                    .next_water_due_at
                    .clone()
                    .or_else(|| existing.next_water_due_at.clone()),
            },
            None => record.clone(),
        };
        rows.insert(record.plant_name.clone(), merged.clone());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{DueStatus, classify_due_status};
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    fn stored_row(name: &str, interval: i64, last: Option<&str>, next: Option<&str>) -> WateringRecord {
        WateringRecord {
            plant_name: name.to_string(),
            category: Some("Succulents & Cacti".to_string()),
            default_interval_days: Some(interval),
            last_watered_at: last.map(String::from),
            next_water_due_at: next.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_load_defaults_for_missing_row() {
        let service = ScheduleService::new(MemoryStore::new());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        assert_eq!(state.interval_days, 21);
        assert!(!state.persisted);
        assert!(state.load_error.is_none());

        let state = service.load("Fern", "Ferns").await;
        assert_eq!(state.interval_days, 7);
    }

    #[tokio::test]
    async fn test_load_uses_stored_row() {
        let store = MemoryStore::new();
        store.seed(stored_row("Aloe", 30, Some("2026-01-01T00:00:00Z"), None));
        let service = ScheduleService::new(store);
        let state = service.load("Aloe", "Succulents & Cacti").await;
        assert_eq!(state.interval_days, 30);
        assert!(state.persisted);
        assert_eq!(state.record.last_watered_at.as_deref(), Some("2026-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_load_failure_sets_error_and_stays_usable() {
        let store = MemoryStore::new();
        store.set_fail(true);
        let service = ScheduleService::new(store);
        let state = service.load("Aloe", "Succulents & Cacti").await;
        assert_eq!(state.interval_days, 21);
        assert_eq!(state.load_error.as_deref(), Some("Failed to load watering status"));
        assert_eq!(state.status_at(Utc::now()).label(), "set schedule");

        // A later mark-watered must still attempt its upsert.
        service.store().set_fail(false);
        let now = at(2026, 3, 4);
        let updated = service.mark_watered_at(&state, now).await.unwrap();
        assert!(updated.persisted);
        assert!(updated.load_error.is_none());
        assert!(service.store().last_upsert().is_some());
    }

    #[tokio::test]
    async fn test_load_unavailable_store_is_placeholder_without_error() {
        let service = ScheduleService::new(MemoryStore::unavailable());
        assert!(!service.available());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        assert!(!state.persisted);
        assert!(state.load_error.is_none());
    }

    #[tokio::test]
    async fn test_mark_watered_payload_and_result() {
        let service = ScheduleService::new(MemoryStore::new());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        let now = at(2026, 3, 4);

        let updated = service.mark_watered_at(&state, now).await.unwrap();

        let payload = service.store().last_upsert().unwrap();
        assert_eq!(payload.plant_name, "Aloe");
        assert_eq!(payload.category.as_deref(), Some("Succulents & Cacti"));
        assert_eq!(payload.default_interval_days, Some(21));
        assert_eq!(payload.last_watered_at.as_deref(), Some(now.to_rfc3339().as_str()));
        assert_eq!(
            payload.next_water_due_at.as_deref(),
            Some(add_days(now, 21).to_rfc3339().as_str())
        );

        assert_eq!(updated.record.last_watered_at.as_deref(), Some(now.to_rfc3339().as_str()));
        assert_eq!(
            classify_due_status(updated.record.next_water_due_at.as_deref(), now),
            DueStatus::Scheduled
        );
        assert!(updated.persisted);
    }

    #[tokio::test]
    async fn test_set_interval_recomputes_due_from_last_watered() {
        let store = MemoryStore::new();
        let last = at(2026, 1, 1);
        store.seed(stored_row(
            "Cactus",
            21,
            Some(&last.to_rfc3339()),
            Some(&add_days(last, 21).to_rfc3339()),
        ));
        let service = ScheduleService::new(store);
        let state = service.load("Cactus", "Succulents & Cacti").await;

        let updated = service.set_interval(&state, 30).await.unwrap();

        assert_eq!(updated.interval_days, 30);
        // Recomputed from last watered, not from "now".
        assert_eq!(
            updated.record.next_water_due_at.as_deref(),
            Some(add_days(last, 30).to_rfc3339().as_str())
        );
        let payload = service.store().last_upsert().unwrap();
        assert!(payload.last_watered_at.is_none());
    }

    #[tokio::test]
    async fn test_set_interval_without_last_watered_keeps_stored_due() {
        let store = MemoryStore::new();
        store.seed(stored_row("Aloe", 21, None, Some("2026-04-01T00:00:00Z")));
        let service = ScheduleService::new(store);
        let state = service.load("Aloe", "Succulents & Cacti").await;

        let updated = service.set_interval(&state, 10).await.unwrap();

        // No last-watered anchor: the stored due date is kept, not
        // fabricated from the current time.
        assert_eq!(
            updated.record.next_water_due_at.as_deref(),
            Some("2026-04-01T00:00:00Z")
        );
        assert_eq!(updated.interval_days, 10);
    }

    #[tokio::test]
    async fn test_set_interval_without_any_due_date_leaves_none() {
        let service = ScheduleService::new(MemoryStore::new());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        let updated = service.set_interval(&state, 14).await.unwrap();
        assert!(updated.record.next_water_due_at.is_none());
        assert_eq!(updated.status_at(Utc::now()), DueStatus::NoSchedule);
    }

    #[tokio::test]
    async fn test_set_interval_rejects_non_positive() {
        let service = ScheduleService::new(MemoryStore::new());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        assert!(service.set_interval(&state, 0).await.is_err());
        assert!(service.set_interval(&state, -3).await.is_err());
        // Rejected before any upsert is attempted.
        assert!(service.store().last_upsert().is_none());
    }

    #[tokio::test]
    async fn test_snooze_anchors_on_existing_due_date() {
        let store = MemoryStore::new();
        let due = at(2026, 3, 10);
        store.seed(stored_row("Aloe", 21, Some("2026-02-17T12:00:00Z"), Some(&due.to_rfc3339())));
        let service = ScheduleService::new(store);
        let state = service.load("Aloe", "Succulents & Cacti").await;

        let now = at(2026, 3, 4);
        let updated = service.snooze_at(&state, now).await.unwrap();

        assert_eq!(
            updated.record.next_water_due_at.as_deref(),
            Some(add_days(due, 2).to_rfc3339().as_str())
        );
        // Last watered is untouched by snooze.
        assert_eq!(
            updated.record.last_watered_at.as_deref(),
            Some("2026-02-17T12:00:00Z")
        );
        let payload = service.store().last_upsert().unwrap();
        assert!(payload.last_watered_at.is_none());
    }

    #[tokio::test]
    async fn test_snooze_anchors_on_now_without_due_date() {
        let service = ScheduleService::new(MemoryStore::new());
        let state = service.load("Fern", "Ferns").await;
        let now = at(2026, 3, 4);

        let updated = service.snooze_at(&state, now).await.unwrap();

        assert_eq!(
            updated.record.next_water_due_at.as_deref(),
            Some(add_days(now, 2).to_rfc3339().as_str())
        );
        assert!(updated.record.last_watered_at.is_none());
    }

    #[tokio::test]
    async fn test_mutation_failure_keeps_error_message() {
        let store = MemoryStore::new();
        store.set_fail(true);
        let service = ScheduleService::new(store);
        let state = ScheduleState::placeholder("Aloe", "Succulents & Cacti");
        let now = at(2026, 3, 4);

        let err = service.mark_watered_at(&state, now).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to mark watered");

        let err = service.set_interval(&state, 14).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to save interval");

        let err = service.snooze_at(&state, now).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to snooze");
    }

    #[tokio::test]
    async fn test_unavailable_store_mutations_fail_with_configuration_error() {
        let service = ScheduleService::new(MemoryStore::unavailable());
        let state = service.load("Aloe", "Succulents & Cacti").await;
        let err = service.mark_watered(&state).await.unwrap_err();
        assert!(format!("{err:#}").contains("watering store is not configured"));
    }

    #[tokio::test]
    async fn test_upsert_preserves_omitted_fields_end_to_end() {
        let service = ScheduleService::new(MemoryStore::new());
        let now = at(2026, 3, 4);

        // First water the plant, then change the interval. The interval
        // upsert omits last_watered_at, which must survive on the store
        // and reappear in the merged state.
        let state = service.load("Aloe", "Succulents & Cacti").await;
        let watered = service.mark_watered_at(&state, now).await.unwrap();
        let updated = service.set_interval(&watered, 30).await.unwrap();

        assert_eq!(
            updated.record.last_watered_at.as_deref(),
            Some(now.to_rfc3339().as_str())
        );
        assert_eq!(
            updated.record.next_water_due_at.as_deref(),
            Some(add_days(now, 30).to_rfc3339().as_str())
        );

        let stored = service.store().fetch("Aloe").await.unwrap().unwrap();
        assert_eq!(stored.last_watered_at.as_deref(), Some(now.to_rfc3339().as_str()));
    }

    #[tokio::test]
    async fn test_load_all_joins_by_name() {
        let store = MemoryStore::new();
        store.seed(stored_row("Aloe", 30, None, None));
        let service = ScheduleService::new(store);

        let plants = vec![
            Plant {
                name: "Aloe".to_string(),
                category: "Succulents & Cacti".to_string(),
                light: String::new(),
                water: String::new(),
                notes: String::new(),
                image: String::new(),
            },
            Plant {
                name: "Fern".to_string(),
                category: "Ferns".to_string(),
                light: String::new(),
                water: String::new(),
                notes: String::new(),
                image: String::new(),
            },
        ];

        let states = service.load_all(&plants).await;
        assert_eq!(states.len(), 2);
        assert!(states[0].persisted);
        assert_eq!(states[0].interval_days, 30);
        assert!(!states[1].persisted);
        assert_eq!(states[1].interval_days, 7);
    }

    #[tokio::test]
    async fn test_load_all_failure_marks_every_state() {
        let store = MemoryStore::new();
        store.set_fail(true);
        let service = ScheduleService::new(store);
        let plants = vec![Plant {
            name: "Aloe".to_string(),
            category: String::new(),
            light: String::new(),
            water: String::new(),
            notes: String::new(),
            image: String::new(),
        }];
        let states = service.load_all(&plants).await;
        assert_eq!(states[0].load_error.as_deref(), Some("Failed to load watering status"));
    }
}

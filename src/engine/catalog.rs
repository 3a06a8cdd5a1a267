use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::debug;
use ulid::Ulid;

use crate::model::*;
use crate::observability;

use super::{Engine, EngineError};

/// Shared method/date validation. Runs before any slot lookup or
/// generation, and is re-run identically on the reservation path.
pub(super) fn validate_method_date(
    method: DeliveryMethod,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), EngineError> {
    if date < today {
        return Err(EngineError::InvalidRequest(
            "Date cannot be in the past".into(),
        ));
    }
    if method.same_day_only() && date != today {
        return Err(EngineError::InvalidRequest(format!(
            "{method} is only available for today's date"
        )));
    }
    Ok(())
}

fn truncate_to_hour(t: NaiveTime) -> NaiveTime {
    hour(t.hour())
}

impl Engine {
    /// Bookable slots for a method and date, ordered by start time.
    /// Materializes the day's slots on first access.
    pub async fn get_slots(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
    ) -> Result<Vec<SlotView>, EngineError> {
        validate_method_date(method, date, self.clock.today())?;
        metrics::counter!(observability::SLOT_QUERIES_TOTAL).increment(1);

        let ids = match method.schedule() {
            Schedule::Fixed(windows) => self.fixed_day_slots(method, date, windows).await?,
            Schedule::Rolling {
                hours,
                last_start,
                cap,
            } => vec![self.rolling_slot(method, date, hours, last_start, cap).await?],
        };

        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            let slot = self.store.get_slot(&id).ok_or_else(|| {
                EngineError::InvalidRequest(format!("Time slot not found: {id}"))
            })?;
            views.push(SlotView::from_slot(&*slot.read().await));
        }
        views.sort_by_key(|v| v.start_time);
        Ok(views)
    }

    /// Look up the day's slots, materializing the full template batch if
    /// none exist yet. The existence check and the batch creation run under
    /// the day lock: one logical step.
    async fn fixed_day_slots(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
        windows: &'static [TemplateWindow],
    ) -> Result<Vec<Ulid>, EngineError> {
        let existing = self.store.day_slot_ids(method, date);
        if !existing.is_empty() {
            return Ok(existing);
        }

        let lock = self.store.day_lock(method, date);
        let _guard = lock.lock().await;
        // Re-check: another caller may have materialized while we waited.
        let existing = self.store.day_slot_ids(method, date);
        if !existing.is_empty() {
            return Ok(existing);
        }

        let slots: Vec<TimeSlot> = windows
            .iter()
            .map(|&(start, end)| {
                TimeSlot::available(Ulid::new(), method, date, Window::from_hours(start, end))
            })
            .collect();
        for slot in &slots {
            self.wal_append(&Event::SlotCreated {
                id: slot.id,
                method,
                date,
                start: slot.window.start,
                end: slot.window.end,
            })
            .await?;
        }
        let ids = self.store.insert_day_batch(method, date, slots);
        metrics::counter!(observability::SLOTS_CREATED_TOTAL).increment(ids.len() as u64);
        debug!("materialized {} {method} slots for {date}", ids.len());
        Ok(ids)
    }

    /// Express slot: hour-truncated rolling window, reused within the hour.
    /// Two calls in the same hour observe the same slot id; the next hour
    /// observes a new one.
    async fn rolling_slot(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
        hours: u32,
        last_start: u32,
        cap: u32,
    ) -> Result<Ulid, EngineError> {
        let now = self.clock.time_now();
        if now > hour(last_start) {
            return Err(EngineError::InvalidRequest(format!(
                "ASAP delivery is not available after {last_start}:00"
            )));
        }
        let window_start = truncate_to_hour(now);
        let end_hour = (window_start.hour() + hours).min(cap);
        let window = Window::new(window_start, hour(end_hour));

        if let Some(id) = self.store.find_by_start(method, date, window_start) {
            return Ok(id);
        }

        let lock = self.store.day_lock(method, date);
        let _guard = lock.lock().await;
        if let Some(id) = self.store.find_by_start(method, date, window_start) {
            return Ok(id);
        }
        self.create_slot(method, date, window).await
    }

    /// WAL-append + insert one new slot. Returns the stored id, which is
    /// the earlier writer's if the uniqueness index already holds this
    /// window.
    async fn create_slot(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
        window: Window,
    ) -> Result<Ulid, EngineError> {
        let slot = TimeSlot::available(Ulid::new(), method, date, window);
        let event = Event::SlotCreated {
            id: slot.id,
            method,
            date,
            start: window.start,
            end: window.end,
        };
        self.wal_append(&event).await?;
        let stored = self.store.insert_slot(slot);
        metrics::counter!(observability::SLOTS_CREATED_TOTAL).increment(1);
        Ok(stored)
    }
}

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, RwLock};
use ulid::Ulid;

use crate::model::*;

/// A slot row shared between contenders. The `RwLock` is the unit-of-work
/// boundary for reservation commits on that slot.
pub type SharedSlot = Arc<RwLock<TimeSlot>>;

type DayKey = (DeliveryMethod, NaiveDate);

/// In-memory slot and reservation state, rebuilt from the WAL on open.
pub(super) struct SlotStore {
    slots: DashMap<Ulid, SharedSlot>,
    /// (method, date) → slot ids, creation order.
    by_day: DashMap<DayKey, Vec<Ulid>>,
    /// Uniqueness index: at most one slot per (method, date, start).
    by_start: DashMap<(DeliveryMethod, NaiveDate, NaiveTime), Ulid>,
    reservations: DashMap<Ulid, Reservation>,
    /// Serializes the check-then-create step of a day's first access.
    day_locks: DashMap<DayKey, Arc<Mutex<()>>>,
}

impl SlotStore {
    pub(super) fn new() -> Self {
        Self {
            slots: DashMap::new(),
            by_day: DashMap::new(),
            by_start: DashMap::new(),
            reservations: DashMap::new(),
            day_locks: DashMap::new(),
        }
    }

    pub(super) fn get_slot(&self, id: &Ulid) -> Option<SharedSlot> {
        self.slots.get(id).map(|e| e.value().clone())
    }

    /// Slot ids recorded for a (method, date), creation order.
    pub(super) fn day_slot_ids(&self, method: DeliveryMethod, date: NaiveDate) -> Vec<Ulid> {
        self.by_day
            .get(&(method, date))
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub(super) fn find_by_start(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
        start: NaiveTime,
    ) -> Option<Ulid> {
        self.by_start.get(&(method, date, start)).map(|e| *e.value())
    }

    /// Claim the (method, date, start) key and insert the slot row. The row
    /// lands before the key is published, so an id found through an index
    /// always resolves. Returns the stored id and whether this call won;
    /// a lost creation race yields the earlier writer's id.
    fn claim_row(&self, slot: TimeSlot) -> (Ulid, bool) {
        let key = (slot.method, slot.date, slot.window.start);
        match self.by_start.entry(key) {
            Entry::Occupied(existing) => (*existing.get(), false),
            Entry::Vacant(vacant) => {
                let id = slot.id;
                self.slots.insert(id, Arc::new(RwLock::new(slot)));
                vacant.insert(id);
                (id, true)
            }
        }
    }

    /// Insert a single slot and record it in the day index.
    pub(super) fn insert_slot(&self, slot: TimeSlot) -> Ulid {
        let day = (slot.method, slot.date);
        let (id, won) = self.claim_row(slot);
        if won {
            self.by_day.entry(day).or_default().push(id);
        }
        id
    }

    /// Insert a template batch, publishing the day index entry once so a
    /// concurrent reader observes the whole batch or none of it. Caller
    /// holds the day lock and has verified the day index is empty.
    pub(super) fn insert_day_batch(
        &self,
        method: DeliveryMethod,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
    ) -> Vec<Ulid> {
        let mut ids = Vec::with_capacity(slots.len());
        for slot in slots {
            ids.push(self.claim_row(slot).0);
        }
        self.by_day.insert((method, date), ids.clone());
        ids
    }

    /// Creation mutex for a (method, date). Held across the existence check
    /// and the batch materialization so they form one logical step.
    pub(super) fn day_lock(&self, method: DeliveryMethod, date: NaiveDate) -> Arc<Mutex<()>> {
        self.day_locks.entry((method, date)).or_default().clone()
    }

    pub(super) fn insert_reservation(&self, reservation: Reservation) {
        self.reservations.insert(reservation.id, reservation);
    }

    pub(super) fn get_reservation(&self, id: &Ulid) -> Option<Reservation> {
        self.reservations.get(id).map(|e| e.value().clone())
    }

    pub(super) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Apply a replayed event. The engine is being opened, nothing else
    /// holds the slot Arcs yet.
    pub(super) fn apply_replay(&self, event: &Event) {
        match event {
            Event::SlotCreated {
                id,
                method,
                date,
                start,
                end,
            } => {
                let slot =
                    TimeSlot::available(*id, *method, *date, Window::new(*start, *end));
                // Duplicate (method, date, start) → benign lost creation
                // race; the earlier record wins.
                self.insert_slot(slot);
            }
            Event::SlotReserved { id } => {
                if let Some(slot) = self.get_slot(id) {
                    let mut guard = slot.try_write().expect("replay: uncontended write");
                    guard.status = SlotStatus::Reserved;
                    guard.revision += 1;
                }
            }
            Event::ReservationCreated {
                id,
                slot_id,
                customer_id,
                created_at,
            } => {
                self.reservations.insert(
                    *id,
                    Reservation {
                        id: *id,
                        slot_id: *slot_id,
                        customer_id: customer_id.clone(),
                        created_at: *created_at,
                    },
                );
            }
        }
    }
}

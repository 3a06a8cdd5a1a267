use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// The closed set of delivery methods. Serde names are the wire names the
/// storefront sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    /// Store pickup, any non-past date.
    Drive,
    /// Standard delivery, any non-past date.
    Delivery,
    /// Same-day delivery, today only.
    DeliveryToday,
    /// Express delivery, today only, rolling 2-hour window.
    DeliveryAsap,
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeliveryMethod::Drive => "DRIVE",
            DeliveryMethod::Delivery => "DELIVERY",
            DeliveryMethod::DeliveryToday => "DELIVERY_TODAY",
            DeliveryMethod::DeliveryAsap => "DELIVERY_ASAP",
        };
        f.write_str(name)
    }
}

/// Template window as (start hour, end hour).
pub type TemplateWindow = (u32, u32);

/// Four fixed windows per day for the standard methods.
pub const STANDARD_WINDOWS: [TemplateWindow; 4] = [(9, 11), (11, 13), (14, 16), (16, 18)];

/// Two fixed afternoon windows for same-day delivery.
pub const TODAY_WINDOWS: [TemplateWindow; 2] = [(14, 16), (16, 18)];

/// How a method's bookable windows are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed per-day template windows.
    Fixed(&'static [TemplateWindow]),
    /// Rolling window anchored to the current hour. `last_start` is the
    /// latest hour at which a window may still be requested; `cap` bounds
    /// the window end.
    Rolling { hours: u32, last_start: u32, cap: u32 },
}

impl DeliveryMethod {
    /// Tagged dispatch from method to slot derivation. Adding a method
    /// forces every `Schedule` consumer through this match.
    pub fn schedule(self) -> Schedule {
        match self {
            DeliveryMethod::Drive | DeliveryMethod::Delivery => Schedule::Fixed(&STANDARD_WINDOWS),
            DeliveryMethod::DeliveryToday => Schedule::Fixed(&TODAY_WINDOWS),
            DeliveryMethod::DeliveryAsap => Schedule::Rolling {
                hours: 2,
                last_start: 18,
                cap: 20,
            },
        }
    }

    /// Methods that only accept today's date.
    pub fn same_day_only(self) -> bool {
        matches!(
            self,
            DeliveryMethod::DeliveryToday | DeliveryMethod::DeliveryAsap
        )
    }
}

/// `NaiveTime` at the top of the given hour.
pub fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).expect("hour in 0..24")
}

/// Bookable window `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    pub fn from_hours(start: u32, end: u32) -> Self {
        Self::new(hour(start), hour(end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Reserved,
}

/// A bookable delivery slot. `revision` increments on every committed
/// mutation and is the token optimistic reservation commits compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Ulid,
    pub method: DeliveryMethod,
    pub date: NaiveDate,
    pub window: Window,
    pub status: SlotStatus,
    pub revision: u64,
}

impl TimeSlot {
    pub fn available(id: Ulid, method: DeliveryMethod, date: NaiveDate, window: Window) -> Self {
        Self {
            id,
            method,
            date,
            window,
            status: SlotStatus::Available,
            revision: 0,
        }
    }
}

/// A committed claim on exactly one slot. Created only as the terminal step
/// of a successful reservation; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub slot_id: Ulid,
    pub customer_id: String,
    pub created_at: NaiveDateTime,
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    SlotCreated {
        id: Ulid,
        method: DeliveryMethod,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },
    SlotReserved {
        id: Ulid,
    },
    ReservationCreated {
        id: Ulid,
        slot_id: Ulid,
        customer_id: String,
        created_at: NaiveDateTime,
    },
}

/// What the transport layer hands over to claim a slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub method: DeliveryMethod,
    pub date: NaiveDate,
    pub slot_id: Ulid,
    pub customer_id: String,
}

// ── View types handed back to the transport layer ────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: Ulid,
    pub method: DeliveryMethod,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: SlotStatus,
}

impl SlotView {
    pub fn from_slot(slot: &TimeSlot) -> Self {
        Self {
            id: slot.id,
            method: slot.method,
            date: slot.date,
            start_time: slot.window.start,
            end_time: slot.window.end,
            status: slot.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub id: Ulid,
    pub slot_id: Ulid,
    pub method: DeliveryMethod,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub customer_id: String,
    pub created_at: NaiveDateTime,
}

impl ReservationView {
    pub fn assemble(reservation: &Reservation, slot: &TimeSlot) -> Self {
        Self {
            id: reservation.id,
            slot_id: slot.id,
            method: slot.method,
            date: slot.date,
            start_time: slot.window.start,
            end_time: slot.window.end,
            customer_id: reservation.customer_id.clone(),
            created_at: reservation.created_at,
        }
    }
}

use tracing::debug;
use ulid::Ulid;

use crate::config::LockStrategy;
use crate::model::*;
use crate::observability;

use super::catalog::validate_method_date;
use super::{Engine, EngineError, SharedSlot};

/// Guard against a slot id for one method being replayed with another
/// method/date's context.
fn check_slot_matches(slot: &TimeSlot, request: &ReservationRequest) -> Result<(), EngineError> {
    if slot.method != request.method || slot.date != request.date {
        return Err(EngineError::InvalidRequest(
            "Slot does not match specified method and date".into(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Claim one slot for a customer. Of N concurrent attempts on the same
    /// slot exactly one commits; the rest observe `SlotAlreadyReserved`.
    pub async fn create_reservation(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservationView, EngineError> {
        validate_method_date(request.method, request.date, self.clock.today())?;
        if request.customer_id.is_empty() {
            return Err(EngineError::InvalidRequest(
                "Customer id must not be empty".into(),
            ));
        }

        let slot = self.store.get_slot(&request.slot_id).ok_or_else(|| {
            EngineError::InvalidRequest(format!("Time slot not found: {}", request.slot_id))
        })?;

        let result = match self.strategy {
            LockStrategy::Pessimistic => self.reserve_pessimistic(&slot, request).await,
            LockStrategy::Optimistic => self.reserve_optimistic(&slot, request).await,
        };

        match &result {
            Ok(view) => {
                metrics::counter!(observability::RESERVATIONS_CREATED_TOTAL).increment(1);
                debug!("reserved slot {} for customer {}", view.slot_id, view.customer_id);
            }
            Err(EngineError::SlotAlreadyReserved(id)) => {
                metrics::counter!(observability::RESERVATION_CONFLICTS_TOTAL).increment(1);
                debug!("lost reservation race for slot {id}");
            }
            Err(_) => {}
        }
        result
    }

    /// Strategy (a): hold the slot's exclusive lock for the whole unit of
    /// work, serializing all contenders on this slot.
    async fn reserve_pessimistic(
        &self,
        slot: &SharedSlot,
        request: &ReservationRequest,
    ) -> Result<ReservationView, EngineError> {
        let mut guard = slot.write().await;
        check_slot_matches(&guard, request)?;
        if guard.status == SlotStatus::Reserved {
            return Err(EngineError::SlotAlreadyReserved(guard.id));
        }
        self.commit_reservation(&mut guard, request).await
    }

    /// Strategy (b): validate against a revision-stamped snapshot, commit
    /// only if the revision is unchanged. A mismatch is loss of the race.
    async fn reserve_optimistic(
        &self,
        slot: &SharedSlot,
        request: &ReservationRequest,
    ) -> Result<ReservationView, EngineError> {
        let snapshot = slot.read().await.clone();
        check_slot_matches(&snapshot, request)?;
        if snapshot.status == SlotStatus::Reserved {
            return Err(EngineError::SlotAlreadyReserved(snapshot.id));
        }

        let mut guard = slot.write().await;
        if guard.revision != snapshot.revision {
            // Someone committed between our read and this write.
            return Err(EngineError::SlotAlreadyReserved(guard.id));
        }
        self.commit_reservation(&mut guard, request).await
    }

    /// The single commit point: flip the slot, then record the reservation.
    /// Both WAL appends happen while the slot guard is held so replay order
    /// matches commit order.
    async fn commit_reservation(
        &self,
        slot: &mut TimeSlot,
        request: &ReservationRequest,
    ) -> Result<ReservationView, EngineError> {
        self.wal_append(&Event::SlotReserved { id: slot.id }).await?;
        slot.status = SlotStatus::Reserved;
        slot.revision += 1;

        let reservation = Reservation {
            id: Ulid::new(),
            slot_id: slot.id,
            customer_id: request.customer_id.clone(),
            created_at: self.clock.now(),
        };
        self.wal_append(&Event::ReservationCreated {
            id: reservation.id,
            slot_id: reservation.slot_id,
            customer_id: reservation.customer_id.clone(),
            created_at: reservation.created_at,
        })
        .await?;
        self.store.insert_reservation(reservation.clone());

        Ok(ReservationView::assemble(&reservation, slot))
    }

    /// Reservation lookup by id.
    pub async fn get_reservation(&self, id: Ulid) -> Result<ReservationView, EngineError> {
        let reservation = self
            .store
            .get_reservation(&id)
            .ok_or_else(|| EngineError::InvalidRequest(format!("Reservation not found: {id}")))?;
        let slot = self.store.get_slot(&reservation.slot_id).ok_or_else(|| {
            EngineError::InvalidRequest(format!("Time slot not found: {}", reservation.slot_id))
        })?;
        let guard = slot.read().await;
        Ok(ReservationView::assemble(&reservation, &guard))
    }
}

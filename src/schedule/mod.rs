mod conflict;
mod error;
mod store;
mod window;
#[cfg(test)]
mod tests;

pub use conflict::{booking_at, bookings_on, first_conflict, free_spans, is_time_booked, overlaps};
pub use error::ScheduleError;
pub use store::{BookingStore, DEFAULT_SLOT_KEY};
pub use window::{check_end, check_span, check_start, WindowViolation};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info};

use crate::limits::*;
use crate::model::*;
use crate::slot::Storage;

/// Format of `Booking::created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts, lists and cancels bookings on top of a [`BookingStore`].
///
/// A candidate is written only after it passes the time-window checks and
/// the overlap scan against a freshly loaded list. Nothing is written for a
/// rejected candidate.
pub struct Scheduler<'a, S: Storage + ?Sized> {
    store: BookingStore<'a, S>,
    rooms: RoomCatalog,
}

impl<'a, S: Storage + ?Sized> Scheduler<'a, S> {
    pub fn new(store: BookingStore<'a, S>, rooms: RoomCatalog) -> Self {
        Self { store, rooms }
    }

    pub fn store(&self) -> &BookingStore<'a, S> {
        &self.store
    }

    pub fn rooms(&self) -> &RoomCatalog {
        &self.rooms
    }

    pub fn resolve_room(&self, name: &str) -> Result<Room, ScheduleError> {
        self.rooms
            .get(name)
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownRoom(name.to_string()))
    }

    /// Start time inside the window and not inside an existing booking.
    pub fn check_start(
        &self,
        room: &Room,
        date: NaiveDate,
        start: TimeOfDay,
    ) -> Result<(), ScheduleError> {
        check_start(start)?;
        let bookings = self.store.load()?;
        if let Some(hit) = booking_at(&bookings, room, date, start) {
            debug!("start {start} on {room} {date} falls inside {}", hit.id);
            return Err(ScheduleError::StartTaken(hit.id.clone()));
        }
        Ok(())
    }

    /// End time valid for `start`, and `[start, end)` free of other bookings.
    pub fn check_range(
        &self,
        room: &Room,
        date: NaiveDate,
        start: Option<TimeOfDay>,
        end: TimeOfDay,
    ) -> Result<Span, ScheduleError> {
        check_end(start, end)?;
        let Some(start) = start else {
            return Err(WindowViolation::MissingStart.into());
        };
        let span = Span::new(start, end);
        let bookings = self.store.load()?;
        if let Some(hit) = first_conflict(&bookings, room, date, &span) {
            debug!("range {span} on {room} {date} overlaps {}", hit.id);
            return Err(ScheduleError::Conflict(hit.id.clone()));
        }
        Ok(span)
    }

    pub fn book(&self, request: BookingRequest) -> Result<Booking, ScheduleError> {
        self.book_at(request, Local::now())
    }

    /// Same as [`Scheduler::book`] with an explicit creation time.
    pub fn book_at(
        &self,
        request: BookingRequest,
        now: DateTime<Local>,
    ) -> Result<Booking, ScheduleError> {
        match self.try_book(request, now) {
            Ok(booking) => {
                info!(
                    "booked {} {} {}-{} as {}",
                    booking.room, booking.date, booking.start_time, booking.end_time, booking.id
                );
                metrics::counter!(crate::observability::BOOKINGS_ACCEPTED_TOTAL).increment(1);
                Ok(booking)
            }
            Err(e) => {
                debug!("booking rejected: {e}");
                metrics::counter!(
                    crate::observability::BOOKINGS_REJECTED_TOTAL,
                    "reason" => e.reason()
                )
                .increment(1);
                Err(e)
            }
        }
    }

    fn try_book(
        &self,
        request: BookingRequest,
        now: DateTime<Local>,
    ) -> Result<Booking, ScheduleError> {
        if !self.rooms.contains(&request.room) {
            return Err(ScheduleError::UnknownRoom(request.room.to_string()));
        }
        for text in [&request.topic, &request.chairman, &request.name, &request.phone] {
            if text.len() > MAX_TEXT_FIELD_LEN {
                return Err(ScheduleError::LimitExceeded("text field too long"));
            }
        }
        let span = check_span(request.start_time, request.end_time)?;

        let mut bookings = self.store.load()?;
        if bookings.len() >= MAX_BOOKINGS_PER_SLOT {
            return Err(ScheduleError::LimitExceeded("too many bookings"));
        }
        if let Some(hit) = booking_at(&bookings, &request.room, request.date, span.start) {
            return Err(ScheduleError::StartTaken(hit.id.clone()));
        }
        if let Some(hit) = first_conflict(&bookings, &request.room, request.date, &span) {
            return Err(ScheduleError::Conflict(hit.id.clone()));
        }

        let booking = Booking {
            id: BookingId::new(),
            room: request.room,
            date: request.date,
            start_time: span.start,
            end_time: span.end,
            topic: request.topic,
            chairman: request.chairman,
            name: request.name,
            phone: request.phone,
            created_at: now.format(CREATED_AT_FORMAT).to_string(),
        };
        bookings.push(booking.clone());
        self.store.save(&bookings)?;
        Ok(booking)
    }

    /// Delete one booking. `false` if no booking had that id.
    pub fn cancel(&self, id: &BookingId) -> Result<bool, ScheduleError> {
        let removed = self.store.remove(id)?;
        if removed {
            info!("cancelled booking {id}");
            metrics::counter!(crate::observability::BOOKINGS_DELETED_TOTAL).increment(1);
        } else {
            debug!("cancel: no booking {id}");
        }
        Ok(removed)
    }

    /// All bookings, by date then start time.
    pub fn bookings(&self) -> Result<Vec<Booking>, ScheduleError> {
        Ok(self.store.list_sorted()?)
    }

    pub fn free_spans(&self, room: &Room, date: NaiveDate) -> Result<Vec<Span>, ScheduleError> {
        let bookings = self.store.load()?;
        Ok(free_spans(&bookings, room, date))
    }
}

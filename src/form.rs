//! Form adapter: raw field text in, per-field error text out.
//!
//! This is the layer a UI talks to. It owns no state besides its borrowed
//! [`Scheduler`]; every check reloads the slot, the same way the booking
//! form re-reads storage on each blur/change.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use crate::limits::MAX_TEXT_FIELD_LEN;
use crate::model::{Booking, BookingRequest, Room, TimeOfDay};
use crate::schedule::{ScheduleError, Scheduler, WindowViolation};
use crate::slot::Storage;

pub const MSG_REQUIRED: &str = "this field is required";
pub const MSG_UNKNOWN_ROOM: &str = "unknown room";
pub const MSG_INVALID_DATE: &str = "invalid date";
pub const MSG_DATE_IN_PAST: &str = "date must not be in the past";
pub const MSG_INVALID_TIME: &str = "invalid time";
pub const MSG_START_TAKEN: &str = "this time is already booked";
pub const MSG_RANGE_TAKEN: &str = "this time range overlaps an existing booking";
pub const MSG_TOO_LONG: &str = "this field is too long";
pub const MSG_CHECK_INPUT: &str = "please check the entered data";
pub const MSG_SAVED: &str = "booking saved";
pub const MSG_DELETED: &str = "booking deleted";
pub const MSG_NO_BOOKINGS: &str = "no bookings yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Room,
    Date,
    StartTime,
    EndTime,
    Topic,
    Chairman,
    Name,
    Phone,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Room,
        Field::Date,
        Field::StartTime,
        Field::EndTime,
        Field::Topic,
        Field::Chairman,
        Field::Name,
        Field::Phone,
    ];

    /// Same names as the persisted record.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Room => "room",
            Field::Date => "date",
            Field::StartTime => "startTime",
            Field::EndTime => "endTime",
            Field::Topic => "topic",
            Field::Chairman => "chairman",
            Field::Name => "name",
            Field::Phone => "phone",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one message per field. Empty means the form may be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Raw text of every input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub room: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub topic: String,
    pub chairman: String,
    pub name: String,
    pub phone: String,
}

impl BookingForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Room => &self.room,
            Field::Date => &self.date,
            Field::StartTime => &self.start_time,
            Field::EndTime => &self.end_time,
            Field::Topic => &self.topic,
            Field::Chairman => &self.chairman,
            Field::Name => &self.name,
            Field::Phone => &self.phone,
        }
    }

    /// Time inputs only unlock once a room and a date are chosen.
    pub fn time_inputs_enabled(&self) -> bool {
        !self.room.trim().is_empty() && !self.date.trim().is_empty()
    }

    /// Changing room or date invalidates any chosen times.
    pub fn clear_times(&mut self) {
        self.start_time.clear();
        self.end_time.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(Booking),
    Blocked(FieldErrors),
}

/// Visible state of the submit button while a submission runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Saving,
    Idle,
}

pub struct FormController<'s, 'a, S: Storage + ?Sized> {
    scheduler: &'s Scheduler<'a, S>,
    today: NaiveDate,
    submit_delay: Duration,
}

impl<'s, 'a, S: Storage + ?Sized> FormController<'s, 'a, S> {
    pub fn new(scheduler: &'s Scheduler<'a, S>, today: NaiveDate, submit_delay: Duration) -> Self {
        Self {
            scheduler,
            today,
            submit_delay,
        }
    }

    fn parse_room(&self, form: &BookingForm) -> Result<Room, &'static str> {
        let name = form.room.trim();
        if name.is_empty() {
            return Err(MSG_REQUIRED);
        }
        self.scheduler.resolve_room(name).map_err(|_| MSG_UNKNOWN_ROOM)
    }

    fn parse_date(&self, form: &BookingForm) -> Result<NaiveDate, &'static str> {
        let text = form.date.trim();
        if text.is_empty() {
            return Err(MSG_REQUIRED);
        }
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| MSG_INVALID_DATE)?;
        if date < self.today {
            return Err(MSG_DATE_IN_PAST);
        }
        Ok(date)
    }

    fn room_and_date(&self, form: &BookingForm) -> Option<(Room, NaiveDate)> {
        Some((self.parse_room(form).ok()?, self.parse_date(form).ok()?))
    }

    /// Error text for the start input, `None` when it is empty or acceptable.
    /// Not checked at all until room and date are valid.
    pub fn validate_start(&self, form: &BookingForm) -> Result<Option<String>, ScheduleError> {
        let text = form.start_time.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let Some((room, date)) = self.room_and_date(form) else {
            return Ok(None);
        };
        let Ok(start) = text.parse::<TimeOfDay>() else {
            return Ok(Some(MSG_INVALID_TIME.to_string()));
        };
        match self.scheduler.check_start(&room, date, start) {
            Ok(()) => Ok(None),
            Err(e) => message_for(e),
        }
    }

    /// Error text for the end input, `None` when it is empty or acceptable.
    /// Not checked until room and date are valid. An unreadable start leaves
    /// the end alone; the start field reports it.
    pub fn validate_end(&self, form: &BookingForm) -> Result<Option<String>, ScheduleError> {
        let text = form.end_time.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let Some((room, date)) = self.room_and_date(form) else {
            return Ok(None);
        };
        let start_text = form.start_time.trim();
        if start_text.is_empty() {
            return Ok(Some(WindowViolation::MissingStart.to_string()));
        }
        let Ok(start) = start_text.parse::<TimeOfDay>() else {
            return Ok(None);
        };
        let Ok(end) = text.parse::<TimeOfDay>() else {
            return Ok(Some(MSG_INVALID_TIME.to_string()));
        };
        match self.scheduler.check_range(&room, date, Some(start), end) {
            Ok(_) => Ok(None),
            Err(e) => message_for(e),
        }
    }

    /// Every field at once, as done right before submitting.
    pub fn validate(&self, form: &BookingForm) -> Result<FieldErrors, ScheduleError> {
        let mut errors = FieldErrors::new();
        for field in Field::ALL {
            let value = form.value(field).trim();
            if value.is_empty() {
                errors.insert(field, MSG_REQUIRED);
            } else if value.len() > MAX_TEXT_FIELD_LEN {
                errors.insert(field, MSG_TOO_LONG);
            }
        }
        if let Err(msg) = self.parse_room(form) {
            errors.insert(Field::Room, msg);
        }
        if let Err(msg) = self.parse_date(form) {
            errors.insert(Field::Date, msg);
        }
        if let Some(msg) = self.validate_start(form)? {
            errors.insert(Field::StartTime, msg);
        }
        if let Some(msg) = self.validate_end(form)? {
            errors.insert(Field::EndTime, msg);
        }
        Ok(errors)
    }

    fn request(&self, form: &BookingForm) -> Option<BookingRequest> {
        let (room, date) = self.room_and_date(form)?;
        Some(BookingRequest {
            room,
            date,
            start_time: form.start_time.trim().parse().ok()?,
            end_time: form.end_time.trim().parse().ok()?,
            topic: form.topic.trim().to_string(),
            chairman: form.chairman.trim().to_string(),
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
        })
    }

    pub async fn submit(&self, form: &BookingForm) -> Result<SubmitOutcome, ScheduleError> {
        self.submit_with(form, |_| {}).await
    }

    /// Validate, show the saving state for the configured delay, then write.
    ///
    /// `on_phase` sees `Saving` before the delay and `Idle` once the outcome is
    /// known. It is not called for a form blocked up front.
    pub async fn submit_with(
        &self,
        form: &BookingForm,
        mut on_phase: impl FnMut(SubmitPhase),
    ) -> Result<SubmitOutcome, ScheduleError> {
        let errors = self.validate(form)?;
        if !errors.is_empty() {
            return Ok(blocked(errors));
        }
        let Some(request) = self.request(form) else {
            let mut errors = FieldErrors::new();
            errors.insert(Field::Date, MSG_INVALID_DATE);
            return Ok(blocked(errors));
        };

        on_phase(SubmitPhase::Saving);
        tokio::time::sleep(self.submit_delay).await;

        // Re-checked by the scheduler against a fresh load: the slot may have
        // changed while the delay ran.
        let outcome = match self.scheduler.book(request) {
            Ok(booking) => Ok(SubmitOutcome::Saved(booking)),
            Err(e) => match field_for(&e) {
                Some(field) => {
                    let mut errors = FieldErrors::new();
                    errors.insert(field, field_message(&e));
                    Ok(blocked(errors))
                }
                None => Err(e),
            },
        };
        on_phase(SubmitPhase::Idle);
        outcome
    }
}

fn blocked(errors: FieldErrors) -> SubmitOutcome {
    for (field, msg) in errors.iter() {
        debug!("field {field}: {msg}");
        metrics::counter!(crate::observability::FORM_FIELD_ERRORS_TOTAL, "field" => field.as_str())
            .increment(1);
    }
    SubmitOutcome::Blocked(errors)
}

/// Which input a scheduler rejection belongs to. `None` for failures that are
/// not about the user's input.
pub fn field_for(e: &ScheduleError) -> Option<Field> {
    match e {
        ScheduleError::UnknownRoom(_) => Some(Field::Room),
        ScheduleError::Window(WindowViolation::StartOutsideWindow) => Some(Field::StartTime),
        ScheduleError::Window(_) => Some(Field::EndTime),
        ScheduleError::StartTaken(_) => Some(Field::StartTime),
        ScheduleError::Conflict(_) => Some(Field::EndTime),
        ScheduleError::LimitExceeded(_) | ScheduleError::Slot(_) => None,
    }
}

fn field_message(e: &ScheduleError) -> String {
    match e {
        ScheduleError::UnknownRoom(_) => MSG_UNKNOWN_ROOM.to_string(),
        ScheduleError::StartTaken(_) => MSG_START_TAKEN.to_string(),
        ScheduleError::Conflict(_) => MSG_RANGE_TAKEN.to_string(),
        ScheduleError::Window(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn message_for(e: ScheduleError) -> Result<Option<String>, ScheduleError> {
    if field_for(&e).is_some() {
        Ok(Some(field_message(&e)))
    } else {
        Err(e)
    }
}

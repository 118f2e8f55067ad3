use crate::model::BookingId;
use crate::slot::SlotError;

use super::window::WindowViolation;

#[derive(Debug)]
pub enum ScheduleError {
    UnknownRoom(String),
    Window(WindowViolation),
    /// The chosen start time falls inside this booking.
    StartTaken(BookingId),
    /// The requested range overlaps this booking.
    Conflict(BookingId),
    LimitExceeded(&'static str),
    Slot(SlotError),
}

impl ScheduleError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ScheduleError::UnknownRoom(_) => "unknown_room",
            ScheduleError::Window(_) => "window",
            ScheduleError::StartTaken(_) => "start_taken",
            ScheduleError::Conflict(_) => "conflict",
            ScheduleError::LimitExceeded(_) => "limit",
            ScheduleError::Slot(_) => "slot",
        }
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::UnknownRoom(room) => write!(f, "unknown room: {room}"),
            ScheduleError::Window(v) => write!(f, "{v}"),
            ScheduleError::StartTaken(id) => write!(f, "start time already booked by {id}"),
            ScheduleError::Conflict(id) => write!(f, "conflict with booking: {id}"),
            ScheduleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ScheduleError::Slot(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleError::Window(v) => Some(v),
            ScheduleError::Slot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WindowViolation> for ScheduleError {
    fn from(v: WindowViolation) -> Self {
        ScheduleError::Window(v)
    }
}

impl From<SlotError> for ScheduleError {
    fn from(e: SlotError) -> Self {
        ScheduleError::Slot(e)
    }
}

use crate::limits::{CLOSING_TIME, OPENING_TIME};
use crate::model::{Span, TimeOfDay};

/// Why a time or time range falls outside the bookable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    /// Start before opening, or at/after closing.
    StartOutsideWindow,
    /// End requested before any start was chosen.
    MissingStart,
    EndNotAfterStart,
    /// End before opening or after closing.
    EndOutsideWindow,
}

impl std::fmt::Display for WindowViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowViolation::StartOutsideWindow => write!(
                f,
                "please choose a time between {OPENING_TIME} and {CLOSING_TIME}"
            ),
            WindowViolation::MissingStart => write!(f, "please choose a start time first"),
            WindowViolation::EndNotAfterStart => write!(f, "end time must be after start time"),
            WindowViolation::EndOutsideWindow => {
                write!(f, "please choose a time no later than {CLOSING_TIME}")
            }
        }
    }
}

impl std::error::Error for WindowViolation {}

pub fn check_start(start: TimeOfDay) -> Result<(), WindowViolation> {
    if start < OPENING_TIME || start >= CLOSING_TIME {
        return Err(WindowViolation::StartOutsideWindow);
    }
    Ok(())
}

/// Ordering is checked before the window, so `17:00 → 16:00` reports
/// `EndNotAfterStart` rather than anything about the window.
pub fn check_end(start: Option<TimeOfDay>, end: TimeOfDay) -> Result<(), WindowViolation> {
    let start = start.ok_or(WindowViolation::MissingStart)?;
    if end <= start {
        return Err(WindowViolation::EndNotAfterStart);
    }
    if end < OPENING_TIME || end > CLOSING_TIME {
        return Err(WindowViolation::EndOutsideWindow);
    }
    Ok(())
}

/// Validate both ends and build the span.
pub fn check_span(start: TimeOfDay, end: TimeOfDay) -> Result<Span, WindowViolation> {
    check_start(start)?;
    check_end(Some(start), end)?;
    Ok(Span::new(start, end))
}

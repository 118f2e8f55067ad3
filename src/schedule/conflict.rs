use chrono::NaiveDate;

use crate::limits::{CLOSING_TIME, OPENING_TIME};
use crate::model::*;

// ── Overlap checks ────────────────────────────────────────────────
//
// Plain linear scans over the loaded list. One room-calendar holds few
// enough bookings that an index would not pay for itself.

/// Bookings for one room on one date, in stored order.
pub fn bookings_on<'a>(
    bookings: &'a [Booking],
    room: &'a Room,
    date: NaiveDate,
) -> impl Iterator<Item = &'a Booking> {
    bookings.iter().filter(move |b| b.is_on(room, date))
}

/// The booking whose `[start, end)` contains `t`, if any.
pub fn booking_at<'a>(
    bookings: &'a [Booking],
    room: &Room,
    date: NaiveDate,
    t: TimeOfDay,
) -> Option<&'a Booking> {
    bookings
        .iter()
        .find(|b| b.is_on(room, date) && b.span().contains_instant(t))
}

/// Point check: is `t` already covered by a booking?
pub fn is_time_booked(bookings: &[Booking], room: &Room, date: NaiveDate, t: TimeOfDay) -> bool {
    booking_at(bookings, room, date, t).is_some()
}

/// First booking whose interval intersects `span` (half-open on both sides).
pub fn first_conflict<'a>(
    bookings: &'a [Booking],
    room: &Room,
    date: NaiveDate,
    span: &Span,
) -> Option<&'a Booking> {
    bookings
        .iter()
        .find(|b| b.is_on(room, date) && span.start < b.end_time && span.end > b.start_time)
}

pub fn overlaps(bookings: &[Booking], room: &Room, date: NaiveDate, span: &Span) -> bool {
    first_conflict(bookings, room, date, span).is_some()
}

// ── Free time ─────────────────────────────────────────────────────

/// Gaps inside the bookable window for one room and date.
///
/// One sweep over the room-day sorted by start: `cursor` is the earliest
/// minute not yet known to be taken. Stored ranges reaching outside the
/// window are clipped to it.
pub fn free_spans(bookings: &[Booking], room: &Room, date: NaiveDate) -> Vec<Span> {
    let mut taken: Vec<Span> = bookings_on(bookings, room, date)
        .map(Booking::span)
        .filter(|s| s.start < s.end)
        .collect();
    taken.sort_by_key(|s| s.start);

    let mut free = Vec::new();
    let mut cursor = OPENING_TIME;
    for span in taken {
        if cursor >= CLOSING_TIME {
            break;
        }
        if span.start > cursor {
            free.push(Span::new(cursor, span.start.min(CLOSING_TIME)));
        }
        cursor = cursor.max(span.end);
    }
    if cursor < CLOSING_TIME {
        free.push(Span::new(cursor, CLOSING_TIME));
    }
    free
}

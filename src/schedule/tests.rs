use chrono::NaiveDate;

use super::*;
use crate::slot::MemoryStorage;

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn rooms() -> RoomCatalog {
    RoomCatalog::new(["A", "B"])
}

fn request(room: &str, date: NaiveDate, start: &str, end: &str) -> BookingRequest {
    BookingRequest {
        room: Room::new(room),
        date,
        start_time: t(start),
        end_time: t(end),
        topic: "Quarterly review".into(),
        chairman: "Director".into(),
        name: "Requester".into(),
        phone: "0812345678".into(),
    }
}

/// Every pair of bookings sharing (room, date) is disjoint.
fn assert_no_overlaps(bookings: &[Booking]) {
    for (i, a) in bookings.iter().enumerate() {
        for b in &bookings[i + 1..] {
            if a.room == b.room && a.date == b.date {
                assert!(
                    !a.span().overlaps(&b.span()),
                    "{} {} overlaps {} {}",
                    a.id,
                    a.span(),
                    b.id,
                    b.span()
                );
            }
        }
    }
}

#[test]
fn book_stores_record() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let booking = scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    assert_eq!(booking.room, Room::new("A"));
    assert_eq!(booking.start_time, t("09:00"));
    assert_eq!(booking.end_time, t("10:00"));
    assert!(!booking.created_at.is_empty());

    let stored = scheduler.store().load().unwrap();
    assert_eq!(stored, vec![booking]);
}

#[test]
fn book_adjacent_is_accepted() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    scheduler.book(request("A", day(10), "08:30", "09:00")).unwrap();
    scheduler.book(request("A", day(10), "10:00", "11:00")).unwrap();
    assert_eq!(scheduler.store().load().unwrap().len(), 3);
}

#[test]
fn book_overlap_rejected_and_not_written() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let existing = scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    let before = storage.get_item(DEFAULT_SLOT_KEY).unwrap();

    let result = scheduler.book(request("A", day(10), "08:30", "09:30"));
    assert!(matches!(&result, Err(ScheduleError::Conflict(id)) if *id == existing.id));

    let result = scheduler.book(request("A", day(10), "09:30", "10:30"));
    assert!(matches!(&result, Err(ScheduleError::StartTaken(id)) if *id == existing.id));

    assert_eq!(storage.get_item(DEFAULT_SLOT_KEY).unwrap(), before);
}

#[test]
fn same_time_other_room_or_date_is_fine() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    scheduler.book(request("B", day(10), "09:00", "10:00")).unwrap();
    scheduler.book(request("A", day(11), "09:00", "10:00")).unwrap();
    assert_eq!(scheduler.store().load().unwrap().len(), 3);
}

#[test]
fn book_window_violations() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let cases = [
        ("07:59", "09:00", WindowViolation::StartOutsideWindow),
        ("18:00", "18:30", WindowViolation::StartOutsideWindow),
        ("17:00", "18:01", WindowViolation::EndOutsideWindow),
        ("10:00", "10:00", WindowViolation::EndNotAfterStart),
        ("10:00", "09:59", WindowViolation::EndNotAfterStart),
    ];
    for (start, end, expected) in cases {
        let result = scheduler.book(request("A", day(10), start, end));
        assert!(
            matches!(result, Err(ScheduleError::Window(v)) if v == expected),
            "{start}-{end}: {result:?}"
        );
    }
    assert!(scheduler.store().load().unwrap().is_empty());

    scheduler.book(request("A", day(10), "08:00", "18:00")).unwrap();
}

#[test]
fn book_unknown_room_rejected() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let result = scheduler.book(request("Z", day(10), "09:00", "10:00"));
    assert!(matches!(result, Err(ScheduleError::UnknownRoom(r)) if r == "Z"));
}

#[test]
fn book_long_text_rejected() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let mut req = request("A", day(10), "09:00", "10:00");
    req.topic = "x".repeat(MAX_TEXT_FIELD_LEN + 1);
    assert!(matches!(scheduler.book(req), Err(ScheduleError::LimitExceeded(_))));
}

#[test]
fn invariant_holds_after_many_submissions() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    // Sweep candidate ranges of several lengths across the day; only some are accepted.
    let mut accepted = 0;
    for len in [30u16, 45, 60, 90] {
        let mut start = 8 * 60;
        while start + len <= 18 * 60 {
            let s = TimeOfDay::from_hm(start / 60, start % 60);
            let e = TimeOfDay::from_hm((start + len) / 60, (start + len) % 60);
            if scheduler
                .book(request("A", day(10), &s.to_string(), &e.to_string()))
                .is_ok()
            {
                accepted += 1;
            }
            start += 15;
        }
    }
    let stored = scheduler.store().load().unwrap();
    assert_eq!(stored.len(), accepted);
    assert_no_overlaps(&stored);
    // The first sweep packs the day with 30-minute slots; nothing else fits.
    assert_eq!(accepted, 20);
}

#[test]
fn check_start_reports_taken() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());
    let existing = scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    let room = Room::new("A");

    assert!(scheduler.check_start(&room, day(10), t("08:00")).is_ok());
    assert!(scheduler.check_start(&room, day(10), t("10:00")).is_ok());
    assert!(matches!(
        scheduler.check_start(&room, day(10), t("09:15")),
        Err(ScheduleError::StartTaken(id)) if id == existing.id
    ));
    assert!(matches!(
        scheduler.check_start(&room, day(10), t("07:00")),
        Err(ScheduleError::Window(WindowViolation::StartOutsideWindow))
    ));
}

#[test]
fn check_range_reports_conflict() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());
    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    let room = Room::new("A");

    let span = scheduler
        .check_range(&room, day(10), Some(t("08:30")), t("09:00"))
        .unwrap();
    assert_eq!(span, Span::new(t("08:30"), t("09:00")));
    assert!(matches!(
        scheduler.check_range(&room, day(10), Some(t("08:30")), t("09:30")),
        Err(ScheduleError::Conflict(_))
    ));
    assert!(matches!(
        scheduler.check_range(&room, day(10), None, t("09:30")),
        Err(ScheduleError::Window(WindowViolation::MissingStart))
    ));
}

#[test]
fn cancel_removes_exactly_one() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let a = scheduler.book(request("A", day(10), "13:00", "14:00")).unwrap();
    let b = scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    let c = scheduler.book(request("B", day(10), "09:00", "10:00")).unwrap();

    assert!(scheduler.cancel(&b.id).unwrap());
    assert_eq!(scheduler.store().load().unwrap(), vec![a.clone(), c.clone()]);

    assert!(!scheduler.cancel(&b.id).unwrap());
    assert!(!scheduler.cancel(&BookingId::new()).unwrap());
    assert_eq!(scheduler.store().load().unwrap(), vec![a, c]);
}

#[test]
fn cancelled_slot_can_be_rebooked() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    let first = scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    assert!(scheduler.book(request("A", day(10), "09:00", "10:00")).is_err());
    scheduler.cancel(&first.id).unwrap();
    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
}

#[test]
fn bookings_listed_by_date_then_start() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    scheduler.book(request("A", day(11), "08:00", "09:00")).unwrap();
    scheduler.book(request("B", day(10), "15:00", "16:00")).unwrap();
    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();

    let listed: Vec<(NaiveDate, TimeOfDay)> = scheduler
        .bookings()
        .unwrap()
        .iter()
        .map(|b| (b.date, b.start_time))
        .collect();
    assert_eq!(
        listed,
        vec![(day(10), t("09:00")), (day(10), t("15:00")), (day(11), t("08:00"))]
    );
}

#[test]
fn free_spans_reflect_bookings() {
    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());
    scheduler.book(request("A", day(10), "10:00", "12:00")).unwrap();

    let free = scheduler.free_spans(&Room::new("A"), day(10)).unwrap();
    assert_eq!(
        free,
        vec![Span::new(t("08:00"), t("10:00")), Span::new(t("12:00"), t("18:00"))]
    );
}

#[test]
fn created_at_uses_given_clock() {
    use chrono::TimeZone;

    let storage = MemoryStorage::new();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());
    let now = Local.with_ymd_and_hms(2025, 1, 9, 16, 45, 5).single().unwrap();
    let booking = scheduler
        .book_at(request("A", day(10), "09:00", "10:00"), now)
        .unwrap();
    assert_eq!(booking.created_at, "2025-01-09 16:45:05");
}

#[test]
fn malformed_slot_is_overwritten_by_next_booking() {
    let storage = MemoryStorage::new();
    storage.set_item(DEFAULT_SLOT_KEY, "{{{ not json").unwrap();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());

    assert!(scheduler.bookings().unwrap().is_empty());
    scheduler.book(request("A", day(10), "09:00", "10:00")).unwrap();
    assert_eq!(scheduler.bookings().unwrap().len(), 1);
}

#[test]
fn legacy_slot_is_honoured_and_kept() {
    let storage = MemoryStorage::new();
    storage
        .set_item(
            DEFAULT_SLOT_KEY,
            r#"[{"id":"1736500000000","room":"A","date":"2025-01-10","startTime":"09:00",
                 "endTime":"10:00","topic":"Budget","chairman":"Chair","name":"Malee",
                 "phone":"0812345678","createdAt":"10/1/2568 08:15:00"},
                {"id":"1736586400000","room":"A","date":"2025-01-11","startTime":"09:00",
                 "endTime":"10:00","topic":"Review","chairman":"Chair","name":"Somchai",
                 "phone":"0898765432","createdAt":"11/1/2568 09:00:00"}]"#,
        )
        .unwrap();
    let scheduler = Scheduler::new(BookingStore::new(&storage, DEFAULT_SLOT_KEY), rooms());
    assert_eq!(scheduler.bookings().unwrap().len(), 2);

    let result = scheduler.book(request("A", day(10), "09:30", "10:30"));
    assert!(
        matches!(&result, Err(ScheduleError::StartTaken(id)) if id.as_str() == "1736500000000"),
        "{result:?}"
    );
    let result = scheduler.book(request("A", day(10), "08:30", "09:30"));
    assert!(matches!(&result, Err(ScheduleError::Conflict(id)) if id.as_str() == "1736500000000"));

    let added = scheduler.book(request("A", day(10), "10:00", "11:00")).unwrap();
    let ids: Vec<String> = scheduler
        .store()
        .load()
        .unwrap()
        .iter()
        .map(|b| b.id.to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "1736500000000".to_string(),
            "1736586400000".to_string(),
            added.id.to_string(),
        ]
    );
    assert_no_overlaps(&scheduler.store().load().unwrap());
}

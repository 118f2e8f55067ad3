use crate::model::TimeOfDay;

/// First bookable minute of the day.
pub const OPENING_TIME: TimeOfDay = TimeOfDay::from_hm(8, 0);

/// Last permitted end time. Never valid as a start.
pub const CLOSING_TIME: TimeOfDay = TimeOfDay::from_hm(18, 0);

pub const MAX_TEXT_FIELD_LEN: usize = 200;
pub const MAX_ROOM_NAME_LEN: usize = 64;
pub const MAX_ROOMS: usize = 64;
pub const MAX_BOOKINGS_PER_SLOT: usize = 10_000;
pub const MAX_SLOT_KEY_LEN: usize = 128;

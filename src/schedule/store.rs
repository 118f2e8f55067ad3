use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::model::{sort_for_display, Booking, BookingId};
use crate::slot::{SlotError, Storage};

/// Default key of the persisted slot.
pub const DEFAULT_SLOT_KEY: &str = "roomBookings";

/// The whole booking list, kept as one JSON array under one storage key.
///
/// Every read loads the slot fresh and every write replaces it wholesale.
/// Last write wins; there is a single writer.
///
/// Array entries that do not decode as a [`Booking`] are skipped on load and
/// written back unchanged on save, so they only leave the slot by hand.
pub struct BookingStore<'a, S: Storage + ?Sized> {
    storage: &'a S,
    key: String,
}

/// Slot contents split into typed bookings and entries kept as raw JSON.
struct Decoded {
    bookings: Vec<Booking>,
    undecodable: Vec<Value>,
}

impl<'a, S: Storage + ?Sized> BookingStore<'a, S> {
    pub fn new(storage: &'a S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn decode(&self) -> Result<Decoded, SlotError> {
        let mut decoded = Decoded {
            bookings: Vec::new(),
            undecodable: Vec::new(),
        };
        let Some(text) = self.storage.get_item(&self.key)? else {
            return Ok(decoded);
        };
        let entries = match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("slot {:?} is malformed, treating as empty: {e}", self.key);
                metrics::counter!(crate::observability::SLOT_MALFORMED_TOTAL).increment(1);
                return Ok(decoded);
            }
        };
        for entry in entries {
            match Booking::deserialize(&entry) {
                Ok(booking) => decoded.bookings.push(booking),
                Err(e) => {
                    warn!("slot {:?}: skipping record: {e}", self.key);
                    metrics::counter!(crate::observability::SLOT_RECORDS_SKIPPED_TOTAL)
                        .increment(1);
                    decoded.undecodable.push(entry);
                }
            }
        }
        Ok(decoded)
    }

    /// Absent or unparseable slot → empty list. Undecodable records are left out.
    pub fn load(&self) -> Result<Vec<Booking>, SlotError> {
        Ok(self.decode()?.bookings)
    }

    /// Replace the stored bookings with `bookings`. Undecodable records already
    /// in the slot are kept in front.
    pub fn save(&self, bookings: &[Booking]) -> Result<(), SlotError> {
        let mut entries = self.decode()?.undecodable;
        for booking in bookings {
            entries.push(serde_json::to_value(booking).map_err(invalid_data)?);
        }
        let text = serde_json::to_string(&entries).map_err(invalid_data)?;
        self.storage.set_item(&self.key, &text)
    }

    pub fn add(&self, booking: Booking) -> Result<(), SlotError> {
        let mut bookings = self.load()?;
        bookings.push(booking);
        self.save(&bookings)
    }

    /// Returns whether a record with `id` existed. Others keep their order.
    pub fn remove(&self, id: &BookingId) -> Result<bool, SlotError> {
        let mut bookings = self.load()?;
        let before = bookings.len();
        bookings.retain(|b| &b.id != id);
        if bookings.len() == before {
            return Ok(false);
        }
        self.save(&bookings)?;
        Ok(true)
    }

    /// Bookings ordered by date, then start time.
    pub fn list_sorted(&self) -> Result<Vec<Booking>, SlotError> {
        let mut bookings = self.load()?;
        sort_for_display(&mut bookings);
        Ok(bookings)
    }
}

fn invalid_data(e: serde_json::Error) -> SlotError {
    SlotError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

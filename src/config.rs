use std::path::PathBuf;
use std::time::Duration;

use crate::model::RoomCatalog;
use crate::schedule::DEFAULT_SLOT_KEY;

pub const DATA_DIR_VAR: &str = "ROOMBOOK_DATA_DIR";
pub const SLOT_VAR: &str = "ROOMBOOK_SLOT";
pub const ROOMS_VAR: &str = "ROOMBOOK_ROOMS";
pub const SUBMIT_DELAY_VAR: &str = "ROOMBOOK_SUBMIT_DELAY_MS";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_SUBMIT_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the file-backed slots.
    pub data_dir: PathBuf,
    /// Storage key of the booking list.
    pub slot: String,
    pub rooms: RoomCatalog,
    /// How long the "saving" state lasts before the write.
    pub submit_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            slot: DEFAULT_SLOT_KEY.to_string(),
            rooms: RoomCatalog::default(),
            submit_delay: Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset, blank or unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let data_dir = get(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let slot = get(SLOT_VAR).unwrap_or(defaults.slot);
        let rooms = get(ROOMS_VAR)
            .map(|csv| RoomCatalog::from_csv(&csv))
            .filter(|catalog| !catalog.is_empty())
            .unwrap_or(defaults.rooms);
        let submit_delay = get(SUBMIT_DELAY_VAR)
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.submit_delay);

        Self {
            data_dir,
            slot,
            rooms,
            submit_delay,
        }
    }
}

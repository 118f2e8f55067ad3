use tracing_subscriber::EnvFilter;

// ── Booking outcomes ────────────────────────────────────────────

/// Counter: bookings written to the slot.
pub const BOOKINGS_ACCEPTED_TOTAL: &str = "roombook_bookings_accepted_total";

/// Counter: candidates refused. Labels: reason.
pub const BOOKINGS_REJECTED_TOTAL: &str = "roombook_bookings_rejected_total";

/// Counter: bookings removed by id.
pub const BOOKINGS_DELETED_TOTAL: &str = "roombook_bookings_deleted_total";

// ── Storage ─────────────────────────────────────────────────────

/// Counter: slot loads that found unparseable data.
pub const SLOT_MALFORMED_TOTAL: &str = "roombook_slot_malformed_total";

/// Counter: slot records that did not decode and were skipped.
pub const SLOT_RECORDS_SKIPPED_TOTAL: &str = "roombook_slot_records_skipped_total";

/// Counter: form submissions blocked by field errors. Labels: field.
pub const FORM_FIELD_ERRORS_TOTAL: &str = "roombook_form_field_errors_total";

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise `debug` when verbose, else `info`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

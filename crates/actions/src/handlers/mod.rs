//! One async function per dialogue action, each `(context, tracker) -> outcome`.
//!
//! Handlers never fail outward. Backend problems are logged here and turned
//! into a fixed apology so raw backend text never reaches the user.

pub mod assistant;
pub mod identity;
pub mod license;
pub mod session;
pub mod updates;

use tracing::{error, info, warn};

use dlassist_core::format::{display_date, mask_sensitive};
use dlassist_core::{ApplicationError, LicenseRecord, Tracker};

use crate::backend::BackendError;

pub(crate) const NOT_AVAILABLE: &str = "N/A";

/// Logs a failed backend call. `operation` names what the handler was attempting.
pub(crate) fn report_backend_failure(operation: &'static str, failure: BackendError) {
    let rejection = failure.is_rejection();
    let failure = ApplicationError::from(failure);

    if rejection {
        warn!(
            event_name = "backend.rejected",
            operation,
            error_class = failure.error_class(),
            error = %failure,
            "backend declined request"
        );
    } else {
        error!(
            event_name = "backend.failed",
            operation,
            error_class = failure.error_class(),
            error = %failure,
            "backend request failed"
        );
    }
}

/// Reads a slot the action cannot run without. A gap is logged as a validation event.
pub(crate) fn required_slot<'a>(
    tracker: &'a Tracker,
    slot: &'static str,
    operation: &'static str,
) -> Option<&'a str> {
    match tracker.require_slot(slot) {
        Ok(value) => Some(value),
        Err(missing) => {
            let missing = ApplicationError::from(missing);
            info!(
                event_name = "action.slot_missing",
                operation,
                error_class = missing.error_class(),
                error = %missing,
                "required slot missing"
            );
            None
        }
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty()).unwrap_or(NOT_AVAILABLE)
}

fn date_field(value: &Option<String>) -> String {
    match field(value) {
        NOT_AVAILABLE => NOT_AVAILABLE.to_string(),
        date => display_date(date),
    }
}

/// Multi-line license card with the license number masked.
pub(crate) fn license_card(record: &LicenseRecord) -> String {
    let number = match field(&record.license_number) {
        NOT_AVAILABLE => NOT_AVAILABLE.to_string(),
        number => mask_sensitive(number),
    };
    let name = record.full_name();
    let name = if name.is_empty() { NOT_AVAILABLE } else { name.as_str() };

    format!(
        "👤 Name: {name}\n\
         🔢 License #: {number}\n\
         🚗 Vehicle Type: {}\n\
         🚗 Vehicle Make: {}\n\
         📅 Issue Date: {}\n\
         📅 Expiry Date: {}\n\
         📍 Address: {}",
        field(&record.vehicle_type),
        field(&record.vehicle_make),
        date_field(&record.issue_date),
        date_field(&record.expiration_date),
        field(&record.address),
    )
}

use std::sync::Arc;

use tracing::info;

use dlassist_core::domain::session::{SLOT_AUTHENTICATED, SLOT_FULL_NAME, SLOT_LICENSE_NUMBER};
use dlassist_core::format::{display_license_number, names_match, validate_license_number};
use dlassist_core::{ActionOutcome, Tracker};

use super::{license_card, report_backend_failure, required_slot};
use crate::backend::BackendCall;
use crate::endpoints::GET_LICENSE_DETAILS;
use crate::runtime::ActionContext;

const MISSING_LICENSE_NUMBER: &str = "❌ Please provide a valid license number.";
const INVALID_FORMAT: &str =
    "❌ Invalid license number format. Please provide a valid license number.";
const VALIDATED: &str =
    "✅ License number validated successfully. Please provide your full name for verification.";
const LOOKUP_UNAVAILABLE: &str =
    "❌ I couldn't verify your license number right now. Please try again in a few minutes.";

const MISSING_CREDENTIALS: &str = "❌ Both license number and name are required for authentication.";
const NAME_MISMATCH: &str =
    "❌ Authentication failed. The name doesn't match the license number. Please try again.";
const VERIFICATION_UNAVAILABLE: &str =
    "❌ I couldn't verify your details right now. Please try again in a few minutes.";

fn not_found(license_number: &str) -> String {
    format!(
        "❌ License number {} not found in our system. Please check the number and try again.",
        display_license_number(license_number)
    )
}

pub async fn validate_license(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let Some(license_number) = required_slot(&tracker, SLOT_LICENSE_NUMBER, "validate_license")
    else {
        return ActionOutcome::message(MISSING_LICENSE_NUMBER);
    };

    if validate_license_number(license_number).is_err() {
        return ActionOutcome::message(INVALID_FORMAT);
    }

    let call = BackendCall::get(GET_LICENSE_DETAILS).query("licenseNumber", license_number);
    match context.backend.send(&tracker, call).await {
        Ok(_) => ActionOutcome::message(VALIDATED),
        Err(failure) if failure.is_rejection() => {
            report_backend_failure("validate_license", failure);
            ActionOutcome::message(not_found(license_number))
        }
        Err(failure) => {
            report_backend_failure("validate_license", failure);
            ActionOutcome::message(LOOKUP_UNAVAILABLE)
        }
    }
}

pub async fn authenticate_user(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let (Some(license_number), Some(full_name)) = (
        required_slot(&tracker, SLOT_LICENSE_NUMBER, "authenticate_user"),
        required_slot(&tracker, SLOT_FULL_NAME, "authenticate_user"),
    ) else {
        return ActionOutcome::message(MISSING_CREDENTIALS);
    };

    let record = match context.backend.license_details(&tracker, Some(license_number)).await {
        Ok(record) => record,
        Err(failure) => {
            let rejected = failure.is_rejection();
            report_backend_failure("authenticate_user", failure);
            let message = if rejected { NAME_MISMATCH } else { VERIFICATION_UNAVAILABLE };
            return ActionOutcome::message(message).set_slot(SLOT_AUTHENTICATED, false);
        }
    };

    if !names_match(full_name, &record.full_name()) {
        info!(event_name = "auth.mismatch", "supplied name does not match license record");
        return ActionOutcome::message(NAME_MISMATCH).set_slot(SLOT_AUTHENTICATED, false);
    }

    info!(event_name = "auth.succeeded", "user authenticated");
    ActionOutcome::message(format!(
        "✅ Authentication successful! Here are your license details:\n\n{}",
        license_card(&record)
    ))
    .set_slot(SLOT_AUTHENTICATED, true)
}

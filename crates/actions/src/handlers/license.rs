use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use dlassist_core::{ActionOutcome, ExpiryStatus, Tracker};

use super::{license_card, report_backend_failure};
use crate::backend::BackendCall;
use crate::endpoints::{DUPLICATE_LICENSE, RENEW_LICENSE};
use crate::runtime::ActionContext;

const STATUS_UNKNOWN: &str = "❌ Unable to determine license status. Please contact our support team.";
const NO_LICENSE_ON_SESSION: &str =
    "❌ Unable to retrieve your license information. Please contact support.";
const DETAILS_UNAVAILABLE: &str =
    "❌ Unable to retrieve license information. Please contact our support team.";
const RENEWAL_STARTED: &str = "🔄 Your license renewal has been initiated! You'll receive a confirmation email with payment instructions. The new license will be mailed to your registered address.";
const RENEWAL_FAILED: &str = "❌ Unable to process renewal. Please contact our support team.";
const DUPLICATE_SUBMITTED: &str = "📋 Your duplicate license request has been submitted! You'll receive a confirmation email with tracking information. The duplicate license will be mailed within 3-5 business days.";
const DUPLICATE_FAILED: &str =
    "❌ Unable to process duplicate request. Please contact our support team.";

pub(crate) fn expiry_message(status: &ExpiryStatus) -> String {
    match status {
        ExpiryStatus::Active { expiry_date } => format!(
            "✅ Great news! Your license is currently ACTIVE and valid until {expiry_date}. You're all set to drive!"
        ),
        ExpiryStatus::Expired { expiry_date } => format!(
            "⚠️ Your license has EXPIRED on {expiry_date}. You'll need to renew it before you can drive legally. Would you like me to help you with the renewal process?"
        ),
        ExpiryStatus::Unknown => STATUS_UNKNOWN.to_string(),
    }
}

pub async fn check_license_status(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let status = match context.backend.license_details(&tracker, None).await {
        Ok(record) => {
            let expiration = record.expiration_date.as_deref().unwrap_or_default();
            let status = ExpiryStatus::derive(expiration, Utc::now());
            if status == ExpiryStatus::Unknown {
                warn!(event_name = "license.expiry_unparseable", expiration, "could not read expiration date");
            }
            status
        }
        Err(failure) => {
            report_backend_failure("check_license_status", failure);
            ExpiryStatus::Unknown
        }
    };

    info!(event_name = "license.status_checked", status = status.label(), "license status derived");
    ActionOutcome::message(expiry_message(&status))
}

pub async fn view_license_info(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let Some(license_number) = tracker.user_license_number() else {
        return ActionOutcome::message(NO_LICENSE_ON_SESSION);
    };

    match context.backend.license_details(&tracker, Some(license_number)).await {
        Ok(record) => ActionOutcome::message(format!(
            "📋 Here are your license details:\n\n{}",
            license_card(&record)
        )),
        Err(failure) => {
            report_backend_failure("view_license_info", failure);
            ActionOutcome::message(DETAILS_UNAVAILABLE)
        }
    }
}

pub async fn renew_license(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    match context.backend.send(&tracker, BackendCall::post(RENEW_LICENSE)).await {
        Ok(_) => ActionOutcome::message(RENEWAL_STARTED),
        Err(failure) => {
            report_backend_failure("renew_license", failure);
            ActionOutcome::message(RENEWAL_FAILED)
        }
    }
}

pub async fn request_duplicate(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    match context.backend.send(&tracker, BackendCall::post(DUPLICATE_LICENSE)).await {
        Ok(_) => ActionOutcome::message(DUPLICATE_SUBMITTED),
        Err(failure) => {
            report_backend_failure("request_duplicate", failure);
            ActionOutcome::message(DUPLICATE_FAILED)
        }
    }
}

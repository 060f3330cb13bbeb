use std::sync::Arc;

use serde_json::json;
use tracing::info;

use dlassist_core::domain::session::{
    SLOT_NEW_ADDRESS, SLOT_NEW_CONTACT, SLOT_NEW_STATUS, SLOT_VEHICLE_TYPE,
};
use dlassist_core::format::title_case;
use dlassist_core::{ActionOutcome, LicenseStatus, Tracker};

use super::{report_backend_failure, required_slot};
use crate::backend::BackendCall;
use crate::endpoints::{
    ADD_VEHICLE_TYPE, CHANGE_ADDRESS, REMOVE_VEHICLE_TYPE, UPDATE_CONTACT, UPDATE_LICENSE_STATUS,
};
use crate::runtime::ActionContext;

const VEHICLE_TYPE_MISSING: &str = "❌ Vehicle type not specified. Please try again.";
const ADD_VEHICLE_FAILED: &str = "❌ Unable to add vehicle type. Please contact our support team.";
const REMOVE_VEHICLE_FAILED: &str =
    "❌ Unable to remove vehicle type. Please contact our support team.";

const ADDRESS_MISSING: &str = "❌ New address not specified. Please try again.";
const ADDRESS_UPDATED: &str = "✅ Your address has been updated successfully! You'll receive a confirmation email within 24 hours.";
const ADDRESS_FAILED: &str = "❌ Unable to update address. Please contact our support team.";

const CONTACT_MISSING: &str = "❌ New contact information not specified. Please try again.";
const CONTACT_UPDATED: &str = "✅ Your contact information has been updated successfully! You'll receive a confirmation email within 24 hours.";
const CONTACT_FAILED: &str =
    "❌ Unable to update contact information. Please contact our support team.";

const STATUS_FAILED: &str = "❌ Unable to update license status. Please contact our support team.";

const MARKED_DELIVERED: &str = "✅ I've updated your license status to DELIVERED!\n\n\
This indicates that your license should have been delivered. If you still haven't received it within 2-3 business days, please contact our support team at 1-800-LICENSE for assistance.\n\n\
📧 You'll also receive a confirmation email about this status update.";
const DELIVERY_UPDATE_FAILED: &str = "❌ I couldn't update your status at the moment. Please contact our support team at 1-800-LICENSE for immediate assistance.";
const DELIVERY_LOOKUP_FAILED: &str = "❌ I couldn't retrieve your current license status. Please contact our support team at 1-800-LICENSE for assistance.";

/// Reported when the backend record has no status of its own.
const DEFAULT_CURRENT_STATUS: &str = "PROCESSING";

pub(crate) fn status_menu() -> String {
    let options: Vec<String> = LicenseStatus::ALL
        .iter()
        .map(|status| format!("• {} - {}", status.as_str(), status.description()))
        .collect();

    format!(
        "🔄 What status would you like to update your license to?\n\nAvailable statuses:\n{}\n\nPlease specify which status you want to set.",
        options.join("\n")
    )
}

pub(crate) fn invalid_status(requested: &str) -> String {
    let valid: Vec<&str> = LicenseStatus::ALL.iter().map(LicenseStatus::as_str).collect();
    format!("❌ Invalid status '{requested}'. Please choose from:\n{}", valid.join(", "))
}

#[derive(Clone, Copy)]
enum VehicleChange {
    Add,
    Remove,
}

async fn change_vehicle_type(
    context: Arc<ActionContext>,
    tracker: Tracker,
    change: VehicleChange,
) -> ActionOutcome {
    let (endpoint, operation, verb, failure_message) = match change {
        VehicleChange::Add => (ADD_VEHICLE_TYPE, "add_vehicle_type", "added to", ADD_VEHICLE_FAILED),
        VehicleChange::Remove => {
            (REMOVE_VEHICLE_TYPE, "remove_vehicle_type", "removed from", REMOVE_VEHICLE_FAILED)
        }
    };

    let Some(vehicle_type) = required_slot(&tracker, SLOT_VEHICLE_TYPE, operation) else {
        return ActionOutcome::message(VEHICLE_TYPE_MISSING);
    };

    let call = BackendCall::post(endpoint).json(json!({ "vehicleType": vehicle_type }));
    match context.backend.send(&tracker, call).await {
        Ok(_) => ActionOutcome::message(format!(
            "✅ {} authorization has been {verb} your license! You'll receive a confirmation email within 24 hours.",
            title_case(vehicle_type)
        )),
        Err(failure) => {
            report_backend_failure(operation, failure);
            ActionOutcome::message(failure_message)
        }
    }
}

pub async fn add_vehicle_type(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    change_vehicle_type(context, tracker, VehicleChange::Add).await
}

pub async fn remove_vehicle_type(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    change_vehicle_type(context, tracker, VehicleChange::Remove).await
}

pub async fn change_address(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let Some(address) = required_slot(&tracker, SLOT_NEW_ADDRESS, "change_address") else {
        return ActionOutcome::message(ADDRESS_MISSING);
    };

    let call = BackendCall::post(CHANGE_ADDRESS).query("address", address);
    match context.backend.send(&tracker, call).await {
        Ok(_) => ActionOutcome::message(ADDRESS_UPDATED),
        Err(failure) => {
            report_backend_failure("change_address", failure);
            ActionOutcome::message(ADDRESS_FAILED)
        }
    }
}

pub async fn change_contact(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let Some(contact) = required_slot(&tracker, SLOT_NEW_CONTACT, "change_contact") else {
        return ActionOutcome::message(CONTACT_MISSING);
    };

    let call = BackendCall::post(UPDATE_CONTACT).json(json!({ "newContact": contact }));
    match context.backend.send(&tracker, call).await {
        Ok(_) => ActionOutcome::message(CONTACT_UPDATED),
        Err(failure) => {
            report_backend_failure("change_contact", failure);
            ActionOutcome::message(CONTACT_FAILED)
        }
    }
}

pub async fn update_license_status(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let Some(requested) = tracker.slot_text(SLOT_NEW_STATUS) else {
        return ActionOutcome::message(status_menu());
    };

    let status: LicenseStatus = match requested.parse() {
        Ok(status) => status,
        Err(_) => return ActionOutcome::message(invalid_status(requested)),
    };

    let call = BackendCall::post(UPDATE_LICENSE_STATUS).query("status", status.as_str());
    match context.backend.send(&tracker, call).await {
        Ok(_) => {
            info!(event_name = "license.status_updated", status = status.as_str(), "license status updated");
            ActionOutcome::message(format!(
                "✅ Your license status has been updated to {status} successfully!\n\nYou'll receive a confirmation email within 24 hours."
            ))
        }
        Err(failure) => {
            report_backend_failure("update_license_status", failure);
            ActionOutcome::message(STATUS_FAILED)
        }
    }
}

/// Reads the current status, then marks the license DELIVERED whatever it was.
pub async fn license_not_received(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    let record = match context.backend.license_details(&tracker, None).await {
        Ok(record) => record,
        Err(failure) => {
            report_backend_failure("read_delivery_status", failure);
            return ActionOutcome::message(DELIVERY_LOOKUP_FAILED);
        }
    };

    let current = record
        .license_status
        .as_deref()
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .unwrap_or(DEFAULT_CURRENT_STATUS);
    let outcome = ActionOutcome::message(format!(
        "📋 I can see your current license status is: **{current}**\n\nLet me update your status to DELIVERED since you haven't received your license yet."
    ));

    let call = BackendCall::post(UPDATE_LICENSE_STATUS)
        .query("status", LicenseStatus::Delivered.as_str());
    match context.backend.send(&tracker, call).await {
        Ok(_) => outcome.say(MARKED_DELIVERED),
        Err(failure) => {
            report_backend_failure("mark_delivered", failure);
            outcome.say(DELIVERY_UPDATE_FAILED)
        }
    }
}

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, info_span, Instrument};

use dlassist_core::{ActionOutcome, Tracker};

use crate::handlers;
use crate::runtime::ActionContext;

pub type ActionFuture = Pin<Box<dyn Future<Output = ActionOutcome> + Send>>;
pub type ActionFn = Arc<dyn Fn(Arc<ActionContext>, Tracker) -> ActionFuture + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionName {
    SessionStarted,
    ResetAuthentication,
    ValidateLicense,
    AuthenticateUser,
    CheckLicenseStatus,
    ViewLicenseInfo,
    RenewLicense,
    RequestDuplicate,
    AddVehicleType,
    RemoveVehicleType,
    ChangeAddress,
    ChangeContact,
    UpdateLicenseStatus,
    LicenseNotReceived,
    Fallback,
    AssistantFallback,
    AssistantQuery,
}

impl ActionName {
    pub const ALL: [ActionName; 17] = [
        Self::SessionStarted,
        Self::ResetAuthentication,
        Self::ValidateLicense,
        Self::AuthenticateUser,
        Self::CheckLicenseStatus,
        Self::ViewLicenseInfo,
        Self::RenewLicense,
        Self::RequestDuplicate,
        Self::AddVehicleType,
        Self::RemoveVehicleType,
        Self::ChangeAddress,
        Self::ChangeContact,
        Self::UpdateLicenseStatus,
        Self::LicenseNotReceived,
        Self::Fallback,
        Self::AssistantFallback,
        Self::AssistantQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStarted => "action_session_started",
            Self::ResetAuthentication => "action_reset_authentication",
            Self::ValidateLicense => "action_validate_license",
            Self::AuthenticateUser => "action_authenticate_user",
            Self::CheckLicenseStatus => "action_check_license_status",
            Self::ViewLicenseInfo => "action_view_license_info",
            Self::RenewLicense => "action_renew_license",
            Self::RequestDuplicate => "action_request_duplicate",
            Self::AddVehicleType => "action_add_vehicle_type",
            Self::RemoveVehicleType => "action_remove_vehicle_type",
            Self::ChangeAddress => "action_change_address",
            Self::ChangeContact => "action_change_contact",
            Self::UpdateLicenseStatus => "action_update_license_status",
            Self::LicenseNotReceived => "action_license_not_received",
            Self::Fallback => "action_fallback",
            Self::AssistantFallback => "action_gpt_fallback",
            Self::AssistantQuery => "action_gpt_query",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no action registered under `{0}`")]
pub struct UnknownAction(pub String);

impl std::str::FromStr for ActionName {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == value)
            .ok_or_else(|| UnknownAction(value.to_string()))
    }
}

/// Wraps `handler` in a per-invocation span that records the outcome size and latency.
pub fn traced(name: ActionName, handler: ActionFn) -> ActionFn {
    Arc::new(move |context: Arc<ActionContext>, tracker: Tracker| -> ActionFuture {
        let span = info_span!(
            "action",
            action = name.as_str(),
            sender_id = tracker.sender_id.as_deref().unwrap_or("unknown")
        );
        let invocation = handler(context, tracker);

        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = invocation.await;
                info!(
                    event_name = "action.completed",
                    responses = outcome.responses.len(),
                    slot_events = outcome.events.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "action completed"
                );
                outcome
            }
            .instrument(span),
        )
    })
}

#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionName, ActionFn>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: ActionName, handler: F)
    where
        F: Fn(Arc<ActionContext>, Tracker) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionOutcome> + Send + 'static,
    {
        let erased: ActionFn = Arc::new(move |context: Arc<ActionContext>, tracker: Tracker| -> ActionFuture {
            Box::pin(handler(context, tracker))
        });
        self.handlers.insert(name, traced(name, erased));
    }

    pub fn contains(&self, name: &str) -> bool {
        name.parse::<ActionName>().map(|name| self.handlers.contains_key(&name)).unwrap_or(false)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().map(ActionName::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(
        &self,
        name: &str,
        context: Arc<ActionContext>,
        tracker: Tracker,
    ) -> Result<ActionOutcome, UnknownAction> {
        let handler = name
            .parse::<ActionName>()
            .ok()
            .and_then(|action| self.handlers.get(&action))
            .ok_or_else(|| UnknownAction(name.to_string()))?;

        Ok(handler(context, tracker).await)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Registry with every driving-license action wired in.
pub fn default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    registry.register(ActionName::SessionStarted, handlers::session::session_started);
    registry.register(ActionName::ResetAuthentication, handlers::session::reset_authentication);
    registry.register(ActionName::Fallback, handlers::session::fallback);

    registry.register(ActionName::ValidateLicense, handlers::identity::validate_license);
    registry.register(ActionName::AuthenticateUser, handlers::identity::authenticate_user);

    registry.register(ActionName::CheckLicenseStatus, handlers::license::check_license_status);
    registry.register(ActionName::ViewLicenseInfo, handlers::license::view_license_info);
    registry.register(ActionName::RenewLicense, handlers::license::renew_license);
    registry.register(ActionName::RequestDuplicate, handlers::license::request_duplicate);

    registry.register(ActionName::AddVehicleType, handlers::updates::add_vehicle_type);
    registry.register(ActionName::RemoveVehicleType, handlers::updates::remove_vehicle_type);
    registry.register(ActionName::ChangeAddress, handlers::updates::change_address);
    registry.register(ActionName::ChangeContact, handlers::updates::change_contact);
    registry.register(ActionName::UpdateLicenseStatus, handlers::updates::update_license_status);
    registry.register(ActionName::LicenseNotReceived, handlers::updates::license_not_received);

    registry.register(ActionName::AssistantFallback, handlers::assistant::assistant_fallback);
    registry.register(ActionName::AssistantQuery, handlers::assistant::assistant_query);

    registry
}

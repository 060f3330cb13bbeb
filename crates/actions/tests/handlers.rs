use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};

use dlassist_actions::assistant::FallbackResponder;
use dlassist_actions::llm::{CompletionRequest, LlmClient};
use dlassist_actions::{default_registry, ActionContext, BackendClient};
use dlassist_core::config::AppConfig;
use dlassist_core::{ActionEvent, ActionOutcome, Tracker};

const DETAILS: &str = "/drivingLicense/getLicenseDetails";
const UPDATE_STATUS: &str = "/drivingLicense/updateStatus";

#[derive(Clone, Debug)]
struct Recorded {
    method: Method,
    path: String,
    query: String,
    authorization: Option<String>,
    body: String,
}

#[derive(Clone)]
struct StubState {
    calls: Arc<Mutex<Vec<Recorded>>>,
    replies: Arc<HashMap<String, (StatusCode, Value)>>,
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    state.calls.lock().expect("calls lock").push(Recorded {
        method,
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });

    let (status, payload) = state
        .replies
        .get(&path)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, json!({ "success": false, "message": "no stub" })));
    (status, Json(payload))
}

/// In-process license backend that records every request it receives.
struct StubBackend {
    base_url: String,
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl StubBackend {
    async fn start(replies: &[(&str, StatusCode, Value)]) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let replies = replies
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.clone())))
            .collect::<HashMap<_, _>>();
        let state = StubState { calls: calls.clone(), replies: Arc::new(replies) };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        let app = Router::new().fallback(record).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend");
        });

        Self { base_url: format!("http://{address}"), calls }
    }

    fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().expect("calls lock").clone()
    }
}

struct CannedAssistant(&'static str);

#[async_trait]
impl LlmClient for CannedAssistant {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn context_for(base_url: &str, assistant: Option<Arc<dyn LlmClient>>) -> Arc<ActionContext> {
    let mut config = AppConfig::default();
    config.backend.base_url = base_url.to_string();
    config.backend.auth_token = SecretString::from("service-token".to_string());
    config.backend.timeout_secs = 5;

    let backend = BackendClient::from_config(&config.backend).expect("backend client");
    Arc::new(ActionContext::new(backend, FallbackResponder::new(assistant, &config.assistant)))
}

fn tracker(value: Value) -> Tracker {
    serde_json::from_value(value).expect("tracker")
}

async fn run(context: Arc<ActionContext>, action: &str, tracker: Tracker) -> ActionOutcome {
    default_registry().dispatch(action, context, tracker).await.expect("registered action")
}

fn ok(data: Value) -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "success": true, "message": "ok", "data": data }))
}

fn jane(expiration: &str) -> Value {
    json!({
        "licenseNumber": "DL123456789",
        "firstName": "Jane",
        "lastName": "Doe",
        "vehicleType": "CAR",
        "vehicleMake": "Toyota",
        "issueDate": "2021-03-04T00:00:00.000Z",
        "expirationDate": expiration,
        "address": "12 Main St",
        "licenseStatus": "DISPATCHED"
    })
}

#[tokio::test]
async fn unsupported_status_is_rejected_without_backend_call() {
    let backend = StubBackend::start(&[]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(
        context,
        "action_update_license_status",
        tracker(json!({ "slots": { "new_status": "renewed" } })),
    )
    .await;

    assert_eq!(
        outcome.responses,
        vec!["❌ Invalid status 'renewed'. Please choose from:\nPENDING, SUBMITTED, PRINTED, DISPATCHED, DELIVERED, CANCELLED".to_string()]
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn missing_status_shows_menu_without_backend_call() {
    let backend = StubBackend::start(&[]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_update_license_status", Tracker::default()).await;

    assert!(outcome.responses[0].contains("• DISPATCHED - License has been dispatched"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn supported_status_is_uppercased_and_posted_as_query() {
    let (status, body) = ok(Value::Null);
    let backend = StubBackend::start(&[(UPDATE_STATUS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(
        context,
        "action_update_license_status",
        tracker(json!({ "slots": { "new_status": " printed " } })),
    )
    .await;

    assert!(outcome.responses[0].starts_with("✅ Your license status has been updated to PRINTED successfully!"));
    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].path, UPDATE_STATUS);
    assert_eq!(calls[0].query, "status=PRINTED");
}

#[tokio::test]
async fn license_not_received_reads_then_marks_delivered() {
    let (details_status, details) = ok(jane("2031-01-01T00:00:00Z"));
    let (update_status, updated) = ok(Value::Null);
    let backend = StubBackend::start(&[
        (DETAILS, details_status, details),
        (UPDATE_STATUS, update_status, updated),
    ])
    .await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_license_not_received", Tracker::default()).await;

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[0].method.clone(), calls[0].path.as_str()), (Method::GET, DETAILS));
    assert_eq!((calls[1].method.clone(), calls[1].path.as_str()), (Method::POST, UPDATE_STATUS));
    assert_eq!(calls[1].query, "status=DELIVERED");

    assert_eq!(outcome.responses.len(), 2);
    assert!(outcome.responses[0].contains("current license status is: **DISPATCHED**"));
    assert!(outcome.responses[1].starts_with("✅ I've updated your license status to DELIVERED!"));
}

#[tokio::test]
async fn license_not_received_defaults_missing_status_to_processing() {
    let mut record = jane("2031-01-01T00:00:00Z");
    record["licenseStatus"] = Value::Null;
    let (details_status, details) = ok(record);
    let (update_status, updated) = ok(Value::Null);
    let backend = StubBackend::start(&[
        (DETAILS, details_status, details),
        (UPDATE_STATUS, update_status, updated),
    ])
    .await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_license_not_received", Tracker::default()).await;

    assert!(outcome.responses[0].contains("**PROCESSING**"));
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn license_not_received_skips_write_when_read_fails() {
    let backend = StubBackend::start(&[(
        DETAILS,
        StatusCode::OK,
        json!({ "success": false, "message": "token expired" }),
    )])
    .await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_license_not_received", Tracker::default()).await;

    assert_eq!(backend.calls().len(), 1);
    assert_eq!(
        outcome.responses,
        vec!["❌ I couldn't retrieve your current license status. Please contact our support team at 1-800-LICENSE for assistance.".to_string()]
    );
}

#[tokio::test]
async fn empty_license_record_counts_as_failed_read() {
    let (status, body) = ok(json!({}));
    let backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context.clone(), "action_license_not_received", Tracker::default()).await;
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(
        outcome.responses,
        vec!["❌ I couldn't retrieve your current license status. Please contact our support team at 1-800-LICENSE for assistance.".to_string()]
    );

    let view = run(
        context,
        "action_view_license_info",
        tracker(json!({ "slots": { "license_number": "DL123456789" } })),
    )
    .await;
    assert_eq!(
        view.responses,
        vec!["❌ Unable to retrieve license information. Please contact our support team.".to_string()]
    );
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn metadata_token_is_forwarded_and_configured_token_is_fallback() {
    let (status, body) = ok(Value::Null);
    let backend = StubBackend::start(&[("/drivingLicense/renewLicense", status, body)]).await;
    let context = context_for(&backend.base_url, None);

    run(
        context.clone(),
        "action_renew_license",
        tracker(json!({ "latest_message": { "text": "renew", "metadata": { "token": "widget-jwt" } } })),
    )
    .await;
    run(context, "action_renew_license", Tracker::default()).await;

    let calls = backend.calls();
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer widget-jwt"));
    assert_eq!(calls[1].authorization.as_deref(), Some("Bearer service-token"));
}

#[tokio::test]
async fn backend_failures_yield_apology_without_backend_text() {
    let backend = StubBackend::start(&[
        (
            "/drivingLicense/renewLicense",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": true, "message": "database exploded" }),
        ),
        (
            "/drivingLicense/requestDuplicate",
            StatusCode::OK,
            json!({ "success": false, "message": "database exploded" }),
        ),
    ])
    .await;
    let context = context_for(&backend.base_url, None);

    let renewal = run(context.clone(), "action_renew_license", Tracker::default()).await;
    let duplicate = run(context, "action_request_duplicate", Tracker::default()).await;

    assert_eq!(
        renewal.responses,
        vec!["❌ Unable to process renewal. Please contact our support team.".to_string()]
    );
    assert_eq!(
        duplicate.responses,
        vec!["❌ Unable to process duplicate request. Please contact our support team.".to_string()]
    );
    for response in renewal.responses.iter().chain(&duplicate.responses) {
        assert!(!response.contains("database exploded"));
    }
}

#[tokio::test]
async fn unreachable_backend_yields_apology() {
    let context = context_for("http://127.0.0.1:9", None);

    let outcome = run(
        context,
        "action_change_address",
        tracker(json!({ "slots": { "new_address": "1 Elm Road" } })),
    )
    .await;

    assert_eq!(
        outcome.responses,
        vec!["❌ Unable to update address. Please contact our support team.".to_string()]
    );
}

#[tokio::test]
async fn undecodable_body_is_treated_as_failure() {
    let backend =
        StubBackend::start(&[("/drivingLicense/renewLicense", StatusCode::OK, json!("not an envelope"))])
            .await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_renew_license", Tracker::default()).await;

    assert_eq!(
        outcome.responses,
        vec!["❌ Unable to process renewal. Please contact our support team.".to_string()]
    );
}

#[tokio::test]
async fn authentication_matches_name_and_masks_details() {
    let (status, body) = ok(jane("2031-01-01T00:00:00Z"));
    let backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(
        context.clone(),
        "action_authenticate_user",
        tracker(json!({ "slots": { "license_number": "DL123456789", "full_name": "  JANE doe " } })),
    )
    .await;

    assert_eq!(outcome.events, vec![ActionEvent::slot("authenticated", true)]);
    assert!(outcome.responses[0].starts_with("✅ Authentication successful!"));
    assert!(outcome.responses[0].contains("🔢 License #: DL*******89"));
    assert!(!outcome.responses[0].contains("DL123456789"));
    assert_eq!(backend.calls()[0].query, "licenseNumber=DL123456789");

    let mismatch = run(
        context,
        "action_authenticate_user",
        tracker(json!({ "slots": { "license_number": "DL123456789", "full_name": "Jane D" } })),
    )
    .await;
    assert_eq!(mismatch.events, vec![ActionEvent::slot("authenticated", false)]);
    assert!(mismatch.responses[0].starts_with("❌ Authentication failed."));
}

#[tokio::test]
async fn authentication_requires_both_slots() {
    let backend = StubBackend::start(&[]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(
        context,
        "action_authenticate_user",
        tracker(json!({ "slots": { "license_number": "DL123456789" } })),
    )
    .await;

    assert_eq!(
        outcome.responses,
        vec!["❌ Both license number and name are required for authentication.".to_string()]
    );
    assert!(outcome.events.is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn validation_checks_format_before_existence() {
    let (status, body) = ok(jane("2031-01-01T00:00:00Z"));
    let backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let malformed = run(
        context.clone(),
        "action_validate_license",
        tracker(json!({ "slots": { "license_number": "AB-1" } })),
    )
    .await;
    assert_eq!(
        malformed.responses,
        vec!["❌ Invalid license number format. Please provide a valid license number.".to_string()]
    );
    assert!(backend.calls().is_empty());

    let valid = run(
        context,
        "action_validate_license",
        tracker(json!({ "slots": { "license_number": "DL123456789" } })),
    )
    .await;
    assert!(valid.responses[0].starts_with("✅ License number validated successfully."));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn unknown_license_number_is_reported_as_not_found() {
    let backend = StubBackend::start(&[(
        DETAILS,
        StatusCode::OK,
        json!({ "success": false, "message": "Driving license not found" }),
    )])
    .await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(
        context,
        "action_validate_license",
        tracker(json!({ "slots": { "license_number": "ZZ999999" } })),
    )
    .await;

    assert_eq!(
        outcome.responses,
        vec!["❌ License number ZZ-999-999 not found in our system. Please check the number and try again.".to_string()]
    );
}

#[tokio::test]
async fn status_check_derives_expiry_from_record() {
    let (status, body) = ok(jane("2999-12-31T00:00:00Z"));
    let backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let outcome = run(context, "action_check_license_status", Tracker::default()).await;

    assert_eq!(
        outcome.responses,
        vec!["✅ Great news! Your license is currently ACTIVE and valid until 2999-12-31. You're all set to drive!".to_string()]
    );
    assert_eq!(backend.calls()[0].query, "");
}

#[tokio::test]
async fn status_check_reports_expired_and_unknown() {
    let (status, body) = ok(jane("2001-02-03T00:00:00Z"));
    let expired_backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let expired =
        run(context_for(&expired_backend.base_url, None), "action_check_license_status", Tracker::default())
            .await;
    assert!(expired.responses[0].starts_with("⚠️ Your license has EXPIRED on 2001-02-03."));

    let failing_backend = StubBackend::start(&[]).await;
    let unknown =
        run(context_for(&failing_backend.base_url, None), "action_check_license_status", Tracker::default())
            .await;
    assert_eq!(
        unknown.responses,
        vec!["❌ Unable to determine license status. Please contact our support team.".to_string()]
    );
}

#[tokio::test]
async fn view_info_prefers_metadata_license_number() {
    let (status, body) = ok(jane("2031-01-01T00:00:00Z"));
    let backend = StubBackend::start(&[(DETAILS, status, body)]).await;
    let context = context_for(&backend.base_url, None);

    let missing = run(context.clone(), "action_view_license_info", Tracker::default()).await;
    assert_eq!(
        missing.responses,
        vec!["❌ Unable to retrieve your license information. Please contact support.".to_string()]
    );
    assert!(backend.calls().is_empty());

    let outcome = run(
        context,
        "action_view_license_info",
        tracker(json!({
            "slots": { "license_number": "SLOT000001" },
            "latest_message": { "text": "show my license", "metadata": { "licenseNumber": "DL123456789" } }
        })),
    )
    .await;
    assert!(outcome.responses[0].starts_with("📋 Here are your license details:"));
    assert!(outcome.responses[0].contains("🚗 Vehicle Make: Toyota"));
    assert_eq!(backend.calls()[0].query, "licenseNumber=DL123456789");
}

#[tokio::test]
async fn mutations_send_expected_payloads() {
    let (status, body) = ok(Value::Null);
    let backend = StubBackend::start(&[
        ("/drivingLicense/addVehicleType", status, body.clone()),
        ("/drivingLicense/removeVehicleType", status, body.clone()),
        ("/drivingLicense/changeAddress", status, body.clone()),
        ("/drivingLicense/updateContact", status, body),
    ])
    .await;
    let context = context_for(&backend.base_url, None);

    let added = run(
        context.clone(),
        "action_add_vehicle_type",
        tracker(json!({ "slots": { "vehicle_type": "heavy TRUCK" } })),
    )
    .await;
    let removed = run(
        context.clone(),
        "action_remove_vehicle_type",
        tracker(json!({ "slots": { "vehicle_type": "motorcycle" } })),
    )
    .await;
    let moved = run(
        context.clone(),
        "action_change_address",
        tracker(json!({ "slots": { "new_address": "12 Main St" } })),
    )
    .await;
    let contacted = run(
        context,
        "action_change_contact",
        tracker(json!({ "slots": { "new_contact": "+1 555 0100" } })),
    )
    .await;

    assert!(added.responses[0].starts_with("✅ Heavy Truck authorization has been added to your license!"));
    assert!(removed.responses[0].starts_with("✅ Motorcycle authorization has been removed from your license!"));
    assert!(moved.responses[0].starts_with("✅ Your address has been updated successfully!"));
    assert!(contacted.responses[0].starts_with("✅ Your contact information has been updated successfully!"));

    let calls = backend.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|call| call.method == Method::POST));
    assert_eq!(
        serde_json::from_str::<Value>(&calls[0].body).expect("json body"),
        json!({ "vehicleType": "heavy TRUCK" })
    );
    assert_eq!(calls[2].query, "address=12+Main+St");
    assert_eq!(
        serde_json::from_str::<Value>(&calls[3].body).expect("json body"),
        json!({ "newContact": "+1 555 0100" })
    );
}

#[tokio::test]
async fn mutations_require_their_slot() {
    let backend = StubBackend::start(&[]).await;
    let context = context_for(&backend.base_url, None);

    let vehicle = run(context.clone(), "action_add_vehicle_type", Tracker::default()).await;
    let address = run(context.clone(), "action_change_address", Tracker::default()).await;
    let contact = run(context, "action_change_contact", Tracker::default()).await;

    assert_eq!(vehicle.responses, vec!["❌ Vehicle type not specified. Please try again.".to_string()]);
    assert_eq!(address.responses, vec!["❌ New address not specified. Please try again.".to_string()]);
    assert_eq!(
        contact.responses,
        vec!["❌ New contact information not specified. Please try again.".to_string()]
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn session_actions_reset_authentication() {
    let context = context_for("http://127.0.0.1:9", None);

    for action in ["action_session_started", "action_reset_authentication"] {
        let outcome = run(context.clone(), action, Tracker::default()).await;
        assert!(outcome.responses.is_empty());
        assert_eq!(outcome.events, vec![ActionEvent::slot("authenticated", false)]);
    }

    let fallback = run(context, "action_fallback", Tracker::default()).await;
    assert!(fallback.responses[0].starts_with("I'm not sure I understood that."));
}

#[tokio::test]
async fn assistant_actions_use_redirect_when_unconfigured() {
    let context = context_for("http://127.0.0.1:9", None);
    let asking = tracker(json!({ "latest_message": { "text": "what is the speed limit?" } }));

    let fallback = run(context.clone(), "action_gpt_fallback", asking.clone()).await;
    let query = run(context, "action_gpt_query", asking).await;

    assert!(fallback.responses[0].contains("I can help you check your license status"));
    assert!(query.responses[0].starts_with("🤖"));
}

#[tokio::test]
async fn assistant_actions_relay_the_model_answer() {
    let assistant: Arc<dyn LlmClient> = Arc::new(CannedAssistant("Usually 50 km/h in towns."));
    let context = context_for("http://127.0.0.1:9", Some(assistant));

    let outcome = run(
        context,
        "action_gpt_query",
        tracker(json!({ "latest_message": { "text": "what is the speed limit?" } })),
    )
    .await;

    assert_eq!(outcome.responses, vec!["Usually 50 km/h in towns.".to_string()]);
}

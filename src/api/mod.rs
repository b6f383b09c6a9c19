use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::{
    DEFAULT_PLAN_PAYMENT, LoanOutcome, LoanQuery, PaymentSweepResult, evaluate_default_plan,
    sweep_payments,
};
use crate::mail::{ContactMessage, Mailer};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const TITLE_PLACEHOLDER: &str = "{{title}}";

const MAX_BALANCE: f64 = 999_999_999.0;
const MAX_INTEREST_RATE: f64 = 999.99;
const DEFAULT_INTEREST_RATE: f64 = 5.4;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5_000;

struct AppState {
    config: Config,
    mailer: Option<Mailer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EstimatePayload {
    balance: Option<f64>,
    interest: Option<f64>,
    graduation: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ContactPayload {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    minimum_payment: f64,
    plan: LoanOutcome,
    sweep: PaymentSweepResult,
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    sent: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_query(payload: EstimatePayload) -> Result<LoanQuery, String> {
    let Some(balance) = payload.balance else {
        return Err("balance is required".to_string());
    };
    if !balance.is_finite() || !(0.0..=MAX_BALANCE).contains(&balance) {
        return Err("balance must be between 0 and 999,999,999".to_string());
    }

    // The form pre-fills 5.4, so an omitted rate falls back to it.
    let interest = payload.interest.unwrap_or(DEFAULT_INTEREST_RATE);
    if !interest.is_finite() || !(0.0..=MAX_INTEREST_RATE).contains(&interest) {
        return Err("interest must be between 0 and 999.99".to_string());
    }

    let Some(graduation) = payload.graduation else {
        return Err("graduation is required".to_string());
    };

    Ok(LoanQuery {
        initial_balance: balance,
        annual_interest_rate: interest,
        graduation_date: graduation,
    })
}

fn is_plausible_email(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn build_contact_message(payload: ContactPayload) -> Result<ContactMessage, String> {
    let name = payload.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err("name is required".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("name must be at most 200 characters".to_string());
    }

    let email = payload.email.as_deref().unwrap_or("").trim().to_string();
    if email.is_empty() {
        return Err("email is required".to_string());
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err("email must be at most 200 characters".to_string());
    }
    if !is_plausible_email(&email) {
        return Err("invalid email address".to_string());
    }

    let body = payload.message.as_deref().unwrap_or("").trim().to_string();
    if body.is_empty() {
        return Err("message is required".to_string());
    }
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err("message must be at most 5000 characters".to_string());
    }

    Ok(ContactMessage { name, email, body })
}

fn build_estimate_response(payload: EstimatePayload) -> Result<EstimateResponse, String> {
    let query = build_query(payload)?;
    Ok(EstimateResponse {
        minimum_payment: DEFAULT_PLAN_PAYMENT,
        plan: evaluate_default_plan(query),
        sweep: sweep_payments(query),
    })
}

pub async fn run_http_server(port: u16, config: Config) -> std::io::Result<()> {
    let mailer = match config.smtp.clone() {
        Some(smtp) => match Mailer::new(smtp, config.project_name.clone()) {
            Ok(mailer) => Some(mailer),
            Err(e) => {
                warn!("contact mail disabled: {e}");
                None
            }
        },
        None => {
            warn!("SMTP settings are not configured; the contact form is disabled");
            None
        }
    };

    let state = Arc::new(AppState { config, mailer });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/estimate",
            get(estimate_get_handler).post(estimate_post_handler),
        )
        .route("/api/contact", post(contact_handler))
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let page = INDEX_HTML.replace(TITLE_PLACEHOLDER, &state.config.project_name);
    with_cache_control(Html(page))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn estimate_get_handler(Query(payload): Query<EstimatePayload>) -> Response {
    estimate_handler_impl(payload)
}

async fn estimate_post_handler(Json(payload): Json<EstimatePayload>) -> Response {
    estimate_handler_impl(payload)
}

fn estimate_handler_impl(payload: EstimatePayload) -> Response {
    match build_estimate_response(payload) {
        Ok(response) => {
            info!(
                balance = response.plan.initial_balance,
                rate = response.plan.annual_interest_rate,
                "loan estimate computed"
            );
            json_response(StatusCode::OK, response)
        }
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactPayload>,
) -> Response {
    let message = match build_contact_message(payload) {
        Ok(message) => message,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let Some(mailer) = state.mailer.clone() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "the contact form is not configured",
        );
    };

    match tokio::task::spawn_blocking(move || mailer.send_contact_message(&message)).await {
        Ok(Ok(())) => json_response(StatusCode::OK, ContactResponse { sent: true }),
        Ok(Err(e)) => {
            error!("contact mail delivery failed: {e}");
            error_response(StatusCode::BAD_GATEWAY, "message could not be delivered")
        }
        Err(e) => {
            error!("contact mail task failed: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "message could not be delivered",
            )
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn query_from_json(json: &str) -> Result<LoanQuery, String> {
    let payload = serde_json::from_str::<EstimatePayload>(json)
        .map_err(|e| format!("Invalid estimate JSON payload: {e}"))?;
    build_query(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_payload() -> EstimatePayload {
        EstimatePayload {
            balance: Some(10_000.0),
            interest: Some(5.4),
            graduation: NaiveDate::from_ymd_opt(2027, 6, 15),
        }
    }

    fn sample_contact() -> ContactPayload {
        ContactPayload {
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            message: Some("Hello there".to_string()),
        }
    }

    #[test]
    fn build_query_accepts_a_complete_payload() {
        let query = build_query(sample_payload()).expect("valid query");
        assert_approx(query.initial_balance, 10_000.0);
        assert_approx(query.annual_interest_rate, 5.4);
        assert_eq!(
            query.graduation_date,
            NaiveDate::from_ymd_opt(2027, 6, 15).expect("valid date")
        );
    }

    #[test]
    fn build_query_requires_a_balance() {
        let mut payload = sample_payload();
        payload.balance = None;
        let err = build_query(payload).expect_err("must require balance");
        assert!(err.contains("balance"));
    }

    #[test]
    fn build_query_bounds_the_balance() {
        for bad in [-0.01, 1_000_000_000.0, f64::NAN, f64::INFINITY] {
            let mut payload = sample_payload();
            payload.balance = Some(bad);
            let err = build_query(payload).expect_err("must reject out-of-range balance");
            assert!(err.contains("balance"));
        }
    }

    #[test]
    fn build_query_bounds_the_interest_rate() {
        for bad in [-0.01, 1_000.0, f64::NAN] {
            let mut payload = sample_payload();
            payload.interest = Some(bad);
            let err = build_query(payload).expect_err("must reject out-of-range interest");
            assert!(err.contains("interest"));
        }
    }

    #[test]
    fn build_query_defaults_an_omitted_interest_rate() {
        let mut payload = sample_payload();
        payload.interest = None;
        let query = build_query(payload).expect("valid query");
        assert_approx(query.annual_interest_rate, DEFAULT_INTEREST_RATE);
    }

    #[test]
    fn build_query_requires_a_graduation_date() {
        let mut payload = sample_payload();
        payload.graduation = None;
        let err = build_query(payload).expect_err("must require graduation");
        assert!(err.contains("graduation"));
    }

    #[test]
    fn query_from_json_parses_web_keys() {
        let query = query_from_json(
            r#"{"balance": 10000, "interest": 5.4, "graduation": "2027-06-15"}"#,
        )
        .expect("json should parse");
        assert_approx(query.initial_balance, 10_000.0);
        assert_approx(query.annual_interest_rate, 5.4);
        assert_eq!(
            query.graduation_date,
            NaiveDate::from_ymd_opt(2027, 6, 15).expect("valid date")
        );
    }

    #[test]
    fn query_from_json_rejects_a_malformed_date() {
        let result = query_from_json(r#"{"balance": 10000, "graduation": "15/06/2027"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn estimate_response_pairs_the_plan_with_its_sweep_entry() {
        let response = build_estimate_response(sample_payload()).expect("valid payload");
        assert_approx(response.minimum_payment, 2_500.0);
        assert_eq!(response.sweep.entries.len(), 100);

        let entry = response
            .sweep
            .entries
            .iter()
            .find(|e| e.payment == 2_500)
            .expect("2500 is on the progression");
        assert_approx(entry.total_paid, response.plan.total_paid);
    }

    #[test]
    fn estimate_response_serialization_contains_expected_fields() {
        let response = build_estimate_response(sample_payload()).expect("valid payload");
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"minimumPayment\""));
        assert!(json.contains("\"plan\""));
        assert!(json.contains("\"sweep\""));
        assert!(json.contains("\"totalPaid\""));
        assert!(json.contains("\"periodsElapsed\""));
        assert!(json.contains("\"finalBalance\""));
        assert!(json.contains("\"graduationDate\":\"2027-06-15\""));
        assert!(json.contains("\"entries\""));
    }

    #[test]
    fn contact_message_is_trimmed_and_accepted() {
        let mut payload = sample_contact();
        payload.name = Some("  Ada Lovelace  ".to_string());
        let message = build_contact_message(payload).expect("valid contact");
        assert_eq!(message.name, "Ada Lovelace");
        assert_eq!(message.email, "ada@example.com");
        assert_eq!(message.body, "Hello there");
    }

    #[test]
    fn contact_message_requires_every_field() {
        for field in ["name", "email", "message"] {
            let mut payload = sample_contact();
            match field {
                "name" => payload.name = None,
                "email" => payload.email = Some("   ".to_string()),
                _ => payload.message = None,
            }
            let err = build_contact_message(payload).expect_err("must require field");
            assert!(err.contains(field), "error {err:?} should mention {field}");
        }
    }

    #[test]
    fn contact_message_enforces_length_limits() {
        let mut payload = sample_contact();
        payload.message = Some("x".repeat(MAX_MESSAGE_LEN + 1));
        let err = build_contact_message(payload).expect_err("must cap message length");
        assert!(err.contains("5000"));

        let mut payload = sample_contact();
        payload.name = Some("x".repeat(MAX_NAME_LEN + 1));
        assert!(build_contact_message(payload).is_err());
    }

    #[test]
    fn contact_message_rejects_implausible_addresses() {
        for bad in ["plain", "@example.com", "a b@example.com", "a@nodot", "a@x."] {
            let mut payload = sample_contact();
            payload.email = Some(bad.to_string());
            let err = build_contact_message(payload).expect_err("must reject address");
            assert!(err.contains("email"), "error {err:?} for {bad:?}");
        }
    }
}

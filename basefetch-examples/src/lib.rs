//! Mock dashboard backend used by the example binaries and tests.
//!
//! The router mimics the REST endpoints a marketing dashboard calls: login,
//! campaigns, deposits, the current profile and a flaky daily report. Every
//! failure is a JSON body `{"message": ..., "code": ...}` with a non-2xx
//! status.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Password accepted by `POST /auth/login` for any email.
pub const DEMO_PASSWORD: &str = "hunter2";

/// Campaigns returned per page by `GET /campaigns`.
pub const PAGE_SIZE: usize = 2;

const TOKEN_PREFIX: &str = "token-";

/// Returns the server address from PORT env var, defaulting to 3000.
///
/// ```ignore
/// let addr = basefetch_examples::server_addr();
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// ```
pub fn server_addr() -> SocketAddr {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3000);
    SocketAddr::from(([0, 0, 0, 0], port))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: u64,
    pub name: String,
    pub status: CampaignStatus,
    pub budget_cents: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub budget_cents: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
}

/// One page of `GET /campaigns`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignPage {
    pub items: Vec<Campaign>,
    pub page: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: String,
    pub amount_cents: u64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyReport {
    pub campaigns: usize,
    pub spend_cents: u64,
}

/// The JSON error body every endpoint fails with.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "missing or invalid credentials")
    }

    fn not_found(id: u64) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("campaign {} not found", id))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.message, "code": self.code });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Default)]
struct AppState {
    campaigns: Mutex<BTreeMap<u64, Campaign>>,
    next_id: AtomicU64,
    report_calls: AtomicU64,
}

impl AppState {
    fn seeded() -> Self {
        let state = AppState::default();
        for (name, status, budget_cents) in [
            ("Spring launch", CampaignStatus::Active, 500_000),
            ("Referral push", CampaignStatus::Active, 120_000),
            ("Winter clearance", CampaignStatus::Paused, 80_000),
            ("Partner webinar", CampaignStatus::Draft, 0),
            ("Retargeting", CampaignStatus::Active, 45_000),
        ] {
            state.insert(name.to_string(), status, budget_cents);
        }
        state
    }

    fn insert(&self, name: String, status: CampaignStatus, budget_cents: u64) -> Campaign {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let campaign = Campaign {
            id,
            name,
            status,
            budget_cents,
        };
        self.lock().insert(id, campaign.clone());
        campaign
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Campaign>> {
        self.campaigns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type SharedState = Arc<AppState>;

/// Build the mock dashboard router with seeded campaigns.
pub fn app() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/me", get(me))
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/{id}", put(update_campaign).delete(delete_campaign))
        .route("/deposits", get(list_deposits))
        .route("/reports/daily", get(daily_report))
        .with_state(Arc::new(AppState::seeded()))
}

async fn login(Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiFailure> {
    if req.email.is_empty() || req.password != DEMO_PASSWORD {
        return Err(ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "email or password is incorrect",
        ));
    }
    Ok(Json(LoginResponse {
        token: format!("{}{}", TOKEN_PREFIX, req.email),
    }))
}

/// Accepts `Authorization: Bearer token-<email>` or a `session=token-<email>` cookie.
async fn me(headers: HeaderMap) -> Result<Json<Profile>, ApiFailure> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer
        .or_else(|| basefetch::get_cookies(&headers).remove("session"))
        .ok_or_else(ApiFailure::unauthorized)?;

    let email = token
        .strip_prefix(TOKEN_PREFIX)
        .filter(|email| !email.is_empty())
        .ok_or_else(ApiFailure::unauthorized)?;
    Ok(Json(Profile {
        email: email.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct CampaignFilter {
    status: Option<CampaignStatus>,
    page: Option<usize>,
}

async fn list_campaigns(
    State(state): State<SharedState>,
    Query(filter): Query<CampaignFilter>,
) -> Result<Json<CampaignPage>, ApiFailure> {
    let page = filter.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "invalid_page",
            "page starts at 1",
        ));
    }

    let matching: Vec<Campaign> = state
        .lock()
        .values()
        .filter(|c| filter.status.is_none_or(|status| c.status == status))
        .cloned()
        .collect();
    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Ok(Json(CampaignPage { items, page, total }))
}

async fn create_campaign(
    State(state): State<SharedState>,
    Json(req): Json<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ApiFailure> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiFailure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation",
            "campaign name must not be empty",
        ));
    }
    let campaign = state.insert(name.to_string(), CampaignStatus::Draft, req.budget_cents);
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn update_campaign(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(update): Json<CampaignUpdate>,
) -> Result<Json<Campaign>, ApiFailure> {
    let mut campaigns = state.lock();
    let campaign = campaigns.get_mut(&id).ok_or_else(|| ApiFailure::not_found(id))?;
    if let Some(name) = update.name {
        campaign.name = name;
    }
    if let Some(status) = update.status {
        campaign.status = status;
    }
    Ok(Json(campaign.clone()))
}

async fn delete_campaign(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    match state.lock().remove(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiFailure::not_found(id)),
    }
}

async fn list_deposits() -> Json<Vec<Deposit>> {
    Json(vec![
        Deposit {
            id: "dep_001".to_string(),
            amount_cents: 250_000,
            currency: "USD".to_string(),
        },
        Deposit {
            id: "dep_002".to_string(),
            amount_cents: 100_000,
            currency: "USD".to_string(),
        },
    ])
}

/// Fails with 503 on every odd-numbered call, starting with the first.
async fn daily_report(State(state): State<SharedState>) -> Result<Json<DailyReport>, ApiFailure> {
    let call = state.report_calls.fetch_add(1, Ordering::SeqCst);
    if call % 2 == 0 {
        return Err(ApiFailure::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "report_warming_up",
            "daily report is being generated, try again",
        ));
    }
    let campaigns = state.lock();
    Ok(Json(DailyReport {
        campaigns: campaigns.len(),
        spend_cents: campaigns.values().map(|c| c.budget_cents).sum(),
    }))
}

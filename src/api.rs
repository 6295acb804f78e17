//! HTTP surface. Handlers are thin: they decode the request, call one
//! service operation and encode the result.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    auth::auth_middleware,
    balance::{BalanceAggregator, BalanceBreakdown, SalesMatching},
    config::AuthConfig,
    error::BooksError,
    expense_ledger::{ExpenseLedger, LedgerPage},
    lead_status::{LeadStatus, LeadStatusInput, LeadStatusService},
    sales_returns::SalesReturnService,
    session::{LeadHandoff, SessionManager},
    store::{DataValue, DocumentStore},
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    balances: Arc<BalanceAggregator>,
    sales_returns: Arc<SalesReturnService>,
    lead_statuses: Arc<LeadStatusService>,
    sessions: Arc<SessionManager>,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, sales_matching: SalesMatching) -> Self {
        Self {
            balances: Arc::new(BalanceAggregator::new(store.clone()).with_sales_matching(sales_matching)),
            sales_returns: Arc::new(SalesReturnService::new(store.clone())),
            lead_statuses: Arc::new(LeadStatusService::new(store.clone())),
            sessions: Arc::new(SessionManager::new()),
            metrics: None,
            store,
        }
    }

    pub fn with_sessions(mut self, sessions: SessionManager) -> Self {
        self.sessions = Arc::new(sessions);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub struct ApiError(BooksError);

impl From<BooksError> for ApiError {
    fn from(e: BooksError) -> Self {
        ApiError(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BooksError::InvalidArgument(_) | BooksError::Validation(_) => StatusCode::BAD_REQUEST,
            BooksError::NotFound(_) | BooksError::SessionNotFound => StatusCode::NOT_FOUND,
            BooksError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorBody {
            success: false,
            error: self.0.to_string(),
        })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState, auth: AuthConfig) -> Router {
    Router::new()
        .route("/accounts/:id/balance", get(account_balance))
        .route("/accounts/:id/balance/breakdown", get(balance_breakdown))
        .route("/sales-returns", post(create_sales_return))
        .route("/sales-returns/:id", get(get_sales_return))
        .route("/reports/sales-returns/tax", get(tax_returned))
        .route("/reports/sales-returns/shipping-tax", get(shipping_tax_returned))
        .route("/expenses", get(expense_ledger))
        .route("/lead-statuses", get(list_lead_statuses).post(create_lead_status))
        .route("/lead-statuses/:id", put(update_lead_status).delete(delete_lead_status))
        .route("/sessions", post(login))
        .route("/sessions/:token", axum::routing::delete(logout))
        .route("/sessions/:token/lead-handoff", put(stash_lead_handoff).get(take_lead_handoff))
        .route_layer(middleware::from_fn(auth_middleware))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(Extension(Arc::new(auth)))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    account_id: String,
    balance: Decimal,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Always answers 200: a failed computation shows as zero with `ok: false`.
async fn account_balance(State(state): State<AppState>, Path(id): Path<String>) -> Json<BalanceResponse> {
    let reading = state.balances.reading(&id);
    Json(BalanceResponse {
        account_id: id,
        balance: reading.balance,
        ok: reading.error.is_none(),
        error: reading.error,
    })
}

async fn balance_breakdown(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<BalanceBreakdown>> {
    Ok(Json(state.balances.breakdown(&id)?))
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

async fn create_sales_return(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let payload = match DataValue::from_json(body) {
        DataValue::Map(fields) => fields,
        _ => return Err(BooksError::Validation("sales return must be a JSON object".to_string()).into()),
    };
    let id = state.sales_returns.create_return(payload)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.to_string() })))
}

async fn get_sales_return(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(state.sales_returns.get_return(&id)?.to_json()))
}

#[derive(Deserialize)]
struct DateRangeParams {
    start: String,
    end: String,
}

impl DateRangeParams {
    fn parse(&self) -> Result<(Date, Date), BooksError> {
        let parse = |name: &str, raw: &str| {
            bizbooks_core::parse_date(raw)
                .ok_or_else(|| BooksError::InvalidArgument(format!("{} must be YYYY-MM-DD, got '{}'", name, raw)))
        };
        Ok((parse("start", &self.start)?, parse("end", &self.end)?))
    }
}

#[derive(Serialize)]
struct RangeTotal {
    start: String,
    end: String,
    total: Decimal,
}

async fn tax_returned(State(state): State<AppState>, Query(range): Query<DateRangeParams>) -> ApiResult<Json<RangeTotal>> {
    let (start, end) = range.parse()?;
    let total = state.sales_returns.total_tax_returned(start, end)?;
    Ok(Json(RangeTotal { start: range.start, end: range.end, total }))
}

async fn shipping_tax_returned(
    State(state): State<AppState>,
    Query(range): Query<DateRangeParams>,
) -> ApiResult<Json<RangeTotal>> {
    let (start, end) = range.parse()?;
    let total = state.sales_returns.total_shipping_tax_returned(start, end)?;
    Ok(Json(RangeTotal { start: range.start, end: range.end, total }))
}

#[derive(Deserialize)]
struct LedgerParams {
    #[serde(default)]
    search: String,
    #[serde(default = "first_page")]
    page: usize,
}

fn first_page() -> usize {
    1
}

async fn expense_ledger(State(state): State<AppState>, Query(params): Query<LedgerParams>) -> ApiResult<Json<LedgerPage>> {
    let ledger = ExpenseLedger::load(state.store.as_ref())?;
    Ok(Json(ledger.view(&params.search, params.page)))
}

async fn list_lead_statuses(State(state): State<AppState>) -> ApiResult<Json<Vec<LeadStatus>>> {
    Ok(Json(state.lead_statuses.list()?))
}

async fn create_lead_status(
    State(state): State<AppState>,
    Json(input): Json<LeadStatusInput>,
) -> ApiResult<(StatusCode, Json<LeadStatus>)> {
    Ok((StatusCode::CREATED, Json(state.lead_statuses.create(input)?)))
}

async fn update_lead_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<LeadStatusInput>,
) -> ApiResult<Json<LeadStatus>> {
    Ok(Json(state.lead_statuses.update(&id, input)?))
}

async fn delete_lead_status(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.lead_statuses.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct LoginRequest {
    user: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: String,
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let (token, session) = state.sessions.login(&req.user)?;
    Ok((StatusCode::CREATED, Json(LoginResponse {
        token,
        user: session.user().to_string(),
    })))
}

async fn logout(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<StatusCode> {
    state.sessions.logout(&token)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stash_lead_handoff(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(handoff): Json<LeadHandoff>,
) -> ApiResult<StatusCode> {
    state.sessions.get(&token)?.stash_lead_handoff(&handoff)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct HandoffResponse {
    handoff: Option<LeadHandoff>,
}

/// Consumes the pending handoff; a second call sees `null`.
async fn take_lead_handoff(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<Json<HandoffResponse>> {
    let handoff = state.sessions.get(&token)?.take_lead_handoff();
    Ok(Json(HandoffResponse { handoff }))
}

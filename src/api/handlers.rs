//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AddressRejectedResponse, CatalogQuery, ChatRequest, ChatResponse, ErrorResponse, HomeResponse,
    NavigateRequest, SelectMedicineRequest, SuccessResponse,
};
use super::AppState;
use crate::catalog::Category;
use crate::order::Address;
use crate::profile::ProfileError;
use crate::screen::Screen;
use crate::session::OrderFlowError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session state and streaming
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // Chat
        .route("/api/chat", post(send_chat))
        // Voice (mic toggle halves)
        .route("/api/voice/start", post(start_voice))
        .route("/api/voice/stop", post(stop_voice))
        // Order flow
        .route("/api/order/select", post(select_medicine))
        .route("/api/order/confirm", post(confirm_order))
        // Address editor
        .route("/api/address", post(save_address))
        .route("/api/address/cancel", post(cancel_address))
        // Navigation
        .route("/api/navigate", post(navigate))
        // Static screens
        .route("/api/home", get(get_home))
        .route("/api/catalog", get(get_catalog))
        .route("/api/orders", get(get_orders))
        // Profile and saved addresses
        .route("/api/profile", get(get_profile))
        .route("/api/profile/addresses", post(add_profile_address))
        .route("/api/profile/addresses/:index", put(update_profile_address))
        .route(
            "/api/profile/addresses/:index",
            delete(delete_profile_address),
        )
        .with_state(state)
}

// ============================================================
// Session state
// ============================================================

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.snapshot().await)
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot().await;
    let rx = state.session.subscribe();
    sse_stream(snapshot, rx)
}

// ============================================================
// Chat
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("message text is empty".to_string()));
    }
    state
        .turn
        .submit_text(req.text)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(ChatResponse { queued: true }))
}

// ============================================================
// Voice
// ============================================================

async fn start_voice(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state
        .voice
        .start()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn stop_voice(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.voice.stop().await;
    Json(SuccessResponse { success: true })
}

// ============================================================
// Order flow
// ============================================================

async fn select_medicine(
    State(state): State<AppState>,
    Json(req): Json<SelectMedicineRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let medicine = state
        .session
        .catalog()
        .medicines()
        .iter()
        .find(|m| m.id == req.medicine_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no medicine with id {}", req.medicine_id)))?;

    state.session.select_medicine(medicine).await;
    if let Some(quantity) = req.quantity {
        state.session.set_quantity(quantity).await;
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn confirm_order(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    match state.session.confirm_order().await {
        Ok(()) => Ok(Json(SuccessResponse { success: true })),
        Err(e @ OrderFlowError::NotConfirmable) => Err(AppError::BadRequest(e.to_string())),
        Err(OrderFlowError::InvalidAddress(_)) => {
            Err(AppError::BadRequest("address failed validation".to_string()))
        }
    }
}

// ============================================================
// Address editor
// ============================================================

async fn save_address(
    State(state): State<AppState>,
    Json(address): Json<Address>,
) -> Result<Json<SuccessResponse>, Response> {
    match state.session.save_address(address).await {
        Ok(()) => Ok(Json(SuccessResponse { success: true })),
        Err(OrderFlowError::InvalidAddress(fields)) => Err((
            StatusCode::BAD_REQUEST,
            Json(AddressRejectedResponse {
                error: "address failed validation".to_string(),
                fields,
            }),
        )
            .into_response()),
        Err(e) => Err(AppError::BadRequest(e.to_string()).into_response()),
    }
}

async fn cancel_address(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.session.cancel_address().await;
    Json(SuccessResponse { success: true })
}

// ============================================================
// Navigation
// ============================================================

async fn navigate(
    State(state): State<AppState>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let screen = Screen::parse(&req.screen).map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.session.navigate(screen).await;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Static screens
// ============================================================

async fn get_home(State(state): State<AppState>) -> Json<HomeResponse> {
    let catalog = state.session.catalog();
    Json(HomeResponse {
        refill_alerts: catalog.refill_alerts().to_vec(),
        categories: Category::ALL.to_vec(),
        featured: catalog.medicines().to_vec(),
    })
}

async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let catalog = state.session.catalog();
    let results: Vec<_> = catalog
        .search(query.q.as_deref(), query.category)
        .into_iter()
        .cloned()
        .collect();
    Json(results)
}

async fn get_orders(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.catalog().history().to_vec())
}

// ============================================================
// Profile
// ============================================================

async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.profile().await)
}

async fn add_profile_address(
    State(state): State<AppState>,
    Json(address): Json<Address>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.add_profile_address(address).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn update_profile_address(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(address): Json<Address>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.update_profile_address(index, address).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn delete_profile_address(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.delete_profile_address(index).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Error mapping
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::InvalidAddress => AppError::BadRequest(e.to_string()),
            ProfileError::NoSuchAddress(_) => AppError::NotFound(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

//! SmartRx - AI pharmacist assistant backend
//!
//! A Rust backend implementing the conversational order-flow state machine
//! behind the pharmacy assistant: text chat turns with tool dispatch, a
//! live voice session controller, and the screen/order/address state the
//! presentation layer renders.

mod api;
mod catalog;
mod llm;
mod order;
mod profile;
mod runtime;
mod screen;
mod session;
mod state_machine;
mod system_prompt;
mod tools;
mod transcript;
mod voice;

use api::{create_router, AppState};
use catalog::Catalog;
use llm::{GeminiModel, GeminiService, LoggingService};
use runtime::{TurnHandle, TurnRuntime};
use session::Session;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice::audio::{UnavailableInput, UnavailableOutput};
use voice::transport::UnconfiguredLive;
use voice::VoiceController;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartrx=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let port: u16 = std::env::var("SMARTRX_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
        tracing::warn!("GEMINI_API_KEY not set; model requests will fail and turns will be abandoned");
        String::new()
    });
    let model = LoggingService::new(GeminiService::new(api_key, GeminiModel::Gemini3Flash)?);

    // One session per process; the session context is explicit, not global.
    let catalog = Arc::new(Catalog::seed());
    let session = Session::new(catalog);

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(32);
    let turn_runtime = TurnRuntime::new(session.clone(), model, event_rx, event_tx.clone());
    tokio::spawn(turn_runtime.run());

    // Voice needs host audio devices and a live transport; headless
    // deployments reject the mic toggle and stay idle.
    let voice = Arc::new(VoiceController::new(
        session.clone(),
        Arc::new(UnconfiguredLive),
        Arc::new(UnavailableInput),
        Arc::new(UnavailableOutput),
    ));

    let state = AppState::new(session, TurnHandle::new(event_tx), voice);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("SmartRx server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cuesight_core::{settings, variants, AiSettings, Overrides, VariantSpec};
use cuesight_suggest::{AnalysisError, AnalysisResult, AnalyzePayload, Generate, LlmGenerator, Session};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

pub struct AppState {
    /// Settings as stored on disk. Environment overrides are never folded in.
    settings: Arc<RwLock<AiSettings>>,
    overrides: Overrides,
    generator: Arc<dyn Generate>,
    /// Where saved settings go; `None` keeps them in memory only.
    settings_path: Option<PathBuf>,
}

impl AppState {
    /// State backed by the real model client.
    pub fn new(stored: AiSettings, overrides: Overrides, settings_path: Option<PathBuf>) -> Self {
        let settings = Arc::new(RwLock::new(stored));
        AppState {
            generator: Arc::new(LlmGenerator::new(settings.clone(), overrides.clone())),
            settings,
            overrides,
            settings_path,
        }
    }

    pub fn with_generator(
        stored: AiSettings,
        settings_path: Option<PathBuf>,
        generator: Arc<dyn Generate>,
    ) -> Self {
        AppState {
            settings: Arc::new(RwLock::new(stored)),
            overrides: Overrides::default(),
            generator,
            settings_path,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Stored settings with the environment overrides on top.
    async fn effective_settings(&self) -> AiSettings {
        let stored = self.settings.read().await.clone();
        self.overrides.apply(stored)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        // route name used by the original web UI
        .route("/api/gemini", post(analyze))
        .route("/api/variants", get(list_variants))
        .route("/api/settings", get(get_settings).put(save_settings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn failure(err: &AnalysisError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AnalysisResult::failed(err)),
    )
        .into_response()
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!("unreadable analysis request: {rejection}");
            return failure(&AnalysisError::InvalidRequest(rejection.body_text()));
        }
    };

    // Each request gets its own session; nothing is shared between callers.
    let mut session = match payload.into_scene() {
        Ok(scene) => Session::with_scene(scene),
        Err(e) => {
            warn!(kind = e.kind(), "rejected analysis request: {e}");
            return failure(&e);
        }
    };

    match session.analyze(state.generator.as_ref()).await {
        Ok(result) => (StatusCode::OK, Json(result.clone())).into_response(),
        Err(e) => failure(&e),
    }
}

async fn list_variants() -> Json<Vec<&'static VariantSpec>> {
    Json(variants::all().collect())
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let settings = state.effective_settings().await;
    // Mask API key; only report whether it's set
    Json(serde_json::json!({
        "provider": settings.provider,
        "model": settings.model,
        "timeoutSecs": settings.timeout_secs,
        "hasKey": !settings.api_key.is_empty(),
        "configured": settings.is_configured(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveSettings {
    provider: String,
    model: String,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SaveSettings>,
) -> Result<StatusCode, (StatusCode, String)> {
    // Held until the new settings are live, so concurrent saves apply in order.
    let mut current = state.settings.write().await;
    let mut next = current.clone();
    next.provider = update.provider;
    next.model = update.model;
    // Empty key means "keep existing"
    if !update.api_key.is_empty() {
        next.api_key = update.api_key;
    }
    if let Some(secs) = update.timeout_secs {
        next.timeout_secs = secs;
    }

    if let Some(path) = state.settings_path.clone() {
        let to_disk = next.clone();
        tokio::task::spawn_blocking(move || settings::write_settings_to(&path, &to_disk))
            .await
            .map_err(|e| e.to_string())
            .and_then(|written| written)
            .map_err(|e| {
                error!("saving settings failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e)
            })?;
    }

    info!(provider = %next.provider, model = %next.model, "settings saved");
    *current = next;
    Ok(StatusCode::NO_CONTENT)
}

fn listen_addr() -> Result<SocketAddr, String> {
    let raw = std::env::var("CUESIGHT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    raw.parse()
        .map_err(|e| format!("invalid CUESIGHT_ADDR '{raw}': {e}"))
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let stored = settings::read_settings();
    let overrides = Overrides::from_env();
    if !overrides.apply(stored.clone()).is_configured() {
        warn!("no API key configured; set GEMINI_API_KEY or PUT /api/settings");
    }
    let state = Arc::new(AppState::new(
        stored,
        overrides,
        Some(settings::settings_path()),
    ));

    let addr = listen_addr()?;
    info!("Server: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

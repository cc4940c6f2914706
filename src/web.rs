use std::convert::Infallible;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::Config,
    error::Error,
    json_view::{parse_json_view, render_json_view},
    models::{SettingsRecord, TrackingParameterList},
    params::{extract_parameters, generate_modified_url, remove_tracking_parameters, ParameterMap},
    platform::{check_clipboard_text, check_tab_url},
    store::{SettingsEvent, SettingsStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: SettingsStore,
}

pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::NoActiveTab | Error::RestrictedPage(_) | Error::InvalidClipboardUrl => {
                ApiError::Unprocessable(e.to_string())
            }
            _ => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
            ApiError::Internal(e) => {
                error!(error = ?e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
struct AddTrackingRequest {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackingResponse {
    tracking_parameters: TrackingParameterList,
}

#[derive(Serialize, Deserialize)]
struct JsonView {
    json: String,
}

#[derive(Deserialize)]
struct UrlRequest {
    url: String,
}

#[derive(Serialize)]
struct ParametersResponse {
    parameters: ParameterMap,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanRequest {
    url: String,
    tracking_parameters: Option<Vec<String>>,
}

#[derive(Serialize)]
struct UrlParametersResponse {
    url: String,
    parameters: ParameterMap,
}

#[derive(Deserialize)]
struct RebuildRequest {
    url: String,
    #[serde(default)]
    parameters: ParameterMap,
}

#[derive(Serialize)]
struct UrlResponse {
    url: String,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum InspectSource {
    Tab,
    Clipboard,
}

#[derive(Deserialize)]
struct InspectRequest {
    source: InspectSource,
    text: Option<String>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/events", get(events_handler))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/settings/tracking", post(add_tracking_parameter))
        .route(
            "/api/settings/tracking/json",
            get(get_tracking_json).put(put_tracking_json),
        )
        .route("/api/params", post(params))
        .route("/api/clean", post(clean))
        .route("/api/rebuild", post(rebuild))
        .route("/api/inspect", post(inspect))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config, store: SettingsStore) -> anyhow::Result<()> {
    let app = create_app(AppState { store });

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!("Settings service listening on {}", config.server_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<SettingsRecord> {
    Ok(Json(state.store.load().await?))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(record): Json<SettingsRecord>,
) -> ApiResult<SettingsRecord> {
    state.store.save(&record).await?;
    Ok(Json(record))
}

async fn add_tracking_parameter(
    State(state): State<AppState>,
    Json(req): Json<AddTrackingRequest>,
) -> ApiResult<TrackingResponse> {
    let tracking_parameters = state.store.add_and_save_tracking_parameter(&req.name).await?;
    Ok(Json(TrackingResponse { tracking_parameters }))
}

async fn get_tracking_json(State(state): State<AppState>) -> ApiResult<JsonView> {
    let record = state.store.load().await?;
    Ok(Json(JsonView {
        json: render_json_view(&record.tracking_parameters),
    }))
}

async fn put_tracking_json(
    State(state): State<AppState>,
    Json(view): Json<JsonView>,
) -> ApiResult<JsonView> {
    let list = parse_json_view(&view.json)?;
    let record = state.store.save_tracking_parameters(list).await?;
    Ok(Json(JsonView {
        json: render_json_view(&record.tracking_parameters),
    }))
}

async fn params(Json(req): Json<UrlRequest>) -> ApiResult<ParametersResponse> {
    Ok(Json(ParametersResponse {
        parameters: extract_parameters(&req.url),
    }))
}

async fn clean(
    State(state): State<AppState>,
    Json(req): Json<CleanRequest>,
) -> ApiResult<UrlParametersResponse> {
    let tracking = match req.tracking_parameters {
        Some(names) => TrackingParameterList::from_names(names),
        None => state.store.load().await?.tracking_parameters,
    };

    let parameters = remove_tracking_parameters(&req.url, tracking.as_slice());
    let url = generate_modified_url(&req.url, &parameters)?;
    Ok(Json(UrlParametersResponse { url, parameters }))
}

async fn rebuild(Json(req): Json<RebuildRequest>) -> ApiResult<UrlResponse> {
    let url = generate_modified_url(&req.url, &req.parameters)?;
    Ok(Json(UrlResponse { url }))
}

async fn inspect(Json(req): Json<InspectRequest>) -> ApiResult<UrlParametersResponse> {
    let url = match req.source {
        InspectSource::Tab => check_tab_url(req.text.as_deref())?,
        InspectSource::Clipboard => check_clipboard_text(req.text.as_deref().unwrap_or_default())?,
    };
    let parameters = extract_parameters(&url);
    Ok(Json(UrlParametersResponse { url, parameters }))
}

async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.store.subscribe();

    let stream = async_stream::stream! {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                // Missed notifications collapse into one reload signal.
                Err(RecvError::Lagged(_)) => SettingsEvent::SettingsUpdated,
                Err(RecvError::Closed) => break,
            };
            if let Ok(sse) = Event::default().event("settingsUpdated").json_data(event) {
                yield Ok(sse);
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new())
}

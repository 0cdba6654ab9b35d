use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use rtsp_mic_common::{
    Ack, Collaborators, Device, DeviceConfig, ErrorCode, MutationError, Request,
};

use crate::{
    broker::MqttBroker,
    platform::{HostAudio, HostClock, HostNetwork, HostSystem, JsonFileStore, SysfsTemperature},
};

const CREDENTIAL_HEADER: &str = "x-mic-token";
const LOG_DOWNLOAD_NAME: &str = "rtsp-mic-logs.txt";

struct HostConfig {
    port: u16,
    data_dir: PathBuf,
    credential: String,
    web_root: PathBuf,
    thermal_sensor: PathBuf,
    advertised_ip: Option<String>,
}

impl HostConfig {
    fn from_env() -> Self {
        Self {
            port: std::env::var("MIC_HTTP_PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(8080),
            data_dir: std::env::var("MIC_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./.rtsp-mic")),
            credential: std::env::var("MIC_MUTATION_TOKEN").unwrap_or_else(|_| "1".to_string()),
            web_root: std::env::var("MIC_WEB_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(format!("{}/web", env!("CARGO_MANIFEST_DIR")))),
            thermal_sensor: std::env::var("MIC_THERMAL_SENSOR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/sys/class/thermal/thermal_zone0/temp")),
            advertised_ip: std::env::var("MIC_ADVERTISED_IP").ok(),
        }
    }
}

#[derive(Clone)]
struct AppState {
    device: Arc<Mutex<Device>>,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = HostConfig::from_env();
    if config.credential == "1" {
        warn!("MIC_MUTATION_TOKEN not set; using the factory credential");
    }

    let collab = Collaborators {
        audio: Box::new(HostAudio::default()),
        network: Box::new(HostNetwork {
            address: config.advertised_ip.clone(),
        }),
        time: Box::new(HostClock),
        broker: Box::new(MqttBroker::spawn()),
        store: Box::new(JsonFileStore::new(config.data_dir.clone())),
        system: Box::new(HostSystem),
        temperature: Box::new(SysfsTemperature::new(config.thermal_sensor.clone())),
    };
    let device = Device::new(
        DeviceConfig::default(),
        collab,
        config.credential.clone(),
        monotonic_ms(),
    );

    let app_state = AppState {
        device: Arc::new(Mutex::new(device)),
    };
    spawn_control_loop(app_state.clone());

    let app = router(app_state, &config.web_root);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind device server at {addr}"))?;

    info!("device listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(app_state: AppState, web_root: &std::path::Path) -> Router {
    Router::new()
        .route("/api/status", get(handle_get_status))
        .route("/api/audio_status", get(handle_get_audio_status))
        .route("/api/perf_status", get(handle_get_perf_status))
        .route("/api/thermal", get(handle_get_thermal))
        .route("/api/thermal/clear", post(handle_thermal_clear))
        .route("/api/settings", get(handle_get_settings))
        .route("/api/logs", get(handle_get_logs))
        .route("/api/set", post(handle_set))
        .route("/api/action/{name}", post(handle_action))
        .fallback_service(ServeDir::new(web_root))
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("shutdown signal listener failed: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn spawn_control_loop(app_state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));

        loop {
            interval.tick().await;
            let now_ms = monotonic_ms();
            app_state.device.lock().await.tick(now_ms);
        }
    });
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let now_ms = monotonic_ms();
    let device = state.device.lock().await;
    Json(device.status_view(now_ms))
}

async fn handle_get_audio_status(State(state): State<AppState>) -> impl IntoResponse {
    let device = state.device.lock().await;
    Json(device.audio_view())
}

async fn handle_get_perf_status(State(state): State<AppState>) -> impl IntoResponse {
    let now_ms = monotonic_ms();
    let device = state.device.lock().await;
    Json(device.perf_view(now_ms))
}

async fn handle_get_thermal(State(state): State<AppState>) -> impl IntoResponse {
    let device = state.device.lock().await;
    Json(device.thermal_view())
}

async fn handle_get_settings(State(state): State<AppState>) -> impl IntoResponse {
    let device = state.device.lock().await;
    Json(device.settings_view())
}

async fn handle_get_logs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let text = { state.device.lock().await.logs().text() };
    let download = params
        .get("download")
        .is_some_and(|value| matches!(value.as_str(), "1" | "true"));
    logs_response(text, download)
}

async fn handle_set(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request = Request::Set {
        key: params.get("key").cloned(),
        value: params.get("value").cloned(),
    };
    mutate(&state, &headers, request).await
}

async fn handle_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    mutate(&state, &headers, Request::Action(name)).await
}

async fn handle_thermal_clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    mutate(&state, &headers, Request::Action("thermal_clear".to_string())).await
}

async fn mutate(state: &AppState, headers: &HeaderMap, request: Request) -> Response {
    let credential = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|value| value.to_str().ok());
    let now_ms = monotonic_ms();
    let result: Result<_, MutationError> = {
        let mut device = state.device.lock().await;
        device.handle(credential, &request, now_ms)
    };
    ack_response(result.into())
}

fn ack_response(ack: Ack) -> Response {
    (ack_status(ack.error), Json(ack)).into_response()
}

fn ack_status(error: Option<ErrorCode>) -> StatusCode {
    match error {
        None => StatusCode::OK,
        Some(ErrorCode::MissingKey | ErrorCode::InvalidValue) => StatusCode::BAD_REQUEST,
        Some(ErrorCode::UnknownKey) => StatusCode::NOT_FOUND,
        Some(ErrorCode::Forbidden) => StatusCode::FORBIDDEN,
        Some(ErrorCode::ThermalLatched) => StatusCode::CONFLICT,
    }
}

fn logs_response(text: String, download: bool) -> Response {
    let content_type = (header::CONTENT_TYPE, "text/plain; charset=utf-8");
    if download {
        let disposition = format!("attachment; filename=\"{LOG_DOWNLOAD_NAME}\"");
        ([content_type, (header::CONTENT_DISPOSITION, disposition.as_str())], text).into_response()
    } else {
        ([content_type], text).into_response()
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = include_str!("../web/index.html");
    const APP_JS: &str = include_str!("../web/app.js");

    #[test]
    fn rejections_map_to_http_status() {
        assert_eq!(ack_status(None), StatusCode::OK);
        assert_eq!(ack_status(Some(ErrorCode::MissingKey)), StatusCode::BAD_REQUEST);
        assert_eq!(ack_status(Some(ErrorCode::InvalidValue)), StatusCode::BAD_REQUEST);
        assert_eq!(ack_status(Some(ErrorCode::UnknownKey)), StatusCode::NOT_FOUND);
        assert_eq!(ack_status(Some(ErrorCode::Forbidden)), StatusCode::FORBIDDEN);
        assert_eq!(ack_status(Some(ErrorCode::ThermalLatched)), StatusCode::CONFLICT);
    }

    #[test]
    fn rejected_ack_keeps_its_body() {
        let ack: Ack = Err::<rtsp_mic_common::Outcome, _>(MutationError::Forbidden).into();
        let response = ack_response(ack);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn log_download_is_an_attachment() {
        let inline = logs_response("[00:00:01] boot\n".to_string(), false);
        assert!(inline.headers().get(header::CONTENT_DISPOSITION).is_none());
        assert_eq!(
            inline.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );

        let attachment = logs_response(String::new(), true);
        assert_eq!(
            attachment.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"rtsp-mic-logs.txt\""
        );
    }

    #[test]
    fn dashboard_carries_every_section_and_control() {
        assert!(INDEX_HTML.contains("<title>ESP32 RTSP Mic for BirdNET-Go</title>"));
        for id in [
            "t_status",
            "t_audio",
            "t_perf",
            "t_thermal",
            "t_advanced_settings",
            "t_logs",
            "in_rate",
            "in_gain",
            "sel_buf",
            "sel_hp",
            "in_hp_cutoff",
            "in_thr",
            "in_chk",
            "sel_tx",
            "sel_cpu",
            "sel_oh_enable",
            "sel_oh_limit",
            "btn_therm_clear",
            "b_disconnect",
            "lcon",
            "lplay",
            "heap",
        ] {
            assert!(INDEX_HTML.contains(&format!("id='{id}'")), "missing #{id}");
        }
    }

    #[test]
    fn dashboard_script_talks_to_every_endpoint() {
        for endpoint in [
            "/api/status",
            "/api/audio_status",
            "/api/perf_status",
            "/api/thermal",
            "/api/thermal/clear",
            "/api/logs",
            "/api/action/",
            "/api/set?key=",
        ] {
            assert!(APP_JS.contains(endpoint), "missing {endpoint}");
        }
        assert!(APP_JS.contains("const T={en:{"));
        assert!(APP_JS.contains(",cs:{"));
        assert!(APP_JS.contains("confirm_reboot"));
        assert!(APP_JS.contains("confirm_reset"));
        assert!(APP_JS.contains("X-Mic-Token"));
        assert!(APP_JS.contains("j.lastClientConnect"));
        assert!(APP_JS.contains("j.freeHeapKb"));
    }
}

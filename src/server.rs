use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::database::Database;
use crate::datatype::IncomingDatapoint;
use crate::error::Error;
use crate::interface::{FrameParams, QueryInterface, Rendered, SeriesParams};

pub struct AppState {
    pub interface: QueryInterface,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(db: Arc<Database>, api_token: Option<String>) -> Self {
        Self { interface: QueryInterface::new(db), api_token }
    }
}

/// Error as sent to clients: a status code and a JSON body with the error kind and payload.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

pub fn status_of(e: &Error) -> StatusCode {
    match e {
        Error::Query(q) if q.is_malformed() => StatusCode::BAD_REQUEST,
        Error::Query(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::MissingParameter(_) | Error::UnsupportedFormat { .. } | Error::Payload(_) => StatusCode::BAD_REQUEST,
        Error::Unauthorized => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let message = self.0.to_string();
        let mut body = match &self.0 {
            Error::Query(q) => serde_json::to_value(q).unwrap_or_else(|_| json!({})),
            Error::UnsupportedFormat { value, allowed } => json!({ "value": value, "allowed": allowed }),
            _ => json!({}),
        };
        if let Value::Object(map) = &mut body {
            map.insert("error".into(), self.0.kind().into());
            map.insert("message".into(), message.clone().into());
        }
        if status.is_server_error() {
            error!(%message, code = %status.as_u16(), "request failed");
        } else {
            warn!(%message, kind = self.0.kind(), code = %status.as_u16(), "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

type Reply = Result<Response, ApiError>;

fn csv_response(body: String) -> Response {
    // plain text so browsers show the table instead of downloading it
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn rendered_response(rendered: Rendered) -> Response {
    match rendered {
        Rendered::Csv(body) => csv_response(body),
        Rendered::Json(body) => json_response(body),
    }
}

// The query interface is synchronous, so it runs on the blocking pool.
async fn run<T, F>(state: &Arc<AppState>, route: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&QueryInterface) -> crate::Result<T> + Send + 'static,
{
    let started = Instant::now();
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || f(&state.interface))
        .await
        .map_err(|e| Error::Execution(e.to_string()))?;
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    if result.is_ok() {
        info!(route, ms, "request complete");
    }
    Ok(result?)
}

#[derive(Debug, Default, Deserialize)]
struct TokenParam {
    #[serde(rename = "API_TOKEN")]
    api_token: Option<String>,
}

fn authorise(state: &AppState, headers: &HeaderMap, query: &TokenParam) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Err(Error::Unauthorized.into());
    };
    let header_token = headers.get("api_token").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let offered = [query.api_token.as_deref(), header_token, bearer];
    if offered.iter().flatten().any(|token| *token == expected) {
        Ok(())
    } else {
        Err(Error::Unauthorized.into())
    }
}

async fn get_datapoints(State(state): State<Arc<AppState>>, Query(params): Query<SeriesParams>) -> Reply {
    let datapoints = run(&state, "datapoints", move |iface| iface.datapoints(&params)).await?;
    Ok(Json(datapoints).into_response())
}

async fn post_datapoints(
    State(state): State<Arc<AppState>>,
    Query(token): Query<TokenParam>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    authorise(&state, &headers, &token)?;
    let incoming: Vec<IncomingDatapoint> =
        serde_json::from_str(&body).map_err(|e| Error::Payload(e.to_string()))?;
    run(&state, "upload", move |iface| iface.upload(incoming)).await?;
    Ok(Json(json!({})).into_response())
}

async fn delete_datapoints(
    State(state): State<Arc<AppState>>,
    Query(token): Query<TokenParam>,
    Query(params): Query<SeriesParams>,
    headers: HeaderMap,
) -> Reply {
    authorise(&state, &headers, &token)?;
    let deleted = run(&state, "delete", move |iface| iface.delete(&params)).await?;
    Ok(Json(json!({ "deleted": deleted })).into_response())
}

async fn get_series(State(state): State<Arc<AppState>>, Query(params): Query<SeriesParams>) -> Reply {
    let rendered = run(&state, "series", move |iface| iface.series(&params)).await?;
    Ok(rendered_response(rendered))
}

async fn get_frame(State(state): State<Arc<AppState>>, Query(params): Query<FrameParams>) -> Reply {
    let csv = run(&state, "frame", move |iface| iface.frame(&params)).await?;
    Ok(csv_response(csv))
}

async fn get_frequencies(State(state): State<Arc<AppState>>) -> Reply {
    let frequencies = run(&state, "freq", |iface| iface.frequencies()).await?;
    Ok(Json(frequencies).into_response())
}

async fn get_all_names(State(state): State<Arc<AppState>>) -> Reply {
    let names = run(&state, "names", |iface| iface.names(None)).await?;
    Ok(Json(names).into_response())
}

async fn get_names(State(state): State<Arc<AppState>>, Path(freq): Path<String>) -> Reply {
    let names = run(&state, "names", move |iface| iface.names(Some(freq.as_str()))).await?;
    Ok(Json(names).into_response())
}

async fn get_info(State(state): State<Arc<AppState>>, Query(params): Query<SeriesParams>) -> Reply {
    let info = run(&state, "info", move |iface| iface.info(&params)).await?;
    Ok(Json(info).into_response())
}

async fn get_custom(
    State(state): State<Arc<AppState>>,
    Path((domain, varname, freq)): Path<(String, String, String)>,
) -> Reply {
    let rendered = run(&state, "custom", move |iface| iface.custom(&domain, &varname, &freq, "")).await?;
    Ok(rendered_response(rendered))
}

async fn get_custom_inner(
    State(state): State<Arc<AppState>>,
    Path((domain, varname, freq, inner_path)): Path<(String, String, String, String)>,
) -> Reply {
    let rendered = run(&state, "custom", move |iface| {
        iface.custom(&domain, &varname, &freq, &inner_path)
    })
    .await?;
    Ok(rendered_response(rendered))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route(
            "/api/datapoints",
            get(get_datapoints).post(post_datapoints).delete(delete_datapoints),
        )
        .route("/api/series", get(get_series))
        .route("/api/frame", get(get_frame))
        .route("/api/freq", get(get_frequencies))
        .route("/api/names", get(get_all_names))
        .route("/api/names/:freq", get(get_names))
        .route("/api/info", get(get_info))
        .route("/:domain/series/:varname/:freq", get(get_custom))
        .route("/:domain/series/:varname/:freq/*inner_path", get(get_custom_inner))
        .layer(cors)
        .with_state(state)
}

/// Opens the configured store and serves the API until the process is stopped.
pub async fn serve(settings: Settings) -> crate::Result<()> {
    let db = Arc::new(Database::new(settings.persistence_mode())?);
    if settings.api_token.is_none() {
        warn!("no api_token configured, write endpoints are disabled");
    }
    let app = router(Arc::new(AppState::new(db, settings.api_token.clone())));
    let address = settings.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| Error::Config(format!("cannot bind {address}: {e}")))?;
    info!(%address, "serving macroeconomic series");
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Execution(e.to_string()))
}

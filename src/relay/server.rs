//! Reference relay server.
//!
//! # Responsibilities
//! - Accept signed messages and reject those that do not verify
//! - Serve per-recipient listings and full records
//! - Move large payloads out of band and serve them by digest
//! - Wire up middleware (tracing, request ID, timeout, body limit)

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use axum::{
    body::Bytes as BodyBytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayServerConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::record::message::SignedMessage;
use crate::relay::store::MessageStore;
use crate::relay::types::{ErrorBody, ListOptions, RelayStatus, SendResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct RelayState {
    pub store: Arc<MessageStore>,
    pub public_url: String,
    pub embed_limit_bytes: usize,
    pub page_size: usize,
    pub max_page_size: usize,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    state: RelayState,
}

impl RelayServer {
    pub fn new(config: &RelayServerConfig) -> Self {
        let state = RelayState {
            store: Arc::new(MessageStore::new()),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            embed_limit_bytes: config.embed_limit_bytes,
            page_size: config.page_size,
            max_page_size: config.max_page_size,
        };
        let router = Self::build_router(config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayServerConfig, state: RelayState) -> Router {
        Router::new()
            .route("/", get(status_handler))
            .route("/messages", post(send_handler))
            .route("/messages/{address}", get(list_handler))
            .route("/messages/{address}/{hash}", get(fetch_handler))
            .route("/files/{digest}", get(file_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn store(&self) -> Arc<MessageStore> {
        self.state.store.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_url = %self.state.public_url,
            embed_limit_bytes = self.state.embed_limit_bytes,
            "Relay server starting"
        );

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("Relay server stopped");
        Ok(())
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn parse_address(value: &str) -> Result<Address, Response> {
    value
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, format!("invalid address: {}", value)))
}

fn parse_digest(value: &str) -> Result<B256, Response> {
    value
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, format!("invalid hash: {}", value)))
}

async fn status_handler(State(state): State<RelayState>) -> Json<RelayStatus> {
    Json(RelayStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        messages: state.store.len(),
    })
}

async fn send_handler(
    State(state): State<RelayState>,
    payload: Result<Json<SignedMessage>, JsonRejection>,
) -> Response {
    let Json(message) = match payload {
        Ok(json) => json,
        Err(rejection) => return error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let Some(recipient) = message.record.recipient() else {
        return error(StatusCode::BAD_REQUEST, "message has no recipient");
    };
    if !message.verify() {
        tracing::warn!(signer = %message.signer, "Rejected message with invalid signature");
        return error(StatusCode::BAD_REQUEST, "signature does not verify");
    }

    let content = message.record.content();
    let oversized = content.size() > state.embed_limit_bytes as u64;
    let message = match content.data() {
        Some(data) if oversized => {
            let digest = content.digest();
            state.store.put_file(digest, data.clone());
            let url = format!("{}/files/{}", state.public_url, digest);
            tracing::debug!(digest = %digest, size = data.len(), "Payload stored out of band");
            message.externalize(url)
        }
        _ => message,
    };

    let external = message.record.content().is_external();
    let hash = state.store.insert(recipient, message);
    metrics::record_relay_stored(external);

    tracing::info!(
        hash = %hash,
        recipient = %recipient,
        external = external,
        "Message stored"
    );
    (StatusCode::CREATED, Json(SendResponse { hash })).into_response()
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_handler(
    State(state): State<RelayState>,
    Path(address): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let recipient = match parse_address(&address) {
        Ok(recipient) => recipient,
        Err(response) => return response,
    };
    let options = ListOptions {
        limit: query
            .limit
            .unwrap_or(state.page_size)
            .min(state.max_page_size),
        offset: query.offset.unwrap_or(0),
    };
    Json(state.store.summaries(&recipient, options)).into_response()
}

async fn fetch_handler(
    State(state): State<RelayState>,
    Path((address, hash)): Path<(String, String)>,
) -> Response {
    let (recipient, hash) = match (parse_address(&address), parse_digest(&hash)) {
        (Ok(recipient), Ok(hash)) => (recipient, hash),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    match state.store.get(&recipient, &hash) {
        Some(message) => Json(message).into_response(),
        None => error(StatusCode::NOT_FOUND, "message not found"),
    }
}

async fn file_handler(State(state): State<RelayState>, Path(digest): Path<String>) -> Response {
    let digest = match parse_digest(&digest) {
        Ok(digest) => digest,
        Err(response) => return response,
    };
    match state.store.file(&digest) {
        Some(bytes) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            BodyBytes::from(bytes.to_vec()),
        )
            .into_response(),
        None => error(StatusCode::NOT_FOUND, "file not found"),
    }
}

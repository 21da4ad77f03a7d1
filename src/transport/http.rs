//! HTTP transport binding.
//!
//! Serves one or more JSON-RPC services over POST. The request URI path is
//! the lookup key into the service table, with `/foo` and `/foo/` resolving
//! to the same service. Anything but `application/json` is refused with 415,
//! a missing content length with 411, an unknown path with 404; dispatched
//! requests come back as 200 with the service's response string.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::protocol::jsonrpc::Service;

const MEDIA_TYPE: &str = "application/json";

type ServiceTable = Arc<HashMap<String, Arc<Service>>>;

/// Builds the router serving `services`, each at its URL path.
pub fn router(services: impl IntoIterator<Item = (String, Arc<Service>)>) -> Router {
    let table: HashMap<String, Arc<Service>> = services
        .into_iter()
        .map(|(path, service)| (path.trim_end_matches('/').to_string(), service))
        .collect();
    Router::new()
        .fallback(dispatch)
        .with_state(Arc::new(table))
}

async fn dispatch(
    State(table): State<ServiceTable>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let Some(service) = table.get(uri.path().trim_end_matches('/')) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim());
    if media_type != Some(MEDIA_TYPE) {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    if !headers.contains_key(header::CONTENT_LENGTH) {
        return StatusCode::LENGTH_REQUIRED.into_response();
    }
    let request = match std::str::from_utf8(&body) {
        Ok(request) => request,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    debug!("> {request}");
    let response = service.handle_request(request);
    debug!("< {response}");
    ([(header::CONTENT_TYPE, MEDIA_TYPE)], response).into_response()
}

/// Serves `services` on an already-bound listener.
pub async fn run(
    listener: TcpListener,
    services: impl IntoIterator<Item = (String, Arc<Service>)>,
) -> Result<(), TransportError> {
    axum::serve(listener, router(services))
        .await
        .map_err(|error| TransportError::Http(error.to_string()))
}

/// Binds `addr` and serves `services` forever.
pub async fn serve(
    addr: SocketAddr,
    services: impl IntoIterator<Item = (String, Arc<Service>)>,
) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "serving JSON-RPC over HTTP");
    run(listener, services).await
}

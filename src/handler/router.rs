//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for route matching,
//! method validation, dispatching and access logging.

use crate::config::AppState;
use crate::handler::{static_files, upload, view};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, Route};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{
    HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE, REFERER, SERVER, USER_AGENT,
};
use hyper::{HeaderMap, Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const READ_METHODS: &str = "GET, HEAD";
const WRITE_METHODS: &str = "POST";

/// Request context encapsulating header values the read handlers need
#[derive(Debug, Default)]
pub struct RequestContext {
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    pub fn from_parts(method: &Method, headers: &HeaderMap) -> Self {
        Self {
            is_head: *method == Method::HEAD,
            if_none_match: header_string(headers, IF_NONE_MATCH),
            if_modified_since: header_string(headers, IF_MODIFIED_SINCE),
            range_header: header_string(headers, RANGE),
        }
    }
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let started = Instant::now();
    let access_entry = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.referer = header_string(req.headers(), REFERER);
        entry.user_agent = header_string(req.headers(), USER_AGENT);
        entry
    });

    let mut response = route_request(req, &state).await;
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.elapsed = started.elapsed();
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

/// Route request based on path, then check the method for that route
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    // Match on the decoded path; ids are alphanumeric so decoded separators never match
    let route = urlencoding::decode(req.uri().path())
        .map_or(Route::NotFound, |path| routing::resolve(&path));
    let method = req.method().clone();
    let is_read = method == Method::GET || method == Method::HEAD;
    let ctx = RequestContext::from_parts(&method, req.headers());

    match route {
        Route::NotFound => http::build_404_response(),
        Route::Save if method == Method::POST => upload::save_upload(req, state).await,
        Route::Save => method_not_allowed(&method, WRITE_METHODS),
        _ if !is_read => method_not_allowed(&method, READ_METHODS),
        Route::UploadForm => upload::serve_form(&ctx, &state.templates),
        Route::View(id) => view::serve_view(&ctx, state, &id).await,
        Route::Asset(id) => static_files::serve_image(&ctx, &state.store, &id).await,
    }
}

fn method_not_allowed(method: &Method, allow: &str) -> Response<Full<Bytes>> {
    tracing::warn!("Method not allowed: {method}");
    http::build_405_response(allow)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

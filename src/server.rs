//! Static site server for the built web client.
//!
//! Files under the static root are served as-is. Unknown paths under the API
//! prefix get a JSON 404; every other unknown path gets `index.html` so the
//! client-side router can take over.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;

use crate::error::{Error, Result};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const INDEX_FILE: &str = "index.html";

/// Content type chosen from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => HTML_CONTENT_TYPE,
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => JSON_CONTENT_TYPE,
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Where a request path leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File {
        path: PathBuf,
        content_type: &'static str,
    },
    ApiNotFound,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
    api_prefix: String,
}

impl StaticSite {
    /// Fails when `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>, api_prefix: &str) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Server(format!(
                "could not find the build directory {}; build the client first",
                root.display()
            )));
        }
        Ok(Self {
            root,
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_api_path(&self, path: &str) -> bool {
        path.strip_prefix(self.api_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    pub fn resolve(&self, request_path: &str) -> Resolved {
        if let Some(relative) = asset_path(request_path) {
            let candidate = self.root.join(relative);
            if candidate.is_file() {
                return Resolved::File {
                    content_type: content_type_for(&candidate),
                    path: candidate,
                };
            }
        }
        if self.is_api_path(request_path) {
            return Resolved::ApiNotFound;
        }
        let index = self.root.join(INDEX_FILE);
        if index.is_file() {
            Resolved::File {
                path: index,
                content_type: HTML_CONTENT_TYPE,
            }
        } else {
            Resolved::NotFound
        }
    }

    async fn respond(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        if method != Method::GET && method != Method::HEAD {
            let mut response = json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }
        match self.resolve(path) {
            Resolved::File { path, content_type } => match tokio::fs::read(&path).await {
                Ok(contents) => body_response(StatusCode::OK, content_type, Bytes::from(contents)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read static file");
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Resolved::ApiNotFound => json_error(StatusCode::NOT_FOUND, "API route not found"),
            Resolved::NotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
        }
    }

    async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = self.respond(&method, &path).await;

        let status = response.status().as_u16();
        let duration_ms = started.elapsed().as_millis() as u64;
        if self.is_api_path(&path) {
            tracing::info!(%method, path = %path, status, duration_ms, "api request");
        } else {
            tracing::debug!(%method, path = %path, status, duration_ms, "request");
        }
        response
    }
}

/// Relative path under the static root, or `None` when the request cannot
/// name a servable file. Dot segments and hidden files never resolve.
fn asset_path(request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment.starts_with('.') || segment.contains(['\\', '\0', ':']) {
            return None;
        }
        relative.push(segment);
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

fn body_response(
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    body_response(status, JSON_CONTENT_TYPE, Bytes::from(body))
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|err| Error::Server(format!("failed to listen on {addr}: {err}")))
}

/// Accept connections until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, site: StaticSite, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let site = Arc::new(site);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let site = Arc::clone(&site);
                tokio::spawn(async move {
                    let service = service_fn(move |request| {
                        let site = Arc::clone(&site);
                        async move { Ok::<_, Infallible>(site.handle(request).await) }
                    });
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::debug!(%peer, error = %err, "connection ended with error");
                    }
                });
            }
            () = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

//! reqwest-backed transport

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{FetchError, Transport, WriteMethod};
use crate::config::ApiConfig;

/// EMFILE: the process ran out of file descriptors
const TOO_MANY_OPEN_FILES: i32 = 24;

/// Job board API client
pub struct HttpTransport {
    base_url: String,
    token: Option<String>,
    http: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport from API configuration, reading the token from the environment
    pub fn from_config(config: &ApiConfig) -> Result<Self, FetchError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "HttpTransport::from_config: called");
        Self::new(&config.base_url, config.token(), config.timeout())
    }

    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
            timeout,
        })
    }

    /// Whether requests carry an Authorization header
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "HttpTransport::request: called");
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Value, FetchError> {
        let response = builder.send().await.map_err(|e| self.classify(e))?;
        self.into_body(response).await
    }

    async fn into_body(&self, response: Response) -> Result<Value, FetchError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let message = server_message(&bytes);
            debug!(status = status.as_u16(), ?message, "HttpTransport::into_body: error status");
            return Err(FetchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            return FetchError::Timeout(self.timeout);
        }
        if err.is_decode() {
            return FetchError::InvalidResponse(err.to_string());
        }
        if exhausted(&err) {
            warn!(error = %err, "HttpTransport: out of local resources");
            return FetchError::ResourceExhausted(err.to_string());
        }
        FetchError::Network(err.to_string())
    }
}

/// Walk the source chain looking for descriptor or memory exhaustion
fn exhausted(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && (io.raw_os_error() == Some(TOO_MANY_OPEN_FILES) || io.kind() == std::io::ErrorKind::OutOfMemory)
        {
            return true;
        }
        source = e.source();
    }
    false
}

/// The API reports failures as `{ "message": "..." }`
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|m| !m.is_empty())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn read(&self, path: &str, cancel: CancellationToken) -> Result<Value, FetchError> {
        debug!(%path, "HttpTransport::read: called");
        let request = self.request(Method::GET, path);
        match cancel.run_until_cancelled(self.execute(request)).await {
            Some(result) => result,
            None => {
                debug!(%path, "HttpTransport::read: cancelled");
                Err(FetchError::Cancelled)
            }
        }
    }

    async fn write(&self, method: WriteMethod, path: &str, body: Option<Value>) -> Result<Value, FetchError> {
        debug!(?method, %path, "HttpTransport::write: called");
        let method = match method {
            WriteMethod::Post => Method::POST,
            WriteMethod::Put => Method::PUT,
            WriteMethod::Delete => Method::DELETE,
        };
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri, header};
    use axum::response::IntoResponse;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// What the server saw of the first request
    #[derive(Debug)]
    struct Captured {
        method: String,
        path: String,
        authorization: Option<String>,
    }

    type CaptureSlot = Arc<Mutex<Option<oneshot::Sender<Captured>>>>;

    /// Serve one canned JSON response and hand back what the request looked like
    async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<Captured>) {
        let (tx, rx) = oneshot::channel();
        let slot: CaptureSlot = Arc::new(Mutex::new(Some(tx)));
        let app = Router::new()
            .fallback(
                move |State(slot): State<CaptureSlot>, method: axum::http::Method, uri: Uri, headers: HeaderMap| async move {
                    let captured = Captured {
                        method: method.to_string(),
                        path: uri.path().to_string(),
                        authorization: headers
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                    };
                    if let Some(tx) = slot.lock().unwrap().take() {
                        let _ = tx.send(captured);
                    }
                    let status = StatusCode::from_u16(status).unwrap();
                    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
                },
            )
            .with_state(slot);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{}", addr), rx)
    }

    #[test]
    fn test_url_join() {
        let transport = HttpTransport::new("http://localhost:5000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url("/api/jobs"), "http://localhost:5000/api/jobs");
        assert_eq!(transport.url("api/jobs"), "http://localhost:5000/api/jobs");
        assert!(!transport.has_token());
    }

    #[test]
    fn test_server_message() {
        assert_eq!(
            server_message(br#"{"message":"Job not found"}"#).as_deref(),
            Some("Job not found")
        );
        assert_eq!(server_message(br#"{"errors":[{"msg":"Invalid"}]}"#), None);
        assert_eq!(server_message(b"<html>oops</html>"), None);
        assert_eq!(server_message(br#"{"message":""}"#), None);
    }

    #[tokio::test]
    async fn test_read_sends_bearer_and_decodes() {
        let (base, server) = serve_once(200, r#"{"jobs":[],"total":0}"#).await;
        let transport = HttpTransport::new(&base, Some("tok-1".to_string()), Duration::from_secs(5)).unwrap();

        let body = transport.read("/api/jobs", CancellationToken::new()).await.unwrap();
        assert_eq!(body["total"], 0);

        let seen = server.await.unwrap();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.path, "/api/jobs");
        assert_eq!(seen.authorization.as_deref(), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let (base, server) = serve_once(403, r#"{"message":"Not authorized"}"#).await;
        let transport = HttpTransport::new(&base, None, Duration::from_secs(5)).unwrap();

        let err = transport
            .read("/api/applications/user/u1", CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Http {
                status: 403,
                message: Some("Not authorized".to_string())
            }
        );

        let seen = server.await.unwrap();
        assert_eq!(seen.path, "/api/applications/user/u1");
        assert!(seen.authorization.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let transport = HttpTransport::new("http://127.0.0.1:9", None, Duration::from_secs(5)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport.read("/api/jobs", cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://{}", addr), None, Duration::from_secs(5)).unwrap();
        let err = transport.read("/api/jobs", CancellationToken::new()).await.unwrap_err();
        assert!(err.is_transient(), "expected transient error, got {:?}", err);
    }
}

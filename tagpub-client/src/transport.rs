//! HTTP transport seam.
//!
//! A transport only moves bytes: any HTTP status comes back as an
//! [`HttpResponse`], and only failures to get a response at all are errors.
//! Interpreting statuses is the job of the store and registry clients.

use std::io::Read;
use std::time::Duration;

use crate::error::ClientError;

/// Upper bound on response bodies read into memory.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Request body for a PUT.
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Json(&'a serde_json::Value),
    Bytes(&'a [u8]),
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.status, 404 | 410)
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// GET and PUT, nothing else.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, ClientError>;
    fn put(&self, url: &str, body: Body<'_>) -> Result<HttpResponse, ClientError>;
}

/// [`Transport`] over blocking `ureq`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("tagpub/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        finish("GET", url, self.agent.get(url).call())
    }

    fn put(&self, url: &str, body: Body<'_>) -> Result<HttpResponse, ClientError> {
        let request = self.agent.put(url);
        let result = match body {
            Body::Json(value) => request.send_json(value),
            Body::Bytes(bytes) => request
                .set("Content-Type", "application/octet-stream")
                .send_bytes(bytes),
        };
        finish("PUT", url, result)
    }
}

fn finish(
    method: &'static str,
    url: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<HttpResponse, ClientError> {
    let response = match result {
        Ok(response) => response,
        // ureq reports 4xx/5xx as errors; here they are ordinary responses.
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => {
            return Err(ClientError::Transport {
                method,
                url: url.to_string(),
                message: transport.to_string(),
            })
        }
    };

    let status = response.status();
    let mut body = Vec::new();
    response
        .into_reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut body)
        .map_err(|e| ClientError::Transport {
            method,
            url: url.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;
    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(404, Vec::new()).is_success());
        assert!(HttpResponse::new(410, Vec::new()).is_not_found());
        assert_eq!(HttpResponse::new(200, "ok").text(), "ok");
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let transport = UreqTransport::new(Duration::from_millis(200));
        let err = transport.get("http://127.0.0.1:1/widget").unwrap_err();
        assert!(matches!(err, ClientError::Transport { method: "GET", .. }));
    }
}

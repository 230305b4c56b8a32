//! Request forwarding to the backend services over `reqwest`.

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Response};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::GatewayError;
use crate::observability::{REQUESTS_TOTAL, REQUEST_DURATION, UPSTREAM_ERRORS_TOTAL};
use crate::routing::Target;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// `application/json` or any `+json` media type.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Parse a JSON request body. Empty or non-JSON bodies yield `None`.
pub fn parse_json_body(headers: &HeaderMap, raw: &Bytes) -> Result<Option<Value>, GatewayError> {
    if raw.is_empty() || !is_json(headers) {
        return Ok(None);
    }
    serde_json::from_slice(raw).map(Some).map_err(|e| {
        debug!(error = %e, "rejecting malformed json body");
        GatewayError::InvalidJson
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForwardBody {
    Empty,
    Json(Value),
    Raw(Bytes),
}

impl ForwardBody {
    /// Non-empty JSON objects/arrays sent with POST, PUT or PATCH are
    /// re-serialized; everything else travels as received.
    pub fn select(method: &Method, parsed: Option<Value>, raw: Bytes) -> Self {
        let writes = matches!(*method, Method::POST | Method::PUT | Method::PATCH);
        match parsed {
            Some(v) if writes && has_content(&v) => ForwardBody::Json(v),
            _ if raw.is_empty() => ForwardBody::Empty,
            _ => ForwardBody::Raw(raw),
        }
    }
}

fn has_content(v: &Value) -> bool {
    match v {
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => false,
    }
}

#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Client that relays redirects instead of following them.
    pub fn build(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::new(client, timeout))
    }

    /// Send the request to `{base}{path_and_query}` and relay the answer.
    #[instrument(skip(self, target, base, headers, body), fields(target = target.name()))]
    pub async fn forward(
        &self,
        target: Target,
        base: &str,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: ForwardBody,
    ) -> Result<Response<Body>, GatewayError> {
        let url = format!("{}{}", base.trim_end_matches('/'), path_and_query);

        let mut out = HeaderMap::new();
        for (name, value) in headers {
            if !is_hop_by_hop(name) && name != HOST && name != CONTENT_LENGTH {
                out.append(name.clone(), value.clone());
            }
        }

        let mut req = self.client.request(method, &url).timeout(self.timeout);
        match body {
            ForwardBody::Empty => {}
            ForwardBody::Json(v) => {
                let bytes = serde_json::to_vec(&v).map_err(|e| GatewayError::Internal(e.to_string()))?;
                out.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                req = req.body(bytes);
            }
            ForwardBody::Raw(bytes) => req = req.body(bytes),
        }
        let req = req.headers(out);

        REQUESTS_TOTAL.with_label_values(&[target.name()]).inc();
        let started = Instant::now();
        let resp = req.send().await.map_err(|e| upstream_error(target, &url, e))?;
        let status = resp.status();
        let upstream_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|e| upstream_error(target, &url, e))?;
        let elapsed = started.elapsed();
        REQUEST_DURATION.with_label_values(&[target.name()]).observe(elapsed.as_secs_f64());
        debug!(%url, status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, "forwarded");

        let mut builder = Response::builder().status(status);
        if let Some(h) = builder.headers_mut() {
            for (name, value) in upstream_headers.iter() {
                if !is_hop_by_hop(name) && name != CONTENT_LENGTH {
                    h.append(name.clone(), value.clone());
                }
            }
        }
        builder.body(Body::from(bytes)).map_err(|e| GatewayError::Internal(e.to_string()))
    }
}

fn upstream_error(target: Target, url: &str, e: reqwest::Error) -> GatewayError {
    let err = if e.is_timeout() {
        GatewayError::UpstreamTimeout { target }
    } else {
        GatewayError::UpstreamUnreachable { target }
    };
    let kind = if e.is_timeout() { "timeout" } else { "unreachable" };
    UPSTREAM_ERRORS_TOTAL.with_label_values(&[target.name(), kind]).inc();
    warn!(service = "gateway", event = "upstream_error", target = target.name(), %url, kind, error = %e);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        h
    }

    #[test]
    fn json_detection_ignores_parameters() {
        assert!(is_json(&json_headers()));
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        assert!(is_json(&h));
        h.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&h));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_json_body(&json_headers(), &Bytes::from_static(b"{oops")).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidJson));
        assert_eq!(parse_json_body(&HeaderMap::new(), &Bytes::from_static(b"{oops")).unwrap(), None);
    }

    #[test]
    fn body_selection() {
        let raw = Bytes::from_static(br#"{"a":1}"#);
        assert_eq!(
            ForwardBody::select(&Method::POST, Some(json!({"a": 1})), raw.clone()),
            ForwardBody::Json(json!({"a": 1}))
        );
        assert_eq!(ForwardBody::select(&Method::GET, Some(json!({"a": 1})), raw.clone()), ForwardBody::Raw(raw));
        let empty_obj = Bytes::from_static(b"{}");
        assert_eq!(ForwardBody::select(&Method::PUT, Some(json!({})), empty_obj.clone()), ForwardBody::Raw(empty_obj));
        assert_eq!(ForwardBody::select(&Method::GET, None, Bytes::new()), ForwardBody::Empty);
    }
}

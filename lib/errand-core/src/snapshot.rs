//! Diagnostic snapshots of a request and its response.
//!
//! Snapshots are captured when a failure is recorded and rendered as
//! indented JSON inside the error message. They are a debugging aid, not a
//! stable wire format.

use std::collections::BTreeMap;
use std::fmt;

use http::HeaderMap;
use serde::Serialize;

use crate::{Method, RequestParts, ResponseParts};

/// What the request looked like when the failure was recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    /// Target URL (the raw path when it never parsed).
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Body as text.
    pub data: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
}

impl RequestSnapshot {
    /// Snapshot of assembled request parts.
    #[must_use]
    pub fn of(parts: &RequestParts) -> Self {
        Self {
            url: parts.url().to_string(),
            method: parts.method().to_string(),
            data: String::from_utf8_lossy(parts.body()).into_owned(),
            headers: flatten_headers(parts.headers()),
        }
    }

    /// Snapshot of a request that could not be constructed.
    #[must_use]
    pub fn unbuilt(method: Method, path: &str) -> Self {
        Self {
            url: path.to_string(),
            method: method.to_string(),
            ..Self::default()
        }
    }
}

/// What the response looked like when the failure was recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    /// Status code, `0` when no response was received.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Body as text, as far as it could be read.
    pub body: String,
    /// Declared content length.
    pub content_length: Option<u64>,
}

impl ResponseSnapshot {
    /// Snapshot of response parts.
    ///
    /// Whatever is left of the body stream is drained so it shows up in the
    /// snapshot; read errors only truncate the captured text.
    #[must_use]
    pub fn capture(parts: &mut ResponseParts) -> Self {
        let body = parts.body_mut().drain_lossy();
        Self {
            status_code: parts.status(),
            headers: flatten_headers(parts.headers()),
            body: String::from_utf8_lossy(&body).into_owned(),
            content_length: parts.content_length(),
        }
    }
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::<String, String>::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}

fn render(value: &impl Serialize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let json = serde_json::to_string_pretty(value).unwrap_or_default();
    f.write_str(&json)
}

impl fmt::Display for RequestSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

impl fmt::Display for ResponseSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::header::{ACCEPT, SET_COOKIE};

    use super::*;
    use crate::Body;

    #[test]
    fn request_snapshot_renders_indented_json() {
        let mut parts = RequestParts::new(
            Method::Post,
            url::Url::parse("https://api.example.com/users").expect("url"),
        );
        parts
            .headers_mut()
            .insert(ACCEPT, "application/json".parse().expect("value"));
        parts.set_body(Bytes::from_static(b"{\"name\":\"x\"}"));

        let rendered = RequestSnapshot::of(&parts).to_string();
        assert!(rendered.contains("\n  \"url\": \"https://api.example.com/users\""));
        assert!(rendered.contains("\"method\": \"POST\""));
        assert!(rendered.contains("\"accept\": \"application/json\""));
        assert!(rendered.contains(r#""data": "{\"name\":\"x\"}""#));
    }

    #[test]
    fn unbuilt_snapshot_keeps_raw_path() {
        let snapshot = RequestSnapshot::unbuilt(Method::Get, "http://[oops");
        assert_eq!(snapshot.url, "http://[oops");
        assert_eq!(snapshot.method, "GET");
        assert!(snapshot.headers.is_empty());
    }

    #[test]
    fn response_snapshot_drains_remaining_body() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, "a=1".parse().expect("value"));
        headers.append(SET_COOKIE, "b=2".parse().expect("value"));
        let mut parts = ResponseParts::new(404, headers, Body::from_bytes("not here"), Some(8));

        let snapshot = ResponseSnapshot::capture(&mut parts);
        assert_eq!(snapshot.status_code, 404);
        assert_eq!(snapshot.body, "not here");
        assert_eq!(snapshot.headers.get("set-cookie").map(String::as_str), Some("a=1, b=2"));

        let rendered = snapshot.to_string();
        assert!(rendered.contains("\"statusCode\": 404"));
        assert!(rendered.contains("\"contentLength\": 8"));
    }
}

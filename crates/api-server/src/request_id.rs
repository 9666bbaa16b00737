use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID that is echoed back and logged.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Caller-supplied `X-Request-Id` (e.g. from a reverse proxy) when it is
/// short printable ASCII, otherwise a fresh UUID v4.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| {
            !s.is_empty()
                && s.len() <= MAX_REQUEST_ID_LEN
                && s.bytes().all(|b| b.is_ascii_graphic())
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Records the request ID on the current `http_request` span and echoes it
/// on the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = resolve_request_id(request.headers());
    tracing::Span::current().record("request_id", id.as_str());

    let mut response = next.run(request).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_reuses_caller_id() {
        assert_eq!(resolve_request_id(&headers_with("abc-123")), "abc-123");
    }

    #[test]
    fn test_generates_uuid_when_absent_or_unusable() {
        let generated = resolve_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());

        let too_long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        for bad in ["", "has space", too_long.as_str()] {
            let id = resolve_request_id(&headers_with(bad));
            assert!(Uuid::parse_str(&id).is_ok(), "kept {bad:?}");
        }
    }
}

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

/// Settings for [`security_headers_middleware`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaders {
    /// Emit HSTS; only meaningful behind TLS termination
    pub enable_hsts: bool,
}

/// Adds OWASP-recommended security headers to every response.
pub async fn security_headers_middleware(
    State(settings): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    // Swagger UI needs scripts and styles; everything else is pure JSON
    let is_docs = request.uri().path().starts_with("/docs");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("0"));
    if !is_docs {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
    }
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // Risk scores are per-student data
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    if settings.enable_hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    response
}

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::Response,
};

fn baseline() -> [(HeaderName, &'static str); 3] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "no-referrer"),
        (
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains",
        ),
    ]
}

fn api_policy() -> [(HeaderName, &'static str); 2] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            "default-src 'none'; frame-ancestors 'none'",
        ),
        (header::X_FRAME_OPTIONS, "DENY"),
    ]
}

// Swagger UI loads inline scripts and styles.
fn docs_policy() -> [(HeaderName, &'static str); 2] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'",
        ),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteClass {
    Docs,
    Credentials,
    Api,
}

fn classify(path: &str) -> RouteClass {
    if path.starts_with("/docs") || path.starts_with("/api-docs") {
        RouteClass::Docs
    } else if path.starts_with("/api/auth") {
        RouteClass::Credentials
    } else {
        RouteClass::Api
    }
}

/// Hardening headers for every response. Responses from the auth routes
/// carry credentials and are never cached.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let class = classify(req.uri().path());

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    let policy = match class {
        RouteClass::Docs => docs_policy(),
        _ => api_policy(),
    };
    for (name, value) in baseline().into_iter().chain(policy) {
        headers.insert(name, HeaderValue::from_static(value));
    }
    if class == RouteClass::Credentials {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .route("/api/auth/login", get(|| async { "session" }))
            .route("/docs", get(|| async { "ui" }))
            .layer(from_fn(security_headers_middleware))
    }

    async fn headers_for(uri: &str) -> axum::http::HeaderMap {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app().oneshot(req).await.unwrap().headers().clone()
    }

    #[test]
    fn routes_are_classified_by_prefix() {
        assert_eq!(classify("/docs/index.html"), RouteClass::Docs);
        assert_eq!(classify("/api-docs/openapi.json"), RouteClass::Docs);
        assert_eq!(classify("/api/auth/refresh-token"), RouteClass::Credentials);
        assert_eq!(classify("/api/crm/leads"), RouteClass::Api);
    }

    #[tokio::test]
    async fn api_routes_deny_framing() {
        let headers = headers_for("/api/health").await;
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn credential_responses_are_not_cached() {
        let headers = headers_for("/api/auth/login").await;
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }

    #[tokio::test]
    async fn docs_route_allows_same_origin_framing() {
        let headers = headers_for("/docs").await;
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get(header::REFERRER_POLICY).unwrap(), "no-referrer");
    }
}

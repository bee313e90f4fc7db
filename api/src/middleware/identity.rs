use axum::{http::Request, middleware::Next, response::Response};

/// Identity of the acting user, as asserted by the fronting reverse proxy.
/// There is no credential check here; authentication happens upstream.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub name: Option<String>,
}

/// Copy the proxy-supplied identity headers into request extensions so
/// handlers can log who performed a mutation
#[tracing::instrument(skip_all)]
pub async fn identity_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    // Scope the borrowing closure so the future's auto-trait bounds
    // can be proven for `from_fn`
    let (email, name) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };

        let email = header("X-User-Email")
            .or_else(|| header("X-Forwarded-Email"))
            .unwrap_or_else(|| "local@anonymous".to_string());
        let name = header("X-User-Name");
        (email, name)
    };

    req.extensions_mut().insert(Identity { email, name });

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::HeaderValue;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(identity): Extension<Identity>) -> String {
        format!("{}|{}", identity.email, identity.name.unwrap_or_default())
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn(identity_middleware))
    }

    #[tokio::test]
    async fn test_identity_from_headers() {
        let mut req = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        req.headers_mut()
            .insert("X-User-Email", HeaderValue::from_static("ops@example.com"));
        req.headers_mut()
            .insert("X-User-Name", HeaderValue::from_static("Ops Person"));

        let res = app().oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ops@example.com|Ops Person");
    }

    #[tokio::test]
    async fn test_identity_falls_back_to_forwarded_email() {
        let mut req = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        req.headers_mut().insert(
            "X-Forwarded-Email",
            HeaderValue::from_static("proxy@example.com"),
        );

        let res = app().oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"proxy@example.com|");
    }

    #[tokio::test]
    async fn test_identity_defaults_to_anonymous() {
        let req = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let res = app().oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"local@anonymous|");
    }
}

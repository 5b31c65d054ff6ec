//! HTTP host for the user server: owns the listener, the liveness probe,
//! the OpenAPI document route and the middleware stack wrapped around the
//! module routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
pub mod envelope;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
pub use envelope::Envelope;

pub struct ApiIngress {
    config: ApiIngressConfig,
    openapi: Option<Arc<String>>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            openapi: None,
        }
    }

    /// Serve `doc` at `/api/openapi.json`. Serialized once here.
    pub fn with_openapi(mut self, doc: &utoipa::openapi::OpenApi) -> Result<Self> {
        let json = doc.to_json().context("serialize OpenAPI document")?;
        self.openapi = Some(Arc::new(json));
        Ok(self)
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Wrap module routes with the probe, fallback and middleware stack.
    pub fn build_router(&self, routes: Router) -> Router {
        let mut router = Router::new()
            .route("/api/check", get(web::check))
            .merge(routes);
        if let Some(doc) = &self.openapi {
            let doc = doc.clone();
            router = router.route(
                "/api/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move { web::openapi_json(doc) }
                }),
            );
        }
        router = router.fallback(web::not_found);

        // Each `layer` wraps everything added before it, so the list below
        // runs innermost first:
        // BodyLimit -> Timeout -> error envelope -> no-cache -> CORS -> push request_id -> Trace -> Propagate -> SetRequestId
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        router = router.layer(TimeoutLayer::new(self.config.request_timeout));
        router = router.layer(from_fn(web::envelope_errors));
        router = router
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("0"),
            ));
        if self.config.cors_enabled {
            router = router.layer(cors_layer());
        }
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(request_id::make_span)
                .on_response(request_id::record_response),
        );
        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        router
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(&self, addr: &str, router: Router, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid bind address '{addr}'"))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        serve_with_listener(listener, router, cancel).await
    }
}

/// Serve on an already bound listener; returns after in-flight requests drain.
pub async fn serve_with_listener(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Any origin (mirrored, so credentials are allowed) with a fixed header allow-list.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::PATCH,
            Method::PUT,
            Method::POST,
            Method::HEAD,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
}

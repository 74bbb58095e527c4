//! Server Implementation
//!
//! HTTP 服务器启动和管理

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::require_auth;
use crate::core::{BackgroundTasks, Config, Result, ServerState, TaskKind};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// How often idle live topics are dropped
const LIVE_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(api::health::router())
        .merge(api::orders::router())
        .merge(api::customer_orders::router())
        .merge(api::kitchen::router())
        .merge(api::notifications::router())
        .merge(api::payments::router())
        .merge(api::live::router())
}

/// Routes plus the middleware stack, with state attached
pub fn build_app(state: &ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // 认证 - 在路由之前注入 Actor
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state.clone())
}

/// HTTP Server
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<()> {
        let (state, job_rx) = ServerState::initialize(&self.config).await?;

        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();
        tasks.spawn(
            "notification_worker",
            TaskKind::Worker,
            state.notification_worker().run(job_rx, shutdown.clone()),
        );
        tasks.spawn(
            "live_topic_prune",
            TaskKind::Periodic,
            prune_live_topics(state.clone(), shutdown.clone()),
        );
        tasks.log_summary();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            "🚀 Order server listening on http://{} ({})",
            addr,
            self.config.environment
        );

        let app = build_app(&state);
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        tasks.shutdown().await;
        served?;

        tracing::info!("✅ Server shutdown complete");
        Ok(())
    }
}

async fn prune_live_topics(state: ServerState, shutdown: tokio_util::sync::CancellationToken) {
    let mut interval = tokio::time::interval(LIVE_PRUNE_INTERVAL);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => state.live.prune(),
        }
    }
}

/// Graceful shutdown handler
///
/// Listens for SIGTERM (containers) and Ctrl+C signals
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

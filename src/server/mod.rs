mod error;
mod handlers;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::agent::{MessageRouter, SessionStore};
use crate::config::Config;

pub use error::ApiError;
pub use handlers::{chat_handler, health_handler, HealthResponse};

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<MessageRouter>,
}

impl AppState {
    pub fn new(router: MessageRouter) -> Self {
        AppState {
            router: Arc::new(router),
        }
    }
}

/// 组装路由：API、首页与静态资源
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 后台定期清理空闲会话
pub fn spawn_session_sweeper(
    store: Arc<SessionStore>,
    max_idle: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.purge_idle(max_idle);
        }
    })
}

pub async fn run_server(config: Config) -> Result<()> {
    let store = Arc::new(SessionStore::new(&config.session));
    let router = MessageRouter::from_config(&config, Arc::clone(&store))
        .context("初始化消息路由失败")?;

    let sweeper = config.session.idle_ttl().map(|ttl| {
        let every = Duration::from_secs(config.session.sweep_interval_secs.max(1));
        spawn_session_sweeper(Arc::clone(&store), ttl, every)
    });

    let app = build_router(AppState::new(router), &config.server.static_dir);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("无效的监听地址：{}:{}", config.server.host, config.server.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定 {} 失败", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Server shutting down signal received");
        })
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    Ok(())
}

//! 应用装配：路由、鉴权门、CORS、请求追踪与监听。

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use bookshelf_protocol::AUTH_TOKEN_HEADER;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    auth::{gate::require_token, handlers::login_handler},
    books::{
        create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
        update_book_handler,
    },
    config::Config,
    state::AppState,
    users::{
        create_user_handler, delete_user_handler, get_user_handler, list_users_handler,
        update_user_handler,
    },
};

/// 服务入口：装配状态并启动 HTTP 监听，Ctrl-C 时优雅退出。
pub(crate) async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    info!(
        storage = state.storage.backend_name(),
        token_ttl_sec = state.tokens.ttl_sec(),
        bcrypt_cost = state.hasher.cost(),
        "state ready"
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("bind {} failed", config.listen_addr))?;
    info!("bookshelf-api listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("bookshelf-api stopped");
    Ok(())
}

/// 构建完整路由：`/api/auth` 与 `/healthz` 公开，其余全部经过鉴权门。
pub(crate) fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(AUTH_TOKEN_HEADER)]);

    let protected = Router::new()
        .route(
            "/api/books",
            get(list_books_handler).post(create_book_handler),
        )
        .route(
            "/api/books/{id}",
            get(get_book_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .route(
            "/api/users",
            get(list_users_handler).post(create_user_handler),
        )
        .route(
            "/api/users/{username}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth", post(login_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 健康检查接口。
async fn healthz() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("install ctrl-c handler failed: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

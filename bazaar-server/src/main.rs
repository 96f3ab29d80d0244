use bazaar_server::{AppState, Config};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置并初始化日志
    let config = Config::from_env();
    bazaar_server::init_logger_with_file(config.log_level.as_deref(), config.log_dir.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Bazaar server starting..."
    );

    // 3. 初始化状态 (store + 协作方客户端 + services)
    let state = AppState::initialize(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {e}"))?;

    // 4. 启动 HTTP 服务
    let app = bazaar_server::api::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

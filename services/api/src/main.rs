//! bookshelf-api 二进制入口：CLI 分发、日志初始化、加载配置后启动服务。

mod api;
mod app;
mod auth;
mod books;
mod cli;
mod config;
mod logging;
mod state;
mod storage;
mod users;

#[tokio::main]
/// 启动 bookshelf-api 服务。
async fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    match cli::dispatch(&args)? {
        cli::CliDispatch::Run => {}
        cli::CliDispatch::Exit => return Ok(()),
    }

    let _log_runtime = logging::init("bookshelf-api")?;
    let config = config::Config::load()?;
    if let Some(path) = &config.source {
        tracing::info!("config loaded from {}", path.display());
    } else {
        tracing::info!("no config file found; using defaults and environment");
    }
    app::run(config).await
}

// src/main.rs

use axum::{Router, routing::get, serve};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use promoter::allocation::engine::AllocationEngine;
use promoter::api::handlers::handle_allocate;
use promoter::config::config_manager::{ConfigManager, DEFAULT_FALLBACK_CAMPAIGN};
use promoter::logging::runtime_logger::{RuntimeLogger, RuntimeLoggerOptions};
use promoter::model::adapters::FileRepository;
use promoter::AppState;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "Weighted ad allocation server for wiki campaigns")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// 广告和活动数据文件
    #[arg(long, default_value = "static/promoter.json")]
    data_file: PathBuf,
    /// 请求的活动不可用时使用的回退活动
    #[arg(long, env = "PROMOTER_FALLBACK_CAMPAIGN", default_value = DEFAULT_FALLBACK_CAMPAIGN)]
    fallback_campaign: String,
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let log_file = rolling::hourly(&args.log_dir, "promoter_log.json");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global tracing subscriber: {}", e);
        std::process::exit(1);
    }
    info!("Promoter server starting on port {}", args.port);

    // 运行日志记录器（服务运行状态、每次分配结果）
    let runtime_logger = RuntimeLogger::new(&args.log_dir, "runtime", RuntimeLoggerOptions::default());
    runtime_logger.log("INFO", "Promoter server is starting...").await;

    let config = match ConfigManager::new(&args.fallback_campaign, args.data_file.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            runtime_logger.log("ERROR", &format!("Invalid configuration: {}", e)).await;
            runtime_logger.shutdown().await;
            std::process::exit(1);
        }
    };

    let store = match FileRepository::from_file(&config.data_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Unable to load {}: {}", config.data_file.display(), e);
            runtime_logger.log("ERROR", &format!("Unable to load data file: {}", e)).await;
            runtime_logger.shutdown().await;
            std::process::exit(1);
        }
    };
    info!(
        "Loaded {} ads and {} active campaigns, fallback campaign `{}`",
        store.ad_count(),
        store.campaign_names(false).len(),
        config.fallback_campaign
    );

    let state = Arc::new(AppState {
        runtime_logger: runtime_logger.clone(),
        engine: Arc::new(AllocationEngine::new(store, &config)),
    });

    let app = Router::new()
        .route("/allocate", get(handle_allocate))
        .with_state(state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Unable to bind {}: {}", addr, e);
            runtime_logger.shutdown().await;
            std::process::exit(1);
        }
    };
    runtime_logger.log("INFO", &format!("Promoter server running at http://{}", addr)).await;

    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {}", e);
    }

    runtime_logger.log("INFO", "Promoter server shut down.").await;
    runtime_logger.shutdown().await;
}

//! chirp 主入口

use chirp::{
    clock::SystemClock,
    config::{AppConfig, StorageBackend},
    db,
    middleware::AppState,
    repository::{MemoryStore, PgStore, Store},
    routes,
    services::OwnershipPolicy,
    telemetry,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("chirp {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（仅开发环境）
    if std::env::var("CHIRP_ENVIRONMENT").as_deref() != Ok("production") {
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chirp starting...");

    // 3. 存储后端
    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database initialized");
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory storage backend; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    // 4. 构建应用状态
    let app_state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::new(SystemClock),
        Arc::new(OwnershipPolicy),
    )?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭，超时后强制退出
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });

    let grace = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server.into_future() => result?,
        _ = deadline => tracing::warn!("Graceful shutdown timeout reached, forcing exit"),
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
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
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("chirp {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: chirp [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量 (前缀 CHIRP_，层级分隔符 __):");
    println!("  CHIRP_ENVIRONMENT                      development | production");
    println!("  CHIRP_SERVER__ADDR                     监听地址 (默认 0.0.0.0:8080)");
    println!("  CHIRP_DATABASE__BACKEND                postgres | memory");
    println!("  CHIRP_DATABASE__URL                    PostgreSQL 连接串");
    println!("  CHIRP_SECURITY__JWT_SECRET             签名密钥 (至少 32 字符)");
    println!("  CHIRP_SECURITY__ALLOW_INSECURE_DEV_SECRET  开发环境允许内置密钥");
    println!("  CHIRP_LOGGING__LEVEL / CHIRP_LOGGING__FORMAT");
}

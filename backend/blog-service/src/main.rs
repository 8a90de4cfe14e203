use actix_web::{web, App, HttpServer};
use blog_service::config::Config;
use blog_service::media::MediaStore;
use blog_service::middleware::{MetricsMiddleware, SessionAuth};
use blog_service::templates::Templates;
use blog_service::{cli, db, routes, AppState};
use crypto_core::jwt;
use db_pool::{create_pool, DbConfig};
use std::io;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Blog Service
///
/// Server-rendered blog pages over PostgreSQL.
///
/// # Routes
///
/// - `/`, `/posts/*`, `/category/*`, `/profile/*`, `/edit_profile/` - blog pages
/// - `/auth/*` - login, logout, registration
/// - `/admin/*` - staff screens
/// - `/media/*` - uploaded post images
/// - `/health`, `/health/live`, `/metrics` - operations
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if cli::handle_cli_commands(&config).await? {
        return Ok(());
    }

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    match (&config.auth.jwt_private_key_pem, &config.auth.jwt_public_key_pem) {
        (Some(private_pem), Some(public_pem)) => {
            jwt::initialize_jwt_keys(private_pem, public_pem).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize JWT keys: {err}"),
                )
            })?;
        }
        _ => {
            tracing::warn!("JWT keys not configured; logins will fail and every visitor is anonymous");
        }
    }

    let mut db_cfg = DbConfig::for_service("blog-service", &config.database.url);
    db_cfg.max_connections = std::cmp::max(db_cfg.max_connections, config.database.max_connections);
    db_cfg.log_config();

    let pool = match create_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    db::run_migrations(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;
    tracing::info!("Database migrations applied");

    let media = MediaStore::new(&config.media);
    tokio::fs::create_dir_all(media.root()).await?;

    let templates = Templates::load(&config.template_dir, &config.media.url_prefix)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;

    let state = web::Data::new(AppState {
        pool: pool.clone(),
        templates,
        media: media.clone(),
        auth: config.auth.clone(),
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cookie_name = config.auth.session_cookie_name.clone();
    let upload_limit = config.media.max_upload_bytes + 1024 * 1024;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::FormConfig::default().limit(upload_limit))
            .wrap(SessionAuth::new(&cookie_name))
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .service(routes::media_files(media.url_prefix(), media.root()))
            .configure(routes::configure)
    })
    .workers(config.app.workers)
    .disable_signals()
    .bind(&bind_address)?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;
    pool.close().await;
    tracing::info!("blog-service stopped");
    Ok(())
}

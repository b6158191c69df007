use axum::extract::DefaultBodyLimit;
use http::{HeaderValue, Method, header};
use perf_monitor::{
    config::Config,
    infrastructure::monitoring::MonitoringService,
    presentation::http::{routes::create_router, state::AppState},
    workers::{metrics_pruner::MetricsPruner, resource_sampler::ResourceSampler},
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new("info,perf_monitor=debug,tower_http=debug")
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    let monitoring = MonitoringService::from_config(&config);
    monitoring
        .register_default_checks(config.memory_warn_bytes(), config.memory_fail_bytes())
        .await;

    let resource_sampler = ResourceSampler::new(
        monitoring.sampler.clone(),
        config.process_sample_interval_ms,
    );
    tokio::spawn(async move { resource_sampler.start().await });

    if config.monitor_config().retention.is_some() {
        let pruner = MetricsPruner::new(
            monitoring.performance.clone(),
            config.prune_interval_seconds,
        );
        tokio::spawn(async move { pruner.start().await });
    }

    let state = AppState { monitoring };

    // Dashboards on other origins poll these routes
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let app = create_router(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Performance monitor listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
            tracing::info!("Ctrl+C received, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, initiating graceful shutdown");
        }
    }
}

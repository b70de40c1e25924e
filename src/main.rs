use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rag_chat_gateway::{
    auth::{CredentialResolver, JwtVerifier},
    config::{AppConfig, LogFormat},
    router,
    telemetry::{
        ConsoleExporter, GatewayLogger, PrometheusExporter, StructuredLogger, TelemetryRegistry,
    },
    usecase::RemoteChatUseCase,
    AppState, ChatGateway,
};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

fn main() {
    let config = match AppConfig::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);
    debug!("Configuration loaded: {:?}", config);

    info!(
        "Configuring tokio runtime with {} worker threads",
        config.worker_threads
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .thread_stack_size(2 * 1024 * 1024)
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!("Failed to build tokio runtime: {}", e);
            std::process::exit(1);
        });

    runtime.block_on(serve(config));
}

async fn serve(config: AppConfig) {
    let telemetry_config = &config.telemetry;
    debug!(
        "Telemetry configuration: debug_mode={}, enable_metrics={}",
        telemetry_config.debug_mode, telemetry_config.enable_metrics
    );
    let registry = Arc::new(TelemetryRegistry::new(telemetry_config.debug_mode));

    if telemetry_config.debug_mode {
        debug!("Registering console exporter");
        registry.register_exporter(Box::new(ConsoleExporter::new()));
    }

    if telemetry_config.enable_metrics {
        debug!("Registering Prometheus exporter");
        registry.register_exporter(Box::new(PrometheusExporter::new(
            telemetry_config.metrics_namespace.clone(),
        )));
    }

    let logger: Arc<dyn GatewayLogger> = Arc::new(StructuredLogger::with_registry(registry));

    let jwt = JwtVerifier::new(config.jwt_secret.clone());
    if !jwt.is_enabled() {
        info!("JWT_SECRET not set; bearer tokens will not be accepted");
    }
    info!("Loaded {} API keys", config.api_keys.len());

    let resolver = CredentialResolver::new(jwt, Arc::new(config.api_keys.clone()), logger.clone());
    let use_case = Arc::new(RemoteChatUseCase::new(config.chat_backend_url.clone()));
    info!("Chat backend: {}", use_case.endpoint());

    let gateway = Arc::new(ChatGateway::new(resolver, use_case, logger));
    let state = AppState::new(gateway).trusting_authorizer_headers(config.trust_authorizer_headers);
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!(
        "Chat gateway listening on {} with {} worker threads",
        addr, config.worker_threads
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            error!("Server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            debug!("CTRL+C signal received");
        },
        _ = terminate => {
            debug!("Terminate signal received");
        },
    }
    info!("Shutdown signal received, starting graceful shutdown");
}

use practice_auth::{
    build_router,
    config::AuthConfig,
    db::Database,
    services::{
        AuditService, AuthService, ExpiryPolicy, JwtService, LockoutPolicy, LockoutService,
        LoggingMailer, PasswordExpiryService, PasswordPolicyService, PwnedClient,
    },
    utils::password::PasswordHashString,
    AppState,
};
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    let db = Database::connect(&config.database).await?;
    db.initialize_schema().await?;
    tracing::info!("Database initialized successfully");

    let jwt = Arc::new(JwtService::new(&config.jwt)?);
    tracing::info!("JWT service initialized");

    let db_store = Arc::new(db.clone());

    let lockout = LockoutService::new(db_store.clone(), LockoutPolicy::from_config(&config.security));
    let expiry = PasswordExpiryService::new(db_store.clone(), ExpiryPolicy::from_config(&config.security));
    let audit = AuditService::new(db_store.clone());

    let breach_client = if config.breach.enabled {
        Some(Arc::new(PwnedClient::new(&config.breach)?) as Arc<dyn practice_auth::services::BreachClient>)
    } else {
        tracing::warn!("Breach-corpus password checks are disabled");
        None
    };
    let policy = PasswordPolicyService::new(breach_client);

    let auth_service = Arc::new(AuthService::new(
        db_store.clone(),
        db_store.clone(),
        lockout,
        expiry,
        policy,
        audit,
        Arc::new(LoggingMailer),
        jwt.clone(),
        std::time::Duration::from_millis(config.security.min_login_duration_ms),
        PasswordHashString::new(config.security.dummy_password_hash.clone()),
    ));

    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        auth_service,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

use altauth::{
    app, config::AppConfig, db, repositories::SqliteUserRepository,
    services::{create_email_service, AccountService, Notifier},
    AppState,
};

use axum::http::{header, HeaderValue, Method};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "altauth=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected: {}", config.database_url);

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize repositories and services
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let email_service = create_email_service(&config);
    let notifier = Notifier::spawn(email_service);
    let account_service = Arc::new(AccountService::new(
        user_repository,
        notifier,
        config.hash_cost,
    )?);

    let app_state = AppState {
        account_service,
        pool: pool.clone(),
    };

    // Session store
    let session_store = SqliteStore::new(pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Invalid session table name: {}", e))?;
    session_store.migrate().await?;
    let session_layer = config.create_session_layer(session_store);

    // Per-IP rate limiting in front of every route; the credential flows
    // only run for admitted requests.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(config.rate_limit.period_secs))
            .burst_size(config.rate_limit.burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    let cors = CorsLayer::new()
        .allow_origin(config.base_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = app::build_router(app_state, session_layer)
        .layer(GovernorLayer {
            config: governor_config,
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("altauth listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

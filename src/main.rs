use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpline::api::middleware::AppState;
use helpline::api::router::build_router;
use helpline::config::Config;
use helpline::database::Database;
use helpline::services::{
    FcmPushProvider, HttpTextGenerator, IdentityService, MessagePipeline, NotificationDispatcher,
    ResponderService, RoomService,
};
use helpline::ws::hub::Hub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpline=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    sqlx::any::install_default_drivers();
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    // Wire up the core: external collaborators are constructed here and
    // injected, so tests can substitute doubles.
    let hub = Arc::new(Hub::new());
    let push = Arc::new(FcmPushProvider::new(
        config.fcm_endpoint.clone(),
        config.fcm_server_key.clone(),
    ));
    let notifier = Arc::new(NotificationDispatcher::new(
        db.clone(),
        hub.clone(),
        push,
    ));
    let generator = Arc::new(HttpTextGenerator::new(
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let responder = Arc::new(ResponderService::new(
        generator,
        Duration::from_secs(config.responder_timeout_secs),
    ));
    let pipeline = Arc::new(MessagePipeline::new(
        db.clone(),
        hub.clone(),
        responder,
        notifier.clone(),
    ));
    let rooms = Arc::new(RoomService::new(db.clone(), notifier.clone()));
    let identity = IdentityService::new(db.clone());

    let state = AppState {
        db,
        hub,
        identity,
        rooms,
        pipeline,
        notifier,
    };

    // Build router
    let app = build_router(state);

    // Start server
    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

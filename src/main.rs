use std::net::SocketAddr;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travel_booking_backend::{
    config::Config,
    db,
    notify::{self, EmailNotifier, InvoiceNotifier, Notifier, WhatsAppNotifier},
    routes,
    settings::{SettingsStore, SharedSettings},
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_booking_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    let settings = SharedSettings::new(SettingsStore::load(&db).await);

    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(InvoiceNotifier::new(&config.bills_dir))];
    match WhatsAppNotifier::new() {
        Ok(whatsapp) => notifiers.push(Box::new(whatsapp)),
        Err(e) => tracing::warn!(error = %e, "WhatsApp notifications disabled"),
    }
    notifiers.push(Box::new(EmailNotifier::new()));
    let (notifications, dispatcher) = notify::channel(notifiers, settings.clone());
    tokio::spawn(dispatcher.run());

    let state = AppState {
        db,
        settings,
        notifications,
    };

    let app = routes::create_router(state).expect("Failed to build router");

    // Peer addresses are needed by the per-IP rate limiter
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

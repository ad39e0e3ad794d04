//! API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::auth::AuthState;
use api::config::Config;
use api::routes::orders::AppState;
use order_store::PostgresOrderStore;
use orders::OrderService;
use stock_gateway::HttpReservationGateway;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load configuration and connect to Postgres
    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let store = PostgresOrderStore::new(pool);
    store.run_migrations().await.expect("migrations failed");

    // 4. Wire up the warehouse gateway and the order service
    let gateway = HttpReservationGateway::new(
        config.warehouse_service_url.clone(),
        config.internal_auth_secret.clone(),
    )
    .expect("failed to build warehouse client");

    let order_service = OrderService::new(store, gateway, config.reservation_ttl());
    let state = Arc::new(AppState {
        order_service: order_service.clone(),
    });

    // 5. Start the expiry sweep
    tokio::spawn(api::sweep::run(
        Arc::new(order_service),
        config.sweep_interval(),
    ));

    // 6. Build the application
    let auth_state = AuthState {
        jwt_secret: config.jwt_secret.clone(),
        payment_auth_secret: config.payment_auth_secret.clone(),
    };
    let app = api::create_app(state, auth_state, metrics_handle);

    // 7. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

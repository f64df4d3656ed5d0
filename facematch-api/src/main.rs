use std::sync::Arc;

use axum::Router;
use envconfig::Envconfig;
use eyre::{Result, WrapErr};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use facematch_api::{router, AppState, Config};
use facematch_common::metrics::setup_metrics_routes;
use facematch_common::store::PgStore;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

async fn listen(app: Router, bind: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("could not bind {bind}"))?;

    tracing::info!("listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    let config = Config::init_from_env().wrap_err("failed to load configuration from env")?;

    let store = PgStore::new(&config.pg_config())
        .await
        .wrap_err("failed to connect to postgres")?;
    tracing::info!(
        host = %config.db_host,
        database = %config.db_name,
        max_connections = config.max_pg_connections,
        "connected to postgres"
    );

    if config.run_migrations {
        store
            .run_migrations()
            .await
            .wrap_err("failed to run migrations")?;
        tracing::info!("migrations applied");
    }

    let state = AppState {
        store: Arc::new(store),
    };

    let app = router(state, config.max_body_size);
    let app = if config.enable_metrics {
        setup_metrics_routes(app).wrap_err("failed to install metrics recorder")?
    } else {
        app
    };

    if let Err(e) = listen(app, config.bind()).await {
        tracing::error!("failed to start facematch-api http server, {}", e);
        return Err(e);
    }

    Ok(())
}

use api::AppState;
use api::store::PgCarStore;
use common::config::Config;
use common::logging::setup_logging;
use common::persistence::{init_pg_pool, run_migrations};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    let config = Config::load().expect("failed to load config");
    setup_logging("api", config.loki.as_ref());
    info!("starting app");
    if config.admin.uses_insecure_defaults() {
        warn!("admin credentials or session secret use insecure defaults, override them outside development");
    }
    let cancellation_token = CancellationToken::new();

    let pool = init_pg_pool(&config.postgres).expect("failed to build pg pool");
    run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let state = AppState::new(Arc::new(PgCarStore::new(pool)), config.admin.clone())
        .expect("invalid admin session secret");
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .expect("failed to bind");
    info!("listening on `{}`", config.server.bind);
    let app_done = serve(listener, app, cancellation_token.clone());

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl c event");
    info!("exiting");
    cancellation_token.cancel();
    app_done.notified().await;
    info!("exited");
}

fn serve(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancellation_token: CancellationToken,
) -> Arc<Notify> {
    let done = Arc::new(Notify::new());

    tokio::spawn({
        let done = done.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancellation_token.cancelled().await;
                    info!("gracefully shutting down app");
                })
                .await
                .expect("failed to serve");
            done.notify_waiters();
        }
    });

    done
}

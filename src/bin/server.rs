use std::net::SocketAddr;

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use tally_rs::{AppState, PaginationConfig, build_router, graceful_shutdown, logging_middleware};

/// The web server for tally_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the timezone to display dates in, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The user id that owns rows created through the web UI.
    #[arg(long, default_value = "user_1")]
    user_id: String,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not open database at {}: {error}", args.db_path);
            std::process::exit(1);
        }
    };

    let state = match AppState::new(
        connection,
        &args.timezone,
        &args.user_id,
        PaginationConfig::default(),
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("could not initialize the database: {error}");
            std::process::exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state)).layer(middleware::from_fn(logging_middleware));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("server listening on http://{}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("server exited with an error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty().with_filter(filter))
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // 5xx responses are logged by the route handlers.
        .on_failure(());

    router.layer(tracing_layer)
}

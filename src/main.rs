use std::net::SocketAddr;

use stockwatch::{config, routes, services::db::ensure_indexes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();
    let state = AppState::build(settings.clone());

    // index creation is the first use of the lazy client; a failure here is
    // logged and the next store call retries the connection
    if let Some(db) = &state.db {
        match db.database().await {
            Ok(database) => {
                if let Err(e) = ensure_indexes(&database).await {
                    tracing::warn!(error = %e, "could not ensure indexes");
                }
            }
            Err(e) => tracing::warn!(error = %e, "database not reachable at startup"),
        }
    } else {
        tracing::info!("using in-memory storage");
    }

    let app = routes::app(state);

    let ip = match settings.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!(host = %settings.host, error = %e, "invalid HOST");
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "bind failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
    }
}

use std::net::SocketAddr;

use axum::extract::Request;
use axum::Router;
use axum::ServiceExt;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;

use crate::routes::{self, ServerState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;

    // The database backend needs its tables before serving traffic
    if cfg.storage.backend == configs::StorageBackend::Database {
        let db = models::db::connect_with_config(&cfg.database).await?;
        migration::Migrator::up(&db, None).await?;
        info!("migrations applied");
    }

    let storage = service::storage::from_config(&cfg).await?;
    info!(backend = ?cfg.storage.backend, "storage adapter ready");

    let state = ServerState { storage };
    let app: Router = routes::build_router(build_cors(), state);
    // Treat trailing-slash variants as the same route
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting api server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}

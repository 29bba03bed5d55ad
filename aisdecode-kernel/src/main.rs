/**
 * AISDECODE - Point d'entrée du service
 *
 * RÔLE : Charge la configuration, l'état persistant, ouvre les sources (UDP, série),
 * les agrégateurs, lance le cycle périodique puis sert HTTP + WebSocket.
 *
 * Échecs fatals au démarrage : port UDP/HTTP indisponible, port série inutilisable,
 * agrégateur invalide, fichier de config illisible.
 */

use aisdecode_kernel::config::{Args, Settings};
use aisdecode_kernel::cycle::CycleController;
use aisdecode_kernel::engine::Engine;
use aisdecode_kernel::http::{self, AppState};
use aisdecode_kernel::ingest;
use aisdecode_kernel::models::Snapshot;
use aisdecode_kernel::persistence::StateFile;
use aisdecode_kernel::relay::AggregatorRelay;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let settings = Settings::load(args).await.context("invalid configuration")?;

    let default_level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("aisdecode starting");

    let state_file = settings.state_file.clone().map(StateFile::new);
    let initial = match &state_file {
        Some(file) => file.load_or_empty().await,
        None => Snapshot::new(),
    };

    let relay = AggregatorRelay::connect(&settings.aggregators)
        .await
        .context("failed to connect to aggregators")?;

    let engine = Engine::new(settings.engine_options(), relay, state_file, initial);

    let udp = ingest::bind_udp(settings.udp_listen_port)
        .await
        .context("cannot start UDP listener")?;
    ingest::spawn_udp_listener(engine.clone(), udp);

    if let Some(path) = &settings.serial_port {
        let port = ingest::open_serial(path, settings.baud)
            .with_context(|| format!("cannot use serial port {}", path.display()))?;
        ingest::spawn_serial_reader(engine.clone(), port);
    }

    CycleController::new(engine.clone()).spawn(settings.update_interval);

    let app = http::build_router(AppState { engine }, &settings.web_root);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.ws_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind HTTP port {}", settings.ws_port))?;
    info!("listening on http://{addr} (web root {})", settings.web_root.display());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("aisdecode stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

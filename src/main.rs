use folio::config::Config;
use folio::gateway::Gateway;
use folio::router::{RelayState, relay_router};
use folio::service::seed::seed_database;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        supabase_url = %cfg.supabase_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        mode = ?cfg.app_mode,
        smtp = cfg.smtp().is_some(),
    );
    if cfg.uses_placeholder_backend() {
        warn!("using placeholder backend credentials; set SUPABASE_URL and SUPABASE_ANON_KEY");
    }

    if std::env::args().nth(1).as_deref() == Some("seed") {
        let gateway = Gateway::from_config(&cfg);
        let report = seed_database(&gateway).await?;
        info!(
            projects = report.projects,
            experiences = report.experiences,
            "database seeding completed"
        );
        return Ok(());
    }

    if cfg.smtp().is_none() {
        warn!("SMTP_USER/SMTP_PASS not set; contact requests will fail");
    }
    let state = RelayState::from_config(&cfg)?;
    let app = relay_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}

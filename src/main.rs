use std::sync::Arc;

use anyhow::Context;

use loca::api::{HttpMarketingApi, MarketingApi};
use loca::config::LocaConfig;
use loca::server;
use loca::store::{LibSqlStore, WizardStore};
use loca::wizard::WizardSessions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = LocaConfig::from_env().context("Invalid configuration")?;

    eprintln!("📍 loca v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Site: http://0.0.0.0:{}/", config.port);
    eprintln!("   Wizard API: http://0.0.0.0:{}/api/wizard", config.port);
    eprintln!("   Database: {}", config.db_path.display());
    let configured = config.endpoints.configured();
    if configured.is_empty() {
        eprintln!("   Endpoints: none configured (wizard steps will come back empty)");
    } else {
        eprintln!("   Endpoints: {}", configured.join(", "));
    }

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn WizardStore> = Arc::new(
        LibSqlStore::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Wizard ───────────────────────────────────────────────────────────
    let api: Arc<dyn MarketingApi> = Arc::new(HttpMarketingApi::new(
        config.endpoints.clone(),
        config.http_timeout,
    ));
    let sessions = WizardSessions::with_ttl(api, store, config.launch_tick, config.session_ttl);

    // ── HTTP ─────────────────────────────────────────────────────────────
    let app = server::router(sessions);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "HTTP server started");
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

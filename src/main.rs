use decoupage_companion::{router, AppState, Config, PreferenceStore};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let prefs = PreferenceStore::open(config.prefs_path.clone()).await;
    info!("backend at {}", config.api_url);

    let addr = config.listen_addr();
    let app = router(AppState::new(config, prefs));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Server wiring: config → repository + provider client → router → serve.

use anyhow::Result;
use mailflow_core::{init_tracing, EmailProvider};
use ses_client::SesClient;
use std::sync::Arc;
use storage::EmailRepository;
use tracing::info;

use crate::config::AppConfig;
use crate::routes::{app, AppState};

/// Main entry: init logging, validate config, build the store and provider
/// client, then serve until shutdown.
pub async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;
    std::fs::create_dir_all("logs")?;
    init_tracing(&config.log_file)?;

    info!(
        database_url = %config.database_url,
        listen_addr = %config.listen_addr,
        "Initializing mailflow"
    );

    let repo = EmailRepository::new(&config.database_url).await?;
    let provider: Arc<dyn EmailProvider> = Arc::new(match &config.provider_base_url {
        Some(base_url) => {
            SesClient::with_base_url(config.provider_api_token.clone(), base_url.clone())
        }
        None => SesClient::new(config.provider_api_token.clone(), &config.provider_region),
    });

    let state = AppState::new(repo, provider, config.api_key.clone());
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Server started");
    axum::serve(listener, router).await?;

    Ok(())
}

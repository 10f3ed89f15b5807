use financial_research_agent::{
    agent::Orchestrator,
    api::{start_server, ApiState},
    config::ServiceConfig,
    llm::build_language_model,
    search::build_search_provider,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    info!("🚀 Financial Research Agent - API Server");
    info!(
        port = config.port,
        llm_provider = ?config.llm_provider,
        search_backend = ?config.search_backend,
        "Configuration loaded"
    );

    let llm = build_language_model(&config)?;
    let search = build_search_provider(&config)?;
    let orchestrator = Arc::new(Orchestrator::new(llm, search));

    info!("✅ Orchestrator initialized");

    let state = ApiState {
        orchestrator,
        default_target_score: config.default_target_score,
        default_max_retries: config.default_max_retries,
    };

    start_server(state, config.port).await?;

    Ok(())
}

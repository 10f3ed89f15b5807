use financial_research_agent::{
    agent::Orchestrator,
    config::ServiceConfig,
    llm::build_language_model,
    models::AnalysisRequest,
    search::build_search_provider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUESTION: &str = "How is Apple performing?";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let question = if args.is_empty() {
        DEFAULT_QUESTION.to_string()
    } else {
        args.join(" ")
    };

    let orchestrator = Orchestrator::new(
        build_language_model(&config)?,
        build_search_provider(&config)?,
    );

    info!(question = %question, "Running analysis");

    let report = orchestrator
        .run(AnalysisRequest {
            question,
            purpose: "financial analysis".to_string(),
            target_score: config.default_target_score,
            max_retries: config.default_max_retries,
        })
        .await;

    println!("\n=== ANALYSIS RESULT ===");
    println!("Run ID: {}", report.run_id);
    if let Some(score) = report.critic_score {
        println!("Critic Score: {}/10", score);
    }
    println!("Retries: {}", report.retry_count);
    println!("Max Retries Reached: {}", report.max_retries_reached);

    println!("\nSub-questions:");
    for (i, q) in report.sub_questions.iter().enumerate() {
        println!("  {}: {}", i + 1, q);
    }

    println!("\nTimings (s):");
    for (stage, seconds) in &report.processing_time {
        println!("  {:<16} {:.2}", stage, seconds);
    }

    println!("\n{}", report.final_answer);

    if report.error {
        return Err(report.final_answer.into());
    }

    Ok(())
}

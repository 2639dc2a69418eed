//! Walk the built-in chest pain tree end to end, offline.
//!
//! Takes one detour through the chest X-ray, backs out of it, then follows
//! the optimal route and prints the debrief and the learner's progress.
//!
//! Usage:
//!   cargo run -p goldrock-app --example walkthrough

use goldrock_app::TrainerService;
use goldrock_app::sinks::MemoryAttempts;
use goldrock_app::sources::CatalogTrees;
use goldrock_trainer::catalog::chest_pain;
use goldrock_trainer::{DecisionHistory, Engine, EngineConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let engine = Engine::new(EngineConfig {
        decision_history: DecisionHistory::Prune,
        ..EngineConfig::default()
    });
    let service = TrainerService::new(engine, CatalogTrees, MemoryAttempts::new());

    let view = service.start_attempt("demo-learner", chest_pain::ID).await?;
    println!("{}: {}", view.node.title, view.node.content);

    // Presentation → Chest X-ray, then back out
    let view = service.decide(view.attempt_id, 1).await?;
    println!("took a detour to '{}'", view.node.title);
    let view = service.go_back(view.attempt_id).await?;
    println!("back at '{}' ({} backtrack)", view.node.title, view.backtracks);

    // Presentation → ECG → Primary PCI
    let view = service.decide(view.attempt_id, 0).await?;
    let view = service.decide(view.attempt_id, 0).await?;

    let Some(debrief) = &view.debrief else {
        return Err(eyre::eyre!("expected the attempt to complete"));
    };
    println!("{}", serde_json::to_string_pretty(debrief)?);

    let progress = service
        .sink()
        .progress("demo-learner", chest_pain::ID)
        .await;
    println!(
        "attempts: {}, best score: {:?}",
        progress.attempt_count, progress.best_score
    );
    Ok(())
}

//! GoldRock trainer CLI.
//!
//! Runs decision-tree attempts, validates authored trees and generates new
//! teaching content against the configured bucket and model.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use goldrock_app::aws::{self, AwsClients};
use goldrock_app::config::{self, CredentialSource, GoldrockConfig};
use goldrock_app::service::TrainerService;
use goldrock_app::sinks::{AttemptSink, MemoryAttempts, S3Attempts};
use goldrock_app::sources::{CatalogTrees, S3Trees, TreeSource};
use goldrock_bedrock::case::generate_case;
use goldrock_bedrock::tree::{TreeRequest, generate_tree};
use goldrock_core::models::case::CaseRequest;
use goldrock_core::models::tree::DecisionTree;
use goldrock_trainer::Engine;
use goldrock_trainer::findings::clinical_findings;
use goldrock_trainer::validate::{optimal_route, validate_tree};
use tracing_subscriber::EnvFilter;

/// GoldRock Health clinical decision-tree trainer
#[derive(Parser, Debug)]
#[command(name = "goldrock")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file for the given bucket and region
    Init {
        #[arg(long)]
        region: String,
        #[arg(long)]
        bucket: String,
        /// Named AWS profile; the default credential chain otherwise
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        model_id: Option<String>,
    },
    /// List available decision trees
    Trees {
        /// Read trees from the configured bucket instead of the built-in catalog
        #[arg(long)]
        s3: bool,
    },
    /// Play a tree with a fixed sequence of option indexes
    Play {
        tree_id: String,
        /// Option indexes in order, e.g. `0,0,1`
        #[arg(long, value_delimiter = ',')]
        choices: Vec<usize>,
        #[arg(long, default_value = "local")]
        user: String,
        /// Use the configured bucket for trees and attempt records
        #[arg(long)]
        s3: bool,
    },
    /// Check a tree JSON file for structural problems
    Validate { path: PathBuf },
    /// Show rule-based findings for a diagnosis
    Findings { diagnosis: String },
    /// Generate a teaching case with the configured model
    GenerateCase {
        #[arg(long)]
        specialty: String,
        #[arg(long, default_value_t = 2)]
        difficulty: u8,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        learner_level: Option<String>,
        /// Store the case in the configured bucket
        #[arg(long)]
        save: bool,
    },
    /// Generate a decision tree with the configured model
    GenerateTree {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        specialty: String,
        #[arg(long, default_value_t = 2)]
        difficulty: u8,
        #[arg(long, default_value_t = 4)]
        max_depth: u8,
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // RUST_LOG wins over --verbose, which wins over the default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match args.command {
        Command::Init {
            region,
            bucket,
            profile,
            model_id,
        } => {
            let mut config = GoldrockConfig::new(region, bucket);
            if let Some(profile_name) = profile {
                if !aws::list_aws_profiles().contains(&profile_name) {
                    tracing::warn!(profile = %profile_name, "profile not found in ~/.aws; saving anyway");
                }
                config.credentials = CredentialSource::Profile { profile_name };
            }
            if let Some(model_id) = model_id {
                config.model_id = model_id;
            }
            let path = config::save_config(&config)?;
            println!("wrote {}", path.display());
        }
        Command::Trees { s3 } => {
            let ids = if s3 {
                let (config, clients) = connect().await?;
                S3Trees::new(clients.s3, config.bucket).list_tree_ids().await?
            } else {
                CatalogTrees.list_tree_ids().await?
            };
            for id in ids {
                println!("{id}");
            }
        }
        Command::Play {
            tree_id,
            choices,
            user,
            s3,
        } => {
            if s3 {
                let (config, clients) = connect().await?;
                let service = TrainerService::new(
                    Engine::new(config.engine),
                    S3Trees::new(clients.s3.clone(), config.bucket.clone()),
                    S3Attempts::new(clients.s3, config.bucket),
                );
                play(&service, &user, &tree_id, &choices).await?;
            } else {
                let engine = config::load_config()
                    .map(|c| Engine::new(c.engine))
                    .unwrap_or_default();
                let service = TrainerService::new(engine, CatalogTrees, MemoryAttempts::new());
                play(&service, &user, &tree_id, &choices).await?;
            }
        }
        Command::Validate { path } => {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
            let tree: DecisionTree = serde_json::from_str(&contents)?;
            let issues = validate_tree(&tree);
            if issues.is_empty() {
                let route = optimal_route(&tree).unwrap_or_default();
                println!("{}: ok (optimal route: {})", tree.id, route.join(" -> "));
            } else {
                for issue in &issues {
                    println!("{}: {issue}", tree.id);
                }
                return Err(eyre::eyre!("{} issue(s) found", issues.len()));
            }
        }
        Command::Findings { diagnosis } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&clinical_findings(&diagnosis))?
            );
        }
        Command::GenerateCase {
            specialty,
            difficulty,
            topic,
            learner_level,
            save,
        } => {
            let (config, clients) = connect().await?;
            let request = CaseRequest {
                specialty,
                difficulty,
                topic,
                learner_level,
            };
            let case = generate_case(&clients.generator, &request).await?;
            if save {
                goldrock_storage::cases::save_case(&clients.s3, &config.bucket, &case).await?;
            }
            println!("{}", serde_json::to_string_pretty(&case)?);
        }
        Command::GenerateTree {
            topic,
            specialty,
            difficulty,
            max_depth,
            save,
        } => {
            let (config, clients) = connect().await?;
            let request = TreeRequest {
                topic,
                specialty,
                difficulty,
                max_depth,
            };
            let tree = generate_tree(&clients.generator, &request).await?;
            if save {
                goldrock_storage::trees::save_tree(&clients.s3, &config.bucket, &tree).await?;
            }
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }

    Ok(())
}

async fn connect() -> Result<(GoldrockConfig, AwsClients)> {
    if !config::has_config() {
        tracing::warn!("no config file found; run `goldrock init` first or set GOLDROCK_* variables");
    }
    let config = config::load_config()?;
    let clients = AwsClients::from_config(&config).await;
    Ok((config, clients))
}

async fn play<T: TreeSource, S: AttemptSink>(
    service: &TrainerService<T, S>,
    user: &str,
    tree_id: &str,
    choices: &[usize],
) -> Result<()> {
    let mut view = service.start_attempt(user, tree_id).await?;
    println!("== {} ==", view.tree_title);

    for &choice in choices {
        println!("[{}] {}", view.node.title, view.node.content);
        let picked = view.node.options.get(choice).cloned().unwrap_or_default();
        println!("  -> {picked}");
        view = service.decide(view.attempt_id, choice).await?;
        if view.result.is_some() {
            break;
        }
    }

    match &view.debrief {
        Some(debrief) => {
            println!("{}", serde_json::to_string_pretty(debrief)?);
            if !view.is_submitted() {
                tracing::warn!(attempt_id = %view.attempt_id, "result was not recorded");
            }
        }
        None => {
            println!(
                "stopped at '{}' after {} step(s); attempt abandoned",
                view.node.title, view.progress.steps_taken
            );
            service.abandon(view.attempt_id).await?;
        }
    }
    Ok(())
}

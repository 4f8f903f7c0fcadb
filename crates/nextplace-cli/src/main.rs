//! CLI for nextplace.
//!
//! Recommends a next place from liked places, keeps likes in a local JSON
//! store, and drives the Q-learning agent against a persisted table. Every
//! like or unlike is logged and fed to the agent as a reward.

mod gemini;
mod places;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gemini::GeminiClient;
use nextplace_bandits::QAgent;
use nextplace_core::{GeoPoint, LikeStore, LikedPlace, Policy, UserId};
use nextplace_engine::{check_inputs, EngineConfig, Recommender};
use nextplace_feedback::{place_key, FeedbackLog, JsonLikeStore};
use places::PlacesClient;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const NO_ACTION: &str = "No action available";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend places based on liked places
    Recommend {
        /// JSON file with an array of liked places; defaults to the like store
        #[arg(long)]
        liked: Option<PathBuf>,

        /// User whose likes are read from the store
        #[arg(long)]
        user: Option<String>,

        /// Path to the like store
        #[arg(long, default_value = "data/nextplace.likes.json")]
        likes_file: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,

        /// JSON file with engine settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for reproducible category selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Like a place (or unlike it with --unlike)
    Like {
        #[arg(long)]
        name: String,

        /// Coarse type of the place
        #[arg(long = "type", default_value = "restaurant")]
        kind: String,

        /// Provider id of the place
        #[arg(long)]
        place_id: Option<String>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        unlike: bool,

        /// Id of the place shown before this one
        #[arg(long)]
        previous: Option<String>,

        /// Path to the like store
        #[arg(long, default_value = "data/nextplace.likes.json")]
        likes_file: PathBuf,

        /// Path to the feedback log
        #[arg(long, default_value = "data/nextplace.feedback.json")]
        feedback_file: PathBuf,

        /// Path to the Q-table snapshot that learns from the swipe
        #[arg(long, default_value = "data/nextplace.qtable.json")]
        table: PathBuf,
    },
    /// List liked places of a user
    Liked {
        #[arg(long)]
        user: Option<String>,

        /// Path to the like store
        #[arg(long, default_value = "data/nextplace.likes.json")]
        likes_file: PathBuf,
    },
    /// Like/dislike statistics per coarse place type
    Stats {
        /// Path to the feedback log
        #[arg(long, default_value = "data/nextplace.feedback.json")]
        feedback_file: PathBuf,
    },
    /// Update or query the Q-learning agent
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Apply one reward observation
    Update {
        #[arg(long)]
        state: String,

        #[arg(long)]
        action: String,

        #[arg(long, allow_hyphen_values = true)]
        reward: f64,

        #[arg(long)]
        next_state: String,

        /// Learning rate for a new table
        #[arg(long, default_value = "0.1")]
        alpha: f64,

        /// Discount factor for a new table
        #[arg(long, default_value = "0.9")]
        gamma: f64,

        /// Path to the Q-table snapshot
        #[arg(long, default_value = "data/nextplace.qtable.json")]
        table: PathBuf,
    },
    /// Rebuild the Q-table from the feedback log
    Replay {
        /// Path to the feedback log
        #[arg(long, default_value = "data/nextplace.feedback.json")]
        feedback_file: PathBuf,

        #[arg(long, default_value = "0.1")]
        alpha: f64,

        #[arg(long, default_value = "0.9")]
        gamma: f64,

        /// Path to the Q-table snapshot, overwritten
        #[arg(long, default_value = "data/nextplace.qtable.json")]
        table: PathBuf,
    },
    /// Choose the next action for a state
    Select {
        #[arg(long)]
        state: String,

        /// Seed for reproducible choices
        #[arg(long)]
        seed: Option<u64>,

        /// Path to the Q-table snapshot
        #[arg(long, default_value = "data/nextplace.qtable.json")]
        table: PathBuf,
    },
}

#[derive(Serialize)]
struct LikeResponse {
    success: bool,
    total_likes: u32,
    reward: f64,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value)?;
    println!();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open config {path:?}"))?;
    serde_json::from_reader(file).with_context(|| format!("Invalid config {path:?}"))
}

fn load_liked(path: &Path) -> Result<Vec<LikedPlace>> {
    let file = File::open(path).with_context(|| format!("Failed to open liked places {path:?}"))?;
    serde_json::from_reader(file).with_context(|| format!("Invalid liked places in {path:?}"))
}

fn location(lat: Option<f64>, lng: Option<f64>) -> Result<Option<GeoPoint>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
        _ => Ok(None),
    }
}

/// Loads the agent from `table`, or starts a fresh one if the file is missing.
fn load_agent(table: &Path, alpha: f64, gamma: f64, seed: Option<u64>) -> Result<QAgent> {
    let mut agent = match seed {
        Some(seed) => QAgent::seeded(alpha, gamma, seed),
        None => QAgent::new(alpha, gamma),
    };
    if table.exists() {
        let file = File::open(table).with_context(|| format!("Failed to open Q-table {table:?}"))?;
        let snapshot = serde_json::from_reader(file)?;
        agent
            .load(snapshot)
            .with_context(|| format!("Invalid Q-table {table:?}"))?;
    }
    Ok(agent)
}

fn save_agent(agent: &QAgent, table: &Path) -> Result<()> {
    if let Some(parent) = table.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(table)?;
    serde_json::to_writer_pretty(file, &agent.snapshot())?;
    Ok(())
}

fn run_agent(command: AgentCommand) -> Result<()> {
    match command {
        AgentCommand::Update {
            state,
            action,
            reward,
            next_state,
            alpha,
            gamma,
            table,
        } => {
            let mut agent = load_agent(&table, alpha, gamma, None)?;
            let value = agent.update(&state, &action, reward, &next_state);
            save_agent(&agent, &table).context("Failed to save Q-table")?;
            info!(%state, %action, value, "Q-value updated");
            print_json(&serde_json::json!({ "state": state, "action": action, "value": value }))
        }
        AgentCommand::Replay {
            feedback_file,
            alpha,
            gamma,
            table,
        } => {
            let log = FeedbackLog::load(&feedback_file).context("Failed to read feedback log")?;
            let mut agent = QAgent::new(alpha, gamma);
            log.replay_into(&mut agent);
            save_agent(&agent, &table).context("Failed to save Q-table")?;
            info!(events = log.events().len(), states = agent.state_count(), "feedback replayed");
            print_json(&serde_json::json!({ "events": log.events().len(), "states": agent.state_count() }))
        }
        AgentCommand::Select { state, seed, table } => {
            let defaults = QAgent::default();
            let mut agent = load_agent(&table, defaults.alpha, defaults.gamma, seed)?;
            let decision = agent.decide(&state);
            save_agent(&agent, &table).context("Failed to save Q-table")?;
            match decision {
                Some(decision) => print_json(&decision),
                None => {
                    println!("{NO_ACTION}");
                    Ok(())
                }
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend {
            liked,
            user,
            likes_file,
            lat,
            lng,
            config,
            seed,
        } => {
            let liked = match liked {
                Some(path) => load_liked(&path)?,
                None => JsonLikeStore::open(&likes_file)
                    .context("Failed to open like store")?
                    .liked_places(&UserId::new(user.as_deref()))?,
            };
            let center = match check_inputs(&liked, location(lat, lng)?) {
                Ok(center) => center,
                Err(message) => return print_json(&message),
            };
            let config = load_config(config.as_deref())?;
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut engine = Recommender::with_rng(
                GeminiClient::from_env()?,
                PlacesClient::from_env()?,
                config,
                rng,
            );
            let result = engine.get_recommendations(&liked, Some(center));
            print_json(&result)?;
        }
        Commands::Like {
            name,
            kind,
            place_id,
            user,
            unlike,
            previous,
            likes_file,
            feedback_file,
            table,
        } => {
            let user = UserId::new(user.as_deref());
            let mut store = JsonLikeStore::open(&likes_file).context("Failed to open like store")?;
            let place = LikedPlace {
                id: place_id,
                ..LikedPlace::new(name, kind)
            };
            let total_likes = store
                .set_liked(&user, &place, !unlike)
                .context("Failed to save like store")?;

            let mut log = FeedbackLog::load(&feedback_file).context("Failed to read feedback log")?;
            let event = log.record(&user, previous.as_deref(), place_key(&place), !unlike);
            let reward = event.reward();
            let defaults = QAgent::default();
            let mut agent = load_agent(&table, defaults.alpha, defaults.gamma, None)?;
            event.apply_to(&mut agent);
            log.save(&feedback_file).context("Failed to save feedback log")?;
            save_agent(&agent, &table).context("Failed to save Q-table")?;

            print_json(&LikeResponse {
                success: true,
                total_likes,
                reward,
            })?;
        }
        Commands::Stats { feedback_file } => {
            let log = FeedbackLog::load(&feedback_file).context("Failed to read feedback log")?;
            print_json(&log.stats_by_kind())?;
        }
        Commands::Liked { user, likes_file } => {
            let store = JsonLikeStore::open(&likes_file).context("Failed to open like store")?;
            let liked = store.liked_places(&UserId::new(user.as_deref()))?;
            print_json(&liked)?;
        }
        Commands::Agent { command } => run_agent(command)?,
    }

    Ok(())
}

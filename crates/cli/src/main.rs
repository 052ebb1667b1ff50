//! CarePoints - operator CLI for the rewards ledger

use anyhow::Context;
use carepoints_core::{ActivityType, CheckinRequest, LeaderboardCategory, LeaderboardPeriod, TransferContext, TransferKind};
use carepoints_engine::{save_rewards_config, spawn_hook, Ledger, RewardEvent, RewardHook, RewardsConfig};
use carepoints_networking::{notarize_gratitude, NotaryClient};
use carepoints_persistence::Database;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up or create the user behind a wallet
    User {
        wallet: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Award points for an activity (mood, journal, checkin, community)
    Award {
        user: String,
        activity: String,
        #[arg(long, default_value_t = 0)]
        bonus: i64,
    },
    /// Save-and-reward a journal entry
    Journal {
        user: String,
        #[arg(long)]
        content: String,
    },
    /// Daily mood-score check-in
    Checkin {
        user: String,
        #[arg(long)]
        mood: u8,
        #[arg(long = "emotion")]
        emotions: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, default_value = "")]
        gratitude: String,
        #[arg(long)]
        public: bool,
    },
    /// Tip a post author
    Tip {
        from: String,
        to: String,
        post: String,
        amount: i64,
    },
    /// Send CARE on a post
    SendCare {
        from: String,
        to: String,
        post: String,
        amount: i64,
    },
    /// Credit the comment reward
    CommentReward { user: String, post: String },
    /// Show stats with live streaks
    Stats { user: String },
    /// Sent and received transactions
    History {
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        kind: Option<String>,
    },
    /// Ranked users
    Leaderboard {
        #[arg(long, default_value = "overall")]
        category: String,
        #[arg(long, default_value = "all-time")]
        period: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Rebuild a user's stats from their activity records
    Reconcile { user: String },
    /// Show the rewards config, or replace it from a JSON file
    Config {
        #[arg(long)]
        set: Option<PathBuf>,
    },
    /// Notarize a gratitude note on-chain (hash only)
    Notarize {
        user: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        tag: String,
    },
}

/// Logs events that other services would act on
struct LogHook;

impl RewardHook for LogHook {
    fn on_event(&self, event: &RewardEvent) {
        match event {
            RewardEvent::PublicGratitude { user_id, gratitude, .. } => {
                tracing::info!("Public gratitude from {}: {}", user_id, gratitude);
            }
            RewardEvent::BadgeEarned { user_id, badge } => {
                tracing::info!("{} earned {}", user_id, badge.title);
            }
            RewardEvent::PointsAwarded { .. } => {}
        }
    }
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn default_db_path() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|p| p.join("CarePoints"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carepoints.db")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carepoints=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let path = cli.db.unwrap_or_else(default_db_path);
    let db = Database::connect(&path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;

    let ledger = Ledger::open(db.clone()).await?;
    let hook = spawn_hook(ledger.rewards.subscribe(), Arc::new(LogHook));

    run(&ledger, &db, cli.command).await?;

    // Flush pending events before exit
    drop(ledger);
    hook.await?;
    Ok(())
}

async fn run(ledger: &Ledger, db: &Database, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::User { wallet, name } => {
            print(&ledger.register_user(&wallet, name.as_deref()).await?)?;
        }
        Commands::Award { user, activity, bonus } => {
            let activity: ActivityType = activity.parse()?;
            print(&ledger.rewards.award(&user, activity, bonus).await?)?;
        }
        Commands::Journal { user, content } => {
            print(&ledger.rewards.award_journal_entry(&user, &content).await)?;
        }
        Commands::Checkin { user, mood, emotions, notes, gratitude, public } => {
            let request = CheckinRequest {
                mood_score: mood,
                emotions,
                notes,
                gratitude,
                public_gratitude: public,
            };
            print(&ledger.checkins.check_in(&user, request).await?)?;
        }
        Commands::Tip { from, to, post, amount } => {
            print(&ledger.transfers.tip(&from, &to, &post, amount).await?)?;
        }
        Commands::SendCare { from, to, post, amount } => {
            let context = TransferContext::send_care(post, amount);
            print(&ledger.transfers.transfer(&from, &to, amount, context).await?)?;
        }
        Commands::CommentReward { user, post } => {
            let balance = ledger.transfers.reward_comment(&user, &post).await?;
            print(&serde_json::json!({ "user": user, "carePoints": balance }))?;
        }
        Commands::Stats { user } => {
            let stats = ledger.rewards.get_stats(&user).await?;
            let sent = ledger.transfers.total_sent(&user).await?;
            print(&serde_json::json!({ "stats": stats, "totalSent": sent }))?;
        }
        Commands::History { user, limit, offset, kind } => {
            let kind = kind.map(|k| k.parse::<TransferKind>()).transpose()?;
            print(&ledger.transfers.history(&user, limit, offset, kind).await?)?;
        }
        Commands::Leaderboard { category, period, limit } => {
            let category: LeaderboardCategory = category.parse()?;
            let period: LeaderboardPeriod = period.parse()?;
            print(&ledger.leaderboard.top(category, period, limit).await?)?;
        }
        Commands::Reconcile { user } => {
            print(&ledger.rewards.reconcile_stats(&user).await?)?;
        }
        Commands::Config { set } => match set {
            Some(file) => {
                let json = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let config: RewardsConfig = serde_json::from_str(&json)?;
                save_rewards_config(db, &config).await?;
                print(&config)?;
            }
            None => print(ledger.rewards.config())?,
        },
        Commands::Notarize { user, content, tag } => {
            let client = NotaryClient::from_env()?;
            print(&notarize_gratitude(&client, &user, &content, &tag).await?)?;
        }
    }

    Ok(())
}

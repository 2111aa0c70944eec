use anyhow::{Context, Result};
use chocolate_clash::config::AppConfig;
use chocolate_clash::pipeline::Pipeline;
use chocolate_clash::ChocolateClashScraper;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "chocolate-clash", about = "chocolateclash member scraper", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// League to query (fwa or cc); overrides the config file
    #[arg(short, long, global = true, env = "CC_LEAGUE")]
    league: Option<String>,

    /// Skip the war pid fix before fetching
    #[arg(long, global = true)]
    no_fix: bool,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one member and print it as JSON
    Member {
        tag: String,
        /// Number of recent actions to request
        #[arg(long)]
        actions: Option<u32>,
        /// Number of recent war attacks to request
        #[arg(long)]
        attacks: Option<u32>,
    },

    /// Fetch several members concurrently and print a JSON array
    Batch {
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Only visit the war pid fix links of a member
    Fix { tag: String },

    /// Check whether a member has purple or red attacks in the window
    Eligible {
        tag: String,
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "chocolate_clash=info,warn",
        1 => "chocolate_clash=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(league) = cli.league {
        config.scraper.league = league;
    }
    if cli.no_fix {
        config.scraper.fix_war_pid = false;
    }
    let cfg = config.scraper.clone();

    match cli.command {
        Command::Member {
            tag,
            actions,
            attacks,
        } => {
            let started = Instant::now();
            let scraper = ChocolateClashScraper::new(&cfg)?;
            let member = scraper
                .get_member(
                    &tag,
                    actions.unwrap_or(cfg.actions_limit),
                    attacks.unwrap_or(cfg.attacks_limit),
                    cfg.fix_war_pid,
                )
                .await
                .with_context(|| format!("Failed to fetch member {}", tag))?;
            info!("member {} fetched in {:.2?}", tag, started.elapsed());
            println!("{}", serde_json::to_string_pretty(&member)?);
        }

        Command::Batch { tags } => {
            let report = Pipeline::new(config)?.run(&tags).await;
            for (tag, err) in &report.failures {
                eprintln!("{}: {}", tag, err);
            }
            println!("{}", serde_json::to_string_pretty(&report.members)?);
        }

        Command::Fix { tag } => {
            let scraper = ChocolateClashScraper::new(&cfg)?;
            let visited = scraper
                .fix_war_pid(&tag, cfg.actions_limit, cfg.attacks_limit)
                .await?;
            println!("{}: visited {} fix link(s)", tag, visited);
        }

        Command::Eligible { tag, days } => {
            let scraper = ChocolateClashScraper::new(&cfg)?;
            let member = scraper
                .get_member(&tag, cfg.actions_limit, cfg.attacks_limit, cfg.fix_war_pid)
                .await
                .with_context(|| format!("Failed to fetch member {}", tag))?;
            let today = Utc::now().date_naive();
            let recent = member.recent_attacks(today, days).len();
            let eligible = member.is_war_eligible(today, days);
            info!("{}: {} attacks in the last {} days", tag, recent, days);
            println!("Member {} eligible: {}", member.tag, eligible);
        }
    }

    Ok(())
}

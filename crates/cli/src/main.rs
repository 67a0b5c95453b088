//! DevPulse CLI
//!
//! Prints GitHub statistics for an account or serves them over HTTP.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use devpulse_analyzer::{build_calendar, compute_totals, language_histogram, TOP_LANGUAGES};
use devpulse_api::{create_router, AggregatorConfig, AppState, StatsAggregator};
use devpulse_collector::contributions::ContributionCollector;
use devpulse_collector::github::GithubCollector;
use devpulse_collector::transport::{ReqwestTransport, Transport};
use devpulse_collector::CollectorConfig;
use devpulse_model::cards::stat_cards;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "devpulse")]
#[command(about = "DevPulse - GitHub statistics for a developer portfolio")]
#[command(version)]
struct Cli {
    /// GitHub account to report on
    #[arg(short, long, env = "DEVPULSE_ACCOUNT")]
    account: String,

    /// Personal access token (ghp_ or github_pat_); enables the GraphQL calendar
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Upper bound on repository pages fetched
    #[arg(long, default_value_t = 50)]
    max_pages: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Static files directory
        #[arg(short, long)]
        static_dir: Option<PathBuf>,

        /// Initial contribution year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show profile counters, totals and top languages
    Summary,

    /// List repositories
    Repos,

    /// List organization memberships
    Orgs,

    /// Show the top-language histogram
    Languages,

    /// Show contribution totals per month
    Contributions {
        /// Calendar year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Print stat-card image URLs
    Cards,
}

struct Collectors {
    github: GithubCollector,
    contributions: ContributionCollector,
}

impl Collectors {
    fn new(config: CollectorConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(&config).context("Failed to build HTTP client")?);
        Ok(Self {
            github: GithubCollector::with_transport(config.clone(), transport.clone()),
            contributions: ContributionCollector::with_transport(config, transport),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let config = CollectorConfig::default()
        .with_token(cli.token.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_pages(cli.max_pages);

    if config.github_token.is_some() && config.valid_token().is_none() {
        eprintln!("Warning: token does not look like a GitHub PAT; using public endpoints only.");
    } else if config.github_token.is_none() {
        eprintln!("Warning: GITHUB_TOKEN not set. API rate limits will be restricted.");
    }

    let collectors = Collectors::new(config)?;
    let account = cli.account.as_str();

    match cli.command {
        Commands::Serve {
            bind,
            static_dir,
            year,
        } => {
            serve(collectors, account, bind, static_dir, year).await?;
        }
        Commands::Summary => {
            summary(&collectors, account).await;
        }
        Commands::Repos => {
            repos(&collectors, account).await;
        }
        Commands::Orgs => {
            orgs(&collectors, account).await;
        }
        Commands::Languages => {
            languages(&collectors, account).await;
        }
        Commands::Contributions { year } => {
            contributions(&collectors, account, year.unwrap_or_else(|| Utc::now().year())).await;
        }
        Commands::Cards => {
            cards(account)?;
        }
    }

    Ok(())
}

async fn serve(
    collectors: Collectors,
    account: &str,
    bind: SocketAddr,
    static_dir: Option<PathBuf>,
    year: Option<i32>,
) -> Result<()> {
    let mut config = AggregatorConfig::new(account);
    if let Some(year) = year {
        config = config.with_year(year);
    }

    let aggregator = Arc::new(StatsAggregator::new(
        config,
        collectors.github,
        collectors.contributions,
    ));

    // initial load runs in the background; slots read as pending until it lands
    let warmup = aggregator.clone();
    tokio::spawn(async move {
        warmup.refresh().await;
    });

    let state = Arc::new(AppState::new(aggregator));
    let router = create_router(state, static_dir.clone());

    info!("Starting DevPulse server on {}", bind);
    if let Some(ref dir) = static_dir {
        info!("Serving static files from {}", dir.display());
    }
    info!("API available at http://{}/api/v1", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

async fn summary(collectors: &Collectors, account: &str) {
    let (profile, repos) = tokio::join!(
        collectors.github.load_profile(account),
        collectors.github.load_all_repositories(account)
    );

    println!("Account: {}", account);
    match profile {
        Some(profile) => {
            if let Some(ref name) = profile.name {
                println!("Name: {}", name);
            }
            println!("Public repos: {}", profile.public_repos);
            println!("Followers: {}", profile.followers);
        }
        None => println!("Profile unavailable."),
    }

    let totals = compute_totals(&repos);
    println!();
    println!("Stars (own repos): {}", totals.stars);
    println!("Forks (own repos): {}", totals.forks);

    let histogram = language_histogram(&repos, TOP_LANGUAGES);
    if !histogram.is_empty() {
        println!("\nTop languages:");
        for entry in histogram {
            println!("  {:<15} {}", entry.language, entry.count);
        }
    }
}

async fn repos(collectors: &Collectors, account: &str) {
    let repos = collectors.github.load_all_repositories(account).await;

    println!("{:<35} {:>7} {:>7} {:<5} {:<15}", "NAME", "STARS", "FORKS", "FORK", "LANGUAGE");
    println!("{}", "-".repeat(73));

    for repo in &repos {
        println!(
            "{:<35} {:>7} {:>7} {:<5} {:<15}",
            repo.name,
            repo.stargazers_count,
            repo.forks_count,
            if repo.fork { "yes" } else { "-" },
            repo.language.as_deref().unwrap_or("-")
        );
    }

    if repos.is_empty() {
        println!("No repositories found.");
    }
}

async fn orgs(collectors: &Collectors, account: &str) {
    let orgs = collectors.github.load_organizations(account).await;

    if orgs.is_empty() {
        println!("No organizations.");
        return;
    }

    println!("{:<25} {:<12}", "ORG", "ID");
    println!("{}", "-".repeat(37));
    for org in orgs {
        println!("{:<25} {:<12}", org.login, org.id);
    }
}

async fn languages(collectors: &Collectors, account: &str) {
    let repos = collectors.github.load_all_repositories(account).await;
    let histogram = language_histogram(&repos, TOP_LANGUAGES);

    if histogram.is_empty() {
        println!("No language data.");
        return;
    }

    let max = histogram.first().map(|entry| entry.count).unwrap_or(1).max(1);
    for entry in histogram {
        let bar = "█".repeat(entry.count * 30 / max);
        println!("{:<15} {:>4} {}", entry.language, entry.count, bar);
    }
}

async fn contributions(collectors: &Collectors, account: &str, year: i32) {
    let sparse = collectors.contributions.load_contributions(account, year).await;
    let calendar = build_calendar(year, &sparse);

    if !calendar.has_data() {
        println!("No contribution data available for {}.", year);
        return;
    }

    println!("Contributions in {}: {}", year, calendar.total);
    println!();
    for month in &calendar.monthly {
        println!("  {} {:>5}", month.month, month.count);
    }
}

fn cards(account: &str) -> Result<()> {
    for card in stat_cards(account)? {
        println!("{}: {}", card.label, card.src);
    }
    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use nba_scraper::sources::hupu;
use nba_scraper::{logging, pipeline, Config, Pipeline};

#[derive(Parser)]
#[command(name = "nba_scraper")]
#[command(about = "NBA statistics crawler for Hupu, ESPN and the official player directory")]
#[command(version = "0.1.0")]
struct Cli {
    /// Season tag stamped onto every output row, e.g. 2024-25
    #[arg(long, global = true)]
    season: Option<String>,

    /// Repeat the crawl for every configured season
    #[arg(long, global = true)]
    all_seasons: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl player stat leaderboards
    PlayerStats {
        /// Specific categories (comma-separated), e.g. pts,reb,asts. Default: all
        #[arg(long)]
        categories: Option<String>,
    },
    /// Crawl the team stats leaderboard
    TeamStats,
    /// Crawl conference standings
    Standings,
    /// Crawl every team roster
    Rosters,
    /// Crawl ESPN rosters annotated with localized player names
    EspnRosters,
    /// Crawl ESPN player stat leaderboards
    EspnStats {
        /// Specific categories (comma-separated), e.g. points,assists. Default: all
        #[arg(long)]
        categories: Option<String>,
    },
    /// Merge Hupu rosters with ESPN salaries and localized names
    MergeSalaries,
    /// Rosters, then the headline leaderboards, then standings
    Priority,
    /// The full crawl: everything above, per season
    All,
}

fn run_season(pipeline: &mut Pipeline, command: &Commands, season: &str) -> nba_scraper::Result<()> {
    match command {
        Commands::PlayerStats { categories } => {
            if let Some(list) = categories {
                for code in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    pipeline.crawl_player_stats(code, season)?;
                }
            } else {
                pipeline.crawl_all_player_stats(season)?;
            }
        }
        Commands::TeamStats => pipeline.crawl_team_stats(season)?,
        Commands::Standings => pipeline.crawl_standings(season)?,
        Commands::Rosters => pipeline.crawl_all_rosters(season)?,
        Commands::EspnRosters => pipeline.crawl_espn_rosters(season)?,
        Commands::EspnStats { categories } => {
            if let Some(list) = categories {
                for code in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    pipeline.crawl_espn_player_stats(code, season)?;
                }
            } else {
                pipeline.crawl_all_espn_player_stats(season)?;
            }
        }
        Commands::MergeSalaries => pipeline.merge_rosters_with_salary(season)?,
        Commands::Priority => pipeline.crawl_priority(season)?,
        Commands::All => {
            pipeline.crawl_all_rosters(season)?;
            pipeline.crawl_all_player_stats(season)?;
            pipeline.crawl_team_stats(season)?;
            pipeline.crawl_standings(season)?;
            pipeline.merge_rosters_with_salary(season)?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();
    pipeline::install_interrupt_handler();

    let cli = Cli::parse();

    let config = Config::load().context("loading config.toml")?;
    let seasons: Vec<String> = if cli.all_seasons {
        config.seasons.clone()
    } else if let Some(season) = cli.season.clone() {
        vec![season]
    } else {
        vec![hupu::current_season()]
    };

    let mut pipeline = Pipeline::new(config)?;

    for season in &seasons {
        if pipeline::interrupted() {
            break;
        }
        println!("🏀 Crawling season {}...", season);
        info!(%season, "season run starting");
        if let Err(e) = run_season(&mut pipeline, &cli.command, season) {
            error!(%season, "season run failed: {}", e);
            return Err(e.into());
        }
        if pipeline::interrupted() {
            println!("⚠️  Season {} stopped early", season);
        } else {
            println!("✅ Season {} done", season);
        }
    }

    if pipeline::interrupted() {
        // Completed artifacts are already on disk; report and exit cleanly.
        info!("run interrupted by user, partial results kept");
        println!("\n🛑 Interrupted — partial results are in the output directory");
    }

    Ok(())
}
